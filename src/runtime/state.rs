//! The State Cell: sole owner of the current `(version, state)` pair.

use std::ffi::{CStr, CString};

/// The state a reducer reads and produces.
///
/// `payload` is opaque to the runtime; its layout belongs to the embedding
/// application. The other fields are metadata every shell reads the same way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateDraft {
    pub screen: u32,
    pub loading: bool,
    pub error_message: Option<String>,
    pub payload: Vec<u8>,
}

impl StateDraft {
    pub fn with_payload(payload: Vec<u8>) -> Self {
        Self {
            payload,
            ..Self::default()
        }
    }
}

/// Borrowed, read-only view of the current state.
///
/// Holding it borrows the runtime, so no transition can run while a view
/// is alive. Copy what you need before dispatching again.
#[derive(Debug, Clone, Copy)]
pub struct StateView<'a> {
    pub version: u64,
    pub screen: u32,
    pub loading: bool,
    pub error_message: Option<&'a str>,
    pub payload: &'a [u8],
    error_cstr: Option<&'a CStr>,
}

impl<'a> StateView<'a> {
    /// NUL-terminated copy of `error_message` for the C boundary.
    pub fn error_message_cstr(&self) -> Option<&'a CStr> {
        self.error_cstr
    }

    /// Leading little-endian `i64` of the payload, or 0 when shorter than 8 bytes.
    pub fn counter(&self) -> i64 {
        leading_i64(self.payload)
    }

    pub fn to_draft(&self) -> StateDraft {
        StateDraft {
            screen: self.screen,
            loading: self.loading,
            error_message: self.error_message.map(str::to_owned),
            payload: self.payload.to_vec(),
        }
    }
}

/// Owns the current state and its version.
///
/// Writes only happen through [`StateCell::commit`], which the dispatcher
/// calls after a reducer completes.
#[derive(Debug)]
pub struct StateCell {
    version: u64,
    current: StateDraft,
    error_cstr: Option<CString>,
}

impl StateCell {
    pub fn new(initial: StateDraft) -> Self {
        let error_cstr = to_cstring(initial.error_message.as_deref());
        Self {
            version: 0,
            current: initial,
            error_cstr,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn current(&self) -> &StateDraft {
        &self.current
    }

    pub fn view(&self) -> StateView<'_> {
        StateView {
            version: self.version,
            screen: self.current.screen,
            loading: self.current.loading,
            error_message: self.current.error_message.as_deref(),
            payload: &self.current.payload,
            error_cstr: self.error_cstr.as_deref(),
        }
    }

    pub fn counter(&self) -> i64 {
        leading_i64(&self.current.payload)
    }

    /// Publish `next` and advance the version by exactly one.
    pub(crate) fn commit(&mut self, next: StateDraft) -> u64 {
        if next.error_message != self.current.error_message {
            self.error_cstr = to_cstring(next.error_message.as_deref());
        }
        self.current = next;
        self.version += 1;
        self.version
    }
}

fn to_cstring(message: Option<&str>) -> Option<CString> {
    message.map(|m| {
        let bytes: Vec<u8> = m.bytes().filter(|b| *b != 0).collect();
        CString::new(bytes).unwrap_or_default()
    })
}

fn leading_i64(payload: &[u8]) -> i64 {
    payload
        .get(..8)
        .and_then(|b| b.try_into().ok())
        .map(i64::from_le_bytes)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_cell_starts_at_version_zero() {
        let cell = StateCell::new(StateDraft::default());
        assert_eq!(cell.version(), 0);
        assert!(cell.view().payload.is_empty());
        assert_eq!(cell.counter(), 0);
    }

    #[test]
    fn commit_bumps_version_by_one() {
        let mut cell = StateCell::new(StateDraft::default());
        assert_eq!(cell.commit(StateDraft::with_payload(vec![1])), 1);
        assert_eq!(cell.commit(StateDraft::with_payload(vec![2])), 2);
        assert_eq!(cell.view().payload, &[2]);
    }

    #[test]
    fn counter_reads_leading_field() {
        let mut payload = 42i64.to_le_bytes().to_vec();
        payload.extend_from_slice(&[9, 9, 9]);
        let cell = StateCell::new(StateDraft::with_payload(payload));
        assert_eq!(cell.counter(), 42);
        assert_eq!(cell.view().counter(), 42);
    }

    #[test]
    fn error_message_gets_a_c_string() {
        let mut cell = StateCell::new(StateDraft::default());
        assert!(cell.view().error_message_cstr().is_none());

        cell.commit(StateDraft {
            error_message: Some("bad\0input".to_string()),
            ..StateDraft::default()
        });
        let view = cell.view();
        assert_eq!(view.error_message, Some("bad\0input"));
        assert_eq!(view.error_message_cstr().map(|c| c.to_bytes()), Some(&b"badinput"[..]));
    }

    #[test]
    fn view_round_trips_to_draft() {
        let draft = StateDraft {
            screen: 3,
            loading: true,
            error_message: None,
            payload: vec![1, 2, 3],
        };
        let cell = StateCell::new(draft.clone());
        assert_eq!(cell.view().to_draft(), draft);
    }
}
