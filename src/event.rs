//! Event vocabulary shared by every shell.
//!
//! The event-type space is open: a fixed set of well-known codes, a custom
//! range that applications define for themselves, and an explicit
//! `Unknown` catch-all. Dispatching a code nobody handles is a no-op.

use std::fmt;

/// First code of the application-defined range.
pub const CUSTOM_BASE: u32 = 0x2000;

/// Typed view over a raw `u32` event code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    // Lifecycle (0x0000 - 0x00FF)
    AppInit,
    AppTerminate,
    AppForeground,
    AppBackground,
    AppLowMemory,

    // User interaction (0x0100 - 0x01FF)
    ButtonPress,
    TextInput,
    TextCommit,
    Selection,
    Scroll,
    Gesture,

    // Navigation (0x0200 - 0x02FF)
    Navigate,
    NavigateBack,
    TabSwitch,

    // Counter (0x1000 - 0x1FFF)
    CounterIncrement,
    CounterDecrement,
    CounterReset,

    /// Application-defined code at or above [`CUSTOM_BASE`].
    Custom(u32),
    /// Any other code. Always inert.
    Unknown(u32),
}

impl EventType {
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0x0001 => Self::AppInit,
            0x0002 => Self::AppTerminate,
            0x0003 => Self::AppForeground,
            0x0004 => Self::AppBackground,
            0x0005 => Self::AppLowMemory,
            0x0100 => Self::ButtonPress,
            0x0101 => Self::TextInput,
            0x0102 => Self::TextCommit,
            0x0103 => Self::Selection,
            0x0104 => Self::Scroll,
            0x0105 => Self::Gesture,
            0x0200 => Self::Navigate,
            0x0201 => Self::NavigateBack,
            0x0202 => Self::TabSwitch,
            0x1000 => Self::CounterIncrement,
            0x1001 => Self::CounterDecrement,
            0x1002 => Self::CounterReset,
            other if other >= CUSTOM_BASE => Self::Custom(other),
            other => Self::Unknown(other),
        }
    }

    pub fn raw(self) -> u32 {
        match self {
            Self::AppInit => 0x0001,
            Self::AppTerminate => 0x0002,
            Self::AppForeground => 0x0003,
            Self::AppBackground => 0x0004,
            Self::AppLowMemory => 0x0005,
            Self::ButtonPress => 0x0100,
            Self::TextInput => 0x0101,
            Self::TextCommit => 0x0102,
            Self::Selection => 0x0103,
            Self::Scroll => 0x0104,
            Self::Gesture => 0x0105,
            Self::Navigate => 0x0200,
            Self::NavigateBack => 0x0201,
            Self::TabSwitch => 0x0202,
            Self::CounterIncrement => 0x1000,
            Self::CounterDecrement => 0x1001,
            Self::CounterReset => 0x1002,
            Self::Custom(raw) | Self::Unknown(raw) => raw,
        }
    }

    pub fn is_unknown(self) -> bool {
        matches!(self, Self::Unknown(_))
    }
}

impl From<u32> for EventType {
    fn from(raw: u32) -> Self {
        Self::from_raw(raw)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom(raw) => write!(f, "Custom(0x{:04x})", raw),
            Self::Unknown(raw) => write!(f, "Unknown(0x{:04x})", raw),
            other => write!(f, "{:?}", other),
        }
    }
}

/// Queue priority. Higher values are dispatched first.
///
/// Any `u8` is valid; the named levels are the ones shells use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Priority(pub u8);

impl Priority {
    pub const LOW: Priority = Priority(0);
    pub const NORMAL: Priority = Priority(1);
    pub const HIGH: Priority = Priority(2);
    pub const IMMEDIATE: Priority = Priority(3);
}

impl From<u8> for Priority {
    fn from(raw: u8) -> Self {
        Priority(raw)
    }
}

/// A typed, optionally-payloaded request to mutate state.
///
/// Owns a copy of the caller's bytes, so the caller's buffer can be freed
/// as soon as the call that created the event returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub event_type: EventType,
    pub payload: Vec<u8>,
    pub priority: Priority,
}

impl Event {
    pub fn new(event_type: impl Into<EventType>, payload: &[u8]) -> Self {
        Self {
            event_type: event_type.into(),
            payload: payload.to_vec(),
            priority: Priority::NORMAL,
        }
    }

    pub fn bare(event_type: impl Into<EventType>) -> Self {
        Self::new(event_type, &[])
    }

    pub fn with_priority(mut self, priority: impl Into<Priority>) -> Self {
        self.priority = priority.into();
        self
    }

    pub fn raw_type(&self) -> u32 {
        self.event_type.raw()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_map_to_variants() {
        assert_eq!(EventType::from_raw(0x1000), EventType::CounterIncrement);
        assert_eq!(EventType::from_raw(0x0201), EventType::NavigateBack);
        assert_eq!(EventType::CounterReset.raw(), 0x1002);
    }

    #[test]
    fn custom_range_starts_at_base() {
        assert_eq!(EventType::from_raw(0x2000), EventType::Custom(0x2000));
        assert_eq!(EventType::from_raw(0x1fff), EventType::Unknown(0x1fff));
        assert!(EventType::from_raw(0x0006).is_unknown());
    }

    #[test]
    fn raw_survives_the_typed_view() {
        for raw in [0u32, 1, 5, 6, 0x0100, 0x0202, 0x0300, 0x1002, 0x1003, 0x2001, u32::MAX] {
            assert_eq!(EventType::from_raw(raw).raw(), raw);
        }
    }

    #[test]
    fn event_copies_payload() {
        let mut buf = b"Buy milk".to_vec();
        let event = Event::new(0x2001, &buf).with_priority(5);
        buf.clear();
        assert_eq!(event.payload, b"Buy milk");
        assert_eq!(event.priority, Priority(5));
        assert_eq!(event.raw_type(), 0x2001);
    }

    #[test]
    fn priorities_order_numerically() {
        assert!(Priority::IMMEDIATE > Priority::HIGH);
        assert!(Priority::HIGH > Priority::NORMAL);
        assert!(Priority::NORMAL > Priority::LOW);
        assert_eq!(Priority::default(), Priority::LOW);
    }
}
