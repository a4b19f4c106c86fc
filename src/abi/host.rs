//! Process-wide runtime context behind a single lock.
//!
//! Exactly one [`Runtime`] can be live per process. The `Option` makes the
//! initialized/not-initialized state explicit; the lock serializes every
//! reader and writer, whatever thread the host platform calls from.

use std::ffi::{c_char, c_void, CStr, CString};
use std::ptr;

use parking_lot::{const_mutex, Mutex};

use crate::config::RuntimeConfig;
use crate::demo;
use crate::error::RuntimeError;
use crate::runtime::{DiffSummary, Runtime};

const UNKNOWN_ERROR: &CStr = match CStr::from_bytes_with_nul(b"Unknown error\0") {
    Ok(s) => s,
    Err(_) => panic!("sentinel must be NUL-terminated"),
};

/// C-layout view of the current state, handed out by `ember_get_state`.
///
/// Pointers reference memory owned by the live runtime and stay valid until
/// the next mutating call (`ember_dispatch`, `ember_process_events`,
/// `ember_deinit`).
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct AbiState {
    pub version: u64,
    pub screen: u32,
    pub loading: bool,
    /// NUL-terminated, or null when there is no error.
    pub error_message: *const c_char,
    pub payload: *const c_void,
    pub payload_len: usize,
}

impl AbiState {
    const EMPTY: AbiState = AbiState {
        version: 0,
        screen: 0,
        loading: false,
        error_message: ptr::null(),
        payload: ptr::null(),
        payload_len: 0,
    };

    fn capture(runtime: &Runtime) -> Self {
        let view = runtime.state();
        AbiState {
            version: view.version,
            screen: view.screen,
            loading: view.loading,
            error_message: view
                .error_message_cstr()
                .map_or(ptr::null(), |c| c.as_ptr()),
            payload: if view.payload.is_empty() {
                ptr::null()
            } else {
                view.payload.as_ptr().cast()
            },
            payload_len: view.payload.len(),
        }
    }

    /// Borrow the payload bytes.
    ///
    /// # Safety
    /// The state must come from `ember_get_state` and no mutating call may
    /// have happened since.
    pub unsafe fn payload_bytes(&self) -> &[u8] {
        if self.payload.is_null() {
            &[]
        } else {
            // SAFETY: the caller guarantees the runtime has not mutated since capture.
            unsafe { std::slice::from_raw_parts(self.payload.cast::<u8>(), self.payload_len) }
        }
    }
}

struct Host {
    runtime: Option<Runtime>,
    published_state: AbiState,
    published_diff: DiffSummary,
}

// SAFETY: the raw pointers in `published_state` point into the runtime owned
// by the same `Host` and are only dereferenced by foreign callers; Rust never
// reads through them while the lock is held by another thread.
unsafe impl Send for Host {}

static HOST: Mutex<Host> = const_mutex(Host {
    runtime: None,
    published_state: AbiState::EMPTY,
    published_diff: DiffSummary {
        changed_mask: 0,
        change_count: 0,
        version: 0,
    },
});

static LAST_ERROR: Mutex<Option<CString>> = const_mutex(None);

/// Create the runtime with the bundled demo reducers.
pub fn init(config: &RuntimeConfig) -> Result<(), RuntimeError> {
    install(Runtime::with_initial_state(
        config,
        demo::registry(),
        demo::initial_state(),
    ))
}

/// Make `runtime` the process-wide instance served by the C entry points.
///
/// Lets a Rust embedder register its own reducers and still expose them to
/// foreign shells.
pub fn install(runtime: Runtime) -> Result<(), RuntimeError> {
    let mut host = HOST.lock();
    if host.runtime.is_some() {
        return Err(RuntimeError::AlreadyInitialized);
    }
    tracing::info!(
        queue_capacity = runtime.queue_capacity(),
        reducers = runtime.registry().len(),
        "Runtime initialized"
    );
    host.runtime = Some(runtime);
    host.published_state = AbiState::EMPTY;
    host.published_diff = DiffSummary::default();
    drop(host);
    clear_last_error();
    Ok(())
}

/// Tear down the live runtime, discarding pending events.
pub fn deinit() -> Result<(), RuntimeError> {
    let mut host = HOST.lock();
    let runtime = host.runtime.take().ok_or(RuntimeError::NotInitialized)?;
    host.published_state = AbiState::EMPTY;
    host.published_diff = DiffSummary::default();
    drop(host);
    tracing::info!(
        version = runtime.version(),
        discarded = runtime.queue_depth(),
        "Runtime shut down"
    );
    clear_last_error();
    Ok(())
}

pub fn is_initialized() -> bool {
    HOST.lock().runtime.is_some()
}

/// Run `f` against the live runtime inside the critical section.
pub fn with_runtime<R>(f: impl FnOnce(&mut Runtime) -> R) -> Result<R, RuntimeError> {
    let mut host = HOST.lock();
    let runtime = host.runtime.as_mut().ok_or(RuntimeError::NotInitialized)?;
    Ok(f(runtime))
}

/// Refresh the published state view and return its stable address.
pub fn publish_state() -> Result<*const AbiState, RuntimeError> {
    let mut host = HOST.lock();
    let snapshot = AbiState::capture(host.runtime.as_ref().ok_or(RuntimeError::NotInitialized)?);
    host.published_state = snapshot;
    Ok(&host.published_state as *const AbiState)
}

/// Refresh the published diff and return its stable address.
pub fn publish_diff() -> Result<*const DiffSummary, RuntimeError> {
    let mut host = HOST.lock();
    let diff = host.runtime.as_ref().ok_or(RuntimeError::NotInitialized)?.diff();
    host.published_diff = diff;
    Ok(&host.published_diff as *const DiffSummary)
}

pub fn set_last_error(message: &str) {
    let bytes: Vec<u8> = message.bytes().filter(|b| *b != 0).collect();
    *LAST_ERROR.lock() = Some(CString::new(bytes).unwrap_or_default());
}

pub fn clear_last_error() {
    *LAST_ERROR.lock() = None;
}

/// Pointer to the last error text, or the "Unknown error" sentinel.
///
/// Valid until the next failing call, `init`, or `deinit`.
pub fn last_error_ptr() -> *const c_char {
    LAST_ERROR
        .lock()
        .as_ref()
        .map_or(UNKNOWN_ERROR.as_ptr(), |msg| msg.as_ptr())
}

/// Owned copy of the last error text.
pub fn last_error() -> Option<String> {
    LAST_ERROR
        .lock()
        .as_ref()
        .map(|msg| msg.to_string_lossy().into_owned())
}
