//! `extern "C"` entry points.

use std::ffi::{c_char, c_void};
use std::panic::{self, AssertUnwindSafe};
use std::ptr;

use libc::size_t;

use crate::abi::host::{self, AbiState};
use crate::config::RuntimeConfig;
use crate::error::{ResultCode, RuntimeError};
use crate::logging;
use crate::runtime::DiffSummary;
use crate::ABI_VERSION;

/// Run `f`, turning a panic into `fallback` plus a last-error message.
fn guard<T>(fallback: T, f: impl FnOnce() -> T) -> T {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(_) => {
            host::set_last_error("internal panic in runtime entry point");
            fallback
        }
    }
}

/// Record a failure as the last error and hand it back.
fn fail(err: RuntimeError) -> RuntimeError {
    host::set_last_error(&err.to_string());
    err
}

fn status(result: Result<(), RuntimeError>) -> i32 {
    match result {
        Ok(()) => ResultCode::Ok.as_i32(),
        Err(err) => fail(err).code().as_i32(),
    }
}

/// Borrow a caller buffer. A null pointer is only accepted with length 0.
unsafe fn payload_slice<'a>(payload: *const c_void, len: size_t) -> Result<&'a [u8], RuntimeError> {
    if len == 0 {
        return Ok(&[]);
    }
    if payload.is_null() {
        return Err(RuntimeError::InvalidArgument(format!(
            "null payload with length {}",
            len
        )));
    }
    // SAFETY: the caller guarantees `payload` points to `len` readable bytes.
    Ok(unsafe { std::slice::from_raw_parts(payload.cast::<u8>(), len) })
}

fn saturating_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

// === Lifecycle ===

/// Initialize the runtime. Fails with `AlreadyInitialized` on a second call.
///
/// Loads configuration from `EMBERCORE_CONFIG` (or the platform config
/// directory); a broken config file fails with `InvalidArgument`. The
/// double-init check comes first, so a live runtime is never blamed on the
/// config file.
#[no_mangle]
pub extern "C" fn ember_init() -> i32 {
    guard(ResultCode::DispatchFailed.as_i32(), || {
        if host::is_initialized() {
            return status(Err(RuntimeError::AlreadyInitialized));
        }
        let config = match RuntimeConfig::load() {
            Ok(config) => config,
            Err(err) => return status(Err(err.into())),
        };
        logging::init_tracing(&config.logging.filter);
        status(host::init(&config))
    })
}

/// Release the runtime. Fails with `NotInitialized` when nothing is live.
#[no_mangle]
pub extern "C" fn ember_deinit() -> i32 {
    guard(ResultCode::DispatchFailed.as_i32(), || status(host::deinit()))
}

/// ABI version of this library. Callable before `ember_init`.
#[no_mangle]
pub extern "C" fn ember_get_abi_version() -> u32 {
    ABI_VERSION
}

// === State access ===

/// Current state, or null when not initialized.
///
/// The pointer stays valid until the next mutating call.
#[no_mangle]
pub extern "C" fn ember_get_state() -> *const AbiState {
    guard(ptr::null(), || host::publish_state().unwrap_or_else(|err| {
        fail(err);
        ptr::null()
    }))
}

/// Current version, or 0 when not initialized.
#[no_mangle]
pub extern "C" fn ember_get_state_version() -> u64 {
    guard(0, || {
        host::with_runtime(|rt| rt.version()).unwrap_or_else(|err| {
            fail(err);
            0
        })
    })
}

/// Leading `i64` of the payload, or 0 when not initialized.
#[no_mangle]
pub extern "C" fn ember_get_counter() -> i64 {
    guard(0, || {
        host::with_runtime(|rt| rt.counter()).unwrap_or_else(|err| {
            fail(err);
            0
        })
    })
}

// === Dispatch ===

/// Apply one event synchronously.
///
/// # Safety
/// `payload` must be null or point to `payload_len` readable bytes for the
/// duration of the call. The bytes are copied; the buffer may be freed
/// afterwards.
#[no_mangle]
pub unsafe extern "C" fn ember_dispatch(
    event_type: u32,
    payload: *const c_void,
    payload_len: size_t,
) -> i32 {
    guard(ResultCode::DispatchFailed.as_i32(), || {
        // SAFETY: forwarded from the caller's contract.
        let bytes = match unsafe { payload_slice(payload, payload_len) } {
            Ok(bytes) => bytes,
            Err(err) => return status(Err(err)),
        };
        let result = host::with_runtime(|rt| rt.dispatch(event_type, bytes).map(|_| ()))
            .and_then(|inner| inner);
        status(result)
    })
}

// === Event queue ===

/// Copy an event into the queue. Fails with `QueueFull` at capacity.
///
/// # Safety
/// Same contract as [`ember_dispatch`].
#[no_mangle]
pub unsafe extern "C" fn ember_queue_event(
    event_type: u32,
    payload: *const c_void,
    payload_len: size_t,
    priority: u8,
) -> i32 {
    guard(ResultCode::DispatchFailed.as_i32(), || {
        // SAFETY: forwarded from the caller's contract.
        let bytes = match unsafe { payload_slice(payload, payload_len) } {
            Ok(bytes) => bytes,
            Err(err) => return status(Err(err)),
        };
        let result = host::with_runtime(|rt| rt.queue_event(event_type, bytes, priority))
            .and_then(|inner| inner);
        status(result)
    })
}

/// Apply up to `max_events` queued events; returns how many succeeded.
///
/// A queued event whose reducer fails is discarded and its error becomes
/// the last error.
#[no_mangle]
pub extern "C" fn ember_process_events(max_events: u32) -> u32 {
    guard(0, || match host::with_runtime(|rt| rt.process_events(max_events)) {
        Ok(report) => {
            if let Some(message) = report.last_error {
                host::set_last_error(&message);
            }
            report.processed
        }
        Err(err) => {
            fail(err);
            0
        }
    })
}

/// Pending event count.
#[no_mangle]
pub extern "C" fn ember_queue_depth() -> u32 {
    guard(0, || {
        host::with_runtime(|rt| saturating_u32(rt.queue_depth())).unwrap_or_else(|err| {
            fail(err);
            0
        })
    })
}

/// Discard every pending event.
#[no_mangle]
pub extern "C" fn ember_queue_clear() {
    guard((), || {
        if let Err(err) = host::with_runtime(|rt| {
            rt.queue_clear();
        }) {
            fail(err);
        }
    })
}

// === Change tracking ===

/// Diff of the latest observed call, or null when not initialized.
#[no_mangle]
pub extern "C" fn ember_get_diff() -> *const DiffSummary {
    guard(ptr::null(), || host::publish_diff().unwrap_or_else(|err| {
        fail(err);
        ptr::null()
    }))
}

/// Whether `field_id` changed in the latest observed call.
///
/// Out-of-range ids are simply `false`.
#[no_mangle]
pub extern "C" fn ember_field_changed(field_id: u16) -> bool {
    guard(false, || {
        host::with_runtime(|rt| rt.field_changed(field_id)).unwrap_or_else(|err| {
            fail(err);
            false
        })
    })
}

// === Errors ===

/// Last error text; never null.
#[no_mangle]
pub extern "C" fn ember_get_last_error() -> *const c_char {
    host::last_error_ptr()
}

// === Utility ===

/// Copy `src_len` bytes of `src` into `dst`, always NUL-terminating.
///
/// Copies at most `dst_len - 1` bytes and returns how many were copied.
///
/// # Safety
/// `src` must be null or readable for `src_len` bytes; `dst` must be null or
/// writable for `dst_len` bytes. The regions must not overlap.
#[no_mangle]
pub unsafe extern "C" fn ember_copy_string(
    src: *const c_char,
    src_len: size_t,
    dst: *mut c_char,
    dst_len: size_t,
) -> size_t {
    if dst.is_null() || dst_len == 0 {
        return 0;
    }
    let count = if src.is_null() { 0 } else { src_len.min(dst_len - 1) };
    // SAFETY: both regions are valid for `count` bytes per the caller's contract,
    // and `dst` has room for the terminator at `count < dst_len`.
    unsafe {
        if count > 0 {
            ptr::copy_nonoverlapping(src, dst, count);
        }
        *dst.add(count) = 0;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_string_truncates_and_terminates() {
        let src = b"hello world";
        let mut dst = [0x7f as c_char; 6];
        let copied = unsafe {
            ember_copy_string(src.as_ptr().cast(), src.len(), dst.as_mut_ptr(), dst.len())
        };
        assert_eq!(copied, 5);
        let bytes: Vec<u8> = dst.iter().map(|c| *c as u8).collect();
        assert_eq!(&bytes, b"hello\0");
    }

    #[test]
    fn copy_string_handles_null_and_empty() {
        let mut dst = [0x7f as c_char; 4];
        assert_eq!(unsafe { ember_copy_string(ptr::null(), 3, dst.as_mut_ptr(), 4) }, 0);
        assert_eq!(dst[0], 0);
        assert_eq!(unsafe { ember_copy_string(b"x".as_ptr().cast(), 1, ptr::null_mut(), 4) }, 0);
        assert_eq!(unsafe { ember_copy_string(b"x".as_ptr().cast(), 1, dst.as_mut_ptr(), 0) }, 0);
    }

    #[test]
    fn null_payload_needs_zero_length() {
        assert!(unsafe { payload_slice(ptr::null(), 0) }.unwrap().is_empty());
        assert!(unsafe { payload_slice(ptr::null(), 4) }.is_err());
    }

    #[test]
    fn abi_version_is_exported() {
        assert_eq!(ember_get_abi_version(), ABI_VERSION);
    }
}
