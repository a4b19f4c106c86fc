//! The C ABI boundary.
//!
//! Every `ember_*` entry point takes and returns primitives (or pointers to
//! `#[repr(C)]` structs) and funnels through one global critical section in
//! [`host`]. Failures come back as an integer [`crate::ResultCode`]; the
//! matching human-readable text is available from `ember_get_last_error`.
//!
//! Entry points never unwind into the caller: panics are caught and turned
//! into a failure code plus a last-error message.

mod ffi;
pub mod host;

pub use ffi::*;
pub use host::AbiState;
