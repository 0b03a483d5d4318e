//! The single fatal-error funnel.

use libc::c_char;
use std::ffi::CStr;
use std::fmt::Display;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::process;

/// Print the message to stderr and terminate the process.
pub(crate) fn fatal(message: impl Display) -> ! {
    eprintln!("[ERROR]: {message}");
    process::exit(1);
}

/// Run an adapter body, routing both typed errors and panics (including
/// panics raised inside the tensor library bindings) through [`fatal`].
pub(crate) fn guard<T, E: Display>(f: impl FnOnce() -> Result<T, E>) -> T {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => value,
        Ok(Err(error)) => fatal(error),
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unrecoverable internal error".to_string());
            fatal(message)
        }
    }
}

/// Borrow a C string as UTF-8, or fault.
pub(crate) unsafe fn cstr<'a>(ptr: *const c_char) -> Result<&'a str, String> {
    if ptr.is_null() {
        return Err("null string pointer".to_string());
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|_| "string argument is not valid UTF-8".to_string())
}
