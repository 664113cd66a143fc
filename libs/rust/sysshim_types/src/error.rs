use core::ffi::CStr;
use std::io;

use serde::Serialize;

/// The code carried by an [`Error`] when the platform does not define one
/// for the failure.
pub const UNDEFINED_ERROR: i32 = -1;

const UNDEFINED_MESSAGE: &str = "Undefined error";

/// A failed platform call.
///
/// There is exactly one error kind: callers distinguish failures by comparing
/// [`Error::code`] against the platform's `E*` constants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct Error {
    code: i32,
    message: String,
}

impl Error {
    /// Creates an error from a raw `errno` value.
    ///
    /// The description is looked up once, here. It never fails: if the
    /// platform has no text for `code`, a fixed string is used instead.
    pub fn new(code: i32) -> Error {
        let message = if code == UNDEFINED_ERROR {
            UNDEFINED_MESSAGE.to_string()
        } else {
            match describe(code) {
                Some(text) => format!("{}: {}", code, text),
                None => format!("{}: {}", code, UNDEFINED_MESSAGE),
            }
        };

        Error { code, message }
    }

    /// Creates an error for a failure that leaves `errno` unspecified.
    pub fn undefined() -> Error {
        Error::new(UNDEFINED_ERROR)
    }

    pub fn code(&self) -> i32 {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_undefined(&self) -> bool {
        self.code == UNDEFINED_ERROR
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> io::Error {
        if err.is_undefined() {
            io::Error::other(err)
        } else {
            io::Error::from_raw_os_error(err.code)
        }
    }
}

/// Looks up the platform's description of `code` with the reentrant
/// `strerror_r`.
fn describe(code: i32) -> Option<String> {
    let mut buf = [0 as libc::c_char; 256];
    let ret = unsafe { libc::strerror_r(code, buf.as_mut_ptr(), buf.len()) };
    if ret != 0 {
        return None;
    }

    // SAFETY: strerror_r NUL-terminates the buffer on success.
    let text = unsafe { CStr::from_ptr(buf.as_ptr()) };
    let text = text.to_string_lossy();
    if text.is_empty() {
        None
    } else {
        Some(text.into_owned())
    }
}
