//! Translation of `errno`-style failures into [`Error`].
//!
//! Every helper here inspects a raw return value and, on failure, reads the
//! thread-local `errno` in the same expression. Callers must pass the raw
//! value straight from the platform call with nothing fallible in between.

use core::ptr::NonNull;

use nix::errno::Errno;

use crate::error::Error;

/// Captures the calling thread's `errno` as an [`Error`].
pub fn last_error() -> Error {
    Error::new(Errno::last_raw())
}

/// Resets `errno` to zero.
pub fn clear() {
    Errno::clear();
}

/// Raw return types that signal failure by being negative.
pub trait RawRet: Copy {
    fn signals_failure(self) -> bool;
    fn is_minus_one(self) -> bool;
}

macro_rules! impl_raw_ret {
    ($($t:ty),*) => {
        $(
            impl RawRet for $t {
                fn signals_failure(self) -> bool {
                    self < 0
                }

                fn is_minus_one(self) -> bool {
                    self == -1
                }
            }
        )*
    };
}

impl_raw_ret!(i32, i64, isize);

/// A negative `ret` is a failure described by `errno`.
pub fn cvt<T: RawRet>(ret: T) -> Result<T, Error> {
    if ret.signals_failure() {
        Err(last_error())
    } else {
        Ok(ret)
    }
}

/// Like [`cvt`], for calls where other negative values are legitimate
/// results (`fcntl(F_GETOWN)` returns a negated process group). Only `-1`
/// is a failure.
pub fn cvt_minus_one<T: RawRet>(ret: T) -> Result<T, Error> {
    if ret.is_minus_one() {
        Err(last_error())
    } else {
        Ok(ret)
    }
}

/// A nonzero `ret` is a failure described by `errno`.
pub fn cvt_status(ret: libc::c_int) -> Result<(), Error> {
    if ret != 0 {
        Err(last_error())
    } else {
        Ok(())
    }
}

/// A nonzero `ret` is itself the error code; `errno` is not consulted.
pub fn cvt_code(ret: libc::c_int) -> Result<(), Error> {
    if ret != 0 {
        Err(Error::new(ret))
    } else {
        Ok(())
    }
}

/// A null `ptr` is a failure described by `errno`.
pub fn cvt_ptr<T>(ptr: *mut T) -> Result<NonNull<T>, Error> {
    NonNull::new(ptr).ok_or_else(last_error)
}

/// Runs `f` with `errno` cleared beforehand.
///
/// For calls where `-1` is also a legitimate result: it is a failure only if
/// `f` changed `errno`. A `-1` that left `errno` at zero yields `Ok(None)`.
pub fn cvt_cleared<T: RawRet>(f: impl FnOnce() -> T) -> Result<Option<T>, Error> {
    clear();
    let ret = f();
    if !ret.is_minus_one() {
        return Ok(Some(ret));
    }

    match Errno::last_raw() {
        0 => Ok(None),
        code => Err(Error::new(code)),
    }
}

/// Runs `f` with `errno` cleared beforehand. Any change to `errno` is a
/// failure whatever `f` returned, as with `strtol` reporting `ERANGE`.
pub fn cvt_errno<T>(f: impl FnOnce() -> T) -> Result<T, Error> {
    clear();
    let ret = f();
    match Errno::last_raw() {
        0 => Ok(ret),
        code => Err(Error::new(code)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cvt_passes_success_through() {
        assert_eq!(cvt(5i32), Ok(5));
        assert_eq!(cvt(0isize), Ok(0));
    }

    #[test]
    fn test_cvt_captures_errno() {
        Errno::set_raw(libc::EAGAIN);
        let err = cvt(-1i64).unwrap_err();
        assert_eq!(err.code(), libc::EAGAIN);
        assert!(!err.message().is_empty());
    }

    #[test]
    fn test_cvt_minus_one_keeps_other_negatives() {
        assert_eq!(cvt_minus_one(-7382i32), Ok(-7382));

        Errno::set_raw(libc::EBADF);
        assert_eq!(cvt_minus_one(-1i32).unwrap_err().code(), libc::EBADF);
    }

    #[test]
    fn test_cvt_code_ignores_errno() {
        Errno::set_raw(libc::EPERM);
        let err = cvt_code(libc::EINVAL).unwrap_err();
        assert_eq!(err.code(), libc::EINVAL);
        assert_eq!(cvt_code(0), Ok(()));
    }

    #[test]
    fn test_cvt_ptr() {
        let mut value = 1u8;
        assert!(cvt_ptr(&mut value as *mut u8).is_ok());

        Errno::set_raw(libc::ENOMEM);
        let err = cvt_ptr(core::ptr::null_mut::<u8>()).unwrap_err();
        assert_eq!(err.code(), libc::ENOMEM);
    }

    #[test]
    fn test_cvt_cleared_distinguishes_no_value() {
        assert_eq!(cvt_cleared(|| -1i64), Ok(None));
        assert_eq!(cvt_cleared(|| 42i64), Ok(Some(42)));

        let err = cvt_cleared(|| {
            Errno::set_raw(libc::EINVAL);
            -1i64
        })
        .unwrap_err();
        assert_eq!(err.code(), libc::EINVAL);
    }

    #[test]
    fn test_cvt_errno_ignores_return_value() {
        assert_eq!(cvt_errno(|| i64::MAX), Ok(i64::MAX));

        let err = cvt_errno(|| {
            Errno::set_raw(libc::ERANGE);
            0.0f64
        })
        .unwrap_err();
        assert_eq!(err.code(), libc::ERANGE);
    }
}
