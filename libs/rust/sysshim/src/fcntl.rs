//! File control.

use core::ffi::CStr;

use libc::c_int;
use libc::mode_t;
use libc::off_t;

use crate::errno::cvt;
use crate::errno::cvt_minus_one;
#[cfg(any(target_os = "linux", target_os = "android"))]
use crate::errno::cvt_code;
use crate::error::Error;
use crate::handle::HandleId;

pub fn open(path: &CStr, oflag: c_int) -> Result<HandleId, Error> {
    let fd = cvt(unsafe { libc::open(path.as_ptr(), oflag) })?;
    Ok(HandleId::from_raw(fd))
}

/// `open` with the permission bits used when `oflag` contains `O_CREAT`.
pub fn open_with_mode(path: &CStr, oflag: c_int, mode: mode_t) -> Result<HandleId, Error> {
    let fd = cvt(unsafe { libc::open(path.as_ptr(), oflag, mode as libc::c_uint) })?;
    Ok(HandleId::from_raw(fd))
}

pub fn creat(path: &CStr, mode: mode_t) -> Result<HandleId, Error> {
    let fd = cvt(unsafe { libc::creat(path.as_ptr(), mode) })?;
    Ok(HandleId::from_raw(fd))
}

// fcntl fails with exactly -1; `F_GETOWN` may return other negative values.

/// `fcntl` for commands without an argument (`F_GETFD`, `F_GETFL`, ...).
pub fn fcntl(fildes: HandleId, cmd: c_int) -> Result<c_int, Error> {
    cvt_minus_one(unsafe { libc::fcntl(fildes.as_raw(), cmd) })
}

/// `fcntl` for commands taking an integer (`F_DUPFD`, `F_SETFD`, `F_SETFL`, ...).
pub fn fcntl_arg(fildes: HandleId, cmd: c_int, arg: c_int) -> Result<c_int, Error> {
    cvt_minus_one(unsafe { libc::fcntl(fildes.as_raw(), cmd, arg) })
}

/// `fcntl` for the record locking commands (`F_GETLK`, `F_SETLK`, `F_SETLKW`).
pub fn fcntl_lock(fildes: HandleId, cmd: c_int, lock: &mut libc::flock) -> Result<c_int, Error> {
    cvt_minus_one(unsafe { libc::fcntl(fildes.as_raw(), cmd, lock as *mut libc::flock) })
}

// Both return the error number instead of setting errno.
#[cfg(any(target_os = "linux", target_os = "android"))]
pub fn posix_fadvise(fd: HandleId, offset: off_t, len: off_t, advice: c_int) -> Result<(), Error> {
    cvt_code(unsafe { libc::posix_fadvise(fd.as_raw(), offset, len, advice) })
}

#[cfg(any(target_os = "linux", target_os = "android"))]
pub fn posix_fallocate(fd: HandleId, offset: off_t, len: off_t) -> Result<(), Error> {
    cvt_code(unsafe { libc::posix_fallocate(fd.as_raw(), offset, len) })
}
