//! The `<stdlib.h>` calls that can fail with `errno`: environment,
//! temporary files, path resolution, pseudo-terminals, numeric parsing and
//! `system`.

use core::ffi::CStr;
use std::ffi::CString;

use libc::c_char;
use libc::c_double;
use libc::c_float;
use libc::c_int;
use libc::c_long;
use libc::c_longlong;
use libc::c_ulong;
use libc::c_ulonglong;

use crate::errno::cvt;
use crate::errno::cvt_errno;
use crate::errno::cvt_ptr;
use crate::errno::cvt_status;
use crate::errno::last_error;
use crate::error::Error;
use crate::handle::HandleId;

/// Copies a C string the platform owns.
///
/// # Safety
///
/// `ptr` must point to a NUL-terminated string.
unsafe fn copy_c_str(ptr: *const c_char) -> CString {
    unsafe { CStr::from_ptr(ptr) }.to_owned()
}

fn template_buf(template: &CStr) -> Vec<u8> {
    template.to_bytes_with_nul().to_vec()
}

fn into_c_string(mut buf: Vec<u8>) -> CString {
    buf.pop();
    // The platform only substitutes the trailing `X`s, never with NUL.
    CString::new(buf).unwrap_or_default()
}

/// An unset variable is `None`, not an error.
pub fn getenv(name: &CStr) -> Option<CString> {
    let value = unsafe { libc::getenv(name.as_ptr()) };
    if value.is_null() {
        None
    } else {
        Some(unsafe { copy_c_str(value) })
    }
}

/// # Safety
///
/// No other thread may read or write the environment concurrently.
pub unsafe fn setenv(name: &CStr, value: &CStr, overwrite: bool) -> Result<(), Error> {
    cvt_status(unsafe { libc::setenv(name.as_ptr(), value.as_ptr(), overwrite as c_int) })
}

/// # Safety
///
/// No other thread may read or write the environment concurrently.
pub unsafe fn unsetenv(name: &CStr) -> Result<(), Error> {
    cvt_status(unsafe { libc::unsetenv(name.as_ptr()) })
}

/// Adds `string`, of the form `NAME=value`, to the environment. The
/// environment keeps pointing at it, so it is leaked on success.
///
/// # Safety
///
/// No other thread may read or write the environment concurrently.
pub unsafe fn putenv(string: CString) -> Result<(), Error> {
    let raw = string.into_raw();
    if unsafe { libc::putenv(raw) } != 0 {
        let err = last_error();
        drop(unsafe { CString::from_raw(raw) });
        return Err(err);
    }

    Ok(())
}

/// Creates and opens a unique file from `template`, which must end in
/// `XXXXXX`. Returns the descriptor and the chosen path.
pub fn mkstemp(template: &CStr) -> Result<(HandleId, CString), Error> {
    let mut buf = template_buf(template);
    let fd = cvt(unsafe { libc::mkstemp(buf.as_mut_ptr() as *mut c_char) })?;
    Ok((HandleId::from_raw(fd), into_c_string(buf)))
}

/// Creates a unique directory from `template`, which must end in `XXXXXX`.
pub fn mkdtemp(template: &CStr) -> Result<CString, Error> {
    let mut buf = template_buf(template);
    cvt_ptr(unsafe { libc::mkdtemp(buf.as_mut_ptr() as *mut c_char) })?;
    Ok(into_c_string(buf))
}

pub fn realpath(path: &CStr) -> Result<CString, Error> {
    let resolved = cvt_ptr(unsafe { libc::realpath(path.as_ptr(), core::ptr::null_mut()) })?;
    let owned = unsafe { copy_c_str(resolved.as_ptr()) };
    unsafe { libc::free(resolved.as_ptr() as *mut libc::c_void) };
    Ok(owned)
}

pub fn posix_openpt(oflag: c_int) -> Result<HandleId, Error> {
    let fd = cvt(unsafe { libc::posix_openpt(oflag) })?;
    Ok(HandleId::from_raw(fd))
}

pub fn grantpt(fildes: HandleId) -> Result<(), Error> {
    cvt_status(unsafe { libc::grantpt(fildes.as_raw()) })
}

pub fn unlockpt(fildes: HandleId) -> Result<(), Error> {
    cvt_status(unsafe { libc::unlockpt(fildes.as_raw()) })
}

/// The platform returns a static buffer, so the name is copied out.
pub fn ptsname(fildes: HandleId) -> Result<CString, Error> {
    let name = cvt_ptr(unsafe { libc::ptsname(fildes.as_raw()) })?;
    Ok(unsafe { copy_c_str(name.as_ptr()) })
}

/// Runs one of the `strto*` parsers over `s`, returning the value and the
/// number of bytes consumed. `ERANGE` and `EINVAL` are only visible through
/// `errno`, so it is cleared first.
fn parse<T>(s: &CStr, f: impl FnOnce(*const c_char, *mut *mut c_char) -> T) -> Result<(T, usize), Error> {
    let mut end: *mut c_char = core::ptr::null_mut();
    let value = cvt_errno(|| f(s.as_ptr(), &mut end as *mut *mut c_char))?;
    let consumed = if end.is_null() {
        0
    } else {
        // SAFETY: the parser leaves `end` inside `s`.
        unsafe { end.offset_from(s.as_ptr()) as usize }
    };

    Ok((value, consumed))
}

/// No digits at all is `Ok((0, 0))`, not an error.
pub fn strtol(s: &CStr, base: c_int) -> Result<(c_long, usize), Error> {
    parse(s, |ptr, end| unsafe { libc::strtol(ptr, end, base) })
}

pub fn strtoll(s: &CStr, base: c_int) -> Result<(c_longlong, usize), Error> {
    parse(s, |ptr, end| unsafe { libc::strtoll(ptr, end, base) })
}

pub fn strtoul(s: &CStr, base: c_int) -> Result<(c_ulong, usize), Error> {
    parse(s, |ptr, end| unsafe { libc::strtoul(ptr, end, base) })
}

pub fn strtoull(s: &CStr, base: c_int) -> Result<(c_ulonglong, usize), Error> {
    parse(s, |ptr, end| unsafe { libc::strtoull(ptr, end, base) })
}

pub fn strtod(s: &CStr) -> Result<(c_double, usize), Error> {
    parse(s, |ptr, end| unsafe { libc::strtod(ptr, end) })
}

pub fn strtof(s: &CStr) -> Result<(c_float, usize), Error> {
    parse(s, |ptr, end| unsafe { libc::strtof(ptr, end) })
}

/// Returns the raw wait status of the shell.
pub fn system(command: &CStr) -> Result<c_int, Error> {
    cvt(unsafe { libc::system(command.as_ptr()) })
}
