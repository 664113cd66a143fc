//! Process, file and terminal calls from `<unistd.h>`.
//!
//! Buffers are slices instead of pointer/length pairs and paths are
//! [`CStr`]s. Calls that return a C string into a caller buffer hand back
//! the `CStr` borrowed from that buffer.

use core::convert::Infallible;
use core::ffi::CStr;
use std::ffi::CString;

use libc::c_char;
use libc::c_int;
use libc::c_long;
use libc::c_uint;
use libc::gid_t;
use libc::off_t;
use libc::pid_t;
use libc::uid_t;
use libc::useconds_t;
use nix::errno::Errno;

use crate::errno::clear;
use crate::errno::cvt;
use crate::errno::cvt_cleared;
use crate::errno::cvt_code;
use crate::errno::cvt_ptr;
use crate::errno::cvt_status;
use crate::errno::last_error;
use crate::error::Error;
use crate::handle::HandleId;

mod ffi {
    use libc::c_char;
    use libc::c_int;
    use libc::size_t;

    unsafe extern "C" {
        pub fn confstr(name: c_int, buf: *mut c_char, len: size_t) -> size_t;
        pub fn ctermid(s: *mut c_char) -> *mut c_char;
        pub fn getlogin_r(name: *mut c_char, namesize: size_t) -> c_int;
        pub fn setpgrp() -> c_int;
        pub fn ualarm(usecs: libc::useconds_t, interval: libc::useconds_t) -> libc::useconds_t;
    }
}

/// Large enough for `L_ctermid` on every supported platform.
const CTERMID_BUF_LEN: usize = 1024;

/// Reads the NUL-terminated string a call left in `buf`.
fn c_str_in(buf: &[u8]) -> Result<&CStr, Error> {
    CStr::from_bytes_until_nul(buf).map_err(|_| Error::undefined())
}

/// Builds the NULL-terminated pointer array `exec*` expects.
fn c_str_array(items: &[&CStr]) -> Vec<*const c_char> {
    items
        .iter()
        .map(|s| s.as_ptr())
        .chain(core::iter::once(core::ptr::null()))
        .collect()
}

pub fn access(path: &CStr, amode: c_int) -> Result<(), Error> {
    cvt_status(unsafe { libc::access(path.as_ptr(), amode) })
}

pub fn alarm(seconds: c_uint) -> c_uint {
    unsafe { libc::alarm(seconds) }
}

pub fn chdir(path: &CStr) -> Result<(), Error> {
    cvt_status(unsafe { libc::chdir(path.as_ptr()) })
}

pub fn chown(path: &CStr, owner: uid_t, group: gid_t) -> Result<(), Error> {
    cvt_status(unsafe { libc::chown(path.as_ptr(), owner, group) })
}

pub fn close(fildes: HandleId) -> Result<(), Error> {
    cvt_status(unsafe { libc::close(fildes.as_raw()) })
}

/// Returns the buffer size needed for the whole value, including the NUL.
///
/// A variable without a value yields `Ok(0)`.
pub fn confstr(name: c_int, buf: &mut [u8]) -> Result<usize, Error> {
    clear();
    let len = unsafe { ffi::confstr(name, buf.as_mut_ptr() as *mut c_char, buf.len()) };
    if len == 0 {
        match Errno::last_raw() {
            0 => return Ok(0),
            code => return Err(Error::new(code)),
        }
    }

    Ok(len)
}

/// Returns the pathname of the controlling terminal.
///
/// The platform defines no error code for this call, so an empty result is
/// reported as [`Error::undefined`].
pub fn ctermid() -> Result<CString, Error> {
    let mut buf = [0 as c_char; CTERMID_BUF_LEN];
    let ptr = unsafe { ffi::ctermid(buf.as_mut_ptr()) };
    if ptr.is_null() {
        return Err(Error::undefined());
    }

    // SAFETY: ctermid wrote a NUL-terminated string into `buf`.
    let path = unsafe { CStr::from_ptr(ptr) };
    if path.is_empty() {
        return Err(Error::undefined());
    }

    Ok(path.to_owned())
}

pub fn dup(fildes: HandleId) -> Result<HandleId, Error> {
    let fd = cvt(unsafe { libc::dup(fildes.as_raw()) })?;
    Ok(HandleId::from_raw(fd))
}

pub fn dup2(fildes: HandleId, fildes2: HandleId) -> Result<HandleId, Error> {
    let fd = cvt(unsafe { libc::dup2(fildes.as_raw(), fildes2.as_raw()) })?;
    Ok(HandleId::from_raw(fd))
}

/// Only returns on failure.
pub fn execv(path: &CStr, argv: &[&CStr]) -> Result<Infallible, Error> {
    let argv = c_str_array(argv);
    unsafe { libc::execv(path.as_ptr(), argv.as_ptr()) };
    Err(last_error())
}

/// Only returns on failure.
pub fn execve(path: &CStr, argv: &[&CStr], envp: &[&CStr]) -> Result<Infallible, Error> {
    let argv = c_str_array(argv);
    let envp = c_str_array(envp);
    unsafe { libc::execve(path.as_ptr(), argv.as_ptr(), envp.as_ptr()) };
    Err(last_error())
}

/// Only returns on failure. `file` is searched for in `PATH`.
pub fn execvp(file: &CStr, argv: &[&CStr]) -> Result<Infallible, Error> {
    let argv = c_str_array(argv);
    unsafe { libc::execvp(file.as_ptr(), argv.as_ptr()) };
    Err(last_error())
}

pub fn _exit(status: c_int) -> ! {
    unsafe { libc::_exit(status) }
}

pub fn fchown(fildes: HandleId, owner: uid_t, group: gid_t) -> Result<(), Error> {
    cvt_status(unsafe { libc::fchown(fildes.as_raw(), owner, group) })
}

pub fn fchdir(fildes: HandleId) -> Result<(), Error> {
    cvt_status(unsafe { libc::fchdir(fildes.as_raw()) })
}

#[cfg(any(target_os = "linux", target_os = "android"))]
pub fn fdatasync(fildes: HandleId) -> Result<(), Error> {
    cvt_status(unsafe { libc::fdatasync(fildes.as_raw()) })
}

/// # Safety
///
/// In a multi-threaded program the child may only call async-signal-safe
/// functions until it execs or exits.
pub unsafe fn fork() -> Result<pid_t, Error> {
    cvt(unsafe { libc::fork() })
}

/// `Ok(None)` means the limit is indeterminate.
pub fn fpathconf(fildes: HandleId, name: c_int) -> Result<Option<c_long>, Error> {
    cvt_cleared(|| unsafe { libc::fpathconf(fildes.as_raw(), name) })
}

pub fn fsync(fildes: HandleId) -> Result<(), Error> {
    cvt_status(unsafe { libc::fsync(fildes.as_raw()) })
}

pub fn ftruncate(fildes: HandleId, length: off_t) -> Result<(), Error> {
    cvt_status(unsafe { libc::ftruncate(fildes.as_raw(), length) })
}

pub fn getcwd(buf: &mut [u8]) -> Result<&CStr, Error> {
    cvt_ptr(unsafe { libc::getcwd(buf.as_mut_ptr() as *mut c_char, buf.len()) })?;
    c_str_in(buf)
}

pub fn getegid() -> gid_t {
    unsafe { libc::getegid() }
}

pub fn geteuid() -> uid_t {
    unsafe { libc::geteuid() }
}

pub fn getgid() -> gid_t {
    unsafe { libc::getgid() }
}

/// With an empty `grouplist`, returns the number of supplementary groups.
pub fn getgroups(grouplist: &mut [gid_t]) -> Result<usize, Error> {
    let len = c_int::try_from(grouplist.len()).map_err(|_| Error::new(libc::EINVAL))?;
    let n = cvt(unsafe { libc::getgroups(len, grouplist.as_mut_ptr()) })?;
    Ok(n as usize)
}

/// Cannot fail.
pub fn gethostid() -> c_long {
    unsafe { libc::gethostid() }
}

pub fn gethostname(name: &mut [u8]) -> Result<&CStr, Error> {
    cvt_status(unsafe { libc::gethostname(name.as_mut_ptr() as *mut c_char, name.len()) })?;
    c_str_in(name)
}

/// The platform returns a static buffer, so the name is copied out.
/// Concurrent callers should prefer [`getlogin_r`].
pub fn getlogin() -> Result<CString, Error> {
    let name = cvt_ptr(unsafe { libc::getlogin() })?;
    Ok(unsafe { CStr::from_ptr(name.as_ptr()) }.to_owned())
}

// Returns the error number instead of setting errno.
pub fn getlogin_r(name: &mut [u8]) -> Result<&CStr, Error> {
    cvt_code(unsafe { ffi::getlogin_r(name.as_mut_ptr() as *mut c_char, name.len()) })?;
    c_str_in(name)
}

pub fn getpgid(pid: pid_t) -> Result<pid_t, Error> {
    cvt(unsafe { libc::getpgid(pid) })
}

pub fn getpgrp() -> pid_t {
    unsafe { libc::getpgrp() }
}

pub fn getpid() -> pid_t {
    unsafe { libc::getpid() }
}

pub fn getppid() -> pid_t {
    unsafe { libc::getppid() }
}

pub fn getsid(pid: pid_t) -> Result<pid_t, Error> {
    cvt(unsafe { libc::getsid(pid) })
}

pub fn getuid() -> uid_t {
    unsafe { libc::getuid() }
}

/// Tests whether `fildes` refers to a terminal.
///
/// "Not a terminal" (`ENOTTY`) is a plain `false`, not an error. Any other
/// code, such as `EBADF`, is.
pub fn isatty(fildes: HandleId) -> Result<bool, Error> {
    clear();
    if unsafe { libc::isatty(fildes.as_raw()) } == 1 {
        return Ok(true);
    }

    match Errno::last_raw() {
        libc::ENOTTY => Ok(false),
        0 => Err(Error::undefined()),
        code => Err(Error::new(code)),
    }
}

pub fn lchown(path: &CStr, owner: uid_t, group: gid_t) -> Result<(), Error> {
    cvt_status(unsafe { libc::lchown(path.as_ptr(), owner, group) })
}

pub fn link(path1: &CStr, path2: &CStr) -> Result<(), Error> {
    cvt_status(unsafe { libc::link(path1.as_ptr(), path2.as_ptr()) })
}

/// Locks, unlocks or tests a section of a file open for writing. `function`
/// is one of `F_LOCK`, `F_TLOCK`, `F_ULOCK` or `F_TEST`.
pub fn lockf(fildes: HandleId, function: c_int, size: off_t) -> Result<(), Error> {
    cvt_status(unsafe { libc::lockf(fildes.as_raw(), function, size) })
}

pub fn lseek(fildes: HandleId, offset: off_t, whence: c_int) -> Result<off_t, Error> {
    cvt(unsafe { libc::lseek(fildes.as_raw(), offset, whence) })
}

/// Returns the new nice value, which may legitimately be `-1`.
pub fn nice(incr: c_int) -> Result<c_int, Error> {
    let value = cvt_cleared(|| unsafe { libc::nice(incr) })?;
    Ok(value.unwrap_or(-1))
}

/// `Ok(None)` means the limit is indeterminate.
pub fn pathconf(path: &CStr, name: c_int) -> Result<Option<c_long>, Error> {
    cvt_cleared(|| unsafe { libc::pathconf(path.as_ptr(), name) })
}

/// Only returns once a signal handler has run, always with `EINTR`.
pub fn pause() -> Result<Infallible, Error> {
    unsafe { libc::pause() };
    Err(last_error())
}

/// Returns the read end and the write end, in that order.
pub fn pipe() -> Result<[HandleId; 2], Error> {
    let mut fds = [-1 as c_int; 2];
    cvt_status(unsafe { libc::pipe(fds.as_mut_ptr()) })?;
    Ok([HandleId::from_raw(fds[0]), HandleId::from_raw(fds[1])])
}

pub fn pread(fildes: HandleId, buf: &mut [u8], offset: off_t) -> Result<usize, Error> {
    let n = cvt(unsafe {
        libc::pread(
            fildes.as_raw(),
            buf.as_mut_ptr() as *mut libc::c_void,
            buf.len(),
            offset,
        )
    })?;
    Ok(n as usize)
}

pub fn pwrite(fildes: HandleId, buf: &[u8], offset: off_t) -> Result<usize, Error> {
    let n = cvt(unsafe {
        libc::pwrite(
            fildes.as_raw(),
            buf.as_ptr() as *const libc::c_void,
            buf.len(),
            offset,
        )
    })?;
    Ok(n as usize)
}

pub fn read(fildes: HandleId, buf: &mut [u8]) -> Result<usize, Error> {
    let n = cvt(unsafe {
        libc::read(
            fildes.as_raw(),
            buf.as_mut_ptr() as *mut libc::c_void,
            buf.len(),
        )
    })?;
    Ok(n as usize)
}

/// The link target is not NUL-terminated; only `buf[..n]` is meaningful.
pub fn readlink(path: &CStr, buf: &mut [u8]) -> Result<usize, Error> {
    let n = cvt(unsafe {
        libc::readlink(path.as_ptr(), buf.as_mut_ptr() as *mut c_char, buf.len())
    })?;
    Ok(n as usize)
}

pub fn rmdir(path: &CStr) -> Result<(), Error> {
    cvt_status(unsafe { libc::rmdir(path.as_ptr()) })
}

pub fn setegid(gid: gid_t) -> Result<(), Error> {
    cvt_status(unsafe { libc::setegid(gid) })
}

pub fn seteuid(uid: uid_t) -> Result<(), Error> {
    cvt_status(unsafe { libc::seteuid(uid) })
}

pub fn setgid(gid: gid_t) -> Result<(), Error> {
    cvt_status(unsafe { libc::setgid(gid) })
}

pub fn setpgid(pid: pid_t, pgid: pid_t) -> Result<(), Error> {
    cvt_status(unsafe { libc::setpgid(pid, pgid) })
}

/// Same as `setpgid(0, 0)`.
pub fn setpgrp() -> Result<(), Error> {
    cvt_status(unsafe { ffi::setpgrp() })
}

/// Pass `gid_t::MAX` (`-1` in C) to leave an id unchanged.
pub fn setregid(rgid: gid_t, egid: gid_t) -> Result<(), Error> {
    cvt_status(unsafe { libc::setregid(rgid, egid) })
}

/// Pass `uid_t::MAX` (`-1` in C) to leave an id unchanged.
pub fn setreuid(ruid: uid_t, euid: uid_t) -> Result<(), Error> {
    cvt_status(unsafe { libc::setreuid(ruid, euid) })
}

pub fn setsid() -> Result<pid_t, Error> {
    cvt(unsafe { libc::setsid() })
}

pub fn setuid(uid: uid_t) -> Result<(), Error> {
    cvt_status(unsafe { libc::setuid(uid) })
}

pub fn sleep(seconds: c_uint) -> c_uint {
    unsafe { libc::sleep(seconds) }
}

pub fn symlink(path1: &CStr, path2: &CStr) -> Result<(), Error> {
    cvt_status(unsafe { libc::symlink(path1.as_ptr(), path2.as_ptr()) })
}

pub fn sync() {
    unsafe { libc::sync() }
}

/// `Ok(None)` means the option has no limit.
pub fn sysconf(name: c_int) -> Result<Option<c_long>, Error> {
    cvt_cleared(|| unsafe { libc::sysconf(name) })
}

pub fn tcgetpgrp(fildes: HandleId) -> Result<pid_t, Error> {
    cvt(unsafe { libc::tcgetpgrp(fildes.as_raw()) })
}

pub fn tcsetpgrp(fildes: HandleId, pgid: pid_t) -> Result<(), Error> {
    cvt_status(unsafe { libc::tcsetpgrp(fildes.as_raw(), pgid) })
}

pub fn truncate(path: &CStr, length: off_t) -> Result<(), Error> {
    cvt_status(unsafe { libc::truncate(path.as_ptr(), length) })
}

/// The platform returns a static buffer, so the name is copied out before
/// returning. Concurrent callers should prefer [`ttyname_r`].
pub fn ttyname(fildes: HandleId) -> Result<CString, Error> {
    let name = cvt_ptr(unsafe { libc::ttyname(fildes.as_raw()) })?;
    // SAFETY: a non-null result points to a NUL-terminated string.
    Ok(unsafe { CStr::from_ptr(name.as_ptr()) }.to_owned())
}

// Returns the error number instead of setting errno.
pub fn ttyname_r(fildes: HandleId, name: &mut [u8]) -> Result<&CStr, Error> {
    cvt_code(unsafe { libc::ttyname_r(fildes.as_raw(), name.as_mut_ptr() as *mut c_char, name.len()) })?;
    c_str_in(name)
}

/// Returns the microseconds left on the previous timer. Failure is the
/// all-ones value.
pub fn ualarm(useconds: useconds_t, interval: useconds_t) -> Result<useconds_t, Error> {
    let remaining = unsafe { ffi::ualarm(useconds, interval) };
    if remaining == useconds_t::MAX {
        return Err(last_error());
    }

    Ok(remaining)
}

pub fn unlink(path: &CStr) -> Result<(), Error> {
    cvt_status(unsafe { libc::unlink(path.as_ptr()) })
}

pub fn usleep(useconds: useconds_t) -> Result<(), Error> {
    cvt_status(unsafe { libc::usleep(useconds) })
}

pub fn write(fildes: HandleId, buf: &[u8]) -> Result<usize, Error> {
    let n = cvt(unsafe {
        libc::write(
            fildes.as_raw(),
            buf.as_ptr() as *const libc::c_void,
            buf.len(),
        )
    })?;
    Ok(n as usize)
}

#[cfg(test)]
mod tests {
    use std::os::unix::ffi::OsStrExt;
    use std::path::Path;

    use super::*;
    use crate::fcntl;

    const NEVER_OPEN: HandleId = HandleId::from_raw(i32::MAX);

    fn c_path(path: &Path) -> CString {
        CString::new(path.as_os_str().as_bytes()).unwrap()
    }

    fn scratch_file(dir: &Path, name: &str) -> (CString, HandleId) {
        let path = c_path(&dir.join(name));
        let fd = fcntl::open_with_mode(&path, libc::O_RDWR | libc::O_CREAT, 0o600).unwrap();
        (path, fd)
    }

    #[test]
    fn test_pipe_read_write() {
        let [rd, wr] = pipe().unwrap();
        assert_eq!(write(wr, b"ping").unwrap(), 4);

        let mut buf = [0u8; 8];
        let n = read(rd, &mut buf).unwrap();
        assert_eq!(&buf[..n], b"ping");

        close(wr).unwrap();
        assert_eq!(read(rd, &mut buf).unwrap(), 0);
        close(rd).unwrap();
    }

    #[test]
    fn test_close_bad_descriptor() {
        assert_eq!(close(NEVER_OPEN).unwrap_err().code(), libc::EBADF);
    }

    #[test]
    fn test_isatty_regular_file_is_false() {
        let file = tempfile::tempfile().unwrap();
        let fd = HandleId::from_raw(std::os::fd::AsRawFd::as_raw_fd(&file));
        assert_eq!(isatty(fd), Ok(false));
    }

    #[test]
    fn test_isatty_bad_descriptor_is_an_error() {
        assert_eq!(isatty(NEVER_OPEN).unwrap_err().code(), libc::EBADF);
    }

    #[test]
    fn test_ttyname_on_pipe() {
        let [rd, wr] = pipe().unwrap();
        assert_eq!(ttyname(rd).unwrap_err().code(), libc::ENOTTY);

        let mut buf = [0u8; 64];
        assert_eq!(ttyname_r(rd, &mut buf).unwrap_err().code(), libc::ENOTTY);
        close(rd).unwrap();
        close(wr).unwrap();
    }

    #[test]
    fn test_lseek_on_pipe_is_espipe() {
        let [rd, wr] = pipe().unwrap();
        assert_eq!(lseek(rd, 0, libc::SEEK_SET).unwrap_err().code(), libc::ESPIPE);
        close(rd).unwrap();
        close(wr).unwrap();
    }

    #[test]
    fn test_pread_pwrite_ftruncate() {
        let dir = tempfile::tempdir().unwrap();
        let (_, fd) = scratch_file(dir.path(), "data");

        assert_eq!(pwrite(fd, b"hello world", 0).unwrap(), 11);
        let mut buf = [0u8; 5];
        assert_eq!(pread(fd, &mut buf, 6).unwrap(), 5);
        assert_eq!(&buf, b"world");

        ftruncate(fd, 5).unwrap();
        assert_eq!(lseek(fd, 0, libc::SEEK_END).unwrap(), 5);
        fsync(fd).unwrap();
        close(fd).unwrap();
    }

    #[test]
    fn test_dup_and_dup2() {
        let [rd, wr] = pipe().unwrap();
        let wr2 = dup(wr).unwrap();
        assert_ne!(wr2, wr);
        close(wr).unwrap();
        write(wr2, b"x").unwrap();

        // Redirect a descriptor this test owns: the write end of a second pipe.
        let [other_rd, other_wr] = pipe().unwrap();
        let target = dup2(wr2, other_wr).unwrap();
        assert_eq!(target, other_wr);
        write(target, b"y").unwrap();

        // The second pipe lost its only writer, so its reader sees EOF.
        let mut buf = [0u8; 2];
        assert_eq!(read(other_rd, &mut buf), Ok(0));
        close(target).unwrap();
        close(wr2).unwrap();
        assert_eq!(read(rd, &mut buf), Ok(2));
        assert_eq!(&buf, b"xy");

        close(other_rd).unwrap();
        close(rd).unwrap();
    }

    #[test]
    fn test_link_symlink_readlink_unlink() {
        let dir = tempfile::tempdir().unwrap();
        let (path, fd) = scratch_file(dir.path(), "target");
        close(fd).unwrap();

        let hard = c_path(&dir.path().join("hard"));
        link(&path, &hard).unwrap();
        access(&hard, libc::F_OK).unwrap();

        let soft = c_path(&dir.path().join("soft"));
        symlink(&path, &soft).unwrap();
        let mut buf = [0u8; 512];
        let n = readlink(&soft, &mut buf).unwrap();
        assert_eq!(&buf[..n], path.as_bytes());

        unlink(&soft).unwrap();
        unlink(&hard).unwrap();
        assert_eq!(unlink(&hard).unwrap_err().code(), libc::ENOENT);
        assert_eq!(access(&hard, libc::F_OK).unwrap_err().code(), libc::ENOENT);
    }

    #[test]
    fn test_rmdir_missing() {
        let dir = tempfile::tempdir().unwrap();
        let missing = c_path(&dir.path().join("nope"));
        assert_eq!(rmdir(&missing).unwrap_err().code(), libc::ENOENT);
    }

    #[test]
    fn test_getcwd_fits_and_overflows() {
        let mut buf = [0u8; 4096];
        let cwd = getcwd(&mut buf).unwrap();
        assert!(cwd.to_bytes().starts_with(b"/"));

        let mut tiny = [0u8; 1];
        assert_eq!(getcwd(&mut tiny).unwrap_err().code(), libc::ERANGE);
    }

    #[test]
    fn test_sysconf_and_pathconf() {
        let page_size = sysconf(libc::_SC_PAGESIZE).unwrap().unwrap();
        assert!(page_size > 0);

        let err = sysconf(-12345).unwrap_err();
        assert_eq!(err.code(), libc::EINVAL);

        let name_max = pathconf(c"/", libc::_PC_NAME_MAX).unwrap();
        assert!(name_max.unwrap() > 0);
    }

    #[cfg(any(target_os = "linux", target_os = "android"))]
    #[test]
    fn test_confstr_size_query() {
        // _CS_PATH in glibc and bionic.
        const CS_PATH: c_int = 0;
        let needed = confstr(CS_PATH, &mut []).unwrap();
        assert!(needed > 1);

        let mut buf = vec![0u8; needed];
        assert_eq!(confstr(CS_PATH, &mut buf).unwrap(), needed);
        assert!(c_str_in(&buf).unwrap().to_bytes().starts_with(b"/"));
    }

    #[test]
    fn test_process_ids() {
        assert!(getpid() > 0);
        assert!(getppid() >= 0);
        assert_eq!(getpgid(0).unwrap(), getpgrp());
        assert!(getsid(0).unwrap() >= 0);
        assert_eq!(getpgid(-1).unwrap_err().code(), libc::ESRCH);
    }

    #[test]
    fn test_nice_zero_is_current_value() {
        let current = nice(0).unwrap();
        assert!((-20..=19).contains(&current));
    }

    #[test]
    fn test_gethostname() {
        let mut buf = [0u8; 256];
        let name = gethostname(&mut buf).unwrap();
        assert!(!name.is_empty());
    }

    #[test]
    fn test_getgroups_count() {
        let count = getgroups(&mut []).unwrap();
        let mut groups = vec![0 as gid_t; count];
        assert_eq!(getgroups(&mut groups).unwrap(), count);
    }

    #[test]
    fn test_execv_missing_binary() {
        let dir = tempfile::tempdir().unwrap();
        let missing = c_path(&dir.path().join("no-such-binary"));
        let err = execv(&missing, &[missing.as_c_str()]).unwrap_err();
        assert_eq!(err.code(), libc::ENOENT);
    }

    #[test]
    fn test_gethostid_and_getlogin() {
        let _ = gethostid();

        // Containers and CI runners often have no login session.
        match getlogin() {
            Ok(name) => assert!(!name.is_empty()),
            Err(err) => assert_ne!(err.code(), 0),
        }
    }

    #[test]
    fn test_lockf() {
        let dir = tempfile::tempdir().unwrap();
        let (path, fd) = scratch_file(dir.path(), "locked");
        write(fd, b"0123456789").unwrap();
        lseek(fd, 0, libc::SEEK_SET).unwrap();

        lockf(fd, libc::F_TLOCK, 4).unwrap();
        // Our own lock never blocks us.
        lockf(fd, libc::F_TEST, 4).unwrap();
        lockf(fd, libc::F_ULOCK, 4).unwrap();
        close(fd).unwrap();

        // Locking requires a descriptor open for writing.
        let ro = fcntl::open(&path, libc::O_RDONLY).unwrap();
        assert_eq!(lockf(ro, libc::F_TLOCK, 0).unwrap_err().code(), libc::EBADF);
        close(ro).unwrap();

        assert_eq!(lockf(NEVER_OPEN, libc::F_ULOCK, 0).unwrap_err().code(), libc::EBADF);
    }

    #[test]
    fn test_credentials_set_to_current() {
        setuid(getuid()).unwrap();
        seteuid(geteuid()).unwrap();
        setgid(getgid()).unwrap();
        setegid(getegid()).unwrap();
        setreuid(uid_t::MAX, uid_t::MAX).unwrap();
        setregid(gid_t::MAX, gid_t::MAX).unwrap();

        if geteuid() != 0 {
            assert_eq!(setuid(0).unwrap_err().code(), libc::EPERM);
            assert_eq!(setreuid(0, 0).unwrap_err().code(), libc::EPERM);
        }
    }

    #[test]
    fn test_setpgrp_in_child() {
        // Changing the group of the test process would race other tests.
        let pid = unsafe { fork() }.unwrap();
        if pid == 0 {
            let status = match setpgrp() {
                Ok(()) if getpgrp() == getpid() => 0,
                _ => 1,
            };
            _exit(status);
        }

        let mut status = 0;
        assert_eq!(unsafe { libc::waitpid(pid, &mut status, 0) }, pid);
        assert!(libc::WIFEXITED(status));
        assert_eq!(libc::WEXITSTATUS(status), 0);
    }

    #[test]
    fn test_usleep_and_ualarm() {
        usleep(1).unwrap();
        // Cancels nothing, so nothing was pending.
        assert_eq!(ualarm(0, 0), Ok(0));
    }
}
