//! POSIX semaphores.

use core::cell::UnsafeCell;
use core::ffi::CStr;
use core::ptr::NonNull;
use std::ffi::CString;

use libc::c_int;
use libc::c_uint;
use libc::mode_t;
use libc::sem_t;

use crate::errno::cvt_status;
use crate::errno::last_error;
use crate::error::Error;
use crate::prelude::*;

fn cvt_sem(sem: *mut sem_t) -> Result<NonNull<sem_t>, Error> {
    if sem == libc::SEM_FAILED {
        return Err(last_error());
    }

    NonNull::new(sem).ok_or_else(last_error)
}

pub fn sem_open(name: &CStr, oflag: c_int) -> Result<NonNull<sem_t>, Error> {
    cvt_sem(unsafe { libc::sem_open(name.as_ptr(), oflag) })
}

/// `sem_open` with the extra arguments used when `oflag` contains `O_CREAT`.
pub fn sem_open_create(
    name: &CStr,
    oflag: c_int,
    mode: mode_t,
    value: c_uint,
) -> Result<NonNull<sem_t>, Error> {
    cvt_sem(unsafe { libc::sem_open(name.as_ptr(), oflag, mode as c_uint, value) })
}

/// # Safety
///
/// `sem` must come from `sem_open` and must not be used afterwards.
pub unsafe fn sem_close(sem: *mut sem_t) -> Result<(), Error> {
    cvt_status(unsafe { libc::sem_close(sem) })
}

pub fn sem_unlink(name: &CStr) -> Result<(), Error> {
    cvt_status(unsafe { libc::sem_unlink(name.as_ptr()) })
}

/// # Safety
///
/// `sem` must point to a live semaphore.
pub unsafe fn sem_post(sem: *mut sem_t) -> Result<(), Error> {
    cvt_status(unsafe { libc::sem_post(sem) })
}

/// # Safety
///
/// `sem` must point to a live semaphore.
pub unsafe fn sem_wait(sem: *mut sem_t) -> Result<(), Error> {
    cvt_status(unsafe { libc::sem_wait(sem) })
}

/// # Safety
///
/// `sem` must point to a live semaphore.
pub unsafe fn sem_trywait(sem: *mut sem_t) -> Result<(), Error> {
    cvt_status(unsafe { libc::sem_trywait(sem) })
}

/// # Safety
///
/// `sem` must point to a live semaphore.
pub unsafe fn sem_getvalue(sem: *mut sem_t) -> Result<c_int, Error> {
    let mut value: c_int = 0;
    cvt_status(unsafe { libc::sem_getvalue(sem, &mut value) })?;
    Ok(value)
}

/// # Safety
///
/// `sem` must be valid for writes and not already initialized.
#[cfg(any(target_os = "linux", target_os = "android"))]
pub unsafe fn sem_init(sem: *mut sem_t, pshared: c_int, value: c_uint) -> Result<(), Error> {
    cvt_status(unsafe { libc::sem_init(sem, pshared, value) })
}

/// # Safety
///
/// `sem` must come from `sem_init` and nobody may be waiting on it.
#[cfg(any(target_os = "linux", target_os = "android"))]
pub unsafe fn sem_destroy(sem: *mut sem_t) -> Result<(), Error> {
    cvt_status(unsafe { libc::sem_destroy(sem) })
}

/// # Safety
///
/// `sem` must point to a live semaphore.
#[cfg(any(target_os = "linux", target_os = "android"))]
pub unsafe fn sem_timedwait(sem: *mut sem_t, abs_timeout: &libc::timespec) -> Result<(), Error> {
    cvt_status(unsafe { libc::sem_timedwait(sem, abs_timeout) })
}

/// A semaphore opened by name, closed on drop.
#[derive(Debug)]
pub struct NamedSemaphore {
    sem: NonNull<sem_t>,
    name: CString,
}

// SAFETY: POSIX semaphores are meant to be shared between threads and
// processes; every operation on them is atomic.
unsafe impl Send for NamedSemaphore {}
unsafe impl Sync for NamedSemaphore {}

impl NamedSemaphore {
    /// Opens an existing semaphore.
    pub fn open(name: &CStr) -> Result<Self, Error> {
        let sem = sem_open(name, 0)?;
        trace!("opened semaphore {:?}", name);
        Ok(Self {
            sem,
            name: name.to_owned(),
        })
    }

    /// Opens or creates a semaphore. `oflag` should contain `O_CREAT`, and
    /// may contain `O_EXCL`.
    pub fn create(name: &CStr, oflag: c_int, mode: mode_t, value: c_uint) -> Result<Self, Error> {
        let sem = sem_open_create(name, oflag, mode, value)?;
        trace!("created semaphore {:?} (value={})", name, value);
        Ok(Self {
            sem,
            name: name.to_owned(),
        })
    }

    pub fn name(&self) -> &CStr {
        &self.name
    }

    pub fn post(&self) -> Result<(), Error> {
        unsafe { sem_post(self.sem.as_ptr()) }
    }

    pub fn wait(&self) -> Result<(), Error> {
        unsafe { sem_wait(self.sem.as_ptr()) }
    }

    /// Fails with `EAGAIN` instead of blocking.
    pub fn try_wait(&self) -> Result<(), Error> {
        unsafe { sem_trywait(self.sem.as_ptr()) }
    }

    #[cfg(any(target_os = "linux", target_os = "android"))]
    pub fn timed_wait(&self, abs_timeout: &libc::timespec) -> Result<(), Error> {
        unsafe { sem_timedwait(self.sem.as_ptr(), abs_timeout) }
    }

    pub fn value(&self) -> Result<c_int, Error> {
        unsafe { sem_getvalue(self.sem.as_ptr()) }
    }

    /// Removes the name. Handles already open stay usable.
    pub fn unlink(&self) -> Result<(), Error> {
        sem_unlink(&self.name)
    }
}

impl Drop for NamedSemaphore {
    fn drop(&mut self) {
        trace!("closing semaphore {:?}", self.name);
        if let Err(err) = unsafe { sem_close(self.sem.as_ptr()) } {
            debug_warn!("failed to close semaphore {:?}: {}", self.name, err);
        }
    }
}

/// An unnamed, process-private semaphore, destroyed on drop.
#[cfg(any(target_os = "linux", target_os = "android"))]
pub struct Semaphore {
    sem: Box<UnsafeCell<sem_t>>,
}

#[cfg(any(target_os = "linux", target_os = "android"))]
unsafe impl Send for Semaphore {}
#[cfg(any(target_os = "linux", target_os = "android"))]
unsafe impl Sync for Semaphore {}

#[cfg(any(target_os = "linux", target_os = "android"))]
impl Semaphore {
    pub fn new(value: c_uint) -> Result<Self, Error> {
        // SAFETY: sem_t is plain data, sem_init overwrites it.
        let sem = Box::new(UnsafeCell::new(unsafe { core::mem::zeroed::<sem_t>() }));
        unsafe { sem_init(sem.get(), 0, value)? };
        trace!("initialized semaphore {:p} (value={})", sem.get(), value);
        Ok(Self { sem })
    }

    pub fn post(&self) -> Result<(), Error> {
        unsafe { sem_post(self.sem.get()) }
    }

    pub fn wait(&self) -> Result<(), Error> {
        unsafe { sem_wait(self.sem.get()) }
    }

    pub fn try_wait(&self) -> Result<(), Error> {
        unsafe { sem_trywait(self.sem.get()) }
    }

    pub fn timed_wait(&self, abs_timeout: &libc::timespec) -> Result<(), Error> {
        unsafe { sem_timedwait(self.sem.get(), abs_timeout) }
    }

    pub fn value(&self) -> Result<c_int, Error> {
        unsafe { sem_getvalue(self.sem.get()) }
    }
}

#[cfg(any(target_os = "linux", target_os = "android"))]
impl Drop for Semaphore {
    fn drop(&mut self) {
        trace!("destroying semaphore {:p}", self.sem.get());
        if let Err(err) = unsafe { sem_destroy(self.sem.get()) } {
            debug_warn!("failed to destroy semaphore: {}", err);
        }
    }
}
