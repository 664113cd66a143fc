use core::ffi::CStr;
use core::mem;
use std::io;
use std::os::fd::AsRawFd;
use std::os::fd::FromRawFd;
use std::os::fd::IntoRawFd;
use std::os::fd::OwnedFd;
use std::os::fd::RawFd;

use libc::c_int;
use libc::mode_t;
pub use sysshim_types::handle::*;

use crate::error::Error;
use crate::fcntl;
use crate::prelude::*;
use crate::unistd;

/// Exclusive owner of one descriptor.
///
/// Copying duplicates the descriptor (`dup`), moving transfers it, and
/// dropping closes it. A handle that was taken from holds
/// [`HandleId::INVALID`] and closes nothing.
#[derive(Debug, Default)]
pub struct OwnedHandle(HandleId);

impl OwnedHandle {
    /// Adopts an already-open descriptor.
    pub const fn from_raw(raw: HandleId) -> Self {
        Self(raw)
    }

    pub fn open(path: &CStr, flags: c_int) -> Result<Self, Error> {
        let id = fcntl::open(path, flags)?;
        trace!("opened handle {} for {:?}", id, path);
        Ok(Self(id))
    }

    pub fn open_with_mode(path: &CStr, flags: c_int, mode: mode_t) -> Result<Self, Error> {
        let id = fcntl::open_with_mode(path, flags, mode)?;
        trace!("opened handle {} for {:?}", id, path);
        Ok(Self(id))
    }

    pub fn create(path: &CStr, mode: mode_t) -> Result<Self, Error> {
        let id = fcntl::creat(path, mode)?;
        trace!("created handle {} for {:?}", id, path);
        Ok(Self(id))
    }

    /// Creates a pipe, returning the read end and the write end.
    pub fn pipe() -> Result<(Self, Self), Error> {
        let [rd, wr] = unistd::pipe()?;
        Ok((Self(rd), Self(wr)))
    }

    /// Duplicates the descriptor into a new, independently owned handle.
    ///
    /// `self` is never modified, whether or not this fails.
    pub fn try_clone(&self) -> Result<Self, Error> {
        let id = unistd::dup(self.0)?;
        trace!("duplicated handle {} as {}", self.0, id);
        Ok(Self(id))
    }

    /// Makes `self` own a duplicate of `source`'s descriptor.
    ///
    /// The old descriptor is released only once the duplicate exists, so on
    /// failure `self` still owns what it owned before.
    pub fn clone_from_handle(&mut self, source: &OwnedHandle) -> Result<(), Error> {
        let dup = source.try_clone()?;
        self.replace(dup);
        Ok(())
    }

    /// Moves `source` into `self`, releasing whatever `self` owned.
    pub fn replace(&mut self, mut source: OwnedHandle) {
        let id = mem::replace(&mut source.0, HandleId::INVALID);
        self.release();
        self.0 = id;
    }

    /// Steals the descriptor, leaving `self` invalid.
    pub fn steal(&mut self) -> OwnedHandle {
        mem::take(self)
    }

    pub fn id(&self) -> HandleId {
        self.0
    }

    pub fn is_valid(&self) -> bool {
        self.0.is_valid()
    }

    /// Gives up ownership without closing the descriptor.
    pub fn into_raw(mut self) -> HandleId {
        mem::replace(&mut self.0, HandleId::INVALID)
    }

    fn release(&mut self) {
        let id = mem::replace(&mut self.0, HandleId::INVALID);
        if !id.is_valid() {
            return;
        }

        trace!("dropping handle {}", id);
        if let Err(err) = unistd::close(id) {
            debug_warn!("failed to close handle {}: {}", id, err);
        }
    }
}

impl Drop for OwnedHandle {
    fn drop(&mut self) {
        self.release();
    }
}

pub trait Handleable {
    fn handle_id(&self) -> HandleId;
}

impl Handleable for OwnedHandle {
    fn handle_id(&self) -> HandleId {
        self.0
    }
}

impl AsRawFd for OwnedHandle {
    fn as_raw_fd(&self) -> RawFd {
        self.0.as_raw()
    }
}

impl IntoRawFd for OwnedHandle {
    fn into_raw_fd(self) -> RawFd {
        self.into_raw().as_raw()
    }
}

impl FromRawFd for OwnedHandle {
    unsafe fn from_raw_fd(fd: RawFd) -> Self {
        Self(HandleId::from_raw(fd))
    }
}

impl From<OwnedFd> for OwnedHandle {
    fn from(fd: OwnedFd) -> Self {
        Self(HandleId::from_raw(fd.into_raw_fd()))
    }
}

impl io::Read for &OwnedHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(unistd::read(self.0, buf)?)
    }
}

impl io::Write for &OwnedHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(unistd::write(self.0, buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl io::Read for OwnedHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (&*self).read(buf)
    }
}

impl io::Write for OwnedHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (&*self).write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
