//! Ownership and error translation over POSIX process, file, socket and
//! semaphore calls.
//!
//! Every wrapped call keeps the platform's name and success semantics. On
//! failure it returns the single [`error::Error`] type carrying the `errno`
//! captured right after the call. Descriptors can be held in an
//! [`handle::OwnedHandle`], which duplicates on copy and closes on drop.

pub use sysshim_types::error;

#[macro_use]
pub mod log;

pub mod errno;
pub mod fcntl;
pub mod handle;
pub mod prelude;
pub mod semaphore;
pub mod socket;
pub mod stdlib;
pub mod unistd;
