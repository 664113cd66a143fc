//! Sockets.
//!
//! The free functions forward `<sys/socket.h>` one-to-one; the ones taking
//! raw `sockaddr`/`msghdr` pointers are `unsafe`. [`Socket`] is an
//! [`OwnedHandle`] created by `socket(2)` instead of `open(2)`, with typed
//! address helpers on top.

use core::mem;
use std::io;
use std::os::fd::AsRawFd;
use std::os::fd::IntoRawFd;
use std::os::fd::RawFd;

use libc::c_int;
use libc::c_void;
use libc::sockaddr;
use libc::socklen_t;
use nix::sys::socket::SockaddrLike;
use nix::sys::socket::SockaddrStorage;

use crate::errno::cvt;
use crate::errno::cvt_status;
use crate::error::Error;
use crate::handle::HandleId;
use crate::handle::Handleable;
use crate::handle::OwnedHandle;
use crate::prelude::*;

mod ffi {
    use libc::c_int;

    unsafe extern "C" {
        pub fn sockatmark(sockfd: c_int) -> c_int;
    }
}

/// # Safety
///
/// `addr` and `addrlen` must be null or valid for writes as `accept(2)`
/// describes.
pub unsafe fn accept(
    sockfd: HandleId,
    addr: *mut sockaddr,
    addrlen: *mut socklen_t,
) -> Result<HandleId, Error> {
    let fd = cvt(unsafe { libc::accept(sockfd.as_raw(), addr, addrlen) })?;
    Ok(HandleId::from_raw(fd))
}

/// # Safety
///
/// `addr` must point to `addrlen` readable bytes.
pub unsafe fn bind(sockfd: HandleId, addr: *const sockaddr, addrlen: socklen_t) -> Result<(), Error> {
    cvt_status(unsafe { libc::bind(sockfd.as_raw(), addr, addrlen) })
}

/// # Safety
///
/// `addr` must point to `addrlen` readable bytes.
pub unsafe fn connect(
    sockfd: HandleId,
    addr: *const sockaddr,
    addrlen: socklen_t,
) -> Result<(), Error> {
    cvt_status(unsafe { libc::connect(sockfd.as_raw(), addr, addrlen) })
}

/// # Safety
///
/// `addr` must be valid for writes of `*addrlen` bytes.
pub unsafe fn getpeername(
    sockfd: HandleId,
    addr: *mut sockaddr,
    addrlen: *mut socklen_t,
) -> Result<(), Error> {
    cvt_status(unsafe { libc::getpeername(sockfd.as_raw(), addr, addrlen) })
}

/// # Safety
///
/// `addr` must be valid for writes of `*addrlen` bytes.
pub unsafe fn getsockname(
    sockfd: HandleId,
    addr: *mut sockaddr,
    addrlen: *mut socklen_t,
) -> Result<(), Error> {
    cvt_status(unsafe { libc::getsockname(sockfd.as_raw(), addr, addrlen) })
}

/// # Safety
///
/// `optval` must be valid for writes of `*optlen` bytes.
pub unsafe fn getsockopt(
    sockfd: HandleId,
    level: c_int,
    optname: c_int,
    optval: *mut c_void,
    optlen: *mut socklen_t,
) -> Result<(), Error> {
    cvt_status(unsafe { libc::getsockopt(sockfd.as_raw(), level, optname, optval, optlen) })
}

pub fn listen(sockfd: HandleId, backlog: c_int) -> Result<(), Error> {
    cvt_status(unsafe { libc::listen(sockfd.as_raw(), backlog) })
}

pub fn recv(sockfd: HandleId, buf: &mut [u8], flags: c_int) -> Result<usize, Error> {
    let n = cvt(unsafe {
        libc::recv(
            sockfd.as_raw(),
            buf.as_mut_ptr() as *mut c_void,
            buf.len(),
            flags,
        )
    })?;
    Ok(n as usize)
}

/// # Safety
///
/// `src_addr` and `addrlen` must be null or valid for writes as
/// `recvfrom(2)` describes.
pub unsafe fn recvfrom(
    sockfd: HandleId,
    buf: &mut [u8],
    flags: c_int,
    src_addr: *mut sockaddr,
    addrlen: *mut socklen_t,
) -> Result<usize, Error> {
    let n = cvt(unsafe {
        libc::recvfrom(
            sockfd.as_raw(),
            buf.as_mut_ptr() as *mut c_void,
            buf.len(),
            flags,
            src_addr,
            addrlen,
        )
    })?;
    Ok(n as usize)
}

/// # Safety
///
/// `msg` must describe valid buffers as `recvmsg(2)` requires.
pub unsafe fn recvmsg(sockfd: HandleId, msg: *mut libc::msghdr, flags: c_int) -> Result<usize, Error> {
    let n = cvt(unsafe { libc::recvmsg(sockfd.as_raw(), msg, flags) })?;
    Ok(n as usize)
}

pub fn send(sockfd: HandleId, buf: &[u8], flags: c_int) -> Result<usize, Error> {
    let n = cvt(unsafe {
        libc::send(
            sockfd.as_raw(),
            buf.as_ptr() as *const c_void,
            buf.len(),
            flags,
        )
    })?;
    Ok(n as usize)
}

/// # Safety
///
/// `dest_addr` must point to `addrlen` readable bytes.
pub unsafe fn sendto(
    sockfd: HandleId,
    buf: &[u8],
    flags: c_int,
    dest_addr: *const sockaddr,
    addrlen: socklen_t,
) -> Result<usize, Error> {
    let n = cvt(unsafe {
        libc::sendto(
            sockfd.as_raw(),
            buf.as_ptr() as *const c_void,
            buf.len(),
            flags,
            dest_addr,
            addrlen,
        )
    })?;
    Ok(n as usize)
}

/// # Safety
///
/// `msg` must describe valid buffers as `sendmsg(2)` requires.
pub unsafe fn sendmsg(sockfd: HandleId, msg: *const libc::msghdr, flags: c_int) -> Result<usize, Error> {
    let n = cvt(unsafe { libc::sendmsg(sockfd.as_raw(), msg, flags) })?;
    Ok(n as usize)
}

/// # Safety
///
/// `optval` must point to `optlen` readable bytes.
pub unsafe fn setsockopt(
    sockfd: HandleId,
    level: c_int,
    optname: c_int,
    optval: *const c_void,
    optlen: socklen_t,
) -> Result<(), Error> {
    cvt_status(unsafe { libc::setsockopt(sockfd.as_raw(), level, optname, optval, optlen) })
}

pub fn shutdown(sockfd: HandleId, how: c_int) -> Result<(), Error> {
    cvt_status(unsafe { libc::shutdown(sockfd.as_raw(), how) })
}

pub fn socket(domain: c_int, ty: c_int, protocol: c_int) -> Result<HandleId, Error> {
    let fd = cvt(unsafe { libc::socket(domain, ty, protocol) })?;
    Ok(HandleId::from_raw(fd))
}

/// Whether the socket is at the out-of-band mark.
pub fn sockatmark(sockfd: HandleId) -> Result<bool, Error> {
    let ret = cvt(unsafe { ffi::sockatmark(sockfd.as_raw()) })?;
    Ok(ret == 1)
}

pub fn socketpair(domain: c_int, ty: c_int, protocol: c_int) -> Result<[HandleId; 2], Error> {
    let mut sv = [-1 as c_int; 2];
    cvt_status(unsafe { libc::socketpair(domain, ty, protocol, sv.as_mut_ptr()) })?;
    Ok([HandleId::from_raw(sv[0]), HandleId::from_raw(sv[1])])
}

fn empty_storage() -> (libc::sockaddr_storage, socklen_t) {
    // SAFETY: sockaddr_storage is plain data; all zeroes is a valid value.
    let storage: libc::sockaddr_storage = unsafe { mem::zeroed() };
    (storage, mem::size_of::<libc::sockaddr_storage>() as socklen_t)
}

/// Interprets what the kernel wrote into `storage`. Unnamed sockets (such
/// as one end of a socket pair) may yield `None`.
fn read_storage(storage: &libc::sockaddr_storage, len: socklen_t) -> Option<SockaddrStorage> {
    unsafe {
        SockaddrStorage::from_raw(
            storage as *const libc::sockaddr_storage as *const sockaddr,
            Some(len),
        )
    }
}

/// A connection-oriented or datagram endpoint.
///
/// Shares [`OwnedHandle`]'s contract: [`Socket::try_clone`] duplicates,
/// moving transfers, dropping closes. A default socket is invalid.
#[derive(Debug, Default)]
pub struct Socket(OwnedHandle);

impl Socket {
    pub fn new(domain: c_int, ty: c_int, protocol: c_int) -> Result<Self, Error> {
        let id = socket(domain, ty, protocol)?;
        trace!("created socket {} (domain={}, type={})", id, domain, ty);
        Ok(Socket(OwnedHandle::from_raw(id)))
    }

    /// Creates a pair of connected sockets.
    pub fn pair(domain: c_int, ty: c_int, protocol: c_int) -> Result<(Self, Self), Error> {
        let [first, second] = socketpair(domain, ty, protocol)?;
        trace!("created socket pair {} <-> {} (domain={}, type={})", first, second, domain, ty);
        let first = Socket(OwnedHandle::from_raw(first));
        let second = Socket(OwnedHandle::from_raw(second));
        Ok((first, second))
    }

    pub fn from_handle(handle: OwnedHandle) -> Self {
        Self(handle)
    }

    pub const fn from_raw(raw: HandleId) -> Self {
        Self(OwnedHandle::from_raw(raw))
    }

    pub fn try_clone(&self) -> Result<Self, Error> {
        Ok(Self(self.0.try_clone()?))
    }

    /// Makes `self` a duplicate of `source`. See
    /// [`OwnedHandle::clone_from_handle`].
    pub fn clone_from_socket(&mut self, source: &Socket) -> Result<(), Error> {
        self.0.clone_from_handle(&source.0)
    }

    /// Moves `source` into `self`, closing whatever `self` owned.
    pub fn replace(&mut self, source: Socket) {
        self.0.replace(source.0);
    }

    /// Steals the descriptor, leaving `self` invalid.
    pub fn steal(&mut self) -> Socket {
        Socket(self.0.steal())
    }

    pub fn is_valid(&self) -> bool {
        self.0.is_valid()
    }

    pub fn handle(&self) -> &OwnedHandle {
        &self.0
    }

    pub fn into_handle(self) -> OwnedHandle {
        self.0
    }

    pub fn id(&self) -> HandleId {
        self.0.id()
    }

    pub fn bind(&self, addr: &impl SockaddrLike) -> Result<(), Error> {
        unsafe { bind(self.id(), addr.as_ptr(), addr.len()) }
    }

    pub fn connect(&self, addr: &impl SockaddrLike) -> Result<(), Error> {
        unsafe { connect(self.id(), addr.as_ptr(), addr.len()) }
    }

    pub fn listen(&self, backlog: c_int) -> Result<(), Error> {
        listen(self.id(), backlog)
    }

    pub fn accept(&self) -> Result<(Socket, Option<SockaddrStorage>), Error> {
        let (mut storage, mut len) = empty_storage();
        let id = unsafe {
            accept(
                self.id(),
                &mut storage as *mut libc::sockaddr_storage as *mut sockaddr,
                &mut len,
            )?
        };
        trace!("accepted socket {} on {}", id, self.id());
        Ok((Socket::from_raw(id), read_storage(&storage, len)))
    }

    pub fn send(&self, buf: &[u8], flags: c_int) -> Result<usize, Error> {
        send(self.id(), buf, flags)
    }

    pub fn recv(&self, buf: &mut [u8], flags: c_int) -> Result<usize, Error> {
        recv(self.id(), buf, flags)
    }

    pub fn send_to(&self, buf: &[u8], flags: c_int, addr: &impl SockaddrLike) -> Result<usize, Error> {
        unsafe { sendto(self.id(), buf, flags, addr.as_ptr(), addr.len()) }
    }

    pub fn recv_from(
        &self,
        buf: &mut [u8],
        flags: c_int,
    ) -> Result<(usize, Option<SockaddrStorage>), Error> {
        let (mut storage, mut len) = empty_storage();
        let n = unsafe {
            recvfrom(
                self.id(),
                buf,
                flags,
                &mut storage as *mut libc::sockaddr_storage as *mut sockaddr,
                &mut len,
            )?
        };
        Ok((n, read_storage(&storage, len)))
    }

    pub fn shutdown(&self, how: c_int) -> Result<(), Error> {
        shutdown(self.id(), how)
    }

    pub fn local_addr(&self) -> Result<SockaddrStorage, Error> {
        let (mut storage, mut len) = empty_storage();
        unsafe {
            getsockname(
                self.id(),
                &mut storage as *mut libc::sockaddr_storage as *mut sockaddr,
                &mut len,
            )?
        };
        read_storage(&storage, len).ok_or_else(Error::undefined)
    }

    pub fn peer_addr(&self) -> Result<SockaddrStorage, Error> {
        let (mut storage, mut len) = empty_storage();
        unsafe {
            getpeername(
                self.id(),
                &mut storage as *mut libc::sockaddr_storage as *mut sockaddr,
                &mut len,
            )?
        };
        read_storage(&storage, len).ok_or_else(Error::undefined)
    }
}

impl Handleable for Socket {
    fn handle_id(&self) -> HandleId {
        self.0.id()
    }
}

impl From<OwnedHandle> for Socket {
    fn from(handle: OwnedHandle) -> Self {
        Socket(handle)
    }
}

impl AsRawFd for Socket {
    fn as_raw_fd(&self) -> RawFd {
        self.0.as_raw_fd()
    }
}

impl IntoRawFd for Socket {
    fn into_raw_fd(self) -> RawFd {
        self.0.into_raw_fd()
    }
}

impl io::Read for &Socket {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.recv(buf, 0)?)
    }
}

impl io::Write for &Socket {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.send(buf, 0)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use nix::sys::socket::SockaddrIn;
    use nix::sys::socket::UnixAddr;

    use super::*;

    fn stream_pair() -> (Socket, Socket) {
        Socket::pair(libc::AF_UNIX, libc::SOCK_STREAM, 0).unwrap()
    }

    #[test]
    fn test_pair_send_recv() {
        let (a, b) = stream_pair();
        assert_eq!(a.send(b"hello", 0), Ok(5));

        let mut buf = [0u8; 16];
        let n = b.recv(&mut buf, 0).unwrap();
        assert_eq!(&buf[..n], b"hello");
    }

    #[test]
    fn test_unsupported_domain() {
        let err = Socket::new(9999, libc::SOCK_STREAM, 0).unwrap_err();
        assert_eq!(err.code(), libc::EAFNOSUPPORT);
    }

    #[test]
    fn test_clone_outlives_original() {
        let (a, b) = stream_pair();
        let a2 = a.try_clone().unwrap();
        assert_ne!(a2.id(), a.id());
        drop(a);

        a2.send(b"x", 0).unwrap();
        let mut buf = [0u8; 1];
        assert_eq!(b.recv(&mut buf, 0), Ok(1));
    }

    #[test]
    fn test_move_keeps_id() {
        let (a, _b) = stream_pair();
        let id = a.id();
        let handle = a.into_handle();
        assert_eq!(handle.id(), id);

        let socket = Socket::from_handle(handle);
        assert_eq!(socket.handle_id(), id);
    }

    #[test]
    fn test_clone_from_socket() {
        let (a, b) = stream_pair();
        let (mut target, other) = stream_pair();

        target.clone_from_socket(&a).unwrap();
        assert_ne!(target.id(), a.id());

        // The end `target` used to own is closed, so its peer sees EOF.
        let mut buf = [0u8; 1];
        assert_eq!(other.recv(&mut buf, 0), Ok(0));

        target.send(b"y", 0).unwrap();
        assert_eq!(b.recv(&mut buf, 0), Ok(1));
        assert_eq!(&buf, b"y");
    }

    #[test]
    fn test_clone_from_invalid_socket_keeps_target() {
        let (mut target, _peer) = stream_pair();
        let before = target.id();

        let err = target.clone_from_socket(&Socket::default()).unwrap_err();
        assert_eq!(err.code(), libc::EBADF);
        assert_eq!(target.id(), before);
    }

    #[test]
    fn test_replace_closes_old() {
        let (mut a, a_peer) = stream_pair();
        let (b, b_peer) = stream_pair();
        let new = b.id();

        a.replace(b);
        assert_eq!(a.id(), new);

        let mut buf = [0u8; 1];
        assert_eq!(a_peer.recv(&mut buf, 0), Ok(0));

        a.send(b"z", 0).unwrap();
        assert_eq!(b_peer.recv(&mut buf, 0), Ok(1));
    }

    #[test]
    fn test_steal_leaves_invalid() {
        let (mut a, b) = stream_pair();
        let id = a.id();

        let stolen = a.steal();
        assert_eq!(stolen.id(), id);
        assert!(!a.is_valid());
        assert_eq!(a.id(), HandleId::INVALID);

        drop(a);
        stolen.send(b"w", 0).unwrap();
        let mut buf = [0u8; 1];
        assert_eq!(b.recv(&mut buf, 0), Ok(1));
    }

    #[test]
    fn test_default_socket_is_invalid() {
        let socket = Socket::default();
        assert!(!socket.is_valid());
        assert_eq!(socket.as_raw_fd(), -1);
    }

    #[test]
    fn test_shutdown_write_gives_peer_eof() {
        let (a, b) = stream_pair();
        a.shutdown(libc::SHUT_WR).unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(b.recv(&mut buf, 0), Ok(0));
    }

    #[test]
    fn test_unix_listen_connect_accept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sock");
        let addr = UnixAddr::new(&path).unwrap();

        let server = Socket::new(libc::AF_UNIX, libc::SOCK_STREAM, 0).unwrap();
        server.bind(&addr).unwrap();
        server.listen(1).unwrap();

        let local = server.local_addr().unwrap();
        assert_eq!(local.as_unix_addr().unwrap().path(), Some(path.as_path()));

        let client = Socket::new(libc::AF_UNIX, libc::SOCK_STREAM, 0).unwrap();
        client.connect(&addr).unwrap();
        let (conn, _) = server.accept().unwrap();

        let peer = client.peer_addr().unwrap();
        assert_eq!(peer.as_unix_addr().unwrap().path(), Some(path.as_path()));

        use std::io::Read;
        use std::io::Write;
        (&client).write_all(b"over the wire").unwrap();
        client.shutdown(libc::SHUT_WR).unwrap();
        let mut received = String::new();
        (&conn).read_to_string(&mut received).unwrap();
        assert_eq!(received, "over the wire");
    }

    #[test]
    fn test_bind_in_use() {
        let dir = tempfile::tempdir().unwrap();
        let addr = UnixAddr::new(&dir.path().join("sock")).unwrap();

        let first = Socket::new(libc::AF_UNIX, libc::SOCK_STREAM, 0).unwrap();
        first.bind(&addr).unwrap();
        let second = Socket::new(libc::AF_UNIX, libc::SOCK_STREAM, 0).unwrap();
        assert_eq!(second.bind(&addr).unwrap_err().code(), libc::EADDRINUSE);
    }

    #[test]
    fn test_connect_refused() {
        let dir = tempfile::tempdir().unwrap();
        let addr = UnixAddr::new(&dir.path().join("nobody")).unwrap();
        let client = Socket::new(libc::AF_UNIX, libc::SOCK_STREAM, 0).unwrap();
        assert_eq!(client.connect(&addr).unwrap_err().code(), libc::ENOENT);
    }

    #[test]
    fn test_udp_loopback() {
        let any = SockaddrIn::new(127, 0, 0, 1, 0);
        let receiver = Socket::new(libc::AF_INET, libc::SOCK_DGRAM, 0).unwrap();
        receiver.bind(&any).unwrap();
        let bound = receiver.local_addr().unwrap();
        let port = bound.as_sockaddr_in().unwrap().port();
        assert_ne!(port, 0);

        let sender = Socket::new(libc::AF_INET, libc::SOCK_DGRAM, 0).unwrap();
        let target = SockaddrIn::new(127, 0, 0, 1, port);
        assert_eq!(sender.send_to(b"datagram", 0, &target), Ok(8));

        let mut buf = [0u8; 32];
        let (n, from) = receiver.recv_from(&mut buf, 0).unwrap();
        assert_eq!(&buf[..n], b"datagram");
        let from = from.unwrap();
        assert_eq!(from.as_sockaddr_in().unwrap().ip(), std::net::Ipv4Addr::LOCALHOST);
    }

    #[test]
    fn test_getsockopt_and_setsockopt() {
        let (a, _b) = stream_pair();

        let mut ty: c_int = 0;
        let mut len = mem::size_of::<c_int>() as socklen_t;
        unsafe {
            getsockopt(
                a.id(),
                libc::SOL_SOCKET,
                libc::SO_TYPE,
                &mut ty as *mut c_int as *mut c_void,
                &mut len,
            )
            .unwrap();
        }
        assert_eq!(ty, libc::SOCK_STREAM);

        let size: c_int = 64 * 1024;
        unsafe {
            setsockopt(
                a.id(),
                libc::SOL_SOCKET,
                libc::SO_SNDBUF,
                &size as *const c_int as *const c_void,
                mem::size_of::<c_int>() as socklen_t,
            )
            .unwrap();
        }
    }

    #[test]
    fn test_listen_on_bad_descriptor() {
        let err = listen(HandleId::from_raw(i32::MAX), 1).unwrap_err();
        assert_eq!(err.code(), libc::EBADF);
    }
}
