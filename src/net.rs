//! net.rs
//! Listener setup and the single-client accept.
//! One session serves exactly one client; a dropped connection ends the
//! session and there is no reconnect handling.

use log::info;
use socket2::{Domain, SockAddr, Socket, Type};
use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use crate::error::Result;
use crate::sync::shutdown::Shutdown;

const ACCEPT_POLL: Duration = Duration::from_millis(50);

/// Bind the listening socket. Reuse-address so quick restarts don't trip
/// over TIME_WAIT; backlog of 1 because only one client is ever served.
pub fn bind_listener(port: u16) -> Result<TcpListener> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let socket = Socket::new(Domain::IPV4, Type::STREAM, None)?;
    socket.set_reuse_address(true).ok();
    socket.bind(&SockAddr::from(addr))?;
    socket.listen(1)?;

    let listener: TcpListener = socket.into();
    // non-blocking so the accept wait can poll the shutdown flag
    listener.set_nonblocking(true)?;
    Ok(listener)
}

/// Wait for the session's one client. Returns `None` if shutdown was
/// requested before anyone connected.
///
/// The accepted stream is switched back to blocking with a read timeout,
/// so the receiver's reads are bounded without busy-waiting.
pub fn accept_single(
    listener: &TcpListener,
    shutdown: &Shutdown,
    read_timeout: Duration,
) -> Result<Option<TcpStream>> {
    loop {
        if shutdown.is_triggered() {
            return Ok(None);
        }
        match listener.accept() {
            Ok((stream, addr)) => {
                info!("connection from {addr}");
                stream.set_nonblocking(false)?;
                stream.set_read_timeout(Some(read_timeout))?;
                return Ok(Some(stream));
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL),
            Err(e) => return Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ephemeral_bind_reports_port() {
        let listener = bind_listener(0).unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }

    #[test]
    fn accept_bails_out_on_shutdown() {
        let listener = bind_listener(0).unwrap();
        let shutdown = Shutdown::new();
        shutdown.trigger();
        let accepted = accept_single(&listener, &shutdown, Duration::from_millis(100)).unwrap();
        assert!(accepted.is_none());
    }

    #[test]
    fn accept_hands_out_the_client() {
        let listener = bind_listener(0).unwrap();
        let port = listener.local_addr().unwrap().port();
        let shutdown = Shutdown::new();

        let client = thread::spawn(move || {
            TcpStream::connect(("127.0.0.1", port)).expect("connect")
        });

        let accepted = accept_single(&listener, &shutdown, Duration::from_millis(100))
            .unwrap()
            .expect("one client");
        assert!(accepted.read_timeout().unwrap().is_some());
        client.join().unwrap();
    }
}
