//! Socket connectivity probes.
//!
//! Each attempt owns its socket and drops it before returning, so a long
//! retry loop never accumulates descriptors.

use std::io;
use std::net::{IpAddr, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use camino::Utf8Path;
use launchpad_config::ReadinessTarget;
use socket2::{Domain, SockAddr, Socket, Type};

/// A single connection attempt against a readiness target.
pub trait Probe {
    /// Attempts one connection, bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns the IO error when the target did not accept the connection.
    fn connect(&self, target: &ReadinessTarget, timeout: Duration) -> io::Result<()>;
}

impl<P: Probe + ?Sized> Probe for &P {
    fn connect(&self, target: &ReadinessTarget, timeout: Duration) -> io::Result<()> {
        (**self).connect(target, timeout)
    }
}

/// Probe that opens real TCP or Unix domain socket connections.
#[derive(Debug, Default, Clone, Copy)]
pub struct SocketProbe;

impl Probe for SocketProbe {
    fn connect(&self, target: &ReadinessTarget, timeout: Duration) -> io::Result<()> {
        match target {
            ReadinessTarget::Tcp { host, port } => connect_tcp(host, *port, timeout),
            ReadinessTarget::Unix { path } => connect_unix(path, timeout),
        }
    }
}

// Resolution happens on every attempt: in a fresh container network the
// dependency's name often does not resolve until its container is up.
fn connect_tcp(host: &str, port: u16, timeout: Duration) -> io::Result<()> {
    connect_tcp_with(system_resolver, host, port, timeout)
}

/// Name lookup used by TCP probes.
pub(super) type Resolver = fn(&str, u16) -> io::Result<Vec<SocketAddr>>;

fn system_resolver(host: &str, port: u16) -> io::Result<Vec<SocketAddr>> {
    Ok((host, port).to_socket_addrs()?.collect())
}

/// Resolves and connects, spending no more than `timeout` on both together.
pub(super) fn connect_tcp_with(
    resolve: Resolver,
    host: &str,
    port: u16,
    timeout: Duration,
) -> io::Result<()> {
    let started = Instant::now();
    let addresses = resolve_within(resolve, host, port, timeout)?;
    let mut last_error = None;
    for address in addresses {
        let remaining = timeout.saturating_sub(started.elapsed());
        if remaining.is_zero() {
            last_error = Some(timed_out(format!("connecting to {host}:{port} timed out")));
            break;
        }
        match TcpStream::connect_timeout(&address, remaining) {
            Ok(stream) => {
                drop(stream);
                return Ok(());
            }
            Err(error) => last_error = Some(error),
        }
    }
    Err(last_error.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::AddrNotAvailable, "no resolved address")
    }))
}

// getaddrinfo cannot be interrupted, so the lookup runs on its own thread and
// the attempt stops waiting once its budget is spent. An abandoned lookup
// finishes in the background and its answer is dropped.
fn resolve_within(
    resolve: Resolver,
    host: &str,
    port: u16,
    budget: Duration,
) -> io::Result<Vec<SocketAddr>> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(vec![SocketAddr::new(ip, port)]);
    }
    let (sender, receiver) = mpsc::channel();
    let owned = host.to_owned();
    thread::Builder::new()
        .name(String::from("launchpad-resolve"))
        .spawn(move || {
            let _ = sender.send(resolve(&owned, port));
        })?;
    match receiver.recv_timeout(budget) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => {
            Err(timed_out(format!("resolving {host} timed out")))
        }
        Err(RecvTimeoutError::Disconnected) => {
            Err(io::Error::other(format!("lookup of {host} ended without an answer")))
        }
    }
}

fn timed_out(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::TimedOut, message)
}

fn connect_unix(path: &Utf8Path, timeout: Duration) -> io::Result<()> {
    let socket = Socket::new(Domain::UNIX, Type::STREAM, None)?;
    let address = SockAddr::unix(path.as_std_path())?;
    socket.connect_timeout(&address, timeout)
}
