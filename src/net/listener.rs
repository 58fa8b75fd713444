//! TCP listening endpoints.
//!
//! # Responsibilities
//! - Adapt `tokio::net::TcpListener` to the [`Accept`] capability
//! - Prepare listening sockets: resolve, open, reuse-address, bind,
//!   listen with the platform-maximum backlog
//! - Report each setup failure as one human-readable line on a
//!   caller-supplied sink (standard error by default)

use std::io::{self, Write};
use std::net::SocketAddr;

use socket2::{Domain, Protocol, Socket, Type};
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};

use crate::net::accept::Accept;

/// Backlog passed to `listen(2)`; the kernel caps it at its own limit.
const LISTEN_BACKLOG: i32 = libc::SOMAXCONN;

/// Failures while preparing a listening socket.
///
/// Each variant maps to one setup step; the first failing step
/// short-circuits the rest.
#[derive(Debug, Error)]
pub enum ListenError {
    /// The service string did not resolve to any endpoint.
    #[error("address resolve failed for '{service}': {source}")]
    Resolve {
        service: String,
        #[source]
        source: io::Error,
    },

    /// Socket creation for the resolved protocol family failed.
    #[error("socket open failed: {0}")]
    Open(#[source] io::Error),

    /// Enabling address reuse failed.
    #[error("socket reuse-address failed: {0}")]
    ReuseAddr(#[source] io::Error),

    /// Binding the resolved endpoint failed.
    #[error("socket bind failed for {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// Entering listen mode failed.
    #[error("socket listen failed: {0}")]
    Listen(#[source] io::Error),

    /// Handing the socket to the async runtime failed.
    #[error("socket runtime registration failed: {0}")]
    Register(#[source] io::Error),
}

/// Connection endpoint completed by a TCP accept.
///
/// Starts empty; a successful accept fills it with the stream and the
/// peer address. After a failed accept it stays empty.
#[derive(Debug, Default)]
pub struct TcpConn {
    inner: Option<(TcpStream, SocketAddr)>,
}

impl TcpConn {
    /// A fresh, unconnected endpoint. This is the endpoint factory for
    /// TCP accept loops.
    pub fn empty() -> Self {
        Self { inner: None }
    }

    /// Peer address, when connected.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.inner.as_ref().map(|(_, addr)| *addr)
    }

    /// Move the accepted stream and peer address out.
    pub fn into_parts(self) -> Option<(TcpStream, SocketAddr)> {
        self.inner
    }
}

impl Accept for TcpListener {
    type Conn = TcpConn;
    type Error = io::Error;

    async fn accept(&mut self, conn: &mut TcpConn) -> Result<(), io::Error> {
        let (stream, peer) = TcpListener::accept(self).await?;
        tracing::debug!(peer_addr = %peer, "Connection accepted");
        conn.inner = Some((stream, peer));
        Ok(())
    }
}

/// Resolve `service` and prepare a listening socket, reporting any
/// setup failure to standard error.
pub async fn listen(service: &str) -> Result<TcpListener, ListenError> {
    listen_with_sink(service, &mut io::stderr()).await
}

/// Resolve `service` (`host:port`) and prepare a listening socket.
///
/// Steps, in order: resolve the service string, open a stream socket
/// of the resolved protocol family, enable reuse-address, bind, enter
/// listen mode with the platform-maximum backlog. The first failing
/// step writes one human-readable line to `sink` and aborts the rest.
pub async fn listen_with_sink<W: Write>(
    service: &str,
    sink: &mut W,
) -> Result<TcpListener, ListenError> {
    match prepare(service).await {
        Ok(listener) => Ok(listener),
        Err(err) => {
            let _ = writeln!(sink, "{err}");
            Err(err)
        }
    }
}

async fn prepare(service: &str) -> Result<TcpListener, ListenError> {
    let addr = tokio::net::lookup_host(service)
        .await
        .map_err(|source| ListenError::Resolve {
            service: service.to_string(),
            source,
        })?
        .next()
        .ok_or_else(|| ListenError::Resolve {
            service: service.to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "service resolved to no addresses"),
        })?;

    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket =
        Socket::new(domain, Type::STREAM, Some(Protocol::TCP)).map_err(ListenError::Open)?;
    socket
        .set_reuse_address(true)
        .map_err(ListenError::ReuseAddr)?;
    socket
        .bind(&addr.into())
        .map_err(|source| ListenError::Bind { addr, source })?;
    socket.listen(LISTEN_BACKLOG).map_err(ListenError::Listen)?;

    // Tokio requires the socket in nonblocking mode before taking it over.
    socket.set_nonblocking(true).map_err(ListenError::Register)?;
    let std_listener: std::net::TcpListener = socket.into();
    let listener = TcpListener::from_std(std_listener).map_err(ListenError::Register)?;

    tracing::debug!(address = %addr, backlog = LISTEN_BACKLOG, "Listener ready");
    Ok(listener)
}
