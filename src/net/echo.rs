//! Byte-echo connection driver.
//!
//! Example collaborator for the accept loop: takes ownership of one
//! accepted stream and echoes whatever it reads, up to 512 bytes at a
//! time, until the peer disconnects or any I/O error occurs. Nothing
//! propagates back to the loop.

use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

const BUFFER_LEN: usize = 512;

/// Take ownership of an accepted connection and echo it in its own
/// task.
pub fn spawn(stream: TcpStream, peer: SocketAddr) {
    tokio::spawn(async move {
        tracing::trace!(peer_addr = %peer, "Echo session started");
        echo(stream).await;
        tracing::trace!(peer_addr = %peer, "Echo session ended");
    });
}

/// Alternate read and write until EOF or the first I/O error.
async fn echo(mut stream: TcpStream) {
    let mut buf = [0u8; BUFFER_LEN];
    loop {
        let read = match stream.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        if stream.write_all(&buf[..read]).await.is_err() {
            return;
        }
    }
}
