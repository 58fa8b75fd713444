//! Generic asynchronous accept loop.
//!
//! # Responsibilities
//! - Define the [`Accept`] capability implemented by listening endpoints
//! - Drive the create-endpoint / accept / dispatch cycle
//! - Route every completion to the caller's handler and let it decide
//!   whether the loop continues
//!
//! The loop carries no failure policy of its own: error outcomes reach
//! the accept handler unchanged, and continue-vs-stop is entirely the
//! handler's verdict.

use std::future::Future;

/// A listening endpoint able to complete one asynchronous accept at a
/// time.
///
/// `accept` fills the caller-provided connection endpoint and resolves
/// with the outcome. Implementors deliver exactly one completion per
/// call, never concurrently for the same instance.
pub trait Accept {
    /// Per-connection endpoint, produced by the caller's factory and
    /// completed by `accept`.
    type Conn;

    /// Classified reason an accept attempt failed.
    type Error;

    /// Accept one connection into `conn`.
    fn accept(&mut self, conn: &mut Self::Conn) -> impl Future<Output = Result<(), Self::Error>>;
}

/// The accept cycle: create a fresh endpoint, submit it, hand the
/// completed endpoint and outcome to the accept handler, repeat until
/// the handler returns `false`, then fire the completion handler once.
pub struct AcceptLoop<F, H, C> {
    make_conn: F,
    on_accept: H,
    on_complete: C,
}

impl<F, H, C> AcceptLoop<F, H, C> {
    /// Bundle the endpoint factory, accept handler and completion
    /// handler for a run over one listening endpoint.
    pub fn new(make_conn: F, on_accept: H, on_complete: C) -> Self {
        Self {
            make_conn,
            on_accept,
            on_complete,
        }
    }

    /// Drive the loop over `listener` until the accept handler returns
    /// `false`.
    ///
    /// At most one accept is in flight at any time. The pending
    /// endpoint is surrendered to the handler the moment its completion
    /// arrives; the loop never touches it afterwards. Restarts iterate
    /// in place rather than recurse, so arbitrarily long runs use
    /// constant stack.
    pub async fn run<L>(mut self, listener: &mut L)
    where
        L: Accept,
        F: FnMut() -> L::Conn,
        H: FnMut(L::Conn, Result<(), L::Error>) -> bool,
        C: FnOnce(),
    {
        loop {
            let mut conn = (self.make_conn)();
            let outcome = listener.accept(&mut conn).await;
            tracing::trace!(failed = outcome.is_err(), "Accept completed");
            if !(self.on_accept)(conn, outcome) {
                (self.on_complete)();
                return;
            }
        }
    }
}
