//! Generic Asynchronous Accept-Loop Library
//!
//! Drives a continuous accept cycle over a listening endpoint: create
//! a fresh connection endpoint, accept into it, hand the endpoint and
//! the outcome to a caller-supplied handler, and repeat until the
//! handler says stop. The cycle itself is transport-free; a TCP
//! adapter, a listening-socket setup helper, an opt-in failure-backoff
//! decorator and a byte-echo example driver round out the crate.

pub mod config;
pub mod net;

pub use config::{load_config, Config, ConfigError};
pub use net::accept::{Accept, AcceptLoop};
pub use net::backoff::BackoffAccept;
pub use net::listener::{listen, listen_with_sink, ListenError, TcpConn};
