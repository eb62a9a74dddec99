//! Concrete [`Transport`](courier_core::transport::Transport) implementations.
//!
//! * [`StdioTransport`]: spawns the backend executable once per call.
//! * [`HttpTransport`]: posts calls to a backend listening on HTTP.

pub mod error;
pub mod http;
pub mod stdio;

pub use error::BuildError;
pub use http::{HttpOptions, HttpTransport};
pub use stdio::StdioTransport;
