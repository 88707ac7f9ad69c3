//! HTTP plumbing for the homebase remote API.

pub mod client;
pub mod error;
pub mod transport;

pub use client::ApiClient;
pub use error::{ConnectError, Result};
pub use transport::ReqwestTransport;
