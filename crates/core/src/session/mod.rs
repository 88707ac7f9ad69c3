//! Session state machine and the login retry path.

mod controller;
pub mod retry;
mod session_model;

pub use controller::*;
pub use session_model::*;
