//! Composition root wiring storage, connect and sync into one service context.

mod context;

pub use context::ServiceContext;
