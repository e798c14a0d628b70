//! Rate limiting ports and application service.
//!
//! Implements a fixed-window counter per identifier. Counter storage is an
//! injected repository so the window state is owned by whichever adapter the
//! composition root wires in, never by ambient global state.

mod config;
mod ports;
mod service;

pub use config::RateLimitRule;
pub use ports::{AttemptInfo, RateLimitRepository};
pub use service::RateLimitService;
