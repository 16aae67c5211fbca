//! ProcureFlow realtime notification client
//!
//! Topic-based pub/sub over a live WebSocket transport, with automatic
//! reconnection and a simulated transport used as a degraded-mode fallback.

pub mod arguments;
pub mod config;
pub mod errors;
pub mod logger;
pub mod realtime;
