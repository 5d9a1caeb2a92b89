/// Shared modules for the Barter dashboard state layer
pub mod config;
pub mod de;
pub mod display;
pub mod error;
pub mod live;
pub mod pagination;
pub mod query;
pub mod session;
pub mod source;
pub mod stats;
pub mod types;
pub mod websocket;
pub mod window;

