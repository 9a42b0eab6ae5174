//! Protocol layer for the chat server
//!
//! One websocket text frame carries one serialized command invocation
//! (inbound) or one client-side operation (outbound).

pub mod frame;

pub use frame::{Invocation, Reply};
