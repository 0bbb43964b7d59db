//! Network layer - request replay
//!
//! The Network actor receives replay commands and sends back responses.

pub mod actor;
pub mod client;

pub use actor::NetworkActor;
pub use client::{create_client, execute_request};
