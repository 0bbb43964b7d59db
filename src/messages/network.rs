//! Network messages - communication between App and Network layers

use crate::error::TransportError;
use crate::models::{Request, Response};

/// Commands sent from App layer to Network layer
#[derive(Debug, Clone)]
pub enum NetworkCommand {
    /// Replay a request. Any replay still in flight is cancelled first.
    ExecuteRequest { id: u64, request: Request },
    /// Cancel a pending request
    CancelRequest(u64),
    /// Shutdown the network actor
    Shutdown,
}

/// Responses sent from Network layer to App layer
#[derive(Debug, Clone)]
pub enum NetworkResponse {
    /// The server answered (any status)
    Completed { id: u64, response: Response },
    /// The server was not reached or the exchange broke off
    Failed { id: u64, error: TransportError },
    /// Request was cancelled or superseded
    Cancelled { id: u64 },
}

impl NetworkResponse {
    /// Get the request ID from the response
    pub fn id(&self) -> u64 {
        match self {
            NetworkResponse::Completed { id, .. } => *id,
            NetworkResponse::Failed { id, .. } => *id,
            NetworkResponse::Cancelled { id } => *id,
        }
    }
}
