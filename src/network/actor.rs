//! Network actor - runs replays in the Tokio async runtime

use std::collections::HashMap;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;

use crate::messages::{NetworkCommand, NetworkResponse};
use crate::network::client::execute_request;

/// Network actor that processes replay commands.
///
/// Replays never overlap: a new `ExecuteRequest` cancels whatever is still
/// in flight, so only the latest replay can produce a response.
pub struct NetworkActor {
    client: reqwest::Client,
    response_tx: mpsc::UnboundedSender<NetworkResponse>,
    active_requests: JoinSet<u64>,
    cancel_handles: HashMap<u64, oneshot::Sender<()>>,
}

impl NetworkActor {
    pub fn new(client: reqwest::Client, response_tx: mpsc::UnboundedSender<NetworkResponse>) -> Self {
        NetworkActor {
            client,
            response_tx,
            active_requests: JoinSet::new(),
            cancel_handles: HashMap::new(),
        }
    }

    /// Run the network actor message loop
    pub async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<NetworkCommand>) {
        loop {
            tokio::select! {
                biased;

                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(NetworkCommand::ExecuteRequest { id, request }) => {
                            self.cancel_all();

                            let (cancel_tx, cancel_rx) = oneshot::channel();
                            self.cancel_handles.insert(id, cancel_tx);

                            let response_tx = self.response_tx.clone();
                            let client = self.client.clone();

                            self.active_requests.spawn(async move {
                                tracing::info!(id, url = %request.url, method = %request.method, "Executing request");
                                tokio::select! {
                                    _ = cancel_rx => {
                                        tracing::info!(id, "Request dropped after cancellation");
                                    }
                                    result = execute_request(&client, &request) => {
                                        let message = match result {
                                            Ok(response) => {
                                                tracing::info!(id, status = response.status, duration_ms = response.duration_ms, "Request completed");
                                                NetworkResponse::Completed { id, response }
                                            }
                                            Err(error) => {
                                                tracing::warn!(id, error = %error, "Request failed");
                                                NetworkResponse::Failed { id, error }
                                            }
                                        };
                                        let _ = response_tx.send(message);
                                    }
                                }
                                id
                            });
                        }

                        Some(NetworkCommand::CancelRequest(id)) => {
                            self.cancel(id);
                        }

                        Some(NetworkCommand::Shutdown) | None => {
                            self.cancel_all();
                            break;
                        }
                    }
                }

                // Forget cancel handles of finished tasks
                Some(result) = self.active_requests.join_next() => {
                    if let Ok(id) = result {
                        self.cancel_handles.remove(&id);
                    }
                }
            }
        }
    }

    fn cancel(&mut self, id: u64) {
        if let Some(cancel_tx) = self.cancel_handles.remove(&id) {
            // Fails only when the task already finished
            if cancel_tx.send(()).is_ok() {
                tracing::info!(id, "Cancelling request");
                let _ = self.response_tx.send(NetworkResponse::Cancelled { id });
            }
        }
    }

    fn cancel_all(&mut self) {
        let ids: Vec<u64> = self.cancel_handles.keys().copied().collect();
        for id in ids {
            self.cancel(id);
        }
    }
}
