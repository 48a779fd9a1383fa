use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::api::InferenceBackend;
use crate::core::submission::SubmissionPayload;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InferenceOutcome {
    Reply(String),
    Failed,
}

/// Runs submissions off the UI task and reports each one's outcome, tagged
/// with its request id, on a single channel.
#[derive(Clone)]
pub struct InferenceService {
    tx: mpsc::UnboundedSender<(InferenceOutcome, u64)>,
    shutdown: CancellationToken,
}

impl InferenceService {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(InferenceOutcome, u64)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                shutdown: CancellationToken::new(),
            },
            rx,
        )
    }

    /// Every spawned request sends exactly one outcome unless the service is
    /// shut down first.
    pub fn spawn_request(&self, backend: Arc<dyn InferenceBackend>, payload: SubmissionPayload) {
        let tx = self.tx.clone();
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            let request_id = payload.request_id;
            let request = AssertUnwindSafe(backend.infer(&payload)).catch_unwind();
            tokio::select! {
                result = request => {
                    let outcome = match result {
                        Ok(Ok(text)) => {
                            debug!(request_id, "Inference request completed");
                            InferenceOutcome::Reply(text)
                        }
                        Ok(Err(err)) => {
                            error!(
                                request_id,
                                timeout = err.is_timeout(),
                                error = %err,
                                "Inference request failed"
                            );
                            InferenceOutcome::Failed
                        }
                        Err(_) => {
                            error!(request_id, "Inference request panicked");
                            InferenceOutcome::Failed
                        }
                    };
                    let _ = tx.send((outcome, request_id));
                }
                _ = shutdown.cancelled() => {
                    debug!(request_id, "Inference request abandoned at shutdown");
                }
            }
        });
    }

    /// Abandons requests still in flight.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}
