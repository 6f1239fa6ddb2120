pub mod http;

use crate::chat::ChatMessage;
use crate::error::AssistantError;
use crate::event::AppEvent;
use async_trait::async_trait;
use std::sync::{mpsc, Arc};
use tokio::runtime::Handle;

#[async_trait]
pub trait AssistantBackend: Send + Sync {
    /// Sends the full conversation and returns the reply text.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, AssistantError>;
}

/// Stand-in used when no backend could be configured. Every call fails with
/// the configuration problem so the UI reports it on first use.
pub struct UnavailableBackend {
    reason: String,
}

impl UnavailableBackend {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl AssistantBackend for UnavailableBackend {
    async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, AssistantError> {
        Err(AssistantError::Misconfiguration(self.reason.clone()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Typed by the user; shown in the transcript.
    Prompt,
    /// Generated after a folder import; only the reply is shown.
    FolderAnalysis,
}

#[derive(Debug, Clone)]
pub struct AssistantRequest {
    pub request_id: u64,
    pub kind: RequestKind,
    pub prompt: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Clone)]
pub struct AssistantClient {
    backend: Arc<dyn AssistantBackend>,
    tx: mpsc::Sender<AppEvent>,
    runtime_handle: Handle,
}

impl AssistantClient {
    pub fn new(
        backend: Arc<dyn AssistantBackend>,
        tx: mpsc::Sender<AppEvent>,
        runtime_handle: Handle,
    ) -> Self {
        Self {
            backend,
            tx,
            runtime_handle,
        }
    }

    pub fn send(&self, request: AssistantRequest) {
        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();

        self.runtime_handle.spawn(async move {
            let AssistantRequest {
                request_id,
                kind,
                prompt,
                messages,
            } = request;
            tracing::debug!(request_id, messages = messages.len(), "sending assistant request");

            // A panicking backend still produces a failed reply for this id.
            let call = tokio::spawn(async move { backend.complete(&messages).await });
            let result = match call.await {
                Ok(result) => result.map_err(|err| err.to_string()),
                Err(err) => {
                    tracing::error!(request_id, error = %err, "assistant task failed");
                    Err(format!("assistant task failed: {err}"))
                }
            };
            let _ = tx.send(AppEvent::AssistantReply {
                request_id,
                kind,
                prompt,
                result,
            });
        });
    }
}
