//! LlmClient trait definition

use async_trait::async_trait;
use tokio::sync::mpsc;
#[allow(unused_imports)]
use tracing::debug;

use super::{CompletionRequest, CompletionResponse, LlmError, StreamChunk};

/// Stateless LLM client - each call is independent
///
/// This is the core abstraction for interacting with language models.
/// Conversation state lives in the caller (each exploration step owns its
/// own message history and re-sends it per iteration); the client holds
/// only connection details.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a single completion request (blocking until complete)
    ///
    /// This is the primary method for exploration iterations, planning,
    /// compression, and synthesis.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Streaming completion for live terminal output
    ///
    /// Sends chunks to the provided channel as they arrive.
    /// Returns the final complete response.
    async fn stream(
        &self,
        request: CompletionRequest,
        chunk_tx: mpsc::Sender<StreamChunk>,
    ) -> Result<CompletionResponse, LlmError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing::debug;

    /// Mock LLM client for unit tests
    ///
    /// Plays back a scripted sequence of responses; errors with
    /// InvalidResponse once the script is exhausted, which doubles as the
    /// LLM-failure path in error tests.
    pub struct MockLlmClient {
        responses: Vec<CompletionResponse>,
        call_count: AtomicUsize,
    }

    impl MockLlmClient {
        pub fn new(responses: Vec<CompletionResponse>) -> Self {
            debug!(response_count = %responses.len(), "MockLlmClient::new: called");
            Self {
                responses,
                call_count: AtomicUsize::new(0),
            }
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LlmClient for MockLlmClient {
        async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
            debug!("MockLlmClient::complete: called");
            let idx = self.call_count.fetch_add(1, Ordering::SeqCst);
            debug!(%idx, "MockLlmClient::complete: fetching response");
            self.responses.get(idx).cloned().ok_or_else(|| {
                debug!("MockLlmClient::complete: no more mock responses");
                LlmError::InvalidResponse("No more mock responses".to_string())
            })
        }

        async fn stream(
            &self,
            request: CompletionRequest,
            chunk_tx: mpsc::Sender<StreamChunk>,
        ) -> Result<CompletionResponse, LlmError> {
            debug!("MockLlmClient::stream: called");
            let response = self.complete(request).await?;
            if let Some(text) = &response.content {
                let _ = chunk_tx.send(StreamChunk::TextDelta(text.clone())).await;
            }
            let _ = chunk_tx
                .send(StreamChunk::MessageDone {
                    stop_reason: response.stop_reason.clone(),
                    usage: response.usage.clone(),
                })
                .await;
            Ok(response)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::llm::{StopReason, TokenUsage};

        fn text_response(text: &str) -> CompletionResponse {
            CompletionResponse {
                content: Some(text.to_string()),
                tool_calls: vec![],
                stop_reason: StopReason::EndTurn,
                usage: TokenUsage::default(),
            }
        }

        #[tokio::test]
        async fn test_mock_client_plays_back_in_order() {
            let client = MockLlmClient::new(vec![text_response("first"), text_response("second")]);

            let req = CompletionRequest {
                system_prompt: "Test".to_string(),
                messages: vec![],
                tools: vec![],
                max_tokens: 1000,
            };

            assert_eq!(client.complete(req.clone()).await.unwrap().content.as_deref(), Some("first"));
            assert_eq!(client.complete(req).await.unwrap().content.as_deref(), Some("second"));
            assert_eq!(client.call_count(), 2);
        }

        #[tokio::test]
        async fn test_mock_client_errors_when_exhausted() {
            let client = MockLlmClient::new(vec![]);

            let req = CompletionRequest {
                system_prompt: "Test".to_string(),
                messages: vec![],
                tools: vec![],
                max_tokens: 1000,
            };

            let result = client.complete(req).await;
            assert!(matches!(result, Err(LlmError::InvalidResponse(_))));
        }

        #[tokio::test]
        async fn test_mock_client_stream_forwards_text() {
            let client = MockLlmClient::new(vec![text_response("streamed")]);
            let (tx, mut rx) = mpsc::channel(8);

            let req = CompletionRequest {
                system_prompt: "Test".to_string(),
                messages: vec![],
                tools: vec![],
                max_tokens: 1000,
            };

            let response = client.stream(req, tx).await.unwrap();
            assert_eq!(response.content.as_deref(), Some("streamed"));

            let first = rx.recv().await.unwrap();
            assert!(matches!(first, StreamChunk::TextDelta(ref t) if t == "streamed"));
            let done = rx.recv().await.unwrap();
            assert!(matches!(done, StreamChunk::MessageDone { .. }));
        }
    }
}
