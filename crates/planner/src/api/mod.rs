//! Completion provider seam and its HTTP implementation

pub mod openai;

use async_trait::async_trait;

use crate::error::CompletionError;
use crate::types::ChatMessage;

pub use openai::OpenAiClient;

/// One chat-completion call
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    /// Ask the provider for a JSON object response
    pub json_mode: bool,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// A single completion attempt. Retries and timeouts are layered on top by
/// [`crate::retry::with_retry`].
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Replays scripted outcomes in order; the last one repeats once the
    /// script runs out.
    pub(crate) struct ScriptedProvider {
        script: Mutex<VecDeque<Result<String, CompletionError>>>,
        last: Mutex<Option<Result<String, CompletionError>>>,
        calls: AtomicU32,
        pub(crate) requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedProvider {
        pub(crate) fn new(script: Vec<Result<String, CompletionError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                last: Mutex::new(None),
                calls: AtomicU32::new(0),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn always(outcome: Result<String, CompletionError>) -> Self {
            Self::new(vec![outcome])
        }

        pub(crate) fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request.clone());
            let next = self.script.lock().unwrap().pop_front();
            let mut last = self.last.lock().unwrap();
            if let Some(outcome) = next {
                *last = Some(outcome);
            }
            last.clone().unwrap_or(Err(CompletionError::EmptyResponse))
        }
    }

    /// Answers each request with a function of the request.
    pub(crate) struct FnProvider<F> {
        respond: F,
        calls: AtomicU32,
    }

    impl<F> FnProvider<F>
    where
        F: Fn(&CompletionRequest) -> Result<String, CompletionError> + Send + Sync,
    {
        pub(crate) fn new(respond: F) -> Self {
            Self { respond, calls: AtomicU32::new(0) }
        }

        pub(crate) fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl<F> CompletionProvider for FnProvider<F>
    where
        F: Fn(&CompletionRequest) -> Result<String, CompletionError> + Send + Sync,
    {
        async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.respond)(request)
        }
    }
}
