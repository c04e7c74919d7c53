//! Streaming interviewer replies with history write-back.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::stream::{self, Stream, StreamExt};
use tracing::debug;

use super::error::{BranchKind, OrchestratorError, OrchestratorResult};
use crate::cache::{CacheStore, ResultCache};
use crate::constants::MAX_DIALOGUE_HISTORY;
use crate::gateway::{ChatMessage, ChatStream};

/// Reply fragments of one interviewer turn.
///
/// Once the upstream stream ends cleanly the full reply is appended to the session
/// history and written back to the conversation cache. A stream that errors or is
/// dropped early leaves the stored history untouched.
pub struct DialogueStream {
    inner: Pin<Box<dyn Stream<Item = OrchestratorResult<String>> + Send>>,
}

struct DialogueState<S: CacheStore> {
    stream: ChatStream,
    reply: String,
    history: Vec<ChatMessage>,
    cache: Arc<ResultCache<S>>,
    session_id: String,
    done: bool,
}

impl<S: CacheStore> DialogueState<S> {
    async fn persist(&mut self) {
        let reply = std::mem::take(&mut self.reply);
        self.history.push(ChatMessage::assistant(reply));
        trim_history(&mut self.history);

        self.cache
            .cache_conversation(&self.session_id, &self.history)
            .await;
        debug!(
            session_id = %self.session_id,
            messages = self.history.len(),
            "Dialogue history saved"
        );
    }
}

/// Keeps only the most recent messages.
pub(crate) fn trim_history(history: &mut Vec<ChatMessage>) {
    if history.len() > MAX_DIALOGUE_HISTORY {
        history.drain(..history.len() - MAX_DIALOGUE_HISTORY);
    }
}

impl DialogueStream {
    pub(crate) fn new<S: CacheStore + 'static>(
        stream: ChatStream,
        history: Vec<ChatMessage>,
        cache: Arc<ResultCache<S>>,
        session_id: String,
    ) -> Self {
        let state = DialogueState {
            stream,
            reply: String::new(),
            history,
            cache,
            session_id,
            done: false,
        };

        let inner = stream::unfold(state, |mut state| async move {
            if state.done {
                return None;
            }

            match state.stream.next().await {
                Some(Ok(fragment)) => {
                    state.reply.push_str(&fragment);
                    Some((Ok(fragment), state))
                }
                Some(Err(source)) => {
                    state.done = true;
                    let err = OrchestratorError::Branch {
                        branch: BranchKind::Dialogue,
                        source,
                    };
                    Some((Err(err), state))
                }
                None => {
                    state.persist().await;
                    None
                }
            }
        });

        Self {
            inner: Box::pin(inner),
        }
    }

    /// Drains the stream and returns the whole reply.
    pub async fn collect_text(mut self) -> OrchestratorResult<String> {
        let mut text = String::new();
        while let Some(fragment) = self.next().await {
            text.push_str(&fragment?);
        }
        Ok(text)
    }
}

impl Stream for DialogueStream {
    type Item = OrchestratorResult<String>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl std::fmt::Debug for DialogueStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogueStream").finish_non_exhaustive()
    }
}
