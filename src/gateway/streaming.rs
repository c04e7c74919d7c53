//! Lazy, finite stream of chat content fragments.

use std::collections::VecDeque;
use std::fmt::Display;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::stream::{self, Stream, StreamExt};
use tokio::time::{Instant, Sleep, sleep_until};
use tracing::{debug, warn};

use super::error::{GatewayError, GatewayResult};
use super::sse::{SseDecoder, SseEvent};

/// Content fragments of one streamed completion, in arrival order.
///
/// Yields `Ok(fragment)` for every non-empty delta and ends on the upstream `[DONE]`
/// sentinel or end of body. A transport error, a schema violation or the call deadline
/// is yielded once as `Err` and terminates the stream. Dropping it releases the
/// connection.
pub struct ChatStream {
    inner: Pin<Box<dyn Stream<Item = GatewayResult<String>> + Send>>,
}

impl ChatStream {
    /// Wraps any fragment stream.
    pub fn new<S>(inner: S) -> Self
    where
        S: Stream<Item = GatewayResult<String>> + Send + 'static,
    {
        Self {
            inner: Box::pin(inner),
        }
    }

    /// Stream over pre-computed fragments.
    pub fn from_fragments<I>(fragments: I) -> Self
    where
        I: IntoIterator<Item = GatewayResult<String>>,
        I::IntoIter: Send + 'static,
    {
        Self::new(stream::iter(fragments))
    }

    /// Decodes an SSE byte body, enforcing `deadline` across the whole body.
    pub(crate) fn from_byte_stream<S, B, E>(
        model: String,
        body: S,
        deadline: Instant,
        timeout: Duration,
    ) -> Self
    where
        S: Stream<Item = Result<B, E>> + Send + 'static,
        B: AsRef<[u8]> + Send + 'static,
        E: Display + Send + 'static,
    {
        let state = ByteStreamState {
            model,
            body: Box::pin(body),
            decoder: SseDecoder::new(),
            pending: VecDeque::new(),
            deadline,
            sleep: None,
            timeout,
            finished: false,
        };

        Self::new(stream::unfold(state, |mut state| async move {
            let item = state.next_fragment().await?;
            Some((item, state))
        }))
    }

    /// Concatenates every fragment, failing on the first error.
    pub async fn collect_text(mut self) -> GatewayResult<String> {
        let mut text = String::new();
        while let Some(fragment) = self.next().await {
            text.push_str(&fragment?);
        }
        Ok(text)
    }
}

impl Stream for ChatStream {
    type Item = GatewayResult<String>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl std::fmt::Debug for ChatStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatStream").finish_non_exhaustive()
    }
}

struct ByteStreamState<S> {
    model: String,
    body: Pin<Box<S>>,
    decoder: SseDecoder,
    pending: VecDeque<GatewayResult<String>>,
    deadline: Instant,
    sleep: Option<Pin<Box<Sleep>>>,
    timeout: Duration,
    finished: bool,
}

impl<S, B, E> ByteStreamState<S>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
{
    async fn next_fragment(&mut self) -> Option<GatewayResult<String>> {
        loop {
            if let Some(item) = self.pending.pop_front() {
                return Some(item);
            }
            if self.finished {
                return None;
            }

            let deadline = self.deadline;
            let sleep = self
                .sleep
                .get_or_insert_with(|| Box::pin(sleep_until(deadline)));

            let chunk = tokio::select! {
                biased;

                _ = sleep.as_mut() => None,
                chunk = self.body.next() => Some(chunk),
            };

            match chunk {
                None => {
                    warn!(model = %self.model, "Stream deadline elapsed");
                    self.finished = true;
                    return Some(Err(GatewayError::Timeout {
                        model: self.model.clone(),
                        after: self.timeout,
                    }));
                }
                Some(Some(Ok(bytes))) => {
                    let events = self.decoder.feed(bytes.as_ref());
                    self.absorb(events);
                }
                Some(Some(Err(err))) => {
                    self.finished = true;
                    return Some(Err(GatewayError::Network {
                        model: self.model.clone(),
                        message: err.to_string(),
                    }));
                }
                Some(None) => {
                    let events = self.decoder.finish();
                    self.absorb(events);
                    self.finished = true;
                }
            }
        }
    }

    fn absorb(&mut self, events: Vec<SseEvent>) {
        for event in events {
            match event {
                SseEvent::Delta(content) => self.pending.push_back(Ok(content)),
                SseEvent::Done => {
                    debug!(model = %self.model, "Stream completed");
                    self.finished = true;
                    return;
                }
                SseEvent::Malformed(reason) => {
                    warn!(model = %self.model, %reason, "Malformed stream chunk");
                    self.pending
                        .push_back(Err(GatewayError::malformed(&self.model, reason)));
                    self.finished = true;
                    return;
                }
            }
        }
    }
}
