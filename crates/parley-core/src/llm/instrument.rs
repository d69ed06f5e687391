//! Span-carrying stream wrapper for generation calls.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;
use parley_types::llm::{LlmError, StreamEvent};

use super::provider::LlmStream;

/// Keeps a GenAI span entered for every poll of a streaming call.
///
/// Without this, the span would close as soon as the stream was created
/// and the time spent streaming would be lost.
pub struct StreamInSpan {
    inner: LlmStream,
    span: tracing::Span,
}

impl StreamInSpan {
    pub fn new(inner: LlmStream, span: tracing::Span) -> Self {
        Self { inner, span }
    }
}

impl Stream for StreamInSpan {
    type Item = Result<StreamEvent, LlmError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        // Both fields are Unpin: `inner` is already a pinned box.
        let this = self.get_mut();
        let _enter = this.span.enter();
        this.inner.as_mut().poll_next(cx)
    }
}
