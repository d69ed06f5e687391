//! SSE stream adapter for `streamGenerateContent?alt=sse`.
//!
//! Each SSE `data:` line carries a complete `GeminiResponse` JSON object with
//! the next slice of text. There are no named events; the stream simply ends
//! when the response body closes. Errors arrive as a non-2xx status before
//! the first event.

use futures_util::StreamExt;
use reqwest_eventsource::{Error as EventSourceError, Event, RequestBuilderExt, retry::Never};
use secrecy::{ExposeSecret, SecretString};

use parley_core::llm::provider::LlmStream;
use parley_types::llm::{LlmError, StreamEvent, Usage};

use super::client::map_error_status;
use super::types::{GeminiRequest, GeminiResponse};

/// Open a streaming call and map it to provider-agnostic [`StreamEvent`]s.
///
/// Emits one `TextDelta` per non-empty chunk, then `MessageDelta` and
/// `Usage` when the backend reported them, then `Done`. Reconnects are
/// disabled: a dropped connection ends the stream with an error.
pub fn create_gemini_stream(
    client: &reqwest::Client,
    url: String,
    body: GeminiRequest,
    api_key: &SecretString,
) -> LlmStream {
    let builder = client
        .post(url)
        .header("x-goog-api-key", api_key.expose_secret())
        .json(&body);

    Box::pin(async_stream::try_stream! {
        let mut source = builder
            .eventsource()
            .map_err(|e| LlmError::Stream(format!("cannot open event stream: {e}")))?;
        source.set_retry_policy(Box::new(Never));

        let mut stop_reason = None;
        let mut usage: Option<Usage> = None;

        while let Some(event) = source.next().await {
            match event {
                Ok(Event::Open) => {
                    tracing::debug!("Gemini stream opened");
                }
                Ok(Event::Message(message)) => {
                    let chunk: GeminiResponse = serde_json::from_str(&message.data).map_err(|e| {
                        LlmError::Deserialization(format!("stream chunk: {e}"))
                    })?;
                    if let Some(reason) = chunk.stop_reason() {
                        stop_reason = Some(reason);
                    }
                    if let Some(meta) = chunk.usage_metadata.clone() {
                        usage = Some(meta.into());
                    }
                    let text = chunk.text();
                    if !text.is_empty() {
                        yield StreamEvent::TextDelta { text };
                    }
                }
                Err(EventSourceError::StreamEnded) => break,
                Err(EventSourceError::InvalidStatusCode(status, response)) => {
                    source.close();
                    let body = response.text().await.unwrap_or_default();
                    tracing::warn!(status = %status, "Gemini stream API error response");
                    Err::<(), _>(map_error_status(status.as_u16(), &body))?;
                }
                Err(e) => {
                    source.close();
                    Err::<(), _>(LlmError::Stream(e.to_string()))?;
                }
            }
        }
        source.close();

        if let Some(stop_reason) = stop_reason {
            yield StreamEvent::MessageDelta { stop_reason };
        }
        if let Some(usage) = usage {
            yield StreamEvent::Usage(usage);
        }
        yield StreamEvent::Done;
    })
}
