use eventsource_stream::Eventsource;
use futures::StreamExt;

use super::TokenStream;
use crate::error::GenerationError;

/// Decode an SSE response body into answer fragments.
///
/// `parse` receives each event's `data` and returns `None` for events that
/// carry no text.
pub(crate) fn sse_to_stream(
    response: reqwest::Response,
    parse: fn(&str) -> Option<Result<String, GenerationError>>,
) -> TokenStream {
    let events = response.bytes_stream().eventsource();
    let mapped = events.filter_map(move |event| {
        let item = match event {
            Ok(event) => parse(&event.data),
            Err(e) => Some(Err(GenerationError::StreamError(e.to_string()))),
        };
        futures::future::ready(item)
    });
    Box::pin(mapped)
}
