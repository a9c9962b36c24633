//! Progress updates as server-sent events.

use crate::measurement::ProgressState;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::stream::Stream;
use log::warn;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::StreamExt;

/// Stream every progress state published on `receiver`, starting with the
/// current one. A keep-alive ping is sent every 15 seconds.
pub fn progress_stream(
    receiver: watch::Receiver<ProgressState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + Send + 'static> {
    let stream = WatchStream::new(receiver).filter_map(|state| {
        match serde_json::to_string(&state) {
            Ok(json) => Some(Ok(Event::default().event("progress").data(json))),
            Err(e) => {
                warn!("Failed to serialize progress event: {}", e);
                None
            }
        }
    });

    Sse::new(stream)
        .keep_alive(KeepAlive::new().interval(Duration::from_secs(15)).text("ping"))
}
