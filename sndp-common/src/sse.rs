//! Server-Sent Events (SSE) utilities
//!
//! Streams EventBus traffic to connected clients, with heartbeats for
//! connection status monitoring.

use crate::events::EventBus;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

/// Create an SSE stream over all future EventBus events
///
/// Each event is serialized to JSON and sent under the "SndpEvent"
/// event name. A lagging client skips the lost events and keeps
/// receiving; the stream ends when the bus is dropped.
pub fn event_sse_stream(
    bus: &EventBus,
    service_name: &'static str,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("New SSE client connected to {} events", service_name);
    let mut rx = bus.subscribe();

    let stream = async_stream::stream! {
        // Initial connected status so clients can render state
        // before the first domain event arrives.
        yield Ok(Event::default()
            .event("ConnectionStatus")
            .data("connected"));

        loop {
            match rx.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(json) => {
                        debug!("SSE: forwarding event: {}", json);
                        yield Ok(Event::default().event("SndpEvent").data(json));
                    }
                    Err(e) => warn!("SSE: failed to serialize event: {}", e),
                },
                Err(RecvError::Lagged(missed)) => {
                    warn!("SSE: client lagged, {} events dropped", missed);
                }
                Err(RecvError::Closed) => {
                    info!("SSE: {} event stream closed", service_name);
                    break;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    )
}
