//! `GET /api/v1/scrape/stream`: one streaming session per connection,
//! delivered as server-sent events.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
    Extension,
};
use futures::stream::Stream;
use socmet_session::StreamHandle;

use crate::middleware::RequestId;

use super::scrape::{validate, ScrapeRequest};
use super::{ApiError, AppState};

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

pub(super) async fn scrape_stream(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(request): Query<ScrapeRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let valid = validate(&req_id.0, &request)?;
    tracing::info!(platform = %valid.platform, request_id = %req_id.0, "sse client connected");

    let StreamHandle {
        mut events, cancel, ..
    } = state.scrape.spawn_stream(valid.platform, valid.url);

    let stream = async_stream::stream! {
        // Dropped with the response body, so a client disconnect cancels the session.
        let _guard = cancel.drop_guard();

        while let Some(event) = events.recv().await {
            let terminal = event.is_terminal();
            match event.payload_json() {
                Ok(json) => yield Ok(Event::default().event(event.name()).data(json)),
                Err(e) => tracing::warn!(event = event.name(), error = %e, "failed to serialize event"),
            }
            if terminal {
                break;
            }
        }
        tracing::debug!(request_id = %req_id.0, "sse stream closed");
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(KEEP_ALIVE_INTERVAL)
            .text("keep-alive"),
    ))
}
