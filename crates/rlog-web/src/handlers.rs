//! HTTP request handlers.

use std::convert::Infallible;
use std::sync::Arc;

use axum::Json;
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use futures::SinkExt;
use futures::channel::mpsc;
use serde::{Deserialize, Serialize, Serializer};

use rlog_engine::{FilterParams, FilterSpec, QueryMode};
use rlog_types::Record;

use crate::error::{WebError, WebResult};
use crate::state::WebState;

/// Chunks buffered between the query thread and the response body
const STREAM_BUFFER: usize = 64;

/// Query parameters for log queries.
#[derive(Debug, Default, Deserialize)]
pub struct LogParams {
    pub level: Option<String>,
    pub thread: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub content: Option<String>,
}

impl LogParams {
    fn into_filter(self, source_name: Option<&str>) -> WebResult<FilterSpec> {
        let params = FilterParams {
            level: self.level,
            threads: self.thread.into_iter().collect(),
            start_time: self.start_time,
            end_time: self.end_time,
            content: self.content,
            source_name: source_name.map(str::to_string),
        };
        Ok(FilterSpec::from_params(&params)?)
    }
}

/// Structured query response.
#[derive(Debug, Serialize)]
pub struct LogsResponse {
    /// Serialized through [`Record::as_structured`]
    #[serde(serialize_with = "serialize_structured")]
    pub records: Vec<Record>,
    pub failures: Vec<String>,
    /// The result cap cut the query short
    pub capped: bool,
}

fn serialize_structured<S>(records: &[Record], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_seq(records.iter().map(Record::as_structured))
}

/// Index rebuild response.
#[derive(Debug, Serialize)]
pub struct RebuildResponse {
    pub sources: usize,
    pub indexed: usize,
    pub failures: Vec<String>,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Handle GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Handle GET /logs - matching records as plain text, streamed in order
pub async fn get_logs(
    State(state): State<Arc<WebState>>,
    Query(params): Query<LogParams>,
) -> WebResult<Response> {
    let filter = params.into_filter(state.source_name())?;
    let mode = QueryMode::for_filter(&filter);
    let session = state.session();
    let (mut tx, rx) = mpsc::channel::<Result<String, Infallible>>(STREAM_BUFFER);

    tokio::task::spawn_blocking(move || {
        for result in session.run(&filter, mode) {
            match result {
                Ok(record) => {
                    let sent = futures::executor::block_on(tx.send(Ok(record.raw)));
                    if sent.is_err() {
                        // client went away
                        break;
                    }
                }
                Err(err) => tracing::warn!("{}", err),
            }
        }
    });

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(rx),
    )
        .into_response())
}

/// Handle GET /logs.json - matching records as structured values
pub async fn get_logs_json(
    State(state): State<Arc<WebState>>,
    Query(params): Query<LogParams>,
) -> WebResult<Json<LogsResponse>> {
    let filter = params.into_filter(state.source_name())?;
    let mode = QueryMode::for_filter(&filter);
    let session = state.session();

    let response = tokio::task::spawn_blocking(move || {
        let mut records = Vec::new();
        let mut failures = Vec::new();

        let mut results = session.run(&filter, mode);
        for result in results.by_ref() {
            match result {
                Ok(record) => records.push(record),
                Err(err) => failures.push(err.to_string()),
            }
        }

        LogsResponse {
            records,
            failures,
            capped: results.is_capped(),
        }
    })
    .await
    .map_err(|e| WebError::Internal(e.to_string()))?;

    Ok(Json(response))
}

/// Handle POST /index/rebuild
pub async fn rebuild_index(
    State(state): State<Arc<WebState>>,
) -> WebResult<Json<RebuildResponse>> {
    let session = state.rebuild().await?;
    let (indexed, failures) = session
        .index()
        .map(|index| {
            (
                index.len(),
                index.failures().iter().map(|e| e.to_string()).collect::<Vec<_>>(),
            )
        })
        .unwrap_or_default();

    tracing::info!(
        "index rebuilt: {} sources, {} indexed",
        session.sources().len(),
        indexed
    );

    Ok(Json(RebuildResponse {
        sources: session.sources().len(),
        indexed,
        failures,
    }))
}
