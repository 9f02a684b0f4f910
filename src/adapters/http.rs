use std::future::Future;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use tokio::net::TcpListener;

use crate::adapters::form_body::decode_submission;
use crate::core::handler::RowIngestionHandler;
use crate::domain::ports::TableStore;
use crate::utils::error::{IngestError, Result};

const MAX_FORM_BODY_BYTES: usize = 2 * 1024 * 1024;

type SharedHandler<S> = Arc<RowIngestionHandler<S>>;

/// `POST {path}` with a URL-encoded or multipart form body and/or a query
/// string appends one row.
pub fn router<S: TableStore + 'static>(handler: SharedHandler<S>, path: &str) -> Router {
    Router::new()
        .route(path, post(submit::<S>))
        .with_state(handler)
        .layer(DefaultBodyLimit::max(MAX_FORM_BODY_BYTES))
}

async fn submit<S: TableStore + 'static>(
    State(handler): State<SharedHandler<S>>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let content_type = headers
        .get(CONTENT_TYPE)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned());

    let submission = match decode_submission(uri.query(), content_type.as_deref(), body).await {
        Ok(submission) => submission,
        Err(err) => return err.into_response(),
    };
    tracing::debug!(fields = submission.len(), "Received form submission");

    match handler.handle(Some(submission)).await {
        Ok(Some(ack)) => (StatusCode::OK, Json(ack)).into_response(),
        Ok(None) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}

impl IngestError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            IngestError::MalformedRequest { .. } => StatusCode::BAD_REQUEST,
            IngestError::UnsupportedContentType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            IngestError::TableNotFound { .. } => StatusCode::NOT_FOUND,
            IngestError::LockTimeout { .. } => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Plain-text failure body; there is no JSON error envelope.
impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        tracing::error!(status = status.as_u16(), "Submission failed: {}", self);
        (
            status,
            [(CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.to_string(),
        )
            .into_response()
    }
}

pub async fn serve_listener<S, F>(
    listener: TcpListener,
    handler: SharedHandler<S>,
    path: &str,
    shutdown: F,
) -> Result<()>
where
    S: TableStore + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(handler, path);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Binds `bind_addr` and serves until Ctrl-C.
pub async fn serve<S: TableStore + 'static>(
    handler: SharedHandler<S>,
    bind_addr: &str,
    path: &str,
) -> Result<()> {
    let listener = TcpListener::bind(bind_addr).await?;
    tracing::info!(
        "Listening on http://{}{} (table '{}')",
        listener.local_addr()?,
        path,
        handler.table()
    );

    serve_listener(listener, handler, path, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
        }
        tracing::info!("Shutting down");
    })
    .await
}
