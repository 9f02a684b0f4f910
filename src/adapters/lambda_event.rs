use axum::body::Bytes;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::adapters::form_body::decode_submission;
use crate::core::handler::RowIngestionHandler;
use crate::domain::model::Submission;
use crate::domain::ports::TableStore;
use crate::utils::error::{IngestError, Result};

/// The parts of an API Gateway / function URL proxy event we read.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyRequest {
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
    #[serde(default)]
    pub raw_query_string: Option<String>,
    #[serde(default)]
    pub query_string_parameters: Option<HashMap<String, String>>,
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl ProxyResponse {
    fn new(status_code: u16, content_type: &str, body: String) -> Self {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), content_type.to_string());
        Self {
            status_code,
            headers,
            body,
        }
    }
}

impl ProxyRequest {
    /// Header names are matched case-insensitively.
    fn header(&self, name: &str) -> Option<&str> {
        self.headers.as_ref().and_then(|headers| {
            headers
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.as_str())
        })
    }

    pub async fn into_submission(self) -> Result<Submission> {
        let content_type = self.header("content-type").map(str::to_string);

        let body = match self.body {
            Some(body) if self.is_base64_encoded => {
                STANDARD
                    .decode(body.as_bytes())
                    .map_err(|e| IngestError::MalformedRequest {
                        message: format!("invalid base64 body: {}", e),
                    })?
            }
            Some(body) => body.into_bytes(),
            None => Vec::new(),
        };

        let query = match (self.raw_query_string, self.query_string_parameters) {
            (Some(raw), _) => Some(raw),
            (None, Some(params)) => Some(
                url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(params)
                    .finish(),
            ),
            (None, None) => None,
        };

        decode_submission(query.as_deref(), content_type.as_deref(), Bytes::from(body)).await
    }
}

/// A `null` event is the no-request path and yields `None`.
pub async fn handle_event<S: TableStore>(
    handler: &RowIngestionHandler<S>,
    event: Option<ProxyRequest>,
) -> Option<ProxyResponse> {
    let submission = match event {
        Some(request) => match request.into_submission().await {
            Ok(submission) => Some(submission),
            Err(err) => return Some(error_response(err)),
        },
        None => None,
    };

    match handler.handle(submission).await {
        Ok(Some(ack)) => match serde_json::to_string(&ack) {
            Ok(body) => Some(ProxyResponse::new(200, "application/json", body)),
            Err(err) => Some(error_response(err.into())),
        },
        Ok(None) => None,
        Err(err) => Some(error_response(err)),
    }
}

fn error_response(err: IngestError) -> ProxyResponse {
    let status = err.status_code().as_u16();
    tracing::error!(status, "Submission failed: {}", err);
    ProxyResponse::new(status, "text/plain; charset=utf-8", err.to_string())
}
