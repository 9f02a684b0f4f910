use axum::body::{Body, Bytes};
use axum::extract::{FromRequest, Multipart};
use axum::http::{header::CONTENT_TYPE, Request};

use crate::domain::model::Submission;
use crate::utils::error::{IngestError, Result};

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
const MULTIPART_FORM_DATA: &str = "multipart/form-data";

/// Body encodings a submission may arrive in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    UrlEncoded,
    Multipart,
}

impl BodyFormat {
    /// A missing or blank `Content-Type` is read as URL-encoded. Parameters
    /// such as `charset` or `boundary` are ignored here.
    pub fn from_content_type(content_type: Option<&str>) -> Result<Self> {
        let raw = content_type.unwrap_or_default();
        let essence = raw
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "" | FORM_URLENCODED => Ok(BodyFormat::UrlEncoded),
            MULTIPART_FORM_DATA => Ok(BodyFormat::Multipart),
            _ => Err(IngestError::UnsupportedContentType {
                content_type: raw.to_string(),
            }),
        }
    }
}

/// Builds the submission from the query string and a body in either form
/// encoding. Query parameters are read before body fields.
pub async fn decode_submission(
    query: Option<&str>,
    content_type: Option<&str>,
    body: Bytes,
) -> Result<Submission> {
    match BodyFormat::from_content_type(content_type)? {
        BodyFormat::UrlEncoded => Ok(Submission::from_query_and_body(query, &body)),
        BodyFormat::Multipart => {
            let fields = multipart_fields(content_type.unwrap_or_default(), body).await?;
            let from_query = url::form_urlencoded::parse(query.unwrap_or_default().as_bytes())
                .map(|(key, value)| (key.into_owned(), value.into_owned()));
            Ok(Submission::from_pairs(from_query.chain(fields)))
        }
    }
}

fn malformed(message: impl ToString) -> IngestError {
    IngestError::MalformedRequest {
        message: message.to_string(),
    }
}

/// Text fields of a `multipart/form-data` body, in order. File parts are skipped.
async fn multipart_fields(content_type: &str, body: Bytes) -> Result<Vec<(String, String)>> {
    let request = Request::builder()
        .header(CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .map_err(malformed)?;
    let mut multipart = Multipart::from_request(request, &()).await.map_err(malformed)?;

    let mut fields = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        if field.file_name().is_some() {
            continue;
        }
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let value = field.text().await.map_err(malformed)?;
        fields.push((name, value));
    }

    tracing::debug!(fields = fields.len(), "Decoded multipart form");
    Ok(fields)
}
