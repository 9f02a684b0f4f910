use crate::domain::model::OutputRow;
use crate::domain::ports::TableStore;
use crate::utils::error::{IngestError, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Serialize)]
struct AppendBody {
    values: Vec<Vec<String>>,
}

/// Client for a spreadsheet "values" API:
/// `GET {endpoint}/values/'{table}'!1:1` and
/// `POST {endpoint}/values/'{table}'!A1:append`.
#[derive(Debug, Clone)]
pub struct RemoteTableStore {
    client: Client,
    endpoint: Url,
    token: Option<String>,
}

impl RemoteTableStore {
    pub fn new(endpoint: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| IngestError::InvalidConfigValueError {
            field: "store.endpoint".to_string(),
            value: endpoint.to_string(),
            reason: format!("Invalid URL format: {}", e),
        })?;

        if endpoint.cannot_be_a_base() {
            return Err(IngestError::InvalidConfigValueError {
                field: "store.endpoint".to_string(),
                value: endpoint.to_string(),
                reason: "URL cannot be used as a base".to_string(),
            });
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint,
            token,
        })
    }

    fn values_url(&self, range: &str) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("values").push(range);
        }
        url
    }

    fn range(table: &str, cells: &str) -> String {
        format!("'{}'!{}", table.replace('\'', "''"), cells)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn check_status(table: &str, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        // An unknown sheet name makes the whole range unparseable.
        let unknown_range =
            status == StatusCode::BAD_REQUEST && message.contains("Unable to parse range");
        if status == StatusCode::NOT_FOUND || unknown_range {
            return Err(IngestError::TableNotFound {
                table: table.to_string(),
            });
        }

        Err(IngestError::StoreRejected {
            status: status.as_u16(),
            message,
        })
    }
}

fn cell_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(text) => text,
        other => other.to_string(),
    }
}

#[async_trait]
impl TableStore for RemoteTableStore {
    async fn read_header_cells(&self, table: &str) -> Result<Vec<String>> {
        let url = self.values_url(&Self::range(table, "1:1"));
        tracing::debug!("Reading header row from {}", url);

        let response = self.authorize(self.client.get(url)).send().await?;
        let response = Self::check_status(table, response).await?;
        let range: ValueRange = response.json().await?;

        Ok(range
            .values
            .into_iter()
            .next()
            .unwrap_or_default()
            .into_iter()
            .map(cell_text)
            .collect())
    }

    async fn append_row(&self, table: &str, row: &OutputRow) -> Result<()> {
        let url = self.values_url(&Self::range(table, "A1:append"));
        let body = AppendBody {
            values: vec![row.to_table_values()],
        };
        tracing::debug!("Appending {} cells via {}", row.len(), url);

        let request = self
            .client
            .post(url)
            .query(&[
                ("valueInputOption", "RAW"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&body);
        let response = self.authorize(request).send().await?;
        Self::check_status(table, response).await?;

        Ok(())
    }
}
