//! Google Sheets API connector implementation

use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
use bridge_traits::retry::{execute_with_policy, RetryFailure};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

use crate::error::{GoogleSheetsError, Result};
use crate::types::{SheetRecord, SpreadsheetMetadata, ValueRange};

/// Google Sheets API base URL
pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4";

const API_TIMEOUT: Duration = Duration::from_secs(30);

/// Google Sheets API connector
///
/// Reads worksheet values with a bearer token carrying the
/// `spreadsheets.readonly` scope.
pub struct GoogleSheetsConnector {
    http_client: Arc<dyn HttpClient>,
    access_token: String,
    base_url: String,
    retry_policy: RetryPolicy,
}

impl GoogleSheetsConnector {
    pub fn new(http_client: Arc<dyn HttpClient>, access_token: String) -> Self {
        Self {
            http_client,
            access_token,
            base_url: SHEETS_API_BASE.to_string(),
            retry_policy: RetryPolicy::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Title of the spreadsheet's first worksheet.
    #[instrument(skip(self))]
    pub async fn first_sheet_title(&self, sheet_id: &str) -> Result<String> {
        let url = format!(
            "{}/spreadsheets/{}?fields=sheets.properties",
            self.base_url,
            urlencoding::encode(sheet_id)
        );

        let response = self.get(url, sheet_id).await?;
        let metadata: SpreadsheetMetadata = serde_json::from_slice(&response.body)
            .map_err(|e| GoogleSheetsError::ParseError(format!("spreadsheet metadata: {}", e)))?;

        metadata
            .first_sheet()
            .map(|properties| properties.title.clone())
            .ok_or_else(|| GoogleSheetsError::NoWorksheets {
                sheet_id: sheet_id.to_string(),
            })
    }

    /// All rows of worksheet `title`, cells rendered as text.
    #[instrument(skip(self))]
    pub async fn sheet_rows(&self, sheet_id: &str, title: &str) -> Result<Vec<Vec<String>>> {
        let range = format!("'{}'", title.replace('\'', "''"));
        let url = format!(
            "{}/spreadsheets/{}/values/{}?majorDimension=ROWS&valueRenderOption=FORMATTED_VALUE",
            self.base_url,
            urlencoding::encode(sheet_id),
            urlencoding::encode(&range)
        );

        let response = self.get(url, sheet_id).await?;
        let values: ValueRange = serde_json::from_slice(&response.body)
            .map_err(|e| GoogleSheetsError::ParseError(format!("value range: {}", e)))?;

        debug!(rows = values.values.len(), "Fetched worksheet values");
        Ok(values.text_rows())
    }

    /// The last data row of the first worksheet, keyed by the header row.
    ///
    /// Returns `Ok(None)` when the worksheet has no rows below the header.
    #[instrument(skip(self))]
    pub async fn latest_record(&self, sheet_id: &str) -> Result<Option<SheetRecord>> {
        let title = self.first_sheet_title(sheet_id).await?;
        let rows = self.sheet_rows(sheet_id, &title).await?;
        let record = SheetRecord::latest(&rows);

        match &record {
            Some(record) => info!(sheet = %title, columns = record.len(), "Read latest sheet row"),
            None => info!(sheet = %title, "Worksheet has no data rows"),
        }

        Ok(record)
    }

    async fn get(&self, url: String, sheet_id: &str) -> Result<HttpResponse> {
        let request = HttpRequest::new(HttpMethod::Get, url)
            .bearer_token(self.access_token.as_str())
            .header("Accept", "application/json")
            .timeout(API_TIMEOUT);

        match self.execute_with_retry(request).await {
            Err(GoogleSheetsError::ApiError {
                status_code: 404, ..
            }) => Err(GoogleSheetsError::SpreadsheetNotFound {
                sheet_id: sheet_id.to_string(),
            }),
            other => other,
        }
    }

    /// Execute API request under the connector's retry policy
    async fn execute_with_retry(&self, request: HttpRequest) -> Result<HttpResponse> {
        execute_with_policy(self.http_client.as_ref(), request, &self.retry_policy)
            .await
            .map_err(|failure| match failure {
                RetryFailure::Rejected(response) => {
                    let message = String::from_utf8_lossy(&response.body).to_string();
                    match response.status {
                        401 | 403 => GoogleSheetsError::AuthenticationFailed(message),
                        status_code => GoogleSheetsError::ApiError {
                            status_code,
                            message,
                        },
                    }
                }
                RetryFailure::Exhausted { response, attempts } => GoogleSheetsError::ApiError {
                    status_code: response.status,
                    message: format!("Request failed after {} attempts", attempts),
                },
                RetryFailure::Transport { error, .. } => {
                    GoogleSheetsError::NetworkError(error.to_string())
                }
            })
    }
}
