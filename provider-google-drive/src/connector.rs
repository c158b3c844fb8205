//! Google Drive API connector implementation
//!
//! Implements [`DriveApi`] for Google Drive API v3 on top of the host's
//! `HttpClient`.

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
use bridge_traits::retry::{execute_with_policy, RetryFailure};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::api::{DriveApi, FilesPage};
use crate::error::{GoogleDriveError, Result};
use crate::query::ListQuery;
use crate::types::{CollectionId, FilesListResponse, Item, ItemId, SharedDrive};

/// Google Drive API base URL
pub const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Timeout for metadata and listing calls
const API_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for content downloads
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Google Drive API connector
///
/// # Features
///
/// - Paginated listing scoped to a shared drive
/// - Shared drive metadata lookup
/// - Content downloads from shared drives
/// - Exponential backoff for rate limiting and server errors
///
/// # Example
///
/// ```ignore
/// use provider_google_drive::{DriveApi, GoogleDriveConnector, ListQuery};
///
/// let connector = GoogleDriveConnector::new(http_client, access_token);
/// let page = connector.list_page(&ListQuery::children(None, None), None).await?;
/// ```
pub struct GoogleDriveConnector {
    /// HTTP client for API requests
    http_client: Arc<dyn HttpClient>,

    /// OAuth 2.0 access token
    access_token: String,

    base_url: String,

    retry_policy: RetryPolicy,
}

impl GoogleDriveConnector {
    /// Create a new Google Drive connector
    ///
    /// # Arguments
    ///
    /// * `http_client` - HTTP client implementation
    /// * `access_token` - OAuth 2.0 access token with `drive.readonly` scope
    pub fn new(http_client: Arc<dyn HttpClient>, access_token: String) -> Self {
        Self {
            http_client,
            access_token,
            base_url: DRIVE_API_BASE.to_string(),
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Point the connector at another endpoint (tests, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    fn request(&self, url: String, timeout: Duration) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, url)
            .bearer_token(self.access_token.as_str())
            .header("Accept", "application/json")
            .timeout(timeout)
    }

    fn retry_after_seconds(response: &HttpResponse) -> u64 {
        response
            .headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case("retry-after"))
            .and_then(|(_, value)| value.trim().parse().ok())
            .unwrap_or(0)
    }

    fn status_error(response: &HttpResponse) -> GoogleDriveError {
        let message = String::from_utf8_lossy(&response.body).to_string();
        match response.status {
            401 | 403 => GoogleDriveError::AuthenticationFailed(format!(
                "status {}: {}",
                response.status, message
            )),
            _ => GoogleDriveError::ApiError {
                status_code: response.status,
                message,
            },
        }
    }

    /// Execute API request under the connector's retry policy
    async fn execute_with_retry(&self, request: HttpRequest) -> Result<HttpResponse> {
        execute_with_policy(self.http_client.as_ref(), request, &self.retry_policy)
            .await
            .map_err(|failure| match failure {
                RetryFailure::Rejected(response) => Self::status_error(&response),
                RetryFailure::Exhausted { response, .. } if response.status == 429 => {
                    GoogleDriveError::RateLimitExceeded {
                        retry_after_seconds: Self::retry_after_seconds(&response),
                    }
                }
                RetryFailure::Exhausted { response, attempts } => GoogleDriveError::ApiError {
                    status_code: response.status,
                    message: format!("Request failed after {} attempts", attempts),
                },
                RetryFailure::Transport { error, .. } => {
                    GoogleDriveError::NetworkError(error.to_string())
                }
            })
    }
}

#[async_trait]
impl DriveApi for GoogleDriveConnector {
    #[instrument(skip(self, query), fields(filter = %query.filter(), has_token = page_token.is_some()))]
    async fn list_page(&self, query: &ListQuery, page_token: Option<String>) -> Result<FilesPage> {
        let url = format!(
            "{}/files?{}",
            self.base_url,
            query.to_query_string(page_token.as_deref())
        );

        let response = self.execute_with_retry(self.request(url, API_TIMEOUT)).await?;

        let list_response: FilesListResponse =
            serde_json::from_slice(&response.body).map_err(|e| {
                GoogleDriveError::ParseError(format!("Failed to parse files list response: {}", e))
            })?;

        if list_response.incomplete_search {
            warn!("Drive reported an incomplete search for this page");
        }

        let items: Vec<Item> = list_response.files.into_iter().map(Item::from).collect();
        debug!(count = items.len(), "Listed page");

        Ok(FilesPage {
            items,
            next_page_token: list_response.next_page_token,
        })
    }

    #[instrument(skip(self), fields(collection_id = %collection))]
    async fn get_collection(&self, collection: &CollectionId) -> Result<SharedDrive> {
        let url = format!(
            "{}/drives/{}?fields=id,name",
            self.base_url,
            urlencoding::encode(collection.as_str())
        );

        let response = match self.execute_with_retry(self.request(url, API_TIMEOUT)).await {
            Err(GoogleDriveError::ApiError {
                status_code: 404, ..
            }) => {
                return Err(GoogleDriveError::CollectionNotFound {
                    collection_id: collection.to_string(),
                })
            }
            other => other?,
        };

        let drive: SharedDrive = serde_json::from_slice(&response.body).map_err(|e| {
            GoogleDriveError::ParseError(format!("Failed to parse shared drive metadata: {}", e))
        })?;

        info!(name = %drive.name, "Fetched shared drive metadata");
        Ok(drive)
    }

    #[instrument(skip(self), fields(file_id = %file_id))]
    async fn download(&self, file_id: &ItemId) -> Result<Bytes> {
        let url = format!(
            "{}/files/{}?alt=media&supportsAllDrives=true",
            self.base_url,
            urlencoding::encode(file_id.as_str())
        );

        let request = HttpRequest::new(HttpMethod::Get, url)
            .bearer_token(self.access_token.as_str())
            .timeout(DOWNLOAD_TIMEOUT);

        let response = match self.execute_with_retry(request).await {
            Err(GoogleDriveError::ApiError {
                status_code: 404, ..
            }) => {
                return Err(GoogleDriveError::FileNotFound {
                    file_id: file_id.to_string(),
                })
            }
            other => other?,
        };

        info!(bytes = response.body.len(), "Downloaded file");
        Ok(response.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContainerId, ItemKind};
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use mockall::mock;
    use std::collections::HashMap;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
            async fn execute_with_retry(&self, request: HttpRequest, policy: RetryPolicy) -> BridgeResult<HttpResponse>;
        }
    }

    fn ok(body: &str) -> BridgeResult<HttpResponse> {
        Ok(HttpResponse {
            status: 200,
            headers: HashMap::new(),
            body: Bytes::from(body.to_string()),
        })
    }

    fn status(code: u16) -> BridgeResult<HttpResponse> {
        Ok(HttpResponse {
            status: code,
            headers: HashMap::new(),
            body: Bytes::from("error body"),
        })
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            use_exponential_backoff: true,
        }
    }

    fn connector(mock_http: MockHttpClient) -> GoogleDriveConnector {
        GoogleDriveConnector::new(Arc::new(mock_http), "test_token".to_string())
            .with_base_url("https://drive.test/v3")
            .with_retry_policy(fast_retry())
    }

    #[tokio::test]
    async fn test_list_page_success() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute_with_retry()
            .times(1)
            .returning(|req, policy| {
                assert_eq!(policy.max_attempts, 1);
                assert_eq!(
                    req.headers.get("Authorization"),
                    Some(&"Bearer test_token".to_string())
                );
                assert!(req.url.starts_with("https://drive.test/v3/files?"));
                assert!(req.url.contains("driveId=0AAdrive"));
                assert!(req.url.contains("pageToken=p2"));
                ok(r#"{
                    "files": [
                        {"id": "f1", "name": "Texts", "mimeType": "application/vnd.google-apps.folder"},
                        {"id": "x1", "name": "readme.md", "mimeType": "text/markdown"}
                    ],
                    "nextPageToken": "p3"
                }"#)
            });

        let collection = CollectionId::new("0AAdrive");
        let parent = ContainerId::new("root1");
        let query = ListQuery::children(Some(&parent), Some(&collection));

        let page = connector(mock_http)
            .list_page(&query, Some("p2".to_string()))
            .await
            .unwrap();

        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].kind, ItemKind::Container);
        assert_eq!(page.items[1].kind, ItemKind::Leaf);
        assert_eq!(page.next_page_token, Some("p3".to_string()));
    }

    #[tokio::test]
    async fn test_list_page_retries_server_errors() {
        let mut mock_http = MockHttpClient::new();
        let mut seq = mockall::Sequence::new();

        mock_http
            .expect_execute_with_retry()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| status(503));
        mock_http
            .expect_execute_with_retry()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| ok(r#"{"files": []}"#));

        let page = connector(mock_http)
            .list_page(&ListQuery::children(None, None), None)
            .await
            .unwrap();

        assert!(page.items.is_empty());
        assert!(page.next_page_token.is_none());
    }

    #[tokio::test]
    async fn test_rate_limit_exhaustion() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute_with_retry()
            .times(3)
            .returning(|_, _| {
                let mut headers = HashMap::new();
                headers.insert("Retry-After".to_string(), "7".to_string());
                Ok(HttpResponse {
                    status: 429,
                    headers,
                    body: Bytes::new(),
                })
            });

        let result = connector(mock_http)
            .list_page(&ListQuery::children(None, None), None)
            .await;

        assert!(matches!(
            result,
            Err(GoogleDriveError::RateLimitExceeded {
                retry_after_seconds: 7
            })
        ));
    }

    #[tokio::test]
    async fn test_transport_error_exhaustion() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute_with_retry()
            .times(3)
            .returning(|_, _| Err(BridgeError::OperationFailed("connection reset".to_string())));

        let result = connector(mock_http)
            .list_page(&ListQuery::children(None, None), None)
            .await;

        assert!(matches!(result, Err(GoogleDriveError::NetworkError(_))));
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute_with_retry()
            .times(1)
            .returning(|_, _| status(401));

        let result = connector(mock_http)
            .list_page(&ListQuery::children(None, None), None)
            .await;

        assert!(matches!(
            result,
            Err(GoogleDriveError::AuthenticationFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute_with_retry()
            .times(1)
            .returning(|_, _| ok("<html>"));

        let result = connector(mock_http)
            .list_page(&ListQuery::children(None, None), None)
            .await;

        assert!(matches!(result, Err(GoogleDriveError::ParseError(_))));
    }

    #[tokio::test]
    async fn test_get_collection_success() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute_with_retry()
            .times(1)
            .returning(|req, _| {
                assert_eq!(req.url, "https://drive.test/v3/drives/0AAdrive?fields=id,name");
                ok(r#"{"id": "0AAdrive", "name": "Sanskrit-Data"}"#)
            });

        let drive = connector(mock_http)
            .get_collection(&CollectionId::new("0AAdrive"))
            .await
            .unwrap();

        assert_eq!(drive.name, "Sanskrit-Data");
    }

    #[tokio::test]
    async fn test_get_collection_not_found() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute_with_retry()
            .times(1)
            .returning(|_, _| status(404));

        let result = connector(mock_http)
            .get_collection(&CollectionId::new("missing"))
            .await;

        assert!(matches!(
            result,
            Err(GoogleDriveError::CollectionNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_download_success() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute_with_retry()
            .times(1)
            .returning(|req, _| {
                assert!(req.headers.contains_key("Authorization"));
                assert!(req.url.contains("alt=media"));
                assert!(req.url.contains("supportsAllDrives=true"));

                Ok(HttpResponse {
                    status: 200,
                    headers: HashMap::new(),
                    body: Bytes::from(vec![1, 2, 3, 4, 5]),
                })
            });

        let data = connector(mock_http)
            .download(&ItemId::new("file1"))
            .await
            .unwrap();

        assert_eq!(&data[..], &[1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_download_missing_file() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute_with_retry()
            .times(1)
            .returning(|_, _| status(404));

        let result = connector(mock_http).download(&ItemId::new("gone")).await;

        assert!(matches!(result, Err(GoogleDriveError::FileNotFound { .. })));
    }
}
