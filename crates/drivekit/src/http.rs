//! HTTP backend for the drive service.

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::{
    DriveError, Result,
    api::{CommentPage, DriveApi, DrivePage, FilePage, FileRecord, ListRequest, UserRecord},
    config::{DEFAULT_ENDPOINT, DriveConfig, RetryConfig},
};

/// Metadata requested for every file resource.
const FILE_FIELDS: &str = "id,name,createdTime,modifiedTime,mimeType,capabilities,\
owners(displayName,emailAddress),appProperties,properties,exportLinks";

const COMMENT_FIELDS: &str = "nextPageToken,comments(id,content,\
author(displayName,emailAddress),createdTime,modifiedTime,quotedFileContent,\
replies(id,content,author(displayName,emailAddress),createdTime,modifiedTime),\
resolved,anchor)";

/// [`DriveApi`] over the service's REST interface.
///
/// Every request carries the bearer token and asks for shared-drive support.
/// Transient failures are retried with exponential backoff.
#[derive(Clone)]
pub struct HttpDriveApi {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
    retry: RetryConfig,
}

impl std::fmt::Debug for HttpDriveApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpDriveApi")
            .field("base_url", &self.base_url)
            .field("access_token", &"<redacted>")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct AboutResponse {
    user: Option<UserRecord>,
}

#[derive(Deserialize)]
struct ReplyResponse {
    id: String,
}

#[derive(Deserialize)]
struct LabelsResponse {
    #[serde(default)]
    labels: Vec<JsonValue>,
}

impl HttpDriveApi {
    /// Creates a backend for the public endpoint with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`DriveError::MalformedInput`] if the token is blank.
    pub fn new(access_token: impl Into<String>) -> Result<Self> {
        let config = DriveConfig {
            access_token: Some(access_token.into()),
            ..DriveConfig::default()
        };
        Self::from_config(&config)
    }

    /// Creates a backend from a loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DriveError::MalformedInput`] if the token is missing or the
    /// endpoint is empty.
    pub fn from_config(config: &DriveConfig) -> Result<Self> {
        let access_token = config
            .access_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| DriveError::MalformedInput("access_token must not be empty".into()))?
            .to_string();
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| DriveError::MalformedInput(format!("invalid HTTP client settings: {e}")))?;

        Ok(Self {
            http,
            base_url: normalize_base_url(&config.endpoint)?,
            access_token,
            retry: config.retry,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.retry.min_delay())
            .with_max_delay(self.retry.max_delay())
            .with_max_times(self.retry.max_times)
            .with_jitter()
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        subject: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = self.url(path);
        let response = self
            .send(subject, || self.http.get(&url).query(query))
            .await?;
        Ok(response.json::<T>().await?)
    }

    async fn get_bytes(
        &self,
        subject: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<u8>> {
        let url = self.url(path);
        let response = self
            .send(subject, || self.http.get(&url).query(query))
            .await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Sends a request built by `build`, retrying transient failures.
    ///
    /// `build` runs once per attempt. `subject` names the addressed resource
    /// in `NotFound` errors. Only idempotent requests go through here.
    async fn send<F>(&self, subject: &str, build: F) -> Result<reqwest::Response>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let build = &build;
        let attempt = || self.send_once(subject, build);

        attempt
            .retry(self.backoff())
            .when(DriveError::is_transient)
            .notify(|error, delay| {
                warn!(subject = %subject, error = %error, delay = ?delay, "Retrying drive request");
            })
            .await
    }

    /// Sends a request built by `build` exactly once.
    async fn send_once<F>(&self, subject: &str, build: &F) -> Result<reqwest::Response>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let response = build()
            .bearer_auth(&self.access_token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(DriveError::from_status(status.as_u16(), subject, body))
        }
    }
}

#[async_trait]
impl DriveApi for HttpDriveApi {
    async fn list_files(&self, request: &ListRequest) -> Result<FilePage> {
        let mut query = vec![
            ("q", request.query.clone()),
            ("pageSize", request.page_size.to_string()),
            ("fields", format!("nextPageToken,files({FILE_FIELDS})")),
            ("supportsAllDrives", "true".to_string()),
        ];
        if request.all_drives {
            query.push(("includeItemsFromAllDrives", "true".to_string()));
        }
        if let Some(token) = &request.page_token {
            query.push(("pageToken", token.clone()));
        }
        debug!(query = %request.query, page_size = request.page_size, "Listing files");
        self.get_json(&request.query, "files", &query).await
    }

    async fn get_file(&self, file_id: &str) -> Result<FileRecord> {
        let query = [
            ("fields", FILE_FIELDS.to_string()),
            ("supportsAllDrives", "true".to_string()),
        ];
        self.get_json(file_id, &format!("files/{file_id}"), &query)
            .await
    }

    async fn about(&self) -> Result<UserRecord> {
        let response: AboutResponse = self
            .get_json("about", "about", &[("fields", "user".to_string())])
            .await?;
        response
            .user
            .ok_or_else(|| DriveError::Decode("user information not found".into()))
    }

    async fn list_drives(&self, page_token: Option<&str>) -> Result<DrivePage> {
        let mut query = vec![("pageSize", "100".to_string())];
        if let Some(token) = page_token {
            query.push(("pageToken", token.to_string()));
        }
        self.get_json("drives", "drives", &query).await
    }

    async fn update_file(&self, file_id: &str, body: &JsonValue) -> Result<FileRecord> {
        let url = self.url(&format!("files/{file_id}"));
        let query = [
            ("fields", FILE_FIELDS.to_string()),
            ("supportsAllDrives", "true".to_string()),
        ];
        let response = self
            .send(file_id, || self.http.patch(&url).query(&query).json(body))
            .await?;
        Ok(response.json::<FileRecord>().await?)
    }

    async fn download(&self, file_id: &str) -> Result<Vec<u8>> {
        let query = [
            ("alt", "media".to_string()),
            ("supportsAllDrives", "true".to_string()),
        ];
        self.get_bytes(file_id, &format!("files/{file_id}"), &query)
            .await
    }

    async fn export(&self, file_id: &str, mime_type: &str) -> Result<Vec<u8>> {
        let query = [("mimeType", mime_type.to_string())];
        self.get_bytes(file_id, &format!("files/{file_id}/export"), &query)
            .await
    }

    async fn list_comments(&self, file_id: &str, page_token: Option<&str>) -> Result<CommentPage> {
        let mut query = vec![
            ("fields", COMMENT_FIELDS.to_string()),
            ("includeDeleted", "false".to_string()),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token.to_string()));
        }
        self.get_json(file_id, &format!("files/{file_id}/comments"), &query)
            .await
    }

    async fn create_reply(&self, file_id: &str, comment_id: &str, content: &str) -> Result<String> {
        let url = self.url(&format!("files/{file_id}/comments/{comment_id}/replies"));
        let body = serde_json::json!({ "content": content });
        let query = [("fields", "id".to_string())];
        // Replies are not idempotent, so a failed POST is never repeated.
        let build = || self.http.post(&url).query(&query).json(&body);
        let response = self.send_once(comment_id, &build).await?;
        Ok(response.json::<ReplyResponse>().await?.id)
    }

    async fn list_labels(&self, file_id: &str) -> Result<Vec<JsonValue>> {
        let response: LabelsResponse = self
            .get_json(file_id, &format!("files/{file_id}/listLabels"), &[])
            .await?;
        Ok(response.labels)
    }
}

fn normalize_base_url(endpoint: &str) -> Result<String> {
    let trimmed = endpoint.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(DriveError::MalformedInput(format!(
            "endpoint must not be empty (default is {DEFAULT_ENDPOINT})"
        )));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json, header, method, path, query_param},
    };

    use super::*;

    fn test_api(endpoint: &str) -> HttpDriveApi {
        HttpDriveApi::from_config(&DriveConfig {
            access_token: Some("test-token".to_string()),
            endpoint: endpoint.to_string(),
            retry: RetryConfig {
                max_times: 2,
                min_delay_ms: 1,
                max_delay_ms: 5,
            },
            ..DriveConfig::default()
        })
        .unwrap()
    }

    fn list_request(query: &str) -> ListRequest {
        ListRequest {
            query: query.to_string(),
            page_size: 10,
            page_token: None,
            all_drives: true,
        }
    }

    #[test]
    fn test_normalize_base_url_trims_trailing_slash() {
        assert_eq!(
            normalize_base_url("https://example.com/drive/v3/").unwrap(),
            "https://example.com/drive/v3"
        );
    }

    #[test]
    fn test_normalize_base_url_empty_returns_error() {
        assert!(normalize_base_url("  ").is_err());
    }

    #[test]
    fn test_debug_output_redacts_token() {
        let api = test_api("https://example.com");
        let rendered = format!("{api:?}");
        assert!(!rendered.contains("test-token"));
        assert!(rendered.contains("https://example.com"));
    }

    #[test]
    fn test_from_config_requires_access_token() {
        let result = HttpDriveApi::from_config(&DriveConfig::default());
        assert!(matches!(result, Err(DriveError::MalformedInput(_))));
    }

    #[tokio::test]
    async fn test_list_files_sends_query_and_all_drives_flags() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files"))
            .and(header("authorization", "Bearer test-token"))
            .and(query_param("q", "name contains 'test' and trashed=false"))
            .and(query_param("pageSize", "10"))
            .and(query_param("supportsAllDrives", "true"))
            .and(query_param("includeItemsFromAllDrives", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"files":[{"id":"file-1","name":"Test.pdf","mimeType":"application/pdf"}],
                    "nextPageToken":"tok-2"}"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let api = test_api(&server.uri());
        let page = api
            .list_files(&list_request("name contains 'test' and trashed=false"))
            .await
            .unwrap();

        assert_eq!(page.files.len(), 1);
        assert_eq!(page.files[0].id, "file-1");
        assert_eq!(page.next_page_token.as_deref(), Some("tok-2"));
    }

    #[tokio::test]
    async fn test_list_files_forwards_page_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files"))
            .and(query_param("pageToken", "tok-2"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(r#"{"files":[]}"#, "application/json"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let api = test_api(&server.uri());
        let mut request = list_request("x");
        request.page_token = Some("tok-2".to_string());
        let page = api.list_files(&request).await.unwrap();

        assert!(page.files.is_empty());
        assert!(page.next_page_token.is_none());
    }

    #[tokio::test]
    async fn test_get_file_missing_maps_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("File not found"))
            .mount(&server)
            .await;

        let api = test_api(&server.uri());
        let result = api.get_file("missing").await;

        assert!(matches!(result, Err(DriveError::NotFound(id)) if id == "missing"));
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/files/flaky"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(r#"{"id":"flaky"}"#, "application/json"),
            )
            .mount(&server)
            .await;

        let api = test_api(&server.uri());
        let record = api.get_file("flaky").await.unwrap();

        assert_eq!(record.id, "flaky");
    }

    #[tokio::test]
    async fn test_retries_give_up_after_max_times() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/down"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let api = test_api(&server.uri());
        let result = api.get_file("down").await;

        assert!(matches!(result, Err(DriveError::Transient(_))));
    }

    #[tokio::test]
    async fn test_permission_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .expect(1)
            .mount(&server)
            .await;

        let api = test_api(&server.uri());
        let result = api.list_files(&list_request("x")).await;

        assert!(matches!(result, Err(DriveError::Api { status: 403, .. })));
    }

    #[tokio::test]
    async fn test_about_without_user_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/about"))
            .and(query_param("fields", "user"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
            .mount(&server)
            .await;

        let api = test_api(&server.uri());

        assert!(matches!(api.about().await, Err(DriveError::Decode(_))));
    }

    #[tokio::test]
    async fn test_update_file_patches_body() {
        let server = MockServer::start().await;
        let body = serde_json::json!({ "appProperties": { "stage": "done", "old": null } });
        Mock::given(method("PATCH"))
            .and(path("/files/file-1"))
            .and(body_json(&body))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"id":"file-1","appProperties":{"stage":"done"}}"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let api = test_api(&server.uri());
        let record = api.update_file("file-1", &body).await.unwrap();

        assert_eq!(record.app_properties.unwrap()["stage"], "done");
    }

    #[tokio::test]
    async fn test_download_returns_raw_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/bin-1"))
            .and(query_param("alt", "media"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0_u8, 159, 146, 150]))
            .mount(&server)
            .await;

        let api = test_api(&server.uri());

        assert_eq!(api.download("bin-1").await.unwrap(), [0_u8, 159, 146, 150]);
    }

    #[tokio::test]
    async fn test_export_passes_mime_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/doc-1/export"))
            .and(query_param("mimeType", "text/plain"))
            .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
            .mount(&server)
            .await;

        let api = test_api(&server.uri());

        assert_eq!(api.export("doc-1", "text/plain").await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_create_reply_returns_reply_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/files/doc-1/comments/c-1/replies"))
            .and(body_json(serde_json::json!({ "content": "Thanks!" })))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(r#"{"id":"r-9"}"#, "application/json"),
            )
            .mount(&server)
            .await;

        let api = test_api(&server.uri());

        assert_eq!(
            api.create_reply("doc-1", "c-1", "Thanks!").await.unwrap(),
            "r-9"
        );
    }

    #[tokio::test]
    async fn test_create_reply_is_not_retried_on_transient_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/files/doc-1/comments/c-1/replies"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let api = test_api(&server.uri());
        let result = api.create_reply("doc-1", "c-1", "hi").await;

        assert!(matches!(result, Err(DriveError::Transient(_))));
    }

    #[tokio::test]
    async fn test_list_files_not_found_names_the_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let api = test_api(&server.uri());
        let query = "'gone' in parents and trashed=false";
        let result = api.list_files(&list_request(query)).await;

        assert!(matches!(result, Err(DriveError::NotFound(subject)) if subject == query));
    }

    #[tokio::test]
    async fn test_list_labels_defaults_to_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/doc-1/listLabels"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
            .mount(&server)
            .await;

        let api = test_api(&server.uri());

        assert!(api.list_labels("doc-1").await.unwrap().is_empty());
    }
}
