//! Azure Cosmos DB (SQL API) backend over the REST interface.
//!
//! Requests are signed with the account's master key. The REST interface is
//! served in gateway mode only.
//!
//! # Example
//!
//! ```ignore
//! use graphgate::document::backends::cosmos::CosmosClient;
//!
//! let client = CosmosClient::new("https://acct.documents.azure.com:443/", &key, None)?;
//! let db = client.create_database_if_not_exists("appdb").await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use sha2::Sha256;

use crate::document::traits::{DocumentClient, Provisioned};
use crate::error::AppError;

/// REST API version sent with every request.
pub const API_VERSION: &str = "2018-12-31";

type HmacSha256 = Hmac<Sha256>;

mod headers {
    pub const DATE: &str = "x-ms-date";
    pub const VERSION: &str = "x-ms-version";
    pub const PARTITION_KEY: &str = "x-ms-documentdb-partitionkey";
    pub const IS_UPSERT: &str = "x-ms-documentdb-is-upsert";
    pub const IS_QUERY: &str = "x-ms-documentdb-isquery";
    pub const CROSS_PARTITION: &str = "x-ms-documentdb-query-enablecrosspartition";
    pub const CONTINUATION: &str = "x-ms-continuation";
}

/// Cosmos DB REST client.
///
/// This type is cheap to clone and safe to share: `reqwest::Client` pools
/// connections internally and the key is immutable.
#[derive(Clone)]
pub struct CosmosClient {
    http: reqwest::Client,
    endpoint: Arc<str>,
    key: Arc<[u8]>,
}

impl CosmosClient {
    /// Creates a client for `account` signed with `primary_key`.
    ///
    /// No network traffic happens here.
    pub fn new(
        account: &str,
        primary_key: &str,
        request_timeout: Option<Duration>,
    ) -> Result<Self, AppError> {
        let endpoint = normalize_endpoint(account)?;
        let key = STANDARD.decode(primary_key.trim()).map_err(|e| {
            AppError::InvalidConfig(format!("primary key is not valid base64: {}", e))
        })?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            endpoint: Arc::from(endpoint),
            key: Arc::from(key),
        })
    }

    /// Returns the normalized account endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Master-key authorization header value for one request.
    fn authorization(
        &self,
        verb: &Method,
        resource_type: &str,
        resource_link: &str,
        date: &str,
    ) -> Result<String, AppError> {
        let payload = signature_payload(verb.as_str(), resource_type, resource_link, date);
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| AppError::Internal(format!("failed to initialize HMAC: {}", e)))?;
        mac.update(payload.as_bytes());
        let signature = STANDARD.encode(mac.finalize().into_bytes());

        let token = format!("type=master&ver=1.0&sig={}", signature);
        Ok(url::form_urlencoded::byte_serialize(token.as_bytes()).collect())
    }

    /// URL of a resource path with every segment percent-encoded.
    ///
    /// Signing uses the raw path; only the request line is encoded.
    fn resource_url(&self, path: &str) -> Result<url::Url, AppError> {
        let mut url = url::Url::parse(&self.endpoint)
            .map_err(|e| AppError::InvalidConfig(format!("invalid account endpoint: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| {
                AppError::InvalidConfig(format!(
                    "account endpoint '{}' cannot carry a path",
                    self.endpoint
                ))
            })?
            .pop_if_empty()
            .extend(path.split('/'));
        Ok(url)
    }

    /// Starts a signed request.
    fn request(
        &self,
        method: Method,
        path: &str,
        resource_type: &str,
        resource_link: &str,
    ) -> Result<RequestBuilder, AppError> {
        let url = self.resource_url(path)?;
        let date = rfc1123(Utc::now());
        let authorization = self.authorization(&method, resource_type, resource_link, &date)?;

        Ok(self
            .http
            .request(method, url)
            .header(headers::DATE, date)
            .header(headers::VERSION, API_VERSION)
            .header(AUTHORIZATION, authorization))
    }

    /// POSTs a resource definition; `409 Conflict` means it already exists.
    async fn create_if_absent(
        &self,
        path: &str,
        resource_type: &str,
        resource_link: &str,
        id: &str,
        body: JsonValue,
    ) -> Result<Provisioned, AppError> {
        let response = self
            .request(Method::POST, path, resource_type, resource_link)?
            .json(&body)
            .send()
            .await?;

        if response.status() == StatusCode::CONFLICT {
            return Ok(Provisioned::existing(id));
        }
        error_for_status(response).await?;
        Ok(Provisioned::created(id))
    }

    async fn write_item(
        &self,
        database: &str,
        container: &str,
        partition_key: &JsonValue,
        item: JsonValue,
        upsert: bool,
    ) -> Result<JsonValue, AppError> {
        let link = collection_link(database, container);
        let mut request = self
            .request(Method::POST, &format!("{}/docs", link), "docs", &link)?
            .header(headers::PARTITION_KEY, partition_key_header(partition_key))
            .json(&item);
        if upsert {
            request = request.header(headers::IS_UPSERT, "True");
        }

        let response = error_for_status(request.send().await?).await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl DocumentClient for CosmosClient {
    async fn create_database_if_not_exists(&self, id: &str) -> Result<Provisioned, AppError> {
        self.create_if_absent("dbs", "dbs", "", id, json!({ "id": id }))
            .await
    }

    async fn create_container_if_not_exists(
        &self,
        database: &str,
        id: &str,
        partition_key_path: &str,
    ) -> Result<Provisioned, AppError> {
        let link = format!("dbs/{}", database);
        let body = json!({
            "id": id,
            "partitionKey": {
                "paths": [partition_key_path],
                "kind": "Hash",
            },
        });
        self.create_if_absent(&format!("{}/colls", link), "colls", &link, id, body)
            .await
    }

    async fn create_item(
        &self,
        database: &str,
        container: &str,
        partition_key: &JsonValue,
        item: JsonValue,
    ) -> Result<JsonValue, AppError> {
        self.write_item(database, container, partition_key, item, false)
            .await
    }

    async fn upsert_item(
        &self,
        database: &str,
        container: &str,
        partition_key: &JsonValue,
        item: JsonValue,
    ) -> Result<JsonValue, AppError> {
        self.write_item(database, container, partition_key, item, true)
            .await
    }

    async fn read_item(
        &self,
        database: &str,
        container: &str,
        id: &str,
        partition_key: &JsonValue,
    ) -> Result<Option<JsonValue>, AppError> {
        let link = document_link(database, container, id);
        let response = self
            .request(Method::GET, &link, "docs", &link)?
            .header(headers::PARTITION_KEY, partition_key_header(partition_key))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = error_for_status(response).await?;
        Ok(Some(response.json().await?))
    }

    async fn delete_item(
        &self,
        database: &str,
        container: &str,
        id: &str,
        partition_key: &JsonValue,
    ) -> Result<(), AppError> {
        let link = document_link(database, container, id);
        let response = self
            .request(Method::DELETE, &link, "docs", &link)?
            .header(headers::PARTITION_KEY, partition_key_header(partition_key))
            .send()
            .await?;

        error_for_status(response).await?;
        Ok(())
    }

    async fn query_items(
        &self,
        database: &str,
        container: &str,
        query: &str,
    ) -> Result<Vec<JsonValue>, AppError> {
        let link = collection_link(database, container);
        let path = format!("{}/docs", link);
        let body = serde_json::to_vec(&json!({ "query": query, "parameters": [] }))?;

        let mut documents = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let mut request = self
                .request(Method::POST, &path, "docs", &link)?
                .header(CONTENT_TYPE, "application/query+json")
                .header(headers::IS_QUERY, "True")
                .header(headers::CROSS_PARTITION, "True")
                .body(body.clone());
            if let Some(token) = &continuation {
                request = request.header(headers::CONTINUATION, token.as_str());
            }

            let response = error_for_status(request.send().await?).await?;
            continuation = response
                .headers()
                .get(headers::CONTINUATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);

            let page: QueryPage = response.json().await?;
            tracing::debug!(count = page.documents.len(), "Fetched query page");
            documents.extend(page.documents);

            if continuation.is_none() {
                break;
            }
        }

        Ok(documents)
    }
}

// ----------------------------------------------------------------------------
// Helpers
// ----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct QueryPage {
    #[serde(rename = "Documents", default)]
    documents: Vec<JsonValue>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Turns a non-success response into [`AppError::DocumentStore`].
async fn error_for_status(response: Response) -> Result<Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(AppError::DocumentStore {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| body.to_string())
}

fn normalize_endpoint(account: &str) -> Result<String, AppError> {
    let account = account.trim();
    let with_scheme = if account.contains("://") {
        account.to_string()
    } else {
        format!("https://{}", account)
    };

    let url = url::Url::parse(&with_scheme)
        .map_err(|e| AppError::InvalidConfig(format!("invalid account endpoint '{}': {}", account, e)))?;
    Ok(url.as_str().trim_end_matches('/').to_string())
}

/// String signed for the master-key authorization token.
fn signature_payload(verb: &str, resource_type: &str, resource_link: &str, date: &str) -> String {
    format!(
        "{}\n{}\n{}\n{}\n\n",
        verb.to_lowercase(),
        resource_type.to_lowercase(),
        resource_link,
        date.to_lowercase()
    )
}

/// RFC 1123 date as required by `x-ms-date`.
fn rfc1123(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn partition_key_header(partition_key: &JsonValue) -> String {
    json!([partition_key]).to_string()
}

fn collection_link(database: &str, container: &str) -> String {
    format!("dbs/{}/colls/{}", database, container)
}

fn document_link(database: &str, container: &str, id: &str) -> String {
    format!("dbs/{}/colls/{}/docs/{}", database, container, id)
}
