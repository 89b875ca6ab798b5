//! Gremlin Server backend over WebSocket.
//!
//! Speaks the Gremlin Server driver protocol with GraphSON 2.0, which is what
//! Azure Cosmos DB's Gremlin API accepts.
//!
//! # Example
//!
//! ```ignore
//! use graphgate::graph::backends::gremlin::{GremlinConnector, GremlinServer};
//! use graphgate::graph::QueryGateway;
//!
//! let server = GremlinServer::from_config(&config.graph()?);
//! let gateway = QueryGateway::new(GremlinConnector::new(server));
//! let count = gateway.submit("g.V().count()").await?;
//! ```

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::error::{Error as WsError, ProtocolError};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use uuid::Uuid;

use crate::config::GraphConfig;
use crate::error::AppError;
use crate::graph::graphson;
use crate::graph::traits::{GraphConnection, GraphConnector};

/// Mime type announced in front of every request frame.
pub const GRAPHSON_V2_MIME: &str = "application/vnd.gremlin-v2.0+json";

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ----------------------------------------------------------------------------
// Server settings
// ----------------------------------------------------------------------------

/// Connection settings for a Gremlin server.
///
/// These are fixed when the connector is built; queries cannot change them.
#[derive(Clone)]
pub struct GremlinServer {
    host: String,
    port: u16,
    enable_ssl: bool,
    username: String,
    password: String,
}

impl GremlinServer {
    /// Creates server settings. `host` may carry a scheme, port or trailing
    /// path; only the host name is kept.
    pub fn new(
        host: &str,
        port: u16,
        enable_ssl: bool,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: normalize_host(host),
            port,
            enable_ssl,
            username: username.into(),
            password: password.into(),
        }
    }

    /// Cosmos DB settings: TLS on, username `/dbs/<db>/colls/<container>`,
    /// primary key as password.
    pub fn from_config(config: &GraphConfig) -> Self {
        Self::new(
            &config.endpoint,
            config.port,
            true,
            config.username(),
            config.primary_key.clone(),
        )
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// WebSocket URL of the Gremlin endpoint.
    pub fn url(&self) -> String {
        let scheme = if self.enable_ssl { "wss" } else { "ws" };
        format!("{}://{}:{}/gremlin", scheme, self.host, self.port)
    }

    /// SASL PLAIN token: `base64("\0" + username + "\0" + password)`.
    fn sasl_token(&self) -> String {
        let mut raw = Vec::with_capacity(self.username.len() + self.password.len() + 2);
        raw.push(0);
        raw.extend_from_slice(self.username.as_bytes());
        raw.push(0);
        raw.extend_from_slice(self.password.as_bytes());
        STANDARD.encode(raw)
    }
}

impl fmt::Debug for GremlinServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GremlinServer")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("enable_ssl", &self.enable_ssl)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Host part of `endpoint`. IPv6 hosts keep their brackets.
fn normalize_host(endpoint: &str) -> String {
    let endpoint = endpoint.trim();
    let with_scheme = if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("wss://{}", endpoint)
    };

    url::Url::parse(&with_scheme)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .unwrap_or_else(|| endpoint.to_string())
}

// ----------------------------------------------------------------------------
// Wire format
// ----------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GremlinRequest<'a> {
    request_id: &'a str,
    op: &'static str,
    processor: &'static str,
    args: JsonValue,
}

impl<'a> GremlinRequest<'a> {
    fn eval(request_id: &'a str, query: &str) -> Self {
        Self {
            request_id,
            op: "eval",
            processor: "",
            args: json!({
                "gremlin": query,
                "bindings": {},
                "language": "gremlin-groovy",
            }),
        }
    }

    fn authentication(request_id: &'a str, sasl: &str) -> Self {
        Self {
            request_id,
            op: "authentication",
            processor: "",
            args: json!({
                "sasl": sasl,
                "saslMechanism": "PLAIN",
            }),
        }
    }

    /// Binary frame: mime length byte, mime type, JSON body.
    fn to_frame(&self) -> Result<Vec<u8>, AppError> {
        let body = serde_json::to_vec(self)?;
        let mut frame = Vec::with_capacity(1 + GRAPHSON_V2_MIME.len() + body.len());
        frame.push(GRAPHSON_V2_MIME.len() as u8);
        frame.extend_from_slice(GRAPHSON_V2_MIME.as_bytes());
        frame.extend_from_slice(&body);
        Ok(frame)
    }
}

#[derive(Debug, Deserialize)]
struct GremlinResponse {
    status: ResponseStatus,
    #[serde(default)]
    result: ResponseResult,
}

#[derive(Debug, Deserialize)]
struct ResponseStatus {
    code: u16,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponseResult {
    #[serde(default)]
    data: JsonValue,
}

mod status {
    pub const SUCCESS: u16 = 200;
    pub const NO_CONTENT: u16 = 204;
    pub const PARTIAL_CONTENT: u16 = 206;
    pub const UNAUTHORIZED: u16 = 401;
    pub const AUTHENTICATE: u16 = 407;
    pub const MALFORMED_REQUEST: u16 = 498;
    pub const INVALID_REQUEST_ARGUMENTS: u16 = 499;
    pub const SCRIPT_EVALUATION_ERROR: u16 = 597;
}

/// Maps a non-success response status to an error.
fn status_error(code: u16, message: Option<String>) -> AppError {
    let message = message.unwrap_or_default();
    match code {
        status::UNAUTHORIZED | status::AUTHENTICATE => AppError::Authentication(message),
        status::MALFORMED_REQUEST
        | status::INVALID_REQUEST_ARGUMENTS
        | status::SCRIPT_EVALUATION_ERROR => AppError::MalformedQuery { code, message },
        _ => AppError::GraphServer { code, message },
    }
}

/// True for socket errors that mean the peer went away.
fn ends_stream(error: &WsError) -> bool {
    match error {
        WsError::ConnectionClosed
        | WsError::AlreadyClosed
        | WsError::Protocol(ProtocolError::ResetWithoutClosingHandshake) => true,
        WsError::Io(e) => e.kind() == std::io::ErrorKind::ConnectionReset,
        _ => false,
    }
}

/// Appends the decoded data of one response frame.
fn collect_data(data: &mut Vec<JsonValue>, frame_data: JsonValue) {
    match graphson::untype(frame_data) {
        JsonValue::Array(items) => data.extend(items),
        JsonValue::Null => {}
        other => data.push(other),
    }
}

// ----------------------------------------------------------------------------
// Connector and connection
// ----------------------------------------------------------------------------

/// Opens one WebSocket per query against a fixed Gremlin server.
///
/// This type is cheap to clone - the server settings are `Arc`-based.
#[derive(Debug, Clone)]
pub struct GremlinConnector {
    server: Arc<GremlinServer>,
}

impl GremlinConnector {
    pub fn new(server: GremlinServer) -> Self {
        Self {
            server: Arc::new(server),
        }
    }

    pub fn server(&self) -> &GremlinServer {
        &self.server
    }
}

#[async_trait]
impl GraphConnector for GremlinConnector {
    type Connection = GremlinConnection;

    async fn connect(&self) -> Result<GremlinConnection, AppError> {
        let url = self.server.url();
        tracing::debug!(url = %url, "Opening Gremlin connection");

        let (socket, _response) = connect_async(url.as_str()).await?;

        Ok(GremlinConnection {
            socket,
            server: self.server.clone(),
        })
    }
}

/// A single Gremlin WebSocket connection.
///
/// Dropping the connection drops the socket, which closes the TCP stream.
pub struct GremlinConnection {
    socket: Socket,
    server: Arc<GremlinServer>,
}

impl GremlinConnection {
    async fn send(&mut self, request: &GremlinRequest<'_>) -> Result<(), AppError> {
        let frame = request.to_frame()?;
        self.socket.send(Message::Binary(frame)).await?;
        Ok(())
    }

    /// Reads frames until the next response message.
    ///
    /// Control frames are handled by tungstenite and skipped here.
    async fn next_response(&mut self) -> Result<GremlinResponse, AppError> {
        loop {
            let message = match self.socket.next().await {
                Some(Ok(message)) => message,
                Some(Err(e)) if !ends_stream(&e) => return Err(e.into()),
                Some(Err(_)) | None => {
                    return Err(AppError::Connection(
                        "connection closed before the response completed".to_string(),
                    ))
                }
            };

            let payload = match message {
                Message::Text(text) => text.into_bytes(),
                Message::Binary(bytes) => bytes,
                Message::Close(frame) => {
                    let reason = frame.map(|f| f.reason.to_string()).unwrap_or_default();
                    return Err(AppError::Connection(format!(
                        "server closed the connection: {}",
                        reason
                    )));
                }
                _ => continue,
            };

            return Ok(serde_json::from_slice(&payload)?);
        }
    }
}

#[async_trait]
impl GraphConnection for GremlinConnection {
    async fn submit(&mut self, query: &str) -> Result<JsonValue, AppError> {
        let request_id = Uuid::new_v4().to_string();
        self.send(&GremlinRequest::eval(&request_id, query)).await?;

        let mut data = Vec::new();
        let mut challenged = false;

        loop {
            let response = self.next_response().await?;
            match response.status.code {
                status::SUCCESS => {
                    collect_data(&mut data, response.result.data);
                    break;
                }
                status::PARTIAL_CONTENT => collect_data(&mut data, response.result.data),
                status::NO_CONTENT => break,
                status::AUTHENTICATE if !challenged => {
                    challenged = true;
                    let token = self.server.sasl_token();
                    self.send(&GremlinRequest::authentication(&request_id, &token))
                        .await?;
                }
                code => return Err(status_error(code, response.status.message)),
            }
        }

        Ok(JsonValue::Array(data))
    }

    async fn close(mut self) {
        if let Err(e) = self.socket.close(None).await {
            tracing::warn!(error = %e, "Failed to close Gremlin connection");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> GremlinServer {
        GremlinServer::new(
            "https://acct.gremlin.cosmos.azure.com:443/",
            443,
            true,
            "/dbs/db/colls/c",
            "key",
        )
    }

    #[test]
    fn test_normalize_host() {
        let host = "acct.gremlin.cosmos.azure.com";
        assert_eq!(normalize_host(host), host);
        assert_eq!(normalize_host("wss://acct.gremlin.cosmos.azure.com:443/"), host);
        assert_eq!(normalize_host(" localhost:8182 "), "localhost");
        assert_eq!(normalize_host("[::1]:8182"), "[::1]");
        assert_eq!(normalize_host("ws://[::1]:8182/gremlin"), "[::1]");
    }

    #[test]
    fn test_url() {
        assert_eq!(server().url(), "wss://acct.gremlin.cosmos.azure.com:443/gremlin");

        let plain = GremlinServer::new("localhost", 8182, false, "", "");
        assert_eq!(plain.url(), "ws://localhost:8182/gremlin");

        let ipv6 = GremlinServer::new("[::1]", 8182, false, "", "");
        assert_eq!(ipv6.url(), "ws://[::1]:8182/gremlin");
    }

    #[test]
    fn test_debug_hides_password() {
        let server = GremlinServer::new("localhost", 8182, false, "/dbs/db/colls/c", "s3cret");
        let debug = format!("{:?}", server);
        assert!(debug.contains("/dbs/db/colls/c"));
        assert!(!debug.contains("s3cret"));
    }

    #[test]
    fn test_sasl_token() {
        let token = server().sasl_token();
        let raw = STANDARD.decode(token).unwrap();
        assert_eq!(raw, b"\0/dbs/db/colls/c\0key");
    }

    #[test]
    fn test_eval_frame_layout() {
        let frame = GremlinRequest::eval("abc", "g.V().count()").to_frame().unwrap();

        let mime_len = frame[0] as usize;
        assert_eq!(mime_len, GRAPHSON_V2_MIME.len());
        assert_eq!(&frame[1..1 + mime_len], GRAPHSON_V2_MIME.as_bytes());

        let body: JsonValue = serde_json::from_slice(&frame[1 + mime_len..]).unwrap();
        assert_eq!(body["requestId"], "abc");
        assert_eq!(body["op"], "eval");
        assert_eq!(body["args"]["gremlin"], "g.V().count()");
        assert_eq!(body["args"]["language"], "gremlin-groovy");
    }

    #[test]
    fn test_authentication_request() {
        let body = serde_json::to_value(GremlinRequest::authentication("abc", "dG9rZW4=")).unwrap();
        assert_eq!(body["op"], "authentication");
        assert_eq!(body["args"]["sasl"], "dG9rZW4=");
    }

    #[test]
    fn test_status_error_mapping() {
        assert!(matches!(
            status_error(597, Some("bad".into())),
            AppError::MalformedQuery { code: 597, .. }
        ));
        assert!(matches!(status_error(401, None), AppError::Authentication(_)));
        assert!(matches!(status_error(407, None), AppError::Authentication(_)));
        assert!(matches!(
            status_error(500, None),
            AppError::GraphServer { code: 500, .. }
        ));
    }

    #[test]
    fn test_parse_response_and_collect() {
        let raw = r#"{
            "requestId": "abc",
            "status": {"code": 206, "message": null, "attributes": {}},
            "result": {"data": {"@type": "g:List", "@value": [{"@type": "g:Int64", "@value": 5}]}, "meta": {}}
        }"#;
        let response: GremlinResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.status.code, 206);

        let mut data = Vec::new();
        collect_data(&mut data, response.result.data);
        collect_data(&mut data, json!(["six"]));
        collect_data(&mut data, JsonValue::Null);
        assert_eq!(data, vec![json!(5), json!("six")]);
    }

    #[test]
    fn test_parse_response_without_result() {
        let raw = r#"{"requestId": "abc", "status": {"code": 407}}"#;
        let response: GremlinResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.status.code, status::AUTHENTICATE);
        assert!(response.result.data.is_null());
    }
}
