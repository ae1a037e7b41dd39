// crates/esctl-cli/src/services/cluster.rs - Cluster Transport Service
//
// The one place esctl talks HTTP. Commands describe a call (verb, route,
// query, body) and get JSON or text back; this service knows how to reach
// the cluster: which servers, which credentials, how long to wait and how
// often to retry.
//
// FAILOVER AND RETRIES:
// - servers are tried in configuration order
// - a connection error or timeout moves on to the next server
// - 502/503/504 responses are treated like connection errors
// - the whole server list is walked 1 + max_retries times
//
// Any other non-2xx status is returned immediately as TransportError::Status.

use esctl_core::config::ResolvedContext;
use reqwest::{Client, Method, Response};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Statuses meaning "this node cannot answer right now"
const RETRYABLE_STATUSES: [u16; 3] = [502, 503, 504];

/// Errors raised while talking to the cluster
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Cluster answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Cannot connect to {url}: {source}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("Cannot decode response from {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("Cannot build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("No server configured for this cluster")]
    NoServers,
}

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Query string parameters, in order
pub type Query<'a> = [(&'a str, &'a str)];

/// Basic auth credentials
#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// HTTP access to one cluster
pub struct ClusterService {
    client: Client,
    servers: Vec<String>,
    max_retries: u32,
    credentials: Option<Credentials>,
}

impl ClusterService {
    /// Build the client from a resolved context
    ///
    /// `timeout` and `no_check_certificate` are baked into the client;
    /// `max_retries` is applied per request.
    pub fn new(context: &ResolvedContext, credentials: Option<Credentials>) -> TransportResult<Self> {
        if context.servers().is_empty() {
            return Err(TransportError::NoServers);
        }

        let settings = &context.settings;
        let mut builder = Client::builder();

        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(Duration::from_secs(timeout));
        }

        if settings.no_check_certificate.unwrap_or(false) {
            warn!("TLS certificate verification is disabled for cluster {}", context.cluster_name);
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder.build().map_err(TransportError::Client)?;

        Ok(Self {
            client,
            servers: context.servers().to_vec(),
            max_retries: settings.max_retries.unwrap_or(0),
            credentials,
        })
    }

    pub async fn get(&self, route: &str, query: &Query<'_>) -> TransportResult<Value> {
        self.request(Method::GET, route, query, None).await
    }

    pub async fn put(&self, route: &str, body: Option<&Value>) -> TransportResult<Value> {
        self.request(Method::PUT, route, &[], body).await
    }

    pub async fn post(&self, route: &str, body: Option<&Value>) -> TransportResult<Value> {
        self.request(Method::POST, route, &[], body).await
    }

    pub async fn delete(&self, route: &str) -> TransportResult<Value> {
        self.request(Method::DELETE, route, &[], None).await
    }

    /// Perform a call and decode the response as JSON
    ///
    /// An empty body decodes to `null`.
    pub async fn request(
        &self,
        method: Method,
        route: &str,
        query: &Query<'_>,
        body: Option<&Value>,
    ) -> TransportResult<Value> {
        let (url, text) = self.exchange(method, route, query, body).await?;

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| TransportError::Decode {
            url,
            reason: e.to_string(),
        })
    }

    /// Perform a call and return the body untouched, for plain-text endpoints
    pub async fn request_text(
        &self,
        method: Method,
        route: &str,
        query: &Query<'_>,
        body: Option<&Value>,
    ) -> TransportResult<String> {
        let (_, text) = self.exchange(method, route, query, body).await?;
        Ok(text)
    }

    async fn exchange(
        &self,
        method: Method,
        route: &str,
        query: &Query<'_>,
        body: Option<&Value>,
    ) -> TransportResult<(String, String)> {
        let (url, response) = self.send(method, route, query, body).await?;
        let status = response.status();

        let text = response.text().await.map_err(|e| TransportError::Decode {
            url: url.clone(),
            reason: e.to_string(),
        })?;

        debug!(%url, status = status.as_u16(), bytes = text.len(), "Received response");

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok((url, text))
    }

    async fn send(
        &self,
        method: Method,
        route: &str,
        query: &Query<'_>,
        body: Option<&Value>,
    ) -> TransportResult<(String, Response)> {
        let mut last_error = TransportError::NoServers;

        for attempt in 0..=self.max_retries {
            for server in &self.servers {
                let url = join_url(server, route);
                debug!(%method, %url, ?query, attempt, "Sending request");

                let mut request = self.client.request(method.clone(), &url).query(query);
                if let Some(credentials) = &self.credentials {
                    request = request.basic_auth(&credentials.username, Some(&credentials.password));
                }
                if let Some(body) = body {
                    debug!(%body, "Request body");
                    request = request.json(body);
                }

                match request.send().await {
                    Ok(response) if RETRYABLE_STATUSES.contains(&response.status().as_u16()) => {
                        let status = response.status().as_u16();
                        warn!(%url, status, "Node unavailable, trying next server");
                        last_error = TransportError::Status {
                            status,
                            body: response.text().await.unwrap_or_default(),
                        };
                    }
                    Ok(response) => return Ok((url, response)),
                    Err(e) if e.is_timeout() => {
                        warn!(%url, "Request timed out, trying next server");
                        last_error = TransportError::Timeout { url };
                    }
                    Err(e) => {
                        warn!(%url, error = %e, "Connection failed, trying next server");
                        last_error = TransportError::Connection { url, source: e };
                    }
                }
            }
        }

        Err(last_error)
    }
}

/// `http://host:9200/` + `/_cat/nodes` -> `http://host:9200/_cat/nodes`
pub fn join_url(server: &str, route: &str) -> String {
    format!(
        "{}/{}",
        server.trim_end_matches('/'),
        route.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use esctl_core::config::EsctlConfig;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    type Log = Arc<Mutex<Vec<String>>>;

    fn context(servers: Vec<String>, max_retries: u32) -> ResolvedContext {
        let mut context = EsctlConfig::default().resolve_context(None).unwrap();
        context.cluster.servers = servers;
        context.settings.max_retries = Some(max_retries);
        context
    }

    /// Node answering with the given statuses in turn, then 200
    ///
    /// Every request is logged as `<name> <METHOD> <path>`.
    async fn node(name: &'static str, statuses: &[u16], log: &Log) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let mut statuses = statuses.to_vec().into_iter();
        let log = Arc::clone(log);

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut head = Vec::new();
                let mut buf = [0u8; 1024];
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => head.extend_from_slice(&buf[..n]),
                    }
                }

                let request = String::from_utf8_lossy(&head).to_string();
                let mut words = request.split_whitespace();
                let method = words.next().unwrap_or_default();
                let path = words.next().unwrap_or_default().split('?').next().unwrap_or_default();
                log.lock().unwrap().push(format!("{name} {method} {path}"));

                let status = statuses.next().unwrap_or(200);
                let body = format!(r#"{{"node":"{name}","status":{status}}}"#);
                let response = format!(
                    "HTTP/1.1 {status} Stub\r\nContent-Type: application/json\r\n\
                     Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        url
    }

    /// Address nothing listens on
    async fn dead_node() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);
        url
    }

    fn requests(log: &Log) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn test_unavailable_node_fails_over_to_next() {
        let log = Log::default();
        let es01 = node("es01", &[503], &log).await;
        let es02 = node("es02", &[], &log).await;
        let service = ClusterService::new(&context(vec![es01, es02], 0), None).unwrap();

        let health = service.get("_cluster/health", &[]).await.unwrap();

        assert_eq!(health["node"], "es02");
        assert_eq!(
            requests(&log),
            ["es01 GET /_cluster/health", "es02 GET /_cluster/health"]
        );
    }

    #[tokio::test]
    async fn test_dead_node_is_skipped() {
        let log = Log::default();
        let es02 = node("es02", &[], &log).await;
        let dead = dead_node().await;
        let service = ClusterService::new(&context(vec![dead, es02], 0), None).unwrap();

        let health = service.get("/_cluster/health", &[]).await.unwrap();

        assert_eq!(health["node"], "es02");
        assert_eq!(requests(&log), ["es02 GET /_cluster/health"]);
    }

    #[tokio::test]
    async fn test_retries_walk_the_server_list_again() {
        let log = Log::default();
        let es02 = node("es02", &[503], &log).await;
        let dead = dead_node().await;
        let service = ClusterService::new(&context(vec![dead, es02], 1), None).unwrap();

        let nodes = service.get("_cat/nodes", &[("format", "json")]).await.unwrap();

        assert_eq!(nodes["status"], 200);
        assert_eq!(requests(&log), ["es02 GET /_cat/nodes", "es02 GET /_cat/nodes"]);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let log = Log::default();
        let es01 = node("es01", &[502, 504, 503], &log).await;
        let service = ClusterService::new(&context(vec![es01], 1), None).unwrap();

        let err = service.get("_cluster/health", &[]).await.unwrap_err();

        assert!(matches!(err, TransportError::Status { status: 504, .. }));
        assert_eq!(requests(&log).len(), 2);
    }

    #[tokio::test]
    async fn test_other_statuses_are_not_retried() {
        let log = Log::default();
        let es01 = node("es01", &[404], &log).await;
        let es02 = node("es02", &[], &log).await;
        let service = ClusterService::new(&context(vec![es01, es02], 2), None).unwrap();

        let err = service.get("missing-index", &[]).await.unwrap_err();

        assert!(matches!(err, TransportError::Status { status: 404, .. }));
        assert_eq!(requests(&log), ["es01 GET /missing-index"]);
    }

    #[tokio::test]
    async fn test_no_reachable_node() {
        let dead = dead_node().await;
        let service = ClusterService::new(&context(vec![dead.clone()], 0), None).unwrap();

        let err = service.get("_cluster/health", &[]).await.unwrap_err();

        assert!(matches!(err, TransportError::Connection { .. }));
        assert!(err.to_string().starts_with(&format!("Cannot connect to {dead}/_cluster/health")));
    }

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("http://localhost:9200/", "/_cat/nodes"),
            "http://localhost:9200/_cat/nodes"
        );
        assert_eq!(join_url("https://es:9200", "_cluster/health"), "https://es:9200/_cluster/health");
        assert_eq!(join_url("http://localhost:9200", "/"), "http://localhost:9200/");
    }

    #[test]
    fn test_service_from_default_context() {
        let context = EsctlConfig::default().resolve_context(None).unwrap();
        let service = ClusterService::new(&context, None).unwrap();
        assert_eq!(service.servers, ["http://localhost:9200"]);
        assert_eq!(service.max_retries, 0);
    }

    #[test]
    fn test_service_requires_servers() {
        let mut context = EsctlConfig::default().resolve_context(None).unwrap();
        context.cluster.servers.clear();
        assert!(matches!(
            ClusterService::new(&context, None),
            Err(TransportError::NoServers)
        ));
    }

    #[test]
    fn test_status_error_message() {
        let err = TransportError::Status {
            status: 404,
            body: "index_not_found_exception".into(),
        };
        assert_eq!(err.to_string(), "Cluster answered 404: index_not_found_exception");
    }
}
