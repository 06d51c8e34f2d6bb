//! HTTP endpoint serving the gauge registry in the Prometheus text format.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use upswatch_exporter::GaugeRegistry;
//! use upswatch_exporter::prometheus::{PrometheusConfig, PrometheusExporter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PrometheusConfig::builder()
//!         .listen_addr("0.0.0.0:5000")
//!         .metrics_path("/metrics")
//!         .build();
//!
//!     let registry = Arc::new(GaugeRegistry::new());
//!     let server = PrometheusExporter::new(config, registry).start_server().await?;
//!
//!     println!("serving on {}", server.local_addr());
//!     server.shutdown().await;
//!     Ok(())
//! }
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{header, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::{ExporterError, GaugeRegistry};

const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:5000";
const DEFAULT_METRICS_PATH: &str = "/metrics";

const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Configuration for the metrics endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrometheusConfig {
    /// Address to listen on (e.g., "0.0.0.0:5000")
    pub listen_addr: String,
    /// Path for the metrics endpoint (e.g., "/metrics")
    pub metrics_path: String,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            metrics_path: DEFAULT_METRICS_PATH.to_string(),
        }
    }
}

impl PrometheusConfig {
    /// Create a new builder for PrometheusConfig.
    pub fn builder() -> PrometheusConfigBuilder {
        PrometheusConfigBuilder::default()
    }
}

/// Builder for PrometheusConfig.
#[derive(Debug, Default)]
pub struct PrometheusConfigBuilder {
    listen_addr: Option<String>,
    metrics_path: Option<String>,
}

impl PrometheusConfigBuilder {
    /// Set the listen address.
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.listen_addr = Some(addr.into());
        self
    }

    /// Set the metrics path.
    pub fn metrics_path(mut self, path: impl Into<String>) -> Self {
        self.metrics_path = Some(path.into());
        self
    }

    /// Build the PrometheusConfig.
    pub fn build(self) -> PrometheusConfig {
        PrometheusConfig {
            listen_addr: self
                .listen_addr
                .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string()),
            metrics_path: self
                .metrics_path
                .unwrap_or_else(|| DEFAULT_METRICS_PATH.to_string()),
        }
    }
}

/// Serves a [`GaugeRegistry`] over HTTP.
#[derive(Debug)]
pub struct PrometheusExporter {
    config: PrometheusConfig,
    registry: Arc<GaugeRegistry>,
}

impl PrometheusExporter {
    pub fn new(config: PrometheusConfig, registry: Arc<GaugeRegistry>) -> Self {
        Self { config, registry }
    }

    /// Get the configuration.
    pub fn config(&self) -> &PrometheusConfig {
        &self.config
    }

    /// Get the current metrics in Prometheus exposition format.
    pub fn render(&self) -> String {
        self.registry.render()
    }

    /// Bind the listen address and serve in a background task.
    ///
    /// Binding happens before this returns, so an unusable address is
    /// reported here rather than from inside the task.
    pub async fn start_server(&self) -> Result<MetricsServer, ExporterError> {
        let addr: SocketAddr =
            self.config
                .listen_addr
                .parse()
                .map_err(|source| ExporterError::InvalidListenAddr {
                    addr: self.config.listen_addr.clone(),
                    source,
                })?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ExporterError::Bind { addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ExporterError::Bind { addr, source })?;

        tracing::info!(addr = %local_addr, path = %self.config.metrics_path, "serving metrics");

        let metrics_path: Arc<str> = Arc::from(self.config.metrics_path.as_str());
        let registry = self.registry.clone();
        let task = tokio::spawn(run_server(listener, metrics_path, registry));

        Ok(MetricsServer { local_addr, task })
    }
}

/// Handle to a running metrics server.
#[derive(Debug)]
pub struct MetricsServer {
    local_addr: SocketAddr,
    task: JoinHandle<()>,
}

impl MetricsServer {
    /// The address actually bound, which differs from the configured one
    /// when port 0 was requested.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting connections and wait for the accept loop to end.
    pub async fn shutdown(self) {
        self.task.abort();
        let _ = self.task.await;
        tracing::debug!(addr = %self.local_addr, "metrics server stopped");
    }
}

async fn run_server(listener: TcpListener, metrics_path: Arc<str>, registry: Arc<GaugeRegistry>) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                tracing::warn!(error = %e, "failed to accept metrics connection");
                continue;
            }
        };
        let io = TokioIo::new(stream);

        let metrics_path = metrics_path.clone();
        let registry = registry.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req: Request<hyper::body::Incoming>| {
                let response = handle_request(req.uri().path(), &metrics_path, &registry);
                async move { Ok::<_, Infallible>(response) }
            });

            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                tracing::debug!(%peer, error = %e, "metrics connection error");
            }
        });
    }
}

fn handle_request(path: &str, metrics_path: &str, registry: &GaugeRegistry) -> Response<Full<Bytes>> {
    if path == metrics_path {
        text_response(StatusCode::OK, EXPOSITION_CONTENT_TYPE, registry.render())
    } else if path == "/health" || path == "/healthz" {
        text_response(StatusCode::OK, "text/plain", "OK".to_string())
    } else {
        text_response(StatusCode::NOT_FOUND, "text/plain", "Not Found".to_string())
    }
}

fn text_response(status: StatusCode, content_type: &'static str, body: String) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, header::HeaderValue::from_static(content_type));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GaugeSink;
    use http_body_util::BodyExt;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    async fn body_text(response: Response<Full<Bytes>>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn get(addr: SocketAddr, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request = format!("GET {} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n", path);
        stream.write_all(request.as_bytes()).await.unwrap();

        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[test]
    fn test_prometheus_config_builder() {
        let config = PrometheusConfig::builder()
            .listen_addr("0.0.0.0:9162")
            .metrics_path("/ups-metrics")
            .build();

        assert_eq!(config.listen_addr, "0.0.0.0:9162");
        assert_eq!(config.metrics_path, "/ups-metrics");
    }

    #[test]
    fn test_prometheus_config_defaults() {
        let config = PrometheusConfig::default();

        assert_eq!(config.listen_addr, "127.0.0.1:5000");
        assert_eq!(config.metrics_path, "/metrics");
        assert_eq!(PrometheusConfig::builder().build(), config);
    }

    #[tokio::test]
    async fn test_metrics_route() {
        let registry = GaugeRegistry::new();
        registry.describe("ups_status", "The current status.");
        registry.set_gauge("ups_status", 2.0);

        let response = handle_request("/metrics", "/metrics", &registry);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; version=0.0.4; charset=utf-8"
        );

        let body = body_text(response).await;
        assert!(body.contains("# TYPE ups_status gauge"));
        assert!(body.contains("ups_status 2"));
    }

    #[tokio::test]
    async fn test_health_routes() {
        let registry = GaugeRegistry::new();

        for path in ["/health", "/healthz"] {
            let response = handle_request(path, "/metrics", &registry);
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(body_text(response).await, "OK");
        }
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let registry = GaugeRegistry::new();

        let response = handle_request("/", "/metrics", &registry);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        // The default path is not special once another one is configured
        let response = handle_request("/metrics", "/ups", &registry);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_listen_addr() {
        let config = PrometheusConfig::builder().listen_addr("not an address").build();
        let exporter = PrometheusExporter::new(config, Arc::new(GaugeRegistry::new()));

        let err = exporter.start_server().await.unwrap_err();
        assert!(matches!(err, ExporterError::InvalidListenAddr { .. }));
    }

    #[tokio::test]
    async fn test_server_serves_registry() {
        let registry = Arc::new(GaugeRegistry::new());
        registry.describe("ups_power_line_voltage", "The current line voltage.");

        let config = PrometheusConfig::builder()
            .listen_addr("127.0.0.1:0")
            .metrics_path("/metrics")
            .build();
        let exporter = PrometheusExporter::new(config, registry.clone());
        let server = exporter.start_server().await.unwrap();
        let addr = server.local_addr();
        assert_ne!(addr.port(), 0);

        // Cleared gauges are omitted
        let response = get(addr, "/metrics").await;
        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(!response.contains("ups_power_line_voltage"));

        // Later writes are visible on the next scrape
        registry.set_gauge("ups_power_line_voltage", 230.5);
        let response = get(addr, "/metrics").await;
        assert!(response.contains("ups_power_line_voltage 230.5"));
        assert_eq!(exporter.render(), registry.render());

        let response = get(addr, "/healthz").await;
        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.ends_with("OK"));

        let response = get(addr, "/nope").await;
        assert!(response.starts_with("HTTP/1.1 404 Not Found"));

        server.shutdown().await;
    }
}
