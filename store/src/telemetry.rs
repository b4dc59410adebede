// Telemetry for the recipe store: JSON logs, optional OTLP span export, and
// per-statement Prometheus metrics

use anyhow::{Context, Result};
use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{runtime::Tokio, trace, Resource};
use std::net::SocketAddr;
use std::time::Instant;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::ObservabilityConfig;
use crate::errors::DatabaseError;

const SERVICE_NAME: &str = "recipe-store";

pub const STATEMENTS_TOTAL: &str = "recipe_statements_total";
pub const STATEMENT_FAILURES_TOTAL: &str = "recipe_statement_failures_total";
pub const STATEMENT_DURATION_SECONDS: &str = "recipe_statement_duration_seconds";

/// Histogram buckets for statement round trips, in seconds
const DURATION_BUCKETS: [f64; 9] = [0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 1.0, 5.0];

/// Keeps the span exporter alive; dropping it flushes pending spans
#[must_use = "dropping the guard shuts the span exporter down"]
pub struct TelemetryGuard {
    span_export: bool,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if self.span_export {
            global::shutdown_tracer_provider();
        }
    }
}

/// Install logging, and metrics when a port is configured.
///
/// Span export to an OTLP collector is enabled when `tracing_endpoint` is set;
/// it needs a Tokio runtime.
pub fn init(observability: &ObservabilityConfig) -> Result<TelemetryGuard> {
    let endpoint = observability.tracing_endpoint.as_deref();
    init_logging(&observability.log_level, endpoint)?;

    if let Some(port) = observability.metrics_port {
        init_metrics(port)?;
    }

    Ok(TelemetryGuard {
        span_export: endpoint.is_some(),
    })
}

/// Install the global subscriber. `RUST_LOG` wins over `log_level`.
pub fn init_logging(log_level: &str, tracing_endpoint: Option<&str>) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .with_context(|| format!("Invalid log level: {}", log_level))?;

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_target(true)
        .with_filter(env_filter);

    let otel_layer = match tracing_endpoint {
        Some(endpoint) => Some(tracing_opentelemetry::layer().with_tracer(otlp_tracer(endpoint)?)),
        None => None,
    };

    tracing_subscriber::registry()
        .with(json_layer)
        .with(otel_layer)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    tracing::info!(log_level, tracing_endpoint, "Structured logging initialized");
    Ok(())
}

/// Batch span exporter for `endpoint`, registered as the global provider
fn otlp_tracer(endpoint: &str) -> Result<trace::Tracer> {
    let exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(endpoint)
        .build_span_exporter()
        .with_context(|| format!("Failed to build span exporter for {}", endpoint))?;

    let provider = trace::TracerProvider::builder()
        .with_batch_exporter(exporter, Tokio)
        .with_config(trace::Config::default().with_resource(Resource::new(vec![
            KeyValue::new("service.name", SERVICE_NAME),
            KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
        ])))
        .build();

    let tracer = provider.tracer(SERVICE_NAME);
    global::set_tracer_provider(provider);
    Ok(tracer)
}

/// Exporter settings shared by the HTTP listener and in-process rendering
fn prometheus_builder() -> Result<PrometheusBuilder> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(STATEMENT_DURATION_SECONDS.to_string()),
            &DURATION_BUCKETS,
        )
        .context("Invalid histogram buckets")
}

fn describe_statement_metrics() {
    describe_counter!(STATEMENTS_TOTAL, "Recipe store statements executed");
    describe_counter!(
        STATEMENT_FAILURES_TOTAL,
        "Recipe store statements that returned an error"
    );
    describe_histogram!(
        STATEMENT_DURATION_SECONDS,
        Unit::Seconds,
        "Recipe store statement round-trip time"
    );
}

/// Serve the statement metrics on `0.0.0.0:<port>/metrics`
pub fn init_metrics(port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    prometheus_builder()?
        .with_http_listener(addr)
        .install()
        .with_context(|| format!("Failed to install Prometheus exporter on {}", addr))?;

    describe_statement_metrics();
    tracing::info!(port, "Prometheus metrics exporter initialized");
    Ok(())
}

/// Tracks one statement round trip; call [`StatementTimer::finish`] with the outcome
pub struct StatementTimer {
    operation: &'static str,
    started: Instant,
}

impl StatementTimer {
    pub fn start(operation: &'static str) -> Self {
        Self {
            operation,
            started: Instant::now(),
        }
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Record the outcome and pass the result through unchanged
    pub fn finish<T>(self, result: Result<T, DatabaseError>) -> Result<T, DatabaseError> {
        counter!(STATEMENTS_TOTAL, "operation" => self.operation).increment(1);
        histogram!(STATEMENT_DURATION_SECONDS, "operation" => self.operation)
            .record(self.started.elapsed().as_secs_f64());

        if let Err(err) = &result {
            counter!(
                STATEMENT_FAILURES_TOTAL,
                "operation" => self.operation,
                "kind" => err.kind().as_str()
            )
            .increment(1);
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusRecorder;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    fn recorder() -> PrometheusRecorder {
        prometheus_builder().unwrap().build_recorder()
    }

    fn sample(rendered: &str, prefix: &str) -> Option<f64> {
        rendered
            .lines()
            .find(|line| line.starts_with(prefix))
            .and_then(|line| line.rsplit(' ').next())
            .and_then(|value| value.parse().ok())
    }

    #[test]
    fn test_init_installs_subscriber_once() {
        let observability = ObservabilityConfig {
            log_level: "debug".to_string(),
            metrics_port: None,
            tracing_endpoint: None,
        };

        let guard = init(&observability).unwrap();
        assert!(!guard.span_export);
        assert!(init(&observability).is_err());
    }

    #[test]
    fn test_timer_counts_statements_per_operation() {
        let recorder = recorder();
        metrics::with_local_recorder(&recorder, || {
            describe_statement_metrics();
            for id in [3, 5] {
                let result: Result<i64, DatabaseError> =
                    StatementTimer::start("find_recipe").finish(Ok(id));
                assert_eq!(result.unwrap(), id);
            }
        });

        let rendered = recorder.handle().render();
        assert!(rendered.contains("# HELP recipe_statements_total"));
        assert_eq!(
            sample(&rendered, r#"recipe_statements_total{operation="find_recipe"}"#),
            Some(2.0)
        );
        assert_eq!(
            sample(
                &rendered,
                r#"recipe_statement_duration_seconds_count{operation="find_recipe"}"#
            ),
            Some(2.0)
        );
        assert!(rendered.contains(r#"recipe_statement_duration_seconds_bucket{operation="find_recipe",le="0.001"}"#));
        assert!(!rendered.contains(STATEMENT_FAILURES_TOTAL));
    }

    #[test]
    fn test_timer_counts_failures_by_kind() {
        let recorder = recorder();
        let err = metrics::with_local_recorder(&recorder, || {
            StatementTimer::start("create_user")
                .finish::<i64>(Err(DatabaseError::Conflict("users_username_key".into())))
                .unwrap_err()
        });
        assert!(err.is_conflict());

        let rendered = recorder.handle().render();
        assert_eq!(
            sample(&rendered, r#"recipe_statements_total{operation="create_user"}"#),
            Some(1.0)
        );
        assert_eq!(
            sample(
                &rendered,
                r#"recipe_statement_failures_total{operation="create_user",kind="conflict"}"#
            ),
            Some(1.0)
        );
    }

    #[tokio::test]
    async fn test_init_metrics_serves_scrape_endpoint() {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();

        init_metrics(port).unwrap();
        StatementTimer::start("count_recipes")
            .finish(Ok(0_i64))
            .unwrap();

        let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        stream
            .write_all(b"GET /metrics HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains(r#"recipe_statements_total{operation="count_recipes"}"#));
    }
}
