use anyhow::{Result, anyhow};
use once_cell::sync::OnceCell;
use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::{Protocol, SpanExporter, WithExportConfig};
use opentelemetry_sdk::{self as sdk, Resource};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: OnceCell<()> = OnceCell::new();

pub const DEFAULT_FILTER: &str = "info,tower_http=warn";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    /// `json` (any case) selects JSON lines; everything else is human readable.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Configuration for tracing initialization.
#[derive(Clone, Debug)]
pub struct ObsConfig {
    pub service_name: &'static str,
    pub env_filter: Option<String>,
    pub otlp_endpoint: Option<String>,
    pub format: Option<LogFormat>,
}

impl Default for ObsConfig {
    fn default() -> Self {
        Self {
            service_name: "crm-server",
            env_filter: None,
            otlp_endpoint: None,
            format: None,
        }
    }
}

/// Install tracing subscribers with optional OTLP exporter.
///
/// Unset fields fall back to `RUST_LOG`, `LOG_FORMAT` and `OTLP_ENDPOINT`.
pub fn init_tracing(config: ObsConfig) -> Result<()> {
    if INIT.get().is_some() {
        return Ok(());
    }

    let filter = config
        .env_filter
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| DEFAULT_FILTER.to_string());
    let format = config
        .format
        .or_else(|| std::env::var("LOG_FORMAT").ok().map(|v| LogFormat::parse(&v)))
        .unwrap_or_default();

    let env_filter = EnvFilter::try_new(filter)?;
    let json = format == LogFormat::Json;
    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(json.then(|| fmt::layer().json().with_current_span(true)))
        .with((!json).then(|| fmt::layer().with_target(false)));

    let otlp_endpoint = config
        .otlp_endpoint
        .or_else(|| std::env::var("OTLP_ENDPOINT").ok())
        .filter(|v| !v.trim().is_empty());

    if let Some(endpoint) = otlp_endpoint {
        let exporter = SpanExporter::builder()
            .with_http()
            .with_protocol(Protocol::HttpBinary)
            .with_endpoint(endpoint)
            .build()?;

        let resource = Resource::builder()
            .with_service_name(config.service_name)
            .build();

        let provider = sdk::trace::SdkTracerProvider::builder()
            .with_resource(resource)
            .with_batch_exporter(exporter)
            .build();
        let tracer = provider.tracer(config.service_name);

        registry
            .with(tracing_opentelemetry::layer().with_tracer(tracer))
            .try_init()?;
    } else {
        registry.try_init()?;
    }

    INIT.set(())
        .map_err(|_| anyhow!("tracing already initialized"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_parses_json_only() {
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse(" JSON "), LogFormat::Json);
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse(""), LogFormat::Pretty);
    }

    #[test]
    fn init_is_idempotent() {
        let config = ObsConfig {
            env_filter: Some("warn".into()),
            format: Some(LogFormat::Pretty),
            ..ObsConfig::default()
        };
        init_tracing(config.clone()).unwrap();
        init_tracing(config).unwrap();
    }
}
