//! Logging and OpenTelemetry initialization for the operation guard
//!
//! Console output is JSON or human-readable; file output rotates per
//! `file_rotation`. `RUST_LOG` overrides the configured level. When
//! OpenTelemetry is enabled, spans are exported over OTLP and every log line
//! carries the trace context.

use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    trace::{Sampler, TracerProvider},
    Resource,
};
use std::time::Duration;
use tracing_appender::{
    non_blocking::{NonBlocking, WorkerGuard},
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Keeps the file writer and the tracer provider alive
///
/// Dropping it flushes pending spans.
pub struct TelemetryGuard {
    _file_guard: Option<WorkerGuard>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        shutdown_telemetry();
    }
}

pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<TelemetryGuard> {
    let (tracer_provider, otel_error) = if config.opentelemetry_enabled {
        match init_tracer_provider(config) {
            Ok(provider) => (Some(provider), None),
            Err(e) => (None, Some(e.to_string())),
        }
    } else {
        (None, None)
    };

    let registry = tracing_subscriber::registry().with(build_env_filter(config));

    let file_guard = match &tracer_provider {
        Some(provider) => {
            let otel_layer = tracing_opentelemetry::layer()
                .with_tracer(provider.tracer("fhir-op-guard"))
                .with_tracked_inactivity(true);
            install_fmt_layers(registry.with(otel_layer), config)?
        }
        None => install_fmt_layers(registry, config)?,
    };

    if let Some(provider) = tracer_provider {
        global::set_tracer_provider(provider);
    }

    if let Some(err) = otel_error {
        tracing::warn!(
            error = %err,
            "Failed to initialize OpenTelemetry, continuing without it"
        );
    }

    tracing::info!(
        otel_enabled = config.opentelemetry_enabled,
        service_name = %config.service_name,
        environment = %config.deployment_environment,
        "Logging initialized"
    );

    Ok(TelemetryGuard {
        _file_guard: file_guard,
    })
}

/// Flush and shut down the global tracer provider
pub fn shutdown_telemetry() {
    global::shutdown_tracer_provider();
}

fn init_tracer_provider(config: &LoggingConfig) -> anyhow::Result<TracerProvider> {
    let exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(&config.otlp_endpoint)
        .with_timeout(Duration::from_secs(config.otlp_timeout_seconds))
        .build_span_exporter()
        .map_err(|e| anyhow::anyhow!("Failed to create OTLP exporter: {}", e))?;

    let trace_config = opentelemetry_sdk::trace::Config::default()
        .with_sampler(sampler_for(config.trace_sample_ratio))
        .with_resource(build_resource(config));

    Ok(TracerProvider::builder()
        .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
        .with_config(trace_config)
        .build())
}

fn build_resource(config: &LoggingConfig) -> Resource {
    let service_version = config
        .service_version
        .clone()
        .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());

    Resource::new(vec![
        KeyValue::new("service.name", config.service_name.clone()),
        KeyValue::new("service.version", service_version),
        KeyValue::new(
            "deployment.environment",
            config.deployment_environment.clone(),
        ),
    ])
}

fn sampler_for(ratio: f64) -> Sampler {
    if ratio >= 1.0 {
        Sampler::AlwaysOn
    } else if ratio <= 0.0 {
        Sampler::AlwaysOff
    } else {
        Sampler::ParentBased(Box::new(Sampler::TraceIdRatioBased(ratio)))
    }
}

fn default_directives(level: &str) -> String {
    // The MongoDB driver is chatty at debug level.
    format!("fhir_op_guard={level},fhirmongo={level},mongodb=warn")
}

fn build_env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&config.level)))
}

/// Attach console and optional file output, then install the subscriber
fn install_fmt_layers<S>(subscriber: S, config: &LoggingConfig) -> anyhow::Result<Option<WorkerGuard>>
where
    S: SubscriberExt + for<'a> tracing_subscriber::registry::LookupSpan<'a> + Send + Sync,
{
    let (file_writer, file_guard) = if config.file_enabled {
        let (writer, guard) = create_file_writer(config)?;
        (Some(writer), Some(guard))
    } else {
        (None, None)
    };

    if config.json {
        let console = fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_writer(std::io::stdout);
        let file = file_writer.map(|w| {
            fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(false)
                .with_writer(w)
        });
        subscriber.with(console).with(file).init();
    } else {
        let console = fmt::layer().with_target(true).with_writer(std::io::stdout);
        let file = file_writer.map(|w| {
            fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(w)
        });
        subscriber.with(console).with(file).init();
    }

    Ok(file_guard)
}

fn rotation_for(name: &str) -> Rotation {
    match name {
        "hourly" => Rotation::HOURLY,
        "minutely" => Rotation::MINUTELY,
        "never" => Rotation::NEVER,
        _ => Rotation::DAILY,
    }
}

fn create_file_writer(config: &LoggingConfig) -> anyhow::Result<(NonBlocking, WorkerGuard)> {
    std::fs::create_dir_all(&config.file_directory)?;

    let rotation = rotation_for(&config.file_rotation);
    let prefix = if rotation == Rotation::NEVER {
        format!("{}.log", config.file_prefix)
    } else {
        config.file_prefix.clone()
    };

    let appender = RollingFileAppender::new(rotation, &config.file_directory, prefix);
    Ok(tracing_appender::non_blocking(appender))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampler_follows_ratio() {
        assert!(matches!(sampler_for(1.0), Sampler::AlwaysOn));
        assert!(matches!(sampler_for(0.0), Sampler::AlwaysOff));
        assert!(matches!(sampler_for(0.25), Sampler::ParentBased(_)));
    }

    #[test]
    fn default_filter_quiets_driver() {
        let directives = default_directives("debug");
        assert!(directives.contains("fhirmongo=debug"));
        assert!(directives.contains("mongodb=warn"));
        assert!(EnvFilter::try_new(directives).is_ok());
    }

    #[test]
    fn unknown_rotation_falls_back_to_daily() {
        assert_eq!(rotation_for("hourly"), Rotation::HOURLY);
        assert_eq!(rotation_for("never"), Rotation::NEVER);
        assert_eq!(rotation_for("weekly"), Rotation::DAILY);
    }
}
