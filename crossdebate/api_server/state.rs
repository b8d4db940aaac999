use std::sync::Arc;

use anyhow::{Context, Result};
use crossdebate_analysis::{AnalysisSimulator, AnalysisTelemetry};
use crossdebate_data_store::{StoreTelemetry, TableStore, UploadRegistry};
use shared_event_bus::{EventPublisher, FileEventPublisher};

use crate::config::ServerConfig;

/// Shared handles passed to every request handler.
#[derive(Debug, Clone)]
pub struct AppState {
    registry: Arc<UploadRegistry>,
    simulator: Arc<AnalysisSimulator>,
}

impl AppState {
    /// Wraps already built components.
    #[must_use]
    pub fn new(registry: UploadRegistry, simulator: AnalysisSimulator) -> Self {
        Self {
            registry: Arc::new(registry),
            simulator: Arc::new(simulator),
        }
    }

    /// Builds the registry and simulator described by `config`, wiring telemetry sinks.
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let publisher: Option<Arc<dyn EventPublisher>> = match &config.event_log {
            Some(path) => Some(Arc::new(
                FileEventPublisher::new(path)
                    .with_context(|| format!("failed to open event log {}", path.display()))?,
            )),
            None => None,
        };

        let mut analysis_telemetry = AnalysisTelemetry::builder("analysis-simulator");
        let mut store_telemetry = StoreTelemetry::builder("data-store");
        if let Some(dir) = &config.log_dir {
            analysis_telemetry = analysis_telemetry.log_path(dir.join("analysis-simulator.log.jsonl"));
            store_telemetry = store_telemetry.log_path(dir.join("data-store.log.jsonl"));
        }
        if let Some(publisher) = &publisher {
            analysis_telemetry = analysis_telemetry.event_publisher(Arc::clone(publisher));
            store_telemetry = store_telemetry.event_publisher(Arc::clone(publisher));
        }

        let simulator = AnalysisSimulator::builder()
            .latency_scale(config.latency_scale)
            .telemetry(
                analysis_telemetry
                    .build()
                    .context("failed to initialise analysis telemetry")?,
            )
            .build()
            .context("invalid analysis simulator settings")?;

        let store = config
            .max_tables
            .map_or_else(TableStore::new, TableStore::with_capacity);
        let registry = UploadRegistry::with_store(store)
            .with_preview_rows(config.preview_rows)
            .with_telemetry(
                store_telemetry
                    .build()
                    .context("failed to initialise data store telemetry")?,
            );

        Ok(Self::new(registry, simulator))
    }

    /// Uploaded tables.
    #[must_use]
    pub fn registry(&self) -> &UploadRegistry {
        &self.registry
    }

    /// Analysis simulator.
    #[must_use]
    pub fn simulator(&self) -> &AnalysisSimulator {
        &self.simulator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn from_config_applies_limits() {
        let config = ServerConfig {
            max_tables: Some(3),
            preview_rows: 4,
            latency_scale: 0.0,
            ..ServerConfig::default()
        };
        let state = AppState::from_config(&config).unwrap();
        assert_eq!(state.registry().store().capacity(), Some(3));
        assert_eq!(state.registry().preview_rows(), 4);
        assert!(state.simulator().latency_scale().abs() < f64::EPSILON);
    }

    #[test]
    fn from_config_creates_log_files_on_demand() {
        let tmp = tempdir().unwrap();
        let config = ServerConfig {
            log_dir: Some(tmp.path().join("logs")),
            event_log: Some(tmp.path().join("events.jsonl")),
            ..ServerConfig::default()
        };
        AppState::from_config(&config).unwrap();
        assert!(tmp.path().join("logs").is_dir());
    }
}
