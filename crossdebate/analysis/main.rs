use std::time::Instant;

use rand::{rngs::SmallRng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::json;
use shared_logging::LogLevel;
use tokio::time::sleep;

use crate::{
    config::AnalysisConfig,
    error::AnalysisError,
    helper::AnalysisTelemetry,
    latency::{scaled_delay, simulated_delay_secs},
    metrics::{self, ClComplMetrics},
    outcome::{fabricate, NumericalResults},
    plots::PlotSpec,
    sampling::seeded_rng,
};

/// Status reported for every finished simulation.
pub const STATUS_COMPLETED: &str = "completed";

/// Response body of the analysis endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Always `completed` on success.
    pub status: String,
    /// Short human-readable summary.
    pub message: Option<String>,
    /// Fabricated statistics.
    pub numerical_results: Option<NumericalResults>,
    /// Markdown narrative.
    pub interpretation: Option<String>,
    /// Chart placeholders.
    pub plots: Option<Vec<PlotSpec>>,
    /// Heuristic CompL/CL estimates.
    #[serde(rename = "cl_compL_metrics")]
    pub cl_compl_metrics: Option<ClComplMetrics>,
}

/// Simulates a multi-agent statistical analysis: waits, scores, fabricates.
#[derive(Debug)]
pub struct AnalysisSimulator {
    telemetry: Option<AnalysisTelemetry>,
    latency_scale: f64,
    seed: Option<u64>,
}

impl AnalysisSimulator {
    /// Returns a builder.
    #[must_use]
    pub fn builder() -> AnalysisSimulatorBuilder {
        AnalysisSimulatorBuilder::default()
    }

    /// Multiplier applied to the simulated delay.
    #[must_use]
    pub const fn latency_scale(&self) -> f64 {
        self.latency_scale
    }

    /// Runs one simulated analysis.
    ///
    /// The only suspension point is the artificial delay, which uses the runtime timer so
    /// other requests keep being served. Dropping the future cancels the wait.
    pub async fn run(&self, config: &AnalysisConfig) -> Result<AnalysisResult, AnalysisError> {
        let started = Instant::now();
        let mut rng = self.rng();
        let delay_secs =
            simulated_delay_secs(config, &mut rng).map_err(|err| self.failed(config, err))?;
        let delay =
            scaled_delay(delay_secs, self.latency_scale).map_err(|err| self.failed(config, err))?;
        self.log(
            LogLevel::Info,
            "analysis.started",
            json!({
                "analysis_type": config.analysis_type,
                "model_quantization": config.model_quantization.label(),
                "workflow_complexity": config.workflow_complexity.label(),
                "simulated_delay_secs": delay_secs,
            }),
        );
        sleep(delay).await;

        let scores =
            metrics::estimate(config, &mut rng).map_err(|err| self.failed(config, err))?;
        let analysis = fabricate(config, &mut rng).map_err(|err| self.failed(config, err))?;

        if let Some(tel) = &self.telemetry {
            if let Err(err) = tel.event(
                "analysis.completed",
                json!({
                    "analysis_type": config.analysis_type,
                    "kind": config.kind().label(),
                    "plots": analysis.plots.len(),
                    "elapsed_ms": u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                }),
            ) {
                tracing::warn!(error = %err, "analysis.completed event not emitted");
            }
        }

        Ok(AnalysisResult {
            status: STATUS_COMPLETED.to_string(),
            message: Some(format!(
                "Análise simulada ({}) concluída.",
                config.analysis_type
            )),
            numerical_results: Some(analysis.numerical_results),
            interpretation: Some(analysis.interpretation),
            plots: Some(analysis.plots),
            cl_compl_metrics: Some(scores),
        })
    }

    fn rng(&self) -> SmallRng {
        self.seed.map_or_else(SmallRng::from_entropy, seeded_rng)
    }

    fn failed(&self, config: &AnalysisConfig, err: AnalysisError) -> AnalysisError {
        self.log(
            LogLevel::Error,
            "analysis.failed",
            json!({ "analysis_type": config.analysis_type, "error": err.to_string() }),
        );
        err
    }

    fn log(&self, level: LogLevel, message: &str, metadata: serde_json::Value) {
        if let Some(tel) = &self.telemetry {
            let _ = tel.log(level, message, metadata);
        }
    }
}

/// Builder for `AnalysisSimulator`.
#[derive(Debug)]
pub struct AnalysisSimulatorBuilder {
    telemetry: Option<AnalysisTelemetry>,
    latency_scale: f64,
    seed: Option<u64>,
}

impl AnalysisSimulatorBuilder {
    /// Sets telemetry.
    #[must_use]
    pub fn telemetry(mut self, telemetry: AnalysisTelemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Scales the artificial delay; `0.0` disables waiting.
    #[must_use]
    pub fn latency_scale(mut self, scale: f64) -> Self {
        self.latency_scale = scale;
        self
    }

    /// Fixes the RNG seed so every run draws the same values.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Builds the simulator.
    pub fn build(self) -> Result<AnalysisSimulator, AnalysisError> {
        if !(self.latency_scale.is_finite() && self.latency_scale >= 0.0) {
            return Err(AnalysisError::InvalidDelay(format!(
                "latency scale must be finite and non-negative, got {}",
                self.latency_scale
            )));
        }
        Ok(AnalysisSimulator {
            telemetry: self.telemetry,
            latency_scale: self.latency_scale,
            seed: self.seed,
        })
    }
}

impl Default for AnalysisSimulatorBuilder {
    fn default() -> Self {
        Self {
            telemetry: None,
            latency_scale: 1.0,
            seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ModelQuantization, WorkflowComplexity};
    use shared_event_bus::MemoryEventBus;
    use std::{sync::Arc, time::Duration};
    use tempfile::tempdir;

    fn instant_simulator() -> AnalysisSimulator {
        AnalysisSimulator::builder().latency_scale(0.0).build().unwrap()
    }

    #[tokio::test]
    async fn run_completes_with_all_sections() {
        let config = AnalysisConfig::new("anova", ModelQuantization::Mix, WorkflowComplexity::Complex);
        let result = instant_simulator().run(&config).await.unwrap();
        assert_eq!(result.status, STATUS_COMPLETED);
        assert_eq!(result.message.as_deref(), Some("Análise simulada (anova) concluída."));
        assert!(result.numerical_results.unwrap().contains_key("Estatística F"));
        assert_eq!(result.plots.unwrap().len(), 1);
        let scores = result.cl_compl_metrics.unwrap();
        assert!((10.0..=95.0).contains(&scores.cl_estimate));
    }

    #[tokio::test]
    async fn unknown_type_still_completes() {
        let config = AnalysisConfig::new("cluster", ModelQuantization::Q4, WorkflowComplexity::Simple);
        let result = instant_simulator().run(&config).await.unwrap();
        assert_eq!(result.status, STATUS_COMPLETED);
        assert!(result.numerical_results.unwrap().contains_key("info"));
        assert!(result.plots.unwrap().is_empty());
    }

    #[tokio::test]
    async fn seeded_runs_repeat() {
        let simulator = AnalysisSimulator::builder()
            .latency_scale(0.0)
            .seed(42)
            .build()
            .unwrap();
        let config = AnalysisConfig::new("spc", ModelQuantization::Q8, WorkflowComplexity::Simple);
        let first = simulator.run(&config).await.unwrap();
        let second = simulator.run(&config).await.unwrap();
        assert_eq!(first.numerical_results, second.numerical_results);
        assert_eq!(first.interpretation, second.interpretation);
    }

    #[tokio::test(start_paused = true)]
    async fn delay_does_not_block_other_tasks() {
        let simulator = Arc::new(AnalysisSimulator::builder().build().unwrap());
        let config = AnalysisConfig::new("t_test", ModelQuantization::Q4, WorkflowComplexity::Simple);
        let handle = {
            let simulator = Arc::clone(&simulator);
            tokio::spawn(async move { simulator.run(&config).await })
        };
        // The analysis sleeps at least one second; a sibling task finishes first.
        let sibling = tokio::spawn(async { sleep(Duration::from_millis(10)).await });
        sibling.await.unwrap();
        assert!(!handle.is_finished());
        let result = handle.await.unwrap().unwrap();
        assert_eq!(result.status, STATUS_COMPLETED);
    }

    #[tokio::test]
    async fn telemetry_records_lifecycle() {
        let tmp = tempdir().unwrap();
        let bus = Arc::new(MemoryEventBus::new(8));
        let telemetry = AnalysisTelemetry::builder("analysis-simulator")
            .log_path(tmp.path().join("analysis.log.jsonl"))
            .event_publisher(bus.clone())
            .build()
            .unwrap();
        let simulator = AnalysisSimulator::builder()
            .latency_scale(0.0)
            .telemetry(telemetry)
            .build()
            .unwrap();
        let config = AnalysisConfig::new("doe", ModelQuantization::Q4, WorkflowComplexity::Simple);
        simulator.run(&config).await.unwrap();
        tokio::task::yield_now().await;
        let log = std::fs::read_to_string(tmp.path().join("analysis.log.jsonl")).unwrap();
        assert!(log.contains("analysis.started"));
        assert!(log.contains("\"analysis_type\":\"doe\""));
    }

    #[test]
    fn pre_fabrication_failures_are_logged() {
        let tmp = tempdir().unwrap();
        let log_path = tmp.path().join("analysis.log.jsonl");
        let telemetry = AnalysisTelemetry::builder("analysis-simulator")
            .log_path(&log_path)
            .build()
            .unwrap();
        let simulator = AnalysisSimulator::builder()
            .telemetry(telemetry)
            .build()
            .unwrap();
        let config = AnalysisConfig::new("t_test", ModelQuantization::Q8, WorkflowComplexity::Simple);
        let delay_err = scaled_delay(1.0, f64::INFINITY).unwrap_err();
        let err = simulator.failed(&config, delay_err);
        assert!(matches!(err, AnalysisError::InvalidDelay(_)));
        let log = std::fs::read_to_string(&log_path).unwrap();
        assert!(log.contains("analysis.failed"));
        assert!(log.contains("invalid simulated delay"));
        assert!(log.contains("\"analysis_type\":\"t_test\""));
    }

    #[test]
    fn negative_latency_scale_is_rejected() {
        assert!(AnalysisSimulator::builder().latency_scale(-1.0).build().is_err());
    }

    #[test]
    fn result_uses_wire_field_names() {
        let result = AnalysisResult {
            status: STATUS_COMPLETED.into(),
            message: None,
            numerical_results: None,
            interpretation: None,
            plots: None,
            cl_compl_metrics: Some(ClComplMetrics {
                compl_estimate: 12.0,
                cl_estimate: 40.5,
            }),
        };
        let value = serde_json::to_value(result).unwrap();
        assert_eq!(value["cl_compL_metrics"]["CL_Estimate"], 40.5);
    }
}
