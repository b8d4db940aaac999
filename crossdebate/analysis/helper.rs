use std::{fmt, path::PathBuf, sync::Arc};

use anyhow::{anyhow, Result};
use serde_json::Value;
use shared_event_bus::{EventPublisher, EventRecord};
use shared_logging::{JsonLogger, LogLevel, LogRecord};
use tokio::runtime::Handle;

/// Telemetry builder for the analysis simulator.
pub struct AnalysisTelemetryBuilder {
    module: String,
    log_path: Option<PathBuf>,
    event_publisher: Option<Arc<dyn EventPublisher>>,
}

impl AnalysisTelemetryBuilder {
    /// Creates a new builder scoped to a module label.
    #[must_use]
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            log_path: None,
            event_publisher: None,
        }
    }

    /// Sets the log path.
    #[must_use]
    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    /// Sets the event publisher.
    #[must_use]
    pub fn event_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.event_publisher = Some(publisher);
        self
    }

    /// Builds telemetry.
    pub fn build(self) -> Result<AnalysisTelemetry> {
        AnalysisTelemetry::new(self.module, self.log_path, self.event_publisher)
    }
}

/// Telemetry handle shared by simulator components.
#[derive(Clone)]
pub struct AnalysisTelemetry {
    inner: Arc<TelemetryInner>,
}

impl fmt::Debug for AnalysisTelemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisTelemetry")
            .field("module", &self.inner.module)
            .finish()
    }
}

struct TelemetryInner {
    module: String,
    logger: Option<JsonLogger>,
    publisher: Option<Arc<dyn EventPublisher>>,
}

impl AnalysisTelemetry {
    fn new(
        module: String,
        log_path: Option<PathBuf>,
        publisher: Option<Arc<dyn EventPublisher>>,
    ) -> Result<Self> {
        let logger = log_path.map(JsonLogger::new).transpose()?;
        Ok(Self {
            inner: Arc::new(TelemetryInner {
                module,
                logger,
                publisher,
            }),
        })
    }

    /// Returns a builder.
    #[must_use]
    pub fn builder(module: impl Into<String>) -> AnalysisTelemetryBuilder {
        AnalysisTelemetryBuilder::new(module)
    }

    /// Writes a structured log line.
    pub fn log(&self, level: LogLevel, message: &str, metadata: Value) -> Result<()> {
        if let Some(logger) = &self.inner.logger {
            logger.log(&LogRecord::new(&self.inner.module, level, message).with_metadata(metadata))?;
        }
        Ok(())
    }

    /// Emits an event on the current runtime. The publish is spawned and not awaited; a
    /// failed publish is reported through `tracing`. Outside a runtime nothing is sent.
    pub fn event(&self, event_type: &str, payload: Value) -> Result<()> {
        let Some(publisher) = &self.inner.publisher else {
            return Ok(());
        };
        let runtime = Handle::try_current()
            .map_err(|_| anyhow!("no tokio runtime available to publish {event_type}"))?;
        let record = EventRecord::new(self.inner.module.clone(), event_type, payload);
        let publisher = Arc::clone(publisher);
        let event_type = event_type.to_string();
        runtime.spawn(async move {
            if let Err(err) = publisher.publish(record).await {
                tracing::warn!(error = %err, event_type = %event_type, "telemetry event publish failed");
            }
        });
        Ok(())
    }
}
