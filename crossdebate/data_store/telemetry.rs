//! Structured log and event sinks for the table registry.

use std::{fmt, path::PathBuf, sync::Arc};

use anyhow::{anyhow, Result};
use serde_json::Value;
use shared_event_bus::{EventPublisher, EventRecord};
use shared_logging::{JsonLogger, LogLevel, LogRecord};
use tokio::runtime::Handle;

/// Builder for table-store telemetry sinks.
pub struct StoreTelemetryBuilder {
    module: String,
    log_path: Option<PathBuf>,
    event_publisher: Option<Arc<dyn EventPublisher>>,
}

impl StoreTelemetryBuilder {
    /// Creates the builder.
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

    /// Builds the telemetry handle.
    pub fn build(self) -> Result<StoreTelemetry> {
        let logger = self.log_path.map(JsonLogger::new).transpose()?;
        Ok(StoreTelemetry {
            inner: Arc::new(TelemetryInner {
                module: self.module,
                logger,
                publisher: self.event_publisher,
            }),
        })
    }
}

/// Telemetry handle for upload storage.
#[derive(Clone)]
pub struct StoreTelemetry {
    inner: Arc<TelemetryInner>,
}

struct TelemetryInner {
    module: String,
    logger: Option<JsonLogger>,
    publisher: Option<Arc<dyn EventPublisher>>,
}

impl fmt::Debug for StoreTelemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreTelemetry")
            .field("module", &self.inner.module)
            .finish()
    }
}

impl StoreTelemetry {
    /// Returns a builder.
    #[must_use]
    pub fn builder(module: impl Into<String>) -> StoreTelemetryBuilder {
        StoreTelemetryBuilder::new(module)
    }

    /// Writes a structured log line.
    pub fn log(&self, level: LogLevel, message: &str, metadata: Value) -> Result<()> {
        if let Some(logger) = &self.inner.logger {
            logger.log(&LogRecord::new(&self.inner.module, level, message).with_metadata(metadata))?;
        }
        Ok(())
    }

    /// Emits an event, spawning the publish on the current runtime. Publish failures are
    /// logged with `tracing`; without a runtime the event is refused.
    pub fn event(&self, event_type: &str, payload: Value) -> Result<()> {
        let Some(publisher) = &self.inner.publisher else {
            return Ok(());
        };
        let Ok(runtime) = Handle::try_current() else {
            return Err(anyhow!("no tokio runtime available to publish {event_type}"));
        };
        let record = EventRecord::new(self.inner.module.clone(), event_type, payload);
        let publisher = Arc::clone(publisher);
        let event_type = event_type.to_owned();
        runtime.spawn(async move {
            if let Err(err) = publisher.publish(record).await {
                tracing::warn!(error = %err, event_type = %event_type, "telemetry event publish failed");
            }
        });
        Ok(())
    }
}
