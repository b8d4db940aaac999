#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rust_2018_idioms,
    missing_docs
)]

//! CrossDebate analysis simulator: turns an analysis request into simulated latency,
//! heuristic CompL/CL scores, fabricated statistics, a narrative and plot placeholders.
//!
//! Nothing here reads uploaded data; every number is drawn from a distribution.

/// Telemetry handle.
#[path = "../helper.rs"]
pub mod helper;

/// Seeded RNG, bounded draws and rounding.
#[path = "../sampling.rs"]
pub mod sampling;

/// Failure taxonomy.
#[path = "../error.rs"]
pub mod error;

/// Request configuration.
#[path = "../config.rs"]
pub mod config;

/// Analysis-type decoding.
#[path = "../kind.rs"]
pub mod kind;

/// Artificial latency.
#[path = "../latency.rs"]
pub mod latency;

/// CompL/CL heuristic scores.
#[path = "../metrics.rs"]
pub mod metrics;

/// Plot placeholders.
#[path = "../plots.rs"]
pub mod plots;

/// Per-kind result fabrication.
#[path = "../outcome.rs"]
pub mod outcome;

/// Simulator runtime.
#[path = "../main.rs"]
pub mod runtime;

pub use config::{AnalysisConfig, ModelQuantization, WorkflowComplexity, DEFAULT_ALPHA};
pub use error::AnalysisError;
pub use helper::{AnalysisTelemetry, AnalysisTelemetryBuilder};
pub use kind::AnalysisKind;
pub use metrics::ClComplMetrics;
pub use outcome::{fabricate, SimulatedAnalysis, SimulatedOutcome};
pub use plots::{PlotKind, PlotSpec};
pub use runtime::{AnalysisResult, AnalysisSimulator, AnalysisSimulatorBuilder, STATUS_COMPLETED};
