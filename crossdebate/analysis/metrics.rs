use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    config::{AnalysisConfig, ModelQuantization},
    error::AnalysisError,
    sampling::{round_to, uniform},
};

const SCORE_FLOOR: f64 = 10.0;
const SCORE_CEILING: f64 = 95.0;

/// Heuristic complexity (CompL) and confidence (CL) estimates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClComplMetrics {
    /// Complexity estimate in [10, 95], one decimal.
    #[serde(rename = "CompL_Estimate")]
    pub compl_estimate: f64,
    /// Confidence estimate in [10, 95], one decimal.
    #[serde(rename = "CL_Estimate")]
    pub cl_estimate: f64,
}

/// Multipliers applied to the (CompL, CL) bases.
#[must_use]
pub fn score_factors(config: &AnalysisConfig) -> (f64, f64) {
    let (mut compl, mut cl) = match config.model_quantization {
        ModelQuantization::Q4 => (0.7, 1.3),
        ModelQuantization::Q8 => (1.0, 1.0),
        ModelQuantization::Mix => (0.85, 1.15),
    };
    if config.is_complex() {
        compl *= 1.2;
        cl *= 1.4;
    }
    if config.kind().is_heavy() {
        compl *= 1.1;
        cl *= 1.1;
    }
    (compl, cl)
}

/// Draws both estimates for a configuration.
pub fn estimate<R: Rng + ?Sized>(
    config: &AnalysisConfig,
    rng: &mut R,
) -> Result<ClComplMetrics, AnalysisError> {
    let base_compl = uniform(rng, "compl.base", 20.0, 50.0)?;
    let base_cl = uniform(rng, "cl.base", 15.0, 40.0)?;
    let (compl_factor, cl_factor) = score_factors(config);
    Ok(ClComplMetrics {
        compl_estimate: finalize(base_compl * compl_factor),
        cl_estimate: finalize(base_cl * cl_factor),
    })
}

fn finalize(score: f64) -> f64 {
    round_to(score.clamp(SCORE_FLOOR, SCORE_CEILING), 1)
}
