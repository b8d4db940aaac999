use std::time::Duration;

use rand::Rng;

use crate::{
    config::{AnalysisConfig, ModelQuantization},
    error::AnalysisError,
    sampling::uniform,
};

/// Draws the artificial processing time, in seconds, for a request.
///
/// Base U(1,3); complex workflows add U(1,2); q8 models add U(0.5,1.5).
pub fn simulated_delay_secs<R: Rng + ?Sized>(
    config: &AnalysisConfig,
    rng: &mut R,
) -> Result<f64, AnalysisError> {
    let mut delay = uniform(rng, "delay.base", 1.0, 3.0)?;
    if config.is_complex() {
        delay += uniform(rng, "delay.complex", 1.0, 2.0)?;
    }
    if config.model_quantization == ModelQuantization::Q8 {
        delay += uniform(rng, "delay.q8", 0.5, 1.5)?;
    }
    Ok(delay)
}

/// Scales a drawn delay into a timer duration.
pub fn scaled_delay(delay_secs: f64, scale: f64) -> Result<Duration, AnalysisError> {
    Duration::try_from_secs_f64(delay_secs * scale)
        .map_err(|err| AnalysisError::InvalidDelay(format!("{delay_secs}s x {scale}: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::WorkflowComplexity, sampling::seeded_rng};

    #[test]
    fn delay_bounds_follow_configuration() {
        let cases = [
            (ModelQuantization::Q4, WorkflowComplexity::Simple, 1.0, 3.0),
            (ModelQuantization::Q8, WorkflowComplexity::Simple, 1.5, 4.5),
            (ModelQuantization::Mix, WorkflowComplexity::Complex, 2.0, 5.0),
            (ModelQuantization::Q8, WorkflowComplexity::Complex, 2.5, 6.5),
        ];
        for (quantization, complexity, low, high) in cases {
            let config = AnalysisConfig::new("t_test", quantization, complexity);
            for seed in 0..64 {
                let delay = simulated_delay_secs(&config, &mut seeded_rng(seed)).unwrap();
                assert!(delay >= low && delay < high, "{delay} outside [{low}, {high})");
            }
        }
    }

    #[test]
    fn zero_scale_means_no_wait() {
        assert_eq!(scaled_delay(2.5, 0.0).unwrap(), Duration::ZERO);
        assert_eq!(scaled_delay(2.0, 0.5).unwrap(), Duration::from_secs(1));
        assert!(scaled_delay(2.0, -1.0).is_err());
    }
}
