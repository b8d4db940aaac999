use std::fmt;

use serde::{Deserialize, Serialize};

use crate::kind::AnalysisKind;

/// Significance level used when the request omits one (or sends zero).
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Precision tier of the model pretending to run the analysis.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ModelQuantization {
    /// 4-bit weights.
    Q4,
    /// 8-bit weights.
    Q8,
    /// Mixed precision.
    Mix,
}

impl ModelQuantization {
    /// Wire label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Q4 => "q4",
            Self::Q8 => "q8",
            Self::Mix => "mix",
        }
    }
}

impl fmt::Display for ModelQuantization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Requested workflow depth.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowComplexity {
    /// Single-agent pass.
    Simple,
    /// Multi-agent debate.
    Complex,
}

impl WorkflowComplexity {
    /// Wire label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Complex => "complex",
        }
    }
}

impl fmt::Display for WorkflowComplexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Analysis request as posted by the front end.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisConfig {
    /// Free-form analysis tag (`t_test`, `lin_reg_multi`, ...).
    pub analysis_type: String,
    /// Response variable.
    #[serde(default)]
    pub dependent_var: Option<String>,
    /// Predictors, in order.
    #[serde(default)]
    pub independent_vars: Option<Vec<String>>,
    /// Factor splitting the sample into groups.
    #[serde(default)]
    pub grouping_var: Option<String>,
    /// Significance level.
    #[serde(default = "default_alpha")]
    pub alpha: Option<f64>,
    /// Model precision tier.
    pub model_quantization: ModelQuantization,
    /// Workflow depth.
    pub workflow_complexity: WorkflowComplexity,
}

#[allow(clippy::unnecessary_wraps)]
const fn default_alpha() -> Option<f64> {
    Some(DEFAULT_ALPHA)
}

impl AnalysisConfig {
    /// Minimal config for the given tag; mostly useful in tests and tooling.
    #[must_use]
    pub fn new(
        analysis_type: impl Into<String>,
        model_quantization: ModelQuantization,
        workflow_complexity: WorkflowComplexity,
    ) -> Self {
        Self {
            analysis_type: analysis_type.into(),
            dependent_var: None,
            independent_vars: None,
            grouping_var: None,
            alpha: default_alpha(),
            model_quantization,
            workflow_complexity,
        }
    }

    /// Decoded analysis kind.
    #[must_use]
    pub fn kind(&self) -> AnalysisKind {
        AnalysisKind::from_tag(&self.analysis_type)
    }

    /// Alpha actually used for significance decisions. Missing or zero falls back to 0.05.
    #[must_use]
    pub fn effective_alpha(&self) -> f64 {
        match self.alpha {
            Some(alpha) if alpha != 0.0 => alpha,
            _ => DEFAULT_ALPHA,
        }
    }

    /// Whether the workflow runs in multi-agent mode.
    #[must_use]
    pub fn is_complex(&self) -> bool {
        self.workflow_complexity == WorkflowComplexity::Complex
    }

    /// Predictor names, falling back to a single placeholder predictor.
    #[must_use]
    pub fn predictors(&self) -> Vec<String> {
        match &self.independent_vars {
            Some(vars) if !vars.is_empty() => vars.clone(),
            _ => vec!["var_indep".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_front_end_payload() {
        let config: AnalysisConfig = serde_json::from_value(json!({
            "analysisType": "lin_reg_multi",
            "dependentVar": "y",
            "independentVars": ["x1", "x2"],
            "modelQuantization": "mix",
            "workflowComplexity": "complex"
        }))
        .unwrap();
        assert_eq!(config.model_quantization, ModelQuantization::Mix);
        assert!(config.is_complex());
        assert_eq!(config.alpha, Some(DEFAULT_ALPHA));
        assert_eq!(config.predictors(), vec!["x1", "x2"]);
    }

    #[test]
    fn rejects_unknown_quantization() {
        let result = serde_json::from_value::<AnalysisConfig>(json!({
            "analysisType": "t_test",
            "modelQuantization": "q16",
            "workflowComplexity": "simple"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn zero_or_null_alpha_falls_back() {
        let mut config = AnalysisConfig::new("t_test", ModelQuantization::Q4, WorkflowComplexity::Simple);
        config.alpha = None;
        assert!((config.effective_alpha() - DEFAULT_ALPHA).abs() < f64::EPSILON);
        config.alpha = Some(0.0);
        assert!((config.effective_alpha() - DEFAULT_ALPHA).abs() < f64::EPSILON);
        config.alpha = Some(0.1);
        assert!((config.effective_alpha() - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_predictor_list_uses_placeholder() {
        let mut config = AnalysisConfig::new("lin_reg_simple", ModelQuantization::Q8, WorkflowComplexity::Simple);
        config.independent_vars = Some(Vec::new());
        assert_eq!(config.predictors(), vec!["var_indep"]);
    }
}
