/// Analysis strategies the simulator knows how to fabricate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisKind {
    /// `desc_stats`.
    DescriptiveStats,
    /// `t_test`.
    TTest,
    /// `anova`.
    Anova,
    /// Any tag starting with `lin_reg`.
    LinearRegression {
        /// True only for `lin_reg_multi`.
        multiple: bool,
    },
    /// `doe`.
    DesignOfExperiments,
    /// `spc`.
    ProcessControl,
    /// Anything else; carries the original tag.
    Unrecognized(String),
}

impl AnalysisKind {
    /// Decodes a free-form tag.
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "desc_stats" => Self::DescriptiveStats,
            "t_test" => Self::TTest,
            "anova" => Self::Anova,
            "doe" => Self::DesignOfExperiments,
            "spc" => Self::ProcessControl,
            _ if tag.starts_with("lin_reg") => Self::LinearRegression {
                multiple: tag == "lin_reg_multi",
            },
            other => Self::Unrecognized(other.to_string()),
        }
    }

    /// Label for logging.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::DescriptiveStats => "desc_stats",
            Self::TTest => "t_test",
            Self::Anova => "anova",
            Self::LinearRegression { multiple: true } => "lin_reg_multi",
            Self::LinearRegression { multiple: false } => "lin_reg",
            Self::DesignOfExperiments => "doe",
            Self::ProcessControl => "spc",
            Self::Unrecognized(tag) => tag,
        }
    }

    /// Kinds whose heuristic scores get the extra 1.1 factor.
    #[must_use]
    pub const fn is_heavy(&self) -> bool {
        matches!(
            self,
            Self::Anova
                | Self::LinearRegression { multiple: true }
                | Self::DesignOfExperiments
                | Self::ProcessControl
        )
    }

    /// Kinds that compare several groups of the sample.
    #[must_use]
    pub const fn compares_groups(&self) -> bool {
        matches!(self, Self::TTest | Self::Anova)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_known_tags() {
        assert_eq!(AnalysisKind::from_tag("desc_stats"), AnalysisKind::DescriptiveStats);
        assert_eq!(AnalysisKind::from_tag("spc"), AnalysisKind::ProcessControl);
        assert_eq!(
            AnalysisKind::from_tag("lin_reg_simple"),
            AnalysisKind::LinearRegression { multiple: false }
        );
        assert_eq!(
            AnalysisKind::from_tag("lin_reg_multi"),
            AnalysisKind::LinearRegression { multiple: true }
        );
    }

    #[test]
    fn unknown_tag_is_kept() {
        let kind = AnalysisKind::from_tag("chi_square");
        assert_eq!(kind, AnalysisKind::Unrecognized("chi_square".into()));
        assert_eq!(kind.label(), "chi_square");
        assert!(!kind.is_heavy());
    }

    #[test]
    fn heavy_kinds_match_scoring_table() {
        let heavy: Vec<_> = ["desc_stats", "t_test", "anova", "lin_reg_simple", "lin_reg_multi", "doe", "spc"]
            .into_iter()
            .filter(|tag| AnalysisKind::from_tag(tag).is_heavy())
            .collect();
        assert_eq!(heavy, vec!["anova", "lin_reg_multi", "doe", "spc"]);
    }
}
