use serde::{Deserialize, Serialize};

/// Chart families the front end knows how to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlotKind {
    /// Frequency histogram.
    Histogram,
    /// Box-and-whisker plot.
    Boxplot,
    /// Scatter with fitted line.
    Scatterplot,
    /// Residuals against fitted values.
    ResidualPlot,
    /// DOE main effects.
    MainEffectsPlot,
    /// DOE factor interaction.
    InteractionPlot,
    /// X-bar control chart.
    ControlChartXbar,
    /// Range control chart.
    ControlChartR,
    /// Process capability histogram.
    CapabilityHistogram,
}

/// Placeholder describing a chart; nothing is rendered server-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotSpec {
    /// Chart family.
    #[serde(rename = "type")]
    pub kind: PlotKind,
    /// Display title.
    pub title: String,
}

impl PlotSpec {
    /// Creates a placeholder.
    #[must_use]
    pub fn new(kind: PlotKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_as_type_and_title() {
        let plot = PlotSpec::new(PlotKind::ControlChartXbar, "Carta X");
        assert_eq!(
            serde_json::to_value(&plot).unwrap(),
            json!({ "type": "control_chart_xbar", "title": "Carta X" })
        );
    }
}
