//! Per-kind fabrication of numbers, narrative and plot placeholders.

use std::fmt::Write as _;

use indexmap::IndexMap;
use rand::Rng;
use serde_json::{json, Map, Value};

use crate::{
    config::AnalysisConfig,
    error::AnalysisError,
    kind::AnalysisKind,
    plots::{PlotKind, PlotSpec},
    sampling::{number, round_to, uniform},
};

const UNSPECIFIED: &str = "não especificada";
const INTERCEPT_KEY: &str = "(Intercepto)";

/// Ordered label → value mapping returned to clients.
pub type NumericalResults = IndexMap<String, Value>;

/// Fully rendered simulation for one request.
#[derive(Debug, Clone)]
pub struct SimulatedAnalysis {
    /// Fabricated statistics.
    pub numerical_results: NumericalResults,
    /// Markdown narrative.
    pub interpretation: String,
    /// Chart placeholders.
    pub plots: Vec<PlotSpec>,
}

/// Descriptive statistics derived from one mean/std pair.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptiveOutcome {
    /// Simulated sample size.
    pub samples: u32,
    /// Mean.
    pub mean: f64,
    /// Standard deviation.
    pub std_dev: f64,
    /// mean - 2 sd.
    pub min: f64,
    /// mean + 2 sd.
    pub max: f64,
    /// Drawn near the mean.
    pub median: f64,
}

/// Two-sample t-test.
#[derive(Debug, Clone, PartialEq)]
pub struct TTestOutcome {
    /// t statistic.
    pub t_stat: f64,
    /// Error degrees of freedom.
    pub df: u32,
    /// Reported p-value.
    pub p_value: f64,
    /// Significance level used.
    pub alpha: f64,
}

/// One-way ANOVA.
#[derive(Debug, Clone, PartialEq)]
pub struct AnovaOutcome {
    /// Number of simulated groups.
    pub groups: u32,
    /// F statistic.
    pub f_stat: f64,
    /// Between-group degrees of freedom.
    pub df_group: u32,
    /// Within-group degrees of freedom.
    pub df_error: u32,
    /// Reported p-value.
    pub p_value: f64,
    /// Significance level used.
    pub alpha: f64,
}

/// Simple or multiple linear regression.
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionOutcome {
    /// `lin_reg_multi`.
    pub multiple: bool,
    /// Predictor count used for the adjustment.
    pub predictors: usize,
    /// R².
    pub r_squared: f64,
    /// Adjusted R².
    pub adj_r_squared: f64,
    /// Predictor → coefficient, then the intercept last.
    pub coefficients: IndexMap<String, f64>,
    /// Model F statistic.
    pub f_stat: f64,
    /// Model p-value.
    pub p_value: f64,
}

/// Two-factor designed experiment.
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentOutcome {
    /// Factor A p-value.
    pub factor_a: f64,
    /// Factor B p-value.
    pub factor_b: f64,
    /// AB interaction p-value.
    pub interaction: f64,
}

/// Statistical process control.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessControlOutcome {
    /// Process capability.
    pub cp: f64,
    /// Centered process capability.
    pub cpk: f64,
    /// Whether the coin flip put the process out of control.
    pub out_of_control: bool,
    /// Points outside control limits.
    pub points_out: u32,
}

/// One case per analysis kind, each holding only what it reports.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulatedOutcome {
    /// `desc_stats`.
    Descriptive(DescriptiveOutcome),
    /// `t_test`.
    TTest(TTestOutcome),
    /// `anova`.
    Anova(AnovaOutcome),
    /// `lin_reg*`.
    Regression(RegressionOutcome),
    /// `doe`.
    Experiment(ExperimentOutcome),
    /// `spc`.
    ProcessControl(ProcessControlOutcome),
    /// Unknown tag.
    Unavailable,
}

impl SimulatedOutcome {
    /// Draws the outcome for the configured kind.
    pub fn draw<R: Rng + ?Sized>(
        config: &AnalysisConfig,
        rng: &mut R,
    ) -> Result<Self, AnalysisError> {
        let kind = config.kind();
        let samples: u32 = rng.gen_range(50..=200);
        let groups: u32 = if kind.compares_groups() {
            rng.gen_range(2..=5)
        } else {
            1
        };
        let alpha = config.effective_alpha();

        let outcome = match kind {
            AnalysisKind::DescriptiveStats => {
                let mean = uniform(rng, "mean", 10.0, 100.0)?;
                let std_dev = uniform(rng, "std_dev", (mean * 0.1).max(1.0), mean * 0.3)?;
                let median = uniform(
                    rng,
                    "median",
                    mean - 0.5 * std_dev,
                    mean + 0.5 * std_dev,
                )?;
                Self::Descriptive(DescriptiveOutcome {
                    samples,
                    mean: round_to(mean, 2),
                    std_dev: round_to(std_dev, 2),
                    min: round_to(2.0f64.mul_add(-std_dev, mean), 2),
                    max: round_to(2.0f64.mul_add(std_dev, mean), 2),
                    median: round_to(median, 2),
                })
            }
            AnalysisKind::TTest => {
                let p_value = uniform(rng, "p_value", 0.001, 0.2)?;
                let t_stat = uniform(rng, "t_stat", -3.5, 3.5)?;
                Self::TTest(TTestOutcome {
                    t_stat: round_to(t_stat, 3),
                    df: samples - groups,
                    p_value: reported_p(p_value, 4, 0.2),
                    alpha,
                })
            }
            AnalysisKind::Anova => {
                let p_value = uniform(rng, "p_value", 0.001, 0.2)?;
                let f_stat = uniform(rng, "f_stat", 0.5, 15.0)?;
                Self::Anova(AnovaOutcome {
                    groups,
                    f_stat: round_to(f_stat, 3),
                    df_group: groups - 1,
                    df_error: samples - groups,
                    p_value: reported_p(p_value, 4, 0.2),
                    alpha,
                })
            }
            AnalysisKind::LinearRegression { multiple } => {
                let names = config.predictors();
                let predictors = names.len();
                let r_squared = uniform(rng, "r_squared", 0.3, 0.9)?;
                #[allow(clippy::cast_precision_loss)]
                let shrink = uniform(rng, "adj_shrink", 0.01, 0.05)? * predictors as f64;
                let adj_r_squared = r_squared * (1.0 - shrink);
                let mut coefficients = IndexMap::with_capacity(predictors + 1);
                for name in names {
                    coefficients.insert(name, round_to(uniform(rng, "coefficient", -2.0, 2.0)?, 3));
                }
                coefficients.insert(
                    INTERCEPT_KEY.to_string(),
                    round_to(uniform(rng, "intercept", 1.0, 20.0)?, 3),
                );
                let f_stat = uniform(rng, "f_stat", 5.0, 50.0)?;
                let p_value = uniform(rng, "p_value", 0.0001, 0.05)?;
                Self::Regression(RegressionOutcome {
                    multiple,
                    predictors,
                    r_squared: round_to(r_squared, 3),
                    adj_r_squared: round_to(adj_r_squared, 3),
                    coefficients,
                    f_stat: round_to(f_stat, 2),
                    p_value: reported_p(p_value, 5, 0.05),
                })
            }
            AnalysisKind::DesignOfExperiments => Self::Experiment(ExperimentOutcome {
                factor_a: uniform(rng, "factor_a", 0.001, 0.1)?,
                factor_b: uniform(rng, "factor_b", 0.01, 0.3)?,
                interaction: uniform(rng, "interaction", 0.1, 0.5)?,
            }),
            AnalysisKind::ProcessControl => {
                let cpk = uniform(rng, "cpk", 0.5, 1.8)?;
                let out_of_control = rng.gen_ratio(1, 3);
                let cp = cpk * uniform(rng, "cp_jitter", 0.95, 1.05)?;
                let points_out = if out_of_control {
                    rng.gen_range(0..=3)
                } else {
                    0
                };
                Self::ProcessControl(ProcessControlOutcome {
                    cp: round_to(cp, 2),
                    cpk: round_to(cpk, 2),
                    out_of_control,
                    points_out,
                })
            }
            AnalysisKind::Unrecognized(_) => Self::Unavailable,
        };
        Ok(outcome)
    }

    /// Label → value mapping in presentation order.
    pub fn numerical_results(&self) -> Result<NumericalResults, AnalysisError> {
        let mut out = NumericalResults::new();
        match self {
            Self::Descriptive(d) => {
                out.insert("Número de Amostras".into(), json!(d.samples));
                put(&mut out, "Média", d.mean)?;
                put(&mut out, "Desvio Padrão", d.std_dev)?;
                put(&mut out, "Mínimo", d.min)?;
                put(&mut out, "Máximo", d.max)?;
                put(&mut out, "Mediana", d.median)?;
            }
            Self::TTest(t) => {
                put(&mut out, "Estatística t", t.t_stat)?;
                out.insert("Graus de Liberdade".into(), json!(t.df));
                put(&mut out, "Valor-p", t.p_value)?;
                put(&mut out, "Nível de Significância (α)", t.alpha)?;
            }
            Self::Anova(a) => {
                put(&mut out, "Estatística F", a.f_stat)?;
                out.insert("Graus de Liberdade (Grupo)".into(), json!(a.df_group));
                out.insert("Graus de Liberdade (Erro)".into(), json!(a.df_error));
                put(&mut out, "Valor-p", a.p_value)?;
                put(&mut out, "Nível de Significância (α)", a.alpha)?;
            }
            Self::Regression(r) => {
                put(&mut out, "R²", r.r_squared)?;
                put(&mut out, "R² Ajustado", r.adj_r_squared)?;
                let mut coefficients = Map::new();
                for (name, value) in &r.coefficients {
                    coefficients.insert(name.clone(), number(name, *value)?);
                }
                out.insert("Coeficientes".into(), Value::Object(coefficients));
                put(&mut out, "Estatística F (Modelo)", r.f_stat)?;
                put(&mut out, "Valor-p (Modelo)", r.p_value)?;
            }
            Self::Experiment(e) => {
                put(&mut out, "Fator A (p-valor)", e.factor_a)?;
                put(&mut out, "Fator B (p-valor)", e.factor_b)?;
                put(&mut out, "Interação AB (p-valor)", e.interaction)?;
            }
            Self::ProcessControl(s) => {
                put(&mut out, "Cp", s.cp)?;
                put(&mut out, "Cpk", s.cpk)?;
                out.insert("Pontos Fora de Controle".into(), json!(s.points_out));
            }
            Self::Unavailable => {
                out.insert(
                    "info".into(),
                    json!("Simulação não disponível para este tipo."),
                );
            }
        }
        Ok(out)
    }

    /// Narrative body (without the shared header).
    #[must_use]
    pub fn narrative(&self, config: &AnalysisConfig) -> String {
        let dependent = config.dependent_var.as_deref().unwrap_or(UNSPECIFIED);
        let grouping = config.grouping_var.as_deref().unwrap_or(UNSPECIFIED);
        let mut text = String::new();
        match self {
            Self::Descriptive(d) => {
                let _ = write!(
                    text,
                    "A análise descritiva de {} amostras revela uma média de {} com um desvio padrão de {}. \
                     Os dados variam de {} a {}.",
                    d.samples,
                    decimal(d.mean),
                    decimal(d.std_dev),
                    decimal(d.min),
                    decimal(d.max),
                );
            }
            Self::TTest(t) => {
                let _ = write!(
                    text,
                    "O teste t foi realizado para comparar as médias (variável: {dependent}, grupo: {grouping}). \
                     Com um valor-p de {:.4} e α = {}, ",
                    t.p_value,
                    decimal(t.alpha),
                );
                if t.is_significant() {
                    let _ = write!(
                        text,
                        "rejeitamos a hipótese nula (H0), sugerindo uma diferença estatisticamente significativa \
                         entre as médias dos grupos (t({}) = {:.3}, p < {}).",
                        t.df,
                        t.t_stat,
                        decimal(t.alpha),
                    );
                } else {
                    let _ = write!(
                        text,
                        "não rejeitamos a hipótese nula (H0), indicando que não há evidência suficiente para afirmar \
                         uma diferença significativa entre as médias dos grupos (t({}) = {:.3}, p = {:.4}).",
                        t.df, t.t_stat, t.p_value,
                    );
                }
            }
            Self::Anova(a) => {
                let _ = write!(
                    text,
                    "A ANOVA foi realizada para comparar as médias de {} grupos (variável: {dependent}, grupo: {grouping}). \
                     Com um valor-p de {:.4} e α = {}, ",
                    a.groups,
                    a.p_value,
                    decimal(a.alpha),
                );
                if a.is_significant() {
                    let _ = write!(
                        text,
                        "rejeitamos a hipótese nula (H0), indicando que há uma diferença estatisticamente significativa \
                         entre as médias de pelo menos dois grupos (F({}, {}) = {:.3}, p < {}). \
                         Testes post-hoc (simulados) seriam necessários para identificar quais grupos diferem.",
                        a.df_group,
                        a.df_error,
                        a.f_stat,
                        decimal(a.alpha),
                    );
                } else {
                    let _ = write!(
                        text,
                        "não rejeitamos a hipótese nula (H0), indicando que não há evidência suficiente para afirmar \
                         uma diferença significativa entre as médias dos grupos (F({}, {}) = {:.3}, p = {:.4}).",
                        a.df_group, a.df_error, a.f_stat, a.p_value,
                    );
                }
            }
            Self::Regression(r) => {
                let _ = write!(
                    text,
                    "Foi ajustado um modelo de regressão linear {} para prever {dependent} usando {} preditor(es). \
                     O modelo explica aproximadamente {:.1}% da variância na variável dependente (R² = {:.3}). \
                     O modelo geral é estatisticamente significativo (F = {:.2}, p < 0.05). \
                     Os coeficientes indicam a relação estimada entre cada preditor e a variável dependente.",
                    if r.multiple { "múltipla" } else { "simples" },
                    r.predictors,
                    r.r_squared * 100.0,
                    r.r_squared,
                    r.f_stat,
                );
            }
            Self::Experiment(e) => {
                let _ = write!(
                    text,
                    "A análise do Desenho de Experimentos (DOE) simulado indica os efeitos principais e de interação \
                     dos fatores investigados. O Fator A parece ter um efeito significativo (p={:.3}), enquanto o \
                     Fator B (p={:.3}) e a interação AB (p={:.3}) não mostraram significância neste nível alfa simulado.",
                    e.factor_a, e.factor_b, e.interaction,
                );
            }
            Self::ProcessControl(s) => {
                let _ = write!(
                    text,
                    "A análise de Controle Estatístico de Processo (CEP) simulada avaliou a estabilidade e capacidade \
                     do processo. O índice de capacidade Cpk estimado é {:.2}. ",
                    s.cpk,
                );
                if s.out_of_control {
                    let _ = write!(
                        text,
                        "Foram detectados {} pontos fora dos limites de controle, sugerindo que o processo pode estar \
                         instável e requer investigação.",
                        s.points_out,
                    );
                } else {
                    text.push_str("O processo parece estar estatisticamente sob controle.");
                }
            }
            Self::Unavailable => {
                text.push_str(
                    "Tipo de análise não reconhecido ou ainda não implementado na simulação detalhada.",
                );
            }
        }
        text
    }

    /// Chart placeholders for the outcome.
    #[must_use]
    pub fn plots(&self, config: &AnalysisConfig) -> Vec<PlotSpec> {
        let dependent = config.dependent_var.as_deref();
        let grouping = config.grouping_var.as_deref().unwrap_or(UNSPECIFIED);
        match self {
            Self::Descriptive(_) => {
                let variable = dependent.unwrap_or("Variável");
                vec![
                    PlotSpec::new(PlotKind::Histogram, format!("Histograma de {variable}")),
                    PlotSpec::new(PlotKind::Boxplot, format!("Boxplot de {variable}")),
                ]
            }
            Self::TTest(_) => vec![PlotSpec::new(
                PlotKind::Boxplot,
                format!(
                    "Comparação de Grupos ({} por {grouping})",
                    dependent.unwrap_or(UNSPECIFIED)
                ),
            )],
            Self::Anova(_) => vec![PlotSpec::new(
                PlotKind::Boxplot,
                format!(
                    "Comparação ANOVA ({} por {grouping})",
                    dependent.unwrap_or(UNSPECIFIED)
                ),
            )],
            Self::Regression(_) => vec![
                PlotSpec::new(
                    PlotKind::Scatterplot,
                    format!("Regressão: {} vs Preditor(es)", dependent.unwrap_or(UNSPECIFIED)),
                ),
                PlotSpec::new(PlotKind::ResidualPlot, "Análise de Resíduos (Simulada)"),
            ],
            Self::Experiment(_) => vec![
                PlotSpec::new(PlotKind::MainEffectsPlot, "Gráfico de Efeitos Principais (Simulado)"),
                PlotSpec::new(PlotKind::InteractionPlot, "Gráfico de Interação (Simulado)"),
            ],
            Self::ProcessControl(_) => vec![
                PlotSpec::new(PlotKind::ControlChartXbar, "Carta de Controle X-barra (Simulada)"),
                PlotSpec::new(PlotKind::ControlChartR, "Carta de Controle R (Simulada)"),
                PlotSpec::new(PlotKind::CapabilityHistogram, "Histograma de Capacidade (Simulado)"),
            ],
            Self::Unavailable => Vec::new(),
        }
    }

    /// Renders numbers, header + narrative, and plots.
    pub fn render(&self, config: &AnalysisConfig) -> Result<SimulatedAnalysis, AnalysisError> {
        let mut interpretation = header(config);
        interpretation.push_str(&self.narrative(config));
        Ok(SimulatedAnalysis {
            numerical_results: self.numerical_results()?,
            interpretation,
            plots: self.plots(config),
        })
    }
}

impl TTestOutcome {
    /// Significance is judged on the reported p-value.
    #[must_use]
    pub fn is_significant(&self) -> bool {
        self.p_value < self.alpha
    }
}

impl AnovaOutcome {
    /// Significance is judged on the reported p-value.
    #[must_use]
    pub fn is_significant(&self) -> bool {
        self.p_value < self.alpha
    }
}

/// Draws and renders the analysis for a configuration.
pub fn fabricate<R: Rng + ?Sized>(
    config: &AnalysisConfig,
    rng: &mut R,
) -> Result<SimulatedAnalysis, AnalysisError> {
    SimulatedOutcome::draw(config, rng)?.render(config)
}

fn put(out: &mut NumericalResults, key: &str, value: f64) -> Result<(), AnalysisError> {
    out.insert(key.to_string(), number(key, value)?);
    Ok(())
}

/// Rounds a p-value drawn from `[low, high)` without letting it reach `high`.
fn reported_p(value: f64, digits: i32, high: f64) -> f64 {
    let rounded = round_to(value, digits);
    if rounded < high {
        rounded
    } else {
        round_to(high - 10_f64.powi(-digits), digits)
    }
}

fn header(config: &AnalysisConfig) -> String {
    format!(
        "### Interpretação Simulada para {}\n\nConfiguração: Quantização={}, Fluxo={}\n\n",
        config.analysis_type, config.model_quantization, config.workflow_complexity
    )
}

/// Formats whole floats with a trailing `.0` so `50.0` does not read as an integer.
fn decimal(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}
