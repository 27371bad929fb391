use std::time::Duration;

use dynaform_core::{DynaformError, Result};
use indexmap::IndexMap;
use serde::Serialize;

use crate::metric::{DEFAULT_PERIOD, Metric, serialize_period, validate_period};

/// Properties for [`MathExpression::new`].
#[derive(Debug, Clone, Default)]
pub struct MathExpressionProps {
    pub expression: String,
    /// Metrics referenced by the expression, keyed by variable name.
    pub using_metrics: IndexMap<String, Metric>,
    pub label: Option<String>,
    pub color: Option<String>,
    pub period: Option<Duration>,
}

/// A metric computed from other metrics, e.g. `getitem + putitem`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MathExpression {
    expression: String,
    using_metrics: IndexMap<String, Metric>,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    color: Option<String>,
    #[serde(serialize_with = "serialize_period")]
    period: Duration,
}

impl MathExpression {
    pub fn new(props: MathExpressionProps) -> Result<Self> {
        for name in props.using_metrics.keys() {
            validate_variable_name(name)?;
        }
        let period = props.period.unwrap_or(DEFAULT_PERIOD);
        validate_period(period)?;

        Ok(Self {
            expression: props.expression,
            using_metrics: props.using_metrics,
            label: props.label,
            color: props.color,
            period,
        })
    }

    #[must_use]
    pub fn expression(&self) -> &str {
        &self.expression
    }

    #[must_use]
    pub fn using_metrics(&self) -> &IndexMap<String, Metric> {
        &self.using_metrics
    }

    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    #[must_use]
    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }

    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }
}

/// Expression variables start with a lowercase letter and contain only
/// letters, digits and underscores.
fn validate_variable_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let starts_lowercase = chars.next().is_some_and(|c| c.is_ascii_lowercase());
    if starts_lowercase && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(DynaformError::Validation(format!(
            "invalid variable name '{name}': must match ^[a-z][a-zA-Z0-9_]*$"
        )))
    }
}

/// Either a plain metric or a math expression over metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetricRef {
    Metric(Metric),
    Expression(MathExpression),
}

impl MetricRef {
    #[must_use]
    pub fn as_metric(&self) -> Option<&Metric> {
        match self {
            Self::Metric(metric) => Some(metric),
            Self::Expression(_) => None,
        }
    }

    #[must_use]
    pub fn as_expression(&self) -> Option<&MathExpression> {
        match self {
            Self::Expression(expr) => Some(expr),
            Self::Metric(_) => None,
        }
    }

    #[must_use]
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Metric(metric) => metric.label.as_deref(),
            Self::Expression(expr) => expr.label(),
        }
    }
}

impl From<Metric> for MetricRef {
    fn from(metric: Metric) -> Self {
        Self::Metric(metric)
    }
}

impl From<MathExpression> for MetricRef {
    fn from(expr: MathExpression) -> Self {
        Self::Expression(expr)
    }
}
