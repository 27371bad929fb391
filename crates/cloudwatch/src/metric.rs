use std::collections::BTreeMap;
use std::time::Duration;

use dynaform_core::{DynaformError, Result};
use serde::{Serialize, Serializer};

use crate::statistic::Statistic;

/// Default aggregation period for metrics and expressions.
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(300);

/// Check that a period is one CloudWatch accepts: 1, 5, 10 or 30 seconds
/// (high resolution) or a whole number of minutes.
pub fn validate_period(period: Duration) -> Result<()> {
    let secs = period.as_secs();
    let valid = period.subsec_nanos() == 0
        && (matches!(secs, 1 | 5 | 10 | 30) || (secs > 0 && secs.is_multiple_of(60)));
    if valid {
        Ok(())
    } else {
        Err(DynaformError::Validation(format!(
            "'period' must be 1, 5, 10, 30, or a multiple of 60 seconds, received {}",
            period.as_secs_f64()
        )))
    }
}

pub(crate) fn serialize_period<S: Serializer>(
    period: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(period.as_secs())
}

/// Caller-supplied overrides applied on top of a metric's defaults.
///
/// Every field is optional; `dimensions` distinguishes "not supplied"
/// (`None`) from "supplied empty" (`Some` of an empty map).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricOptions {
    pub statistic: Option<Statistic>,
    pub period: Option<Duration>,
    pub dimensions: Option<BTreeMap<String, String>>,
    pub label: Option<String>,
    pub color: Option<String>,
    pub unit: Option<String>,
    pub region: Option<String>,
    pub account: Option<String>,
}

impl MetricOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_statistic(mut self, statistic: impl Into<Statistic>) -> Self {
        self.statistic = Some(statistic.into());
        self
    }

    #[must_use]
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = Some(period);
        self
    }

    /// Add one dimension, creating the dimension map if needed.
    #[must_use]
    pub fn with_dimension(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.dimensions
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_dimensions(mut self, dimensions: BTreeMap<String, String>) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    #[must_use]
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Value of a caller-supplied dimension, if any.
    #[must_use]
    pub fn dimension(&self, name: &str) -> Option<&str> {
        self.dimensions
            .as_ref()
            .and_then(|dims| dims.get(name))
            .map(String::as_str)
    }

    /// Use `statistic` unless the caller already chose one.
    #[must_use]
    pub fn or_statistic(mut self, statistic: Statistic) -> Self {
        self.statistic.get_or_insert(statistic);
        self
    }
}

/// A single named, dimensioned CloudWatch metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metric {
    pub namespace: String,
    pub metric_name: String,
    pub dimensions: BTreeMap<String, String>,
    pub statistic: Statistic,
    #[serde(serialize_with = "serialize_period")]
    pub period: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
}

impl Metric {
    /// A metric with the default statistic (`Average`) and period (5 minutes).
    pub fn new(namespace: impl Into<String>, metric_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            metric_name: metric_name.into(),
            dimensions: BTreeMap::new(),
            statistic: Statistic::Average,
            period: DEFAULT_PERIOD,
            label: None,
            color: None,
            unit: None,
            region: None,
            account: None,
        }
    }

    #[must_use]
    pub fn with_dimension(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.dimensions.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_statistic(mut self, statistic: Statistic) -> Self {
        self.statistic = statistic;
        self
    }

    /// Apply caller overrides. A supplied dimension map replaces the
    /// existing one wholesale.
    pub fn with(mut self, options: &MetricOptions) -> Result<Self> {
        if let Some(period) = options.period {
            validate_period(period)?;
            self.period = period;
        }
        if let Some(statistic) = &options.statistic {
            self.statistic = statistic.clone();
        }
        if let Some(dimensions) = &options.dimensions {
            self.dimensions = dimensions.clone();
        }
        if options.label.is_some() {
            self.label.clone_from(&options.label);
        }
        if options.color.is_some() {
            self.color.clone_from(&options.color);
        }
        if options.unit.is_some() {
            self.unit.clone_from(&options.unit);
        }
        if options.region.is_some() {
            self.region.clone_from(&options.region);
        }
        if options.account.is_some() {
            self.account.clone_from(&options.account);
        }
        Ok(self)
    }

    #[must_use]
    pub fn dimension(&self, name: &str) -> Option<&str> {
        self.dimensions.get(name).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let metric = Metric::new("AWS/DynamoDB", "UserErrors");
        assert_eq!(metric.statistic, Statistic::Average);
        assert_eq!(metric.period, Duration::from_secs(300));
        assert!(metric.dimensions.is_empty());
    }

    #[test]
    fn caller_options_take_precedence() {
        let metric = Metric::new("AWS/DynamoDB", "ThrottledRequests")
            .with_dimension("TableName", "orders")
            .with_statistic(Statistic::Sum);
        let options = MetricOptions::new()
            .with_statistic("max")
            .with_period(Duration::from_secs(60))
            .with_label("throttles")
            .with_color("#ff0000");
        let metric = metric.with(&options).unwrap();
        assert_eq!(metric.statistic, Statistic::Maximum);
        assert_eq!(metric.period, Duration::from_secs(60));
        assert_eq!(metric.label.as_deref(), Some("throttles"));
        assert_eq!(metric.color.as_deref(), Some("#ff0000"));
        assert_eq!(metric.dimension("TableName"), Some("orders"));
    }

    #[test]
    fn supplied_dimensions_replace_wholesale() {
        let metric = Metric::new("AWS/DynamoDB", "SystemErrors")
            .with_dimension("TableName", "orders")
            .with(&MetricOptions::new().with_dimension("Operation", "GetItem"))
            .unwrap();
        assert_eq!(metric.dimension("TableName"), None);
        assert_eq!(metric.dimension("Operation"), Some("GetItem"));
    }

    #[test]
    fn period_validation() {
        assert!(validate_period(Duration::from_secs(1)).is_ok());
        assert!(validate_period(Duration::from_secs(30)).is_ok());
        assert!(validate_period(Duration::from_secs(3600)).is_ok());
        assert!(validate_period(Duration::from_secs(0)).is_err());
        assert!(validate_period(Duration::from_secs(90)).is_err());
        assert!(validate_period(Duration::from_millis(1500)).is_err());

        let err = Metric::new("ns", "m")
            .with(&MetricOptions::new().with_period(Duration::from_secs(7)))
            .unwrap_err();
        assert!(matches!(err, DynaformError::Validation(_)));
    }

    #[test]
    fn or_statistic_keeps_caller_choice() {
        let options = MetricOptions::new().with_statistic(Statistic::Average);
        assert_eq!(
            options.or_statistic(Statistic::Sum).statistic,
            Some(Statistic::Average)
        );
        assert_eq!(
            MetricOptions::new().or_statistic(Statistic::Sum).statistic,
            Some(Statistic::Sum)
        );
    }

    #[test]
    fn serializes_period_in_seconds() {
        let metric = Metric::new("AWS/DynamoDB", "UserErrors");
        let json = serde_json::to_value(&metric).unwrap();
        assert_eq!(json["metricName"], "UserErrors");
        assert_eq!(json["period"], 300);
        assert_eq!(json["statistic"], "Average");
        assert!(json.get("label").is_none());
    }
}
