//! CloudWatch metric definitions: leaf metrics, caller overrides and math
//! expressions composed from named metrics.

pub mod expression;
pub mod metric;
pub mod statistic;

pub use expression::{MathExpression, MathExpressionProps, MetricRef};
pub use metric::{DEFAULT_PERIOD, Metric, MetricOptions, validate_period};
pub use statistic::Statistic;
