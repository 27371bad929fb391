use std::collections::BTreeMap;

use dynaform_cloudwatch::{MathExpression, MathExpressionProps, Metric, MetricOptions, MetricRef, Statistic};
use dynaform_core::{DynaformError, Result, TableName};
use indexmap::IndexMap;
use tracing::debug;

use crate::canned::{self, NAMESPACE, OPERATION_DIMENSION, TABLE_NAME_DIMENSION};
use crate::operation::Operation;

/// Options for metrics aggregated over several operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationsMetricOptions {
    /// Operations to include. Defaults to [`Operation::ALL`].
    pub operations: Option<Vec<Operation>>,
    /// Overrides applied to every per-operation metric. `color`, `label`
    /// and `period` also apply to the resulting expression.
    pub metric: MetricOptions,
}

impl OperationsMetricOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_operations(mut self, operations: impl IntoIterator<Item = Operation>) -> Self {
        self.operations = Some(operations.into_iter().collect());
        self
    }

    #[must_use]
    pub fn with_metric_options(mut self, metric: MetricOptions) -> Self {
        self.metric = metric;
        self
    }
}

/// Maps an operation to the variable name used for it in an expression.
pub type AliasMapper<'m> = &'m dyn Fn(Operation) -> String;

/// Builds the CloudWatch metrics `DynamoDB` publishes for one table.
#[derive(Debug, Clone, Copy)]
pub struct OperationMetrics<'a> {
    table_name: &'a TableName,
}

impl<'a> OperationMetrics<'a> {
    #[must_use]
    pub fn new(table_name: &'a TableName) -> Self {
        Self { table_name }
    }

    /// A named metric scoped to the table. Defaults to `Average` over five
    /// minutes; caller options take precedence.
    pub fn metric(&self, metric_name: &str, options: &MetricOptions) -> Result<Metric> {
        Metric::new(NAMESPACE, metric_name)
            .with_dimension(TABLE_NAME_DIMENSION, self.table_name.as_str())
            .with(options)
    }

    pub fn metric_consumed_read_capacity_units(&self, options: &MetricOptions) -> Result<Metric> {
        canned::consumed_read_capacity_units_sum(self.table_name).with(options)
    }

    pub fn metric_consumed_write_capacity_units(&self, options: &MetricOptions) -> Result<Metric> {
        canned::consumed_write_capacity_units_sum(self.table_name).with(options)
    }

    /// System errors for a single operation.
    ///
    /// The caller must pass an `Operation` dimension: the metric is only
    /// published per operation.
    pub fn metric_system_errors(&self, options: &MetricOptions) -> Result<Metric> {
        if required_operation(options).is_none() {
            return Err(DynaformError::Validation(
                "'Operation' dimension must be passed for the 'SystemErrors' metric.".to_owned(),
            ));
        }

        let mut dimensions = self.table_dimensions();
        dimensions.extend(options.dimensions.clone().unwrap_or_default());

        let options = options
            .clone()
            .or_statistic(Statistic::Sum)
            .with_dimensions(dimensions);
        self.metric("SystemErrors", &options)
    }

    /// User errors across every table in the account and region.
    ///
    /// Rejects any dimension override: the metric is account-wide.
    pub fn metric_user_errors(&self, options: &MetricOptions) -> Result<Metric> {
        if options.dimensions.is_some() {
            return Err(DynaformError::Validation(
                "'dimensions' is not supported for the 'UserErrors' metric".to_owned(),
            ));
        }

        let options = options
            .clone()
            .or_statistic(Statistic::Sum)
            .with_dimensions(BTreeMap::new());
        self.metric("UserErrors", &options)
    }

    pub fn metric_conditional_check_failed_requests(&self, options: &MetricOptions) -> Result<Metric> {
        self.metric(
            "ConditionalCheckFailedRequests",
            &options.clone().or_statistic(Statistic::Sum),
        )
    }

    /// Throttled requests without an `Operation` dimension.
    ///
    /// `DynamoDB` does not publish this series; prefer
    /// [`Self::metric_throttled_requests_for_operations`].
    pub fn metric_throttled_requests(&self, options: &MetricOptions) -> Result<Metric> {
        self.metric(
            "ThrottledRequests",
            &options.clone().or_statistic(Statistic::Sum),
        )
    }

    /// Throttled requests for one operation, summed over five minutes.
    pub fn metric_throttled_requests_for_operation(
        &self,
        operation: Operation,
        options: &MetricOptions,
    ) -> Result<Metric> {
        canned::throttled_requests_sum(self.table_name, operation).with(options)
    }

    /// Successful request latency for a single operation.
    ///
    /// The caller must pass an `Operation` dimension; the resulting
    /// dimensions are always exactly `TableName` and `Operation`.
    pub fn metric_successful_request_latency(&self, options: &MetricOptions) -> Result<Metric> {
        let Some(operation) = required_operation(options) else {
            return Err(DynaformError::Validation(
                "'Operation' dimension must be passed for the 'SuccessfulRequestLatency' metric."
                    .to_owned(),
            ));
        };

        let mut dimensions = self.table_dimensions();
        dimensions.insert(OPERATION_DIMENSION.to_owned(), operation.to_owned());

        let options = options.clone().with_dimensions(dimensions);
        canned::successful_request_latency_average(self.table_name, operation).with(&options)
    }

    /// Throttled requests summed across operations.
    pub fn metric_throttled_requests_for_operations(
        &self,
        options: &OperationsMetricOptions,
    ) -> Result<MetricRef> {
        self.sum_metrics_for_operations(
            "ThrottledRequests",
            "Sum of throttled requests across all operations",
            options,
        )
    }

    /// System errors summed across operations.
    pub fn metric_system_errors_for_operations(
        &self,
        options: &OperationsMetricOptions,
    ) -> Result<MetricRef> {
        self.sum_metrics_for_operations(
            "SystemErrors",
            "Sum of errors across all operations",
            options,
        )
    }

    /// One metric per operation, combined into a `a + b + ...` expression.
    fn sum_metrics_for_operations(
        &self,
        metric_name: &str,
        expression_label: &str,
        options: &OperationsMetricOptions,
    ) -> Result<MetricRef> {
        if options.metric.dimension(OPERATION_DIMENSION).is_some() {
            return Err(DynaformError::Validation(
                "The Operation dimension is not supported. Use the 'operations' property."
                    .to_owned(),
            ));
        }

        let operations = options.operations.as_deref().unwrap_or(Operation::ALL);
        if operations.is_empty() {
            return Err(DynaformError::Validation(
                "'operations' must list at least one operation".to_owned(),
            ));
        }

        let leaf_options = options.metric.clone().or_statistic(Statistic::Sum);
        let values = self.create_metrics_for_operations(metric_name, operations, &leaf_options, None)?;

        let expression = values
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" + ");

        let label = options
            .metric
            .label
            .clone()
            .unwrap_or_else(|| expression_label.to_owned());

        let sum = MathExpression::new(MathExpressionProps {
            expression,
            using_metrics: values,
            label: Some(label),
            color: options.metric.color.clone(),
            period: options.metric.period,
        })?;
        Ok(sum.into())
    }

    /// Build one metric per operation, keyed by the alias `mapper` produces
    /// (lower-cased operation name by default).
    ///
    /// Aliases must start with an ASCII lowercase letter. Two operations
    /// mapping to the same alias keep only the later metric, at the earlier
    /// position.
    pub fn create_metrics_for_operations(
        &self,
        metric_name: &str,
        operations: &[Operation],
        options: &MetricOptions,
        mapper: Option<AliasMapper<'_>>,
    ) -> Result<IndexMap<String, Metric>> {
        if options.dimension(OPERATION_DIMENSION).is_some() {
            return Err(DynaformError::Validation(
                "Invalid properties. Operation dimension is not supported when calculating operational metrics"
                    .to_owned(),
            ));
        }

        debug!(
            table = %self.table_name,
            metric_name,
            operations = operations.len(),
            "building per-operation metrics"
        );

        let mut metrics = IndexMap::with_capacity(operations.len());
        for &operation in operations {
            let mut dimensions = self.table_dimensions();
            dimensions.insert(OPERATION_DIMENSION.to_owned(), operation.as_str().to_owned());
            dimensions.extend(options.dimensions.clone().unwrap_or_default());

            let metric = self.metric(metric_name, &options.clone().with_dimensions(dimensions))?;

            let alias = mapper.map_or_else(|| operation.default_alias(), |map| map(operation));
            if !alias.chars().next().is_some_and(|c| c.is_ascii_lowercase()) {
                return Err(DynaformError::InvariantViolation(format!(
                    "Mapper generated an illegal operation metric name: {alias}. Must start with a lowercase letter"
                )));
            }

            metrics.insert(alias, metric);
        }
        Ok(metrics)
    }

    fn table_dimensions(&self) -> BTreeMap<String, String> {
        BTreeMap::from([(
            TABLE_NAME_DIMENSION.to_owned(),
            self.table_name.as_str().to_owned(),
        )])
    }
}

/// The caller's `Operation` dimension, treating an empty value as absent.
fn required_operation(options: &MetricOptions) -> Option<&str> {
    options
        .dimension(OPERATION_DIMENSION)
        .filter(|operation| !operation.is_empty())
}
