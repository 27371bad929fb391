//! Behaviour shared by every table-like resource.
//!
//! A resource only has to describe its identity ([`TableIdentity`]) and
//! how to decide, at render time, whether it has a secondary index
//! ([`TableBase::has_index`]). Grants and metrics come for free.

use std::sync::Arc;

use dynaform_cloudwatch::{Metric, MetricOptions, MetricRef};
use dynaform_core::{Arn, Condition, Result, TableName};
use dynaform_iam::{EncryptionKey, Grant, Grantable};

use crate::grants::GrantComposer;
use crate::metrics::{OperationMetrics, OperationsMetricOptions};
use crate::operation::Operation;

/// Identity fields a table exposes to the grant composer.
pub trait TableIdentity {
    fn table_arn(&self) -> &Arn;

    fn table_name(&self) -> &TableName;

    /// `None` when the table has no stream configured.
    fn table_stream_arn(&self) -> Option<&Arn>;

    fn encryption_key(&self) -> Option<&dyn EncryptionKey>;

    /// ARNs of the table's replicas in other regions, in declaration order.
    fn regional_arns(&self) -> &[Arn];

    /// Path used to scope grants and in error messages.
    fn node_path(&self) -> &str;
}

/// Grant and metric operations for a table-like resource.
pub trait TableBase: TableIdentity {
    /// Render-time predicate: does this table have at least one secondary
    /// index?
    fn has_index(&self) -> Arc<dyn Condition>;

    fn metrics(&self) -> OperationMetrics<'_> {
        OperationMetrics::new(self.table_name())
    }

    /// Adds an IAM policy statement for the given actions to the grantee,
    /// covering this table, its replicas and their indexes.
    fn grant(&self, grantee: &dyn Grantable, actions: &[&str]) -> Result<Grant> {
        composer(self).grant(grantee, actions)
    }

    fn grant_stream(&self, grantee: &dyn Grantable, actions: &[&str]) -> Result<Grant> {
        composer(self).grant_stream(grantee, actions)
    }

    fn grant_read_data(&self, grantee: &dyn Grantable) -> Result<Grant> {
        composer(self).grant_read_data(grantee)
    }

    fn grant_write_data(&self, grantee: &dyn Grantable) -> Result<Grant> {
        composer(self).grant_write_data(grantee)
    }

    fn grant_read_write_data(&self, grantee: &dyn Grantable) -> Result<Grant> {
        composer(self).grant_read_write_data(grantee)
    }

    fn grant_full_access(&self, grantee: &dyn Grantable) -> Result<Grant> {
        composer(self).grant_full_access(grantee)
    }

    fn grant_table_list_streams(&self, grantee: &dyn Grantable) -> Grant {
        composer(self).grant_table_list_streams(grantee)
    }

    fn grant_stream_read(&self, grantee: &dyn Grantable) -> Result<Grant> {
        composer(self).grant_stream_read(grantee)
    }

    fn metric(&self, metric_name: &str, options: &MetricOptions) -> Result<Metric> {
        self.metrics().metric(metric_name, options)
    }

    fn metric_consumed_read_capacity_units(&self, options: &MetricOptions) -> Result<Metric> {
        self.metrics().metric_consumed_read_capacity_units(options)
    }

    fn metric_consumed_write_capacity_units(&self, options: &MetricOptions) -> Result<Metric> {
        self.metrics().metric_consumed_write_capacity_units(options)
    }

    fn metric_system_errors(&self, options: &MetricOptions) -> Result<Metric> {
        self.metrics().metric_system_errors(options)
    }

    fn metric_user_errors(&self, options: &MetricOptions) -> Result<Metric> {
        self.metrics().metric_user_errors(options)
    }

    fn metric_conditional_check_failed_requests(&self, options: &MetricOptions) -> Result<Metric> {
        self.metrics().metric_conditional_check_failed_requests(options)
    }

    fn metric_throttled_requests(&self, options: &MetricOptions) -> Result<Metric> {
        self.metrics().metric_throttled_requests(options)
    }

    fn metric_throttled_requests_for_operation(
        &self,
        operation: Operation,
        options: &MetricOptions,
    ) -> Result<Metric> {
        self.metrics()
            .metric_throttled_requests_for_operation(operation, options)
    }

    fn metric_successful_request_latency(&self, options: &MetricOptions) -> Result<Metric> {
        self.metrics().metric_successful_request_latency(options)
    }

    fn metric_throttled_requests_for_operations(
        &self,
        options: &OperationsMetricOptions,
    ) -> Result<MetricRef> {
        self.metrics()
            .metric_throttled_requests_for_operations(options)
    }

    fn metric_system_errors_for_operations(
        &self,
        options: &OperationsMetricOptions,
    ) -> Result<MetricRef> {
        self.metrics().metric_system_errors_for_operations(options)
    }
}

fn composer<T: TableBase + ?Sized>(table: &T) -> GrantComposer<'_, T> {
    GrantComposer::new(table, table.has_index())
}
