//! Baseline definitions for the metrics `DynamoDB` publishes per table.

use dynaform_cloudwatch::{Metric, Statistic};
use dynaform_core::TableName;

use crate::operation::Operation;

pub const NAMESPACE: &str = "AWS/DynamoDB";
pub const TABLE_NAME_DIMENSION: &str = "TableName";
pub const OPERATION_DIMENSION: &str = "Operation";

fn table_metric(metric_name: &str, table_name: &TableName) -> Metric {
    Metric::new(NAMESPACE, metric_name).with_dimension(TABLE_NAME_DIMENSION, table_name.as_str())
}

pub fn consumed_read_capacity_units_sum(table_name: &TableName) -> Metric {
    table_metric("ConsumedReadCapacityUnits", table_name).with_statistic(Statistic::Sum)
}

pub fn consumed_write_capacity_units_sum(table_name: &TableName) -> Metric {
    table_metric("ConsumedWriteCapacityUnits", table_name).with_statistic(Statistic::Sum)
}

pub fn throttled_requests_sum(table_name: &TableName, operation: Operation) -> Metric {
    table_metric("ThrottledRequests", table_name)
        .with_dimension(OPERATION_DIMENSION, operation.as_str())
        .with_statistic(Statistic::Sum)
}

pub fn successful_request_latency_average(table_name: &TableName, operation: &str) -> Metric {
    table_metric("SuccessfulRequestLatency", table_name)
        .with_dimension(OPERATION_DIMENSION, operation)
        .with_statistic(Statistic::Average)
}
