use std::time::Duration;

use dynaform_cloudwatch::{MetricOptions, Statistic};
use dynaform_core::{DynaformError, Environment};
use dynaform_dynamodb::{Attribute, Operation, OperationsMetricOptions, Table, TableBase, TableProps};

fn table() -> Table {
    Table::new(
        &Environment::new("123456789012", "us-east-1"),
        TableProps::new("orders", Attribute::string("pk")),
    )
    .unwrap()
}

#[test]
fn metric_is_scoped_to_table() {
    let metric = table().metric("ReturnedItemCount", &MetricOptions::new()).unwrap();

    assert_eq!(metric.namespace, "AWS/DynamoDB");
    assert_eq!(metric.dimension("TableName"), Some("orders"));
    assert_eq!(metric.statistic, Statistic::Average);
    assert_eq!(metric.period, Duration::from_secs(300));
}

#[test]
fn caller_options_take_precedence() {
    let options = MetricOptions::new()
        .with_statistic("max")
        .with_period(Duration::from_secs(60))
        .with_label("capacity");

    let metric = table().metric_consumed_read_capacity_units(&options).unwrap();

    assert_eq!(metric.metric_name, "ConsumedReadCapacityUnits");
    assert_eq!(metric.statistic, Statistic::Maximum);
    assert_eq!(metric.period, Duration::from_secs(60));
    assert_eq!(metric.label.as_deref(), Some("capacity"));
}

#[test]
fn consumed_capacity_defaults_to_sum() {
    let table = table();
    let read = table.metric_consumed_read_capacity_units(&MetricOptions::new()).unwrap();
    let write = table.metric_consumed_write_capacity_units(&MetricOptions::new()).unwrap();

    assert_eq!(read.statistic, Statistic::Sum);
    assert_eq!(write.metric_name, "ConsumedWriteCapacityUnits");
    assert_eq!(write.statistic, Statistic::Sum);
}

#[test]
fn invalid_period_is_rejected() {
    let options = MetricOptions::new().with_period(Duration::from_secs(7));
    let err = table().metric("Anything", &options).unwrap_err();
    assert!(matches!(err, DynaformError::Validation(_)));
}

#[test]
fn system_errors_requires_operation_dimension() {
    let err = table().metric_system_errors(&MetricOptions::new()).unwrap_err();
    assert!(matches!(err, DynaformError::Validation(_)));
    assert_eq!(
        err.to_string(),
        "validation error: 'Operation' dimension must be passed for the 'SystemErrors' metric."
    );
}

#[test]
fn empty_operation_dimension_counts_as_missing() {
    let options = MetricOptions::new().with_dimension("Operation", "");

    let err = table().metric_system_errors(&options).unwrap_err();
    assert!(matches!(err, DynaformError::Validation(_)));

    let err = table()
        .metric_successful_request_latency(&options)
        .unwrap_err();
    assert!(matches!(err, DynaformError::Validation(_)));
}

#[test]
fn system_errors_with_operation_keeps_table_name() {
    let options = MetricOptions::new().with_dimension("Operation", "GetItem");

    let metric = table().metric_system_errors(&options).unwrap();

    assert_eq!(metric.metric_name, "SystemErrors");
    assert_eq!(metric.dimension("TableName"), Some("orders"));
    assert_eq!(metric.dimension("Operation"), Some("GetItem"));
    assert_eq!(metric.statistic, Statistic::Sum);
}

#[test]
fn user_errors_is_account_wide() {
    let metric = table().metric_user_errors(&MetricOptions::new()).unwrap();
    assert!(metric.dimensions.is_empty());
    assert_eq!(metric.statistic, Statistic::Sum);

    let scoped = MetricOptions::new().with_dimension("TableName", "orders");
    let err = table().metric_user_errors(&scoped).unwrap_err();
    assert!(matches!(err, DynaformError::Validation(_)));
}

#[test]
fn legacy_sum_metrics() {
    let table = table();

    let conditional = table
        .metric_conditional_check_failed_requests(&MetricOptions::new())
        .unwrap();
    assert_eq!(conditional.metric_name, "ConditionalCheckFailedRequests");
    assert_eq!(conditional.statistic, Statistic::Sum);

    let throttled = table.metric_throttled_requests(&MetricOptions::new()).unwrap();
    assert_eq!(throttled.metric_name, "ThrottledRequests");
    assert!(throttled.dimension("Operation").is_none());
}

#[test]
fn throttled_requests_for_single_operation() {
    let metric = table()
        .metric_throttled_requests_for_operation(Operation::PutItem, &MetricOptions::new())
        .unwrap();

    assert_eq!(metric.dimension("Operation"), Some("PutItem"));
    assert_eq!(metric.dimension("TableName"), Some("orders"));
    assert_eq!(metric.statistic, Statistic::Sum);
}

#[test]
fn successful_request_latency_forces_dimensions() {
    let err = table()
        .metric_successful_request_latency(&MetricOptions::new())
        .unwrap_err();
    assert!(matches!(err, DynaformError::Validation(_)));

    let options = MetricOptions::new()
        .with_dimension("Operation", "Query")
        .with_dimension("Extra", "ignored");
    let metric = table().metric_successful_request_latency(&options).unwrap();

    assert_eq!(metric.dimensions.len(), 2);
    assert_eq!(metric.dimension("Operation"), Some("Query"));
    assert_eq!(metric.statistic, Statistic::Average);
}

#[test]
fn system_errors_for_two_operations() {
    let options = OperationsMetricOptions::new()
        .with_operations([Operation::GetItem, Operation::PutItem]);

    let sum = table().metric_system_errors_for_operations(&options).unwrap();
    let expression = sum.as_expression().unwrap();

    assert_eq!(expression.expression(), "getitem + putitem");
    let aliases: Vec<&str> = expression.using_metrics().keys().map(String::as_str).collect();
    assert_eq!(aliases, ["getitem", "putitem"]);
    assert_eq!(expression.label(), Some("Sum of errors across all operations"));

    let get_item = &expression.using_metrics()["getitem"];
    assert_eq!(get_item.metric_name, "SystemErrors");
    assert_eq!(get_item.dimension("Operation"), Some("GetItem"));
    assert_eq!(get_item.dimension("TableName"), Some("orders"));
    assert_eq!(get_item.statistic, Statistic::Sum);
}

#[test]
fn throttled_requests_default_to_every_operation_in_order() {
    let sum = table()
        .metric_throttled_requests_for_operations(&OperationsMetricOptions::new())
        .unwrap();
    let expression = sum.as_expression().unwrap();

    let expected = Operation::ALL
        .iter()
        .map(|op| op.as_str().to_lowercase())
        .collect::<Vec<_>>()
        .join(" + ");
    assert_eq!(expression.expression(), expected);
    assert_eq!(expression.using_metrics().len(), Operation::ALL.len());
    assert!(expression.expression().starts_with("getitem + batchgetitem + scan"));
    assert_eq!(
        expression.label(),
        Some("Sum of throttled requests across all operations")
    );
}

#[test]
fn aggregate_carries_caller_overrides() {
    let options = OperationsMetricOptions::new()
        .with_operations([Operation::Query])
        .with_metric_options(
            MetricOptions::new()
                .with_color("#ff0000")
                .with_label("throttles")
                .with_period(Duration::from_secs(60))
                .with_statistic("Maximum")
                .with_dimension("Extra", "x"),
        );

    let sum = table().metric_throttled_requests_for_operations(&options).unwrap();
    let expression = sum.as_expression().unwrap();

    assert_eq!(expression.color(), Some("#ff0000"));
    assert_eq!(expression.label(), Some("throttles"));
    assert_eq!(expression.period(), Duration::from_secs(60));

    let query = &expression.using_metrics()["query"];
    assert_eq!(query.statistic, Statistic::Maximum);
    assert_eq!(query.dimension("Extra"), Some("x"));
    assert_eq!(query.dimension("Operation"), Some("Query"));
}

#[test]
fn aggregate_rejects_operation_dimension() {
    let options = OperationsMetricOptions::new()
        .with_metric_options(MetricOptions::new().with_dimension("Operation", "GetItem"));

    let err = table().metric_system_errors_for_operations(&options).unwrap_err();

    assert!(matches!(err, DynaformError::Validation(_)));
    assert!(err.to_string().contains("Use the 'operations' property"));
}

#[test]
fn aggregate_rejects_empty_operation_list() {
    let options = OperationsMetricOptions::new().with_operations(Vec::<Operation>::new());
    let err = table().metric_throttled_requests_for_operations(&options).unwrap_err();
    assert!(matches!(err, DynaformError::Validation(_)));
}

#[test]
fn mapper_must_produce_lowercase_aliases() {
    let table = table();
    let mapper = |op: Operation| op.as_str().to_owned();

    let err = table
        .metrics()
        .create_metrics_for_operations(
            "SystemErrors",
            &[Operation::GetItem],
            &MetricOptions::new(),
            Some(&mapper),
        )
        .unwrap_err();

    assert!(matches!(err, DynaformError::InvariantViolation(_)));
    assert_eq!(
        err.to_string(),
        "invariant violation: Mapper generated an illegal operation metric name: GetItem. Must start with a lowercase letter"
    );
}

#[test]
fn mapper_aliases_must_start_with_ascii_lowercase() {
    let table = table();
    let mapper = |_: Operation| "été".to_owned();

    let err = table
        .metrics()
        .create_metrics_for_operations(
            "SystemErrors",
            &[Operation::Query],
            &MetricOptions::new(),
            Some(&mapper),
        )
        .unwrap_err();

    assert!(matches!(err, DynaformError::InvariantViolation(_)));
}

#[test]
fn colliding_aliases_keep_the_last_metric() {
    let table = table();
    let mapper = |op: Operation| {
        if op == Operation::Query {
            "scan".to_owned()
        } else {
            op.default_alias()
        }
    };

    let metrics = table
        .metrics()
        .create_metrics_for_operations(
            "ThrottledRequests",
            &[Operation::Scan, Operation::GetItem, Operation::Query],
            &MetricOptions::new(),
            Some(&mapper),
        )
        .unwrap();

    let aliases: Vec<&str> = metrics.keys().map(String::as_str).collect();
    assert_eq!(aliases, ["scan", "getitem"]);
    assert_eq!(metrics["scan"].dimension("Operation"), Some("Query"));
}

#[test]
fn repeated_metric_calls_are_structurally_equal() {
    let table = table();
    let options = OperationsMetricOptions::new();

    assert_eq!(
        table.metric_system_errors_for_operations(&options).unwrap(),
        table.metric_system_errors_for_operations(&options).unwrap()
    );
    assert_eq!(
        table.metric_user_errors(&MetricOptions::new()).unwrap(),
        table.metric_user_errors(&MetricOptions::new()).unwrap()
    );
}
