use dynaform_cloudwatch::MetricRef;

use crate::OutputFormat;
use crate::stack::{MetricRecord, Stack};

fn describe(record: &MetricRecord) -> String {
    match &record.metric {
        MetricRef::Metric(metric) => {
            let dimensions = metric
                .dimensions
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join(",");
            format!(
                "{table} {kind}: {namespace}/{name} {statistic} {period}s [{dimensions}]",
                table = record.table,
                kind = record.kind,
                namespace = metric.namespace,
                name = metric.metric_name,
                statistic = metric.statistic,
                period = metric.period.as_secs(),
            )
        }
        MetricRef::Expression(expression) => format!(
            "{table} {kind}: {text} ({count} metrics, {label})",
            table = record.table,
            kind = record.kind,
            text = expression.expression(),
            count = expression.using_metrics().len(),
            label = expression.label().unwrap_or("unlabelled"),
        ),
    }
}

pub fn run(stack: &Stack, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(stack.metrics())?);
        }
        OutputFormat::Text => {
            println!("{} metrics:", stack.metrics().len());
            for record in stack.metrics() {
                println!("  {}", describe(record));
            }
        }
    }
    Ok(())
}
