use serde::Serialize;

use crate::OutputFormat;
use crate::stack::Stack;

#[derive(Debug, Serialize)]
pub struct Summary {
    pub partition: String,
    pub account: String,
    pub region: String,
    pub roles: usize,
    pub tables: usize,
    pub grants: usize,
    /// Grants whose statement no principal accepted.
    pub unattached_grants: Vec<String>,
    pub metrics: usize,
}

pub fn summarize(stack: &Stack) -> Summary {
    let env = stack.environment();
    Summary {
        partition: env.partition.clone(),
        account: env.account.clone(),
        region: env.region.clone(),
        roles: stack.roles().count(),
        tables: stack.tables().count(),
        grants: stack.grants().len(),
        unattached_grants: stack
            .grants()
            .iter()
            .filter(|record| !record.grant.success())
            .map(|record| {
                format!(
                    "{kind} on {table} for {role}",
                    kind = record.kind.as_str(),
                    table = record.table,
                    role = record.role
                )
            })
            .collect(),
        metrics: stack.metrics().len(),
    }
}

pub fn run(stack: &Stack, format: &OutputFormat) -> anyhow::Result<()> {
    let summary = summarize(stack);
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        OutputFormat::Text => {
            println!(
                "Stack {partition}/{account}/{region} is valid.",
                partition = summary.partition,
                account = summary.account,
                region = summary.region
            );
            println!(
                "  {} roles, {} tables, {} grants, {} metrics",
                summary.roles, summary.tables, summary.grants, summary.metrics
            );
            for grant in &summary.unattached_grants {
                println!("  not attached: {grant}");
            }
        }
    }
    Ok(())
}
