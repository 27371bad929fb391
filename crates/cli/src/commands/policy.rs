use dynaform_core::render_values;
use serde_json::{Map, Value, json};

use crate::OutputFormat;
use crate::stack::Stack;

/// Every role's ARN and rendered identity policy, keyed by role name.
pub fn render(stack: &Stack) -> Value {
    let roles: Map<String, Value> = stack
        .roles()
        .map(|(name, role)| {
            (
                name.to_owned(),
                json!({
                    "arn": role.arn(),
                    "policy": role.policy_document(),
                }),
            )
        })
        .collect();
    json!({ "roles": roles })
}

pub fn run(stack: &Stack, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&render(stack))?);
        }
        OutputFormat::Text => {
            for (name, role) in stack.roles() {
                let policy = role.policy_document();
                println!(
                    "{name} ({arn}): {count} statements",
                    arn = role.arn(),
                    count = policy.statements.len()
                );
                for statement in &policy.statements {
                    println!(
                        "  {actions}\n    on {resources}",
                        actions = statement.actions.join(", "),
                        resources = render_values(&statement.resources).join(", ")
                    );
                }
            }
        }
    }
    Ok(())
}
