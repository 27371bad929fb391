use dynaform_core::{ResourceValue, render_values};
use serde::{Serialize, Serializer};
use serde_json::{Value, json};

/// IAM policy language version emitted for every document.
pub const POLICY_VERSION: &str = "2012-10-17";

/// Whether a statement allows or denies its actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Effect {
    #[default]
    Allow,
    Deny,
}

impl Effect {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "Allow",
            Self::Deny => "Deny",
        }
    }
}

/// A single policy statement.
///
/// Resources may contain deferred values; they are only resolved when the
/// statement is rendered. Serializing a statement renders it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PolicyStatement {
    pub sid: Option<String>,
    pub effect: Effect,
    pub actions: Vec<String>,
    pub resources: Vec<ResourceValue>,
}

impl PolicyStatement {
    /// An `Allow` statement for the given actions and resources.
    pub fn allow<A, R>(actions: A, resources: R) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        R: IntoIterator<Item = ResourceValue>,
    {
        Self {
            sid: None,
            effect: Effect::Allow,
            actions: actions.into_iter().map(Into::into).collect(),
            resources: resources.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn with_sid(mut self, sid: impl Into<String>) -> Self {
        self.sid = Some(sid.into());
        self
    }

    /// Render to IAM JSON, resolving deferred resources.
    #[must_use]
    pub fn render(&self) -> Value {
        let mut statement = json!({
            "Effect": self.effect.as_str(),
            "Action": self.actions,
            "Resource": render_values(&self.resources),
        });
        if let (Some(sid), Some(obj)) = (&self.sid, statement.as_object_mut()) {
            obj.insert("Sid".to_owned(), Value::String(sid.clone()));
        }
        statement
    }
}

/// An identity policy attached to a principal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PolicyDocument {
    pub statements: Vec<PolicyStatement>,
}

impl PolicyDocument {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_statement(&mut self, statement: PolicyStatement) {
        self.statements.push(statement);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Render the whole document, resolving every deferred resource.
    #[must_use]
    pub fn render(&self) -> Value {
        let statements: Vec<Value> = self.statements.iter().map(PolicyStatement::render).collect();
        json!({
            "Version": POLICY_VERSION,
            "Statement": statements,
        })
    }
}

impl Serialize for PolicyStatement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.render().serialize(serializer)
    }
}

impl Serialize for PolicyDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.render().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use dynaform_core::{Condition, Lazy};

    use super::*;

    struct Never;

    impl Condition for Never {
        fn holds(&self) -> bool {
            false
        }
    }

    #[test]
    fn render_statement() {
        let stmt = PolicyStatement::allow(
            ["dynamodb:GetItem"],
            [ResourceValue::from("arn:aws:dynamodb:us-east-1:1:table/t")],
        );
        assert_eq!(
            stmt.render(),
            json!({
                "Effect": "Allow",
                "Action": ["dynamodb:GetItem"],
                "Resource": ["arn:aws:dynamodb:us-east-1:1:table/t"],
            })
        );
    }

    #[test]
    fn render_drops_unresolved_resources() {
        let stmt = PolicyStatement::allow(
            ["dynamodb:Query"],
            [
                ResourceValue::from("arn:t"),
                Lazy::string_if("arn:t/index/*", Arc::new(Never)).into(),
            ],
        )
        .with_sid("ReadOrders");
        let rendered = stmt.render();
        assert_eq!(rendered["Resource"], json!(["arn:t"]));
        assert_eq!(rendered["Sid"], json!("ReadOrders"));
    }

    #[test]
    fn render_document() {
        let mut doc = PolicyDocument::new();
        assert!(doc.is_empty());
        doc.add_statement(PolicyStatement::allow(["s3:GetObject"], [ResourceValue::from("*")]));
        let rendered = doc.render();
        assert_eq!(rendered["Version"], json!(POLICY_VERSION));
        assert_eq!(rendered["Statement"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn serializing_matches_rendered_form() {
        let mut doc = PolicyDocument::new();
        doc.add_statement(PolicyStatement::allow(
            ["dynamodb:Query"],
            [
                ResourceValue::from("arn:t"),
                Lazy::string_if("arn:t/index/*", Arc::new(Never)).into(),
            ],
        ));

        let json = serde_json::to_value(&doc).unwrap();

        assert_eq!(json, doc.render());
        assert_eq!(
            json["Statement"][0],
            json!({
                "Effect": "Allow",
                "Action": ["dynamodb:Query"],
                "Resource": ["arn:t"],
            })
        );
    }
}
