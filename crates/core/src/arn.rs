use serde::{Deserialize, Serialize};

use crate::error::{DynaformError, Result};
use crate::types::Arn;

/// The parts of a parsed ARN.
///
/// Format: `arn:{partition}:{service}:{region}:{account}:{resource}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArnComponents {
    pub partition: String,
    pub service: String,
    pub region: String,
    pub account: String,
    /// Resource type, e.g. `table` in `table/orders`.
    pub resource: String,
    /// Resource name, e.g. `orders` in `table/orders`.
    pub resource_name: Option<String>,
}

impl Arn {
    /// Split this ARN into its components.
    ///
    /// The resource part is split on the first `/` (or `:` when no `/` is
    /// present) into a resource type and an optional resource name.
    pub fn parse(&self) -> Result<ArnComponents> {
        let parts: Vec<&str> = self.as_str().splitn(6, ':').collect();
        let [prefix, partition, service, region, account, rest] = parts.as_slice() else {
            return Err(DynaformError::InvalidArn(format!(
                "expected 6 components in '{self}'"
            )));
        };
        if *prefix != "arn" {
            return Err(DynaformError::InvalidArn(format!(
                "'{self}' must start with 'arn:'"
            )));
        }
        if partition.is_empty() || service.is_empty() || rest.is_empty() {
            return Err(DynaformError::InvalidArn(format!(
                "partition, service and resource are required in '{self}'"
            )));
        }

        let (resource, resource_name) = match rest.split_once('/').or_else(|| rest.split_once(':')) {
            Some((kind, name)) => (kind.to_owned(), Some(name.to_owned())),
            None => ((*rest).to_owned(), None),
        };

        Ok(ArnComponents {
            partition: (*partition).to_owned(),
            service: (*service).to_owned(),
            region: (*region).to_owned(),
            account: (*account).to_owned(),
            resource,
            resource_name,
        })
    }

    /// The segment after the resource type, e.g. `orders` in
    /// `arn:aws:dynamodb:us-east-1:123456789012:table/orders`.
    pub fn resource_name(&self) -> Result<String> {
        self.parse()?
            .resource_name
            .ok_or_else(|| DynaformError::InvalidArn(format!("'{self}' has no resource name")))
    }

    /// Append a path suffix, e.g. `/index/*`.
    #[must_use]
    pub fn join(&self, suffix: &str) -> Arn {
        Arn::new(format!("{self}{suffix}"))
    }
}

/// The account, region and partition resources are declared in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub account: String,
    pub region: String,
    #[serde(default = "default_partition")]
    pub partition: String,
}

fn default_partition() -> String {
    "aws".to_owned()
}

impl Environment {
    /// Create an environment in the standard `aws` partition.
    pub fn new(account: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            region: region.into(),
            partition: default_partition(),
        }
    }

    /// Use a different partition (e.g. `aws-cn`).
    #[must_use]
    pub fn with_partition(mut self, partition: impl Into<String>) -> Self {
        self.partition = partition.into();
        self
    }

    /// Format an ARN for a resource in this environment's region.
    #[must_use]
    pub fn format_arn(&self, service: &str, resource: &str) -> Arn {
        self.format_arn_in_region(service, &self.region, resource)
    }

    /// Format an ARN for a resource in another region of the same account.
    #[must_use]
    pub fn format_arn_in_region(&self, service: &str, region: &str, resource: &str) -> Arn {
        Arn::new(format!(
            "arn:{}:{service}:{region}:{}:{resource}",
            self.partition, self.account
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_table_arn() {
        let arn = Arn::new("arn:aws:dynamodb:us-east-1:123456789012:table/orders");
        let parts = arn.parse().unwrap();
        assert_eq!(parts.partition, "aws");
        assert_eq!(parts.service, "dynamodb");
        assert_eq!(parts.region, "us-east-1");
        assert_eq!(parts.account, "123456789012");
        assert_eq!(parts.resource, "table");
        assert_eq!(parts.resource_name.as_deref(), Some("orders"));
    }

    #[test]
    fn parse_keeps_nested_resource_path() {
        let arn = Arn::new("arn:aws:dynamodb:us-east-1:123456789012:table/orders/stream/2024");
        let parts = arn.parse().unwrap();
        assert_eq!(parts.resource_name.as_deref(), Some("orders/stream/2024"));
    }

    #[test]
    fn parse_colon_separated_resource() {
        let arn = Arn::new("arn:aws:logs:us-east-1:123456789012:log-group:app");
        let parts = arn.parse().unwrap();
        assert_eq!(parts.resource, "log-group");
        assert_eq!(parts.resource_name.as_deref(), Some("app"));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!(
            Arn::new("orders").parse(),
            Err(DynaformError::InvalidArn(_))
        ));
        assert!(matches!(
            Arn::new("urn:aws:dynamodb:us-east-1:1:table/x").parse(),
            Err(DynaformError::InvalidArn(_))
        ));
    }

    #[test]
    fn format_arn_uses_environment() {
        let env = Environment::new("123456789012", "eu-west-1");
        assert_eq!(
            env.format_arn("dynamodb", "table/orders").as_str(),
            "arn:aws:dynamodb:eu-west-1:123456789012:table/orders"
        );
        assert_eq!(
            env.format_arn_in_region("dynamodb", "us-east-2", "table/orders")
                .as_str(),
            "arn:aws:dynamodb:us-east-2:123456789012:table/orders"
        );
    }

    #[test]
    fn environment_partition_defaults_to_aws() {
        let env: Environment =
            serde_json::from_str(r#"{"account":"1","region":"cn-north-1"}"#).unwrap();
        assert_eq!(env.partition, "aws");

        let env = env.with_partition("aws-cn");
        assert!(env.format_arn("kms", "key/k").starts_with("arn:aws-cn:kms:"));
    }

    #[test]
    fn resource_name_follows_resource_type() {
        let arn = Arn::new("arn:aws:iam::123456789012:role/reader");
        assert_eq!(arn.resource_name().unwrap(), "reader");
        assert!(matches!(
            Arn::new("arn:aws:s3:::bucket").resource_name(),
            Err(DynaformError::InvalidArn(_))
        ));
    }

    #[test]
    fn join_appends_suffix() {
        let arn = Arn::new("arn:aws:dynamodb:us-east-1:1:table/t");
        assert_eq!(arn.join("/index/*").as_str(), "arn:aws:dynamodb:us-east-1:1:table/t/index/*");
    }
}
