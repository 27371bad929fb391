//! Key schema, index and encryption settings for table declarations.
//!
//! Attribute, projection, stream, billing and table-class enumerations are
//! the SDK's own types so declared values line up with what the service
//! accepts.

pub use aws_sdk_dynamodb::types::{
    BillingMode, KeyType, ProjectionType, ScalarAttributeType, StreamViewType, TableClass,
};
use dynaform_core::{DynaformError, Result};

pub const HASH_KEY_TYPE: &str = "HASH";
pub const RANGE_KEY_TYPE: &str = "RANGE";

/// Service limit on local secondary indexes per table.
pub const MAX_LOCAL_SECONDARY_INDEX_COUNT: usize = 5;

/// A key attribute of a table or index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub attribute_type: ScalarAttributeType,
}

impl Attribute {
    pub fn new(name: impl Into<String>, attribute_type: ScalarAttributeType) -> Self {
        Self {
            name: name.into(),
            attribute_type,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ScalarAttributeType::S)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, ScalarAttributeType::N)
    }
}

/// Settings shared by global and local secondary indexes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryIndexProps {
    pub index_name: String,
    /// Defaults to `ALL`.
    pub projection_type: Option<ProjectionType>,
    pub non_key_attributes: Vec<String>,
}

impl SecondaryIndexProps {
    pub fn new(index_name: impl Into<String>) -> Self {
        Self {
            index_name: index_name.into(),
            projection_type: None,
            non_key_attributes: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_projection(mut self, projection_type: ProjectionType, non_key_attributes: Vec<String>) -> Self {
        self.projection_type = Some(projection_type);
        self.non_key_attributes = non_key_attributes;
        self
    }

    pub(crate) fn resolved_projection(&self) -> Result<ProjectionType> {
        let projection = self.projection_type.clone().unwrap_or(ProjectionType::All);
        match (&projection, self.non_key_attributes.is_empty()) {
            (ProjectionType::Include, true) => Err(DynaformError::Validation(format!(
                "index '{}' uses INCLUDE projection but lists no non-key attributes",
                self.index_name
            ))),
            (ProjectionType::Include, false) | (_, true) => Ok(projection),
            (_, false) => Err(DynaformError::Validation(format!(
                "non-key attributes should not be specified when not using INCLUDE projection type (index '{}')",
                self.index_name
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalSecondaryIndexProps {
    pub index: SecondaryIndexProps,
    pub partition_key: Attribute,
    pub sort_key: Option<Attribute>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalSecondaryIndexProps {
    pub index: SecondaryIndexProps,
    pub sort_key: Attribute,
}

/// Server-side encryption mode for a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableEncryption {
    /// KMS key owned by AWS.
    #[default]
    Default,
    /// A customer managed KMS key, supplied with the table.
    CustomerManaged,
    /// The AWS managed `aws/dynamodb` key.
    AwsManaged,
}

impl TableEncryption {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "AWS_OWNED",
            Self::CustomerManaged => "CUSTOMER_MANAGED",
            Self::AwsManaged => "AWS_MANAGED",
        }
    }
}

impl std::str::FromStr for TableEncryption {
    type Err = DynaformError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "AWS_OWNED" | "DEFAULT" => Ok(Self::Default),
            "CUSTOMER_MANAGED" => Ok(Self::CustomerManaged),
            "AWS_MANAGED" => Ok(Self::AwsManaged),
            other => Err(DynaformError::Validation(format!(
                "unknown table encryption '{other}'"
            ))),
        }
    }
}

/// Parse one of the SDK's string enumerations, rejecting values the SDK
/// does not know about.
pub fn parse_sdk_enum<T>(what: &str, value: &str, known: &[&str]) -> Result<T>
where
    T: for<'s> From<&'s str>,
{
    if known.contains(&value) {
        Ok(T::from(value))
    } else {
        Err(DynaformError::Validation(format!(
            "unknown {what} '{value}', expected one of: {}",
            known.join(", ")
        )))
    }
}

pub fn parse_attribute_type(value: &str) -> Result<ScalarAttributeType> {
    parse_sdk_enum("attribute type", value, ScalarAttributeType::values())
}

pub fn parse_projection_type(value: &str) -> Result<ProjectionType> {
    parse_sdk_enum("projection type", value, ProjectionType::values())
}

pub fn parse_stream_view_type(value: &str) -> Result<StreamViewType> {
    parse_sdk_enum("stream view type", value, StreamViewType::values())
}

pub fn parse_billing_mode(value: &str) -> Result<BillingMode> {
    parse_sdk_enum("billing mode", value, BillingMode::values())
}

pub fn parse_table_class(value: &str) -> Result<TableClass> {
    parse_sdk_enum("table class", value, TableClass::values())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_type_constants_match_sdk() {
        assert_eq!(KeyType::Hash.as_str(), HASH_KEY_TYPE);
        assert_eq!(KeyType::Range.as_str(), RANGE_KEY_TYPE);
    }

    #[test]
    fn parse_known_sdk_values() {
        assert_eq!(parse_attribute_type("S").unwrap(), ScalarAttributeType::S);
        assert_eq!(
            parse_stream_view_type("NEW_AND_OLD_IMAGES").unwrap(),
            StreamViewType::NewAndOldImages
        );
        assert_eq!(
            parse_billing_mode("PAY_PER_REQUEST").unwrap(),
            BillingMode::PayPerRequest
        );
        assert_eq!(
            parse_projection_type("KEYS_ONLY").unwrap(),
            ProjectionType::KeysOnly
        );
        assert_eq!(parse_table_class("STANDARD").unwrap(), TableClass::Standard);
    }

    #[test]
    fn parse_rejects_unknown_values() {
        let err = parse_attribute_type("X").unwrap_err();
        assert!(matches!(err, DynaformError::Validation(_)));
        assert!(err.to_string().contains("attribute type"));
    }

    #[test]
    fn projection_rules() {
        assert_eq!(
            SecondaryIndexProps::new("gsi").resolved_projection().unwrap(),
            ProjectionType::All
        );
        let include = SecondaryIndexProps::new("gsi")
            .with_projection(ProjectionType::Include, vec!["status".into()]);
        assert_eq!(include.resolved_projection().unwrap(), ProjectionType::Include);

        let empty_include =
            SecondaryIndexProps::new("gsi").with_projection(ProjectionType::Include, vec![]);
        assert!(empty_include.resolved_projection().is_err());

        let stray = SecondaryIndexProps::new("gsi")
            .with_projection(ProjectionType::KeysOnly, vec!["status".into()]);
        assert!(stray.resolved_projection().is_err());
    }

    #[test]
    fn encryption_names() {
        assert_eq!(TableEncryption::default().as_str(), "AWS_OWNED");
        assert_eq!(
            "CUSTOMER_MANAGED".parse::<TableEncryption>().unwrap(),
            TableEncryption::CustomerManaged
        );
        assert!("BOGUS".parse::<TableEncryption>().is_err());
    }
}
