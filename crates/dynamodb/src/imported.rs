use std::sync::Arc;

use dynaform_core::{Arn, Condition, DynaformError, Environment, Result, TableName};
use dynaform_iam::EncryptionKey;
use tracing::debug;

use crate::base::{TableBase, TableIdentity};

/// Attributes of a table defined outside this stack.
///
/// Exactly one of `table_arn` and `table_name` must be set.
#[derive(Debug, Clone, Default)]
pub struct TableAttributes {
    pub table_arn: Option<Arn>,
    pub table_name: Option<TableName>,
    pub table_stream_arn: Option<Arn>,
    pub encryption_key: Option<Arc<dyn EncryptionKey>>,
    pub global_indexes: Vec<String>,
    pub local_indexes: Vec<String>,
    /// Grant index permissions even though no index names are known.
    pub grant_index_permissions: bool,
}

impl TableAttributes {
    #[must_use]
    pub fn from_arn(table_arn: impl Into<Arn>) -> Self {
        Self {
            table_arn: Some(table_arn.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn from_name(table_name: impl Into<TableName>) -> Self {
        Self {
            table_name: Some(table_name.into()),
            ..Self::default()
        }
    }
}

/// Index presence of an imported table, fixed at import time.
#[derive(Debug, Clone, Copy)]
struct KnownIndexes(bool);

impl Condition for KnownIndexes {
    fn holds(&self) -> bool {
        self.0
    }
}

/// A reference to a table that already exists.
#[derive(Debug)]
pub struct ImportedTable {
    table_name: TableName,
    table_arn: Arn,
    table_stream_arn: Option<Arn>,
    encryption_key: Option<Arc<dyn EncryptionKey>>,
    has_index: Arc<KnownIndexes>,
}

impl ImportedTable {
    pub fn from_attributes(env: &Environment, attrs: TableAttributes) -> Result<Self> {
        let (table_name, table_arn) = match (attrs.table_name, attrs.table_arn) {
            (Some(_), Some(_)) => {
                return Err(DynaformError::Validation(
                    "only one of table_arn or table_name can be provided".to_owned(),
                ));
            }
            (None, None) => {
                return Err(DynaformError::Validation(
                    "one of table_name or table_arn is required".to_owned(),
                ));
            }
            (Some(name), None) => {
                let arn = env.format_arn("dynamodb", &format!("table/{name}"));
                (name, arn)
            }
            (None, Some(arn)) => (table_name_from_arn(&arn)?, arn),
        };

        let has_index = !attrs.global_indexes.is_empty()
            || !attrs.local_indexes.is_empty()
            || attrs.grant_index_permissions;

        debug!(table = %table_name, arn = %table_arn, has_index, "imported table");

        Ok(Self {
            table_name,
            table_arn,
            table_stream_arn: attrs.table_stream_arn,
            encryption_key: attrs.encryption_key,
            has_index: Arc::new(KnownIndexes(has_index)),
        })
    }

    pub fn from_table_name(env: &Environment, table_name: impl Into<TableName>) -> Result<Self> {
        Self::from_attributes(env, TableAttributes::from_name(table_name))
    }

    pub fn from_table_arn(env: &Environment, table_arn: impl Into<Arn>) -> Result<Self> {
        Self::from_attributes(env, TableAttributes::from_arn(table_arn))
    }
}

fn table_name_from_arn(arn: &Arn) -> Result<TableName> {
    let parts = arn.parse()?;
    match parts.resource_name {
        Some(name) if parts.resource == "table" && !name.is_empty() => Ok(TableName::new(name)),
        _ => Err(DynaformError::InvalidArn(format!(
            "'{arn}' is not a DynamoDB table ARN"
        ))),
    }
}

impl TableIdentity for ImportedTable {
    fn table_arn(&self) -> &Arn {
        &self.table_arn
    }

    fn table_name(&self) -> &TableName {
        &self.table_name
    }

    fn table_stream_arn(&self) -> Option<&Arn> {
        self.table_stream_arn.as_ref()
    }

    fn encryption_key(&self) -> Option<&dyn EncryptionKey> {
        self.encryption_key.as_deref()
    }

    fn regional_arns(&self) -> &[Arn] {
        &[]
    }

    fn node_path(&self) -> &str {
        self.table_name.as_str()
    }
}

impl TableBase for ImportedTable {
    fn has_index(&self) -> Arc<dyn Condition> {
        Arc::clone(&self.has_index) as Arc<dyn Condition>
    }
}
