use std::path::{Path, PathBuf};

use dynaform_core::{DynaformError, Environment};
use dynaform_dynamodb::Operation;
use serde::Deserialize;
use thiserror::Error;

/// Errors raised while loading or applying a stack declaration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("role '{0}' is declared more than once")]
    DuplicateRole(String),

    #[error("grant on table '{table}' references unknown role '{role}'")]
    UnknownRole { table: String, role: String },

    #[error("{kind} on table '{table}' requires `{field}`")]
    MissingField {
        table: String,
        kind: &'static str,
        field: &'static str,
    },

    #[error("table '{table}': {source}")]
    Table {
        table: String,
        #[source]
        source: DynaformError,
    },
}

/// Top-level stack declaration, loaded from a TOML file.
#[derive(Debug, Deserialize)]
pub struct StackConfig {
    /// Account, region and partition every resource is declared in.
    pub environment: Environment,
    #[serde(default)]
    pub roles: Vec<RoleConfig>,
    #[serde(default)]
    pub tables: Vec<TableConfig>,
    #[serde(default)]
    pub imported_tables: Vec<ImportedTableConfig>,
}

/// A role grants are attached to.
///
/// # Example
///
/// ```toml
/// [[roles]]
/// name = "reader"
///
/// [[roles]]
/// name = "legacy"
/// arn = "arn:aws:iam::123456789012:role/legacy"
/// mutable = false
/// ```
#[derive(Debug, Deserialize)]
pub struct RoleConfig {
    pub name: String,
    /// ARN of an existing role. Roles without one are declared in the
    /// stack's account.
    pub arn: Option<String>,
    /// Whether grants may modify an existing role's policy.
    #[serde(default = "default_mutable")]
    pub mutable: bool,
}

fn default_mutable() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeyAttributeConfig {
    pub name: String,
    /// `S`, `N` or `B`.
    #[serde(rename = "type")]
    pub attribute_type: String,
}

#[derive(Debug, Deserialize)]
pub struct TableConfig {
    pub name: String,
    pub partition_key: KeyAttributeConfig,
    pub sort_key: Option<KeyAttributeConfig>,
    /// Stream view type, e.g. `NEW_AND_OLD_IMAGES`.
    pub stream: Option<String>,
    /// `AWS_OWNED`, `AWS_MANAGED` or `CUSTOMER_MANAGED`.
    pub encryption: Option<String>,
    pub encryption_key_arn: Option<String>,
    pub billing_mode: Option<String>,
    pub table_class: Option<String>,
    #[serde(default)]
    pub replication_regions: Vec<String>,
    #[serde(default)]
    pub global_indexes: Vec<GlobalIndexConfig>,
    #[serde(default)]
    pub local_indexes: Vec<LocalIndexConfig>,
    #[serde(default)]
    pub grants: Vec<GrantConfig>,
    #[serde(default)]
    pub metrics: Vec<MetricConfig>,
}

#[derive(Debug, Deserialize)]
pub struct GlobalIndexConfig {
    pub name: String,
    pub partition_key: KeyAttributeConfig,
    pub sort_key: Option<KeyAttributeConfig>,
    pub projection: Option<String>,
    #[serde(default)]
    pub non_key_attributes: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct LocalIndexConfig {
    pub name: String,
    pub sort_key: KeyAttributeConfig,
    pub projection: Option<String>,
    #[serde(default)]
    pub non_key_attributes: Vec<String>,
}

/// A table that already exists. Exactly one of `table_arn` and
/// `table_name` must be set.
#[derive(Debug, Deserialize)]
pub struct ImportedTableConfig {
    pub table_arn: Option<String>,
    pub table_name: Option<String>,
    pub table_stream_arn: Option<String>,
    pub encryption_key_arn: Option<String>,
    #[serde(default)]
    pub global_indexes: Vec<String>,
    #[serde(default)]
    pub local_indexes: Vec<String>,
    #[serde(default)]
    pub grant_index_permissions: bool,
    #[serde(default)]
    pub grants: Vec<GrantConfig>,
    #[serde(default)]
    pub metrics: Vec<MetricConfig>,
}

impl ImportedTableConfig {
    /// Name used in diagnostics before the table is built.
    pub fn display_name(&self) -> &str {
        self.table_name
            .as_deref()
            .or(self.table_arn.as_deref())
            .unwrap_or("<unnamed>")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantKind {
    Grant,
    Stream,
    ReadData,
    WriteData,
    ReadWriteData,
    FullAccess,
    TableListStreams,
    StreamRead,
}

impl GrantKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Grant => "grant",
            Self::Stream => "stream",
            Self::ReadData => "read_data",
            Self::WriteData => "write_data",
            Self::ReadWriteData => "read_write_data",
            Self::FullAccess => "full_access",
            Self::TableListStreams => "table_list_streams",
            Self::StreamRead => "stream_read",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GrantConfig {
    pub role: String,
    pub kind: GrantKind,
    /// Only used by `grant` and `stream`.
    #[serde(default)]
    pub actions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Metric,
    ConsumedReadCapacityUnits,
    ConsumedWriteCapacityUnits,
    SystemErrors,
    UserErrors,
    ConditionalCheckFailedRequests,
    ThrottledRequests,
    ThrottledRequestsForOperation,
    SuccessfulRequestLatency,
    ThrottledRequestsForOperations,
    SystemErrorsForOperations,
}

impl MetricKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::ConsumedReadCapacityUnits => "consumed_read_capacity_units",
            Self::ConsumedWriteCapacityUnits => "consumed_write_capacity_units",
            Self::SystemErrors => "system_errors",
            Self::UserErrors => "user_errors",
            Self::ConditionalCheckFailedRequests => "conditional_check_failed_requests",
            Self::ThrottledRequests => "throttled_requests",
            Self::ThrottledRequestsForOperation => "throttled_requests_for_operation",
            Self::SuccessfulRequestLatency => "successful_request_latency",
            Self::ThrottledRequestsForOperations => "throttled_requests_for_operations",
            Self::SystemErrorsForOperations => "system_errors_for_operations",
        }
    }
}

/// A metric to build for a table.
///
/// # Example
///
/// ```toml
/// [[tables.metrics]]
/// kind = "system_errors_for_operations"
/// operations = ["GetItem", "PutItem"]
/// period_seconds = 60
/// ```
#[derive(Debug, Deserialize)]
pub struct MetricConfig {
    pub kind: MetricKind,
    /// Metric name, for `kind = "metric"`.
    pub name: Option<String>,
    /// Single operation, for the per-operation kinds.
    pub operation: Option<Operation>,
    /// Operations to aggregate. Defaults to every operation.
    pub operations: Option<Vec<Operation>>,
    pub period_seconds: Option<u64>,
    pub statistic: Option<String>,
    pub label: Option<String>,
    pub color: Option<String>,
}

/// Read and parse a stack declaration.
pub fn load(path: &Path) -> Result<StackConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
