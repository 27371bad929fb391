//! Builds the resources of a stack declaration and applies its grants.

use std::sync::Arc;
use std::time::Duration;

use dynaform_cloudwatch::{MetricOptions, MetricRef, Statistic};
use dynaform_core::{Arn, DynaformError, Environment, TableName};
use dynaform_dynamodb::schema::{
    parse_attribute_type, parse_billing_mode, parse_projection_type, parse_stream_view_type,
    parse_table_class,
};
use dynaform_dynamodb::{
    Attribute, GlobalSecondaryIndexProps, ImportedTable, LocalSecondaryIndexProps,
    OperationsMetricOptions, SecondaryIndexProps, Table, TableAttributes, TableBase,
    TableEncryption, TableIdentity, TableProps,
};
use dynaform_iam::{EncryptionKey, Grant, Grantable, ImportedRole, Key, PolicyDocument, Principal, Role};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{
    ConfigError, GlobalIndexConfig, GrantConfig, GrantKind, ImportedTableConfig,
    KeyAttributeConfig, LocalIndexConfig, MetricConfig, MetricKind, RoleConfig, StackConfig,
    TableConfig,
};

/// A role declared in the stack or imported by ARN.
#[derive(Debug)]
pub enum StackRole {
    Declared(Role),
    Imported(ImportedRole),
}

impl StackRole {
    fn from_config(env: &Environment, config: &RoleConfig) -> Self {
        match &config.arn {
            Some(arn) => Self::Imported(ImportedRole::from_role_arn(arn.as_str(), config.mutable)),
            None => {
                let arn = env.format_arn_in_region("iam", "", &format!("role/{}", config.name));
                Self::Declared(Role::new(config.name.as_str(), arn))
            }
        }
    }

    pub fn arn(&self) -> &Arn {
        match self {
            Self::Declared(role) => role.principal_arn(),
            Self::Imported(role) => role.principal_arn(),
        }
    }

    pub fn policy_document(&self) -> PolicyDocument {
        match self {
            Self::Declared(role) => role.policy_document(),
            Self::Imported(role) => role.policy_document(),
        }
    }
}

impl Grantable for StackRole {
    fn grant_principal(&self) -> Option<&dyn Principal> {
        match self {
            Self::Declared(role) => role.grant_principal(),
            Self::Imported(role) => role.grant_principal(),
        }
    }
}

/// A grant applied while building the stack.
#[derive(Debug)]
pub struct GrantRecord {
    pub table: String,
    pub role: String,
    pub kind: GrantKind,
    pub grant: Grant,
}

/// A metric built for one of the stack's tables.
#[derive(Debug, Serialize)]
pub struct MetricRecord {
    pub table: String,
    pub kind: &'static str,
    pub metric: MetricRef,
}

/// Every resource of a declaration, built and wired together.
pub struct Stack {
    environment: Environment,
    roles: IndexMap<String, StackRole>,
    tables: Vec<(String, Box<dyn TableBase>)>,
    grants: Vec<GrantRecord>,
    metrics: Vec<MetricRecord>,
}

impl Stack {
    pub fn build(config: &StackConfig) -> Result<Self, ConfigError> {
        let environment = config.environment.clone();

        let mut roles = IndexMap::with_capacity(config.roles.len());
        for role in &config.roles {
            if roles.contains_key(&role.name) {
                return Err(ConfigError::DuplicateRole(role.name.clone()));
            }
            roles.insert(role.name.clone(), StackRole::from_config(&environment, role));
        }

        let mut stack = Self {
            environment,
            roles,
            tables: Vec::new(),
            grants: Vec::new(),
            metrics: Vec::new(),
        };

        for table in &config.tables {
            stack.add_table(table)?;
        }
        for table in &config.imported_tables {
            stack.add_imported_table(table)?;
        }

        info!(
            roles = stack.roles.len(),
            tables = stack.tables.len(),
            grants = stack.grants.len(),
            metrics = stack.metrics.len(),
            "stack built"
        );
        Ok(stack)
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn roles(&self) -> impl Iterator<Item = (&str, &StackRole)> {
        self.roles.iter().map(|(name, role)| (name.as_str(), role))
    }

    pub fn tables(&self) -> impl Iterator<Item = (&str, &dyn TableBase)> {
        self.tables
            .iter()
            .map(|(name, table)| (name.as_str(), table.as_ref()))
    }

    pub fn grants(&self) -> &[GrantRecord] {
        &self.grants
    }

    pub fn metrics(&self) -> &[MetricRecord] {
        &self.metrics
    }

    fn add_table(&mut self, config: &TableConfig) -> Result<(), ConfigError> {
        let name = config.name.clone();
        let table_error = |source: DynaformError| ConfigError::Table {
            table: name.clone(),
            source,
        };

        let mut table = Table::new(&self.environment, table_props(config).map_err(table_error)?)
            .map_err(table_error)?;

        // Indexes are added after the grants; the index wildcards those
        // grants carry resolve when policies are rendered.
        for grant in &config.grants {
            self.apply_grant(&name, &table, grant)?;
        }
        for index in &config.global_indexes {
            table
                .add_global_secondary_index(global_index(index).map_err(table_error)?)
                .map_err(table_error)?;
        }
        for index in &config.local_indexes {
            table
                .add_local_secondary_index(local_index(index).map_err(table_error)?)
                .map_err(table_error)?;
        }

        for metric in &config.metrics {
            self.add_metric(&name, &table, metric)?;
        }

        self.tables.push((name, Box::new(table)));
        Ok(())
    }

    fn add_imported_table(&mut self, config: &ImportedTableConfig) -> Result<(), ConfigError> {
        let attrs = TableAttributes {
            table_arn: config.table_arn.as_deref().map(Arn::from),
            table_name: config.table_name.as_deref().map(TableName::from),
            table_stream_arn: config.table_stream_arn.as_deref().map(Arn::from),
            encryption_key: config.encryption_key_arn.as_deref().map(customer_key),
            global_indexes: config.global_indexes.clone(),
            local_indexes: config.local_indexes.clone(),
            grant_index_permissions: config.grant_index_permissions,
        };
        let table = ImportedTable::from_attributes(&self.environment, attrs).map_err(|source| {
            ConfigError::Table {
                table: config.display_name().to_owned(),
                source,
            }
        })?;
        let name = table.table_name().to_string();

        for grant in &config.grants {
            self.apply_grant(&name, &table, grant)?;
        }
        for metric in &config.metrics {
            self.add_metric(&name, &table, metric)?;
        }

        self.tables.push((name, Box::new(table)));
        Ok(())
    }

    fn apply_grant(
        &mut self,
        table_name: &str,
        table: &dyn TableBase,
        config: &GrantConfig,
    ) -> Result<(), ConfigError> {
        let role = self
            .roles
            .get(&config.role)
            .ok_or_else(|| ConfigError::UnknownRole {
                table: table_name.to_owned(),
                role: config.role.clone(),
            })?;

        let actions: Vec<&str> = config.actions.iter().map(String::as_str).collect();
        if matches!(config.kind, GrantKind::Grant | GrantKind::Stream) && actions.is_empty() {
            return Err(ConfigError::MissingField {
                table: table_name.to_owned(),
                kind: config.kind.as_str(),
                field: "actions",
            });
        }

        let grant = match config.kind {
            GrantKind::Grant => table.grant(role, &actions),
            GrantKind::Stream => table.grant_stream(role, &actions),
            GrantKind::ReadData => table.grant_read_data(role),
            GrantKind::WriteData => table.grant_write_data(role),
            GrantKind::ReadWriteData => table.grant_read_write_data(role),
            GrantKind::FullAccess => table.grant_full_access(role),
            GrantKind::TableListStreams => Ok(table.grant_table_list_streams(role)),
            GrantKind::StreamRead => table.grant_stream_read(role),
        }
        .map_err(|source| ConfigError::Table {
            table: table_name.to_owned(),
            source,
        })?;

        if grant.success() {
            debug!(table = table_name, role = %config.role, kind = config.kind.as_str(), "grant applied");
        } else {
            warn!(
                table = table_name,
                role = %config.role,
                kind = config.kind.as_str(),
                "grant was not attached to the role policy"
            );
        }

        self.grants.push(GrantRecord {
            table: table_name.to_owned(),
            role: config.role.clone(),
            kind: config.kind,
            grant,
        });
        Ok(())
    }

    fn add_metric(
        &mut self,
        table_name: &str,
        table: &dyn TableBase,
        config: &MetricConfig,
    ) -> Result<(), ConfigError> {
        let metric = build_metric(table_name, table, config)?;
        self.metrics.push(MetricRecord {
            table: table_name.to_owned(),
            kind: config.kind.as_str(),
            metric,
        });
        Ok(())
    }
}

fn customer_key(arn: &str) -> Arc<dyn EncryptionKey> {
    Arc::new(Key::from_key_arn(arn))
}

fn attribute(config: &KeyAttributeConfig) -> dynaform_core::Result<Attribute> {
    Ok(Attribute::new(
        config.name.as_str(),
        parse_attribute_type(&config.attribute_type)?,
    ))
}

fn table_props(config: &TableConfig) -> dynaform_core::Result<TableProps> {
    let mut props = TableProps::new(config.name.as_str(), attribute(&config.partition_key)?)
        .with_replication_regions(config.replication_regions.iter().cloned());

    if let Some(sort_key) = &config.sort_key {
        props = props.with_sort_key(attribute(sort_key)?);
    }
    if let Some(stream) = &config.stream {
        props = props.with_stream(parse_stream_view_type(stream)?);
    }
    if let Some(arn) = &config.encryption_key_arn {
        props = props.with_encryption_key(customer_key(arn));
    }
    if let Some(encryption) = &config.encryption {
        props = props.with_encryption(encryption.parse::<TableEncryption>()?);
    }
    props.billing_mode = config.billing_mode.as_deref().map(parse_billing_mode).transpose()?;
    props.table_class = config.table_class.as_deref().map(parse_table_class).transpose()?;
    Ok(props)
}

fn index_props(
    name: &str,
    projection: Option<&str>,
    non_key_attributes: &[String],
) -> dynaform_core::Result<SecondaryIndexProps> {
    let index = SecondaryIndexProps::new(name);
    Ok(match projection {
        Some(projection) => {
            index.with_projection(parse_projection_type(projection)?, non_key_attributes.to_vec())
        }
        None => SecondaryIndexProps {
            non_key_attributes: non_key_attributes.to_vec(),
            ..index
        },
    })
}

fn global_index(config: &GlobalIndexConfig) -> dynaform_core::Result<GlobalSecondaryIndexProps> {
    Ok(GlobalSecondaryIndexProps {
        index: index_props(
            &config.name,
            config.projection.as_deref(),
            &config.non_key_attributes,
        )?,
        partition_key: attribute(&config.partition_key)?,
        sort_key: config.sort_key.as_ref().map(attribute).transpose()?,
    })
}

fn local_index(config: &LocalIndexConfig) -> dynaform_core::Result<LocalSecondaryIndexProps> {
    Ok(LocalSecondaryIndexProps {
        index: index_props(
            &config.name,
            config.projection.as_deref(),
            &config.non_key_attributes,
        )?,
        sort_key: attribute(&config.sort_key)?,
    })
}

fn metric_options(config: &MetricConfig) -> MetricOptions {
    MetricOptions {
        statistic: config.statistic.as_deref().map(Statistic::from),
        period: config.period_seconds.map(Duration::from_secs),
        label: config.label.clone(),
        color: config.color.clone(),
        ..MetricOptions::default()
    }
}

fn build_metric(
    table_name: &str,
    table: &dyn TableBase,
    config: &MetricConfig,
) -> Result<MetricRef, ConfigError> {
    let missing = |field: &'static str| ConfigError::MissingField {
        table: table_name.to_owned(),
        kind: config.kind.as_str(),
        field,
    };
    let options = metric_options(config);
    let with_operation = || {
        config
            .operation
            .map(|op| options.clone().with_dimension("Operation", op.as_str()))
            .ok_or_else(|| missing("operation"))
    };
    let aggregate = || OperationsMetricOptions {
        operations: config.operations.clone(),
        metric: options.clone(),
    };

    let metric = match config.kind {
        MetricKind::Metric => {
            let name = config.name.as_deref().ok_or_else(|| missing("name"))?;
            table.metric(name, &options).map(MetricRef::from)
        }
        MetricKind::ConsumedReadCapacityUnits => table
            .metric_consumed_read_capacity_units(&options)
            .map(MetricRef::from),
        MetricKind::ConsumedWriteCapacityUnits => table
            .metric_consumed_write_capacity_units(&options)
            .map(MetricRef::from),
        MetricKind::SystemErrors => table
            .metric_system_errors(&with_operation()?)
            .map(MetricRef::from),
        MetricKind::UserErrors => table.metric_user_errors(&options).map(MetricRef::from),
        MetricKind::ConditionalCheckFailedRequests => table
            .metric_conditional_check_failed_requests(&options)
            .map(MetricRef::from),
        MetricKind::ThrottledRequests => table
            .metric_throttled_requests(&options)
            .map(MetricRef::from),
        MetricKind::ThrottledRequestsForOperation => {
            let operation = config.operation.ok_or_else(|| missing("operation"))?;
            table
                .metric_throttled_requests_for_operation(operation, &options)
                .map(MetricRef::from)
        }
        MetricKind::SuccessfulRequestLatency => table
            .metric_successful_request_latency(&with_operation()?)
            .map(MetricRef::from),
        MetricKind::ThrottledRequestsForOperations => {
            table.metric_throttled_requests_for_operations(&aggregate())
        }
        MetricKind::SystemErrorsForOperations => {
            table.metric_system_errors_for_operations(&aggregate())
        }
    };

    metric.map_err(|source| ConfigError::Table {
        table: table_name.to_owned(),
        source,
    })
}
