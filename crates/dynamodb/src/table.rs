use std::sync::{Arc, PoisonError, RwLock};

use dynaform_core::{Arn, Condition, DynaformError, Environment, Result, TableName};
use dynaform_iam::EncryptionKey;
use tracing::{debug, info};

use crate::base::{TableBase, TableIdentity};
use crate::schema::{
    Attribute, BillingMode, GlobalSecondaryIndexProps, LocalSecondaryIndexProps,
    MAX_LOCAL_SECONDARY_INDEX_COUNT, ProjectionType, StreamViewType, TableClass, TableEncryption,
};

/// A secondary index registered on a [`Table`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecondaryIndex {
    Global {
        props: GlobalSecondaryIndexProps,
        projection: ProjectionType,
    },
    Local {
        props: LocalSecondaryIndexProps,
        projection: ProjectionType,
    },
}

impl SecondaryIndex {
    #[must_use]
    pub fn index_name(&self) -> &str {
        match self {
            Self::Global { props, .. } => &props.index.index_name,
            Self::Local { props, .. } => &props.index.index_name,
        }
    }

    #[must_use]
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local { .. })
    }
}

/// Secondary indexes of a table, shared with the deferred index ARNs its
/// grants produce.
#[derive(Debug, Default)]
pub struct IndexRegistry {
    indexes: RwLock<Vec<SecondaryIndex>>,
}

impl IndexRegistry {
    fn push(&self, index: SecondaryIndex) {
        self.indexes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(index);
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<SecondaryIndex> {
        self.indexes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn contains(&self, index_name: &str) -> bool {
        self.indexes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|index| index.index_name() == index_name)
    }

    fn local_count(&self) -> usize {
        self.indexes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|index| index.is_local())
            .count()
    }
}

impl Condition for IndexRegistry {
    fn holds(&self) -> bool {
        !self
            .indexes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}

/// Properties of a new table.
#[derive(Debug)]
pub struct TableProps {
    pub table_name: TableName,
    pub partition_key: Attribute,
    pub sort_key: Option<Attribute>,
    /// When set, the table has a stream with this view type.
    pub stream: Option<StreamViewType>,
    pub encryption: Option<TableEncryption>,
    /// Required with, and only allowed with, customer managed encryption.
    pub encryption_key: Option<Arc<dyn EncryptionKey>>,
    pub billing_mode: Option<BillingMode>,
    pub table_class: Option<TableClass>,
    /// Regions the table is replicated to, excluding its own.
    pub replication_regions: Vec<String>,
}

impl TableProps {
    pub fn new(table_name: impl Into<TableName>, partition_key: Attribute) -> Self {
        Self {
            table_name: table_name.into(),
            partition_key,
            sort_key: None,
            stream: None,
            encryption: None,
            encryption_key: None,
            billing_mode: None,
            table_class: None,
            replication_regions: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_sort_key(mut self, sort_key: Attribute) -> Self {
        self.sort_key = Some(sort_key);
        self
    }

    #[must_use]
    pub fn with_stream(mut self, view_type: StreamViewType) -> Self {
        self.stream = Some(view_type);
        self
    }

    /// Encrypt with a customer managed key.
    #[must_use]
    pub fn with_encryption_key(mut self, key: Arc<dyn EncryptionKey>) -> Self {
        self.encryption = Some(TableEncryption::CustomerManaged);
        self.encryption_key = Some(key);
        self
    }

    #[must_use]
    pub fn with_encryption(mut self, encryption: TableEncryption) -> Self {
        self.encryption = Some(encryption);
        self
    }

    #[must_use]
    pub fn with_replication_regions<I, S>(mut self, regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.replication_regions = regions.into_iter().map(Into::into).collect();
        self
    }
}

/// A table declared in this stack.
#[derive(Debug)]
pub struct Table {
    table_name: TableName,
    table_arn: Arn,
    table_stream_arn: Option<Arn>,
    stream: Option<StreamViewType>,
    encryption: TableEncryption,
    encryption_key: Option<Arc<dyn EncryptionKey>>,
    billing_mode: BillingMode,
    table_class: Option<TableClass>,
    partition_key: Attribute,
    sort_key: Option<Attribute>,
    attribute_definitions: Vec<Attribute>,
    regional_arns: Vec<Arn>,
    indexes: Arc<IndexRegistry>,
    env: Environment,
}

impl Table {
    pub fn new(env: &Environment, props: TableProps) -> Result<Self> {
        let encryption = resolve_encryption(&props)?;

        let table_arn = env.format_arn("dynamodb", &format!("table/{}", props.table_name));
        let table_stream_arn = props.stream.as_ref().map(|_| table_arn.join("/stream/*"));

        let mut table = Self {
            table_name: props.table_name,
            table_arn,
            table_stream_arn,
            stream: props.stream,
            encryption,
            encryption_key: props.encryption_key,
            billing_mode: props.billing_mode.unwrap_or(BillingMode::PayPerRequest),
            table_class: props.table_class,
            partition_key: props.partition_key.clone(),
            sort_key: props.sort_key.clone(),
            attribute_definitions: Vec::new(),
            regional_arns: Vec::new(),
            indexes: Arc::new(IndexRegistry::default()),
            env: env.clone(),
        };

        table.register_attribute(&props.partition_key)?;
        if let Some(sort_key) = &props.sort_key {
            table.register_attribute(sort_key)?;
        }

        if !props.replication_regions.is_empty() {
            if table.stream.as_ref().is_some_and(|view| *view != StreamViewType::NewAndOldImages) {
                return Err(DynaformError::Validation(
                    "`stream` must be set to `NEW_AND_OLD_IMAGES` when specifying `replication_regions`"
                        .to_owned(),
                ));
            }
            if table.stream.is_none() {
                table.stream = Some(StreamViewType::NewAndOldImages);
                table.table_stream_arn = Some(table.table_arn.join("/stream/*"));
            }
            for region in &props.replication_regions {
                table.add_replica_region(region)?;
            }
        }

        info!(
            table = %table.table_name,
            arn = %table.table_arn,
            stream = table.table_stream_arn.is_some(),
            encrypted = table.encryption_key.is_some(),
            replicas = table.regional_arns.len(),
            "declared table"
        );
        Ok(table)
    }

    /// Add a global secondary index. Grants issued before this call still
    /// cover it once rendered.
    pub fn add_global_secondary_index(&mut self, props: GlobalSecondaryIndexProps) -> Result<()> {
        self.require_unique_index_name(&props.index.index_name)?;
        let projection = props.index.resolved_projection()?;

        self.register_attribute(&props.partition_key)?;
        if let Some(sort_key) = &props.sort_key {
            self.register_attribute(sort_key)?;
        }

        debug!(table = %self.table_name, index = %props.index.index_name, "adding global secondary index");
        self.indexes.push(SecondaryIndex::Global { props, projection });
        Ok(())
    }

    /// Add a local secondary index. The table must have a sort key, and at
    /// most five local indexes are allowed.
    pub fn add_local_secondary_index(&mut self, props: LocalSecondaryIndexProps) -> Result<()> {
        if self.sort_key.is_none() {
            return Err(DynaformError::Validation(format!(
                "a sort key of the table must be specified to add local secondary index '{}'",
                props.index.index_name
            )));
        }
        if self.indexes.local_count() >= MAX_LOCAL_SECONDARY_INDEX_COUNT {
            return Err(DynaformError::Validation(format!(
                "a maximum number of local secondary index per table is {MAX_LOCAL_SECONDARY_INDEX_COUNT}"
            )));
        }
        self.require_unique_index_name(&props.index.index_name)?;
        let projection = props.index.resolved_projection()?;
        self.register_attribute(&props.sort_key)?;

        debug!(table = %self.table_name, index = %props.index.index_name, "adding local secondary index");
        self.indexes.push(SecondaryIndex::Local { props, projection });
        Ok(())
    }

    /// Register a replica in another region and record its table ARN.
    pub fn add_replica_region(&mut self, region: &str) -> Result<()> {
        if region == self.env.region {
            return Err(DynaformError::Validation(format!(
                "`replication_regions` cannot include the region where this table is deployed ({region})"
            )));
        }
        let arn = self.env.format_arn_in_region(
            "dynamodb",
            region,
            &format!("table/{}", self.table_name),
        );
        if self.regional_arns.contains(&arn) {
            return Err(DynaformError::Validation(format!(
                "region '{region}' is already a replica of table {}",
                self.table_name
            )));
        }
        self.add_regional_arn(arn);
        Ok(())
    }

    /// Append a regional ARN the table's grants should also cover.
    pub fn add_regional_arn(&mut self, arn: impl Into<Arn>) {
        self.regional_arns.push(arn.into());
    }

    #[must_use]
    pub fn secondary_indexes(&self) -> Vec<SecondaryIndex> {
        self.indexes.snapshot()
    }

    #[must_use]
    pub fn partition_key(&self) -> &Attribute {
        &self.partition_key
    }

    #[must_use]
    pub fn sort_key(&self) -> Option<&Attribute> {
        self.sort_key.as_ref()
    }

    #[must_use]
    pub fn attribute_definitions(&self) -> &[Attribute] {
        &self.attribute_definitions
    }

    #[must_use]
    pub fn stream(&self) -> Option<&StreamViewType> {
        self.stream.as_ref()
    }

    #[must_use]
    pub fn encryption(&self) -> TableEncryption {
        self.encryption
    }

    #[must_use]
    pub fn billing_mode(&self) -> &BillingMode {
        &self.billing_mode
    }

    #[must_use]
    pub fn table_class(&self) -> Option<&TableClass> {
        self.table_class.as_ref()
    }

    fn register_attribute(&mut self, attribute: &Attribute) -> Result<()> {
        let existing = self
            .attribute_definitions
            .iter()
            .find(|existing| existing.name == attribute.name)
            .map(|existing| existing.attribute_type.clone());

        match existing {
            Some(defined) if defined != attribute.attribute_type => {
                Err(DynaformError::Validation(format!(
                    "unable to specify {} as {} because it was already defined as {}",
                    attribute.name,
                    attribute.attribute_type.as_str(),
                    defined.as_str()
                )))
            }
            Some(_) => Ok(()),
            None => {
                self.attribute_definitions.push(attribute.clone());
                Ok(())
            }
        }
    }

    fn require_unique_index_name(&self, index_name: &str) -> Result<()> {
        if self.indexes.contains(index_name) {
            return Err(DynaformError::Validation(format!(
                "a duplicate index name, {index_name}, is not allowed"
            )));
        }
        Ok(())
    }
}

fn resolve_encryption(props: &TableProps) -> Result<TableEncryption> {
    let encryption = props.encryption.unwrap_or(if props.encryption_key.is_some() {
        TableEncryption::CustomerManaged
    } else {
        TableEncryption::Default
    });

    match (encryption, props.encryption_key.is_some()) {
        (TableEncryption::CustomerManaged, false) => Err(DynaformError::Validation(
            "a customer managed encryption key must be supplied with `TableEncryption::CustomerManaged`"
                .to_owned(),
        )),
        (TableEncryption::Default | TableEncryption::AwsManaged, true) => {
            Err(DynaformError::Validation(format!(
                "`encryption_key` cannot be specified unless encryption is set to CUSTOMER_MANAGED (it was set to {})",
                encryption.as_str()
            )))
        }
        _ => Ok(encryption),
    }
}

impl TableIdentity for Table {
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
        &self.regional_arns
    }

    fn node_path(&self) -> &str {
        self.table_name.as_str()
    }
}

impl TableBase for Table {
    fn has_index(&self) -> Arc<dyn Condition> {
        Arc::clone(&self.indexes) as Arc<dyn Condition>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SecondaryIndexProps;
    use dynaform_iam::Key;

    fn env() -> Environment {
        Environment::new("123456789012", "us-east-1")
    }

    fn orders() -> TableProps {
        TableProps::new("orders", Attribute::string("pk"))
    }

    fn gsi(name: &str) -> GlobalSecondaryIndexProps {
        GlobalSecondaryIndexProps {
            index: SecondaryIndexProps::new(name),
            partition_key: Attribute::string("status"),
            sort_key: None,
        }
    }

    fn lsi(name: &str) -> LocalSecondaryIndexProps {
        LocalSecondaryIndexProps {
            index: SecondaryIndexProps::new(name),
            sort_key: Attribute::number(format!("{name}_sk")),
        }
    }

    #[test]
    fn arns_derive_from_environment() {
        let table = Table::new(&env(), orders().with_stream(StreamViewType::NewImage)).unwrap();
        assert_eq!(
            table.table_arn().as_str(),
            "arn:aws:dynamodb:us-east-1:123456789012:table/orders"
        );
        assert_eq!(
            table.table_stream_arn().map(Arn::as_str),
            Some("arn:aws:dynamodb:us-east-1:123456789012:table/orders/stream/*")
        );
        assert_eq!(table.node_path(), "orders");
    }

    #[test]
    fn no_stream_by_default() {
        let table = Table::new(&env(), orders()).unwrap();
        assert!(table.table_stream_arn().is_none());
        assert_eq!(table.billing_mode(), &BillingMode::PayPerRequest);
    }

    #[test]
    fn replicas_add_regional_arns_in_order() {
        let table = Table::new(
            &env(),
            orders().with_replication_regions(["eu-west-1", "ap-southeast-2"]),
        )
        .unwrap();
        let regional: Vec<&str> = table.regional_arns().iter().map(Arn::as_str).collect();
        assert_eq!(
            regional,
            vec![
                "arn:aws:dynamodb:eu-west-1:123456789012:table/orders",
                "arn:aws:dynamodb:ap-southeast-2:123456789012:table/orders",
            ]
        );
        assert_eq!(table.stream(), Some(&StreamViewType::NewAndOldImages));
    }

    #[test]
    fn replica_in_own_region_is_rejected() {
        let err = Table::new(&env(), orders().with_replication_regions(["us-east-1"])).unwrap_err();
        assert!(matches!(err, DynaformError::Validation(_)));
    }

    #[test]
    fn replicas_require_new_and_old_images() {
        let err = Table::new(
            &env(),
            orders()
                .with_stream(StreamViewType::KeysOnly)
                .with_replication_regions(["eu-west-1"]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("NEW_AND_OLD_IMAGES"));
    }

    #[test]
    fn customer_managed_requires_key() {
        let err = Table::new(&env(), orders().with_encryption(TableEncryption::CustomerManaged))
            .unwrap_err();
        assert!(matches!(err, DynaformError::Validation(_)));
    }

    #[test]
    fn key_only_allowed_with_customer_managed() {
        let key: Arc<dyn EncryptionKey> =
            Arc::new(Key::from_key_arn("arn:aws:kms:us-east-1:123456789012:key/k"));
        let err = Table::new(
            &env(),
            orders()
                .with_encryption_key(key)
                .with_encryption(TableEncryption::AwsManaged),
        )
        .unwrap_err();
        assert!(err.to_string().contains("AWS_MANAGED"));
    }

    #[test]
    fn key_implies_customer_managed() {
        let key: Arc<dyn EncryptionKey> =
            Arc::new(Key::from_key_arn("arn:aws:kms:us-east-1:123456789012:key/k"));
        let table = Table::new(&env(), orders().with_encryption_key(key)).unwrap();
        assert_eq!(table.encryption(), TableEncryption::CustomerManaged);
        assert!(table.encryption_key().is_some());
    }

    #[test]
    fn index_registry_tracks_additions() {
        let mut table = Table::new(&env(), orders()).unwrap();
        let has_index = table.has_index();
        assert!(!has_index.holds());

        table.add_global_secondary_index(gsi("by-status")).unwrap();
        assert!(has_index.holds());
        assert_eq!(table.secondary_indexes().len(), 1);
    }

    #[test]
    fn duplicate_index_name_is_rejected() {
        let mut table = Table::new(&env(), orders()).unwrap();
        table.add_global_secondary_index(gsi("by-status")).unwrap();
        let err = table.add_global_secondary_index(gsi("by-status")).unwrap_err();
        assert!(err.to_string().contains("duplicate index name"));
    }

    #[test]
    fn local_index_requires_sort_key() {
        let mut table = Table::new(&env(), orders()).unwrap();
        let err = table.add_local_secondary_index(lsi("lsi")).unwrap_err();
        assert!(matches!(err, DynaformError::Validation(_)));
    }

    #[test]
    fn local_indexes_are_capped() {
        let mut table =
            Table::new(&env(), orders().with_sort_key(Attribute::string("sk"))).unwrap();
        for i in 0..MAX_LOCAL_SECONDARY_INDEX_COUNT {
            table.add_local_secondary_index(lsi(&format!("lsi{i}"))).unwrap();
        }
        let err = table.add_local_secondary_index(lsi("one-too-many")).unwrap_err();
        assert!(err.to_string().contains("maximum"));
    }

    #[test]
    fn conflicting_attribute_types_are_rejected() {
        let mut table = Table::new(&env(), orders()).unwrap();
        let props = GlobalSecondaryIndexProps {
            index: SecondaryIndexProps::new("by-pk"),
            partition_key: Attribute::number("pk"),
            sort_key: None,
        };
        let err = table.add_global_secondary_index(props).unwrap_err();
        assert!(err.to_string().contains("already defined as S"));
    }

    #[test]
    fn include_projection_needs_attributes() {
        let mut table = Table::new(&env(), orders()).unwrap();
        let mut props = gsi("by-status");
        props.index = props.index.with_projection(ProjectionType::Include, Vec::new());
        assert!(table.add_global_secondary_index(props).is_err());
        assert!(table.secondary_indexes().is_empty());
    }
}
