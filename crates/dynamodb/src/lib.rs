//! `DynamoDB` tables for dynaform.
//!
//! [`Table`] and [`ImportedTable`] share their grant and metric operations
//! through [`TableBase`]. Grants cover the table, its replicas and (when
//! the table ends up with any secondary index) their `/index/*` wildcards;
//! metrics are scoped to the table and can be aggregated per
//! [`Operation`].

pub mod base;
pub mod canned;
pub mod grants;
pub mod imported;
pub mod metrics;
pub mod operation;
pub mod perms;
pub mod schema;
pub mod table;

pub use base::{TableBase, TableIdentity};
pub use grants::{CombinedGrantOptions, GrantComposer, INDEX_WILDCARD_SUFFIX};
pub use imported::{ImportedTable, TableAttributes};
pub use metrics::{AliasMapper, OperationMetrics, OperationsMetricOptions};
pub use operation::Operation;
pub use schema::{
    Attribute, GlobalSecondaryIndexProps, LocalSecondaryIndexProps, SecondaryIndexProps,
    TableEncryption,
};
pub use table::{IndexRegistry, SecondaryIndex, Table, TableProps};
