use std::fmt;
use std::str::FromStr;

use dynaform_core::DynaformError;
use serde::{Deserialize, Serialize};

/// Table API operations reported in the `Operation` metric dimension.
///
/// Declaration order matters: [`Operation::ALL`] follows it, and aggregate
/// metrics emit their expression terms in that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    GetItem,
    BatchGetItem,
    Scan,
    Query,
    GetRecords,
    PutItem,
    DeleteItem,
    UpdateItem,
    BatchWriteItem,
    TransactWriteItems,
    TransactGetItems,
    ExecuteTransaction,
    BatchExecuteStatement,
    ExecuteStatement,
}

impl Operation {
    /// Every operation, in declaration order.
    pub const ALL: &'static [Operation] = &[
        Self::GetItem,
        Self::BatchGetItem,
        Self::Scan,
        Self::Query,
        Self::GetRecords,
        Self::PutItem,
        Self::DeleteItem,
        Self::UpdateItem,
        Self::BatchWriteItem,
        Self::TransactWriteItems,
        Self::TransactGetItems,
        Self::ExecuteTransaction,
        Self::BatchExecuteStatement,
        Self::ExecuteStatement,
    ];

    /// The dimension value CloudWatch uses for this operation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GetItem => "GetItem",
            Self::BatchGetItem => "BatchGetItem",
            Self::Scan => "Scan",
            Self::Query => "Query",
            Self::GetRecords => "GetRecords",
            Self::PutItem => "PutItem",
            Self::DeleteItem => "DeleteItem",
            Self::UpdateItem => "UpdateItem",
            Self::BatchWriteItem => "BatchWriteItem",
            Self::TransactWriteItems => "TransactWriteItems",
            Self::TransactGetItems => "TransactGetItems",
            Self::ExecuteTransaction => "ExecuteTransaction",
            Self::BatchExecuteStatement => "BatchExecuteStatement",
            Self::ExecuteStatement => "ExecuteStatement",
        }
    }

    /// Default expression variable name: the lower-cased operation name.
    #[must_use]
    pub fn default_alias(self) -> String {
        self.as_str().to_lowercase()
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = DynaformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| DynaformError::Validation(format!("unknown DynamoDB operation '{s}'")))
    }
}
