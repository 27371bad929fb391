use std::fmt;

use dynaform_core::{Arn, ResourceValue};

use crate::grant::{Grant, GrantOnPrincipalOptions};
use crate::principal::Grantable;

/// A KMS key that can grant principals access to itself.
pub trait EncryptionKey: Send + Sync + fmt::Debug {
    fn key_arn(&self) -> &Arn;

    /// Grant the given key actions to a principal.
    fn grant(&self, grantee: &dyn Grantable, actions: &[&str]) -> Grant;
}

/// A customer managed key referenced by ARN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    arn: Arn,
}

impl Key {
    pub fn from_key_arn(arn: impl Into<Arn>) -> Self {
        Self { arn: arn.into() }
    }
}

impl EncryptionKey for Key {
    fn key_arn(&self) -> &Arn {
        &self.arn
    }

    fn grant(&self, grantee: &dyn Grantable, actions: &[&str]) -> Grant {
        Grant::add_to_principal(GrantOnPrincipalOptions {
            grantee,
            actions: actions.iter().map(|a| (*a).to_owned()).collect(),
            resource_arns: vec![ResourceValue::from(&self.arn)],
            scope: Some(self.arn.to_string()),
        })
    }
}
