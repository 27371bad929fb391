use std::sync::{Arc, PoisonError, RwLock};

use dynaform_core::Arn;
use tracing::debug;

use crate::policy::{PolicyDocument, PolicyStatement};

/// An identity that can receive policy statements.
pub trait Principal: Send + Sync {
    fn principal_arn(&self) -> &Arn;

    /// Attach a statement to this principal's identity policy.
    ///
    /// Returns `false` when the principal cannot be modified (for example a
    /// role imported by ARN), in which case the statement is dropped.
    fn add_to_principal_policy(&self, statement: PolicyStatement) -> bool;
}

/// Anything that can be the target of a grant.
///
/// A grantee without a principal turns every grant into a no-op.
pub trait Grantable {
    fn grant_principal(&self) -> Option<&dyn Principal>;
}

impl<T: Grantable> Grantable for Option<T> {
    fn grant_principal(&self) -> Option<&dyn Principal> {
        self.as_ref().and_then(Grantable::grant_principal)
    }
}

impl<T: Grantable + ?Sized> Grantable for Arc<T> {
    fn grant_principal(&self) -> Option<&dyn Principal> {
        (**self).grant_principal()
    }
}

impl<T: Grantable + ?Sized> Grantable for &T {
    fn grant_principal(&self) -> Option<&dyn Principal> {
        (**self).grant_principal()
    }
}

/// An IAM role declared alongside the resources it is granted access to.
#[derive(Debug)]
pub struct Role {
    name: String,
    arn: Arn,
    policy: RwLock<PolicyDocument>,
}

impl Role {
    pub fn new(name: impl Into<String>, arn: impl Into<Arn>) -> Self {
        Self {
            name: name.into(),
            arn: arn.into(),
            policy: RwLock::new(PolicyDocument::new()),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Snapshot of the statements granted so far.
    #[must_use]
    pub fn policy_document(&self) -> PolicyDocument {
        self.policy
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Principal for Role {
    fn principal_arn(&self) -> &Arn {
        &self.arn
    }

    fn add_to_principal_policy(&self, statement: PolicyStatement) -> bool {
        debug!(role = %self.name, actions = statement.actions.len(), "adding statement to role policy");
        self.policy
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .add_statement(statement);
        true
    }
}

impl Grantable for Role {
    fn grant_principal(&self) -> Option<&dyn Principal> {
        Some(self)
    }
}

/// A role that exists outside this declaration, referenced by ARN.
///
/// Statements are only kept when the role was imported as mutable.
#[derive(Debug)]
pub struct ImportedRole {
    inner: Role,
    mutable: bool,
}

impl ImportedRole {
    pub fn from_role_arn(arn: impl Into<Arn>, mutable: bool) -> Self {
        let arn = arn.into();
        let name = arn.resource_name().unwrap_or_else(|_| arn.to_string());
        Self {
            inner: Role::new(name, arn),
            mutable,
        }
    }

    #[must_use]
    pub fn policy_document(&self) -> PolicyDocument {
        self.inner.policy_document()
    }
}

impl Principal for ImportedRole {
    fn principal_arn(&self) -> &Arn {
        self.inner.principal_arn()
    }

    fn add_to_principal_policy(&self, statement: PolicyStatement) -> bool {
        if self.mutable {
            self.inner.add_to_principal_policy(statement)
        } else {
            debug!(role = %self.inner.arn, "imported role is immutable, dropping statement");
            false
        }
    }
}

impl Grantable for ImportedRole {
    fn grant_principal(&self) -> Option<&dyn Principal> {
        Some(self)
    }
}
