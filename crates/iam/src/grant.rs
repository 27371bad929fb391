use dynaform_core::{Arn, DynaformError, ResourceValue, Result};
use tracing::debug;

use crate::policy::PolicyStatement;
use crate::principal::Grantable;

/// Options for [`Grant::add_to_principal`].
pub struct GrantOnPrincipalOptions<'a> {
    /// The principal (no-op if it has none).
    pub grantee: &'a dyn Grantable,
    pub actions: Vec<String>,
    pub resource_arns: Vec<ResourceValue>,
    /// Path of the resource the grant is scoped to, for diagnostics.
    pub scope: Option<String>,
}

/// The result of granting a principal access to a set of resources.
///
/// `principal_statement` is only set when the principal accepted the
/// statement; a grantee without a principal yields a grant with neither a
/// principal nor a principal statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    principal: Option<Arn>,
    statement: PolicyStatement,
    principal_statement: Option<PolicyStatement>,
    scope: Option<String>,
}

impl Grant {
    /// Grant the given actions on the given resources by adding a statement
    /// to the grantee's identity policy.
    pub fn add_to_principal(options: GrantOnPrincipalOptions<'_>) -> Self {
        let statement = PolicyStatement::allow(options.actions, options.resource_arns);

        let Some(principal) = options.grantee.grant_principal() else {
            debug!(scope = ?options.scope, "grantee has no principal, grant is a no-op");
            return Self {
                principal: None,
                statement,
                principal_statement: None,
                scope: options.scope,
            };
        };

        let added = principal.add_to_principal_policy(statement.clone());
        debug!(
            principal = %principal.principal_arn(),
            scope = ?options.scope,
            added,
            "grant issued"
        );
        Self {
            principal: Some(principal.principal_arn().clone()),
            principal_statement: added.then(|| statement.clone()),
            statement,
            scope: options.scope,
        }
    }

    /// Whether a statement was attached somewhere.
    #[must_use]
    pub fn success(&self) -> bool {
        self.principal_statement.is_some()
    }

    /// Whether the grantee had no principal at all.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.principal.is_none()
    }

    /// Fail if the grant did not attach a statement.
    pub fn assert_success(&self) -> Result<()> {
        if self.success() {
            return Ok(());
        }
        Err(DynaformError::PreconditionFailed(format!(
            "{} could not be added on either identity or resource policy",
            self.statement.actions.join(",")
        )))
    }

    #[must_use]
    pub fn principal(&self) -> Option<&Arn> {
        self.principal.as_ref()
    }

    /// The statement that was (or would have been) granted.
    #[must_use]
    pub fn statement(&self) -> &PolicyStatement {
        &self.statement
    }

    #[must_use]
    pub fn principal_statement(&self) -> Option<&PolicyStatement> {
        self.principal_statement.as_ref()
    }

    #[must_use]
    pub fn actions(&self) -> &[String] {
        &self.statement.actions
    }

    #[must_use]
    pub fn resources(&self) -> &[ResourceValue] {
        &self.statement.resources
    }

    #[must_use]
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::principal::{ImportedRole, Role};

    fn options<'a>(grantee: &'a dyn Grantable) -> GrantOnPrincipalOptions<'a> {
        GrantOnPrincipalOptions {
            grantee,
            actions: vec!["dynamodb:GetItem".into()],
            resource_arns: vec![ResourceValue::from("arn:t")],
            scope: Some("Stack/Table".into()),
        }
    }

    #[test]
    fn grant_to_role_succeeds() {
        let role = Role::new("r", "arn:aws:iam::1:role/r");
        let grant = Grant::add_to_principal(options(&role));
        assert!(grant.success());
        assert!(!grant.is_noop());
        assert!(grant.assert_success().is_ok());
        assert_eq!(grant.principal().map(Arn::as_str), Some("arn:aws:iam::1:role/r"));
        assert_eq!(grant.actions(), ["dynamodb:GetItem"]);
        assert_eq!(grant.scope(), Some("Stack/Table"));
        assert_eq!(role.policy_document().statements.len(), 1);
    }

    #[test]
    fn grant_without_principal_is_noop() {
        let grantee: Option<Role> = None;
        let grant = Grant::add_to_principal(options(&grantee));
        assert!(grant.is_noop());
        assert!(!grant.success());
        assert!(grant.principal_statement().is_none());
        assert_eq!(grant.resources().len(), 1);
    }

    #[test]
    fn grant_to_immutable_role_fails_assertion() {
        let role = ImportedRole::from_role_arn("arn:aws:iam::1:role/x", false);
        let grant = Grant::add_to_principal(options(&role));
        assert!(!grant.success());
        assert!(matches!(
            grant.assert_success(),
            Err(DynaformError::PreconditionFailed(_))
        ));
    }

    #[test]
    fn identical_grants_are_equal() {
        let role = Role::new("r", "arn:aws:iam::1:role/r");
        let first = Grant::add_to_principal(options(&role));
        let second = Grant::add_to_principal(options(&role));
        assert_eq!(first, second);
    }
}
