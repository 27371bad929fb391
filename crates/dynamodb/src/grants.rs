use std::sync::Arc;

use dynaform_core::{Arn, Condition, DynaformError, Lazy, ResourceValue, Result};
use dynaform_iam::{Grant, GrantOnPrincipalOptions, Grantable};
use tracing::debug;

use crate::base::TableIdentity;
use crate::perms;

/// Suffix matching every secondary index of a table.
pub const INDEX_WILDCARD_SUFFIX: &str = "/index/*";

/// Action bundle for [`GrantComposer::combined_grant`].
///
/// Exactly one of `table_actions` and `stream_actions` must be set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CombinedGrantOptions<'a> {
    /// Actions granted on the encryption key, if the table has one.
    pub key_actions: Option<Vec<&'a str>>,
    pub table_actions: Option<Vec<&'a str>>,
    pub stream_actions: Option<Vec<&'a str>>,
}

/// Computes the resource ARNs a grant applies to and issues the grant.
///
/// The "has a secondary index" capability is injected rather than read
/// eagerly: index ARNs are emitted as deferred values and only resolved
/// when the policy is rendered, so indexes declared after the grant still
/// count.
pub struct GrantComposer<'a, T: TableIdentity + ?Sized> {
    table: &'a T,
    has_index: Arc<dyn Condition>,
}

impl<'a, T: TableIdentity + ?Sized> GrantComposer<'a, T> {
    pub fn new(table: &'a T, has_index: Arc<dyn Condition>) -> Self {
        Self { table, has_index }
    }

    /// Grant `actions` on the table, its regional replicas and (deferred)
    /// their secondary indexes.
    pub fn grant(&self, grantee: &dyn Grantable, actions: &[&str]) -> Result<Grant> {
        require_actions(actions)?;
        Ok(self.grant_on_table(grantee, actions))
    }

    /// Grant `actions` on the table's stream.
    pub fn grant_stream(&self, grantee: &dyn Grantable, actions: &[&str]) -> Result<Grant> {
        require_actions(actions)?;
        let stream_arn = self.require_stream()?;
        Ok(self.issue(grantee, actions, vec![ResourceValue::from(stream_arn)], true))
    }

    pub fn grant_read_data(&self, grantee: &dyn Grantable) -> Result<Grant> {
        let table_actions = [perms::READ_DATA_ACTIONS, &[perms::DESCRIBE_TABLE][..]].concat();
        self.combined_grant(
            grantee,
            CombinedGrantOptions {
                key_actions: Some(perms::KEY_READ_ACTIONS.to_vec()),
                table_actions: Some(table_actions),
                stream_actions: None,
            },
        )
    }

    pub fn grant_write_data(&self, grantee: &dyn Grantable) -> Result<Grant> {
        let table_actions = [perms::WRITE_DATA_ACTIONS, &[perms::DESCRIBE_TABLE][..]].concat();
        self.combined_grant(
            grantee,
            CombinedGrantOptions {
                key_actions: Some(key_read_write_actions()),
                table_actions: Some(table_actions),
                stream_actions: None,
            },
        )
    }

    pub fn grant_read_write_data(&self, grantee: &dyn Grantable) -> Result<Grant> {
        let table_actions = [
            perms::READ_DATA_ACTIONS,
            perms::WRITE_DATA_ACTIONS,
            &[perms::DESCRIBE_TABLE][..],
        ]
        .concat();
        self.combined_grant(
            grantee,
            CombinedGrantOptions {
                key_actions: Some(key_read_write_actions()),
                table_actions: Some(table_actions),
                stream_actions: None,
            },
        )
    }

    /// Grant `dynamodb:*` on the table.
    pub fn grant_full_access(&self, grantee: &dyn Grantable) -> Result<Grant> {
        self.combined_grant(
            grantee,
            CombinedGrantOptions {
                key_actions: Some(key_read_write_actions()),
                table_actions: Some(vec![perms::FULL_ACCESS]),
                stream_actions: None,
            },
        )
    }

    /// Grant `dynamodb:ListStreams` on `*`.
    ///
    /// Listing streams is scoped to the account and region, not to a table,
    /// so this succeeds whether or not the table has a stream.
    pub fn grant_table_list_streams(&self, grantee: &dyn Grantable) -> Grant {
        Grant::add_to_principal(GrantOnPrincipalOptions {
            grantee,
            actions: vec![perms::LIST_STREAMS.to_owned()],
            resource_arns: vec![ResourceValue::from("*")],
            scope: None,
        })
    }

    /// Grant everything needed to consume the table's stream: list streams,
    /// the stream read actions and, if encrypted, key read actions.
    pub fn grant_stream_read(&self, grantee: &dyn Grantable) -> Result<Grant> {
        self.require_stream()?;
        self.grant_table_list_streams(grantee);
        self.combined_grant(
            grantee,
            CombinedGrantOptions {
                key_actions: Some(perms::KEY_READ_ACTIONS.to_vec()),
                table_actions: None,
                stream_actions: Some(perms::READ_STREAM_DATA_ACTIONS.to_vec()),
            },
        )
    }

    /// Grant a table or stream action bundle, plus key actions on the
    /// table's encryption key when it has one.
    ///
    /// The key grant is issued first and its result is not returned; only
    /// the table or stream grant is.
    pub fn combined_grant(
        &self,
        grantee: &dyn Grantable,
        options: CombinedGrantOptions<'_>,
    ) -> Result<Grant> {
        let selected = (&options.table_actions, &options.stream_actions);
        let (actions, resources, on_stream) = match selected {
            (Some(table_actions), None) => (table_actions, self.table_resources(), false),
            (None, Some(stream_actions)) => {
                let stream_arn = self.require_stream()?;
                (stream_actions, vec![ResourceValue::from(stream_arn)], true)
            }
            (Some(_), Some(_)) => {
                return Err(DynaformError::LogicFault(
                    "combined grant received both table and stream actions".to_owned(),
                ));
            }
            (None, None) => {
                return Err(DynaformError::LogicFault(
                    "combined grant received neither table nor stream actions".to_owned(),
                ));
            }
        };

        if let (Some(key), Some(key_actions)) = (self.table.encryption_key(), &options.key_actions) {
            debug!(
                table = %self.table.table_name(),
                key = %key.key_arn(),
                actions = key_actions.len(),
                "granting encryption key actions"
            );
            key.grant(grantee, key_actions);
        }

        Ok(self.issue(grantee, actions, resources, on_stream))
    }

    /// Table ARN, its index wildcard, then every regional ARN followed by
    /// every regional index wildcard. Wildcards are deferred.
    #[must_use]
    pub fn table_resources(&self) -> Vec<ResourceValue> {
        let table_arn = self.table.table_arn();
        let regional_arns = self.table.regional_arns();

        let mut resources = Vec::with_capacity(2 + regional_arns.len() * 2);
        resources.push(ResourceValue::from(table_arn));
        resources.push(self.index_wildcard(table_arn.as_str()));
        resources.extend(regional_arns.iter().map(ResourceValue::from));
        resources.extend(regional_arns.iter().map(|arn| self.index_wildcard(arn.as_str())));
        resources
    }

    fn index_wildcard(&self, arn: &str) -> ResourceValue {
        Lazy::string_if(format!("{arn}{INDEX_WILDCARD_SUFFIX}"), Arc::clone(&self.has_index)).into()
    }

    fn grant_on_table(&self, grantee: &dyn Grantable, actions: &[&str]) -> Grant {
        self.issue(grantee, actions, self.table_resources(), false)
    }

    fn issue(
        &self,
        grantee: &dyn Grantable,
        actions: &[&str],
        resource_arns: Vec<ResourceValue>,
        on_stream: bool,
    ) -> Grant {
        debug!(
            table = %self.table.table_name(),
            actions = actions.len(),
            resources = resource_arns.len(),
            on_stream,
            "granting table actions"
        );
        Grant::add_to_principal(GrantOnPrincipalOptions {
            grantee,
            actions: actions.iter().map(|a| (*a).to_owned()).collect(),
            resource_arns,
            scope: Some(self.table.node_path().to_owned()),
        })
    }

    fn require_stream(&self) -> Result<&'a Arn> {
        self.table.table_stream_arn().ok_or_else(|| {
            DynaformError::PreconditionFailed(format!(
                "DynamoDB Streams must be enabled on the table {}",
                self.table.node_path()
            ))
        })
    }
}

fn require_actions(actions: &[&str]) -> Result<()> {
    if actions.is_empty() {
        return Err(DynaformError::Validation(
            "at least one action must be granted".to_owned(),
        ));
    }
    Ok(())
}

fn key_read_write_actions() -> Vec<&'static str> {
    [perms::KEY_READ_ACTIONS, perms::KEY_WRITE_ACTIONS].concat()
}
