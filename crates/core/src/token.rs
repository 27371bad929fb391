//! Deferred values.
//!
//! Some resource identifiers are only known once the whole declaration has
//! been evaluated (for example, whether a table ends up with any secondary
//! index). They are stored as [`Lazy`] values and resolved by the renderer,
//! which drops every value that resolves to [`Resolved::NoValue`].

use std::fmt;
use std::sync::Arc;

/// Marker a deferred value renders to when it has no value.
pub const NO_VALUE: &str = "AWS::NoValue";

/// A render-time predicate backing a [`Lazy`] value.
///
/// Implementations must be pure: the renderer may evaluate them any number
/// of times, in any order, and expects the same answer for an unchanged
/// declaration.
pub trait Condition: Send + Sync {
    fn holds(&self) -> bool;
}

/// The outcome of resolving a deferred value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Value(String),
    NoValue,
}

impl Resolved {
    /// The resolved string, or [`NO_VALUE`] when there is none.
    #[must_use]
    pub fn as_token(&self) -> &str {
        match self {
            Self::Value(value) => value,
            Self::NoValue => NO_VALUE,
        }
    }
}

/// A string that is only present when its condition holds at render time.
#[derive(Clone)]
pub struct Lazy {
    value: String,
    condition: Arc<dyn Condition>,
}

impl Lazy {
    /// Defer `value` until render time, keeping it only if `condition` holds.
    pub fn string_if(value: impl Into<String>, condition: Arc<dyn Condition>) -> Self {
        Self {
            value: value.into(),
            condition,
        }
    }

    /// Evaluate the condition now.
    #[must_use]
    pub fn resolve(&self) -> Resolved {
        if self.condition.holds() {
            Resolved::Value(self.value.clone())
        } else {
            Resolved::NoValue
        }
    }

    /// The value this resolves to when the condition holds.
    #[must_use]
    pub fn candidate(&self) -> &str {
        &self.value
    }
}

impl PartialEq for Lazy {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
            && std::ptr::addr_eq(Arc::as_ptr(&self.condition), Arc::as_ptr(&other.condition))
    }
}

impl Eq for Lazy {}

impl fmt::Debug for Lazy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lazy")
            .field("value", &self.value)
            .finish_non_exhaustive()
    }
}

/// One entry of a resource list: either known now or deferred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceValue {
    Literal(String),
    Deferred(Lazy),
}

impl ResourceValue {
    #[must_use]
    pub fn resolve(&self) -> Resolved {
        match self {
            Self::Literal(value) => Resolved::Value(value.clone()),
            Self::Deferred(lazy) => lazy.resolve(),
        }
    }
}

impl From<&str> for ResourceValue {
    fn from(s: &str) -> Self {
        Self::Literal(s.to_owned())
    }
}

impl From<String> for ResourceValue {
    fn from(s: String) -> Self {
        Self::Literal(s)
    }
}

impl From<&crate::Arn> for ResourceValue {
    fn from(arn: &crate::Arn) -> Self {
        Self::Literal(arn.to_string())
    }
}

impl From<Lazy> for ResourceValue {
    fn from(lazy: Lazy) -> Self {
        Self::Deferred(lazy)
    }
}

/// Resolve and flatten a list of resource values, dropping every entry
/// that resolves to [`Resolved::NoValue`].
#[must_use]
pub fn render_values(values: &[ResourceValue]) -> Vec<String> {
    values
        .iter()
        .filter_map(|value| match value.resolve() {
            Resolved::Value(v) => Some(v),
            Resolved::NoValue => None,
        })
        .collect()
}
