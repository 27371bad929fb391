use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

/// Declares a string-backed identifier that serializes as a bare string and
/// derefs to `str`.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Deref for $name {
            type Target = str;

            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }
    };
}

string_id! {
    /// An Amazon Resource Name, e.g.
    /// `arn:aws:dynamodb:us-east-1:123456789012:table/orders`.
    ///
    /// Parsing and suffixing live in [`crate::arn`].
    Arn
}

string_id! {
    /// The physical name of a `DynamoDB` table.
    TableName
}
