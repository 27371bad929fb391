pub mod arn;
pub mod error;
pub mod token;
pub mod types;

pub use arn::{ArnComponents, Environment};
pub use error::{DynaformError, Result};
pub use token::{Condition, Lazy, NO_VALUE, Resolved, ResourceValue, render_values};
pub use types::{Arn, TableName};
