//! IAM building blocks for dynaform: policy statements and documents,
//! principals that can receive them, grant results and encryption keys.

pub mod grant;
pub mod key;
pub mod policy;
pub mod principal;

pub use grant::{Grant, GrantOnPrincipalOptions};
pub use key::{EncryptionKey, Key};
pub use policy::{Effect, POLICY_VERSION, PolicyDocument, PolicyStatement};
pub use principal::{Grantable, ImportedRole, Principal, Role};
