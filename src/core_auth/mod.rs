pub mod core_auth;
pub mod error;
pub mod permissions;

pub use core_auth::{Authorizer, UserRecord};
pub use error::AuthError;
pub use permissions::{Permission, Permissions};
