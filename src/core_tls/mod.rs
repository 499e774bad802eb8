// SSL/TLS support for fixtureftpd: policy, certificate loading and stream wrapping

pub mod certgen;
pub mod error;
pub mod tls_config;
pub mod tls_context;

pub use error::TlsError;
pub use tls_config::{TlsConfig, TlsMode, TlsPolicy, TlsRequirement};
pub use tls_context::TlsContext;
