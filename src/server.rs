use crate::config::{Config, ConfigError};
use crate::core_auth::{Authorizer, Permissions, UserRecord};
use crate::core_network::bootstrap::Bootstrap;
use crate::core_network::network::FtpServer;
use crate::core_network::port_pool::PassivePortPool;
use crate::core_tls::certgen::ensure_self_signed;
use crate::core_tls::{TlsContext, TlsMode, TlsPolicy};
use anyhow::{Context, Result};
use log::{error, info};
use std::sync::Arc;

/// Everything the sessions share: the user table, the TLS setup and the
/// passive port pool. Built once at startup.
#[derive(Debug)]
pub struct ServerContext {
    pub authorizer: Authorizer,
    pub tls_policy: TlsPolicy,
    pub tls: Option<TlsContext>,
    pub passive_pool: Option<Arc<PassivePortPool>>,
    pub bootstrap: Bootstrap,
}

impl ServerContext {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let username = config
            .user
            .username
            .as_deref()
            .ok_or(ConfigError::MissingField("username"))?;
        let password = config
            .user
            .password
            .as_deref()
            .ok_or(ConfigError::MissingField("password"))?;
        let root = config
            .user
            .root
            .as_ref()
            .ok_or(ConfigError::MissingField("root"))?;
        // Canonical so that symlink checks can compare prefixes.
        let root = root
            .canonicalize()
            .map_err(|e| ConfigError::InvalidRoot {
                path: root.clone(),
                reason: e.to_string(),
            })?;
        let permissions = Permissions::parse(&config.user.permissions)?;

        let mut authorizer = Authorizer::new();
        authorizer.add_user(UserRecord::new(username, password, root, permissions))?;

        let tls_policy = config.tls.policy();
        let tls = match tls_policy.mode {
            TlsMode::None => None,
            TlsMode::Implicit | TlsMode::Explicit => {
                let cert_path = config.tls.cert_path();
                let key_path = config.tls.key_path();
                if config.tls.gen_certs_dir.is_some()
                    && ensure_self_signed(&cert_path, &key_path, &config.server.hostname)?
                {
                    info!("Generated self-signed certificate {:?}", cert_path);
                }
                Some(TlsContext::new(&cert_path, &key_path)?)
            }
        };
        let bootstrap = Bootstrap::select(tls_policy.mode, tls.as_ref())?;

        let passive_pool = config
            .server
            .passive_ports
            .map(|range| PassivePortPool::new(range.as_range()));

        Ok(Self {
            authorizer,
            tls_policy,
            tls,
            passive_pool,
            bootstrap,
        })
    }
}

/// Runs the FTP server with the provided configuration.
///
/// This function builds the shared server context, binds the control port
/// and serves clients until the process is stopped.
///
/// # Arguments
///
/// * `config` - The validated server configuration.
///
/// # Returns
///
/// Result<(), anyhow::Error> indicating the success or failure of the operation.
pub async fn run(config: Config) -> Result<()> {
    info!("Starting server with config:");
    config.log_config();

    let context =
        Arc::new(ServerContext::from_config(&config).context("Invalid server configuration")?);

    let server = FtpServer::bind(&config.server.hostname, config.server.listen_port, context)
        .await
        .with_context(|| {
            format!(
                "Failed to listen on {}:{}",
                config.server.hostname, config.server.listen_port
            )
        })?;
    info!("Server listening on {}", server.local_addr()?);

    if let Err(e) = server.serve().await {
        error!("Server stopped: {}", e);
        return Err(e.into());
    }
    Ok(())
}
