//! Runtime settings, layered from defaults, config file, environment, and
//! command line by `ortho_config`.

use std::net::{Ipv4Addr, SocketAddr};

use ortho_config::OrthoConfig;
use serde::Deserialize;

/// Application settings.
///
/// Every field can come from `USERS_`-prefixed environment variables, a
/// config file, or CLI flags; the derive handles the precedence.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "USERS")]
pub struct Settings {
    /// PostgreSQL connection string.
    pub database_url: String,
    /// Address the HTTP listener binds to.
    pub bind_addr: Option<SocketAddr>,
    /// Upper bound on pooled database connections.
    pub pool_max_size: Option<u32>,
}

impl Settings {
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
            .unwrap_or_else(|| SocketAddr::from((Ipv4Addr::UNSPECIFIED, 3000)))
    }

    pub fn pool_max_size(&self) -> u32 {
        self.pool_max_size.unwrap_or(10)
    }
}
