use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;
use std::net::{AddrParseError, IpAddr, SocketAddr};

/// Settings every service shares, loadable from `configuration.*` files or
/// `APP__`-prefixed environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Listener address from the configured host and port.
    pub fn socket_addr(&self) -> Result<SocketAddr, AppError> {
        let ip: IpAddr = self.host.parse().map_err(|e: AddrParseError| {
            AppError::Config(anyhow::anyhow!("invalid bind host '{}': {}", self.host, e))
        })?;
        Ok(SocketAddr::from((ip, self.port)))
    }
}
