use crate::models::TipoDocumento;
use anyhow::{Context, Result};
use dotenvy::dotenv;
use secrecy::Secret;
use serde::Deserialize;
use service_core::config::Config as CommonConfig;
use std::env;

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    pub common: CommonConfig,
    pub database: DatabaseConfig,
    pub gateway: GatewayConfig,
    pub emisor: EmisorConfig,
    pub service_name: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Invoicing API connection settings.
#[derive(Deserialize, Clone, Debug)]
pub struct GatewayConfig {
    pub base_url: String,
    pub auth_token: Secret<String>,
}

/// Issuer identity and document defaults.
#[derive(Deserialize, Clone, Debug)]
pub struct EmisorConfig {
    pub company_id: i64,
    pub branch_id: i64,
    pub serie_boleta: String,
    pub serie_nota_credito_boleta: String,
    pub serie_nota_credito_factura: String,
    pub moneda: String,
    /// "Venta interna" (SUNAT catalog 51).
    pub tipo_operacion: String,
    pub forma_pago: String,
}

impl EmisorConfig {
    /// Default credit note series for the affected document kind.
    pub fn serie_nota_credito(&self, tipo: TipoDocumento) -> &str {
        match tipo {
            TipoDocumento::Boleta => &self.serie_nota_credito_boleta,
            TipoDocumento::Factura => &self.serie_nota_credito_factura,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let common = CommonConfig::load()?;

        let db_url =
            env::var("FACTURACION_DATABASE_URL").context("FACTURACION_DATABASE_URL must be set")?;
        let max_connections = env::var("FACTURACION_DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()?;
        let min_connections = env::var("FACTURACION_DATABASE_MIN_CONNECTIONS")
            .unwrap_or_else(|_| "1".to_string())
            .parse()?;

        let gateway_base_url = env::var("FACTURACION_GATEWAY_BASE_URL")
            .context("FACTURACION_GATEWAY_BASE_URL must be set")?;
        let gateway_token = env::var("FACTURACION_GATEWAY_TOKEN").unwrap_or_default();

        let company_id = env::var("FACTURACION_COMPANY_ID")
            .unwrap_or_else(|_| "1".to_string())
            .parse()?;
        let branch_id = env::var("FACTURACION_BRANCH_ID")
            .unwrap_or_else(|_| "1".to_string())
            .parse()?;

        Ok(Self {
            common,
            database: DatabaseConfig {
                url: Secret::new(db_url),
                max_connections,
                min_connections,
            },
            gateway: GatewayConfig {
                base_url: gateway_base_url,
                auth_token: Secret::new(gateway_token),
            },
            emisor: EmisorConfig {
                company_id,
                branch_id,
                serie_boleta: env::var("FACTURACION_SERIE_BOLETA")
                    .unwrap_or_else(|_| "B001".to_string()),
                serie_nota_credito_boleta: env::var("FACTURACION_SERIE_NC_BOLETA")
                    .unwrap_or_else(|_| "BC01".to_string()),
                serie_nota_credito_factura: env::var("FACTURACION_SERIE_NC_FACTURA")
                    .unwrap_or_else(|_| "FC01".to_string()),
                moneda: env::var("FACTURACION_MONEDA").unwrap_or_else(|_| "PEN".to_string()),
                tipo_operacion: "0101".to_string(),
                forma_pago: "Contado".to_string(),
            },
            service_name: "facturacion-service".to_string(),
            log_level: env::var("FACTURACION_LOG_LEVEL")
                .unwrap_or_else(|_| "info,facturacion_service=debug".to_string()),
            otlp_endpoint: env::var("FACTURACION_OTLP_ENDPOINT").ok(),
        })
    }
}
