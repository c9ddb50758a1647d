//! Daily summary models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// SUNAT processing status of a submitted summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstadoSunat {
    Pendiente,
    Aceptado,
    Rechazado,
}

impl EstadoSunat {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstadoSunat::Pendiente => "pendiente",
            EstadoSunat::Aceptado => "aceptado",
            EstadoSunat::Rechazado => "rechazado",
        }
    }

    /// Parse a gateway- or store-reported status. Case-insensitive; anything
    /// unrecognized is `None`, never coerced to a terminal state.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pendiente" => Some(EstadoSunat::Pendiente),
            "aceptado" => Some(EstadoSunat::Aceptado),
            "rechazado" => Some(EstadoSunat::Rechazado),
            _ => None,
        }
    }

    /// Accepted and rejected are final; the poller never leaves them.
    pub fn es_terminal(&self) -> bool {
        matches!(self, EstadoSunat::Aceptado | EstadoSunat::Rechazado)
    }
}

impl std::fmt::Display for EstadoSunat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stored summary header row (`resumenes_diarios`).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumenDiario {
    pub id: i64,
    pub fecha_resumen: NaiveDate,
    pub numero_completo: String,
    pub correlativo: i32,
    pub ticket: Option<String>,
    pub estado_sunat: Option<String>,
    pub summary_api_id: Option<i64>,
    pub created_utc: DateTime<Utc>,
}

impl ResumenDiario {
    /// Parsed stored status.
    pub fn estado(&self) -> Option<EstadoSunat> {
        self.estado_sunat.as_deref().and_then(EstadoSunat::parse)
    }
}

/// Summary draft returned by the gateway's create call.
///
/// Held by the operator between create and submit, passed back verbatim into
/// the submit operation; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BorradorResumen {
    pub summary_api_id: i64,
    pub fecha_resumen: NaiveDate,
    #[serde(default)]
    pub numero_completo: Option<String>,
    #[serde(default)]
    pub correlativo: Option<i32>,
    /// `serie-numero` references of the included receipts. May be empty: a
    /// day without boletas is a valid, submittable-or-not draft.
    pub detalles: Vec<String>,
}

/// Result of a successful gateway submission; the unit the store persists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumenEnviado {
    pub summary_api_id: i64,
    pub fecha_resumen: NaiveDate,
    pub numero_completo: String,
    pub correlativo: i32,
    pub ticket: String,
    pub estado_sunat: EstadoSunat,
    pub detalles: Vec<String>,
}
