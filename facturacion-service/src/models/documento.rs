//! Sales document and line item models.

use crate::models::Cliente;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Unit code for services (SUNAT catalog 03).
pub const UNIDAD_SERVICIO: &str = "NIU";

/// Non-measurable unit code, used on synthetic annulment lines.
pub const UNIDAD_NO_MEDIBLE: &str = "ZZ";

/// IGV affectation: "Gravado - Operación Onerosa" (SUNAT catalog 07).
pub const AFECTACION_GRAVADA: &str = "10";

/// Document kind recognized by the tax authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TipoDocumento {
    Boleta,
    Factura,
}

impl TipoDocumento {
    /// SUNAT catalog 01 code for the document kind.
    pub fn codigo_sunat(&self) -> &'static str {
        match self {
            TipoDocumento::Boleta => "03",
            TipoDocumento::Factura => "01",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TipoDocumento::Boleta => "boleta",
            TipoDocumento::Factura => "factura",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "boleta" => Some(TipoDocumento::Boleta),
            "factura" => Some(TipoDocumento::Factura),
            _ => None,
        }
    }
}

impl std::fmt::Display for TipoDocumento {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Format a document reference the way the authority expects it.
pub fn numero_completo(serie: &str, numero: &str) -> String {
    format!("{}-{}", serie, numero)
}

/// Line item of a sales document or credit note.
///
/// `mto_valor_unitario` is tax-inclusive everywhere inside this service; the
/// tax-exclusive value the gateway requires only exists in resolved payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detalle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codigo: Option<String>,
    pub descripcion: String,
    pub unidad: String,
    pub cantidad: Decimal,
    pub mto_valor_unitario: Decimal,
    pub porcentaje_igv: Decimal,
    pub tip_afe_igv: String,
}

impl Detalle {
    /// Generic single line reconstructed from a ledger total.
    ///
    /// The income ledger keeps one row per transaction, not the original
    /// itemization, so a looked-up document carries exactly this line.
    pub fn generico(descripcion: String, importe_con_igv: Decimal) -> Self {
        Self {
            codigo: None,
            descripcion,
            unidad: UNIDAD_SERVICIO.to_string(),
            cantidad: Decimal::ONE,
            mto_valor_unitario: importe_con_igv,
            porcentaje_igv: Decimal::from(18),
            tip_afe_igv: AFECTACION_GRAVADA.to_string(),
        }
    }
}

/// An already-issued sales document loaded from the income ledger, as the
/// target of a credit note.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentoAfectado {
    pub ingreso_id: i64,
    pub tipo: TipoDocumento,
    pub numero_completo: String,
    pub fecha_emision: NaiveDate,
    pub moneda: String,
    pub client: Cliente,
    pub detalles: Vec<Detalle>,
    /// Tax-inclusive total.
    pub mto_imp_venta: Decimal,
}

/// Request body for the gateway's `POST /boletas`.
#[derive(Debug, Clone, Serialize)]
pub struct BoletaPayload {
    pub company_id: i64,
    pub branch_id: i64,
    pub serie: String,
    pub fecha_emision: NaiveDate,
    pub moneda: String,
    pub tipo_operacion: String,
    pub forma_pago: String,
    pub client: Cliente,
    pub detalles: Vec<Detalle>,
}
