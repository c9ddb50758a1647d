//! Request/response DTOs for the HTTP surface.

use crate::models::{Detalle, EstadoSunat, AFECTACION_GRAVADA, UNIDAD_SERVICIO};
use crate::services::{
    FormatoPdf, IssuanceOutcome, ReconciliationOutcome, ResumenRegistrado, SagaState, StepStatus,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Line item as submitted by the dashboard (tax-inclusive unit value).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DetalleRequest {
    pub codigo: Option<String>,
    #[validate(length(min = 1))]
    pub descripcion: String,
    pub unidad: Option<String>,
    pub cantidad: Decimal,
    pub mto_valor_unitario: Decimal,
    pub porcentaje_igv: Decimal,
    pub tip_afe_igv: Option<String>,
}

impl From<DetalleRequest> for Detalle {
    fn from(d: DetalleRequest) -> Self {
        Detalle {
            codigo: d.codigo,
            descripcion: d.descripcion,
            unidad: d.unidad.unwrap_or_else(|| UNIDAD_SERVICIO.to_string()),
            cantidad: d.cantidad,
            mto_valor_unitario: d.mto_valor_unitario,
            porcentaje_igv: d.porcentaje_igv,
            tip_afe_igv: d
                .tip_afe_igv
                .unwrap_or_else(|| AFECTACION_GRAVADA.to_string()),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct EmitirNotaCreditoRequest {
    /// "boleta" or "factura".
    pub tipo_documento_afectado: String,
    #[validate(length(min = 1))]
    pub serie_afectada: String,
    #[validate(length(min = 1))]
    pub numero_afectado: String,
    #[validate(length(min = 2, max = 2))]
    pub cod_motivo: String,
    /// Defaults to the catalog description of the reason.
    pub des_motivo: Option<String>,
    /// Defaults to the configured series for the affected document kind.
    pub serie: Option<String>,
    /// Defaults to today.
    pub fecha_emision: Option<NaiveDate>,
    /// Only read for itemized reasons.
    #[serde(default)]
    pub detalles: Vec<DetalleRequest>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct EmitirBoletaRequest {
    pub serie: Option<String>,
    pub fecha_emision: Option<NaiveDate>,
    pub dni: Option<String>,
    #[validate(length(min = 1))]
    pub detalles: Vec<DetalleRequest>,
}

#[derive(Debug, Deserialize)]
pub struct GenerarPdfRequest {
    #[serde(default)]
    pub format: FormatoPdf,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CrearResumenRequest {
    pub fecha_resumen: NaiveDate,
}

/// One saga step as reported to the dashboard.
#[derive(Debug, Serialize)]
pub struct PasoResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<&StepStatus> for PasoResponse {
    fn from(paso: &StepStatus) -> Self {
        match paso {
            StepStatus::NotAttempted => PasoResponse {
                status: "not_attempted",
                reason: None,
            },
            StepStatus::Succeeded => PasoResponse {
                status: "succeeded",
                reason: None,
            },
            StepStatus::Failed { reason } => PasoResponse {
                status: "failed",
                reason: Some(reason.clone()),
            },
        }
    }
}

/// Per-step issuance report. The assigned number is present exactly when the
/// issue step succeeded, so a degraded outcome always names the document the
/// operator has to act on.
#[derive(Debug, Serialize)]
pub struct EmisionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numero_completo: Option<String>,
    pub estado: SagaState,
    pub emision: PasoResponse,
    pub envio_sunat: PasoResponse,
    pub actualizacion_ingreso: PasoResponse,
}

impl From<&IssuanceOutcome> for EmisionResponse {
    fn from(outcome: &IssuanceOutcome) -> Self {
        EmisionResponse {
            id: outcome.documento.as_ref().map(|d| d.id),
            numero_completo: outcome
                .documento
                .as_ref()
                .map(|d| d.numero_completo.clone()),
            estado: outcome.state(),
            emision: PasoResponse::from(&outcome.emision),
            envio_sunat: PasoResponse::from(&outcome.notificacion),
            actualizacion_ingreso: PasoResponse::from(&outcome.ledger),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ResumenEnviadoResponse {
    pub resumen_id: i64,
    pub fecha_resumen: NaiveDate,
    pub numero_completo: String,
    pub correlativo: i32,
    pub ticket: String,
    pub estado_sunat: EstadoSunat,
    pub detalles: Vec<String>,
}

impl From<ResumenRegistrado> for ResumenEnviadoResponse {
    fn from(registrado: ResumenRegistrado) -> Self {
        ResumenEnviadoResponse {
            resumen_id: registrado.resumen_id,
            fecha_resumen: registrado.enviado.fecha_resumen,
            numero_completo: registrado.enviado.numero_completo,
            correlativo: registrado.enviado.correlativo,
            ticket: registrado.enviado.ticket,
            estado_sunat: registrado.enviado.estado_sunat,
            detalles: registrado.enviado.detalles,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EstadoResumenResponse {
    pub resumen_id: i64,
    pub actualizado: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estado: Option<EstadoSunat>,
}

impl EstadoResumenResponse {
    pub fn new(resumen_id: i64, outcome: &ReconciliationOutcome) -> Self {
        match outcome {
            ReconciliationOutcome::Updated { nuevo, .. } => EstadoResumenResponse {
                resumen_id,
                actualizado: true,
                estado: Some(*nuevo),
            },
            ReconciliationOutcome::Unchanged { estado } => EstadoResumenResponse {
                resumen_id,
                actualizado: false,
                estado: *estado,
            },
        }
    }
}
