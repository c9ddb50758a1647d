use crate::dtos::{EmisionResponse, EmitirNotaCreditoRequest};
use crate::models::{MotivoNotaCredito, TipoDocumento};
use crate::services::{SagaState, SolicitudNotaCredito};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use validator::Validate;

/// Issue a credit note against an existing receipt. One synchronous call per
/// user action; the response reports each saga step individually.
pub async fn emitir(
    State(state): State<AppState>,
    Json(req): Json<EmitirNotaCreditoRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let tipo = TipoDocumento::parse(&req.tipo_documento_afectado).ok_or_else(|| {
        AppError::Validation(format!(
            "unknown document kind: {}",
            req.tipo_documento_afectado
        ))
    })?;
    let motivo = MotivoNotaCredito::from_codigo(&req.cod_motivo).ok_or_else(|| {
        AppError::Validation(format!("unknown credit note reason code: {}", req.cod_motivo))
    })?;

    let solicitud = SolicitudNotaCredito {
        tipo_afectado: tipo,
        serie_afectada: req.serie_afectada,
        numero_afectado: req.numero_afectado,
        motivo,
        descripcion_motivo: req
            .des_motivo
            .unwrap_or_else(|| motivo.descripcion().to_string()),
        serie: req
            .serie
            .unwrap_or_else(|| state.config.emisor.serie_nota_credito(tipo).to_string()),
        fecha_emision: req
            .fecha_emision
            .unwrap_or_else(|| chrono::Utc::now().date_naive()),
        detalles: req.detalles.into_iter().map(Into::into).collect(),
    };

    let outcome = state.issuance.issue_nota_credito(solicitud).await?;
    let status = if outcome.state() == SagaState::NotIssued {
        StatusCode::BAD_GATEWAY
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(EmisionResponse::from(&outcome))))
}

/// Load the document a credit note would correct, so the operator can verify
/// it before issuing.
pub async fn buscar_documento_afectado(
    State(state): State<AppState>,
    Path((tipo, serie, numero)): Path<(String, String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let tipo = TipoDocumento::parse(&tipo)
        .ok_or_else(|| AppError::Validation(format!("unknown document kind: {}", tipo)))?;

    let documento = state
        .issuance
        .find_documento_afectado(tipo, &serie, &numero)
        .await?;
    Ok(Json(documento))
}
