use crate::dtos::{EmisionResponse, EmitirBoletaRequest, GenerarPdfRequest};
use crate::services::{SagaState, SolicitudBoleta};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use validator::Validate;

/// Issue a boleta de venta.
pub async fn emitir(
    State(state): State<AppState>,
    Json(req): Json<EmitirBoletaRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let solicitud = SolicitudBoleta {
        serie: req
            .serie
            .unwrap_or_else(|| state.config.emisor.serie_boleta.clone()),
        fecha_emision: req
            .fecha_emision
            .unwrap_or_else(|| chrono::Utc::now().date_naive()),
        dni: req.dni,
        detalles: req.detalles.into_iter().map(Into::into).collect(),
    };

    let outcome = state.issuance.issue_boleta(solicitud).await?;
    let status = if outcome.state() == SagaState::NotIssued {
        StatusCode::BAD_GATEWAY
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(EmisionResponse::from(&outcome))))
}

/// Ask the gateway to render an issued boleta to PDF. Storage of the
/// rendering lives on the gateway side.
pub async fn generar_pdf(
    State(state): State<AppState>,
    Path(boleta_id): Path<i64>,
    Json(req): Json<GenerarPdfRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.gateway.generate_pdf(boleta_id, req.format).await?;
    Ok(StatusCode::ACCEPTED)
}
