use crate::dtos::{CrearResumenRequest, EstadoResumenResponse, ResumenEnviadoResponse};
use crate::models::BorradorResumen;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use validator::Validate;

/// Build the daily summary draft for a date. Nothing is persisted; the
/// returned draft is what the operator reviews and passes back to `enviar`.
pub async fn crear(
    State(state): State<AppState>,
    Json(req): Json<CrearResumenRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let borrador = state.summaries.create_draft(req.fecha_resumen).await?;
    Ok(Json(borrador))
}

/// Submit a confirmed draft to SUNAT and persist the result.
pub async fn enviar(
    State(state): State<AppState>,
    Json(borrador): Json<BorradorResumen>,
) -> Result<impl IntoResponse, AppError> {
    let registrado = state.summaries.submit(&borrador).await?;
    Ok((
        StatusCode::CREATED,
        Json(ResumenEnviadoResponse::from(registrado)),
    ))
}

/// Stored summaries, most recent date first.
pub async fn listar(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let resumenes = state.summaries.list().await?;
    Ok(Json(resumenes))
}

/// Re-query SUNAT for a stored summary and reconcile the stored status.
pub async fn consultar_estado(
    State(state): State<AppState>,
    Path(resumen_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = state.poller.check_summary(resumen_id).await?;
    Ok(Json(EstadoResumenResponse::new(resumen_id, &outcome)))
}
