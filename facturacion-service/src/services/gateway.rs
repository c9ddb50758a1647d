//! Invoicing gateway client.
//!
//! The external invoicing API issues the documents and relays SUNAT
//! submissions. Every call is a plain blocking request with no automatic
//! retry: a silently retried issuance call can create a duplicate legal
//! document. Responses use a `{success, message, data}` envelope.

use crate::config::GatewayConfig;
use crate::models::{
    BoletaPayload, BorradorResumen, EstadoSunat, NotaCreditoPayload, ResumenEnviado,
};
use crate::services::metrics::GATEWAY_REQUEST_DURATION;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;

/// Kind of issued document addressable on the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comprobante {
    Boleta,
    NotaCredito,
}

impl Comprobante {
    fn segmento(&self) -> &'static str {
        match self {
            Comprobante::Boleta => "boletas",
            Comprobante::NotaCredito => "credit-notes",
        }
    }
}

/// Rendering format for document PDFs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormatoPdf {
    #[serde(rename = "A4")]
    A4,
    #[serde(rename = "TICKET")]
    Ticket,
}

impl Default for FormatoPdf {
    fn default() -> Self {
        FormatoPdf::A4
    }
}

/// Identifier pair the gateway assigns at issuance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentoEmitido {
    pub id: i64,
    pub numero_completo: String,
}

/// Operations the orchestrators need from the gateway.
#[async_trait]
pub trait TaxDocumentGateway: Send + Sync {
    async fn issue_boleta(&self, payload: &BoletaPayload) -> Result<DocumentoEmitido, AppError>;

    async fn issue_nota_credito(
        &self,
        payload: &NotaCreditoPayload,
    ) -> Result<DocumentoEmitido, AppError>;

    /// Submit an issued document for SUNAT validation.
    async fn send_to_sunat(&self, comprobante: Comprobante, id: i64) -> Result<(), AppError>;

    /// Ask the gateway to render an issued boleta to PDF.
    async fn generate_pdf(&self, boleta_id: i64, formato: FormatoPdf) -> Result<(), AppError>;

    /// Build the daily summary for a date. Nothing is persisted on our side.
    async fn create_daily_summary(&self, fecha: NaiveDate) -> Result<BorradorResumen, AppError>;

    /// Submit a previously created summary to SUNAT.
    async fn send_summary(&self, summary_api_id: i64) -> Result<ResumenEnviado, AppError>;

    /// Current SUNAT status of a submitted summary. `Ok(None)` when the
    /// gateway reports a status this service does not recognize; the caller
    /// decides what an unresolved status means (it is never "rechazado").
    async fn check_summary_status(
        &self,
        summary_api_id: i64,
    ) -> Result<Option<EstadoSunat>, AppError>;
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct ApiEnvelope<T> {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct SummaryDetalleWire {
    serie_numero: String,
}

#[derive(Debug, Deserialize)]
struct SummaryCreadaWire {
    id: i64,
    fecha_resumen: String,
    #[serde(default)]
    numero_completo: Option<String>,
    #[serde(default)]
    correlativo: Option<i32>,
    #[serde(default)]
    detalles: Vec<SummaryDetalleWire>,
}

#[derive(Debug, Deserialize)]
struct SummaryEnviadaWire {
    id: i64,
    fecha_resumen: String,
    numero_completo: String,
    correlativo: i32,
    ticket: String,
    estado_sunat: String,
    #[serde(default)]
    detalles: Vec<SummaryDetalleWire>,
}

#[derive(Debug, Deserialize)]
struct EstadoWire {
    estado_sunat: Option<String>,
}

#[derive(Debug, Serialize)]
struct CrearResumenBody {
    company_id: i64,
    branch_id: i64,
    fecha_resumen: NaiveDate,
}

#[derive(Debug, Serialize)]
struct GenerarPdfBody {
    format: FormatoPdf,
}

/// The API sometimes reports dates with a time component; only the calendar
/// date is meaningful.
fn parse_fecha(valor: &str, operacion: &str) -> Result<NaiveDate, AppError> {
    let solo_fecha = valor.split('T').next().unwrap_or(valor);
    solo_fecha.parse::<NaiveDate>().map_err(|e| {
        AppError::Gateway(format!(
            "unparseable fecha_resumen '{}' in {} response: {}",
            valor, operacion, e
        ))
    })
}

/// HTTP client for the invoicing API.
#[derive(Clone)]
pub struct InvoicingApiClient {
    client: Client,
    config: GatewayConfig,
    company_id: i64,
    branch_id: i64,
}

impl InvoicingApiClient {
    pub fn new(config: GatewayConfig, company_id: i64, branch_id: i64) -> Self {
        Self {
            client: Client::new(),
            config,
            company_id,
            branch_id,
        }
    }

    /// Check whether gateway credentials are set.
    pub fn is_configured(&self) -> bool {
        !self.config.auth_token.expose_secret().is_empty()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn post<B, T>(&self, path: &str, body: Option<&B>, operacion: &str) -> Result<T, AppError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let timer = GATEWAY_REQUEST_DURATION
            .with_label_values(&[operacion])
            .start_timer();

        let mut request = self
            .client
            .post(self.url(path))
            .bearer_auth(self.config.auth_token.expose_secret());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Gateway(format!("invoicing API unreachable: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Gateway(format!("failed to read response body: {}", e)))?;

        timer.observe_duration();

        tracing::debug!(%status, operacion, "invoicing API response");

        desenvolver(status, &body, operacion)
    }

    async fn post_ack<B>(&self, path: &str, body: Option<&B>, operacion: &str) -> Result<(), AppError>
    where
        B: Serialize + Sync,
    {
        let timer = GATEWAY_REQUEST_DURATION
            .with_label_values(&[operacion])
            .start_timer();

        let mut request = self
            .client
            .post(self.url(path))
            .bearer_auth(self.config.auth_token.expose_secret());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Gateway(format!("invoicing API unreachable: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Gateway(format!("failed to read response body: {}", e)))?;

        timer.observe_duration();

        tracing::debug!(%status, operacion, "invoicing API response");

        desenvolver_ack(status, &body, operacion)
    }
}

/// Unwrap the `{success, message, data}` envelope, surfacing the provider's
/// own message on failures.
fn desenvolver<T: DeserializeOwned>(
    status: StatusCode,
    body: &str,
    operacion: &str,
) -> Result<T, AppError> {
    if !status.is_success() {
        let message = serde_json::from_str::<ApiEnvelope<serde_json::Value>>(body)
            .ok()
            .and_then(|e| e.message)
            .unwrap_or_else(|| body.to_string());
        tracing::error!(%status, operacion, %message, "invoicing API call failed");
        return Err(AppError::Gateway(message));
    }

    let envelope: ApiEnvelope<T> = serde_json::from_str(body).map_err(|e| {
        AppError::Gateway(format!("unexpected {} response shape: {}", operacion, e))
    })?;

    if !envelope.success {
        return Err(AppError::Gateway(envelope.message.unwrap_or_else(|| {
            format!("the invoicing API reported a failure in {}", operacion)
        })));
    }

    envelope
        .data
        .ok_or_else(|| AppError::Gateway(format!("{} response carried no data", operacion)))
}

/// Like [`desenvolver`], for acknowledgment-only endpoints whose envelope may
/// carry no `data` at all.
fn desenvolver_ack(status: StatusCode, body: &str, operacion: &str) -> Result<(), AppError> {
    if !status.is_success() {
        let message = serde_json::from_str::<ApiEnvelope<serde_json::Value>>(body)
            .ok()
            .and_then(|e| e.message)
            .unwrap_or_else(|| body.to_string());
        tracing::error!(%status, operacion, %message, "invoicing API call failed");
        return Err(AppError::Gateway(message));
    }

    match serde_json::from_str::<ApiEnvelope<serde_json::Value>>(body) {
        Ok(envelope) if !envelope.success => {
            Err(AppError::Gateway(envelope.message.unwrap_or_else(|| {
                format!("the invoicing API reported a failure in {}", operacion)
            })))
        }
        // An empty or non-envelope 2xx body still counts as an ack.
        _ => Ok(()),
    }
}

#[async_trait]
impl TaxDocumentGateway for InvoicingApiClient {
    async fn issue_boleta(&self, payload: &BoletaPayload) -> Result<DocumentoEmitido, AppError> {
        let emitido: DocumentoEmitido = self
            .post("boletas", Some(payload), "issue_boleta")
            .await?;
        tracing::info!(id = emitido.id, numero = %emitido.numero_completo, "boleta issued");
        Ok(emitido)
    }

    async fn issue_nota_credito(
        &self,
        payload: &NotaCreditoPayload,
    ) -> Result<DocumentoEmitido, AppError> {
        let emitido: DocumentoEmitido = self
            .post("credit-notes", Some(payload), "issue_nota_credito")
            .await?;
        tracing::info!(
            id = emitido.id,
            numero = %emitido.numero_completo,
            afectado = %payload.num_doc_afectado,
            "credit note issued"
        );
        Ok(emitido)
    }

    async fn send_to_sunat(&self, comprobante: Comprobante, id: i64) -> Result<(), AppError> {
        let path = format!("{}/{}/send-sunat", comprobante.segmento(), id);
        self.post_ack::<()>(&path, None, "send_to_sunat").await
    }

    async fn generate_pdf(&self, boleta_id: i64, formato: FormatoPdf) -> Result<(), AppError> {
        let path = format!("boletas/{}/generate-pdf", boleta_id);
        self.post_ack(&path, Some(&GenerarPdfBody { format: formato }), "generate_pdf")
            .await
    }

    async fn create_daily_summary(&self, fecha: NaiveDate) -> Result<BorradorResumen, AppError> {
        let body = CrearResumenBody {
            company_id: self.company_id,
            branch_id: self.branch_id,
            fecha_resumen: fecha,
        };
        let creada: SummaryCreadaWire = self
            .post("boletas/create-daily-summary", Some(&body), "create_daily_summary")
            .await?;

        Ok(BorradorResumen {
            summary_api_id: creada.id,
            fecha_resumen: parse_fecha(&creada.fecha_resumen, "create_daily_summary")?,
            numero_completo: creada.numero_completo,
            correlativo: creada.correlativo,
            detalles: creada.detalles.into_iter().map(|d| d.serie_numero).collect(),
        })
    }

    async fn send_summary(&self, summary_api_id: i64) -> Result<ResumenEnviado, AppError> {
        let path = format!("daily-summaries/{}/send-sunat", summary_api_id);
        let enviada: SummaryEnviadaWire = self.post::<(), _>(&path, None, "send_summary").await?;

        let estado = EstadoSunat::parse(&enviada.estado_sunat).ok_or_else(|| {
            AppError::Gateway(format!(
                "unrecognized estado_sunat '{}' in send_summary response",
                enviada.estado_sunat
            ))
        })?;

        tracing::info!(
            summary_api_id,
            numero = %enviada.numero_completo,
            ticket = %enviada.ticket,
            "daily summary submitted to SUNAT"
        );

        Ok(ResumenEnviado {
            summary_api_id: enviada.id,
            fecha_resumen: parse_fecha(&enviada.fecha_resumen, "send_summary")?,
            numero_completo: enviada.numero_completo,
            correlativo: enviada.correlativo,
            ticket: enviada.ticket,
            estado_sunat: estado,
            detalles: enviada.detalles.into_iter().map(|d| d.serie_numero).collect(),
        })
    }

    async fn check_summary_status(
        &self,
        summary_api_id: i64,
    ) -> Result<Option<EstadoSunat>, AppError> {
        let path = format!("daily-summaries/{}/check-status", summary_api_id);
        let estado: EstadoWire = self
            .post(&path, Some(&serde_json::json!({})), "check_summary_status")
            .await?;
        Ok(estado.estado_sunat.as_deref().and_then(EstadoSunat::parse))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    fn test_config(token: &str) -> GatewayConfig {
        GatewayConfig {
            base_url: "http://localhost:8000/api/".to_string(),
            auth_token: Secret::new(token.to_string()),
        }
    }

    #[test]
    fn is_configured_requires_a_token() {
        assert!(InvoicingApiClient::new(test_config("tok"), 1, 1).is_configured());
        assert!(!InvoicingApiClient::new(test_config(""), 1, 1).is_configured());
    }

    #[test]
    fn url_joins_without_duplicate_slashes() {
        let client = InvoicingApiClient::new(test_config("tok"), 1, 1);
        assert_eq!(client.url("boletas"), "http://localhost:8000/api/boletas");
    }

    #[test]
    fn desenvolver_surfaces_the_provider_message() {
        let body = r#"{"success": false, "message": "Serie no autorizada"}"#;
        let err = desenvolver::<serde_json::Value>(StatusCode::OK, body, "issue_boleta")
            .expect_err("success=false must fail");
        match err {
            AppError::Gateway(msg) => assert_eq!(msg, "Serie no autorizada"),
            otro => panic!("unexpected error: {:?}", otro),
        }
    }

    #[test]
    fn desenvolver_returns_the_data_payload() {
        let body = r#"{"success": true, "data": {"id": 77, "numero_completo": "BC01-5"}}"#;
        let emitido: DocumentoEmitido =
            desenvolver(StatusCode::OK, body, "issue_nota_credito").unwrap();
        assert_eq!(emitido.id, 77);
        assert_eq!(emitido.numero_completo, "BC01-5");
    }

    #[test]
    fn desenvolver_uses_the_error_body_on_http_failures() {
        let body = r#"{"success": false, "message": "Token inválido"}"#;
        let err = desenvolver::<serde_json::Value>(StatusCode::UNAUTHORIZED, body, "send_to_sunat")
            .expect_err("http failure must fail");
        match err {
            AppError::Gateway(msg) => assert_eq!(msg, "Token inválido"),
            otro => panic!("unexpected error: {:?}", otro),
        }
    }

    #[test]
    fn parse_fecha_drops_the_time_component() {
        let fecha = parse_fecha("2025-07-28T00:00:00", "send_summary").unwrap();
        assert_eq!(fecha, chrono::NaiveDate::from_ymd_opt(2025, 7, 28).unwrap());
        assert!(parse_fecha("no-date", "send_summary").is_err());
    }
}
