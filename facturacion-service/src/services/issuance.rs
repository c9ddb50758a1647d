//! Document issuance orchestration.
//!
//! Issue → notify SUNAT → reconcile ledger. Each arrow is one remote call to
//! an independent system, so each step fails independently: a failure after
//! issuance must never be reported as an issuance failure, and an issued
//! document is never rolled back: it is a numbered legal artifact that only
//! a new credit note can reverse. Steps run strictly in order and nothing is
//! retried here; retries are an operator decision because a repeated issuance
//! call can create a duplicate document.

use crate::config::EmisorConfig;
use crate::models::{
    numero_completo, ActualizacionIngreso, BoletaPayload, Cliente, Detalle, DocumentoAfectado,
    Ingreso, MotivoNotaCredito, NotaCreditoPayload, NuevoIngreso, TipoDocumento,
    DOC_IDENTIDAD_DNI, TIPO_TRANSACCION_BOLETA, TIPO_TRANSACCION_NOTA_CREDITO,
};
use crate::services::amounts;
use crate::services::gateway::{Comprobante, DocumentoEmitido, TaxDocumentGateway};
use crate::services::ledger::LedgerStore;
use crate::services::metrics::{DOCUMENTOS_EMITIDOS_TOTAL, SAGA_OUTCOMES_TOTAL};
use chrono::NaiveDate;
use serde::Serialize;
use service_core::error::AppError;
use std::sync::Arc;
use tracing::instrument;

/// Outcome of one saga step. `NotAttempted` is not a failure: it marks the
/// steps that never ran because an earlier step failed hard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepStatus {
    NotAttempted,
    Succeeded,
    Failed { reason: String },
}

impl StepStatus {
    pub fn succeeded(&self) -> bool {
        matches!(self, StepStatus::Succeeded)
    }

    pub fn failed(&self) -> bool {
        matches!(self, StepStatus::Failed { .. })
    }

    fn from_result(result: Result<(), AppError>) -> Self {
        match result {
            Ok(()) => StepStatus::Succeeded,
            Err(e) => StepStatus::Failed {
                reason: e.to_string(),
            },
        }
    }
}

/// Terminal state of an issuance attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SagaState {
    /// All three steps succeeded.
    Reconciled,
    /// Issued, but the SUNAT submission needs a manual retry.
    IssuedNotNotified,
    /// Issued and notified, but the ledger needs manual correction.
    IssuedNotReconciled,
    /// The issue step failed: nothing was created anywhere.
    NotIssued,
}

/// Per-step report for an issuance attempt.
///
/// Three distinct outcome slots, never a single boolean: the notification and
/// ledger steps talk to different systems than the issue step, and their
/// failure must never read as the issuance having failed. `documento` carries
/// the gateway-assigned id and number exactly when the issue step succeeded.
#[derive(Debug, Clone, Serialize)]
pub struct IssuanceOutcome {
    pub documento: Option<DocumentoEmitido>,
    pub emision: StepStatus,
    pub notificacion: StepStatus,
    pub ledger: StepStatus,
}

impl IssuanceOutcome {
    fn no_emitido(reason: String) -> Self {
        Self {
            documento: None,
            emision: StepStatus::Failed { reason },
            notificacion: StepStatus::NotAttempted,
            ledger: StepStatus::NotAttempted,
        }
    }

    /// Collapsed state for display. When both post-issue steps failed the
    /// notification failure wins; the per-step statuses carry the full
    /// picture either way.
    pub fn state(&self) -> SagaState {
        if self.emision.failed() {
            SagaState::NotIssued
        } else if self.notificacion.failed() {
            SagaState::IssuedNotNotified
        } else if self.ledger.failed() {
            SagaState::IssuedNotReconciled
        } else {
            SagaState::Reconciled
        }
    }

    /// Issued, but at least one follow-up step needs manual attention.
    pub fn is_degraded(&self) -> bool {
        matches!(
            self.state(),
            SagaState::IssuedNotNotified | SagaState::IssuedNotReconciled
        )
    }
}

/// Input for issuing a credit note against an existing receipt.
#[derive(Debug, Clone)]
pub struct SolicitudNotaCredito {
    pub tipo_afectado: TipoDocumento,
    pub serie_afectada: String,
    pub numero_afectado: String,
    pub motivo: MotivoNotaCredito,
    pub descripcion_motivo: String,
    pub serie: String,
    pub fecha_emision: NaiveDate,
    /// Lines for itemized reasons; ignored under a full-annulment reason.
    pub detalles: Vec<Detalle>,
}

/// Input for issuing a boleta.
#[derive(Debug, Clone)]
pub struct SolicitudBoleta {
    pub serie: String,
    pub fecha_emision: NaiveDate,
    /// Client DNI; a retail sale without one is recorded as anonymous.
    pub dni: Option<String>,
    pub detalles: Vec<Detalle>,
}

/// Orchestrates issue → notify → reconcile against the gateway and the
/// ledger store.
pub struct IssuanceSaga {
    gateway: Arc<dyn TaxDocumentGateway>,
    ledger: Arc<dyn LedgerStore>,
    emisor: EmisorConfig,
}

impl IssuanceSaga {
    pub fn new(
        gateway: Arc<dyn TaxDocumentGateway>,
        ledger: Arc<dyn LedgerStore>,
        emisor: EmisorConfig,
    ) -> Self {
        Self {
            gateway,
            ledger,
            emisor,
        }
    }

    /// Load the document a credit note corrects, reconstructed from its
    /// income record and the client registry.
    ///
    /// Only boletas can be looked up; the factura path is rejected outright
    /// rather than reported as a miss the operator would keep retrying.
    #[instrument(skip(self))]
    pub async fn find_documento_afectado(
        &self,
        tipo: TipoDocumento,
        serie: &str,
        numero: &str,
    ) -> Result<DocumentoAfectado, AppError> {
        if tipo != TipoDocumento::Boleta {
            return Err(AppError::Unsupported(
                "credit notes can only be issued against boletas; factura lookup is not available"
                    .to_string(),
            ));
        }

        let receipt = numero_completo(serie, numero);

        let ingreso = self
            .ledger
            .find_ingreso_by_receipt(&receipt)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("no income record for receipt {}", receipt))
            })?;

        let dni = ingreso.dni.clone().ok_or_else(|| {
            AppError::Validation(format!(
                "receipt {} has no client attached and cannot be annulled",
                receipt
            ))
        })?;

        let socio = self.ledger.find_socio_by_dni(&dni).await?.ok_or_else(|| {
            AppError::Validation(format!("no registry data for the client with DNI {}", dni))
        })?;

        // The ledger keeps one row per transaction, so the document comes
        // back as a single generic line carrying the stored total.
        let detalle = Detalle::generico(
            format!("Servicio según comprobante {}", receipt),
            ingreso.amount,
        );

        Ok(DocumentoAfectado {
            ingreso_id: ingreso.id,
            tipo,
            numero_completo: receipt,
            fecha_emision: ingreso.date,
            moneda: self.emisor.moneda.clone(),
            client: Cliente::from(&socio),
            detalles: vec![detalle],
            mto_imp_venta: ingreso.amount,
        })
    }

    /// Issue a credit note.
    ///
    /// Input problems (bad reason code, unresolvable document, empty source
    /// lines) surface as `Err` before any remote write is attempted. From the
    /// issue step on, the result is always a report: a hard failure in the
    /// issue step means nothing was created, and the notification and ledger
    /// steps degrade independently; the ledger step runs even when the SUNAT
    /// submission failed, because the two systems are unrelated.
    #[instrument(skip(self, solicitud), fields(
        afectado = %numero_completo(&solicitud.serie_afectada, &solicitud.numero_afectado),
        motivo = %solicitud.motivo,
    ))]
    pub async fn issue_nota_credito(
        &self,
        solicitud: SolicitudNotaCredito,
    ) -> Result<IssuanceOutcome, AppError> {
        let documento = self
            .find_documento_afectado(
                solicitud.tipo_afectado,
                &solicitud.serie_afectada,
                &solicitud.numero_afectado,
            )
            .await?;

        let detalles =
            amounts::resolver_detalles(solicitud.motivo, &documento, &solicitud.detalles)?;

        let payload = NotaCreditoPayload {
            company_id: self.emisor.company_id,
            branch_id: self.emisor.branch_id,
            serie: solicitud.serie.clone(),
            fecha_emision: solicitud.fecha_emision,
            moneda: documento.moneda.clone(),
            tipo_doc_afectado: documento.tipo.codigo_sunat().to_string(),
            num_doc_afectado: documento.numero_completo.clone(),
            cod_motivo: solicitud.motivo.codigo().to_string(),
            des_motivo: solicitud.descripcion_motivo.clone(),
            client: documento.client.clone(),
            detalles,
        };

        // Step 1: issue. A failure here means nothing was created and the
        // later steps are not attempted.
        let emitido = match self.gateway.issue_nota_credito(&payload).await {
            Ok(emitido) => emitido,
            Err(e) => {
                SAGA_OUTCOMES_TOTAL
                    .with_label_values(&["nota_credito", "not_issued"])
                    .inc();
                return Ok(IssuanceOutcome::no_emitido(e.to_string()));
            }
        };
        DOCUMENTOS_EMITIDOS_TOTAL
            .with_label_values(&["nota_credito"])
            .inc();

        // Step 2: SUNAT validation. The document already exists; never roll
        // it back, only degrade.
        let notificacion = StepStatus::from_result(
            self.gateway
                .send_to_sunat(Comprobante::NotaCredito, emitido.id)
                .await,
        );
        if let StepStatus::Failed { reason } = &notificacion {
            tracing::warn!(
                numero = %emitido.numero_completo,
                reason = %reason,
                "credit note issued but SUNAT submission failed; manual retry required"
            );
        }

        // Step 3: rewrite the original income row. Independent of step 2.
        let ledger =
            StepStatus::from_result(self.reconciliar_nota_credito(&documento, &emitido).await);
        if let StepStatus::Failed { reason } = &ledger {
            tracing::warn!(
                numero = %emitido.numero_completo,
                reason = %reason,
                "credit note issued but the income record was not updated; manual correction required"
            );
        }

        let outcome = IssuanceOutcome {
            documento: Some(emitido),
            emision: StepStatus::Succeeded,
            notificacion,
            ledger,
        };
        SAGA_OUTCOMES_TOTAL
            .with_label_values(&["nota_credito", estado_label(outcome.state())])
            .inc();
        Ok(outcome)
    }

    /// Issue a boleta: issue → notify → record income. The ledger step
    /// inserts a fresh income row instead of rewriting one.
    #[instrument(skip(self, solicitud), fields(serie = %solicitud.serie))]
    pub async fn issue_boleta(
        &self,
        solicitud: SolicitudBoleta,
    ) -> Result<IssuanceOutcome, AppError> {
        if solicitud.detalles.is_empty() {
            return Err(AppError::Validation(
                "a boleta needs at least one line item".to_string(),
            ));
        }

        let client = match &solicitud.dni {
            Some(dni) => {
                let socio = self.ledger.find_socio_by_dni(dni).await?.ok_or_else(|| {
                    AppError::Validation(format!(
                        "no registry data for the client with DNI {}",
                        dni
                    ))
                })?;
                Cliente::from(&socio)
            }
            None => cliente_anonimo(),
        };

        let total = amounts::total_con_igv(&solicitud.detalles);
        let detalles = amounts::decomponer_lineas(&solicitud.detalles)?;

        let payload = BoletaPayload {
            company_id: self.emisor.company_id,
            branch_id: self.emisor.branch_id,
            serie: solicitud.serie.clone(),
            fecha_emision: solicitud.fecha_emision,
            moneda: self.emisor.moneda.clone(),
            tipo_operacion: self.emisor.tipo_operacion.clone(),
            forma_pago: self.emisor.forma_pago.clone(),
            client,
            detalles,
        };

        let emitido = match self.gateway.issue_boleta(&payload).await {
            Ok(emitido) => emitido,
            Err(e) => {
                SAGA_OUTCOMES_TOTAL
                    .with_label_values(&["boleta", "not_issued"])
                    .inc();
                return Ok(IssuanceOutcome::no_emitido(e.to_string()));
            }
        };
        DOCUMENTOS_EMITIDOS_TOTAL
            .with_label_values(&["boleta"])
            .inc();

        let notificacion = StepStatus::from_result(
            self.gateway
                .send_to_sunat(Comprobante::Boleta, emitido.id)
                .await,
        );
        if let StepStatus::Failed { reason } = &notificacion {
            tracing::warn!(
                numero = %emitido.numero_completo,
                reason = %reason,
                "boleta issued but SUNAT submission failed; manual retry required"
            );
        }

        let nuevo = NuevoIngreso {
            date: solicitud.fecha_emision,
            amount: total,
            transaction_type: TIPO_TRANSACCION_BOLETA.to_string(),
            receipt_number: emitido.numero_completo.clone(),
            dni: solicitud.dni.clone(),
        };
        let ledger =
            StepStatus::from_result(self.ledger.insert_ingreso(&nuevo).await.map(|_: Ingreso| ()));
        if let StepStatus::Failed { reason } = &ledger {
            tracing::warn!(
                numero = %emitido.numero_completo,
                reason = %reason,
                "boleta issued but the income record was not created; manual correction required"
            );
        }

        let outcome = IssuanceOutcome {
            documento: Some(emitido),
            emision: StepStatus::Succeeded,
            notificacion,
            ledger,
        };
        SAGA_OUTCOMES_TOTAL
            .with_label_values(&["boleta", estado_label(outcome.state())])
            .inc();
        Ok(outcome)
    }

    /// Flip the original income row: negated amount, credit note type, and
    /// the credit note's own number as the receipt reference.
    async fn reconciliar_nota_credito(
        &self,
        documento: &DocumentoAfectado,
        emitido: &DocumentoEmitido,
    ) -> Result<(), AppError> {
        let ingreso = self
            .ledger
            .find_ingreso_by_receipt(&documento.numero_completo)
            .await?
            .ok_or_else(|| {
                AppError::Store(anyhow::anyhow!(
                    "income record for {} disappeared before reconciliation",
                    documento.numero_completo
                ))
            })?;

        let cambios = ActualizacionIngreso {
            amount: -documento.mto_imp_venta.abs(),
            transaction_type: TIPO_TRANSACCION_NOTA_CREDITO.to_string(),
            receipt_number: emitido.numero_completo.clone(),
        };
        self.ledger.update_ingreso(ingreso.id, &cambios).await
    }
}

fn cliente_anonimo() -> Cliente {
    Cliente {
        tipo_documento: DOC_IDENTIDAD_DNI.to_string(),
        numero_documento: "00000000".to_string(),
        razon_social: "Cliente Anónimo".to_string(),
        ..Cliente::default()
    }
}

fn estado_label(state: SagaState) -> &'static str {
    match state {
        SagaState::Reconciled => "reconciled",
        SagaState::IssuedNotNotified => "issued_not_notified",
        SagaState::IssuedNotReconciled => "issued_not_reconciled",
        SagaState::NotIssued => "not_issued",
    }
}
