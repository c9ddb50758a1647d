//! Summary status reconciliation.
//!
//! SUNAT acceptance is asynchronous: a submitted summary stays "pendiente"
//! until the authority resolves the ticket. This poller re-queries the
//! gateway on operator demand and reconciles the stored status under a
//! strict transition rule: terminal states are never overwritten, and an
//! unresolved query leaves the store untouched rather than being read as
//! "rechazado".

use crate::models::EstadoSunat;
use crate::services::gateway::TaxDocumentGateway;
use crate::services::ledger::LedgerStore;
use serde::Serialize;
use service_core::error::AppError;
use std::sync::Arc;
use tracing::instrument;

/// Result of one reconciliation pass over a stored summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ReconciliationOutcome {
    /// The stored status was replaced by the freshly fetched one.
    Updated {
        previo: Option<EstadoSunat>,
        nuevo: EstadoSunat,
    },
    /// The stored status stands, either because the fetched one matches or
    /// because the stored one is terminal.
    Unchanged { estado: Option<EstadoSunat> },
}

pub struct StatusPoller {
    gateway: Arc<dyn TaxDocumentGateway>,
    ledger: Arc<dyn LedgerStore>,
}

impl StatusPoller {
    pub fn new(gateway: Arc<dyn TaxDocumentGateway>, ledger: Arc<dyn LedgerStore>) -> Self {
        Self { gateway, ledger }
    }

    /// Re-query the authority for a stored summary and reconcile the status.
    #[instrument(skip(self))]
    pub async fn check_summary(
        &self,
        resumen_id: i64,
    ) -> Result<ReconciliationOutcome, AppError> {
        let resumen = self
            .ledger
            .get_resumen(resumen_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("no stored summary with id {}", resumen_id)))?;

        let tracking_id = resumen.summary_api_id.ok_or_else(|| {
            AppError::Reconciliation(format!(
                "summary {} has no tracking identifier on file",
                resumen.numero_completo
            ))
        })?;

        let consultado = match self.gateway.check_summary_status(tracking_id).await {
            Ok(Some(estado)) => estado,
            Ok(None) => {
                return Err(AppError::Reconciliation(format!(
                    "the gateway reported an unrecognized status for summary {}",
                    resumen.numero_completo
                )));
            }
            Err(e) => {
                // The stored status stays untouched; an unreachable authority
                // says nothing about acceptance.
                return Err(AppError::Reconciliation(format!(
                    "status query for summary {} failed: {}",
                    resumen.numero_completo, e
                )));
            }
        };

        let almacenado = resumen.estado();

        match almacenado {
            Some(actual) if actual.es_terminal() => {
                if actual != consultado {
                    tracing::warn!(
                        resumen_id,
                        almacenado = %actual,
                        consultado = %consultado,
                        "stale gateway status ignored; stored status is terminal"
                    );
                }
                Ok(ReconciliationOutcome::Unchanged {
                    estado: Some(actual),
                })
            }
            Some(actual) if actual == consultado => Ok(ReconciliationOutcome::Unchanged {
                estado: Some(actual),
            }),
            previo => {
                self.ledger
                    .update_estado_resumen(resumen_id, consultado)
                    .await?;
                tracing::info!(
                    resumen_id,
                    nuevo = %consultado,
                    "summary status reconciled"
                );
                Ok(ReconciliationOutcome::Updated {
                    previo,
                    nuevo: consultado,
                })
            }
        }
    }
}
