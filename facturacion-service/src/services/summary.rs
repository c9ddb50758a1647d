//! Daily summary lifecycle.
//!
//! Create → operator checkpoint → submit → persist. The draft returned by
//! `create_draft` is the checkpoint: it is an explicit value the caller holds
//! and passes back into `submit`, because a SUNAT submission cannot be undone
//! and needs a human decision in between. Nothing touches the store until the
//! submission has succeeded.

use crate::models::{BorradorResumen, ResumenDiario, ResumenEnviado};
use crate::services::gateway::TaxDocumentGateway;
use crate::services::ledger::LedgerStore;
use chrono::NaiveDate;
use serde::Serialize;
use service_core::error::AppError;
use std::sync::Arc;
use tracing::instrument;

/// Summary persisted after a successful submission.
#[derive(Debug, Clone, Serialize)]
pub struct ResumenRegistrado {
    /// Row id of the stored header.
    pub resumen_id: i64,
    pub enviado: ResumenEnviado,
}

pub struct SummaryLifecycle {
    gateway: Arc<dyn TaxDocumentGateway>,
    ledger: Arc<dyn LedgerStore>,
}

impl SummaryLifecycle {
    pub fn new(gateway: Arc<dyn TaxDocumentGateway>, ledger: Arc<dyn LedgerStore>) -> Self {
        Self { gateway, ledger }
    }

    /// Build the summary draft for a date. Fails hard when the gateway does;
    /// a draft with zero receipts is a valid result the operator may simply
    /// choose not to submit.
    #[instrument(skip(self))]
    pub async fn create_draft(&self, fecha: NaiveDate) -> Result<BorradorResumen, AppError> {
        let borrador = self.gateway.create_daily_summary(fecha).await?;
        if borrador.detalles.is_empty() {
            tracing::info!(%fecha, "daily summary draft contains no receipts");
        } else {
            tracing::info!(
                %fecha,
                receipts = borrador.detalles.len(),
                "daily summary draft created"
            );
        }
        Ok(borrador)
    }

    /// Submit a confirmed draft to SUNAT and persist the result.
    ///
    /// Header and detail rows are one logical write: when the detail insert
    /// fails after the header went in, the header is deleted again; a header
    /// without details would corrupt later report totals.
    #[instrument(skip(self, borrador), fields(summary_api_id = borrador.summary_api_id))]
    pub async fn submit(&self, borrador: &BorradorResumen) -> Result<ResumenRegistrado, AppError> {
        let enviado = self.gateway.send_summary(borrador.summary_api_id).await?;

        let resumen_id = self.ledger.insert_resumen(&enviado).await?;

        if let Err(e) = self
            .ledger
            .insert_resumen_detalles(resumen_id, &enviado.detalles)
            .await
        {
            tracing::error!(
                resumen_id,
                error = %e,
                "detail insert failed; deleting the summary header"
            );
            if let Err(del) = self.ledger.delete_resumen(resumen_id).await {
                tracing::error!(
                    resumen_id,
                    error = %del,
                    "compensating delete failed; an orphaned summary header remains"
                );
            }
            return Err(e);
        }

        tracing::info!(
            resumen_id,
            numero = %enviado.numero_completo,
            ticket = %enviado.ticket,
            "daily summary stored"
        );

        Ok(ResumenRegistrado {
            resumen_id,
            enviado,
        })
    }

    /// Stored summaries, most recent date first.
    pub async fn list(&self) -> Result<Vec<ResumenDiario>, AppError> {
        self.ledger.list_resumenes().await
    }
}
