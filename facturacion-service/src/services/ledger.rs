//! Ledger store seam.
//!
//! Read/write operations over the income ledger and summary tables. The
//! orchestrators depend on this trait, not on the concrete database, so the
//! saga tests can script store failures without a running Postgres.

use crate::models::{
    ActualizacionIngreso, EstadoSunat, Ingreso, NuevoIngreso, ResumenDiario, ResumenEnviado,
    SocioTitular,
};
use async_trait::async_trait;
use service_core::error::AppError;

#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Income record matching a `serie-numero` receipt number.
    async fn find_ingreso_by_receipt(
        &self,
        receipt_number: &str,
    ) -> Result<Option<Ingreso>, AppError>;

    /// Record income from a freshly issued document.
    async fn insert_ingreso(&self, nuevo: &NuevoIngreso) -> Result<Ingreso, AppError>;

    /// Rewrite an income row in place (credit note reconciliation).
    async fn update_ingreso(
        &self,
        ingreso_id: i64,
        cambios: &ActualizacionIngreso,
    ) -> Result<(), AppError>;

    /// Client registry lookup by DNI.
    async fn find_socio_by_dni(&self, dni: &str) -> Result<Option<SocioTitular>, AppError>;

    /// Persist a submitted summary header, returning its row id.
    async fn insert_resumen(&self, resumen: &ResumenEnviado) -> Result<i64, AppError>;

    /// Remove a summary header (the compensation for a failed detail write).
    async fn delete_resumen(&self, resumen_id: i64) -> Result<(), AppError>;

    /// Persist the receipt references included in a summary.
    async fn insert_resumen_detalles(
        &self,
        resumen_id: i64,
        series: &[String],
    ) -> Result<(), AppError>;

    async fn get_resumen(&self, resumen_id: i64) -> Result<Option<ResumenDiario>, AppError>;

    /// All stored summaries, most recent date first.
    async fn list_resumenes(&self) -> Result<Vec<ResumenDiario>, AppError>;

    async fn update_estado_resumen(
        &self,
        resumen_id: i64,
        estado: EstadoSunat,
    ) -> Result<(), AppError>;
}
