//! Business services for facturacion-service.

pub mod amounts;
pub mod database;
pub mod gateway;
pub mod issuance;
pub mod ledger;
pub mod metrics;
pub mod reconciliation;
pub mod summary;

pub use database::Database;
pub use gateway::{Comprobante, DocumentoEmitido, FormatoPdf, InvoicingApiClient, TaxDocumentGateway};
pub use issuance::{IssuanceOutcome, IssuanceSaga, SagaState, SolicitudBoleta, SolicitudNotaCredito, StepStatus};
pub use ledger::LedgerStore;
pub use metrics::{get_metrics, init_metrics};
pub use reconciliation::{ReconciliationOutcome, StatusPoller};
pub use summary::{ResumenRegistrado, SummaryLifecycle};
