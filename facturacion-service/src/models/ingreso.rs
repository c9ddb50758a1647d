//! Income ledger records.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Transaction type tag for a retail sale.
pub const TIPO_TRANSACCION_BOLETA: &str = "Boleta de Venta";

/// Transaction type tag for an annulled/refunded sale.
pub const TIPO_TRANSACCION_NOTA_CREDITO: &str = "Nota de Crédito";

/// Income row (`ingresos`): one row per physical transaction.
///
/// A credit note rewrites the original row (sign, type, receipt number)
/// instead of inserting a counter-entry.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Ingreso {
    pub id: i64,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub transaction_type: Option<String>,
    pub receipt_number: Option<String>,
    pub dni: Option<String>,
    pub created_utc: DateTime<Utc>,
}

/// Input for recording income from a freshly issued boleta.
#[derive(Debug, Clone)]
pub struct NuevoIngreso {
    pub date: NaiveDate,
    pub amount: Decimal,
    pub transaction_type: String,
    pub receipt_number: String,
    pub dni: Option<String>,
}

/// Fields rewritten on the original income row by a credit note.
#[derive(Debug, Clone)]
pub struct ActualizacionIngreso {
    pub amount: Decimal,
    pub transaction_type: String,
    pub receipt_number: String,
}
