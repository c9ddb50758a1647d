//! Credit note payload and the SUNAT reason catalog.

use crate::models::{Cliente, Detalle};
use chrono::NaiveDate;
use serde::Serialize;

/// Credit note issuance reasons (SUNAT catalog 09).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotivoNotaCredito {
    AnulacionDeLaOperacion,
    AnulacionPorErrorEnRuc,
    CorreccionPorErrorEnDescripcion,
    DescuentoGlobal,
    DescuentoPorItem,
    DevolucionTotal,
    DevolucionPorItem,
    Bonificacion,
    DisminucionEnElValor,
    OtrosConceptos,
    AjustesDeOperacionesDeExportacion,
    AjustesAfectosAlIvap,
    AjustesMontosFechasDePago,
}

/// How a credit note's lines are derived from the affected document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoliticaDetalle {
    /// The document is annulled as a whole: all items collapse into one
    /// synthetic line carrying the document total.
    AnulacionTotal,
    /// The submitted lines are used verbatim, with only their tax
    /// decomposition recomputed.
    Itemizada,
}

impl MotivoNotaCredito {
    pub const TODOS: [MotivoNotaCredito; 13] = [
        MotivoNotaCredito::AnulacionDeLaOperacion,
        MotivoNotaCredito::AnulacionPorErrorEnRuc,
        MotivoNotaCredito::CorreccionPorErrorEnDescripcion,
        MotivoNotaCredito::DescuentoGlobal,
        MotivoNotaCredito::DescuentoPorItem,
        MotivoNotaCredito::DevolucionTotal,
        MotivoNotaCredito::DevolucionPorItem,
        MotivoNotaCredito::Bonificacion,
        MotivoNotaCredito::DisminucionEnElValor,
        MotivoNotaCredito::OtrosConceptos,
        MotivoNotaCredito::AjustesDeOperacionesDeExportacion,
        MotivoNotaCredito::AjustesAfectosAlIvap,
        MotivoNotaCredito::AjustesMontosFechasDePago,
    ];

    /// Catalog 09 code.
    pub fn codigo(&self) -> &'static str {
        match self {
            MotivoNotaCredito::AnulacionDeLaOperacion => "01",
            MotivoNotaCredito::AnulacionPorErrorEnRuc => "02",
            MotivoNotaCredito::CorreccionPorErrorEnDescripcion => "03",
            MotivoNotaCredito::DescuentoGlobal => "04",
            MotivoNotaCredito::DescuentoPorItem => "05",
            MotivoNotaCredito::DevolucionTotal => "06",
            MotivoNotaCredito::DevolucionPorItem => "07",
            MotivoNotaCredito::Bonificacion => "08",
            MotivoNotaCredito::DisminucionEnElValor => "09",
            MotivoNotaCredito::OtrosConceptos => "10",
            MotivoNotaCredito::AjustesDeOperacionesDeExportacion => "11",
            MotivoNotaCredito::AjustesAfectosAlIvap => "12",
            MotivoNotaCredito::AjustesMontosFechasDePago => "13",
        }
    }

    /// Canonical catalog description.
    pub fn descripcion(&self) -> &'static str {
        match self {
            MotivoNotaCredito::AnulacionDeLaOperacion => "Anulación de la operación",
            MotivoNotaCredito::AnulacionPorErrorEnRuc => "Anulación por error en el RUC",
            MotivoNotaCredito::CorreccionPorErrorEnDescripcion => {
                "Corrección por error en la descripción"
            }
            MotivoNotaCredito::DescuentoGlobal => "Descuento global",
            MotivoNotaCredito::DescuentoPorItem => "Descuento por ítem",
            MotivoNotaCredito::DevolucionTotal => "Devolución total",
            MotivoNotaCredito::DevolucionPorItem => "Devolución por ítem",
            MotivoNotaCredito::Bonificacion => "Bonificación",
            MotivoNotaCredito::DisminucionEnElValor => "Disminución en el valor",
            MotivoNotaCredito::OtrosConceptos => "Otros conceptos",
            MotivoNotaCredito::AjustesDeOperacionesDeExportacion => {
                "Ajustes de operaciones de exportación"
            }
            MotivoNotaCredito::AjustesAfectosAlIvap => "Ajustes afectos al IVAP",
            MotivoNotaCredito::AjustesMontosFechasDePago => "Ajustes - montos y/o fechas de pago",
        }
    }

    pub fn from_codigo(codigo: &str) -> Option<Self> {
        Self::TODOS.iter().copied().find(|m| m.codigo() == codigo)
    }

    /// The single place that decides which reasons mean full annulment.
    pub fn politica(&self) -> PoliticaDetalle {
        match self {
            MotivoNotaCredito::AnulacionDeLaOperacion
            | MotivoNotaCredito::AnulacionPorErrorEnRuc
            | MotivoNotaCredito::DevolucionTotal => PoliticaDetalle::AnulacionTotal,
            _ => PoliticaDetalle::Itemizada,
        }
    }
}

impl std::fmt::Display for MotivoNotaCredito {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.codigo())
    }
}

/// Request body for the gateway's `POST /credit-notes`.
#[derive(Debug, Clone, Serialize)]
pub struct NotaCreditoPayload {
    pub company_id: i64,
    pub branch_id: i64,
    pub serie: String,
    pub fecha_emision: NaiveDate,
    pub moneda: String,
    pub tipo_doc_afectado: String,
    pub num_doc_afectado: String,
    pub cod_motivo: String,
    pub des_motivo: String,
    pub client: Cliente,
    pub detalles: Vec<Detalle>,
}
