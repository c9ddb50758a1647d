//! Common test doubles for the orchestration tests.
//!
//! The sagas only see the `TaxDocumentGateway` and `LedgerStore` seams, so
//! these doubles are enough to drive every failure combination without a
//! running gateway or database. Every call is counted; the step-isolation
//! assertions depend on those counters.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use facturacion_service::config::EmisorConfig;
use facturacion_service::models::{
    ActualizacionIngreso, BoletaPayload, BorradorResumen, EstadoSunat, Ingreso, NotaCreditoPayload,
    NuevoIngreso, ResumenDiario, ResumenEnviado, SocioTitular,
};
use facturacion_service::services::{
    Comprobante, DocumentoEmitido, FormatoPdf, LedgerStore, TaxDocumentGateway,
};
use rust_decimal::Decimal;
use service_core::error::AppError;
use std::sync::{Mutex, Once};

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,facturacion_service=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub fn fecha(anio: i32, mes: u32, dia: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(anio, mes, dia).expect("valid date")
}

pub fn emisor_prueba() -> EmisorConfig {
    EmisorConfig {
        company_id: 1,
        branch_id: 1,
        serie_boleta: "B001".to_string(),
        serie_nota_credito_boleta: "BC01".to_string(),
        serie_nota_credito_factura: "FC01".to_string(),
        moneda: "PEN".to_string(),
        tipo_operacion: "0101".to_string(),
        forma_pago: "Contado".to_string(),
    }
}

pub fn socio_prueba() -> SocioTitular {
    SocioTitular {
        id: 1,
        dni: "44556677".to_string(),
        nombres: "María".to_string(),
        apellido_paterno: "Sánchez".to_string(),
        apellido_materno: "Quispe".to_string(),
        direccion_dni: Some("Av. Los Olivos 123".to_string()),
        distrito_dni: Some("San Martín de Porres".to_string()),
        provincia_dni: Some("Lima".to_string()),
        region_dni: Some("Lima".to_string()),
        celular: Some("987654321".to_string()),
    }
}

pub fn ingreso_prueba(receipt: &str, amount: Decimal) -> Ingreso {
    Ingreso {
        id: 1,
        date: fecha(2025, 7, 28),
        amount,
        transaction_type: Some("Boleta de Venta".to_string()),
        receipt_number: Some(receipt.to_string()),
        dni: Some("44556677".to_string()),
        created_utc: Utc::now(),
    }
}

pub fn resumen_prueba(
    id: i64,
    estado: Option<&str>,
    summary_api_id: Option<i64>,
) -> ResumenDiario {
    ResumenDiario {
        id,
        fecha_resumen: fecha(2025, 7, 28),
        numero_completo: format!("RC-20250728-{}", id),
        correlativo: id as i32,
        ticket: Some("1627449600123".to_string()),
        estado_sunat: estado.map(|s| s.to_string()),
        summary_api_id,
        created_utc: Utc::now(),
    }
}

// ---------------------------------------------------------------------------
// Gateway double
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct GatewayCalls {
    pub issue_boleta: usize,
    pub issue_nota_credito: usize,
    pub send_to_sunat: usize,
    pub generate_pdf: usize,
    pub create_daily_summary: usize,
    pub send_summary: usize,
    pub check_summary_status: usize,
}

/// Scriptable gateway: each operation can be told to fail, and every call is
/// counted. Captures the last issuance payloads for content assertions.
pub struct MockGateway {
    pub calls: Mutex<GatewayCalls>,
    pub fail_issue: bool,
    pub fail_send_to_sunat: bool,
    pub fail_create_summary: bool,
    pub fail_send_summary: bool,
    pub fail_check_status: bool,
    pub emitido: DocumentoEmitido,
    pub borrador: BorradorResumen,
    pub enviado: ResumenEnviado,
    /// Status the gateway reports on a check; `None` simulates an
    /// unrecognized status.
    pub estado: Option<EstadoSunat>,
    pub last_nota_credito: Mutex<Option<NotaCreditoPayload>>,
    pub last_boleta: Mutex<Option<BoletaPayload>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(GatewayCalls::default()),
            fail_issue: false,
            fail_send_to_sunat: false,
            fail_create_summary: false,
            fail_send_summary: false,
            fail_check_status: false,
            emitido: DocumentoEmitido {
                id: 77,
                numero_completo: "BC01-5".to_string(),
            },
            borrador: BorradorResumen {
                summary_api_id: 42,
                fecha_resumen: fecha(2025, 7, 28),
                numero_completo: Some("RC-20250728-1".to_string()),
                correlativo: Some(1),
                detalles: vec!["B001-100".to_string(), "B001-101".to_string()],
            },
            enviado: ResumenEnviado {
                summary_api_id: 42,
                fecha_resumen: fecha(2025, 7, 28),
                numero_completo: "RC-20250728-1".to_string(),
                correlativo: 1,
                ticket: "1627449600123".to_string(),
                estado_sunat: EstadoSunat::Pendiente,
                detalles: vec!["B001-100".to_string(), "B001-101".to_string()],
            },
            estado: Some(EstadoSunat::Pendiente),
            last_nota_credito: Mutex::new(None),
            last_boleta: Mutex::new(None),
        }
    }
}

#[async_trait]
impl TaxDocumentGateway for MockGateway {
    async fn issue_boleta(&self, payload: &BoletaPayload) -> Result<DocumentoEmitido, AppError> {
        self.calls.lock().unwrap().issue_boleta += 1;
        *self.last_boleta.lock().unwrap() = Some(payload.clone());
        if self.fail_issue {
            return Err(AppError::Gateway("Serie no autorizada".to_string()));
        }
        Ok(self.emitido.clone())
    }

    async fn issue_nota_credito(
        &self,
        payload: &NotaCreditoPayload,
    ) -> Result<DocumentoEmitido, AppError> {
        self.calls.lock().unwrap().issue_nota_credito += 1;
        *self.last_nota_credito.lock().unwrap() = Some(payload.clone());
        if self.fail_issue {
            return Err(AppError::Gateway("Serie no autorizada".to_string()));
        }
        Ok(self.emitido.clone())
    }

    async fn send_to_sunat(&self, _comprobante: Comprobante, _id: i64) -> Result<(), AppError> {
        self.calls.lock().unwrap().send_to_sunat += 1;
        if self.fail_send_to_sunat {
            return Err(AppError::Gateway("SUNAT no disponible".to_string()));
        }
        Ok(())
    }

    async fn generate_pdf(&self, _boleta_id: i64, _formato: FormatoPdf) -> Result<(), AppError> {
        self.calls.lock().unwrap().generate_pdf += 1;
        Ok(())
    }

    async fn create_daily_summary(&self, _fecha: NaiveDate) -> Result<BorradorResumen, AppError> {
        self.calls.lock().unwrap().create_daily_summary += 1;
        if self.fail_create_summary {
            return Err(AppError::Gateway("No se pudo generar el resumen".to_string()));
        }
        Ok(self.borrador.clone())
    }

    async fn send_summary(&self, _summary_api_id: i64) -> Result<ResumenEnviado, AppError> {
        self.calls.lock().unwrap().send_summary += 1;
        if self.fail_send_summary {
            return Err(AppError::Gateway("Ticket no emitido".to_string()));
        }
        Ok(self.enviado.clone())
    }

    async fn check_summary_status(
        &self,
        _summary_api_id: i64,
    ) -> Result<Option<EstadoSunat>, AppError> {
        self.calls.lock().unwrap().check_summary_status += 1;
        if self.fail_check_status {
            return Err(AppError::Gateway("Consulta no disponible".to_string()));
        }
        Ok(self.estado)
    }
}

// ---------------------------------------------------------------------------
// Ledger double
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct LedgerCalls {
    pub find_ingreso: usize,
    pub insert_ingreso: usize,
    pub update_ingreso: usize,
    pub find_socio: usize,
    pub insert_resumen: usize,
    pub delete_resumen: usize,
    pub insert_detalles: usize,
    pub get_resumen: usize,
    pub list_resumenes: usize,
    pub update_estado: usize,
}

/// In-memory ledger store with scriptable write failures.
pub struct MemoryLedger {
    pub calls: Mutex<LedgerCalls>,
    pub ingresos: Mutex<Vec<Ingreso>>,
    pub socios: Mutex<Vec<SocioTitular>>,
    pub resumenes: Mutex<Vec<ResumenDiario>>,
    pub detalles: Mutex<Vec<(i64, String)>>,
    pub fail_insert_ingreso: bool,
    pub fail_update_ingreso: bool,
    pub fail_insert_resumen: bool,
    pub fail_insert_detalles: bool,
    next_id: Mutex<i64>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(LedgerCalls::default()),
            ingresos: Mutex::new(Vec::new()),
            socios: Mutex::new(vec![socio_prueba()]),
            resumenes: Mutex::new(Vec::new()),
            detalles: Mutex::new(Vec::new()),
            fail_insert_ingreso: false,
            fail_update_ingreso: false,
            fail_insert_resumen: false,
            fail_insert_detalles: false,
            next_id: Mutex::new(100),
        }
    }

    pub fn with_ingreso(self, ingreso: Ingreso) -> Self {
        self.ingresos.lock().unwrap().push(ingreso);
        self
    }

    pub fn with_resumen(self, resumen: ResumenDiario) -> Self {
        self.resumenes.lock().unwrap().push(resumen);
        self
    }

    fn siguiente_id(&self) -> i64 {
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        *next
    }

    pub fn ingreso_por_receipt(&self, receipt: &str) -> Option<Ingreso> {
        self.ingresos
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.receipt_number.as_deref() == Some(receipt))
            .cloned()
    }

    pub fn resumen_por_id(&self, id: i64) -> Option<ResumenDiario> {
        self.resumenes
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn find_ingreso_by_receipt(
        &self,
        receipt_number: &str,
    ) -> Result<Option<Ingreso>, AppError> {
        self.calls.lock().unwrap().find_ingreso += 1;
        Ok(self.ingreso_por_receipt(receipt_number))
    }

    async fn insert_ingreso(&self, nuevo: &NuevoIngreso) -> Result<Ingreso, AppError> {
        self.calls.lock().unwrap().insert_ingreso += 1;
        if self.fail_insert_ingreso {
            return Err(AppError::Store(anyhow::anyhow!("insert rejected")));
        }
        let ingreso = Ingreso {
            id: self.siguiente_id(),
            date: nuevo.date,
            amount: nuevo.amount,
            transaction_type: Some(nuevo.transaction_type.clone()),
            receipt_number: Some(nuevo.receipt_number.clone()),
            dni: nuevo.dni.clone(),
            created_utc: Utc::now(),
        };
        self.ingresos.lock().unwrap().push(ingreso.clone());
        Ok(ingreso)
    }

    async fn update_ingreso(
        &self,
        ingreso_id: i64,
        cambios: &ActualizacionIngreso,
    ) -> Result<(), AppError> {
        self.calls.lock().unwrap().update_ingreso += 1;
        if self.fail_update_ingreso {
            return Err(AppError::Store(anyhow::anyhow!("update rejected")));
        }
        let mut ingresos = self.ingresos.lock().unwrap();
        let ingreso = ingresos
            .iter_mut()
            .find(|i| i.id == ingreso_id)
            .ok_or_else(|| AppError::Store(anyhow::anyhow!("no income record {}", ingreso_id)))?;
        ingreso.amount = cambios.amount;
        ingreso.transaction_type = Some(cambios.transaction_type.clone());
        ingreso.receipt_number = Some(cambios.receipt_number.clone());
        Ok(())
    }

    async fn find_socio_by_dni(&self, dni: &str) -> Result<Option<SocioTitular>, AppError> {
        self.calls.lock().unwrap().find_socio += 1;
        Ok(self
            .socios
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.dni == dni)
            .cloned())
    }

    async fn insert_resumen(&self, resumen: &ResumenEnviado) -> Result<i64, AppError> {
        self.calls.lock().unwrap().insert_resumen += 1;
        if self.fail_insert_resumen {
            return Err(AppError::Store(anyhow::anyhow!("header insert rejected")));
        }
        let id = self.siguiente_id();
        self.resumenes.lock().unwrap().push(ResumenDiario {
            id,
            fecha_resumen: resumen.fecha_resumen,
            numero_completo: resumen.numero_completo.clone(),
            correlativo: resumen.correlativo,
            ticket: Some(resumen.ticket.clone()),
            estado_sunat: Some(resumen.estado_sunat.as_str().to_string()),
            summary_api_id: Some(resumen.summary_api_id),
            created_utc: Utc::now(),
        });
        Ok(id)
    }

    async fn delete_resumen(&self, resumen_id: i64) -> Result<(), AppError> {
        self.calls.lock().unwrap().delete_resumen += 1;
        self.resumenes.lock().unwrap().retain(|r| r.id != resumen_id);
        Ok(())
    }

    async fn insert_resumen_detalles(
        &self,
        resumen_id: i64,
        series: &[String],
    ) -> Result<(), AppError> {
        self.calls.lock().unwrap().insert_detalles += 1;
        if self.fail_insert_detalles {
            return Err(AppError::Store(anyhow::anyhow!("detail insert rejected")));
        }
        let mut detalles = self.detalles.lock().unwrap();
        for serie in series {
            detalles.push((resumen_id, serie.clone()));
        }
        Ok(())
    }

    async fn get_resumen(&self, resumen_id: i64) -> Result<Option<ResumenDiario>, AppError> {
        self.calls.lock().unwrap().get_resumen += 1;
        Ok(self.resumen_por_id(resumen_id))
    }

    async fn list_resumenes(&self) -> Result<Vec<ResumenDiario>, AppError> {
        self.calls.lock().unwrap().list_resumenes += 1;
        let mut resumenes = self.resumenes.lock().unwrap().clone();
        resumenes.sort_by(|a, b| b.fecha_resumen.cmp(&a.fecha_resumen).then(b.id.cmp(&a.id)));
        Ok(resumenes)
    }

    async fn update_estado_resumen(
        &self,
        resumen_id: i64,
        estado: EstadoSunat,
    ) -> Result<(), AppError> {
        self.calls.lock().unwrap().update_estado += 1;
        let mut resumenes = self.resumenes.lock().unwrap();
        let resumen = resumenes
            .iter_mut()
            .find(|r| r.id == resumen_id)
            .ok_or_else(|| AppError::Store(anyhow::anyhow!("no summary {}", resumen_id)))?;
        resumen.estado_sunat = Some(estado.as_str().to_string());
        Ok(())
    }
}
