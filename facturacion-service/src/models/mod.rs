//! Domain models for facturacion-service.

mod cliente;
mod documento;
mod ingreso;
mod nota_credito;
mod resumen;

pub use cliente::{Cliente, SocioTitular, DOC_IDENTIDAD_DNI, DOC_IDENTIDAD_RUC};
pub use documento::{
    numero_completo, BoletaPayload, Detalle, DocumentoAfectado, TipoDocumento,
    AFECTACION_GRAVADA, UNIDAD_NO_MEDIBLE, UNIDAD_SERVICIO,
};
pub use ingreso::{
    ActualizacionIngreso, Ingreso, NuevoIngreso, TIPO_TRANSACCION_BOLETA,
    TIPO_TRANSACCION_NOTA_CREDITO,
};
pub use nota_credito::{MotivoNotaCredito, NotaCreditoPayload, PoliticaDetalle};
pub use resumen::{BorradorResumen, EstadoSunat, ResumenDiario, ResumenEnviado};
