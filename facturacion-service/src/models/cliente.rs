//! Client master data.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Identity document code for a DNI (SUNAT catalog 06).
pub const DOC_IDENTIDAD_DNI: &str = "1";

/// Identity document code for a RUC (SUNAT catalog 06).
pub const DOC_IDENTIDAD_RUC: &str = "6";

/// Client snapshot attached to an issued document.
///
/// Copied, not referenced: later edits to the registry must not alter a
/// document that has already been issued under these data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cliente {
    pub tipo_documento: String,
    pub numero_documento: String,
    pub razon_social: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nombre_comercial: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direccion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ubigeo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distrito: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provincia: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub departamento: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telefono: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Row from the `socio_titulares` client registry.
#[derive(Debug, Clone, FromRow)]
pub struct SocioTitular {
    pub id: i64,
    pub dni: String,
    pub nombres: String,
    pub apellido_paterno: String,
    pub apellido_materno: String,
    pub direccion_dni: Option<String>,
    pub distrito_dni: Option<String>,
    pub provincia_dni: Option<String>,
    pub region_dni: Option<String>,
    pub celular: Option<String>,
}

impl From<&SocioTitular> for Cliente {
    fn from(socio: &SocioTitular) -> Self {
        let razon_social = format!(
            "{} {} {}",
            socio.nombres, socio.apellido_paterno, socio.apellido_materno
        )
        .trim()
        .to_string();
        let nombre_comercial = format!("{} {}", socio.nombres, socio.apellido_paterno)
            .trim()
            .to_string();

        Cliente {
            tipo_documento: DOC_IDENTIDAD_DNI.to_string(),
            numero_documento: socio.dni.clone(),
            razon_social,
            nombre_comercial: Some(nombre_comercial),
            direccion: socio.direccion_dni.clone(),
            ubigeo: None,
            distrito: socio.distrito_dni.clone(),
            provincia: socio.provincia_dni.clone(),
            departamento: socio.region_dni.clone(),
            telefono: socio.celular.clone(),
            email: None,
        }
    }
}
