//! Amount resolution: IGV decomposition and annulment collapse.
//!
//! Pure computation. User-facing and stored amounts are tax-inclusive; the
//! gateway contract wants tax-exclusive unit values plus the IGV percentage,
//! so every line is decomposed here immediately before payload assembly.

use crate::models::{
    Detalle, DocumentoAfectado, MotivoNotaCredito, PoliticaDetalle, UNIDAD_NO_MEDIBLE,
};
use rust_decimal::{Decimal, RoundingStrategy};
use service_core::error::AppError;

/// Line code carried by the synthetic full-annulment line.
pub const CODIGO_ANULADO: &str = "ANULADO";

/// Description carried by the synthetic full-annulment line.
pub const DESCRIPCION_ANULADO: &str = "OPERACION ANULADA COMPLETAMENTE";

/// Tax-exclusive value of a tax-inclusive `valor_con_igv` at rate
/// `porcentaje_igv`: `v / (1 + p/100)`, rounded to 2 decimal places, half-up.
pub fn valor_sin_igv(valor_con_igv: Decimal, porcentaje_igv: Decimal) -> Result<Decimal, AppError> {
    if porcentaje_igv < Decimal::ZERO {
        return Err(AppError::Validation(format!(
            "invalid IGV percentage: {}",
            porcentaje_igv
        )));
    }
    let divisor = Decimal::ONE + porcentaje_igv / Decimal::ONE_HUNDRED;
    Ok((valor_con_igv / divisor).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

/// Decompose each line's tax-inclusive unit value for the gateway payload.
/// Everything else on the line passes through untouched.
pub fn decomponer_lineas(lineas: &[Detalle]) -> Result<Vec<Detalle>, AppError> {
    lineas
        .iter()
        .map(|linea| {
            let mut resuelta = linea.clone();
            resuelta.mto_valor_unitario =
                valor_sin_igv(linea.mto_valor_unitario, linea.porcentaje_igv)?;
            Ok(resuelta)
        })
        .collect()
}

/// Resolve the lines of a credit note according to the reason's policy:
/// full-annulment reasons collapse the affected document into one synthetic
/// line, every other reason takes the submitted lines verbatim with only
/// their tax decomposition recomputed.
pub fn resolver_detalles(
    motivo: MotivoNotaCredito,
    documento: &DocumentoAfectado,
    lineas: &[Detalle],
) -> Result<Vec<Detalle>, AppError> {
    match motivo.politica() {
        PoliticaDetalle::AnulacionTotal => linea_de_anulacion(documento).map(|linea| vec![linea]),
        PoliticaDetalle::Itemizada => decomponer_lineas(lineas),
    }
}

/// The single synthetic line for a full annulment: quantity 1, non-measurable
/// unit, tax-exclusive value derived from the document total using the first
/// line's IGV rate, affectation code copied from that same line.
fn linea_de_anulacion(documento: &DocumentoAfectado) -> Result<Detalle, AppError> {
    let primera = documento.detalles.first().ok_or_else(|| {
        AppError::Validation(format!(
            "document {} has no line items; cannot derive the annulment line",
            documento.numero_completo
        ))
    })?;

    if documento.mto_imp_venta <= Decimal::ZERO {
        return Err(AppError::Validation(format!(
            "document {} has a non-positive total ({}); cannot annul",
            documento.numero_completo, documento.mto_imp_venta
        )));
    }

    let valor = valor_sin_igv(documento.mto_imp_venta, primera.porcentaje_igv)?;

    Ok(Detalle {
        codigo: Some(CODIGO_ANULADO.to_string()),
        descripcion: DESCRIPCION_ANULADO.to_string(),
        unidad: UNIDAD_NO_MEDIBLE.to_string(),
        cantidad: Decimal::ONE,
        mto_valor_unitario: valor,
        porcentaje_igv: primera.porcentaje_igv,
        tip_afe_igv: primera.tip_afe_igv.clone(),
    })
}

/// Tax-inclusive total of a set of lines, rounded to 2 decimal places.
pub fn total_con_igv(lineas: &[Detalle]) -> Decimal {
    lineas
        .iter()
        .map(|linea| linea.cantidad * linea.mto_valor_unitario)
        .sum::<Decimal>()
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Cliente, TipoDocumento};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn documento(total: Decimal, detalles: Vec<Detalle>) -> DocumentoAfectado {
        DocumentoAfectado {
            ingreso_id: 1,
            tipo: TipoDocumento::Boleta,
            numero_completo: "B001-100".to_string(),
            fecha_emision: NaiveDate::from_ymd_opt(2025, 7, 28).unwrap(),
            moneda: "PEN".to_string(),
            client: Cliente::default(),
            detalles,
            mto_imp_venta: total,
        }
    }

    fn linea(valor: Decimal, igv: Decimal) -> Detalle {
        Detalle {
            codigo: None,
            descripcion: "Servicio General".to_string(),
            unidad: "NIU".to_string(),
            cantidad: Decimal::ONE,
            mto_valor_unitario: valor,
            porcentaje_igv: igv,
            tip_afe_igv: "10".to_string(),
        }
    }

    #[test]
    fn valor_sin_igv_recovers_the_inclusive_value_within_one_cent() {
        let casos = [
            (dec!(118.00), dec!(18)),
            (dec!(100.00), dec!(18)),
            (dec!(59.00), dec!(18)),
            (dec!(25.90), dec!(18)),
            (dec!(0.01), dec!(18)),
            (dec!(4500.50), dec!(18)),
            (dec!(85.90), dec!(10)),
            (dec!(150.00), dec!(0)),
        ];

        for (valor, igv) in casos {
            let sin_igv = valor_sin_igv(valor, igv).unwrap();
            let reconstruido = sin_igv * (Decimal::ONE + igv / Decimal::ONE_HUNDRED);
            let delta = (reconstruido - valor).abs();
            assert!(
                delta <= dec!(0.01),
                "value {} at {}%: got {} back as {}",
                valor,
                igv,
                sin_igv,
                reconstruido
            );
        }
    }

    #[test]
    fn valor_sin_igv_rounds_half_up() {
        // 118.00 / 1.18 = 100 exactly; 100.00 / 1.18 = 84.7457... -> 84.75
        assert_eq!(valor_sin_igv(dec!(118.00), dec!(18)).unwrap(), dec!(100.00));
        assert_eq!(valor_sin_igv(dec!(100.00), dec!(18)).unwrap(), dec!(84.75));
        // Zero rate divides by one.
        assert_eq!(valor_sin_igv(dec!(42.00), dec!(0)).unwrap(), dec!(42.00));
    }

    #[test]
    fn valor_sin_igv_rejects_negative_rates() {
        assert!(matches!(
            valor_sin_igv(dec!(100), dec!(-5)),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn annulment_collapses_to_a_single_synthetic_line() {
        let doc = documento(
            dec!(118.00),
            vec![linea(dec!(59.00), dec!(18)), linea(dec!(59.00), dec!(18))],
        );
        let resueltos = resolver_detalles(
            MotivoNotaCredito::AnulacionDeLaOperacion,
            &doc,
            &doc.detalles,
        )
        .unwrap();

        assert_eq!(resueltos.len(), 1);
        let sintetica = &resueltos[0];
        assert_eq!(sintetica.codigo.as_deref(), Some(CODIGO_ANULADO));
        assert_eq!(sintetica.descripcion, DESCRIPCION_ANULADO);
        assert_eq!(sintetica.unidad, UNIDAD_NO_MEDIBLE);
        assert_eq!(sintetica.cantidad, Decimal::ONE);
        assert_eq!(sintetica.mto_valor_unitario, dec!(100.00));
        assert_eq!(sintetica.porcentaje_igv, dec!(18));
        assert_eq!(sintetica.tip_afe_igv, "10");
    }

    #[test]
    fn annulment_is_idempotent() {
        let doc = documento(dec!(118.00), vec![linea(dec!(118.00), dec!(18))]);
        let primera =
            resolver_detalles(MotivoNotaCredito::DevolucionTotal, &doc, &doc.detalles).unwrap();
        let segunda =
            resolver_detalles(MotivoNotaCredito::DevolucionTotal, &doc, &doc.detalles).unwrap();
        assert_eq!(primera, segunda);
    }

    #[test]
    fn annulment_fails_on_a_document_without_lines() {
        let doc = documento(dec!(118.00), vec![]);
        let err = resolver_detalles(MotivoNotaCredito::AnulacionDeLaOperacion, &doc, &[])
            .expect_err("empty documents must not produce an annulment line");
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn annulment_fails_on_a_non_positive_total() {
        let doc = documento(dec!(0.00), vec![linea(dec!(0.00), dec!(18))]);
        assert!(matches!(
            resolver_detalles(MotivoNotaCredito::AnulacionDeLaOperacion, &doc, &[]),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn itemized_reasons_keep_lines_and_recompute_only_the_unit_value() {
        let doc = documento(dec!(236.00), vec![linea(dec!(118.00), dec!(18))]);
        let enviadas = vec![linea(dec!(118.00), dec!(18)), linea(dec!(59.00), dec!(18))];
        let resueltos =
            resolver_detalles(MotivoNotaCredito::DescuentoPorItem, &doc, &enviadas).unwrap();

        assert_eq!(resueltos.len(), 2);
        assert_eq!(resueltos[0].mto_valor_unitario, dec!(100.00));
        assert_eq!(resueltos[1].mto_valor_unitario, dec!(50.00));
        assert_eq!(resueltos[0].descripcion, enviadas[0].descripcion);
        assert_eq!(resueltos[0].cantidad, enviadas[0].cantidad);
    }

    #[test]
    fn total_con_igv_sums_quantity_times_unit_value() {
        let mut primera = linea(dec!(25.90), dec!(18));
        primera.cantidad = dec!(3);
        let lineas = vec![primera, linea(dec!(118.00), dec!(18))];
        assert_eq!(total_con_igv(&lineas), dec!(195.70));
    }
}
