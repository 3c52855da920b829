//! Accrual business logic - turns invoice value into coupons.
//!
//! Every full `montominimo` of value earns `factor * cupones_por_local` coupons. For
//! accumulating campaigns the value is the carried balance plus the new invoice, and the
//! unused remainder carries forward; for non-accumulating campaigns only the invoice
//! counts and nothing carries. All arithmetic is done on `Decimal`, so the floor of a
//! division is never disturbed by binary rounding.

use crate::{
    entities::ConfigurationType,
    errors::{Error, Result},
};
use rust_decimal::{Decimal, prelude::ToPrimitive};

/// Inputs of one accrual.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccrualInput {
    /// Balance carried before this invoice; ignored for non-accumulating campaigns
    pub saldo_anterior: Decimal,
    /// The new invoice's amount
    pub monto_factura: Decimal,
    /// The promotion's threshold
    pub monto_minimo: Decimal,
    /// Payment-method multiplier
    pub factor: u32,
    /// Coupons per threshold configured on the store
    pub cupones_por_local: u32,
    pub tipo_configuracion: ConfigurationType,
}

/// Outcome of one accrual.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accrual {
    /// Value the thresholds were measured against
    pub total: Decimal,
    pub cupones: u32,
    pub saldo_nuevo: Decimal,
}

/// Computes the coupons earned by one invoice and the balance it leaves behind.
///
/// # Errors
/// Returns `Error::InvalidInput` when the threshold or invoice amount is not positive,
/// the carried balance is negative, a multiplier is zero, or the running total or
/// coupon count overflows.
pub fn calculate(input: &AccrualInput) -> Result<Accrual> {
    validate(input)?;

    let accumulates = input.tipo_configuracion.accumulates();
    let total = if accumulates {
        input
            .saldo_anterior
            .checked_add(input.monto_factura)
            .ok_or_else(|| {
                Error::invalid_input(format!(
                    "{} + {} overflows",
                    input.saldo_anterior, input.monto_factura
                ))
            })?
    } else {
        input.monto_factura
    };

    let remainder = total % input.monto_minimo;
    let thresholds = ((total - remainder) / input.monto_minimo)
        .to_u32()
        .ok_or_else(|| Error::invalid_input(format!("{total} crosses too many thresholds")))?;

    let cupones = thresholds
        .checked_mul(input.factor)
        .and_then(|c| c.checked_mul(input.cupones_por_local))
        .ok_or_else(|| Error::invalid_input("coupon count overflows"))?;

    let saldo_nuevo = if !accumulates {
        Decimal::ZERO
    } else if cupones == 0 {
        // Below the first threshold the whole running total carries forward.
        total
    } else {
        remainder
    };

    Ok(Accrual {
        total,
        cupones,
        saldo_nuevo,
    })
}

fn validate(input: &AccrualInput) -> Result<()> {
    if input.monto_minimo <= Decimal::ZERO {
        return Err(Error::invalid_input(format!(
            "montominimo must be positive, got {}",
            input.monto_minimo
        )));
    }
    if input.monto_factura <= Decimal::ZERO {
        return Err(Error::invalid_input(format!(
            "invoice amount must be positive, got {}",
            input.monto_factura
        )));
    }
    if input.tipo_configuracion.accumulates() && input.saldo_anterior < Decimal::ZERO {
        return Err(Error::invalid_input(format!(
            "carried balance cannot be negative, got {}",
            input.saldo_anterior
        )));
    }
    if input.factor == 0 || input.cupones_por_local == 0 {
        return Err(Error::invalid_input("multipliers must be at least 1"));
    }
    Ok(())
}

/// Parses a user-typed amount such as `"25.50"` or `"25,50"`.
///
/// # Errors
/// Returns `Error::Validation` for empty, non-numeric, zero or negative input.
pub fn parse_amount(field: &str, raw: &str) -> Result<Decimal> {
    let cleaned = raw.trim().replace(',', ".");
    if cleaned.is_empty() {
        return Err(Error::validation(field, "amount is required"));
    }
    let amount: Decimal = cleaned
        .parse()
        .map_err(|_| Error::validation(field, format!("{raw:?} is not a valid amount")))?;
    if amount <= Decimal::ZERO {
        return Err(Error::validation(field, "amount must be greater than zero"));
    }
    Ok(amount)
}
