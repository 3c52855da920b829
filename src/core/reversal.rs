//! Reversal business logic - undoes one invoice's contribution to a promotion balance.
//!
//! The carried balance is rebuilt from the balance after the removal candidate and the
//! candidate's own recorded coupons:
//!
//! ```text
//! saldo = numcupones / (factor * cupones_por_local) * montominimo + saldo_guardado - monto
//! ```
//!
//! The formula assumes the removed invoice was the last one added to the promotion.
//! Removing an earlier invoice of a multi-invoice promotion applies the same formula by
//! index and can leave a balance that no sequence of additions would produce.

use crate::{
    entities::ConfigurationType,
    errors::{Error, Result},
};
use rust_decimal::Decimal;

/// What the promotion looked like before removal and what the removed invoice recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReversalInput {
    /// Promotion balance before the removal
    pub saldo_nuevo: Decimal,
    /// Promotion's pre-session balance before the removal
    pub saldo_inicial: Decimal,
    pub monto_minimo: Decimal,
    /// Removed invoice's amount
    pub monto: Decimal,
    /// Coupons the removed invoice earned
    pub numcupones: u32,
    /// Multipliers recorded on the removed invoice
    pub factor: u32,
    pub cupones_por_local: u32,
    pub tipo_configuracion: ConfigurationType,
}

/// Balances after undoing the invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reversal {
    pub saldo_nuevo: Decimal,
    pub saldo_inicial: Decimal,
}

/// Rebuilds the promotion balances as they were before the removed invoice.
///
/// Non-accumulating campaigns never carry balance, so both values stay zero.
///
/// # Errors
/// Returns `Error::InvalidInput` when the threshold is not positive, a recorded
/// multiplier is zero, or the rebuilt balance does not fit in a `Decimal`.
pub fn reverse(input: &ReversalInput) -> Result<Reversal> {
    if !input.tipo_configuracion.accumulates() {
        return Ok(Reversal {
            saldo_nuevo: Decimal::ZERO,
            saldo_inicial: Decimal::ZERO,
        });
    }

    if input.monto_minimo <= Decimal::ZERO {
        return Err(Error::invalid_input(format!(
            "montominimo must be positive, got {}",
            input.monto_minimo
        )));
    }
    let multiplier = input
        .factor
        .checked_mul(input.cupones_por_local)
        .filter(|m| *m > 0)
        .ok_or_else(|| Error::invalid_input("recorded multipliers must be at least 1"))?;

    let overflow = || Error::invalid_input("reversed balance overflows");
    let thresholds = Decimal::from(input.numcupones) / Decimal::from(multiplier);
    let saldo_nuevo = thresholds
        .checked_mul(input.monto_minimo)
        .and_then(|v| v.checked_add(input.saldo_nuevo))
        .and_then(|v| v.checked_sub(input.monto))
        .ok_or_else(overflow)?
        .round_dp(2);
    let saldo_inicial = input
        .saldo_inicial
        .checked_sub(input.monto % input.monto_minimo)
        .ok_or_else(overflow)?
        .round_dp(2);

    Ok(Reversal {
        saldo_nuevo,
        saldo_inicial,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use rust_decimal_macros::dec;

    fn removal(saldo_nuevo: Decimal, monto: Decimal, numcupones: u32) -> ReversalInput {
        ReversalInput {
            saldo_nuevo,
            saldo_inicial: dec!(0),
            monto_minimo: dec!(10),
            monto,
            numcupones,
            factor: 1,
            cupones_por_local: 1,
            tipo_configuracion: ConfigurationType::Accumulating,
        }
    }

    #[test]
    fn test_reverses_threshold_crossing() {
        // 6 carried, +6 -> 1 coupon, 2 carried; undoing it gives 6 back.
        let reversal = reverse(&removal(dec!(2), dec!(6), 1)).unwrap();
        assert_eq!(reversal.saldo_nuevo, dec!(6));
    }

    #[test]
    fn test_reverses_with_multipliers() {
        // 0 carried, +25 with factor 2 and 3 per store -> 12 coupons, 5 carried.
        let input = ReversalInput {
            factor: 2,
            cupones_por_local: 3,
            ..removal(dec!(5), dec!(25), 12)
        };
        assert_eq!(reverse(&input).unwrap().saldo_nuevo, dec!(0));
    }

    #[test]
    fn test_initial_balance_drops_by_removed_remainder() {
        let input = ReversalInput {
            saldo_inicial: dec!(8),
            ..removal(dec!(7), dec!(14), 1)
        };
        let reversal = reverse(&input).unwrap();
        assert_eq!(reversal.saldo_inicial, dec!(4));
        assert_eq!(reversal.saldo_nuevo, dec!(3));
    }

    #[test]
    fn test_non_accumulating_stays_zero() {
        let input = ReversalInput {
            tipo_configuracion: ConfigurationType::NonAccumulating,
            ..removal(dec!(0), dec!(35), 3)
        };
        let reversal = reverse(&input).unwrap();
        assert_eq!(reversal.saldo_nuevo, Decimal::ZERO);
        assert_eq!(reversal.saldo_inicial, Decimal::ZERO);
    }

    #[test]
    fn test_zero_multiplier_is_invalid() {
        let input = ReversalInput {
            factor: 0,
            ..removal(dec!(2), dec!(6), 1)
        };
        assert!(matches!(reverse(&input), Err(Error::InvalidInput { .. })));
    }

    #[test]
    fn test_oversized_balance_is_rejected() {
        let input = ReversalInput {
            monto_minimo: Decimal::MAX,
            ..removal(Decimal::MAX, dec!(6), u32::MAX)
        };
        assert!(matches!(reverse(&input), Err(Error::InvalidInput { .. })));

        let input = ReversalInput {
            saldo_inicial: Decimal::MIN,
            ..removal(dec!(2), dec!(6), 1)
        };
        assert!(matches!(reverse(&input), Err(Error::InvalidInput { .. })));
    }
}
