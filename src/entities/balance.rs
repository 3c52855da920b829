//! Balance entity - the backend's record of a client's carried balance.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Identifies one (campaign, promotion) accrual pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PromotionKey {
    pub campania_id: i64,
    pub promocion_id: i64,
}

impl PromotionKey {
    #[must_use]
    pub const fn new(campania_id: i64, promocion_id: i64) -> Self {
        Self {
            campania_id,
            promocion_id,
        }
    }
}

/// One row of the balance lookup response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerBalance {
    pub campania_id: i64,
    pub promocion_id: i64,
    pub saldo: Decimal,
}

impl CustomerBalance {
    #[must_use]
    pub const fn key(&self) -> PromotionKey {
        PromotionKey::new(self.campania_id, self.promocion_id)
    }
}

/// Picks the carried balance for one pair out of a lookup response.
/// A pair the client has never accrued on carries zero.
#[must_use]
pub fn balance_for(balances: &[CustomerBalance], key: PromotionKey) -> Decimal {
    balances
        .iter()
        .find(|b| b.key() == key)
        .map_or(Decimal::ZERO, |b| b.saldo)
}
