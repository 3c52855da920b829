//! Campaign catalog - campaigns, their promotions, participating stores and
//! accepted payment methods.
//!
//! A campaign's configuration type decides whether a client's unused invoice value
//! carries over between invoices (accumulating) or every invoice stands alone.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Campaign accrual mode, sent on the wire as `1` or `2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ConfigurationType {
    /// Balances accumulate across invoices (tipo 1)
    Accumulating,
    /// Each invoice is evaluated on its own, nothing carries over (tipo 2)
    NonAccumulating,
}

impl ConfigurationType {
    /// Wire code of the configuration type.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Accumulating => 1,
            Self::NonAccumulating => 2,
        }
    }

    /// Whether balances carry over between invoices.
    #[must_use]
    pub const fn accumulates(self) -> bool {
        matches!(self, Self::Accumulating)
    }
}

impl TryFrom<u8> for ConfigurationType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Accumulating),
            2 => Ok(Self::NonAccumulating),
            other => Err(format!("unknown campaign configuration type {other}")),
        }
    }
}

impl From<ConfigurationType> for u8 {
    fn from(value: ConfigurationType) -> Self {
        value.code()
    }
}

impl fmt::Display for ConfigurationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A promotional program with its promotions and participating stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: i64,
    pub nombre: String,
    pub tipo_configuracion: ConfigurationType,
    #[serde(default)]
    pub promociones: Vec<Promotion>,
    #[serde(default)]
    pub tiendas: Vec<Store>,
}

impl Campaign {
    /// Finds one of this campaign's promotions by id.
    #[must_use]
    pub fn promotion(&self, promocion_id: i64) -> Option<&Promotion> {
        self.promociones.iter().find(|p| p.id == promocion_id)
    }

    /// Finds one of this campaign's stores by id.
    #[must_use]
    pub fn store(&self, tienda_id: i64) -> Option<&Store> {
        self.tiendas.iter().find(|s| s.id == tienda_id)
    }
}

/// A threshold inside a campaign; every full `montominimo` earns coupons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promotion {
    pub id: i64,
    pub nombre: String,
    pub montominimo: Decimal,
}

/// An affiliated store and the coupons it grants per crossed threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
    pub id: i64,
    pub nombre: String,
    pub numcupones: u32,
}

/// A payment method and its coupon multiplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: i64,
    pub nombre: String,
    pub factor: u32,
}
