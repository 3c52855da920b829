//! Coupon print job - a server-assigned range of coupon numbers for one campaign.

use serde::{Deserialize, Serialize};

/// Coupons to print for one campaign: every number in
/// `(ultimo_cupon_impreso, ultimo_cupon_imprimir]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponPrintJob {
    pub campania: String,
    #[serde(rename = "ultimoCuponImpreso")]
    pub ultimo_cupon_impreso: u64,
    #[serde(rename = "ultimoCuponImprimir")]
    pub ultimo_cupon_imprimir: u64,
}

impl CouponPrintJob {
    /// First number this job prints; `None` once the numbering is exhausted.
    #[must_use]
    pub const fn first_number(&self) -> Option<u64> {
        self.ultimo_cupon_impreso.checked_add(1)
    }

    /// Every coupon number of the job, in print order.
    pub fn numbers(&self) -> impl Iterator<Item = u64> {
        (self.ultimo_cupon_impreso..self.ultimo_cupon_imprimir).map(|n| n + 1)
    }

    /// How many coupons the job hands out.
    #[must_use]
    pub const fn count(&self) -> u64 {
        self.ultimo_cupon_imprimir.saturating_sub(self.ultimo_cupon_impreso)
    }
}

/// Response shared by every endpoint that can issue coupons.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CouponsToPrint {
    #[serde(rename = "cuponesImprimir", default)]
    pub cupones_imprimir: Vec<CouponPrintJob>,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_numbers_exclude_last_printed() {
        let job = CouponPrintJob {
            campania: "Navidad".to_string(),
            ultimo_cupon_impreso: 100,
            ultimo_cupon_imprimir: 103,
        };
        assert_eq!(job.numbers().collect::<Vec<_>>(), vec![101, 102, 103]);
        assert_eq!(job.count(), 3);
    }

    #[test]
    fn test_empty_range() {
        let job = CouponPrintJob {
            campania: "Navidad".to_string(),
            ultimo_cupon_impreso: 50,
            ultimo_cupon_imprimir: 50,
        };
        assert_eq!(job.numbers().count(), 0);
        assert_eq!(job.count(), 0);
    }

    #[test]
    fn test_numbering_at_the_top_of_the_range() {
        let last = CouponPrintJob {
            campania: "Navidad".to_string(),
            ultimo_cupon_impreso: u64::MAX - 1,
            ultimo_cupon_imprimir: u64::MAX,
        };
        assert_eq!(last.first_number(), Some(u64::MAX));
        assert_eq!(last.numbers().collect::<Vec<_>>(), vec![u64::MAX]);

        let exhausted = CouponPrintJob {
            ultimo_cupon_impreso: u64::MAX,
            ..last
        };
        assert_eq!(exhausted.first_number(), None);
        assert_eq!(exhausted.numbers().count(), 0);
        assert_eq!(exhausted.count(), 0);
    }

    #[test]
    fn test_missing_list_means_nothing_to_print() {
        let response: CouponsToPrint = serde_json::from_str(r#"{ "message": "ok" }"#).unwrap();
        assert!(response.cupones_imprimir.is_empty());
    }
}
