//! Pending batch - the campaign → promotion → invoice tree built at the terminal
//! and submitted to the backend in one call.
//!
//! Coupon totals are always derived from the contained entries. `totalcupones` on a
//! campaign is refreshed through [`CampaignBatch::recompute_total`] after every change
//! instead of being incremented, so it cannot drift from the entries it summarizes.

use super::{ConfigurationType, InvoiceEntry, PromotionKey};
use rust_decimal::Decimal;
use serde::Serialize;

/// A client's accrual state for one promotion during the current session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromotionBalance {
    #[serde(rename = "id")]
    pub promocion_id: i64,
    #[serde(skip)]
    pub campania_id: i64,
    pub nombre: String,
    #[serde(rename = "montominimo")]
    pub monto_minimo: Decimal,
    /// Balance carried in before this session's invoices
    #[serde(rename = "saldoInicial")]
    pub saldo_inicial: Decimal,
    /// Balance carried out after this session's invoices
    #[serde(rename = "nuevoSaldo")]
    pub saldo_nuevo: Decimal,
    pub facturas: Vec<InvoiceEntry>,
}

impl PromotionBalance {
    #[must_use]
    pub const fn key(&self) -> PromotionKey {
        PromotionKey::new(self.campania_id, self.promocion_id)
    }

    /// Coupons earned by all invoices of this promotion.
    #[must_use]
    pub fn total_cupones(&self) -> u32 {
        self.facturas.iter().map(|f| f.numcupones).sum()
    }
}

/// One campaign of the batch with the promotions that received invoices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CampaignBatch {
    pub id: i64,
    pub nombre: String,
    pub tipo_configuracion: ConfigurationType,
    pub totalcupones: u32,
    pub promociones: Vec<PromotionBalance>,
}

impl CampaignBatch {
    #[must_use]
    pub const fn new(id: i64, nombre: String, tipo_configuracion: ConfigurationType) -> Self {
        Self {
            id,
            nombre,
            tipo_configuracion,
            totalcupones: 0,
            promociones: Vec::new(),
        }
    }

    #[must_use]
    pub fn promotion(&self, promocion_id: i64) -> Option<&PromotionBalance> {
        self.promociones.iter().find(|p| p.promocion_id == promocion_id)
    }

    pub fn promotion_mut(&mut self, promocion_id: i64) -> Option<&mut PromotionBalance> {
        self.promociones
            .iter_mut()
            .find(|p| p.promocion_id == promocion_id)
    }

    /// Re-derives `totalcupones` from every contained invoice.
    pub fn recompute_total(&mut self) {
        self.totalcupones = self.promociones.iter().map(PromotionBalance::total_cupones).sum();
    }
}

/// The full working draft for one client.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PendingBatch {
    pub cliente_id: i64,
    pub usuario_id: i64,
    pub ruc: String,
    pub campanias: Vec<CampaignBatch>,
}

impl PendingBatch {
    #[must_use]
    pub fn new(cliente_id: i64, usuario_id: i64, ruc: String) -> Self {
        Self {
            cliente_id,
            usuario_id,
            ruc,
            campanias: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.campanias.is_empty()
    }

    #[must_use]
    pub fn campaign(&self, campania_id: i64) -> Option<&CampaignBatch> {
        self.campanias.iter().find(|c| c.id == campania_id)
    }

    pub fn campaign_mut(&mut self, campania_id: i64) -> Option<&mut CampaignBatch> {
        self.campanias.iter_mut().find(|c| c.id == campania_id)
    }

    #[must_use]
    pub fn promotion(&self, key: PromotionKey) -> Option<&PromotionBalance> {
        self.campaign(key.campania_id)?.promotion(key.promocion_id)
    }

    /// Coupons earned across the whole batch.
    #[must_use]
    pub fn total_cupones(&self) -> u32 {
        self.campanias.iter().map(|c| c.totalcupones).sum()
    }

    /// Number of invoice entries across the whole batch.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.campanias
            .iter()
            .flat_map(|c| c.promociones.iter())
            .map(|p| p.facturas.len())
            .sum()
    }

    /// Drops every campaign, keeping the client identity.
    pub fn clear(&mut self) {
        self.campanias.clear();
    }
}

/// Body of the staff batch submission.
#[derive(Debug, Serialize)]
pub struct BatchSubmission<'a> {
    #[serde(rename = "facturasCliente")]
    pub facturas_cliente: &'a PendingBatch,
}
