//! Batch business logic - the staff terminal's working draft for one client.
//!
//! A [`BatchSession`] belongs to one identified client and one operator. Invoices are
//! added against a (campaign, promotion) pair; the first invoice of an accumulating pair
//! pulls the client's carried balance from the backend, later ones continue from the
//! balance already in the draft. Nothing reaches the backend until [`BatchSession::submit`].
//!
//! Add, remove and submit are exclusive: while one of them is in flight the others
//! return [`Error::Busy`] instead of interleaving with it.

use crate::{
    api::PromotionsApi,
    core::{
        accrual::{self, AccrualInput},
        balances::BalanceCache,
        reversal::{self, ReversalInput},
    },
    entities::{
        Campaign, CampaignBatch, Client, CouponPrintJob, InvoiceEntry, PaymentMethod,
        PendingBatch, Promotion, PromotionBalance, PromotionKey, Store,
    },
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// The operator's picks for one invoice line. Every `None` is a missing selection.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntrySelection<'a> {
    pub campaign: Option<&'a Campaign>,
    pub promotion: Option<&'a Promotion>,
    pub store: Option<&'a Store>,
    pub payment_method: Option<&'a PaymentMethod>,
    pub numero: &'a str,
    /// Amount as typed, e.g. `"25,50"`
    pub monto: &'a str,
}

/// The invoice-level half of a multi-row entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvoiceDraft<'a> {
    pub numero: &'a str,
    pub monto: &'a str,
    pub store: Option<&'a Store>,
}

/// One (campaign, promotion, payment method) row of a multi-row entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromotionRow<'a> {
    pub campaign: Option<&'a Campaign>,
    pub promotion: Option<&'a Promotion>,
    pub payment_method: Option<&'a PaymentMethod>,
}

impl<'a> PromotionRow<'a> {
    #[must_use]
    pub const fn with_invoice(self, invoice: InvoiceDraft<'a>) -> EntrySelection<'a> {
        EntrySelection {
            campaign: self.campaign,
            promotion: self.promotion,
            store: invoice.store,
            payment_method: self.payment_method,
            numero: invoice.numero,
            monto: invoice.monto,
        }
    }
}

/// A selection that passed validation.
#[derive(Debug, Clone, Copy)]
struct CheckedEntry<'a> {
    campaign: &'a Campaign,
    promotion: &'a Promotion,
    store: &'a Store,
    payment_method: &'a PaymentMethod,
    numero: &'a str,
    monto: Decimal,
}

impl CheckedEntry<'_> {
    const fn key(&self) -> PromotionKey {
        PromotionKey::new(self.campaign.id, self.promotion.id)
    }
}

struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// The working batch of one client at one terminal.
pub struct BatchSession<A: PromotionsApi + ?Sized> {
    api: Arc<A>,
    client: Client,
    usuario_id: i64,
    batch: Mutex<PendingBatch>,
    balances: BalanceCache,
    busy: AtomicBool,
}

impl<A: PromotionsApi + ?Sized> BatchSession<A> {
    /// Opens an empty batch for `client`, registered by operator `usuario_id`.
    pub fn new(api: Arc<A>, client: Client, usuario_id: i64) -> Self {
        let batch = PendingBatch::new(client.id, usuario_id, client.ruc.clone());
        Self {
            api,
            client,
            usuario_id,
            batch: Mutex::new(batch),
            balances: BalanceCache::new(),
            busy: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub const fn client(&self) -> &Client {
        &self.client
    }

    fn acquire(&self) -> Result<BusyGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| Error::Busy)?;
        Ok(BusyGuard(&self.busy))
    }

    fn check<'a>(&self, selection: &EntrySelection<'a>) -> Result<CheckedEntry<'a>> {
        if !self.client.is_identified() {
            return Err(Error::validation("cliente", "client must be identified first"));
        }
        if self.usuario_id <= 0 {
            return Err(Error::validation("usuario", "operator is not identified"));
        }
        let campaign = selection
            .campaign
            .ok_or_else(|| Error::validation("campania", "select a campaign"))?;
        let promotion = selection
            .promotion
            .ok_or_else(|| Error::validation("promocion", "select a promotion"))?;
        if campaign.promotion(promotion.id).is_none() {
            return Err(Error::validation(
                "promocion",
                format!("promotion {} does not belong to campaign {}", promotion.nombre, campaign.nombre),
            ));
        }
        let store = selection
            .store
            .ok_or_else(|| Error::validation("tienda", "select a store"))?;
        let payment_method = selection
            .payment_method
            .ok_or_else(|| Error::validation("formapago", "select a payment method"))?;
        let numero = selection.numero.trim();
        if numero.is_empty() {
            return Err(Error::validation("numero", "invoice number is required"));
        }
        let monto = accrual::parse_amount("monto", selection.monto)?;

        Ok(CheckedEntry {
            campaign,
            promotion,
            store,
            payment_method,
            numero,
            monto,
        })
    }

    /// Adds one invoice line to the batch and returns the entry as recorded.
    ///
    /// # Errors
    /// * `Error::Validation` for a missing selection or malformed amount; the batch is untouched
    /// * `Error::LookupFailure` when the carried balance cannot be fetched; the batch is untouched
    /// * `Error::Busy` while another batch operation is in flight
    #[instrument(skip(self, selection), fields(cliente_id = self.client.id))]
    pub async fn add_entry(&self, selection: &EntrySelection<'_>) -> Result<InvoiceEntry> {
        let _guard = self.acquire()?;
        let checked = self.check(selection)?;
        self.apply(&checked).await
    }

    /// Records one invoice against several promotions at once.
    ///
    /// Every row is validated before any is applied. A lookup failure part-way keeps the
    /// rows already applied and reports the error.
    ///
    /// # Errors
    /// Same as [`Self::add_entry`]; an empty row list is a validation error.
    #[instrument(skip(self, invoice, rows), fields(cliente_id = self.client.id, rows = rows.len()))]
    pub async fn add_invoice(
        &self,
        invoice: InvoiceDraft<'_>,
        rows: &[PromotionRow<'_>],
    ) -> Result<Vec<InvoiceEntry>> {
        let _guard = self.acquire()?;
        if rows.is_empty() {
            return Err(Error::validation("promociones", "add at least one promotion row"));
        }
        let checked = rows
            .iter()
            .map(|row| self.check(&row.with_invoice(invoice)))
            .collect::<Result<Vec<_>>>()?;

        let mut entries = Vec::with_capacity(checked.len());
        for entry in &checked {
            entries.push(self.apply(entry).await?);
        }
        Ok(entries)
    }

    async fn carried_balance(&self, entry: &CheckedEntry<'_>) -> Result<Decimal> {
        if !entry.campaign.tipo_configuracion.accumulates() {
            return Ok(Decimal::ZERO);
        }
        let key = entry.key();
        let in_session = {
            let batch = self.batch.lock().await;
            batch
                .promotion(key)
                .filter(|p| !p.facturas.is_empty())
                .map(|p| p.saldo_nuevo)
        };
        let saldo = match in_session {
            Some(saldo) => {
                debug!("Continuing from session balance {} for {:?}", saldo, key);
                saldo
            }
            None => self.balances.get_or_fetch(&*self.api, self.client.id, key).await?,
        };
        // Removing an earlier invoice can leave the draft below zero; accrual restarts from zero.
        if saldo < Decimal::ZERO {
            warn!("Carried balance {} for {:?} is negative, continuing from zero", saldo, key);
            return Ok(Decimal::ZERO);
        }
        Ok(saldo)
    }

    async fn apply(&self, entry: &CheckedEntry<'_>) -> Result<InvoiceEntry> {
        let saldo_anterior = self.carried_balance(entry).await?;
        let tipo = entry.campaign.tipo_configuracion;
        let result = accrual::calculate(&AccrualInput {
            saldo_anterior,
            monto_factura: entry.monto,
            monto_minimo: entry.promotion.montominimo,
            factor: entry.payment_method.factor,
            cupones_por_local: entry.store.numcupones,
            tipo_configuracion: tipo,
        })?;

        let invoice = InvoiceEntry {
            numero: entry.numero.to_string(),
            monto: entry.monto,
            tienda_id: entry.store.id,
            tienda_nombre: entry.store.nombre.clone(),
            formapago_id: entry.payment_method.id,
            formapago_nombre: entry.payment_method.nombre.clone(),
            numcupones: result.cupones,
            factor: entry.payment_method.factor,
            cupones_por_local: entry.store.numcupones,
        };

        let mut batch = self.batch.lock().await;
        let campaign_idx = match batch.campanias.iter().position(|c| c.id == entry.campaign.id) {
            Some(idx) => idx,
            None => {
                batch.campanias.push(CampaignBatch::new(
                    entry.campaign.id,
                    entry.campaign.nombre.clone(),
                    tipo,
                ));
                batch.campanias.len() - 1
            }
        };
        let campaign = &mut batch.campanias[campaign_idx];
        let promo_idx = match campaign
            .promociones
            .iter()
            .position(|p| p.promocion_id == entry.promotion.id)
        {
            Some(idx) => idx,
            None => {
                campaign.promociones.push(PromotionBalance {
                    promocion_id: entry.promotion.id,
                    campania_id: entry.campaign.id,
                    nombre: entry.promotion.nombre.clone(),
                    monto_minimo: entry.promotion.montominimo,
                    saldo_inicial: saldo_anterior,
                    saldo_nuevo: Decimal::ZERO,
                    facturas: Vec::new(),
                });
                campaign.promociones.len() - 1
            }
        };
        let promotion = &mut campaign.promociones[promo_idx];
        promotion.facturas.push(invoice.clone());
        promotion.saldo_nuevo = result.saldo_nuevo;
        campaign.recompute_total();

        info!(
            "Invoice {} ({}) added to {} / {}: {} coupons, balance {} -> {}",
            invoice.numero,
            invoice.monto,
            entry.campaign.nombre,
            entry.promotion.nombre,
            invoice.numcupones,
            saldo_anterior,
            result.saldo_nuevo
        );
        Ok(invoice)
    }

    /// Removes the invoice at `index` of a promotion and undoes its contribution.
    ///
    /// When it was the promotion's last invoice the promotion disappears, and the campaign
    /// with it once it has no promotions left.
    ///
    /// # Errors
    /// * `Error::EntryNotFound` when the campaign, promotion or index does not exist
    /// * `Error::InvalidInput` when the recorded multipliers cannot be reversed
    /// * `Error::Busy` while another batch operation is in flight
    #[instrument(skip(self), fields(cliente_id = self.client.id))]
    pub async fn remove_entry(&self, campania_id: i64, promocion_id: i64, index: usize) -> Result<InvoiceEntry> {
        let _guard = self.acquire()?;
        let not_found = || Error::EntryNotFound {
            campania_id,
            promocion_id,
            index,
        };

        let mut batch = self.batch.lock().await;
        let campaign = batch.campaign_mut(campania_id).ok_or_else(not_found)?;
        let tipo = campaign.tipo_configuracion;
        let promotion = campaign.promotion_mut(promocion_id).ok_or_else(not_found)?;
        let target = promotion.facturas.get(index).ok_or_else(not_found)?;

        let reversal = if promotion.facturas.len() > 1 {
            Some(reversal::reverse(&ReversalInput {
                saldo_nuevo: promotion.saldo_nuevo,
                saldo_inicial: promotion.saldo_inicial,
                monto_minimo: promotion.monto_minimo,
                monto: target.monto,
                numcupones: target.numcupones,
                factor: target.factor,
                cupones_por_local: target.cupones_por_local,
                tipo_configuracion: tipo,
            })?)
        } else {
            None
        };

        let removed = promotion.facturas.remove(index);
        match reversal {
            Some(reversal) => {
                promotion.saldo_nuevo = reversal.saldo_nuevo;
                promotion.saldo_inicial = reversal.saldo_inicial;
                if reversal.saldo_nuevo < Decimal::ZERO || reversal.saldo_inicial < Decimal::ZERO {
                    warn!(
                        "Removing invoice {} left a negative balance on promotion {}",
                        removed.numero, promocion_id
                    );
                }
            }
            None => campaign.promociones.retain(|p| p.promocion_id != promocion_id),
        }
        campaign.recompute_total();
        if campaign.promociones.is_empty() {
            batch.campanias.retain(|c| c.id != campania_id);
        }

        info!(
            "Invoice {} removed from campaign {}, promotion {}",
            removed.numero, campania_id, promocion_id
        );
        Ok(removed)
    }

    /// A copy of the current draft.
    pub async fn snapshot(&self) -> PendingBatch {
        self.batch.lock().await.clone()
    }

    /// Coupons earned across the whole draft.
    pub async fn total_cupones(&self) -> u32 {
        self.batch.lock().await.total_cupones()
    }

    /// Discards the draft and every cached balance.
    ///
    /// # Errors
    /// Returns `Error::Busy` while another batch operation is in flight.
    pub async fn cancel(&self) -> Result<()> {
        let _guard = self.acquire()?;
        self.batch.lock().await.clear();
        self.balances.invalidate().await;
        info!("Batch for client {} discarded", self.client.id);
        Ok(())
    }

    /// Sends the draft to the backend and returns the coupon ranges to print.
    ///
    /// On success the draft is cleared and cached balances are dropped, since the backend
    /// now holds newer ones. On failure the draft is kept so the operator can retry.
    ///
    /// # Errors
    /// * `Error::Validation` when the draft is empty
    /// * `Error::SubmissionFailure` when the backend refuses or cannot be reached
    /// * `Error::Busy` while another batch operation is in flight
    #[instrument(skip(self), fields(cliente_id = self.client.id))]
    pub async fn submit(&self) -> Result<Vec<CouponPrintJob>> {
        let _guard = self.acquire()?;
        let draft = {
            let batch = self.batch.lock().await;
            if batch.is_empty() {
                return Err(Error::validation("facturas", "there are no invoices to submit"));
            }
            batch.clone()
        };

        match self.api.submit_batch(&draft).await {
            Ok(jobs) => {
                self.batch.lock().await.clear();
                self.balances.invalidate().await;
                info!(
                    "Submitted {} invoices for client {}: {} print jobs",
                    draft.entry_count(),
                    self.client.id,
                    jobs.len()
                );
                Ok(jobs)
            }
            Err(e) => {
                warn!("Submission failed, batch kept for retry: {}", e);
                Err(e)
            }
        }
    }
}
