//! Approval business logic - moderation of invoices clients submitted online.
//!
//! Each approval is its own transaction: the carried balance is fetched fresh for the
//! (client, campaign, promotion) triple every time, never taken from an earlier preview
//! or batch. Staff first look at an [`ApprovalPreview`] and then confirm it.

use crate::{
    api::{ApprovalRequest, PromotionsApi, RejectionRequest, wire::{ApprovedCampaign, ApprovedPromotion}},
    core::accrual::{self, AccrualInput},
    entities::{
        Campaign, Client, ConfigurationType, CouponPrintJob, PaymentMethod, Promotion, PromotionKey,
        Store, balance::balance_for,
    },
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// A client-submitted invoice waiting for moderation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingInvoice {
    pub id: i64,
    pub numero: String,
    pub monto: Decimal,
    pub cliente: Client,
    pub tienda: Store,
    pub formapago: PaymentMethod,
}

/// What approving an invoice would do, for staff to confirm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalPreview {
    pub factura_id: i64,
    pub campania_id: i64,
    pub campania_nombre: String,
    pub tipo_configuracion: ConfigurationType,
    pub promocion_id: i64,
    pub monto_minimo: Decimal,
    pub saldo_anterior: Decimal,
    pub total: Decimal,
    pub cupones: u32,
    pub saldo_nuevo: Decimal,
}

impl ApprovalPreview {
    fn request(&self, usuario_id: i64) -> ApprovalRequest {
        ApprovalRequest {
            factura_id: self.factura_id,
            promocion: ApprovedPromotion {
                id: self.promocion_id,
                montominimo: self.monto_minimo,
                nuevo_saldo: self.saldo_nuevo,
            },
            usuario_id,
            numcupones: self.cupones,
            campania: ApprovedCampaign {
                id: self.campania_id,
                nombre: self.campania_nombre.clone(),
                tipo_configuracion: self.tipo_configuracion,
            },
        }
    }
}

/// Staff-side moderation of online invoices.
pub struct ApprovalDesk<A: PromotionsApi + ?Sized> {
    api: Arc<A>,
    usuario_id: i64,
}

impl<A: PromotionsApi + ?Sized> ApprovalDesk<A> {
    pub const fn new(api: Arc<A>, usuario_id: i64) -> Self {
        Self { api, usuario_id }
    }

    fn check_operator(&self) -> Result<()> {
        if self.usuario_id <= 0 {
            return Err(Error::validation("usuario", "operator is not identified"));
        }
        Ok(())
    }

    /// Computes the accrual the invoice would produce under `promotion`.
    ///
    /// # Errors
    /// * `Error::Validation` when the client is unidentified or the promotion is not part of the campaign
    /// * `Error::LookupFailure` when the balance cannot be fetched
    /// * `Error::InvalidInput` from the calculator
    #[instrument(skip(self, invoice, campaign, promotion), fields(factura_id = invoice.id))]
    pub async fn preview(
        &self,
        invoice: &PendingInvoice,
        campaign: &Campaign,
        promotion: &Promotion,
    ) -> Result<ApprovalPreview> {
        self.check_operator()?;
        if !invoice.cliente.is_identified() {
            return Err(Error::validation("cliente", "invoice has no identified client"));
        }
        if campaign.promotion(promotion.id).is_none() {
            return Err(Error::validation(
                "promocion",
                format!("promotion {} does not belong to campaign {}", promotion.nombre, campaign.nombre),
            ));
        }

        let tipo = campaign.tipo_configuracion;
        let saldo_anterior = if tipo.accumulates() {
            let balances = self.api.client_balances(invoice.cliente.id).await?;
            balance_for(&balances, PromotionKey::new(campaign.id, promotion.id))
        } else {
            Decimal::ZERO
        };

        let result = accrual::calculate(&AccrualInput {
            saldo_anterior,
            monto_factura: invoice.monto,
            monto_minimo: promotion.montominimo,
            factor: invoice.formapago.factor,
            cupones_por_local: invoice.tienda.numcupones,
            tipo_configuracion: tipo,
        })?;

        Ok(ApprovalPreview {
            factura_id: invoice.id,
            campania_id: campaign.id,
            campania_nombre: campaign.nombre.clone(),
            tipo_configuracion: tipo,
            promocion_id: promotion.id,
            monto_minimo: promotion.montominimo,
            saldo_anterior,
            total: result.total,
            cupones: result.cupones,
            saldo_nuevo: result.saldo_nuevo,
        })
    }

    /// Sends a confirmed preview and returns the coupon ranges to print.
    ///
    /// # Errors
    /// Returns `Error::SubmissionFailure` when the backend refuses or cannot be reached;
    /// the invoice stays pending and the preview can be re-sent.
    #[instrument(skip(self, preview), fields(factura_id = preview.factura_id))]
    pub async fn approve(&self, preview: &ApprovalPreview) -> Result<Vec<CouponPrintJob>> {
        self.check_operator()?;
        let jobs = self
            .api
            .approve_invoice(&preview.request(self.usuario_id))
            .await
            .inspect_err(|e| warn!("Approval of invoice {} failed: {}", preview.factura_id, e))?;
        info!(
            "Invoice {} approved: {} coupons, new balance {}",
            preview.factura_id, preview.cupones, preview.saldo_nuevo
        );
        Ok(jobs)
    }

    /// Rejects an invoice with the reason shown to the client.
    ///
    /// # Errors
    /// * `Error::Validation` when the reason is blank
    /// * `Error::SubmissionFailure` when the backend refuses or cannot be reached
    #[instrument(skip(self, observacion))]
    pub async fn reject(&self, factura_id: i64, observacion: &str) -> Result<()> {
        self.check_operator()?;
        let observacion = observacion.trim();
        if observacion.is_empty() {
            return Err(Error::validation("observacion", "a rejection reason is required"));
        }
        self.api
            .reject_invoice(&RejectionRequest {
                factura_id,
                observacion: observacion.to_string(),
                usuario_id: self.usuario_id,
            })
            .await?;
        info!("Invoice {} rejected", factura_id);
        Ok(())
    }
}
