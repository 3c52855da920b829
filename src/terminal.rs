//! Staff terminal - registers a client's paper invoices from a worksheet and prints the
//! coupons they earn.
//!
//! A worksheet names the client by cédula/RUC and lists the invoices, each applied to one
//! or more (campaign, promotion, payment method) rows by catalog id:
//!
//! ```toml
//! ruc = "1712345678"
//!
//! [[facturas]]
//! numero = "001-002-000123"
//! monto = "35,00"
//! tienda = 11
//! filas = [{ campania = 1, promocion = 2, formapago = 7 }]
//! ```

use crate::{
    api::PromotionsApi,
    config::AppSettings,
    core::{
        batch::{BatchSession, InvoiceDraft, PromotionRow},
        printing::{CouponPrinter, print_jobs},
    },
    entities::{Campaign, Client, PaymentMethod, PendingBatch, Store, client::is_tax_id},
    errors::{Error, Result},
};
use serde::Deserialize;
use std::{path::Path, sync::Arc};
use tracing::{info, instrument};

#[derive(Debug, Clone, Deserialize)]
pub struct Worksheet {
    pub ruc: String,
    #[serde(default)]
    pub facturas: Vec<WorksheetInvoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorksheetInvoice {
    pub numero: String,
    /// Kept as text so the amount is validated like a typed one
    pub monto: String,
    pub tienda: i64,
    pub filas: Vec<WorksheetRow>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct WorksheetRow {
    pub campania: i64,
    pub promocion: i64,
    pub formapago: i64,
}

impl Worksheet {
    /// Parses a worksheet.
    ///
    /// # Errors
    /// Returns `Error::Config` when the TOML is malformed.
    pub fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| Error::Config {
            message: format!("Failed to parse worksheet: {e}"),
        })
    }

    /// Reads and parses a worksheet file.
    ///
    /// # Errors
    /// Returns `Error::Io` if the file cannot be read, `Error::Config` if it cannot be parsed.
    pub async fn load(path: &Path) -> Result<Self> {
        let contents = tokio::fs::read_to_string(path).await?;
        Self::parse(&contents)
    }
}

/// Active catalogs the worksheet ids are resolved against.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub campaigns: Vec<Campaign>,
    pub payment_methods: Vec<PaymentMethod>,
}

impl Catalog {
    /// Loads the active campaigns and payment methods.
    ///
    /// # Errors
    /// Returns `Error::LookupFailure` when either catalog cannot be fetched.
    pub async fn load<A: PromotionsApi + ?Sized>(api: &A) -> Result<Self> {
        let campaigns = api.active_campaigns().await?;
        let payment_methods = api.active_payment_methods().await?;
        info!(
            "Catalog loaded: {} campaigns, {} payment methods",
            campaigns.len(),
            payment_methods.len()
        );
        Ok(Self {
            campaigns,
            payment_methods,
        })
    }

    fn campaign(&self, id: i64) -> Option<&Campaign> {
        self.campaigns.iter().find(|c| c.id == id)
    }

    fn payment_method(&self, id: i64) -> Option<&PaymentMethod> {
        self.payment_methods.iter().find(|p| p.id == id)
    }

    fn store(&self, id: i64) -> Option<&Store> {
        self.campaigns.iter().find_map(|c| c.store(id))
    }

    fn row(&self, row: &WorksheetRow) -> PromotionRow<'_> {
        let campaign = self.campaign(row.campania);
        PromotionRow {
            campaign,
            promotion: campaign.and_then(|c| c.promotion(row.promocion)),
            payment_method: self.payment_method(row.formapago),
        }
    }
}

/// What a terminal run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub cliente_id: i64,
    pub entries: usize,
    pub cupones: u32,
    pub printed: u64,
}

/// Looks a client up by cédula/RUC.
///
/// # Errors
/// * `Error::Validation` when the identifier is not 10 or 13 digits, or nobody is registered under it
/// * `Error::LookupFailure` when the backend cannot be reached
pub async fn find_client<A: PromotionsApi + ?Sized>(api: &A, ruc: &str) -> Result<Client> {
    let ruc = ruc.trim();
    if !is_tax_id(ruc) {
        return Err(Error::validation("ruc", "a cédula has 10 digits and a RUC 13"));
    }
    api.find_client_by_ruc(ruc)
        .await?
        .ok_or_else(|| Error::validation("ruc", format!("no client registered under {ruc}")))
}

fn log_summary(batch: &PendingBatch) {
    for campaign in &batch.campanias {
        for promotion in &campaign.promociones {
            info!(
                "{} / {}: {} invoices, {} coupons, balance {} -> {}",
                campaign.nombre,
                promotion.nombre,
                promotion.facturas.len(),
                promotion.total_cupones(),
                promotion.saldo_inicial,
                promotion.saldo_nuevo
            );
        }
        info!("{}: {} coupons", campaign.nombre, campaign.totalcupones);
    }
    info!("Batch total: {} coupons", batch.total_cupones());
}

/// Runs one worksheet end to end: client lookup, batch, submission, printing.
///
/// # Errors
/// Stops at the first failure. Nothing is submitted unless every invoice was added.
#[instrument(skip_all, fields(ruc = %worksheet.ruc))]
pub async fn run<A, P>(
    api: Arc<A>,
    printer: &P,
    settings: &AppSettings,
    usuario_id: i64,
    worksheet: &Worksheet,
) -> Result<RunReport>
where
    A: PromotionsApi + ?Sized,
    P: CouponPrinter + ?Sized,
{
    let client = find_client(&*api, &worksheet.ruc).await?;
    info!("Registering invoices for {} ({})", client.full_name(), client.id);

    let catalog = Catalog::load(&*api).await?;
    let session = BatchSession::new(api, client.clone(), usuario_id);

    for factura in &worksheet.facturas {
        let invoice = InvoiceDraft {
            numero: &factura.numero,
            monto: &factura.monto,
            store: catalog.store(factura.tienda),
        };
        let rows: Vec<PromotionRow<'_>> = factura.filas.iter().map(|row| catalog.row(row)).collect();
        session.add_invoice(invoice, &rows).await?;
    }

    let batch = session.snapshot().await;
    log_summary(&batch);

    let jobs = session.submit().await?;
    let printed = print_jobs(printer, settings, &client, jobs).await?;

    Ok(RunReport {
        cliente_id: client.id,
        entries: batch.entry_count(),
        cupones: batch.total_cupones(),
        printed,
    })
}
