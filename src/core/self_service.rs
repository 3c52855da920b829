//! Self-service business logic - a client registering one invoice online.
//!
//! No accrual happens here. The invoice is stored by the backend as pending and only
//! earns coupons once staff approve it (see [`crate::core::approval`]).

use crate::{
    api::{
        OnlineSubmission, PromotionsApi,
        wire::{OnlineCampaignInvoice, OnlineInvoice, OnlineInvoiceBatch},
    },
    config::OnlineSettings,
    core::accrual,
    entities::{Campaign, Client, CouponPrintJob, PaymentMethod, Store},
    errors::{Error, Result},
};
use base64::{Engine as _, engine::general_purpose};
use std::path::Path;
use tracing::{info, instrument};

/// A photo picked by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Reads an image from disk.
    ///
    /// # Errors
    /// Returns `Error::Io` if the file cannot be read.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { file_name, bytes })
    }

    /// Only PNG and JPEG photos are accepted.
    #[must_use]
    pub fn mime_type(&self) -> Option<&'static str> {
        let extension = Path::new(&self.file_name)
            .extension()?
            .to_string_lossy()
            .to_ascii_lowercase();
        match extension.as_str() {
            "png" => Some("image/png"),
            "jpg" | "jpeg" => Some("image/jpeg"),
            _ => None,
        }
    }

    /// Encodes the image as a `data:<mime>;base64,<payload>` URL.
    ///
    /// # Errors
    /// Returns `Error::Validation` on `field` for empty files and unsupported formats.
    pub fn to_data_url(&self, field: &str) -> Result<String> {
        let mime = self
            .mime_type()
            .ok_or_else(|| Error::validation(field, "only PNG, JPG or JPEG files are allowed"))?;
        if self.bytes.is_empty() {
            return Err(Error::validation(field, format!("{} is empty", self.file_name)));
        }
        Ok(format!(
            "data:{mime};base64,{}",
            general_purpose::STANDARD.encode(&self.bytes)
        ))
    }
}

/// The client-facing invoice form.
#[derive(Debug, Clone, Copy, Default)]
pub struct OnlineInvoiceForm<'a> {
    pub campaign: Option<&'a Campaign>,
    pub store: Option<&'a Store>,
    pub payment_method: Option<&'a PaymentMethod>,
    pub numero: &'a str,
    pub monto: &'a str,
    /// Photo of the invoice header; must show the client's data
    pub imagen: Option<&'a ImageUpload>,
    /// Payment voucher, required for some payment methods
    pub voucher: Option<&'a ImageUpload>,
    pub acepta_terminos: bool,
}

/// Validates the form and builds the submission body.
///
/// # Errors
/// Returns `Error::Validation` naming the first field that fails.
pub fn build_submission(
    client: &Client,
    form: &OnlineInvoiceForm<'_>,
    settings: &OnlineSettings,
) -> Result<OnlineSubmission> {
    if !client.is_identified() {
        return Err(Error::validation("cliente", "client must be signed in"));
    }
    let campaign = form
        .campaign
        .ok_or_else(|| Error::validation("campania", "select a campaign"))?;
    let store = form
        .store
        .ok_or_else(|| Error::validation("tienda", "select a store"))?;
    let payment_method = form
        .payment_method
        .ok_or_else(|| Error::validation("formapago", "select a payment method"))?;
    let numero = form.numero.trim();
    if numero.is_empty() {
        return Err(Error::validation("numero", "invoice number is required"));
    }
    let monto = accrual::parse_amount("monto", form.monto)?;
    if monto < settings.minimum_amount {
        return Err(Error::validation(
            "monto",
            format!("invoice amount must be at least {}", settings.minimum_amount),
        ));
    }
    let imagen = form
        .imagen
        .ok_or_else(|| Error::validation("imagen", "upload the invoice header"))?
        .to_data_url("imagen")?;
    let voucher = match form.voucher {
        Some(upload) => upload.to_data_url("voucher")?,
        None if settings.voucher_payment_methods.contains(&payment_method.id) => {
            return Err(Error::validation(
                "voucher",
                format!("{} requires a voucher image", payment_method.nombre),
            ));
        }
        None => String::new(),
    };
    if !form.acepta_terminos {
        return Err(Error::validation("terminos", "terms must be accepted"));
    }

    Ok(OnlineSubmission {
        facturas_cliente: OnlineInvoiceBatch {
            cliente_id: client.id,
            ruc: client.ruc.clone(),
            campanias: vec![OnlineCampaignInvoice {
                id: campaign.id,
                factura: OnlineInvoice {
                    numero: numero.to_string(),
                    monto,
                    tienda_id: store.id,
                    formapago_id: payment_method.id,
                    imagen,
                    voucher,
                },
            }],
        },
    })
}

/// Validates and sends a client's invoice for moderation.
///
/// # Errors
/// * `Error::Validation` when the form is incomplete; nothing is sent
/// * `Error::SubmissionFailure` when the backend refuses or cannot be reached
#[instrument(skip_all, fields(cliente_id = client.id))]
pub async fn submit_online_invoice<A>(
    api: &A,
    client: &Client,
    form: &OnlineInvoiceForm<'_>,
    settings: &OnlineSettings,
) -> Result<Vec<CouponPrintJob>>
where
    A: PromotionsApi + ?Sized,
{
    let submission = build_submission(client, form, settings)?;
    let jobs = api.submit_online_invoice(&submission).await?;
    info!(
        "Online invoice {} submitted by client {}",
        form.numero.trim(),
        client.id
    );
    Ok(jobs)
}
