//! Request and response bodies of the backend API.
//!
//! Catalog responses are loosely typed on the backend side (a store's coupon count or a
//! campaign's configuration type may arrive as a string or a number), so they are read
//! into records first and converted into entities, skipping rows that cannot be used.

use crate::entities::{Campaign, Client, ConfigurationType, CustomerBalance, PaymentMethod, Promotion, Store};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Paginated list envelope used by catalog endpoints.
#[derive(Debug, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub struct CampaignRecord {
    pub id: i64,
    pub nombre: String,
    #[serde(default)]
    pub configuracion: Option<ConfigurationRecord>,
    #[serde(default)]
    pub promociones: Option<Vec<PromotionRecord>>,
    #[serde(default)]
    pub tiendas: Option<Vec<StoreRecord>>,
}

#[derive(Debug, Deserialize)]
pub struct ConfigurationRecord {
    pub descripcion: Value,
}

#[derive(Debug, Deserialize)]
pub struct PromotionRecord {
    pub id: i64,
    pub nombre: String,
    pub montominimo: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct StoreRecord {
    pub id: i64,
    pub nombre: String,
    pub numcupones: Value,
}

fn as_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl CampaignRecord {
    /// Converts the record, or `None` when its configuration type is unusable.
    #[must_use]
    pub fn into_campaign(self) -> Option<Campaign> {
        let tipo = self
            .configuracion
            .as_ref()
            .and_then(|c| as_u32(&c.descripcion))
            .and_then(|code| u8::try_from(code).ok())
            .and_then(|code| ConfigurationType::try_from(code).ok());

        let Some(tipo_configuracion) = tipo else {
            warn!("Skipping campaign {} ({}): no usable configuration type", self.id, self.nombre);
            return None;
        };

        let promociones = self
            .promociones
            .unwrap_or_default()
            .into_iter()
            .map(|p| Promotion {
                id: p.id,
                nombre: p.nombre,
                montominimo: p.montominimo,
            })
            .collect();

        let tiendas = self
            .tiendas
            .unwrap_or_default()
            .into_iter()
            .filter_map(|s| match as_u32(&s.numcupones) {
                Some(numcupones) => Some(Store {
                    id: s.id,
                    nombre: s.nombre,
                    numcupones,
                }),
                None => {
                    warn!("Skipping store {} ({}): invalid numcupones {}", s.id, s.nombre, s.numcupones);
                    None
                }
            })
            .collect();

        Some(Campaign {
            id: self.id,
            nombre: self.nombre,
            tipo_configuracion,
            promociones,
            tiendas,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct PaymentMethodRecord {
    pub id: i64,
    pub nombre: String,
    pub factor: Value,
}

impl PaymentMethodRecord {
    /// Converts the record; a missing or zero factor counts as 1.
    #[must_use]
    pub fn into_payment_method(self) -> PaymentMethod {
        let factor = as_u32(&self.factor).filter(|f| *f > 0).unwrap_or(1);
        PaymentMethod {
            id: self.id,
            nombre: self.nombre,
            factor,
        }
    }
}

/// Client lookup response; an empty object means "not registered".
#[derive(Debug, Deserialize)]
pub struct ClientLookupResponse {
    #[serde(rename = "clienteExistente", default)]
    pub cliente_existente: Option<Value>,
}

impl ClientLookupResponse {
    /// Extracts the client, if the backend returned one.
    ///
    /// # Errors
    /// Returns a JSON error when a non-empty client object has the wrong shape.
    pub fn into_client(self) -> serde_json::Result<Option<Client>> {
        match self.cliente_existente {
            Some(Value::Object(map)) if !map.is_empty() => {
                serde_json::from_value(Value::Object(map)).map(Some)
            }
            _ => Ok(None),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BalanceLookupRequest {
    pub cliente_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct BalanceLookupResponse {
    #[serde(default)]
    pub data: Vec<CustomerBalance>,
}

/// Body of an online-invoice approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApprovalRequest {
    pub factura_id: i64,
    pub promocion: ApprovedPromotion,
    pub usuario_id: i64,
    pub numcupones: u32,
    pub campania: ApprovedCampaign,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApprovedPromotion {
    pub id: i64,
    pub montominimo: Decimal,
    #[serde(rename = "nuevoSaldo")]
    pub nuevo_saldo: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApprovedCampaign {
    pub id: i64,
    pub nombre: String,
    pub tipo_configuracion: ConfigurationType,
}

/// Body of an online-invoice rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectionRequest {
    pub factura_id: i64,
    pub observacion: String,
    pub usuario_id: i64,
}

/// Body of a client's self-service invoice submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OnlineSubmission {
    #[serde(rename = "facturasCliente")]
    pub facturas_cliente: OnlineInvoiceBatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OnlineInvoiceBatch {
    pub cliente_id: i64,
    pub ruc: String,
    pub campanias: Vec<OnlineCampaignInvoice>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OnlineCampaignInvoice {
    pub id: i64,
    pub factura: OnlineInvoice,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OnlineInvoice {
    pub numero: String,
    pub monto: Decimal,
    pub tienda_id: i64,
    pub formapago_id: i64,
    /// Invoice header photo as a base64 data URL
    pub imagen: String,
    /// Payment voucher photo as a base64 data URL, empty when not required
    pub voucher: String,
}
