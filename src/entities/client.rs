//! Client entity - the shopper who earns coupons.

use serde::{Deserialize, Serialize};

/// Client identity as returned by the backend's client lookup.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,
    pub nombre: String,
    #[serde(default)]
    pub apellidos: String,
    /// Cédula (10 digits) or RUC (13 digits)
    pub ruc: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub direccion: Option<String>,
    #[serde(default)]
    pub telefono: Option<String>,
    #[serde(default)]
    pub celular: Option<String>,
}

impl Client {
    /// First and last names joined for display.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.nombre, self.apellidos).trim().to_string()
    }

    /// A client counts as identified once the backend has assigned an id and
    /// the tax identifier is known.
    #[must_use]
    pub fn is_identified(&self) -> bool {
        self.id > 0 && !self.ruc.trim().is_empty()
    }
}

/// Whether a string can be a cédula (10 digits) or RUC (13 digits).
#[must_use]
pub fn is_tax_id(candidate: &str) -> bool {
    matches!(candidate.len(), 10 | 13) && candidate.chars().all(|c| c.is_ascii_digit())
}
