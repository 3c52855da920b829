//! Coupon document rendering.

use crate::{config::AppSettings, entities::Client};
use chrono::{DateTime, Local};

/// Characters per line of a coupon slip.
const WIDTH: usize = 48;

const NOTE: &str = "Nota: Favor conservar sus facturas.";

/// Everything printed on one physical coupon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouponDocument {
    pub mall_name: String,
    pub numero: u64,
    pub emitido: DateTime<Local>,
    pub cliente: String,
    pub ruc: String,
    pub telefono: String,
    pub celular: String,
    pub direccion: String,
    pub campania: String,
    pub legal_notice: String,
}

impl CouponDocument {
    #[must_use]
    pub fn new(
        settings: &AppSettings,
        client: &Client,
        campania: &str,
        numero: u64,
        emitido: DateTime<Local>,
    ) -> Self {
        let field = |value: &Option<String>| value.clone().unwrap_or_default();
        Self {
            mall_name: settings.mall_name.clone(),
            numero,
            emitido,
            cliente: client.full_name(),
            ruc: client.ruc.clone(),
            telefono: field(&client.telefono),
            celular: field(&client.celular),
            direccion: field(&client.direccion),
            campania: campania.to_string(),
            legal_notice: settings.legal_notice.clone(),
        }
    }

    /// Plain-text rendition of the coupon slip.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        let separator = "-".repeat(WIDTH);

        out.push_str(&format!("{:^width$}\n", self.mall_name, width = WIDTH));
        out.push_str(&separator);
        out.push('\n');

        let rows = [
            ("NÚMERO DE CUPON", self.numero.to_string()),
            ("FECHA Y HORA", self.emitido.format("%d/%m/%Y %H:%M:%S").to_string()),
            ("CLIENTE", self.cliente.clone()),
            ("CI/RUC", self.ruc.clone()),
            ("TELÉFONO", self.telefono.clone()),
            ("CELULAR", self.celular.clone()),
            ("DIRECCIÓN", self.direccion.clone()),
            ("CAMPAÑA", self.campania.clone()),
        ];
        for (label, value) in rows {
            out.push_str(&format!("{label}: {value}\n"));
        }

        out.push_str(&separator);
        out.push('\n');
        out.push_str(NOTE);
        out.push('\n');
        for line in wrap(&self.legal_notice, WIDTH) {
            out.push_str(&line);
            out.push('\n');
        }
        out
    }
}

/// Greedy word wrap; words longer than `width` get a line of their own.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
