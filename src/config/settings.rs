//! Terminal settings loading from config.toml
//!
//! Settings cover the printed coupon texts, the pacing of the print sequence and
//! the rules applied to invoices that clients submit online. Every key has a
//! default, so a missing file is not an error; a file that exists but cannot be
//! parsed is.

use crate::errors::{Error, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_MALL_NAME: &str = "SCALA SHOPPING";
const DEFAULT_LEGAL_NOTICE: &str = "El cliente para participar en la promoción confiere voluntariamente \
sus datos personales, y autoriza a que los mismos sean recopilados y utilizados para las campañas \
del Centro Comercial, tratados de conformidad con la Ley Orgánica de Protección de Datos Personales. \
Estos no serán transferidos a terceros.";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Header printed at the top of every coupon
    pub mall_name: String,
    /// Data-protection notice printed at the bottom of every coupon
    pub legal_notice: String,
    /// Coupon print pacing
    pub print: PrintSettings,
    /// Rules for client-submitted invoices
    pub online: OnlineSettings,
}

/// Pacing of the coupon print sequence
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PrintSettings {
    /// Pause after each printed coupon, in milliseconds
    pub delay_ms: u64,
    /// Countdown between two campaigns, in seconds
    pub countdown_secs: u32,
    /// Directory where the file printer drops coupon documents
    pub output_dir: PathBuf,
}

/// Validation rules for the self-service invoice form
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OnlineSettings {
    /// Smallest invoice amount a client may submit
    pub minimum_amount: Decimal,
    /// Payment method ids whose invoices must carry a voucher image
    pub voucher_payment_methods: Vec<i64>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            mall_name: DEFAULT_MALL_NAME.to_string(),
            legal_notice: DEFAULT_LEGAL_NOTICE.to_string(),
            print: PrintSettings::default(),
            online: OnlineSettings::default(),
        }
    }
}

impl Default for PrintSettings {
    fn default() -> Self {
        Self {
            delay_ms: 100,
            countdown_secs: 5,
            output_dir: PathBuf::from("cupones"),
        }
    }
}

impl Default for OnlineSettings {
    fn default() -> Self {
        Self {
            minimum_amount: Decimal::TEN,
            voucher_payment_methods: vec![13],
        }
    }
}

/// Parses settings from TOML text.
///
/// # Errors
/// Returns `Error::Config` when the TOML syntax or a value type is invalid.
pub fn parse_settings(contents: &str) -> Result<AppSettings> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads settings from a TOML file, falling back to defaults when the file is absent.
///
/// # Errors
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<AppSettings> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load settings from: {:?}", path_ref);

    if !path_ref.exists() {
        tracing::info!("No settings file at {:?}, using defaults", path_ref);
        return Ok(AppSettings::default());
    }

    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {path_ref:?}: {e}"),
    })?;
    parse_settings(&contents)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_full_settings() {
        let toml_str = r#"
            mall_name = "CENTRO NORTE"
            legal_notice = "Aviso"

            [print]
            delay_ms = 250
            countdown_secs = 3
            output_dir = "/tmp/cupones"

            [online]
            minimum_amount = "15.50"
            voucher_payment_methods = [13, 14]
        "#;

        let settings = parse_settings(toml_str).unwrap();
        assert_eq!(settings.mall_name, "CENTRO NORTE");
        assert_eq!(settings.legal_notice, "Aviso");
        assert_eq!(settings.print.delay_ms, 250);
        assert_eq!(settings.print.countdown_secs, 3);
        assert_eq!(settings.print.output_dir, PathBuf::from("/tmp/cupones"));
        assert_eq!(settings.online.minimum_amount, dec!(15.50));
        assert_eq!(settings.online.voucher_payment_methods, vec![13, 14]);
    }

    #[test]
    fn test_partial_settings_keep_defaults() {
        let settings = parse_settings("[print]\ncountdown_secs = 2\n").unwrap();
        assert_eq!(settings.mall_name, DEFAULT_MALL_NAME);
        assert_eq!(settings.print.countdown_secs, 2);
        assert_eq!(settings.print.delay_ms, 100);
        assert_eq!(settings.online.minimum_amount, dec!(10));
    }

    #[test]
    fn test_invalid_settings_are_config_errors() {
        let result = parse_settings("[print]\ndelay_ms = \"fast\"\n");
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings(dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings.print.countdown_secs, 5);
        assert_eq!(settings.online.voucher_payment_methods, vec![13]);
    }
}
