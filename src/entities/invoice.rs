//! Invoice entry - one line of the working batch.

use rust_decimal::Decimal;
use serde::Serialize;

/// An invoice registered in the current batch and the coupons it earned.
///
/// `factor` and `cupones_por_local` are the multipliers in effect when the entry was
/// added. They stay on the entry so a later removal can undo its contribution with the
/// same numbers, whatever the catalog says by then. They are not part of the wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceEntry {
    pub numero: String,
    pub monto: Decimal,
    pub tienda_id: i64,
    pub tienda_nombre: String,
    pub formapago_id: i64,
    pub formapago_nombre: String,
    pub numcupones: u32,
    #[serde(skip)]
    pub factor: u32,
    #[serde(skip)]
    pub cupones_por_local: u32,
}
