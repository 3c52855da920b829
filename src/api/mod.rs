//! Backend collaborator - the operations the core needs from the HTTP API.
//!
//! The core only talks to the [`PromotionsApi`] trait. [`HttpApi`] is the production
//! implementation; tests use an in-memory fake.

pub mod http;
pub mod wire;

use crate::{
    entities::{Campaign, Client, CouponPrintJob, CustomerBalance, PaymentMethod, PendingBatch},
    errors::Result,
};
use async_trait::async_trait;

pub use http::HttpApi;
pub use wire::{ApprovalRequest, OnlineSubmission, RejectionRequest};

/// Request/response contracts of the backend.
///
/// Each method maps transport and server errors to the failure kind its caller
/// must handle: lookups fail with `LookupFailure`, anything that changes
/// backend state fails with `SubmissionFailure`.
#[async_trait]
pub trait PromotionsApi: Send + Sync {
    /// Finds a client by cédula/RUC; `None` when the backend does not know it.
    async fn find_client_by_ruc(&self, ruc: &str) -> Result<Option<Client>>;

    /// Active campaigns with their promotions and stores.
    async fn active_campaigns(&self) -> Result<Vec<Campaign>>;

    /// Active payment methods with their factors.
    async fn active_payment_methods(&self) -> Result<Vec<PaymentMethod>>;

    /// Every (campaign, promotion) balance the client carries.
    async fn client_balances(&self, cliente_id: i64) -> Result<Vec<CustomerBalance>>;

    /// Submits a staff batch; returns the coupon ranges to print.
    async fn submit_batch(&self, batch: &PendingBatch) -> Result<Vec<CouponPrintJob>>;

    /// Registers a client's self-service invoice for moderation.
    async fn submit_online_invoice(&self, submission: &OnlineSubmission) -> Result<Vec<CouponPrintJob>>;

    /// Approves one pending online invoice; returns the coupon ranges to print.
    async fn approve_invoice(&self, request: &ApprovalRequest) -> Result<Vec<CouponPrintJob>>;

    /// Rejects one pending online invoice.
    async fn reject_invoice(&self, request: &RejectionRequest) -> Result<()>;
}
