//! Entity module - Contains the data shapes exchanged with the backend API.
//! Catalog entities (campaigns, promotions, stores, payment methods, clients) are
//! read-only inputs; the batch tree is built locally and sent in one submission.

pub mod balance;
pub mod batch;
pub mod campaign;
pub mod client;
pub mod coupon_job;
pub mod invoice;

pub use balance::{CustomerBalance, PromotionKey};
pub use batch::{CampaignBatch, PendingBatch, PromotionBalance};
pub use campaign::{Campaign, ConfigurationType, PaymentMethod, Promotion, Store};
pub use client::Client;
pub use coupon_job::CouponPrintJob;
pub use invoice::InvoiceEntry;
