//! Core business logic - framework-agnostic accrual, batch, approval and printing flows.
//!
//! Everything here talks to the backend through [`crate::api::PromotionsApi`] and to the
//! printer through [`printing::CouponPrinter`], so it runs the same against fakes in tests.

pub mod accrual;
pub mod approval;
pub mod balances;
pub mod batch;
pub mod coupon;
pub mod printing;
pub mod reversal;
pub mod self_service;
