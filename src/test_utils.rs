//! Shared test utilities for `CouponBuddy`.
//!
//! This module provides an in-memory backend, a printer that records what it was asked
//! to print, and builders for catalog entities with sensible defaults.

#![allow(clippy::unwrap_used)]

use crate::{
    api::{ApprovalRequest, OnlineSubmission, PromotionsApi, RejectionRequest},
    core::{coupon::CouponDocument, printing::CouponPrinter},
    entities::{
        Campaign, Client, ConfigurationType, CouponPrintJob, CustomerBalance, PaymentMethod,
        PendingBatch, Promotion, Store,
    },
    errors::{Error, Result},
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::{
    sync::{
        Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

/// In-memory stand-in for the backend.
///
/// # Defaults
/// * no balances (every pair carries zero)
/// * every submission answers with one job, `Navidad` 100..=103
/// * no failures, no delay
#[derive(Debug)]
pub struct FakeApi {
    balances: Vec<CustomerBalance>,
    balance_delay: Option<Duration>,
    clients: Vec<Client>,
    campaigns: Vec<Campaign>,
    payment_methods: Vec<PaymentMethod>,
    jobs: Vec<CouponPrintJob>,
    balance_calls: AtomicUsize,
    fail_balances: AtomicBool,
    fail_submissions: AtomicBool,
    submitted: Mutex<Vec<PendingBatch>>,
    online: Mutex<Vec<OnlineSubmission>>,
    approvals: Mutex<Vec<ApprovalRequest>>,
    rejections: Mutex<Vec<RejectionRequest>>,
}

impl Default for FakeApi {
    fn default() -> Self {
        Self {
            balances: Vec::new(),
            balance_delay: None,
            clients: Vec::new(),
            campaigns: Vec::new(),
            payment_methods: Vec::new(),
            jobs: vec![print_job("Navidad", 100, 103)],
            balance_calls: AtomicUsize::new(0),
            fail_balances: AtomicBool::new(false),
            fail_submissions: AtomicBool::new(false),
            submitted: Mutex::new(Vec::new()),
            online: Mutex::new(Vec::new()),
            approvals: Mutex::new(Vec::new()),
            rejections: Mutex::new(Vec::new()),
        }
    }
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balance(mut self, campania_id: i64, promocion_id: i64, saldo: Decimal) -> Self {
        self.balances.push(CustomerBalance {
            campania_id,
            promocion_id,
            saldo,
        });
        self
    }

    /// Makes every balance lookup take `delay` before answering.
    pub fn with_balance_delay(mut self, delay: Duration) -> Self {
        self.balance_delay = Some(delay);
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.clients.push(client);
        self
    }

    pub fn with_catalog(mut self, campaigns: Vec<Campaign>, payment_methods: Vec<PaymentMethod>) -> Self {
        self.campaigns = campaigns;
        self.payment_methods = payment_methods;
        self
    }

    pub fn with_jobs(mut self, jobs: Vec<CouponPrintJob>) -> Self {
        self.jobs = jobs;
        self
    }

    pub fn fail_balances(&self, fail: bool) {
        self.fail_balances.store(fail, Ordering::SeqCst);
    }

    pub fn fail_submissions(&self, fail: bool) {
        self.fail_submissions.store(fail, Ordering::SeqCst);
    }

    pub fn balance_calls(&self) -> usize {
        self.balance_calls.load(Ordering::SeqCst)
    }

    pub fn submitted_batches(&self) -> Vec<PendingBatch> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn online_submissions(&self) -> Vec<OnlineSubmission> {
        self.online.lock().unwrap().clone()
    }

    pub fn approvals(&self) -> Vec<ApprovalRequest> {
        self.approvals.lock().unwrap().clone()
    }

    pub fn rejections(&self) -> Vec<RejectionRequest> {
        self.rejections.lock().unwrap().clone()
    }

    fn check_submission(&self) -> Result<()> {
        if self.fail_submissions.load(Ordering::SeqCst) {
            return Err(Error::SubmissionFailure {
                message: "backend unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PromotionsApi for FakeApi {
    async fn find_client_by_ruc(&self, ruc: &str) -> Result<Option<Client>> {
        Ok(self.clients.iter().find(|c| c.ruc == ruc).cloned())
    }

    async fn active_campaigns(&self) -> Result<Vec<Campaign>> {
        Ok(self.campaigns.clone())
    }

    async fn active_payment_methods(&self) -> Result<Vec<PaymentMethod>> {
        Ok(self.payment_methods.clone())
    }

    async fn client_balances(&self, _cliente_id: i64) -> Result<Vec<CustomerBalance>> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.balance_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_balances.load(Ordering::SeqCst) {
            return Err(Error::LookupFailure {
                message: "backend unavailable".to_string(),
            });
        }
        Ok(self.balances.clone())
    }

    async fn submit_batch(&self, batch: &PendingBatch) -> Result<Vec<CouponPrintJob>> {
        self.check_submission()?;
        self.submitted.lock().unwrap().push(batch.clone());
        Ok(self.jobs.clone())
    }

    async fn submit_online_invoice(&self, submission: &OnlineSubmission) -> Result<Vec<CouponPrintJob>> {
        self.check_submission()?;
        self.online.lock().unwrap().push(submission.clone());
        Ok(Vec::new())
    }

    async fn approve_invoice(&self, request: &ApprovalRequest) -> Result<Vec<CouponPrintJob>> {
        self.check_submission()?;
        self.approvals.lock().unwrap().push(request.clone());
        Ok(self.jobs.clone())
    }

    async fn reject_invoice(&self, request: &RejectionRequest) -> Result<()> {
        self.check_submission()?;
        self.rejections.lock().unwrap().push(request.clone());
        Ok(())
    }
}

/// Printer that remembers every coupon and can be told to fail at one number.
#[derive(Debug, Default)]
pub struct RecordingPrinter {
    printed: Mutex<Vec<(u64, String)>>,
    fail_at: Option<u64>,
}

impl RecordingPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_at(numero: u64) -> Self {
        Self {
            fail_at: Some(numero),
            ..Self::default()
        }
    }

    pub fn numbers(&self) -> Vec<u64> {
        self.printed.lock().unwrap().iter().map(|(n, _)| *n).collect()
    }

    pub fn campaigns(&self) -> Vec<String> {
        self.printed.lock().unwrap().iter().map(|(_, c)| c.clone()).collect()
    }
}

#[async_trait]
impl CouponPrinter for RecordingPrinter {
    async fn print(&self, document: &CouponDocument) -> Result<()> {
        if self.fail_at == Some(document.numero) {
            return Err(Error::Io(std::io::Error::other("paper jam")));
        }
        self.printed
            .lock()
            .unwrap()
            .push((document.numero, document.campania.clone()));
        Ok(())
    }
}

/// A registered client, Ana Paredes, cédula 1712345678.
pub fn identified_client(id: i64) -> Client {
    Client {
        id,
        nombre: "Ana".to_string(),
        apellidos: "Paredes".to_string(),
        ruc: "1712345678".to_string(),
        telefono: Some("022345678".to_string()),
        celular: Some("0991234567".to_string()),
        direccion: Some("Av. Mariscal Sucre".to_string()),
        ..Client::default()
    }
}

/// A campaign with the given `(promotion id, threshold)` pairs and one store, `Kiosko`.
pub fn campaign(
    id: i64,
    nombre: &str,
    tipo_configuracion: ConfigurationType,
    promociones: &[(i64, Decimal)],
) -> Campaign {
    Campaign {
        id,
        nombre: nombre.to_string(),
        tipo_configuracion,
        promociones: promociones
            .iter()
            .map(|(id, montominimo)| Promotion {
                id: *id,
                nombre: format!("Promocion {id}"),
                montominimo: *montominimo,
            })
            .collect(),
        tiendas: vec![store(11, "Kiosko", 1)],
    }
}

pub fn store(id: i64, nombre: &str, numcupones: u32) -> Store {
    Store {
        id,
        nombre: nombre.to_string(),
        numcupones,
    }
}

pub fn payment_method(id: i64, nombre: &str, factor: u32) -> PaymentMethod {
    PaymentMethod {
        id,
        nombre: nombre.to_string(),
        factor,
    }
}

pub fn print_job(campania: &str, ultimo_cupon_impreso: u64, ultimo_cupon_imprimir: u64) -> CouponPrintJob {
    CouponPrintJob {
        campania: campania.to_string(),
        ultimo_cupon_impreso,
        ultimo_cupon_imprimir,
    }
}
