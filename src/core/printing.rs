//! Printing business logic - walks server-assigned coupon ranges, one coupon per number.
//!
//! [`PrintSequencer`] is the pure state machine:
//!
//! ```text
//! Ready --start--> Printing(n) --printed--> Printing(n + 1) ... --exhausted--> Transitioning(5)
//! Transitioning(1) --tick--> Ready (next job) | Finished
//! Printing(n) --failed--> Failed(n) --resume--> Printing(n)
//! ```
//!
//! [`print_jobs`] drives it against a [`CouponPrinter`] with real pacing. Dropping that
//! future abandons the sequence; nothing about partial progress is kept, since the
//! backend recorded the whole range when it issued the job.

use crate::{
    config::AppSettings,
    core::coupon::CouponDocument,
    entities::{Client, CouponPrintJob},
    errors::{Error, Result},
};
use async_trait::async_trait;
use chrono::Local;
use std::{path::PathBuf, time::Duration};
use tracing::{debug, error, info, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintState {
    /// Positioned at the start of the current job, waiting for `start`
    Ready,
    /// `numero` is the next coupon to print
    Printing { numero: u64 },
    /// Current job exhausted; seconds left before moving on
    Transitioning { remaining: u32 },
    Finished,
    /// Printing `numero` failed; the sequence holds there
    Failed { numero: u64 },
}

#[derive(Debug, Clone)]
pub struct PrintSequencer {
    jobs: Vec<CouponPrintJob>,
    job_index: usize,
    countdown_secs: u32,
    state: PrintState,
}

impl PrintSequencer {
    /// A sequencer over `jobs`; with no jobs it starts out finished.
    #[must_use]
    pub fn new(jobs: Vec<CouponPrintJob>, countdown_secs: u32) -> Self {
        let state = if jobs.is_empty() {
            PrintState::Finished
        } else {
            PrintState::Ready
        };
        Self {
            jobs,
            job_index: 0,
            countdown_secs,
            state,
        }
    }

    #[must_use]
    pub const fn state(&self) -> PrintState {
        self.state
    }

    #[must_use]
    pub fn current_job(&self) -> Option<&CouponPrintJob> {
        self.jobs.get(self.job_index)
    }

    /// The coupon number that prints next, if the sequence is printing.
    #[must_use]
    pub const fn current_number(&self) -> Option<u64> {
        match self.state {
            PrintState::Printing { numero } => Some(numero),
            _ => None,
        }
    }

    /// Begins printing the current job. Returns `false` outside `Ready`.
    pub fn start(&mut self) -> bool {
        if self.state != PrintState::Ready {
            return false;
        }
        match self.current_job().map(CouponPrintJob::first_number) {
            Some(first) => self.settle(first),
            None => self.state = PrintState::Finished,
        }
        true
    }

    /// Advances past the coupon that just printed. Returns `false` outside `Printing`.
    pub fn mark_printed(&mut self) -> bool {
        match self.state {
            PrintState::Printing { numero } => {
                self.settle(numero.checked_add(1));
                true
            }
            _ => false,
        }
    }

    /// Holds the sequence at the coupon that failed to print.
    pub fn mark_failed(&mut self) -> bool {
        match self.state {
            PrintState::Printing { numero } => {
                self.state = PrintState::Failed { numero };
                true
            }
            _ => false,
        }
    }

    /// Retries from the coupon that failed.
    pub fn resume(&mut self) -> bool {
        match self.state {
            PrintState::Failed { numero } => {
                self.state = PrintState::Printing { numero };
                true
            }
            _ => false,
        }
    }

    /// One second of the between-jobs countdown.
    pub fn tick(&mut self) -> PrintState {
        if let PrintState::Transitioning { remaining } = self.state {
            if remaining > 1 {
                self.state = PrintState::Transitioning {
                    remaining: remaining - 1,
                };
            } else if self.job_index + 1 < self.jobs.len() {
                self.job_index += 1;
                self.state = PrintState::Ready;
            } else {
                self.state = PrintState::Finished;
            }
        }
        self.state
    }

    fn settle(&mut self, numero: Option<u64>) {
        let last = self
            .current_job()
            .map_or(0, |job| job.ultimo_cupon_imprimir);
        self.state = match numero {
            Some(numero) if numero <= last => PrintState::Printing { numero },
            _ => PrintState::Transitioning {
                remaining: self.countdown_secs,
            },
        };
    }
}

/// Something that can put a coupon on paper.
#[async_trait]
pub trait CouponPrinter: Send + Sync {
    /// Returns once the document has been handed to the device.
    async fn print(&self, document: &CouponDocument) -> Result<()>;
}

/// Writes each coupon as a text file, `cupon-000123.txt`, for a spooler to pick up.
#[derive(Debug, Clone)]
pub struct FilePrinter {
    dir: PathBuf,
}

impl FilePrinter {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl CouponPrinter for FilePrinter {
    async fn print(&self, document: &CouponDocument) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(format!("cupon-{:06}.txt", document.numero));
        tokio::fs::write(&path, document.render()).await?;
        debug!("Coupon {} written to {}", document.numero, path.display());
        Ok(())
    }
}

/// Prints every coupon of `jobs` in order and returns how many were printed.
///
/// Each coupon is followed by `print.delay_ms` of pause; each job by a countdown of
/// `print.countdown_secs` seconds.
///
/// # Errors
/// Returns `Error::PrintFailure` for the first coupon the printer rejects. Coupons
/// before it have been printed; none after it are attempted.
#[instrument(skip_all, fields(cliente_id = client.id, jobs = jobs.len()))]
pub async fn print_jobs<P>(
    printer: &P,
    settings: &AppSettings,
    client: &Client,
    jobs: Vec<CouponPrintJob>,
) -> Result<u64>
where
    P: CouponPrinter + ?Sized,
{
    let delay = Duration::from_millis(settings.print.delay_ms);
    let mut sequencer = PrintSequencer::new(jobs, settings.print.countdown_secs);
    let mut printed = 0;

    loop {
        match sequencer.state() {
            PrintState::Ready => {
                if let Some(job) = sequencer.current_job() {
                    info!("Printing {} coupons for campaign {}", job.count(), job.campania);
                }
                sequencer.start();
            }
            PrintState::Printing { numero } => {
                let campania = sequencer
                    .current_job()
                    .map(|job| job.campania.clone())
                    .unwrap_or_default();
                let document = CouponDocument::new(settings, client, &campania, numero, Local::now());
                if let Err(e) = printer.print(&document).await {
                    sequencer.mark_failed();
                    error!("Coupon {} failed to print: {}", numero, e);
                    return Err(Error::PrintFailure {
                        number: numero,
                        message: e.to_string(),
                    });
                }
                printed += 1;
                tokio::time::sleep(delay).await;
                sequencer.mark_printed();
            }
            PrintState::Transitioning { remaining } => {
                debug!("Next campaign in {}s", remaining);
                tokio::time::sleep(Duration::from_secs(1)).await;
                sequencer.tick();
            }
            PrintState::Finished => break,
            PrintState::Failed { numero } => {
                return Err(Error::PrintFailure {
                    number: numero,
                    message: "sequence halted".to_string(),
                });
            }
        }
    }

    info!("Printed {} coupons", printed);
    Ok(printed)
}
