//! Expiry scheduler
//!
//! A recurring background task that sweeps stale, unpaid bookings and
//! releases their capacity. The scheduler owns no state of its own;
//! correctness rests entirely on the expiry timestamps stored on each
//! booking, so a restart only delays the next sweep.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::services::BookingService;

/// Recurring driver for `BookingService::process_expired_bookings`
pub struct ExpiryScheduler {
    booking_service: BookingService,
    interval: Duration,
    shutdown: Option<watch::Sender<bool>>,
    handle: Option<JoinHandle<()>>,
}

impl ExpiryScheduler {
    /// Create a new ExpiryScheduler instance; `start` must be called to
    /// begin sweeping.
    pub fn new(booking_service: BookingService, interval: Duration) -> Self {
        Self {
            booking_service,
            interval,
            shutdown: None,
            handle: None,
        }
    }

    /// Spawn the sweep loop: one sweep immediately, then one per interval.
    ///
    /// Sweep errors are logged and never stop future ticks. Calling `start`
    /// on a running scheduler is a no-op.
    pub fn start(&mut self) {
        if self.handle.is_some() {
            return;
        }

        let (tx, mut rx) = watch::channel(false);
        let service = self.booking_service.clone();
        let period = self.interval;

        let handle = tokio::spawn(async move {
            info!(interval_seconds = period.as_secs(), "Expiry scheduler started");

            // The first tick of an interval completes immediately, which
            // doubles as the sweep-at-startup.
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => run_sweep(&service).await,
                    changed = rx.changed() => {
                        if changed.is_err() || *rx.borrow() {
                            break;
                        }
                    }
                }
            }

            info!("Expiry scheduler stopped");
        });

        self.shutdown = Some(tx);
        self.handle = Some(handle);
    }

    /// Stop future ticks and wait for the loop to wind down. An in-flight
    /// sweep finishes; it is never rolled back.
    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(true);
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

async fn run_sweep(service: &BookingService) {
    match service.process_expired_bookings().await {
        Ok(0) => debug!("Expiry sweep found nothing to do"),
        Ok(expired) => info!(expired = expired, "Expiry sweep completed"),
        Err(e) => error!(error = %e, "Expiry sweep failed"),
    }
}
