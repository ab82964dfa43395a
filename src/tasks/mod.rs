//! Background scheduled tasks.
//!
//! Call `spawn_all` once during startup; it detaches every job via
//! `tokio::spawn` and returns immediately.

use crate::services::PaymentService;

/// Reconciliation sweep interval.
const RECONCILE_INTERVAL_SECS: u64 = 5 * 60;

pub fn spawn_all(payment_service: PaymentService) {
    // settled payments without a ledger credit are flagged to accounting
    {
        let svc = payment_service.clone();
        tokio::spawn(async move {
            loop {
                match svc.flag_divergent().await {
                    Ok(n) if n > 0 => log::warn!("Flagged divergent payment transactions: {n}"),
                    Ok(_) => {}
                    Err(e) => log::error!("Failed to scan divergent payments: {e:?}"),
                }
                tokio::time::sleep(std::time::Duration::from_secs(RECONCILE_INTERVAL_SECS)).await;
            }
        });
    }
}
