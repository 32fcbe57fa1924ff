use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, warn};

use super::notify::Notify;
use super::probe::Probe;
use super::types::ProbeOutcome;
use crate::database::Store;
use crate::database::models::Site;

/// Periodic sweep over all stored sites.
///
/// Due-ness is derived purely from persisted `last_check` timestamps, so
/// the sweeper is stateless and restart-safe; a fresh process picks up
/// exactly where the previous one left off.
pub struct Sweeper {
    store: Arc<dyn Store>,
    prober: Arc<dyn Probe>,
    notifier: Arc<dyn Notify>,
}

impl Sweeper {
    pub fn new(store: Arc<dyn Store>, prober: Arc<dyn Probe>, notifier: Arc<dyn Notify>) -> Self {
        Self { store, prober, notifier }
    }

    /// Drive sweeps forever on a fixed period.
    ///
    /// The sweep is awaited inside this single task, so two passes can
    /// never overlap; with `Skip`, a pass that overruns the period
    /// swallows the firings it missed instead of bursting afterwards.
    pub async fn run(self, period: Duration) {
        let mut timer = interval(period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(period_secs = period.as_secs(), "monitoring sweep started");

        loop {
            timer.tick().await;
            self.sweep(SystemTime::now()).await;
        }
    }

    /// One pass: load active sites, probe the due ones, alert on
    /// anomalies, advance their timestamps.
    ///
    /// `now` is captured once per pass so every due decision and every
    /// `record_check` in the pass agree on the same instant.
    pub async fn sweep(&self, now: SystemTime) {
        let sites = match self.store.list_active().await {
            Ok(sites) => sites,
            Err(error) => {
                error!(%error, "failed to load active sites, skipping sweep");
                return;
            }
        };

        for site in &sites {
            if !is_due(site, now) {
                continue;
            }
            self.check_site(site, now).await;
        }
    }

    async fn check_site(&self, site: &Site, now: SystemTime) {
        debug!(url = %site.url, "probing site");
        let outcome = self.prober.probe(&site.url).await;

        if !outcome.healthy() {
            let text = alert_text(&site.url, &outcome);
            if let Err(error) = self.notifier.notify(site.destination(), &text).await {
                warn!(%error, url = %site.url, "failed to deliver alert");
            }
        }

        // Advances even when the probe failed: a dead site is re-probed
        // once per its interval, not on every sweep tick.
        if let Err(error) = self.store.record_check(site.uuid, now).await {
            error!(%error, url = %site.url, "failed to record check time");
        }
    }
}

/// A site is due when at least one full interval elapsed since the last
/// probe attempt.
pub fn is_due(site: &Site, now: SystemTime) -> bool {
    let elapsed = now.duration_since(site.last_check).unwrap_or_default();
    elapsed.as_millis() >= u128::from(site.interval_minutes) * 60_000
}

fn alert_text(url: &str, outcome: &ProbeOutcome) -> String {
    let mut text = format!("⚠️ Alert for {url}\nStatus: {}", outcome.status);
    if let Some(detail) = &outcome.error {
        text.push_str(&format!("\nError: {detail}"));
    }
    text
}
