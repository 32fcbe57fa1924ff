use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures::future::join_all;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info};

use super::notify::Notify;
use super::probe::Probe;
use super::types::ProbeOutcome;
use crate::database::Store;
use crate::database::models::{Principal, Site};

/// Daily health summary for principals who opted in.
///
/// Runs independently of the per-site interval logic and probes every
/// site fresh; the sweep's results are not reused.
pub struct DigestNotifier {
    store: Arc<dyn Store>,
    prober: Arc<dyn Probe>,
    notifier: Arc<dyn Notify>,
}

impl DigestNotifier {
    pub fn new(store: Arc<dyn Store>, prober: Arc<dyn Probe>, notifier: Arc<dyn Notify>) -> Self {
        Self { store, prober, notifier }
    }

    pub async fn run(self, period: Duration) {
        let mut timer = interval(period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // The first tick fires immediately; skip it so enabling the
        // digest does not trigger an instant send on every restart.
        timer.tick().await;

        info!(period_secs = period.as_secs(), "digest notifier started");

        loop {
            timer.tick().await;
            self.send_digests().await;
        }
    }

    /// One digest pass over all opted-in principals; a failure for one
    /// principal never blocks the others.
    pub async fn send_digests(&self) {
        let principals = match self.store.list_digest_principals().await {
            Ok(principals) => principals,
            Err(error) => {
                error!(%error, "failed to load digest principals, skipping pass");
                return;
            }
        };

        for principal in &principals {
            if let Err(error) = self.send_digest(principal).await {
                error!(%error, chat_id = principal.chat_id, "failed to send daily digest");
            }
        }
    }

    async fn send_digest(&self, principal: &Principal) -> Result<()> {
        let sites = self.store.list_active_for_chat(principal.chat_id).await?;
        if sites.is_empty() {
            return Ok(());
        }

        let outcomes = join_all(sites.iter().map(|site| self.prober.probe(&site.url))).await;

        let header = format!("📊 Daily digest for {}", chrono::Utc::now().format("%Y-%m-%d"));
        let text = format!("{header}\n{}", compose_digest(&sites, &outcomes));

        self.notifier.notify(principal.destination(), &text).await
    }
}

/// One line per site: health glyph, URL, condensed interval, and the
/// status code when something is off.
pub fn compose_digest(sites: &[Site], outcomes: &[ProbeOutcome]) -> String {
    sites
        .iter()
        .zip(outcomes)
        .map(|(site, outcome)| {
            let annotation = format_interval(site.interval_minutes);
            if outcome.healthy() {
                format!("✅ {} ({annotation})", site.url)
            } else {
                format!("⚠️ {} ({annotation}): status {}", site.url, outcome.status)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Condense minutes into the largest whole unit: `30m`, `2h`, `3d`.
pub fn format_interval(minutes: u32) -> String {
    if minutes >= 1440 && minutes % 1440 == 0 {
        format!("{}d", minutes / 1440)
    } else if minutes >= 60 && minutes % 60 == 0 {
        format!("{}h", minutes / 60)
    } else {
        format!("{minutes}m")
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use crate::database::models::Destination;
    use crate::monitoring::testing::{MemoryStore, RecordingNotifier, ScriptedProbe, test_site};

    #[test]
    fn intervals_condense_to_the_largest_whole_unit() {
        assert_eq!(format_interval(30), "30m");
        assert_eq!(format_interval(60), "1h");
        assert_eq!(format_interval(120), "2h");
        assert_eq!(format_interval(1440), "1d");
        assert_eq!(format_interval(10080), "7d");
        assert_eq!(format_interval(90), "90m");
    }

    #[test]
    fn digest_lines_carry_glyphs_and_annotations() {
        let now = SystemTime::now();
        let sites = vec![
            test_site("https://up.example", -1, 30, now),
            test_site("https://down.example", -1, 120, now),
        ];
        let outcomes = vec![ProbeOutcome::from_status(200), ProbeOutcome::from_status(503)];

        let digest = compose_digest(&sites, &outcomes);
        let lines: Vec<&str> = digest.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "✅ https://up.example (30m)");
        assert_eq!(lines[1], "⚠️ https://down.example (2h): status 503");
    }

    #[tokio::test]
    async fn principals_without_sites_get_no_message() {
        let store = Arc::new(MemoryStore::default());
        store
            .set_daily_digest(1001, Destination { chat_id: -1, thread_id: None }, true)
            .await
            .unwrap();

        let prober = Arc::new(ScriptedProbe::healthy_everywhere());
        let notifier = Arc::new(RecordingNotifier::default());

        DigestNotifier::new(store, prober.clone(), notifier.clone()).send_digests().await;

        assert!(notifier.sent().is_empty());
        assert!(prober.probed().is_empty());
    }

    #[tokio::test]
    async fn one_failing_delivery_does_not_block_other_principals() {
        let now = SystemTime::now();
        let store = Arc::new(MemoryStore::with_sites(vec![
            test_site("https://a.example", -1, 30, now),
            test_site("https://b.example", -2, 60, now),
        ]));
        store
            .set_daily_digest(1001, Destination { chat_id: -1, thread_id: None }, true)
            .await
            .unwrap();
        store
            .set_daily_digest(2002, Destination { chat_id: -2, thread_id: None }, true)
            .await
            .unwrap();

        let prober = Arc::new(ScriptedProbe::healthy_everywhere());
        let notifier = Arc::new(RecordingNotifier::default());
        notifier.fail_next_send();

        DigestNotifier::new(store, prober, notifier.clone()).send_digests().await;

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, Destination { chat_id: -2, thread_id: None });
        assert!(sent[0].1.contains("Daily digest"));
        assert!(sent[0].1.contains("✅ https://b.example (1h)"));
    }
}
