//! Shared in-memory fakes for sweep, digest and command tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use uuid::Uuid;

use super::notify::Notify;
use super::probe::Probe;
use super::types::ProbeOutcome;
use crate::database::Store;
use crate::database::models::{Destination, Principal, Site};

pub fn test_site(url: &str, chat_id: i64, interval_minutes: u32, last_check: SystemTime) -> Site {
    let mut site = Site::new(
        url.into(),
        1001,
        Destination { chat_id, thread_id: None },
        interval_minutes,
    );
    site.last_check = last_check;
    site
}

/// In-memory `Store` with scriptable record-check failures.
#[derive(Default)]
pub struct MemoryStore {
    sites: Mutex<Vec<Site>>,
    principals: Mutex<Vec<Principal>>,
    recorded: Mutex<Vec<(Uuid, SystemTime)>>,
    fail_record_for: Mutex<Option<Uuid>>,
}

impl MemoryStore {
    pub fn with_sites(sites: Vec<Site>) -> Self {
        Self { sites: Mutex::new(sites), ..Self::default() }
    }

    pub fn sites(&self) -> Vec<Site> {
        self.sites.lock().unwrap().clone()
    }

    pub fn principals(&self) -> Vec<Principal> {
        self.principals.lock().unwrap().clone()
    }

    pub fn recorded_checks(&self) -> Vec<(Uuid, SystemTime)> {
        self.recorded.lock().unwrap().clone()
    }

    pub fn fail_record_check_for(&self, uuid: Uuid) {
        *self.fail_record_for.lock().unwrap() = Some(uuid);
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_active(&self) -> Result<Vec<Site>> {
        Ok(self.sites.lock().unwrap().iter().filter(|site| site.is_active).cloned().collect())
    }

    async fn list_active_for_chat(&self, chat_id: i64) -> Result<Vec<Site>> {
        Ok(self
            .sites
            .lock()
            .unwrap()
            .iter()
            .filter(|site| site.is_active && site.chat_id == chat_id)
            .cloned()
            .collect())
    }

    async fn create_site(&self, site: &Site) -> Result<i64> {
        let mut sites = self.sites.lock().unwrap();
        let id = sites.len() as i64 + 1;
        let mut site = site.clone();
        site.id = Some(id);
        sites.push(site);
        Ok(id)
    }

    async fn deactivate_site(&self, url: &str, chat_id: i64) -> Result<()> {
        for site in self.sites.lock().unwrap().iter_mut() {
            if site.url == url && site.chat_id == chat_id {
                site.is_active = false;
            }
        }
        Ok(())
    }

    async fn record_check(&self, uuid: Uuid, at: SystemTime) -> Result<()> {
        if *self.fail_record_for.lock().unwrap() == Some(uuid) {
            return Err(anyhow!("simulated store failure"));
        }

        self.recorded.lock().unwrap().push((uuid, at));
        for site in self.sites.lock().unwrap().iter_mut() {
            if site.uuid == uuid {
                site.last_check = at;
            }
        }
        Ok(())
    }

    async fn upsert_principal(&self, principal: &Principal) -> Result<()> {
        let mut principals = self.principals.lock().unwrap();
        if let Some(existing) = principals
            .iter_mut()
            .find(|p| p.user_id == principal.user_id && p.chat_id == principal.chat_id)
        {
            existing.thread_id = principal.thread_id;
            existing.is_active = true;
        } else {
            principals.push(principal.clone());
        }
        Ok(())
    }

    async fn set_daily_digest(
        &self,
        user_id: i64,
        destination: Destination,
        enabled: bool,
    ) -> Result<()> {
        let mut principals = self.principals.lock().unwrap();
        if let Some(existing) = principals
            .iter_mut()
            .find(|p| p.user_id == user_id && p.chat_id == destination.chat_id)
        {
            existing.daily_digest = enabled;
            existing.thread_id = destination.thread_id;
        } else {
            let mut principal = Principal::new(user_id, destination);
            principal.daily_digest = enabled;
            principals.push(principal);
        }
        Ok(())
    }

    async fn list_digest_principals(&self) -> Result<Vec<Principal>> {
        Ok(self
            .principals
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.is_active && p.daily_digest)
            .cloned()
            .collect())
    }
}

/// `Probe` fake returning scripted outcomes per URL.
pub struct ScriptedProbe {
    default: ProbeOutcome,
    outcomes: Mutex<HashMap<String, ProbeOutcome>>,
    probed: Mutex<Vec<String>>,
}

impl ScriptedProbe {
    pub fn new(default: ProbeOutcome) -> Self {
        Self { default, outcomes: Mutex::new(HashMap::new()), probed: Mutex::new(Vec::new()) }
    }

    pub fn healthy_everywhere() -> Self {
        Self::new(ProbeOutcome::from_status(200))
    }

    pub fn unreachable_everywhere() -> Self {
        Self::new(ProbeOutcome::failed(500, "connection refused"))
    }

    pub fn script(&self, url: &str, outcome: ProbeOutcome) {
        self.outcomes.lock().unwrap().insert(url.to_string(), outcome);
    }

    pub fn probed(&self) -> Vec<String> {
        self.probed.lock().unwrap().clone()
    }
}

#[async_trait]
impl Probe for ScriptedProbe {
    async fn probe(&self, url: &str) -> ProbeOutcome {
        self.probed.lock().unwrap().push(url.to_string());
        self.outcomes.lock().unwrap().get(url).cloned().unwrap_or_else(|| self.default.clone())
    }
}

/// `Notify` fake recording every successful delivery.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(Destination, String)>>,
    fail_next: AtomicBool,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(Destination, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail_next_send(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Notify for RecordingNotifier {
    async fn notify(&self, destination: Destination, text: &str) -> Result<()> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(anyhow!("simulated delivery failure"));
        }

        self.sent.lock().unwrap().push((destination, text.to_string()));
        Ok(())
    }
}
