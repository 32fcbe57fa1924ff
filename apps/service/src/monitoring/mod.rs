//! Monitoring core - due-check sweeps, probes and digest delivery.
//!
//! This module is responsible for:
//! - Executing bounded HTTP reachability probes
//! - Sweeping stored sites and alerting on unhealthy responses
//! - Composing and delivering the daily digest

pub mod digest;
pub mod notify;
pub mod probe;
pub mod sweep;
pub mod types;

#[cfg(test)]
pub mod testing;

pub use digest::DigestNotifier;
pub use notify::{Notify, TelegramNotifier};
pub use probe::{HttpProber, Probe};
pub use sweep::Sweeper;
pub use types::ProbeOutcome;
