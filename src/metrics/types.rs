use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Label tuple shared by every `wifi_*` gauge in a cycle.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetworkIdentity {
    pub bssid: String,
    pub ssid: String,
}

impl NetworkIdentity {
    pub fn new(bssid: impl Into<String>, ssid: impl Into<String>) -> Self {
        NetworkIdentity {
            bssid: bssid.into(),
            ssid: ssid.into(),
        }
    }

    /// Label values in the order the gauges were declared with.
    pub fn label_values(&self) -> [&str; 2] {
        [self.bssid.as_str(), self.ssid.as_str()]
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionOutcome {
    pub updated: usize,
    pub skipped: usize,
}

impl ExtractionOutcome {
    pub(crate) fn record(&mut self, applied: bool) {
        if applied {
            self.updated += 1;
        } else {
            self.skipped += 1;
        }
    }
}

/// Summary of one refresh cycle.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CycleReport {
    pub collected_at: DateTime<Utc>,
    pub latency_ms: u32,
    pub powermetrics: ExtractionOutcome,
    pub airport: ExtractionOutcome,
    pub identity: NetworkIdentity,
}

impl CycleReport {
    pub fn new(
        collected_at: DateTime<Utc>,
        latency: Duration,
        powermetrics: ExtractionOutcome,
        airport: ExtractionOutcome,
        identity: NetworkIdentity,
    ) -> Self {
        CycleReport {
            collected_at,
            latency_ms: latency.as_millis().min(u32::MAX as u128) as u32,
            powermetrics,
            airport,
            identity,
        }
    }
}
