// src/config.rs

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const AIRPORT_PATH: &str =
    "/System/Library/PrivateFrameworks/Apple80211.framework/Versions/Current/Resources/airport";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl SourceCommand {
    pub fn new(program: &str, args: &[&str]) -> Self {
        SourceCommand {
            program: program.to_string(),
            args: args.iter().map(|arg| arg.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExporterConfig {
    pub listen_addr: String,           // Default: 0.0.0.0:9003
    pub refresh_interval_secs: u64,    // Default: 2 seconds
    pub powermetrics: SourceCommand,   // Default: powermetrics --samplers smc -i1 -n1
    pub airport: SourceCommand,        // Default: airport -I
}

impl ExporterConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

impl Default for ExporterConfig {
    fn default() -> Self {
        ExporterConfig {
            listen_addr: "0.0.0.0:9003".to_string(),
            refresh_interval_secs: 2,
            powermetrics: SourceCommand::new("powermetrics", &["--samplers", "smc", "-i1", "-n1"]),
            airport: SourceCommand::new(AIRPORT_PATH, &["-I"]),
        }
    }
}

// Global configuration
lazy_static! {
    pub static ref EXPORTER_CONFIG: ExporterConfig = ExporterConfig::default();
}
