use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use prometheus::core::Collector;
use prometheus::{Encoder, Gauge, GaugeVec, IntCounter, Opts, Registry, TextEncoder};

use super::types::NetworkIdentity;
use crate::error::ExporterError;

pub const CPU_THERMAL_LEVEL: &str = "powermetrics_cpu_thermal_level";
pub const GPU_THERMAL_LEVEL: &str = "powermetrics_gpu_thermal_level";
pub const IO_THERMAL_LEVEL: &str = "powermetrics_io_thermal_level";
pub const FAN_RPM: &str = "powermetrics_fan_rpm";
pub const CPU_DIE_TEMPERATURE: &str = "powermetrics_cpu_die_temperature";
pub const GPU_DIE_TEMPERATURE: &str = "powermetrics_gpu_die_temperature";

pub const WIFI_AGR_CTL_RSSI: &str = "wifi_agrCtlRSSI";
pub const WIFI_AGR_EXT_RSSI: &str = "wifi_agrExtRSSI";
pub const WIFI_AGR_CTL_NOISE: &str = "wifi_agrCtlNoise";
pub const WIFI_AGR_EXT_NOISE: &str = "wifi_agrExtNoise";
pub const WIFI_LAST_TX_RATE: &str = "wifi_lastTxRate";
pub const WIFI_MAX_RATE: &str = "wifi_maxRate";
pub const WIFI_MCS: &str = "wifi_mcs";
pub const WIFI_CHANNEL: &str = "wifi_channel";

pub const REFRESH_CYCLES_TOTAL: &str = "exporter_refresh_cycles_total";

pub const WIFI_LABELS: [&str; 2] = ["bssid", "ssid"];

const SCALAR_GAUGES: &[(&str, &str)] = &[
    (CPU_THERMAL_LEVEL, "CPU thermal level reported by the SMC"),
    (GPU_THERMAL_LEVEL, "GPU thermal level reported by the SMC"),
    (IO_THERMAL_LEVEL, "IO thermal level reported by the SMC"),
    (FAN_RPM, "Fan speed in rpm"),
    (CPU_DIE_TEMPERATURE, "CPU die temperature in degrees Celsius"),
    (GPU_DIE_TEMPERATURE, "GPU die temperature in degrees Celsius"),
];

const WIFI_GAUGES: &[(&str, &str)] = &[
    (WIFI_AGR_CTL_RSSI, "Aggregate control channel RSSI in dBm"),
    (WIFI_AGR_EXT_RSSI, "Aggregate extension channel RSSI in dBm"),
    (WIFI_AGR_CTL_NOISE, "Aggregate control channel noise in dBm"),
    (WIFI_AGR_EXT_NOISE, "Aggregate extension channel noise in dBm"),
    (WIFI_LAST_TX_RATE, "Last transmit rate in Mbps"),
    (WIFI_MAX_RATE, "Maximum link rate in Mbps"),
    (WIFI_MCS, "Modulation and coding scheme index"),
    (WIFI_CHANNEL, "Wi-Fi channel"),
];

struct ScalarGauge {
    gauge: Gauge,
    written: AtomicBool,
}

/// Owns every instrument the exporter publishes. All of them are registered
/// up front; only their values change afterwards.
pub struct MetricRegistry {
    registry: Registry,
    scalars: HashMap<&'static str, ScalarGauge>,
    labeled: HashMap<&'static str, GaugeVec>,
    refresh_cycles: IntCounter,
}

impl MetricRegistry {
    pub fn new() -> Result<Self, ExporterError> {
        let registry = Registry::new();

        let mut scalars = HashMap::with_capacity(SCALAR_GAUGES.len());
        for (name, help) in SCALAR_GAUGES {
            let gauge = Gauge::with_opts(Opts::new(*name, *help))?;
            registry.register(Box::new(gauge.clone()))?;
            scalars.insert(
                *name,
                ScalarGauge {
                    gauge,
                    written: AtomicBool::new(false),
                },
            );
        }

        let mut labeled = HashMap::with_capacity(WIFI_GAUGES.len());
        for (name, help) in WIFI_GAUGES {
            let vec = GaugeVec::new(Opts::new(*name, *help), &WIFI_LABELS)?;
            registry.register(Box::new(vec.clone()))?;
            labeled.insert(*name, vec);
        }

        let refresh_cycles = IntCounter::new(REFRESH_CYCLES_TOTAL, "Refresh cycles started")?;
        registry.register(Box::new(refresh_cycles.clone()))?;

        Ok(MetricRegistry {
            registry,
            scalars,
            labeled,
            refresh_cycles,
        })
    }

    pub fn set_scalar(&self, name: &str, value: f64) -> Result<(), ExporterError> {
        let entry = self
            .scalars
            .get(name)
            .ok_or_else(|| ExporterError::UnknownInstrument(name.to_string()))?;
        entry.gauge.set(value);
        entry.written.store(true, Ordering::Relaxed);
        Ok(())
    }

    /// Overwrites the value for one `(bssid, ssid)` tuple. Empty label values
    /// are rejected.
    pub fn set_labeled(
        &self,
        name: &str,
        identity: &NetworkIdentity,
        value: f64,
    ) -> Result<(), ExporterError> {
        let vec = self
            .labeled
            .get(name)
            .ok_or_else(|| ExporterError::UnknownInstrument(name.to_string()))?;
        if identity.label_values().iter().any(|label| label.is_empty()) {
            return Err(ExporterError::EmptyLabel(name.to_string()));
        }
        vec.get_metric_with_label_values(&identity.label_values())?
            .set(value);
        Ok(())
    }

    /// Current value of a scalar gauge, `None` until the first write.
    pub fn scalar(&self, name: &str) -> Option<f64> {
        let entry = self.scalars.get(name)?;
        if entry.written.load(Ordering::Relaxed) {
            Some(entry.gauge.get())
        } else {
            None
        }
    }

    /// Current value for one label tuple. Reading never creates the tuple.
    pub fn labeled(&self, name: &str, identity: &NetworkIdentity) -> Option<f64> {
        let families = self.labeled.get(name)?.collect();
        for metric in families.iter().flat_map(|family| family.get_metric()) {
            let labels = metric.get_label();
            let matches = labels.len() == WIFI_LABELS.len()
                && labels.iter().all(|pair| match pair.get_name() {
                    "bssid" => pair.get_value() == identity.bssid,
                    "ssid" => pair.get_value() == identity.ssid,
                    _ => false,
                });
            if matches {
                return Some(metric.get_gauge().get_value());
            }
        }
        None
    }

    /// Number of label tuples recorded so far for a labelled gauge.
    pub fn label_sets(&self, name: &str) -> usize {
        let Some(vec) = self.labeled.get(name) else {
            return 0;
        };
        let families = vec.collect();
        families.iter().map(|family| family.get_metric().len()).sum()
    }

    pub fn is_scalar(&self, name: &str) -> bool {
        self.scalars.contains_key(name)
    }

    pub fn is_labeled(&self, name: &str) -> bool {
        self.labeled.contains_key(name)
    }

    pub fn inc_refresh_cycles(&self) {
        self.refresh_cycles.inc();
    }

    pub fn refresh_cycles(&self) -> u64 {
        self.refresh_cycles.get()
    }

    pub fn format_type(&self) -> &'static str {
        prometheus::TEXT_FORMAT
    }

    /// Serializes the whole registry in the Prometheus text format.
    pub fn encode_text(&self) -> Result<String, ExporterError> {
        let families = self.registry.gather();
        let mut buf = Vec::new();
        TextEncoder::new().encode(&families, &mut buf)?;
        Ok(String::from_utf8(buf)?)
    }
}
