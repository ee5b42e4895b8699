use regex::Regex;

use super::registry::{
    MetricRegistry, CPU_DIE_TEMPERATURE, CPU_THERMAL_LEVEL, FAN_RPM, GPU_DIE_TEMPERATURE,
    GPU_THERMAL_LEVEL, IO_THERMAL_LEVEL, WIFI_AGR_CTL_NOISE, WIFI_AGR_CTL_RSSI,
    WIFI_AGR_EXT_NOISE, WIFI_AGR_EXT_RSSI, WIFI_CHANNEL, WIFI_LAST_TX_RATE, WIFI_MAX_RATE,
    WIFI_MCS,
};
use crate::error::ExporterError;

// $ sudo powermetrics --samplers smc -i1 -n1
// **** SMC sensors ****
//
// CPU Thermal level: 77
// GPU Thermal level: 27
// IO Thermal level: 27
// Fan: 3906.89 rpm
// CPU die temperature: 74.80 C
// GPU die temperature: 70.00 C
const POWERMETRICS_RULES: &[(&str, &str, &str)] = &[
    ("CPU Thermal level:", r"^CPU Thermal level: (\d+)$", CPU_THERMAL_LEVEL),
    ("GPU Thermal level:", r"^GPU Thermal level: (\d+)$", GPU_THERMAL_LEVEL),
    ("IO Thermal level:", r"^IO Thermal level: (\d+)$", IO_THERMAL_LEVEL),
    ("Fan:", r"^Fan: (\d+(?:\.\d+)?) rpm$", FAN_RPM),
    ("CPU die temperature:", r"^CPU die temperature: (\d+(?:\.\d+)?) C.*", CPU_DIE_TEMPERATURE),
    ("GPU die temperature:", r"^GPU die temperature: (\d+(?:\.\d+)?) C.*", GPU_DIE_TEMPERATURE),
];

// $ airport -I
//      agrCtlRSSI: -62
//      agrExtRSSI: 0
//     agrCtlNoise: -96
//     agrExtNoise: 0
//      lastTxRate: 270
//         maxRate: 600
//           BSSID: 44:d9:e7:f8:b3:0
//            SSID: Goosenet
//             MCS: 4
//         channel: 149,1
const AIRPORT_RULES: &[(&str, &str, &str)] = &[
    ("agrCtlRSSI", r"\s+agrCtlRSSI: (.*)\s+", WIFI_AGR_CTL_RSSI),
    ("agrExtRSSI", r"\s+agrExtRSSI: (.*)\s+", WIFI_AGR_EXT_RSSI),
    ("agrCtlNoise", r"\s+agrCtlNoise: (.*)\s+", WIFI_AGR_CTL_NOISE),
    ("agrExtNoise", r"\s+agrExtNoise: (.*)\s+", WIFI_AGR_EXT_NOISE),
    ("lastTxRate", r"\s+lastTxRate: (.*)\s+", WIFI_LAST_TX_RATE),
    ("maxRate", r"\s+maxRate: (.*)\s+", WIFI_MAX_RATE),
    ("MCS", r"\s+MCS: (.*)\s+", WIFI_MCS),
    ("channel", r"\s+channel: (.*)\s+", WIFI_CHANNEL),
];

const BSSID_PATTERN: &str = r"\s+BSSID: (\w+:\w+:\w+:\w+:\w+:\w+)\s+";
const SSID_PATTERN: &str = r"\s+SSID: (.*)\s+";

/// How a rule set looks for its marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanMode {
    /// Each line is checked on its own; patterns are anchored to the line.
    PerLine,
    /// Marker and pattern are applied to the whole sample.
    WholeText,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstrumentKind {
    Scalar,
    Labeled,
}

#[derive(Clone, Debug)]
pub struct ExtractionRule {
    pub marker: &'static str,
    pub target: &'static str,
    pattern: Regex,
}

impl ExtractionRule {
    /// Compiles `pattern` and checks it has exactly one capture group.
    pub fn new(
        marker: &'static str,
        pattern: &str,
        target: &'static str,
    ) -> Result<Self, ExporterError> {
        let pattern = Regex::new(pattern).map_err(|source| ExporterError::Pattern {
            instrument: target,
            source,
        })?;
        let groups = pattern.captures_len() - 1;
        if groups != 1 {
            return Err(ExporterError::InvalidRule {
                instrument: target,
                groups,
            });
        }
        Ok(ExtractionRule {
            marker,
            target,
            pattern,
        })
    }

    pub fn has_marker(&self, text: &str) -> bool {
        text.contains(self.marker)
    }

    pub fn capture<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.pattern
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

#[derive(Clone, Debug)]
pub struct RuleSet {
    pub source: &'static str,
    pub mode: ScanMode,
    pub kind: InstrumentKind,
    rules: Vec<ExtractionRule>,
}

impl RuleSet {
    pub fn new(
        source: &'static str,
        mode: ScanMode,
        kind: InstrumentKind,
        rules: Vec<ExtractionRule>,
    ) -> Self {
        RuleSet {
            source,
            mode,
            kind,
            rules,
        }
    }

    fn from_table(
        source: &'static str,
        mode: ScanMode,
        kind: InstrumentKind,
        table: &[(&'static str, &str, &'static str)],
    ) -> Result<Self, ExporterError> {
        let rules = table
            .iter()
            .map(|&(marker, pattern, target)| ExtractionRule::new(marker, pattern, target))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RuleSet::new(source, mode, kind, rules))
    }

    pub fn rules(&self) -> &[ExtractionRule] {
        &self.rules
    }

    /// Every target must exist in the registry with the matching kind.
    pub fn validate(&self, registry: &MetricRegistry) -> Result<(), ExporterError> {
        for rule in &self.rules {
            let known = match self.kind {
                InstrumentKind::Scalar => registry.is_scalar(rule.target),
                InstrumentKind::Labeled => registry.is_labeled(rule.target),
            };
            if !known {
                return Err(ExporterError::UnknownInstrument(rule.target.to_string()));
            }
        }
        Ok(())
    }
}

/// The mandatory `(bssid, ssid)` captures of an airport sample.
#[derive(Clone, Debug)]
pub struct IdentityRules {
    pub bssid: ExtractionRule,
    pub ssid: ExtractionRule,
}

/// All rule tables the refresh loop runs, compiled once at startup.
#[derive(Clone, Debug)]
pub struct ExporterRules {
    pub powermetrics: RuleSet,
    pub airport: RuleSet,
    pub identity: IdentityRules,
}

impl ExporterRules {
    pub fn standard() -> Result<Self, ExporterError> {
        Ok(ExporterRules {
            powermetrics: RuleSet::from_table(
                "powermetrics",
                ScanMode::PerLine,
                InstrumentKind::Scalar,
                POWERMETRICS_RULES,
            )?,
            airport: RuleSet::from_table(
                "airport",
                ScanMode::WholeText,
                InstrumentKind::Labeled,
                AIRPORT_RULES,
            )?,
            identity: IdentityRules {
                bssid: ExtractionRule::new("BSSID", BSSID_PATTERN, "bssid")?,
                ssid: ExtractionRule::new("SSID", SSID_PATTERN, "ssid")?,
            },
        })
    }

    pub fn validate(&self, registry: &MetricRegistry) -> Result<(), ExporterError> {
        self.powermetrics.validate(registry)?;
        self.airport.validate(registry)
    }
}
