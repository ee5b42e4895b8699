use log::trace;

use super::registry::MetricRegistry;
use super::rules::{ExtractionRule, IdentityRules, RuleSet, ScanMode};
use super::types::{ExtractionOutcome, NetworkIdentity};
use crate::error::ExporterError;

/// Parsed value for one rule, or `None` when the rule is skipped this cycle.
/// In per-line mode the last matching line wins.
pub fn read_value(rule: &ExtractionRule, mode: ScanMode, text: &str) -> Option<f64> {
    match mode {
        ScanMode::PerLine => text
            .lines()
            .filter(|line| rule.has_marker(line))
            .filter_map(|line| parse_capture(rule, line))
            .last(),
        ScanMode::WholeText => {
            if rule.has_marker(text) {
                parse_capture(rule, text)
            } else {
                None
            }
        }
    }
}

fn parse_capture(rule: &ExtractionRule, text: &str) -> Option<f64> {
    let Some(captured) = rule.capture(text) else {
        trace!("{}: marker present but pattern did not match", rule.target);
        return None;
    };
    match captured.trim().parse::<f64>() {
        Ok(value) => Some(value),
        Err(_) => {
            trace!("{}: {:?} is not a number", rule.target, captured);
            None
        }
    }
}

/// Applies a scalar rule set and overwrites every gauge that parsed.
pub fn extract_scalars(
    text: &str,
    rules: &RuleSet,
    registry: &MetricRegistry,
) -> Result<ExtractionOutcome, ExporterError> {
    let mut outcome = ExtractionOutcome::default();
    for rule in rules.rules() {
        let value = read_value(rule, rules.mode, text);
        if let Some(value) = value {
            registry.set_scalar(rule.target, value)?;
        }
        outcome.record(value.is_some());
    }
    Ok(outcome)
}

/// Applies a labelled rule set; every write uses `identity`, which must come
/// from the same sample as `text`.
pub fn extract_labeled(
    text: &str,
    rules: &RuleSet,
    identity: &NetworkIdentity,
    registry: &MetricRegistry,
) -> Result<ExtractionOutcome, ExporterError> {
    let mut outcome = ExtractionOutcome::default();
    for rule in rules.rules() {
        let value = read_value(rule, rules.mode, text);
        if let Some(value) = value {
            registry.set_labeled(rule.target, identity, value)?;
        }
        outcome.record(value.is_some());
    }
    Ok(outcome)
}

/// Resolves `(bssid, ssid)` for a sample. Both are mandatory: without them the
/// labelled values of the cycle cannot be attributed, so absence is fatal.
pub fn extract_network_identity(
    text: &str,
    rules: &IdentityRules,
) -> Result<NetworkIdentity, ExporterError> {
    let bssid = required_capture(&rules.bssid, "BSSID", text)?;
    let ssid = required_capture(&rules.ssid, "SSID", text)?;
    Ok(NetworkIdentity::new(bssid, ssid))
}

fn required_capture<'t>(
    rule: &ExtractionRule,
    field: &'static str,
    text: &'t str,
) -> Result<&'t str, ExporterError> {
    rule.capture(text)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(ExporterError::MissingIdentity { field })
}
