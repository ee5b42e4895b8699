mod extract;
mod registry;
mod rules;
mod sampler;
mod types;

pub use extract::{extract_labeled, extract_network_identity, extract_scalars, read_value};
pub use registry::*;
pub use rules::{ExporterRules, ExtractionRule, IdentityRules, InstrumentKind, RuleSet, ScanMode};
pub use sampler::{Collector, RefreshLoopHandle};
pub use types::{CycleReport, ExtractionOutcome, NetworkIdentity};
