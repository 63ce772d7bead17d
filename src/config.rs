mod probe_config;
mod raw_config;

use url::Url;

pub use self::{probe_config::ProbeConfig, raw_config::RawConfig};

/// Main collector config.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Defines whether every processed report and policy change should be logged.
    pub verbose: bool,
    /// Defines whether captured violation reports should be collected at all.
    pub enabled: bool,
    /// Base URL the probe policies send violation reports to.
    pub report_endpoint: Url,
}

impl From<RawConfig> for Config {
    fn from(raw_config: RawConfig) -> Self {
        Self {
            verbose: raw_config.verbose,
            enabled: raw_config.enabled,
            report_endpoint: raw_config.probe.report_endpoint,
        }
    }
}
