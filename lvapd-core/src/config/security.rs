use ipnet::IpNet;
use serde::{Deserialize, Deserializer};

fn default_max_wtps() -> usize {
    256
}

fn default_ip_filter_mode() -> IpFilterMode {
    IpFilterMode::Allow
}

/// Whether `networks` in [`IpFilterConfig`] is an allow-list or deny-list.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IpFilterMode {
    Allow,
    Deny,
}

fn deserialize_ip_networks<'de, D>(deserializer: D) -> Result<Vec<IpNet>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<String> = Vec::deserialize(deserializer)?;
    raw.into_iter()
        .map(|s| s.parse::<IpNet>().map_err(serde::de::Error::custom))
        .collect()
}

/// Allowlist/denylist of WTP source addresses, mirroring the shape of a
/// reverse proxy's client ACL.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct IpFilterConfig {
    #[serde(default = "default_ip_filter_mode")]
    pub mode: IpFilterMode,
    #[serde(default, deserialize_with = "deserialize_ip_networks")]
    pub networks: Vec<IpNet>,
}

impl Default for IpFilterMode {
    fn default() -> Self {
        IpFilterMode::Allow
    }
}

/// Security-relevant bounds on the accept loop.
#[derive(Debug, Deserialize, Clone)]
pub struct SecurityConfig {
    #[serde(default = "default_max_wtps")]
    pub max_wtps: usize,
    #[serde(default)]
    pub ip_filter: IpFilterConfig,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        SecurityConfig { max_wtps: default_max_wtps(), ip_filter: IpFilterConfig::default() }
    }
}
