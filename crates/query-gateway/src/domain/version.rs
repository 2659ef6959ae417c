//! Client version policy for the `/status` maintenance flag.

use crate::domain::config::StatusConfig;
use std::cmp::Ordering;

/// Parse a dotted numeric version (`"2.2.2"`). Missing trailing segments
/// compare as zero.
pub fn parse_version(s: &str) -> Option<Vec<u64>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.split('.').map(|seg| seg.trim().parse::<u64>().ok()).collect()
}

/// Segment-wise comparison, padding the shorter version with zeros.
pub fn compare_versions(a: &[u64], b: &[u64]) -> Ordering {
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| {
            let x = a.get(i).copied().unwrap_or(0);
            let y = b.get(i).copied().unwrap_or(0);
            x.cmp(&y)
        })
        .find(|ord| *ord != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

/// Decides whether a client should be told the server is in maintenance.
#[derive(Debug, Clone)]
pub struct ClientVersionPolicy {
    header: String,
    min_version: Vec<u64>,
    mobile_prefixes: Vec<String>,
}

impl ClientVersionPolicy {
    /// Build from config; an unparseable minimum disables the policy.
    pub fn new(config: &StatusConfig) -> Self {
        Self {
            header: config.client_version_header.to_ascii_lowercase(),
            min_version: parse_version(&config.min_mobile_version).unwrap_or_default(),
            mobile_prefixes: config.mobile_prefixes.clone(),
        }
    }

    /// Header name carrying the client version
    pub fn header(&self) -> &str {
        &self.header
    }

    /// `value` looks like `"android / 2.2.1"`.
    pub fn is_maintenance(&self, value: Option<&str>) -> bool {
        let Some(value) = value else {
            return false;
        };

        if !self.mobile_prefixes.iter().any(|p| value.contains(p.as_str())) {
            return false;
        }

        let Some(version) = value.split(" / ").nth(1).and_then(parse_version) else {
            return false;
        };

        compare_versions(&version, &self.min_version) == Ordering::Less
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> ClientVersionPolicy {
        ClientVersionPolicy::new(&StatusConfig::default())
    }

    #[test]
    fn test_compare_versions() {
        assert_eq!(compare_versions(&[2, 2, 1], &[2, 2, 2]), Ordering::Less);
        assert_eq!(compare_versions(&[2, 10], &[2, 2, 2]), Ordering::Greater);
        assert_eq!(compare_versions(&[2, 2], &[2, 2, 0]), Ordering::Equal);
    }

    #[test]
    fn test_old_mobile_client_is_in_maintenance() {
        let p = policy();
        assert!(p.is_maintenance(Some("android / 2.2.1")));
        assert!(p.is_maintenance(Some("ios / 1.9.0")));
        assert!(p.is_maintenance(Some("- / 2.0.0")));
    }

    #[test]
    fn test_current_or_unknown_clients_are_not() {
        let p = policy();
        assert!(!p.is_maintenance(Some("android / 2.2.2")));
        assert!(!p.is_maintenance(Some("ios / 3.0.0")));
        assert!(!p.is_maintenance(Some("firefox / 1.0.0")));
        assert!(!p.is_maintenance(Some("android / beta")));
        assert!(!p.is_maintenance(Some("none / 0.0.0")));
        assert!(!p.is_maintenance(None));
    }

    #[test]
    fn test_header_name_is_lowercased() {
        let mut config = StatusConfig::default();
        config.client_version_header = "Client-Version".into();
        assert_eq!(ClientVersionPolicy::new(&config).header(), "client-version");
    }
}
