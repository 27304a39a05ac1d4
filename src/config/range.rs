use crate::config::ConfigError;
use ipnet::Ipv4Net;
use regex::Regex;
use std::net::Ipv4Addr;
use std::sync::LazyLock;

static LAST_OCTET_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+\.\d+\.\d+\.)(\d+)-(\d+)$").expect("Failed to compile regex")
});

/// Expands one address entry.
///
/// Accepts a single address (`192.168.1.10`), a last-octet range (`192.168.1.100-110`,
/// inclusive) or a CIDR block (`10.0.0.0/29`, host addresses only).
pub fn parse_ip_range(entry: &str) -> Result<Vec<Ipv4Addr>, ConfigError> {
    let entry = entry.trim();
    let invalid = || ConfigError::InvalidAddress(entry.to_string());

    if entry.contains('/') {
        let net: Ipv4Net = entry.parse().map_err(|_| invalid())?;
        return Ok(net.hosts().collect());
    }

    if let Some(cap) = LAST_OCTET_RANGE.captures(entry) {
        let start: u8 = cap[2].parse().map_err(|_| invalid())?;
        let end: u8 = cap[3].parse().map_err(|_| invalid())?;
        if start > end {
            return Err(invalid());
        }

        return (start..=end)
            .map(|octet| {
                format!("{}{octet}", &cap[1])
                    .parse::<Ipv4Addr>()
                    .map_err(|_| invalid())
            })
            .collect();
    }

    entry
        .parse::<Ipv4Addr>()
        .map(|ip| vec![ip])
        .map_err(|_| invalid())
}

/// Expands every entry, then sorts and deduplicates the result.
pub fn expand_all<S: AsRef<str>>(entries: &[S]) -> Result<Vec<Ipv4Addr>, ConfigError> {
    let mut ips = Vec::new();
    for entry in entries {
        ips.extend(parse_ip_range(entry.as_ref())?);
    }
    ips.sort();
    ips.dedup();
    Ok(ips)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_address() {
        assert_eq!(
            parse_ip_range("192.168.1.10").unwrap(),
            vec![Ipv4Addr::new(192, 168, 1, 10)]
        );
        assert_eq!(
            parse_ip_range(" 10.0.0.1 ").unwrap(),
            vec![Ipv4Addr::new(10, 0, 0, 1)]
        );
    }

    #[test]
    fn last_octet_range_is_inclusive() {
        let ips = parse_ip_range("192.168.1.100-103").unwrap();
        assert_eq!(ips.len(), 4);
        assert_eq!(ips[0], Ipv4Addr::new(192, 168, 1, 100));
        assert_eq!(ips[3], Ipv4Addr::new(192, 168, 1, 103));

        assert_eq!(parse_ip_range("10.0.0.7-7").unwrap().len(), 1);
    }

    #[test]
    fn cidr_expands_hosts() {
        let ips = parse_ip_range("10.0.0.0/30").unwrap();
        assert_eq!(
            ips,
            vec![Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 2)]
        );
    }

    #[test]
    fn rejects_bad_entries() {
        for entry in [
            "192.168.1.300",
            "192.168.1.110-100",
            "192.168.1.250-300",
            "192.168.999.1-3",
            "not-an-ip",
            "10.0.0.0/33",
            "",
            "fe80::1",
        ] {
            assert!(
                matches!(parse_ip_range(entry), Err(ConfigError::InvalidAddress(_))),
                "{entry}"
            );
        }
    }

    #[test]
    fn expand_all_sorts_and_dedups() {
        let ips = expand_all(&["192.168.1.20", "192.168.1.3-4", "192.168.1.4"]).unwrap();
        assert_eq!(
            ips,
            vec![
                Ipv4Addr::new(192, 168, 1, 3),
                Ipv4Addr::new(192, 168, 1, 4),
                Ipv4Addr::new(192, 168, 1, 20),
            ]
        );
    }
}
