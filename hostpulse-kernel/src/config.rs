use crate::error::ConfigError;
use crate::models::{Host, HostRegistry};
use std::net::{SocketAddr, ToSocketAddrs};
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

pub const HOSTS_VAR: &str = "PI_HOSTS";
pub const LISTEN_VAR: &str = "HOSTPULSE_LISTEN";
pub const PROBE_PORT_VAR: &str = "HOSTPULSE_PROBE_PORT";
pub const CHECK_INTERVAL_VAR: &str = "HOSTPULSE_CHECK_INTERVAL_MS";
pub const DIAL_TIMEOUT_VAR: &str = "HOSTPULSE_DIAL_TIMEOUT_MS";
pub const SEND_TIMEOUT_VAR: &str = "HOSTPULSE_SEND_TIMEOUT_MS";
pub const SUBSCRIBER_BUFFER_VAR: &str = "HOSTPULSE_SUBSCRIBER_BUFFER";

/// Profondeur max de la file d'envoi d'un abonné.
pub const MAX_SUBSCRIBER_BUFFER: usize = 4096;

#[derive(Debug, Clone)]
pub struct KernelConfig {
    pub hosts: HostRegistry,
    pub listen: SocketAddr,
    pub probe_port: u16,
    pub check_interval: Duration,
    pub dial_timeout: Duration,
    pub send_timeout: Duration,
    pub subscriber_buffer: usize,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            hosts: HostRegistry::from(Vec::new()),
            listen: SocketAddr::from(([0, 0, 0, 0], 8080)),
            probe_port: 22,
            check_interval: Duration::from_secs(2),
            dial_timeout: Duration::from_secs(1),
            send_timeout: Duration::from_secs(1),
            subscriber_buffer: 16,
        }
    }
}

impl KernelConfig {
    /// Lit la configuration depuis l'environnement du process.
    pub fn load() -> Self {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Construit la configuration depuis une fonction de lookup. Une valeur
    /// invalide est loggée puis remplacée par son défaut ; rien n'est fatal ici.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let hosts = parse_hosts(lookup(HOSTS_VAR).as_deref().unwrap_or(""));

        Self {
            hosts,
            listen: or_default(parse_listen(&lookup, defaults.listen), defaults.listen),
            probe_port: or_default(
                parse_var(&lookup, PROBE_PORT_VAR, defaults.probe_port),
                defaults.probe_port,
            ),
            check_interval: or_default(
                parse_millis(&lookup, CHECK_INTERVAL_VAR, defaults.check_interval),
                defaults.check_interval,
            ),
            dial_timeout: or_default(
                parse_millis(&lookup, DIAL_TIMEOUT_VAR, defaults.dial_timeout),
                defaults.dial_timeout,
            ),
            send_timeout: or_default(
                parse_millis(&lookup, SEND_TIMEOUT_VAR, defaults.send_timeout),
                defaults.send_timeout,
            ),
            subscriber_buffer: or_default(
                parse_buffer(&lookup, defaults.subscriber_buffer),
                defaults.subscriber_buffer,
            ),
        }
    }
}

/// Découpe la liste d'hôtes séparés par des virgules (ordre et doublons
/// conservés). Entrées trimées, entrées vides ignorées : variable absente ou
/// vide → registre vide.
pub fn parse_hosts(raw: &str) -> HostRegistry {
    raw.split(',')
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(Host::from)
        .collect::<Vec<_>>()
        .into()
}

fn parse_var<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::InvalidValue {
            var,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

fn parse_millis<F>(lookup: &F, var: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let millis = parse_var(lookup, var, default.as_millis() as u64)?;
    if millis == 0 {
        return Err(ConfigError::InvalidValue {
            var,
            value: "0".into(),
            reason: "must be greater than zero".into(),
        });
    }
    Ok(Duration::from_millis(millis))
}

// mpsc::channel panique sur une capacité nulle ou au-delà de MAX_PERMITS
fn parse_buffer<F>(lookup: &F, default: usize) -> Result<usize, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let depth = parse_var(lookup, SUBSCRIBER_BUFFER_VAR, default)?;
    if !(1..=MAX_SUBSCRIBER_BUFFER).contains(&depth) {
        return Err(ConfigError::InvalidValue {
            var: SUBSCRIBER_BUFFER_VAR,
            value: depth.to_string(),
            reason: format!("must be between 1 and {MAX_SUBSCRIBER_BUFFER}"),
        });
    }
    Ok(depth)
}

/// Accepte `ip:port` ou `nom:port` (résolu une fois, première adresse).
fn parse_listen<F>(lookup: &F, default: SocketAddr) -> Result<SocketAddr, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = match lookup(LISTEN_VAR) {
        Some(raw) if !raw.trim().is_empty() => raw,
        _ => return Ok(default),
    };
    let invalid = |reason: String| ConfigError::InvalidValue {
        var: LISTEN_VAR,
        value: raw.clone(),
        reason,
    };
    if let Ok(addr) = raw.trim().parse::<SocketAddr>() {
        return Ok(addr);
    }
    raw.trim()
        .to_socket_addrs()
        .map_err(|e| invalid(e.to_string()))?
        .next()
        .ok_or_else(|| invalid("no address resolved".into()))
}

fn or_default<T: std::fmt::Debug>(parsed: Result<T, ConfigError>, default: T) -> T {
    parsed.unwrap_or_else(|e| {
        warn!("config: {e}, using default {default:?}");
        default
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn test_parse_hosts_keeps_order_and_duplicates() {
        let hosts = parse_hosts("pi1, pi2,pi1 ,10.0.0.7");
        assert_eq!(&*hosts, ["pi1", "pi2", "pi1", "10.0.0.7"]);
    }

    #[test]
    fn test_parse_hosts_empty_sources() {
        assert!(parse_hosts("").is_empty());
        assert!(parse_hosts("  ").is_empty());
        assert!(parse_hosts(",,").is_empty());
        assert_eq!(&*parse_hosts("a,,b"), ["a", "b"]);
    }

    #[test]
    fn test_missing_environment_gives_defaults() {
        let cfg = KernelConfig::from_lookup(|_| None);
        assert!(cfg.hosts.is_empty());
        assert_eq!(cfg.probe_port, 22);
        assert_eq!(cfg.check_interval, Duration::from_secs(2));
        assert_eq!(cfg.dial_timeout, Duration::from_secs(1));
        assert_eq!(cfg.listen, SocketAddr::from(([0, 0, 0, 0], 8080)));
    }

    #[test]
    fn test_overrides() {
        let cfg = KernelConfig::from_lookup(lookup_from(&[
            (HOSTS_VAR, "a,b"),
            (LISTEN_VAR, "127.0.0.1:9000"),
            (PROBE_PORT_VAR, "2222"),
            (CHECK_INTERVAL_VAR, "500"),
            (DIAL_TIMEOUT_VAR, "250"),
            (SUBSCRIBER_BUFFER_VAR, "4"),
        ]));
        assert_eq!(&*cfg.hosts, ["a", "b"]);
        assert_eq!(cfg.listen, SocketAddr::from(([127, 0, 0, 1], 9000)));
        assert_eq!(cfg.probe_port, 2222);
        assert_eq!(cfg.check_interval, Duration::from_millis(500));
        assert_eq!(cfg.dial_timeout, Duration::from_millis(250));
        assert_eq!(cfg.subscriber_buffer, 4);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let cfg = KernelConfig::from_lookup(lookup_from(&[
            (PROBE_PORT_VAR, "ssh"),
            (CHECK_INTERVAL_VAR, "0"),
            (SUBSCRIBER_BUFFER_VAR, "0"),
        ]));
        assert_eq!(cfg.probe_port, 22);
        assert_eq!(cfg.check_interval, Duration::from_secs(2));
        assert_eq!(cfg.subscriber_buffer, 16);

        for huge in ["4097", "18446744073709551615"] {
            let cfg = KernelConfig::from_lookup(lookup_from(&[(SUBSCRIBER_BUFFER_VAR, huge)]));
            assert_eq!(cfg.subscriber_buffer, 16, "{huge}");
        }
        let cfg = KernelConfig::from_lookup(lookup_from(&[(SUBSCRIBER_BUFFER_VAR, "4096")]));
        assert_eq!(cfg.subscriber_buffer, MAX_SUBSCRIBER_BUFFER);
    }

    #[test]
    fn test_listen_accepts_host_names() {
        let cfg = KernelConfig::from_lookup(lookup_from(&[(LISTEN_VAR, "localhost:9000")]));
        assert!(cfg.listen.ip().is_loopback(), "{}", cfg.listen);
        assert_eq!(cfg.listen.port(), 9000);

        let err = parse_listen(&lookup_from(&[(LISTEN_VAR, "localhost")]), cfg.listen).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var: LISTEN_VAR, .. }));
    }

    #[test]
    fn test_invalid_value_error() {
        let err = parse_var(&lookup_from(&[(PROBE_PORT_VAR, "70000")]), PROBE_PORT_VAR, 22u16)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var: PROBE_PORT_VAR, .. }));
    }
}
