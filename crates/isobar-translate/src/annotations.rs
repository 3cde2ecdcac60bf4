//! Recognized object annotations and their parsing.
//!
//! Malformed values never abort a recomputation: the value falls back to
//! the annotation's default semantics and a warning is logged.

use std::collections::BTreeSet;

use isobar_api::ObjectMeta;
use isobar_types::auth::tls_parameters::TlsProtocol;
use tracing::warn;

/// Object ignored unless the value matches the configured ingress class.
pub const INGRESS_CLASS: &str = "kubernetes.io/ingress.class";

/// `false` excludes the object's hosts from the HTTP listener.
pub const ALLOW_HTTP: &str = "kubernetes.io/ingress.allow-http";

/// `true` turns the object's routes into 301 HTTPS redirects on HTTP.
pub const FORCE_SSL_REDIRECT: &str = "ingress.kubernetes.io/force-ssl-redirect";

/// Per-route upstream timeout; `infinity` or an unparseable value means
/// no timeout.
pub const REQUEST_TIMEOUT: &str = "isobar.dev/request-timeout";

/// Comma-separated list of paths flagged for websocket upgrade.
pub const WEBSOCKET_ROUTES: &str = "isobar.dev/websocket-routes";

/// TLS floor for the object's HTTPS filter chains; `1.2` or `1.3`,
/// anything else means TLS 1.1.
pub const TLS_MINIMUM_PROTOCOL_VERSION: &str = "isobar.dev/tls-minimum-protocol-version";

/// Prefix of the upstream-protocol annotations; the full keys are
/// `isobar.dev/upstream-protocol.h2c` and `isobar.dev/upstream-protocol.h2`,
/// each naming a comma-separated list of port numbers or port names.
pub const UPSTREAM_PROTOCOL: &str = "isobar.dev/upstream-protocol";

/// Whether the object's hosts may appear on the HTTP listener.
pub(crate) fn allow_http(meta: &ObjectMeta) -> bool {
    meta.annotation(ALLOW_HTTP) != Some("false")
}

/// Whether the object's routes become HTTPS redirects on HTTP.
pub(crate) fn force_ssl_redirect(meta: &ObjectMeta) -> bool {
    meta.annotation(FORCE_SSL_REDIRECT) == Some("true")
}

/// The per-route upstream timeout, if the annotation is present.
///
/// A zero duration disables the timeout proxy-side; `None` leaves the proxy
/// default in place.
pub(crate) fn request_timeout(meta: &ObjectMeta) -> Option<prost_types::Duration> {
    let raw = meta.annotation(REQUEST_TIMEOUT)?;
    if raw == "infinity" {
        return Some(zero_duration());
    }
    match humantime::parse_duration(raw) {
        Ok(d) => Some(prost_types::Duration {
            seconds: d.as_secs() as i64,
            nanos: d.subsec_nanos() as i32,
        }),
        Err(err) => {
            warn!(value = raw, %err, "unparseable request-timeout annotation, treating as infinite");
            Some(zero_duration())
        }
    }
}

fn zero_duration() -> prost_types::Duration {
    prost_types::Duration {
        seconds: 0,
        nanos: 0,
    }
}

/// The set of paths flagged for websocket upgrade.
pub(crate) fn websocket_routes(meta: &ObjectMeta) -> BTreeSet<String> {
    meta.annotation(WEBSOCKET_ROUTES)
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// The port identifiers (numbers or names) upgraded to the given upstream
/// protocol (`h2c` or `h2`).
pub(crate) fn upstream_protocol_ports(meta: &ObjectMeta, protocol: &str) -> BTreeSet<String> {
    let key = format!("{UPSTREAM_PROTOCOL}.{protocol}");
    meta.annotation(&key)
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// The minimum TLS protocol version for the object's filter chains.
pub(crate) fn tls_minimum_protocol_version(meta: &ObjectMeta) -> TlsProtocol {
    match meta.annotation(TLS_MINIMUM_PROTOCOL_VERSION) {
        Some("1.3") => TlsProtocol::TlsV13,
        Some("1.2") => TlsProtocol::TlsV12,
        // any other value is interpreted as TLS/1.1
        _ => TlsProtocol::TlsV11,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta_with(key: &str, value: &str) -> ObjectMeta {
        let mut meta = ObjectMeta::new("default", "kuard");
        meta.annotations.insert(key.to_string(), value.to_string());
        meta
    }

    #[test]
    fn timeout_absent_means_unset() {
        let meta = ObjectMeta::new("default", "kuard");
        assert_eq!(request_timeout(&meta), None);
    }

    #[test]
    fn timeout_parses_durations() {
        let meta = meta_with(REQUEST_TIMEOUT, "600s");
        assert_eq!(
            request_timeout(&meta),
            Some(prost_types::Duration {
                seconds: 600,
                nanos: 0
            })
        );

        let meta = meta_with(REQUEST_TIMEOUT, "10m");
        assert_eq!(
            request_timeout(&meta),
            Some(prost_types::Duration {
                seconds: 600,
                nanos: 0
            })
        );
    }

    #[test]
    fn timeout_infinity_and_garbage_mean_zero() {
        for value in ["infinity", "600", "not a duration"] {
            let meta = meta_with(REQUEST_TIMEOUT, value);
            assert_eq!(
                request_timeout(&meta),
                Some(prost_types::Duration {
                    seconds: 0,
                    nanos: 0
                }),
                "value {value:?}"
            );
        }
    }

    #[test]
    fn websocket_routes_split_and_trim() {
        let meta = meta_with(WEBSOCKET_ROUTES, "/ws1, /ws2 ,");
        let routes = websocket_routes(&meta);
        assert!(routes.contains("/ws1"));
        assert!(routes.contains("/ws2"));
        assert_eq!(routes.len(), 2);
    }

    #[test]
    fn upstream_protocol_ports_match_numbers_and_names() {
        let meta = meta_with("isobar.dev/upstream-protocol.h2c", "80,http");
        let ports = upstream_protocol_ports(&meta, "h2c");
        assert!(ports.contains("80"));
        assert!(ports.contains("http"));
        assert!(upstream_protocol_ports(&meta, "h2").is_empty());
    }

    #[test]
    fn tls_floor_defaults_to_1_1() {
        let meta = ObjectMeta::new("default", "kuard");
        assert_eq!(tls_minimum_protocol_version(&meta), TlsProtocol::TlsV11);
        let meta = meta_with(TLS_MINIMUM_PROTOCOL_VERSION, "1.2");
        assert_eq!(tls_minimum_protocol_version(&meta), TlsProtocol::TlsV12);
        let meta = meta_with(TLS_MINIMUM_PROTOCOL_VERSION, "1.3");
        assert_eq!(tls_minimum_protocol_version(&meta), TlsProtocol::TlsV13);
        let meta = meta_with(TLS_MINIMUM_PROTOCOL_VERSION, "1.0");
        assert_eq!(tls_minimum_protocol_version(&meta), TlsProtocol::TlsV11);
    }

    #[test]
    fn allow_http_only_false_excludes() {
        assert!(allow_http(&ObjectMeta::new("default", "kuard")));
        assert!(allow_http(&meta_with(ALLOW_HTTP, "true")));
        assert!(!allow_http(&meta_with(ALLOW_HTTP, "false")));
    }
}
