//! Process-wide translation settings, fixed at start-up.

/// Ingress class served when none is configured.
pub const DEFAULT_INGRESS_CLASS: &str = "isobar";

pub(crate) const DEFAULT_HTTP_LISTENER_ADDRESS: &str = "0.0.0.0";
pub(crate) const DEFAULT_HTTP_LISTENER_PORT: u32 = 8080;
pub(crate) const DEFAULT_HTTP_ACCESS_LOG: &str = "/dev/stdout";
pub(crate) const DEFAULT_HTTPS_LISTENER_ADDRESS: &str = DEFAULT_HTTP_LISTENER_ADDRESS;
pub(crate) const DEFAULT_HTTPS_LISTENER_PORT: u32 = 8443;
pub(crate) const DEFAULT_HTTPS_ACCESS_LOG: &str = DEFAULT_HTTP_ACCESS_LOG;

/// Settings the translator consults while deriving configuration.
///
/// Unset fields fall back to the defaults above via the accessor methods.
#[derive(Debug, Clone, Default)]
pub struct TranslatorConfig {
    /// Ingress class this instance serves.
    /// If not set, defaults to [`DEFAULT_INGRESS_CLASS`].
    pub ingress_class: Option<String>,

    /// The proxy's HTTP (non-TLS) listener address.
    pub http_address: Option<String>,

    /// The proxy's HTTP (non-TLS) listener port.
    pub http_port: Option<u32>,

    /// The proxy's HTTP (non-TLS) access log path.
    pub http_access_log: Option<String>,

    /// The proxy's HTTPS (TLS) listener address.
    pub https_address: Option<String>,

    /// The proxy's HTTPS (TLS) listener port.
    pub https_port: Option<u32>,

    /// The proxy's HTTPS (TLS) access log path.
    pub https_access_log: Option<String>,

    /// Configure listeners to expect a PROXY protocol header on new
    /// connections.
    pub use_proxy_proto: bool,
}

impl TranslatorConfig {
    pub(crate) fn ingress_class(&self) -> &str {
        self.ingress_class.as_deref().unwrap_or(DEFAULT_INGRESS_CLASS)
    }

    pub(crate) fn http_address(&self) -> &str {
        self.http_address
            .as_deref()
            .unwrap_or(DEFAULT_HTTP_LISTENER_ADDRESS)
    }

    pub(crate) fn http_port(&self) -> u32 {
        self.http_port.unwrap_or(DEFAULT_HTTP_LISTENER_PORT)
    }

    pub(crate) fn http_access_log(&self) -> &str {
        self.http_access_log
            .as_deref()
            .unwrap_or(DEFAULT_HTTP_ACCESS_LOG)
    }

    pub(crate) fn https_address(&self) -> &str {
        self.https_address
            .as_deref()
            .unwrap_or(DEFAULT_HTTPS_LISTENER_ADDRESS)
    }

    pub(crate) fn https_port(&self) -> u32 {
        self.https_port.unwrap_or(DEFAULT_HTTPS_LISTENER_PORT)
    }

    pub(crate) fn https_access_log(&self) -> &str {
        self.https_access_log
            .as_deref()
            .unwrap_or(DEFAULT_HTTPS_ACCESS_LOG)
    }
}
