//! Environment-driven configuration.
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `WIRETAP_ADDR` | `0.0.0.0:3000` | Listen address |
//! | `WIRETAP_AUDIT` | `on` | Emit received/responded audit entries |
//! | `WIRETAP_AUDIT_SOAP_ONLY` | `off` | Audit only calls carrying a `SOAPAction` header |
//!
//! Flags accept `1/0`, `true/false`, `yes/no`, `on/off` in any case. A value
//! that is present but malformed is an error rather than a silent default.

use std::net::SocketAddr;

use crate::error::Error;

pub const ENV_ADDR: &str = "WIRETAP_ADDR";
pub const ENV_AUDIT: &str = "WIRETAP_AUDIT";
pub const ENV_AUDIT_SOAP_ONLY: &str = "WIRETAP_AUDIT_SOAP_ONLY";

const DEFAULT_ADDR: &str = "0.0.0.0:3000";

/// Process configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub audit: AuditConfig,
}

/// Settings for [`AuditLayer`](crate::middleware::audit::AuditLayer).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditConfig {
    /// When false the layer passes calls straight through.
    pub enabled: bool,
    /// When true only calls with a non-empty `SOAPAction` header are audited.
    pub soap_only: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self { enabled: true, soap_only: false }
    }
}

impl AuditConfig {
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn soap_only(mut self, soap_only: bool) -> Self {
        self.soap_only = soap_only;
        self
    }
}

impl Config {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let addr = lookup(ENV_ADDR).unwrap_or_else(|| DEFAULT_ADDR.to_owned());
        let addr = addr
            .trim()
            .parse::<SocketAddr>()
            .map_err(|e| Error::Config(format!("{ENV_ADDR}={addr:?}: {e}")))?;

        let defaults = AuditConfig::default();
        let audit = AuditConfig {
            enabled: flag(&lookup, ENV_AUDIT, defaults.enabled)?,
            soap_only: flag(&lookup, ENV_AUDIT_SOAP_ONLY, defaults.soap_only)?,
        };

        Ok(Self { addr, audit })
    }
}

fn flag(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> Result<bool, Error> {
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "" => Ok(default),
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::Config(format!("{key}={raw:?}: expected a boolean flag"))),
    }
}
