// src/outreach/config.rs
//! Outreach pipeline configuration, resolved once at startup

use std::collections::HashSet;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required config: {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Authenticated submission relay used for outbound mail
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Envelope and header sender
    pub from_address: String,
    pub timeout: Duration,
}

/// Bounds and identities used while probing candidate mailboxes
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub smtp_port: u16,
    pub connect_timeout: Duration,
    pub dns_timeout: Duration,
    /// Upper bound on a whole probe, handshake included
    pub probe_timeout: Duration,
    pub helo_name: String,
    pub placeholder_sender: String,
    /// Lower-cased domains rejected without any network traffic
    pub disposable_domains: HashSet<String>,
}

/// Static MIME layout values
#[derive(Debug, Clone)]
pub struct MessageConfig {
    pub mixed_boundary: String,
    pub alternative_boundary: String,
}

#[derive(Debug, Clone)]
pub enum ResumeSource {
    Local(PathBuf),
    Remote(String),
}

#[derive(Debug, Clone)]
pub struct OutreachConfig {
    pub relay: RelayConfig,
    pub probe: ProbeConfig,
    pub message: MessageConfig,
    pub resume: ResumeSource,
    pub max_concurrent_attempts: usize,
}

pub const DEFAULT_DISPOSABLE_DOMAINS: [&str; 3] = ["mailinator.com", "tempmail.com", "10minutemail.com"];

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            smtp_port: 25,
            connect_timeout: Duration::from_secs(10),
            dns_timeout: Duration::from_secs(5),
            probe_timeout: Duration::from_secs(30),
            helo_name: "localhost".to_string(),
            placeholder_sender: "noreply@example.com".to_string(),
            disposable_domains: DEFAULT_DISPOSABLE_DOMAINS
                .iter()
                .map(|d| d.to_string())
                .collect(),
        }
    }
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            mixed_boundary: "MIXED-BOUNDARY-123456".to_string(),
            alternative_boundary: "ALT-BOUNDARY-654321".to_string(),
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value }),
        _ => Ok(None),
    }
}

fn required_env(key: &'static str) -> Result<String, ConfigError> {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(key))
}

impl ProbeConfig {
    /// Load probe settings, starting from defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(port) = parse_env::<u16>("PROBE_SMTP_PORT")? {
            config.smtp_port = port;
        }
        if let Some(secs) = parse_env::<u64>("PROBE_CONNECT_TIMEOUT_SECS")? {
            config.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_env::<u64>("PROBE_DNS_TIMEOUT_SECS")? {
            config.dns_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_env::<u64>("PROBE_TIMEOUT_SECS")? {
            config.probe_timeout = Duration::from_secs(secs);
        }
        if let Ok(helo) = env::var("PROBE_HELO_NAME") {
            if !helo.trim().is_empty() {
                config.helo_name = helo.trim().to_string();
            }
        }
        if let Ok(sender) = env::var("PROBE_SENDER") {
            if !sender.trim().is_empty() {
                config.placeholder_sender = sender.trim().to_string();
            }
        }

        // DISPOSABLE_DOMAINS extends the built-in list
        if let Ok(extra) = env::var("DISPOSABLE_DOMAINS") {
            config.disposable_domains.extend(
                extra
                    .split(',')
                    .map(|s| s.trim().to_lowercase())
                    .filter(|s| !s.is_empty()),
            );
        }

        Ok(config)
    }
}

impl OutreachConfig {
    /// Load the full pipeline configuration.
    ///
    /// Relay credentials and a resume source are required; everything else
    /// has a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let username = required_env("SMTP_USERNAME")?;
        let relay = RelayConfig {
            host: required_env("SMTP_RELAY_HOST")?,
            port: parse_env::<u16>("SMTP_RELAY_PORT")?.unwrap_or(587),
            password: required_env("SMTP_PASSWORD")?,
            from_address: env::var("SMTP_FROM")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| username.clone()),
            username,
            timeout: Duration::from_secs(parse_env::<u64>("SMTP_RELAY_TIMEOUT_SECS")?.unwrap_or(30)),
        };

        let resume = match (env::var("RESUME_URL").ok(), env::var("RESUME_PATH").ok()) {
            (Some(url), _) if !url.trim().is_empty() => ResumeSource::Remote(url.trim().to_string()),
            (_, Some(path)) if !path.trim().is_empty() => ResumeSource::Local(PathBuf::from(path.trim())),
            _ => ResumeSource::Local(PathBuf::from("resume.pdf")),
        };

        let mut message = MessageConfig::default();
        if let Ok(boundary) = env::var("MIME_MIXED_BOUNDARY") {
            if !boundary.trim().is_empty() {
                message.mixed_boundary = boundary.trim().to_string();
            }
        }
        if let Ok(boundary) = env::var("MIME_ALT_BOUNDARY") {
            if !boundary.trim().is_empty() {
                message.alternative_boundary = boundary.trim().to_string();
            }
        }

        let max_concurrent_attempts = parse_env::<usize>("OUTREACH_MAX_CONCURRENCY")?
            .unwrap_or(8)
            .max(1);

        Ok(Self {
            relay,
            probe: ProbeConfig::from_env()?,
            message,
            resume,
            max_concurrent_attempts,
        })
    }
}
