// src/outreach/prober.rs
//! Deliverability probing for a single candidate address.
//!
//! Checks run cheapest first and stop at the first failure: syntax, domain
//! shape, disposable list, MX lookup, then an SMTP `MAIL FROM` / `RCPT TO`
//! exchange against the preferred exchanger. The mailbox step is best-effort:
//! catch-all servers accept every recipient and some networks block port 25.

use async_trait::async_trait;
use lettre::Address;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

use super::config::ProbeConfig;
use crate::common::safe_email_log;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Format,
    Domain,
    Disposable,
    NoMx,
    Connect,
    Mailbox,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RejectReason::Format => "format",
            RejectReason::Domain => "domain",
            RejectReason::Disposable => "disposable",
            RejectReason::NoMx => "no-mx",
            RejectReason::Connect => "connect",
            RejectReason::Mailbox => "mailbox",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndeterminateReason {
    Timeout,
    /// 4xx reply, e.g. greylisting
    TransientReply,
}

impl fmt::Display for IndeterminateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndeterminateReason::Timeout => f.write_str("timeout"),
            IndeterminateReason::TransientReply => f.write_str("transient-reply"),
        }
    }
}

/// Outcome of probing one candidate address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected(RejectReason),
    Indeterminate(IndeterminateReason),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Accepted => f.write_str("accepted"),
            Verdict::Rejected(reason) => write!(f, "rejected({})", reason),
            Verdict::Indeterminate(reason) => write!(f, "indeterminate({})", reason),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MxLookupError {
    #[error("MX lookup timed out")]
    Timeout,

    #[error("MX lookup failed: {0}")]
    Failed(String),
}

/// Resolves the mail exchangers of a domain, most preferred first
#[async_trait]
pub trait MxLookup: Send + Sync {
    async fn lookup_mx(&self, domain: &str) -> Result<Vec<String>, MxLookupError>;
}

/// Result of the SMTP handshake against one exchanger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailboxStatus {
    Accepted,
    MailboxRejected,
    TransientReply,
    ConnectFailed,
    TimedOut,
}

/// Asks an exchanger whether it would take mail for `address`
#[async_trait]
pub trait MailboxCheck: Send + Sync {
    async fn check(&self, mx_host: &str, address: &str) -> MailboxStatus;
}

/// Anything that can classify a candidate address
#[async_trait]
pub trait AddressVerifier: Send + Sync {
    async fn probe(&self, address: &str) -> Verdict;
}

pub struct Prober {
    disposable_domains: HashSet<String>,
    dns_timeout: Duration,
    probe_timeout: Duration,
    mx: Arc<dyn MxLookup>,
    mailbox: Arc<dyn MailboxCheck>,
}

impl Prober {
    pub fn new(config: &ProbeConfig, mx: Arc<dyn MxLookup>, mailbox: Arc<dyn MailboxCheck>) -> Self {
        Self {
            disposable_domains: config
                .disposable_domains
                .iter()
                .map(|d| d.to_lowercase())
                .collect(),
            dns_timeout: config.dns_timeout,
            probe_timeout: config.probe_timeout,
            mx,
            mailbox,
        }
    }

    /// Checks that need no network access
    fn check_offline(&self, address: &str) -> Result<Address, RejectReason> {
        let parsed: Address = address.parse().map_err(|_| RejectReason::Format)?;

        let domain = parsed.domain();
        if domain.is_empty() || !domain.contains('.') {
            return Err(RejectReason::Domain);
        }

        if self.disposable_domains.contains(&domain.to_lowercase()) {
            return Err(RejectReason::Disposable);
        }

        Ok(parsed)
    }
}

#[async_trait]
impl AddressVerifier for Prober {
    async fn probe(&self, address: &str) -> Verdict {
        let parsed = match self.check_offline(address) {
            Ok(parsed) => parsed,
            Err(reason) => return Verdict::Rejected(reason),
        };
        let domain = parsed.domain();

        let hosts = match timeout(self.dns_timeout, self.mx.lookup_mx(domain)).await {
            Err(_) | Ok(Err(MxLookupError::Timeout)) => {
                return Verdict::Indeterminate(IndeterminateReason::Timeout)
            }
            Ok(Err(e)) => {
                debug!(domain = %domain, error = %e, "MX lookup failed");
                return Verdict::Rejected(RejectReason::NoMx);
            }
            Ok(Ok(hosts)) => hosts,
        };

        let mx_host = match hosts.first() {
            Some(host) => host,
            None => return Verdict::Rejected(RejectReason::NoMx),
        };

        let status = match timeout(
            self.probe_timeout,
            self.mailbox.check(mx_host, parsed.as_ref()),
        )
        .await
        {
            Ok(status) => status,
            Err(_) => MailboxStatus::TimedOut,
        };

        debug!(
            address = %safe_email_log(address),
            mx_host = %mx_host,
            status = ?status,
            "Mailbox check finished"
        );

        match status {
            MailboxStatus::Accepted => Verdict::Accepted,
            MailboxStatus::MailboxRejected => Verdict::Rejected(RejectReason::Mailbox),
            MailboxStatus::ConnectFailed => Verdict::Rejected(RejectReason::Connect),
            MailboxStatus::TransientReply => {
                Verdict::Indeterminate(IndeterminateReason::TransientReply)
            }
            MailboxStatus::TimedOut => Verdict::Indeterminate(IndeterminateReason::Timeout),
        }
    }
}
