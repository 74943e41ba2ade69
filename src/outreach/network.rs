// src/outreach/network.rs
//! Real DNS and SMTP backends for the prober

use async_trait::async_trait;
use lettre::transport::smtp::client::SmtpConnection;
use lettre::transport::smtp::commands::{Mail, Rcpt};
use lettre::transport::smtp::extension::ClientId;
use lettre::Address;
use std::time::Duration;
use tracing::{debug, warn};
use trust_dns_resolver::error::{ResolveError, ResolveErrorKind};
use trust_dns_resolver::TokioAsyncResolver;

use super::config::ProbeConfig;
use super::prober::{MailboxCheck, MailboxStatus, MxLookup, MxLookupError};
use crate::common::safe_email_log;

/// MX resolution through the system resolver configuration
pub struct DnsMxLookup {
    resolver: TokioAsyncResolver,
}

impl DnsMxLookup {
    pub fn from_system_conf() -> Result<Self, ResolveError> {
        Ok(Self {
            resolver: TokioAsyncResolver::tokio_from_system_conf()?,
        })
    }
}

#[async_trait]
impl MxLookup for DnsMxLookup {
    async fn lookup_mx(&self, domain: &str) -> Result<Vec<String>, MxLookupError> {
        let lookup = self.resolver.mx_lookup(domain).await.map_err(|e| match e.kind() {
            ResolveErrorKind::Timeout => MxLookupError::Timeout,
            _ => MxLookupError::Failed(e.to_string()),
        })?;

        let mut records: Vec<(u16, String)> = lookup
            .iter()
            .map(|mx| {
                (
                    mx.preference(),
                    mx.exchange().to_utf8().trim_end_matches('.').to_string(),
                )
            })
            .filter(|(_, host)| !host.is_empty())
            .collect();
        records.sort_by_key(|(preference, _)| *preference);

        debug!(domain = %domain, count = records.len(), "Resolved MX records");
        Ok(records.into_iter().map(|(_, host)| host).collect())
    }
}

/// `MAIL FROM` / `RCPT TO` probe over a plain SMTP session.
///
/// lettre's connection is blocking, so every probe runs on the blocking pool.
/// The connect timeout also bounds each command read and write.
#[derive(Clone)]
pub struct SmtpMailboxCheck {
    port: u16,
    timeout: Duration,
    helo_name: String,
    sender: String,
}

impl SmtpMailboxCheck {
    pub fn new(config: &ProbeConfig) -> Self {
        Self {
            port: config.smtp_port,
            timeout: config.connect_timeout,
            helo_name: config.helo_name.clone(),
            sender: config.placeholder_sender.clone(),
        }
    }

    fn run_blocking(&self, mx_host: &str, address: &str) -> MailboxStatus {
        let (sender, recipient) = match (
            self.sender.parse::<Address>(),
            address.parse::<Address>(),
        ) {
            (Ok(sender), Ok(recipient)) => (sender, recipient),
            _ => return MailboxStatus::ConnectFailed,
        };

        let hello = ClientId::Domain(self.helo_name.clone());
        let mut conn = match SmtpConnection::connect(
            (mx_host, self.port),
            Some(self.timeout),
            &hello,
            None,
            None,
        ) {
            Ok(conn) => conn,
            Err(e) => {
                debug!(mx_host = %mx_host, error = %e, "SMTP connection failed");
                return if e.is_timeout() {
                    MailboxStatus::TimedOut
                } else {
                    MailboxStatus::ConnectFailed
                };
            }
        };

        if let Err(e) = conn.command(Mail::new(Some(sender), vec![])) {
            debug!(mx_host = %mx_host, error = %e, "MAIL FROM refused");
            let _ = conn.quit();
            return if e.is_timeout() {
                MailboxStatus::TimedOut
            } else {
                MailboxStatus::ConnectFailed
            };
        }

        let status = match conn.command(Rcpt::new(recipient, vec![])) {
            Ok(_) => MailboxStatus::Accepted,
            Err(e) if e.is_permanent() => MailboxStatus::MailboxRejected,
            Err(e) if e.is_transient() => MailboxStatus::TransientReply,
            Err(e) if e.is_timeout() => MailboxStatus::TimedOut,
            Err(e) => {
                debug!(mx_host = %mx_host, error = %e, "RCPT TO failed");
                MailboxStatus::ConnectFailed
            }
        };

        let _ = conn.quit();
        status
    }
}

#[async_trait]
impl MailboxCheck for SmtpMailboxCheck {
    async fn check(&self, mx_host: &str, address: &str) -> MailboxStatus {
        let this = self.clone();
        let host = mx_host.to_string();
        let recipient = address.to_string();

        match tokio::task::spawn_blocking(move || this.run_blocking(&host, &recipient)).await {
            Ok(status) => status,
            Err(e) => {
                warn!(
                    address = %safe_email_log(address),
                    error = %e,
                    "Mailbox probe task failed"
                );
                MailboxStatus::ConnectFailed
            }
        }
    }
}
