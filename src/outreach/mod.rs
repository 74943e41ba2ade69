// src/outreach/mod.rs
//! Cold-email outreach: address synthesis, mailbox probing, dispatch and
//! the per-recipient fan-out that ties them together.

pub mod config;
pub mod dispatcher;
pub mod mime;
pub mod network;
pub mod orchestrator;
pub mod prober;
pub mod synthesizer;
pub mod transport;

pub use config::{ConfigError, OutreachConfig};
pub use dispatcher::{Dispatcher, SenderProfile};
pub use orchestrator::{
    AttemptOutcome, AttemptReport, OutreachHandle, OutreachOrchestrator, OutreachRequest,
    OutreachSummary,
};
pub use prober::{Prober, Verdict};

use std::sync::Arc;
use tracing::info;

use crate::analytics::AnalyticsRecorder;
use crate::profile::ProfileStore;
use config::ResumeSource;
use dispatcher::ResumeStore;
use network::{DnsMxLookup, SmtpMailboxCheck};
use transport::{LocalResumeStore, RemoteResumeStore, SmtpRelay};

#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("resolver setup failed: {0}")]
    Resolver(#[from] trust_dns_resolver::error::ResolveError),

    #[error("relay setup failed: {0}")]
    Relay(#[from] dispatcher::DispatchError),
}

impl OutreachOrchestrator {
    /// Wire the production backends: system DNS, direct SMTP probing and the
    /// authenticated relay.
    pub fn from_config(
        config: &OutreachConfig,
        profiles: Arc<dyn ProfileStore>,
        analytics: Arc<dyn AnalyticsRecorder>,
    ) -> Result<Self, SetupError> {
        let prober = Prober::new(
            &config.probe,
            Arc::new(DnsMxLookup::from_system_conf()?),
            Arc::new(SmtpMailboxCheck::new(&config.probe)),
        );

        let resume: Arc<dyn ResumeStore> = match &config.resume {
            ResumeSource::Local(path) => Arc::new(LocalResumeStore::new(path.clone())),
            ResumeSource::Remote(url) => {
                Arc::new(RemoteResumeStore::new(url.clone(), reqwest::Client::new()))
            }
        };
        let dispatcher = Dispatcher::new(
            config.message.clone(),
            Arc::new(SmtpRelay::new(&config.relay)?),
            resume,
        );

        info!(
            relay = %config.relay.host,
            max_concurrent_attempts = config.max_concurrent_attempts,
            "Outreach pipeline ready"
        );

        Ok(Self::new(
            Arc::new(prober),
            Arc::new(dispatcher),
            profiles,
            analytics,
            config.max_concurrent_attempts,
        ))
    }
}
