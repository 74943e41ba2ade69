// src/outreach/orchestrator.rs
//! Fan-out over the recipients of one cold-email application.
//!
//! Every recipient name becomes an independent attempt running on its own
//! task. Within an attempt candidates are probed strictly in synthesis order
//! and the first accepted address is the only one ever mailed. Attempts are
//! detached from the request that started them and cannot be cancelled.

use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use super::dispatcher::OutreachSender;
use super::prober::{AddressVerifier, Verdict};
use super::synthesizer::{synthesize, RecipientName};
use crate::analytics::AnalyticsRecorder;
use crate::common::safe_email_log;
use crate::profile::ProfileStore;

/// Everything the pipeline needs from a freshly persisted application
#[derive(Debug, Clone)]
pub struct OutreachRequest {
    pub application_id: String,
    pub recipient_names: Vec<String>,
    pub job_title: String,
    pub domain: String,
    pub user_id: String,
    pub platform: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Delivered to the resolved address
    Sent,
    /// Accepted address (or profile) failed at send time; no fallback
    Failed(String),
    /// No candidate was accepted
    Exhausted,
    /// Name did not yield a usable first/last pair
    Skipped,
}

#[derive(Debug, Clone)]
pub struct AttemptReport {
    pub name: String,
    pub resolved_address: Option<String>,
    pub outcome: AttemptOutcome,
    /// Number of candidates probed
    pub probes: usize,
}

impl AttemptReport {
    fn new(name: &str, outcome: AttemptOutcome) -> Self {
        Self {
            name: name.to_string(),
            resolved_address: None,
            outcome,
            probes: 0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OutreachSummary {
    pub reports: Vec<AttemptReport>,
}

impl OutreachSummary {
    pub fn count(&self, outcome: &AttemptOutcome) -> usize {
        self.reports.iter().filter(|r| &r.outcome == outcome).count()
    }

    pub fn report_for(&self, name: &str) -> Option<&AttemptReport> {
        self.reports.iter().find(|r| r.name == name)
    }
}

/// Detached view of a running fan-out.
///
/// Dropping it does not stop anything; it only gives up the ability to
/// observe results.
pub struct OutreachHandle {
    /// One report per attempt, in completion order
    pub reports: mpsc::UnboundedReceiver<AttemptReport>,
    pub completion: JoinHandle<OutreachSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttemptState {
    Probing(usize),
    Sending(usize),
    Sent(usize),
    Failed(usize, String),
    Exhausted,
}

pub struct OutreachOrchestrator {
    verifier: Arc<dyn AddressVerifier>,
    sender: Arc<dyn OutreachSender>,
    profiles: Arc<dyn ProfileStore>,
    analytics: Arc<dyn AnalyticsRecorder>,
    permits: Arc<Semaphore>,
}

impl OutreachOrchestrator {
    pub fn new(
        verifier: Arc<dyn AddressVerifier>,
        sender: Arc<dyn OutreachSender>,
        profiles: Arc<dyn ProfileStore>,
        analytics: Arc<dyn AnalyticsRecorder>,
        max_concurrent_attempts: usize,
    ) -> Self {
        Self {
            verifier,
            sender,
            profiles,
            analytics,
            permits: Arc::new(Semaphore::new(max_concurrent_attempts.max(1))),
        }
    }

    /// Start one attempt per recipient and return immediately.
    pub fn launch(self: &Arc<Self>, request: OutreachRequest) -> OutreachHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let request = Arc::new(request);
        let mut attempts = JoinSet::new();

        info!(
            application_id = %request.application_id,
            recipients = request.recipient_names.len(),
            domain = %request.domain,
            "Starting cold email outreach"
        );

        for name in request.recipient_names.iter().cloned() {
            let this = Arc::clone(self);
            let request = Arc::clone(&request);
            let tx = tx.clone();
            attempts.spawn(async move {
                let report = this.run_attempt(&request, &name).await;
                // Receiver may already be gone
                let _ = tx.send(report.clone());
                report
            });
        }
        drop(tx);

        let application_id = request.application_id.clone();
        let completion = tokio::spawn(async move {
            let mut summary = OutreachSummary::default();
            while let Some(joined) = attempts.join_next().await {
                match joined {
                    Ok(report) => summary.reports.push(report),
                    Err(e) => error!(
                        application_id = %application_id,
                        error = %e,
                        "Outreach attempt task failed"
                    ),
                }
            }

            info!(
                application_id = %application_id,
                sent = summary.count(&AttemptOutcome::Sent),
                exhausted = summary.count(&AttemptOutcome::Exhausted),
                skipped = summary.count(&AttemptOutcome::Skipped),
                "All cold emails processed"
            );
            summary
        });

        OutreachHandle {
            reports: rx,
            completion,
        }
    }

    async fn run_attempt(&self, request: &OutreachRequest, name: &str) -> AttemptReport {
        let recipient = match RecipientName::parse(name) {
            Some(recipient) => recipient,
            None => {
                warn!(
                    application_id = %request.application_id,
                    name = %name,
                    "Skipping invalid name"
                );
                return AttemptReport::new(name, AttemptOutcome::Skipped);
            }
        };

        // The semaphore is never closed
        let _permit = self.permits.acquire().await.ok();

        let profile = match self.profiles.sender_profile(&request.user_id).await {
            Ok(profile) => profile,
            Err(e) => {
                error!(
                    user_id = %request.user_id,
                    error = %e,
                    "Failed to fetch sender profile for cold email"
                );
                return AttemptReport::new(name, AttemptOutcome::Failed(e.to_string()));
            }
        };

        let candidates = synthesize(&recipient.first, &recipient.last, &request.domain);
        let mut probes = 0;
        let mut state = AttemptState::Probing(0);

        loop {
            state = match state {
                AttemptState::Probing(i) => match candidates.get(i) {
                    None => AttemptState::Exhausted,
                    Some(candidate) => {
                        probes += 1;
                        let verdict = self.verifier.probe(candidate).await;
                        debug!(
                            name = %name,
                            candidate = %safe_email_log(candidate),
                            verdict = %verdict,
                            "Probed candidate"
                        );
                        match verdict {
                            Verdict::Accepted => AttemptState::Sending(i),
                            // Indeterminate is handled like a rejection
                            Verdict::Rejected(_) | Verdict::Indeterminate(_) => {
                                AttemptState::Probing(i + 1)
                            }
                        }
                    }
                },
                AttemptState::Sending(i) => {
                    info!(
                        to = %safe_email_log(&candidates[i]),
                        job_title = %request.job_title,
                        "Sending cold email"
                    );
                    match self
                        .sender
                        .send(&candidates[i], &request.job_title, &profile)
                        .await
                    {
                        Ok(()) => AttemptState::Sent(i),
                        Err(e) => AttemptState::Failed(i, e.to_string()),
                    }
                }
                AttemptState::Sent(i) => {
                    if let Err(e) = self
                        .analytics
                        .record_event(&request.user_id, &request.platform, true)
                        .await
                    {
                        error!(
                            to = %safe_email_log(&candidates[i]),
                            error = %e,
                            "Failed to update analytics"
                        );
                    }
                    return AttemptReport {
                        name: name.to_string(),
                        resolved_address: Some(candidates[i].clone()),
                        outcome: AttemptOutcome::Sent,
                        probes,
                    };
                }
                AttemptState::Failed(i, reason) => {
                    warn!(
                        name = %name,
                        to = %safe_email_log(&candidates[i]),
                        reason = %reason,
                        "Cold email dispatch failed"
                    );
                    return AttemptReport {
                        name: name.to_string(),
                        resolved_address: Some(candidates[i].clone()),
                        outcome: AttemptOutcome::Failed(reason),
                        probes,
                    };
                }
                AttemptState::Exhausted => {
                    warn!(
                        application_id = %request.application_id,
                        name = %name,
                        probes,
                        "No deliverable address found"
                    );
                    return AttemptReport {
                        name: name.to_string(),
                        resolved_address: None,
                        outcome: AttemptOutcome::Exhausted,
                        probes,
                    };
                }
            };
        }
    }
}
