// src/outreach/dispatcher.rs
//! Composes and sends the outreach email for one accepted address

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info};

use super::config::MessageConfig;
use super::mime;
use crate::common::safe_email_log;

/// Sender details rendered into the message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderProfile {
    pub display_name: String,
    pub email: String,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub resume_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResumeAttachment {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("resume unavailable: {0}")]
    Resume(String),

    #[error("invalid address: {0}")]
    Address(String),

    #[error("relay error: {0}")]
    Relay(String),

    #[error("message could not be built: {0}")]
    Message(String),
}

/// Outbound submission of an already-encoded message
#[async_trait]
pub trait MailTransport: Send + Sync {
    fn from_address(&self) -> &str;

    async fn send_raw(&self, to: &str, message: &[u8]) -> Result<(), DispatchError>;
}

/// Source of the resume attached to every message
#[async_trait]
pub trait ResumeStore: Send + Sync {
    async fn read_resume(&self) -> Result<ResumeAttachment, DispatchError>;
}

/// Anything that can deliver an outreach message to an address
#[async_trait]
pub trait OutreachSender: Send + Sync {
    async fn send(
        &self,
        address: &str,
        job_title: &str,
        profile: &SenderProfile,
    ) -> Result<(), DispatchError>;
}

pub struct Dispatcher {
    message: MessageConfig,
    transport: Arc<dyn MailTransport>,
    resumes: Arc<dyn ResumeStore>,
}

impl Dispatcher {
    pub fn new(
        message: MessageConfig,
        transport: Arc<dyn MailTransport>,
        resumes: Arc<dyn ResumeStore>,
    ) -> Self {
        Self {
            message,
            transport,
            resumes,
        }
    }
}

#[async_trait]
impl OutreachSender for Dispatcher {
    async fn send(
        &self,
        address: &str,
        job_title: &str,
        profile: &SenderProfile,
    ) -> Result<(), DispatchError> {
        let attachment = self.resumes.read_resume().await.map_err(|e| {
            error!(error = %e, "Failed to load resume attachment");
            e
        })?;

        let message = mime::build_message(
            &self.message,
            self.transport.from_address(),
            address,
            job_title,
            profile,
            &attachment,
        )?
        .formatted();

        if let Err(e) = self.transport.send_raw(address, &message).await {
            error!(
                to = %safe_email_log(address),
                error = %e,
                "Failed to send outreach email"
            );
            return Err(e);
        }

        info!(
            to = %safe_email_log(address),
            job_title = %job_title,
            bytes = message.len(),
            "Outreach email sent"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl MailTransport for RecordingTransport {
        fn from_address(&self) -> &str {
            "outreach@applicant.dev"
        }

        async fn send_raw(&self, to: &str, message: &[u8]) -> Result<(), DispatchError> {
            if self.fail {
                return Err(DispatchError::Relay("550 relay denied".to_string()));
            }
            self.sent.lock().unwrap().push((
                to.to_string(),
                String::from_utf8_lossy(message).into_owned(),
            ));
            Ok(())
        }
    }

    struct FixedResume(Option<Vec<u8>>);

    #[async_trait]
    impl ResumeStore for FixedResume {
        async fn read_resume(&self) -> Result<ResumeAttachment, DispatchError> {
            match &self.0 {
                Some(data) => Ok(ResumeAttachment {
                    filename: "resume.pdf".to_string(),
                    content_type: "application/pdf".to_string(),
                    data: data.clone(),
                }),
                None => Err(DispatchError::Resume("resume.pdf: not found".to_string())),
            }
        }
    }

    fn profile() -> SenderProfile {
        SenderProfile {
            display_name: "Jane Applicant".to_string(),
            email: "jane@applicant.dev".to_string(),
            linkedin_url: None,
            github_url: None,
            resume_url: None,
        }
    }

    #[tokio::test]
    async fn test_send_hands_message_to_transport() {
        let transport = Arc::new(RecordingTransport::default());
        let dispatcher = Dispatcher::new(
            MessageConfig::default(),
            transport.clone(),
            Arc::new(FixedResume(Some(b"%PDF-1.4".to_vec()))),
        );

        dispatcher
            .send("john.doe@acme.com", "Data Engineer", &profile())
            .await
            .unwrap();

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "john.doe@acme.com");
        assert!(sent[0].1.contains("<outreach@applicant.dev>"));
        assert!(sent[0].1.contains("Subject: Application for Data Engineer - Jane Applicant"));
    }

    #[tokio::test]
    async fn test_missing_resume_never_reaches_transport() {
        let transport = Arc::new(RecordingTransport::default());
        let dispatcher = Dispatcher::new(
            MessageConfig::default(),
            transport.clone(),
            Arc::new(FixedResume(None)),
        );

        let result = dispatcher
            .send("john.doe@acme.com", "Data Engineer", &profile())
            .await;

        assert!(matches!(result, Err(DispatchError::Resume(_))));
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_relay_failure_is_reported() {
        let transport = Arc::new(RecordingTransport {
            sent: Mutex::new(Vec::new()),
            fail: true,
        });
        let dispatcher = Dispatcher::new(
            MessageConfig::default(),
            transport,
            Arc::new(FixedResume(Some(vec![1, 2, 3]))),
        );

        let result = dispatcher
            .send("john.doe@acme.com", "Data Engineer", &profile())
            .await;
        assert!(matches!(result, Err(DispatchError::Relay(_))));
    }
}
