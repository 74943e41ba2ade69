// src/outreach/transport.rs
//! Outbound relay and resume sources backing the dispatcher

use async_trait::async_trait;
use lettre::address::Envelope;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use reqwest::Client;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::config::RelayConfig;
use super::dispatcher::{DispatchError, MailTransport, ResumeAttachment, ResumeStore};

/// Authenticated STARTTLS submission through a fixed relay
pub struct SmtpRelay {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Address,
    from_raw: String,
}

impl SmtpRelay {
    pub fn new(config: &RelayConfig) -> Result<Self, DispatchError> {
        let from: Address = config
            .from_address
            .parse()
            .map_err(|e: lettre::address::AddressError| {
                DispatchError::Address(format!("{}: {}", config.from_address, e))
            })?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| DispatchError::Relay(e.to_string()))?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .timeout(Some(config.timeout))
            .build();

        debug!(host = %config.host, port = config.port, "SMTP relay configured");

        Ok(Self {
            transport,
            from,
            from_raw: config.from_address.clone(),
        })
    }
}

#[async_trait]
impl MailTransport for SmtpRelay {
    fn from_address(&self) -> &str {
        &self.from_raw
    }

    async fn send_raw(&self, to: &str, message: &[u8]) -> Result<(), DispatchError> {
        let recipient: Address = to
            .parse()
            .map_err(|e: lettre::address::AddressError| DispatchError::Address(e.to_string()))?;

        let envelope = Envelope::new(Some(self.from.clone()), vec![recipient])
            .map_err(|e| DispatchError::Address(e.to_string()))?;

        self.transport
            .send_raw(&envelope, message)
            .await
            .map_err(|e| DispatchError::Relay(e.to_string()))?;

        Ok(())
    }
}

pub fn content_type_for(filename: &str) -> &'static str {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Resume read from the local filesystem on every send
pub struct LocalResumeStore {
    path: PathBuf,
}

impl LocalResumeStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl ResumeStore for LocalResumeStore {
    async fn read_resume(&self) -> Result<ResumeAttachment, DispatchError> {
        let data = tokio::fs::read(&self.path)
            .await
            .map_err(|e| DispatchError::Resume(format!("{}: {}", self.path.display(), e)))?;

        let filename = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("resume.pdf")
            .to_string();

        Ok(ResumeAttachment {
            content_type: content_type_for(&filename).to_string(),
            filename,
            data,
        })
    }
}

/// Resume fetched over HTTP on every send
pub struct RemoteResumeStore {
    url: String,
    http: Client,
}

impl RemoteResumeStore {
    pub fn new(url: String, http: Client) -> Self {
        Self { url, http }
    }

    fn filename(&self) -> String {
        self.url
            .split(['?', '#'])
            .next()
            .and_then(|path| path.rsplit('/').next())
            .filter(|name| name.contains('.'))
            .unwrap_or("resume.pdf")
            .to_string()
    }
}

#[async_trait]
impl ResumeStore for RemoteResumeStore {
    async fn read_resume(&self) -> Result<ResumeAttachment, DispatchError> {
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| DispatchError::Resume(e.to_string()))?;

        let data = response
            .bytes()
            .await
            .map_err(|e| DispatchError::Resume(e.to_string()))?
            .to_vec();

        let filename = self.filename();
        Ok(ResumeAttachment {
            content_type: content_type_for(&filename).to_string(),
            filename,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("resume.pdf"), "application/pdf");
        assert_eq!(content_type_for("CV.PDF"), "application/pdf");
        assert_eq!(content_type_for("resume.docx"), "application/vnd.openxmlformats-officedocument.wordprocessingml.document");
        assert_eq!(content_type_for("resume"), "application/octet-stream");
    }

    #[test]
    fn test_remote_filename_from_url() {
        let store = RemoteResumeStore::new(
            "https://cdn.example.com/files/jane-cv.pdf?sig=abc".to_string(),
            Client::new(),
        );
        assert_eq!(store.filename(), "jane-cv.pdf");

        let store = RemoteResumeStore::new("https://cdn.example.com/resume".to_string(), Client::new());
        assert_eq!(store.filename(), "resume.pdf");
    }

    #[tokio::test]
    async fn test_local_store_reads_file() {
        let path = std::env::temp_dir().join(format!(
            "applytrack-resume-{}.pdf",
            crate::common::generate_application_id()
        ));
        tokio::fs::write(&path, b"%PDF-1.7 test").await.unwrap();

        let attachment = LocalResumeStore::new(path.clone()).read_resume().await.unwrap();
        assert_eq!(attachment.data, b"%PDF-1.7 test");
        assert_eq!(attachment.content_type, "application/pdf");
        assert!(attachment.filename.ends_with(".pdf"));

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_local_store_missing_file() {
        let store = LocalResumeStore::new(PathBuf::from("/nonexistent/applytrack/resume.pdf"));
        assert!(matches!(
            store.read_resume().await,
            Err(DispatchError::Resume(_))
        ));
    }
}
