// src/outreach/mime.rs
//! MIME assembly for outreach messages:
//! multipart/mixed { multipart/alternative { text, html }, attachment }
//!
//! Headers are encoded by lettre, so non-ASCII names go out as RFC 2047
//! words and the resume is always base64.

use lettre::message::header::{ContentTransferEncoding, ContentType};
use lettre::message::{Attachment, Body, Mailbox, Message, MultiPart, SinglePart};
use lettre::Address;

use super::config::MessageConfig;
use super::dispatcher::{DispatchError, ResumeAttachment, SenderProfile};
use crate::common::escape_html;

/// Collapse every run of whitespace, line breaks included, into one space
pub fn single_line(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn subject_line(job_title: &str, profile: &SenderProfile) -> String {
    format!(
        "Application for {} - {}",
        single_line(job_title),
        single_line(&profile.display_name)
    )
}

pub fn plain_body(job_title: &str, profile: &SenderProfile) -> String {
    let mut links = Vec::new();
    if let Some(url) = &profile.linkedin_url {
        links.push(format!("LinkedIn: {}", url));
    }
    if let Some(url) = &profile.github_url {
        links.push(format!("GitHub: {}", url));
    }
    if let Some(url) = &profile.resume_url {
        links.push(format!("Resume: {}", url));
    }

    format!(
        "Hope you're doing well.\r\n\
         \r\n\
         I'm reaching out to express my interest in the {title} position at your company.\r\n\
         \r\n\
         I've attached my resume for your reference and would love to connect and learn \
         more about the opportunities on your team.\r\n\
         \r\n\
         Thank you for your time, and I look forward to hearing from you.\r\n\
         \r\n\
         Best regards,\r\n\
         {name}\r\n\
         {links}",
        title = job_title,
        name = profile.display_name,
        links = links.join("\r\n"),
    )
}

pub fn html_body(job_title: &str, profile: &SenderProfile) -> String {
    let mut links = Vec::new();
    if let Some(url) = &profile.linkedin_url {
        links.push(format!(r#"<a href="{}">LinkedIn</a>"#, escape_html(url)));
    }
    if let Some(url) = &profile.github_url {
        links.push(format!(r#"<a href="{}">GitHub</a>"#, escape_html(url)));
    }
    if let Some(url) = &profile.resume_url {
        links.push(format!(r#"<a href="{}">Resume</a>"#, escape_html(url)));
    }

    format!(
        r#"<html>
  <body>
    <p>Hope you're doing well.</p>
    <p>I'm reaching out to express my interest in the <strong>{title}</strong> position at your company.</p>
    <p>I've attached my resume for your reference and would love to connect and learn more about the opportunities on your team.</p>
    <p>Thank you for your time, and I look forward to hearing from you.</p>
    <p>Best regards,<br/>
       <strong>{name}</strong><br/>
       {links}
    </p>
  </body>
</html>"#,
        title = escape_html(job_title),
        name = escape_html(&profile.display_name),
        links = links.join(" | "),
    )
}

fn parse_address(value: &str) -> Result<Address, DispatchError> {
    value
        .parse()
        .map_err(|e: lettre::address::AddressError| DispatchError::Address(format!("{}: {}", value, e)))
}

fn resume_part(attachment: &ResumeAttachment) -> Result<SinglePart, DispatchError> {
    let content_type = ContentType::parse(&attachment.content_type)
        .map_err(|e| DispatchError::Resume(format!("{}: {}", attachment.content_type, e)))?;
    let body = Body::new_with_encoding(attachment.data.clone(), ContentTransferEncoding::Base64)
        .map_err(|_| DispatchError::Resume("resume could not be encoded".to_string()))?;

    Ok(Attachment::new(single_line(&attachment.filename)).body(body, content_type))
}

/// Build the full RFC 5322 message. `from` is the relay's sender address;
/// the applicant's name is used as its display name.
pub fn build_message(
    config: &MessageConfig,
    from: &str,
    to: &str,
    job_title: &str,
    profile: &SenderProfile,
    attachment: &ResumeAttachment,
) -> Result<Message, DispatchError> {
    let sender = Mailbox::new(Some(single_line(&profile.display_name)), parse_address(from)?);
    let recipient = Mailbox::new(None, parse_address(to)?);

    let alternative = MultiPart::alternative()
        .boundary(config.alternative_boundary.clone())
        .singlepart(SinglePart::plain(plain_body(job_title, profile)))
        .singlepart(SinglePart::html(html_body(job_title, profile)));

    let mixed = MultiPart::mixed()
        .boundary(config.mixed_boundary.clone())
        .multipart(alternative)
        .singlepart(resume_part(attachment)?);

    Message::builder()
        .from(sender)
        .to(recipient)
        .subject(subject_line(job_title, profile))
        .date_now()
        .multipart(mixed)
        .map_err(|e| DispatchError::Message(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD, Engine as _};

    const BASE64_LINE_LENGTH: usize = 76;

    fn profile() -> SenderProfile {
        SenderProfile {
            display_name: "Jane Applicant".to_string(),
            email: "jane@applicant.dev".to_string(),
            linkedin_url: Some("https://linkedin.com/in/jane".to_string()),
            github_url: Some("https://github.com/jane".to_string()),
            resume_url: None,
        }
    }

    fn attachment(len: usize) -> ResumeAttachment {
        ResumeAttachment {
            filename: "resume.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            data: (0..len).map(|i| (i % 251) as u8).collect(),
        }
    }

    fn render(job_title: &str, profile: &SenderProfile, data: &ResumeAttachment) -> String {
        let message = build_message(
            &MessageConfig::default(),
            "outreach@applicant.dev",
            "john.doe@acme.com",
            job_title,
            profile,
            data,
        )
        .unwrap();
        String::from_utf8(message.formatted()).unwrap()
    }

    fn header_block(message: &str) -> &str {
        let end = message.find("\r\n\r\n").unwrap();
        &message[..end]
    }

    #[test]
    fn test_message_structure() {
        let message = render("Platform Engineer", &profile(), &attachment(64));
        let headers = header_block(&message);

        assert!(headers.contains("<outreach@applicant.dev>"));
        assert!(headers.contains("john.doe@acme.com"));
        assert!(headers.contains("Subject: Application for Platform Engineer - Jane Applicant"));
        assert!(headers.contains("Date: "));
        assert!(headers.contains("MIME-Version: 1.0"));
        assert!(headers.contains("multipart/mixed"));
        assert!(message.contains("MIXED-BOUNDARY-123456"));
        assert!(message.contains("multipart/alternative"));
        assert!(message.contains("ALT-BOUNDARY-654321"));
        assert!(message.contains("text/plain"));
        assert!(message.contains("text/html"));
        assert!(message.contains("filename=\"resume.pdf\""));

        // The alternative part closes before the attachment opens
        let alt_close = message.find("--ALT-BOUNDARY-654321--").unwrap();
        let attachment_part = message.find("filename=\"resume.pdf\"").unwrap();
        assert!(alt_close < attachment_part);
        assert!(message.trim_end().ends_with("--MIXED-BOUNDARY-123456--"));
    }

    #[test]
    fn test_attachment_lines_are_wrapped_at_76() {
        let data = attachment(1000);
        let message = render("Engineer", &profile(), &data);

        let part_start = message.find("filename=\"resume.pdf\"").unwrap();
        let body_start = part_start + message[part_start..].find("\r\n\r\n").unwrap() + 4;
        let body_end = message.rfind("--MIXED-BOUNDARY-123456--").unwrap();
        let lines: Vec<&str> = message[body_start..body_end]
            .split("\r\n")
            .filter(|l| !l.is_empty())
            .collect();

        assert!(lines.len() > 1);
        for line in &lines {
            assert!(line.len() <= BASE64_LINE_LENGTH);
        }

        let decoded = STANDARD.decode(lines.concat()).unwrap();
        assert_eq!(decoded, data.data);
    }

    #[test]
    fn test_line_breaks_in_subject_cannot_add_headers() {
        let message = render(
            "Engineer\r\nBcc: victim@evil.com\r\nX-Injected: yes",
            &profile(),
            &attachment(16),
        );
        let headers = header_block(&message);

        for line in headers.split("\r\n") {
            assert!(!line.starts_with("Bcc:"), "unexpected header line: {}", line);
            assert!(!line.starts_with("X-Injected:"), "unexpected header line: {}", line);
        }
        let unfolded = headers.replace("\r\n ", " ");
        assert!(unfolded.contains("Engineer Bcc: victim@evil.com X-Injected: yes"));
    }

    #[test]
    fn test_non_ascii_headers_are_encoded() {
        let mut sender = profile();
        sender.display_name = "José Núñez".to_string();
        let message = render("Ingénieur", &sender, &attachment(16));
        let headers = header_block(&message);

        assert!(headers.is_ascii());
        assert!(headers.to_lowercase().contains("=?utf-8?"));
    }

    #[test]
    fn test_display_name_line_breaks_are_flattened() {
        let mut sender = profile();
        sender.display_name = "Jane\r\nReply-To: x@evil.com".to_string();
        assert_eq!(
            subject_line("SRE", &sender),
            "Application for SRE - Jane Reply-To: x@evil.com"
        );

        let message = render("SRE", &sender, &attachment(16));
        for line in header_block(&message).split("\r\n") {
            assert!(!line.starts_with("Reply-To:"));
        }
    }

    #[test]
    fn test_invalid_recipient_is_rejected() {
        let result = build_message(
            &MessageConfig::default(),
            "outreach@applicant.dev",
            "not an address",
            "SRE",
            &profile(),
            &attachment(8),
        );
        assert!(matches!(result, Err(DispatchError::Address(_))));
    }

    #[test]
    fn test_both_alternatives_are_personalised() {
        let plain = plain_body("SRE", &profile());
        let html = html_body("SRE", &profile());

        for body in [&plain, &html] {
            assert!(body.contains("SRE"));
            assert!(body.contains("Jane Applicant"));
            assert!(body.contains("https://github.com/jane"));
        }
        assert!(!plain.contains("Resume:"));
    }

    #[test]
    fn test_html_body_escapes_job_title() {
        let html = html_body("R&D <Lead>", &profile());
        assert!(html.contains("R&amp;D &lt;Lead&gt;"));
        assert!(!html.contains("<Lead>"));
    }
}
