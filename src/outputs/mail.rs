//! Delivery of the finished digest.
//!
//! - [`SmtpMailer`] sends it as an HTML mail (STARTTLS relay, login auth)
//! - [`FileSink`] writes it to disk instead, for previewing a run

use crate::config::MailSettings;
use crate::error::DeliveryError;
use crate::utils::ensure_writable_dir;
use chrono::Local;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

/// Something that can take a subject and an HTML body and deliver them.
pub trait MailTransport {
    async fn send(&self, subject: &str, html: &str) -> Result<(), DeliveryError>;
}

/// SMTP delivery configured from [`MailSettings`].
pub struct SmtpMailer {
    from: Mailbox,
    to: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    /// Build a STARTTLS mailer that logs in as, and sends from, `settings.user`.
    ///
    /// # Arguments
    ///
    /// * `settings` - Host, port, login and recipient
    ///
    /// # Errors
    ///
    /// [`DeliveryError::Address`] when the sender or recipient is not a
    /// valid mailbox, [`DeliveryError::Smtp`] when the relay cannot be
    /// configured. No connection is opened here.
    pub fn new(settings: &MailSettings) -> Result<Self, DeliveryError> {
        let from = parse_mailbox(&settings.user)?;
        let to = parse_mailbox(&settings.recipient)?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)?
            .port(settings.port)
            .credentials(Credentials::new(
                settings.user.clone(),
                settings.password.clone(),
            ))
            .build();
        Ok(Self { from, to, transport })
    }
}

impl MailTransport for SmtpMailer {
    #[instrument(level = "info", skip_all, fields(%subject, to = %self.to))]
    async fn send(&self, subject: &str, html: &str) -> Result<(), DeliveryError> {
        let message = build_message(&self.from, &self.to, subject, html)?;
        self.transport.send(message).await?;
        info!(bytes = html.len(), "Email sent successfully");
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, DeliveryError> {
    address.parse().map_err(|e: lettre::address::AddressError| DeliveryError::Address {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

fn build_message(
    from: &Mailbox,
    to: &Mailbox,
    subject: &str,
    html: &str,
) -> Result<Message, DeliveryError> {
    Ok(Message::builder()
        .from(from.clone())
        .to(to.clone())
        .subject(subject)
        .header(ContentType::TEXT_HTML)
        .body(html.to_string())?)
}

/// Writes the digest to a file instead of mailing it.
///
/// When the target is a directory (or has no extension) the file is named
/// `weekly_digest_{YYYY-MM-DD}.html` inside it.
#[derive(Debug, Clone)]
pub struct FileSink {
    target: PathBuf,
}

impl FileSink {
    pub fn new(target: PathBuf) -> Self {
        Self { target }
    }

    /// Concrete file path for a digest produced on `date`.
    pub fn resolve(&self, date: chrono::NaiveDate) -> PathBuf {
        let looks_like_dir = self.target.is_dir()
            || self.target.as_os_str().to_string_lossy().ends_with(std::path::MAIN_SEPARATOR)
            || self.target.extension().is_none();
        if looks_like_dir {
            self.target.join(format!("weekly_digest_{}.html", date.format("%Y-%m-%d")))
        } else {
            self.target.clone()
        }
    }
}

impl MailTransport for FileSink {
    #[instrument(level = "info", skip_all, fields(target = %self.target.display()))]
    async fn send(&self, _subject: &str, html: &str) -> Result<(), DeliveryError> {
        let path = self.resolve(Local::now().date_naive());
        let parent = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
        ensure_writable_dir(parent).await?;
        fs::write(&path, html).await?;
        info!(path = %path.display(), "Output saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn settings() -> MailSettings {
        MailSettings {
            host: "smtp.example.com".to_string(),
            port: 587,
            user: "digest@example.com".to_string(),
            password: "secret".to_string(),
            recipient: "reader@example.com".to_string(),
        }
    }

    #[test]
    fn test_message_is_html_with_subject() {
        let from: Mailbox = "digest@example.com".parse().unwrap();
        let to: Mailbox = "reader@example.com".parse().unwrap();
        let message = build_message(&from, &to, "Weekly Top Posts", "<html></html>").unwrap();

        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: Weekly Top Posts"));
        assert!(raw.contains("Content-Type: text/html"));
        assert!(raw.contains("To: reader@example.com"));
    }

    #[tokio::test]
    async fn test_smtp_mailer_rejects_bad_recipient() {
        let mut bad = settings();
        bad.recipient = "not an address".to_string();
        let err = SmtpMailer::new(&bad).err().unwrap();
        assert!(matches!(err, DeliveryError::Address { .. }));
    }

    #[test]
    fn test_file_sink_names_file_inside_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = FileSink::new(tmp.path().to_path_buf());
        let date = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        assert_eq!(sink.resolve(date), tmp.path().join("weekly_digest_2026-10-17.html"));

        let explicit = FileSink::new(tmp.path().join("preview.html"));
        assert_eq!(explicit.resolve(date), tmp.path().join("preview.html"));
    }

    #[tokio::test]
    async fn test_file_sink_writes_document() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out/digest.html");
        let sink = FileSink::new(path.clone());

        sink.send("Weekly Top Posts", "<html>ok</html>").await.unwrap();

        assert_eq!(std::fs::read_to_string(path).unwrap(), "<html>ok</html>");
    }
}
