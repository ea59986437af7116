use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    Message, SmtpTransport, Transport,
};
use service_core::error::AppError;
use std::sync::Mutex;
use std::time::Duration;

use crate::config::SmtpConfig;

#[async_trait]
pub trait ConsentMailer: Send + Sync {
    async fn send_consent_request(
        &self,
        parent_email: &str,
        child_email: &str,
        verification_link: &str,
    ) -> Result<(), AppError>;

    async fn send_deletion_code(
        &self,
        parent_email: &str,
        child_email: &str,
        code: &str,
        ttl_minutes: i64,
    ) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct SmtpMailer {
    mailer: SmtpTransport,
    from_email: String,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, AppError> {
        let creds = Credentials::new(config.username.clone(), config.password.clone());

        let mailer = SmtpTransport::starttls_relay(&config.host)
            .map_err(|e| AppError::InternalError(anyhow::anyhow!(e.to_string())))?
            .credentials(creds)
            .port(config.port)
            .timeout(Some(Duration::from_secs(10)))
            .build();

        tracing::info!(host = %config.host, "Consent mailer initialized with SMTP relay");

        Ok(Self {
            mailer,
            from_email: config.from.clone(),
        })
    }

    async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        plain_body: String,
        html_body: String,
    ) -> Result<(), AppError> {
        let email = Message::builder()
            .from(
                self.from_email
                    .parse()
                    .map_err(|e: lettre::address::AddressError| AppError::InternalError(e.into()))?,
            )
            .to(to_email
                .parse()
                .map_err(|e: lettre::address::AddressError| AppError::InternalError(e.into()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(plain_body),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body),
                    ),
            )?;

        // SmtpTransport is blocking.
        let mailer = self.mailer.clone();
        let result = tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| AppError::InternalError(e.into()))?;

        match result {
            Ok(_) => {
                tracing::info!(subject = %subject, "Email sent successfully");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, subject = %subject, "Failed to send email");
                Err(AppError::EmailError(e.to_string()))
            }
        }
    }
}

#[async_trait]
impl ConsentMailer for SmtpMailer {
    async fn send_consent_request(
        &self,
        parent_email: &str,
        child_email: &str,
        verification_link: &str,
    ) -> Result<(), AppError> {
        let html_body = format!(
            r#"<html>
    <body style="font-family: Arial, sans-serif;">
        <h2>Parental consent requested</h2>
        <p>The account <strong>{child}</strong> was registered by a child and needs your consent before it can be used.</p>
        <p><a href="{link}">Review and respond</a></p>
        <p style="color: #666; font-size: 12px;">If you do not recognise this account, you can ignore this email and no consent will be recorded.</p>
    </body>
</html>"#,
            child = child_email,
            link = verification_link
        );

        let plain_body = format!(
            "Parental consent requested\n\nThe account {} was registered by a child and needs your consent before it can be used.\n\nReview and respond: {}\n\nIf you do not recognise this account, you can ignore this email.",
            child_email, verification_link
        );

        self.send_email(
            parent_email,
            "Parental consent required",
            plain_body,
            html_body,
        )
        .await
    }

    async fn send_deletion_code(
        &self,
        parent_email: &str,
        child_email: &str,
        code: &str,
        ttl_minutes: i64,
    ) -> Result<(), AppError> {
        let html_body = format!(
            r#"<html>
    <body style="font-family: Arial, sans-serif;">
        <h2>Confirm data deletion</h2>
        <p>A request was made to permanently delete all data for <strong>{child}</strong>.</p>
        <p>Your confirmation code is <strong style="font-size: 20px;">{code}</strong></p>
        <p style="color: #666; font-size: 12px;">The code expires in {ttl} minutes. If you did not request this, ignore this email.</p>
    </body>
</html>"#,
            child = child_email,
            code = code,
            ttl = ttl_minutes
        );

        let plain_body = format!(
            "Confirm data deletion\n\nA request was made to permanently delete all data for {}.\n\nYour confirmation code is {}\n\nThe code expires in {} minutes. If you did not request this, ignore this email.",
            child_email, code, ttl_minutes
        );

        self.send_email(parent_email, "Confirm data deletion", plain_body, html_body)
            .await
    }
}

/// Used when SMTP is disabled: logs that a message would have been sent.
#[derive(Clone, Default)]
pub struct LoggingMailer;

#[async_trait]
impl ConsentMailer for LoggingMailer {
    async fn send_consent_request(
        &self,
        _parent_email: &str,
        _child_email: &str,
        _verification_link: &str,
    ) -> Result<(), AppError> {
        tracing::info!("SMTP disabled: consent request email not sent");
        Ok(())
    }

    async fn send_deletion_code(
        &self,
        _parent_email: &str,
        _child_email: &str,
        _code: &str,
        _ttl_minutes: i64,
    ) -> Result<(), AppError> {
        tracing::info!("SMTP disabled: deletion code email not sent");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentMail {
    ConsentRequest {
        to: String,
        child_email: String,
        link: String,
    },
    DeletionCode {
        to: String,
        child_email: String,
        code: String,
    },
}

/// Records messages instead of sending them.
#[derive(Default)]
pub struct MockMailer {
    sent: Mutex<Vec<SentMail>>,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Most recent deletion code sent for `child_email`.
    pub fn last_deletion_code(&self, child_email: &str) -> Option<String> {
        self.sent().into_iter().rev().find_map(|mail| match mail {
            SentMail::DeletionCode {
                child_email: c,
                code,
                ..
            } if c == child_email => Some(code),
            _ => None,
        })
    }

    fn push(&self, mail: SentMail) {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(mail);
    }
}

#[async_trait]
impl ConsentMailer for MockMailer {
    async fn send_consent_request(
        &self,
        parent_email: &str,
        child_email: &str,
        verification_link: &str,
    ) -> Result<(), AppError> {
        tracing::info!("Mock: Would send consent request email");
        self.push(SentMail::ConsentRequest {
            to: parent_email.to_string(),
            child_email: child_email.to_string(),
            link: verification_link.to_string(),
        });
        Ok(())
    }

    async fn send_deletion_code(
        &self,
        parent_email: &str,
        child_email: &str,
        code: &str,
        _ttl_minutes: i64,
    ) -> Result<(), AppError> {
        tracing::info!("Mock: Would send deletion code email");
        self.push(SentMail::DeletionCode {
            to: parent_email.to_string(),
            child_email: child_email.to_string(),
            code: code.to_string(),
        });
        Ok(())
    }
}
