//! Outbound delivery: SMTP via lettre (Gmail or any server) and the `SendGrid`
//! v3 HTTP API via reqwest.

use std::future::Future;
use std::time::Duration;

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use binder_core::{Email, EmailProvider};

use crate::config::{ProviderConfig, RelayConfig};

const GMAIL_SMTP_HOST: &str = "smtp.gmail.com";
const SENDGRID_SEND_URL: &str = "https://api.sendgrid.com/v3/mail/send";

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum MailerError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// `SendGrid` could not be reached.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// `SendGrid` rejected the message.
    #[error("SendGrid error: {status} - {message}")]
    SendGrid { status: u16, message: String },
}

/// A validated message ready for a provider.
#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub to: Email,
    pub subject: String,
    pub html: String,
    pub text: Option<String>,
}

/// Something that can deliver an [`OutgoingEmail`].
pub trait Mailer: Send + Sync + 'static {
    /// Provider reported by the health endpoint.
    fn provider(&self) -> EmailProvider;

    /// Deliver a message, returning the provider message id.
    fn send(&self, email: &OutgoingEmail) -> impl Future<Output = Result<String, MailerError>> + Send;
}

/// SMTP delivery (Gmail or a generic server).
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    provider: EmailProvider,
}

impl SmtpMailer {
    /// Build a transport for `host`.
    ///
    /// `secure` selects implicit TLS; otherwise the connection is upgraded
    /// with STARTTLS.
    ///
    /// # Errors
    ///
    /// Returns error if the TLS parameters for `host` cannot be built.
    pub fn new(
        host: &str,
        port: u16,
        secure: bool,
        credentials: Credentials,
        from: Mailbox,
        provider: EmailProvider,
    ) -> Result<Self, SmtpError> {
        let builder = if secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?
        };
        let transport = builder
            .port(port)
            .credentials(credentials)
            .timeout(Some(Duration::from_secs(30)))
            .build();

        Ok(Self {
            transport,
            from,
            provider,
        })
    }
}

impl Mailer for SmtpMailer {
    fn provider(&self) -> EmailProvider {
        self.provider
    }

    async fn send(&self, email: &OutgoingEmail) -> Result<String, MailerError> {
        let to: Mailbox = email
            .to
            .as_str()
            .parse()
            .map_err(|_| MailerError::InvalidAddress(email.to.to_string()))?;
        let message_id = format!("<{}@{}>", Uuid::new_v4(), self.from.email.domain());

        let builder = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(&email.subject)
            .message_id(Some(message_id.clone()));

        let message = match &email.text {
            Some(text) => builder.multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(email.html.clone()),
                    ),
            )?,
            None => builder
                .header(ContentType::TEXT_HTML)
                .body(email.html.clone())?,
        };

        self.transport.send(message).await?;

        tracing::info!(to = %email.to, subject = %email.subject, provider = %self.provider, "Email sent successfully");
        Ok(message_id)
    }
}

/// `SendGrid` v3 API delivery.
#[derive(Clone)]
pub struct SendGridMailer {
    client: reqwest::Client,
    api_key: SecretString,
    from_address: String,
    from_name: Option<String>,
}

impl SendGridMailer {
    /// Create a `SendGrid` client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(
        api_key: SecretString,
        from_address: String,
        from_name: Option<String>,
    ) -> Result<Self, MailerError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            api_key,
            from_address,
            from_name,
        })
    }

    fn payload(&self, email: &OutgoingEmail) -> serde_json::Value {
        let mut content = Vec::new();
        if let Some(text) = &email.text {
            content.push(json!({ "type": "text/plain", "value": text }));
        }
        content.push(json!({ "type": "text/html", "value": email.html }));

        let mut from = json!({ "email": self.from_address });
        if let Some(name) = &self.from_name {
            from["name"] = json!(name);
        }

        json!({
            "personalizations": [{ "to": [{ "email": email.to.as_str() }] }],
            "from": from,
            "subject": email.subject,
            "content": content,
        })
    }
}

impl Mailer for SendGridMailer {
    fn provider(&self) -> EmailProvider {
        EmailProvider::Sendgrid
    }

    async fn send(&self, email: &OutgoingEmail) -> Result<String, MailerError> {
        let response = self
            .client
            .post(SENDGRID_SEND_URL)
            .bearer_auth(self.api_key.expose_secret())
            .json(&self.payload(email))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, error = %message, "SendGrid API error");
            return Err(MailerError::SendGrid {
                status: status.as_u16(),
                message,
            });
        }

        let message_id = response
            .headers()
            .get("x-message-id")
            .and_then(|v| v.to_str().ok())
            .map_or_else(|| Uuid::new_v4().to_string(), String::from);

        tracing::info!(to = %email.to, subject = %email.subject, provider = "sendgrid", "Email sent successfully");
        Ok(message_id)
    }
}

/// The mailer selected by `EMAIL_PROVIDER`.
#[derive(Clone)]
pub enum ProviderMailer {
    Smtp(SmtpMailer),
    SendGrid(SendGridMailer),
}

impl ProviderMailer {
    /// Build the mailer for the configured provider.
    ///
    /// # Errors
    ///
    /// Returns `MailerError` if the sender address is invalid or the transport
    /// cannot be built.
    pub fn from_config(config: &RelayConfig) -> Result<Self, MailerError> {
        let from = sender(config)?;
        match &config.provider {
            ProviderConfig::Gmail { user, app_password } => {
                let credentials = Credentials::new(user.clone(), app_password.expose_secret().to_string());
                Ok(Self::Smtp(SmtpMailer::new(
                    GMAIL_SMTP_HOST,
                    587,
                    false,
                    credentials,
                    from,
                    EmailProvider::Gmail,
                )?))
            }
            ProviderConfig::Smtp {
                host,
                port,
                user,
                password,
                secure,
            } => {
                let credentials = Credentials::new(user.clone(), password.expose_secret().to_string());
                Ok(Self::Smtp(SmtpMailer::new(
                    host,
                    *port,
                    *secure,
                    credentials,
                    from,
                    EmailProvider::Smtp,
                )?))
            }
            ProviderConfig::SendGrid { api_key } => Ok(Self::SendGrid(SendGridMailer::new(
                api_key.clone(),
                config.from_address.clone(),
                config.from_name.clone(),
            )?)),
        }
    }
}

impl Mailer for ProviderMailer {
    fn provider(&self) -> EmailProvider {
        match self {
            Self::Smtp(m) => m.provider(),
            Self::SendGrid(m) => m.provider(),
        }
    }

    async fn send(&self, email: &OutgoingEmail) -> Result<String, MailerError> {
        match self {
            Self::Smtp(m) => m.send(email).await,
            Self::SendGrid(m) => m.send(email).await,
        }
    }
}

/// The `From` mailbox for this configuration.
fn sender(config: &RelayConfig) -> Result<Mailbox, MailerError> {
    let address = config
        .from_address
        .parse()
        .map_err(|_| MailerError::InvalidAddress(config.from_address.clone()))?;
    Ok(Mailbox::new(config.from_name.clone(), address))
}
