use anyhow::Context as _;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{info, warn};
use uuid::Uuid;

use campustix_domain::id::TicketId;

use crate::domain::gateway::{DeliveryResult, NotificationGateway};
use crate::domain::types::EventSummary;
use crate::infra::templates::{
    RenderedEmail, confirmation_subject, ticket_confirmation_email, verification_email,
};

// ── SMTP ──────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// STARTTLS relay; credentials are used only when both parts are set.
    pub fn new(
        host: &str,
        port: u16,
        username: Option<String>,
        password: Option<String>,
        from: &str,
    ) -> anyhow::Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .with_context(|| format!("invalid SMTP relay {host}"))?
            .port(port);
        if let (Some(username), Some(password)) = (username, password) {
            builder = builder.credentials(Credentials::new(username, password));
        }
        let from = from
            .parse::<Mailbox>()
            .with_context(|| format!("invalid MAIL_FROM address {from}"))?;
        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    async fn send(&self, to: &str, subject: &str, body: RenderedEmail) -> DeliveryResult {
        let to = match to.parse::<Mailbox>() {
            Ok(to) => to,
            Err(e) => return DeliveryResult::failed(format!("invalid recipient: {e}")),
        };
        let message_id = format!("<{}@campustix>", Uuid::now_v7());
        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .message_id(Some(message_id.clone()))
            .multipart(MultiPart::alternative_plain_html(body.text, body.html));
        let message = match message {
            Ok(message) => message,
            Err(e) => return DeliveryResult::failed(e),
        };
        match self.transport.send(message).await {
            Ok(_) => {
                info!(message_id = %message_id, subject, "email sent");
                DeliveryResult::delivered(message_id)
            }
            Err(e) => {
                warn!(error = %e, subject, "smtp delivery failed");
                DeliveryResult::failed(e)
            }
        }
    }
}

impl NotificationGateway for SmtpMailer {
    async fn send_verification_email(
        &self,
        to: &str,
        subject: &str,
        verification_url: &str,
        event_name: &str,
    ) -> DeliveryResult {
        self.send(to, subject, verification_email(verification_url, event_name))
            .await
    }

    async fn send_ticket_confirmation(
        &self,
        to: &str,
        event: &EventSummary,
        ticket_id: TicketId,
        qr_reference: &str,
    ) -> DeliveryResult {
        self.send(
            to,
            &confirmation_subject(&event.name),
            ticket_confirmation_email(event, ticket_id, qr_reference),
        )
        .await
    }
}

// ── Log transport ─────────────────────────────────────────────────────────────

/// Development transport: records the message through `tracing` instead of
/// delivering it.
#[derive(Clone, Default)]
pub struct LogMailer;

impl NotificationGateway for LogMailer {
    async fn send_verification_email(
        &self,
        to: &str,
        subject: &str,
        verification_url: &str,
        event_name: &str,
    ) -> DeliveryResult {
        let message_id = format!("log-{}", Uuid::now_v7());
        info!(
            transport = "log",
            %message_id,
            to,
            subject,
            event_name,
            verification_url,
            "verification email"
        );
        DeliveryResult::delivered(message_id)
    }

    async fn send_ticket_confirmation(
        &self,
        to: &str,
        event: &EventSummary,
        ticket_id: TicketId,
        qr_reference: &str,
    ) -> DeliveryResult {
        let message_id = format!("log-{}", Uuid::now_v7());
        info!(
            transport = "log",
            %message_id,
            to,
            subject = %confirmation_subject(&event.name),
            %ticket_id,
            qr_reference,
            "ticket confirmation email"
        );
        DeliveryResult::delivered(message_id)
    }
}

// ── Dispatch ──────────────────────────────────────────────────────────────────

/// Transport selected by `MAIL_TRANSPORT`.
#[derive(Clone)]
pub enum Mailer {
    Smtp(SmtpMailer),
    Log(LogMailer),
}

impl NotificationGateway for Mailer {
    async fn send_verification_email(
        &self,
        to: &str,
        subject: &str,
        verification_url: &str,
        event_name: &str,
    ) -> DeliveryResult {
        match self {
            Self::Smtp(m) => {
                m.send_verification_email(to, subject, verification_url, event_name)
                    .await
            }
            Self::Log(m) => {
                m.send_verification_email(to, subject, verification_url, event_name)
                    .await
            }
        }
    }

    async fn send_ticket_confirmation(
        &self,
        to: &str,
        event: &EventSummary,
        ticket_id: TicketId,
        qr_reference: &str,
    ) -> DeliveryResult {
        match self {
            Self::Smtp(m) => {
                m.send_ticket_confirmation(to, event, ticket_id, qr_reference)
                    .await
            }
            Self::Log(m) => {
                m.send_ticket_confirmation(to, event, ticket_id, qr_reference)
                    .await
            }
        }
    }
}
