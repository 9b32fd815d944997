use std::time::Duration;

use anyhow::Context as _;
use serde::Deserialize;

use campustix_core::config::Config;
use campustix_domain::ledger::WalletAddress;

use crate::infra::ledger::{HttpLedger, Ledger, SimulatedLedger};
use crate::infra::mail::{LogMailer, Mailer, SmtpMailer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailTransport {
    #[default]
    Log,
    Smtp,
}

/// Ticketing service configuration loaded from environment variables.
#[derive(Debug, Deserialize)]
pub struct TicketingConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// HMAC secret for email verification tokens.
    pub token_secret: String,
    /// Public origin of the web app; verification links and QR references
    /// point here.
    #[serde(default = "default_app_base_url")]
    pub app_base_url: String,
    #[serde(default = "default_ticketing_port")]
    pub ticketing_port: u16,

    #[serde(default)]
    pub mail_transport: MailTransport,
    pub smtp_host: Option<String>,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    #[serde(default = "default_mail_from")]
    pub mail_from: String,

    /// Ledger service base URL. Unset selects the simulated ledger.
    pub ledger_url: Option<String>,
    #[serde(default = "default_ledger_timeout_ms")]
    pub ledger_timeout_ms: u64,
    /// Issue simulated tickets when the ledger service is unreachable.
    #[serde(default)]
    pub ledger_simulated_fallback: bool,
    /// HMAC key of the simulated ledger. Falls back to `token_secret`.
    pub ledger_simulation_key: Option<String>,
    /// Account reported by the simulated wallet.
    pub ledger_wallet_address: Option<String>,
}

impl Config for TicketingConfig {}

fn default_app_base_url() -> String {
    "http://localhost:5173".to_owned()
}

fn default_ticketing_port() -> u16 {
    3120
}

fn default_smtp_port() -> u16 {
    587
}

fn default_mail_from() -> String {
    "College Event Ticketing <noreply@collegeevent.com>".to_owned()
}

fn default_ledger_timeout_ms() -> u64 {
    10_000
}

impl TicketingConfig {
    pub fn ledger_timeout(&self) -> Duration {
        Duration::from_millis(self.ledger_timeout_ms)
    }

    pub fn build_mailer(&self) -> anyhow::Result<Mailer> {
        match self.mail_transport {
            MailTransport::Log => Ok(Mailer::Log(LogMailer)),
            MailTransport::Smtp => {
                let host = self
                    .smtp_host
                    .as_deref()
                    .context("SMTP_HOST is required when MAIL_TRANSPORT=smtp")?;
                let mailer = SmtpMailer::new(
                    host,
                    self.smtp_port,
                    self.smtp_username.clone(),
                    self.smtp_password.clone(),
                    &self.mail_from,
                )?;
                Ok(Mailer::Smtp(mailer))
            }
        }
    }

    pub fn build_ledger(&self) -> anyhow::Result<Ledger> {
        let wallet = self
            .ledger_wallet_address
            .as_deref()
            .map(WalletAddress::parse)
            .transpose()
            .context("invalid LEDGER_WALLET_ADDRESS")?;
        let key = self
            .ledger_simulation_key
            .as_deref()
            .unwrap_or(&self.token_secret);
        let simulated = SimulatedLedger::new(key.as_bytes(), wallet)?;

        match self.ledger_url.as_deref() {
            None => Ok(Ledger::Simulated(simulated)),
            Some(url) => {
                let fallback = self.ledger_simulated_fallback.then_some(simulated);
                let ledger = HttpLedger::new(url, self.ledger_timeout(), fallback)?;
                Ok(Ledger::Http(ledger))
            }
        }
    }
}
