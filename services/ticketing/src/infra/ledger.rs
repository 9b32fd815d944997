use std::time::Duration;

use anyhow::Context as _;
use hmac::{Hmac, Mac};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::{info, warn};
use url::Url;

use campustix_domain::id::{EventId, TicketId, UserId};
use campustix_domain::ledger::{Issuance, TransactionReference, WalletAddress};

use crate::domain::gateway::{LedgerError, LedgerGateway};

type HmacSha256 = Hmac<Sha256>;

// ── Simulated ledger ──────────────────────────────────────────────────────────

/// Ledger stand-in that derives references deterministically:
/// `0x` + hex(HMAC-SHA256(key, ticket id)).
///
/// Issuing the same ticket twice yields the same reference, and verification
/// recomputes it. Every issuance is reported as `Issuance::Simulated`.
#[derive(Clone)]
pub struct SimulatedLedger {
    mac: HmacSha256,
    wallet: Option<WalletAddress>,
}

impl SimulatedLedger {
    pub fn new(key: &[u8], wallet: Option<WalletAddress>) -> anyhow::Result<Self> {
        let mac = HmacSha256::new_from_slice(key)
            .map_err(|e| anyhow::anyhow!("invalid simulation key: {e}"))?;
        Ok(Self { mac, wallet })
    }

    fn mac(&self, domain: &str, parts: &[&str]) -> HmacSha256 {
        let mut mac = self.mac.clone();
        mac.update(domain.as_bytes());
        for part in parts {
            mac.update(b":");
            mac.update(part.as_bytes());
        }
        mac
    }

    pub fn reference_for(&self, ticket_id: TicketId) -> TransactionReference {
        let digest: [u8; 32] = self
            .mac("ticket", &[&ticket_id.to_string()])
            .finalize()
            .into_bytes()
            .into();
        TransactionReference::from_digest(&digest)
    }
}

impl LedgerGateway for SimulatedLedger {
    async fn connect_wallet(&self) -> Option<WalletAddress> {
        self.wallet.clone()
    }

    async fn sign_message(&self, message: &str, address: &WalletAddress) -> Option<String> {
        let digest = self
            .mac("sign", &[address.as_str(), message])
            .finalize()
            .into_bytes();
        Some(format!("0x{}", hex::encode(digest)))
    }

    async fn lookup_issuance(&self, _ticket_id: TicketId) -> Result<Option<Issuance>, LedgerError> {
        // Nothing is recorded; re-issuing is idempotent by construction.
        Ok(None)
    }

    async fn issue_ticket(
        &self,
        event_id: EventId,
        student_id: UserId,
        ticket_id: TicketId,
    ) -> Result<Issuance, LedgerError> {
        let reference = self.reference_for(ticket_id);
        info!(%event_id, %student_id, %ticket_id, %reference, "simulated ticket issuance");
        Ok(Issuance::Simulated(reference))
    }

    async fn verify_ticket(&self, ticket_id: TicketId, reference: &str) -> bool {
        let Ok(reference) = TransactionReference::parse_canonical(reference) else {
            return false;
        };
        let Ok(bytes) = hex::decode(&reference.as_str()[2..]) else {
            return false;
        };
        self.mac("ticket", &[&ticket_id.to_string()])
            .verify_slice(&bytes)
            .is_ok()
    }
}

// ── HTTP ledger ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct AccountsResponse {
    accounts: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignatureRequest<'a> {
    message: &'a str,
    address: &'a str,
}

#[derive(Deserialize)]
struct SignatureResponse {
    signature: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IssuanceRequest {
    ticket_id: TicketId,
    event_id: EventId,
    student_id: UserId,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssuanceResponse {
    transaction_reference: String,
}

/// Client for the external issuance service.
///
/// `POST /issuances` carries `Idempotency-Key: <ticketId>`. When a fallback is
/// configured and the service cannot be reached, issuance falls back to the
/// simulated ledger and is reported as simulated.
#[derive(Clone)]
pub struct HttpLedger {
    client: reqwest::Client,
    base_url: String,
    fallback: Option<SimulatedLedger>,
}

impl HttpLedger {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        fallback: Option<SimulatedLedger>,
    ) -> anyhow::Result<Self> {
        let parsed =
            Url::parse(base_url).with_context(|| format!("invalid LEDGER_URL {base_url}"))?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: parsed.as_str().trim_end_matches('/').to_owned(),
            fallback,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    fn fallback_for(&self, e: &reqwest::Error) -> Option<&SimulatedLedger> {
        if e.is_connect() {
            self.fallback.as_ref()
        } else {
            None
        }
    }

    /// The raw recorded reference, `None` when the ledger has no issuance.
    async fn fetch_issuance(
        &self,
        ticket_id: TicketId,
    ) -> Result<Option<String>, reqwest::Error> {
        let response = self
            .client
            .get(self.endpoint(&format!("issuances/{ticket_id}")))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body: IssuanceResponse = response.error_for_status()?.json().await?;
        Ok(Some(body.transaction_reference))
    }
}

fn real_issuance(reference: &str) -> Result<Issuance, LedgerError> {
    TransactionReference::parse(reference)
        .map(Issuance::Real)
        .map_err(|e| LedgerError::InvalidResponse(e.to_string()))
}

fn map_reqwest_error(e: reqwest::Error) -> LedgerError {
    if e.is_timeout() {
        LedgerError::Timeout
    } else if e.is_decode() {
        LedgerError::InvalidResponse(e.to_string())
    } else if e.status().is_some_and(|s| s.is_client_error()) {
        LedgerError::Rejected(e.to_string())
    } else {
        LedgerError::Unavailable(e.to_string())
    }
}

impl LedgerGateway for HttpLedger {
    async fn connect_wallet(&self) -> Option<WalletAddress> {
        let result = async {
            self.client
                .get(self.endpoint("accounts"))
                .send()
                .await?
                .error_for_status()?
                .json::<AccountsResponse>()
                .await
        }
        .await;
        match result {
            Ok(body) => body
                .accounts
                .first()
                .and_then(|a| WalletAddress::parse(a).ok()),
            Err(e) => match self.fallback_for(&e) {
                Some(fallback) => fallback.connect_wallet().await,
                None => {
                    warn!(error = %e, "ledger account lookup failed");
                    None
                }
            },
        }
    }

    async fn sign_message(&self, message: &str, address: &WalletAddress) -> Option<String> {
        let result = async {
            self.client
                .post(self.endpoint("signatures"))
                .json(&SignatureRequest {
                    message,
                    address: address.as_str(),
                })
                .send()
                .await?
                .error_for_status()?
                .json::<SignatureResponse>()
                .await
        }
        .await;
        match result {
            Ok(body) => Some(body.signature),
            Err(e) => match self.fallback_for(&e) {
                Some(fallback) => fallback.sign_message(message, address).await,
                None => {
                    warn!(error = %e, "ledger message signing failed");
                    None
                }
            },
        }
    }

    async fn lookup_issuance(&self, ticket_id: TicketId) -> Result<Option<Issuance>, LedgerError> {
        match self.fetch_issuance(ticket_id).await {
            Ok(reference) => reference.as_deref().map(real_issuance).transpose(),
            Err(e) => match self.fallback_for(&e) {
                Some(fallback) => fallback.lookup_issuance(ticket_id).await,
                None => Err(map_reqwest_error(e)),
            },
        }
    }

    async fn issue_ticket(
        &self,
        event_id: EventId,
        student_id: UserId,
        ticket_id: TicketId,
    ) -> Result<Issuance, LedgerError> {
        let result = async {
            self.client
                .post(self.endpoint("issuances"))
                .header("Idempotency-Key", ticket_id.to_string())
                .json(&IssuanceRequest {
                    ticket_id,
                    event_id,
                    student_id,
                })
                .send()
                .await?
                .error_for_status()?
                .json::<IssuanceResponse>()
                .await
        }
        .await;
        match result {
            Ok(body) => real_issuance(&body.transaction_reference),
            Err(e) => match self.fallback_for(&e) {
                Some(fallback) => {
                    warn!(error = %e, %ticket_id, "ledger unreachable, issuing simulated ticket");
                    fallback.issue_ticket(event_id, student_id, ticket_id).await
                }
                None => Err(map_reqwest_error(e)),
            },
        }
    }

    async fn verify_ticket(&self, ticket_id: TicketId, reference: &str) -> bool {
        if TransactionReference::parse_canonical(reference).is_err() {
            return false;
        }
        match self.fetch_issuance(ticket_id).await {
            Ok(Some(recorded))
                if TransactionReference::parse(&recorded).is_ok_and(|r| r.as_str() == reference) =>
            {
                true
            }
            Ok(_) | Err(_) => match &self.fallback {
                Some(fallback) => fallback.verify_ticket(ticket_id, reference).await,
                None => false,
            },
        }
    }
}

// ── Dispatch ──────────────────────────────────────────────────────────────────

/// Ledger selected by configuration: `LEDGER_URL` set means `Http`.
#[derive(Clone)]
pub enum Ledger {
    Http(HttpLedger),
    Simulated(SimulatedLedger),
}

impl LedgerGateway for Ledger {
    async fn connect_wallet(&self) -> Option<WalletAddress> {
        match self {
            Self::Http(l) => l.connect_wallet().await,
            Self::Simulated(l) => l.connect_wallet().await,
        }
    }

    async fn sign_message(&self, message: &str, address: &WalletAddress) -> Option<String> {
        match self {
            Self::Http(l) => l.sign_message(message, address).await,
            Self::Simulated(l) => l.sign_message(message, address).await,
        }
    }

    async fn lookup_issuance(&self, ticket_id: TicketId) -> Result<Option<Issuance>, LedgerError> {
        match self {
            Self::Http(l) => l.lookup_issuance(ticket_id).await,
            Self::Simulated(l) => l.lookup_issuance(ticket_id).await,
        }
    }

    async fn issue_ticket(
        &self,
        event_id: EventId,
        student_id: UserId,
        ticket_id: TicketId,
    ) -> Result<Issuance, LedgerError> {
        match self {
            Self::Http(l) => l.issue_ticket(event_id, student_id, ticket_id).await,
            Self::Simulated(l) => l.issue_ticket(event_id, student_id, ticket_id).await,
        }
    }

    async fn verify_ticket(&self, ticket_id: TicketId, reference: &str) -> bool {
        match self {
            Self::Http(l) => l.verify_ticket(ticket_id, reference).await,
            Self::Simulated(l) => l.verify_ticket(ticket_id, reference).await,
        }
    }
}
