use campustix_domain::ledger::WalletAddress;

use crate::domain::gateway::LedgerGateway;
use crate::error::TicketingError;

// ── ConnectWallet ────────────────────────────────────────────────────────────

pub struct ConnectWalletUseCase<L: LedgerGateway> {
    pub ledger: L,
}

impl<L: LedgerGateway> ConnectWalletUseCase<L> {
    /// `None` when no account is available.
    pub async fn execute(&self) -> Option<WalletAddress> {
        self.ledger.connect_wallet().await
    }
}

// ── SignMessage ──────────────────────────────────────────────────────────────

pub struct SignMessageUseCase<L: LedgerGateway> {
    pub ledger: L,
}

impl<L: LedgerGateway> SignMessageUseCase<L> {
    /// `Ok(None)` when the signer refused.
    pub async fn execute(
        &self,
        message: &str,
        address: &str,
    ) -> Result<Option<String>, TicketingError> {
        if message.is_empty() {
            return Err(TicketingError::invalid_input("message is empty"));
        }
        let address = WalletAddress::parse(address)
            .map_err(|e| TicketingError::invalid_input(e.to_string()))?;
        Ok(self.ledger.sign_message(message, &address).await)
    }
}
