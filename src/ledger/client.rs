//! Ledger RPC client with timeout and error handling.
//!
//! # Responsibilities
//! - Connect to the Solana JSON-RPC endpoint
//! - Fetch lifetime anchors (latest blockhash, durable nonce values)
//! - Query rent-exempt minimum balances
//! - Submit transactions and await confirmation

use std::time::Duration;

use solana_account_decoder::{UiAccountEncoding, UiDataSliceConfig};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::RpcAccountInfoConfig;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::VersionedTransaction;
use tokio::time::{interval, timeout};

use crate::ledger::types::{LedgerError, LedgerResult};

/// Fixed size of a nonce account's data, in bytes. Rent exemption is always
/// quoted for exactly this size.
pub const NONCE_ACCOUNT_SIZE: usize = 80;

/// Byte offset of the nonce value inside a nonce account's raw data: a
/// 4-byte version tag, a 4-byte state tag, and the 32-byte authority come
/// first. Structural contract of the system program's account layout.
pub const NONCE_VALUE_OFFSET: usize = 4 + 4 + 32;

/// Length of the nonce value field.
pub const NONCE_VALUE_LEN: usize = 32;

/// How long to wait for a durable-nonce transaction to confirm.
const CONFIRM_TIMEOUT_SECS: u64 = 90;

/// Signature status poll cadence during confirmation.
const CONFIRM_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// RPC client wrapper pinned to one endpoint and commitment level.
pub struct LedgerClient {
    rpc: RpcClient,
    commitment: CommitmentConfig,
}

impl LedgerClient {
    /// Connect to the given RPC endpoint at `confirmed` commitment.
    pub fn new(rpc_url: &str, rpc_timeout_secs: u64) -> Self {
        let commitment = CommitmentConfig::confirmed();
        let rpc = RpcClient::new_with_timeout_and_commitment(
            rpc_url.to_string(),
            Duration::from_secs(rpc_timeout_secs),
            commitment,
        );

        tracing::info!(
            rpc_url = %rpc_url,
            commitment = ?commitment.commitment,
            "Ledger client initialized"
        );

        Self { rpc, commitment }
    }

    /// Commitment level used for queries and confirmation.
    pub fn commitment(&self) -> CommitmentConfig {
        self.commitment
    }

    /// Fetch the latest confirmed blockhash and its last valid block height.
    pub async fn latest_blockhash(&self) -> LedgerResult<(Hash, u64)> {
        let (blockhash, last_valid_block_height) = self
            .rpc
            .get_latest_blockhash_with_commitment(self.commitment)
            .await?;
        Ok((blockhash, last_valid_block_height))
    }

    /// Fetch the minimum balance for an account of `space` bytes to be
    /// exempt from rent collection.
    pub async fn minimum_rent_exempt_balance(&self, space: usize) -> LedgerResult<u64> {
        let lamports = self.rpc.get_minimum_balance_for_rent_exemption(space).await?;
        Ok(lamports)
    }

    /// Read the current nonce value of a nonce account.
    ///
    /// Reads exactly [`NONCE_VALUE_LEN`] bytes at [`NONCE_VALUE_OFFSET`] via
    /// a server-side data slice, skipping the account header. Fails with
    /// [`LedgerError::NonceUnreadable`] when the account is missing or its
    /// data is shorter than the nonce field.
    pub async fn nonce_value(&self, nonce_account: &Pubkey) -> LedgerResult<Hash> {
        let config = RpcAccountInfoConfig {
            encoding: Some(UiAccountEncoding::Base58),
            data_slice: Some(UiDataSliceConfig {
                offset: NONCE_VALUE_OFFSET,
                length: NONCE_VALUE_LEN,
            }),
            commitment: Some(self.commitment),
            min_context_slot: None,
        };

        let response = self.rpc.get_account_with_config(nonce_account, config).await?;
        let account = response.value.ok_or(LedgerError::NonceUnreadable)?;
        let bytes: [u8; NONCE_VALUE_LEN] = account
            .data
            .as_slice()
            .try_into()
            .map_err(|_| LedgerError::NonceUnreadable)?;

        let nonce = Hash::new_from_array(bytes);
        tracing::debug!(
            nonce_account = %nonce_account,
            nonce = %nonce,
            "Fetched current nonce value"
        );
        Ok(nonce)
    }

    /// Submit a blockhash-anchored transaction and wait for confirmation.
    ///
    /// Confirmation semantics (polling, blockhash expiry) are delegated to
    /// the RPC client.
    pub async fn send_and_confirm(&self, tx: &VersionedTransaction) -> LedgerResult<Signature> {
        let signature = self.rpc.send_and_confirm_transaction(tx).await?;
        Ok(signature)
    }

    /// Submit a durable-nonce-anchored transaction and wait for confirmation.
    ///
    /// A nonce anchor never expires by block height, so the client's default
    /// blockhash-expiry confirmation loop does not apply. Instead we poll the
    /// signature status; while the signature is not yet visible we re-read
    /// the nonce account, and if its value has moved past `expected_nonce`
    /// without our signature landing the race was lost and
    /// [`LedgerError::NonceAdvanced`] is returned.
    pub async fn send_and_confirm_nonce(
        &self,
        tx: &VersionedTransaction,
        nonce_account: &Pubkey,
        expected_nonce: &Hash,
    ) -> LedgerResult<Signature> {
        let signature = self.rpc.send_transaction(tx).await?;

        let confirmation = timeout(Duration::from_secs(CONFIRM_TIMEOUT_SECS), async {
            let mut ticker = interval(CONFIRM_POLL_INTERVAL);

            loop {
                ticker.tick().await;

                let statuses = self.rpc.get_signature_statuses(&[signature]).await?;
                match statuses.value.into_iter().next().flatten() {
                    Some(status) => {
                        if let Some(err) = status.err {
                            return Err(LedgerError::Execution(err));
                        }
                        if status.satisfies_commitment(self.commitment) {
                            return Ok(signature);
                        }
                        tracing::debug!(signature = %signature, "Waiting for confirmation");
                    }
                    None => {
                        // Signature not visible yet. If the nonce has already
                        // moved on, another transaction consumed it first.
                        let current = self.nonce_value(nonce_account).await?;
                        if current != *expected_nonce {
                            return Err(LedgerError::NonceAdvanced);
                        }
                    }
                }
            }
        })
        .await;

        match confirmation {
            Ok(result) => result,
            Err(_) => Err(LedgerError::ConfirmationTimeout(CONFIRM_TIMEOUT_SECS)),
        }
    }
}

impl std::fmt::Debug for LedgerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerClient")
            .field("url", &self.rpc.url())
            .field("commitment", &self.commitment.commitment)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonce_layout_constants() {
        // Header: 4-byte version + 4-byte state + 32-byte authority.
        assert_eq!(NONCE_VALUE_OFFSET, 40);
        assert_eq!(NONCE_VALUE_LEN, 32);
    }

    #[test]
    fn test_nonce_account_size_matches_sdk_state() {
        assert_eq!(NONCE_ACCOUNT_SIZE, solana_sdk::nonce::State::size());
        assert_eq!(NONCE_ACCOUNT_SIZE, 80);
    }

    #[test]
    fn test_client_commitment_is_confirmed() {
        let client = LedgerClient::new("http://localhost:8899", 30);
        assert_eq!(client.commitment(), CommitmentConfig::confirmed());
    }
}
