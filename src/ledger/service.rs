//! Transfer orchestration: build, sign, submit, confirm.
//!
//! # Responsibilities
//! - Translate a transfer request into a correctly-anchored transaction
//! - Select the lifetime anchor (blockhash vs durable nonce)
//! - Classify the stale-nonce race and report it as a soft outcome
//! - Create and initialize nonce accounts
//!
//! # Fee payer contract
//! The two transfer paths intentionally use different fee payers:
//! - blockhash path: the authority/payer funds the transfer AND pays the fee
//! - durable-nonce path: the authority/payer funds the transfer and owns the
//!   nonce, but the RECEIVER identity pays the fee
//!
//! Changing this silently would alter ledger accounting; it is covered by
//! tests.

use std::str::FromStr;

use solana_client::client_error::ClientError;
use solana_sdk::hash::Hash;
use solana_sdk::instruction::Instruction;
use solana_sdk::message::{v0, Message, VersionedMessage};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature};
use solana_sdk::signer::Signer;
use solana_sdk::system_instruction;
use solana_sdk::transaction::{TransactionError, VersionedTransaction};

use crate::ledger::client::{LedgerClient, NONCE_ACCOUNT_SIZE};
use crate::ledger::signer::ServiceSigners;
use crate::ledger::types::{
    LedgerError, LedgerResult, TransactionVersion, TransferOutcome, TransferRequest,
};
use crate::observability::metrics;

/// Orchestration service for transfers and nonce account creation.
pub struct TransferService {
    client: LedgerClient,
    signers: ServiceSigners,
}

impl TransferService {
    /// Create a new service over an RPC client and the process identities.
    pub fn new(client: LedgerClient, signers: ServiceSigners) -> Self {
        Self { client, signers }
    }

    /// Submit a transfer, anchored per the request.
    ///
    /// Without a nonce address the transaction is anchored with the latest
    /// blockhash; with one it is anchored with the nonce account's current
    /// value, re-read immediately before signing. A submission that loses
    /// the nonce race yields [`TransferOutcome::NonceAdvanced`] instead of
    /// an error; every other failure propagates.
    pub async fn create_transfer(&self, request: &TransferRequest) -> LedgerResult<TransferOutcome> {
        let destination = parse_address(&request.destination)?;

        let Some(nonce_address) = &request.nonce_address else {
            let signature = self
                .blockhash_transfer(&destination, request.amount, request.version)
                .await?;
            return Ok(TransferOutcome::Submitted(signature));
        };

        let nonce_account = parse_address(nonce_address)?;
        match self
            .nonce_transfer(&nonce_account, &destination, request.amount, request.version)
            .await
        {
            Ok(signature) => Ok(TransferOutcome::Submitted(signature)),
            Err(LedgerError::NonceAdvanced) => {
                metrics::record_nonce_race();
                tracing::info!(
                    nonce_account = %nonce_account,
                    "Nonce advanced before submission, gracefully handling"
                );
                Ok(TransferOutcome::NonceAdvanced)
            }
            Err(LedgerError::Rpc(client_err)) if is_stale_nonce_failure(&client_err) => {
                metrics::record_nonce_race();
                tracing::info!(
                    nonce_account = %nonce_account,
                    "Nonce advanced before submission, gracefully handling"
                );
                Ok(TransferOutcome::NonceAdvanced)
            }
            Err(err) => Err(err),
        }
    }

    /// Create a fresh nonce account owned by the authority/payer.
    ///
    /// One transaction, two instructions: fund the new account with the
    /// rent-exempt minimum for its fixed data size, then initialize it as a
    /// nonce account. Returns the new address only after the transaction is
    /// confirmed; failures propagate unmodified.
    pub async fn create_nonce_account(&self) -> LedgerResult<Pubkey> {
        let nonce_keypair = Keypair::new();
        let authority = self.signers.authority_address();

        let rent = self
            .client
            .minimum_rent_exempt_balance(NONCE_ACCOUNT_SIZE)
            .await?;

        let instructions = system_instruction::create_nonce_account(
            &authority,
            &nonce_keypair.pubkey(),
            &authority,
            rent,
        );

        let (blockhash, _last_valid_block_height) = self.client.latest_blockhash().await?;
        let message =
            build_message(TransactionVersion::V0, &authority, &instructions, blockhash)?;
        let tx = VersionedTransaction::try_new(
            message,
            &[&self.signers.authority_payer, &nonce_keypair],
        )?;

        let signature = self.client.send_and_confirm(&tx).await?;
        tracing::info!(
            address = %nonce_keypair.pubkey(),
            signature = %signature,
            "Nonce account created"
        );

        Ok(nonce_keypair.pubkey())
    }

    async fn blockhash_transfer(
        &self,
        destination: &Pubkey,
        lamports: u64,
        version: TransactionVersion,
    ) -> LedgerResult<Signature> {
        let (blockhash, _last_valid_block_height) = self.client.latest_blockhash().await?;

        let message = blockhash_transfer_message(
            &self.signers.authority_address(),
            destination,
            lamports,
            version,
            blockhash,
        )?;
        let tx = VersionedTransaction::try_new(message, &[&self.signers.authority_payer])?;

        let signature = self.client.send_and_confirm(&tx).await?;
        tracing::info!(signature = %signature, "Transfer confirmed");
        Ok(signature)
    }

    async fn nonce_transfer(
        &self,
        nonce_account: &Pubkey,
        destination: &Pubkey,
        lamports: u64,
        version: TransactionVersion,
    ) -> LedgerResult<Signature> {
        // Re-read immediately before signing; a concurrent consumer may have
        // advanced the value since the caller observed it.
        let nonce = self.client.nonce_value(nonce_account).await?;

        let message = nonce_transfer_message(
            &self.signers.authority_address(),
            &self.signers.receiver_address(),
            nonce_account,
            destination,
            lamports,
            version,
            nonce,
        )?;
        let tx = VersionedTransaction::try_new(
            message,
            &[&self.signers.receiver, &self.signers.authority_payer],
        )?;

        let signature = self
            .client
            .send_and_confirm_nonce(&tx, nonce_account, &nonce)
            .await?;
        tracing::info!(signature = %signature, "Nonce-anchored transfer confirmed");
        Ok(signature)
    }
}

/// Parse a base58 address string.
pub(crate) fn parse_address(address: &str) -> LedgerResult<Pubkey> {
    Pubkey::from_str(address).map_err(|source| LedgerError::InvalidAddress {
        address: address.to_string(),
        source,
    })
}

/// Compile instructions into a message of the requested version, anchored
/// with `anchor` (a blockhash or a durable nonce value).
pub(crate) fn build_message(
    version: TransactionVersion,
    fee_payer: &Pubkey,
    instructions: &[Instruction],
    anchor: Hash,
) -> LedgerResult<VersionedMessage> {
    match version {
        TransactionVersion::Legacy => Ok(VersionedMessage::Legacy(Message::new_with_blockhash(
            instructions,
            Some(fee_payer),
            &anchor,
        ))),
        TransactionVersion::V0 => {
            let message = v0::Message::try_compile(fee_payer, instructions, &[], anchor)?;
            Ok(VersionedMessage::V0(message))
        }
    }
}

/// Build a blockhash-anchored transfer message. The authority/payer is both
/// the transfer source and the fee payer.
pub(crate) fn blockhash_transfer_message(
    authority: &Pubkey,
    destination: &Pubkey,
    lamports: u64,
    version: TransactionVersion,
    blockhash: Hash,
) -> LedgerResult<VersionedMessage> {
    let transfer = system_instruction::transfer(authority, destination, lamports);
    build_message(version, authority, &[transfer], blockhash)
}

/// Build a durable-nonce-anchored transfer message. The nonce advance must
/// be the first instruction; the receiver identity pays the fee while the
/// authority/payer remains the transfer source and nonce authority.
pub(crate) fn nonce_transfer_message(
    authority: &Pubkey,
    fee_payer: &Pubkey,
    nonce_account: &Pubkey,
    destination: &Pubkey,
    lamports: u64,
    version: TransactionVersion,
    nonce: Hash,
) -> LedgerResult<VersionedMessage> {
    let advance = system_instruction::advance_nonce_account(nonce_account, authority);
    let transfer = system_instruction::transfer(authority, destination, lamports);
    build_message(version, fee_payer, &[advance, transfer], nonce)
}

/// Classify whether a submission failure means the durable nonce was stale.
///
/// A nonce-anchored transaction whose nonce no longer matches fails preflight
/// with `BlockhashNotFound`; since this is only consulted on the nonce path
/// the condition is unambiguous. The textual match is a last-resort fallback
/// for RPC implementations that do not surface the structured error.
pub(crate) fn is_stale_nonce_failure(err: &ClientError) -> bool {
    match err.get_transaction_error() {
        Some(TransactionError::BlockhashNotFound) => true,
        Some(_) => false,
        None => err.to_string().contains("advanced"),
    }
}
