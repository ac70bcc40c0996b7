//! Ledger-specific types and error definitions.

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use solana_client::client_error::ClientError;
use solana_sdk::message::CompileError;
use solana_sdk::pubkey::ParsePubkeyError;
use solana_sdk::signature::Signature;
use solana_sdk::signer::SignerError;
use solana_sdk::transaction::TransactionError;
use thiserror::Error;

/// Fixed notice returned when a durable-nonce submission loses the race
/// against a concurrent transaction consuming the same nonce.
pub const NONCE_RACE_NOTICE: &str =
    "durable nonce advanced before submission; transfer dropped without effect";

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// An address string failed base58/pubkey validation.
    #[error("invalid address '{address}': {source}")]
    InvalidAddress {
        address: String,
        source: ParsePubkeyError,
    },

    /// RPC connection or request failed. The structured client error is
    /// preserved so failures can be classified (see `is_stale_nonce_failure`).
    #[error("rpc request failed: {0}")]
    Rpc(#[from] Box<ClientError>),

    /// Secret key material could not be decoded into a signer.
    #[error("signer key rejected: {0}")]
    Key(String),

    /// Transaction message could not be compiled for the requested version.
    #[error("transaction message compilation failed: {0}")]
    Compile(#[from] CompileError),

    /// Transaction signing failed.
    #[error("transaction signing failed: {0}")]
    Signing(#[from] SignerError),

    /// The nonce account exists but its data could not be read or is too
    /// short to contain a nonce value.
    #[error("failed to read the nonce value from the account")]
    NonceUnreadable,

    /// The durable nonce moved past the anchored value before the
    /// transaction landed. Converted to a soft outcome by the transfer path.
    #[error("durable nonce advanced past the anchored value")]
    NonceAdvanced,

    /// The transaction was submitted but not confirmed in time.
    #[error("transaction not confirmed after {0} seconds")]
    ConfirmationTimeout(u64),

    /// The transaction landed but failed on chain.
    #[error("transaction failed on chain: {0}")]
    Execution(TransactionError),
}

impl From<ClientError> for LedgerError {
    fn from(err: ClientError) -> Self {
        LedgerError::Rpc(Box::new(err))
    }
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Transaction format version tag accepted on the wire.
///
/// Serialized as the string `"legacy"` or the number `0`, matching the
/// public API contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionVersion {
    Legacy,
    V0,
}

impl<'de> Deserialize<'de> for TransactionVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u8),
            Tag(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(0) => Ok(TransactionVersion::V0),
            Raw::Number(n) => Err(de::Error::custom(format!(
                "unsupported transaction version {n}"
            ))),
            Raw::Tag(tag) if tag == "legacy" => Ok(TransactionVersion::Legacy),
            Raw::Tag(tag) => Err(de::Error::custom(format!(
                "unsupported transaction version '{tag}'"
            ))),
        }
    }
}

impl Serialize for TransactionVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            TransactionVersion::Legacy => serializer.serialize_str("legacy"),
            TransactionVersion::V0 => serializer.serialize_u8(0),
        }
    }
}

/// A transfer request as accepted on the public API. Unknown fields are
/// ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    /// Destination account address (base58).
    pub destination: String,

    /// Amount in lamports.
    pub amount: u64,

    /// Optional nonce account address; presence selects the durable-nonce
    /// path.
    #[serde(default)]
    pub nonce_address: Option<String>,

    /// Transaction format version.
    pub version: TransactionVersion,
}

/// Outcome of a transfer submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    /// The transaction was submitted and confirmed; carries its signature.
    Submitted(Signature),

    /// The durable nonce advanced before submission. Benign race, reported
    /// as a notice instead of an error.
    NonceAdvanced,
}
