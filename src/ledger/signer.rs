//! Process identity management and key loading.
//!
//! # Security
//! - Secret keys are loaded ONLY from environment variables
//! - Keys are never logged or serialized; only derived addresses appear in logs
//! - Identities are read-only after startup and shared via `Arc`

use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use solana_sdk::signer::keypair::keypair_from_seed;
use solana_sdk::signer::Signer;

use crate::ledger::types::{LedgerError, LedgerResult};

/// Environment variable holding the authority/payer secret key.
pub const PAYER_KEY_ENV_VAR: &str = "PAYER_PRIVATE_KEY";

/// Environment variable holding the receiver secret key.
pub const RECEIVER_KEY_ENV_VAR: &str = "RECEIVER_PRIVATE_KEY";

/// The two process identities used to sign transactions.
///
/// The authority/payer funds blockhash-anchored transfers and owns nonce
/// accounts; the receiver pays fees on the durable-nonce path. The split fee
/// payer is a named contract of the transfer paths, see
/// [`crate::ledger::service`].
pub struct ServiceSigners {
    /// Transfer source, nonce authority, and blockhash-path fee payer.
    pub authority_payer: Keypair,
    /// Durable-nonce-path fee payer.
    pub receiver: Keypair,
}

impl ServiceSigners {
    /// Decode a base58-encoded 32-byte ed25519 private key into a keypair.
    pub fn keypair_from_base58(encoded: &str) -> LedgerResult<Keypair> {
        let seed = bs58::decode(encoded)
            .into_vec()
            .map_err(|e| LedgerError::Key(format!("invalid base58 secret: {e}")))?;
        keypair_from_seed(&seed)
            .map_err(|e| LedgerError::Key(format!("secret does not derive a keypair: {e}")))
    }

    /// Build the process identities from two base58 secrets.
    pub fn from_base58(payer_secret: &str, receiver_secret: &str) -> LedgerResult<Self> {
        let authority_payer = Self::keypair_from_base58(payer_secret)?;
        let receiver = Self::keypair_from_base58(receiver_secret)?;

        tracing::info!(
            address = %authority_payer.pubkey(),
            "Authority & payer initialized"
        );
        tracing::info!(address = %receiver.pubkey(), "Receiver initialized");

        Ok(Self {
            authority_payer,
            receiver,
        })
    }

    /// Load identities from `PAYER_PRIVATE_KEY` and `RECEIVER_PRIVATE_KEY`.
    pub fn from_env() -> LedgerResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load identities through a variable lookup function.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> LedgerResult<Self> {
        let payer_secret = lookup(PAYER_KEY_ENV_VAR)
            .ok_or_else(|| LedgerError::Key(format!("{PAYER_KEY_ENV_VAR} missing from env vars")))?;
        let receiver_secret = lookup(RECEIVER_KEY_ENV_VAR).ok_or_else(|| {
            LedgerError::Key(format!("{RECEIVER_KEY_ENV_VAR} missing from env vars"))
        })?;

        Self::from_base58(&payer_secret, &receiver_secret)
    }

    /// Address of the authority/payer identity.
    pub fn authority_address(&self) -> Pubkey {
        self.authority_payer.pubkey()
    }

    /// Address of the receiver identity.
    pub fn receiver_address(&self) -> Pubkey {
        self.receiver.pubkey()
    }
}

impl std::fmt::Debug for ServiceSigners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceSigners")
            .field("authority_payer", &self.authority_payer.pubkey())
            .field("receiver", &self.receiver.pubkey())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_seed(seed: [u8; 32]) -> String {
        bs58::encode(seed).into_string()
    }

    #[test]
    fn test_keypair_from_base58_is_deterministic() {
        let secret = encode_seed([7u8; 32]);
        let a = ServiceSigners::keypair_from_base58(&secret).unwrap();
        let b = ServiceSigners::keypair_from_base58(&secret).unwrap();
        assert_eq!(a.pubkey(), b.pubkey());
    }

    #[test]
    fn test_distinct_seeds_distinct_identities() {
        let signers =
            ServiceSigners::from_base58(&encode_seed([1u8; 32]), &encode_seed([2u8; 32])).unwrap();
        assert_ne!(signers.authority_address(), signers.receiver_address());
    }

    #[test]
    fn test_invalid_base58_rejected() {
        let result = ServiceSigners::keypair_from_base58("not-base58-0OIl");
        assert!(matches!(result, Err(LedgerError::Key(_))));
    }

    #[test]
    fn test_wrong_length_seed_rejected() {
        let short = bs58::encode([3u8; 16]).into_string();
        let result = ServiceSigners::keypair_from_base58(&short);
        assert!(matches!(result, Err(LedgerError::Key(_))));
    }

    #[test]
    fn test_missing_payer_key_is_fatal() {
        let receiver = encode_seed([2u8; 32]);
        let result = ServiceSigners::from_lookup(|key| {
            (key == RECEIVER_KEY_ENV_VAR).then(|| receiver.clone())
        });
        match result {
            Err(LedgerError::Key(message)) => assert!(message.contains(PAYER_KEY_ENV_VAR)),
            other => panic!("expected a key error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_receiver_key_is_fatal() {
        let payer = encode_seed([1u8; 32]);
        let result =
            ServiceSigners::from_lookup(|key| (key == PAYER_KEY_ENV_VAR).then(|| payer.clone()));
        match result {
            Err(LedgerError::Key(message)) => assert!(message.contains(RECEIVER_KEY_ENV_VAR)),
            other => panic!("expected a key error, got {other:?}"),
        }
    }
}
