//! Value transfers in the ledger. A transaction moves a named token amount from
//! one address to another; balances are derived by replaying the chain, so there
//! are no inputs or outputs to track.

use crate::core::Amount;
use crate::error::{BlockchainError, Result};
use crate::utils::{PublicKey, Signature};
use serde::{Deserialize, Serialize};

/// A named amount, e.g. `10 DNZ`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub token_name: String,
    pub token_value: Amount,
}

impl Token {
    pub fn new(token_name: &str, token_value: Amount) -> Token {
        Token {
            token_name: token_name.to_string(),
            token_value,
        }
    }
}

// Field order here is the canonical serialization used for hashing and signing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    sender_blockchain_address: String,
    recipient_blockchain_address: String,
    token: Token,
}

impl Transaction {
    pub fn new(sender: &str, recipient: &str, token: Token) -> Transaction {
        Transaction {
            sender_blockchain_address: sender.to_string(),
            recipient_blockchain_address: recipient.to_string(),
            token,
        }
    }

    pub fn get_sender(&self) -> &str {
        self.sender_blockchain_address.as_str()
    }

    pub fn get_recipient(&self) -> &str {
        self.recipient_blockchain_address.as_str()
    }

    pub fn get_token(&self) -> &Token {
        &self.token
    }

    /// The bytes a sender signs. ECDSA P-256/SHA-256 hashes them, so the
    /// signature commits to the transaction's SHA-256 content hash.
    pub fn signing_payload(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn verify_signature(&self, public_key: &PublicKey, signature: &Signature) -> bool {
        match self.signing_payload() {
            Ok(payload) => crate::utils::ecdsa_p256_sha256_sign_verify(
                public_key.as_bytes(),
                signature.as_bytes(),
                &payload,
            ),
            Err(_) => false,
        }
    }
}

/// Wire-level transaction submission, as sent by a wallet or forwarded by a
/// peer. Every field is optional on the wire so a missing one can be reported
/// instead of failing deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub sender_blockchain_address: Option<String>,
    pub recipient_blockchain_address: Option<String>,
    pub sender_public_key: Option<String>,
    pub token_name: Option<String>,
    pub token_value: Option<Amount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

/// A request whose fields are present and whose hex values decoded.
#[derive(Debug, Clone)]
pub struct DecodedRequest {
    pub sender: String,
    pub recipient: String,
    pub token: Token,
    pub public_key: Option<PublicKey>,
    pub signature: Option<Signature>,
}

impl TransactionRequest {
    pub fn from_parts(
        sender: &str,
        recipient: &str,
        token: &Token,
        public_key: &PublicKey,
        signature: &Signature,
    ) -> TransactionRequest {
        TransactionRequest {
            sender_blockchain_address: Some(sender.to_string()),
            recipient_blockchain_address: Some(recipient.to_string()),
            sender_public_key: Some(public_key.to_hex()),
            token_name: Some(token.token_name.clone()),
            token_value: Some(token.token_value.clone()),
            signature: Some(signature.to_hex()),
        }
    }

    /// Field presence check. The signature may only be omitted by the
    /// privileged reward sender.
    pub fn validate(&self, reward_sender: &str) -> bool {
        if self.sender_blockchain_address.is_none()
            || self.recipient_blockchain_address.is_none()
            || self.sender_public_key.is_none()
            || self.token_name.is_none()
            || self.token_value.is_none()
        {
            return false;
        }
        self.signature.is_some() || self.sender_blockchain_address.as_deref() == Some(reward_sender)
    }

    pub fn decode(&self, reward_sender: &str) -> Result<DecodedRequest> {
        if !self.validate(reward_sender) {
            return Err(BlockchainError::Transaction(
                "missing field(s) in transaction request".to_string(),
            ));
        }
        let missing = || BlockchainError::Transaction("missing field".to_string());
        let sender = self.sender_blockchain_address.clone().ok_or_else(missing)?;
        let recipient = self
            .recipient_blockchain_address
            .clone()
            .ok_or_else(missing)?;
        let token = Token {
            token_name: self.token_name.clone().ok_or_else(missing)?,
            token_value: self.token_value.clone().ok_or_else(missing)?,
        };

        // Key material from the reward sender is never consulted.
        if sender == reward_sender {
            return Ok(DecodedRequest {
                sender,
                recipient,
                token,
                public_key: None,
                signature: None,
            });
        }

        let public_key = PublicKey::from_hex(self.sender_public_key.as_deref().unwrap_or(""))?;
        let signature = Signature::from_hex(self.signature.as_deref().unwrap_or(""))?;
        Ok(DecodedRequest {
            sender,
            recipient,
            token,
            public_key: Some(public_key),
            signature: Some(signature),
        })
    }
}
