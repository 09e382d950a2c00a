use crate::core::{Token, Transaction, TransactionRequest};
use crate::error::{BlockchainError, Result};
use crate::utils::{PublicKey, Signature};
use data_encoding::HEXLOWER;
use ring::rand::SystemRandom;
use ring::signature::{EcdsaKeyPair, KeyPair, ECDSA_P256_SHA256_FIXED_SIGNING};

const VERSION: u8 = 0x00;
pub const ADDRESS_CHECK_SUM_LEN: usize = 4;

/// A P-256 key pair and the address derived from its public key.
#[derive(Clone)]
pub struct Wallet {
    pkcs8: Vec<u8>,
    public_key: PublicKey,
}

impl Wallet {
    pub fn new() -> Result<Wallet> {
        let pkcs8 = crate::utils::new_key_pair()?;
        Wallet::from_pkcs8(&pkcs8)
    }

    pub fn from_pkcs8(pkcs8: &[u8]) -> Result<Wallet> {
        let rng = SystemRandom::new();
        let key_pair = EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, pkcs8, &rng)
            .map_err(|e| {
                BlockchainError::Crypto(format!("Failed to create key pair from PKCS8: {e}"))
            })?;
        let public_key = PublicKey::from_bytes(key_pair.public_key().as_ref())?;
        Ok(Wallet {
            pkcs8: pkcs8.to_vec(),
            public_key,
        })
    }

    pub fn get_address(&self) -> String {
        let pub_key_hash = hash_pub_key(self.public_key.as_bytes());
        convert_address(pub_key_hash.as_slice())
    }

    pub fn get_public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn get_pkcs8(&self) -> &[u8] {
        self.pkcs8.as_slice()
    }

    pub fn pkcs8_hex(&self) -> String {
        HEXLOWER.encode(&self.pkcs8)
    }

    pub fn sign(&self, transaction: &Transaction) -> Result<Signature> {
        let payload = transaction.signing_payload()?;
        let signature = crate::utils::ecdsa_p256_sha256_sign_digest(&self.pkcs8, &payload)?;
        Signature::from_bytes(&signature)
    }

    /// A ready-to-submit request moving `token` from this wallet to `recipient`.
    pub fn sign_transaction(&self, recipient: &str, token: Token) -> Result<TransactionRequest> {
        let sender = self.get_address();
        let transaction = Transaction::new(&sender, recipient, token.clone());
        let signature = self.sign(&transaction)?;
        Ok(TransactionRequest::from_parts(
            &sender,
            recipient,
            &token,
            &self.public_key,
            &signature,
        ))
    }
}

pub fn hash_pub_key(pub_key: &[u8]) -> Vec<u8> {
    let pub_key_sha256 = crate::utils::sha256_digest(pub_key);
    crate::utils::ripemd160_digest(pub_key_sha256.as_slice())
}

fn checksum(payload: &[u8]) -> Vec<u8> {
    let first_sha = crate::utils::sha256_digest(payload);
    let second_sha = crate::utils::sha256_digest(first_sha.as_slice());
    second_sha[0..ADDRESS_CHECK_SUM_LEN].to_vec()
}

pub fn validate_address(address: &str) -> bool {
    let payload = match crate::utils::base58_decode(address) {
        Ok(payload) => payload,
        Err(_) => return false,
    };
    if payload.len() < ADDRESS_CHECK_SUM_LEN + 1 {
        return false;
    }

    let (body, actual_checksum) = payload.split_at(payload.len() - ADDRESS_CHECK_SUM_LEN);
    checksum(body).as_slice() == actual_checksum
}

/// version + pub_key_hash + checksum, base58 encoded
pub fn convert_address(pub_hash_key: &[u8]) -> String {
    let mut payload: Vec<u8> = vec![VERSION];
    payload.extend(pub_hash_key);
    let checksum = checksum(payload.as_slice());
    payload.extend(checksum.as_slice());
    crate::utils::base58_encode(payload.as_slice())
}
