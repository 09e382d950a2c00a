//! Utility functions and helpers
//!
//! Cryptographic primitives, the hex codecs used at the serialization
//! boundary, and the periodic task runner behind the mining and sync loops.

pub mod codec;
pub mod crypto;
pub mod periodic;

pub use codec::{decode_hash, encode_hash, hex_hash, Hash, PublicKey, Signature, HASH_LEN};
pub use crypto::{
    base58_decode, base58_encode, current_timestamp, ecdsa_p256_sha256_sign_digest,
    ecdsa_p256_sha256_sign_verify, new_key_pair, ripemd160_digest, sha256_digest, sha256_hash,
};
pub use periodic::PeriodicTask;
