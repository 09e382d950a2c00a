//! Key management and transaction signing
//!
//! A wallet holds a P-256 key pair. Its address is the base58 check-encoded
//! RIPEMD-160 of the SHA-256 of the public key.

#[allow(clippy::module_inception)]
pub mod wallet;

pub use wallet::{convert_address, hash_pub_key, validate_address, Wallet, ADDRESS_CHECK_SUM_LEN};
