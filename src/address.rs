//! Deterministic key-to-address derivation.
//!
//! Both pipelines are pure: the same scalar always yields the same strings.
//! BTC:  scalar*G -> uncompressed SEC1 point (65 bytes) -> SHA256 -> RIPEMD160
//!       -> version 0x00 -> double-SHA256 checksum -> Base58.
//! ETH:  scalar*G -> raw 64-byte point -> Keccak256 -> last 20 bytes -> 0x hex.

use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::SecretKey;

use crate::crypto::{checksum4, hash160, keccak256};
use crate::error::{Result, SweepError};
use crate::types::PrivateKey;

/// Mainnet P2PKH version byte.
const BTC_VERSION: u8 = 0x00;

/// Uncompressed SEC1 encoding of scalar*G: 0x04 prefix + X + Y, 65 bytes.
fn public_point(key: &PrivateKey) -> Result<[u8; 65]> {
    let secret = SecretKey::from_slice(key.as_bytes()).map_err(|_| SweepError::InvalidKey)?;
    let point = secret.public_key().to_encoded_point(false);
    let bytes = point.as_bytes();
    debug_assert_eq!(bytes.len(), 65);
    let mut out = [0u8; 65];
    out.copy_from_slice(bytes);
    Ok(out)
}

/// Derive the legacy Base58Check BTC address (uncompressed public key).
pub fn derive_btc(key: &PrivateKey) -> Result<String> {
    let point = public_point(key)?;
    let pubkey_hash = hash160(&point);

    let mut payload = [0u8; 25];
    payload[0] = BTC_VERSION;
    payload[1..21].copy_from_slice(&pubkey_hash);
    let checksum = checksum4(&payload[..21]);
    payload[21..].copy_from_slice(&checksum);

    Ok(bs58::encode(payload).into_string())
}

/// Derive the 0x-prefixed ETH address: Keccak256 of the raw 64-byte point,
/// last 20 bytes, lowercase hex.
pub fn derive_eth(key: &PrivateKey) -> Result<String> {
    let point = public_point(key)?;
    let digest = keccak256(&point[1..]); // strip the 0x04 prefix
    Ok(format!("0x{}", hex::encode(&digest[12..])))
}

/// Both addresses for one key. The scan loop checks each against the filter.
pub fn derive_pair(key: &PrivateKey) -> Result<(String, String)> {
    Ok((derive_btc(key)?, derive_eth(key)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(hex_str: &str) -> PrivateKey {
        PrivateKey::from_hex(hex_str).unwrap()
    }

    const KEY_ONE: &str = "0000000000000000000000000000000000000000000000000000000000000001";

    /// Permanent regression vector: scalar 1 is the curve generator point.
    #[test]
    fn scalar_one_btc_vector() {
        let addr = derive_btc(&key(KEY_ONE)).unwrap();
        assert_eq!(addr, "1EHNa6Q4Jz2uvNExL497mE43ikXhwF6kZm");
    }

    #[test]
    fn scalar_one_eth_vector() {
        let addr = derive_eth(&key(KEY_ONE)).unwrap();
        assert_eq!(addr, "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf");
    }

    #[test]
    fn derivation_is_deterministic() {
        let k = key("00000000000000000000000000000000000000000000000000000000deadbeef");
        let (btc1, eth1) = derive_pair(&k).unwrap();
        let (btc2, eth2) = derive_pair(&k).unwrap();
        assert_eq!(btc1, btc2);
        assert_eq!(eth1, eth2);
    }

    #[test]
    fn btc_address_shape() {
        let addr = derive_btc(&key(KEY_ONE)).unwrap();
        assert!(addr.starts_with('1'), "P2PKH should start with 1: {}", addr);

        // Base58Check roundtrip: version byte, 20-byte hash, valid checksum
        let decoded = bs58::decode(&addr).into_vec().unwrap();
        assert_eq!(decoded.len(), 25);
        assert_eq!(decoded[0], 0x00);
        assert_eq!(crate::crypto::checksum4(&decoded[..21]), decoded[21..]);
    }

    #[test]
    fn eth_address_shape() {
        let addr = derive_eth(&key(KEY_ONE)).unwrap();
        assert!(addr.starts_with("0x"));
        assert_eq!(addr.len(), 42);
        assert!(addr[2..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn distinct_keys_distinct_addresses() {
        let a = derive_pair(&key(KEY_ONE)).unwrap();
        let b = derive_pair(&key(
            "0000000000000000000000000000000000000000000000000000000000000002",
        ))
        .unwrap();
        assert_ne!(a.0, b.0);
        assert_ne!(a.1, b.1);
    }
}
