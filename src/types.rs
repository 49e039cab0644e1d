use crate::error::{Result, SweepError};
use crate::crypto::is_valid_private_key;

/// 256-bit private key scalar. Ephemeral: created by a key backend,
/// consumed by derivation, persisted only inside a HitRecord.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrivateKey([u8; 32]);

impl PrivateKey {
    /// Wrap raw bytes, rejecting scalars outside [1, N-1].
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self> {
        if !is_valid_private_key(&bytes) {
            return Err(SweepError::InvalidKey);
        }
        Ok(Self(bytes))
    }

    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let bytes: [u8; 32] = hex::decode(hex_str)
            .ok()
            .and_then(|v| v.try_into().ok())
            .ok_or(SweepError::InvalidKey)?;
        Self::from_bytes(bytes)
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// 64 lowercase hex characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Keys do not belong in debug output; show a truncated fingerprint
        write!(f, "PrivateKey({}..)", &self.to_hex()[..8])
    }
}

/// Which derived address produced the filter hit.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Source {
    Btc,
    Eth,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Btc => "BTC",
            Self::Eth => "ETH",
        }
    }
}

/// One positive match with full key material. Append-only once persisted.
#[derive(Clone, Debug)]
pub struct HitRecord {
    pub timestamp: String,
    pub source: Source,
    pub private_key: PrivateKey,
    pub btc_address: String,
    pub eth_address: String,
}

impl HitRecord {
    pub fn new(source: Source, private_key: PrivateKey, btc_address: String, eth_address: String) -> Self {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        Self { timestamp, source, private_key, btc_address, eth_address }
    }

    /// One self-contained log line, pipe-separated key:value fields.
    pub fn to_log_line(&self) -> String {
        format!(
            "Timestamp: {} | Source: {} | PrivateKey: {} | BTC Address: {} | ETH Address: {}",
            self.timestamp,
            self.source.as_str(),
            self.private_key.to_hex(),
            self.btc_address,
            self.eth_address
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_roundtrip() {
        let hex_key = "0000000000000000000000000000000000000000000000000000000000000001";
        let key = PrivateKey::from_hex(hex_key).unwrap();
        assert_eq!(key.to_hex(), hex_key);
    }

    #[test]
    fn rejects_zero_and_garbage() {
        assert!(PrivateKey::from_hex(&"00".repeat(32)).is_err());
        assert!(PrivateKey::from_hex("not hex").is_err());
        assert!(PrivateKey::from_hex("abcd").is_err());
    }

    #[test]
    fn log_line_has_all_fields() {
        let key = PrivateKey::from_hex(
            "0000000000000000000000000000000000000000000000000000000000000001",
        )
        .unwrap();
        let rec = HitRecord::new(
            Source::Btc,
            key,
            "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa".into(),
            "0x742d35cc6634c0532925a3b844bc454e4438f44e".into(),
        );
        let line = rec.to_log_line();
        assert!(line.contains("Source: BTC"));
        assert!(line.contains(&key.to_hex()));
        assert!(line.contains("BTC Address: 1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa"));
        assert_eq!(line.matches(" | ").count(), 4);
    }

    #[test]
    fn debug_never_prints_full_key() {
        let key = PrivateKey::from_hex(&format!("{:064x}", 0xdeadbeefu64)).unwrap();
        let dbg = format!("{:?}", key);
        assert!(!dbg.contains(&key.to_hex()));
    }
}
