//! # Word and Hex Encoding
//!
//! State bytes and on-chain records are sequences of 32-byte big-endian words.
//! Hex strings are `0x`-prefixed, lowercase.

use crate::entities::{Address, U256};
use crate::errors::DecodeError;

/// Size of one ABI word.
pub const WORD_SIZE: usize = 32;

/// A 32-byte word.
pub type Word = [u8; WORD_SIZE];

/// Left-pad `bytes` into a 32-byte word.
///
/// Inputs longer than 32 bytes keep their trailing 32 bytes.
pub fn left_pad_word(bytes: &[u8]) -> Word {
    let mut word = [0u8; WORD_SIZE];
    let take = bytes.len().min(WORD_SIZE);
    word[WORD_SIZE - take..].copy_from_slice(&bytes[bytes.len() - take..]);
    word
}

/// Encode a `u64` as a 32-byte word.
pub fn u64_word(value: u64) -> Word {
    left_pad_word(&value.to_be_bytes())
}

/// Encode a `U256` as a 32-byte word.
pub fn u256_word(value: U256) -> Word {
    let mut word = [0u8; WORD_SIZE];
    value.to_big_endian(&mut word);
    word
}

/// Encode an address as a 32-byte word.
pub fn address_word(address: &Address) -> Word {
    left_pad_word(address)
}

/// Read the address held in the low 20 bytes of a word.
pub fn word_address(word: &Word) -> Address {
    let mut address = [0u8; 20];
    address.copy_from_slice(&word[12..]);
    address
}

/// Read a word as a `u64`, failing if the high bytes are set.
pub fn word_u64(word: &Word) -> Result<u64, DecodeError> {
    if word[..24].iter().any(|b| *b != 0) {
        return Err(DecodeError::OutOfRange("word exceeds u64".to_string()));
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&word[24..]);
    Ok(u64::from_be_bytes(bytes))
}

/// Concatenate words into a byte vector.
pub fn encode_words(words: &[Word]) -> Vec<u8> {
    words.iter().flat_map(|w| w.iter().copied()).collect()
}

/// Split a byte string into 32-byte words.
pub fn decode_words(bytes: &[u8]) -> Result<Vec<Word>, DecodeError> {
    if bytes.len() % WORD_SIZE != 0 {
        return Err(DecodeError::InvalidLength {
            expected: (bytes.len() / WORD_SIZE + 1) * WORD_SIZE,
            actual: bytes.len(),
        });
    }
    Ok(bytes
        .chunks(WORD_SIZE)
        .map(|chunk| {
            let mut word = [0u8; WORD_SIZE];
            word.copy_from_slice(chunk);
            word
        })
        .collect())
}

/// `0x`-prefixed lowercase hex.
pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Parse hex with or without the `0x` prefix.
pub fn from_hex(s: &str) -> Result<Vec<u8>, DecodeError> {
    let stripped = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(stripped).map_err(|e| DecodeError::InvalidHex(e.to_string()))
}

/// Parse hex into a fixed-size array.
pub fn from_hex_array<const N: usize>(s: &str) -> Result<[u8; N], DecodeError> {
    let bytes = from_hex(s)?;
    if bytes.len() != N {
        return Err(DecodeError::InvalidLength {
            expected: N,
            actual: bytes.len(),
        });
    }
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes);
    Ok(out)
}

/// Serde adapter: fixed-size byte arrays as `0x` hex strings.
///
/// ```rust,ignore
/// #[serde(with = "shared_types::hex_array")]
/// root: Hash,
/// ```
pub mod hex_array {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    /// Serialize as hex.
    pub fn serialize<S: Serializer, const N: usize>(
        value: &[u8; N],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::to_hex(value))
    }

    /// Deserialize from hex.
    pub fn deserialize<'de, D: Deserializer<'de>, const N: usize>(
        deserializer: D,
    ) -> Result<[u8; N], D::Error> {
        let s = String::deserialize(deserializer)?;
        super::from_hex_array::<N>(&s).map_err(D::Error::custom)
    }
}

/// Serde adapter: variable-length bytes as `0x` hex strings.
pub mod hex_bytes {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    /// Serialize as hex.
    pub fn serialize<S: Serializer>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::to_hex(value))
    }

    /// Deserialize from hex.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::from_hex(&s).map_err(D::Error::custom)
    }
}
