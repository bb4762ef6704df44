//! # Segment
//!
//! A half-open range `[start, end)` inside one token's value space.
//!
//! Global coordinates lay tokens side by side:
//! `global = local + token_id * TOTAL_AMOUNT`.

use super::errors::SegmentStateError;
use primitive_types::U256;
use rlp::{Rlp, RlpStream};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use shared_types::{segment_base, DecodeError, MAX_TOKENS, TOTAL_AMOUNT};
use std::fmt;

/// One owned range of value.
///
/// Serialized for storage as three decimal strings `[tokenId, start, end]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "SegmentRepr", try_from = "SegmentRepr")]
pub struct Segment {
    token_id: u64,
    start: u64,
    end: u64,
}

#[serde_as]
#[derive(Serialize, Deserialize)]
struct SegmentRepr(
    #[serde_as(as = "DisplayFromStr")] u64,
    #[serde_as(as = "DisplayFromStr")] u64,
    #[serde_as(as = "DisplayFromStr")] u64,
);

impl From<Segment> for SegmentRepr {
    fn from(s: Segment) -> Self {
        SegmentRepr(s.token_id, s.start, s.end)
    }
}

impl TryFrom<SegmentRepr> for Segment {
    type Error = SegmentStateError;

    fn try_from(r: SegmentRepr) -> Result<Self, Self::Error> {
        Segment::new(r.0, r.1, r.2)
    }
}

impl Segment {
    /// Create a segment, validating `start < end <= TOTAL_AMOUNT` and the token id.
    pub fn new(token_id: u64, start: u64, end: u64) -> Result<Self, SegmentStateError> {
        if end <= start {
            return Err(SegmentStateError::EmptySegment { start, end });
        }
        if end > TOTAL_AMOUNT {
            return Err(SegmentStateError::SegmentOutOfRange { end });
        }
        if token_id >= MAX_TOKENS {
            return Err(SegmentStateError::TokenOutOfRange(token_id));
        }
        Ok(Self {
            token_id,
            start,
            end,
        })
    }

    /// Segment of the native token (id 0).
    pub fn eth(start: u64, end: u64) -> Result<Self, SegmentStateError> {
        Self::new(0, start, end)
    }

    /// Build from global coordinates. The token is taken from `start`.
    pub fn from_global(start: u64, end: u64) -> Result<Self, SegmentStateError> {
        let token_id = start / TOTAL_AMOUNT;
        let offset = token_id * TOTAL_AMOUNT;
        if end < offset {
            return Err(SegmentStateError::EmptySegment { start, end });
        }
        Self::new(token_id, start - offset, end - offset)
    }

    /// Token id.
    pub fn token_id(&self) -> u64 {
        self.token_id
    }

    /// Local start (inclusive).
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Local end (exclusive).
    pub fn end(&self) -> u64 {
        self.end
    }

    /// `end - start`.
    pub fn amount(&self) -> u64 {
        self.end - self.start
    }

    /// Start in global coordinates.
    pub fn global_start(&self) -> u64 {
        self.start + self.token_id * TOTAL_AMOUNT
    }

    /// End in global coordinates.
    pub fn global_end(&self) -> u64 {
        self.end + self.token_id * TOTAL_AMOUNT
    }

    /// `self ⊇ other`.
    pub fn contains(&self, other: &Segment) -> bool {
        self.token_id == other.token_id && self.start <= other.start && self.end >= other.end
    }

    /// `self ∩ other ≠ ∅`.
    pub fn hits(&self, other: &Segment) -> bool {
        self.token_id == other.token_id && self.start < other.end && self.end > other.start
    }

    /// Overlapping part of two segments, if any.
    pub fn intersection(&self, other: &Segment) -> Option<Segment> {
        if !self.hits(other) {
            return None;
        }
        Some(Segment {
            token_id: self.token_id,
            start: self.start.max(other.start),
            end: self.end.min(other.end),
        })
    }

    /// Merge with a segment sharing exactly one boundary.
    pub fn add(&self, other: &Segment) -> Result<Segment, SegmentStateError> {
        if self.token_id != other.token_id {
            return Err(SegmentStateError::NotNeighbor);
        }
        if self.end == other.start {
            Ok(Segment {
                token_id: self.token_id,
                start: self.start,
                end: other.end,
            })
        } else if self.start == other.end {
            Ok(Segment {
                token_id: self.token_id,
                start: other.start,
                end: self.end,
            })
        } else {
            Err(SegmentStateError::NotNeighbor)
        }
    }

    /// `self \ other`: up to two non-empty remainder pieces, left piece first.
    pub fn sub(&self, other: &Segment) -> Vec<Segment> {
        if !self.hits(other) {
            return vec![*self];
        }
        let mut pieces = Vec::with_capacity(2);
        if other.start > self.start {
            pieces.push(Segment {
                token_id: self.token_id,
                start: self.start,
                end: other.start,
            });
        }
        if other.end < self.end {
            pieces.push(Segment {
                token_id: self.token_id,
                start: other.end,
                end: self.end,
            });
        }
        pieces
    }

    /// Packed form `token_id * 2^128 + start * 2^64 + end`.
    pub fn to_big_number(&self) -> U256 {
        let base = segment_base();
        U256::from(self.token_id) * base * base + U256::from(self.start) * base + U256::from(self.end)
    }

    /// Inverse of [`Segment::to_big_number`].
    pub fn from_big_number(bn: U256) -> Result<Self, SegmentStateError> {
        let mask = U256::from(u64::MAX);
        let token = bn >> 128;
        if token > mask {
            return Err(DecodeError::OutOfRange("segment token id".to_string()).into());
        }
        let start = (bn >> 64) & mask;
        let end = bn & mask;
        Self::new(token.low_u64(), start.low_u64(), end.low_u64())
    }

    /// RLP list `[tokenId, start, end]`.
    pub fn encode(&self) -> Vec<u8> {
        let mut stream = RlpStream::new_list(3);
        stream.append(&self.token_id);
        stream.append(&self.start);
        stream.append(&self.end);
        stream.out().to_vec()
    }

    /// Decode the RLP list produced by [`Segment::encode`].
    pub fn decode(bytes: &[u8]) -> Result<Self, SegmentStateError> {
        let rlp = Rlp::new(bytes);
        let count = rlp.item_count()?;
        if count != 3 {
            return Err(DecodeError::InvalidLength {
                expected: 3,
                actual: count,
            }
            .into());
        }
        Self::new(rlp.val_at(0)?, rlp.val_at(1)?, rlp.val_at(2)?)
    }

    /// Storage form: three decimal strings.
    pub fn to_strings(&self) -> [String; 3] {
        [
            self.token_id.to_string(),
            self.start.to_string(),
            self.end.to_string(),
        ]
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:[{}, {})", self.token_id, self.start, self.end)
    }
}
