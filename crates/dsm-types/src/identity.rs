use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Largest ordinal a peer may carry. `1 << 62` is the highest bit that still
/// yields a positive `i64` slot value.
pub const MAX_PEER_ID: u32 = 62;

/// Ordinal identity of a cluster participant.
///
/// The ordinal decides the participant's bit in the lock-pattern bitmask, so
/// it must be unique across the cluster and stay fixed for the process
/// lifetime.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct PeerId(u32);

impl PeerId {
    /// Create a peer id, rejecting ordinals that do not fit a lock pattern.
    pub fn new(id: u32) -> Result<Self, TypeError> {
        if id > MAX_PEER_ID {
            return Err(TypeError::PeerIdOutOfRange(id));
        }
        Ok(Self(id))
    }

    /// The raw ordinal.
    pub fn get(self) -> u32 {
        self.0
    }

    /// The value this peer writes into a lock slot it holds.
    pub fn pattern(self) -> LockPattern {
        LockPattern(1i64 << self.0)
    }
}

impl TryFrom<u32> for PeerId {
    type Error = TypeError;

    fn try_from(id: u32) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}

impl From<PeerId> for u32 {
    fn from(id: PeerId) -> Self {
        id.0
    }
}

impl fmt::Debug for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeerId({})", self.0)
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer#{}", self.0)
    }
}

/// A lock slot value identifying its holder: exactly one bit set.
///
/// `0` is never a pattern; it is the FREE slot value, see [`LockPattern::FREE`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LockPattern(i64);

impl LockPattern {
    /// Slot value of a free lock.
    pub const FREE: i64 = 0;

    /// Interpret a raw slot value as a holder pattern.
    pub fn from_slot(value: i64) -> Result<Self, TypeError> {
        if value <= 0 || value.count_ones() != 1 {
            return Err(TypeError::InvalidPattern(value));
        }
        Ok(Self(value))
    }

    /// The raw slot value.
    pub fn value(self) -> i64 {
        self.0
    }

    /// The ordinal whose bit this pattern carries.
    pub fn holder(self) -> PeerId {
        PeerId(self.0.trailing_zeros())
    }
}

/// One member of the cluster, as listed in the config file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    pub address: String,
    pub port: u16,
    pub id: PeerId,
}

impl Peer {
    pub fn new(address: impl Into<String>, port: u16, id: PeerId) -> Self {
        Self { address: address.into(), port, id }
    }

    /// `host:port` form used for binding and logging.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    /// Base URL of the peer's request listener.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.authority())
    }
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.authority())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_is_single_bit() {
        for raw in [0u32, 1, 5, MAX_PEER_ID] {
            let id = PeerId::new(raw).unwrap();
            let pattern = id.pattern();
            assert_eq!(pattern.value(), 1i64 << raw);
            assert!(pattern.value() > 0);
            assert_eq!(pattern.holder(), id);
        }
    }

    #[test]
    fn id_out_of_range_rejected() {
        assert_eq!(PeerId::new(63), Err(TypeError::PeerIdOutOfRange(63)));
    }

    #[test]
    fn from_slot_rejects_free_and_multi_bit() {
        assert!(LockPattern::from_slot(LockPattern::FREE).is_err());
        assert!(LockPattern::from_slot(0b110).is_err());
        assert!(LockPattern::from_slot(-4).is_err());
        assert_eq!(LockPattern::from_slot(8).unwrap().holder().get(), 3);
    }

    #[test]
    fn peer_urls() {
        let peer = Peer::new("10.0.0.7", 9090, PeerId::new(2).unwrap());
        assert_eq!(peer.authority(), "10.0.0.7:9090");
        assert_eq!(peer.base_url(), "http://10.0.0.7:9090");
        assert_eq!(peer.to_string(), "peer#2@10.0.0.7:9090");
    }

    #[test]
    fn peer_id_serde_validates() {
        let ok: PeerId = serde_json::from_str("4").unwrap();
        assert_eq!(ok.get(), 4);
        assert!(serde_json::from_str::<PeerId>("99").is_err());
    }
}
