use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use std::sync::Mutex;

use crate::domain::errors::ValidationError;

/// Wire form of the version that exists when a bucket is not (or no longer)
/// creating distinct versions.
pub const NULL_VERSION_ID: &str = "null";

const KEY_LEN: usize = 14;
const CHECKSUM_LEN: usize = 4;
const TOKEN_LEN: usize = 24;

/// Internal, strictly ordered key of a version.
///
/// Field order is significant: the derived `Ord` compares the timestamp first,
/// then the per-node sequence, then the node id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionKey {
    pub timestamp_micros: u64,
    pub sequence: u32,
    pub node_id: u16,
}

impl VersionKey {
    fn to_bytes(self) -> [u8; KEY_LEN] {
        let mut out = [0u8; KEY_LEN];
        out[..8].copy_from_slice(&self.timestamp_micros.to_be_bytes());
        out[8..12].copy_from_slice(&self.sequence.to_be_bytes());
        out[12..].copy_from_slice(&self.node_id.to_be_bytes());
        out
    }

    fn from_bytes(bytes: &[u8; KEY_LEN]) -> Self {
        let mut ts = [0u8; 8];
        let mut seq = [0u8; 4];
        let mut node = [0u8; 2];
        ts.copy_from_slice(&bytes[..8]);
        seq.copy_from_slice(&bytes[8..12]);
        node.copy_from_slice(&bytes[12..]);
        Self {
            timestamp_micros: u64::from_be_bytes(ts),
            sequence: u32::from_be_bytes(seq),
            node_id: u16::from_be_bytes(node),
        }
    }

    /// Encode into the opaque token handed to clients
    pub fn encode(&self) -> String {
        let key = self.to_bytes();
        let digest = md5::compute(key);

        let mut raw = [0u8; KEY_LEN + CHECKSUM_LEN];
        raw[..KEY_LEN].copy_from_slice(&key);
        raw[KEY_LEN..].copy_from_slice(&digest.0[..CHECKSUM_LEN]);
        URL_SAFE_NO_PAD.encode(raw)
    }

    /// Decode a token produced by [`VersionKey::encode`]
    pub fn decode(token: &str) -> Result<Self, ValidationError> {
        if token.len() != TOKEN_LEN {
            return Err(ValidationError::MalformedVersionId(token.to_string()));
        }

        let raw = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| ValidationError::MalformedVersionId(token.to_string()))?;
        if raw.len() != KEY_LEN + CHECKSUM_LEN {
            return Err(ValidationError::MalformedVersionId(token.to_string()));
        }

        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(&raw[..KEY_LEN]);
        let digest = md5::compute(key);
        if digest.0[..CHECKSUM_LEN] != raw[KEY_LEN..] {
            return Err(ValidationError::VersionIdChecksumMismatch(token.to_string()));
        }

        Ok(Self::from_bytes(&key))
    }
}

/// Identifier of an object version as seen on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VersionId {
    /// The `null` version written while versioning is disabled or suspended
    Null,
    /// A version minted while versioning was enabled
    Key(VersionKey),
}

impl VersionId {
    /// Parse a client-supplied token. `"null"` passes through verbatim.
    pub fn parse(token: &str) -> Result<Self, ValidationError> {
        if token.is_empty() {
            return Err(ValidationError::EmptyVersionId);
        }
        if token == NULL_VERSION_ID {
            return Ok(VersionId::Null);
        }
        VersionKey::decode(token).map(VersionId::Key)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, VersionId::Null)
    }

    /// Wire representation, `"null"` or the encoded key
    pub fn encode(&self) -> String {
        match self {
            VersionId::Null => NULL_VERSION_ID.to_string(),
            VersionId::Key(key) => key.encode(),
        }
    }
}

impl std::fmt::Display for VersionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.encode())
    }
}

impl std::str::FromStr for VersionId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Mints strictly increasing [`VersionKey`]s for a single node.
///
/// The sequence absorbs calls landing in the same microsecond and clock steps
/// backwards, so keys never repeat or go down.
#[derive(Debug)]
pub struct VersionKeyGenerator {
    node_id: u16,
    last: Mutex<(u64, u32)>,
}

impl VersionKeyGenerator {
    pub fn new(node_id: u16) -> Self {
        Self {
            node_id,
            last: Mutex::new((0, 0)),
        }
    }

    pub fn node_id(&self) -> u16 {
        self.node_id
    }

    pub fn next_key(&self) -> VersionKey {
        let now = chrono::Utc::now().timestamp_micros().max(0) as u64;

        // A poisoned lock only means another thread panicked mid-update; the
        // pair is still a valid lower bound.
        let mut last = match self.last.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let (timestamp, sequence) = if now > last.0 {
            (now, 0)
        } else if last.1 == u32::MAX {
            (last.0 + 1, 0)
        } else {
            (last.0, last.1 + 1)
        };
        *last = (timestamp, sequence);

        VersionKey {
            timestamp_micros: timestamp,
            sequence,
            node_id: self.node_id,
        }
    }

    pub fn next_version_id(&self) -> VersionId {
        VersionId::Key(self.next_key())
    }
}

impl Default for VersionKeyGenerator {
    fn default() -> Self {
        Self::new(0)
    }
}
