//! Core type definitions: record identity, clusters and database enums

use crate::error::{OrientError, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::atomic::{AtomicI64, Ordering};

/// Record identifier: cluster id plus position inside the cluster.
///
/// Canonical text form is `#<cluster_id>:<cluster_position>`. Ids with a
/// negative cluster id are temporary and carry no server meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId {
    pub cluster_id: i16,
    pub cluster_position: i64,
}

impl RecordId {
    /// Cluster id used for temporary, not yet persisted records
    pub const TEMPORARY_CLUSTER: i16 = -2;

    /// The unset identifier `#-1:-1`
    pub const UNSET: RecordId = RecordId {
        cluster_id: -1,
        cluster_position: -1,
    };

    pub fn new(cluster_id: i16, cluster_position: i64) -> Self {
        RecordId {
            cluster_id,
            cluster_position,
        }
    }

    /// Allocate a fresh temporary id from the process-wide context
    pub fn new_temporary() -> Self {
        OrientContext::global().temp_ids().next_id()
    }

    /// Parse `#?<int16>:<int64>`; the whole input must be consumed.
    pub fn parse(text: &str) -> Result<Self> {
        let (rid, end) = Self::parse_at(text, 0)?;
        if end != text.len() {
            return Err(OrientError::malformed_record_id(
                text,
                format!("unexpected trailing input at offset {}", end),
            ));
        }
        Ok(rid)
    }

    /// Parse a record id starting at `offset`.
    ///
    /// Scanning stops at the first non-digit after the position, so ids
    /// embedded in larger text can be read. Returns the id and the offset
    /// just past it.
    pub fn parse_at(text: &str, offset: usize) -> Result<(Self, usize)> {
        let bytes = text.as_bytes();
        if offset >= bytes.len() {
            return Err(OrientError::malformed_record_id(text, "empty input"));
        }

        let mut pos = offset;
        if bytes[pos] == b'#' {
            pos += 1;
        }

        let cluster_id = scan_number(
            text,
            &mut pos,
            i64::from(i16::MIN),
            i64::from(i16::MAX),
            "cluster id",
        )?;

        if bytes.get(pos) != Some(&b':') {
            return Err(OrientError::malformed_record_id(
                text,
                format!("expected ':' at offset {}", pos),
            ));
        }
        pos += 1;

        let cluster_position = scan_number(text, &mut pos, i64::MIN, i64::MAX, "cluster position")?;

        // Range checked by scan_number
        let rid = RecordId::new(cluster_id as i16, cluster_position);
        Ok((rid, pos))
    }

    /// Canonical `#c:p` text
    pub fn format(&self) -> String {
        self.to_string()
    }

    pub fn is_temporary(&self) -> bool {
        self.cluster_id < -1
    }

    pub fn is_unset(&self) -> bool {
        *self == Self::UNSET
    }

    /// Assigned by the server
    pub fn is_persistent(&self) -> bool {
        self.cluster_id >= 0 && self.cluster_position >= 0
    }
}

/// Hand-rolled signed digit scan. Stops at the first non-digit.
fn scan_number(text: &str, pos: &mut usize, min: i64, max: i64, what: &str) -> Result<i64> {
    let bytes = text.as_bytes();
    let negative = bytes.get(*pos) == Some(&b'-');
    if negative {
        *pos += 1;
    }

    let start = *pos;
    let mut magnitude: u64 = 0;
    while let Some(&b) = bytes.get(*pos) {
        if !b.is_ascii_digit() {
            break;
        }
        magnitude = magnitude
            .checked_mul(10)
            .and_then(|m| m.checked_add(u64::from(b - b'0')))
            .ok_or_else(|| OrientError::malformed_record_id(text, format!("{} out of range", what)))?;
        *pos += 1;
    }

    if *pos == start {
        return Err(OrientError::malformed_record_id(
            text,
            format!("expected digits for {} at offset {}", what, start),
        ));
    }

    let value = if negative {
        -i128::from(magnitude)
    } else {
        i128::from(magnitude)
    };
    if value < i128::from(min) || value > i128::from(max) {
        return Err(OrientError::malformed_record_id(
            text,
            format!("{} out of range", what),
        ));
    }
    Ok(value as i64)
}

impl Default for RecordId {
    fn default() -> Self {
        Self::UNSET
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}:{}", self.cluster_id, self.cluster_position)
    }
}

impl FromStr for RecordId {
    type Err = OrientError;

    fn from_str(s: &str) -> Result<Self> {
        RecordId::parse(s)
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        RecordId::parse(&text).map_err(serde::de::Error::custom)
    }
}

/// Allocator for temporary record ids.
///
/// Positions start at -2 and decrement atomically, so concurrent callers
/// never observe the same id.
#[derive(Debug)]
pub struct TempIdAllocator {
    next_position: AtomicI64,
}

impl TempIdAllocator {
    pub const FIRST_POSITION: i64 = -2;

    pub fn new() -> Self {
        TempIdAllocator {
            next_position: AtomicI64::new(Self::FIRST_POSITION),
        }
    }

    pub fn next_id(&self) -> RecordId {
        let position = self.next_position.fetch_sub(1, Ordering::SeqCst);
        RecordId::new(RecordId::TEMPORARY_CLUSTER, position)
    }
}

impl Default for TempIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL_CONTEXT: Lazy<OrientContext> = Lazy::new(OrientContext::new);

/// Process-wide client state.
///
/// Initialized lazily on first use; holds the temporary id counter.
#[derive(Debug, Default)]
pub struct OrientContext {
    temp_ids: TempIdAllocator,
}

impl OrientContext {
    pub fn new() -> Self {
        OrientContext {
            temp_ids: TempIdAllocator::new(),
        }
    }

    pub fn global() -> &'static OrientContext {
        &GLOBAL_CONTEXT
    }

    pub fn temp_ids(&self) -> &TempIdAllocator {
        &self.temp_ids
    }
}

/// Storage kind of a cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClusterType {
    Physical,
    Memory,
}

/// Named storage partition. Names compare case-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    pub id: i16,
    pub name: String,
    pub cluster_type: ClusterType,
}

impl Cluster {
    pub fn new(id: i16, name: impl Into<String>, cluster_type: ClusterType) -> Self {
        Cluster {
            id,
            name: name.into(),
            cluster_type,
        }
    }

    fn folded_name(&self) -> impl Iterator<Item = char> + '_ {
        self.name.chars().flat_map(char::to_lowercase)
    }
}

impl PartialEq for Cluster {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.cluster_type == other.cluster_type
            && self.folded_name().eq(other.folded_name())
    }
}

impl Eq for Cluster {}

impl Hash for Cluster {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        for c in self.folded_name() {
            c.hash(state);
        }
        self.cluster_type.hash(state);
    }
}

/// Database flavour requested when connecting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DatabaseType {
    Document,
    #[default]
    Graph,
}

/// Server-side storage engine of a database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StorageType {
    #[default]
    PLocal,
    Memory,
}

/// Wire record shape declared by a serializer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordFormat {
    Csv,
    Binary,
    Json,
}
