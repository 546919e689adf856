//! Well-known keys of the [`Table::Meta`](crate::Table::Meta) keyspace.

/// The schema version that the current code writes.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetaKey {
    SchemaVersion,
    /// Latest timestamp the staking ledger has seen.
    LastActivity,
    /// Whether the pool was paused when saved.
    Paused,
    /// Pool parameters the state was written with.
    Params,
}

impl MetaKey {
    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            MetaKey::SchemaVersion => b"schema_version",
            MetaKey::LastActivity => b"last_activity",
            MetaKey::Paused => b"paused",
            MetaKey::Params => b"params",
        }
    }
}
