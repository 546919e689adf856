use thiserror::Error;

#[derive(Debug, Error)]
pub enum LmdbError {
    #[error("LMDB error: {0}")]
    Heed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unknown migration: {from} -> {to}")]
    UnknownMigration { from: u32, to: u32 },
}

impl From<heed::Error> for LmdbError {
    fn from(e: heed::Error) -> Self {
        LmdbError::Heed(e.to_string())
    }
}

impl From<LmdbError> for mutual_store::StoreError {
    fn from(e: LmdbError) -> Self {
        mutual_store::StoreError::Backend(e.to_string())
    }
}
