use crate::diesel::schema::evindex_checkpoints;
use diesel::{Insertable, Queryable};

/// Last block each (chain, contract address) pair is known to be
/// consistent up to, together with the canonical hash observed for
/// that block when it was written.
#[derive(Debug, Clone, Eq, PartialEq, Queryable)]
pub struct Checkpoint {
    pub id: i32,
    pub chain_id: i64,
    pub address: String,
    pub block_number: i64,
    pub block_hash: String,
    pub updated_at: chrono::NaiveDateTime,
}

impl Checkpoint {
    pub fn get_block_number(&self) -> u64 {
        self.block_number as u64
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = evindex_checkpoints)]
pub struct UnsavedCheckpoint {
    pub chain_id: i64,
    pub address: String,
    pub block_number: i64,
    pub block_hash: String,
    updated_at: chrono::NaiveDateTime,
}

impl UnsavedCheckpoint {
    pub fn new(chain_id: i64, address: &str, block_number: i64, block_hash: &str) -> Self {
        Self {
            chain_id,
            address: address.to_lowercase(),
            block_number,
            block_hash: block_hash.to_lowercase(),
            updated_at: chrono::Utc::now().naive_utc(),
        }
    }
}
