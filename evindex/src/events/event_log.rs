use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use crate::diesel::schema::evindex_event_logs;
use crate::hashes::Hashes;
use diesel::{Insertable, Queryable};
use ethers::types::{Bytes, Log};
use uuid::Uuid;

use serde::{Deserialize, Serialize};

/// One ingested contract event log. Raw fields always survive
/// ingestion; `decoded_event` is only present when a decoder was
/// registered for the log's signature topic.
#[derive(Debug, Deserialize, Clone, Eq, Queryable, Insertable)]
#[diesel(table_name = evindex_event_logs)]
pub struct EventLog {
    pub id: Uuid,
    pub chain_id: i64,
    pub address: String,
    pub block_hash: String,
    pub(crate) block_number: i64,
    topic0: Option<String>,
    topic1: Option<String>,
    topic2: Option<String>,
    topic3: Option<String>,
    data: Vec<u8>,
    decoded_event: Option<serde_json::Value>,
    pub transaction_hash: String,
    pub(crate) transaction_index: i32,
    pub(crate) log_index: i32,
    block_timestamp: i64,
    inserted_at: chrono::NaiveDateTime,
}

impl PartialEq for EventLog {
    fn eq(&self, other: &Self) -> bool {
        self.chain_id == other.chain_id
            && self.address == other.address
            && self.block_number == other.block_number
            && self.transaction_hash == other.transaction_hash
            && self.log_index == other.log_index
    }
}

impl Hash for EventLog {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.chain_id.hash(state);
        self.address.hash(state);
        self.block_number.hash(state);
        self.transaction_hash.hash(state);
        self.log_index.hash(state);
    }
}

impl EventLog {
    pub fn new(log: &Log, chain_id: i64, block_timestamp: i64) -> Self {
        let topic =
            |index: usize| log.topics.get(index).map(|topic| Hashes::h256_to_string(topic));

        Self {
            id: uuid::Uuid::new_v4(),
            chain_id,
            address: Hashes::h160_to_string(&log.address).to_lowercase(),
            block_hash: Hashes::h256_to_string(&log.block_hash.unwrap()).to_lowercase(),
            block_number: log.block_number.unwrap().as_u64() as i64,
            topic0: topic(0),
            topic1: topic(1),
            topic2: topic(2),
            topic3: topic(3),
            data: log.data.to_vec(),
            decoded_event: None,
            transaction_hash: Hashes::h256_to_string(&log.transaction_hash.unwrap()).to_lowercase(),
            transaction_index: log.transaction_index.unwrap().as_u32() as i32,
            log_index: log.log_index.unwrap().as_u32() as i32,
            block_timestamp,
            inserted_at: chrono::Utc::now().naive_utc(),
        }
    }

    pub fn set_decoded_event(&mut self, decoded_event: &DecodedEvent) {
        self.decoded_event = Some(serde_json::to_value(decoded_event).unwrap());
    }

    pub fn get_block_number(&self) -> u64 {
        self.block_number as u64
    }
    pub fn get_block_timestamp(&self) -> u64 {
        self.block_timestamp as u64
    }
    pub fn get_transaction_index(&self) -> u32 {
        self.transaction_index as u32
    }
    pub fn get_log_index(&self) -> u32 {
        self.log_index as u32
    }

    /// Indexed topics as stored, `0` being the signature topic
    pub fn get_topic(&self, index: usize) -> Option<&str> {
        match index {
            0 => self.topic0.as_deref(),
            1 => self.topic1.as_deref(),
            2 => self.topic2.as_deref(),
            3 => self.topic3.as_deref(),
            _ => None,
        }
    }

    pub fn get_data(&self) -> Bytes {
        Bytes::from(self.data.clone())
    }

    pub fn get_decoded_event(&self) -> Option<DecodedEvent> {
        self.decoded_event
            .as_ref()
            .and_then(|decoded_event| serde_json::from_value(decoded_event.clone()).ok())
    }
}

/// Decoder output persisted alongside the raw log fields
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct DecodedEvent {
    pub event_name: String,
    pub event_data: HashMap<String, String>,
}

impl DecodedEvent {
    pub fn new(event_name: &str, event_data: HashMap<String, String>) -> Self {
        Self {
            event_name: event_name.to_string(),
            event_data,
        }
    }

    pub fn get_param(&self, name: &str) -> Option<&str> {
        self.event_data.get(name).map(String::as_str)
    }
}
