use std::str::FromStr;

use ethers::types::{Bytes, Log, H160, H256};
use evindex::EventLog;

use rand::seq::SliceRandom;

/// Deterministic per-block hash the stub providers hand out, so tests
/// can predict the canonical hash of any block number
pub fn stub_block_hash(block_number: u64) -> H256 {
    H256::from_low_u64_be(block_number)
}

/// The same hash in the lowercase hex form rows and checkpoints store
pub fn stub_block_hash_string(block_number: u64) -> String {
    format!("{:?}", stub_block_hash(block_number))
}

pub fn transfer_log(contract_address: &str) -> Log {
    let log_index = *(1..800).collect::<Vec<_>>().choose(&mut rand::thread_rng()).unwrap();

    Log {
        address: H160::from_str(contract_address).unwrap(),
        topics: vec![
            h256("0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"),
            h256("0x000000000000000000000000b518b3136e491101f22b77f385fe22269c515188"),
            h256("0x0000000000000000000000007dfd6013cf8d92b751e63d481b51fe0e4c5abf5e"),
        ],
        data: Bytes::from(H256::from_low_u64_be(1661).as_bytes().to_vec()),
        block_hash: Some(stub_block_hash(18_115_958)),
        block_number: Some(18_115_958.into()),
        transaction_hash: Some(h256(
            "0x83d751998ff98cd609bc9b18bb36bdef8659cde2f74d6d7a1b0fef2c2bf8f839",
        )),
        transaction_index: Some(89.into()),
        log_index: Some(log_index.into()),
        removed: Some(false),
        ..Default::default()
    }
}

/// A transfer pinned to a specific block, with a deterministic
/// identity so repeated calls build the same row
pub fn transfer_log_at(contract_address: &str, block_number: u64, block_hash: H256) -> Log {
    Log {
        address: H160::from_str(contract_address).unwrap(),
        topics: vec![
            h256("0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"),
            h256("0x000000000000000000000000b518b3136e491101f22b77f385fe22269c515188"),
            h256("0x0000000000000000000000007dfd6013cf8d92b751e63d481b51fe0e4c5abf5e"),
        ],
        data: Bytes::from(H256::from_low_u64_be(1661).as_bytes().to_vec()),
        block_hash: Some(block_hash),
        block_number: Some(block_number.into()),
        transaction_hash: Some(H256::from_low_u64_be(block_number)),
        transaction_index: Some(0.into()),
        log_index: Some(0.into()),
        removed: Some(false),
        ..Default::default()
    }
}

pub fn event_log_at(
    contract_address: &str,
    chain_id: i64,
    block_number: u64,
    block_hash: H256,
) -> EventLog {
    EventLog::new(
        &transfer_log_at(contract_address, block_number, block_hash),
        chain_id,
        (block_number * 12) as i64,
    )
}

fn h256(str: &str) -> H256 {
    H256::from_str(str).unwrap()
}
