//! Decoders for the standard ERC-20 events. Address parameters keep
//! their padded 32-byte form and amounts are rendered in decimal, so
//! decoded rows stay plain strings all the way to the store.

use std::collections::HashMap;

use ethers::types::U256;

use super::{get_indexed_topic, DecodeError, EventDecoder};
use crate::events::EventLog;
use crate::hashes::Hashes;

pub const TRANSFER_EVENT_SIGNATURE: &str = "Transfer(address,address,uint256)";
pub const APPROVAL_EVENT_SIGNATURE: &str = "Approval(address,address,uint256)";

/// `Transfer(address indexed from, address indexed to, uint256 value)`
pub struct TransferDecoder;

impl EventDecoder for TransferDecoder {
    fn event_name(&self) -> &str {
        "Transfer"
    }

    fn decode(&self, event_log: &EventLog) -> Result<HashMap<String, String>, DecodeError> {
        let from = get_indexed_topic(event_log, 1)?;
        let to = get_indexed_topic(event_log, 2)?;
        let value = get_amount(event_log)?;

        Ok(HashMap::from([
            ("from".to_string(), Hashes::h256_to_string(&from)),
            ("to".to_string(), Hashes::h256_to_string(&to)),
            ("value".to_string(), value.to_string()),
        ]))
    }
}

/// `Approval(address indexed owner, address indexed spender, uint256 value)`
pub struct ApprovalDecoder;

impl EventDecoder for ApprovalDecoder {
    fn event_name(&self) -> &str {
        "Approval"
    }

    fn decode(&self, event_log: &EventLog) -> Result<HashMap<String, String>, DecodeError> {
        let owner = get_indexed_topic(event_log, 1)?;
        let spender = get_indexed_topic(event_log, 2)?;
        let value = get_amount(event_log)?;

        Ok(HashMap::from([
            ("owner".to_string(), Hashes::h256_to_string(&owner)),
            ("spender".to_string(), Hashes::h256_to_string(&spender)),
            ("value".to_string(), value.to_string()),
        ]))
    }
}

fn get_amount(event_log: &EventLog) -> Result<U256, DecodeError> {
    let data = event_log.get_data();

    if data.len() > 32 {
        return Err(DecodeError::MalformedData);
    }

    Ok(U256::from_big_endian(&data))
}
