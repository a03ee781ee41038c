mod event_log;
mod query;

pub use event_log::{DecodedEvent, EventLog};
pub use query::{EventLogsOrderBy, EventLogsQuery};

use std::collections::HashMap;

use ethers::types::{Block, Log, TxHash, U64};
use tracing::debug;

use crate::contracts::ContractAddress;
use crate::decoders::DecoderRegistry;

pub(crate) fn get(
    logs: &[Log],
    contract_address: &ContractAddress,
    registry: &DecoderRegistry,
    blocks_by_number: &HashMap<U64, Block<TxHash>>,
) -> Vec<EventLog> {
    logs.iter()
        .map(|log| {
            let block = blocks_by_number.get(&log.block_number.unwrap()).unwrap();

            let mut event_log =
                EventLog::new(log, contract_address.chain_id, block.timestamp.as_u64() as i64);

            match registry.decode(&event_log) {
                Ok(decoded_event) => event_log.set_decoded_event(&decoded_event),
                Err(decode_error) => debug!(
                    address = %event_log.address,
                    block_number = event_log.get_block_number(),
                    log_index = event_log.get_log_index(),
                    %decode_error,
                    "keeping raw event log, decode failed"
                ),
            }

            event_log
        })
        .collect()
}
