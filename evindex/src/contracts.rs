use std::collections::HashMap;
use std::fmt::Formatter;
use std::sync::Arc;

use ethers::types::H256;
use ethers::utils::keccak256;

use crate::chains::ChainId;
use crate::decoders::EventDecoder;

/// Human-readable event signature, e.g.
/// `Transfer(address,address,uint256)`
pub type EventSignature = &'static str;

/// Hash of an event signature as it appears in `topic0` on chain
pub type ContractEventTopic = H256;

/// A deployment of a contract on some chain, tracked from
/// `start_block_number` upwards
#[derive(Debug, Clone, PartialEq)]
pub struct ContractAddress {
    pub contract_name: String,
    pub address: String,
    pub chain_id: i64,
    pub start_block_number: i64,
}

impl ContractAddress {
    fn new(
        contract_name: &str,
        address: &str,
        chain_id: &ChainId,
        start_block_number: u64,
    ) -> Self {
        Self {
            contract_name: contract_name.to_string(),
            address: address.to_lowercase(),
            chain_id: *chain_id as i64,
            start_block_number: start_block_number as i64,
        }
    }
}

/// A contract whose event logs get indexed
///
///
/// # Example
/// ```
/// use evindex::{
///     decoders::erc20::{TransferDecoder, TRANSFER_EVENT_SIGNATURE},
///     ChainId, Contract,
/// };
///
/// Contract::new("UsdCoin")
///     .add_event(TRANSFER_EVENT_SIGNATURE, TransferDecoder)
///     .add_address(
///         "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48",
///         &ChainId::Mainnet,
///         6_082_465,
///     );
/// ```
#[derive(Clone)]
pub struct Contract {
    pub addresses: Vec<ContractAddress>,
    pub name: String,
    pub decoders: HashMap<EventSignature, Arc<dyn EventDecoder>>,
}

impl Contract {
    pub fn new(name: &str) -> Self {
        Self {
            addresses: vec![],
            name: name.to_string(),
            decoders: HashMap::new(),
        }
    }

    /// Adds a deployment of the contract. A contract may be deployed
    /// on several chains or under several addresses on one chain.
    pub fn add_address(
        mut self,
        address: &str,
        chain_id: &ChainId,
        start_block_number: u64,
    ) -> Self {
        self.addresses.push(ContractAddress::new(
            &self.name,
            address,
            chain_id,
            start_block_number,
        ));

        self
    }

    /// Registers a decoder for one of the contract's events. Logs
    /// whose signature topic has no registered decoder are still
    /// ingested, just left undecoded.
    pub fn add_event(
        mut self,
        event_signature: EventSignature,
        decoder: impl EventDecoder + 'static,
    ) -> Self {
        self.decoders.insert(event_signature, Arc::new(decoder));

        self
    }

    pub fn get_event_signatures(&self) -> Vec<EventSignature> {
        self.decoders.keys().cloned().collect()
    }

    /// Signature topics scanners filter on. Empty when the contract
    /// registered no decoders, in which case every log under the
    /// contract's addresses is ingested.
    pub fn get_event_topics(&self) -> Vec<ContractEventTopic> {
        self.decoders
            .keys()
            .map(|event_signature| H256::from(keccak256(event_signature)))
            .collect()
    }
}

impl std::fmt::Debug for Contract {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Contract")
            .field("name", &self.name)
            .field("addresses", &self.addresses)
            .field("events", &self.decoders.keys().collect::<Vec<_>>())
            .finish()
    }
}

pub(crate) fn group_addresses_by_chain_id(
    contracts: &[Contract],
) -> HashMap<i64, Vec<ContractAddress>> {
    contracts.iter().flat_map(|contract| contract.addresses.iter()).fold(
        HashMap::new(),
        |mut addresses_by_chain_id, contract_address| {
            addresses_by_chain_id
                .entry(contract_address.chain_id)
                .or_insert_with(Vec::new)
                .push(contract_address.clone());

            addresses_by_chain_id
        },
    )
}

pub(crate) fn group_start_blocks_by_address(
    contracts: &[Contract],
) -> HashMap<(i64, String), i64> {
    contracts
        .iter()
        .flat_map(|contract| contract.addresses.iter())
        .map(|contract_address| {
            (
                (contract_address.chain_id, contract_address.address.clone()),
                contract_address.start_block_number,
            )
        })
        .collect()
}
