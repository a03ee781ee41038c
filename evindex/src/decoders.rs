pub mod erc20;

use std::collections::HashMap;
use std::sync::Arc;

use derive_more::Display;
use ethers::types::H256;
use ethers::utils::keccak256;

use crate::contracts::Contract;
use crate::events::{DecodedEvent, EventLog};

/// Turns one raw event log into named string parameters.
///
/// Implementations are registered per event signature and dispatched
/// by the log's signature topic. A failing decoder never blocks
/// ingestion; the raw log row is kept undecoded instead.
pub trait EventDecoder: Send + Sync {
    fn event_name(&self) -> &str;
    fn decode(&self, event_log: &EventLog) -> Result<HashMap<String, String>, DecodeError>;
}

#[derive(Debug, Display)]
pub enum DecodeError {
    #[display("log has no signature topic")]
    MissingSignatureTopic,
    #[display("no decoder registered for signature topic")]
    UnknownSignature,
    #[display("missing indexed topic {_0}")]
    MissingTopic(usize),
    #[display("malformed indexed topic {_0}")]
    MalformedTopic(usize),
    #[display("malformed data field")]
    MalformedData,
}

/// Decoders keyed by the keccak256 hash of their event signature,
/// i.e. by the `topic0` value their logs carry on chain
pub struct DecoderRegistry {
    decoders: HashMap<H256, Arc<dyn EventDecoder>>,
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DecoderRegistry {
    pub fn new() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }

    pub fn register(&mut self, event_signature: &str, decoder: Arc<dyn EventDecoder>) {
        self.decoders.insert(H256::from(keccak256(event_signature)), decoder);
    }

    /// Signature topics with a registered decoder
    pub fn get_signature_topics(&self) -> Vec<H256> {
        self.decoders.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }

    pub fn decode(&self, event_log: &EventLog) -> Result<DecodedEvent, DecodeError> {
        let signature_topic = event_log
            .get_topic(0)
            .and_then(|topic0| topic0.parse::<H256>().ok())
            .ok_or(DecodeError::MissingSignatureTopic)?;

        let decoder =
            self.decoders.get(&signature_topic).ok_or(DecodeError::UnknownSignature)?;
        let event_data = decoder.decode(event_log)?;

        Ok(DecodedEvent::new(decoder.event_name(), event_data))
    }
}

pub fn get_registry(contracts: &[Contract]) -> DecoderRegistry {
    let mut registry = DecoderRegistry::new();

    for contract in contracts {
        for (event_signature, decoder) in &contract.decoders {
            registry.register(event_signature, decoder.clone());
        }
    }

    registry
}

/// Reads indexed topic `index` back as the 32-byte word it was
/// emitted as. Useful for hand-written decoders.
pub fn get_indexed_topic(event_log: &EventLog, index: usize) -> Result<H256, DecodeError> {
    let topic = event_log.get_topic(index).ok_or(DecodeError::MissingTopic(index))?;

    topic.parse::<H256>().map_err(|_| DecodeError::MalformedTopic(index))
}
