use crate::chains::ChainId;

const DEFAULT_PER_PAGE: i64 = 50;

/// Sort key for event log reads
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum EventLogsOrderBy {
    #[default]
    Id,
    BlockNumber,
    BlockTimestamp,
}

/// Filter, sort and pagination parameters for reading ingested event
/// logs back out of the store. All filters are optional and combine
/// with AND.
///
/// # Example
/// ```
/// use evindex::{ChainId, EventLogsOrderBy, EventLogsQuery};
///
/// EventLogsQuery::new()
///     .with_chain(&ChainId::Mainnet)
///     .with_address("0xBC4CA0EdA7647A8aB7C2061c2E118A18a936f13D")
///     .order_by(EventLogsOrderBy::BlockNumber)
///     .descending()
///     .paginate(0, 100);
/// ```
#[derive(Clone, Debug)]
pub struct EventLogsQuery {
    pub chain_id: Option<i64>,
    pub address: Option<String>,
    pub transaction_hash: Option<String>,
    pub block_hash: Option<String>,
    pub topic0: Option<String>,
    pub topic1: Option<String>,
    pub topic2: Option<String>,
    pub topic3: Option<String>,
    pub from_block_number: Option<i64>,
    pub to_block_number: Option<i64>,
    pub from_block_timestamp: Option<i64>,
    pub to_block_timestamp: Option<i64>,
    pub order_by: EventLogsOrderBy,
    pub is_descending: bool,
    pub page: i64,
    pub per_page: i64,
}

impl Default for EventLogsQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLogsQuery {
    pub fn new() -> Self {
        Self {
            chain_id: None,
            address: None,
            transaction_hash: None,
            block_hash: None,
            topic0: None,
            topic1: None,
            topic2: None,
            topic3: None,
            from_block_number: None,
            to_block_number: None,
            from_block_timestamp: None,
            to_block_timestamp: None,
            order_by: EventLogsOrderBy::default(),
            is_descending: false,
            page: 0,
            per_page: DEFAULT_PER_PAGE,
        }
    }

    pub fn with_chain(mut self, chain_id: &ChainId) -> Self {
        self.chain_id = Some(*chain_id as i64);
        self
    }

    pub fn with_address(mut self, address: &str) -> Self {
        self.address = Some(address.to_lowercase());
        self
    }

    pub fn with_transaction_hash(mut self, transaction_hash: &str) -> Self {
        self.transaction_hash = Some(transaction_hash.to_lowercase());
        self
    }

    pub fn with_block_hash(mut self, block_hash: &str) -> Self {
        self.block_hash = Some(block_hash.to_lowercase());
        self
    }

    pub fn with_topic(mut self, index: usize, topic: &str) -> Self {
        let topic = Some(topic.to_lowercase());

        match index {
            0 => self.topic0 = topic,
            1 => self.topic1 = topic,
            2 => self.topic2 = topic,
            3 => self.topic3 = topic,
            _ => (),
        }

        self
    }

    /// Restricts results to `from..=to` block numbers
    pub fn with_block_range(mut self, from: u64, to: u64) -> Self {
        self.from_block_number = Some(from as i64);
        self.to_block_number = Some(to as i64);
        self
    }

    /// Restricts results to `from..=to` block timestamps, in unix
    /// seconds
    pub fn with_time_range(mut self, from: u64, to: u64) -> Self {
        self.from_block_timestamp = Some(from as i64);
        self.to_block_timestamp = Some(to as i64);
        self
    }

    pub fn order_by(mut self, order_by: EventLogsOrderBy) -> Self {
        self.order_by = order_by;
        self
    }

    pub fn descending(mut self) -> Self {
        self.is_descending = true;
        self
    }

    /// Pages are zero-based
    pub fn paginate(mut self, page: i64, per_page: i64) -> Self {
        self.page = page.max(0);
        self.per_page = per_page.max(1);
        self
    }

    pub(crate) fn get_offset(&self) -> i64 {
        self.page * self.per_page
    }
}
