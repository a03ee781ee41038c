use ethers::providers::{Middleware, Provider as EthersProvider, Ws};
use ethers::types::{Address, Block, Filter as EthersFilter, Log, TxHash};
use futures_util::stream::BoxStream;
use futures_util::StreamExt;

use super::ProviderError;

/// What a chain pushes over the WebSocket: the canonical chain grew a
/// header, or a log under one of the watched addresses changed status.
#[derive(Clone, Debug)]
pub enum Notification {
    NewHeader(Block<TxHash>),
    Log(Log),
}

/// Subscription surface of a chain. One merged stream keeps the
/// consumer loop single-threaded per chain.
#[async_trait::async_trait]
pub trait WsProvider: Sync + Send {
    async fn subscribe<'a>(
        &'a self,
        addresses: Vec<Address>,
    ) -> Result<BoxStream<'a, Notification>, ProviderError>;
}

#[async_trait::async_trait]
impl WsProvider for EthersProvider<Ws> {
    async fn subscribe<'a>(
        &'a self,
        addresses: Vec<Address>,
    ) -> Result<BoxStream<'a, Notification>, ProviderError> {
        let headers = self.subscribe_blocks().await?;
        let logs = self.subscribe_logs(&EthersFilter::new().address(addresses)).await?;

        Ok(futures_util::stream::select(
            headers.map(Notification::NewHeader),
            logs.map(Notification::Log),
        )
        .boxed())
    }
}

pub async fn get(ws_url: &str) -> Result<impl WsProvider, ProviderError> {
    EthersProvider::<Ws>::connect(ws_url).await
}
