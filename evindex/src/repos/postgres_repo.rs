mod migrations;

use diesel::pg::Pg;
use diesel::{upsert::excluded, ExpressionMethods, OptionalExtension, QueryDsl};
use diesel_async::{pooled_connection::AsyncDieselConnectionManager, AsyncPgConnection};
use diesel_async::{scoped_futures::ScopedFutureExt, AsyncConnection, RunQueryDsl};
use futures_util::future::BoxFuture;

use crate::checkpoints::{Checkpoint, UnsavedCheckpoint};
use crate::diesel::schema::evindex_event_logs;
use crate::events::{EventLog, EventLogsOrderBy, EventLogsQuery};

use super::repo::{Repo, RepoError};

pub use diesel_async::AsyncConnection as PostgresRepoAsyncConnection;

pub type Conn<'a> = bb8::PooledConnection<'a, AsyncDieselConnectionManager<AsyncPgConnection>>;
pub type Pool = bb8::Pool<AsyncDieselConnectionManager<AsyncPgConnection>>;

impl From<diesel::result::Error> for RepoError {
    fn from(error: diesel::result::Error) -> Self {
        RepoError::Unknown(error.to_string())
    }
}

#[derive(Clone, Debug)]
pub struct PostgresRepo {
    url: String,
}

impl PostgresRepo {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl Repo for PostgresRepo {
    type Pool = Pool;
    type Conn<'a> = Conn<'a>;

    async fn get_pool(&self, max_size: u32) -> Result<Pool, RepoError> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(&self.url);

        bb8::Pool::builder()
            .max_size(max_size)
            .build(manager)
            .await
            .map_err(|_| RepoError::NotConnected)
    }

    async fn get_conn<'a>(pool: &'a Pool) -> Result<Conn<'a>, RepoError> {
        pool.get().await.map_err(|_| RepoError::NotConnected)
    }

    async fn run_in_transaction<'a, F>(conn: &mut Conn<'a>, repo_ops: F) -> Result<(), RepoError>
    where
        F: for<'b> FnOnce(&'b mut Conn<'a>) -> BoxFuture<'b, Result<(), RepoError>>
            + Send
            + Sync
            + 'a,
    {
        conn.transaction::<(), RepoError, _>(|transaction_conn| {
            async move { (repo_ops)(transaction_conn).await }.scope_boxed()
        })
        .await
    }

    async fn execute_raw_query<'a>(conn: &mut Conn<'a>, query: &str) -> Result<(), RepoError> {
        diesel::sql_query(query).execute(conn).await?;

        Ok(())
    }

    async fn get_checkpoint<'a>(
        conn: &mut Conn<'a>,
        chain_id_: i64,
        address_: &str,
    ) -> Result<Option<Checkpoint>, RepoError> {
        use crate::diesel::schema::evindex_checkpoints::dsl::*;

        Ok(evindex_checkpoints
            .filter(chain_id.eq(chain_id_))
            .filter(address.eq(address_))
            .first::<Checkpoint>(conn)
            .await
            .optional()?)
    }

    async fn get_checkpoints<'a>(
        conn: &mut Conn<'a>,
        chain_id_: i64,
    ) -> Result<Vec<Checkpoint>, RepoError> {
        use crate::diesel::schema::evindex_checkpoints::dsl::*;

        Ok(evindex_checkpoints.filter(chain_id.eq(chain_id_)).load(conn).await?)
    }

    async fn get_checkpoint_for_update<'a>(
        conn: &mut Conn<'a>,
        chain_id_: i64,
        address_: &str,
    ) -> Result<Option<Checkpoint>, RepoError> {
        use crate::diesel::schema::evindex_checkpoints::dsl::*;

        Ok(evindex_checkpoints
            .filter(chain_id.eq(chain_id_))
            .filter(address.eq(address_))
            .for_update()
            .first::<Checkpoint>(conn)
            .await
            .optional()?)
    }

    async fn upsert_checkpoint<'a>(
        conn: &mut Conn<'a>,
        checkpoint: &UnsavedCheckpoint,
    ) -> Result<(), RepoError> {
        use crate::diesel::schema::evindex_checkpoints::dsl::*;

        diesel::insert_into(evindex_checkpoints)
            .values(checkpoint)
            .on_conflict((chain_id, address))
            .do_update()
            .set((
                block_number.eq(excluded(block_number)),
                block_hash.eq(excluded(block_hash)),
                updated_at.eq(excluded(updated_at)),
            ))
            .execute(conn)
            .await?;

        Ok(())
    }

    async fn create_event_logs<'a>(
        conn: &mut Conn<'a>,
        event_logs: &[EventLog],
    ) -> Result<(), RepoError> {
        use crate::diesel::schema::evindex_event_logs::dsl::*;

        diesel::insert_into(evindex_event_logs)
            .values(event_logs)
            .on_conflict((chain_id, address, block_number, transaction_hash, log_index))
            .do_update()
            .set((
                block_hash.eq(excluded(block_hash)),
                topic0.eq(excluded(topic0)),
                topic1.eq(excluded(topic1)),
                topic2.eq(excluded(topic2)),
                topic3.eq(excluded(topic3)),
                data.eq(excluded(data)),
                decoded_event.eq(excluded(decoded_event)),
                transaction_index.eq(excluded(transaction_index)),
                block_timestamp.eq(excluded(block_timestamp)),
            ))
            .execute(conn)
            .await?;

        Ok(())
    }

    async fn delete_event_logs_above<'a>(
        conn: &mut Conn<'a>,
        chain_id_: i64,
        address_: &str,
        block_number_: i64,
    ) -> Result<(), RepoError> {
        use crate::diesel::schema::evindex_event_logs::dsl::*;

        diesel::delete(
            evindex_event_logs
                .filter(chain_id.eq(chain_id_))
                .filter(address.eq(address_))
                .filter(block_number.gt(block_number_)),
        )
        .execute(conn)
        .await?;

        Ok(())
    }

    async fn get_event_logs_page_desc<'a>(
        conn: &mut Conn<'a>,
        chain_id_: i64,
        address_: &str,
        max_block_number: i64,
        page: i64,
        per_page: i64,
    ) -> Result<Vec<EventLog>, RepoError> {
        use crate::diesel::schema::evindex_event_logs::dsl::*;

        Ok(evindex_event_logs
            .filter(chain_id.eq(chain_id_))
            .filter(address.eq(address_))
            .filter(block_number.le(max_block_number))
            .order((block_number.desc(), log_index.desc()))
            .limit(per_page)
            .offset(page * per_page)
            .load(conn)
            .await?)
    }

    async fn query_event_logs<'a>(
        conn: &mut Conn<'a>,
        query: &EventLogsQuery,
    ) -> Result<Vec<EventLog>, RepoError> {
        use crate::diesel::schema::evindex_event_logs::dsl::*;

        let filtered = apply_event_logs_filters(evindex_event_logs.into_boxed(), query);

        let ordered = match (query.order_by, query.is_descending) {
            (EventLogsOrderBy::Id, false) => filtered.order(id.asc()),
            (EventLogsOrderBy::Id, true) => filtered.order(id.desc()),
            (EventLogsOrderBy::BlockNumber, false) => {
                filtered.order((block_number.asc(), log_index.asc()))
            }
            (EventLogsOrderBy::BlockNumber, true) => {
                filtered.order((block_number.desc(), log_index.desc()))
            }
            (EventLogsOrderBy::BlockTimestamp, false) => {
                filtered.order((block_timestamp.asc(), log_index.asc()))
            }
            (EventLogsOrderBy::BlockTimestamp, true) => {
                filtered.order((block_timestamp.desc(), log_index.desc()))
            }
        };

        Ok(ordered.limit(query.per_page).offset(query.get_offset()).load(conn).await?)
    }

    async fn count_event_logs<'a>(
        conn: &mut Conn<'a>,
        query: &EventLogsQuery,
    ) -> Result<i64, RepoError> {
        use crate::diesel::schema::evindex_event_logs::dsl::*;

        Ok(
            apply_event_logs_filters(evindex_event_logs.count().into_boxed(), query)
                .get_result(conn)
                .await?,
        )
    }

    async fn get_all_event_logs<'a>(conn: &mut Conn<'a>) -> Result<Vec<EventLog>, RepoError> {
        use crate::diesel::schema::evindex_event_logs::dsl::*;

        Ok(evindex_event_logs.load(conn).await?)
    }
}

fn apply_event_logs_filters<'a, ST>(
    filtered: evindex_event_logs::BoxedQuery<'a, Pg, ST>,
    query: &EventLogsQuery,
) -> evindex_event_logs::BoxedQuery<'a, Pg, ST> {
    use crate::diesel::schema::evindex_event_logs::dsl::*;

    let mut filtered = filtered;

    if let Some(value) = query.chain_id {
        filtered = filtered.filter(chain_id.eq(value));
    }
    if let Some(value) = query.address.clone() {
        filtered = filtered.filter(address.eq(value));
    }
    if let Some(value) = query.transaction_hash.clone() {
        filtered = filtered.filter(transaction_hash.eq(value));
    }
    if let Some(value) = query.block_hash.clone() {
        filtered = filtered.filter(block_hash.eq(value));
    }
    if let Some(value) = query.topic0.clone() {
        filtered = filtered.filter(topic0.eq(value));
    }
    if let Some(value) = query.topic1.clone() {
        filtered = filtered.filter(topic1.eq(value));
    }
    if let Some(value) = query.topic2.clone() {
        filtered = filtered.filter(topic2.eq(value));
    }
    if let Some(value) = query.topic3.clone() {
        filtered = filtered.filter(topic3.eq(value));
    }
    if let Some(value) = query.from_block_number {
        filtered = filtered.filter(block_number.ge(value));
    }
    if let Some(value) = query.to_block_number {
        filtered = filtered.filter(block_number.le(value));
    }
    if let Some(value) = query.from_block_timestamp {
        filtered = filtered.filter(block_timestamp.ge(value));
    }
    if let Some(value) = query.to_block_timestamp {
        filtered = filtered.filter(block_timestamp.le(value));
    }

    filtered
}
