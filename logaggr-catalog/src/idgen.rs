//! Block identity allocation (§4.4: "Identity allocation fetches
//! sequence values in blocks of 50 to amortize round-trips").
//!
//! A Postgres sequence created with `INCREMENT BY 50` hands back the
//! *last* value of the block on each `nextval`; the block's first id is
//! `last - (ID_BLOCK_SIZE - 1)`. [`IdBlockAllocator`] fetches one block
//! per round trip and hands out the ids in it locally until exhausted.

use parking_lot::Mutex;
use sqlx::PgPool;

use crate::error::{CatalogError, QuerySnafu};
use snafu::ResultExt;

pub const ID_BLOCK_SIZE: i64 = 50;

#[derive(Debug, Default)]
struct Block {
    next: i64,
    remaining: i64,
}

/// Hands out monotonic `i64` ids, fetching a fresh block of
/// [`ID_BLOCK_SIZE`] from `entry_id_seq` whenever the current block runs
/// out.
#[derive(Debug)]
pub struct IdBlockAllocator {
    pool: PgPool,
    block: Mutex<Block>,
}

impl IdBlockAllocator {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            block: Mutex::new(Block::default()),
        }
    }

    /// Returns the next id, fetching a new block from the database if
    /// the in-process block is exhausted.
    pub async fn next_id(&self) -> Result<i64, CatalogError> {
        {
            let mut block = self.block.lock();
            if block.remaining > 0 {
                let id = block.next;
                block.next += 1;
                block.remaining -= 1;
                return Ok(id);
            }
        }

        let last: i64 = sqlx::query_scalar("SELECT nextval('log_entry_id_seq')")
            .fetch_one(&self.pool)
            .await
            .context(QuerySnafu)?;
        let first = last - (ID_BLOCK_SIZE - 1);

        let mut block = self.block.lock();
        block.next = first + 1;
        block.remaining = ID_BLOCK_SIZE - 1;
        Ok(first)
    }

    /// Allocates `n` ids, batching block refetches the same way a
    /// single `next_id` call would.
    pub async fn next_ids(&self, n: usize) -> Result<Vec<i64>, CatalogError> {
        let mut ids = Vec::with_capacity(n);
        for _ in 0..n {
            ids.push(self.next_id().await?);
        }
        Ok(ids)
    }
}
