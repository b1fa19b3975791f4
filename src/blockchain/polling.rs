use crate::blockchain::client::{ChainError, ChainSource};
use crate::blockchain::models::RawBlock;
use crate::blockchain::processor::BlockProcessor;
use crate::config::Config;
use crate::db::{OperationStore, StoreError};
use crate::models::SyncState;
use crate::notify::NotificationRouter;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("chain source error: {0}")]
    Chain(#[from] ChainError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("expected block {expected} from chain source, got {got:?}")]
    BlockGap { expected: u64, got: Option<u64> },
}

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub start_block: u64,
    pub batch_size: u64,
    pub poll_interval: Duration,
    pub error_backoff: Duration,
    pub fetch_delay: Duration,
    pub include_virtual_ops: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            start_block: 1,
            batch_size: 100,
            poll_interval: Duration::from_secs(3),
            error_backoff: Duration::from_secs(5),
            fetch_delay: Duration::from_millis(100),
            include_virtual_ops: false,
        }
    }
}

impl EngineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            start_block: config.steem.start_block,
            batch_size: config.steem.batch_size.max(1),
            poll_interval: config.sync.poll_interval(),
            error_backoff: config.sync.error_backoff(),
            fetch_delay: config.sync.fetch_delay(),
            include_virtual_ops: config.sync.include_virtual_ops,
        }
    }
}

/// What a single tick accomplished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing new is irreversible yet.
    UpToDate { next_block: u64 },
    /// Blocks `from..=to` were persisted and the cursor advanced to `to`.
    Synced { from: u64, to: u64, operations: usize },
    /// Shutdown was requested mid-tick after `last_block` was handled.
    Cancelled { last_block: u64 },
}

/// First block to process given the configured start and the stored cursor.
///
/// A stored cursor at or beyond the configured start wins, so progress made
/// by an earlier run (or another writer) is always respected.
pub fn effective_start(configured_start: u64, state: &SyncState) -> u64 {
    if state.last_block > 0 && state.last_block >= configured_start {
        state.last_block + 1
    } else {
        configured_start
    }
}

/// Drives fetch → extract → persist → advance-cursor → notify, one block at a time.
pub struct SyncEngine {
    chain: Arc<dyn ChainSource>,
    store: Arc<dyn OperationStore>,
    processor: BlockProcessor,
    router: NotificationRouter,
    settings: EngineSettings,
}

impl SyncEngine {
    pub fn new(
        chain: Arc<dyn ChainSource>,
        store: Arc<dyn OperationStore>,
        processor: BlockProcessor,
        router: NotificationRouter,
        settings: EngineSettings,
    ) -> Self {
        Self {
            chain,
            store,
            processor,
            router,
            settings,
        }
    }

    /// Poll until `shutdown` is cancelled. Errors abort the current tick and
    /// are followed by a fixed backoff; they never end the loop.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(
            "Starting sync engine: start_block={}, batch_size={}, tracked_accounts={}",
            self.settings.start_block,
            self.settings.batch_size,
            self.processor.tracked_accounts().len()
        );

        let mut ticker = interval(self.settings.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.tick(&shutdown).await {
                        Ok(TickOutcome::Synced { from, to, operations }) => {
                            info!("Synced blocks {} to {} ({} operations)", from, to, operations);
                        }
                        Ok(TickOutcome::UpToDate { next_block }) => {
                            debug!("No new irreversible blocks (next block {})", next_block);
                        }
                        Ok(TickOutcome::Cancelled { last_block }) => {
                            info!("Sync interrupted by shutdown at block {}", last_block);
                            break;
                        }
                        Err(e) => {
                            error!("Error syncing blocks: {}", e);
                            tokio::select! {
                                _ = sleep(self.settings.error_backoff) => {}
                                _ = shutdown.cancelled() => break,
                            }
                        }
                    }
                }
                _ = shutdown.cancelled() => {
                    break;
                }
            }
        }

        info!("Sync engine stopped");
    }

    /// One sync pass from the resume point through the latest irreversible block.
    pub async fn tick(&self, shutdown: &CancellationToken) -> Result<TickOutcome, SyncError> {
        let state = self.store.get_cursor().await?;
        let start = effective_start(self.settings.start_block, &state);

        let latest_irreversible = self.chain.get_latest_irreversible_block_number().await?;
        if start > latest_irreversible {
            return Ok(TickOutcome::UpToDate { next_block: start });
        }

        debug!("Syncing blocks {} to {}", start, latest_irreversible);

        let mut current = start;
        let mut last_done = start.saturating_sub(1);
        let mut total_operations = 0;

        while current <= latest_irreversible {
            let end = (current + self.settings.batch_size - 1).min(latest_irreversible);
            let blocks = self.chain.get_blocks(current, end + 1).await?;

            let mut expected = current;
            for (block_num, block) in &blocks {
                if shutdown.is_cancelled() {
                    return Ok(TickOutcome::Cancelled { last_block: last_done });
                }
                if *block_num != expected {
                    return Err(SyncError::BlockGap {
                        expected,
                        got: Some(*block_num),
                    });
                }

                total_operations += self
                    .process_block(*block_num, block, latest_irreversible)
                    .await?;
                last_done = *block_num;
                expected += 1;
            }
            if expected <= end {
                return Err(SyncError::BlockGap { expected, got: None });
            }

            current = end + 1;

            if shutdown.is_cancelled() {
                return Ok(TickOutcome::Cancelled { last_block: last_done });
            }
            // Bound request rate against the node.
            sleep(self.settings.fetch_delay).await;
        }

        Ok(TickOutcome::Synced {
            from: start,
            to: latest_irreversible,
            operations: total_operations,
        })
    }

    /// Persist one block and advance the cursor to it. Returns the number of
    /// stored operation rows.
    async fn process_block(
        &self,
        block_num: u64,
        block: &RawBlock,
        latest_irreversible: u64,
    ) -> Result<usize, SyncError> {
        // Another writer may already have covered this block.
        let cursor = self.store.get_cursor().await?;
        if cursor.last_block >= block_num {
            debug!("Block {} already synced (cursor at {}), skipping", block_num, cursor.last_block);
            return Ok(0);
        }

        let mut operations = self.processor.extract(block, block_num);

        if self.settings.include_virtual_ops {
            sleep(self.settings.fetch_delay).await;
            let virtual_ops = self.chain.get_ops_in_block(block_num, true).await?;
            operations.extend(self.processor.extract_flat(&virtual_ops));
        }

        self.store.upsert(&operations).await?;
        self.store
            .advance_cursor(block_num, latest_irreversible)
            .await?;

        if !operations.is_empty() {
            info!("Block {}: saved {} operations", block_num, operations.len());
            let summary = self.router.dispatch(&operations).await;
            if summary.matched > 0 {
                debug!(
                    "Block {}: {} notification(s) matched, {} sent",
                    block_num, summary.matched, summary.sent
                );
            }
        }

        Ok(operations.len())
    }
}
