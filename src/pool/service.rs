//! Pool Service - Thread Management
//!
//! Spawns a dedicated OS thread that owns the transaction pool. Uses
//! lock-free rtrb channels for communication.
//!
//! ## Architecture
//!
//!
//! Gossip/API ──[tx_channel]──► Pool ◄──[draw_req_channel]── Block producer
//!                                │
//!                                ├──[draw_resp_channel]──► Block producer
//!                                │
//!                                ◄──[ready_channel]─────── Ledger (apply/rollback)
//!                                ◄──[inclusion_channel]─── Ledger (block inclusion)
//!
//! ## Responsibilities
//!
//! 1. Transaction Ingestion: admit gossip/API transactions into unverified
//! 2. Periodic Processing: drain unverified through the verifier pipeline
//! 3. Periodic Expiry: evict aged entries, reset the invalid cache
//! 4. Ready Draw: serve ordered snapshots to the block producer
//! 5. Ledger Sync: re-stage rolled-back transactions, drop included ones
//!
//! ## Scheduling
//!
//! The three periodic jobs run off name-keyed interval timers checked
//! inside the loop. Because the loop is serial, two invocations of the
//! same job can never overlap, and a tick that lands while its job is
//! still running is coalesced into the next check.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use rtrb::{Consumer, Producer, RingBuffer};
use slog::Logger;

use crate::{
    pool::{
        pool::TransactionPool,
        types::{BlockInclusion, ReadyBatch, ReadyDrawRequest, ReadyDrawResponse},
    },
    state::transaction::Transaction,
};

/// Default ring buffer size for channels.
const RING_BUFFER_SIZE: usize = 256;

/// Ring buffer size for the transaction channel (larger due to higher volume).
const TX_RING_BUFFER_SIZE: usize = 1024;

/// Number of transactions to admit per loop iteration (quota).
const TX_PROCESS_QUOTA: usize = 64;

/// How often the loop logs occupancy and counters.
const STATS_LOG_INTERVAL: Duration = Duration::from_secs(30);

/// The invalid-cache reset fires at this multiple of the expiry interval.
const INVALID_RESET_MULTIPLIER: u64 = 10;

const PROCESS_JOB: &str = "tx_pool_process";
const EXPIRY_JOB: &str = "tx_pool_expiry";
const INVALID_RESET_JOB: &str = "tx_pool_invalid_reset";

/// Pool service running on a dedicated OS thread.
pub struct PoolService {
    handle: Option<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

/// Channel endpoints for communicating with the pool service.
pub struct PoolChannels {
    /// Producer for submitting transactions (gossip/API → pool)
    pub tx_producer: Producer<Transaction>,
    /// Producer for re-staging transactions on block apply/rollback
    pub ready_producer: Producer<ReadyBatch>,
    /// Producer for dropping transactions included in a block
    pub inclusion_producer: Producer<BlockInclusion>,
    /// Producer for requesting a ready snapshot (block producer → pool)
    pub draw_req_producer: Producer<ReadyDrawRequest>,
    /// Consumer for receiving ready snapshots (pool → block producer)
    pub draw_resp_consumer: Consumer<ReadyDrawResponse>,
}

/// One named periodic job.
struct Job {
    name: &'static str,
    interval: Duration,
    last_run: Instant,
}

/// Name-keyed interval timers for the periodic jobs.
struct JobQueue {
    jobs: Vec<Job>,
}

impl JobQueue {
    fn new() -> Self {
        Self { jobs: Vec::new() }
    }

    fn register(&mut self, name: &'static str, interval: Duration) {
        self.jobs.push(Job {
            name,
            interval,
            last_run: Instant::now(),
        });
    }

    /// Names of jobs whose interval has elapsed. `last_run` advances here,
    /// so ticks that landed while a job was running collapse into one.
    fn due(&mut self, now: Instant) -> Vec<&'static str> {
        let mut due = Vec::new();
        for job in &mut self.jobs {
            if now.duration_since(job.last_run) >= job.interval {
                job.last_run = now;
                due.push(job.name);
            }
        }
        due
    }
}

impl PoolService {
    /// Spawns the pool service on a new OS thread, taking ownership of the
    /// pool.
    pub fn spawn(
        pool: TransactionPool,
        shutdown: Arc<AtomicBool>,
        logger: Logger,
    ) -> (Self, PoolChannels) {
        let (tx_producer, tx_consumer) = RingBuffer::<Transaction>::new(TX_RING_BUFFER_SIZE);
        let (ready_producer, ready_consumer) = RingBuffer::<ReadyBatch>::new(RING_BUFFER_SIZE);
        let (inclusion_producer, inclusion_consumer) =
            RingBuffer::<BlockInclusion>::new(RING_BUFFER_SIZE);
        let (draw_req_producer, draw_req_consumer) =
            RingBuffer::<ReadyDrawRequest>::new(RING_BUFFER_SIZE);
        let (draw_resp_producer, draw_resp_consumer) =
            RingBuffer::<ReadyDrawResponse>::new(RING_BUFFER_SIZE);

        let shutdown_clone = Arc::clone(&shutdown);
        let handle = thread::Builder::new()
            .name("txpool".into())
            .spawn(move || {
                pool_loop(
                    pool,
                    tx_consumer,
                    ready_consumer,
                    inclusion_consumer,
                    draw_req_consumer,
                    draw_resp_producer,
                    shutdown_clone,
                    logger,
                );
            })
            .expect("Failed to spawn txpool thread");

        let channels = PoolChannels {
            tx_producer,
            ready_producer,
            inclusion_producer,
            draw_req_producer,
            draw_resp_consumer,
        };
        (
            Self {
                handle: Some(handle),
                shutdown,
            },
            channels,
        )
    }

    /// Signals shutdown and waits for the thread to terminate.
    pub fn shutdown(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    /// Returns true if the service is still running.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for PoolService {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Main pool event loop.
#[allow(clippy::too_many_arguments)]
fn pool_loop(
    mut pool: TransactionPool,
    mut tx_consumer: Consumer<Transaction>,
    mut ready_consumer: Consumer<ReadyBatch>,
    mut inclusion_consumer: Consumer<BlockInclusion>,
    mut draw_req_consumer: Consumer<ReadyDrawRequest>,
    mut draw_resp_producer: Producer<ReadyDrawResponse>,
    shutdown: Arc<AtomicBool>,
    logger: Logger,
) {
    let mut jobs = JobQueue::new();
    jobs.register(
        PROCESS_JOB,
        Duration::from_millis(pool.config().pool_process_interval_ms),
    );
    jobs.register(
        EXPIRY_JOB,
        Duration::from_millis(pool.config().pool_expiry_interval_ms),
    );
    jobs.register(
        INVALID_RESET_JOB,
        Duration::from_millis(pool.config().pool_expiry_interval_ms * INVALID_RESET_MULTIPLIER),
    );

    let mut idle_count = 0_u32;
    let mut stats_interval = Instant::now();

    slog::info!(logger, "Pool service started";
        "storage_limit" => pool.config().pool_storage_txs_limit,
        "process_interval_ms" => pool.config().pool_process_interval_ms,
        "expiry_interval_ms" => pool.config().pool_expiry_interval_ms,
    );

    while !shutdown.load(Ordering::Acquire) {
        let mut did_work = false;

        // Priority 1: ready draws (time-critical for block production)
        while let Ok(req) = draw_req_consumer.pop() {
            did_work = true;
            let transactions = pool.get_ready(req.limit);
            let count = transactions.len();
            push_with_backpressure(
                &mut draw_resp_producer,
                ReadyDrawResponse { transactions },
                &shutdown,
            );
            slog::debug!(logger, "Served ready draw";
                "count" => count,
                "ready_size" => pool.usage().ready,
            );
        }

        // Priority 2: ledger sync (re-staged and included transactions)
        while let Ok(batch) = ready_consumer.pop() {
            did_work = true;
            let count = batch.transactions.len();
            pool.add_ready(batch.transactions);
            slog::debug!(logger, "Re-staged ledger transactions"; "count" => count);
        }
        while let Ok(inclusion) = inclusion_consumer.pop() {
            did_work = true;
            let count = inclusion.tx_ids.len();
            for id in &inclusion.tx_ids {
                pool.remove(id);
            }
            slog::debug!(logger, "Removed included transactions"; "count" => count);
        }

        // Priority 3: incoming transactions (quota-limited)
        for _ in 0..TX_PROCESS_QUOTA {
            match tx_consumer.pop() {
                Ok(tx) => {
                    did_work = true;
                    let id = tx.id;
                    if let Err(err) = pool.add([tx]) {
                        slog::debug!(logger, "Transaction rejected";
                            "tx" => %id,
                            "error" => %err,
                        );
                    }
                }
                Err(_) => break,
            }
        }

        // Periodic jobs
        for name in jobs.due(Instant::now()) {
            did_work = true;
            match name {
                PROCESS_JOB => {
                    pool.process_pool();
                }
                EXPIRY_JOB => {
                    let expired = pool.expire_transactions();
                    if !expired.is_empty() {
                        slog::info!(logger, "Expired transactions"; "count" => expired.len());
                    }
                }
                INVALID_RESET_JOB => {
                    pool.reset_invalid_transactions();
                }
                _ => {}
            }
        }

        // Periodic stats logging
        if stats_interval.elapsed() >= STATS_LOG_INTERVAL {
            let usage = pool.usage();
            let stats = pool.stats();
            slog::info!(logger, "Pool stats";
                "unverified" => usage.unverified,
                "pending" => usage.pending,
                "ready" => usage.ready,
                "invalid" => pool.invalid_count(),
                "total_added" => stats.added,
                "total_removed" => stats.removed,
                "total_invalidated" => stats.invalidated,
                "total_expired" => stats.expired,
            );
            stats_interval = Instant::now();
        }

        // Progressive backoff when idle
        if did_work {
            idle_count = 0;
        } else {
            idle_count = idle_count.saturating_add(1);
            if idle_count < 10 {
                std::hint::spin_loop();
            } else if idle_count < 100 {
                std::thread::yield_now();
            } else {
                std::thread::sleep(Duration::from_millis(1));
            }
        }
    }

    let usage = pool.usage();
    slog::info!(logger, "Pool service shutting down";
        "unverified" => usage.unverified,
        "pending" => usage.pending,
        "ready" => usage.ready,
    );
}

/// Push a response with backpressure handling.
fn push_with_backpressure(
    producer: &mut Producer<ReadyDrawResponse>,
    response: ReadyDrawResponse,
    shutdown: &Arc<AtomicBool>,
) {
    let mut resp = response;
    loop {
        match producer.push(resp) {
            Ok(()) => break,
            Err(rtrb::PushError::Full(returned)) => {
                if shutdown.load(Ordering::Acquire) {
                    return;
                }
                std::thread::yield_now();
                resp = returned;
            }
        }
    }
}
