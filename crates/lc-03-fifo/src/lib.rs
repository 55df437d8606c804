//! # FIFO Commit Pipeline (lc-03)
//!
//! A reusable concurrency primitive: one strictly ordered queue of
//! processing units with key-based deduplication.
//!
//! ## Guarantees
//!
//! | Guarantee | Mechanism |
//! |-----------|-----------|
//! | At most one unit per key queued or running | waiter map checked under one lock |
//! | Units complete in submission order | single consumer task, units awaited to completion |
//! | Every waiter sees the same outcome | outcome cloned to each `oneshot` waiter |
//! | A failing unit never stops the queue | errors and panics resolve only that unit |
//!
//! There is no cancellation and no timeout: once enqueued, a unit always
//! reaches an outcome.
//!
//! ```ignore
//! let pipeline: FifoPipeline<Hash, Transaction, LedgerError> = FifoPipeline::new();
//! let outcome = pipeline.submit(tx.hash(), async move { validate_and_save(tx).await }).await;
//! ```

pub mod errors;
pub mod pipeline;

pub use errors::PipelineError;
pub use pipeline::{FifoPipeline, PendingResult, Unit};
