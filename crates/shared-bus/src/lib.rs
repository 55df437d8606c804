//! # Shared Bus - Ledger Event Bus
//!
//! Carries accept/reject outcomes from the document services to whoever is
//! interested (API layers, pending-transaction subscriptions, tests).
//!
//! ```text
//! ┌──────────────────┐                 ┌──────────────────┐
//! │ Document Service │                 │    Subscriber    │
//! │                  │   publish()     │                  │
//! │                  │ ──────┐         │                  │
//! └──────────────────┘       │         └──────────────────┘
//!                            ▼                  ↑
//!                     ┌──────────────┐          │
//!                     │  Event Bus   │ ─────────┘
//!                     └──────────────┘  subscribe()
//! ```
//!
//! Events are published by the committing unit once its outcome is known,
//! so subscribers observe them in commit order.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{EventFilter, EventTopic, LedgerEvent};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
