//! # Event Subscriber
//!
//! Defines the subscription side of the event bus.

use crate::events::{EventFilter, LedgerEvent};
use std::pin::Pin;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::Stream;
use tracing::debug;

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The event bus was closed.
    #[error("Event bus closed")]
    Closed,
}

/// A subscription handle for receiving events.
pub struct Subscription {
    receiver: broadcast::Receiver<LedgerEvent>,
    filter: EventFilter,
}

impl Subscription {
    pub(crate) fn new(receiver: broadcast::Receiver<LedgerEvent>, filter: EventFilter) -> Self {
        Self { receiver, filter }
    }

    /// Receive the next event that matches the filter.
    ///
    /// Returns `None` once the bus is dropped.
    pub async fn recv(&mut self) -> Option<LedgerEvent> {
        loop {
            let event = match self.receiver.recv().await {
                Ok(e) => e,
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    debug!(lagged = count, "Subscriber lagged, some events dropped");
                    continue;
                }
            };

            if self.filter.matches(&event) {
                return Some(event);
            }
        }
    }

    /// Try to receive the next event without blocking.
    ///
    /// `Ok(None)` means no matching event is buffered right now.
    pub fn try_recv(&mut self) -> Result<Option<LedgerEvent>, SubscriptionError> {
        loop {
            let event = match self.receiver.try_recv() {
                Ok(e) => e,
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(SubscriptionError::Closed)
                }
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            };

            if self.filter.matches(&event) {
                return Ok(Some(event));
            }
        }
    }

    /// Get the filter for this subscription.
    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }
}

/// Filtered event stream for use with stream combinators.
pub struct EventStream {
    inner: Pin<Box<BroadcastStream<LedgerEvent>>>,
    filter: EventFilter,
}

impl EventStream {
    pub(crate) fn new(receiver: broadcast::Receiver<LedgerEvent>, filter: EventFilter) -> Self {
        Self {
            inner: Box::pin(BroadcastStream::new(receiver)),
            filter,
        }
    }

    /// Get the filter for this stream.
    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }
}

impl Stream for EventStream {
    type Item = LedgerEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match self.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(event))) => {
                    if self.filter.matches(&event) {
                        return Poll::Ready(Some(event));
                    }
                }
                Poll::Ready(Some(Err(BroadcastStreamRecvError::Lagged(count)))) => {
                    debug!(lagged = count, "Stream lagged, some events dropped");
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventTopic;
    use crate::publisher::InMemoryEventBus;
    use crate::EventPublisher;
    use shared_types::{Blockstamp, LedgerError};
    use std::time::Duration;
    use tokio::time::timeout;
    use tokio_stream::StreamExt;

    fn block_event(number: u64) -> LedgerEvent {
        LedgerEvent::BlockAccepted {
            blockstamp: Blockstamp::new(number, [0; 32]),
            issuer: [0; 32],
            transactions: vec![],
        }
    }

    #[tokio::test]
    async fn test_subscription_recv() {
        let bus = InMemoryEventBus::new();
        let mut sub = bus.subscribe(EventFilter::all());

        bus.publish(block_event(1)).await;

        let received = timeout(Duration::from_millis(100), sub.recv())
            .await
            .expect("timeout")
            .expect("event");

        assert!(matches!(received, LedgerEvent::BlockAccepted { .. }));
    }

    #[tokio::test]
    async fn test_subscription_filter() {
        let bus = InMemoryEventBus::new();
        let mut sub = bus.subscribe(EventFilter::topics(vec![EventTopic::Blocks]));

        // Filtered out
        bus.publish(LedgerEvent::transaction_rejected([0; 32], &LedgerError::NoCurrentState))
            .await;
        bus.publish(block_event(2)).await;

        let received = timeout(Duration::from_millis(100), sub.recv())
            .await
            .expect("timeout")
            .expect("event");

        assert!(matches!(received, LedgerEvent::BlockAccepted { .. }));
    }

    #[tokio::test]
    async fn test_subscription_drop_cleanup() {
        let bus = InMemoryEventBus::new();

        {
            let _sub1 = bus.subscribe(EventFilter::all());
            let _sub2 = bus.subscribe(EventFilter::all());
            assert_eq!(bus.subscriber_count(), 2);
        }

        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_try_recv_empty() {
        let bus = InMemoryEventBus::new();
        let mut sub = bus.subscribe(EventFilter::all());

        assert!(matches!(sub.try_recv(), Ok(None)));
    }

    #[tokio::test]
    async fn test_event_stream_skips_rejections() {
        let bus = InMemoryEventBus::new();
        let mut stream = bus.event_stream(EventFilter::all().accepted_only());

        bus.publish(LedgerEvent::block_rejected(Blockstamp::default(), &LedgerError::NoCurrentState))
            .await;
        bus.publish(block_event(7)).await;

        let received = timeout(Duration::from_millis(100), stream.next())
            .await
            .expect("timeout")
            .expect("event");
        match received {
            LedgerEvent::BlockAccepted { blockstamp, .. } => assert_eq!(blockstamp.number, 7),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_event_stream_ends_with_bus() {
        let bus = InMemoryEventBus::new();
        let mut stream = bus.event_stream(EventFilter::all());
        drop(bus);

        assert!(stream.next().await.is_none());
    }
}
