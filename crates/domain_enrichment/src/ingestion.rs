//! CDC ingestion loop
//!
//! A single sequential reader pulls messages from a [`CdcSource`], decodes
//! them, applies the idempotency gate, and dispatches every remaining event
//! as its own task. Ordering holds up to the hand-off only; dispatched tasks
//! complete in any order.
//!
//! [`DispatchPolicy::Unbounded`] spawns without limit. With
//! [`DispatchPolicy::Bounded`] the reader waits for a permit before each
//! dispatch, so a slow LLM backend back-pressures the source instead of
//! piling up connections.
//!
//! A failing claim never stops the loop: malformed messages are counted and
//! dropped, pipeline errors end in the claim's `Errored` stage, and a
//! panicking task is logged and counted as errored.

use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

use core_kernel::PortError;

use crate::event::ClaimChangeEvent;
use crate::pipeline::{EnrichmentPipeline, EnrichmentReport};

/// One row change as delivered by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CdcMessage {
    /// Partition key, usually the row's primary key
    pub key: Option<String>,
    pub payload: Vec<u8>,
}

impl CdcMessage {
    pub fn new(key: Option<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            key,
            payload: payload.into(),
        }
    }
}

/// Ordered stream of CDC messages for one partition
#[async_trait]
pub trait CdcSource: Send {
    /// Next message, or `None` once the source is closed
    async fn next(&mut self) -> Option<CdcMessage>;
}

/// Receiving half of an in-process CDC channel
#[derive(Debug)]
pub struct ChannelCdcSource {
    rx: mpsc::Receiver<CdcMessage>,
}

#[async_trait]
impl CdcSource for ChannelCdcSource {
    async fn next(&mut self) -> Option<CdcMessage> {
        self.rx.recv().await
    }
}

/// Sending half of an in-process CDC channel
#[derive(Debug, Clone)]
pub struct CdcSender {
    tx: mpsc::Sender<CdcMessage>,
}

impl CdcSender {
    /// Enqueues a message, waiting for capacity
    pub async fn publish(&self, message: CdcMessage) -> Result<(), PortError> {
        self.tx
            .send(message)
            .await
            .map_err(|_| PortError::ServiceUnavailable {
                service: "cdc ingestion loop".to_string(),
            })
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Creates a bounded in-process CDC channel
pub fn cdc_channel(capacity: usize) -> (CdcSender, ChannelCdcSource) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (CdcSender { tx }, ChannelCdcSource { rx })
}

/// How many claims may be enriched at once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchPolicy {
    /// One task per event, no limit
    #[default]
    Unbounded,
    /// At most `n` tasks in flight
    Bounded(NonZeroUsize),
}

impl DispatchPolicy {
    /// `None` or zero means unbounded
    pub fn from_limit(limit: Option<usize>) -> Self {
        limit
            .and_then(NonZeroUsize::new)
            .map_or(DispatchPolicy::Unbounded, DispatchPolicy::Bounded)
    }
}

/// Totals for one run of the loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionStats {
    pub received: u64,
    /// Delete events and other records without an `after` image
    pub ignored: u64,
    pub malformed: u64,
    pub skipped: u64,
    pub dispatched: u64,
    pub completed: u64,
    pub errored: u64,
}

impl IngestionStats {
    fn tally(&mut self, joined: Result<EnrichmentReport, JoinError>) {
        match joined {
            Ok(report) if report.is_done() => self.completed += 1,
            Ok(_) => self.errored += 1,
            Err(e) => {
                error!(error = %e, "Enrichment task aborted");
                self.errored += 1;
            }
        }
    }
}

/// Sequential reader dispatching one enrichment task per event
pub struct IngestionLoop<S: CdcSource> {
    source: S,
    pipeline: Arc<EnrichmentPipeline>,
    policy: DispatchPolicy,
}

impl<S: CdcSource> IngestionLoop<S> {
    pub fn new(source: S, pipeline: Arc<EnrichmentPipeline>) -> Self {
        Self {
            source,
            pipeline,
            policy: DispatchPolicy::Unbounded,
        }
    }

    pub fn with_policy(mut self, policy: DispatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Reads until the source closes, then waits for in-flight claims
    pub async fn run(self) -> IngestionStats {
        self.run_until(std::future::pending::<()>()).await
    }

    /// Reads until the source closes or `shutdown` resolves
    ///
    /// Claims already dispatched are always allowed to finish.
    pub async fn run_until<F>(mut self, shutdown: F) -> IngestionStats
    where
        F: Future<Output = ()> + Send,
    {
        let permits = match self.policy {
            DispatchPolicy::Unbounded => None,
            DispatchPolicy::Bounded(limit) => Some(Arc::new(Semaphore::new(limit.get()))),
        };
        let mut tasks = JoinSet::new();
        let mut stats = IngestionStats::default();

        info!(policy = ?self.policy, "CDC ingestion loop started");
        tokio::pin!(shutdown);

        loop {
            let message = tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, no longer reading CDC messages");
                    break;
                }
                message = self.source.next() => match message {
                    Some(message) => message,
                    None => break,
                },
            };
            stats.received += 1;

            while let Some(joined) = tasks.try_join_next() {
                stats.tally(joined);
            }

            let event = match ClaimChangeEvent::decode(&message.payload) {
                Ok(Some(event)) => event,
                Ok(None) => {
                    debug!(key = ?message.key, "CDC record has no after image, ignoring");
                    stats.ignored += 1;
                    continue;
                }
                Err(e) => {
                    warn!(key = ?message.key, error = %e, "Dropping malformed CDC message");
                    self.pipeline.metrics().record_malformed_message();
                    stats.malformed += 1;
                    continue;
                }
            };

            if !self.pipeline.admit(&event) {
                stats.skipped += 1;
                continue;
            }

            let permit = match &permits {
                Some(semaphore) => tokio::select! {
                    _ = &mut shutdown => {
                        info!(
                            claim_id = %event.claim_id,
                            "Shutdown requested while waiting for a dispatch slot, claim left for redelivery"
                        );
                        break;
                    }
                    acquired = Arc::clone(semaphore).acquire_owned() => match acquired {
                        Ok(permit) => Some(permit),
                        Err(_) => break,
                    },
                },
                None => None,
            };

            let pipeline = Arc::clone(&self.pipeline);
            tasks.spawn(async move {
                let _permit = permit;
                pipeline.enrich(event, message.key).await
            });
            stats.dispatched += 1;
        }

        debug!(in_flight = tasks.len(), "Waiting for in-flight claims");
        while let Some(joined) = tasks.join_next().await {
            stats.tally(joined);
        }

        info!(
            received = stats.received,
            dispatched = stats.dispatched,
            completed = stats.completed,
            errored = stats.errored,
            "CDC ingestion loop stopped"
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_from_limit() {
        assert_eq!(DispatchPolicy::from_limit(None), DispatchPolicy::Unbounded);
        assert_eq!(DispatchPolicy::from_limit(Some(0)), DispatchPolicy::Unbounded);
        assert_eq!(
            DispatchPolicy::from_limit(Some(4)),
            DispatchPolicy::Bounded(NonZeroUsize::new(4).unwrap())
        );
    }

    #[tokio::test]
    async fn test_sender_reports_closed_loop() {
        let (sender, source) = cdc_channel(1);
        drop(source);
        assert!(sender.is_closed());
        assert!(sender.publish(CdcMessage::new(None, "{}")).await.is_err());
    }
}
