use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::services::engine::MatchEngine;
use crate::services::repository::{ListingRepository, MatchRepository, RequestRepository};

/// Errors raised when handing work to the job queue.
#[derive(Debug, Clone, Error)]
pub enum QueueError {
    #[error("job queue is closed")]
    Closed,
}

/// Fire-and-forget submission of a request for asynchronous scoring.
///
/// The engine has no awareness of the queue's retry mechanics; upserts
/// being idempotent makes at-least-once delivery safe.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, request_id: Uuid) -> Result<(), QueueError>;
}

/// In-process queue over an unbounded channel. Cloneable sender half;
/// the receiver half is drained by a [`ScoringWorker`].
#[derive(Debug, Clone)]
pub struct InProcessQueue {
    tx: mpsc::UnboundedSender<Uuid>,
}

impl InProcessQueue {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Uuid>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl JobQueue for InProcessQueue {
    async fn enqueue(&self, request_id: Uuid) -> Result<(), QueueError> {
        self.tx.send(request_id).map_err(|_| QueueError::Closed)
    }
}

/// Drains queued request ids and scores each with persistence on.
///
/// Per-job failures are logged and the worker moves on; the loop ends
/// when every sender half has been dropped.
pub struct ScoringWorker<RR, LR, MR> {
    engine: Arc<MatchEngine<RR, LR, MR>>,
    rx: mpsc::UnboundedReceiver<Uuid>,
}

impl<RR, LR, MR> ScoringWorker<RR, LR, MR>
where
    RR: RequestRepository,
    LR: ListingRepository,
    MR: MatchRepository,
{
    pub fn new(engine: Arc<MatchEngine<RR, LR, MR>>, rx: mpsc::UnboundedReceiver<Uuid>) -> Self {
        Self { engine, rx }
    }

    /// Run until the queue closes. Returns how many jobs were processed.
    pub async fn run(mut self) -> usize {
        let mut processed = 0;

        while let Some(request_id) = self.rx.recv().await {
            processed += 1;
            match self.engine.score_request(request_id, true).await {
                Ok(ranked) => {
                    tracing::debug!(%request_id, persisted = ranked.persisted, "queued scoring done");
                }
                Err(e) => {
                    tracing::warn!(%request_id, error = %e, "queued scoring failed");
                }
            }
        }

        tracing::info!(processed, "scoring worker drained");
        processed
    }
}
