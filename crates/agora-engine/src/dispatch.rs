//! Background profile generation, decoupled from the chat turn.
//!
//! Jobs are queued without waiting; a worker runs them with bounded
//! concurrency and only logs failures. There is no per-session lock:
//! concurrent jobs for one session resolve last-write-wins in the store.

use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;

use crate::error::EngineError;
use crate::extractor::ProfileExtractor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileJob {
    pub session_id: String,
    pub topic_id: String,
    /// Participant-message count that triggered the job
    pub message_count: u64,
}

/// Fire-and-forget submission of profile jobs
pub trait ProfileDispatch: Send + Sync {
    /// Queue a job. Returns `false` if the job could not be accepted.
    fn dispatch(&self, job: ProfileJob) -> bool;
}

pub struct ProfileJobQueue {
    tx: mpsc::UnboundedSender<ProfileJob>,
}

impl ProfileJobQueue {
    /// Spawn the worker loop. It stops once every queue handle is dropped.
    pub fn start(extractor: ProfileExtractor, concurrency: usize) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<ProfileJob>();
        let permits = Arc::new(Semaphore::new(concurrency.max(1)));

        let handle = tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
                    break;
                };
                let extractor = extractor.clone();

                tokio::spawn(async move {
                    let _permit = permit;
                    match extractor.extract(&job.session_id).await {
                        Ok(_) => {}
                        Err(EngineError::SessionNotFound(_)) => {
                            tracing::info!(
                                session_id = %job.session_id,
                                "Session gone before its profile was stored"
                            );
                        }
                        Err(e) => tracing::error!(
                            session_id = %job.session_id,
                            topic_id = %job.topic_id,
                            message_count = job.message_count,
                            "Failed to generate profile: {}",
                            e
                        ),
                    }
                });
            }
            tracing::debug!("Profile job queue closed");
        });

        (Self { tx }, handle)
    }
}

impl ProfileDispatch for ProfileJobQueue {
    fn dispatch(&self, job: ProfileJob) -> bool {
        let session_id = job.session_id.clone();
        match self.tx.send(job) {
            Ok(()) => {
                tracing::debug!(session_id = %session_id, "Profile job queued");
                true
            }
            Err(_) => {
                tracing::warn!(session_id = %session_id, "Profile job queue is closed");
                false
            }
        }
    }
}
