//! Background tasks for network-bound work.
//!
//! Every request runs in its own tokio task and reports back through one
//! unbounded channel. The render loop drains that channel with `try_recv()`
//! once per tick, so it never waits on the network.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::intent::{FetchKind, FetchRequest, FieldUpdate, RequestTarget, WriteRequest};
use crate::api::error::{RequestError, Result as ApiResult};
use crate::api::types::{Comment, Issue, IssueDetail, Transition};
use crate::api::IssueBackend;
use crate::config::{BoardConfig, Config, CustomFieldSpec};
use crate::telemetry;

/// Results sent from background tasks to the render loop.
#[derive(Debug)]
pub enum WorkerMessage {
    /// A read finished. Applied only if `seq` is still current for `target`.
    Fetched {
        seq: u64,
        target: RequestTarget,
        fetched: Fetched,
    },
    /// A write finished.
    Written(Written),
    /// The browser launcher returned.
    Opened {
        key: String,
        url: String,
        result: Result<(), RequestError>,
    },
}

/// Payload of a finished read, one variant per [`FetchKind`].
#[derive(Debug)]
pub enum Fetched {
    Issues(Result<Vec<Issue>, RequestError>),
    Detail(Result<IssueDetail, RequestError>),
    Comments(Result<Vec<Comment>, RequestError>),
    Transitions(Result<Vec<Transition>, RequestError>),
    Boards(Result<Vec<BoardConfig>, RequestError>),
    CustomFields(Result<Vec<CustomFieldSpec>, RequestError>),
}

impl Fetched {
    pub fn error(&self) -> Option<&RequestError> {
        match self {
            Fetched::Issues(r) => r.as_ref().err(),
            Fetched::Detail(r) => r.as_ref().err(),
            Fetched::Comments(r) => r.as_ref().err(),
            Fetched::Transitions(r) => r.as_ref().err(),
            Fetched::Boards(r) => r.as_ref().err(),
            Fetched::CustomFields(r) => r.as_ref().err(),
        }
    }
}

/// Outcome of a write.
#[derive(Debug)]
pub enum Written {
    Comment {
        key: String,
        result: Result<Comment, RequestError>,
    },
    Transition {
        key: String,
        transition: Transition,
        result: Result<(), RequestError>,
    },
    Field {
        key: String,
        update: FieldUpdate,
        result: Result<(), RequestError>,
    },
}

/// Spawns background tasks against an [`IssueBackend`].
#[derive(Clone)]
pub struct TaskSpawner {
    tx: mpsc::UnboundedSender<WorkerMessage>,
    backend: Arc<dyn IssueBackend>,
    config: Arc<Config>,
}

impl TaskSpawner {
    pub fn new(
        tx: mpsc::UnboundedSender<WorkerMessage>,
        backend: Arc<dyn IssueBackend>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            tx,
            backend,
            config,
        }
    }

    pub fn backend(&self) -> &Arc<dyn IssueBackend> {
        &self.backend
    }

    /// Spawn a read tagged with its sequence id.
    pub fn spawn_fetch(&self, seq: u64, request: FetchRequest) {
        let tx = self.tx.clone();
        let backend = Arc::clone(&self.backend);
        let config = Arc::clone(&self.config);
        debug!(seq, target = %request.target, "spawning fetch");

        tokio::spawn(async move {
            let FetchRequest { target, source, .. } = request;
            let key = target.key.clone();
            let fetched = match target.kind {
                FetchKind::Issues => {
                    let source = source.unwrap_or_default();
                    let jql = config
                        .resolve_jql(&source)
                        .map_err(|e| RequestError::local(e.to_string()));
                    Fetched::Issues(match jql {
                        Ok(jql) => timed("search_issues", &key, backend.search_issues(&jql)).await,
                        Err(e) => Err(e),
                    })
                }
                FetchKind::Detail => {
                    Fetched::Detail(timed("get_issue", &key, backend.get_issue(&key)).await)
                }
                FetchKind::Comments => Fetched::Comments(
                    timed("list_comments", &key, backend.list_comments(&key)).await,
                ),
                FetchKind::Transitions => Fetched::Transitions(
                    timed("list_transitions", &key, backend.list_transitions(&key)).await,
                ),
                FetchKind::Boards => Fetched::Boards(Ok(config.boards.clone())),
                FetchKind::CustomFields => {
                    Fetched::CustomFields(Ok(config.custom_fields.clone()))
                }
            };
            let _ = tx.send(WorkerMessage::Fetched {
                seq,
                target,
                fetched,
            });
        });
    }

    /// Spawn a write. Each call performs the write once.
    pub fn spawn_write(&self, request: WriteRequest) {
        let tx = self.tx.clone();
        let backend = Arc::clone(&self.backend);
        debug!(key = request.key(), "spawning write");

        tokio::spawn(async move {
            let written = match request {
                WriteRequest::Comment { key, body } => {
                    let result = timed("add_comment", &key, backend.add_comment(&key, &body)).await;
                    Written::Comment { key, result }
                }
                WriteRequest::Transition { key, transition } => {
                    let result = timed(
                        "apply_transition",
                        &key,
                        backend.apply_transition(&key, &transition.id),
                    )
                    .await;
                    Written::Transition {
                        key,
                        transition,
                        result,
                    }
                }
                WriteRequest::Field { key, update } => {
                    let result =
                        timed("update_fields", &key, backend.update_fields(&key, &update.fields))
                            .await;
                    Written::Field {
                        key,
                        update,
                        result,
                    }
                }
            };
            let _ = tx.send(WorkerMessage::Written(written));
        });
    }

    /// Open an issue in the system browser on the blocking pool.
    pub fn spawn_open(&self, key: String) {
        let tx = self.tx.clone();
        let url = self.backend.browse_url(&key);

        tokio::spawn(async move {
            let target = url.clone();
            let started = Instant::now();
            let result = match tokio::task::spawn_blocking(move || open::that(&target)).await {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(RequestError::local(format!("failed to open browser: {}", e))),
                Err(e) => Err(RequestError::local(format!("browser task failed: {}", e))),
            };
            if let Err(e) = &result {
                warn!(key = %key, "{}", e);
            }
            telemetry::record(
                "open_browser",
                &key,
                started.elapsed(),
                result.as_ref().err().map(|e| e.message.as_str()),
            );
            let _ = tx.send(WorkerMessage::Opened { key, url, result });
        });
    }
}

/// Await a backend call, convert its error and record telemetry.
async fn timed<T>(
    op: &'static str,
    key: &str,
    call: impl Future<Output = ApiResult<T>>,
) -> Result<T, RequestError> {
    let started = Instant::now();
    let result = call.await.map_err(RequestError::from);
    if let Err(e) = &result {
        warn!(op, key, kind = e.kind.label(), "{}", e);
    }
    telemetry::record(
        op,
        key,
        started.elapsed(),
        result.as_ref().err().map(|e| e.message.as_str()),
    );
    result
}

/// Create a new task channel and spawner.
///
/// The receiver is drained by the main loop; the spawner goes to the
/// pipeline.
pub fn create_task_channel(
    backend: Arc<dyn IssueBackend>,
    config: Arc<Config>,
) -> (mpsc::UnboundedReceiver<WorkerMessage>, TaskSpawner) {
    let (tx, rx) = mpsc::unbounded_channel();
    (rx, TaskSpawner::new(tx, backend, config))
}
