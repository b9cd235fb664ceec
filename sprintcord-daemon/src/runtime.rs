use std::fs;
use std::io::ErrorKind;
use std::os::unix::net::UnixStream as StdUnixStream;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::OwnedWriteHalf;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};
use tokio::time::{Instant, MissedTickBehavior};

use sprintcord_sync::{ClearReport, PassReport, SyncContext, SyncTarget};

use crate::error::{io_err, DaemonError};
use crate::paths::{socket_path, sprintcord_root};
use crate::protocol::{DaemonRequest, DaemonResponse};

/// "A scheduled pass is queued or running." Held by the scheduler's job until
/// the processor drops it.
#[derive(Debug, Clone, Default)]
struct PassGate(Arc<AtomicBool>);

impl PassGate {
    fn try_acquire(&self) -> Option<PassTicket> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| PassTicket(self.0.clone()))
    }
}

#[derive(Debug)]
struct PassTicket(Arc<AtomicBool>);

impl Drop for PassTicket {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

enum Job {
    Pass {
        source: &'static str,
        _ticket: Option<PassTicket>,
        respond_to: Option<oneshot::Sender<Result<PassSummary, String>>>,
    },
    Clear {
        respond_to: oneshot::Sender<ClearReport>,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct PassSummary {
    pub source: String,
    pub sprint: Option<u64>,
    pub created: usize,
    pub renamed: usize,
    pub unchanged: usize,
    pub failed: usize,
    pub store_saved: bool,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u128,
}

impl PassSummary {
    fn from_report(source: &str, report: &PassReport, duration: Duration) -> Self {
        Self {
            source: source.to_string(),
            sprint: report.sprint.map(|s| s.0),
            created: report.created(),
            renamed: report.renamed(),
            unchanged: report.unchanged(),
            failed: report.failed(),
            store_saved: report.store_saved,
            finished_at: Utc::now(),
            duration_ms: duration.as_millis(),
        }
    }
}

/// Facts fixed at startup.
#[derive(Debug, Clone)]
struct RuntimeInfo {
    started_at: DateTime<Utc>,
    interval: Duration,
    target: SyncTarget,
    state_path: PathBuf,
    socket: PathBuf,
}

#[derive(Debug, Default)]
struct DaemonState {
    tracked: usize,
    passes: u64,
    last_pass: Option<PassSummary>,
    last_error: Option<String>,
}

type SharedState = Arc<RwLock<DaemonState>>;

/// Start the daemon runtime and block the current thread until it exits.
pub fn start_blocking(
    home: &Path,
    context: SyncContext,
    interval: Duration,
) -> Result<(), DaemonError> {
    init_tracing();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run(home.to_path_buf(), Arc::new(context), interval))
}

/// Run the daemon runtime.
///
/// The first pass starts immediately; later passes follow every `interval`.
pub async fn run(
    home: PathBuf,
    context: Arc<SyncContext>,
    interval: Duration,
) -> Result<(), DaemonError> {
    let root = sprintcord_root(&home);
    fs::create_dir_all(&root).map_err(|e| io_err(&root, e))?;

    let info = Arc::new(RuntimeInfo {
        started_at: Utc::now(),
        interval,
        target: context.target().clone(),
        state_path: context.store_path(),
        socket: socket_path(&home),
    });
    let state: SharedState = Arc::new(RwLock::new(DaemonState {
        tracked: context.tracked().len(),
        ..DaemonState::default()
    }));
    tracing::info!(
        board = %info.target.board,
        channel = %info.target.channel,
        interval_secs = interval.as_secs(),
        "daemon starting",
    );

    let (job_tx, job_rx) = mpsc::channel::<Job>(64);
    let (shutdown_tx, _) = broadcast::channel::<()>(16);
    let gate = PassGate::default();

    let scheduler_handle = {
        let shutdown = shutdown_tx.clone();
        let job_tx = job_tx.clone();
        let gate = gate.clone();
        tokio::spawn(async move {
            let result = scheduler_task(interval, gate, job_tx, shutdown.subscribe()).await;
            let _ = shutdown.send(());
            result
        })
    };

    let processor_handle = {
        let shutdown = shutdown_tx.clone();
        let context = context.clone();
        let state = state.clone();
        tokio::spawn(async move {
            let result = processor_task(context, state, job_rx, shutdown.subscribe()).await;
            let _ = shutdown.send(());
            result
        })
    };

    let socket_handle = {
        let shutdown = shutdown_tx.clone();
        let info = info.clone();
        let state = state.clone();
        let job_tx = job_tx.clone();
        tokio::spawn(async move {
            let result =
                socket_server_task(info, state, job_tx, shutdown.clone(), shutdown.subscribe())
                    .await;
            let _ = shutdown.send(());
            result
        })
    };

    let signal_handle = {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            let mut shutdown_rx = shutdown.subscribe();
            tokio::select! {
                _ = shutdown_rx.recv() => Ok(()),
                signal = tokio::signal::ctrl_c() => {
                    match signal {
                        Ok(()) => {
                            tracing::info!("received ctrl-c, shutting down daemon");
                            let _ = shutdown.send(());
                            Ok(())
                        }
                        Err(err) => Err(DaemonError::Protocol(format!("ctrl-c handler failed: {err}"))),
                    }
                }
            }
        })
    };
    drop(job_tx);

    let (scheduler_result, processor_result, socket_result, signal_result) = tokio::join!(
        scheduler_handle,
        processor_handle,
        socket_handle,
        signal_handle
    );

    handle_join("scheduler", scheduler_result)?;
    handle_join("processor", processor_result)?;
    handle_join("socket_server", socket_result)?;
    handle_join("signal_handler", signal_result)?;
    tracing::info!("daemon stopped");
    Ok(())
}

async fn scheduler_task(
    period: Duration,
    gate: PassGate,
    job_tx: mpsc::Sender<Job>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            _ = interval.tick() => {
                let Some(ticket) = gate.try_acquire() else {
                    tracing::debug!("previous scheduled pass still pending; skipping tick");
                    continue;
                };
                let job = Job::Pass {
                    source: "scheduler",
                    _ticket: Some(ticket),
                    respond_to: None,
                };
                if job_tx.send(job).await.is_err() {
                    break;
                }
            }
        }
    }
    Ok(())
}

async fn processor_task(
    context: Arc<SyncContext>,
    state: SharedState,
    mut job_rx: mpsc::Receiver<Job>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            maybe_job = job_rx.recv() => {
                let Some(job) = maybe_job else { break };
                match job {
                    Job::Pass { source, _ticket, respond_to } => {
                        let outcome = run_pass(context.clone(), state.clone(), source).await;
                        if let Some(tx) = respond_to {
                            let _ = tx.send(outcome.map_err(|err| err.to_string()));
                        }
                    }
                    Job::Clear { respond_to } => {
                        let report = run_clear(context.clone(), state.clone()).await?;
                        let _ = respond_to.send(report);
                    }
                }
            }
        }
    }
    Ok(())
}

async fn run_pass(
    context: Arc<SyncContext>,
    state: SharedState,
    source: &'static str,
) -> Result<PassSummary, DaemonError> {
    let started = Instant::now();
    let result = tokio::task::spawn_blocking(move || {
        let report = context.reconcile_pass();
        (report, context.tracked().len())
    })
    .await
    .map_err(|err| DaemonError::Protocol(format!("pass task join error: {err}")))?;

    let (report, tracked) = result;
    let mut state = state.write().await;
    state.tracked = tracked;
    state.passes += 1;
    match report {
        Ok(report) => {
            let summary = PassSummary::from_report(source, &report, started.elapsed());
            tracing::info!(
                source,
                created = summary.created,
                renamed = summary.renamed,
                unchanged = summary.unchanged,
                failed = summary.failed,
                duration_ms = summary.duration_ms,
                "pass completed",
            );
            state.last_error = None;
            state.last_pass = Some(summary.clone());
            Ok(summary)
        }
        Err(err) => {
            tracing::error!(source, error = %err, "pass aborted");
            state.last_error = Some(err.to_string());
            Err(err.into())
        }
    }
}

async fn run_clear(context: Arc<SyncContext>, state: SharedState) -> Result<ClearReport, DaemonError> {
    let report = tokio::task::spawn_blocking(move || context.clear_all())
        .await
        .map_err(|err| DaemonError::Protocol(format!("clear task join error: {err}")))?;
    state.write().await.tracked = 0;
    Ok(report)
}

async fn socket_server_task(
    info: Arc<RuntimeInfo>,
    state: SharedState,
    job_tx: mpsc::Sender<Job>,
    shutdown_tx: broadcast::Sender<()>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    let socket = info.socket.clone();
    prepare_socket_for_bind(&socket)?;

    let listener = UnixListener::bind(&socket).map_err(|e| io_err(&socket, e))?;
    set_socket_permissions(&socket)?;
    tracing::info!(socket = %socket.display(), "listening for commands");

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            accepted = listener.accept() => {
                let (stream, _) = accepted.map_err(|e| io_err(&socket, e))?;
                let info = info.clone();
                let state = state.clone();
                let job_tx = job_tx.clone();
                let shutdown_tx = shutdown_tx.clone();
                tokio::spawn(async move {
                    if let Err(err) = handle_socket_client(stream, info, state, job_tx, shutdown_tx).await {
                        tracing::error!(error = %err, "socket client error");
                    }
                });
            }
        }
    }

    if socket.exists() {
        let _ = fs::remove_file(&socket);
    }
    Ok(())
}

async fn handle_socket_client(
    stream: UnixStream,
    info: Arc<RuntimeInfo>,
    state: SharedState,
    job_tx: mpsc::Sender<Job>,
    shutdown_tx: broadcast::Sender<()>,
) -> Result<(), DaemonError> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| io_err("daemon socket read", e))?
    {
        if line.trim().is_empty() {
            continue;
        }

        let request: DaemonRequest = match serde_json::from_str(&line) {
            Ok(request) => request,
            Err(err) => {
                write_response(
                    &mut writer,
                    &DaemonResponse::error(format!("invalid request: {err}")),
                )
                .await?;
                continue;
            }
        };

        let response = match request {
            DaemonRequest::Status => DaemonResponse::ok(build_status_payload(&info, &state).await),
            DaemonRequest::Sync => match enqueue_pass(&job_tx, "socket").await {
                Ok(summary) => DaemonResponse::ok(json!(summary)),
                Err(err) => DaemonResponse::error(err.to_string()),
            },
            DaemonRequest::Clear => match enqueue_clear(&job_tx).await {
                Ok(report) => DaemonResponse::ok(json!({
                    "deleted": report.deleted,
                    "failures": report.failures,
                    "store_saved": report.store_saved,
                    "message": report.message(),
                })),
                Err(err) => DaemonResponse::error(err.to_string()),
            },
            DaemonRequest::Stop => {
                let _ = shutdown_tx.send(());
                DaemonResponse::ok(json!({ "stopping": true }))
            }
        };

        write_response(&mut writer, &response).await?;
        if request == DaemonRequest::Stop {
            break;
        }
    }

    Ok(())
}

async fn build_status_payload(info: &RuntimeInfo, state: &SharedState) -> Value {
    let state = state.read().await;
    json!({
        "running": true,
        "started_at": info.started_at,
        "interval_secs": info.interval.as_secs(),
        "board": info.target.board,
        "channel": info.target.channel,
        "tracked": state.tracked,
        "passes": state.passes,
        "last_pass": state.last_pass,
        "last_error": state.last_error,
        "state_path": info.state_path.display().to_string(),
        "socket": info.socket.display().to_string(),
    })
}

async fn enqueue_pass(
    job_tx: &mpsc::Sender<Job>,
    source: &'static str,
) -> Result<PassSummary, DaemonError> {
    let (tx, rx) = oneshot::channel();
    job_tx
        .send(Job::Pass {
            source,
            _ticket: None,
            respond_to: Some(tx),
        })
        .await
        .map_err(|_| DaemonError::ChannelClosed("job queue"))?;

    let outcome = rx
        .await
        .map_err(|_| DaemonError::ChannelClosed("pass response"))?;
    outcome.map_err(DaemonError::Protocol)
}

async fn enqueue_clear(job_tx: &mpsc::Sender<Job>) -> Result<ClearReport, DaemonError> {
    let (tx, rx) = oneshot::channel();
    job_tx
        .send(Job::Clear { respond_to: tx })
        .await
        .map_err(|_| DaemonError::ChannelClosed("job queue"))?;
    rx.await
        .map_err(|_| DaemonError::ChannelClosed("clear response"))
}

fn prepare_socket_for_bind(socket: &Path) -> Result<(), DaemonError> {
    if !socket.exists() {
        return Ok(());
    }

    match StdUnixStream::connect(socket) {
        Ok(_) => {
            return Err(DaemonError::Protocol(format!(
                "daemon socket already in use: {}",
                socket.display()
            )));
        }
        Err(err) => {
            tracing::warn!(
                socket = %socket.display(),
                error = %err,
                "removing stale daemon socket before bind",
            );
        }
    }

    match fs::remove_file(socket) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(io_err(socket, err)),
    }
}

async fn write_response(
    writer: &mut OwnedWriteHalf,
    response: &DaemonResponse,
) -> Result<(), DaemonError> {
    let payload = serde_json::to_string(response)?;
    writer
        .write_all(payload.as_bytes())
        .await
        .map_err(|e| io_err("daemon socket write", e))?;
    writer
        .write_all(b"\n")
        .await
        .map_err(|e| io_err("daemon socket write", e))?;
    writer
        .flush()
        .await
        .map_err(|e| io_err("daemon socket flush", e))?;
    Ok(())
}

fn handle_join(
    task: &str,
    result: Result<Result<(), DaemonError>, tokio::task::JoinError>,
) -> Result<(), DaemonError> {
    match result {
        Ok(inner) => inner,
        Err(err) => Err(DaemonError::Protocol(format!(
            "{task} task join failure: {err}"
        ))),
    }
}

/// Install the fmt subscriber (`RUST_LOG`, default `info`). Safe to call twice.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

#[cfg(unix)]
fn set_socket_permissions(path: &Path) -> Result<(), DaemonError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|e| io_err(path, e))
}

#[cfg(not(unix))]
fn set_socket_permissions(_path: &Path) -> Result<(), DaemonError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use sprintcord_core::test_support::{InMemoryThreads, InMemoryTracker};
    use sprintcord_core::{BoardId, ChannelId, WorkItem};
    use sprintcord_sync::{thread_store, ThreadPolicy, ThreadStore};
    use tempfile::TempDir;
    use tokio::time::advance;

    use crate::protocol::{request_clear, request_status, request_stop, request_sync};

    fn context(home: &Path, items: Vec<WorkItem>) -> (Arc<SyncContext>, Arc<InMemoryThreads>) {
        let threads = Arc::new(InMemoryThreads::new());
        let (store, _) = ThreadStore::open(thread_store::store_path_at(home));
        let ctx = SyncContext::new(
            Arc::new(InMemoryTracker::with_items(items)),
            threads.clone(),
            SyncTarget {
                board: BoardId::from("42"),
                channel: ChannelId::from("500"),
            },
            ThreadPolicy::default(),
            store,
        );
        (Arc::new(ctx), threads)
    }

    #[test]
    fn pass_gate_admits_one_ticket_at_a_time() {
        let gate = PassGate::default();
        let ticket = gate.try_acquire().expect("first ticket");
        assert!(gate.try_acquire().is_none());
        drop(ticket);
        assert!(gate.try_acquire().is_some());
    }

    #[tokio::test(start_paused = true, flavor = "current_thread")]
    async fn scheduler_skips_ticks_while_a_pass_is_pending() {
        let (job_tx, mut job_rx) = mpsc::channel::<Job>(8);
        let (shutdown_tx, _) = broadcast::channel::<()>(1);
        let gate = PassGate::default();
        let handle = tokio::spawn(scheduler_task(
            Duration::from_secs(15),
            gate.clone(),
            job_tx,
            shutdown_tx.subscribe(),
        ));

        let first = job_rx.recv().await.expect("pass right after start");

        advance(Duration::from_secs(46)).await;
        tokio::task::yield_now().await;
        assert!(
            job_rx.try_recv().is_err(),
            "ticks must be skipped while the first pass is pending"
        );

        drop(first);
        let second = job_rx.recv().await.expect("pass after release");
        assert!(matches!(second, Job::Pass { source: "scheduler", .. }));

        let _ = shutdown_tx.send(());
        handle.await.expect("join").expect("scheduler");
    }

    #[tokio::test]
    async fn processor_runs_passes_and_clears_in_order() {
        let home = TempDir::new().expect("home");
        let (ctx, threads) = context(home.path(), vec![WorkItem::new("X-1", "Fix bug", "Done")]);
        let state: SharedState = Arc::default();
        let (job_tx, job_rx) = mpsc::channel::<Job>(8);
        let (shutdown_tx, _) = broadcast::channel::<()>(1);
        let handle = tokio::spawn(processor_task(
            ctx.clone(),
            state.clone(),
            job_rx,
            shutdown_tx.subscribe(),
        ));

        let summary = enqueue_pass(&job_tx, "test").await.expect("pass");
        assert_eq!(summary.created, 1);
        assert_eq!(state.read().await.tracked, 1);
        assert_eq!(threads.threads()[0].name, "🟢 X-1: Fix bug");

        let report = enqueue_clear(&job_tx).await.expect("clear");
        assert_eq!(report.deleted, 1);
        assert_eq!(state.read().await.tracked, 0);
        assert!(threads.threads().is_empty());

        let _ = shutdown_tx.send(());
        handle.await.expect("join").expect("processor");
    }

    #[tokio::test]
    async fn status_payload_before_any_pass() {
        let info = RuntimeInfo {
            started_at: Utc::now(),
            interval: Duration::from_secs(15),
            target: SyncTarget {
                board: BoardId::from("42"),
                channel: ChannelId::from("500"),
            },
            state_path: PathBuf::from("/tmp/threads.json"),
            socket: PathBuf::from("/tmp/daemon.sock"),
        };
        let state: SharedState = Arc::new(RwLock::new(DaemonState {
            tracked: 3,
            ..DaemonState::default()
        }));

        let payload = build_status_payload(&info, &state).await;

        assert_eq!(payload["running"], json!(true));
        assert_eq!(payload["interval_secs"], json!(15));
        assert_eq!(payload["board"], json!("42"));
        assert_eq!(payload["tracked"], json!(3));
        assert_eq!(payload["last_pass"], Value::Null);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn socket_commands_round_trip() {
        let home = TempDir::new().expect("home");
        let (ctx, threads) = context(home.path(), vec![WorkItem::new("X-1", "Fix bug", "Done")]);
        let daemon = tokio::spawn(run(
            home.path().to_path_buf(),
            ctx,
            Duration::from_secs(3600),
        ));

        let home_path = home.path().to_path_buf();
        let (status, synced, cleared) = tokio::task::spawn_blocking(move || {
            let mut status = request_status(&home_path).expect("status");
            for _ in 0..100 {
                if status["passes"].as_u64().unwrap_or(0) >= 1 {
                    break;
                }
                std::thread::sleep(Duration::from_millis(20));
                status = request_status(&home_path).expect("status");
            }
            let synced = request_sync(&home_path).expect("sync");
            let cleared = request_clear(&home_path).expect("clear");
            request_stop(&home_path).expect("stop");
            (status, synced, cleared)
        })
        .await
        .expect("client");

        assert_eq!(status["running"], json!(true));
        assert_eq!(status["last_pass"]["created"], json!(1));
        // The startup pass already created the thread; the manual one finds it.
        assert_eq!(synced["unchanged"], json!(1));
        assert_eq!(cleared["deleted"], json!(1));
        assert_eq!(cleared["message"], json!("Deleted 1 thread(s)."));
        assert!(threads.threads().is_empty());

        daemon.await.expect("join").expect("daemon");
        assert!(!socket_path(home.path()).exists());
    }
}
