//! Fan-out (spec §4.10, §5): pushes a freshly built `Snapshot` to local
//! subscribers and to configured uplink targets, but only when it actually
//! changed. Local subscribers are plain bounded channels — a slow reader is
//! dropped outright rather than slowing the tick down (§5's "must not block
//! the others" rule). Each uplink target gets its own reconnect/backoff
//! thread, following the teacher's per-session `std::thread` + `mpsc`
//! streaming style rather than an async executor, since the actual socket
//! implementation is an external adapter (§6) the core only drives.

use crate::config::UplinkTarget;
use chrono::{DateTime, Utc};
use obscope_types::Snapshot;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::mpsc::{sync_channel, Receiver, SyncSender, TrySendError};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

/// Depth of each subscriber's mailbox. One or two is enough: a subscriber
/// that can't keep up with a ~1Hz tick is, by definition, slow.
const SUBSCRIBER_CHANNEL_DEPTH: usize = 2;

/// One push to subscribers/uplinks. `id` is a monotonically increasing
/// string per §6's "Snapshot push channel" interface.
#[derive(Debug, Clone, Serialize)]
pub struct PushMessage {
    pub id: String,
    pub pushed_at: DateTime<Utc>,
    pub snapshot: Snapshot,
}

/// Hub local subscribers attach to. Owned by the tick task; `publish` is the
/// only place that mutates it.
pub struct SnapshotBus {
    next_id: u64,
    last_serialized: Option<String>,
    last_message: Option<Arc<PushMessage>>,
    subscribers: Vec<SyncSender<Arc<PushMessage>>>,
}

impl Default for SnapshotBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotBus {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            last_serialized: None,
            last_message: None,
            subscribers: Vec::new(),
        }
    }

    /// Register a new local subscriber. Per §4.10, "new subscribers
    /// immediately receive the current Snapshot then join the change
    /// stream" — so an already-built Snapshot is sent before returning.
    pub fn subscribe(&mut self) -> Receiver<Arc<PushMessage>> {
        let (tx, rx) = sync_channel(SUBSCRIBER_CHANNEL_DEPTH);
        if let Some(current) = &self.last_message {
            let _ = tx.try_send(current.clone());
        }
        self.subscribers.push(tx);
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Compare the freshly built snapshot to the last pushed serialization
    /// byte-for-byte (§8 property 7: push idempotence); if unchanged, push
    /// nothing and return `None`. Otherwise assign the next message id,
    /// push to every subscriber, dropping (not blocking on) any whose
    /// mailbox is full or disconnected, and return the pushed message.
    pub fn publish(&mut self, snapshot: &Snapshot, now: DateTime<Utc>) -> Option<Arc<PushMessage>> {
        let serialized = serde_json::to_string(snapshot).ok()?;
        if self.last_serialized.as_deref() == Some(serialized.as_str()) {
            return None;
        }

        let message = Arc::new(PushMessage {
            id: self.next_id.to_string(),
            pushed_at: now,
            snapshot: snapshot.clone(),
        });
        self.next_id += 1;
        self.last_serialized = Some(serialized);
        self.last_message = Some(message.clone());

        self.subscribers.retain(|tx| match tx.try_send(message.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => false,
            Err(TrySendError::Disconnected(_)) => false,
        });

        Some(message)
    }
}

/// Client→server uplink messages (§6's uplink protocol).
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UplinkClientMessage {
    Auth { token: String, pylon_id: String },
    StateUpdate { state: Snapshot },
    Heartbeat,
}

/// Server→client uplink messages.
#[derive(Debug, Clone)]
pub enum UplinkServerMessage {
    AuthOk { operator_id: String },
    AuthError { reason: String },
    Other,
}

#[derive(Debug, thiserror::Error)]
pub enum UplinkError {
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("send failed: {0}")]
    Send(String),
    #[error("recv failed: {0}")]
    Recv(String),
}

pub type UplinkResult<T> = Result<T, UplinkError>;

/// One live connection to an uplink target. The real implementation (a
/// WebSocket client) lives outside the core per §6; this trait is the seam
/// the reconnect/backoff/auth logic is driven through and tested against.
pub trait UplinkConnection: Send {
    fn send(&mut self, message: &UplinkClientMessage) -> UplinkResult<()>;
    /// Block up to `timeout` for the next server message; `Ok(None)` on a
    /// timeout with no message, not an error.
    fn recv(&mut self, timeout: Duration) -> UplinkResult<Option<UplinkServerMessage>>;
}

/// Dials one uplink target. Implementations are expected to be cheap to
/// construct and to fail fast (connection refused, TLS error, DNS failure)
/// rather than block indefinitely.
pub trait UplinkTransport: Send + Sync {
    fn connect(&self, ws_url: &str) -> UplinkResult<Box<dyn UplinkConnection>>;
}

const BACKOFF_INITIAL: Duration = Duration::from_secs(2);
const BACKOFF_MAX: Duration = Duration::from_secs(10);
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
const RECV_POLL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UplinkStatus {
    Connecting,
    Connected,
    Disconnected,
}

struct SharedStatus {
    status: Mutex<UplinkStatus>,
}

/// Filter a Snapshot down to a target's subscribed projects. An empty
/// `projects` list means "no filter" — the target sees everything, which is
/// the natural default for a single-project relay config (open question,
/// resolved in DESIGN.md).
fn filtered_view(snapshot: &Snapshot, projects: &[String]) -> Snapshot {
    if projects.is_empty() {
        return snapshot.clone();
    }
    let allowed: std::collections::HashSet<&str> = projects.iter().map(String::as_str).collect();
    let mut view = snapshot.clone();
    view.workstreams.retain(|w| allowed.contains(w.project_path.to_string_lossy().as_ref()));
    view.agents.retain(|a| allowed.contains(a.project_path.to_string_lossy().as_ref()));
    view.collisions.retain(|c| allowed.contains(c.project_path.to_string_lossy().as_ref()));
    view
}

/// Per-target reconnect/auth/push loop, run on its own thread so one stalled
/// uplink never delays another or the local tick (§5).
pub struct UplinkWorker {
    handle: Option<JoinHandle<()>>,
    shutdown: SyncSender<()>,
    status: Arc<SharedStatus>,
    push: SyncSender<Arc<PushMessage>>,
}

impl UplinkWorker {
    pub fn spawn(target: UplinkTarget, token: String, transport: Arc<dyn UplinkTransport>) -> Self {
        let (shutdown_tx, shutdown_rx) = sync_channel::<()>(0);
        let (push_tx, push_rx) = sync_channel::<Arc<PushMessage>>(4);
        let status = Arc::new(SharedStatus { status: Mutex::new(UplinkStatus::Connecting) });
        let status_worker = status.clone();

        let handle = std::thread::Builder::new()
            .name(format!("uplink-{}", target.pylon_id))
            .spawn(move || run_uplink_loop(target, token, transport, shutdown_rx, push_rx, status_worker))
            .expect("spawn uplink worker thread");

        Self { handle: Some(handle), shutdown: shutdown_tx, status, push: push_tx }
    }

    pub fn status(&self) -> UplinkStatus {
        *self.status.status.lock().unwrap()
    }

    /// Offer the latest Snapshot to this target; dropped silently if the
    /// worker's mailbox is already full (it'll pick up the next one).
    pub fn offer(&self, message: Arc<PushMessage>) {
        let _ = self.push.try_send(message);
    }

    pub fn shutdown(mut self) {
        let _ = self.shutdown.try_send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for UplinkWorker {
    fn drop(&mut self) {
        let _ = self.shutdown.try_send(());
    }
}

fn run_uplink_loop(
    target: UplinkTarget,
    token: String,
    transport: Arc<dyn UplinkTransport>,
    shutdown: Receiver<()>,
    push: Receiver<Arc<PushMessage>>,
    status: Arc<SharedStatus>,
) {
    let mut backoff = BACKOFF_INITIAL;
    let mut last_sent: Option<String> = None;
    let mut last_heartbeat = std::time::Instant::now();

    loop {
        if shutdown.try_recv().is_ok() {
            *status.status.lock().unwrap() = UplinkStatus::Disconnected;
            return;
        }

        *status.status.lock().unwrap() = UplinkStatus::Connecting;
        let mut conn = match transport.connect(&target.ws_url) {
            Ok(conn) => conn,
            Err(err) => {
                tracing::warn!(pylon = %target.pylon_id, error = %err, "uplink connect failed, backing off");
                *status.status.lock().unwrap() = UplinkStatus::Disconnected;
                if shutdown.recv_timeout(backoff).is_ok() {
                    return;
                }
                backoff = (backoff * 2).min(BACKOFF_MAX);
                continue;
            }
        };

        if conn
            .send(&UplinkClientMessage::Auth { token: token.clone(), pylon_id: target.pylon_id.clone() })
            .is_err()
        {
            *status.status.lock().unwrap() = UplinkStatus::Disconnected;
            if shutdown.recv_timeout(backoff).is_ok() {
                return;
            }
            backoff = (backoff * 2).min(BACKOFF_MAX);
            continue;
        }

        match conn.recv(RECV_POLL) {
            Ok(Some(UplinkServerMessage::AuthOk { operator_id })) => {
                tracing::info!(pylon = %target.pylon_id, operator_id, "uplink authenticated");
                *status.status.lock().unwrap() = UplinkStatus::Connected;
                backoff = BACKOFF_INITIAL;
            }
            Ok(Some(UplinkServerMessage::AuthError { reason })) => {
                tracing::warn!(pylon = %target.pylon_id, reason, "uplink auth rejected");
                *status.status.lock().unwrap() = UplinkStatus::Disconnected;
                if shutdown.recv_timeout(backoff).is_ok() {
                    return;
                }
                backoff = (backoff * 2).min(BACKOFF_MAX);
                continue;
            }
            _ => {
                *status.status.lock().unwrap() = UplinkStatus::Disconnected;
                if shutdown.recv_timeout(backoff).is_ok() {
                    return;
                }
                backoff = (backoff * 2).min(BACKOFF_MAX);
                continue;
            }
        }

        // Connected: drain pushed snapshots and send heartbeats until the
        // connection drops or we're told to shut down.
        loop {
            if shutdown.try_recv().is_ok() {
                *status.status.lock().unwrap() = UplinkStatus::Disconnected;
                return;
            }

            match push.recv_timeout(RECV_POLL) {
                Ok(message) => {
                    let view = filtered_view(&message.snapshot, &target.projects);
                    let serialized = serde_json::to_string(&view).unwrap_or_default();
                    if last_sent.as_deref() != Some(serialized.as_str()) {
                        if conn.send(&UplinkClientMessage::StateUpdate { state: view }).is_err() {
                            break;
                        }
                        last_sent = Some(serialized);
                    }
                }
                Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {}
                Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
                    *status.status.lock().unwrap() = UplinkStatus::Disconnected;
                    return;
                }
            }

            if last_heartbeat.elapsed() >= HEARTBEAT_INTERVAL {
                if conn.send(&UplinkClientMessage::Heartbeat).is_err() {
                    break;
                }
                last_heartbeat = std::time::Instant::now();
            }

            // Any successful receive resets backoff, per §4.10.
            if let Ok(Some(_)) = conn.recv(Duration::from_millis(10)) {
                backoff = BACKOFF_INITIAL;
            }
        }

        *status.status.lock().unwrap() = UplinkStatus::Disconnected;
        if shutdown.recv_timeout(backoff).is_ok() {
            return;
        }
        backoff = (backoff * 2).min(BACKOFF_MAX);
    }
}

/// Owns every configured uplink's worker thread and fans a freshly published
/// Snapshot out to all of them.
pub struct UplinkManager {
    workers: HashMap<String, UplinkWorker>,
}

impl Default for UplinkManager {
    fn default() -> Self {
        Self::new()
    }
}

impl UplinkManager {
    pub fn new() -> Self {
        Self { workers: HashMap::new() }
    }

    pub fn set_targets(
        &mut self,
        targets: Vec<(UplinkTarget, String)>,
        transport: Arc<dyn UplinkTransport>,
    ) {
        let wanted: std::collections::HashSet<String> =
            targets.iter().map(|(t, _)| t.pylon_id.clone()).collect();
        self.workers.retain(|id, _| wanted.contains(id));

        for (target, token) in targets {
            self.workers
                .entry(target.pylon_id.clone())
                .or_insert_with(|| UplinkWorker::spawn(target, token, transport.clone()));
        }
    }

    pub fn offer(&self, message: &Arc<PushMessage>) {
        for worker in self.workers.values() {
            worker.offer(message.clone());
        }
    }

    pub fn statuses(&self) -> Vec<(String, UplinkStatus)> {
        self.workers.iter().map(|(id, w)| (id.clone(), w.status())).collect()
    }

    pub fn shutdown_all(&mut self) {
        for (_, worker) in self.workers.drain() {
            worker.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use obscope_types::{Snapshot, SnapshotSummary};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn empty_snapshot() -> Snapshot {
        Snapshot {
            operators: vec![],
            agents: vec![],
            workstreams: vec![],
            collisions: vec![],
            feed: vec![],
            summary: SnapshotSummary::default(),
        }
    }

    #[test]
    fn publish_is_idempotent_for_identical_snapshots() {
        let mut bus = SnapshotBus::new();
        let now = Utc::now();
        let first = bus.publish(&empty_snapshot(), now);
        assert!(first.is_some());
        let second = bus.publish(&empty_snapshot(), now);
        assert!(second.is_none(), "identical snapshot must not re-push");
    }

    #[test]
    fn subscriber_receives_current_snapshot_on_attach() {
        let mut bus = SnapshotBus::new();
        bus.publish(&empty_snapshot(), Utc::now()).unwrap();
        let rx = bus.subscribe();
        let received = rx.try_recv().expect("subscriber should see current snapshot immediately");
        assert_eq!(received.id, "1");
    }

    #[test]
    fn message_ids_increase_monotonically() {
        let mut bus = SnapshotBus::new();
        let mut snap = empty_snapshot();
        let first = bus.publish(&snap, Utc::now()).unwrap();
        snap.summary.active_count = 1;
        let second = bus.publish(&snap, Utc::now()).unwrap();
        assert_eq!(first.id, "1");
        assert_eq!(second.id, "2");
    }

    #[test]
    fn slow_subscriber_is_dropped_not_blocked() {
        let mut bus = SnapshotBus::new();
        let rx = bus.subscribe();
        let mut snap = empty_snapshot();
        for i in 0..(SUBSCRIBER_CHANNEL_DEPTH + 5) {
            snap.summary.active_count = i as u32;
            bus.publish(&snap, Utc::now());
        }
        assert_eq!(bus.subscriber_count(), 0, "mailbox-full subscriber must be dropped");
        drop(rx);
    }

    struct MockConnection {
        sent: Arc<Mutex<Vec<UplinkClientMessage>>>,
        auth_ok: bool,
    }

    impl UplinkConnection for MockConnection {
        fn send(&mut self, message: &UplinkClientMessage) -> UplinkResult<()> {
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }

        fn recv(&mut self, _timeout: Duration) -> UplinkResult<Option<UplinkServerMessage>> {
            if matches!(self.sent.lock().unwrap().last(), Some(UplinkClientMessage::Auth { .. })) {
                return Ok(Some(if self.auth_ok {
                    UplinkServerMessage::AuthOk { operator_id: "self".to_string() }
                } else {
                    UplinkServerMessage::AuthError { reason: "bad token".to_string() }
                }));
            }
            Ok(None)
        }
    }

    struct MockTransport {
        sent: Arc<Mutex<Vec<UplinkClientMessage>>>,
        attempts: Arc<AtomicUsize>,
        auth_ok: bool,
    }

    impl UplinkTransport for MockTransport {
        fn connect(&self, _ws_url: &str) -> UplinkResult<Box<dyn UplinkConnection>> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(MockConnection { sent: self.sent.clone(), auth_ok: self.auth_ok }))
        }
    }

    fn target(id: &str) -> UplinkTarget {
        UplinkTarget {
            pylon_id: id.to_string(),
            pylon_name: "team".to_string(),
            ws_url: "wss://example/ws".to_string(),
            token: Some("tok".to_string()),
            token_enc: None,
            refresh_token: None,
            refresh_token_enc: None,
            projects: vec![],
            added_at: Utc::now(),
        }
    }

    #[test]
    fn worker_authenticates_and_reports_connected() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let attempts = Arc::new(AtomicUsize::new(0));
        let transport = Arc::new(MockTransport { sent: sent.clone(), attempts, auth_ok: true });
        let worker = UplinkWorker::spawn(target("p1"), "tok".to_string(), transport);

        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while worker.status() != UplinkStatus::Connected && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(worker.status(), UplinkStatus::Connected);
        worker.shutdown();

        let messages = sent.lock().unwrap();
        assert!(matches!(messages[0], UplinkClientMessage::Auth { .. }));
    }

    #[test]
    fn worker_disconnects_on_auth_error() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let attempts = Arc::new(AtomicUsize::new(0));
        let transport = Arc::new(MockTransport { sent, attempts, auth_ok: false });
        let worker = UplinkWorker::spawn(target("p2"), "tok".to_string(), transport);

        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(worker.status(), UplinkStatus::Disconnected);
        worker.shutdown();
    }

    #[test]
    fn filtered_view_drops_other_projects() {
        let mut snap = empty_snapshot();
        snap.workstreams.push(obscope_types::Workstream {
            project_path: "/a".into(),
            agent_session_ids: vec![],
            completion_pct: 0.0,
            risk: obscope_types::RiskLevel::Nominal,
        });
        snap.workstreams.push(obscope_types::Workstream {
            project_path: "/b".into(),
            agent_session_ids: vec![],
            completion_pct: 0.0,
            risk: obscope_types::RiskLevel::Nominal,
        });

        let view = filtered_view(&snap, &["/a".to_string()]);
        assert_eq!(view.workstreams.len(), 1);
        assert_eq!(view.workstreams[0].project_path, std::path::PathBuf::from("/a"));
    }
}
