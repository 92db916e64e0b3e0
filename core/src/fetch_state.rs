//! Observable load/error/refresh state around an async fetch.
//!
//! # Design
//! A `FetchHook` owns one supplier (`Fn() -> Future<Output = Result<T, _>>`)
//! and publishes a `FetchState<T>` snapshot through a `tokio::sync::watch`
//! channel. Screens render from the snapshot, call `on_refresh` for
//! pull-to-refresh and `on_focus` whenever they become visible again.
//!
//! Every fetch takes a sequence number. Only the latest fetch may write its
//! result or clear `loading`/`refreshing`; anything that resolves after a
//! newer fetch was issued is dropped. Flags are cleared by a drop guard, so
//! they settle even if the fetch future is cancelled.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, error};

use crate::alert::{LogNotifier, Notifier, ERROR_TITLE};
use crate::error::ApiError;
use crate::mutation::{run_mutation, MutationError, MutationKind};

/// Message stored in `FetchState::error` and alerted when a fetch fails.
pub const FETCH_FAILED_MESSAGE: &str = "Could not load data.";

type SupplierFuture<T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send>>;
type Supplier<T> = Arc<dyn Fn() -> SupplierFuture<T> + Send + Sync>;

/// Snapshot handed to the screen.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchState<T> {
    pub data: Option<T>,
    /// True only until the first fetch settles.
    pub loading: bool,
    pub error: Option<String>,
    pub refreshing: bool,
    /// Whether any fetch has been issued yet.
    pub started: bool,
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: true,
            error: None,
            refreshing: false,
            started: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Ready,
    Errored,
    Refreshing,
}

impl<T> FetchState<T> {
    pub fn phase(&self) -> Phase {
        if !self.started {
            Phase::Idle
        } else if self.refreshing {
            Phase::Refreshing
        } else if self.error.is_some() {
            Phase::Errored
        } else if self.loading || self.data.is_none() {
            Phase::Loading
        } else {
            Phase::Ready
        }
    }
}

/// When a focus event should trigger a refetch.
///
/// The default refetches on every focus. `min_interval` suppresses a focus
/// refetch if any fetch started more recently than that.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FocusPolicy {
    pub min_interval: Option<Duration>,
}

impl FocusPolicy {
    pub fn always() -> Self {
        Self::default()
    }

    pub fn throttled(min_interval: Duration) -> Self {
        Self {
            min_interval: Some(min_interval),
        }
    }
}

struct HookInner<T> {
    supplier: Supplier<T>,
    state: watch::Sender<FetchState<T>>,
    issued: AtomicU64,
    last_started: Mutex<Option<Instant>>,
    notifier: Arc<dyn Notifier>,
    focus: FocusPolicy,
    failure_message: String,
}

impl<T> HookInner<T> {
    fn is_latest(&self, seq: u64) -> bool {
        self.issued.load(Ordering::SeqCst) == seq
    }
}

/// Clears `loading` and `refreshing` when the owning fetch ends, however it
/// ends, provided no newer fetch has been issued.
struct Settle<'a, T> {
    inner: &'a HookInner<T>,
    seq: u64,
}

impl<T> Drop for Settle<'_, T> {
    fn drop(&mut self) {
        if !self.inner.is_latest(self.seq) {
            return;
        }
        self.inner.state.send_if_modified(|state| {
            let changed = state.loading || state.refreshing;
            state.loading = false;
            state.refreshing = false;
            changed
        });
    }
}

pub struct FetchHookBuilder<T> {
    supplier: Supplier<T>,
    notifier: Arc<dyn Notifier>,
    focus: FocusPolicy,
    failure_message: String,
}

impl<T: Clone + Send + Sync + 'static> FetchHookBuilder<T> {
    pub fn notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Arc::new(notifier);
        self
    }

    pub fn focus_policy(mut self, focus: FocusPolicy) -> Self {
        self.focus = focus;
        self
    }

    /// Replace `FETCH_FAILED_MESSAGE` for this hook.
    pub fn failure_message(mut self, message: impl Into<String>) -> Self {
        self.failure_message = message.into();
        self
    }

    pub fn build(self) -> FetchHook<T> {
        let (state, _) = watch::channel(FetchState::default());
        FetchHook {
            inner: Arc::new(HookInner {
                supplier: self.supplier,
                state,
                issued: AtomicU64::new(0),
                last_started: Mutex::new(None),
                notifier: self.notifier,
                focus: self.focus,
                failure_message: self.failure_message,
            }),
        }
    }
}

/// Shared handle to one screen's fetch state. Clones observe and drive the
/// same state.
pub struct FetchHook<T> {
    inner: Arc<HookInner<T>>,
}

impl<T> Clone for FetchHook<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> FetchHook<T> {
    pub fn new<F, Fut>(supplier: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        Self::builder(supplier).build()
    }

    pub fn builder<F, Fut>(supplier: F) -> FetchHookBuilder<T>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        FetchHookBuilder {
            supplier: Arc::new(move || Box::pin(supplier()) as SupplierFuture<T>),
            notifier: Arc::new(LogNotifier),
            focus: FocusPolicy::default(),
            failure_message: FETCH_FAILED_MESSAGE.to_string(),
        }
    }

    pub fn state(&self) -> FetchState<T> {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FetchState<T>> {
        self.inner.state.subscribe()
    }

    /// Run the supplier once and publish its outcome.
    ///
    /// A failure keeps whatever `data` was already loaded.
    pub async fn fetch(&self) {
        let inner = &*self.inner;
        let seq = inner.issued.fetch_add(1, Ordering::SeqCst) + 1;
        *inner.last_started.lock().unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());
        inner.state.send_modify(|state| {
            state.error = None;
            state.started = true;
        });

        let _settle = Settle { inner, seq };
        let outcome = (inner.supplier)().await;

        if !inner.is_latest(seq) {
            debug!(seq, "discarding stale fetch result");
            return;
        }

        match outcome {
            Ok(data) => inner.state.send_modify(|state| {
                state.data = Some(data);
                state.error = None;
            }),
            Err(err) => {
                error!(seq, error = %err, "fetch failed");
                inner.state.send_modify(|state| {
                    state.error = Some(inner.failure_message.clone());
                });
                inner.notifier.alert(ERROR_TITLE, &inner.failure_message);
            }
        }
    }

    /// Pull-to-refresh: mark `refreshing`, then fetch.
    pub async fn on_refresh(&self) {
        self.inner.state.send_modify(|state| state.refreshing = true);
        self.fetch().await;
    }

    /// The owning screen became visible. Returns whether a fetch ran.
    pub async fn on_focus(&self) -> bool {
        if let Some(min_interval) = self.inner.focus.min_interval {
            let last = *self.inner.last_started.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(last) = last {
                if last.elapsed() < min_interval {
                    debug!(?min_interval, "skipping focus refetch");
                    return false;
                }
            }
        }
        self.fetch().await;
        true
    }

    /// Run a write through `run_mutation` with this hook's notifier, then
    /// refresh so the screen shows the server's view.
    pub async fn apply<M, F>(&self, kind: MutationKind, write: F) -> Result<M, MutationError>
    where
        F: Future<Output = Result<M, ApiError>>,
    {
        let value = run_mutation(self.inner.notifier.as_ref(), kind, write).await?;
        self.on_refresh().await;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;

    use tokio::sync::{mpsc, oneshot};

    use super::*;
    use crate::alert::tests::RecordingNotifier;

    fn server_error() -> ApiError {
        ApiError::Request {
            endpoint: "/courses".to_string(),
            status: 500,
            detail: "boom".to_string(),
        }
    }

    /// Hook whose supplier pops scripted outcomes and counts calls.
    fn scripted(
        outcomes: Vec<Result<u32, ApiError>>,
    ) -> (FetchHook<u32>, RecordingNotifier, Arc<AtomicUsize>) {
        let outcomes = Arc::new(Mutex::new(VecDeque::from(outcomes)));
        let calls = Arc::new(AtomicUsize::new(0));
        let notifier = RecordingNotifier::default();
        let hook = {
            let calls = calls.clone();
            FetchHook::builder(move || {
                calls.fetch_add(1, Ordering::SeqCst);
                let next = outcomes.lock().unwrap().pop_front();
                async move { next.unwrap_or(Ok(0)) }
            })
            .notifier(notifier.clone())
            .build()
        };
        (hook, notifier, calls)
    }

    type Gate = oneshot::Sender<Result<u32, ApiError>>;

    /// Hook whose every fetch waits until the test resolves its gate.
    fn gated() -> (FetchHook<u32>, mpsc::UnboundedReceiver<Gate>) {
        let (gates_tx, gates_rx) = mpsc::unbounded_channel();
        let hook = FetchHook::new(move || {
            let (tx, rx) = oneshot::channel();
            let _ = gates_tx.send(tx);
            async move {
                rx.await
                    .unwrap_or_else(|_| Err(ApiError::Config("gate dropped".to_string())))
            }
        });
        (hook, gates_rx)
    }

    #[test]
    fn initial_state_is_loading_without_data() {
        let (hook, _, calls) = scripted(vec![]);
        let state = hook.state();
        assert!(state.loading);
        assert!(!state.refreshing);
        assert!(state.data.is_none());
        assert!(state.error.is_none());
        assert_eq!(state.phase(), Phase::Idle);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn successful_fetch_is_ready() {
        let (hook, notifier, _) = scripted(vec![Ok(7)]);
        hook.fetch().await;
        let state = hook.state();
        assert_eq!(state.data, Some(7));
        assert!(!state.loading);
        assert_eq!(state.phase(), Phase::Ready);
        assert!(notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn failure_keeps_stale_data_and_alerts() {
        let (hook, notifier, _) = scripted(vec![Ok(7), Err(server_error())]);
        hook.fetch().await;
        hook.fetch().await;

        let state = hook.state();
        assert_eq!(state.data, Some(7));
        assert_eq!(state.error.as_deref(), Some(FETCH_FAILED_MESSAGE));
        assert_eq!(state.phase(), Phase::Errored);
        assert_eq!(notifier.messages(), vec![FETCH_FAILED_MESSAGE.to_string()]);
    }

    #[tokio::test]
    async fn first_fetch_failure_leaves_data_empty() {
        let (hook, _, _) = scripted(vec![Err(server_error())]);
        hook.fetch().await;
        let state = hook.state();
        assert!(state.data.is_none());
        assert!(!state.loading);
        assert_eq!(state.phase(), Phase::Errored);
    }

    #[tokio::test]
    async fn refocus_after_failed_first_fetch_is_loading() {
        let (hook, mut gates) = gated();

        let first = tokio::spawn({
            let hook = hook.clone();
            async move { hook.fetch().await }
        });
        gates.recv().await.unwrap().send(Err(server_error())).unwrap();
        first.await.unwrap();
        assert_eq!(hook.state().phase(), Phase::Errored);

        let again = tokio::spawn({
            let hook = hook.clone();
            async move { hook.on_focus().await }
        });
        let gate = gates.recv().await.unwrap();
        let state = hook.state();
        assert!(state.data.is_none());
        assert!(state.error.is_none());
        assert_eq!(state.phase(), Phase::Loading);

        gate.send(Ok(5)).unwrap();
        assert!(again.await.unwrap());
        let state = hook.state();
        assert_eq!(state.data, Some(5));
        assert_eq!(state.phase(), Phase::Ready);
    }

    #[tokio::test]
    async fn next_success_clears_error() {
        let (hook, _, _) = scripted(vec![Err(server_error()), Ok(3)]);
        hook.fetch().await;
        hook.on_refresh().await;
        let state = hook.state();
        assert_eq!(state.data, Some(3));
        assert!(state.error.is_none());
        assert!(!state.refreshing);
    }

    #[tokio::test]
    async fn custom_failure_message_is_used() {
        let notifier = RecordingNotifier::default();
        let hook = FetchHook::builder(|| async { Err::<u32, _>(server_error()) })
            .notifier(notifier.clone())
            .failure_message("Could not load courses.")
            .build();
        hook.fetch().await;
        assert_eq!(hook.state().error.as_deref(), Some("Could not load courses."));
        assert_eq!(notifier.messages(), vec!["Could not load courses.".to_string()]);
    }

    #[tokio::test]
    async fn refresh_keeps_data_visible_while_in_flight() {
        let (hook, mut gates) = gated();

        let first = tokio::spawn({
            let hook = hook.clone();
            async move { hook.fetch().await }
        });
        gates.recv().await.unwrap().send(Ok(1)).unwrap();
        first.await.unwrap();

        let refresh = tokio::spawn({
            let hook = hook.clone();
            async move { hook.on_refresh().await }
        });
        let gate = gates.recv().await.unwrap();
        let state = hook.state();
        assert!(state.refreshing);
        assert_eq!(state.data, Some(1));
        assert_eq!(state.phase(), Phase::Refreshing);

        gate.send(Ok(2)).unwrap();
        refresh.await.unwrap();
        let state = hook.state();
        assert!(!state.refreshing);
        assert_eq!(state.data, Some(2));
    }

    #[tokio::test]
    async fn overlapping_refreshes_keep_latest_when_it_resolves_last() {
        let (hook, mut gates) = gated();
        let spawn_refresh = |hook: &FetchHook<u32>| {
            let hook = hook.clone();
            tokio::spawn(async move { hook.on_refresh().await })
        };

        let older = spawn_refresh(&hook);
        let older_gate = gates.recv().await.unwrap();
        let newer = spawn_refresh(&hook);
        let newer_gate = gates.recv().await.unwrap();

        older_gate.send(Ok(1)).unwrap();
        older.await.unwrap();
        let state = hook.state();
        assert!(state.data.is_none(), "stale result must be discarded");
        assert!(state.refreshing, "newer fetch still in flight");

        newer_gate.send(Ok(2)).unwrap();
        newer.await.unwrap();
        let state = hook.state();
        assert_eq!(state.data, Some(2));
        assert!(!state.refreshing);
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn overlapping_refreshes_ignore_late_stale_failure() {
        let (hook, mut gates) = gated();

        let older = tokio::spawn({
            let hook = hook.clone();
            async move { hook.on_refresh().await }
        });
        let older_gate = gates.recv().await.unwrap();
        let newer = tokio::spawn({
            let hook = hook.clone();
            async move { hook.on_refresh().await }
        });
        let newer_gate = gates.recv().await.unwrap();

        newer_gate.send(Ok(2)).unwrap();
        newer.await.unwrap();
        older_gate.send(Err(server_error())).unwrap();
        older.await.unwrap();

        let state = hook.state();
        assert_eq!(state.data, Some(2));
        assert!(state.error.is_none());
        assert!(!state.refreshing);
    }

    #[tokio::test]
    async fn cancelled_fetch_still_settles_flags() {
        let (hook, mut gates) = gated();
        let refresh = tokio::spawn({
            let hook = hook.clone();
            async move { hook.on_refresh().await }
        });
        let _gate = gates.recv().await.unwrap();
        assert!(hook.state().refreshing);

        refresh.abort();
        let _ = refresh.await;

        let state = hook.state();
        assert!(!state.refreshing);
        assert!(!state.loading);
        assert!(state.data.is_none());
    }

    #[tokio::test]
    async fn focus_refetches_every_time_by_default() {
        let (hook, _, calls) = scripted(vec![Ok(1), Ok(2), Ok(3)]);
        assert!(hook.on_focus().await);
        assert!(hook.on_focus().await);
        assert!(hook.on_focus().await);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(hook.state().data, Some(3));
    }

    #[tokio::test]
    async fn focus_with_data_does_not_reset_loading() {
        let (hook, mut gates) = gated();
        let first = tokio::spawn({
            let hook = hook.clone();
            async move { hook.on_focus().await }
        });
        gates.recv().await.unwrap().send(Ok(1)).unwrap();
        first.await.unwrap();

        let again = tokio::spawn({
            let hook = hook.clone();
            async move { hook.on_focus().await }
        });
        let gate = gates.recv().await.unwrap();
        let state = hook.state();
        assert!(!state.loading);
        assert!(!state.refreshing);
        assert_eq!(state.phase(), Phase::Ready);

        gate.send(Ok(2)).unwrap();
        assert!(again.await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn throttled_focus_skips_recent_fetches() {
        let calls = Arc::new(AtomicUsize::new(0));
        let hook = {
            let calls = calls.clone();
            FetchHook::builder(move || {
                let n = calls.fetch_add(1, Ordering::SeqCst) as u32;
                async move { Ok(n) }
            })
            .focus_policy(FocusPolicy::throttled(Duration::from_secs(30)))
            .build()
        };

        assert!(hook.on_focus().await);
        assert!(!hook.on_focus().await);
        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(hook.on_focus().await);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn subscribers_see_published_state() {
        let (hook, _, _) = scripted(vec![Ok(9)]);
        let mut rx = hook.subscribe();
        hook.fetch().await;
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().data, Some(9));
    }

    #[tokio::test]
    async fn apply_refreshes_after_successful_write() {
        let (hook, notifier, calls) = scripted(vec![Ok(1), Ok(2)]);
        hook.fetch().await;

        let saved = hook
            .apply(MutationKind::Save, async { Ok::<_, ApiError>("c1") })
            .await
            .unwrap();
        assert_eq!(saved, "c1");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(hook.state().data, Some(2));
        assert!(notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn apply_failure_alerts_and_skips_refresh() {
        let (hook, notifier, calls) = scripted(vec![Ok(1)]);
        hook.fetch().await;

        let err = hook
            .apply(MutationKind::Delete, async { Err::<(), _>(server_error()) })
            .await
            .unwrap_err();
        assert_eq!(err.kind, MutationKind::Delete);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(hook.state().data, Some(1));
        assert_eq!(notifier.messages(), vec!["Could not delete.".to_string()]);
    }
}
