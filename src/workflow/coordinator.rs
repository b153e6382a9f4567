// src/workflow/coordinator.rs
//! Drives the select → process flow and is the only writer of the [`StatusStore`].
//!
//! ```text
//! Idle ─select─▶ FileSelected ─process─▶ Processing ─┬─▶ Succeeded ─select─▶ FileSelected
//!                                                    └─▶ Failed    ─select─▶ FileSelected
//! ```
//!
//! The progress subscription and the loading flag are held by a [`ProcessingScope`] guard, so
//! both are released exactly once on every exit path, including a panicking backend call.

use bevy::log::{debug, error, info, warn};
use bevy::prelude::Resource;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use super::error::WorkflowError;
use super::event_bus::Subscription;
use super::gateway::{BackendGateway, ProgressHandler};
use super::models::{ItemMeta, PreviewTable, ProgressEvent, SelectedFile, StatusInfo};
use super::status_store::StatusStore;
use crate::export;
use crate::paths;

pub const DEFAULT_STATUS_RESET: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkflowPhase {
    #[default]
    Idle,
    FileSelected,
    Processing,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectOutcome {
    Selected(SelectedFile),
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// No file selected; the gateway was not called.
    Rejected,
    Succeeded { items: usize },
    Failed(WorkflowError),
    /// The selection changed while the call was in flight; its result was dropped.
    Superseded,
}

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Used to shorten displayed paths to `~/...`.
    pub home: Option<PathBuf>,
    /// How long a flashed status stays before falling back to "done".
    pub status_reset: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            home: paths::home_dir(),
            status_reset: DEFAULT_STATUS_RESET,
        }
    }
}

#[derive(Debug, Default)]
struct CoordinatorState {
    selected: Option<SelectedFile>,
    phase: WorkflowPhase,
    /// Bumped by every selection; in-flight attempts compare against it.
    selection_generation: u64,
}

struct Inner {
    gateway: Arc<dyn BackendGateway>,
    store: StatusStore,
    config: CoordinatorConfig,
    state: Mutex<CoordinatorState>,
    next_attempt: AtomicU64,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, CoordinatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.state().selection_generation == generation
    }
}

#[derive(Resource, Clone)]
pub struct WorkflowCoordinator {
    inner: Arc<Inner>,
}

impl WorkflowCoordinator {
    pub fn new(
        gateway: Arc<dyn BackendGateway>,
        store: StatusStore,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                gateway,
                store,
                config,
                state: Mutex::new(CoordinatorState::default()),
                next_attempt: AtomicU64::new(0),
            }),
        }
    }

    pub fn store(&self) -> &StatusStore {
        &self.inner.store
    }

    pub fn selected_file(&self) -> Option<SelectedFile> {
        self.inner.state().selected.clone()
    }

    pub fn phase(&self) -> WorkflowPhase {
        self.inner.state().phase
    }

    fn set_phase(&self, phase: WorkflowPhase) {
        self.inner.state().phase = phase;
    }

    /// Ask the gateway for a file. A dismissed picker changes nothing.
    pub async fn select_file(&self) -> SelectOutcome {
        match self.inner.gateway.select_file().await {
            Some(path) => SelectOutcome::Selected(self.select_path(path)),
            None => {
                info!("File selection cancelled");
                SelectOutcome::Cancelled
            }
        }
    }

    /// Make `path` the current selection, dropping results that belonged to the previous one.
    pub fn select_path(&self, path: PathBuf) -> SelectedFile {
        let file = SelectedFile {
            display_name: paths::display_name(&path),
            display_path: paths::trim_home_path(&path, self.inner.config.home.as_deref()),
            absolute_path: path,
        };
        {
            let mut state = self.inner.state();
            state.selected = Some(file.clone());
            state.selection_generation += 1;
            state.phase = WorkflowPhase::FileSelected;
        }

        let store = &self.inner.store;
        store.clear_item_metadata();
        store.clear_preview();
        store.set(StatusInfo::ready());
        info!("Selected source file {:?}", file.absolute_path);
        file
    }

    /// Run the backend on the selected file. Every failure ends up in the status line;
    /// nothing is returned as `Err`.
    pub async fn process_selected_file(&self) -> ProcessOutcome {
        let store = &self.inner.store;
        let (file, generation) = {
            let state = self.inner.state();
            (state.selected.clone(), state.selection_generation)
        };
        let Some(file) = file else {
            warn!("Processing requested before a file was selected");
            store.set(StatusInfo::error(WorkflowError::Precondition.user_message()));
            return ProcessOutcome::Rejected;
        };

        let attempt = self.inner.next_attempt.fetch_add(1, Ordering::Relaxed) + 1;
        info!("Attempt {}: processing {:?}", attempt, file.absolute_path);
        self.set_phase(WorkflowPhase::Processing);

        let mut scope = ProcessingScope::enter(store.clone(), attempt);
        let previous_items = store.item_metadata();
        store.clear_item_metadata();
        store.set(StatusInfo::processing());

        let progress = Arc::downgrade(&self.inner);
        let handler: ProgressHandler =
            Box::new(move |event| apply_progress(&progress, attempt, generation, event));
        let result = match self.inner.gateway.subscribe_progress(handler) {
            Ok(subscription) => {
                scope.hold(subscription);
                self.call_backend(file.absolute_path.clone()).await
            }
            Err(e) => Err(WorkflowError::Unexpected(format!(
                "could not subscribe to progress events: {}",
                e
            ))),
        };

        let outcome = if !self.inner.is_current(generation) {
            info!(
                "Attempt {}: selection changed while processing, dropping the result",
                attempt
            );
            ProcessOutcome::Superseded
        } else {
            match result {
                Ok(items) => {
                    let count = items.len();
                    store.set_item_metadata(items);
                    store.clear_preview();
                    store.set(StatusInfo::done());
                    self.set_phase(WorkflowPhase::Succeeded);
                    info!("Attempt {}: done, {} item(s)", attempt, count);
                    ProcessOutcome::Succeeded { items: count }
                }
                Err(err) => {
                    error!("Attempt {}: {}", attempt, err);
                    store.set_item_metadata(previous_items);
                    store.set(StatusInfo::error(err.user_message()));
                    self.set_phase(WorkflowPhase::Failed);
                    ProcessOutcome::Failed(err)
                }
            }
        };

        scope.exit();
        outcome
    }

    // Runs the call on its own task so a panicking gateway surfaces as an error here.
    async fn call_backend(&self, path: PathBuf) -> Result<Vec<ItemMeta>, WorkflowError> {
        let gateway = Arc::clone(&self.inner.gateway);
        match tokio::spawn(async move { gateway.process_file(&path).await }).await {
            Ok(result) => result,
            Err(join_err) if join_err.is_panic() => Err(WorkflowError::Unexpected(
                "backend call panicked".to_string(),
            )),
            Err(join_err) => Err(WorkflowError::Unexpected(join_err.to_string())),
        }
    }

    /// Show `status` now and fall back to "done" after the configured delay,
    /// unless something else has been written in the meantime.
    pub fn flash_status(&self, status: StatusInfo) {
        let store = self.inner.store.clone();
        store.set(status);
        let revision = store.revision();
        let delay = self.inner.config.status_reset;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    if !store.replace_if_unchanged(revision, StatusInfo::done()) {
                        debug!("Flashed status was overwritten; not resetting");
                    }
                });
            }
            Err(_) => debug!("No async runtime available; flashed status will stay"),
        }
    }

    /// Put the table of item `index` into the preview pane.
    pub fn show_preview(&self, index: usize) -> bool {
        let store = &self.inner.store;
        match store.read(|snapshot| snapshot.item_meta.get(index).cloned()) {
            Some(item) => {
                store.set_preview(PreviewTable::from_item(&item));
                true
            }
            None => {
                warn!("No item at index {} to preview", index);
                false
            }
        }
    }

    /// Write the current items into `dir` and flash the outcome.
    pub fn export_results(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let items = self.inner.store.item_metadata();
        if items.is_empty() {
            self.flash_status(StatusInfo::error("nothing to export yet"));
            return Ok(Vec::new());
        }
        match export::save_item_tables(dir, &items) {
            Ok(written) => {
                self.flash_status(StatusInfo::normal(format!(
                    "exported {} table(s) to {}",
                    written.len(),
                    paths::trim_home_path(dir, self.inner.config.home.as_deref())
                )));
                Ok(written)
            }
            Err(e) => {
                error!("Export to {:?} failed: {}", dir, e);
                self.flash_status(StatusInfo::error(format!("export failed: {}", e)));
                Err(e)
            }
        }
    }
}

fn apply_progress(inner: &Weak<Inner>, attempt: u64, generation: u64, event: ProgressEvent) {
    let Some(inner) = inner.upgrade() else {
        return;
    };
    if !inner.is_current(generation) {
        debug!("Attempt {}: ignoring progress '{}' for an old selection", attempt, event.state);
        return;
    }
    debug!("Attempt {}: progress '{}'", attempt, event.state);
    inner.store.set(StatusInfo::normal(event.state));
}

/// Loading flag and progress subscription for one attempt. Released exactly once,
/// either by `exit` or by drop if the attempt is abandoned.
struct ProcessingScope {
    store: StatusStore,
    attempt: u64,
    subscription: Option<Subscription>,
    released: bool,
}

impl ProcessingScope {
    fn enter(store: StatusStore, attempt: u64) -> Self {
        store.set_loading(true);
        Self {
            store,
            attempt,
            subscription: None,
            released: false,
        }
    }

    fn hold(&mut self, subscription: Subscription) {
        self.subscription = Some(subscription);
    }

    fn exit(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Some(subscription) = self.subscription.take() {
            if let Err(e) = subscription.unsubscribe() {
                warn!("Attempt {}: unsubscribe failed: {}", self.attempt, e);
            }
        }
        self.store.set_loading(false);
        debug!("Attempt {}: cleaned up", self.attempt);
    }
}

impl Drop for ProcessingScope {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::event_bus::{EventBus, UPDATE_STATE_EVENT};
    use crate::workflow::gateway::subscribe_update_state;
    use crate::workflow::models::{
        ItemTable, StatusKind, DONE_MESSAGE, NO_FILE_MESSAGE, PROCESSING_MESSAGE,
        PROCESS_FAILED_MESSAGE, READY_MESSAGE,
    };
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;

    enum Reply {
        Items(Vec<ItemMeta>),
        Fail(WorkflowError),
        Panic,
        /// Re-select `path` through the coordinator mid-call, then return items.
        ReselectThenItems(PathBuf, Vec<ItemMeta>),
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Observation {
        loading: bool,
        items: usize,
        status: StatusInfo,
    }

    /// Gateway double: scripted picks, scripted progress, scripted replies.
    #[derive(Default)]
    struct ScriptedGateway {
        bus: EventBus,
        picks: Mutex<VecDeque<Option<PathBuf>>>,
        progress: Mutex<Vec<String>>,
        reply: Mutex<Option<Reply>>,
        fail_subscribe: bool,
        calls: AtomicUsize,
        watched_store: Mutex<Option<StatusStore>>,
        coordinator: Mutex<Option<WorkflowCoordinator>>,
        observed: Mutex<Vec<Observation>>,
    }

    impl ScriptedGateway {
        fn observe(&self) {
            if let Some(store) = self.watched_store.lock().unwrap().as_ref() {
                self.observed.lock().unwrap().push(Observation {
                    loading: store.is_loading(),
                    items: store.item_count(),
                    status: store.get(),
                });
            }
        }
    }

    #[async_trait]
    impl BackendGateway for ScriptedGateway {
        async fn select_file(&self) -> Option<PathBuf> {
            self.picks.lock().unwrap().pop_front().flatten()
        }

        async fn process_file(&self, _path: &Path) -> Result<Vec<ItemMeta>, WorkflowError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.observe();
            let states = self.progress.lock().unwrap().clone();
            for state in states {
                self.bus
                    .emit(UPDATE_STATE_EVENT, &serde_json::json!({ "state": state }));
                self.observe();
            }
            let reply = self.reply.lock().unwrap().take();
            match reply {
                Some(Reply::Items(items)) => Ok(items),
                Some(Reply::Fail(err)) => Err(err),
                Some(Reply::Panic) => panic!("backend exploded"),
                Some(Reply::ReselectThenItems(path, items)) => {
                    let coordinator = self.coordinator.lock().unwrap().clone();
                    if let Some(coordinator) = coordinator {
                        coordinator.select_path(path);
                    }
                    self.bus
                        .emit(UPDATE_STATE_EVENT, &serde_json::json!({ "state": "late" }));
                    Ok(items)
                }
                None => Ok(Vec::new()),
            }
        }

        fn subscribe_progress(
            &self,
            handler: ProgressHandler,
        ) -> Result<Subscription, WorkflowError> {
            if self.fail_subscribe {
                return Err(WorkflowError::Transport("event channel closed".to_string()));
            }
            Ok(subscribe_update_state(&self.bus, handler))
        }
    }

    fn item(code: &str) -> ItemMeta {
        ItemMeta {
            code: code.to_string(),
            size_code: "01".to_string(),
            table: ItemTable {
                head: vec!["尺码".to_string(), "肩宽".to_string()],
                body: vec![vec!["I".to_string(), "42.5cm".to_string()]],
            },
        }
    }

    fn setup(gateway: ScriptedGateway) -> (WorkflowCoordinator, Arc<ScriptedGateway>, StatusStore) {
        let gateway = Arc::new(gateway);
        let store = StatusStore::new();
        *gateway.watched_store.lock().unwrap() = Some(store.clone());
        let coordinator = WorkflowCoordinator::new(
            gateway.clone(),
            store.clone(),
            CoordinatorConfig {
                home: Some(PathBuf::from("/home/u")),
                status_reset: DEFAULT_STATUS_RESET,
            },
        );
        *gateway.coordinator.lock().unwrap() = Some(coordinator.clone());
        (coordinator, gateway, store)
    }

    fn with_picks(picks: Vec<Option<&str>>) -> ScriptedGateway {
        ScriptedGateway {
            picks: Mutex::new(picks.into_iter().map(|p| p.map(PathBuf::from)).collect()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn full_scenario_select_progress_and_success() {
        let gateway = with_picks(vec![Some("/home/u/data.xlsx")]);
        *gateway.reply.lock().unwrap() = Some(Reply::Items(vec![item("OLD1"), item("OLD2")]));
        let (coordinator, gateway, store) = setup(gateway);

        let SelectOutcome::Selected(file) = coordinator.select_file().await else {
            panic!("expected a selection");
        };
        assert_eq!(file.display_path, "~/data.xlsx");
        assert_eq!(file.display_name, "data.xlsx");
        assert_eq!(coordinator.phase(), WorkflowPhase::FileSelected);

        // A first run leaves items behind; the next attempt must start from an empty list.
        coordinator.process_selected_file().await;
        assert_eq!(store.item_count(), 2);
        gateway.observed.lock().unwrap().clear();

        *gateway.progress.lock().unwrap() = vec!["parsing".into(), "writing".into()];
        *gateway.reply.lock().unwrap() = Some(Reply::Items(vec![item("A100")]));
        let outcome = coordinator.process_selected_file().await;
        assert_eq!(outcome, ProcessOutcome::Succeeded { items: 1 });

        let observed = gateway.observed.lock().unwrap().clone();
        assert_eq!(
            observed,
            vec![
                Observation { loading: true, items: 0, status: StatusInfo::normal(PROCESSING_MESSAGE) },
                Observation { loading: true, items: 0, status: StatusInfo::normal("parsing") },
                Observation { loading: true, items: 0, status: StatusInfo::normal("writing") },
            ]
        );
        assert_eq!(store.item_count(), 1);
        assert_eq!(store.get(), StatusInfo::normal(DONE_MESSAGE));
        assert!(!store.is_loading());
        assert_eq!(gateway.bus.subscriber_count(UPDATE_STATE_EVENT), 0);
        assert_eq!(coordinator.phase(), WorkflowPhase::Succeeded);

        // Progress shows up in history strictly before the final "done".
        let messages: Vec<String> = store
            .history()
            .into_iter()
            .map(|entry| entry.status.message)
            .collect();
        assert_eq!(
            messages,
            vec![
                READY_MESSAGE,
                PROCESSING_MESSAGE,
                DONE_MESSAGE,
                PROCESSING_MESSAGE,
                "parsing",
                "writing",
                DONE_MESSAGE,
            ]
        );
    }

    #[tokio::test]
    async fn second_pick_clears_results_and_shows_ready() {
        let gateway = with_picks(vec![Some("/home/u/a.xlsx"), Some("/home/u/b.xlsx")]);
        *gateway.reply.lock().unwrap() = Some(Reply::Items(vec![item("A"), item("B")]));
        let (coordinator, _gateway, store) = setup(gateway);

        coordinator.select_file().await;
        coordinator.process_selected_file().await;
        assert!(coordinator.show_preview(1));
        assert_eq!(store.item_count(), 2);

        let outcome = coordinator.select_file().await;
        assert!(matches!(outcome, SelectOutcome::Selected(ref f) if f.display_name == "b.xlsx"));
        assert_eq!(store.item_count(), 0);
        assert!(store.preview().is_none());
        assert_eq!(store.get(), StatusInfo::ready());
        assert_eq!(coordinator.phase(), WorkflowPhase::FileSelected);
    }

    #[tokio::test]
    async fn processing_without_selection_never_reaches_the_gateway() {
        let (coordinator, gateway, store) = setup(ScriptedGateway::default());

        let outcome = coordinator.process_selected_file().await;

        assert_eq!(outcome, ProcessOutcome::Rejected);
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.get(), StatusInfo::error(NO_FILE_MESSAGE));
        assert!(!store.is_loading());
        assert_eq!(coordinator.phase(), WorkflowPhase::Idle);
    }

    #[tokio::test]
    async fn backend_failure_is_verbatim_and_keeps_previous_items() {
        let gateway = with_picks(vec![Some("/home/u/data.xlsx")]);
        *gateway.reply.lock().unwrap() = Some(Reply::Items(vec![item("A100")]));
        let (coordinator, gateway, store) = setup(gateway);
        coordinator.select_file().await;
        coordinator.process_selected_file().await;
        let before = store.item_metadata();

        *gateway.reply.lock().unwrap() =
            Some(Reply::Fail(WorkflowError::Backend("invalid format".to_string())));
        let outcome = coordinator.process_selected_file().await;

        assert!(matches!(outcome, ProcessOutcome::Failed(WorkflowError::Backend(_))));
        assert_eq!(store.get(), StatusInfo::error("invalid format"));
        assert_eq!(store.item_metadata(), before);
        assert!(!store.is_loading());
        assert_eq!(gateway.bus.subscriber_count(UPDATE_STATE_EVENT), 0);
        assert_eq!(coordinator.phase(), WorkflowPhase::Failed);
    }

    #[tokio::test]
    async fn transport_failure_uses_fallback_text() {
        let gateway = with_picks(vec![Some("/home/u/data.xlsx")]);
        *gateway.progress.lock().unwrap() = vec!["parsing".into()];
        *gateway.reply.lock().unwrap() =
            Some(Reply::Fail(WorkflowError::Transport("broken pipe".to_string())));
        let (coordinator, gateway, store) = setup(gateway);
        coordinator.select_file().await;

        coordinator.process_selected_file().await;

        assert_eq!(store.get().kind, StatusKind::Error);
        assert_eq!(store.get().message, PROCESS_FAILED_MESSAGE);
        assert!(!store.is_loading());
        assert_eq!(gateway.bus.subscriber_count(UPDATE_STATE_EVENT), 0);
    }

    #[tokio::test]
    async fn panicking_backend_still_cleans_up() {
        let gateway = with_picks(vec![Some("/home/u/data.xlsx")]);
        *gateway.reply.lock().unwrap() = Some(Reply::Panic);
        let (coordinator, gateway, store) = setup(gateway);
        coordinator.select_file().await;

        let outcome = coordinator.process_selected_file().await;

        assert!(matches!(outcome, ProcessOutcome::Failed(WorkflowError::Unexpected(_))));
        assert_eq!(store.get(), StatusInfo::error(PROCESS_FAILED_MESSAGE));
        assert!(!store.is_loading());
        assert_eq!(gateway.bus.subscriber_count(UPDATE_STATE_EVENT), 0);
    }

    #[tokio::test]
    async fn subscribe_failure_skips_the_call_and_resets_loading() {
        let gateway = ScriptedGateway {
            fail_subscribe: true,
            ..with_picks(vec![Some("/home/u/data.xlsx")])
        };
        let (coordinator, gateway, store) = setup(gateway);
        coordinator.select_file().await;

        let outcome = coordinator.process_selected_file().await;

        assert!(matches!(outcome, ProcessOutcome::Failed(WorkflowError::Unexpected(_))));
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.get().kind, StatusKind::Error);
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn cancelled_pick_changes_nothing() {
        let gateway = with_picks(vec![Some("/home/u/data.xlsx"), None]);
        *gateway.reply.lock().unwrap() = Some(Reply::Items(vec![item("A100")]));
        let (coordinator, _gateway, store) = setup(gateway);
        coordinator.select_file().await;
        coordinator.process_selected_file().await;
        let revision = store.revision();
        let items = store.item_metadata();
        let selected = coordinator.selected_file();

        assert_eq!(coordinator.select_file().await, SelectOutcome::Cancelled);

        assert_eq!(store.revision(), revision);
        assert_eq!(store.get(), StatusInfo::done());
        assert_eq!(store.item_metadata(), items);
        assert!(!store.is_loading());
        assert_eq!(coordinator.selected_file(), selected);
        assert_eq!(coordinator.phase(), WorkflowPhase::Succeeded);
    }

    #[tokio::test]
    async fn result_of_a_replaced_selection_is_dropped() {
        let gateway = with_picks(vec![Some("/home/u/old.xlsx")]);
        *gateway.reply.lock().unwrap() = Some(Reply::ReselectThenItems(
            PathBuf::from("/home/u/new.xlsx"),
            vec![item("STALE")],
        ));
        let (coordinator, gateway, store) = setup(gateway);
        coordinator.select_file().await;

        let outcome = coordinator.process_selected_file().await;

        assert_eq!(outcome, ProcessOutcome::Superseded);
        assert_eq!(store.item_count(), 0);
        assert_eq!(store.get(), StatusInfo::ready());
        assert!(!store.is_loading());
        assert_eq!(gateway.bus.subscriber_count(UPDATE_STATE_EVENT), 0);
        assert_eq!(
            coordinator.selected_file().map(|f| f.display_name),
            Some("new.xlsx".to_string())
        );
    }

    #[tokio::test]
    async fn programmatic_selection_matches_picker_selection() {
        let (coordinator, _gateway, store) = setup(ScriptedGateway::default());
        let file = coordinator.select_path(PathBuf::from("/srv/in/data.xlsx"));
        assert_eq!(file.display_path, "/srv/in/data.xlsx");
        assert_eq!(store.get(), StatusInfo::ready());
        assert_eq!(coordinator.phase(), WorkflowPhase::FileSelected);
    }

    #[tokio::test(start_paused = true)]
    async fn flashed_status_falls_back_to_done() {
        let (coordinator, _gateway, store) = setup(ScriptedGateway::default());

        coordinator.flash_status(StatusInfo::normal("exported 2 table(s)"));
        assert_eq!(store.get().message, "exported 2 table(s)");

        tokio::time::sleep(DEFAULT_STATUS_RESET + Duration::from_millis(10)).await;
        assert_eq!(store.get(), StatusInfo::done());
    }

    #[tokio::test(start_paused = true)]
    async fn flashed_status_does_not_clobber_newer_status() {
        let (coordinator, _gateway, store) = setup(ScriptedGateway::default());

        coordinator.flash_status(StatusInfo::error("export failed"));
        coordinator.select_path(PathBuf::from("/home/u/next.xlsx"));

        tokio::time::sleep(DEFAULT_STATUS_RESET * 2).await;
        assert_eq!(store.get(), StatusInfo::ready());
    }

    #[tokio::test]
    async fn preview_and_export_use_current_items() {
        let gateway = with_picks(vec![Some("/home/u/data.xlsx")]);
        *gateway.reply.lock().unwrap() = Some(Reply::Items(vec![item("A100"), item("B200")]));
        let (coordinator, _gateway, store) = setup(gateway);
        coordinator.select_file().await;
        coordinator.process_selected_file().await;

        assert!(coordinator.show_preview(0));
        assert_eq!(store.preview().map(|p| p.title), Some("A100 (01)".to_string()));
        assert!(!coordinator.show_preview(9));

        let tmp = tempfile::tempdir().unwrap();
        let written = coordinator.export_results(&tmp.path().join("out")).unwrap();
        assert_eq!(written.len(), 2);
        assert!(store.get().message.starts_with("exported 2 table(s)"));
    }

    #[tokio::test]
    async fn export_without_items_reports_an_error() {
        let (coordinator, _gateway, store) = setup(ScriptedGateway::default());
        let tmp = tempfile::tempdir().unwrap();

        let written = coordinator.export_results(tmp.path()).unwrap();

        assert!(written.is_empty());
        assert_eq!(store.get().kind, StatusKind::Error);
    }
}
