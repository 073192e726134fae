//! # Node View Controller
//!
//! Binds one spreadsheet node to one live widget and keeps the two in sync.
//!
//! Each binding runs as its own task that exclusively owns the widget and the
//! node's attribute host. Everything reaches it as a message: commands from
//! [`NodeViewHandle`]s and change notifications from the widget's hooks.
//!
//! ## Flow
//!
//! ```text
//! mount ──► initial load ──(Loaded | settle delay)──► ready
//!                                                      │
//!   widget change ──► dirty ──next turn──► snapshot ──► debounce ──► commit
//!                                                      ▲
//!   external node update ──(data differs)──► reload ───┘
//! ```
//!
//! A commit writes `{id, title, data}` through the host. Snapshots equal to
//! the last committed data are dropped, so data pushed in by the view never
//! comes back out as a commit.

use crate::config::SyncConfig;
use crate::guards::GuardSet;
use crate::host::AttributeHost;
use crate::widget::{ChangeSource, Widget, WidgetEvent, WidgetHooks};
use crate::EditorError;
use tabula_document::schema::{claims_shortcut, KeyCombo};
use tabula_document::{AttributePatch, CellMatrix, IdGenerator, WidgetAttrs, WidgetSettings};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info_span, warn, Instrument};

#[derive(Debug)]
enum Command {
    TitleBlurred(String),
    NodeUpdated(WidgetAttrs),
    Inspect(oneshot::Sender<ViewState>),
    Destroy,
}

/// Point-in-time view of a binding
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub id: String,
    pub title: String,
    pub guards: GuardSet,
    /// Data last written to, or received from, the document
    pub committed: CellMatrix,
}

impl ViewState {
    /// Header label, `cols × rows`
    pub fn shape_label(&self) -> String {
        self.committed.shape_label()
    }
}

/// Cheap, cloneable way to talk to a running node view
///
/// All methods are fire-and-forget; messages to a torn-down view are dropped.
#[derive(Debug, Clone)]
pub struct NodeViewHandle {
    id: String,
    commands: mpsc::UnboundedSender<Command>,
}

impl NodeViewHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The title field lost focus holding `title`
    pub fn title_blurred(&self, title: impl Into<String>) {
        self.send(Command::TitleBlurred(title.into()));
    }

    /// The host changed the node's attributes, e.g. through undo
    pub fn node_updated(&self, attrs: WidgetAttrs) {
        self.send(Command::NodeUpdated(attrs));
    }

    pub fn destroy(&self) {
        self.send(Command::Destroy);
    }

    /// Whether the node claims `combo` instead of the host editor
    pub fn handle_key(&self, combo: &KeyCombo) -> bool {
        claims_shortcut(combo)
    }

    /// `None` once the view is torn down
    pub async fn state(&self) -> Option<ViewState> {
        let (reply, response) = oneshot::channel();
        self.commands.send(Command::Inspect(reply)).ok()?;
        response.await.ok()
    }

    pub async fn guards(&self) -> Option<GuardSet> {
        self.state().await.map(|state| state.guards)
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!(table_id = %self.id, "Node view already torn down, message dropped");
        }
    }
}

/// A mounted node view; dropping it leaves the view running for other handles
pub struct NodeView {
    handle: NodeViewHandle,
    task: JoinHandle<GuardSet>,
}

impl NodeView {
    /// Bind `widget` to the node described by `attrs`
    ///
    /// A missing id or title is generated and patched through `host` before
    /// this returns. Must be called within a tokio runtime.
    pub fn mount(
        attrs: WidgetAttrs,
        widget: Box<dyn Widget>,
        host: Box<dyn AttributeHost>,
        config: SyncConfig,
    ) -> Self {
        Self::mount_with_ids(attrs, widget, host, config, &IdGenerator::new())
    }

    pub fn mount_with_ids(
        attrs: WidgetAttrs,
        mut widget: Box<dyn Widget>,
        mut host: Box<dyn AttributeHost>,
        config: SyncConfig,
        ids: &IdGenerator,
    ) -> Self {
        let mut bind_patch = AttributePatch::default();
        let id = match &attrs.id {
            Some(id) => id.clone(),
            None => {
                let id = ids.new_id();
                bind_patch.id = Some(id.clone());
                id
            }
        };
        let title = match &attrs.title {
            Some(title) => title.clone(),
            None => {
                let title = config.placeholder_title.clone();
                bind_patch.title = Some(title.clone());
                title
            }
        };

        if !bind_patch.is_empty() {
            debug!(table_id = %id, ?bind_patch, "Patching identity at bind");
            if let Err(e) = host.update_attributes(bind_patch) {
                warn!(table_id = %id, error = %e, "Failed to patch identity at bind");
            }
        }

        if let Err(e) = widget.update_settings(&WidgetSettings::from_attrs(&attrs)) {
            warn!(table_id = %id, error = %e, "Failed to apply widget settings");
        }

        let (hooks, events) = WidgetHooks::channel();
        widget.register_hooks(hooks);

        let (commands_tx, commands) = mpsc::unbounded_channel();
        let controller = Controller {
            id: id.clone(),
            title,
            last_committed: attrs.data_or_default(),
            attrs,
            widget,
            host,
            config,
            guards: GuardSet::binding(),
            pending: None,
            snapshot_scheduled: false,
            settle_at: None,
            commit_at: None,
            pending_since: None,
        };

        let span = info_span!("node_view", table_id = %id);
        let task = tokio::spawn(controller.run(commands, events).instrument(span));

        Self {
            handle: NodeViewHandle {
                id,
                commands: commands_tx,
            },
            task,
        }
    }

    pub fn id(&self) -> &str {
        self.handle.id()
    }

    pub fn handle(&self) -> NodeViewHandle {
        self.handle.clone()
    }

    /// Tear the view down and wait for it; returns the final guard state
    pub async fn unmount(self) -> Result<GuardSet, EditorError> {
        self.handle.destroy();
        Ok(self.task.await?)
    }
}

struct Controller {
    id: String,
    title: String,
    attrs: WidgetAttrs,
    widget: Box<dyn Widget>,
    host: Box<dyn AttributeHost>,
    config: SyncConfig,
    guards: GuardSet,
    last_committed: CellMatrix,
    /// Snapshot waiting for the debounce deadline
    pending: Option<CellMatrix>,
    snapshot_scheduled: bool,
    settle_at: Option<Instant>,
    commit_at: Option<Instant>,
    /// When the current run of re-armed debounces started
    pending_since: Option<Instant>,
}

async fn deadline(at: Option<Instant>) {
    match at {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}

impl Controller {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut events: mpsc::UnboundedReceiver<WidgetEvent>,
    ) -> GuardSet {
        let initial = self.last_committed.clone();
        self.guards.initial_load = true;
        self.begin_load(&initial);

        let mut events_open = true;

        while !self.guards.destroyed {
            tokio::select! {
                biased;

                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    // every handle is gone
                    None => self.teardown(),
                },

                event = events.recv(), if events_open => match event {
                    Some(event) => self.handle_event(event),
                    None => events_open = false,
                },

                _ = deadline(self.settle_at), if self.settle_at.is_some() => self.finish_load(),

                _ = tokio::task::yield_now(), if self.snapshot_scheduled => {
                    self.snapshot_scheduled = false;
                    self.take_snapshot();
                }

                _ = deadline(self.commit_at), if self.commit_at.is_some() => self.flush(),
            }
        }

        self.guards
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::TitleBlurred(raw) => self.set_title(&raw),
            Command::NodeUpdated(attrs) => self.refresh(attrs),
            Command::Inspect(reply) => {
                let _ = reply.send(self.state());
            }
            Command::Destroy => self.teardown(),
        }
    }

    fn state(&self) -> ViewState {
        ViewState {
            id: self.id.clone(),
            title: self.title.clone(),
            guards: self.guards,
            committed: self.last_committed.clone(),
        }
    }

    fn handle_event(&mut self, event: WidgetEvent) {
        if event == WidgetEvent::Loaded {
            if self.settle_at.is_some() {
                self.finish_load();
            }
            return;
        }

        if !self.guards.accepts_widget_event() {
            debug!(?event, guards = ?self.guards, "Widget event ignored");
            return;
        }

        if let WidgetEvent::CellsChanged { changes, source } = &event {
            if changes.is_empty() || *source == ChangeSource::LoadData {
                return;
            }
        }

        self.guards.dirty = true;
        self.snapshot_scheduled = true;
    }

    /// Push `data` into the widget; its own events are ignored until it settles
    fn begin_load(&mut self, data: &CellMatrix) {
        self.guards.sync_in_progress = true;

        match self.widget.load_data(data) {
            Ok(()) => self.settle_at = Some(Instant::now() + self.config.settle_delay),
            Err(e) => {
                error!(error = %e, "Failed to load data into widget");
                self.finish_load();
            }
        }
    }

    fn finish_load(&mut self) {
        self.settle_at = None;
        self.guards.sync_in_progress = false;
        self.guards.initial_load = false;
        self.guards.ready = true;
        debug!("Widget settled");
    }

    fn take_snapshot(&mut self) {
        if !self.guards.dirty || self.guards.destroyed {
            return;
        }

        let data = match self.widget.get_data() {
            Ok(data) => data,
            Err(e) => {
                warn!(error = %e, "Failed to read widget data");
                self.guards.dirty = false;
                return;
            }
        };

        if self.guards.commit_pending && self.pending.as_ref() == Some(&data) {
            return;
        }

        if data == self.last_committed {
            // edits were reverted before the commit fired
            self.cancel_commit();
            self.guards.dirty = false;
            return;
        }

        self.guards.commit_pending = true;
        self.pending = Some(data);
        self.arm_debounce();
    }

    fn arm_debounce(&mut self) {
        let now = Instant::now();
        let since = *self.pending_since.get_or_insert(now);
        let mut at = now + self.config.debounce;
        if let Some(max_wait) = self.config.max_wait {
            at = at.min(since + max_wait);
        }
        self.commit_at = Some(at);
    }

    fn cancel_commit(&mut self) {
        self.guards.commit_pending = false;
        self.pending = None;
        self.commit_at = None;
        self.pending_since = None;
    }

    fn flush(&mut self) {
        let pending = self.pending.take();
        self.cancel_commit();
        self.guards.dirty = false;

        let Some(data) = pending else {
            return;
        };

        let patch = AttributePatch::commit(self.id.clone(), self.title.clone(), data.clone());
        match self.host.update_attributes(patch) {
            Ok(()) => {
                debug!(shape = %data.shape_label(), "Committed widget data");
                self.last_committed = data;
            }
            Err(e) => warn!(error = %e, "Failed to commit widget data"),
        }
    }

    fn set_title(&mut self, raw: &str) {
        self.title = self.config.title_or_placeholder(raw);
        if let Err(e) = self.host.update_attributes(AttributePatch::title(self.title.clone())) {
            warn!(error = %e, "Failed to update title");
        }
    }

    fn refresh(&mut self, attrs: WidgetAttrs) {
        if let Some(id) = attrs.id.as_deref() {
            if id != self.id {
                warn!(new_id = %id, "Ignoring id change on a bound node");
            }
        }
        if let Some(title) = &attrs.title {
            self.title = title.clone();
        }
        if attrs.config != self.attrs.config || attrs.named_expressions != self.attrs.named_expressions {
            if let Err(e) = self.widget.update_settings(&WidgetSettings::from_attrs(&attrs)) {
                warn!(error = %e, "Failed to apply widget settings");
            }
        }

        let data = attrs.data_or_default();
        self.attrs = attrs;

        if data == self.last_committed {
            return;
        }

        if self.guards.commit_pending {
            debug!("External update supersedes pending commit");
        }
        self.cancel_commit();
        self.guards.dirty = false;
        self.snapshot_scheduled = false;
        self.last_committed = data.clone();
        self.begin_load(&data);
    }

    fn teardown(&mut self) {
        if self.guards.destroyed {
            return;
        }
        self.guards.destroyed = true;

        if self.guards.commit_pending {
            debug!("Dropping pending commit at teardown");
        }
        self.cancel_commit();
        self.settle_at = None;
        self.snapshot_scheduled = false;

        self.widget.remove_hooks();
        if let Err(e) = self.widget.destroy() {
            warn!(error = %e, "Failed to destroy widget");
        }
        debug!("Node view torn down");
    }
}
