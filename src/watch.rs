//! File system watcher for incremental rebuilds.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                           WatchSession                            │
//! │                                                                   │
//! │  ┌──────────┐   ┌─────────────┐   ┌──────────┐   ┌─────────────┐  │
//! │  │ notify   │──▶│ translate() │──▶│ debounce │──▶│ coalesce()  │  │
//! │  │ events   │   │ ChangeEvent │   │ (150ms)  │   │             │  │
//! │  └──────────┘   └─────────────┘   └──────────┘   └──────┬──────┘  │
//! │                                                         │         │
//! │                                    dispatch() ◀─────────┘         │
//! │                                        │                          │
//! │                route(category, kind) ──┴──▶ BuildCoordinator::on_* │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Events are handled one at a time, in arrival order, each to completion.

use crate::{
    build::{BuildCoordinator, BuildReport, walk_files},
    log,
    utils::category::{FileCategory, categorize_path, is_ignored, is_private},
    writer::{FsWriter, OutputWriter},
};
use anyhow::{Context, Result};
use notify::{
    Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
    event::{CreateKind, ModifyKind, RenameMode},
};
use std::{
    path::{Component, Path, PathBuf},
    sync::mpsc::{self, Receiver, RecvTimeoutError, Sender},
    time::Duration,
};

// =============================================================================
// Constants
// =============================================================================

/// Quiet period after the last event before a batch is handled.
const DEBOUNCE_MS: u64 = 150;

/// Receive timeout while nothing is pending.
const IDLE_SECS: u64 = 60;

// =============================================================================
// Change Events
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Added,
    Changed,
    Deleted,
}

impl ChangeKind {
    const fn verb(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Changed => "changed",
            Self::Deleted => "deleted",
        }
    }
}

/// A single file change under the source root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub path: PathBuf,
}

impl ChangeEvent {
    pub fn new(kind: ChangeKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}

// =============================================================================
// Routing
// =============================================================================

/// Incremental entry point selected for a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    MarkdownAdded,
    MarkdownChanged,
    MarkdownDeleted,
    LayoutAdded,
    LayoutChanged,
    LayoutDeleted,
    StaticAdded,
    StaticChanged,
    StaticDeleted,
}

impl Handler {
    fn invoke<W: OutputWriter>(
        self,
        coordinator: &BuildCoordinator<W>,
        path: &Path,
    ) -> Result<BuildReport> {
        match self {
            Self::MarkdownAdded => coordinator.on_markdown_added(path),
            Self::MarkdownChanged => coordinator.on_markdown_changed(path),
            Self::MarkdownDeleted => coordinator.on_markdown_deleted(path),
            Self::LayoutAdded => coordinator.on_layout_added(path),
            Self::LayoutChanged => coordinator.on_layout_changed(path),
            Self::LayoutDeleted => coordinator.on_layout_deleted(path),
            Self::StaticAdded => coordinator.on_static_added(path),
            Self::StaticChanged => coordinator.on_static_changed(path),
            Self::StaticDeleted => coordinator.on_static_deleted(path),
        }
    }
}

/// Select the handler for a category and change kind.
pub const fn route(category: FileCategory, kind: ChangeKind) -> Handler {
    use ChangeKind::*;
    use FileCategory::*;

    match (category, kind) {
        (Markdown, Added) => Handler::MarkdownAdded,
        (Markdown, Changed) => Handler::MarkdownChanged,
        (Markdown, Deleted) => Handler::MarkdownDeleted,
        (Layout, Added) => Handler::LayoutAdded,
        (Layout, Changed) => Handler::LayoutChanged,
        (Layout, Deleted) => Handler::LayoutDeleted,
        (Static, Added) => Handler::StaticAdded,
        (Static, Changed) => Handler::StaticChanged,
        (Static, Deleted) => Handler::StaticDeleted,
    }
}

/// Classify, route and handle one change.
///
/// Returns `Ok(None)` when the path is not part of the site: editor
/// artifacts, private non-layout files, anything inside a hidden directory,
/// and paths outside the source root.
pub fn dispatch<W: OutputWriter>(
    coordinator: &BuildCoordinator<W>,
    event: &ChangeEvent,
) -> Result<Option<BuildReport>> {
    let path = event.path.as_path();
    let Ok(relative) = path.strip_prefix(coordinator.src()) else {
        return Ok(None);
    };
    if relative.as_os_str().is_empty() || is_ignored(path) || in_hidden_dir(relative) {
        return Ok(None);
    }

    let category = categorize_path(path);
    if is_private(path) && category != FileCategory::Layout {
        return Ok(None);
    }

    route(category, event.kind).invoke(coordinator, path).map(Some)
}

fn in_hidden_dir(relative: &Path) -> bool {
    relative.parent().is_some_and(|dir| {
        dir.components().any(|c| match c {
            Component::Normal(name) => name.to_str().is_some_and(|n| n.starts_with('.')),
            _ => false,
        })
    })
}

// =============================================================================
// notify Translation
// =============================================================================

/// Map a notify event onto zero or more change events.
///
/// A directory that appears (created, moved in, renamed to) expands into one
/// `Added` per file beneath it. A directory that disappears stays a single
/// `Deleted`, which removes its whole mirrored output. Modifications of
/// directories and access notifications produce nothing.
pub fn translate(event: &Event) -> Vec<ChangeEvent> {
    let paths = &event.paths;

    match event.kind {
        EventKind::Create(CreateKind::Folder) => paths
            .iter()
            .filter(|p| p.is_dir())
            .flat_map(|p| added(p))
            .collect(),
        EventKind::Create(_) => paths.iter().flat_map(|p| added(p)).collect(),
        EventKind::Remove(_) => paths.iter().map(|p| deleted(p)).collect(),
        EventKind::Modify(ModifyKind::Name(mode)) => translate_rename(mode, paths),
        EventKind::Modify(_) => paths
            .iter()
            .filter(|p| !p.is_dir())
            .map(|p| ChangeEvent::new(ChangeKind::Changed, p.clone()))
            .collect(),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => Vec::new(),
    }
}

fn translate_rename(mode: RenameMode, paths: &[PathBuf]) -> Vec<ChangeEvent> {
    match (mode, paths) {
        (RenameMode::From, _) => paths.iter().map(|p| deleted(p)).collect(),
        (RenameMode::To, _) => paths.iter().flat_map(|p| added(p)).collect(),
        (RenameMode::Both, [from, to]) => {
            let mut events = vec![deleted(from)];
            events.extend(added(to));
            events
        }
        (RenameMode::Both, _) => Vec::new(),
        // Backends that cannot pair renames report each side alone.
        (RenameMode::Any | RenameMode::Other, _) => paths
            .iter()
            .flat_map(|p| if p.exists() { added(p) } else { vec![deleted(p)] })
            .collect(),
    }
}

/// `Added` for a file, or for every file under a directory.
fn added(path: &Path) -> Vec<ChangeEvent> {
    if path.is_dir() {
        walk_files(path)
            .map(|file| ChangeEvent::new(ChangeKind::Added, file))
            .collect()
    } else {
        vec![ChangeEvent::new(ChangeKind::Added, path)]
    }
}

fn deleted(path: &Path) -> ChangeEvent {
    ChangeEvent::new(ChangeKind::Deleted, path)
}

/// Drop consecutive duplicates, keeping order.
pub fn coalesce(mut events: Vec<ChangeEvent>) -> Vec<ChangeEvent> {
    events.dedup();
    events
}

// =============================================================================
// Watch Session
// =============================================================================

enum Message {
    Fs(notify::Result<Event>),
    Stop,
}

/// Ends a running [`WatchSession`] from another thread.
#[derive(Clone)]
pub struct StopHandle(Sender<Message>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.send(Message::Stop).ok();
    }
}

/// Recursive watch over the source root feeding a [`BuildCoordinator`].
pub struct WatchSession<W: OutputWriter = FsWriter> {
    coordinator: BuildCoordinator<W>,
    verbose: bool,
    tx: Sender<Message>,
    rx: Receiver<Message>,
    // Dropping the watcher stops event delivery.
    _watcher: RecommendedWatcher,
}

impl<W: OutputWriter> WatchSession<W> {
    /// Begin watching. Call once the initial full build has completed.
    pub fn start(coordinator: BuildCoordinator<W>, verbose: bool) -> Result<Self> {
        let (tx, rx) = mpsc::channel();

        let sender = tx.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            sender.send(Message::Fs(res)).ok();
        })
        .context("Failed to create file watcher")?;

        let src = coordinator.src();
        watcher
            .watch(src, RecursiveMode::Recursive)
            .with_context(|| format!("Failed to watch {}", src.display()))?;

        log!("watch"; "watching {} for changes (ctrl-c to stop)", src.display());

        Ok(Self {
            coordinator,
            verbose,
            tx,
            rx,
            _watcher: watcher,
        })
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(self.tx.clone())
    }

    /// Handle events until stopped. A watcher error ends the session.
    pub fn run(self) -> Result<()> {
        let mut pending = Vec::new();

        loop {
            let timeout = if pending.is_empty() {
                Duration::from_secs(IDLE_SECS)
            } else {
                Duration::from_millis(DEBOUNCE_MS)
            };

            match self.rx.recv_timeout(timeout) {
                Ok(Message::Fs(Ok(event))) => pending.extend(translate(&event)),
                Ok(Message::Fs(Err(e))) => return Err(e).context("File watcher failed"),
                Ok(Message::Stop) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {
                    for event in coalesce(std::mem::take(&mut pending)) {
                        self.handle(&event);
                    }
                }
            }
        }

        log!("watch"; "stopped");
        Ok(())
    }

    fn handle(&self, event: &ChangeEvent) {
        let relative = event
            .path
            .strip_prefix(self.coordinator.src())
            .unwrap_or(&event.path);

        match dispatch(&self.coordinator, event) {
            Ok(Some(_)) if self.verbose => {
                let module = categorize_path(&event.path).name();
                log!(module; "{} {}", relative.display(), event.kind.verb());
            }
            Ok(_) => {}
            Err(e) => log!("error"; "{}: {:#}", relative.display(), e),
        }
    }
}
