//! Rotation actions and dispatch
//!
//! The dispatcher never re-evaluates policy: it feeds decisions already made
//! by the retention engine to one [`RotationAction`]. Actions mutate storage
//! only through a [`SnapshotStore`], so wrapping the store in
//! `DryRunStore` previews a run without changing its control flow.

use crate::retention::Decision;
use owo_colors::OwoColorize;
use sk_core::{ActionKind, Error, Result, Settings, SnapshotIdentity, SnapshotStore};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// What an action did with one decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Not marked for rotation, left alone
    Skipped,
    /// Described only
    Reported,
    /// Storage was changed; `pruned` empty ancestor directories removed
    Applied { pruned: usize },
}

/// Counters for one dispatch run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Decisions received
    pub examined: usize,
    /// Decisions with `rotate` set
    pub marked: usize,
    /// Decisions that changed storage
    pub applied: usize,
    /// Decisions whose store call failed
    pub failed: usize,
    /// Empty directories removed after applying
    pub pruned: usize,
}

/// One way of handling snapshots marked for rotation
pub trait RotationAction {
    fn kind(&self) -> ActionKind;

    /// Handle a single decision
    fn apply(&mut self, decision: &Decision, out: &mut dyn Write) -> Result<Outcome>;

    /// Print the closing summary
    fn finish(&mut self, summary: &DispatchSummary, out: &mut dyn Write) -> Result<()> {
        let line = format!(
            "{}: {} of {} snapshots processed ({} failed)",
            self.kind(),
            summary.applied,
            summary.examined,
            summary.failed
        );
        writeln!(out, "{}", line.bold())?;
        Ok(())
    }
}

/// Feed every decision to `action`, tolerating per-record store failures
pub fn dispatch<I>(
    action: &mut dyn RotationAction,
    decisions: I,
    out: &mut dyn Write,
) -> Result<DispatchSummary>
where
    I: IntoIterator<Item = Decision>,
{
    let mut summary = DispatchSummary::default();

    for decision in decisions {
        summary.examined += 1;
        if decision.rotate {
            summary.marked += 1;
        }

        match action.apply(&decision, out) {
            Ok(Outcome::Applied { pruned }) => {
                summary.applied += 1;
                summary.pruned += pruned;
            }
            Ok(Outcome::Reported) | Ok(Outcome::Skipped) => {}
            Err(err @ Error::CollaboratorFailure { .. }) => {
                warn!("{} skipped {}: {}", action.kind(), decision.identity, err);
                summary.failed += 1;
            }
            Err(err) => return Err(err),
        }
    }

    action.finish(&summary, out)?;
    debug!("Dispatch finished: {:?}", summary);
    Ok(summary)
}

/// Remove now-empty day, month and year directories of `identity`
///
/// Stops at the first directory that is not empty (or cannot be removed);
/// the inventory root itself is never touched.
fn prune_ancestors<S: SnapshotStore>(store: &S, root: &Path, identity: &SnapshotIdentity) -> usize {
    let mut pruned = 0;
    for dir in identity.ancestors_in(root) {
        match store.prune_dir(&dir) {
            Ok(true) => pruned += 1,
            Ok(false) => break,
            Err(err) => {
                warn!("Could not prune {}: {}", dir.display(), err);
                break;
            }
        }
    }
    pruned
}

fn verb(preview: bool, live: &'static str, dry: &'static str) -> &'static str {
    if preview {
        dry
    } else {
        live
    }
}

/// Describe decisions without touching storage
#[derive(Debug, Default)]
pub struct Report;

impl Report {
    pub fn new() -> Self {
        Self
    }
}

impl RotationAction for Report {
    fn kind(&self) -> ActionKind {
        ActionKind::Report
    }

    fn apply(&mut self, decision: &Decision, out: &mut dyn Write) -> Result<Outcome> {
        if decision.rotate {
            writeln!(out, "{}  {}", "rotate".red(), decision.identity)?;
        } else {
            let tier = decision.kept_by.map(|t| t.name()).unwrap_or("-");
            writeln!(
                out,
                "{}    {}  ({})",
                "keep".green(),
                decision.identity,
                tier.dimmed()
            )?;
        }
        Ok(Outcome::Reported)
    }

    fn finish(&mut self, summary: &DispatchSummary, out: &mut dyn Write) -> Result<()> {
        let line = format!(
            "{} of {} snapshots marked for rotation",
            summary.marked, summary.examined
        );
        writeln!(out, "{}", line.bold())?;
        Ok(())
    }
}

/// Delete rotated snapshots (every snapshot when forced)
pub struct Remove<S> {
    store: S,
    root: PathBuf,
    force: bool,
    preview: bool,
}

impl<S: SnapshotStore> Remove<S> {
    pub fn new(store: S, root: impl Into<PathBuf>) -> Self {
        Self {
            store,
            root: root.into(),
            force: false,
            preview: false,
        }
    }

    /// Delete regardless of the decision
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Word output as a preview
    pub fn preview(mut self, preview: bool) -> Self {
        self.preview = preview;
        self
    }
}

impl<S: SnapshotStore> RotationAction for Remove<S> {
    fn kind(&self) -> ActionKind {
        ActionKind::Remove
    }

    fn apply(&mut self, decision: &Decision, out: &mut dyn Write) -> Result<Outcome> {
        if !decision.rotate && !self.force {
            return Ok(Outcome::Skipped);
        }

        let path = decision.identity.path_in(&self.root);
        self.store.delete(&path)?;
        writeln!(
            out,
            "{} {}",
            verb(self.preview, "removed", "would remove").red(),
            path.display()
        )?;

        let pruned = prune_ancestors(&self.store, &self.root, &decision.identity);
        Ok(Outcome::Applied { pruned })
    }

    fn finish(&mut self, summary: &DispatchSummary, out: &mut dyn Write) -> Result<()> {
        let line = format!(
            "{} {} snapshots",
            verb(self.preview, "Removed", "Would remove"),
            summary.applied
        );
        writeln!(out, "{}", line.bold())?;
        if summary.failed > 0 {
            writeln!(out, "{}", format!("{} removals failed", summary.failed).yellow())?;
        }
        Ok(())
    }
}

/// Move rotated snapshots under an archive root
pub struct Relocate<S> {
    store: S,
    root: PathBuf,
    archive_root: PathBuf,
    preview: bool,
}

impl<S: SnapshotStore> Relocate<S> {
    pub fn new(store: S, root: impl Into<PathBuf>, archive_root: impl Into<PathBuf>) -> Self {
        Self {
            store,
            root: root.into(),
            archive_root: archive_root.into(),
            preview: false,
        }
    }

    pub fn preview(mut self, preview: bool) -> Self {
        self.preview = preview;
        self
    }
}

impl<S: SnapshotStore> RotationAction for Relocate<S> {
    fn kind(&self) -> ActionKind {
        ActionKind::Relocate
    }

    fn apply(&mut self, decision: &Decision, out: &mut dyn Write) -> Result<Outcome> {
        if !decision.rotate {
            return Ok(Outcome::Skipped);
        }

        let source = decision.identity.path_in(&self.root);
        let dest = decision.identity.path_in(&self.archive_root);
        self.store.relocate(&source, &dest)?;
        writeln!(
            out,
            "{} {} -> {}",
            verb(self.preview, "moved", "would move").yellow(),
            source.display(),
            dest.display()
        )?;

        let pruned = prune_ancestors(&self.store, &self.root, &decision.identity);
        Ok(Outcome::Applied { pruned })
    }
}

/// Copy rotated snapshots under an archive root, then delete the originals
pub struct Archive<S> {
    store: S,
    root: PathBuf,
    archive_root: PathBuf,
    preview: bool,
}

impl<S: SnapshotStore> Archive<S> {
    pub fn new(store: S, root: impl Into<PathBuf>, archive_root: impl Into<PathBuf>) -> Self {
        Self {
            store,
            root: root.into(),
            archive_root: archive_root.into(),
            preview: false,
        }
    }

    pub fn preview(mut self, preview: bool) -> Self {
        self.preview = preview;
        self
    }
}

impl<S: SnapshotStore> RotationAction for Archive<S> {
    fn kind(&self) -> ActionKind {
        ActionKind::Archive
    }

    fn apply(&mut self, decision: &Decision, out: &mut dyn Write) -> Result<Outcome> {
        if !decision.rotate {
            return Ok(Outcome::Skipped);
        }

        let source = decision.identity.path_in(&self.root);
        let dest = decision.identity.path_in(&self.archive_root);
        // A copy left by an earlier run whose delete failed is reused
        if self.store.exists(&dest) {
            debug!("Archive copy {} already present", dest.display());
        } else {
            self.store.snapshot(&source, &dest)?;
        }
        self.store.delete(&source)?;
        writeln!(
            out,
            "{} {} -> {}",
            verb(self.preview, "archived", "would archive").yellow(),
            source.display(),
            dest.display()
        )?;

        let pruned = prune_ancestors(&self.store, &self.root, &decision.identity);
        Ok(Outcome::Applied { pruned })
    }
}

/// Build the action for `kind`
///
/// `store` should already be wrapped for preview when `settings.dry_run`
/// is set; the flag here only changes wording.
pub fn build_action<'a, S>(
    kind: ActionKind,
    store: S,
    settings: &Settings,
    force: bool,
) -> Result<Box<dyn RotationAction + 'a>>
where
    S: SnapshotStore + 'a,
{
    let root = settings.destination.clone();
    let preview = settings.dry_run;

    Ok(match kind {
        ActionKind::Report => Box::new(Report::new()),
        ActionKind::Remove => Box::new(Remove::new(store, root).force(force).preview(preview)),
        ActionKind::Relocate => {
            let archive_root = settings.archive_root_for(kind)?.to_path_buf();
            Box::new(Relocate::new(store, root, archive_root).preview(preview))
        }
        ActionKind::Archive => {
            let archive_root = settings.archive_root_for(kind)?.to_path_buf();
            Box::new(Archive::new(store, root, archive_root).preview(preview))
        }
    })
}
