//! Project workspace: every CLI operation as a method over a [`Store`].
//!
//! Nothing is cached. Each call re-lists and re-parses the documents it
//! needs, so hand edits made between invocations are always seen.

use crate::aggregate::{self, SprintInputs, SprintReport, StatusReport, Thresholds};
use crate::config::{Config, WarnLevel};
use crate::document::{self, Criterion};
use crate::entity::{self, Entity, PrdStory};
use crate::error::{DocketError, Result};
use crate::id::{self, EntityId};
use crate::paths;
use crate::process;
use crate::store::{FsStore, Store};
use crate::template::{self, Template, Vars};
use crate::transition::{self, Intent, TransitionPolicy};
use crate::types::{Bucket, EntityKind, Priority, Status};
use crate::vcs::VersionControl;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A parsed entity together with where it lives.
#[derive(Debug, Clone, Serialize)]
pub struct StoredEntity {
    #[serde(flatten)]
    pub entity: Entity,
    pub path: PathBuf,
    pub bucket: Bucket,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct InitReport {
    pub directories: Vec<PathBuf>,
    pub templates_written: Vec<String>,
    pub config_written: bool,
}

/// Fields of a story created from a PRD block.
#[derive(Debug, Clone, Default)]
pub struct StoryFields {
    pub priority: Priority,
    pub story_points: Option<u32>,
    pub prd: Option<EntityId>,
    pub description: Option<String>,
    pub acceptance_criteria: Vec<Criterion>,
}

impl From<(&PrdStory, EntityId)> for StoryFields {
    fn from((story, prd): (&PrdStory, EntityId)) -> Self {
        Self {
            priority: story.priority,
            story_points: story.story_points,
            prd: Some(prd),
            description: story.description.clone(),
            acceptance_criteria: story.acceptance_criteria.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedStories {
    pub prd: EntityId,
    pub created: Vec<StoredEntity>,
    /// Titles that already exist as stories of this PRD.
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone)]
pub enum PickOutcome {
    Picked(StoredEntity),
    /// The policy refused the pick; the document was not touched.
    Blocked {
        entity: StoredEntity,
        reason: String,
    },
    NothingAvailable,
}

/// Result of [`Workspace::set_status`].
#[derive(Debug, Clone, Serialize)]
pub struct StatusChange {
    pub from: Status,
    #[serde(flatten)]
    pub updated: StoredEntity,
}

#[derive(Debug, Clone, Default)]
pub struct TicketUpdate {
    pub status: Option<Status>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub new_id: Option<EntityId>,
}

impl TicketUpdate {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.title.is_none()
            && self.description.is_none()
            && self.new_id.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearTarget {
    All,
    One(EntityId),
}

// ---------------------------------------------------------------------------
// Workspace
// ---------------------------------------------------------------------------

pub struct Workspace<S: Store> {
    store: S,
    config: Config,
}

impl Workspace<FsStore> {
    /// Open the project at `root`, loading `docket.yaml` when present.
    pub fn open(root: &Path) -> Result<Self> {
        let config = Config::load(root)?;
        for warning in config.validate() {
            match warning.level {
                WarnLevel::Warning => tracing::warn!("{}", warning.message),
                WarnLevel::Error => tracing::error!("{}", warning.message),
            }
        }
        Ok(Self::new(FsStore::new(root), config))
    }
}

impl<S: Store> Workspace<S> {
    pub fn new(store: S, config: Config) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Init
    // -----------------------------------------------------------------------

    /// Create every storage directory, the default templates and
    /// `docket.yaml`. Existing files are left untouched.
    pub fn init(&self) -> Result<InitReport> {
        let mut report = InitReport::default();
        for &kind in EntityKind::all() {
            for &bucket in Bucket::all() {
                let dir = paths::entity_dir(kind, bucket);
                self.store.create_dir(dir)?;
                report.directories.push(dir.to_path_buf());
            }
        }

        self.store.create_dir(&self.config.templates_dir)?;
        for &kind in EntityKind::all() {
            let path = paths::template_path(&self.config.templates_dir, kind.template_name());
            if self.write_if_missing(&path, template::default_template(kind))? {
                report.templates_written.push(kind.template_name().to_string());
            }
        }

        let config = serde_yaml::to_string(&self.config)?;
        report.config_written = self.write_if_missing(Path::new(paths::CONFIG_FILE), &config)?;
        Ok(report)
    }

    /// Write `content` only when `path` does not exist yet. Returns true if
    /// written.
    fn write_if_missing(&self, path: &Path, content: &str) -> Result<bool> {
        if self.store.exists(path) {
            return Ok(false);
        }
        self.store.write(path, content)?;
        Ok(true)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Entities of `kind` in `bucket`, ordered by id. Files that carry no
    /// identity are skipped with a warning.
    pub fn list_in(&self, kind: EntityKind, bucket: Bucket) -> Result<Vec<StoredEntity>> {
        let mut out = Vec::new();
        for path in self.store.list(paths::entity_dir(kind, bucket))? {
            let text = self.store.read(&path)?;
            match Entity::parse(kind, &text, &path) {
                Some(entity) => out.push(StoredEntity {
                    entity,
                    path,
                    bucket,
                }),
                None => {
                    tracing::warn!(path = %path.display(), "skipping document without an id")
                }
            }
        }
        out.sort_by_key(|s| s.entity.id);
        Ok(out)
    }

    /// Active entities of `kind`, ordered by id.
    pub fn list_entities(&self, kind: EntityKind) -> Result<Vec<Entity>> {
        Ok(self
            .list_in(kind, Bucket::Active)?
            .into_iter()
            .map(|s| s.entity)
            .collect())
    }

    /// Look `id` up in the active bucket, then the archive. The error lists
    /// the active ids of the same kind.
    pub fn find(&self, id: EntityId) -> Result<StoredEntity> {
        for &bucket in Bucket::all() {
            if let Some(found) = self
                .list_in(id.kind, bucket)?
                .into_iter()
                .find(|s| s.entity.id == id)
            {
                return Ok(found);
            }
        }
        Err(self.not_found(id)?)
    }

    fn not_found(&self, id: EntityId) -> Result<DocketError> {
        let available = self
            .list_in(id.kind, Bucket::Active)?
            .iter()
            .map(|s| s.entity.id.to_string())
            .collect();
        Ok(DocketError::NotFound {
            id: id.to_string(),
            available,
        })
    }

    pub fn next_id(&self, kind: EntityKind) -> Result<EntityId> {
        Ok(EntityId::new(kind, id::next_number(&self.store, kind)?))
    }

    // -----------------------------------------------------------------------
    // Creation
    // -----------------------------------------------------------------------

    pub fn create_ticket(
        &self,
        title: &str,
        description: &str,
        priority: Priority,
    ) -> Result<StoredEntity> {
        let mut vars = Vars::new();
        level_vars(&mut vars, "PRIORITY", priority);
        vars.insert("DESCRIPTION", description.trim().to_string());
        vars.insert("ACCEPTANCE_CRITERIA", render_criteria(&[]));
        self.create(EntityKind::Ticket, title, vars)
    }

    pub fn create_prd(&self, title: &str, priority: Priority) -> Result<StoredEntity> {
        let mut vars = Vars::new();
        level_vars(&mut vars, "PRIORITY", priority);
        vars.insert("DESCRIPTION", String::new());
        self.create(EntityKind::Prd, title, vars)
    }

    pub fn create_issue(
        &self,
        title: &str,
        severity: Priority,
        description: Option<&str>,
    ) -> Result<StoredEntity> {
        let mut vars = Vars::new();
        level_vars(&mut vars, "SEVERITY", severity);
        level_vars(&mut vars, "PRIORITY", severity);
        vars.insert(
            "DESCRIPTION",
            description.map(|d| d.trim().to_string()).unwrap_or_default(),
        );
        self.create(EntityKind::Issue, title, vars)
    }

    pub fn create_story(&self, title: &str, fields: StoryFields) -> Result<StoredEntity> {
        let mut vars = Vars::new();
        level_vars(&mut vars, "PRIORITY", fields.priority);
        vars.insert("STORY_POINTS", entity::points_label(fields.story_points));
        vars.insert(
            "PRD_ID",
            fields.prd.map(|p| p.to_string()).unwrap_or_else(|| "None".to_string()),
        );
        vars.insert("DESCRIPTION", fields.description.unwrap_or_default());
        vars.insert(
            "ACCEPTANCE_CRITERIA",
            render_criteria(&fields.acceptance_criteria),
        );
        self.create(EntityKind::Story, title, vars)
    }

    /// Render the kind's template with a freshly allocated id and write it
    /// to the active bucket.
    fn create(&self, kind: EntityKind, title: &str, mut vars: Vars) -> Result<StoredEntity> {
        let title = title.trim();
        let template = Template::load(&self.store, &self.config.templates_dir, kind.template_name())?;
        let id = self.next_id(kind)?;

        vars.insert("ID", id.to_string());
        vars.insert("TITLE", title.to_string());
        vars.insert("DATE", chrono::Utc::now().date_naive().to_string());
        vars.insert(
            "STATUS_BLOCK",
            document::render_status_block(kind, kind.initial_status()),
        );

        let path = paths::entity_path(kind, Bucket::Active, &template::file_name(id, title));
        if self.store.exists(&path) {
            return Err(DocketError::IdInUse(id.to_string()));
        }
        self.store.write(&path, &template.render(&vars))?;
        tracing::debug!(%id, path = %path.display(), "created");
        self.reload(kind, path, Bucket::Active)
    }

    fn reload(&self, kind: EntityKind, path: PathBuf, bucket: Bucket) -> Result<StoredEntity> {
        let text = self.store.read(&path)?;
        let entity = Entity::parse(kind, &text, &path).ok_or_else(|| {
            DocketError::MalformedDocument {
                path: path.display().to_string(),
                reason: format!("no {} id in heading or file name", kind.id_prefix()),
            }
        })?;
        Ok(StoredEntity {
            entity,
            path,
            bucket,
        })
    }

    /// Create one story per `### STORY-…` block of the PRD. Blocks whose
    /// title already exists as a story of this PRD are skipped.
    pub fn generate_stories(&self, prd_id: EntityId) -> Result<GeneratedStories> {
        expect_kind(prd_id, EntityKind::Prd)?;
        let prd = self.find(prd_id)?;

        let mut existing: BTreeSet<String> = BTreeSet::new();
        for &bucket in Bucket::all() {
            for story in self.list_in(EntityKind::Story, bucket)? {
                if story.entity.prd == Some(prd_id) {
                    existing.insert(story.entity.title.to_lowercase());
                }
            }
        }

        let mut generated = GeneratedStories {
            prd: prd_id,
            created: Vec::new(),
            skipped: Vec::new(),
        };
        for block in &prd.entity.stories {
            if !existing.insert(block.title.to_lowercase()) {
                generated.skipped.push(block.title.clone());
                continue;
            }
            let story = self.create_story(&block.title, StoryFields::from((block, prd_id)))?;
            generated.created.push(story);
        }
        Ok(generated)
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    fn policy(&self, kind: EntityKind) -> TransitionPolicy {
        TransitionPolicy::new(kind, self.config.transitions.update_guard)
    }

    fn transition(&self, stored: &StoredEntity, to: Status, intent: Intent) -> Result<StoredEntity> {
        let id = stored.entity.id;
        self.policy(id.kind)
            .check(id, stored.entity.status, to, intent)?;
        let text = self.store.read(&stored.path)?;
        let updated = transition::apply(&text, id, to, &stored.path.display().to_string())?;
        self.store.write(&stored.path, &updated)?;
        tracing::debug!(%id, from = %stored.entity.status, %to, "status changed");
        self.reload(id.kind, stored.path.clone(), stored.bucket)
    }

    /// Move an entity to In Progress.
    ///
    /// With an id, that entity is picked; without one, the highest-priority
    /// Not Started entity wins, lowest id first. A blocked pick leaves the
    /// document byte-identical.
    pub fn pick(&self, kind: EntityKind, id: Option<EntityId>) -> Result<PickOutcome> {
        let stored = match id {
            Some(id) => {
                expect_kind(id, kind)?;
                self.find(id)?
            }
            None => {
                let candidate = self
                    .list_in(kind, Bucket::Active)?
                    .into_iter()
                    .filter(|s| s.entity.status == kind.initial_status())
                    .min_by_key(|s| (std::cmp::Reverse(s.entity.level()), s.entity.id));
                match candidate {
                    Some(stored) => stored,
                    None => return Ok(PickOutcome::NothingAvailable),
                }
            }
        };

        match self.transition(&stored, Status::InProgress, Intent::Pick) {
            Ok(picked) => Ok(PickOutcome::Picked(picked)),
            Err(DocketError::TransitionBlocked { reason, .. }) => Ok(PickOutcome::Blocked {
                entity: stored,
                reason,
            }),
            Err(e) => Err(e),
        }
    }

    /// Set the status of any entity, subject to the configured guard.
    pub fn set_status(&self, id: EntityId, to: Status) -> Result<StatusChange> {
        let stored = self.find(id)?;
        let from = stored.entity.status;
        let updated = self.transition(&stored, to, Intent::Update)?;
        Ok(StatusChange { from, updated })
    }

    /// Apply every requested change to a ticket in one write. All inputs
    /// are validated before anything touches the disk; a changed id or
    /// title renames the file.
    pub fn update_ticket(&self, id: EntityId, update: TicketUpdate) -> Result<StoredEntity> {
        expect_kind(id, EntityKind::Ticket)?;
        let stored = self.find(id)?;
        if update.is_empty() {
            return Ok(stored);
        }

        if let Some(to) = update.status {
            self.policy(EntityKind::Ticket)
                .check(id, stored.entity.status, to, Intent::Update)?;
        }
        let new_id = match update.new_id {
            Some(new_id) if new_id != id => {
                expect_kind(new_id, EntityKind::Ticket)?;
                // The largest number would leave nothing for the next create.
                if new_id.number == 0 || new_id.number == u32::MAX {
                    return Err(DocketError::InvalidId(new_id.to_string()));
                }
                if self.id_in_use(new_id)? {
                    return Err(DocketError::IdInUse(new_id.to_string()));
                }
                Some(new_id)
            }
            _ => None,
        };

        let path_str = stored.path.display().to_string();
        let mut text = self.store.read(&stored.path)?;
        if let Some(to) = update.status {
            text = transition::apply(&text, id, to, &path_str)?;
        }

        let final_id = new_id.unwrap_or(id);
        let title = update
            .title
            .as_deref()
            .map(str::trim)
            .unwrap_or(&stored.entity.title)
            .to_string();
        let renamed = new_id.is_some() || update.title.is_some();
        if renamed {
            text = document::replace_heading(&text, final_id, &title);
        }
        if let Some(description) = &update.description {
            text = document::replace_section_body(&text, "Description", description);
        }

        let path = if renamed {
            paths::entity_path(
                EntityKind::Ticket,
                stored.bucket,
                &template::file_name(final_id, &title),
            )
        } else {
            stored.path.clone()
        };

        if new_id.is_some() {
            id::retire(&self.store, &[id])?;
        }
        self.store.write(&path, &text)?;
        if path != stored.path {
            self.store.remove(&stored.path)?;
            tracing::debug!(from = %stored.path.display(), to = %path.display(), "renamed");
        }
        self.reload(EntityKind::Ticket, path, stored.bucket)
    }

    /// True when `id` is retired or any document in either bucket claims
    /// it, by heading or by file name.
    fn id_in_use(&self, id: EntityId) -> Result<bool> {
        if id::retired_numbers(&self.store, id.kind)?.contains(&id.number) {
            return Ok(true);
        }
        for &bucket in Bucket::all() {
            for path in self.store.list(paths::entity_dir(id.kind, bucket))? {
                if id::number_from_file_name(id.kind, &path) == Some(id.number) {
                    return Ok(true);
                }
                let text = self.store.read(&path)?;
                if document::heading_number(id.kind, &text) == Some(id.number) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    // -----------------------------------------------------------------------
    // Removal
    // -----------------------------------------------------------------------

    /// Delete active tickets. With `archive`, a copy is first written to the
    /// archive bucket; otherwise the ids are retired. Either way the numbers
    /// are never allocated again.
    pub fn clear_tickets(&self, target: ClearTarget, archive: bool) -> Result<Vec<EntityId>> {
        let targets = match target {
            ClearTarget::All => self.list_in(EntityKind::Ticket, Bucket::Active)?,
            ClearTarget::One(id) => {
                expect_kind(id, EntityKind::Ticket)?;
                let found = self
                    .list_in(EntityKind::Ticket, Bucket::Active)?
                    .into_iter()
                    .find(|s| s.entity.id == id);
                match found {
                    Some(stored) => vec![stored],
                    None => return Err(self.not_found(id)?),
                }
            }
        };

        if !archive {
            let ids: Vec<EntityId> = targets.iter().map(|s| s.entity.id).collect();
            id::retire(&self.store, &ids)?;
        }

        let mut cleared = Vec::with_capacity(targets.len());
        for stored in targets {
            if archive {
                self.copy_to_archive(&stored)?;
            }
            self.store.remove(&stored.path)?;
            cleared.push(stored.entity.id);
        }
        Ok(cleared)
    }

    /// Move a PRD to `docs/prd/archive/`. Already archived PRDs are returned
    /// unchanged.
    pub fn archive_prd(&self, id: EntityId) -> Result<StoredEntity> {
        expect_kind(id, EntityKind::Prd)?;
        let stored = self.find(id)?;
        if stored.bucket == Bucket::Archive {
            return Ok(stored);
        }
        let dest = self.copy_to_archive(&stored)?;
        self.store.remove(&stored.path)?;
        self.reload(EntityKind::Prd, dest, Bucket::Archive)
    }

    fn copy_to_archive(&self, stored: &StoredEntity) -> Result<PathBuf> {
        let file_name = stored
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| DocketError::MalformedDocument {
                path: stored.path.display().to_string(),
                reason: "file name is not valid UTF-8".to_string(),
            })?;
        let dest = paths::entity_path(stored.entity.kind, Bucket::Archive, file_name);
        let text = self.store.read(&stored.path)?;
        self.store.write(&dest, &text)?;
        Ok(dest)
    }

    // -----------------------------------------------------------------------
    // Reports
    // -----------------------------------------------------------------------

    /// Summary of every kind's active entities.
    pub fn status_report(&self) -> Result<StatusReport> {
        let mut groups = Vec::new();
        for &kind in EntityKind::all() {
            groups.push((kind, self.list_entities(kind)?));
        }
        Ok(aggregate::status_report(&groups))
    }

    /// Ticket/story/issue summaries plus version-control metadata and the
    /// configured checks, all run in `cwd`. Collaborator failures become
    /// failed steps.
    pub fn sprint_report(&self, vcs: &dyn VersionControl, cwd: &Path) -> Result<SprintReport> {
        let tickets = self.list_entities(EntityKind::Ticket)?;
        let stories = self.list_entities(EntityKind::Story)?;
        let issues = self.list_entities(EntityKind::Issue)?;

        let timeout = self.config.sprint.command_timeout();
        let steps = self
            .config
            .sprint
            .checks
            .iter()
            .map(|check| process::run_step(&check.name, &check.command, cwd, timeout))
            .collect();

        let thresholds = Thresholds {
            wip_limit: self.config.sprint.wip_limit,
            review_backlog_limit: self.config.sprint.review_backlog_limit,
        };
        Ok(aggregate::sprint_report(
            SprintInputs {
                tickets: &tickets,
                stories: &stories,
                issues: &issues,
                vcs: vcs.snapshot(cwd),
                steps,
            },
            &thresholds,
        ))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn expect_kind(id: EntityId, kind: EntityKind) -> Result<()> {
    if id.kind != kind {
        return Err(DocketError::InvalidId(format!(
            "{id} (expected a {} id)",
            kind.id_prefix()
        )));
    }
    Ok(())
}

/// `PRIORITY` → `🟠` under `PRIORITY_EMOJI` and `High` under `PRIORITY`.
fn level_vars(vars: &mut Vars, key: &'static str, level: Priority) {
    let emoji_key = match key {
        "SEVERITY" => "SEVERITY_EMOJI",
        _ => "PRIORITY_EMOJI",
    };
    vars.insert(key, level.label().to_string());
    vars.insert(emoji_key, level.emoji().to_string());
}

fn render_criteria(criteria: &[Criterion]) -> String {
    if criteria.is_empty() {
        return "- [ ]".to_string();
    }
    criteria
        .iter()
        .map(|c| format!("- [{}] {}", if c.done { 'x' } else { ' ' }, c.text))
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
