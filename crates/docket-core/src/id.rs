use crate::document;
use crate::error::{DocketError, Result};
use crate::paths;
use crate::store::Store;
use crate::types::{Bucket, EntityKind};
use regex::Regex;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

/// Ids are zero-padded to this many digits (`TICKET-001`). Larger numbers
/// simply print wider.
pub const ID_WIDTH: usize = 3;

static ID_RE: OnceLock<Regex> = OnceLock::new();
static FILE_NUMBER_RE: OnceLock<Regex> = OnceLock::new();

fn id_re() -> &'static Regex {
    ID_RE.get_or_init(|| Regex::new(r"^([A-Za-z]+)-(\d+)$").unwrap())
}

fn file_number_re() -> &'static Regex {
    FILE_NUMBER_RE.get_or_init(|| Regex::new(r"^([A-Za-z]+)-(\d+)").unwrap())
}

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    pub kind: EntityKind,
    pub number: u32,
}

impl EntityId {
    pub fn new(kind: EntityKind, number: u32) -> Self {
        Self { kind, number }
    }

    /// Parse a fully prefixed id such as `TICKET-007` or `bug-12`.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let caps = id_re()
            .captures(s)
            .ok_or_else(|| DocketError::InvalidId(s.to_string()))?;
        let kind = EntityKind::from_id_prefix(&caps[1])
            .ok_or_else(|| DocketError::InvalidId(s.to_string()))?;
        let number = caps[2]
            .parse()
            .map_err(|_| DocketError::InvalidId(s.to_string()))?;
        Ok(Self { kind, number })
    }

    /// Parse an id of a known kind; a bare number (`7`, `007`) is accepted.
    pub fn parse_for(kind: EntityKind, s: &str) -> Result<Self> {
        let s = s.trim();
        if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) {
            let number = s
                .parse()
                .map_err(|_| DocketError::InvalidId(s.to_string()))?;
            return Ok(Self { kind, number });
        }
        let id = Self::parse(s)?;
        if id.kind != kind {
            return Err(DocketError::InvalidId(format!(
                "{s} (expected a {} id)",
                kind.id_prefix()
            )));
        }
        Ok(id)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{:0width$}",
            self.kind.id_prefix(),
            self.number,
            width = ID_WIDTH
        )
    }
}

impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ---------------------------------------------------------------------------
// Allocation
// ---------------------------------------------------------------------------

/// Number encoded in a file name such as `TICKET-004-fix-login.md` or
/// `prd-002-dashboard.md`, if its prefix belongs to `kind`.
pub fn number_from_file_name(kind: EntityKind, path: &Path) -> Option<u32> {
    let name = path.file_name()?.to_str()?;
    let caps = file_number_re().captures(name)?;
    if !caps[1].eq_ignore_ascii_case(kind.id_prefix()) {
        return None;
    }
    caps[2].parse().ok()
}

/// Retired numbers keyed by id prefix, as stored in
/// [`paths::RETIRED_IDS_FILE`].
type RetiredIds = BTreeMap<String, BTreeSet<u32>>;

fn read_retired<S: Store + ?Sized>(store: &S) -> Result<RetiredIds> {
    let path = Path::new(paths::RETIRED_IDS_FILE);
    if !store.exists(path) {
        return Ok(RetiredIds::new());
    }
    let data = store.read(path)?;
    if data.trim().is_empty() {
        return Ok(RetiredIds::new());
    }
    Ok(serde_yaml::from_str(&data)?)
}

/// Numbers of `kind` whose documents were deleted or renumbered away.
pub fn retired_numbers<S: Store + ?Sized>(store: &S, kind: EntityKind) -> Result<BTreeSet<u32>> {
    Ok(read_retired(store)?
        .remove(kind.id_prefix())
        .unwrap_or_default())
}

/// Record `ids` as retired. Must happen before their documents disappear,
/// otherwise the allocator would hand the numbers out again.
pub fn retire<S: Store + ?Sized>(store: &S, ids: &[EntityId]) -> Result<()> {
    if ids.is_empty() {
        return Ok(());
    }
    let mut retired = read_retired(store)?;
    for id in ids {
        retired
            .entry(id.kind.id_prefix().to_string())
            .or_default()
            .insert(id.number);
    }
    store.write(
        Path::new(paths::RETIRED_IDS_FILE),
        &serde_yaml::to_string(&retired)?,
    )
}

/// Next free number for `kind`: `max + 1` over every file name and heading
/// in the active and archive buckets and every retired number, or `1` when
/// none exist.
///
/// There is no coordination between processes; two concurrent invocations
/// can hand out the same id.
pub fn next_number<S: Store + ?Sized>(store: &S, kind: EntityKind) -> Result<u32> {
    let mut max = retired_numbers(store, kind)?.last().copied().unwrap_or(0);
    for &bucket in Bucket::all() {
        for path in store.list(paths::entity_dir(kind, bucket))? {
            if let Some(n) = number_from_file_name(kind, &path) {
                max = max.max(n);
            }
            let text = store.read(&path)?;
            if let Some(n) = document::heading_number(kind, &text) {
                max = max.max(n);
            }
        }
    }
    max.checked_add(1).ok_or_else(|| {
        DocketError::InvalidId(format!(
            "{} is the largest possible id; no further {} ids can be allocated",
            EntityId::new(kind, max),
            kind.id_prefix()
        ))
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
