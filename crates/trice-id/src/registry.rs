//! Persistent ID → format-string registry.
//!
//! The on-disk form is a JSON object keyed by decimal ID, sorted so the
//! file diffs cleanly under version control. Loading tolerates unknown
//! extra fields per entry (forward compatibility) but fails closed on
//! structurally invalid content. Persisting is write-temp-then-rename
//! so a crash mid-write never corrupts the list, and only happens when
//! at least one entry changed.

use std::collections::BTreeMap;
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{IdError, Result};
use crate::param::ParamSlot;

/// Lowest ID the allocator hands out; everything below is reserved.
pub const ID_FLOOR: u32 = 256;

/// Highest representable ID (the wire carries a u16).
pub const ID_CEIL: u32 = u16::MAX as u32;

/// ID value of the bare-mode sync sentinel, never allocated.
pub const SYNC_ID: u32 = 0x1616;

/// One registry entry: what a numeric ID means.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryEntry {
    /// Host-side format string.
    pub fmt: String,
    /// Ordered parameter layout.
    pub spec: Vec<ParamSlot>,
    /// ISO 8601 creation timestamp.
    pub created: String,
    /// Source location the entry was allocated for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

/// In-memory registry with dirty tracking.
///
/// IDs are injective: two distinct call sites never share one ID. The
/// format string may repeat across entries; the ID may not repeat at
/// all.
#[derive(Debug, Default)]
pub struct IdRegistry {
    entries: BTreeMap<u32, RegistryEntry>,
    dirty: bool,
}

impl IdRegistry {
    /// An empty registry (the zero-ID workflow).
    pub fn new() -> Self {
        IdRegistry::default()
    }

    /// Load the persisted ID list.
    ///
    /// `None` (absent by configuration) and a nonexistent path both
    /// yield an empty registry; existing but invalid content is a hard
    /// error rather than a silently truncated registry.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(IdRegistry::new());
        };
        if !path.exists() {
            info!("ID list {} not present, starting empty", path.display());
            return Ok(IdRegistry::new());
        }
        let data = std::fs::read_to_string(path)?;
        let entries: BTreeMap<u32, RegistryEntry> =
            serde_json::from_str(&data).map_err(|e| IdError::InvalidIdList {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?;
        // The wire carries a u16; an entry beyond it can never match an
        // atom and would alias a different ID if truncated.
        if let Some(&id) = entries.keys().next_back() {
            if id > ID_CEIL {
                return Err(IdError::InvalidIdList {
                    path: path.to_path_buf(),
                    detail: format!("ID {id} exceeds the wire maximum {ID_CEIL}"),
                });
            }
        }
        Ok(IdRegistry {
            entries,
            dirty: false,
        })
    }

    /// Read-only lookup used by the decode path.
    pub fn lookup(&self, id: u32) -> Option<&RegistryEntry> {
        self.entries.get(&id)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether any entry changed since load.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Iterate entries in ID order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &RegistryEntry)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    /// Assign an ID for a call site, registering the entry.
    ///
    /// A candidate (the ID already written at the call site) is kept
    /// when it is free and valid, or when it already maps to the
    /// identical format string (a re-scan of the same site). A
    /// candidate taken by a *different* format string gets a fresh ID
    /// substituted — two call sites must never share one ID.
    pub fn allocate(
        &mut self,
        candidate: Option<u32>,
        fmt: &str,
        spec: Vec<ParamSlot>,
        origin: Option<String>,
    ) -> Result<u32> {
        if let Some(c) = candidate {
            match self.entries.get(&c) {
                Some(existing) if existing.fmt == fmt => return Ok(c),
                Some(existing) => {
                    warn!(
                        "ID {c} collision: registered to {:?}, requested for {:?}; issuing fresh ID",
                        existing.fmt, fmt
                    );
                }
                None if Self::is_allocatable(c) => {
                    self.insert(c, fmt, spec, origin);
                    return Ok(c);
                }
                None => {
                    warn!("ID {c} outside the allocatable range; issuing fresh ID");
                }
            }
        }
        let id = self.lowest_free()?;
        self.insert(id, fmt, spec, origin);
        Ok(id)
    }

    /// Atomically rewrite the on-disk list if anything changed.
    ///
    /// Returns `true` when a write happened. The list is written to a
    /// temporary file in the target directory and renamed into place,
    /// so readers never observe a half-written registry.
    pub fn persist(&mut self, path: &Path) -> Result<bool> {
        if !self.dirty {
            return Ok(false);
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
        let tmp = match dir {
            Some(d) => {
                std::fs::create_dir_all(d)?;
                tempfile::NamedTempFile::new_in(d)?
            }
            None => tempfile::NamedTempFile::new_in(".")?,
        };
        std::fs::write(tmp.path(), json.as_bytes())?;
        tmp.persist(path).map_err(|e| IdError::Persist {
            path: path.to_path_buf(),
            detail: e.error.to_string(),
        })?;
        self.dirty = false;
        info!("persisted {} registry entries to {}", self.entries.len(), path.display());
        Ok(true)
    }

    fn is_allocatable(id: u32) -> bool {
        id >= ID_FLOOR && id <= ID_CEIL && id != SYNC_ID
    }

    fn lowest_free(&self) -> Result<u32> {
        (ID_FLOOR..=ID_CEIL)
            .find(|id| *id != SYNC_ID && !self.entries.contains_key(id))
            .ok_or(IdError::Exhausted)
    }

    fn insert(&mut self, id: u32, fmt: &str, spec: Vec<ParamSlot>, origin: Option<String>) {
        self.entries.insert(
            id,
            RegistryEntry {
                fmt: fmt.to_string(),
                spec,
                created: now_iso8601(),
                origin,
            },
        );
        self.dirty = true;
    }
}

/// Generate an ISO 8601 timestamp from the current system time.
pub fn now_iso8601() -> String {
    use std::time::SystemTime;
    let duration = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default();
    let secs = duration.as_secs();
    let days = secs / 86400;
    let time_secs = secs % 86400;
    let (hours, minutes, seconds) = (time_secs / 3600, (time_secs % 3600) / 60, time_secs % 60);
    // Days since 1970-01-01, no leap seconds (sufficient for an audit trail).
    let mut y = 1970i64;
    let mut remaining = days as i64;
    loop {
        let leap = y % 4 == 0 && (y % 100 != 0 || y % 400 == 0);
        let year_days = if leap { 366 } else { 365 };
        if remaining < year_days {
            break;
        }
        remaining -= year_days;
        y += 1;
    }
    let leap = y % 4 == 0 && (y % 100 != 0 || y % 400 == 0);
    let month_days: [i64; 12] = [
        31,
        if leap { 29 } else { 28 },
        31,
        30,
        31,
        30,
        31,
        31,
        30,
        31,
        30,
        31,
    ];
    let mut month = 0;
    while remaining >= month_days[month] {
        remaining -= month_days[month];
        month += 1;
    }
    format!(
        "{y:04}-{:02}-{:02}T{hours:02}:{minutes:02}:{seconds:02}Z",
        month + 1,
        remaining + 1
    )
}
