use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::MirrorError;

/// ALMA project codes look like `2017.1.01310.S`: cycle year, cycle
/// number, project number, science category suffix.
static PROJECT_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}\.[A-Za-z0-9]\.\d{4,5}\.[A-Z]{1,2}$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ProjectCode(String);

impl ProjectCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProjectCode {
    type Err = MirrorError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_string();
        if !PROJECT_CODE_RE.is_match(&normalized) {
            return Err(MirrorError::InvalidProjectCode(value.to_string()));
        }
        Ok(Self(normalized))
    }
}

/// Provider-assigned identifier for a downloadable data unit.
///
/// The archive is not consistent about the `member` prefix between
/// rows, so it is normalized here, once, when the raw cell text enters
/// the system. Construction is idempotent: feeding an already-prefixed
/// value back in changes nothing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MemberUid(String);

impl MemberUid {
    pub fn new(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.starts_with("member") {
            Self(trimmed.to_string())
        } else {
            Self(format!("member.{trimmed}"))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Free-form cube size cell, e.g. `"128 x 128 x 1 x 1"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CubeDimensions(String);

impl CubeDimensions {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Continuum selection: the trailing two size tokens are both 1,
    /// i.e. a single-plane, single-polarization product. Whitespace
    /// between tokens is not significant.
    pub fn is_single_plane(&self) -> bool {
        let compact: String = self.0.split_whitespace().collect();
        compact.ends_with("x1x1")
    }
}

impl fmt::Display for CubeDimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One logical data row of the project results table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetRecord {
    pub dataset_id: String,
    pub source_name: String,
    pub target_name: String,
    pub cube_dimensions: CubeDimensions,
    pub member_uid: MemberUid,
}

impl DatasetRecord {
    pub fn is_continuum(&self) -> bool {
        self.cube_dimensions.is_single_plane()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadOutcome {
    Downloaded,
    AlreadyExists,
    NotFound,
}

impl fmt::Display for DownloadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadOutcome::Downloaded => write!(f, "Downloaded"),
            DownloadOutcome::AlreadyExists => write!(f, "Already Exists"),
            DownloadOutcome::NotFound => write!(f, "Not Found"),
        }
    }
}
