use std::fs;

use camino::{Utf8Path, Utf8PathBuf};

use crate::domain::{MemberUid, ProjectCode};
use crate::error::MirrorError;

/// Destination layout for mirrored holdings, rooted at one explicit
/// base directory. There is exactly one path-resolution rule: all
/// callers thread the same root, nothing recomputes defaults on the
/// side.
#[derive(Debug, Clone)]
pub struct MirrorStore {
    root: Utf8PathBuf,
}

impl MirrorStore {
    pub fn new(root: Option<Utf8PathBuf>) -> Result<Self, MirrorError> {
        let root = match root {
            Some(root) => root,
            None => {
                let cwd = std::env::current_dir()
                    .map_err(|err| MirrorError::Filesystem(err.to_string()))?;
                Utf8PathBuf::from_path_buf(cwd)
                    .map_err(|_| MirrorError::Filesystem("invalid working directory".to_string()))?
            }
        };
        Ok(Self { root })
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn images_dir(&self, project: &ProjectCode) -> Utf8PathBuf {
        self.root.join("Images").join(project.as_str())
    }

    pub fn files_dir(&self, project: &ProjectCode) -> Utf8PathBuf {
        self.root.join("Files").join(project.as_str())
    }

    pub fn thumbnail_path(&self, project: &ProjectCode, source_name: &str) -> Utf8PathBuf {
        self.images_dir(project).join(format!("{source_name}.jpg"))
    }

    pub fn file_path(&self, project: &ProjectCode, uid: &MemberUid) -> Utf8PathBuf {
        self.files_dir(project).join(uid.as_str())
    }

    pub fn ensure_dir(&self, dir: &Utf8Path) -> Result<(), MirrorError> {
        fs::create_dir_all(dir.as_std_path())
            .map_err(|err| MirrorError::Filesystem(err.to_string()))
    }

    pub fn exists(&self, path: &Utf8Path) -> bool {
        path.as_std_path().exists()
    }
}
