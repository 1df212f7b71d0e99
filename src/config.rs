use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::domain::ProjectCode;
use crate::error::MirrorError;
use crate::links::DEFAULT_PAGE_LIMIT;

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub projects: Vec<ProjectEntry>,
    #[serde(default)]
    pub dest: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ProjectEntry {
    Shorthand(String),
    Detailed(ProjectEntryObject),
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ProjectEntryObject {
    pub code: String,
    #[serde(default)]
    pub images: Option<bool>,
    #[serde(default)]
    pub files: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct ProjectRequest {
    pub code: ProjectCode,
    pub images: bool,
    pub files: bool,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub projects: Vec<ProjectRequest>,
    pub dest: Option<Utf8PathBuf>,
    pub limit: u32,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, MirrorError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from("jvo-mirror.json"),
        };

        if path.is_none() && !config_path.exists() {
            return Err(MirrorError::MissingConfig);
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| MirrorError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| MirrorError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, MirrorError> {
        let schema_version = config.schema_version.unwrap_or(1);

        let projects = config
            .projects
            .into_iter()
            .map(|entry| match entry {
                ProjectEntry::Shorthand(value) => Ok(ProjectRequest {
                    code: value.parse()?,
                    images: true,
                    files: true,
                }),
                ProjectEntry::Detailed(obj) => Ok(ProjectRequest {
                    code: obj.code.parse()?,
                    images: obj.images.unwrap_or(true),
                    files: obj.files.unwrap_or(true),
                }),
            })
            .collect::<Result<Vec<_>, MirrorError>>()?;

        Ok(ResolvedConfig {
            schema_version,
            projects,
            dest: config.dest.map(Utf8PathBuf::from),
            limit: config.limit.unwrap_or(DEFAULT_PAGE_LIMIT),
        })
    }
}
