use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::archive::ArchiveClient;
use crate::domain::{DatasetRecord, DownloadOutcome, ProjectCode};
use crate::error::MirrorError;
use crate::extract::ProjectTable;
use crate::links;
use crate::store::MirrorStore;

#[derive(Debug, Clone, Copy)]
pub struct MirrorOptions {
    pub images: bool,
    pub files: bool,
    pub limit: u32,
}

impl Default for MirrorOptions {
    fn default() -> Self {
        Self {
            images: true,
            files: true,
            limit: links::DEFAULT_PAGE_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemResult {
    pub key: String,
    pub outcome: DownloadOutcome,
    pub path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MirrorSummary {
    pub project: String,
    pub started_at: String,
    pub finished_at: String,
    pub records: usize,
    pub thumbnails: Vec<ItemResult>,
    pub files: Vec<ItemResult>,
}

impl MirrorSummary {
    pub fn count(&self, outcome: DownloadOutcome) -> usize {
        self.thumbnails
            .iter()
            .chain(self.files.iter())
            .filter(|item| item.outcome == outcome)
            .count()
    }
}

pub trait Reporter {
    fn note(&self, message: &str);
    fn item(&self, item: &ItemResult);
}

/// Reporter that says nothing; used for `--quiet` runs.
pub struct SilentReporter;

impl Reporter for SilentReporter {
    fn note(&self, _message: &str) {}
    fn item(&self, _item: &ItemResult) {}
}

pub struct Mirror<C: ArchiveClient> {
    store: MirrorStore,
    client: C,
}

impl<C: ArchiveClient> Mirror<C> {
    pub fn new(store: MirrorStore, client: C) -> Self {
        Self { store, client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Fetch the project results page and extract its records in table
    /// row order. Transport failures here are fatal: without the table
    /// there is nothing to mirror.
    pub fn fetch_records(
        &self,
        project: &ProjectCode,
        limit: u32,
    ) -> Result<Vec<DatasetRecord>, MirrorError> {
        let url = links::listing_url(project, limit, 0);
        tracing::debug!(%project, url, "fetching project results page");
        let page = self.client.fetch_page(&url)?;
        let table = ProjectTable::from_page(&page, project)?;
        Ok(table.records())
    }

    /// Thumbnails are keyed by source name and are always re-attempted;
    /// unlike data files there is no on-disk existence check. The
    /// quicklook endpoint regenerates images, so a stale thumbnail is
    /// refreshed on every run.
    pub fn download_thumbnails(
        &self,
        project: &ProjectCode,
        records: &[DatasetRecord],
        reporter: &dyn Reporter,
    ) -> Result<Vec<ItemResult>, MirrorError> {
        let dir = self.store.images_dir(project);
        let mut results = Vec::new();
        for record in records.iter().filter(|r| r.is_continuum()) {
            self.store.ensure_dir(&dir)?;
            let destination = self.store.thumbnail_path(project, &record.source_name);
            let url = links::thumbnail_url(&record.source_name);
            let outcome = match self.client.fetch_binary(&url, destination.as_std_path()) {
                Ok(()) => DownloadOutcome::Downloaded,
                Err(err) => {
                    tracing::debug!(source = %record.source_name, %err, "thumbnail retrieval failed");
                    DownloadOutcome::NotFound
                }
            };
            let item = ItemResult {
                key: record.source_name.clone(),
                outcome,
                path: destination.into_string(),
            };
            reporter.item(&item);
            results.push(item);
        }
        Ok(results)
    }

    /// Data files are keyed by normalized member uid. A file already on
    /// disk is reported as such and costs no network call, which is
    /// what makes re-running a partially failed batch cheap.
    pub fn download_files(
        &self,
        project: &ProjectCode,
        records: &[DatasetRecord],
        reporter: &dyn Reporter,
    ) -> Result<Vec<ItemResult>, MirrorError> {
        let dir = self.store.files_dir(project);
        reporter.note(&format!("DOWNLOADING FILES TO: {dir}"));
        let mut results = Vec::new();
        for record in records.iter().filter(|r| r.is_continuum()) {
            self.store.ensure_dir(&dir)?;
            let destination = self.store.file_path(project, &record.member_uid);
            let outcome = if self.store.exists(&destination) {
                DownloadOutcome::AlreadyExists
            } else {
                let url = links::file_url(&record.member_uid);
                match self.client.fetch_binary(&url, destination.as_std_path()) {
                    Ok(()) => DownloadOutcome::Downloaded,
                    Err(err) => {
                        tracing::debug!(uid = %record.member_uid, %err, "file retrieval failed");
                        DownloadOutcome::NotFound
                    }
                }
            };
            let item = ItemResult {
                key: record.member_uid.as_str().to_string(),
                outcome,
                path: destination.into_string(),
            };
            reporter.item(&item);
            results.push(item);
        }
        Ok(results)
    }

    /// Full pipeline for one project: one extraction pass, then the
    /// download batches selected by the options.
    pub fn mirror(
        &self,
        project: &ProjectCode,
        options: MirrorOptions,
        reporter: &dyn Reporter,
    ) -> Result<MirrorSummary, MirrorError> {
        let started_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let records = self.fetch_records(project, options.limit)?;

        let thumbnails = if options.images {
            self.download_thumbnails(project, &records, reporter)?
        } else {
            Vec::new()
        };
        let files = if options.files {
            self.download_files(project, &records, reporter)?
        } else {
            Vec::new()
        };

        Ok(MirrorSummary {
            project: project.to_string(),
            started_at,
            finished_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            records: records.len(),
            thumbnails,
            files,
        })
    }
}
