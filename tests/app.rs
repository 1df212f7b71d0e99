mod common;

use std::fs;
use std::path::Path;
use std::sync::Mutex;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use common::{offset_page, offset_row, project};
use jvo_mirror::app::{Mirror, MirrorOptions, SilentReporter};
use jvo_mirror::archive::ArchiveClient;
use jvo_mirror::domain::DownloadOutcome;
use jvo_mirror::error::MirrorError;
use jvo_mirror::store::MirrorStore;

#[derive(Default)]
struct MockArchive {
    page: String,
    fail_substrings: Vec<String>,
    binary_calls: Mutex<Vec<String>>,
}

impl MockArchive {
    fn with_page(page: String) -> Self {
        Self {
            page,
            ..Self::default()
        }
    }

    fn binary_call_count(&self) -> usize {
        self.binary_calls.lock().unwrap().len()
    }
}

impl ArchiveClient for MockArchive {
    fn fetch_page(&self, _url: &str) -> Result<String, MirrorError> {
        Ok(self.page.clone())
    }

    fn fetch_binary(&self, url: &str, destination: &Path) -> Result<(), MirrorError> {
        self.binary_calls.lock().unwrap().push(url.to_string());
        if self.fail_substrings.iter().any(|s| url.contains(s)) {
            return Err(MirrorError::ArchiveStatus {
                status: 404,
                message: "not found".to_string(),
            });
        }
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(destination, b"payload").unwrap();
        Ok(())
    }
}

fn store_in(temp: &tempfile::TempDir) -> MirrorStore {
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    MirrorStore::new(Some(root)).unwrap()
}

#[test]
fn second_file_run_skips_network_entirely() {
    let temp = tempfile::tempdir().unwrap();
    let client = MockArchive::with_page(offset_page(&[
        offset_row("dataset_1", "NGC_253", "NGC 253", "128 x 128 x 1 x 1", "uid___A001_X1"),
        offset_row("dataset_2", "NGC_1068", "NGC 1068", "64 x 64 x 1 x 1", "uid___A001_X2"),
    ]));
    let mirror = Mirror::new(store_in(&temp), client);
    let project = project();

    let records = mirror.fetch_records(&project, 20).unwrap();
    let first = mirror
        .download_files(&project, &records, &SilentReporter)
        .unwrap();
    assert_eq!(first.len(), 2);
    assert!(first.iter().all(|r| r.outcome == DownloadOutcome::Downloaded));
    assert_eq!(mirror.client().binary_call_count(), 2);

    let second = mirror
        .download_files(&project, &records, &SilentReporter)
        .unwrap();
    assert!(
        second
            .iter()
            .all(|r| r.outcome == DownloadOutcome::AlreadyExists)
    );
    assert_eq!(mirror.client().binary_call_count(), 2);
}

#[test]
fn one_failing_item_never_aborts_the_batch() {
    let temp = tempfile::tempdir().unwrap();
    let mut client = MockArchive::with_page(offset_page(&[
        offset_row("dataset_1", "A", "Target A", "8 x 8 x 1 x 1", "uid___X1"),
        offset_row("dataset_2", "B", "Target B", "8 x 8 x 1 x 1", "uid___X2"),
        offset_row("dataset_3", "C", "Target C", "8 x 8 x 1 x 1", "uid___X3"),
    ]));
    client.fail_substrings = vec!["uid___X2".to_string()];
    let mirror = Mirror::new(store_in(&temp), client);
    let project = project();

    let records = mirror.fetch_records(&project, 20).unwrap();
    let results = mirror
        .download_files(&project, &records, &SilentReporter)
        .unwrap();

    let outcomes: Vec<DownloadOutcome> = results.iter().map(|r| r.outcome).collect();
    assert_eq!(
        outcomes,
        vec![
            DownloadOutcome::Downloaded,
            DownloadOutcome::NotFound,
            DownloadOutcome::Downloaded,
        ]
    );
}

#[test]
fn thumbnails_are_reattempted_every_run() {
    let temp = tempfile::tempdir().unwrap();
    let client = MockArchive::with_page(offset_page(&[offset_row(
        "dataset_1",
        "NGC_253",
        "NGC 253",
        "128 x 128 x 1 x 1",
        "uid___A001_X1",
    )]));
    let mirror = Mirror::new(store_in(&temp), client);
    let project = project();
    let records = mirror.fetch_records(&project, 20).unwrap();

    mirror
        .download_thumbnails(&project, &records, &SilentReporter)
        .unwrap();
    let second = mirror
        .download_thumbnails(&project, &records, &SilentReporter)
        .unwrap();

    assert_eq!(second[0].outcome, DownloadOutcome::Downloaded);
    assert_eq!(mirror.client().binary_call_count(), 2);
}

#[test]
fn non_continuum_records_produce_no_tasks() {
    let temp = tempfile::tempdir().unwrap();
    let client = MockArchive::with_page(offset_page(&[
        offset_row("dataset_1", "A", "Target A", "128 x 128 x 3 x 2", "uid___X1"),
        offset_row("dataset_2", "B", "Target B", "128 x 128 x 1 x 1", "uid___X2"),
    ]));
    let mirror = Mirror::new(store_in(&temp), client);
    let project = project();
    let records = mirror.fetch_records(&project, 20).unwrap();

    let results = mirror
        .download_files(&project, &records, &SilentReporter)
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].key, "member.uid___X2");
}

#[test]
fn file_task_url_and_destination_for_bare_uid() {
    let temp = tempfile::tempdir().unwrap();
    let client = MockArchive::with_page(offset_page(&[offset_row(
        "dataset_42",
        "SRC_42",
        "Target 42",
        "64 x 64 x 1 x 1",
        "uid://A1/B2/C3",
    )]));
    let mirror = Mirror::new(store_in(&temp), client);
    let project = project();
    let records = mirror.fetch_records(&project, 20).unwrap();

    let results = mirror
        .download_files(&project, &records, &SilentReporter)
        .unwrap();

    assert_eq!(results.len(), 1);
    let url = mirror.client().binary_calls.lock().unwrap()[0].clone();
    assert!(url.ends_with("member.uid://A1/B2/C3"));
    assert!(
        results[0]
            .path
            .ends_with("Files/2017.1.01310.S/member.uid://A1/B2/C3")
    );
}

#[test]
fn mirror_runs_both_batches_and_counts_outcomes() {
    let temp = tempfile::tempdir().unwrap();
    let client = MockArchive::with_page(offset_page(&[
        offset_row("dataset_1", "A", "Target A", "8 x 8 x 1 x 1", "uid___X1"),
        offset_row("dataset_2", "B", "Target B", "8 x 8 x 1 x 1", "uid___X2"),
    ]));
    let mirror = Mirror::new(store_in(&temp), client);
    let project = project();

    let summary = mirror
        .mirror(&project, MirrorOptions::default(), &SilentReporter)
        .unwrap();

    assert_eq!(summary.records, 2);
    assert_eq!(summary.thumbnails.len(), 2);
    assert_eq!(summary.files.len(), 2);
    assert_eq!(summary.count(DownloadOutcome::Downloaded), 4);
    assert_eq!(summary.count(DownloadOutcome::NotFound), 0);
}

#[test]
fn images_only_skips_file_batch() {
    let temp = tempfile::tempdir().unwrap();
    let client = MockArchive::with_page(offset_page(&[offset_row(
        "dataset_1",
        "A",
        "Target A",
        "8 x 8 x 1 x 1",
        "uid___X1",
    )]));
    let mirror = Mirror::new(store_in(&temp), client);
    let options = MirrorOptions {
        images: true,
        files: false,
        ..MirrorOptions::default()
    };

    let summary = mirror
        .mirror(&project(), options, &SilentReporter)
        .unwrap();
    assert_eq!(summary.thumbnails.len(), 1);
    assert!(summary.files.is_empty());
}

#[test]
fn missing_table_is_fatal() {
    let temp = tempfile::tempdir().unwrap();
    let client = MockArchive::with_page("<html><body><p>down</p></body></html>".to_string());
    let mirror = Mirror::new(store_in(&temp), client);

    let err = mirror.fetch_records(&project(), 20).unwrap_err();
    assert_matches!(err, MirrorError::MissingTable(_));
}
