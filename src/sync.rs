use crate::error::TrendsError;
use crate::storage::ObjectStore;
use crate::types::{RegionCode, SyncReport};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use std::path::Path;

/// Remote folder the collector's CSVs are uploaded under.
pub const REMOTE_PREFIX: &str = "data";

pub fn filter_list(items: &[String], pattern: &str) -> Vec<String> {
    items.iter().filter(|s| s.contains(pattern)).cloned().collect()
}

/// Names of the files in `dir` ending with `.{extension}`.
pub fn list_local_files(dir: &Path, extension: &str) -> Result<Vec<String>, TrendsError> {
    let suffix = format!(".{}", extension);
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if name.ends_with(&suffix) {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

/// Blobs whose name without `prefix` is not among the local file names.
pub fn check_downloaded(blobs: &[String], local: &[String], prefix: &str) -> Vec<String> {
    blobs
        .iter()
        .filter(|blob| {
            let name = blob.strip_prefix(prefix).unwrap_or(blob.as_str());
            !local.iter().any(|l| l == name)
        })
        .cloned()
        .collect()
}

/// Total size in bytes of the files in `dir` ending with `.{extension}`.
pub fn local_size(dir: &Path, extension: &str) -> Result<u64, TrendsError> {
    let mut total = 0;
    for name in list_local_files(dir, extension)? {
        total += std::fs::metadata(dir.join(name))?.len();
    }
    Ok(total)
}

fn file_name(blob: &str) -> &str {
    blob.rsplit('/').next().unwrap_or(blob)
}

/// Mirrors the region's CSVs from `bucket` into `{data_root}/{region}`.
/// Files already present locally by name are never fetched again.
pub async fn sync_region<S: ObjectStore + ?Sized>(
    store: &S,
    bucket: &str,
    region: &str,
    data_root: &Path,
) -> Result<SyncReport, TrendsError> {
    let region: RegionCode = region.parse()?;

    let local_dir = data_root.join(region.as_str());
    tokio::fs::create_dir_all(&local_dir).await?;

    let blobs = store
        .list_objects_with_prefix(bucket, REMOTE_PREFIX, None)
        .await?;
    let regional = filter_list(&blobs, region.as_str());
    let local = list_local_files(&local_dir, "csv")?;
    let missing = check_downloaded(&regional, &local, &format!("{}/", REMOTE_PREFIX));

    if missing.is_empty() {
        info!("All {} blobs already downloaded for {}", regional.len(), region);
    } else {
        info!("Found {} new blobs for {}. Start downloading...", missing.len(), region);
        let pb = create_progress_bar(missing.len() as u64);
        for blob in &missing {
            pb.set_message(file_name(blob).to_string());
            store
                .download_object(bucket, blob, &local_dir.join(file_name(blob)))
                .await?;
            pb.inc(1);
        }
        pb.finish_with_message("done");
    }

    Ok(SyncReport {
        region,
        local_dir,
        remote_matches: regional.len(),
        already_present: regional.len() - missing.len(),
        downloaded: missing,
    })
}

fn create_progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct MemoryStore {
        objects: BTreeMap<String, String>,
        calls: AtomicUsize,
        downloads: AtomicUsize,
    }

    impl MemoryStore {
        fn with(names: &[&str]) -> Self {
            Self {
                objects: names
                    .iter()
                    .map(|n| (n.to_string(), format!("contents of {n}\n")))
                    .collect(),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl ObjectStore for MemoryStore {
        async fn list_objects_with_prefix(
            &self,
            _bucket: &str,
            prefix: &str,
            delimiter: Option<&str>,
        ) -> Result<Vec<String>, TrendsError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .objects
                .keys()
                .filter(|k| k.starts_with(prefix))
                .filter(|k| match delimiter {
                    Some(d) => !k[prefix.len()..].contains(d),
                    None => true,
                })
                .cloned()
                .collect())
        }

        async fn download_object(
            &self,
            _bucket: &str,
            name: &str,
            destination: &Path,
        ) -> Result<u64, TrendsError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.downloads.fetch_add(1, Ordering::SeqCst);
            let body = self.objects.get(name).ok_or_else(|| TrendsError::Storage {
                status: 404,
                message: format!("No such object: {name}"),
            })?;
            std::fs::write(destination, body)?;
            Ok(body.len() as u64)
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn filter_list_keeps_matches() {
        let items = strings(&["US_1", "BR_1", "US_2"]);
        assert_eq!(filter_list(&items, "US"), ["US_1", "US_2"]);
    }

    #[test]
    fn check_downloaded_ignores_prefix() {
        let blobs = strings(&["data/a.csv", "data/b.csv"]);
        let local = strings(&["a.csv"]);
        assert_eq!(check_downloaded(&blobs, &local, "data/"), ["data/b.csv"]);
    }

    #[test]
    fn local_listing_filters_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.csv"), "12345").unwrap();
        std::fs::write(dir.path().join("a.csv"), "123").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        std::fs::create_dir(dir.path().join("nested.csv")).unwrap();

        assert_eq!(list_local_files(dir.path(), "csv").unwrap(), ["a.csv", "b.csv"]);
        assert_eq!(local_size(dir.path(), "csv").unwrap(), 8);
        assert_eq!(local_size(dir.path(), "txt").unwrap(), 7);
    }

    #[tokio::test]
    async fn delimiter_keeps_only_direct_children() {
        let store = MemoryStore::with(&["a/1.txt", "a/b/2.txt"]);

        assert_eq!(
            store.list_objects_with_prefix("bucket", "a/", None).await.unwrap(),
            ["a/1.txt", "a/b/2.txt"]
        );
        assert_eq!(
            store
                .list_objects_with_prefix("bucket", "a/", Some("/"))
                .await
                .unwrap(),
            ["a/1.txt"]
        );
        assert_eq!(store.list_objects("bucket").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn invalid_region_is_rejected_before_any_io() {
        let store = MemoryStore::with(&["data/20230101_US.csv"]);
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("data");

        for region in ["XX", "us", "", "NL"] {
            let err = sync_region(&store, "bucket", region, &root).await.unwrap_err();
            assert!(matches!(err, TrendsError::InvalidRegion(..)));
        }

        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
        assert!(!root.exists());
    }

    #[tokio::test]
    async fn sync_downloads_only_missing_region_files() {
        let store = MemoryStore::with(&[
            "data/20230101_US.csv",
            "data/20230102_US.csv",
            "data/20230101_BR.csv",
        ]);
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("data");
        std::fs::create_dir_all(root.join("US")).unwrap();
        std::fs::write(root.join("US").join("20230101_US.csv"), "local").unwrap();

        let report = sync_region(&store, "bucket", "US", &root).await.unwrap();

        assert_eq!(report.remote_matches, 2);
        assert_eq!(report.already_present, 1);
        assert_eq!(report.downloaded, ["data/20230102_US.csv"]);
        assert_eq!(
            std::fs::read_to_string(root.join("US").join("20230102_US.csv")).unwrap(),
            "contents of data/20230102_US.csv\n"
        );
        // existing files are never replaced
        assert_eq!(
            std::fs::read_to_string(root.join("US").join("20230101_US.csv")).unwrap(),
            "local"
        );
        assert!(!root.join("US").join("20230101_BR.csv").exists());
    }

    #[tokio::test]
    async fn second_sync_downloads_nothing() {
        let store = MemoryStore::with(&["data/20230101_JP.csv", "data/20230102_JP.csv"]);
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested").join("data");

        let first = sync_region(&store, "bucket", "JP", &root).await.unwrap();
        assert_eq!(first.downloaded.len(), 2);
        assert_eq!(store.downloads.load(Ordering::SeqCst), 2);

        let second = sync_region(&store, "bucket", "JP", &root).await.unwrap();
        assert!(second.downloaded.is_empty());
        assert_eq!(second.already_present, 2);
        assert_eq!(store.downloads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn download_failure_propagates() {
        struct Broken;

        #[async_trait]
        impl ObjectStore for Broken {
            async fn list_objects_with_prefix(
                &self,
                _bucket: &str,
                _prefix: &str,
                _delimiter: Option<&str>,
            ) -> Result<Vec<String>, TrendsError> {
                Ok(vec!["data/20230101_CA.csv".to_string()])
            }

            async fn download_object(
                &self,
                _bucket: &str,
                _name: &str,
                _destination: &Path,
            ) -> Result<u64, TrendsError> {
                Err(TrendsError::Storage {
                    status: 403,
                    message: "permission denied".into(),
                })
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let err = sync_region(&Broken, "bucket", "CA", dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, TrendsError::Storage { status: 403, .. }));
    }
}
