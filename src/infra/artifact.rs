// ============================================================
// Layer 6 — Artifact Packaging
// ============================================================
// A finished run directory becomes one archive:
//
//   model_artifacts__<timestamp>__<tag>.tar.gz
//     └── artifacts/
//           ├── boda_checkpoint.json
//           └── metrics.csv ...
//
// The archive is written to a staging directory outside the run
// directory, then deposited: cloud URIs go through CloudCopier,
// local paths get a plain copy (directory created on demand).

use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use std::{
    fs::{self, File},
    io::Read,
    path::{Path, PathBuf},
};

use crate::domain::error::{BodaError, Result};
use crate::infra::checkpoint::RunStamp;
use crate::infra::transfer::{is_cloud_uri, CloudCopier};

/// Top-level directory inside every archive
pub const ARCHIVE_ROOT: &str = "artifacts";

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

pub fn archive_name(stamp: &RunStamp) -> String {
    format!("model_artifacts__{}__{}.tar.gz", stamp.timestamp, stamp.random_tag)
}

/// Tar + gzip `work_dir` as `artifacts/` into `staging_dir/<name>`
pub fn package(work_dir: &Path, staging_dir: &Path, name: &str) -> Result<PathBuf> {
    if !work_dir.is_dir() {
        return Err(BodaError::Data(format!(
            "run directory '{}' does not exist",
            work_dir.display()
        )));
    }
    fs::create_dir_all(staging_dir)?;
    let archive_path = staging_dir.join(name);

    let encoder = GzEncoder::new(File::create(&archive_path)?, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.append_dir_all(ARCHIVE_ROOT, work_dir)?;
    builder.into_inner()?.finish()?;

    tracing::info!("Packaged '{}' into '{}'", work_dir.display(), archive_path.display());
    Ok(archive_path)
}

/// Copy or upload the archive to `destination`; returns where it landed
pub fn deposit(archive: &Path, destination: &str) -> Result<String> {
    deposit_via(archive, destination, CloudCopier::for_uri(destination))
}

/// `deposit` with an explicit copier for cloud destinations
pub fn deposit_via(archive: &Path, destination: &str, copier: Option<CloudCopier>) -> Result<String> {
    let file_name = archive
        .file_name()
        .ok_or_else(|| BodaError::ArchiveInvalid {
            path:   archive.to_path_buf(),
            reason: "archive path has no file name".into(),
        })?
        .to_string_lossy()
        .to_string();

    if is_cloud_uri(destination) {
        let target = format!("{}/{}", destination.trim_end_matches('/'), file_name);
        let copier = copier.ok_or_else(|| BodaError::TransferFailed {
            destination: destination.to_string(),
            cause:       "no copy tool for this scheme".into(),
        })?;
        copier.copy(&archive.to_string_lossy(), &target)?;
        tracing::info!("Uploaded artifact to {}", target);
        return Ok(target);
    }

    let dir = Path::new(destination);
    let target = dir.join(&file_name);
    let copy = || -> std::io::Result<bool> {
        fs::create_dir_all(dir)?;
        // copying a file onto itself truncates it
        if target.exists() && fs::canonicalize(&target)? == fs::canonicalize(archive)? {
            return Ok(false);
        }
        fs::copy(archive, &target)?;
        Ok(true)
    };
    let copied = copy().map_err(|e| BodaError::TransferFailed {
        destination: destination.to_string(),
        cause:       e.to_string(),
    })?;
    if copied {
        tracing::info!("Copied artifact to '{}'", target.display());
    } else {
        tracing::info!("Artifact already at '{}'", target.display());
    }
    Ok(target.to_string_lossy().to_string())
}

/// Fails unless `path` is a gzip-compressed tar archive
pub fn validate_archive(path: &Path) -> Result<()> {
    let invalid = |reason: String| BodaError::ArchiveInvalid { path: path.to_path_buf(), reason };

    if !path.is_file() {
        return Err(invalid("could not find file at expected path".into()));
    }

    let mut magic = [0u8; 2];
    File::open(path)?
        .read_exact(&mut magic)
        .map_err(|_| invalid("file is too short".into()))?;
    if magic != GZIP_MAGIC {
        return Err(invalid("not gzip-compressed".into()));
    }

    let mut archive = tar::Archive::new(GzDecoder::new(File::open(path)?));
    let mut entries = 0usize;
    for entry in archive.entries().map_err(|e| invalid(format!("not a tar archive: {e}")))? {
        entry.map_err(|e| invalid(format!("corrupt tar entry: {e}")))?;
        entries += 1;
    }
    if entries == 0 {
        return Err(invalid("archive is empty".into()));
    }
    Ok(())
}

/// Validate and extract into `dest_dir`; returns `dest_dir/artifacts`
pub fn extract(archive_path: &Path, dest_dir: &Path) -> Result<PathBuf> {
    validate_archive(archive_path)?;
    fs::create_dir_all(dest_dir)?;
    let mut archive = tar::Archive::new(GzDecoder::new(File::open(archive_path)?));
    archive.unpack(dest_dir)?;
    tracing::info!("Extracted '{}' into '{}'", archive_path.display(), dest_dir.display());
    Ok(dest_dir.join(ARCHIVE_ROOT))
}

/// Fetch (if remote), validate and extract an artifact.
///
/// Cloud URIs are downloaded into `download_dir` first.
pub fn unpack_artifact(artifact_path: &str, download_dir: &Path) -> Result<PathBuf> {
    unpack_artifact_via(artifact_path, download_dir, CloudCopier::for_uri(artifact_path))
}

/// `unpack_artifact` with an explicit copier for cloud sources
pub fn unpack_artifact_via(
    artifact_path: &str,
    download_dir:  &Path,
    copier:        Option<CloudCopier>,
) -> Result<PathBuf> {
    let local = if is_cloud_uri(artifact_path) {
        fs::create_dir_all(download_dir)?;
        let copier = copier.ok_or_else(|| BodaError::TransferFailed {
            destination: download_dir.display().to_string(),
            cause:       "no copy tool for this scheme".into(),
        })?;
        copier.copy(artifact_path, &download_dir.to_string_lossy())?;
        download_dir.join(remote_file_name(artifact_path))
    } else {
        PathBuf::from(artifact_path)
    };

    extract(&local, download_dir)
}

/// Last path segment of a cloud URI
fn remote_file_name(uri: &str) -> &str {
    uri.trim_end_matches('/').rsplit('/').next().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("boda-{tag}-{}", rand::random::<u32>()))
    }

    fn stamp() -> RunStamp {
        RunStamp { timestamp: "20240102_030405".into(), random_tag: 654321 }
    }

    #[test]
    fn test_archive_name() {
        assert_eq!(archive_name(&stamp()), "model_artifacts__20240102_030405__654321.tar.gz");
    }

    #[test]
    fn test_package_deposit_unpack_round_trip() {
        let root = temp_dir("artifact");
        let work = root.join("work");
        fs::create_dir_all(work.join("nested")).unwrap();
        fs::write(work.join("boda_checkpoint.json"), b"{}").unwrap();
        fs::write(work.join("nested/metrics.csv"), b"epoch\n").unwrap();

        let archive = package(&work, &root.join("staging"), &archive_name(&stamp())).unwrap();
        validate_archive(&archive).unwrap();

        let deposited = deposit(&archive, &root.join("dest/deeper").to_string_lossy()).unwrap();
        assert!(Path::new(&deposited).is_file());

        let extracted = unpack_artifact(&deposited, &root.join("restore")).unwrap();
        assert!(extracted.ends_with(ARCHIVE_ROOT));
        assert_eq!(fs::read(extracted.join("boda_checkpoint.json")).unwrap(), b"{}");
        assert_eq!(fs::read(extracted.join("nested/metrics.csv")).unwrap(), b"epoch\n");

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_missing_archive_is_rejected() {
        let err = validate_archive(&temp_dir("missing").join("x.tar.gz")).unwrap_err();
        assert!(matches!(err, BodaError::ArchiveInvalid { .. }));
    }

    #[test]
    fn test_plain_file_is_rejected() {
        let root = temp_dir("plain");
        fs::create_dir_all(&root).unwrap();
        let path = root.join("model.tar.gz");
        fs::write(&path, b"definitely not an archive").unwrap();
        assert!(matches!(validate_archive(&path), Err(BodaError::ArchiveInvalid { .. })));
        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_package_requires_work_dir() {
        let root = temp_dir("nowork");
        assert!(package(&root.join("absent"), &root, "a.tar.gz").is_err());
    }

    #[test]
    fn test_deposit_into_staging_dir_keeps_archive() {
        let root = temp_dir("same");
        let work = root.join("work");
        fs::create_dir_all(&work).unwrap();
        fs::write(work.join("boda_checkpoint.json"), b"{}").unwrap();
        let staging = root.join("staging");
        let archive = package(&work, &staging, &archive_name(&stamp())).unwrap();
        let size = fs::metadata(&archive).unwrap().len();

        let deposited = deposit(&archive, &staging.to_string_lossy()).unwrap();
        assert_eq!(Path::new(&deposited), archive);
        assert_eq!(fs::metadata(&archive).unwrap().len(), size);
        validate_archive(&archive).unwrap();
        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_remote_file_name() {
        assert_eq!(remote_file_name("gs://b/runs/a.tar.gz"), "a.tar.gz");
        assert_eq!(remote_file_name("s3://b/a.tar.gz/"), "a.tar.gz");
    }

    #[cfg(unix)]
    fn shell_copier(script: &str) -> CloudCopier {
        use crate::infra::transfer::RetryPolicy;
        use std::time::Duration;

        CloudCopier::with_program("sh", vec!["-c".into(), script.into(), "sh".into()]).with_retry(RetryPolicy {
            max_attempts: 2,
            base_delay:   Duration::from_millis(1),
            max_delay:    Duration::from_millis(2),
        })
    }

    #[cfg(unix)]
    #[test]
    fn test_cloud_deposit_targets_file_under_prefix() {
        let root = temp_dir("upload");
        fs::create_dir_all(&root).unwrap();
        let archive = root.join(archive_name(&stamp()));
        fs::write(&archive, b"x").unwrap();
        let record = root.join("dst.txt");

        let copier = shell_copier(&format!("printf '%s' \"$2\" > '{}'", record.display()));
        let target = deposit_via(&archive, "gs://bucket/models/", Some(copier)).unwrap();

        let expected = "gs://bucket/models/model_artifacts__20240102_030405__654321.tar.gz";
        assert_eq!(target, expected);
        assert_eq!(fs::read_to_string(&record).unwrap(), expected);
        fs::remove_dir_all(&root).ok();
    }

    #[cfg(unix)]
    #[test]
    fn test_cloud_deposit_failure_is_transfer_error() {
        let root = temp_dir("upload-fail");
        fs::create_dir_all(&root).unwrap();
        let archive = root.join("a.tar.gz");
        fs::write(&archive, b"x").unwrap();

        let err = deposit_via(&archive, "s3://bucket", Some(shell_copier("exit 1"))).unwrap_err();
        assert!(matches!(err, BodaError::TransferFailed { .. }));
        fs::remove_dir_all(&root).ok();
    }

    #[cfg(unix)]
    #[test]
    fn test_cloud_unpack_downloads_then_extracts() {
        let root = temp_dir("download");
        let work = root.join("work");
        fs::create_dir_all(&work).unwrap();
        fs::write(work.join("boda_checkpoint.json"), b"{}").unwrap();
        let name = archive_name(&stamp());
        let archive = package(&work, &root.join("bucket"), &name).unwrap();

        // stands in for the bucket: copies the local archive to the destination
        let copier = shell_copier(&format!("cp '{}' \"$2\"", archive.display()));
        let uri = format!("gs://bucket/runs/{name}");
        let extracted = unpack_artifact_via(&uri, &root.join("dl"), Some(copier)).unwrap();

        assert!(root.join("dl").join(&name).is_file());
        assert_eq!(fs::read(extracted.join("boda_checkpoint.json")).unwrap(), b"{}");
        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_cloud_unpack_without_copy_tool() {
        let root = temp_dir("no-tool");
        let copier = CloudCopier::with_program("boda-no-such-copy-tool", vec!["cp".into()]);
        let err = unpack_artifact_via("gs://bucket/a.tar.gz", &root, Some(copier)).unwrap_err();
        match err {
            BodaError::TransferFailed { cause, .. } => assert!(cause.contains("not found")),
            other => panic!("expected transfer failure, got {other:?}"),
        }
        fs::remove_dir_all(&root).ok();
    }
}
