// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Home directory backup.
//!
//! A __manifest__ is the ordered listing of files and directories that make
//! up a backup. The [`BackupRunner`] takes that manifest, and streams every
//! item into one gzip compressed tarball.
//!
//! # Run Sequence
//!
//! A run is strictly linear: validate, resolve, archive. Validation checks
//! every manifest item before anything else happens, so a run with one
//! missing item never leaves a partial archive behind. Resolution picks the
//! archive path and refuses to overwrite anything. Archiving then appends
//! each item in manifest order. Any failure ends the run, and there are no
//! retries.
//!
//! # Entry Names
//!
//! Each item is stored under its path relative to the manifest root. So with
//! a root of `/home/blah`, the item `/home/blah/.ssh` is stored as `.ssh`.
//! Items outside of the root keep their absolute path minus the leading
//! slash, the same way tar itself does it. Any `.` or `..` in an item is
//! resolved lexically first, so no entry name ever climbs out of the archive.
//!
//! # Interrupted Runs
//!
//! An I/O failure in the middle of archiving leaves the partially written
//! archive on disk. It is not cleaned up, nor written under a temporary name
//! first. The file that is left behind will fail to extract cleanly.

use crate::{
    config::BackupSettings,
    target::{OutputTarget, TargetError},
};

use chrono::NaiveDate;
use flate2::{write::GzEncoder, Compression};
use indicatif::ProgressBar;
use std::{
    fs::File,
    io::Write,
    path::{Component, Path, PathBuf},
};
use tracing::{debug, info, instrument, warn};

/// Resolved path of the archive a run produces.
pub type ArchiveTarget = OutputTarget;

/// File or directory designated for backup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupItem {
    path: PathBuf,
    entry_name: PathBuf,
}

impl BackupItem {
    /// Construct new backup item relative to target root.
    ///
    /// Relative paths are joined onto the root first. Symbolic links are not
    /// followed while resolving `..`.
    pub fn new(root: impl AsRef<Path>, path: impl AsRef<Path>) -> Self {
        let root = normalize(root.as_ref());
        let root = root.as_path();
        let path = normalize(&root.join(path.as_ref()));
        let entry_name = match path.strip_prefix(root) {
            Ok(relative) if relative.as_os_str().is_empty() => strip_root(&path),
            Ok(relative) => relative.to_path_buf(),
            Err(_) => strip_root(&path),
        };

        Self { path, entry_name }
    }

    /// Path of item on disk.
    pub fn as_path(&self) -> &Path {
        self.path.as_path()
    }

    /// Name of item inside the archive.
    pub fn entry_name(&self) -> &Path {
        self.entry_name.as_path()
    }
}

/// Ordered listing of backup items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupManifest {
    items: Vec<BackupItem>,
}

impl BackupManifest {
    /// Construct new manifest from root and ordered item listing.
    pub fn new(
        root: impl AsRef<Path>,
        items: impl IntoIterator<Item = impl AsRef<Path>>,
    ) -> Self {
        let root = root.as_ref();
        Self {
            items: items
                .into_iter()
                .map(|item| BackupItem::new(root, item))
                .collect(),
        }
    }

    pub fn items(&self) -> &[BackupItem] {
        self.items.as_slice()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl From<&BackupSettings> for BackupManifest {
    fn from(settings: &BackupSettings) -> Self {
        Self::new(&settings.root, &settings.items)
    }
}

/// Backup a fixed manifest into a compressed archive.
#[derive(Debug, Clone)]
pub struct BackupRunner {
    manifest: BackupManifest,
}

impl BackupRunner {
    /// Construct new runner over target manifest.
    pub fn new(manifest: BackupManifest) -> Self {
        Self { manifest }
    }

    pub fn manifest(&self) -> &BackupManifest {
        &self.manifest
    }

    /// List manifest items in configured order.
    pub fn list(&self) -> Vec<&Path> {
        self.manifest
            .items()
            .iter()
            .map(BackupItem::as_path)
            .collect()
    }

    /// Confirm that every manifest item exists.
    ///
    /// Stops at the first missing item. Never writes anything. An empty
    /// manifest is valid, but worth a warning.
    ///
    /// # Errors
    ///
    /// - Return [`BackupError::MissingSource`] on first missing item.
    #[instrument(skip(self), level = "debug")]
    pub fn validate_manifest(&self) -> Result<()> {
        if self.manifest.is_empty() {
            warn!("backup manifest is empty, archive will hold no items");
        }

        for item in self.manifest.items() {
            debug!("validate {:?}", item.as_path().display());
            if !item.as_path().exists() {
                return Err(BackupError::MissingSource {
                    path: item.as_path().to_path_buf(),
                });
            }
        }

        Ok(())
    }

    /// Resolve archive path inside destination directory.
    ///
    /// # Errors
    ///
    /// - Return [`BackupError::InvalidDestination`] if destination is not an
    ///   existing directory.
    /// - Return [`BackupError::InvalidFilename`] if filename is not a plain
    ///   file name.
    /// - Return [`BackupError::TargetExists`] if archive is already present.
    pub fn resolve_target(
        &self,
        destination: impl AsRef<Path>,
        filename: impl AsRef<Path>,
    ) -> Result<ArchiveTarget> {
        Ok(OutputTarget::resolve(destination, filename)?)
    }

    /// Stream every manifest item into a new archive at target path.
    ///
    /// Items are appended one at a time in manifest order. Progress is
    /// reported before each item through both the log and the progress bar.
    /// Log lines are written while the bar is suspended so the two never
    /// overwrite each other. Symbolic links are stored as links.
    ///
    /// # Errors
    ///
    /// - Return [`BackupError::TargetExists`] if archive already exists.
    /// - Return [`BackupError::ArchiveWrite`] if writing fails midway. The
    ///   partial archive is left on disk.
    #[instrument(skip(self, target, bar), level = "debug")]
    pub fn archive(&self, target: &ArchiveTarget, bar: &ProgressBar) -> Result<()> {
        let file = target.create()?;
        let write_error = |source| BackupError::ArchiveWrite {
            source,
            path: target.as_path().to_path_buf(),
        };

        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        builder.follow_symlinks(false);

        bar.set_length(self.manifest.len() as u64);
        for item in self.manifest.items() {
            bar.suspend(|| info!("backing up {}", item.as_path().display()));
            bar.set_message(item.as_path().display().to_string());
            append_item(&mut builder, item).map_err(write_error)?;
            bar.inc(1);
        }

        // INVARIANT: Finish tar, then gzip, then flush file to disk.
        let mut file = builder
            .into_inner()
            .and_then(GzEncoder::finish)
            .map_err(write_error)?;
        file.flush().map_err(write_error)?;
        file.sync_all().map_err(write_error)?;

        Ok(())
    }

    /// Validate, resolve, then archive in one go.
    ///
    /// # Errors
    ///
    /// - Return [`BackupError`] of whichever stage fails first.
    pub fn run(
        &self,
        destination: impl AsRef<Path>,
        filename: impl AsRef<Path>,
        bar: &ProgressBar,
    ) -> Result<ArchiveTarget> {
        bar.suspend(|| self.validate_manifest())?;
        let target = self.resolve_target(destination, filename)?;
        bar.suspend(|| info!("backing up the data to {}", target.as_path().display()));
        self.archive(&target, bar)?;
        bar.suspend(|| info!("backup complete"));

        Ok(target)
    }
}

/// Default archive name for a given day, e.g., `backup__2025_01_31.tar.gz`.
pub fn default_archive_name(day: NaiveDate) -> String {
    day.format("backup__%Y_%m_%d.tar.gz").to_string()
}

fn append_item(builder: &mut tar::Builder<GzEncoder<File>>, item: &BackupItem) -> std::io::Result<()> {
    let metadata = item.as_path().symlink_metadata()?;
    if metadata.is_dir() {
        builder.append_dir_all(item.entry_name(), item.as_path())
    } else {
        builder.append_path_with_name(item.as_path(), item.entry_name())
    }
}

// INVARIANT: Purely lexical, the file system is never consulted.
fn normalize(path: &Path) -> PathBuf {
    let mut normal = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normal.pop() {
                    normal.push(component);
                }
            }
            _ => normal.push(component),
        }
    }

    normal
}

fn strip_root(path: &Path) -> PathBuf {
    path.components()
        .filter(|component| !matches!(component, Component::RootDir | Component::Prefix(_)))
        .collect()
}

/// Backup error types.
#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    /// Manifest item does not exist.
    #[error("backup item {:?} does not exist", path.display())]
    MissingSource { path: PathBuf },

    /// Destination is not an existing directory.
    #[error("destination {:?} is not an existing directory", path.display())]
    InvalidDestination { path: PathBuf },

    /// Archive name is not a plain file name.
    #[error("archive name {:?} must not hold any directory component", name.display())]
    InvalidFilename { name: PathBuf },

    /// Archive would overwrite an existing file.
    #[error("archive {:?} already exists", path.display())]
    TargetExists { path: PathBuf },

    /// Archive cannot be written to.
    #[error("failed to write archive {:?}", path.display())]
    ArchiveWrite {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
}

impl From<TargetError> for BackupError {
    fn from(error: TargetError) -> Self {
        match error {
            TargetError::InvalidDestination { path } => Self::InvalidDestination { path },
            TargetError::InvalidFilename { name } => Self::InvalidFilename { name },
            TargetError::TargetExists { path } => Self::TargetExists { path },
            TargetError::Create { source, path } => Self::ArchiveWrite { source, path },
        }
    }
}

/// Friendly result alias :3
pub type Result<T, E = BackupError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use pretty_assertions::assert_eq;
    use std::{
        collections::BTreeMap,
        fs::{create_dir_all, read_dir, read_to_string, write},
        io::Read,
    };
    use tempfile::TempDir;

    fn extract(path: &Path) -> anyhow::Result<BTreeMap<String, String>> {
        let mut archive = tar::Archive::new(GzDecoder::new(File::open(path)?));
        let mut entries = BTreeMap::new();
        for entry in archive.entries()? {
            let mut entry = entry?;
            if !entry.header().entry_type().is_file() {
                continue;
            }
            let name = entry.path()?.to_string_lossy().into_owned();
            let mut contents = String::new();
            entry.read_to_string(&mut contents)?;
            entries.insert(name, contents);
        }

        Ok(entries)
    }

    #[test]
    fn item_entry_name_relative_to_root() {
        let item = BackupItem::new("/home/blah", ".ssh");
        assert_eq!(item.as_path(), Path::new("/home/blah/.ssh"));
        assert_eq!(item.entry_name(), Path::new(".ssh"));

        let item = BackupItem::new("/home/blah", "/home/blah/Storage/Documents");
        assert_eq!(item.entry_name(), Path::new("Storage/Documents"));
    }

    #[test]
    fn item_outside_root_keeps_absolute_name() {
        let item = BackupItem::new("/home/blah", "/etc/fstab");
        assert_eq!(item.as_path(), Path::new("/etc/fstab"));
        assert_eq!(item.entry_name(), Path::new("etc/fstab"));
    }

    #[test]
    fn item_dot_components_resolve_lexically() {
        let item = BackupItem::new("/home/blah", "../shared/notes.txt");
        assert_eq!(item.as_path(), Path::new("/home/shared/notes.txt"));
        assert_eq!(item.entry_name(), Path::new("home/shared/notes.txt"));

        let item = BackupItem::new("/home/blah/", "./docs/../.ssh");
        assert_eq!(item.as_path(), Path::new("/home/blah/.ssh"));
        assert_eq!(item.entry_name(), Path::new(".ssh"));
    }

    #[test]
    fn list_preserves_manifest_order() {
        let runner = BackupRunner::new(BackupManifest::new("/", ["/a", "/b", "/c"]));
        let expect = vec![Path::new("/a"), Path::new("/b"), Path::new("/c")];
        assert_eq!(runner.list(), expect);
    }

    #[test]
    fn validate_manifest_accepts_existing_items() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        write(dir.path().join("a.txt"), "a")?;
        create_dir_all(dir.path().join("docs"))?;
        let runner = BackupRunner::new(BackupManifest::new(dir.path(), ["a.txt", "docs"]));

        runner.validate_manifest()?;
        assert_eq!(read_dir(dir.path())?.count(), 2);

        Ok(())
    }

    #[test]
    fn missing_item_aborts_before_archiving() -> anyhow::Result<()> {
        let source = TempDir::new()?;
        let out = TempDir::new()?;
        write(source.path().join("a.txt"), "a")?;
        let missing = source.path().join("missing");
        let runner = BackupRunner::new(BackupManifest::new(
            source.path(),
            [source.path().join("a.txt"), missing.clone()],
        ));

        let result = runner.run(out.path(), "x.tar.gz", &ProgressBar::hidden());
        assert!(matches!(
            result,
            Err(BackupError::MissingSource { path }) if path == missing
        ));
        assert_eq!(read_dir(out.path())?.count(), 0);

        Ok(())
    }

    #[test]
    fn resolve_target_maps_error_kinds() -> anyhow::Result<()> {
        let out = TempDir::new()?;
        let runner = BackupRunner::new(BackupManifest::new("/", Vec::<PathBuf>::new()));

        let result = runner.resolve_target(out.path().join("nope"), "x.tar.gz");
        assert!(matches!(result, Err(BackupError::InvalidDestination { .. })));

        let result = runner.resolve_target(out.path(), "nope/x.tar.gz");
        assert!(matches!(result, Err(BackupError::InvalidFilename { .. })));

        write(out.path().join("x.tar.gz"), "old")?;
        let result = runner.resolve_target(out.path(), "x.tar.gz");
        assert!(matches!(result, Err(BackupError::TargetExists { .. })));

        Ok(())
    }

    #[test]
    fn archive_single_file() -> anyhow::Result<()> {
        let source = TempDir::new()?;
        let out = TempDir::new()?;
        write(source.path().join("a.txt"), "hello world")?;
        let runner = BackupRunner::new(BackupManifest::new(source.path(), ["a.txt"]));

        let target = runner.run(out.path(), "x.tar.gz", &ProgressBar::hidden())?;
        assert_eq!(target.as_path(), out.path().join("x.tar.gz"));

        let result = extract(target.as_path())?;
        let expect = BTreeMap::from([("a.txt".to_string(), "hello world".to_string())]);
        assert_eq!(result, expect);

        Ok(())
    }

    #[test]
    fn archive_reproduces_files_and_directories() -> anyhow::Result<()> {
        let source = TempDir::new()?;
        let out = TempDir::new()?;
        write(source.path().join(".vimrc"), "set nu")?;
        create_dir_all(source.path().join("docs/nested"))?;
        write(source.path().join("docs/one.txt"), "one")?;
        write(source.path().join("docs/nested/two.txt"), "two")?;
        let runner = BackupRunner::new(BackupManifest::new(source.path(), [".vimrc", "docs"]));

        let bar = ProgressBar::hidden();
        let target = runner.run(out.path(), "x.tar.gz", &bar)?;
        assert_eq!(bar.position(), 2);

        let result = extract(target.as_path())?;
        let expect = BTreeMap::from([
            (".vimrc".to_string(), "set nu".to_string()),
            ("docs/nested/two.txt".to_string(), "two".to_string()),
            ("docs/one.txt".to_string(), "one".to_string()),
        ]);
        assert_eq!(result, expect);

        Ok(())
    }

    #[test]
    fn archive_item_above_root_stays_inside_archive() -> anyhow::Result<()> {
        let parent = TempDir::new()?;
        let out = TempDir::new()?;
        let home = parent.path().join("home");
        create_dir_all(&home)?;
        write(parent.path().join("shared.txt"), "shared")?;
        let runner = BackupRunner::new(BackupManifest::new(&home, ["../shared.txt"]));

        let target = runner.run(out.path(), "x.tar.gz", &ProgressBar::hidden())?;

        let result = extract(target.as_path())?;
        let name = strip_root(&parent.path().join("shared.txt"))
            .to_string_lossy()
            .into_owned();
        assert!(!name.contains(".."));
        let expect = BTreeMap::from([(name, "shared".to_string())]);
        assert_eq!(result, expect);

        Ok(())
    }

    #[test]
    fn archive_empty_manifest() -> anyhow::Result<()> {
        let out = TempDir::new()?;
        let runner = BackupRunner::new(BackupManifest::new("/", Vec::<PathBuf>::new()));
        assert!(runner.manifest().is_empty());

        let target = runner.run(out.path(), "x.tar.gz", &ProgressBar::hidden())?;
        assert!(extract(target.as_path())?.is_empty());

        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn archive_stores_symlinks_as_links() -> anyhow::Result<()> {
        let source = TempDir::new()?;
        let out = TempDir::new()?;
        write(source.path().join("real.txt"), "real")?;
        std::os::unix::fs::symlink("real.txt", source.path().join("link.txt"))?;
        let runner = BackupRunner::new(BackupManifest::new(source.path(), ["link.txt"]));

        let target = runner.run(out.path(), "x.tar.gz", &ProgressBar::hidden())?;
        let mut archive = tar::Archive::new(GzDecoder::new(File::open(target.as_path())?));
        let entry = archive.entries()?.next().expect("one entry")?;
        assert!(entry.header().entry_type().is_symlink());
        assert_eq!(
            entry.link_name()?.map(|name| name.into_owned()),
            Some(PathBuf::from("real.txt"))
        );

        Ok(())
    }

    #[test]
    fn second_run_refuses_to_overwrite() -> anyhow::Result<()> {
        let source = TempDir::new()?;
        let out = TempDir::new()?;
        write(source.path().join("a.txt"), "first")?;
        let runner = BackupRunner::new(BackupManifest::new(source.path(), ["a.txt"]));

        let target = runner.run(out.path(), "x.tar.gz", &ProgressBar::hidden())?;
        let before = std::fs::read(target.as_path())?;

        write(source.path().join("a.txt"), "second")?;
        let result = runner.run(out.path(), "x.tar.gz", &ProgressBar::hidden());
        assert!(matches!(result, Err(BackupError::TargetExists { .. })));
        assert_eq!(std::fs::read(target.as_path())?, before);

        // Skipping resolution does not help either.
        let result = runner.archive(&target, &ProgressBar::hidden());
        assert!(matches!(result, Err(BackupError::TargetExists { .. })));
        assert_eq!(read_to_string(source.path().join("a.txt"))?, "second");

        Ok(())
    }

    #[test]
    fn item_vanishing_mid_run_leaves_partial_archive() -> anyhow::Result<()> {
        let source = TempDir::new()?;
        let out = TempDir::new()?;
        write(source.path().join("a.txt"), "a")?;
        let runner = BackupRunner::new(BackupManifest::new(source.path(), ["a.txt", "gone"]));

        let target = runner.resolve_target(out.path(), "x.tar.gz")?;
        let result = runner.archive(&target, &ProgressBar::hidden());
        assert!(matches!(result, Err(BackupError::ArchiveWrite { .. })));
        assert!(target.as_path().exists());

        Ok(())
    }

    #[test]
    fn default_archive_name_is_date_stamped() {
        let day = NaiveDate::from_ymd_opt(2025, 1, 31).expect("valid date");
        assert_eq!(default_archive_name(day), "backup__2025_01_31.tar.gz");
    }
}
