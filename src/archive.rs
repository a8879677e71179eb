//! Archive codec seam.
//!
//! The extractor talks to archives through [`ArchiveOpener`] and
//! [`ArchiveReader`] so tests can substitute doubles; the production
//! implementation is backed by the `zip` crate. A reader owns the archive's
//! file handle and releases it on drop, on every exit path, so the sweeper
//! never runs while the archive is still locked.

use crate::error::{Result, UpdateError};
use std::path::{Path, PathBuf};

/// One entry inside an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Raw archive path (`/`-separated, as stored in the archive).
    pub name: String,
    /// The entry's path relative to the archive root.
    pub relative_path: PathBuf,
    /// Whether the entry is a directory.
    pub is_dir: bool,
}

impl ArchiveEntry {
    /// A file entry with the given archive path.
    pub fn file(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            relative_path: PathBuf::from(name),
            is_dir: false,
        }
    }

    /// A directory entry with the given archive path.
    pub fn dir(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            relative_path: PathBuf::from(name),
            is_dir: true,
        }
    }

    /// True when the entry's immediate parent directory equals `dir_name`.
    ///
    /// Only the direct parent counts: `Updater/helper.exe` is under
    /// `Updater`, `Updater/plugins/x.dll` is not.
    pub fn is_under(&self, dir_name: &str) -> bool {
        self.relative_path
            .parent()
            .is_some_and(|p| p == Path::new(dir_name))
    }
}

/// An open archive. Dropping the reader releases the underlying handle.
pub trait ArchiveReader {
    /// Enumerate all entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive cannot be read.
    fn entries(&mut self) -> Result<Vec<ArchiveEntry>>;

    /// Extract one entry under `target_dir`, preserving the entry's relative
    /// path and silently overwriting any existing file.
    ///
    /// # Errors
    ///
    /// Returns an error on any read or write failure; permission errors
    /// surface as `std::io::ErrorKind::PermissionDenied`.
    fn extract(&mut self, entry: &ArchiveEntry, target_dir: &Path) -> Result<()>;
}

/// Opens archives for the extractor.
pub trait ArchiveOpener {
    /// Open the archive at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or is not a valid
    /// archive.
    fn open(&self, path: &Path) -> Result<Box<dyn ArchiveReader>>;
}

/// Production opener for zip archives.
pub struct ZipOpener;

impl ArchiveOpener for ZipOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn ArchiveReader>> {
        let file = std::fs::File::open(path)?;
        let archive = zip::ZipArchive::new(file).map_err(zip_to_io)?;
        Ok(Box::new(ZipReader { archive }))
    }
}

/// Zip-backed archive reader.
struct ZipReader {
    archive: zip::ZipArchive<std::fs::File>,
}

impl ArchiveReader for ZipReader {
    fn entries(&mut self) -> Result<Vec<ArchiveEntry>> {
        let mut entries = Vec::with_capacity(self.archive.len());
        for i in 0..self.archive.len() {
            let file = self.archive.by_index(i).map_err(zip_to_io)?;
            // Entries escaping the archive root are skipped, not extracted.
            let Some(relative_path) = file.enclosed_name() else {
                tracing::warn!(name = file.name(), "skipping unsafe archive entry");
                continue;
            };
            entries.push(ArchiveEntry {
                name: file.name().to_owned(),
                relative_path,
                is_dir: file.is_dir(),
            });
        }
        Ok(entries)
    }

    fn extract(&mut self, entry: &ArchiveEntry, target_dir: &Path) -> Result<()> {
        let out_path = target_dir.join(&entry.relative_path);

        if entry.is_dir {
            std::fs::create_dir_all(&out_path)?;
            return Ok(());
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut src = self.archive.by_name(&entry.name).map_err(zip_to_io)?;
        // File::create truncates: existing files are overwritten silently.
        let mut out = std::fs::File::create(&out_path)?;
        std::io::copy(&mut src, &mut out)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = src.unix_mode() {
                std::fs::set_permissions(&out_path, std::fs::Permissions::from_mode(mode))?;
            }
        }

        Ok(())
    }
}

fn zip_to_io(e: zip::result::ZipError) -> UpdateError {
    match e {
        zip::result::ZipError::Io(io) => UpdateError::Io(io),
        other => UpdateError::Io(std::io::Error::other(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use std::io::Write;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    fn write_test_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = std::fs::File::create(path).unwrap();
        let mut zip = ZipWriter::new(file);
        for (name, bytes) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(bytes).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn is_under_checks_immediate_parent_only() {
        assert!(ArchiveEntry::file("Updater/helper.exe").is_under("Updater"));
        assert!(!ArchiveEntry::file("cadence.exe").is_under("Updater"));
        assert!(!ArchiveEntry::file("Updater/plugins/x.dll").is_under("Updater"));
        assert!(!ArchiveEntry::file("other/Updater/x.dll").is_under("Updater"));
    }

    #[test]
    fn zip_reader_enumerates_entries() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("test.zip");
        write_test_zip(&archive, &[("cadence.exe", b"app"), ("Updater/helper.exe", b"helper")]);

        let mut reader = ZipOpener.open(&archive).unwrap();
        let entries = reader.entries().unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["cadence.exe", "Updater/helper.exe"]);
        assert!(entries.iter().all(|e| !e.is_dir));
    }

    #[test]
    fn zip_reader_extracts_preserving_relative_path() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("test.zip");
        write_test_zip(&archive, &[("Updater/helper.exe", b"helper")]);

        let target = dir.path().join("out");
        let mut reader = ZipOpener.open(&archive).unwrap();
        let entries = reader.entries().unwrap();
        reader.extract(&entries[0], &target).unwrap();

        let extracted = target.join("Updater").join("helper.exe");
        assert_eq!(std::fs::read(extracted).unwrap(), b"helper");
    }

    #[test]
    fn zip_reader_overwrites_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("test.zip");
        write_test_zip(&archive, &[("cadence.exe", b"new")]);

        let target = dir.path().join("out");
        std::fs::create_dir_all(&target).unwrap();
        std::fs::write(target.join("cadence.exe"), b"old").unwrap();

        let mut reader = ZipOpener.open(&archive).unwrap();
        let entries = reader.entries().unwrap();
        reader.extract(&entries[0], &target).unwrap();

        assert_eq!(std::fs::read(target.join("cadence.exe")).unwrap(), b"new");
    }

    #[test]
    fn opening_a_non_archive_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not-a.zip");
        std::fs::write(&path, b"plain text").unwrap();
        assert!(ZipOpener.open(&path).is_err());
    }

    #[test]
    fn opening_a_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ZipOpener.open(&dir.path().join("missing.zip")).is_err());
    }
}
