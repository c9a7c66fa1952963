use crate::error::{ESResult, UserMessage};
use derive_more::Display;
use error_stack::{Report, ResultExt};
use flate2::read::GzDecoder;
use std::error::Error;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Display)]
pub enum ArchiveError {
    #[display("Unsupported archive format")]
    Unsupported,
    #[display("Failed to extract archive")]
    Extract,
}

impl Error for ArchiveError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ArchiveKind {
    #[display("tar")]
    Tar,
    #[display("tar.gz")]
    TarGz,
    #[display("zip")]
    Zip,
    #[display("7z")]
    SevenZip,
}

impl ArchiveKind {
    /// Infer the kind from a file name or URL.
    pub fn from_path(path: &str) -> Option<Self> {
        let lower = path.to_ascii_lowercase();
        if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
            Some(Self::TarGz)
        } else if lower.ends_with(".tar") {
            Some(Self::Tar)
        } else if lower.ends_with(".zip") {
            Some(Self::Zip)
        } else if lower.ends_with(".7z") {
            Some(Self::SevenZip)
        } else {
            None
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Tar => "tar",
            Self::TarGz => "tar.gz",
            Self::Zip => "zip",
            Self::SevenZip => "7z",
        }
    }
}

/// Unpack `archive` into `destination` and return the root of the extracted tree: the single
/// top-level directory if there is exactly one entry, otherwise `destination` itself.
pub fn extract(archive: &Path, kind: ArchiveKind, destination: &Path) -> ESResult<PathBuf, ArchiveError> {
    debug!("Extracting {} ({}) into {}", archive.display(), kind, destination.display());
    std::fs::create_dir_all(destination)
        .change_context(ArchiveError::Extract)
        .attach_with(|| format!("Could not create {}", destination.display()))?;
    let file = File::open(archive)
        .change_context(ArchiveError::Extract)
        .attach_with(|| format!("Could not open {}", archive.display()))?;
    let unpacked = match kind {
        ArchiveKind::TarGz => unarchive_tar(GzDecoder::new(file), destination),
        ArchiveKind::Tar => unarchive_tar(file, destination),
        ArchiveKind::Zip => unarchive_zip(file, destination),
        ArchiveKind::SevenZip => Err(Report::new(ArchiveError::Unsupported).attach(
            UserMessage::new(format!(
                "7z archives are not supported: {}",
                archive.display()
            )),
        )),
    };
    unpacked.attach_with(|| format!("Archive: {}", archive.display()))?;

    extracted_root(destination)
}

fn unarchive_tar(reader: impl Read, destination: &Path) -> ESResult<(), ArchiveError> {
    let mut archive = tar::Archive::new(reader);
    archive.set_preserve_permissions(true);
    archive.set_overwrite(true);
    for entry in archive.entries().change_context(ArchiveError::Extract)? {
        let mut entry = entry.change_context(ArchiveError::Extract)?;
        // unpack_in refuses entries that would escape the destination
        entry
            .unpack_in(destination)
            .change_context(ArchiveError::Extract)
            .attach_with(|| {
                format!(
                    "Entry: {}",
                    entry.path().map(|p| p.display().to_string()).unwrap_or_default()
                )
            })?;
    }
    Ok(())
}

fn unarchive_zip(file: File, destination: &Path) -> ESResult<(), ArchiveError> {
    let mut archive = zip::ZipArchive::new(file).change_context(ArchiveError::Extract)?;
    archive
        .extract(destination)
        .change_context(ArchiveError::Extract)?;
    Ok(())
}

fn extracted_root(destination: &Path) -> ESResult<PathBuf, ArchiveError> {
    let entries = destination
        .read_dir()
        .change_context(ArchiveError::Extract)
        .attach("Failed to read extraction directory")?
        .map(|res| res.map(|e| e.path()))
        .collect::<Result<Vec<_>, std::io::Error>>()
        .change_context(ArchiveError::Extract)
        .attach("Failed to read extraction directory entry")?;
    match entries.as_slice() {
        [single] if single.is_dir() => Ok(single.clone()),
        _ => Ok(destination.to_path_buf()),
    }
}
