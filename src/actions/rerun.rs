//! Placing one file into a destination folder, with the rerun rule.
//!
//! A file named `X_rr.ext` lands as `X.ext` when no `X.ext` is present.
//! When `X.ext` is present with the same content the rerun was already
//! migrated and is skipped. When it is present with different content the
//! rerun is copied under its own name and flagged for a manual rename.

use std::path::{Path, PathBuf};

use crate::classify::canonical_rerun_name;
use crate::report::{Finding, FindingKind};
use crate::scanner::{folder_key, Hasher};

use super::copy::{copy_new, rename_new, CopyError};

/// What happened to one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Copied under its own name.
    Copied { dest: PathBuf, bytes: u64 },
    /// Rerun copied, then renamed to its canonical name.
    Renamed { dest: PathBuf, bytes: u64 },
    /// Rerun copied verbatim because the canonical name is taken.
    ManualRename {
        dest: PathBuf,
        canonical: PathBuf,
        bytes: u64,
    },
    /// Destination already present; nothing written.
    Exists(PathBuf),
    /// Canonical file already holds this rerun's content.
    AlreadyMigrated(PathBuf),
    /// Rerun copied but the canonical name appeared before the rename.
    RenameCollision { dest: PathBuf, canonical: PathBuf },
    /// Rerun copied but the rename failed; the `_rr` copy is left in place.
    RenameFailed {
        dest: PathBuf,
        canonical: PathBuf,
        bytes: u64,
        reason: String,
    },
}

impl Placement {
    /// Bytes written, zero when the file was skipped.
    #[must_use]
    pub fn bytes(&self) -> u64 {
        match self {
            Self::Copied { bytes, .. }
            | Self::Renamed { bytes, .. }
            | Self::ManualRename { bytes, .. }
            | Self::RenameFailed { bytes, .. } => *bytes,
            Self::RenameCollision { .. } | Self::Exists(_) | Self::AlreadyMigrated(_) => 0,
        }
    }

    /// Destination that received a new file, if any.
    #[must_use]
    pub fn written(&self) -> Option<&Path> {
        match self {
            Self::Copied { dest, .. }
            | Self::Renamed { dest, .. }
            | Self::ManualRename { dest, .. }
            | Self::RenameCollision { dest, .. }
            | Self::RenameFailed { dest, .. } => Some(dest),
            Self::Exists(_) | Self::AlreadyMigrated(_) => None,
        }
    }

    /// Report line for placements a reviewer must see.
    #[must_use]
    pub fn finding(&self, source: &Path) -> Option<Finding> {
        match self {
            Self::Copied { .. } => None,
            Self::Renamed { dest, .. } => Some(Finding::note(format!(
                "Renaming {} => {}",
                folder_key(source),
                folder_key(dest)
            ))),
            Self::ManualRename { dest, canonical, .. } => Some(
                Finding::new(
                    FindingKind::ManualRename,
                    format!(
                        "Tried to remove '_rr' from {} but {} already exists. Copied as is; rename manually.",
                        folder_key(source),
                        canonical.display()
                    ),
                )
                .with_path(dest),
            ),
            Self::Exists(dest) => Some(
                Finding::new(
                    FindingKind::DestinationCollision,
                    format!("{} already exists!", dest.display()),
                )
                .with_path(dest),
            ),
            Self::AlreadyMigrated(canonical) => Some(Finding::note(format!(
                "{} already present as {}",
                folder_key(source),
                canonical.display()
            ))),
            Self::RenameCollision { dest, canonical } => Some(
                Finding::new(
                    FindingKind::DestinationCollision,
                    format!(
                        "Could not rename {} => {}: destination appeared during the run",
                        dest.display(),
                        folder_key(canonical)
                    ),
                )
                .with_path(dest),
            ),
            Self::RenameFailed {
                dest,
                canonical,
                reason,
                ..
            } => Some(
                Finding::new(
                    FindingKind::ManualRename,
                    format!(
                        "Copied {} but could not rename it to {}: {}. Rename manually.",
                        folder_key(source),
                        folder_key(canonical),
                        reason
                    ),
                )
                .with_path(dest),
            ),
        }
    }
}

/// Place `source` into `dest_dir`, never overwriting.
///
/// # Errors
///
/// Returns [`CopyError`] for read/write failures other than an existing
/// destination, which is reported as a [`Placement`].
pub fn place_file(source: &Path, dest_dir: &Path, hasher: &Hasher) -> Result<Placement, CopyError> {
    let name = folder_key(source);
    let dest = dest_dir.join(&name);

    let Some(canonical_name) = canonical_rerun_name(&name) else {
        return match copy_new(source, &dest) {
            Ok(bytes) => Ok(Placement::Copied { dest, bytes }),
            Err(CopyError::DestinationExists(_)) => {
                log::warn!("{} already exists, skipping", dest.display());
                Ok(Placement::Exists(dest))
            }
            Err(e) => Err(e),
        };
    };

    let canonical = dest_dir.join(canonical_name);
    if canonical.exists() {
        if hasher.same_content(source, &canonical)? {
            log::info!("{} already migrated as {}", name, canonical.display());
            return Ok(Placement::AlreadyMigrated(canonical));
        }
        return match copy_new(source, &dest) {
            Ok(bytes) => {
                log::warn!(
                    "{} exists with different content; {} needs a manual rename",
                    canonical.display(),
                    dest.display()
                );
                Ok(Placement::ManualRename {
                    dest,
                    canonical,
                    bytes,
                })
            }
            Err(CopyError::DestinationExists(_)) => Ok(Placement::Exists(dest)),
            Err(e) => Err(e),
        };
    }

    let bytes = match copy_new(source, &dest) {
        Ok(bytes) => bytes,
        Err(CopyError::DestinationExists(_)) => {
            log::warn!("{} already exists, skipping", dest.display());
            return Ok(Placement::Exists(dest));
        }
        Err(e) => return Err(e),
    };
    let renamed = rename_new(&dest, &canonical);
    Ok(after_rename(renamed, dest, canonical, bytes))
}

// The copy at `dest` is already on disk, so no rename outcome is an error.
fn after_rename(
    renamed: Result<(), CopyError>,
    dest: PathBuf,
    canonical: PathBuf,
    bytes: u64,
) -> Placement {
    match renamed {
        Ok(()) => Placement::Renamed {
            dest: canonical,
            bytes,
        },
        Err(CopyError::DestinationExists(_)) => Placement::RenameCollision { dest, canonical },
        Err(e) => {
            log::warn!(
                "Could not rename {} => {}: {}; left in place",
                dest.display(),
                canonical.display(),
                e
            );
            Placement::RenameFailed {
                dest,
                canonical,
                bytes,
                reason: e.to_string(),
            }
        }
    }
}
