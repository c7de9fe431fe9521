//! Overlap between a new-data batch and the site archive.

use std::collections::BTreeSet;
use std::path::Path;

use crate::report::{Finding, FindingKind, Report, Section};
use crate::scanner::{child_dirs, ensure_dir, folder_key, Walker, WalkerConfig};
use crate::site::Site;

use super::CheckError;

/// List every file under `<archive_root>/<site>` whose name also occurs in
/// `new_data`.
///
/// The first-level folders of `new_data` are subject IDs and must all
/// belong to `site`; otherwise nothing is scanned.
///
/// # Errors
///
/// Returns [`CheckError::Scan`] for a missing path and
/// [`CheckError::Site`] when the subject IDs do not match `site`.
pub fn check_archive(new_data: &Path, archive_root: &Path, site: Site) -> Result<Report, CheckError> {
    ensure_dir(new_data)?;
    let site_dir = archive_root.join(site.name());
    ensure_dir(&site_dir)?;

    let subjects: Vec<String> = child_dirs(new_data)?.iter().map(|d| folder_key(d)).collect();
    site.check_all(subjects.iter().map(String::as_str))?;

    let new_names: BTreeSet<String> = Walker::new(new_data, WalkerConfig::default())
        .files()
        .iter()
        .map(|p| folder_key(p))
        .collect();
    log::debug!("{} file names in {}", new_names.len(), new_data.display());

    let overlaps: Vec<Finding> = Walker::new(&site_dir, WalkerConfig::default())
        .files()
        .into_iter()
        .filter(|p| new_names.contains(&folder_key(p)))
        .map(|p| Finding::new(FindingKind::AlreadyInArchive, p.display().to_string()).with_path(&p))
        .collect();

    let mut section = Section::new("ARCHIVE OVERLAP", "All files are unique");
    if !overlaps.is_empty() {
        section.push(Finding::note(format!(
            "The following files already exist in {}...",
            site_dir.display()
        )));
    }
    section.findings.extend(overlaps);

    let mut report = Report::new(new_data.display().to_string());
    report.push(section);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::SiteError;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, std::path::PathBuf, std::path::PathBuf) {
        let tmp = TempDir::new().unwrap();
        let new_data = tmp.path().join("new");
        let archive = tmp.path().join("archive");
        fs::create_dir_all(new_data.join("40001001")).unwrap();
        fs::create_dir_all(archive.join("suny/40001001")).unwrap();
        (tmp, new_data, archive)
    }

    #[test]
    fn test_unique_files() {
        let (_tmp, new_data, archive) = setup();
        fs::write(new_data.join("40001001/40001001_a.xml"), b"x").unwrap();
        let report = check_archive(&new_data, &archive, Site::Suny).unwrap();
        assert_eq!(report.problem_count(), 0);
        assert_eq!(report.sections[0].summary_line(), "All files are unique");
    }

    #[test]
    fn test_overlap_reported() {
        let (_tmp, new_data, archive) = setup();
        fs::write(new_data.join("40001001/40001001_a.xml"), b"x").unwrap();
        fs::write(archive.join("suny/40001001/40001001_a.xml"), b"y").unwrap();
        let report = check_archive(&new_data, &archive, Site::Suny).unwrap();
        let hits = report.of_kind(FindingKind::AlreadyInArchive);
        assert_eq!(hits.len(), 1);
        assert!(hits[0].message.ends_with("40001001_a.xml"));
    }

    #[test]
    fn test_wrong_site_aborts() {
        let (_tmp, new_data, archive) = setup();
        fs::create_dir_all(archive.join("iowa")).unwrap();
        let err = check_archive(&new_data, &archive, Site::Iowa).unwrap_err();
        assert!(matches!(err, CheckError::Site(SiteError::Mismatch { .. })));
    }
}
