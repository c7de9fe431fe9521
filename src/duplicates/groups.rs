//! Duplicate group management.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::report::{Finding, FindingKind};
use crate::scanner::{hash_to_hex, FileEntry, Hash};

/// Files sharing one content digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    /// BLAKE3 hash of the file content.
    #[serde(serialize_with = "serialize_hash")]
    pub hash: Hash,
    /// Members, sorted by path.
    pub files: Vec<FileEntry>,
}

fn serialize_hash<S: serde::Serializer>(hash: &Hash, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&hash_to_hex(hash))
}

impl DuplicateGroup {
    #[must_use]
    pub fn new(hash: Hash, mut files: Vec<FileEntry>) -> Self {
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Self { hash, files }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    #[must_use]
    pub fn hash_hex(&self) -> String {
        hash_to_hex(&self.hash)
    }

    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }

    /// Bytes held by every copy but the first.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.files.iter().skip(1).map(|f| f.size).sum()
    }

    /// The report lines for this group: a header, then one
    /// `Filename:`/`Checksum:` pair per member.
    #[must_use]
    pub fn findings(&self) -> Vec<Finding> {
        let hex = self.hash_hex();
        let mut findings = vec![Finding::new(
            FindingKind::DuplicateContent,
            "Error: Identical files found:",
        )];
        findings.extend(self.files.iter().map(|f| {
            Finding::new(
                FindingKind::DuplicateContent,
                format!("Filename: {}\nChecksum: {}", f.path.display(), hex),
            )
            .with_path(&f.path)
        }));
        findings
    }
}

/// Group hashed files by digest, keeping groups of two or more.
/// Groups are ordered by their first path.
#[must_use]
pub fn group_by_hash(hashed: Vec<(Hash, FileEntry)>) -> Vec<DuplicateGroup> {
    let mut by_hash: HashMap<Hash, Vec<FileEntry>> = HashMap::new();
    for (hash, file) in hashed {
        by_hash.entry(hash).or_default().push(file);
    }

    let mut groups: Vec<DuplicateGroup> = by_hash
        .into_iter()
        .filter(|(_, files)| files.len() > 1)
        .map(|(hash, files)| DuplicateGroup::new(hash, files))
        .collect();
    groups.sort_by(|a, b| a.files[0].path.cmp(&b.files[0].path));
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str, size: u64) -> FileEntry {
        FileEntry::new(PathBuf::from(path), size)
    }

    #[test]
    fn test_group_by_hash_drops_singletons() {
        let groups = group_by_hash(vec![
            ([1; 32], entry("/b", 10)),
            ([1; 32], entry("/a", 10)),
            ([2; 32], entry("/c", 11)),
        ]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].paths(), vec![PathBuf::from("/a"), PathBuf::from("/b")]);
        assert_eq!(groups[0].wasted_space(), 10);
    }

    #[test]
    fn test_group_findings_format() {
        let group = DuplicateGroup::new([0xab; 32], vec![entry("/x/1", 1), entry("/x/2", 1)]);
        let findings = group.findings();
        assert_eq!(findings.len(), 3);
        assert_eq!(findings[0].message, "Error: Identical files found:");
        assert!(findings[1].message.starts_with("Filename: /x/1\nChecksum: abab"));
    }

    #[test]
    fn test_groups_sorted_by_first_path() {
        let groups = group_by_hash(vec![
            ([2; 32], entry("/z", 1)),
            ([2; 32], entry("/y", 1)),
            ([1; 32], entry("/m", 1)),
            ([1; 32], entry("/n", 1)),
        ]);
        assert_eq!(groups[0].files[0].path, PathBuf::from("/m"));
        assert_eq!(groups[1].files[0].path, PathBuf::from("/y"));
    }
}
