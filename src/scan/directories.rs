use tracing::debug;

use super::context::{DirectoryRole, DirectoryStructure};
use super::signals::SignalReader;

/// Root-relative candidates per role, highest priority first.
const CANDIDATES: &[(DirectoryRole, &[&str])] = &[
    (DirectoryRole::Source, &["src", "lib", "app", "source", "pkg"]),
    (
        DirectoryRole::Test,
        &["tests", "test", "__tests__", "spec", "src/test"],
    ),
    (DirectoryRole::Docs, &["docs", "doc", "documentation"]),
    (
        DirectoryRole::Config,
        &["config", "configs", "conf", "settings", ".config"],
    ),
    (DirectoryRole::Api, &["api", "src/api", "app/api"]),
    (
        DirectoryRole::Models,
        &["models", "src/models", "app/models", "model"],
    ),
    (DirectoryRole::Data, &["data", "datasets", "dataset"]),
];

/// Resolve each directory role to the first existing candidate.
pub fn map_directories(reader: &SignalReader) -> DirectoryStructure {
    let mut structure = DirectoryStructure::default();
    for (role, candidates) in CANDIDATES {
        if let Some(found) = candidates.iter().find(|c| reader.is_dir(c)) {
            structure.set_if_absent(*role, found);
            debug!(role = role.key(), path = found, "directory mapped");
        }
    }
    structure
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn every_role_has_candidates() {
        for role in DirectoryRole::ALL {
            assert!(
                CANDIDATES.iter().any(|(r, c)| *r == role && !c.is_empty()),
                "no candidates for {role:?}"
            );
        }
    }

    #[test]
    fn first_candidate_wins() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("test")).unwrap();
        fs::create_dir(dir.path().join("tests")).unwrap();
        let structure = map_directories(&SignalReader::new(dir.path()));
        assert_eq!(structure.get(DirectoryRole::Test), Some("tests"));
    }

    #[test]
    fn roles_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("spec")).unwrap();
        fs::create_dir_all(dir.path().join("app/models")).unwrap();
        let structure = map_directories(&SignalReader::new(dir.path()));
        assert_eq!(structure.get(DirectoryRole::Source), Some("app"));
        assert_eq!(structure.get(DirectoryRole::Test), Some("spec"));
        assert_eq!(structure.get(DirectoryRole::Models), Some("app/models"));
        assert_eq!(structure.get(DirectoryRole::Docs), None);
    }

    #[test]
    fn files_do_not_count_as_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("docs"), "not a dir").unwrap();
        let structure = map_directories(&SignalReader::new(dir.path()));
        assert_eq!(structure.get(DirectoryRole::Docs), None);
    }
}
