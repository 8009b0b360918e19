//! Locating the active user log file.
//!
//! The data logger writes one directory per day, nested
//! `root/YYYY/MM/DD/`, with one `.dat` file per logging session. The
//! active file is the lexicographically last `.dat` in the latest day
//! directory. Absence of a file is a normal condition (no data logged
//! yet), so every failure mode here collapses to `None`.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Find the currently active log file under a date-partitioned root.
///
/// Selects the lexicographic maximum year, month and day directory in
/// turn, then the last sorted `*.dat` file inside the day directory.
/// Returns `None` if any level is empty, missing or unreadable.
pub fn latest_log_file(root: &Path) -> Option<PathBuf> {
    let year = max_entry(root)?;
    let month = max_entry(&year)?;
    let day = max_entry(&month)?;

    let mut names: Vec<PathBuf> = fs::read_dir(&day)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "dat"))
        .collect();
    names.sort();
    let found = names.pop();
    if found.is_none() {
        debug!(day = %day.display(), "no .dat files in latest day directory");
    }
    found
}

/// The lexicographically greatest entry of a directory, or `None` if
/// the directory is empty or unreadable.
fn max_entry(dir: &Path) -> Option<PathBuf> {
    fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .max()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_latest_date_wins() {
        let root = tempfile::tempdir().unwrap();
        touch(&root.path().join("2023/01/05/a.dat"));
        touch(&root.path().join("2023/01/06/b.dat"));
        touch(&root.path().join("2023/02/01/c.dat"));

        let found = latest_log_file(root.path()).unwrap();
        assert_eq!(found, root.path().join("2023/02/01/c.dat"));
    }

    #[test]
    fn test_latest_year_wins() {
        let root = tempfile::tempdir().unwrap();
        touch(&root.path().join("2022/12/31/a.dat"));
        touch(&root.path().join("2023/01/01/b.dat"));

        let found = latest_log_file(root.path()).unwrap();
        assert_eq!(found, root.path().join("2023/01/01/b.dat"));
    }

    #[test]
    fn test_last_session_file_wins() {
        let root = tempfile::tempdir().unwrap();
        touch(&root.path().join("2023/02/01/run-01.dat"));
        touch(&root.path().join("2023/02/01/run-02.dat"));
        touch(&root.path().join("2023/02/01/notes.txt"));

        let found = latest_log_file(root.path()).unwrap();
        assert_eq!(found, root.path().join("2023/02/01/run-02.dat"));
    }

    #[test]
    fn test_missing_root_is_none() {
        let root = tempfile::tempdir().unwrap();
        let gone = root.path().join("does-not-exist");
        assert_eq!(latest_log_file(&gone), None);
    }

    #[test]
    fn test_empty_day_directory_is_none() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("2023/02/01")).unwrap();
        assert_eq!(latest_log_file(root.path()), None);
    }

    #[test]
    fn test_non_dat_files_ignored() {
        let root = tempfile::tempdir().unwrap();
        touch(&root.path().join("2023/02/01/readings.csv"));
        assert_eq!(latest_log_file(root.path()), None);
    }
}
