//! Line-list stores backing the ignore list, watchlist, notification list and
//! hint list. One symbol name per line, insertion order preserved, no
//! escaping.

use std::{
    fs,
    io::Write,
    path::Path,
};

use crate::error::Result;

/// Reads the list, `None` when the file does not exist. A missing list file
/// is "empty", never an error.
pub fn read_list(path: &Path) -> Result<Option<Vec<String>>> {
    if !path.is_file() {
        return Ok(None);
    }
    let contents = fs::read_to_string(path)?;
    let entries = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    Ok(Some(entries))
}

/// Appends `entry` unless it is already present. Returns whether the file
/// changed.
pub fn append_unique(path: &Path, entry: &str) -> Result<bool> {
    if let Some(existing) = read_list(path)? {
        if existing.iter().any(|line| line == entry) {
            return Ok(false);
        }
        let mut file = fs::OpenOptions::new().append(true).open(path)?;
        writeln!(file, "{entry}")?;
    } else {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, format!("{entry}\n"))?;
    }
    Ok(true)
}

/// Rewrites the file without `entry`. A name absent from the file leaves it
/// byte-for-byte unchanged.
pub fn remove_line(path: &Path, entry: &str) -> Result<bool> {
    let Some(existing) = read_list(path)? else {
        return Ok(false);
    };
    if !existing.iter().any(|line| line == entry) {
        return Ok(false);
    }
    let mut contents = String::new();
    for line in existing.iter().filter(|line| line.as_str() != entry) {
        contents.push_str(line);
        contents.push('\n');
    }
    fs::write(path, contents)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn append_is_idempotent() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("list.txt");
        assert!(append_unique(&path, "MAIN.counter").unwrap());
        assert!(!append_unique(&path, "MAIN.counter").unwrap());
        assert!(append_unique(&path, "MAIN.done").unwrap());
        assert_eq!(
            read_list(&path).unwrap().unwrap(),
            vec!["MAIN.counter".to_string(), "MAIN.done".to_string()]
        );
    }

    #[test]
    fn remove_absent_entry_leaves_file_unchanged() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("list.txt");
        append_unique(&path, "MAIN.counter").unwrap();
        let before = fs::read(&path).unwrap();
        assert!(!remove_line(&path, "MAIN.other").unwrap());
        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[test]
    fn remove_rewrites_without_entry() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("list.txt");
        append_unique(&path, "a").unwrap();
        append_unique(&path, "b").unwrap();
        append_unique(&path, "c").unwrap();
        assert!(remove_line(&path, "b").unwrap());
        assert_eq!(
            read_list(&path).unwrap().unwrap(),
            vec!["a".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn missing_file_reads_as_none() {
        let tmp = tempdir().unwrap();
        assert!(read_list(&tmp.path().join("nope.txt")).unwrap().is_none());
        assert!(!remove_line(&tmp.path().join("nope.txt"), "x").unwrap());
    }
}
