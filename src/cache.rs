//! Content-addressed cache directory (spec.md §5): runs are keyed by
//! `(layer_a_name, layer_b_name, method, lower_year)` rather than wall-clock
//! date, and artifacts are written atomically (temp file, then rename) so
//! concurrent readers never observe a partial file.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Derives a stable cache key from the inputs that determine a
/// translation's output, independent of when the run happened.
pub fn cache_key(layer_a_name: &str, layer_b_name: &str, method: Option<&str>, lower_year: Option<i32>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(layer_a_name.as_bytes());
    hasher.update([0u8]);
    hasher.update(layer_b_name.as_bytes());
    hasher.update([0u8]);
    hasher.update(method.unwrap_or("spatial").as_bytes());
    hasher.update([0u8]);
    if let Some(year) = lower_year {
        hasher.update(year.to_string().as_bytes());
    }
    hex::encode(hasher.finalize())
}

pub fn cached_path(cache_dir: &Path, key: &str, extension: &str) -> PathBuf {
    cache_dir.join(format!("{key}.{extension}"))
}

/// Writes `contents` to `dir/filename` by creating a temp file in the same
/// directory and renaming it into place, so a reader never sees a
/// truncated write. `dir` is created if absent.
pub fn write_atomic(dir: &Path, filename: &str, contents: &[u8]) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.persist(dir.join(filename)).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_inputs_produce_the_same_key() {
        let k1 = cache_key("a", "b", Some("population"), Some(2021));
        let k2 = cache_key("a", "b", Some("population"), Some(2021));
        assert_eq!(k1, k2);
    }

    #[test]
    fn different_lower_year_changes_the_key() {
        let k1 = cache_key("a", "b", Some("population"), Some(2021));
        let k2 = cache_key("a", "b", Some("population"), Some(2022));
        assert_ne!(k1, k2);
    }

    #[test]
    fn write_atomic_leaves_no_temp_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        write_atomic(dir.path(), "out.csv", b"a_id,b_id\n").unwrap();
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
