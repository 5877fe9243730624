use std::path::Path;

use crate::core::digest::DigestRecord;
use crate::error::StoreError;

/// Read a snapshot. Missing or malformed files yield an empty list.
pub fn load_snapshot(path: &Path) -> Vec<DigestRecord> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            log::warn!("Failed to read snapshot {}: {}", path.display(), e);
            return Vec::new();
        }
    };
    serde_json::from_str(&content).unwrap_or_else(|e| {
        log::warn!("Ignoring malformed snapshot {}: {}", path.display(), e);
        Vec::new()
    })
}

pub fn save_snapshot(path: &Path, records: &[DigestRecord]) -> Result<(), StoreError> {
    let io = |source| StoreError::Io {
        path: path.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io)?;
    }
    let json = serde_json::to_string_pretty(records)?;
    std::fs::write(path, json).map_err(io)?;
    log::debug!("Saved {} contacts to {}", records.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::digest::fixtures::record;

    #[test]
    fn save_then_load_keeps_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("digests.json");
        let records = vec![record("Jane", 2), record("John", 1)];
        save_snapshot(&path, &records).unwrap();
        assert_eq!(load_snapshot(&path), records);
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_snapshot(&dir.path().join("none.json")).is_empty());
    }

    #[test]
    fn garbage_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("digests.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(load_snapshot(&path).is_empty());
    }
}
