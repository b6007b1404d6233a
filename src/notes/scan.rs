//! Input directory scanning

use super::Note;
use crate::config::DigestConfig;
use crate::error::DigestError;
use std::path::Path;
use walkdir::WalkDir;

/// Read every note file directly inside `dir`.
///
/// Only files whose extension is listed in the config are considered, in
/// file-name order. A file that cannot be read becomes an empty, undated
/// note instead of aborting the scan. Fails only when `dir` is not a
/// directory.
pub fn scan_notes(dir: &Path, config: &DigestConfig) -> Result<Vec<Note>, DigestError> {
    if !dir.is_dir() {
        return Err(DigestError::InvalidInputDirectory(dir.to_path_buf()));
    }

    let paths: Vec<_> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable directory entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| config.is_note_extension(ext))
                .unwrap_or(false)
        })
        .collect();

    let notes = paths
        .into_iter()
        .map(|path| {
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            match std::fs::read(&path) {
                Ok(bytes) => {
                    let text = String::from_utf8(bytes)
                        .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned());
                    Note::new(filename, text, config.expected_year)
                }
                Err(e) => {
                    tracing::warn!(file = %filename, error = %e, "failed to read note; treating as undated");
                    Note::unreadable(filename)
                }
            }
        })
        .collect::<Vec<_>>();

    tracing::info!(dir = %dir.display(), count = notes.len(), "scanned notes");
    Ok(notes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn only_note_extensions_are_read_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.md"), "## 1/2/25\nb").unwrap();
        fs::write(dir.path().join("a.txt"), "## 1/1/25\na").unwrap();
        fs::write(dir.path().join("c.pdf"), "ignored").unwrap();
        fs::write(dir.path().join("D.MD"), "upper").unwrap();
        fs::create_dir(dir.path().join("nested.md")).unwrap();

        let notes = scan_notes(dir.path(), &DigestConfig::default()).unwrap();
        let names: Vec<&str> = notes.iter().map(|n| n.filename.as_str()).collect();
        assert_eq!(names, vec!["D.MD", "a.txt", "b.md"]);
    }

    #[test]
    fn subdirectories_are_not_descended() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("x.md"), "## 1/1/25").unwrap();

        let notes = scan_notes(dir.path(), &DigestConfig::default()).unwrap();
        assert!(notes.is_empty());
    }

    #[test]
    fn invalid_utf8_is_decoded_lossily() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.md"), b"## 3/3/25\nok \xff\xfe end").unwrap();

        let notes = scan_notes(dir.path(), &DigestConfig::default()).unwrap();
        assert_eq!(notes.len(), 1);
        assert!(notes[0].date.is_some());
        assert!(notes[0].raw_content.contains("end"));
    }

    #[test]
    fn missing_directory_is_fatal() {
        let err = scan_notes(Path::new("/no/such/journal"), &DigestConfig::default()).unwrap_err();
        assert!(matches!(err, DigestError::InvalidInputDirectory(_)));
    }

    #[test]
    fn file_path_is_not_a_directory() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = scan_notes(file.path(), &DigestConfig::default()).unwrap_err();
        assert!(matches!(err, DigestError::InvalidInputDirectory(_)));
    }
}
