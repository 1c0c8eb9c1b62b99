// BirthWindow - app/reference_mgr.rs
//
// Loads the question reference tables from a TOML file on disk.
// Size-checked before reading, parsed, then validated into typed tables.
// The result is read-only for the rest of the session.

use crate::core::reference::{self, ReferenceData};
use crate::util::constants;
use crate::util::error::ReferenceError;
use std::path::Path;

/// Load and validate a reference file.
///
/// Fails on I/O errors, files over `MAX_REFERENCE_FILE_SIZE`, malformed TOML,
/// unrecognised keys, or empty texts. Missing entries are not an error here;
/// they surface through `ReferenceData::check_coverage` once the Mars sign
/// is known.
pub fn load_reference(path: &Path) -> Result<ReferenceData, ReferenceError> {
    let metadata = std::fs::metadata(path).map_err(|e| ReferenceError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    if metadata.len() > constants::MAX_REFERENCE_FILE_SIZE {
        return Err(ReferenceError::FileTooLarge {
            path: path.to_path_buf(),
            size: metadata.len(),
            max_size: constants::MAX_REFERENCE_FILE_SIZE,
        });
    }

    let content = std::fs::read_to_string(path).map_err(|e| ReferenceError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let definition = reference::parse_reference_toml(&content, path)?;
    let data = reference::validate_and_compile(definition)?;

    tracing::info!(path = %path.display(), "Loaded reference data");
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{HourLord, House, Sign};
    use std::fmt::Write as _;

    /// Render a reference document with every key the given Mars sign needs.
    fn reference_toml(mars: Sign) -> String {
        let mut doc = String::new();
        writeln!(doc, "[mars_ascendant.{mars}]").unwrap();
        for asc in Sign::all() {
            writeln!(doc, "{asc} = \"{mars} Mars with {asc} rising?\"").unwrap();
        }
        for lord in HourLord::all() {
            writeln!(doc, "\n[hour_lord_ascendant.{lord}]").unwrap();
            for asc in Sign::all() {
                writeln!(doc, "{asc} = \"{lord} hour with {asc} rising?\"").unwrap();
            }
        }
        for table in ["saturn_house", "chiron_house"] {
            writeln!(doc, "\n[{table}]").unwrap();
            for house in House::all() {
                writeln!(doc, "\"{house}\" = \"{table} {house}?\"").unwrap();
            }
        }
        doc
    }

    #[test]
    fn test_load_reference_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("questions.toml");
        std::fs::write(&path, reference_toml(Sign::Gemini)).unwrap();

        let data = load_reference(&path).unwrap();
        assert!(data.check_coverage(Sign::Gemini).is_ok());
        assert!(matches!(
            data.check_coverage(Sign::Aries),
            Err(ReferenceError::MissingQuestion { .. })
        ));
        assert_eq!(
            data.saturn_house(House::new(7).unwrap()).unwrap(),
            "saturn_house 7?"
        );
    }

    #[test]
    fn test_load_reference_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_reference(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ReferenceError::Io { .. })));
    }

    #[test]
    fn test_load_reference_rejects_oversized_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.toml");
        let padding = "#".repeat(constants::MAX_REFERENCE_FILE_SIZE as usize + 1);
        std::fs::write(&path, padding).unwrap();

        let result = load_reference(&path);
        assert!(matches!(result, Err(ReferenceError::FileTooLarge { .. })));
    }

    #[test]
    fn test_load_reference_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[saturn_house\n\"1\" = ").unwrap();

        let result = load_reference(&path);
        assert!(matches!(result, Err(ReferenceError::TomlParse { .. })));
    }

    #[test]
    fn test_load_reference_rejects_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("typo.toml");
        std::fs::write(&path, "[chiron_house]\n\"13\" = \"Chiron in house 13?\"\n").unwrap();

        let result = load_reference(&path);
        assert!(matches!(
            result,
            Err(ReferenceError::UnknownKey { table: "chiron_house", .. })
        ));
    }
}
