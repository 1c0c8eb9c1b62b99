// BirthWindow - core/reference.rs
//
// Question reference data: parsing, validation, and typed lookup.
// Core layer: accepts TOML strings, never touches the filesystem.
// I/O is handled by app::reference_mgr which feeds content here.
//
// A lookup miss is always an error. Question text never silently falls back
// to an empty string.

use crate::core::model::{HourLord, House, Sign};
use crate::util::error::ReferenceError;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::str::FromStr;

/// Table names, used in error messages.
pub const MARS_ASCENDANT_TABLE: &str = "mars_ascendant";
pub const HOUR_LORD_ASCENDANT_TABLE: &str = "hour_lord_ascendant";
pub const SATURN_HOUSE_TABLE: &str = "saturn_house";
pub const CHIRON_HOUSE_TABLE: &str = "chiron_house";

// =============================================================================
// TOML deserialization structures (raw input)
// =============================================================================

/// Raw reference document as deserialized from TOML.
/// Keys are validated and converted into typed tables by `validate_and_compile`.
#[derive(Debug, Default, Deserialize)]
pub struct ReferenceDefinition {
    #[serde(default)]
    pub mars_ascendant: BTreeMap<String, BTreeMap<String, String>>,
    #[serde(default)]
    pub hour_lord_ascendant: BTreeMap<String, BTreeMap<String, String>>,
    #[serde(default)]
    pub saturn_house: BTreeMap<String, String>,
    #[serde(default)]
    pub chiron_house: BTreeMap<String, String>,
}

/// Parse a TOML string into a `ReferenceDefinition`.
///
/// `source_path` is used for error messages only (not for I/O).
pub fn parse_reference_toml(
    toml_content: &str,
    source_path: &Path,
) -> Result<ReferenceDefinition, ReferenceError> {
    toml::from_str(toml_content).map_err(|e| ReferenceError::TomlParse {
        path: source_path.to_path_buf(),
        source: e,
    })
}

// =============================================================================
// Typed tables
// =============================================================================

/// Validated question tables, keyed by enumerated values.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    mars_ascendant: HashMap<(Sign, Sign), String>,
    hour_lord_ascendant: HashMap<(HourLord, Sign), String>,
    saturn_house: HashMap<House, String>,
    chiron_house: HashMap<House, String>,
}

/// Validate every key and text in `def` and build typed tables.
///
/// Fails on the first unrecognised key or empty text. Coverage (whether every
/// reachable key is present) is checked separately by `check_coverage`, since
/// it depends on the Mars sign chosen for the session.
pub fn validate_and_compile(def: ReferenceDefinition) -> Result<ReferenceData, ReferenceError> {
    let mut data = ReferenceData::default();

    for (mars_key, row) in def.mars_ascendant {
        let mars: Sign = parse_key(MARS_ASCENDANT_TABLE, &mars_key)?;
        for (asc_key, text) in row {
            let asc: Sign = parse_key(MARS_ASCENDANT_TABLE, &asc_key)?;
            let text = non_empty(MARS_ASCENDANT_TABLE, || format!("{mars}/{asc}"), text)?;
            data.mars_ascendant.insert((mars, asc), text);
        }
    }

    for (lord_key, row) in def.hour_lord_ascendant {
        let lord: HourLord = parse_key(HOUR_LORD_ASCENDANT_TABLE, &lord_key)?;
        for (asc_key, text) in row {
            let asc: Sign = parse_key(HOUR_LORD_ASCENDANT_TABLE, &asc_key)?;
            let text = non_empty(HOUR_LORD_ASCENDANT_TABLE, || format!("{lord}/{asc}"), text)?;
            data.hour_lord_ascendant.insert((lord, asc), text);
        }
    }

    for (house_key, text) in def.saturn_house {
        let house: House = parse_key(SATURN_HOUSE_TABLE, &house_key)?;
        let text = non_empty(SATURN_HOUSE_TABLE, || house.to_string(), text)?;
        data.saturn_house.insert(house, text);
    }

    for (house_key, text) in def.chiron_house {
        let house: House = parse_key(CHIRON_HOUSE_TABLE, &house_key)?;
        let text = non_empty(CHIRON_HOUSE_TABLE, || house.to_string(), text)?;
        data.chiron_house.insert(house, text);
    }

    tracing::debug!(
        mars_ascendant = data.mars_ascendant.len(),
        hour_lord_ascendant = data.hour_lord_ascendant.len(),
        saturn_house = data.saturn_house.len(),
        chiron_house = data.chiron_house.len(),
        "Reference data compiled"
    );

    Ok(data)
}

fn parse_key<T: FromStr>(table: &'static str, key: &str) -> Result<T, ReferenceError> {
    key.parse().map_err(|_| ReferenceError::UnknownKey {
        table,
        key: key.to_string(),
    })
}

fn non_empty(
    table: &'static str,
    key: impl FnOnce() -> String,
    text: String,
) -> Result<String, ReferenceError> {
    if text.trim().is_empty() {
        return Err(ReferenceError::EmptyText { table, key: key() });
    }
    Ok(text)
}

impl ReferenceData {
    /// Insert or replace a Mars x Ascendant question.
    pub fn insert_mars_ascendant(&mut self, mars: Sign, ascendant: Sign, text: impl Into<String>) {
        self.mars_ascendant.insert((mars, ascendant), text.into());
    }

    /// Insert or replace an Hour lord x Ascendant question.
    pub fn insert_hour_lord_ascendant(
        &mut self,
        hour_lord: HourLord,
        ascendant: Sign,
        text: impl Into<String>,
    ) {
        self.hour_lord_ascendant
            .insert((hour_lord, ascendant), text.into());
    }

    pub fn insert_saturn_house(&mut self, house: House, text: impl Into<String>) {
        self.saturn_house.insert(house, text.into());
    }

    pub fn insert_chiron_house(&mut self, house: House, text: impl Into<String>) {
        self.chiron_house.insert(house, text.into());
    }

    pub fn mars_ascendant(&self, mars: Sign, ascendant: Sign) -> Result<&str, ReferenceError> {
        self.mars_ascendant
            .get(&(mars, ascendant))
            .map(String::as_str)
            .ok_or_else(|| ReferenceError::MissingQuestion {
                table: MARS_ASCENDANT_TABLE,
                key: format!("{mars}/{ascendant}"),
            })
    }

    pub fn hour_lord_ascendant(
        &self,
        hour_lord: HourLord,
        ascendant: Sign,
    ) -> Result<&str, ReferenceError> {
        self.hour_lord_ascendant
            .get(&(hour_lord, ascendant))
            .map(String::as_str)
            .ok_or_else(|| ReferenceError::MissingQuestion {
                table: HOUR_LORD_ASCENDANT_TABLE,
                key: format!("{hour_lord}/{ascendant}"),
            })
    }

    pub fn saturn_house(&self, house: House) -> Result<&str, ReferenceError> {
        self.saturn_house
            .get(&house)
            .map(String::as_str)
            .ok_or_else(|| ReferenceError::MissingQuestion {
                table: SATURN_HOUSE_TABLE,
                key: house.to_string(),
            })
    }

    pub fn chiron_house(&self, house: House) -> Result<&str, ReferenceError> {
        self.chiron_house
            .get(&house)
            .map(String::as_str)
            .ok_or_else(|| ReferenceError::MissingQuestion {
                table: CHIRON_HOUSE_TABLE,
                key: house.to_string(),
            })
    }

    /// Verify every question a session with this Mars sign can reach.
    ///
    /// Covers all 12 ascendants under `mars`, the full hour lord x ascendant
    /// cross product, and houses 1-12 in both house tables. Returns the first
    /// missing key.
    pub fn check_coverage(&self, mars: Sign) -> Result<(), ReferenceError> {
        for &asc in Sign::all() {
            self.mars_ascendant(mars, asc)?;
        }
        for &lord in HourLord::all() {
            for &asc in Sign::all() {
                self.hour_lord_ascendant(lord, asc)?;
            }
        }
        for house in House::all() {
            self.saturn_house(house)?;
            self.chiron_house(house)?;
        }
        Ok(())
    }
}

/// Reference data covering every key, used to exercise coverage checks.
#[cfg(test)]
pub(crate) fn full_reference() -> ReferenceData {
    let mut data = ReferenceData::default();
    for &mars in Sign::all() {
        for &asc in Sign::all() {
            data.insert_mars_ascendant(mars, asc, format!("{mars} Mars, {asc} rising"));
        }
    }
    for &lord in HourLord::all() {
        for &asc in Sign::all() {
            data.insert_hour_lord_ascendant(lord, asc, format!("{lord} hour, {asc} rising"));
        }
    }
    for house in House::all() {
        data.insert_saturn_house(house, format!("Saturn in house {house}"));
        data.insert_chiron_house(house, format!("Chiron in house {house}"));
    }
    data
}
