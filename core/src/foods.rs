use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::{JournalError, Result};

/// Minimum query length before substring matching kicks in.
pub const PARTIAL_MATCH_MIN_LEN: usize = 3;

/// Maximum number of autocomplete suggestions.
pub const MAX_SUGGESTIONS: usize = 5;

/// Carbs per serving for the foods every journal starts with.
const BUILTIN_FOODS: &[(&str, f64)] = &[
    ("egg", 1.0),
    ("toast", 15.0),
    ("banana", 27.0),
    ("apple", 25.0),
    ("cottage cheese", 5.0),
    ("salami", 1.0),
    ("olives", 0.2),
    ("milk", 12.0),
    ("chili", 15.0),
    ("donut", 22.0),
    ("pizza", 30.0),
    ("liver dinner", 17.0),
    ("cheese", 1.0),
    ("soup", 15.0),
    ("pork rinds", 1.0),
    ("egg salad", 5.0),
    ("possum pie", 156.0),
    ("rice", 45.0),
    ("pasta", 43.0),
    ("bread", 12.0),
    ("potato", 37.0),
    ("sweet potato", 27.0),
    ("oatmeal", 27.0),
    ("cereal", 24.0),
    ("yogurt", 17.0),
    ("orange", 15.0),
    ("grapes", 16.0),
    ("strawberries", 8.0),
    ("blueberries", 14.0),
    ("chicken breast", 0.0),
    ("salmon", 0.0),
    ("tuna", 0.0),
    ("beef", 0.0),
    ("pork", 0.0),
    ("broccoli", 6.0),
    ("spinach", 1.0),
    ("carrots", 10.0),
    ("green beans", 7.0),
    ("corn", 19.0),
    ("peas", 14.0),
    ("beans", 20.0),
    ("lentils", 20.0),
    ("quinoa", 39.0),
    ("nuts", 6.0),
    ("peanut butter", 8.0),
    ("avocado", 4.0),
    ("crackers", 18.0),
    ("chips", 15.0),
    ("chocolate", 25.0),
    ("ice cream", 22.0),
    ("cake", 35.0),
    ("cookies", 20.0),
    ("lettuce", 2.0),
    ("tomato", 4.0),
    ("cucumber", 2.0),
    ("olive oil", 0.0),
    ("butter", 0.0),
    ("cream cheese", 2.0),
];

static BUILTIN_TABLE: LazyLock<BTreeMap<String, f64>> = LazyLock::new(|| {
    BUILTIN_FOODS
        .iter()
        .map(|(name, carbs)| ((*name).to_string(), *carbs))
        .collect()
});

// "food name 20", "food name 20g", "food name 20.5 g"
static FOOD_INPUT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(.+?)\s+(\d+(?:\.\d+)?)\s*g?$").expect("food input pattern is valid")
});

/// Canonical form of a food name: trimmed and lowercased.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Parse the one-line "name carbs" form used when adding a food.
pub fn parse_food_input(input: &str) -> Result<(String, f64)> {
    let trimmed = input.trim();
    let caps = FOOD_INPUT_PATTERN
        .captures(trimmed)
        .ok_or_else(|| JournalError::InvalidFoodInput(trimmed.to_string()))?;

    let name = normalize_name(&caps[1]);
    let carbs: f64 = caps[2]
        .parse()
        .map_err(|_| JournalError::InvalidFoodInput(trimmed.to_string()))?;
    if name.is_empty() {
        return Err(JournalError::InvalidFoodInput(trimmed.to_string()));
    }
    Ok((name, carbs))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FoodSource {
    Builtin,
    Custom,
}

/// One row of the merged table, for listings.
#[derive(Debug, Clone, Serialize)]
pub struct FoodEntry {
    pub name: String,
    pub carbs_per_unit: f64,
    pub source: FoodSource,
    /// True when a custom entry hides a built-in one with the same name.
    pub shadows_builtin: bool,
}

/// Layered name → carbs-per-unit lookup.
///
/// The custom layer is consulted first; the built-in layer only on a miss.
/// Iteration over the merged key set is lexicographic, which makes partial
/// matches and suggestions deterministic.
#[derive(Debug, Clone, Default)]
pub struct FoodTable {
    custom: BTreeMap<String, f64>,
}

impl FoodTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from previously persisted custom foods.
    ///
    /// Keys are normalized; entries with invalid values are dropped.
    #[must_use]
    pub fn with_custom(custom: BTreeMap<String, f64>) -> Self {
        let mut table = Self::new();
        for (name, carbs) in custom {
            if let Err(e) = table.upsert(&name, carbs) {
                tracing::warn!("Skipping stored custom food '{name}': {e}");
            }
        }
        table
    }

    #[must_use]
    pub fn custom_foods(&self) -> &BTreeMap<String, f64> {
        &self.custom
    }

    /// Exact lookup followed by a substring match for queries of three or
    /// more characters.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<f64> {
        let key = normalize_name(name);
        if key.is_empty() {
            return None;
        }
        if let Some(carbs) = self.exact(&key) {
            return Some(carbs);
        }
        if key.chars().count() < PARTIAL_MATCH_MIN_LEN {
            return None;
        }
        let matched = self
            .names()
            .into_iter()
            .find(|known| known.contains(key.as_str()) || key.contains(known))?;
        tracing::debug!("Partial match for '{key}': '{matched}'");
        self.exact(matched)
    }

    /// Names starting with `prefix` (case-insensitive), at most five.
    #[must_use]
    pub fn suggest(&self, prefix: &str) -> Vec<String> {
        if prefix.is_empty() {
            return Vec::new();
        }
        let prefix = prefix.to_lowercase();
        self.names()
            .into_iter()
            .filter(|name| name.starts_with(&prefix))
            .take(MAX_SUGGESTIONS)
            .map(str::to_string)
            .collect()
    }

    /// Add or replace a custom food. Shadows a built-in with the same name.
    pub fn upsert(&mut self, name: &str, carbs_per_unit: f64) -> Result<()> {
        if !carbs_per_unit.is_finite() || carbs_per_unit < 0.0 {
            return Err(JournalError::InvalidFoodValue(carbs_per_unit));
        }
        let key = normalize_name(name);
        if key.is_empty() {
            return Err(JournalError::InvalidFoodInput(name.to_string()));
        }
        self.custom.insert(key, carbs_per_unit);
        Ok(())
    }

    /// Remove a custom food. Built-ins cannot be removed; a shadowed built-in
    /// becomes visible again.
    pub fn remove(&mut self, name: &str) -> bool {
        self.custom.remove(&normalize_name(name)).is_some()
    }

    /// Overwrite-by-name merge of another set of custom foods.
    pub fn merge(&mut self, foods: &BTreeMap<String, f64>) -> usize {
        let mut merged = 0;
        for (name, carbs) in foods {
            match self.upsert(name, *carbs) {
                Ok(()) => merged += 1,
                Err(e) => tracing::warn!("Skipping imported food '{name}': {e}"),
            }
        }
        merged
    }

    /// Every name in the merged table, sorted.
    #[must_use]
    pub fn entries(&self) -> Vec<FoodEntry> {
        self.names()
            .into_iter()
            .filter_map(|name| {
                let (carbs_per_unit, source) = match self.custom.get(name) {
                    Some(c) => (*c, FoodSource::Custom),
                    None => (*BUILTIN_TABLE.get(name)?, FoodSource::Builtin),
                };
                Some(FoodEntry {
                    name: name.to_string(),
                    carbs_per_unit,
                    source,
                    shadows_builtin: source == FoodSource::Custom
                        && BUILTIN_TABLE.contains_key(name),
                })
            })
            .collect()
    }

    fn exact(&self, key: &str) -> Option<f64> {
        self.custom
            .get(key)
            .or_else(|| BUILTIN_TABLE.get(key))
            .copied()
    }

    fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = BUILTIN_TABLE
            .keys()
            .chain(self.custom.keys())
            .map(String::as_str)
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_exact_case_insensitive() {
        let table = FoodTable::new();
        assert_eq!(table.resolve("Banana"), Some(27.0));
        assert_eq!(table.resolve("  COTTAGE cheese "), Some(5.0));
    }

    #[test]
    fn test_resolve_zero_carb_food() {
        let table = FoodTable::new();
        assert_eq!(table.resolve("salmon"), Some(0.0));
    }

    #[test]
    fn test_resolve_partial_match() {
        let table = FoodTable::new();
        assert_eq!(table.resolve("choc"), Some(25.0));
        // Query containing a known name
        assert_eq!(table.resolve("ripe bananas"), Some(27.0));
    }

    #[test]
    fn test_resolve_short_query_no_partial() {
        let table = FoodTable::new();
        assert_eq!(table.resolve("ch"), None);
        assert_eq!(table.resolve(""), None);
        assert_eq!(table.resolve("   "), None);
    }

    #[test]
    fn test_resolve_partial_is_lexicographic() {
        let mut table = FoodTable::new();
        table.upsert("zzz berry mix", 50.0).unwrap();
        table.upsert("aaa berry mix", 40.0).unwrap();
        // Both contain "berry mix"; the lexicographically first one wins
        assert_eq!(table.resolve("berry mix"), Some(40.0));
    }

    #[test]
    fn test_resolve_unknown() {
        let table = FoodTable::new();
        assert_eq!(table.resolve("xylophone"), None);
    }

    #[test]
    fn test_suggest_prefix() {
        let table = FoodTable::new();
        assert_eq!(table.suggest("eg"), vec!["egg", "egg salad"]);
        assert_eq!(table.suggest("EG"), vec!["egg", "egg salad"]);
        assert!(table.suggest("").is_empty());
        assert!(table.suggest("qqq").is_empty());
    }

    #[test]
    fn test_suggest_limited_to_five() {
        let mut table = FoodTable::new();
        for i in 0..7 {
            table.upsert(&format!("zebra cake {i}"), 10.0).unwrap();
        }
        let suggestions = table.suggest("zebra");
        assert_eq!(suggestions.len(), 5);
        assert_eq!(suggestions[0], "zebra cake 0");
        assert_eq!(suggestions[4], "zebra cake 4");
    }

    #[test]
    fn test_upsert_then_resolve() {
        let mut table = FoodTable::new();
        table.upsert("Raccoon Soup", 20.0).unwrap();
        assert_eq!(table.resolve("raccoon soup"), Some(20.0));
    }

    #[test]
    fn test_upsert_shadows_builtin() {
        let mut table = FoodTable::new();
        table.upsert("toast", 18.0).unwrap();
        assert_eq!(table.resolve("toast"), Some(18.0));

        assert!(table.remove("toast"));
        assert_eq!(table.resolve("toast"), Some(15.0));
    }

    #[test]
    fn test_upsert_rejects_invalid_value() {
        let mut table = FoodTable::new();
        assert!(matches!(
            table.upsert("bad", -1.0),
            Err(JournalError::InvalidFoodValue(_))
        ));
        assert!(table.upsert("bad", f64::NAN).is_err());
        assert!(table.upsert("bad", f64::INFINITY).is_err());
        assert!(table.custom_foods().is_empty());
    }

    #[test]
    fn test_upsert_rejects_empty_name() {
        let mut table = FoodTable::new();
        assert!(matches!(
            table.upsert("  ", 5.0),
            Err(JournalError::InvalidFoodInput(_))
        ));
    }

    #[test]
    fn test_remove_builtin_is_noop() {
        let mut table = FoodTable::new();
        assert!(!table.remove("egg"));
        assert_eq!(table.resolve("egg"), Some(1.0));
    }

    #[test]
    fn test_entries_marks_sources() {
        let mut table = FoodTable::new();
        table.upsert("toast", 18.0).unwrap();
        table.upsert("raccoon soup", 20.0).unwrap();

        let entries = table.entries();
        let toast = entries.iter().find(|e| e.name == "toast").unwrap();
        assert_eq!(toast.source, FoodSource::Custom);
        assert!(toast.shadows_builtin);
        let soup = entries.iter().find(|e| e.name == "raccoon soup").unwrap();
        assert!(!soup.shadows_builtin);
        let egg = entries.iter().find(|e| e.name == "egg").unwrap();
        assert_eq!(egg.source, FoodSource::Builtin);
        // No duplicate rows for shadowed names
        assert_eq!(entries.iter().filter(|e| e.name == "toast").count(), 1);
    }

    #[test]
    fn test_parse_food_input() {
        assert_eq!(
            parse_food_input("raccoon soup 20").unwrap(),
            ("raccoon soup".to_string(), 20.0)
        );
        assert_eq!(
            parse_food_input("  Possum Pie 156g ").unwrap(),
            ("possum pie".to_string(), 156.0)
        );
        assert_eq!(
            parse_food_input("half bagel 22.5 G").unwrap(),
            ("half bagel".to_string(), 22.5)
        );
    }

    #[test]
    fn test_parse_food_input_invalid() {
        assert!(parse_food_input("raccoon soup").is_err());
        assert!(parse_food_input("20").is_err());
        assert!(parse_food_input("").is_err());
    }

    #[test]
    fn test_with_custom_normalizes_and_drops_invalid() {
        let mut stored = BTreeMap::new();
        stored.insert("  Kale Chips ".to_string(), 7.0);
        stored.insert("broken".to_string(), -3.0);
        let table = FoodTable::with_custom(stored);
        assert_eq!(table.custom_foods().len(), 1);
        assert_eq!(table.resolve("kale chips"), Some(7.0));
    }
}
