use std::sync::LazyLock;

use regex::Regex;

use crate::foods::FoodTable;

// "15g", "10.5 g", "3G"
static NOTES_CARBS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*g").expect("notes carbs pattern is valid")
});

// Leading number of a quantity field: "2", "1.5x", "2 slices", ".5"
static QUANTITY_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d+(?:\.\d*)?|\.\d+)").expect("quantity pattern is valid")
});

/// Parse a quantity field from its leading number; trailing text is ignored.
/// Only values greater than zero count.
#[must_use]
pub fn parse_quantity(qty: &str) -> Option<f64> {
    let prefix = QUANTITY_PREFIX.find(qty.trim())?;
    prefix
        .as_str()
        .parse::<f64>()
        .ok()
        .filter(|q| q.is_finite() && *q > 0.0)
}

/// Carbs for one line item: per-unit carbs of the resolved food times the
/// quantity, or 0 when either field is blank, the quantity is not positive,
/// or the food is unknown.
#[must_use]
pub fn compute_line_carbs(foods: &FoodTable, food: &str, qty: &str) -> f64 {
    if food.trim().is_empty() {
        return 0.0;
    }
    let Some(quantity) = parse_quantity(qty) else {
        return 0.0;
    };
    foods
        .resolve(food)
        .map_or(0.0, |per_unit| per_unit * quantity)
}

/// Sum of every `<number>g` mention in free text.
#[must_use]
pub fn extract_carbs(text: &str) -> f64 {
    NOTES_CARBS_PATTERN
        .captures_iter(text)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str().parse::<f64>().unwrap_or(0.0))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_line_carbs_known_food() {
        let foods = FoodTable::new();
        assert!((compute_line_carbs(&foods, "toast", "2") - 30.0).abs() < f64::EPSILON);
        assert!((compute_line_carbs(&foods, "Banana", "1.5") - 40.5).abs() < f64::EPSILON);
        assert!((compute_line_carbs(&foods, "olives", "10") - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_compute_line_carbs_partial_match() {
        let foods = FoodTable::new();
        assert!((compute_line_carbs(&foods, "choc", "2") - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_compute_line_carbs_zero_cases() {
        let foods = FoodTable::new();
        assert_eq!(compute_line_carbs(&foods, "", "2"), 0.0);
        assert_eq!(compute_line_carbs(&foods, "   ", "2"), 0.0);
        assert_eq!(compute_line_carbs(&foods, "toast", ""), 0.0);
        assert_eq!(compute_line_carbs(&foods, "toast", "  "), 0.0);
        assert_eq!(compute_line_carbs(&foods, "toast", "0"), 0.0);
        assert_eq!(compute_line_carbs(&foods, "toast", "-1"), 0.0);
        assert_eq!(compute_line_carbs(&foods, "toast", "two"), 0.0);
        assert_eq!(compute_line_carbs(&foods, "toast", "inf"), 0.0);
        assert_eq!(compute_line_carbs(&foods, "xylophone", "1"), 0.0);
        assert_eq!(compute_line_carbs(&foods, "toast", "slices 2"), 0.0);
    }

    #[test]
    fn test_compute_line_carbs_leading_number() {
        let foods = FoodTable::new();
        assert!((compute_line_carbs(&foods, "toast", "2 slices") - 30.0).abs() < f64::EPSILON);
        assert!((compute_line_carbs(&foods, "toast", "1.5x") - 22.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_compute_line_carbs_uses_custom_food() {
        let mut foods = FoodTable::new();
        foods.upsert("raccoon soup", 20.0).unwrap();
        assert!((compute_line_carbs(&foods, "raccoon soup", "3") - 60.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_extract_carbs() {
        assert!((extract_carbs("15g from snack and 10.5g more") - 25.5).abs() < f64::EPSILON);
        assert!((extract_carbs("late snack 12 G, tea 0g") - 12.0).abs() < f64::EPSILON);
        assert_eq!(extract_carbs("no numbers"), 0.0);
        assert_eq!(extract_carbs(""), 0.0);
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity(" 2 "), Some(2.0));
        assert_eq!(parse_quantity("0.5"), Some(0.5));
        assert_eq!(parse_quantity("0"), None);
        assert_eq!(parse_quantity("NaN"), None);
        assert_eq!(parse_quantity("abc"), None);
        assert_eq!(parse_quantity(""), None);
        assert_eq!(parse_quantity("2 slices"), Some(2.0));
        assert_eq!(parse_quantity("1.5x"), Some(1.5));
        assert_eq!(parse_quantity(".5"), Some(0.5));
        assert_eq!(parse_quantity("3."), Some(3.0));
        assert_eq!(parse_quantity("-1"), None);
    }
}
