use std::sync::LazyLock;

use crate::error::{JournalError, Result};
use crate::foods::FoodTable;
use crate::models::{CustomTemplates, LineItem, MealSection, MealTemplate, TemplateCategory};

/// Prefix given to the names of templates saved from a meal section.
pub const CUSTOM_TEMPLATE_PREFIX: &str = "🍽️ ";

fn builtin(name: &str, items: &[(&str, &str, f64)], total_carbs: f64) -> MealTemplate {
    MealTemplate {
        name: name.to_string(),
        items: items
            .iter()
            .map(|(qty, item, carbs)| LineItem {
                qty: (*qty).to_string(),
                item: (*item).to_string(),
                carbs: *carbs,
            })
            .collect(),
        total_carbs,
        category: None,
    }
}

static BREAKFAST: LazyLock<Vec<MealTemplate>> = LazyLock::new(|| {
    vec![
        builtin("🥣 Cereal & Milk", &[("1", "cereal", 24.0), ("1", "milk", 12.0)], 36.0),
        builtin("🍞 Toast & Banana", &[("2", "toast", 30.0), ("1", "banana", 27.0)], 57.0),
        builtin(
            "🥞 Oatmeal & Berries",
            &[("1", "oatmeal", 27.0), ("1", "blueberries", 14.0)],
            41.0,
        ),
        builtin("🍳 Eggs & Toast", &[("2", "egg", 2.0), ("1", "toast", 15.0)], 17.0),
        builtin(
            "🥛 Yogurt & Fruit",
            &[("1", "yogurt", 17.0), ("1", "strawberries", 8.0)],
            25.0,
        ),
    ]
});

static LUNCH: LazyLock<Vec<MealTemplate>> = LazyLock::new(|| {
    vec![
        builtin("🍕 Pizza Slice", &[("2", "pizza", 60.0), ("1", "milk", 12.0)], 72.0),
        builtin(
            "🥗 Chicken Salad",
            &[
                ("1", "chicken breast", 0.0),
                ("1", "lettuce", 2.0),
                ("1", "tomato", 4.0),
                ("1", "crackers", 18.0),
            ],
            24.0,
        ),
        builtin("🍝 Pasta Bowl", &[("1", "pasta", 43.0), ("1", "cheese", 1.0)], 44.0),
        builtin("🍲 Soup & Bread", &[("1", "soup", 15.0), ("1", "bread", 12.0)], 27.0),
        builtin("🥪 Tuna Sandwich", &[("2", "bread", 24.0), ("1", "tuna", 0.0)], 24.0),
    ]
});

static DINNER: LazyLock<Vec<MealTemplate>> = LazyLock::new(|| {
    vec![
        builtin(
            "🍚 Rice & Chicken",
            &[("1", "rice", 45.0), ("1", "chicken breast", 0.0), ("1", "broccoli", 6.0)],
            51.0,
        ),
        builtin(
            "🥔 Potato & Beef",
            &[("1", "potato", 37.0), ("1", "beef", 0.0), ("1", "green beans", 7.0)],
            44.0,
        ),
        builtin(
            "🐟 Salmon & Quinoa",
            &[("1", "salmon", 0.0), ("1", "quinoa", 39.0), ("1", "spinach", 1.0)],
            40.0,
        ),
        builtin("🌮 Chili Bowl", &[("1", "chili", 15.0), ("1", "cheese", 1.0)], 16.0),
        builtin(
            "🍖 Liver Dinner",
            &[("1", "liver dinner", 17.0), ("1", "carrots", 10.0)],
            27.0,
        ),
    ]
});

static SNACKS: LazyLock<Vec<MealTemplate>> = LazyLock::new(|| {
    vec![
        builtin("🍎 Apple", &[("1", "apple", 25.0)], 25.0),
        builtin("🍌 Banana", &[("1", "banana", 27.0)], 27.0),
        builtin(
            "🧀 Cheese & Crackers",
            &[("1", "cheese", 1.0), ("1", "crackers", 18.0)],
            19.0,
        ),
        builtin("🥜 Nuts", &[("1", "nuts", 6.0)], 6.0),
        builtin(
            "🍓 Berries & Yogurt",
            &[("1", "strawberries", 8.0), ("1", "yogurt", 17.0)],
            25.0,
        ),
        builtin("🥓 Pork Rinds", &[("1", "pork rinds", 1.0)], 1.0),
        builtin("🥛 Cottage Cheese", &[("1", "cottage cheese", 5.0)], 5.0),
    ]
});

/// The immutable templates shipped with the journal.
#[must_use]
pub fn builtin_templates(category: TemplateCategory) -> &'static [MealTemplate] {
    match category {
        TemplateCategory::Breakfast => BREAKFAST.as_slice(),
        TemplateCategory::Lunch => LUNCH.as_slice(),
        TemplateCategory::Dinner => DINNER.as_slice(),
        TemplateCategory::Snacks => SNACKS.as_slice(),
    }
}

/// A template offered for a section, tagged with where it came from.
#[derive(Debug, Clone, serde::Serialize)]
pub struct OfferedTemplate {
    pub template: MealTemplate,
    pub builtin: bool,
    /// Position inside the custom list of its category, for removal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_index: Option<usize>,
}

/// User-saved templates, appended per category.
#[derive(Debug, Clone, Default)]
pub struct TemplateBook {
    custom: CustomTemplates,
}

impl TemplateBook {
    #[must_use]
    pub fn new(custom: CustomTemplates) -> Self {
        Self { custom }
    }

    #[must_use]
    pub fn custom(&self) -> &CustomTemplates {
        &self.custom
    }

    /// Built-ins for the section's category followed by the custom ones.
    #[must_use]
    pub fn templates_for_section(&self, label: &str) -> Vec<OfferedTemplate> {
        let category = TemplateCategory::for_section(label);
        let builtins = builtin_templates(category).iter().map(|t| OfferedTemplate {
            template: t.clone(),
            builtin: true,
            custom_index: None,
        });
        let customs = self
            .custom
            .get(&category)
            .into_iter()
            .flatten()
            .enumerate()
            .map(|(i, t)| OfferedTemplate {
                template: t.clone(),
                builtin: false,
                custom_index: Some(i),
            });
        builtins.chain(customs).collect()
    }

    /// Save the complete rows of a section as a new custom template.
    pub fn save_from_section(&mut self, section: &MealSection, name: &str) -> Result<&MealTemplate> {
        let items: Vec<LineItem> = section
            .items
            .iter()
            .filter(|i| i.is_complete())
            .cloned()
            .collect();
        if items.is_empty() {
            return Err(JournalError::NoItemsToSave);
        }

        let category = TemplateCategory::for_section(&section.section);
        let template = MealTemplate {
            name: format!("{CUSTOM_TEMPLATE_PREFIX}{}", name.trim()),
            items,
            total_carbs: section.total,
            category: Some(category),
        };
        tracing::info!("Saved template '{}' under {category}", template.name);

        let list = self.custom.entry(category).or_default();
        list.push(template);
        Ok(&list[list.len() - 1])
    }

    /// Remove one custom template; a category left empty is dropped.
    pub fn remove(&mut self, category: TemplateCategory, index: usize) -> Result<MealTemplate> {
        let not_found = || JournalError::TemplateNotFound {
            category: category.to_string(),
            index,
        };
        let list = self.custom.get_mut(&category).ok_or_else(not_found)?;
        if index >= list.len() {
            return Err(not_found());
        }
        let removed = list.remove(index);
        if list.is_empty() {
            self.custom.remove(&category);
        }
        Ok(removed)
    }

    /// Append another set of custom templates, category by category.
    pub fn append(&mut self, other: &CustomTemplates) -> usize {
        let mut appended = 0;
        for (category, templates) in other {
            if templates.is_empty() {
                continue;
            }
            self.custom
                .entry(*category)
                .or_default()
                .extend(templates.iter().cloned());
            appended += templates.len();
        }
        appended
    }
}

/// Add a template's items to a section: placeholder rows are dropped first,
/// and carbs are recomputed against the current food table rather than taken
/// from the template.
pub fn apply_template(section: &mut MealSection, template: &MealTemplate, foods: &FoodTable) {
    section.items.retain(|i| !i.is_placeholder());
    section.items.extend(
        template
            .items
            .iter()
            .map(|t| LineItem::computed(foods, &t.qty, &t.item)),
    );
    if section.items.is_empty() {
        section.items.push(LineItem::placeholder());
    }
    section.recompute_total();
}
