// fdcsync/src/sync/assemble.rs
use clap::ValueEnum;
use serde::Deserialize;
use std::cmp::Ordering;
use tracing::error;

use crate::models::{FOOD_DOC_TYPE, FetchedFood, FoodDocument, NutrientEntry, PortionEntry};

/// How portions on a document are keyed and ordered. Pick one per deployment;
/// the two produce different `_key`s and orderings for the same data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortionKey {
    /// Keyed by unit name, ordered by unit from last to first. Descending is
    /// intentional: it is the order already-published documents were built
    /// with, so `cup` sorts after `gram`. Do not flip it to ascending.
    #[default]
    Unit,
    /// Keyed by amount, unit and modifier together, ordered ascending on
    /// that triple. Keeps portions that share a unit apart.
    Composite,
}

impl PortionKey {
    pub fn key_for(self, portion: &PortionEntry) -> String {
        match self {
            PortionKey::Unit => portion.unit.clone(),
            PortionKey::Composite => {
                format!("{}{}{}", portion.amount, portion.unit, portion.modifier)
            }
        }
    }

    pub fn compare(self, a: &PortionEntry, b: &PortionEntry) -> Ordering {
        match self {
            PortionKey::Unit => b.unit.cmp(&a.unit),
            PortionKey::Composite => a
                .amount
                .total_cmp(&b.amount)
                .then_with(|| a.unit.cmp(&b.unit))
                .then_with(|| a.modifier.cmp(&b.modifier)),
        }
    }
}

/// Stable sort by name; equal names keep the order the store returned them in.
pub fn order_nutrients(mut nutrients: Vec<NutrientEntry>) -> Vec<NutrientEntry> {
    nutrients.sort_by(|a, b| a.name.cmp(&b.name));
    nutrients
}

/// Manual portions go ahead of the store's, then the combined list is keyed
/// and stably sorted. Nothing is dropped when both sides share a key.
pub fn merge_portions(
    manual: &[PortionEntry],
    stored: Vec<PortionEntry>,
    portion_key: PortionKey,
) -> Vec<PortionEntry> {
    let mut portions: Vec<PortionEntry> = manual.iter().cloned().chain(stored).collect();
    for portion in &mut portions {
        portion.key = portion_key.key_for(portion);
    }
    portions.sort_by(|a, b| portion_key.compare(a, b));
    portions
}

/// Builds the document for one fdc id, or `None` when the store had no food
/// row for it.
pub fn assemble_document(
    fdc_id: &str,
    fetched: FetchedFood,
    manual_portions: &[PortionEntry],
    portion_key: PortionKey,
) -> Option<FoodDocument> {
    let FetchedFood {
        food,
        brand,
        nutrients,
        portions,
    } = fetched;

    let Some(food) = food else {
        error!("could not find fdc_id: {}", fdc_id);
        return None;
    };
    let brand = brand.unwrap_or_default();

    Some(FoodDocument {
        id: fdc_id.to_string(),
        doc_type: FOOD_DOC_TYPE,
        description: food.description,
        fdc_id: food.fdc_id,
        source: food.source,
        nutrients: order_nutrients(nutrients),
        portions: merge_portions(manual_portions, portions, portion_key),
        brand_owner: brand.brand_owner,
        brand_name: brand.brand_name,
        subbrand_name: brand.subbrand_name,
        serving_size: brand.serving_size,
        serving_size_unit: brand.serving_size_unit,
        household_serving_fulltext: brand.household_serving_fulltext,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BrandInfo, FoodRecord};

    fn banana() -> FoodRecord {
        FoodRecord {
            fdc_id: 173944,
            description: "Banana, raw".to_string(),
            source: "sr_legacy".to_string(),
        }
    }

    fn portion(amount: f64, unit: &str, modifier: &str) -> PortionEntry {
        PortionEntry::new(amount, unit, 100.0, "", modifier)
    }

    fn units(portions: &[PortionEntry]) -> Vec<&str> {
        portions.iter().map(|p| p.unit.as_str()).collect()
    }

    #[test]
    fn test_missing_food_row_produces_no_document() {
        let fetched = FetchedFood {
            food: None,
            nutrients: vec![NutrientEntry::new("Iron", 1.0, "mg")],
            ..FetchedFood::default()
        };
        assert!(assemble_document("999999", fetched, &[], PortionKey::Unit).is_none());
    }

    #[test]
    fn test_nutrients_sorted_by_name() {
        let fetched = FetchedFood {
            food: Some(banana()),
            nutrients: vec![
                NutrientEntry::new("Zinc", 0.15, "mg"),
                NutrientEntry::new("Iron", 0.26, "mg"),
            ],
            ..FetchedFood::default()
        };
        let doc = assemble_document("173944", fetched, &[], PortionKey::Unit).unwrap();
        let names: Vec<&str> = doc.nutrients.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["Iron", "Zinc"]);
    }

    #[test]
    fn test_nutrient_sort_is_case_sensitive_and_stable() {
        let sorted = order_nutrients(vec![
            NutrientEntry::new("iron", 1.0, "mg"),
            NutrientEntry::new("Zinc", 2.0, "mg"),
            NutrientEntry::new("Zinc", 3.0, "ug"),
        ]);
        let seen: Vec<(&str, f64)> = sorted.iter().map(|n| (n.name.as_str(), n.amount)).collect();
        assert_eq!(seen, vec![("Zinc", 2.0), ("Zinc", 3.0), ("iron", 1.0)]);
    }

    #[test]
    fn test_manual_and_stored_portions_both_kept() {
        let manual = vec![portion(1.0, "cup", "")];
        let stored = vec![portion(1.0, "gram", "")];
        let merged = merge_portions(&manual, stored, PortionKey::Unit);
        assert_eq!(units(&merged), vec!["gram", "cup"]);
    }

    #[test]
    fn test_shared_unit_keeps_manual_portion_first() {
        let manual = vec![portion(1.0, "cup", "sliced")];
        let stored = vec![portion(1.0, "cup", "mashed"), portion(1.0, "tbsp", "")];
        let merged = merge_portions(&manual, stored, PortionKey::Unit);

        assert_eq!(units(&merged), vec!["tbsp", "cup", "cup"]);
        assert_eq!(merged[1].modifier, "sliced");
        assert_eq!(merged[2].modifier, "mashed");
        assert_eq!(merged[1].key, "cup");
        assert_eq!(merged[2].key, "cup");
    }

    #[test]
    fn test_composite_key_orders_by_amount_unit_modifier() {
        let manual = vec![portion(1.0, "cup", "sliced")];
        let stored = vec![
            portion(2.0, "cup", ""),
            portion(1.0, "cup", "mashed"),
            portion(0.5, "tbsp", ""),
        ];
        let merged = merge_portions(&manual, stored, PortionKey::Composite);

        let keys: Vec<&str> = merged.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, vec!["0.5tbsp", "1cupmashed", "1cupsliced", "2cup"]);
    }

    #[test]
    fn test_brand_fields_copied_through() {
        let fetched = FetchedFood {
            food: Some(banana()),
            brand: Some(BrandInfo {
                brand_owner: None,
                brand_name: Some("Chiquita".to_string()),
                subbrand_name: Some(String::new()),
                serving_size: Some(0.0),
                serving_size_unit: Some(String::new()),
                household_serving_fulltext: Some("1 banana".to_string()),
            }),
            ..FetchedFood::default()
        };
        let doc = assemble_document("173944", fetched, &[], PortionKey::Unit).unwrap();
        assert_eq!(doc.brand_owner, None);
        assert_eq!(doc.brand_name.as_deref(), Some("Chiquita"));
        assert_eq!(doc.serving_size, Some(0.0));
        assert_eq!(doc.household_serving_fulltext.as_deref(), Some("1 banana"));
    }

    #[test]
    fn test_document_carries_identifier_and_food_row() {
        let doc = assemble_document(
            "173944",
            FetchedFood {
                food: Some(banana()),
                ..FetchedFood::default()
            },
            &[],
            PortionKey::Unit,
        )
        .unwrap();

        assert_eq!(doc.id, "173944");
        assert_eq!(doc.doc_type, "food");
        assert_eq!(doc.fdc_id, 173944);
        assert_eq!(doc.source, "sr_legacy");
        assert!(doc.portions.is_empty());
        assert!(doc.brand_name.is_none());
    }
}
