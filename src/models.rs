// fdcsync/src/models.rs
//! Records read from the FoodData Central store and the documents built from them.

use serde::Serialize;

/// Base row from the `food` table. A document cannot exist without one.
#[derive(Debug, Clone, PartialEq)]
pub struct FoodRecord {
    pub fdc_id: i64,
    pub description: String,
    pub source: String,
}

/// Row from `branded_food`. Only branded foods have one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrandInfo {
    pub brand_owner: Option<String>,
    pub brand_name: Option<String>,
    pub subbrand_name: Option<String>,
    pub serving_size: Option<f64>,
    pub serving_size_unit: Option<String>,
    pub household_serving_fulltext: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NutrientEntry {
    #[serde(rename = "_key")]
    pub key: String,
    pub name: String,
    pub amount: f64,
    pub unit_name: String,
}

impl NutrientEntry {
    pub fn new(name: impl Into<String>, amount: f64, unit_name: impl Into<String>) -> Self {
        let name = name.into();
        NutrientEntry {
            key: name.clone(),
            name,
            amount,
            unit_name: unit_name.into(),
        }
    }
}

/// A household measure for a food, either from `food_portion` or from the
/// manual override file. `key` is filled in by the assembler once the
/// deployment's merge key is known.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortionEntry {
    #[serde(rename = "_key")]
    pub key: String,
    pub amount: f64,
    pub unit: String,
    pub gram_weight: f64,
    #[serde(rename = "portion_description")]
    pub description: String,
    pub modifier: String,
}

impl PortionEntry {
    pub fn new(
        amount: f64,
        unit: impl Into<String>,
        gram_weight: f64,
        description: impl Into<String>,
        modifier: impl Into<String>,
    ) -> Self {
        PortionEntry {
            key: String::new(),
            amount,
            unit: unit.into(),
            gram_weight,
            description: description.into(),
            modifier: modifier.into(),
        }
    }
}

/// Everything the store returned for one identifier. Each lookup that failed
/// or matched nothing shows up here as `None` or an empty list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchedFood {
    pub food: Option<FoodRecord>,
    pub brand: Option<BrandInfo>,
    pub nutrients: Vec<NutrientEntry>,
    pub portions: Vec<PortionEntry>,
}

/// Submission-ready food document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoodDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_type")]
    pub doc_type: &'static str,
    pub description: String,
    pub fdc_id: i64,
    pub source: String,
    pub nutrients: Vec<NutrientEntry>,
    pub portions: Vec<PortionEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subbrand_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serving_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serving_size_unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub household_serving_fulltext: Option<String>,
}

pub const FOOD_DOC_TYPE: &str = "food";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mutation {
    #[serde(rename = "createOrReplace")]
    pub create_or_replace: FoodDocument,
}

/// One upsert request worth of documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MutationBatch {
    pub mutations: Vec<Mutation>,
}

impl MutationBatch {
    pub fn from_documents(documents: Vec<FoodDocument>) -> Self {
        MutationBatch {
            mutations: documents
                .into_iter()
                .map(|doc| Mutation { create_or_replace: doc })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unbranded_document_omits_brand_fields() -> anyhow::Result<()> {
        let doc = FoodDocument {
            id: "173944".to_string(),
            doc_type: FOOD_DOC_TYPE,
            description: "Banana, raw".to_string(),
            fdc_id: 173944,
            source: "sr_legacy".to_string(),
            nutrients: vec![NutrientEntry::new("Potassium", 358.0, "mg")],
            portions: vec![],
            brand_owner: None,
            brand_name: None,
            subbrand_name: None,
            serving_size: None,
            serving_size_unit: None,
            household_serving_fulltext: None,
        };
        let batch = MutationBatch::from_documents(vec![doc]);

        let value = serde_json::to_value(&batch)?;
        assert_eq!(
            value,
            json!({
                "mutations": [{
                    "createOrReplace": {
                        "_id": "173944",
                        "_type": "food",
                        "description": "Banana, raw",
                        "fdc_id": 173944,
                        "source": "sr_legacy",
                        "nutrients": [
                            {"_key": "Potassium", "name": "Potassium", "amount": 358.0, "unit_name": "mg"}
                        ],
                        "portions": []
                    }
                }]
            })
        );
        Ok(())
    }

    #[test]
    fn test_portion_serializes_description_under_wire_name() -> anyhow::Result<()> {
        let mut portion = PortionEntry::new(1.0, "cup", 118.0, "sliced", "");
        portion.key = "cup".to_string();
        let value = serde_json::to_value(&portion)?;
        assert_eq!(value["portion_description"], "sliced");
        assert_eq!(value["_key"], "cup");
        assert!(value.get("description").is_none());
        Ok(())
    }
}
