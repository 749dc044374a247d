// fdcsync/src/sync/store.rs
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use tracing::{info, warn};

use crate::errors::Result;
use crate::models::{BrandInfo, FetchedFood, FoodRecord, NutrientEntry, PortionEntry};

const FOOD_QUERY: &str = r#"
    SELECT CAST(f.fdc_id AS INTEGER) AS fdc_id, f.description, f.data_type AS source
    FROM food f
    WHERE f.fdc_id = ?
"#;

const BRAND_QUERY: &str = r#"
    SELECT brand_owner,
           IFNULL(brand_name, '') AS brand_name,
           IFNULL(subbrand_name, '') AS subbrand_name,
           CAST(IFNULL(serving_size, 0) AS REAL) AS serving_size,
           IFNULL(serving_size_unit, '') AS serving_size_unit,
           IFNULL(household_serving_fulltext, '') AS household_serving_fulltext
    FROM branded_food
    WHERE fdc_id = ?
"#;

const NUTRIENTS_QUERY: &str = r#"
    SELECT n.name, CAST(fn.amount AS REAL) AS amount, n.unit_name
    FROM food_nutrient fn
    INNER JOIN nutrient n ON fn.nutrient_id = n.id
    WHERE fn.fdc_id = ?
"#;

const PORTIONS_QUERY: &str = r#"
    SELECT CAST(fp.amount AS REAL) AS amount,
           m.name AS unit,
           CAST(fp.gram_weight AS REAL) AS gram_weight,
           IFNULL(fp.portion_description, '') AS portion_description,
           IFNULL(fp.modifier, '') AS modifier
    FROM food_portion fp
    INNER JOIN measure_unit m ON fp.measure_unit_id = m.id
    WHERE fp.fdc_id = ?
"#;

type BrandRow = (Option<String>, String, String, f64, String, String);

/// Read-only handle on a FoodData Central sqlite export.
pub struct FoodStore {
    pool: Pool<Sqlite>,
}

impl FoodStore {
    /// Opens an existing database file read-only. The file is never created.
    pub async fn open(database_path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .read_only(true)
            .create_if_missing(false);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        info!("✅ Opened food database {}", database_path.display());
        Ok(FoodStore { pool })
    }

    #[cfg(test)]
    pub fn from_pool(pool: Pool<Sqlite>) -> Self {
        FoodStore { pool }
    }

    pub async fn close(self) {
        self.pool.close().await;
    }

    /// Runs all four lookups for one fdc id. Failures are logged and turned
    /// into missing data so that one bad id cannot take the batch down.
    pub async fn fetch(&self, fdc_id: &str) -> FetchedFood {
        let food = self.food(fdc_id).await.unwrap_or_else(|e| {
            warn!("Food lookup failed for fdc_id {}: {}", fdc_id, e);
            None
        });
        let brand = self.brand(fdc_id).await.unwrap_or_else(|e| {
            warn!("Brand lookup failed for fdc_id {}: {}", fdc_id, e);
            None
        });
        let nutrients = self.nutrients(fdc_id).await.unwrap_or_else(|e| {
            warn!("Nutrient lookup failed for fdc_id {}: {}", fdc_id, e);
            Vec::new()
        });
        let portions = self.portions(fdc_id).await.unwrap_or_else(|e| {
            warn!("Portion lookup failed for fdc_id {}: {}", fdc_id, e);
            Vec::new()
        });

        FetchedFood {
            food,
            brand,
            nutrients,
            portions,
        }
    }

    /// Exactly one row is a match; none or several is treated as not found.
    pub async fn food(&self, fdc_id: &str) -> Result<Option<FoodRecord>> {
        let mut rows = sqlx::query_as::<_, (i64, String, String)>(FOOD_QUERY)
            .bind(fdc_id)
            .fetch_all(&self.pool)
            .await?;

        if rows.len() > 1 {
            warn!("Expected one food row for fdc_id {}, found {}", fdc_id, rows.len());
            return Ok(None);
        }
        Ok(rows.pop().map(|(fdc_id, description, source)| FoodRecord {
            fdc_id,
            description,
            source,
        }))
    }

    pub async fn brand(&self, fdc_id: &str) -> Result<Option<BrandInfo>> {
        let mut rows = sqlx::query_as::<_, BrandRow>(BRAND_QUERY)
            .bind(fdc_id)
            .fetch_all(&self.pool)
            .await?;

        if rows.len() > 1 {
            warn!("Expected at most one brand row for fdc_id {}, found {}", fdc_id, rows.len());
            return Ok(None);
        }
        Ok(rows.pop().map(
            |(brand_owner, brand_name, subbrand_name, serving_size, serving_size_unit, household)| {
                BrandInfo {
                    brand_owner,
                    brand_name: Some(brand_name),
                    subbrand_name: Some(subbrand_name),
                    serving_size: Some(serving_size),
                    serving_size_unit: Some(serving_size_unit),
                    household_serving_fulltext: Some(household),
                }
            },
        ))
    }

    pub async fn nutrients(&self, fdc_id: &str) -> Result<Vec<NutrientEntry>> {
        let rows = sqlx::query_as::<_, (String, f64, String)>(NUTRIENTS_QUERY)
            .bind(fdc_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(name, amount, unit_name)| NutrientEntry::new(name, amount, unit_name))
            .collect())
    }

    pub async fn portions(&self, fdc_id: &str) -> Result<Vec<PortionEntry>> {
        let rows = sqlx::query_as::<_, (f64, String, f64, String, String)>(PORTIONS_QUERY)
            .bind(fdc_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(amount, unit, gram_weight, description, modifier)| {
                PortionEntry::new(amount, unit, gram_weight, description, modifier)
            })
            .collect())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use sqlx::{Pool, Sqlite};

    pub const SCHEMA: &[&str] = &[
        "CREATE TABLE food (fdc_id INTEGER NOT NULL, data_type TEXT, description TEXT)",
        "CREATE TABLE branded_food (fdc_id INTEGER NOT NULL, brand_owner TEXT, brand_name TEXT, subbrand_name TEXT, serving_size REAL, serving_size_unit TEXT, household_serving_fulltext TEXT)",
        "CREATE TABLE nutrient (id INTEGER PRIMARY KEY, name TEXT, unit_name TEXT)",
        "CREATE TABLE food_nutrient (id INTEGER PRIMARY KEY, fdc_id INTEGER NOT NULL, nutrient_id INTEGER NOT NULL, amount REAL)",
        "CREATE TABLE measure_unit (id INTEGER PRIMARY KEY, name TEXT)",
        "CREATE TABLE food_portion (id INTEGER PRIMARY KEY, fdc_id INTEGER NOT NULL, amount REAL, measure_unit_id INTEGER, portion_description TEXT, modifier TEXT, gram_weight REAL)",
    ];

    /// Banana (no brand, one nutrient, no portions), apple (two nutrients,
    /// two portions) and a branded yogurt with nulls in its brand row.
    pub const SEED: &[&str] = &[
        "INSERT INTO food VALUES (173944, 'sr_legacy_food', 'Banana, raw')",
        "INSERT INTO food VALUES (171688, 'sr_legacy_food', 'Apples, raw, with skin')",
        "INSERT INTO food VALUES (2345678, 'branded_food', 'Greek Yogurt')",
        "INSERT INTO nutrient VALUES (1092, 'Potassium, K', 'MG'), (1089, 'Iron, Fe', 'MG'), (1095, 'Zinc, Zn', 'MG')",
        "INSERT INTO food_nutrient (fdc_id, nutrient_id, amount) VALUES (173944, 1092, 358.0)",
        "INSERT INTO food_nutrient (fdc_id, nutrient_id, amount) VALUES (171688, 1095, 0.04), (171688, 1089, 0.12)",
        "INSERT INTO measure_unit VALUES (1000, 'cup'), (1043, 'piece'), (9999, 'undetermined')",
        "INSERT INTO food_portion (fdc_id, amount, measure_unit_id, portion_description, modifier, gram_weight) VALUES (171688, 1.0, 1000, NULL, 'quartered or chopped', 125.0)",
        "INSERT INTO food_portion (fdc_id, amount, measure_unit_id, portion_description, modifier, gram_weight) VALUES (171688, 1.0, 9999, 'large', NULL, 223.0)",
        "INSERT INTO branded_food VALUES (2345678, 'Dairy Co', NULL, NULL, 170.0, 'g', NULL)",
    ];

    pub async fn seed(pool: &Pool<Sqlite>) -> anyhow::Result<()> {
        for statement in SCHEMA.iter().chain(SEED.iter()) {
            sqlx::query(statement).execute(pool).await?;
        }
        Ok(())
    }
}
