use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use uuid::Uuid;

// ============================================================================
// Recipe Models
// ============================================================================

/// Recipe as read back from the database, child collections materialized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub url: String,
    /// Nil uuid when the recipe has no image
    pub image: Uuid,
    #[serde(rename = "yield")]
    pub yield_: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub category: String,
    pub nutrition: Nutrition,
    /// Name lists come back in no particular order; links store no position,
    /// so instruction steps are not guaranteed to keep their submitted order
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub keywords: Vec<String>,
    pub tools: Vec<String>,
    pub times: Times,
}

/// One row of a recipes page, carrying the cursor value for the next page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeSummary {
    pub row_number: i64,
    pub recipe: Recipe,
}

/// Nutrition facts; one row per recipe
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrition {
    pub calories: String,
    pub total_carbohydrates: String,
    pub sugars: String,
    pub protein: String,
    pub total_fat: String,
    pub saturated_fat: String,
    pub cholesterol: String,
    pub sodium: String,
    pub fiber: String,
}

/// Preparation and cooking durations, rendered by PostgreSQL as interval text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Times {
    pub prep: String,
    pub cook: String,
    pub total: String,
}

/// Recipe fields supplied on insert and update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewRecipe {
    pub name: String,
    pub description: String,
    pub url: String,
    /// Nil uuid means "no image"; on update it keeps the stored image
    pub image: Uuid,
    #[serde(rename = "yield")]
    pub yield_: i16,
    pub category: String,
    pub nutrition: Nutrition,
    pub times: NewTimes,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub tools: Vec<String>,
}

/// Durations as PostgreSQL interval literals, e.g. `"PT30M"` or `"00:30:00"`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewTimes {
    pub prep: String,
    pub cook: String,
}

impl<'r> FromRow<'r, PgRow> for Recipe {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Recipe {
            id: row.try_get("recipe_id")?,
            name: row.try_get("recipe_name")?,
            description: row.try_get("description")?,
            url: row.try_get("url")?,
            image: row.try_get::<Option<Uuid>, _>("image")?.unwrap_or_else(Uuid::nil),
            yield_: row.try_get("yield")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            category: row.try_get("category")?,
            nutrition: Nutrition {
                calories: row.try_get("calories")?,
                total_carbohydrates: row.try_get("total_carbohydrates")?,
                sugars: row.try_get("sugars")?,
                protein: row.try_get("protein")?,
                total_fat: row.try_get("total_fat")?,
                saturated_fat: row.try_get("saturated_fat")?,
                cholesterol: row.try_get("cholesterol")?,
                sodium: row.try_get("sodium")?,
                fiber: row.try_get("fiber")?,
            },
            ingredients: row.try_get("ingredients")?,
            instructions: row.try_get("instructions")?,
            keywords: row.try_get("keywords")?,
            tools: row.try_get("tools")?,
            times: Times {
                prep: row.try_get("time_prep")?,
                cook: row.try_get("time_cook")?,
                total: row.try_get("time_total")?,
            },
        })
    }
}

impl<'r> FromRow<'r, PgRow> for RecipeSummary {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(RecipeSummary {
            row_number: row.try_get("row_number")?,
            recipe: Recipe::from_row(row)?,
        })
    }
}

// ============================================================================
// Lookup tables
// ============================================================================

/// Name-keyed lookup tables linked to recipes through an association table.
/// Declaration order is the placeholder allocation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NameTable {
    Ingredients,
    Instructions,
    Keywords,
    Tools,
}

impl NameTable {
    pub const ALL: [NameTable; 4] = [
        NameTable::Ingredients,
        NameTable::Instructions,
        NameTable::Keywords,
        NameTable::Tools,
    ];

    /// Lookup table holding the unique names
    pub fn table(self) -> &'static str {
        match self {
            NameTable::Ingredients => "ingredients",
            NameTable::Instructions => "instructions",
            NameTable::Keywords => "keywords",
            NameTable::Tools => "tools",
        }
    }

    /// Singular entity name, prefix of the association table and its id column
    pub fn entity(self) -> &'static str {
        match self {
            NameTable::Ingredients => "ingredient",
            NameTable::Instructions => "instruction",
            NameTable::Keywords => "keyword",
            NameTable::Tools => "tool",
        }
    }

    pub fn assoc_table(self) -> String {
        format!("{}_recipe", self.entity())
    }

    /// Names of this table carried by a recipe input
    pub fn entries(self, recipe: &NewRecipe) -> &[String] {
        match self {
            NameTable::Ingredients => &recipe.ingredients,
            NameTable::Instructions => &recipe.instructions,
            NameTable::Keywords => &recipe.keywords,
            NameTable::Tools => &recipe.tools,
        }
    }
}

// ============================================================================
// User Models
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,
}
