// Update statements

use super::insert::recipe_args;
use super::name_tables::{NameTableBuilder, RecipeRef};
use super::{SqlArg, Statement, FIRST_NAME_PARAM};
use crate::models::{NameTable, NewRecipe};

/// Satellite updates, run as CTEs ahead of the recipe row update.
/// Same layout as the insert except `$1` is the recipe id.
const UPDATE_RECIPE_HEAD: &str = r#"
        WITH ins_category AS (
            INSERT INTO categories (name)
            VALUES ($7)
            ON CONFLICT ON CONSTRAINT categories_name_key DO UPDATE
            SET name = NULL
            WHERE FALSE
            RETURNING id, name
        ), upd_category_recipe AS (
            UPDATE category_recipe
            SET category_id = (
                SELECT id FROM ins_category
                UNION ALL
                SELECT id FROM categories WHERE name = $7
            )
            WHERE recipe_id = $1
        ), upd_nutrition AS (
            UPDATE nutrition
            SET
                calories = $8,
                total_carbohydrates = $9,
                sugars = $10,
                protein = $11,
                total_fat = $12,
                saturated_fat = $13,
                cholesterol = $14,
                sodium = $15,
                fiber = $16
            WHERE recipe_id = $1
        ), ins_times AS (
            INSERT INTO times (prep, cook)
            VALUES ($17::interval, $18::interval)
            ON CONFLICT ON CONSTRAINT times_prep_cook_key DO UPDATE
            SET prep = NULL
            WHERE FALSE
            RETURNING id
        ), upd_time_recipe AS (
            UPDATE time_recipe
            SET time_id = (
                SELECT id FROM ins_times
                UNION ALL
                SELECT id FROM times WHERE prep = $17::interval AND cook = $18::interval
            )
            WHERE recipe_id = $1
        )"#;

/// The image only changes when a real (non-nil) and different uuid is given
const UPDATE_RECIPE_TAIL: &str = r#"
        UPDATE recipes
        SET
            name = $2,
            description = $3,
            image = CASE
                WHEN $4 <> uuid_nil() AND $4 IS DISTINCT FROM image THEN $4
                ELSE image
            END,
            url = $5,
            yield = $6,
            updated_at = NOW()
        WHERE id = $1"#;

/// Build the statement that rewrites recipe `recipe_id` and relinks its
/// children. Existing association rows must be cleared beforehand.
pub fn update_recipe(recipe_id: i64, recipe: &NewRecipe) -> Statement {
    let mut names = NameTableBuilder::new(FIRST_NAME_PARAM, RecipeRef::Param(1));
    for table in NameTable::ALL {
        names.push(table, table.entries(recipe));
    }
    let (stages, name_args) = names.finish();

    let mut args = Vec::with_capacity(FIRST_NAME_PARAM - 1 + name_args.len());
    args.push(SqlArg::from(recipe_id));
    args.extend(recipe_args(recipe));
    args.extend(name_args);

    let sql = [UPDATE_RECIPE_HEAD, stages.as_str(), UPDATE_RECIPE_TAIL].concat();
    Statement::new(sql, args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn recipe_with(ingredients: &[&str], tools: &[&str]) -> NewRecipe {
        NewRecipe {
            name: "Soup".to_string(),
            image: Uuid::nil(),
            yield_: 2,
            category: "dinner".to_string(),
            ingredients: ingredients.iter().map(|s| s.to_string()).collect(),
            tools: tools.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_recipe_id_is_first_argument() {
        let stmt = update_recipe(42, &recipe_with(&["leek"], &[]));
        assert_eq!(stmt.args[0], SqlArg::BigInt(42));
        assert_eq!(stmt.args[18], SqlArg::Text("leek".into()));
        assert_eq!(stmt.param_count(), 19);
    }

    #[test]
    fn test_links_reference_existing_recipe() {
        let stmt = update_recipe(42, &recipe_with(&["leek"], &["pot"]));
        assert!(!stmt.sql.contains("ins_recipe"));
        assert!(stmt.sql.contains("INSERT INTO ingredient_recipe (ingredient_id, recipe_id)"));
        assert!(stmt.sql.contains("SELECT id FROM tools WHERE name = $20"));
    }

    #[test]
    fn test_image_is_kept_for_nil_or_equal_value() {
        let stmt = update_recipe(42, &recipe_with(&[], &[]));
        assert!(stmt
            .sql
            .contains("WHEN $4 <> uuid_nil() AND $4 IS DISTINCT FROM image THEN $4"));
        assert!(stmt.sql.contains("ELSE image"));
    }

    #[test]
    fn test_main_update_comes_last() {
        let stmt = update_recipe(42, &recipe_with(&["leek"], &[]));
        let links = stmt.sql.find("ins_ingredient_recipe AS").unwrap();
        let update = stmt.sql.find("UPDATE recipes").unwrap();
        assert!(links < update);
        assert!(stmt.sql.trim_end().ends_with("WHERE id = $1"));
    }
}
