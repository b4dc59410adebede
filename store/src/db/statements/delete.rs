// Delete statements

/// Nutrition and link rows go with the recipe through `ON DELETE CASCADE`
pub const DELETE_RECIPE: &str = "DELETE FROM recipes WHERE id = $1";

/// Drop every name-table link of recipe `$1`; the lookup rows stay
pub const CLEAR_ASSOCIATIONS: &str = r#"
    WITH del_ingredients AS (
        DELETE FROM ingredient_recipe
        WHERE recipe_id = $1
    ), del_instructions AS (
        DELETE FROM instruction_recipe
        WHERE recipe_id = $1
    ), del_tools AS (
        DELETE FROM tool_recipe
        WHERE recipe_id = $1
    )
    DELETE FROM keyword_recipe
    WHERE recipe_id = $1"#;
