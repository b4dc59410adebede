// Insert statements

use super::name_tables::{NameTableBuilder, RecipeRef};
use super::{SqlArg, Statement, FIRST_NAME_PARAM};
use crate::models::{NameTable, NewRecipe};

/// Fixed stages of a recipe insert.
///
/// $1 owner user id, $2-$6 recipe columns, $7 category, $8-$16 nutrition,
/// $17-$18 prep and cook intervals.
const INSERT_RECIPE_HEAD: &str = r#"
        WITH ins_recipe AS (
            INSERT INTO recipes (name, description, image, url, yield)
            VALUES ($2, $3, $4, $5, $6)
            RETURNING id
        ), ins_category AS (
            INSERT INTO categories (name)
            VALUES ($7)
            ON CONFLICT ON CONSTRAINT categories_name_key DO UPDATE
            SET name = NULL
            WHERE FALSE
            RETURNING id, name
        ), ins_category_recipe AS (
            INSERT INTO category_recipe (recipe_id, category_id)
            VALUES (
                (SELECT id FROM ins_recipe),
                (
                    SELECT id FROM ins_category
                    UNION ALL
                    SELECT id FROM categories WHERE name = $7
                )
            )
        ), ins_nutrition AS (
            INSERT INTO nutrition (
                recipe_id, calories, total_carbohydrates, sugars,
                protein, total_fat, saturated_fat, cholesterol, sodium, fiber
            )
            VALUES ((SELECT id FROM ins_recipe), $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING id
        ), ins_times AS (
            INSERT INTO times (prep, cook)
            VALUES ($17::interval, $18::interval)
            ON CONFLICT ON CONSTRAINT times_prep_cook_key DO UPDATE
            SET prep = NULL
            WHERE FALSE
            RETURNING id
        ), ins_time_recipe AS (
            INSERT INTO time_recipe (time_id, recipe_id)
            VALUES (
                (
                    SELECT id FROM ins_times
                    UNION ALL
                    SELECT id FROM times WHERE prep = $17::interval AND cook = $18::interval
                ),
                (SELECT id FROM ins_recipe)
            )
        ), ins_user_recipe AS (
            INSERT INTO user_recipe (user_id, recipe_id)
            VALUES ($1, (SELECT id FROM ins_recipe))
        )"#;

const INSERT_RECIPE_TAIL: &str = r#"
        SELECT id FROM ins_recipe"#;

pub const INSERT_USER: &str = r#"
    INSERT INTO users (username, email, hashed_password)
    VALUES ($1, $2, $3)
    RETURNING id"#;

/// Arguments `$2`..`$18`, shared by insert and update
pub(crate) fn recipe_args(recipe: &NewRecipe) -> Vec<SqlArg> {
    let n = &recipe.nutrition;
    vec![
        SqlArg::from(&recipe.name),
        SqlArg::from(&recipe.description),
        SqlArg::from(recipe.image),
        SqlArg::from(&recipe.url),
        SqlArg::from(recipe.yield_),
        SqlArg::from(&recipe.category),
        SqlArg::from(&n.calories),
        SqlArg::from(&n.total_carbohydrates),
        SqlArg::from(&n.sugars),
        SqlArg::from(&n.protein),
        SqlArg::from(&n.total_fat),
        SqlArg::from(&n.saturated_fat),
        SqlArg::from(&n.cholesterol),
        SqlArg::from(&n.sodium),
        SqlArg::from(&n.fiber),
        SqlArg::from(&recipe.times.prep),
        SqlArg::from(&recipe.times.cook),
    ]
}

/// Build the single statement that inserts a recipe with all of its children
/// for `user_id`. The statement returns the new recipe id.
pub fn insert_recipe(user_id: i64, recipe: &NewRecipe) -> Statement {
    let mut names = NameTableBuilder::new(FIRST_NAME_PARAM, RecipeRef::Inserted);
    for table in NameTable::ALL {
        names.push(table, table.entries(recipe));
    }
    let (stages, name_args) = names.finish();

    let mut args = Vec::with_capacity(FIRST_NAME_PARAM - 1 + name_args.len());
    args.push(SqlArg::from(user_id));
    args.extend(recipe_args(recipe));
    args.extend(name_args);

    let sql = [INSERT_RECIPE_HEAD, stages.as_str(), INSERT_RECIPE_TAIL].concat();
    Statement::new(sql, args)
}
