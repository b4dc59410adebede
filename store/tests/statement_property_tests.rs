// Property-based tests for the recipe statement builder
// Feature: recipe-store

use proptest::prelude::*;
use recipe_store::db::statements::{
    insert_recipe, reset_id_sequence, update_recipe, NameTableBuilder, RecipeRef, SqlArg,
    FIRST_NAME_PARAM, GET_RECIPES_PAGE, PAGE_SIZE,
};
use recipe_store::models::{NameTable, NewRecipe, NewTimes, Nutrition};
use regex::Regex;
use std::collections::BTreeSet;
use uuid::Uuid;

fn name_list() -> impl Strategy<Value = Vec<String>> {
    // Small alphabet so duplicates show up
    prop::collection::vec(
        prop::sample::select(vec!["salt", "pepper", "flour", "egg", "milk", "oil"]),
        0..6,
    )
    .prop_map(|names| names.into_iter().map(str::to_string).collect())
}

fn recipe_strategy() -> impl Strategy<Value = NewRecipe> {
    (name_list(), name_list(), name_list(), name_list()).prop_map(
        |(ingredients, instructions, keywords, tools)| NewRecipe {
            name: "Test recipe".to_string(),
            description: "Generated".to_string(),
            url: "https://example.com".to_string(),
            image: Uuid::nil(),
            yield_: 2,
            category: "test".to_string(),
            nutrition: Nutrition::default(),
            times: NewTimes {
                prep: "PT5M".to_string(),
                cook: "PT10M".to_string(),
            },
            ingredients,
            instructions,
            keywords,
            tools,
        },
    )
}

fn distinct(names: &[String]) -> usize {
    names.iter().collect::<BTreeSet<_>>().len()
}

fn placeholders(sql: &str) -> BTreeSet<usize> {
    let re = Regex::new(r"\$(\d+)").unwrap();
    re.captures_iter(sql)
        .map(|c| c[1].parse::<usize>().unwrap())
        .collect()
}

proptest! {
    /// **Feature: recipe-store, Property 1: Placeholders are dense**
    ///
    /// *For any* combination of name lists, the insert statement uses exactly
    /// the placeholders `$1..=$n` where n is the number of arguments.
    #[test]
    fn property_insert_placeholders_are_dense(recipe in recipe_strategy()) {
        let stmt = insert_recipe(1, &recipe);
        let expected_names: usize = NameTable::ALL
            .iter()
            .map(|t| distinct(t.entries(&recipe)))
            .sum();

        prop_assert_eq!(stmt.param_count(), FIRST_NAME_PARAM - 1 + expected_names);
        let used = placeholders(&stmt.sql);
        let all: BTreeSet<usize> = (1..=stmt.param_count()).collect();
        prop_assert_eq!(used, all);
    }

    /// **Feature: recipe-store, Property 2: Update shares the insert layout**
    #[test]
    fn property_update_placeholders_are_dense(recipe in recipe_strategy()) {
        let insert = insert_recipe(1, &recipe);
        let update = update_recipe(1, &recipe);

        prop_assert_eq!(insert.param_count(), update.param_count());
        prop_assert_eq!(&insert.args[1..], &update.args[1..]);
        let all: BTreeSet<usize> = (1..=update.param_count()).collect();
        prop_assert_eq!(placeholders(&update.sql), all);
    }

    /// **Feature: recipe-store, Property 3: Empty lists leave no trace**
    ///
    /// *For any* recipe, a table whose list is empty has no CTE stage, and the
    /// next table's names start right after the last allocated placeholder.
    #[test]
    fn property_empty_lists_emit_no_stage(recipe in recipe_strategy()) {
        let stmt = insert_recipe(1, &recipe);
        for table in NameTable::ALL {
            let stage = format!("ins_{} AS", table.table());
            let link = format!("INSERT INTO {}", table.assoc_table());
            let empty = table.entries(&recipe).is_empty();
            prop_assert_eq!(stmt.sql.contains(&stage), !empty);
            prop_assert_eq!(stmt.sql.contains(&link), !empty);
        }

        let mut builder = NameTableBuilder::new(FIRST_NAME_PARAM, RecipeRef::Inserted);
        let mut expected_next = FIRST_NAME_PARAM;
        for table in NameTable::ALL {
            let entries = table.entries(&recipe);
            builder.push(table, entries);
            if let Some(first) = entries.first() {
                prop_assert_eq!(builder.placeholder(table, first), Some(expected_next));
            }
            expected_next += distinct(entries);
            prop_assert_eq!(builder.next_index(), expected_next);
        }
    }

    /// **Feature: recipe-store, Property 4: Name arguments follow table order**
    #[test]
    fn property_name_arguments_follow_table_order(recipe in recipe_strategy()) {
        let stmt = insert_recipe(9, &recipe);

        let mut expected = Vec::new();
        for table in NameTable::ALL {
            let mut seen = BTreeSet::new();
            for name in table.entries(&recipe) {
                if seen.insert(name.clone()) {
                    expected.push(SqlArg::Text(name.clone()));
                }
            }
        }

        prop_assert_eq!(&stmt.args[FIRST_NAME_PARAM - 1..], expected.as_slice());
    }

    /// **Feature: recipe-store, Property 5: Sequence reset accepts identifiers only**
    #[test]
    fn property_reset_id_sequence_rejects_non_identifiers(table in "[a-z_][a-z0-9_]{0,20}", junk in "[ ;'\"()-]{1,4}") {
        let stmt = reset_id_sequence(&table).unwrap();
        let expected = format!("'{}_id_seq'", table);
        prop_assert!(stmt.sql.contains(&expected));

        let hostile = format!("{}{}", table, junk);
        prop_assert!(reset_id_sequence(&hostile).is_err());
    }
}

#[test]
fn test_page_size_cap_is_twelve() {
    assert_eq!(PAGE_SIZE, 12);
    assert!(GET_RECIPES_PAGE.contains(&format!("LIMIT {}", PAGE_SIZE)));
}

#[test]
fn test_two_recipes_sharing_an_ingredient_bind_the_same_name() {
    let first = NewRecipe {
        ingredients: vec!["salt".to_string(), "flour".to_string()],
        ..Default::default()
    };
    let second = NewRecipe {
        ingredients: vec!["salt".to_string()],
        ..Default::default()
    };

    let a = insert_recipe(1, &first);
    let b = insert_recipe(1, &second);
    // Both statements upsert "salt" through the conflict-tolerant insert
    for stmt in [&a, &b] {
        assert!(stmt
            .sql
            .contains("ON CONFLICT ON CONSTRAINT ingredients_name_key DO UPDATE"));
        assert_eq!(stmt.args[FIRST_NAME_PARAM - 1], SqlArg::Text("salt".into()));
    }
}
