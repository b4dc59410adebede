// Upsert-and-relink stages for the name-keyed lookup tables
//
// For every non-empty name list two CTEs are appended to a statement:
//
//   ins_<table>          inserts the names that do not exist yet. The
//                        `DO UPDATE ... WHERE FALSE` arm never touches an
//                        existing row, so RETURNING yields only new rows.
//   ins_<entity>_recipe  links every name to the recipe. The id comes from the
//                        freshly inserted rows or, failing that, from the rows
//                        that existed before the statement; CTE writes are not
//                        visible to the second branch, so exactly one resolves.

use std::collections::HashMap;

use super::SqlArg;
use crate::models::NameTable;

/// How the relink stage refers to the owning recipe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeRef {
    /// Recipe created by the `ins_recipe` CTE of the same statement
    Inserted,
    /// Existing recipe whose id is bound at this placeholder
    Param(usize),
}

impl RecipeRef {
    fn sql(self) -> String {
        match self {
            RecipeRef::Inserted => "(SELECT id FROM ins_recipe)".to_string(),
            RecipeRef::Param(index) => format!("${}", index),
        }
    }
}

/// Accumulates name-table CTE stages and their arguments.
///
/// Placeholders are handed out from `first_index` in push order, one per
/// distinct name of a table. Empty lists emit nothing and consume no
/// placeholders. Pushing a table again adds its new names to the stage the
/// first push opened, so each table yields at most one pair of CTEs.
#[derive(Debug)]
pub struct NameTableBuilder<'a> {
    recipe: RecipeRef,
    stages: Vec<(NameTable, Vec<usize>)>,
    next_index: usize,
    placeholders: HashMap<NameTable, HashMap<&'a str, usize>>,
    args: Vec<SqlArg>,
}

impl<'a> NameTableBuilder<'a> {
    pub fn new(first_index: usize, recipe: RecipeRef) -> Self {
        Self {
            recipe,
            stages: Vec::new(),
            next_index: first_index,
            placeholders: HashMap::new(),
            args: Vec::new(),
        }
    }

    /// Next placeholder index that would be allocated
    pub fn next_index(&self) -> usize {
        self.next_index
    }

    /// Placeholder bound to `name` in `table`, if any
    pub fn placeholder(&self, table: NameTable, name: &str) -> Option<usize> {
        self.placeholders
            .get(&table)
            .and_then(|names| names.get(name))
            .copied()
    }

    /// Add the insert-if-new and relink stages for one table
    pub fn push(&mut self, table: NameTable, entries: &'a [String]) -> &mut Self {
        let assigned = self.placeholders.entry(table).or_default();
        let mut params = Vec::new();
        for entry in entries {
            if assigned.contains_key(entry.as_str()) {
                continue;
            }
            assigned.insert(entry.as_str(), self.next_index);
            self.args.push(SqlArg::Text(entry.clone()));
            params.push(self.next_index);
            self.next_index += 1;
        }

        if params.is_empty() {
            return self;
        }
        match self.stages.iter_mut().find(|(t, _)| *t == table) {
            Some((_, existing)) => existing.extend(params),
            None => self.stages.push((table, params)),
        }
        self
    }

    fn insert_stage(&self, table: NameTable, params: &[usize]) -> String {
        let values = params
            .iter()
            .map(|p| format!("(${})", p))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            r#", ins_{table} AS (
            INSERT INTO {table} (name)
            VALUES {values}
            ON CONFLICT ON CONSTRAINT {table}_name_key DO UPDATE
            SET name = NULL
            WHERE FALSE
            RETURNING id, name
        )"#,
            table = table.table(),
            values = values,
        )
    }

    fn link_stage(&self, table: NameTable, params: &[usize]) -> String {
        let recipe_id = self.recipe.sql();
        let rows = params
            .iter()
            .map(|p| {
                format!(
                    r#"
            (
                (
                    SELECT id FROM ins_{table} WHERE name = ${p}
                    UNION ALL
                    SELECT id FROM {table} WHERE name = ${p}
                ),
                {recipe_id}
            )"#,
                    table = table.table(),
                    p = p,
                    recipe_id = recipe_id,
                )
            })
            .collect::<Vec<_>>()
            .join(",");

        format!(
            r#", ins_{entity}_recipe AS (
            INSERT INTO {assoc} ({entity}_id, recipe_id)
            VALUES{rows}
        )"#,
            entity = table.entity(),
            assoc = table.assoc_table(),
            rows = rows,
        )
    }

    /// Joined CTE text and the arguments in placeholder order
    pub fn finish(self) -> (String, Vec<SqlArg>) {
        let mut sql = String::new();
        for (table, params) in &self.stages {
            sql.push_str(&self.insert_stage(*table, params));
            sql.push_str(&self.link_stage(*table, params));
        }
        (sql, self.args)
    }
}
