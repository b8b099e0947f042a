use crate::db::DbPool;
use crate::models::{NewIngredient, NewTag};
use crate::schema::{ingredients, tags};
use anyhow::{Context, Result};
use diesel::prelude::*;
use std::collections::HashSet;
use std::path::Path;

/// Bulk-load ingredients and tags from headerless CSV files. Each file is
/// processed independently: a bad file is logged and skipped without
/// aborting the other import.
pub fn run(pool: &DbPool, ingredients_path: Option<&Path>, tags_path: Option<&Path>) -> Result<()> {
    let mut conn = pool.get().context("Failed to get DB connection")?;

    if let Some(path) = ingredients_path {
        match load_ingredients(&mut conn, path) {
            Ok(count) => tracing::info!("{}: loaded {} ingredients", path.display(), count),
            Err(e) => tracing::error!("{}: import failed: {:#}", path.display(), e),
        }
    }

    if let Some(path) = tags_path {
        match load_tags(&mut conn, path) {
            Ok(count) => tracing::info!("{}: loaded {} tags", path.display(), count),
            Err(e) => tracing::error!("{}: import failed: {:#}", path.display(), e),
        }
    }

    Ok(())
}

/// Read `name,measurement_unit` rows. The ingredients table has no unique
/// constraint, so already-present (name, unit) pairs are skipped here.
fn load_ingredients(conn: &mut PgConnection, path: &Path) -> Result<usize> {
    let rows = read_rows(path)?;

    let existing: HashSet<(String, String)> = ingredients::table
        .select((ingredients::name, ingredients::measurement_unit))
        .load(conn)?
        .into_iter()
        .collect();

    let fresh = dedupe_pairs(rows, existing);

    let new_rows: Vec<NewIngredient> = fresh
        .iter()
        .map(|(name, unit)| NewIngredient {
            name,
            measurement_unit: unit,
        })
        .collect();

    diesel::insert_into(ingredients::table)
        .values(&new_rows)
        .execute(conn)?;

    Ok(new_rows.len())
}

/// Read `name,slug` rows. Conflicting rows are skipped by the unique
/// constraints on name and slug.
fn load_tags(conn: &mut PgConnection, path: &Path) -> Result<usize> {
    let rows = read_rows(path)?;
    let fresh = dedupe_pairs(rows, HashSet::new());

    let new_rows: Vec<NewTag> = fresh
        .iter()
        .map(|(name, slug)| NewTag { name, slug })
        .collect();

    let inserted = diesel::insert_into(tags::table)
        .values(&new_rows)
        .on_conflict_do_nothing()
        .execute(conn)?;

    Ok(inserted)
}

fn read_rows(path: &Path) -> Result<Vec<(String, String)>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let first = record
            .get(0)
            .context("Row is missing its first column")?
            .trim();
        let second = record
            .get(1)
            .context("Row is missing its second column")?
            .trim();
        if first.is_empty() {
            continue;
        }
        rows.push((first.to_string(), second.to_string()));
    }

    Ok(rows)
}

/// Drop rows already in `existing`, and repeats within the batch itself.
fn dedupe_pairs(
    rows: Vec<(String, String)>,
    mut existing: HashSet<(String, String)>,
) -> Vec<(String, String)> {
    let mut fresh = Vec::new();
    for row in rows {
        if existing.insert(row.clone()) {
            fresh.push(row);
        }
    }
    fresh
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(data: &str) -> Vec<(String, String)> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(data.as_bytes());
        reader
            .records()
            .map(|r| {
                let r = r.unwrap();
                (r.get(0).unwrap().to_string(), r.get(1).unwrap().to_string())
            })
            .collect()
    }

    #[test]
    fn test_parse_ingredient_rows() {
        let rows = parse("flour,g\nmilk,ml\n");
        assert_eq!(
            rows,
            vec![
                ("flour".to_string(), "g".to_string()),
                ("milk".to_string(), "ml".to_string()),
            ]
        );
    }

    #[test]
    fn test_dedupe_skips_existing_pairs() {
        let existing: HashSet<_> = [("flour".to_string(), "g".to_string())].into();
        let rows = vec![
            ("flour".to_string(), "g".to_string()),
            ("flour".to_string(), "kg".to_string()),
        ];
        let fresh = dedupe_pairs(rows, existing);
        assert_eq!(fresh, vec![("flour".to_string(), "kg".to_string())]);
    }

    #[test]
    fn test_dedupe_skips_repeats_within_batch() {
        let rows = vec![
            ("salt".to_string(), "g".to_string()),
            ("salt".to_string(), "g".to_string()),
        ];
        let fresh = dedupe_pairs(rows, HashSet::new());
        assert_eq!(fresh.len(), 1);
    }
}
