//! Renders one stored aggregate as SQL INSERT statements for seeding another
//! environment. Rows are emitted with their stored ids in sort-key order, so
//! the output is deterministic for a given database.

use anyhow::Context as _;
use rusqlite::{Connection, params};

use crate::store::Store;

pub fn seed_sql(store: &Store, id: &str) -> anyhow::Result<Option<String>> {
    store.with_conn(|conn| build_seed_sql(conn, id))
}

fn build_seed_sql(conn: &Connection, id: &str) -> anyhow::Result<Option<String>> {
    let mut rows = conn
        .prepare(
            "SELECT id, kind, title, overview, image_url, author, author_url, difficulty,
                    prep_time, cook_time, total_time, servings, source_url, created_at
             FROM content_items WHERE id = ?1",
        )?
        .query_map(params![id], |row| {
            Ok(vec![
                text(row.get::<_, String>(0)?),
                text(row.get::<_, String>(1)?),
                text(row.get::<_, String>(2)?),
                text(row.get::<_, String>(3)?),
                opt_text(row.get(4)?),
                opt_text(row.get(5)?),
                opt_text(row.get(6)?),
                opt_text(row.get(7)?),
                opt_text(row.get(8)?),
                opt_text(row.get(9)?),
                opt_text(row.get(10)?),
                integer(row.get::<_, Option<i64>>(11)?),
                opt_text(row.get(12)?),
                text(row.get::<_, String>(13)?),
            ])
        })?
        .collect::<Result<Vec<_>, _>>()
        .context("read content item")?;

    let Some(parent) = rows.pop() else {
        return Ok(None);
    };

    let mut out = String::new();
    out.push_str("-- guidebase seed export\n");
    out.push_str(&format!("-- content item {id}\n\n"));

    push_insert(
        &mut out,
        "content_items",
        &[
            "id", "kind", "title", "overview", "image_url", "author", "author_url", "difficulty",
            "prep_time", "cook_time", "total_time", "servings", "source_url", "created_at",
        ],
        &[parent],
    );

    let glossary = child_rows(
        conn,
        "SELECT id, item_id, term, definition, context, sort_order
         FROM glossary WHERE item_id = ?1 ORDER BY sort_order",
        id,
        |row| {
            Ok(vec![
                text(row.get::<_, String>(0)?),
                text(row.get::<_, String>(1)?),
                text(row.get::<_, String>(2)?),
                text(row.get::<_, String>(3)?),
                opt_text(row.get(4)?),
                integer(Some(row.get::<_, i64>(5)?)),
            ])
        },
    )?;
    push_insert(
        &mut out,
        "glossary",
        &["id", "item_id", "term", "definition", "context", "sort_order"],
        &glossary,
    );

    let materials = child_rows(
        conn,
        "SELECT id, item_id, name, quantity, unit, notes, measurement_json, sort_order
         FROM materials WHERE item_id = ?1 ORDER BY sort_order",
        id,
        |row| {
            Ok(vec![
                text(row.get::<_, String>(0)?),
                text(row.get::<_, String>(1)?),
                text(row.get::<_, String>(2)?),
                opt_text(row.get(3)?),
                opt_text(row.get(4)?),
                opt_text(row.get(5)?),
                opt_text(row.get(6)?),
                integer(Some(row.get::<_, i64>(7)?)),
            ])
        },
    )?;
    push_insert(
        &mut out,
        "materials",
        &["id", "item_id", "name", "quantity", "unit", "notes", "measurement_json", "sort_order"],
        &materials,
    );

    let tools = child_rows(
        conn,
        "SELECT id, item_id, name, notes, required, sort_order
         FROM tools WHERE item_id = ?1 ORDER BY sort_order",
        id,
        |row| {
            Ok(vec![
                text(row.get::<_, String>(0)?),
                text(row.get::<_, String>(1)?),
                text(row.get::<_, String>(2)?),
                opt_text(row.get(3)?),
                integer(Some(row.get::<_, i64>(4)?)),
                integer(Some(row.get::<_, i64>(5)?)),
            ])
        },
    )?;
    push_insert(
        &mut out,
        "tools",
        &["id", "item_id", "name", "notes", "required", "sort_order"],
        &tools,
    );

    let steps = child_rows(
        conn,
        "SELECT id, item_id, step_number, title, instructions, tips,
                measurements_json, helpful_links_json
         FROM steps WHERE item_id = ?1 ORDER BY step_number",
        id,
        |row| {
            Ok(vec![
                text(row.get::<_, String>(0)?),
                text(row.get::<_, String>(1)?),
                integer(Some(row.get::<_, i64>(2)?)),
                text(row.get::<_, String>(3)?),
                text(row.get::<_, String>(4)?),
                opt_text(row.get(5)?),
                opt_text(row.get(6)?),
                opt_text(row.get(7)?),
            ])
        },
    )?;
    push_insert(
        &mut out,
        "steps",
        &[
            "id", "item_id", "step_number", "title", "instructions", "tips",
            "measurements_json", "helpful_links_json",
        ],
        &steps,
    );

    for (table, columns, sql) in [
        (
            "step_images",
            vec!["id", "step_id", "image_url", "sort_order"],
            "SELECT si.id, si.step_id, si.image_url, si.sort_order
             FROM step_images si
             JOIN steps s ON s.id = si.step_id
             WHERE s.item_id = ?1 ORDER BY s.step_number, si.sort_order",
        ),
        (
            "step_skill_references",
            vec!["id", "step_id", "skill_name", "difficulty", "description", "search_query", "sort_order"],
            "SELECT sr.id, sr.step_id, sr.skill_name, sr.difficulty, sr.description,
                    sr.search_query, sr.sort_order
             FROM step_skill_references sr
             JOIN steps s ON s.id = sr.step_id
             WHERE s.item_id = ?1 ORDER BY s.step_number, sr.sort_order",
        ),
        (
            "step_safety_warnings",
            vec!["id", "step_id", "warning", "severity", "ppe_required_json", "sort_order"],
            "SELECT sw.id, sw.step_id, sw.warning, sw.severity, sw.ppe_required_json,
                    sw.sort_order
             FROM step_safety_warnings sw
             JOIN steps s ON s.id = sw.step_id
             WHERE s.item_id = ?1 ORDER BY s.step_number, sw.sort_order",
        ),
    ] {
        let rows = child_rows(conn, sql, id, |row| {
            let mut values = Vec::with_capacity(columns.len());
            for idx in 0..columns.len() {
                values.push(sql_value(row, idx)?);
            }
            Ok(values)
        })?;
        push_insert(&mut out, table, &columns, &rows);
    }

    Ok(Some(out))
}

fn child_rows(
    conn: &Connection,
    sql: &str,
    id: &str,
    map: impl Fn(&rusqlite::Row<'_>) -> rusqlite::Result<Vec<String>>,
) -> anyhow::Result<Vec<Vec<String>>> {
    let rows = conn
        .prepare(sql)?
        .query_map(params![id], |row| map(row))?
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("read rows: {sql}"))?;
    Ok(rows)
}

fn push_insert(out: &mut String, table: &str, columns: &[&str], rows: &[Vec<String>]) {
    if rows.is_empty() {
        return;
    }
    out.push_str(&format!("-- {table}\n"));
    for row in rows {
        out.push_str(&format!(
            "INSERT OR REPLACE INTO {table} ({}) VALUES ({});\n",
            columns.join(", "),
            row.join(", ")
        ));
    }
    out.push('\n');
}

fn sql_value(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<String> {
    use rusqlite::types::ValueRef;
    Ok(match row.get_ref(idx)? {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Integer(n) => n.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) => text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(_) => "NULL".to_string(),
    })
}

fn text(value: String) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn opt_text(value: Option<String>) -> String {
    match value {
        Some(v) => text(v),
        None => "NULL".to_string(),
    }
}

fn integer(value: Option<i64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "NULL".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::seed_sql;
    use crate::content::{ContentItem, Material, Step};
    use crate::schema::ContentKind;
    use crate::store::Store;

    #[test]
    fn export_covers_parent_and_children_with_escaping() {
        let store = Store::open_in_memory().unwrap();
        let mut item = ContentItem::empty(ContentKind::Recipe, "Grandma's Stew");
        item.overview = "Slow and simple".to_string();
        item.materials = vec![Material {
            name: "beef chuck".to_string(),
            quantity: Some("2".to_string()),
            unit: Some("lb".to_string()),
            notes: None,
            measurement: None,
        }];
        item.steps = vec![Step {
            step_number: 1,
            title: "Brown the meat".to_string(),
            instructions: "Don't crowd the pan".to_string(),
            tips: None,
            image_urls: vec!["https://img.example.test/stew.jpg".to_string()],
            measurements: vec![],
            helpful_links: vec![],
            skill_references: vec![],
            safety_warnings: vec![],
        }];

        let id = store.save(&item).unwrap();
        let sql = seed_sql(&store, &id).unwrap().expect("item exists");

        assert!(sql.contains("INSERT OR REPLACE INTO content_items"));
        assert!(sql.contains("'Grandma''s Stew'"));
        assert!(sql.contains("INSERT OR REPLACE INTO materials"));
        assert!(sql.contains("INSERT OR REPLACE INTO steps"));
        assert!(sql.contains("INSERT OR REPLACE INTO step_images"));
        assert!(sql.contains("Don''t crowd the pan"));
    }

    #[test]
    fn export_of_unknown_id_is_none() {
        let store = Store::open_in_memory().unwrap();
        assert!(seed_sql(&store, "missing").unwrap().is_none());
    }

    #[test]
    fn export_is_deterministic() {
        let store = Store::open_in_memory().unwrap();
        let id = store
            .save(&ContentItem::empty(ContentKind::Tutorial, "Bench"))
            .unwrap();
        let first = seed_sql(&store, &id).unwrap().unwrap();
        let second = seed_sql(&store, &id).unwrap().unwrap();
        assert_eq!(first, second);
    }
}
