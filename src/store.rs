use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use anyhow::Context as _;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension as _, params};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::content::{
    ChecklistItem, ChecklistItemType, ContentItem, Difficulty, GlossaryTerm, ItemSummary, Material,
    MeasurementConversion, SafetyWarning, Severity, SkillReference, Step, StoredItem, Tool,
};
use crate::schema::ContentKind;

/// Relational storage for content aggregates and the materials checklist.
///
/// Aggregates are written and removed as whole trees; there is no update
/// path. Checklist rows are snapshots copied out of an aggregate and live
/// outside its cascade graph.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create database dir: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("open database: {}", path.display()))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        Self::from_connection(Connection::open_in_memory().context("open in-memory database")?)
    }

    fn from_connection(conn: Connection) -> anyhow::Result<Self> {
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .context("set pragmas")?;
        init_schema(&conn).context("initialize schema")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> anyhow::Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("database connection lock poisoned"))
    }

    pub(crate) fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> anyhow::Result<T>,
    ) -> anyhow::Result<T> {
        let conn = self.conn()?;
        f(&conn)
    }

    /// Writes the aggregate as a batch of inserts inside one transaction,
    /// assigning fresh ids and sort keys equal to array position. Returns the
    /// new aggregate id.
    pub fn save(&self, content: &ContentItem) -> anyhow::Result<String> {
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;

        let item_id = new_id();
        let created_at = format_timestamp(Utc::now());

        tx.execute(
            "INSERT INTO content_items
             (id, kind, title, overview, image_url, author, author_url, difficulty,
              prep_time, cook_time, total_time, servings, source_url, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                item_id,
                content.kind.as_str(),
                content.title,
                content.overview,
                content.image_url,
                content.author,
                content.author_url,
                content.difficulty,
                content.prep_time,
                content.cook_time,
                content.total_time,
                content.servings,
                content.source_url,
                created_at,
            ],
        )
        .context("insert content item")?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO glossary (id, item_id, term, definition, context, sort_order)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for (idx, term) in content.glossary.iter().enumerate() {
                stmt.execute(params![
                    new_id(),
                    item_id,
                    term.term,
                    term.definition,
                    term.context,
                    idx as i64,
                ])?;
            }
        }

        {
            let mut stmt = tx.prepare(
                "INSERT INTO materials
                 (id, item_id, name, quantity, unit, notes, measurement_json, sort_order)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for (idx, mat) in content.materials.iter().enumerate() {
                stmt.execute(params![
                    new_id(),
                    item_id,
                    mat.name,
                    mat.quantity,
                    mat.unit,
                    mat.notes,
                    to_json_column(&mat.measurement)?,
                    idx as i64,
                ])?;
            }
        }

        {
            let mut stmt = tx.prepare(
                "INSERT INTO tools (id, item_id, name, notes, required, sort_order)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for (idx, tool) in content.tools.iter().enumerate() {
                stmt.execute(params![
                    new_id(),
                    item_id,
                    tool.name,
                    tool.notes,
                    tool.required as i64,
                    idx as i64,
                ])?;
            }
        }

        for step in &content.steps {
            let step_id = new_id();
            tx.execute(
                "INSERT INTO steps
                 (id, item_id, step_number, title, instructions, tips,
                  measurements_json, helpful_links_json)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    step_id,
                    item_id,
                    step.step_number as i64,
                    step.title,
                    step.instructions,
                    step.tips,
                    to_json_list_column(&step.measurements)?,
                    to_json_list_column(&step.helpful_links)?,
                ],
            )
            .context("insert step")?;

            let mut image_stmt = tx.prepare_cached(
                "INSERT INTO step_images (id, step_id, image_url, sort_order)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (idx, image_url) in step.image_urls.iter().enumerate() {
                image_stmt.execute(params![new_id(), step_id, image_url, idx as i64])?;
            }

            let mut skill_stmt = tx.prepare_cached(
                "INSERT INTO step_skill_references
                 (id, step_id, skill_name, difficulty, description, search_query, sort_order)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for (idx, skill) in step.skill_references.iter().enumerate() {
                skill_stmt.execute(params![
                    new_id(),
                    step_id,
                    skill.skill_name,
                    skill.difficulty.as_str(),
                    skill.description,
                    skill.search_query,
                    idx as i64,
                ])?;
            }

            let mut warning_stmt = tx.prepare_cached(
                "INSERT INTO step_safety_warnings
                 (id, step_id, warning, severity, ppe_required_json, sort_order)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for (idx, warning) in step.safety_warnings.iter().enumerate() {
                warning_stmt.execute(params![
                    new_id(),
                    step_id,
                    warning.warning,
                    warning.severity.as_str(),
                    to_json_list_column(&warning.ppe_required)?,
                    idx as i64,
                ])?;
            }
        }

        tx.commit().context("commit aggregate")?;
        tracing::info!(item_id = %item_id, kind = %content.kind, "saved content item");
        Ok(item_id)
    }

    /// Reads the whole aggregate back, children ordered by their sort keys.
    /// Malformed `*_json` columns degrade to empty values instead of failing
    /// the read.
    pub fn load(&self, id: &str) -> anyhow::Result<Option<StoredItem>> {
        let conn = self.conn()?;

        let parent = conn
            .query_row(
                "SELECT kind, title, overview, image_url, author, author_url, difficulty,
                        prep_time, cook_time, total_time, servings, source_url, created_at
                 FROM content_items WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, Option<String>>(4)?,
                        row.get::<_, Option<String>>(5)?,
                        row.get::<_, Option<String>>(6)?,
                        row.get::<_, Option<String>>(7)?,
                        row.get::<_, Option<String>>(8)?,
                        row.get::<_, Option<String>>(9)?,
                        row.get::<_, Option<i64>>(10)?,
                        row.get::<_, Option<String>>(11)?,
                        row.get::<_, String>(12)?,
                    ))
                },
            )
            .optional()
            .context("read content item")?;

        let Some((
            kind,
            title,
            overview,
            image_url,
            author,
            author_url,
            difficulty,
            prep_time,
            cook_time,
            total_time,
            servings,
            source_url,
            created_at,
        )) = parent
        else {
            return Ok(None);
        };

        let kind = ContentKind::parse(&kind)
            .ok_or_else(|| anyhow::anyhow!("unknown content kind in storage: {kind}"))?;
        let created_at = parse_timestamp(&created_at)?;

        let mut content = ContentItem::empty(kind, title);
        content.overview = overview;
        content.image_url = image_url;
        content.author = author;
        content.author_url = author_url;
        content.difficulty = difficulty;
        content.prep_time = prep_time;
        content.cook_time = cook_time;
        content.total_time = total_time;
        content.servings = servings;
        content.source_url = source_url;

        content.glossary = conn
            .prepare(
                "SELECT term, definition, context FROM glossary
                 WHERE item_id = ?1 ORDER BY sort_order",
            )?
            .query_map(params![id], |row| {
                Ok(GlossaryTerm {
                    term: row.get(0)?,
                    definition: row.get(1)?,
                    context: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()
            .context("read glossary")?;

        content.materials = conn
            .prepare(
                "SELECT name, quantity, unit, notes, measurement_json FROM materials
                 WHERE item_id = ?1 ORDER BY sort_order",
            )?
            .query_map(params![id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()
            .context("read materials")?
            .into_iter()
            .map(|(name, quantity, unit, notes, measurement_json)| Material {
                name,
                quantity,
                unit,
                notes,
                measurement: parse_json_value::<MeasurementConversion>(measurement_json),
            })
            .collect();

        content.tools = conn
            .prepare(
                "SELECT name, notes, required FROM tools
                 WHERE item_id = ?1 ORDER BY sort_order",
            )?
            .query_map(params![id], |row| {
                Ok(Tool {
                    name: row.get(0)?,
                    notes: row.get(1)?,
                    required: row.get::<_, i64>(2)? != 0,
                })
            })?
            .collect::<Result<Vec<_>, _>>()
            .context("read tools")?;

        let step_rows = conn
            .prepare(
                "SELECT id, step_number, title, instructions, tips,
                        measurements_json, helpful_links_json
                 FROM steps WHERE item_id = ?1 ORDER BY step_number",
            )?
            .query_map(params![id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, Option<String>>(6)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()
            .context("read steps")?;

        let mut steps = Vec::with_capacity(step_rows.len());
        for (step_id, step_number, title, instructions, tips, measurements_json, links_json) in
            step_rows
        {
            let image_urls = conn
                .prepare(
                    "SELECT image_url FROM step_images
                     WHERE step_id = ?1 ORDER BY sort_order",
                )?
                .query_map(params![step_id], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()
                .context("read step images")?;

            let skill_references = conn
                .prepare(
                    "SELECT skill_name, difficulty, description, search_query
                     FROM step_skill_references WHERE step_id = ?1 ORDER BY sort_order",
                )?
                .query_map(params![step_id], |row| {
                    Ok(SkillReference {
                        skill_name: row.get(0)?,
                        difficulty: Difficulty::parse(&row.get::<_, String>(1)?)
                            .unwrap_or_default(),
                        description: row.get(2)?,
                        search_query: row.get(3)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()
                .context("read skill references")?;

            let safety_warnings = conn
                .prepare(
                    "SELECT warning, severity, ppe_required_json
                     FROM step_safety_warnings WHERE step_id = ?1 ORDER BY sort_order",
                )?
                .query_map(params![step_id], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()
                .context("read safety warnings")?
                .into_iter()
                .map(|(warning, severity, ppe_json)| SafetyWarning {
                    warning,
                    severity: Severity::parse(&severity).unwrap_or_default(),
                    ppe_required: parse_json_list(ppe_json),
                })
                .collect();

            steps.push(Step {
                step_number: step_number.max(0) as u32,
                title,
                instructions,
                tips,
                image_urls,
                measurements: parse_json_list(measurements_json),
                helpful_links: parse_json_list(links_json),
                skill_references,
                safety_warnings,
            });
        }
        content.steps = steps;

        Ok(Some(StoredItem {
            id: id.to_string(),
            created_at,
            content,
        }))
    }

    pub fn list(&self) -> anyhow::Result<Vec<ItemSummary>> {
        let conn = self.conn()?;
        let rows = conn
            .prepare(
                "SELECT id, kind, title, image_url, created_at
                 FROM content_items ORDER BY created_at DESC",
            )?
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()
            .context("list content items")?;

        rows.into_iter()
            .map(|(id, kind, title, image_url, created_at)| {
                Ok(ItemSummary {
                    id,
                    kind: ContentKind::parse(&kind)
                        .ok_or_else(|| anyhow::anyhow!("unknown content kind in storage: {kind}"))?,
                    title,
                    image_url,
                    created_at: parse_timestamp(&created_at)?,
                })
            })
            .collect()
    }

    /// Removes the aggregate and its whole tree. Step-level grandchildren go
    /// first (the cascade rules only cover direct children of the parent),
    /// then direct children, then the parent row. Returns false when the id
    /// was not present.
    pub fn delete(&self, id: &str) -> anyhow::Result<bool> {
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;

        for table in [
            "step_images",
            "step_skill_references",
            "step_safety_warnings",
        ] {
            tx.execute(
                &format!(
                    "DELETE FROM {table}
                     WHERE step_id IN (SELECT id FROM steps WHERE item_id = ?1)"
                ),
                params![id],
            )
            .with_context(|| format!("delete {table}"))?;
        }

        for table in ["glossary", "materials", "tools", "steps"] {
            tx.execute(&format!("DELETE FROM {table} WHERE item_id = ?1"), params![id])
                .with_context(|| format!("delete {table}"))?;
        }

        let removed = tx
            .execute("DELETE FROM content_items WHERE id = ?1", params![id])
            .context("delete content item")?
            > 0;

        tx.commit().context("commit delete")?;
        if removed {
            tracing::info!(item_id = %id, "deleted content item");
        }
        Ok(removed)
    }

    /// Snapshot-copies the aggregate's materials and required tools into the
    /// checklist. Returns the number of rows copied, or None when the
    /// aggregate does not exist. Copies are independent of the source: later
    /// deletion of the aggregate leaves them untouched.
    pub fn add_item_to_checklist(&self, id: &str) -> anyhow::Result<Option<usize>> {
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;

        let exists = tx
            .query_row(
                "SELECT COUNT(*) FROM content_items WHERE id = ?1",
                params![id],
                |row| row.get::<_, i64>(0),
            )
            .context("check content item")?
            > 0;
        if !exists {
            return Ok(None);
        }

        let created_at = format_timestamp(Utc::now());
        let mut copied = 0usize;

        let materials = tx
            .prepare(
                "SELECT name, quantity, unit, notes FROM materials
                 WHERE item_id = ?1 ORDER BY sort_order",
            )?
            .query_map(params![id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()
            .context("read materials for checklist")?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO checklist
                 (id, name, quantity, unit, notes, checked, item_type, item_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, 0, 'material', ?6, ?7)",
            )?;
            for (name, quantity, unit, notes) in materials {
                stmt.execute(params![new_id(), name, quantity, unit, notes, id, created_at])?;
                copied += 1;
            }
        }

        let tools = tx
            .prepare(
                "SELECT name, notes FROM tools
                 WHERE item_id = ?1 AND required = 1 ORDER BY sort_order",
            )?
            .query_map(params![id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()
            .context("read tools for checklist")?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO checklist
                 (id, name, quantity, unit, notes, checked, item_type, item_id, created_at)
                 VALUES (?1, ?2, NULL, NULL, ?3, 0, 'tool', ?4, ?5)",
            )?;
            for (name, notes) in tools {
                stmt.execute(params![new_id(), name, notes, id, created_at])?;
                copied += 1;
            }
        }

        tx.commit().context("commit checklist copy")?;
        tracing::info!(item_id = %id, copied, "copied aggregate to checklist");
        Ok(Some(copied))
    }

    pub fn checklist(&self) -> anyhow::Result<Vec<ChecklistItem>> {
        let conn = self.conn()?;
        let rows = conn
            .prepare(
                "SELECT id, name, quantity, unit, notes, checked, item_type, item_id, created_at
                 FROM checklist ORDER BY created_at DESC",
            )?
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, i64>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, Option<String>>(7)?,
                    row.get::<_, String>(8)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()
            .context("read checklist")?;

        rows.into_iter()
            .map(
                |(id, name, quantity, unit, notes, checked, item_type, item_id, created_at)| {
                    Ok(ChecklistItem {
                        id,
                        name,
                        quantity,
                        unit,
                        notes,
                        checked: checked != 0,
                        item_type: ChecklistItemType::parse(&item_type).ok_or_else(|| {
                            anyhow::anyhow!("unknown checklist item type in storage: {item_type}")
                        })?,
                        item_id,
                        created_at: parse_timestamp(&created_at)?,
                    })
                },
            )
            .collect()
    }

    pub fn toggle_checklist_item(&self, id: &str) -> anyhow::Result<bool> {
        let conn = self.conn()?;
        let changed = conn
            .execute(
                "UPDATE checklist SET checked = NOT checked WHERE id = ?1",
                params![id],
            )
            .context("toggle checklist item")?;
        Ok(changed > 0)
    }

    pub fn remove_checklist_item(&self, id: &str) -> anyhow::Result<bool> {
        let conn = self.conn()?;
        let removed = conn
            .execute("DELETE FROM checklist WHERE id = ?1", params![id])
            .context("remove checklist item")?;
        Ok(removed > 0)
    }

    pub fn clear_checklist(&self) -> anyhow::Result<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM checklist", [])
            .context("clear checklist")?;
        Ok(())
    }
}

fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS content_items (
            id          TEXT PRIMARY KEY,
            kind        TEXT NOT NULL CHECK(kind IN ('tutorial','recipe')),
            title       TEXT NOT NULL,
            overview    TEXT NOT NULL DEFAULT '',
            image_url   TEXT,
            author      TEXT,
            author_url  TEXT,
            difficulty  TEXT,
            prep_time   TEXT,
            cook_time   TEXT,
            total_time  TEXT,
            servings    INTEGER,
            source_url  TEXT,
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS glossary (
            id          TEXT PRIMARY KEY,
            item_id     TEXT NOT NULL REFERENCES content_items(id) ON DELETE CASCADE,
            term        TEXT NOT NULL,
            definition  TEXT NOT NULL,
            context     TEXT,
            sort_order  INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_glossary_item ON glossary(item_id);

        CREATE TABLE IF NOT EXISTS materials (
            id               TEXT PRIMARY KEY,
            item_id          TEXT NOT NULL REFERENCES content_items(id) ON DELETE CASCADE,
            name             TEXT NOT NULL,
            quantity         TEXT,
            unit             TEXT,
            notes            TEXT,
            measurement_json TEXT,
            sort_order       INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_materials_item ON materials(item_id);

        CREATE TABLE IF NOT EXISTS tools (
            id          TEXT PRIMARY KEY,
            item_id     TEXT NOT NULL REFERENCES content_items(id) ON DELETE CASCADE,
            name        TEXT NOT NULL,
            notes       TEXT,
            required    INTEGER NOT NULL DEFAULT 1,
            sort_order  INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_tools_item ON tools(item_id);

        CREATE TABLE IF NOT EXISTS steps (
            id                 TEXT PRIMARY KEY,
            item_id            TEXT NOT NULL REFERENCES content_items(id) ON DELETE CASCADE,
            step_number        INTEGER NOT NULL,
            title              TEXT NOT NULL,
            instructions       TEXT NOT NULL,
            tips               TEXT,
            measurements_json  TEXT,
            helpful_links_json TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_steps_item ON steps(item_id);

        CREATE TABLE IF NOT EXISTS step_images (
            id          TEXT PRIMARY KEY,
            step_id     TEXT NOT NULL REFERENCES steps(id),
            image_url   TEXT NOT NULL,
            sort_order  INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_step_images_step ON step_images(step_id);

        CREATE TABLE IF NOT EXISTS step_skill_references (
            id            TEXT PRIMARY KEY,
            step_id       TEXT NOT NULL REFERENCES steps(id),
            skill_name    TEXT NOT NULL,
            difficulty    TEXT NOT NULL CHECK(difficulty IN ('beginner','intermediate','advanced')),
            description   TEXT NOT NULL,
            search_query  TEXT NOT NULL,
            sort_order    INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_step_skills_step ON step_skill_references(step_id);

        CREATE TABLE IF NOT EXISTS step_safety_warnings (
            id                TEXT PRIMARY KEY,
            step_id           TEXT NOT NULL REFERENCES steps(id),
            warning           TEXT NOT NULL,
            severity          TEXT NOT NULL CHECK(severity IN ('caution','warning','danger')),
            ppe_required_json TEXT,
            sort_order        INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_step_warnings_step ON step_safety_warnings(step_id);

        CREATE TABLE IF NOT EXISTS checklist (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            quantity    TEXT,
            unit        TEXT,
            notes       TEXT,
            checked     INTEGER NOT NULL DEFAULT 0,
            item_type   TEXT NOT NULL CHECK(item_type IN ('material','tool')),
            item_id     TEXT,
            created_at  TEXT NOT NULL
        );
        ",
    )
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> anyhow::Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("parse stored timestamp: {raw}"))?;
    Ok(parsed.with_timezone(&Utc))
}

fn to_json_column<T: serde::Serialize>(value: &Option<T>) -> anyhow::Result<Option<String>> {
    value
        .as_ref()
        .map(|v| serde_json::to_string(v).context("serialize embedded document"))
        .transpose()
}

fn to_json_list_column<T: serde::Serialize>(values: &[T]) -> anyhow::Result<Option<String>> {
    if values.is_empty() {
        return Ok(None);
    }
    Ok(Some(
        serde_json::to_string(values).context("serialize embedded list")?,
    ))
}

fn parse_json_value<T: DeserializeOwned>(raw: Option<String>) -> Option<T> {
    let raw = raw?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::debug!(%err, "discarding malformed embedded document");
            None
        }
    }
}

fn parse_json_list<T: DeserializeOwned>(raw: Option<String>) -> Vec<T> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    match serde_json::from_str(&raw) {
        Ok(values) => values,
        Err(err) => {
            tracing::debug!(%err, "discarding malformed embedded list");
            Vec::new()
        }
    }
}
