//! Shapes the extraction service's best-effort JSON into the strict
//! [`ContentItem`] model. Every field gets a typed default when absent,
//! positional numbering falls back to the 1-based array position, and
//! nothing present in the payload is dropped. No I/O happens here.

use serde_json::Value;

use crate::content::{
    ContentItem, Difficulty, GlossaryTerm, HelpfulLink, LinkType, Material, MeasurementConversion,
    SafetyWarning, Severity, SkillReference, Step, Tool,
};
use crate::schema::ContentKind;

pub fn normalize(kind: ContentKind, raw: &Value) -> ContentItem {
    match kind {
        ContentKind::Tutorial => normalize_tutorial(raw),
        ContentKind::Recipe => normalize_recipe(raw),
    }
}

fn normalize_tutorial(raw: &Value) -> ContentItem {
    let mut item = ContentItem::empty(
        ContentKind::Tutorial,
        string_or(raw, &["title"], || "Untitled Tutorial".to_string()),
    );

    item.overview = string_or(raw, &["overview", "description"], String::new);
    item.image_url = opt_string(raw, &["image_url"]);
    item.author = opt_string(raw, &["author"]);
    item.author_url = opt_string(raw, &["author_url"]);
    item.difficulty = opt_string(raw, &["difficulty"]);
    item.total_time = opt_string(raw, &["estimated_time", "total_time"]);

    item.glossary = array_field(raw, &["glossary"])
        .iter()
        .enumerate()
        .map(|(idx, term)| glossary_term(idx, term))
        .collect();

    // Older schema generations flattened materials and tools into one list
    // under `materials_and_tools` with an `item` name key; both spellings
    // are accepted.
    item.materials = array_field(raw, &["materials", "materials_and_tools"])
        .iter()
        .enumerate()
        .map(|(idx, mat)| material(idx, mat, "Item"))
        .collect();

    item.tools = array_field(raw, &["tools"])
        .iter()
        .enumerate()
        .map(|(idx, tool)| Tool {
            name: string_or(tool, &["name", "item"], || format!("Tool {}", idx + 1)),
            notes: opt_string(tool, &["notes"]),
            required: bool_field(tool, "required").unwrap_or(true),
        })
        .collect();

    item.steps = array_field(raw, &["steps"])
        .iter()
        .enumerate()
        .map(|(idx, step)| normalize_step(idx, step, &["instructions", "text"]))
        .collect();

    item
}

fn normalize_recipe(raw: &Value) -> ContentItem {
    let mut item = ContentItem::empty(
        ContentKind::Recipe,
        string_or(raw, &["title"], || "Untitled Recipe".to_string()),
    );

    item.overview = string_or(raw, &["description", "overview"], String::new);
    item.image_url = opt_string(raw, &["image_url"]);
    item.author = opt_string(raw, &["author"]);
    item.author_url = opt_string(raw, &["author_url"]);
    item.prep_time = opt_string(raw, &["prep_time"]);
    item.cook_time = opt_string(raw, &["cook_time"]);
    item.total_time = opt_string(raw, &["total_time"]);
    item.servings = i64_field(raw, &["servings"]);

    item.materials = array_field(raw, &["ingredients"])
        .iter()
        .enumerate()
        .map(|(idx, ing)| material(idx, ing, "Ingredient"))
        .collect();

    item.steps = array_field(raw, &["instructions", "steps"])
        .iter()
        .enumerate()
        .map(|(idx, step)| normalize_step(idx, step, &["text", "instructions"]))
        .collect();

    item
}

fn glossary_term(idx: usize, raw: &Value) -> GlossaryTerm {
    GlossaryTerm {
        term: string_or(raw, &["term"], || format!("Term {}", idx + 1)),
        definition: string_or(raw, &["definition"], String::new),
        context: opt_string(raw, &["context"]),
    }
}

fn material(idx: usize, raw: &Value, placeholder: &str) -> Material {
    Material {
        name: string_or(raw, &["name", "item"], || {
            format!("{placeholder} {}", idx + 1)
        }),
        quantity: opt_string(raw, &["quantity"]),
        unit: opt_string(raw, &["unit"]),
        notes: opt_string(raw, &["notes"]),
        measurement: raw.get("measurement").and_then(measurement_conversion),
    }
}

fn normalize_step(idx: usize, raw: &Value, text_keys: &[&str]) -> Step {
    let position = (idx + 1) as u32;

    // Some payloads list an instruction as a bare string element.
    if let Value::String(text) = raw {
        let mut step = empty_step(position);
        step.instructions = text.clone();
        return step;
    }

    let mut step = empty_step(position);
    if let Some(number) = i64_field(raw, &["step_number", "step"]).filter(|n| *n > 0) {
        step.step_number = number as u32;
    }
    step.title = string_or(raw, &["title"], || format!("Step {position}"));
    step.instructions = string_or(raw, text_keys, String::new);
    step.tips = opt_string(raw, &["tips"]);
    step.image_urls = string_array(raw, "image_urls");

    step.measurements = array_field(raw, &["measurements"])
        .iter()
        .filter_map(measurement_conversion)
        .collect();

    step.helpful_links = array_field(raw, &["helpful_links"])
        .iter()
        .map(|link| HelpfulLink {
            title: string_or(link, &["title"], || "Helpful Resource".to_string()),
            url: string_or(link, &["url"], String::new),
            link_type: enum_field(link, "type", LinkType::parse),
        })
        .collect();

    step.skill_references = array_field(raw, &["skill_references"])
        .iter()
        .enumerate()
        .map(|(skill_idx, skill)| SkillReference {
            skill_name: string_or(skill, &["skill_name", "name"], || {
                format!("Skill {}", skill_idx + 1)
            }),
            difficulty: enum_field(skill, "difficulty", Difficulty::parse),
            description: string_or(skill, &["description"], String::new),
            search_query: string_or(skill, &["search_query"], String::new),
        })
        .collect();

    step.safety_warnings = array_field(raw, &["safety_warnings"])
        .iter()
        .map(|warning| SafetyWarning {
            warning: string_or(warning, &["warning", "text"], String::new),
            severity: enum_field(warning, "severity", Severity::parse),
            ppe_required: string_array(warning, "ppe_required"),
        })
        .collect();

    step
}

fn empty_step(position: u32) -> Step {
    Step {
        step_number: position,
        title: format!("Step {position}"),
        instructions: String::new(),
        tips: None,
        image_urls: Vec::new(),
        measurements: Vec::new(),
        helpful_links: Vec::new(),
        skill_references: Vec::new(),
        safety_warnings: Vec::new(),
    }
}

/// An absent or non-object value stays absent; a present object is mapped
/// field by field with empty-string defaults.
fn measurement_conversion(raw: &Value) -> Option<MeasurementConversion> {
    raw.as_object()?;
    Some(MeasurementConversion {
        original: string_or(raw, &["original"], String::new),
        metric: string_or(raw, &["metric"], String::new),
        imperial: string_or(raw, &["imperial"], String::new),
    })
}

fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn string_field(raw: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| raw.get(*key).and_then(coerce_string))
        .find(|s| !s.trim().is_empty())
}

fn string_or(raw: &Value, keys: &[&str], default: impl FnOnce() -> String) -> String {
    string_field(raw, keys).unwrap_or_else(default)
}

fn opt_string(raw: &Value, keys: &[&str]) -> Option<String> {
    string_field(raw, keys)
}

fn i64_field(raw: &Value, keys: &[&str]) -> Option<i64> {
    for key in keys {
        let Some(value) = raw.get(*key) else {
            continue;
        };
        match value {
            Value::Number(n) => {
                if let Some(n) = n.as_i64() {
                    return Some(n);
                }
            }
            Value::String(s) => {
                if let Ok(n) = s.trim().parse::<i64>() {
                    return Some(n);
                }
            }
            _ => {}
        }
    }
    None
}

fn bool_field(raw: &Value, key: &str) -> Option<bool> {
    raw.get(key).and_then(Value::as_bool)
}

fn enum_field<T: Default>(raw: &Value, key: &str, parse: impl Fn(&str) -> Option<T>) -> T {
    raw.get(key)
        .and_then(Value::as_str)
        .and_then(|s| parse(s))
        .unwrap_or_default()
}

fn array_field<'a>(raw: &'a Value, keys: &[&str]) -> &'a [Value] {
    keys.iter()
        .find_map(|key| raw.get(*key).and_then(Value::as_array))
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn string_array(raw: &Value, key: &str) -> Vec<String> {
    raw.get(key)
        .and_then(Value::as_array)
        .map(|values| values.iter().filter_map(coerce_string).collect())
        .unwrap_or_default()
}
