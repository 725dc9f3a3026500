//! Seeds the knowledge base from the category JSON files in the data directory.

use std::path::Path;

use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::models::{Document, KnowledgeError};

/// Seed files in load order, with the category given to items that carry none.
pub const SEED_SOURCES: [(&str, &str); 6] = [
    ("disease_symptoms.json", "diseases"),
    ("health_content.json", "health"),
    ("health_tips.json", "health_tips"),
    ("faqs.json", "faqs"),
    ("products.json", "products"),
    ("healthcare_data.json", "healthcare"),
];

const ITEM_KEYS: [&str; 5] = ["tips", "faqs", "products", "items", "data"];
const CONTENT_KEYS: [&str; 6] = ["content", "text", "description", "tip", "answer", "message"];
const MIN_CONTENT_CHARS: usize = 5;

pub fn seed_documents(data_dir: &Path) -> Vec<Document> {
    let mut documents = Vec::new();

    for (file_name, category) in SEED_SOURCES {
        let path = data_dir.join(file_name);
        if !path.exists() {
            continue;
        }

        match load_file(&path, category) {
            Ok(mut loaded) => {
                info!("Loaded {} documents from {}", loaded.len(), path.display());
                documents.append(&mut loaded);
            }
            Err(e) => warn!("Error loading {}: {}", path.display(), e),
        }
    }

    info!("Loaded {} healthcare documents", documents.len());
    documents
}

fn load_file(path: &Path, default_category: &str) -> Result<Vec<Document>, KnowledgeError> {
    let raw = std::fs::read_to_string(path)?;
    let data: Value = serde_json::from_str(&raw)?;
    Ok(documents_from_value(data, default_category))
}

/// Converts one seed file's JSON into documents with ids `{default_category}_{index}`.
pub fn documents_from_value(data: Value, default_category: &str) -> Vec<Document> {
    extract_items(data)
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| document_from_item(item, index, default_category))
        .collect()
}

fn extract_items(data: Value) -> Vec<Value> {
    match data {
        Value::Array(items) => items,
        Value::Object(map) => {
            let listed = ITEM_KEYS
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_array).cloned());

            match listed {
                Some(items) if !items.is_empty() => items,
                _ => flatten_values(map),
            }
        }
        _ => Vec::new(),
    }
}

fn flatten_values(map: Map<String, Value>) -> Vec<Value> {
    let mut items = Vec::new();
    for (_, value) in map {
        match value {
            Value::Array(mut list) => items.append(&mut list),
            object @ Value::Object(_) => items.push(object),
            _ => {}
        }
    }
    items
}

fn document_from_item(item: Value, index: usize, default_category: &str) -> Option<Document> {
    let id = format!("{}_{}", default_category, index);

    let document = match &item {
        Value::Object(fields) => {
            let content = CONTENT_KEYS
                .iter()
                .filter_map(|key| fields.get(*key))
                .find(|value| is_truthy(value))
                .map(display)
                .unwrap_or_else(|| composed_content(fields, &item));

            // A present key wins even when null, which renders as `None`.
            let category = fields
                .get("category")
                .or_else(|| fields.get("type"))
                .map(display)
                .unwrap_or_else(|| default_category.to_string());

            Document {
                id,
                content,
                category,
                url: string_field(fields, "url"),
                source: string_field(fields, "source"),
            }
        }
        Value::Null => return None,
        scalar => Document::new(id, display(scalar), default_category),
    };

    (document.content.trim().chars().count() > MIN_CONTENT_CHARS).then_some(document)
}

fn composed_content(fields: &Map<String, Value>, item: &Value) -> String {
    let mut parts = Vec::new();
    if let Some(question) = fields.get("question") {
        parts.push(format!("Q: {}", display(question)));
    }
    if let Some(answer) = fields.get("answer") {
        parts.push(format!("A: {}", display(answer)));
    }
    if let Some(name) = fields.get("name") {
        parts.push(format!("Name: {}", display(name)));
    }
    if let Some(description) = fields.get("description") {
        parts.push(display(description));
    }

    if parts.is_empty() {
        spaced_json(item)
    } else {
        parts.join("\n")
    }
}

fn string_field(fields: &Map<String, Value>, key: &str) -> String {
    fields
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Text form of a field value: strings verbatim, everything else in Python literal notation.
fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => literal(other),
    }
}

fn literal(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => quoted_literal(s),
        Value::Array(items) => format!("[{}]", items.iter().map(literal).collect::<Vec<_>>().join(", ")),
        Value::Object(fields) => format!(
            "{{{}}}",
            fields
                .iter()
                .map(|(key, value)| format!("{}: {}", quoted_literal(key), literal(value)))
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

fn quoted_literal(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// JSON with `, ` and `: ` separators and non-ASCII escaped as `\uXXXX`.
fn spaced_json(value: &Value) -> String {
    match value {
        Value::Array(items) => format!("[{}]", items.iter().map(spaced_json).collect::<Vec<_>>().join(", ")),
        Value::Object(fields) => format!(
            "{{{}}}",
            fields
                .iter()
                .map(|(key, value)| format!("{}: {}", ascii_json_string(key), spaced_json(value)))
                .collect::<Vec<_>>()
                .join(", ")
        ),
        Value::String(s) => ascii_json_string(s),
        scalar => scalar.to_string(),
    }
}

fn ascii_json_string(s: &str) -> String {
    let encoded = Value::String(s.to_string()).to_string();
    let mut out = String::with_capacity(encoded.len());
    for c in encoded.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    out
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn array_of_objects_uses_content_keys() {
        let docs = documents_from_value(
            json!([
                {"text": "Drink plenty of water daily", "category": "hydration", "url": "https://example.org/water"},
                {"tip": "Walk thirty minutes a day"},
                {"description": "tiny"}
            ]),
            "health_tips",
        );

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].id, "health_tips_0");
        assert_eq!(docs[0].category, "hydration");
        assert_eq!(docs[0].url, "https://example.org/water");
        assert_eq!(docs[1].id, "health_tips_1");
        assert_eq!(docs[1].category, "health_tips");
    }

    #[test]
    fn object_with_listed_key() {
        let docs = documents_from_value(
            json!({"faqs": [{"question": "What is a fever?", "type": "faq"}], "other": [1, 2]}),
            "faqs",
        );

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content, "Q: What is a fever?");
        assert_eq!(docs[0].category, "faq");
    }

    #[test]
    fn composes_question_answer_name() {
        let docs = documents_from_value(
            json!([{"question": "Is rest important?", "answer": "", "name": "Rest"}]),
            "faqs",
        );
        assert_eq!(docs[0].content, "Q: Is rest important?\nA: \nName: Rest");
    }

    #[test]
    fn flattens_object_values_in_order() {
        let docs = documents_from_value(
            json!({
                "fever": {"content": "Fever is a raised body temperature"},
                "group": [{"content": "Migraine is a severe headache"}, "Plain string item"],
                "count": 3
            }),
            "health",
        );

        let ids: Vec<_> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["health_0", "health_1", "health_2"]);
        assert_eq!(docs[0].content, "Fever is a raised body temperature");
        assert_eq!(docs[2].content, "Plain string item");
    }

    #[test]
    fn empty_listed_key_falls_back_to_flattening() {
        let docs = documents_from_value(
            json!({"tips": [], "extra": [{"content": "Wash hands before meals"}]}),
            "health_tips",
        );
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content, "Wash hands before meals");
    }

    #[test]
    fn non_string_values_render_like_python_literals() {
        let docs = documents_from_value(
            json!([
                {"content": true, "category": null},
                {"question": "Covered?", "answer": false, "name": {"plan": "basic", "tier": 2}},
                {"rating": 4.5, "tags": ["a", "b"], "label": "caf\u{e9}"},
                [1, null, "x"]
            ]),
            "products",
        );

        // `True` is only four characters, so the first item is dropped.
        let ids: Vec<_> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["products_1", "products_2", "products_3"]);
        assert_eq!(docs[0].content, "Q: Covered?\nA: False\nName: {'plan': 'basic', 'tier': 2}");
        assert_eq!(docs[1].content, r#"{"rating": 4.5, "tags": ["a", "b"], "label": "caf\u00e9"}"#);
        assert_eq!(docs[2].content, "[1, None, 'x']");
    }

    #[test]
    fn present_category_wins_even_when_null() {
        let docs = documents_from_value(
            json!([
                {"content": "Null category keeps the key", "category": null, "type": "ignored"},
                {"content": "Type fills in for category", "type": "guide"}
            ]),
            "health",
        );
        assert_eq!(docs[0].category, "None");
        assert_eq!(docs[1].category, "guide");
    }

    #[test]
    fn skips_short_content_but_keeps_index() {
        let docs = documents_from_value(json!(["short", "long enough text"]), "faqs");
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "faqs_1");
    }

    #[test]
    fn seeds_from_directory_in_order_and_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("faqs.json"),
            r#"[{"question": "How much water should I drink?", "answer": "About two litres."}]"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("disease_symptoms.json"),
            r#"[{"content": "Diabetes: increased thirst, frequent urination"}]"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("products.json"), "{not json").unwrap();

        let docs = seed_documents(dir.path());
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].id, "diseases_0");
        assert_eq!(docs[1].category, "faqs");
    }
}
