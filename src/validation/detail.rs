//! Server error body parsing
//!
//! The backend reports failures as `{"detail": "..."}` or, for request
//! validation, `{"detail": [{"loc": ["body", "name"], "msg": "..."}]}`.

use serde_json::Value;

/// Render a server error body as one human-readable message.
///
/// Returns `None` when the body carries no `detail`.
pub fn parse_server_detail(body: &Value) -> Option<String> {
    match body.get("detail")? {
        Value::String(message) => Some(message.clone()),
        Value::Array(items) => {
            let rendered: Vec<String> = items.iter().filter_map(render_item).collect();
            if rendered.is_empty() {
                None
            } else {
                Some(rendered.join(", "))
            }
        }
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn render_item(item: &Value) -> Option<String> {
    let msg = match item.get("msg") {
        Some(Value::String(msg)) => msg.clone(),
        Some(other) => other.to_string(),
        None => return item.as_str().map(str::to_string),
    };

    let field = item
        .get("loc")
        .and_then(Value::as_array)
        .and_then(|loc| loc.last())
        .map(|last| match last {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });

    Some(match field {
        Some(field) => format!("{}: {}", field, msg),
        None => msg,
    })
}
