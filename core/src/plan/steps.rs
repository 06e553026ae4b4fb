use serde_json::{Map, Value};

use crate::event::ToolCall;
use crate::task::TaskDescriptor;

const VALUE_MAX_CHARS: usize = 60;
const ARGS_KEYS_MAX: usize = 4;
const TASK_MAX_CHARS: usize = 120;

/// Coarse tool families, recognised by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolCategory {
    Inventory,
    Discount,
    Shipping,
    Payment,
    Notification,
    Other,
}

impl ToolCategory {
    pub fn classify(tool_name: &str) -> Self {
        let n = tool_name.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| n.contains(w));
        if has(&["inventory", "stock"]) {
            Self::Inventory
        } else if has(&["discount", "coupon", "promo"]) {
            Self::Discount
        } else if has(&["shipping", "shipment", "delivery"]) {
            Self::Shipping
        } else if has(&["payment", "charge", "checkout"]) {
            Self::Payment
        } else if has(&["email", "notify", "notification", "confirmation"]) {
            Self::Notification
        } else {
            Self::Other
        }
    }
}

/// Builds one plan step for a tool call: `"<tool>: key=value, ..."`.
///
/// Each detail comes from the call's own arguments when present, and from the
/// task otherwise.
pub fn describe_call(call: &ToolCall, task: &TaskDescriptor) -> String {
    let args = call.args.as_object();
    let pick = |keys: &[&str]| args.and_then(|o| first_arg(o, keys));
    let mut details: Vec<(&str, String)> = Vec::new();
    let mut push = |label: &'static str, value: Option<String>| {
        if let Some(v) = value {
            details.push((label, v));
        }
    };

    match ToolCategory::classify(&call.name) {
        ToolCategory::Inventory => {
            push(
                "product",
                pick(&["product_id", "product", "sku"]).or_else(|| task.product.clone()),
            );
            push(
                "quantity",
                pick(&["quantity", "qty"]).or_else(|| task.quantity.map(|q| q.to_string())),
            );
        }
        ToolCategory::Discount => {
            push(
                "code",
                pick(&["discount_code", "code", "coupon"]).or_else(|| task.discount_code.clone()),
            );
            push("total", pick(&["total_price", "total", "amount"]));
        }
        ToolCategory::Shipping => {
            push(
                "destination",
                pick(&["destination_city", "destination", "city", "address"])
                    .or_else(|| task.destination.clone()),
            );
            push("weight_kg", pick(&["total_weight_kg", "weight_kg", "weight"]));
        }
        ToolCategory::Payment => {
            push(
                "method",
                pick(&["payment_method", "method"]).or_else(|| task.payment_method.clone()),
            );
            push("amount", pick(&["amount", "total", "total_price"]));
        }
        ToolCategory::Notification => {
            push(
                "to",
                pick(&["customer_email", "email", "to", "recipient"])
                    .or_else(|| task.email.clone()),
            );
        }
        ToolCategory::Other => {}
    }

    if details.is_empty() {
        if let Some(summary) = args.map(summarize_scalar_args).filter(|s| !s.is_empty()) {
            return format!("{}: {}", call.name, summary);
        }
        return format!(
            "{}: for request \"{}\"",
            call.name,
            shorten(&task.text, TASK_MAX_CHARS)
        );
    }

    let body = details
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{}: {}", call.name, body)
}

/// The single step used when the run made no tool calls.
pub fn describe_task(task: &TaskDescriptor) -> String {
    let text = task.text.trim();
    if text.is_empty() {
        return "Respond to the (empty) request directly".to_string();
    }
    format!("Fulfil the request directly: {}", shorten(text, TASK_MAX_CHARS))
}

fn first_arg(args: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| args.get(*k))
        .find(|v| !v.is_null())
        .map(|v| shorten_value(v, VALUE_MAX_CHARS))
        .filter(|s| !s.is_empty())
}

fn summarize_scalar_args(args: &Map<String, Value>) -> String {
    args.iter()
        .filter(|(_, v)| !(v.is_object() || v.is_array() || v.is_null()))
        .take(ARGS_KEYS_MAX)
        .map(|(k, v)| format!("{}={}", k, shorten_value(v, VALUE_MAX_CHARS)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn shorten_value(v: &Value, max_chars: usize) -> String {
    match v {
        Value::String(x) => shorten(x, max_chars),
        _ => shorten(&v.to_string(), max_chars),
    }
}

fn shorten(s: &str, max_chars: usize) -> String {
    let t = s.trim().replace('\n', " ");
    let max_chars = max_chars.max(1);
    if t.chars().count() <= max_chars {
        t
    } else {
        let take_chars = max_chars.saturating_sub(1).max(1);
        t.chars().take(take_chars).collect::<String>() + "…"
    }
}
