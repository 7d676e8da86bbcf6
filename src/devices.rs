use crate::status::{self, Activity, DisplayMode};
use serde_json::Value;
use std::cmp::Ordering;

/// One printer row from the sheet payload, rebuilt from scratch on every poll.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceRecord {
    pub id: String,
    pub raw_status: Option<String>,
    pub col: Option<String>,
}

impl DeviceRecord {
    pub fn from_value(item: &Value) -> Self {
        let id = item
            .get("id")
            .and_then(value_text)
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| "-".to_string());
        Self {
            id,
            raw_status: item.get("status").and_then(value_text),
            col: item.get("col").and_then(value_text),
        }
    }

    pub fn normalized_status(&self) -> Activity {
        status::normalize(self.raw_status.as_deref())
    }

    pub fn numeric_order(&self) -> Option<u64> {
        extract_numeric_id(&self.id)
    }

    pub fn display_label(&self, mode: DisplayMode) -> String {
        status::display_label(self.raw_status.as_deref(), mode)
    }
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

/// First run of ASCII digits in `raw`. Runs too long for `u64` saturate.
pub fn extract_numeric_id(raw: &str) -> Option<u64> {
    let start = raw.find(|c: char| c.is_ascii_digit())?;
    let run = &raw[start..];
    let end = run
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(run.len());
    let value = run[..end]
        .bytes()
        .try_fold(0u64, |acc, digit| {
            acc.checked_mul(10)?.checked_add(u64::from(digit - b'0'))
        })
        .unwrap_or(u64::MAX);
    Some(value)
}

/// Ids with a digit run come first, ascending by number; the rest follow in
/// lexical order. Equal numbers fall back to the lexical order of the raw id.
pub fn compare_ids(a: &str, b: &str) -> Ordering {
    match (extract_numeric_id(a), extract_numeric_id(b)) {
        (Some(na), Some(nb)) => na.cmp(&nb).then_with(|| lexical(a, b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => lexical(a, b),
    }
}

/// Case-folded text first; on a case-only difference lowercase sorts first.
fn lexical(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

pub fn sort_devices(mut list: Vec<DeviceRecord>) -> Vec<DeviceRecord> {
    let all_digits = list
        .iter()
        .all(|rec| !rec.id.is_empty() && rec.id.bytes().all(|b| b.is_ascii_digit()));
    if all_digits {
        list.sort_by_cached_key(|rec| (rec.numeric_order().unwrap_or(u64::MAX), rec.id.clone()));
    } else {
        list.sort_by(|a, b| compare_ids(&a.id, &b.id));
    }
    list
}

pub fn printer_label(raw_id: &str) -> String {
    if let Some(n) = extract_numeric_id(raw_id) {
        return format!("Printer {n}");
    }
    let cleaned = strip_word_ignore_case(raw_id, "machine");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        "Printer -".to_string()
    } else {
        format!("Printer {cleaned}")
    }
}

fn strip_word_ignore_case(input: &str, word: &str) -> String {
    let lowered = input.to_ascii_lowercase();
    let mut out = String::with_capacity(input.len());
    let mut cursor = 0;
    while let Some(pos) = lowered[cursor..].find(word) {
        out.push_str(&input[cursor..cursor + pos]);
        cursor += pos + word.len();
    }
    out.push_str(&input[cursor..]);
    out
}
