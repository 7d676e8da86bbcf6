use crate::devices::{self, DeviceRecord};
use crate::error::FetchError;
use serde_json::Value;

/// Last settled state of the sheet board.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SheetSnapshot {
    #[default]
    Loading,
    Loaded(SheetData),
    Failed(FetchError),
    /// No batch URL is configured or saved.
    Disabled,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SheetData {
    pub sheet: Option<String>,
    pub updated_at: Option<String>,
    /// Already in display order.
    pub records: Vec<DeviceRecord>,
}

/// Validates `{ok: true, data: [..]}` and returns the sorted records.
pub fn parse_batch(body: &Value) -> Result<SheetData, FetchError> {
    let ok = body.get("ok").and_then(Value::as_bool).unwrap_or(false);
    if !ok {
        return Err(FetchError::Shape("`ok` is not true".into()));
    }
    let Some(items) = body.get("data").and_then(Value::as_array) else {
        return Err(FetchError::Shape("`data` is not a list".into()));
    };
    let records = items.iter().map(DeviceRecord::from_value).collect();
    Ok(SheetData {
        sheet: text_field(body, "sheet"),
        updated_at: text_field(body, "updatedAt"),
        records: devices::sort_devices(records),
    })
}

fn text_field(body: &Value, key: &str) -> Option<String> {
    body.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .filter(|s| !s.is_empty())
}
