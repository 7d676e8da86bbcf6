use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrinterState {
    InUse,
    Idle,
    Offline,
}

impl PrinterState {
    /// Target of a toggle: in-use goes idle, anything else goes in-use.
    pub fn toggled(self) -> Self {
        match self {
            PrinterState::InUse => PrinterState::Idle,
            PrinterState::Idle | PrinterState::Offline => PrinterState::InUse,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Reading {
    pub state: PrinterState,
    pub progress: u8,
}

impl Reading {
    pub fn offline() -> Self {
        Self {
            state: PrinterState::Offline,
            progress: 0,
        }
    }

    /// What the card shows right after a command is issued.
    pub fn predicted(state: PrinterState) -> Self {
        Self {
            state,
            progress: if state == PrinterState::InUse { 1 } else { 0 },
        }
    }

    /// Reads `{status, progress}` from a device. Unknown status text counts
    /// as idle; a missing or unusable progress defaults by state.
    pub fn from_payload(payload: &Value) -> Self {
        let state = match payload.get("status").and_then(Value::as_str) {
            Some("in-use") => PrinterState::InUse,
            _ => PrinterState::Idle,
        };
        let progress = payload
            .get("progress")
            .and_then(progress_value)
            .unwrap_or(if state == PrinterState::InUse { 50.0 } else { 0.0 });
        Self {
            state,
            progress: progress.clamp(0.0, 100.0).round() as u8,
        }
    }
}

fn progress_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

/// Current card content for one printer. `reading` is `None` until the first
/// fetch settles.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PrinterStatus {
    pub reading: Option<Reading>,
    pub error: Option<String>,
}

impl PrinterStatus {
    pub fn online(reading: Reading) -> Self {
        Self {
            reading: Some(reading),
            error: None,
        }
    }

    pub fn offline(reason: impl Into<String>) -> Self {
        Self {
            reading: Some(Reading::offline()),
            error: Some(reason.into()),
        }
    }

    pub fn state(&self) -> Option<PrinterState> {
        self.reading.map(|r| r.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_device_payload() {
        let r = Reading::from_payload(&json!({"status": "in-use", "progress": 73}));
        assert_eq!(r, Reading { state: PrinterState::InUse, progress: 73 });
        let r = Reading::from_payload(&json!({"status": "idle"}));
        assert_eq!(r, Reading { state: PrinterState::Idle, progress: 0 });
    }

    #[test]
    fn progress_defaults_and_clamps() {
        assert_eq!(Reading::from_payload(&json!({"status": "in-use"})).progress, 50);
        assert_eq!(Reading::from_payload(&json!({"status": "in-use", "progress": 250})).progress, 100);
        assert_eq!(Reading::from_payload(&json!({"status": "idle", "progress": -4})).progress, 0);
        assert_eq!(Reading::from_payload(&json!({"status": "in-use", "progress": "12"})).progress, 12);
        assert_eq!(Reading::from_payload(&json!({"status": "in-use", "progress": "n/a"})).progress, 50);
    }

    #[test]
    fn unknown_status_reads_as_idle() {
        assert_eq!(Reading::from_payload(&json!({"status": "warming"})).state, PrinterState::Idle);
        assert_eq!(Reading::from_payload(&json!([])).state, PrinterState::Idle);
    }

    #[test]
    fn toggle_targets() {
        assert_eq!(PrinterState::InUse.toggled(), PrinterState::Idle);
        assert_eq!(PrinterState::Idle.toggled(), PrinterState::InUse);
        assert_eq!(PrinterState::Offline.toggled(), PrinterState::InUse);
    }

    #[test]
    fn predicted_progress() {
        assert_eq!(Reading::predicted(PrinterState::InUse).progress, 1);
        assert_eq!(Reading::predicted(PrinterState::Idle).progress, 0);
    }
}
