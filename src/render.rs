//! Pure view models. Nothing here touches the network or the board store.

use crate::config::PrinterEndpoint;
use crate::devices::{self, DeviceRecord};
use crate::error::FetchError;
use crate::printers::{PrinterState, PrinterStatus};
use crate::sheet::SheetSnapshot;
use crate::status::{Activity, DisplayMode};
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

pub const INVALID_SHAPE_MESSAGE: &str = "รูปแบบข้อมูลไม่ถูกต้อง";
pub const LOAD_FAILED_HINT: &str = "ตรวจสอบการ Deploy Apps Script และสิทธิ์ “Anyone”";
pub const LOADING_MESSAGE: &str = "กำลังโหลด...";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum BoardView {
    Loading {
        message: String,
    },
    Cards {
        updated_at: String,
        sheet: Option<String>,
        cards: Vec<SheetCard>,
    },
    Error {
        message: String,
        detail: Option<String>,
    },
    Disabled,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SheetCard {
    pub id: String,
    pub title: String,
    pub active: bool,
    pub label: String,
    pub col: Option<String>,
}

pub fn sheet_card(record: &DeviceRecord, mode: DisplayMode) -> SheetCard {
    SheetCard {
        id: record.id.clone(),
        title: devices::printer_label(&record.id),
        active: record.normalized_status() == Activity::Active,
        label: record.display_label(mode),
        col: record.col.clone(),
    }
}

pub fn board_view(snapshot: &SheetSnapshot, mode: DisplayMode) -> BoardView {
    match snapshot {
        SheetSnapshot::Loading => BoardView::Loading {
            message: LOADING_MESSAGE.to_string(),
        },
        SheetSnapshot::Loaded(data) => BoardView::Cards {
            updated_at: format_updated_at(data.updated_at.as_deref()),
            sheet: data.sheet.clone(),
            cards: data.records.iter().map(|r| sheet_card(r, mode)).collect(),
        },
        SheetSnapshot::Failed(FetchError::Shape(reason)) => BoardView::Error {
            message: INVALID_SHAPE_MESSAGE.to_string(),
            detail: Some(reason.clone()),
        },
        SheetSnapshot::Failed(FetchError::Transport(reason)) => BoardView::Error {
            message: format!("โหลดข้อมูลไม่ได้: {reason}"),
            detail: Some(LOAD_FAILED_HINT.to_string()),
        },
        SheetSnapshot::Disabled => BoardView::Disabled,
    }
}

/// RFC 3339 timestamps are shown in their own offset; anything else verbatim.
pub fn format_updated_at(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return "—".to_string();
    };
    let layout = format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second] [offset_hour sign:mandatory]:[offset_minute]"
    );
    OffsetDateTime::parse(raw, &Rfc3339)
        .ok()
        .and_then(|ts| ts.format(layout).ok())
        .unwrap_or_else(|| raw.to_string())
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PrinterCard {
    pub number: String,
    pub state: Option<PrinterState>,
    pub css: &'static str,
    pub chip: &'static str,
    pub message: &'static str,
    pub progress: u8,
    pub error: Option<String>,
}

pub fn printer_card(endpoint: &PrinterEndpoint, status: &PrinterStatus) -> PrinterCard {
    let state = status.state();
    let (css, chip, message) = match state {
        Some(PrinterState::InUse) => ("in-use", "🟢 กำลังใช้งาน", "สถานะ: กำลังพิมพ์"),
        Some(PrinterState::Idle) => ("idle", "🔴 ว่าง/ไม่ใช้งาน", "สถานะ: ว่าง · พร้อมเริ่มงาน"),
        Some(PrinterState::Offline) => ("offline", "⚠️ ไม่เชื่อมต่อ", "สถานะ: ไม่เชื่อมต่อ"),
        None => ("idle", "🔴 ว่าง/ไม่ใช้งาน", "รอสถานะ..."),
    };
    PrinterCard {
        number: endpoint.number.clone(),
        state,
        css,
        chip,
        message,
        progress: status.reading.map(|r| r.progress).unwrap_or(0),
        error: status.error.clone(),
    }
}

pub fn printer_cards(statuses: &[(PrinterEndpoint, PrinterStatus)]) -> Vec<PrinterCard> {
    statuses
        .iter()
        .map(|(endpoint, status)| printer_card(endpoint, status))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printers::Reading;
    use crate::sheet::SheetData;

    fn record(id: &str, status: &str) -> DeviceRecord {
        DeviceRecord {
            id: id.into(),
            raw_status: Some(status.into()),
            col: None,
        }
    }

    #[test]
    fn shape_failure_shows_fixed_message_without_cards() {
        let view = board_view(
            &SheetSnapshot::Failed(FetchError::Shape("`ok` is not true".into())),
            DisplayMode::Thai,
        );
        match view {
            BoardView::Error { message, .. } => assert_eq!(message, INVALID_SHAPE_MESSAGE),
            other => panic!("unexpected view {other:?}"),
        }
    }

    #[test]
    fn transport_failure_includes_reason() {
        let view = board_view(
            &SheetSnapshot::Failed(FetchError::Transport("HTTP 503".into())),
            DisplayMode::Thai,
        );
        match view {
            BoardView::Error { message, detail } => {
                assert!(message.contains("HTTP 503"));
                assert_eq!(detail.as_deref(), Some(LOAD_FAILED_HINT));
            }
            other => panic!("unexpected view {other:?}"),
        }
    }

    #[test]
    fn cards_follow_display_mode() {
        let snapshot = SheetSnapshot::Loaded(SheetData {
            sheet: None,
            updated_at: None,
            records: vec![record("Machine 1", "กำลังพิมพ์"), record("Machine 2", "idle")],
        });
        let BoardView::Cards { cards, updated_at, .. } = board_view(&snapshot, DisplayMode::Sheet) else {
            panic!("expected cards");
        };
        assert_eq!(updated_at, "—");
        assert_eq!(cards[0].title, "Printer 1");
        assert!(cards[0].active);
        assert_eq!(cards[0].label, "กำลังพิมพ์");
        assert!(!cards[1].active);
        assert_eq!(cards[1].label, "Inactive");

        let BoardView::Cards { cards, .. } = board_view(&snapshot, DisplayMode::Thai) else {
            panic!("expected cards");
        };
        assert_eq!(cards[0].label, "ใช้งาน");
        assert_eq!(cards[1].label, "ไม่ได้ใช้");
    }

    #[test]
    fn timestamps() {
        assert_eq!(
            format_updated_at(Some("2024-05-01T10:15:30+07:00")),
            "2024-05-01 10:15:30 +07:00"
        );
        assert_eq!(format_updated_at(Some("yesterday")), "yesterday");
        assert_eq!(format_updated_at(None), "—");
    }

    #[test]
    fn printer_cards_by_state() {
        let ep = PrinterEndpoint {
            number: "03".into(),
            url: "http://c/status".into(),
        };
        let pending = printer_card(&ep, &PrinterStatus::default());
        assert_eq!(pending.message, "รอสถานะ...");
        assert_eq!(pending.state, None);

        let busy = printer_card(
            &ep,
            &PrinterStatus::online(Reading {
                state: PrinterState::InUse,
                progress: 40,
            }),
        );
        assert_eq!(busy.css, "in-use");
        assert_eq!(busy.progress, 40);

        let down = printer_card(&ep, &PrinterStatus::offline("HTTP 500"));
        assert_eq!(down.css, "offline");
        assert_eq!(down.chip, "⚠️ ไม่เชื่อมต่อ");
        assert_eq!(down.error.as_deref(), Some("HTTP 500"));
    }
}
