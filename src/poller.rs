use crate::board::BoardStore;
use crate::error::FetchError;
use crate::prefs::Preferences;
use crate::printers::{PrinterStatus, Reading};
use crate::render::{self, BoardView, PrinterCard};
use crate::sheet::{self, SheetSnapshot};
use crate::transport::StatusTransport;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

pub async fn fetch_reading(transport: &dyn StatusTransport, url: &str) -> Result<Reading, FetchError> {
    let payload = transport.get_json(url).await?;
    Ok(Reading::from_payload(&payload))
}

/// Polls the batch endpoint and publishes a sorted snapshot.
pub struct SheetPoller {
    store: Arc<BoardStore>,
    transport: Arc<dyn StatusTransport>,
    prefs: Preferences,
    default_url: Option<String>,
}

impl SheetPoller {
    pub fn new(
        store: Arc<BoardStore>,
        transport: Arc<dyn StatusTransport>,
        prefs: Preferences,
        default_url: Option<String>,
    ) -> Self {
        Self {
            store,
            transport,
            prefs,
            default_url,
        }
    }

    /// The saved override wins over the configured URL.
    pub fn source_url(&self) -> Option<String> {
        self.prefs.api_url().or_else(|| self.default_url.clone())
    }

    /// With no URL from either source the board is disabled and nothing is
    /// fetched. The disabled snapshot is published once per transition.
    pub async fn poll(&self) -> BoardView {
        let ticket = self.store.issue();
        let snapshot = match self.source_url() {
            Some(url) => match self.fetch(&url).await {
                Ok(data) => {
                    tracing::debug!("Sheet poll returned {} records", data.records.len());
                    SheetSnapshot::Loaded(data)
                }
                Err(err) => {
                    tracing::warn!("Sheet poll failed: {err}");
                    SheetSnapshot::Failed(err)
                }
            },
            None => SheetSnapshot::Disabled,
        };
        let already_disabled =
            snapshot == SheetSnapshot::Disabled && self.store.sheet().await == SheetSnapshot::Disabled;
        if !already_disabled && !self.store.publish_sheet(ticket, snapshot).await {
            tracing::debug!("Discarding stale sheet result");
        }
        render::board_view(&self.store.sheet().await, self.prefs.display_mode())
    }

    async fn fetch(&self, url: &str) -> Result<sheet::SheetData, FetchError> {
        let body = self.transport.get_json(url).await?;
        sheet::parse_batch(&body)
    }
}

/// Polls every printer in declaration order, one at a time.
pub struct PrinterPoller {
    store: Arc<BoardStore>,
    transport: Arc<dyn StatusTransport>,
}

impl PrinterPoller {
    pub fn new(store: Arc<BoardStore>, transport: Arc<dyn StatusTransport>) -> Self {
        Self { store, transport }
    }

    pub async fn poll(&self) -> Vec<PrinterCard> {
        for index in 0..self.store.endpoints().len() {
            self.refresh_one(index).await;
        }
        render::printer_cards(&self.store.printer_statuses().await)
    }

    /// Fetches one printer. A failure marks only that printer offline.
    pub async fn refresh_one(&self, index: usize) -> PrinterStatus {
        let Some(endpoint) = self.store.endpoints().get(index) else {
            return PrinterStatus::default();
        };
        let ticket = self.store.issue();
        let status = match fetch_reading(self.transport.as_ref(), &endpoint.url).await {
            Ok(reading) => PrinterStatus::online(reading),
            Err(err) => {
                tracing::debug!("Printer {} unreachable: {err}", endpoint.number);
                PrinterStatus::offline(err.to_string())
            }
        };
        if !self.store.publish_printer(index, ticket, status.clone()).await {
            tracing::debug!("Discarding stale result for printer {}", endpoint.number);
        }
        status
    }
}

/// Runs `poll` right away and then on every tick. A slow cycle delays the next
/// tick instead of overlapping it.
pub fn spawn_sheet_loop(poller: Arc<SheetPoller>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            poller.poll().await;
        }
    })
}

pub fn spawn_printer_loop(poller: Arc<PrinterPoller>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            poller.poll().await;
        }
    })
}


#[cfg(test)]
mod tests {
    use super::testing::FakeTransport;
    use super::*;
    use crate::config::PrinterEndpoint;
    use crate::prefs::MemoryStore;
    use crate::printers::PrinterState;
    use crate::render::INVALID_SHAPE_MESSAGE;
    use crate::status::DisplayMode;
    use serde_json::json;

    fn endpoints() -> Vec<PrinterEndpoint> {
        ["01", "02", "03"]
            .iter()
            .map(|n| PrinterEndpoint {
                number: n.to_string(),
                url: format!("http://printer-{n}/status"),
            })
            .collect()
    }

    fn prefs() -> Preferences {
        Preferences::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn one_failing_printer_does_not_block_the_rest() {
        let transport = Arc::new(FakeTransport::default());
        transport.on_get("http://printer-01/status", vec![Ok(json!({"status": "in-use", "progress": 30}))]);
        transport.on_get("http://printer-02/status", vec![Err(FetchError::Transport("connection refused".into()))]);
        transport.on_get("http://printer-03/status", vec![Ok(json!({"status": "idle"}))]);
        let store = Arc::new(BoardStore::new(endpoints()));
        let poller = PrinterPoller::new(Arc::clone(&store), transport);

        let cards = poller.poll().await;
        assert_eq!(cards.len(), 3);
        assert_eq!(cards[0].state, Some(PrinterState::InUse));
        assert_eq!(cards[0].progress, 30);
        assert_eq!(cards[1].state, Some(PrinterState::Offline));
        assert_eq!(cards[1].error.as_deref(), Some("connection refused"));
        assert_eq!(cards[2].state, Some(PrinterState::Idle));
    }

    #[tokio::test]
    async fn ok_false_renders_shape_message() {
        let transport = Arc::new(FakeTransport::default());
        transport.on_get("http://sheet/exec", vec![Ok(json!({"ok": false}))]);
        let store = Arc::new(BoardStore::new(Vec::new()));
        let poller = SheetPoller::new(
            Arc::clone(&store),
            transport,
            prefs(),
            Some("http://sheet/exec".into()),
        );
        match poller.poll().await {
            BoardView::Error { message, .. } => assert_eq!(message, INVALID_SHAPE_MESSAGE),
            other => panic!("unexpected view {other:?}"),
        }
        assert!(matches!(store.sheet().await, SheetSnapshot::Failed(FetchError::Shape(_))));
    }

    #[tokio::test]
    async fn failed_cycle_does_not_poison_the_next() {
        let transport = Arc::new(FakeTransport::default());
        transport.on_get(
            "http://sheet/exec",
            vec![
                Err(FetchError::Transport("HTTP 500".into())),
                Ok(json!({"ok": true, "data": [{"id": "10", "status": "busy"}, {"id": "2", "status": "idle"}]})),
            ],
        );
        let store = Arc::new(BoardStore::new(Vec::new()));
        let poller = SheetPoller::new(store, transport, prefs(), Some("http://sheet/exec".into()));

        assert!(matches!(poller.poll().await, BoardView::Error { .. }));
        let BoardView::Cards { cards, .. } = poller.poll().await else {
            panic!("expected cards on the second cycle");
        };
        let ids: Vec<_> = cards.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "10"]);
    }

    #[tokio::test]
    async fn api_url_preference_overrides_config() {
        let transport = Arc::new(FakeTransport::default());
        transport.on_get("http://override/exec", vec![Ok(json!({"ok": true, "data": []}))]);
        let prefs = prefs();
        prefs.set_api_url("http://override/exec").unwrap();
        let poller = SheetPoller::new(
            Arc::new(BoardStore::new(Vec::new())),
            transport,
            prefs,
            Some("http://configured/exec".into()),
        );
        assert_eq!(poller.source_url().as_deref(), Some("http://override/exec"));
        assert!(matches!(poller.poll().await, BoardView::Cards { .. }));
    }

    #[tokio::test]
    async fn missing_url_disables_the_board_without_fetching() {
        let transport = Arc::new(FakeTransport::default());
        let store = Arc::new(BoardStore::new(Vec::new()));
        let poller = SheetPoller::new(Arc::clone(&store), transport, prefs(), None);
        let mut rx = store.subscribe();

        assert_eq!(poller.poll().await, BoardView::Disabled);
        assert_eq!(store.sheet().await, SheetSnapshot::Disabled);
        assert!(rx.try_recv().is_ok());

        // Staying disabled does not publish again.
        assert_eq!(poller.poll().await, BoardView::Disabled);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn saving_a_url_enables_a_disabled_board() {
        let transport = Arc::new(FakeTransport::default());
        transport.on_get("http://saved/exec", vec![Ok(json!({"ok": true, "data": []}))]);
        let prefs = prefs();
        let poller = SheetPoller::new(
            Arc::new(BoardStore::new(Vec::new())),
            transport,
            prefs.clone(),
            None,
        );
        assert_eq!(poller.poll().await, BoardView::Disabled);
        prefs.set_api_url("http://saved/exec").unwrap();
        assert!(matches!(poller.poll().await, BoardView::Cards { .. }));
    }

    /// Publishes a newer sheet result while its own answer is still in flight.
    struct OvertakenTransport {
        store: Arc<BoardStore>,
        newer: SheetSnapshot,
    }

    #[async_trait::async_trait]
    impl StatusTransport for OvertakenTransport {
        async fn get_json(&self, _url: &str) -> Result<serde_json::Value, FetchError> {
            let ticket = self.store.issue();
            self.store.publish_sheet(ticket, self.newer.clone()).await;
            Ok(json!({"ok": true, "data": [{"id": "1", "status": "idle"}]}))
        }

        async fn post_status(&self, _url: &str, _status: PrinterState) -> Result<(), FetchError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn stale_result_returns_what_the_board_shows() {
        let store = Arc::new(BoardStore::new(Vec::new()));
        let newer = SheetSnapshot::Failed(FetchError::Transport("HTTP 503".into()));
        let transport = Arc::new(OvertakenTransport {
            store: Arc::clone(&store),
            newer: newer.clone(),
        });
        let poller = SheetPoller::new(
            Arc::clone(&store),
            transport,
            prefs(),
            Some("http://sheet/exec".into()),
        );

        let view = poller.poll().await;
        assert_eq!(store.sheet().await, newer);
        assert_eq!(view, render::board_view(&newer, DisplayMode::Thai));
        assert!(matches!(view, BoardView::Error { .. }));
    }
}
