use crate::board::BoardStore;
use crate::error::CommandError;
use crate::poller::fetch_reading;
use crate::printers::{PrinterState, PrinterStatus, Reading};
use crate::transport::StatusTransport;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommandAction {
    Toggle,
    InUse,
    Idle,
}

impl CommandAction {
    pub fn target(self, current: Option<PrinterState>) -> PrinterState {
        match self {
            CommandAction::Toggle => current.map_or(PrinterState::InUse, PrinterState::toggled),
            CommandAction::InUse => PrinterState::InUse,
            CommandAction::Idle => PrinterState::Idle,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandOutcome {
    /// What the board shows once the command settles.
    pub status: PrinterStatus,
    pub error: Option<CommandError>,
}

/// Shows the predicted state first, then sends the command and replaces the
/// prediction with whatever the device reports afterwards.
pub struct CommandHandler {
    store: Arc<BoardStore>,
    transport: Arc<dyn StatusTransport>,
}

impl CommandHandler {
    pub fn new(store: Arc<BoardStore>, transport: Arc<dyn StatusTransport>) -> Self {
        Self { store, transport }
    }

    pub async fn execute(&self, index: usize, action: CommandAction) -> Option<CommandOutcome> {
        let endpoint = self.store.endpoints().get(index)?.clone();
        let current = self.store.printer_status(index).await.state();
        let next = action.target(current);

        tracing::info!("Printer {} -> {next:?}", endpoint.number);
        let predicted = PrinterStatus::online(Reading::predicted(next));
        self.store
            .publish_printer(index, self.store.issue(), predicted)
            .await;

        let sent = self.transport.post_status(&endpoint.url, next).await;
        let ticket = self.store.issue();
        let reconciled = fetch_reading(self.transport.as_ref(), &endpoint.url).await;

        let (status, error) = match (sent, reconciled) {
            (Ok(()), Ok(reading)) => (PrinterStatus::online(reading), None),
            (Err(err), Ok(reading)) => {
                tracing::warn!("Command to printer {} failed: {err}", endpoint.number);
                (
                    PrinterStatus::online(reading),
                    Some(CommandError::Rejected(err.to_string())),
                )
            }
            (_, Err(err)) => {
                tracing::warn!("Printer {} unreachable after command: {err}", endpoint.number);
                (
                    PrinterStatus::offline(err.to_string()),
                    Some(CommandError::Unreachable(err.to_string())),
                )
            }
        };
        if !self.store.publish_printer(index, ticket, status).await {
            tracing::debug!("A newer request already settled printer {}", endpoint.number);
        }
        Some(CommandOutcome {
            status: self.store.printer_status(index).await,
            error,
        })
    }
}
