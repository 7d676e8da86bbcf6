//! Shared render surface: the latest sheet snapshot and one status per
//! printer, each guarded by a request ticket so that late responses from
//! older requests never overwrite newer ones.

use crate::config::PrinterEndpoint;
use crate::printers::PrinterStatus;
use crate::sheet::SheetSnapshot;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{RwLock, broadcast};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BoardKind {
    Sheet,
    Printers,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BoardUpdate {
    pub board: BoardKind,
}

/// Issued when a request starts. Later tickets compare greater.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

#[derive(Debug, Default)]
pub struct Sequencer {
    last: AtomicU64,
}

impl Sequencer {
    pub fn issue(&self) -> Ticket {
        Ticket(self.last.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

#[derive(Debug, Default)]
struct Slot<T> {
    applied: Option<Ticket>,
    value: T,
}

impl<T> Slot<T> {
    fn publish(&mut self, ticket: Ticket, value: T) -> bool {
        if self.applied.is_some_and(|applied| applied >= ticket) {
            return false;
        }
        self.applied = Some(ticket);
        self.value = value;
        true
    }
}

pub struct BoardStore {
    sequencer: Sequencer,
    sheet: RwLock<Slot<SheetSnapshot>>,
    endpoints: Vec<PrinterEndpoint>,
    printers: RwLock<Vec<Slot<PrinterStatus>>>,
    updates: broadcast::Sender<BoardUpdate>,
}

impl BoardStore {
    pub fn new(endpoints: Vec<PrinterEndpoint>) -> Self {
        let printers = endpoints.iter().map(|_| Slot::default()).collect();
        let (updates, _) = broadcast::channel(64);
        Self {
            sequencer: Sequencer::default(),
            sheet: RwLock::new(Slot::default()),
            endpoints,
            printers: RwLock::new(printers),
            updates,
        }
    }

    pub fn issue(&self) -> Ticket {
        self.sequencer.issue()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BoardUpdate> {
        self.updates.subscribe()
    }

    fn notify(&self, board: BoardKind) {
        // No subscribers is fine.
        let _ = self.updates.send(BoardUpdate { board });
    }

    /// Returns `false` when a newer result was already published.
    pub async fn publish_sheet(&self, ticket: Ticket, snapshot: SheetSnapshot) -> bool {
        let accepted = self.sheet.write().await.publish(ticket, snapshot);
        if accepted {
            self.notify(BoardKind::Sheet);
        }
        accepted
    }

    pub async fn sheet(&self) -> SheetSnapshot {
        self.sheet.read().await.value.clone()
    }

    pub fn endpoints(&self) -> &[PrinterEndpoint] {
        &self.endpoints
    }

    pub fn printer_index(&self, number: &str) -> Option<usize> {
        self.endpoints.iter().position(|ep| ep.number == number)
    }

    pub async fn publish_printer(&self, index: usize, ticket: Ticket, status: PrinterStatus) -> bool {
        let accepted = {
            let mut guard = self.printers.write().await;
            match guard.get_mut(index) {
                Some(slot) => slot.publish(ticket, status),
                None => false,
            }
        };
        if accepted {
            self.notify(BoardKind::Printers);
        }
        accepted
    }

    pub async fn printer_status(&self, index: usize) -> PrinterStatus {
        let guard = self.printers.read().await;
        guard
            .get(index)
            .map(|slot| slot.value.clone())
            .unwrap_or_default()
    }

    /// Every printer in declaration order with its current status.
    pub async fn printer_statuses(&self) -> Vec<(PrinterEndpoint, PrinterStatus)> {
        let guard = self.printers.read().await;
        self.endpoints
            .iter()
            .cloned()
            .zip(guard.iter().map(|slot| slot.value.clone()))
            .collect()
    }
}
