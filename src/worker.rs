//! Off-thread layout.
//!
//! Layout is a pure function of an entity snapshot, so it can run on a
//! background thread while the edit model keeps taking edits. Every request is
//! tagged with a ticket, and only the result for the newest submitted ticket is
//! ever handed out: a pass that was superseded by a later submission while it
//! ran is dropped, even if nothing newer has finished yet.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::JoinHandle;

use crate::config::LayoutConfig;
use crate::ir::{Entity, Size, derive_relationships};
use crate::layout::{EdgePath, TreeLayout, compute_edge_paths, compute_layout};

#[derive(Debug, Clone)]
pub struct LayoutRequest {
    pub ticket: u64,
    pub entities: Vec<Entity>,
    pub config: LayoutConfig,
    pub canvas: Size,
}

#[derive(Debug, Clone)]
pub struct LayoutResult {
    pub ticket: u64,
    pub layout: TreeLayout,
    pub edges: Vec<EdgePath>,
}

/// Runs one request synchronously.
pub fn run_request(request: &LayoutRequest) -> LayoutResult {
    let layout = compute_layout(&request.entities, &request.config, request.canvas);
    let relationships = derive_relationships(&request.entities);
    let edges = compute_edge_paths(&layout.positions, &relationships, &layout.sizes);
    LayoutResult {
        ticket: request.ticket,
        layout,
        edges,
    }
}

pub struct LayoutWorker {
    requests: Option<Sender<LayoutRequest>>,
    results: Receiver<LayoutResult>,
    handle: Option<JoinHandle<()>>,
    next_ticket: u64,
    latest_accepted: Option<u64>,
}

impl LayoutWorker {
    pub fn spawn() -> std::io::Result<Self> {
        let (request_tx, request_rx) = mpsc::channel::<LayoutRequest>();
        let (result_tx, result_rx) = mpsc::channel::<LayoutResult>();
        let handle = std::thread::Builder::new()
            .name("lineage-layout".to_string())
            .spawn(move || worker_loop(request_rx, result_tx))?;
        Ok(Self {
            requests: Some(request_tx),
            results: result_rx,
            handle: Some(handle),
            next_ticket: 1,
            latest_accepted: None,
        })
    }

    /// Queues a layout of `entities`; returns the request's ticket.
    pub fn submit(&mut self, entities: Vec<Entity>, config: LayoutConfig, canvas: Size) -> u64 {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        let request = LayoutRequest {
            ticket,
            entities,
            config,
            canvas,
        };
        if let Some(tx) = &self.requests
            && tx.send(request).is_err()
        {
            tracing::warn!(ticket, "layout worker is gone, request dropped");
        }
        ticket
    }

    /// The result for the newest submitted request, if it has finished.
    /// Never blocks.
    pub fn poll_latest(&mut self) -> Option<LayoutResult> {
        let mut newest: Option<LayoutResult> = None;
        loop {
            match self.results.try_recv() {
                Ok(result) => {
                    if newest.as_ref().is_none_or(|n| result.ticket > n.ticket) {
                        newest = Some(result);
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        newest.and_then(|result| self.accept(result))
    }

    /// Blocks until the most recently submitted request has been laid out.
    pub fn wait_latest(&mut self) -> Option<LayoutResult> {
        let wanted = self.next_ticket.checked_sub(1).filter(|t| *t > 0)?;
        if self.latest_accepted.is_some_and(|t| t >= wanted) {
            return None;
        }
        while let Ok(result) = self.results.recv() {
            if result.ticket == wanted {
                return self.accept(result);
            }
            tracing::trace!(ticket = result.ticket, wanted, "discarding stale layout");
        }
        None
    }

    fn accept(&mut self, result: LayoutResult) -> Option<LayoutResult> {
        let newest = self.next_ticket.saturating_sub(1);
        if result.ticket < newest {
            tracing::trace!(ticket = result.ticket, newest, "discarding superseded layout");
            return None;
        }
        if self.latest_accepted.is_some_and(|t| result.ticket <= t) {
            tracing::trace!(ticket = result.ticket, "discarding stale layout");
            return None;
        }
        self.latest_accepted = Some(result.ticket);
        Some(result)
    }

    pub fn latest_accepted(&self) -> Option<u64> {
        self.latest_accepted
    }
}

impl Drop for LayoutWorker {
    fn drop(&mut self) {
        self.requests.take();
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            tracing::warn!("layout worker panicked");
        }
    }
}

fn worker_loop(requests: Receiver<LayoutRequest>, results: Sender<LayoutResult>) {
    while let Ok(mut request) = requests.recv() {
        // Only the newest queued request matters.
        loop {
            match requests.try_recv() {
                Ok(newer) => {
                    tracing::trace!(skipped = request.ticket, "coalescing queued layout");
                    request = newer;
                }
                Err(_) => break,
            }
        }
        let result = run_request(&request);
        if results.send(result).is_err() {
            break;
        }
    }
}
