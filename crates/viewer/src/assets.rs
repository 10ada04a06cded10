//! Process-wide registry for the render engine's injected runtime assets.
//!
//! Every viewer instance acquires the assets on mount and releases them on
//! teardown. The loader runs when the first holder arrives and the assets are
//! not already present; they are removed when the last holder leaves.

use std::cell::RefCell;
use std::rc::Rc;

use foundation::Generation;
use tracing::{debug, info, warn};

/// Host side of asset injection (script and stylesheet elements).
pub trait AssetLoader {
    /// Starts loading. Completion is reported through
    /// [`AssetRegistry::finish_loading`] with the same `ticket`; an `Err` here
    /// means the load could not even be started.
    fn inject(&mut self, ticket: Generation) -> Result<(), String>;
    fn remove(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetStatus {
    Absent,
    Loading,
    Loaded,
    Failed(String),
}

pub struct AssetRegistry {
    loader: Box<dyn AssetLoader>,
    holders: usize,
    status: AssetStatus,
    injections: u64,
    ticket: Generation,
}

pub type SharedAssets = Rc<RefCell<AssetRegistry>>;

impl std::fmt::Debug for AssetRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetRegistry")
            .field("holders", &self.holders)
            .field("status", &self.status)
            .field("injections", &self.injections)
            .field("ticket", &self.ticket)
            .finish()
    }
}

impl AssetRegistry {
    pub fn new(loader: Box<dyn AssetLoader>) -> Self {
        Self {
            loader,
            holders: 0,
            status: AssetStatus::Absent,
            injections: 0,
            ticket: Generation::default(),
        }
    }

    pub fn shared(loader: Box<dyn AssetLoader>) -> SharedAssets {
        Rc::new(RefCell::new(Self::new(loader)))
    }

    pub fn status(&self) -> &AssetStatus {
        &self.status
    }

    pub fn holders(&self) -> usize {
        self.holders
    }

    /// How many times the loader has been asked to inject.
    pub fn injections(&self) -> u64 {
        self.injections
    }

    /// Ticket of the most recent injection.
    pub fn ticket(&self) -> Generation {
        self.ticket
    }

    pub fn acquire(&mut self) -> AssetStatus {
        self.holders += 1;
        match &self.status {
            AssetStatus::Absent => self.inject(),
            AssetStatus::Failed(reason) => {
                debug!(%reason, "re-injecting engine assets after failed load");
                self.loader.remove();
                self.inject();
            }
            AssetStatus::Loading | AssetStatus::Loaded => {}
        }
        self.status.clone()
    }

    /// Extra releases are ignored.
    pub fn release(&mut self) {
        if self.holders == 0 {
            return;
        }
        self.holders -= 1;
        if self.holders == 0 && self.status != AssetStatus::Absent {
            info!("last viewer released engine assets; removing");
            self.loader.remove();
            self.status = AssetStatus::Absent;
        }
    }

    /// Applied only while the injection named by `ticket` is pending.
    /// Removing an element does not cancel its load event, so completions of
    /// earlier injections still arrive and are dropped here.
    pub fn finish_loading(&mut self, ticket: Generation, result: Result<(), String>) {
        if ticket != self.ticket || self.status != AssetStatus::Loading {
            debug!(
                ticket = ticket.get(),
                current = self.ticket.get(),
                status = ?self.status,
                "ignoring stale asset load completion"
            );
            return;
        }
        self.status = match result {
            Ok(()) => AssetStatus::Loaded,
            Err(reason) => {
                warn!(%reason, "engine assets failed to load");
                AssetStatus::Failed(reason)
            }
        };
    }

    fn inject(&mut self) {
        self.injections += 1;
        self.ticket = self.ticket.next();
        self.status = match self.loader.inject(self.ticket) {
            Ok(()) => AssetStatus::Loading,
            Err(reason) => {
                warn!(%reason, "engine asset injection failed");
                AssetStatus::Failed(reason)
            }
        };
    }
}
