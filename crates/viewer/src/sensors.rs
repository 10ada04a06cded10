//! Scoped subscriptions to the device-orientation event source.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::warn;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ListenerKey(pub u64);

/// Registers and removes the host's orientation listener.
///
/// Samples themselves are pushed by the host into
/// [`NavigationController::on_orientation`](crate::NavigationController::on_orientation);
/// this trait only owns the listener's lifetime. Implementations must not
/// hold a borrow of themselves while delivering samples.
pub trait OrientationSource {
    fn subscribe(&mut self) -> ListenerKey;
    fn unsubscribe(&mut self, key: ListenerKey);
}

pub type SharedOrientationSource = Rc<RefCell<dyn OrientationSource>>;

/// A live listener registration, removed on [`close`](Self::close) or drop.
pub struct Subscription {
    source: SharedOrientationSource,
    key: Option<ListenerKey>,
}

impl Subscription {
    pub fn open(source: &SharedOrientationSource) -> Self {
        let key = source.borrow_mut().subscribe();
        Self {
            source: Rc::clone(source),
            key: Some(key),
        }
    }

    pub fn is_active(&self) -> bool {
        self.key.is_some()
    }

    pub fn close(&mut self) {
        let Some(key) = self.key else {
            return;
        };
        match self.source.try_borrow_mut() {
            Ok(mut source) => {
                source.unsubscribe(key);
                self.key = None;
            }
            Err(_) => warn!(?key, "orientation source busy; listener not removed"),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("key", &self.key).finish()
    }
}
