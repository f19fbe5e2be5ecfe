//! Process-wide online/offline flag.
//!
//! All reference data is local, so this flag has no effect on resolution
//! correctness. It exists only so the presentation layer can show a
//! "using cached data" notice; there is deliberately no sync protocol
//! behind it. Listeners must be deregistered via `unsubscribe` - a
//! leaked listener after the subscriber goes away is a bug, not
//! cosmetic.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

type Listener = Box<dyn Fn(bool) + Send + Sync>;

struct Monitor {
    offline: AtomicBool,
    next_id: AtomicU64,
    listeners: Mutex<HashMap<u64, Listener>>,
}

static MONITOR: Lazy<Monitor> = Lazy::new(|| Monitor {
    offline: AtomicBool::new(false),
    next_id: AtomicU64::new(1),
    listeners: Mutex::new(HashMap::new()),
});

/// Handle returned by `subscribe`, needed to deregister the listener
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

/// Current offline state
pub fn is_offline() -> bool {
    MONITOR.offline.load(Ordering::SeqCst)
}

/// Update the offline state from a platform connectivity notification.
/// Listeners are notified only on an actual change.
pub fn set_offline(offline: bool) {
    let previous = MONITOR.offline.swap(offline, Ordering::SeqCst);
    if previous == offline {
        return;
    }

    tracing::info!("Connectivity changed: offline = {}", offline);
    if let Ok(listeners) = MONITOR.listeners.lock() {
        for listener in listeners.values() {
            listener(offline);
        }
    }
}

/// Register a listener for connectivity changes
pub fn subscribe(listener: impl Fn(bool) + Send + Sync + 'static) -> SubscriptionId {
    let id = MONITOR.next_id.fetch_add(1, Ordering::SeqCst);
    if let Ok(mut listeners) = MONITOR.listeners.lock() {
        listeners.insert(id, Box::new(listener));
    }
    SubscriptionId(id)
}

/// Deregister a listener. Returns true if it was registered.
pub fn unsubscribe(id: SubscriptionId) -> bool {
    match MONITOR.listeners.lock() {
        Ok(mut listeners) => listeners.remove(&id.0).is_some(),
        Err(_) => false,
    }
}
