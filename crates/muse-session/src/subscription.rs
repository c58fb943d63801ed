//! Registry of session-state subscribers.
//!
//! Dispatch is serialised by a re-entrant lock. Every subscriber therefore
//! sees transitions in the order they happened, and an unsubscribe issued on
//! another thread waits for an in-flight dispatch to finish. Re-entrancy lets a
//! callback unsubscribe itself (or subscribe someone new) mid-dispatch.

use std::sync::{
  Arc, Weak,
  atomic::{AtomicBool, AtomicU64, Ordering},
};

use parking_lot::{Mutex, ReentrantMutex};

use crate::state::SessionState;

type Callback = Arc<dyn Fn(&SessionState) + Send + Sync>;

struct Entry {
  id:       u64,
  active:   AtomicBool,
  callback: Callback,
}

#[derive(Default)]
struct Registry {
  dispatch: ReentrantMutex<()>,
  entries:  Mutex<Vec<Arc<Entry>>>,
  next_id:  AtomicU64,
}

impl Registry {
  fn remove(&self, id: u64) {
    let _dispatch = self.dispatch.lock();
    let removed = {
      let mut entries = self.entries.lock();
      let pos = entries.iter().position(|e| e.id == id);
      pos.map(|pos| entries.remove(pos))
    };
    // Dropped outside `entries`: the callback may own other handles whose
    // drop lands back here.
    if let Some(entry) = removed {
      entry.active.store(false, Ordering::SeqCst);
    }
  }
}

#[derive(Default)]
pub(crate) struct Subscribers {
  registry: Arc<Registry>,
}

impl Subscribers {
  pub(crate) fn subscribe<F>(&self, callback: F) -> Subscription
  where
    F: Fn(&SessionState) + Send + Sync + 'static,
  {
    let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
    let entry = Arc::new(Entry {
      id,
      active: AtomicBool::new(true),
      callback: Arc::new(callback),
    });
    self.registry.entries.lock().push(entry);
    Subscription { registry: Arc::downgrade(&self.registry), id }
  }

  /// Run `update` under the dispatch lock and, if it reports a new state,
  /// hand that state to every registered callback in registration order.
  pub(crate) fn dispatch<F>(&self, update: F) -> bool
  where
    F: FnOnce() -> Option<SessionState>,
  {
    let _dispatch = self.registry.dispatch.lock();

    let Some(state) = update() else {
      return false;
    };

    let snapshot: Vec<Arc<Entry>> = self.registry.entries.lock().clone();
    for entry in snapshot {
      if entry.active.load(Ordering::SeqCst) {
        (entry.callback)(&state);
      }
    }
    true
  }

  pub(crate) fn len(&self) -> usize { self.registry.entries.lock().len() }
}

/// Handle returned by [`crate::SessionManager::subscribe`].
///
/// Dropping the handle unsubscribes. Once [`Subscription::unsubscribe`] (or the
/// drop) returns, the callback will not be invoked again.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
  registry: Weak<Registry>,
  id:       u64,
}

impl Subscription {
  pub fn unsubscribe(self) { drop(self) }
}

impl Drop for Subscription {
  fn drop(&mut self) {
    if let Some(registry) = self.registry.upgrade() {
      registry.remove(self.id);
    }
  }
}

impl std::fmt::Debug for Subscription {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Subscription").field("id", &self.id).finish()
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::AtomicUsize;

  use super::*;

  fn counter(subs: &Subscribers) -> (Arc<AtomicUsize>, Subscription) {
    let count = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&count);
    let sub = subs.subscribe(move |_| {
      c.fetch_add(1, Ordering::SeqCst);
    });
    (count, sub)
  }

  #[test]
  fn dispatch_reaches_every_subscriber() {
    let subs = Subscribers::default();
    let (a, _sa) = counter(&subs);
    let (b, _sb) = counter(&subs);

    assert!(subs.dispatch(|| Some(SessionState::Unauthenticated)));
    assert_eq!(a.load(Ordering::SeqCst), 1);
    assert_eq!(b.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn unchanged_state_is_not_dispatched() {
    let subs = Subscribers::default();
    let (a, _sa) = counter(&subs);
    assert!(!subs.dispatch(|| None));
    assert_eq!(a.load(Ordering::SeqCst), 0);
  }

  #[test]
  fn callbacks_run_in_registration_order() {
    let subs = Subscribers::default();
    let order = Arc::new(Mutex::new(Vec::new()));
    let handles: Vec<Subscription> = (0..3)
      .map(|i| {
        let order = Arc::clone(&order);
        subs.subscribe(move |_| order.lock().push(i))
      })
      .collect();

    subs.dispatch(|| Some(SessionState::Unauthenticated));
    assert_eq!(*order.lock(), vec![0, 1, 2]);
    drop(handles);
    assert_eq!(subs.len(), 0);
  }

  #[test]
  fn unsubscribed_callback_is_not_invoked() {
    let subs = Subscribers::default();
    let (a, sa) = counter(&subs);
    sa.unsubscribe();
    subs.dispatch(|| Some(SessionState::Unauthenticated));
    assert_eq!(a.load(Ordering::SeqCst), 0);
  }

  #[test]
  fn callback_can_unsubscribe_a_later_subscriber() {
    let subs = Subscribers::default();
    let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

    let s = Arc::clone(&slot);
    let _first = subs.subscribe(move |_| {
      // Take the handle first so its drop runs after the slot lock is released.
      let handle = s.lock().take();
      drop(handle);
    });
    let (second, handle) = counter(&subs);
    *slot.lock() = Some(handle);

    subs.dispatch(|| Some(SessionState::Unauthenticated));
    assert_eq!(second.load(Ordering::SeqCst), 0);
    assert_eq!(subs.len(), 1);
  }

  #[test]
  fn dropping_a_callback_releases_the_handles_it_owns() {
    let subs = Subscribers::default();
    let (inner_calls, inner) = counter(&subs);
    let outer = subs.subscribe(move |_| {
      let _keep = &inner;
    });
    assert_eq!(subs.len(), 2);

    drop(outer);

    assert_eq!(subs.len(), 0);
    subs.dispatch(|| Some(SessionState::Unauthenticated));
    assert_eq!(inner_calls.load(Ordering::SeqCst), 0);
  }

  #[test]
  fn handle_outliving_registry_is_harmless() {
    let subs = Subscribers::default();
    let (_, handle) = counter(&subs);
    drop(subs);
    handle.unsubscribe();
  }

  #[test]
  fn unsubscribe_waits_for_inflight_dispatch() {
    use std::{sync::Barrier, thread, time::Duration};

    let subs = Arc::new(Subscribers::default());
    let entered = Arc::new(Barrier::new(2));
    let calls = Arc::new(AtomicUsize::new(0));

    let (e, c) = (Arc::clone(&entered), Arc::clone(&calls));
    let handle = subs.subscribe(move |_| {
      if c.fetch_add(1, Ordering::SeqCst) == 0 {
        e.wait();
        thread::sleep(Duration::from_millis(50));
      }
    });

    let dispatcher = {
      let subs = Arc::clone(&subs);
      thread::spawn(move || {
        subs.dispatch(|| Some(SessionState::Unauthenticated));
      })
    };

    entered.wait();
    handle.unsubscribe();
    // The in-flight dispatch finished before unsubscribe returned, and no
    // further dispatch reaches the callback.
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    subs.dispatch(|| Some(SessionState::Unauthenticated));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    dispatcher.join().unwrap();
  }
}
