//! Change notifications and selectors.
//!
//! Every mutating store operation emits a [`ChangeEvent`] synchronously,
//! after the mutation is committed. Observers either receive every event or
//! register a selector and hear only about changes to the derived value.

mod listeners;
mod shallow;

pub(crate) use listeners::Listeners;
pub use listeners::Subscription;
pub use shallow::{IdentityEq, ShallowEq};

use std::sync::Arc;
use tracing::trace;

/// A committed state change.
#[derive(Debug)]
pub struct ChangeEvent<S> {
    /// The state that was current before the operation
    pub prev: Arc<S>,
    /// The state that is current now
    pub next: Arc<S>,
}

impl<S> Clone for ChangeEvent<S> {
    fn clone(&self) -> Self {
        Self {
            prev: Arc::clone(&self.prev),
            next: Arc::clone(&self.next),
        }
    }
}

impl<S> ChangeEvent<S> {
    pub fn new(prev: Arc<S>, next: Arc<S>) -> Self {
        Self { prev, next }
    }

    /// `true` when both sides are the same snapshot.
    pub fn is_noop(&self) -> bool {
        Arc::ptr_eq(&self.prev, &self.next)
    }
}

/// Wrap `on_change` so it only runs when `selector`'s output changed.
///
/// The selector is evaluated on both sides of the event and compared with
/// [`ShallowEq`]. On a change, `on_change` receives the newly selected value.
///
/// # Example
///
/// ```rust
/// use rewind::notify::{on_selection_change, ChangeEvent};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// #[derive(Debug)]
/// struct Doc { title: String, body: String }
///
/// let renders = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&renders);
/// let listener = on_selection_change(
///     |doc: &Doc| doc.title.clone(),
///     move |_title| { counter.fetch_add(1, Ordering::SeqCst); },
/// );
///
/// let a = Arc::new(Doc { title: "A".into(), body: "one".into() });
/// let b = Arc::new(Doc { title: "A".into(), body: "two".into() });
/// let c = Arc::new(Doc { title: "C".into(), body: "two".into() });
///
/// listener(&ChangeEvent::new(a, Arc::clone(&b)));
/// assert_eq!(renders.load(Ordering::SeqCst), 0);
/// listener(&ChangeEvent::new(b, c));
/// assert_eq!(renders.load(Ordering::SeqCst), 1);
/// ```
pub fn on_selection_change<S, T, Sel, F>(
    selector: Sel,
    on_change: F,
) -> impl Fn(&ChangeEvent<S>) + Send + Sync + 'static
where
    S: 'static,
    Sel: Fn(&S) -> T + Send + Sync + 'static,
    T: ShallowEq + 'static,
    F: Fn(T) + Send + Sync + 'static,
{
    move |event: &ChangeEvent<S>| {
        let before = selector(&event.prev);
        let after = selector(&event.next);
        if before.shallow_eq(&after) {
            trace!("selection unchanged");
        } else {
            trace!("selection changed");
            on_change(after);
        }
    }
}
