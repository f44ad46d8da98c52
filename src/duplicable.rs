// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Origin, modification, and validity tracking.
//!
//! Any collection of objects can take part in duplication bookkeeping by
//! implementing [`Duplicable`]. Each tracked object carries a
//! [`DuplicableState`]: a back-reference to the object it was duplicated
//! from, plus cached __modified__ and __valid__ flags.
//!
//! # Cached Status
//!
//! The flags are only ever recomputed by [`check_status`]. Readers like
//! [`is_modified`] and [`is_valid`] never trigger recomputation. An object
//! without an origin is always considered modified once checked.
//!
//! [`check_status`] is not recursive. Containers that want their status to
//! depend on their children must check every child before checking
//! themselves.
//!
//! # Notification
//!
//! Every time a check actually flips a flag, a [`StatusEvent`] is fanned out
//! to each consumer registered on the [`StatusBus`] that was passed in.

use std::fmt::{Debug, Formatter, Result as FmtResult};
use tracing::{debug, warn};

/// How deep a duplication goes.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateMode {
    /// Copy the object's own data only.
    Only,

    /// Copy the object as a whole: an action keeps its profiles, but a menu
    /// loses its children.
    Object,

    /// Copy the object and every descendant.
    #[default]
    Recursive,
}

/// Bookkeeping attached to each tracked object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuplicableState<H> {
    /// Object this one was duplicated from, if any.
    pub origin: Option<H>,

    /// Object differs from its origin.
    pub modified: bool,

    /// Object passes its own validity predicate.
    pub valid: bool,
}

impl<H> Default for DuplicableState<H> {
    fn default() -> Self {
        Self {
            origin: None,
            modified: false,
            valid: true,
        }
    }
}

/// Collection of objects supporting duplication bookkeeping.
///
/// Objects are addressed through a copyable handle. An implementation hands
/// out state lazily: [`Duplicable::state_mut`] creates default state on first
/// access, and returns `None` only for handles it does not know.
pub trait Duplicable {
    /// Handle addressing one object of the collection.
    type Handle: Copy + Eq + Debug;

    /// Tracking state of object, if it was ever created.
    fn state(&self, object: Self::Handle) -> Option<&DuplicableState<Self::Handle>>;

    /// Tracking state of object, created on first access.
    fn state_mut(&mut self, object: Self::Handle) -> Option<&mut DuplicableState<Self::Handle>>;

    /// Allocate a new empty object of the same concrete kind as `object`.
    fn new_like(&mut self, object: Self::Handle) -> Option<Self::Handle>;

    /// Copy data from `source` into `target`, as deep as `mode` says.
    fn copy(&mut self, target: Self::Handle, source: Self::Handle, mode: DuplicateMode);

    /// Whether `object` holds the same content as its `origin`.
    fn are_equal(&self, origin: Self::Handle, object: Self::Handle) -> bool;

    /// Validity predicate of `object`.
    fn is_valid(&self, object: Self::Handle) -> bool;
}

/// Duplicate an object.
///
/// The duplicate remembers `object` as its origin, and starts out with the
/// same modified and valid flags that `object` currently has. The caller owns
/// the returned object.
///
/// Returns `None` if `object` is unknown to `store`.
pub fn duplicate<D: Duplicable>(
    store: &mut D,
    object: D::Handle,
    mode: DuplicateMode,
) -> Option<D::Handle> {
    let Some(dup) = store.new_like(object) else {
        contract_violation("duplicate", object);
        return None;
    };

    store.copy(dup, object, mode);
    let current = store.state(object).copied().unwrap_or_default();
    if let Some(state) = store.state_mut(dup) {
        state.origin = Some(object);
        state.modified = current.modified;
        state.valid = current.valid;
    }

    Some(dup)
}

/// Recompute cached modified and valid flags of one object.
///
/// Emits a [`StatusEvent`] onto `bus` for each flag whose value changed.
pub fn check_status<D: Duplicable>(
    store: &mut D,
    object: D::Handle,
    bus: &mut StatusBus<D::Handle>,
) {
    let Some(previous) = store.state_mut(object).map(|state| *state) else {
        contract_violation("check_status", object);
        return;
    };

    let modified = match previous.origin {
        Some(origin) => !store.are_equal(origin, object),
        None => true,
    };
    let valid = store.is_valid(object);

    if let Some(state) = store.state_mut(object) {
        state.modified = modified;
        state.valid = valid;
    }

    if previous.modified != modified {
        bus.emit(StatusEvent {
            object,
            change: StatusChange::Modified(modified),
        });
    }

    if previous.valid != valid {
        bus.emit(StatusEvent {
            object,
            change: StatusChange::Valid(valid),
        });
    }
}

/// Origin of object.
pub fn get_origin<D: Duplicable>(store: &D, object: D::Handle) -> Option<D::Handle> {
    store.state(object).and_then(|state| state.origin)
}

/// Rebind origin of object.
///
/// Cached flags are left alone until the next [`check_status`].
pub fn set_origin<D: Duplicable>(store: &mut D, object: D::Handle, origin: Option<D::Handle>) {
    match store.state_mut(object) {
        Some(state) => state.origin = origin,
        None => contract_violation("set_origin", object),
    }
}

/// Cached modified flag of object.
pub fn is_modified<D: Duplicable>(store: &D, object: D::Handle) -> bool {
    store.state(object).map(|state| state.modified).unwrap_or(false)
}

/// Cached valid flag of object.
///
/// Not to be confused with [`Duplicable::is_valid`], which evaluates the
/// predicate itself.
pub fn is_valid<D: Duplicable>(store: &D, object: D::Handle) -> bool {
    store.state(object).map(|state| state.valid).unwrap_or(true)
}

fn contract_violation(operation: &str, object: impl Debug) {
    warn!("{operation}: object {object:?} does not support duplicable tracking");
    debug_assert!(false, "{operation}: object {object:?} is not tracked");
}

/// Flag that changed during a status check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    /// Modified flag changed to given value.
    Modified(bool),

    /// Valid flag changed to given value.
    Valid(bool),
}

/// Notification about a status change of one object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusEvent<H> {
    /// Object whose status changed.
    pub object: H,

    /// What changed.
    pub change: StatusChange,
}

/// Receiver of status change notifications.
pub trait StatusConsumer<H> {
    /// Handle one status change.
    fn status_changed(&mut self, event: &StatusEvent<H>);
}

impl<H, F> StatusConsumer<H> for F
where
    F: FnMut(&StatusEvent<H>),
{
    fn status_changed(&mut self, event: &StatusEvent<H>) {
        self(event)
    }
}

/// Registration handle of a consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConsumerHandle(u64);

/// Fan-out of status change notifications.
pub struct StatusBus<H> {
    consumers: Vec<(ConsumerHandle, Box<dyn StatusConsumer<H>>)>,
    next_handle: u64,
}

impl<H> StatusBus<H>
where
    H: Debug,
{
    /// Construct new bus without consumers.
    pub fn new() -> Self {
        Self {
            consumers: Vec::new(),
            next_handle: 0,
        }
    }

    /// Register a consumer of every status change emitted on this bus.
    pub fn register_consumer(
        &mut self,
        consumer: impl StatusConsumer<H> + 'static,
    ) -> ConsumerHandle {
        let handle = ConsumerHandle(self.next_handle);
        self.next_handle += 1;
        self.consumers.push((handle, Box::new(consumer)));
        handle
    }

    /// Stop notifying a consumer.
    ///
    /// Returns `false` if the handle was not registered.
    pub fn unregister_consumer(&mut self, handle: ConsumerHandle) -> bool {
        let before = self.consumers.len();
        self.consumers.retain(|(registered, _)| *registered != handle);
        before != self.consumers.len()
    }

    /// Number of registered consumers.
    pub fn consumer_count(&self) -> usize {
        self.consumers.len()
    }

    /// Send event to every registered consumer.
    pub fn emit(&mut self, event: StatusEvent<H>) {
        debug!("{:?} changed on {:?}", event.change, event.object);
        for (_, consumer) in &mut self.consumers {
            consumer.status_changed(&event);
        }
    }
}

impl<H: Debug> Default for StatusBus<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> Debug for StatusBus<H> {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.debug_struct("StatusBus")
            .field("consumers", &self.consumers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::{cell::RefCell, rc::Rc};

    // Flat list of notes, each with an optional duplicate state.
    #[derive(Default)]
    struct Notes {
        entries: Vec<(String, Option<DuplicableState<usize>>)>,
    }

    impl Notes {
        fn add(&mut self, text: &str) -> usize {
            self.entries.push((text.into(), None));
            self.entries.len() - 1
        }
    }

    impl Duplicable for Notes {
        type Handle = usize;

        fn state(&self, object: usize) -> Option<&DuplicableState<usize>> {
            self.entries.get(object).and_then(|(_, state)| state.as_ref())
        }

        fn state_mut(&mut self, object: usize) -> Option<&mut DuplicableState<usize>> {
            self.entries
                .get_mut(object)
                .map(|(_, state)| state.get_or_insert_with(Default::default))
        }

        fn new_like(&mut self, object: usize) -> Option<usize> {
            (object < self.entries.len()).then(|| self.add(""))
        }

        fn copy(&mut self, target: usize, source: usize, _mode: DuplicateMode) {
            self.entries[target].0 = self.entries[source].0.clone();
        }

        fn are_equal(&self, origin: usize, object: usize) -> bool {
            self.entries[origin].0 == self.entries[object].0
        }

        fn is_valid(&self, object: usize) -> bool {
            !self.entries[object].0.is_empty()
        }
    }

    fn recorder(bus: &mut StatusBus<usize>) -> Rc<RefCell<Vec<StatusEvent<usize>>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        bus.register_consumer(move |event: &StatusEvent<usize>| sink.borrow_mut().push(*event));
        events
    }

    #[test]
    fn state_defaults_before_first_check() {
        let mut notes = Notes::default();
        let note = notes.add("");

        assert_eq!(get_origin(&notes, note), None);
        assert!(!is_modified(&notes, note));
        assert!(is_valid(&notes, note));
    }

    #[test]
    fn duplicate_keeps_origin_and_flags() {
        let mut notes = Notes::default();
        let mut bus = StatusBus::new();
        let note = notes.add("groceries");
        check_status(&mut notes, note, &mut bus);

        let dup = duplicate(&mut notes, note, DuplicateMode::Recursive).unwrap();

        assert_eq!(notes.entries[dup].0, "groceries");
        assert_eq!(get_origin(&notes, dup), Some(note));
        assert_eq!(is_modified(&notes, dup), is_modified(&notes, note));
        assert_eq!(is_valid(&notes, dup), is_valid(&notes, note));
    }

    #[test]
    fn origin_less_object_is_always_modified() {
        let mut notes = Notes::default();
        let mut bus = StatusBus::new();
        let note = notes.add("groceries");

        check_status(&mut notes, note, &mut bus);

        assert!(is_modified(&notes, note));
    }

    #[test]
    fn duplicate_is_modified_only_after_it_diverges() {
        let mut notes = Notes::default();
        let mut bus = StatusBus::new();
        let note = notes.add("groceries");
        let dup = duplicate(&mut notes, note, DuplicateMode::Only).unwrap();

        check_status(&mut notes, dup, &mut bus);
        assert!(!is_modified(&notes, dup));

        notes.entries[dup].0 = "chores".into();
        assert!(!is_modified(&notes, dup));

        check_status(&mut notes, dup, &mut bus);
        assert!(is_modified(&notes, dup));
    }

    #[test]
    fn repeated_check_does_not_notify_twice() {
        let mut notes = Notes::default();
        let mut bus = StatusBus::new();
        let events = recorder(&mut bus);
        let note = notes.add("");

        check_status(&mut notes, note, &mut bus);
        let first = (is_modified(&notes, note), is_valid(&notes, note));
        check_status(&mut notes, note, &mut bus);
        let second = (is_modified(&notes, note), is_valid(&notes, note));

        assert_eq!(first, second);
        assert_eq!(
            *events.borrow(),
            vec![
                StatusEvent {
                    object: note,
                    change: StatusChange::Modified(true)
                },
                StatusEvent {
                    object: note,
                    change: StatusChange::Valid(false)
                },
            ]
        );
    }

    #[test]
    fn set_origin_does_not_recheck() {
        let mut notes = Notes::default();
        let mut bus = StatusBus::new();
        let first = notes.add("groceries");
        let second = notes.add("groceries");
        check_status(&mut notes, second, &mut bus);
        assert!(is_modified(&notes, second));

        set_origin(&mut notes, second, Some(first));
        assert!(is_modified(&notes, second));

        check_status(&mut notes, second, &mut bus);
        assert!(!is_modified(&notes, second));
    }

    #[test]
    fn unregistered_consumer_stops_receiving() {
        let mut notes = Notes::default();
        let mut bus = StatusBus::new();
        let events = Rc::new(RefCell::new(0_usize));
        let sink = Rc::clone(&events);
        let handle = bus.register_consumer(move |_: &StatusEvent<usize>| *sink.borrow_mut() += 1);
        let note = notes.add("groceries");

        check_status(&mut notes, note, &mut bus);
        assert_eq!(*events.borrow(), 1);

        assert!(bus.unregister_consumer(handle));
        assert!(!bus.unregister_consumer(handle));
        assert_eq!(bus.consumer_count(), 0);

        notes.entries[note].0.clear();
        check_status(&mut notes, note, &mut bus);
        assert_eq!(*events.borrow(), 1);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic]
    fn duplicate_of_unknown_object_is_a_contract_violation() {
        let mut notes = Notes::default();
        let _ = duplicate(&mut notes, 7, DuplicateMode::Only);
    }
}
