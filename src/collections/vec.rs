// ============================================================================
// spark-observe - ObservableVec
// A Vec of shared elements that announces every membership change
// ============================================================================

use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use super::change::{CollectionChange, ObservableCollection};
use crate::core::event::EventSource;

// =============================================================================
// OBSERVABLE VEC
// =============================================================================

/// An ordered list of `Rc<T>` raising a [`CollectionChange`] per mutation.
///
/// All methods take `&self`, so the list can be shared through an `Rc` with
/// the listeners that react to it. Each change is emitted after the internal
/// borrow is released, so listeners may read or even mutate the list.
///
/// | Operation | Event |
/// |-----------|-------|
/// | `push`, `insert`, `extend` | `Added` per element |
/// | `pop`, `remove`, `swap_remove`, `remove_item`, `retain`, `truncate` | `Removed` per element |
/// | `set` | `Replaced` |
/// | `clear`, `sort_by`, `reverse`, `reset` | `Reset` |
///
/// # Example
///
/// ```
/// use std::rc::Rc;
/// use spark_observe::ObservableVec;
///
/// let items: ObservableVec<String> = ObservableVec::new();
///
/// let first = items.push("first".to_string());
/// items.push("second".to_string());
/// assert_eq!(items.len(), 2);
///
/// items.set(0, Rc::new("updated".to_string()));
/// assert_eq!(items.get(0).as_deref(), Some(&"updated".to_string()));
/// assert!(items.index_of(&first).is_none());
/// ```
pub struct ObservableVec<T> {
    data: RefCell<Vec<Rc<T>>>,
    changed: EventSource<CollectionChange<T>>,
}

impl<T: 'static> ObservableVec<T> {
    /// Create a new empty observable vec.
    pub fn new() -> Self {
        Self::from_rcs(Vec::new())
    }

    /// Create an observable vec with initial capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_rcs(Vec::with_capacity(capacity))
    }

    /// Create an observable vec owning each value.
    pub fn from_vec(data: Vec<T>) -> Self {
        Self::from_rcs(data.into_iter().map(Rc::new).collect())
    }

    /// Create an observable vec from already shared elements.
    pub fn from_rcs(data: Vec<Rc<T>>) -> Self {
        Self {
            data: RefCell::new(data),
            changed: EventSource::new(),
        }
    }

    fn emit(&self, change: CollectionChange<T>) {
        self.changed.emit(&change);
    }

    // =========================================================================
    // LENGTH / READ
    // =========================================================================

    pub fn len(&self) -> usize {
        self.data.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.borrow().is_empty()
    }

    /// Returns the element at `index`.
    pub fn get(&self, index: usize) -> Option<Rc<T>> {
        self.data.borrow().get(index).cloned()
    }

    pub fn first(&self) -> Option<Rc<T>> {
        self.data.borrow().first().cloned()
    }

    pub fn last(&self) -> Option<Rc<T>> {
        self.data.borrow().last().cloned()
    }

    /// Position of `element`, compared by identity.
    pub fn index_of(&self, element: &Rc<T>) -> Option<usize> {
        self.data
            .borrow()
            .iter()
            .position(|item| Rc::ptr_eq(item, element))
    }

    /// Whether `element` (by identity) is in the list.
    pub fn contains(&self, element: &Rc<T>) -> bool {
        self.index_of(element).is_some()
    }

    /// Current elements in order.
    pub fn to_vec(&self) -> Vec<Rc<T>> {
        self.data.borrow().clone()
    }

    /// Call `f` for each element in order.
    ///
    /// The list must not be mutated from inside `f`.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&Rc<T>),
    {
        for item in self.data.borrow().iter() {
            f(item);
        }
    }

    // =========================================================================
    // PUSH / POP
    // =========================================================================

    /// Appends a value and returns the shared handle to it.
    pub fn push(&self, value: T) -> Rc<T> {
        let value = Rc::new(value);
        self.push_rc(value.clone());
        value
    }

    /// Appends an already shared element.
    pub fn push_rc(&self, value: Rc<T>) {
        let index = {
            let mut data = self.data.borrow_mut();
            data.push(value.clone());
            data.len() - 1
        };
        self.emit(CollectionChange::Added { index, value });
    }

    /// Removes the last element and returns it, or `None` if empty.
    pub fn pop(&self) -> Option<Rc<T>> {
        let (index, value) = {
            let mut data = self.data.borrow_mut();
            let value = data.pop()?;
            (data.len(), value)
        };
        self.emit(CollectionChange::Removed {
            index,
            value: value.clone(),
        });
        Some(value)
    }

    // =========================================================================
    // INSERT / REMOVE
    // =========================================================================

    /// Inserts an element at `index`, shifting later elements right.
    ///
    /// # Panics
    /// Panics if `index > len`.
    pub fn insert(&self, index: usize, value: Rc<T>) {
        self.data.borrow_mut().insert(index, value.clone());
        self.emit(CollectionChange::Added { index, value });
    }

    /// Removes and returns the element at `index`, shifting later elements left.
    ///
    /// # Panics
    /// Panics if `index >= len`.
    pub fn remove(&self, index: usize) -> Rc<T> {
        let value = self.data.borrow_mut().remove(index);
        self.emit(CollectionChange::Removed {
            index,
            value: value.clone(),
        });
        value
    }

    /// Removes and returns the element at `index` if it exists.
    pub fn try_remove(&self, index: usize) -> Option<Rc<T>> {
        if index < self.len() {
            Some(self.remove(index))
        } else {
            None
        }
    }

    /// Removes the first occurrence of `element` (by identity).
    ///
    /// Returns false if it was not present.
    pub fn remove_item(&self, element: &Rc<T>) -> bool {
        match self.index_of(element) {
            Some(index) => {
                self.remove(index);
                true
            }
            None => false,
        }
    }

    /// Removes the element at `index`, replacing it with the last element.
    ///
    /// Announced as a single removal; the moved element stays a member.
    ///
    /// # Panics
    /// Panics if `index >= len`.
    pub fn swap_remove(&self, index: usize) -> Rc<T> {
        let value = self.data.borrow_mut().swap_remove(index);
        self.emit(CollectionChange::Removed {
            index,
            value: value.clone(),
        });
        value
    }

    // =========================================================================
    // REPLACE
    // =========================================================================

    /// Replaces the element at `index`, returning the old one.
    ///
    /// # Panics
    /// Panics if `index >= len`.
    pub fn set(&self, index: usize, value: Rc<T>) -> Rc<T> {
        let old = std::mem::replace(&mut self.data.borrow_mut()[index], value.clone());
        self.emit(CollectionChange::Replaced {
            index,
            old: old.clone(),
            new: value,
        });
        old
    }

    /// Replaces the element at `index` if it exists.
    pub fn try_set(&self, index: usize, value: Rc<T>) -> Option<Rc<T>> {
        if index < self.len() {
            Some(self.set(index, value))
        } else {
            None
        }
    }

    // =========================================================================
    // CLEAR / TRUNCATE / RETAIN
    // =========================================================================

    /// Removes all elements. Announced as a reset.
    pub fn clear(&self) {
        let removed = std::mem::take(&mut *self.data.borrow_mut());
        self.emit(CollectionChange::Reset);
        // Elements are released only after listeners saw the reset.
        drop(removed);
    }

    /// Keeps the first `len` elements, announcing each dropped one from the back.
    pub fn truncate(&self, len: usize) {
        while self.len() > len {
            self.pop();
        }
    }

    /// Retains only the elements matching `keep`.
    ///
    /// Each dropped element is announced with the index it had at the
    /// moment of its removal.
    pub fn retain<F>(&self, mut keep: F)
    where
        F: FnMut(&T) -> bool,
    {
        let mut index = 0;
        while let Some(item) = self.get(index) {
            if keep(&*item) {
                index += 1;
            } else {
                self.remove(index);
            }
        }
    }

    // =========================================================================
    // EXTEND
    // =========================================================================

    /// Appends every value, announcing each one.
    pub fn extend<I: IntoIterator<Item = T>>(&self, iter: I) {
        for value in iter {
            self.push(value);
        }
    }

    // =========================================================================
    // REORDER
    // =========================================================================

    /// Sorts the list. Announced as a reset.
    pub fn sort_by<F>(&self, mut compare: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        self.data.borrow_mut().sort_by(|a, b| compare(&**a, &**b));
        self.emit(CollectionChange::Reset);
    }

    /// Sorts the list by a key. Announced as a reset.
    pub fn sort_by_key<K, F>(&self, mut f: F)
    where
        F: FnMut(&T) -> K,
        K: Ord,
    {
        self.data.borrow_mut().sort_by_key(|item| f(&**item));
        self.emit(CollectionChange::Reset);
    }

    /// Reverses the list. Announced as a reset.
    pub fn reverse(&self) {
        self.data.borrow_mut().reverse();
        self.emit(CollectionChange::Reset);
    }

    /// Replaces all content at once. Announced as a reset.
    pub fn reset(&self, data: Vec<Rc<T>>) {
        let previous = std::mem::replace(&mut *self.data.borrow_mut(), data);
        self.emit(CollectionChange::Reset);
        drop(previous);
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    /// The change event source.
    pub fn changes(&self) -> &EventSource<CollectionChange<T>> {
        &self.changed
    }
}

impl<T: 'static> ObservableCollection for ObservableVec<T> {
    type Item = T;

    fn snapshot(&self) -> Vec<Rc<T>> {
        self.to_vec()
    }

    fn collection_changed(&self) -> &EventSource<CollectionChange<T>> {
        &self.changed
    }
}

impl<T: 'static> Default for ObservableVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> FromIterator<T> for ObservableVec<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for ObservableVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableVec")
            .field("data", &*self.data.borrow())
            .field("listeners", &self.changed.len())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collections::change::ChangeKind;

    fn values(vec: &ObservableVec<i32>) -> Vec<i32> {
        vec.to_vec().iter().map(|v| **v).collect()
    }

    fn record(vec: &ObservableVec<i32>) -> (Rc<RefCell<Vec<(ChangeKind, Option<usize>)>>>, crate::Subscription) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sub = vec.changes().subscribe({
            let log = log.clone();
            move |change: &CollectionChange<i32>| {
                log.borrow_mut().push((change.kind(), change.index()))
            }
        });
        (log, sub)
    }

    #[test]
    fn create_empty_vec() {
        let vec: ObservableVec<i32> = ObservableVec::new();
        assert_eq!(vec.len(), 0);
        assert!(vec.is_empty());
        assert!(ObservableVec::<i32>::with_capacity(4).is_empty());
    }

    #[test]
    fn create_from_vec() {
        let vec = ObservableVec::from_vec(vec![1, 2, 3]);
        assert_eq!(values(&vec), vec![1, 2, 3]);
        assert_eq!(vec.first().as_deref(), Some(&1));
        assert_eq!(vec.last().as_deref(), Some(&3));

        let collected: ObservableVec<i32> = (1..=2).collect();
        assert_eq!(values(&collected), vec![1, 2]);
    }

    #[test]
    fn push_and_pop_announce() {
        let vec: ObservableVec<i32> = ObservableVec::new();
        let (log, _sub) = record(&vec);

        vec.push(1);
        vec.push(2);
        assert_eq!(vec.pop().as_deref(), Some(&2));
        assert_eq!(vec.pop().as_deref(), Some(&1));
        assert!(vec.pop().is_none());

        assert_eq!(
            *log.borrow(),
            vec![
                (ChangeKind::Added, Some(0)),
                (ChangeKind::Added, Some(1)),
                (ChangeKind::Removed, Some(1)),
                (ChangeKind::Removed, Some(0)),
            ]
        );
    }

    #[test]
    fn insert_and_remove() {
        let vec = ObservableVec::from_vec(vec![1, 3, 4]);
        let (log, _sub) = record(&vec);

        vec.insert(1, Rc::new(2));
        assert_eq!(values(&vec), vec![1, 2, 3, 4]);

        assert_eq!(*vec.remove(2), 3);
        assert!(vec.try_remove(10).is_none());
        assert_eq!(values(&vec), vec![1, 2, 4]);

        assert_eq!(
            *log.borrow(),
            vec![(ChangeKind::Added, Some(1)), (ChangeKind::Removed, Some(2))]
        );
    }

    #[test]
    fn remove_item_uses_identity() {
        let vec: ObservableVec<i32> = ObservableVec::new();
        let a = vec.push(7);
        let twin = Rc::new(7);

        assert!(!vec.remove_item(&twin));
        assert!(vec.contains(&a));
        assert!(vec.remove_item(&a));
        assert!(vec.is_empty());
    }

    #[test]
    fn set_announces_replace() {
        let vec = ObservableVec::from_vec(vec![1, 2, 3]);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let _sub = vec.changes().subscribe({
            let seen = seen.clone();
            move |change: &CollectionChange<i32>| {
                if let CollectionChange::Replaced { old, new, .. } = change {
                    seen.borrow_mut().push((**old, **new));
                }
            }
        });

        let old = vec.set(1, Rc::new(20));
        assert_eq!(*old, 2);
        assert_eq!(vec.get(1).as_deref(), Some(&20));
        assert!(vec.try_set(9, Rc::new(0)).is_none());
        assert_eq!(*seen.borrow(), vec![(2, 20)]);
    }

    #[test]
    fn clear_and_reorder_reset() {
        let vec = ObservableVec::from_vec(vec![3, 1, 2]);
        let (log, _sub) = record(&vec);

        vec.sort_by(|a, b| a.cmp(b));
        assert_eq!(values(&vec), vec![1, 2, 3]);
        vec.reverse();
        assert_eq!(values(&vec), vec![3, 2, 1]);
        vec.sort_by_key(|v| *v);
        vec.clear();
        assert!(vec.is_empty());

        assert_eq!(log.borrow().len(), 4);
        assert!(log.borrow().iter().all(|(kind, _)| *kind == ChangeKind::Reset));
    }

    #[test]
    fn truncate_and_retain_announce_each_removal() {
        let vec = ObservableVec::from_vec(vec![1, 2, 3, 4, 5]);
        let (log, _sub) = record(&vec);

        vec.retain(|v| v % 2 == 1);
        assert_eq!(values(&vec), vec![1, 3, 5]);
        vec.truncate(1);
        assert_eq!(values(&vec), vec![1]);

        assert_eq!(
            *log.borrow(),
            vec![
                (ChangeKind::Removed, Some(1)),
                (ChangeKind::Removed, Some(2)),
                (ChangeKind::Removed, Some(2)),
                (ChangeKind::Removed, Some(1)),
            ]
        );
    }

    #[test]
    fn swap_remove() {
        let vec = ObservableVec::from_vec(vec![1, 2, 3, 4, 5]);
        let removed = vec.swap_remove(1);
        assert_eq!(*removed, 2);
        // 5 moved to index 1
        assert_eq!(values(&vec), vec![1, 5, 3, 4]);
    }

    #[test]
    fn extend_announces_each() {
        let vec = ObservableVec::from_vec(vec![1, 2]);
        let (log, _sub) = record(&vec);

        vec.extend([3, 4]);
        assert_eq!(values(&vec), vec![1, 2, 3, 4]);
        assert_eq!(
            *log.borrow(),
            vec![(ChangeKind::Added, Some(2)), (ChangeKind::Added, Some(3))]
        );
    }

    #[test]
    fn listener_sees_applied_state() {
        let vec = Rc::new(ObservableVec::<i32>::new());
        let lengths = Rc::new(RefCell::new(Vec::new()));
        let _sub = vec.changes().subscribe({
            let weak = Rc::downgrade(&vec);
            let lengths = lengths.clone();
            move |_: &CollectionChange<i32>| {
                if let Some(vec) = weak.upgrade() {
                    lengths.borrow_mut().push(vec.len());
                }
            }
        });

        vec.push(1);
        vec.push(2);
        vec.clear();
        assert_eq!(*lengths.borrow(), vec![1, 2, 0]);
    }

    #[test]
    fn listener_may_mutate_reentrantly() {
        let vec = Rc::new(ObservableVec::<i32>::new());
        let _sub = vec.changes().subscribe({
            let weak = Rc::downgrade(&vec);
            move |change: &CollectionChange<i32>| {
                if let (Some(vec), CollectionChange::Added { value, .. }) = (weak.upgrade(), change) {
                    if **value < 3 {
                        vec.push(**value + 1);
                    }
                }
            }
        });

        vec.push(1);
        assert_eq!(values(&vec), vec![1, 2, 3]);
    }

    #[test]
    fn snapshot_matches_contents() {
        let vec = ObservableVec::from_vec(vec![1, 2]);
        let snapshot = ObservableCollection::snapshot(&vec);
        assert_eq!(snapshot.len(), 2);
        assert!(Rc::ptr_eq(&snapshot[0], &vec.get(0).unwrap()));
    }

    #[test]
    fn debug_format() {
        let vec = ObservableVec::from_vec(vec![1, 2, 3]);
        let _sub = vec.changes().subscribe(|_| {});
        let debug = format!("{:?}", vec);
        assert!(debug.contains("ObservableVec"));
        assert!(debug.contains("[1, 2, 3]"));
        assert!(debug.contains("listeners: 1"));
    }
}
