#![forbid(unsafe_code)]

//! List-shaped binders: per-index item binders and structural edits.
//!
//! Every structural edit reads the whole collection, builds a replacement,
//! and writes it back through the binder. Nothing mutates the collection in
//! place, so the round-trip contract of [`Binder`] holds for list edits too.
//!
//! # Collection kinds
//!
//! | Type | Growable | Item writes |
//! |------|----------|-------------|
//! | `Vec<T>` | yes | yes |
//! | `[T; N]` | no (fixed size) | yes |
//! | `Rc<[T]>` | no (read-only) | no |
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Stale item binder | Parent shrank below the index | Reads `None`, writes `IndexOutOfRange` |
//! | Edit on fixed-size list | `[T; N]` | `BindError::FixedSize` |
//! | Edit on read-only list | `Rc<[T]>` or read-only binder | `BindError::ReadOnly` |

use std::rc::Rc;

use crate::binder::Binder;
use crate::error::BindError;

// ---------------------------------------------------------------------------
// ListValue
// ---------------------------------------------------------------------------

/// A collection value a list binder can address by index.
pub trait ListValue: Clone + 'static {
    type Item: Clone + 'static;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn item(&self, index: usize) -> Option<Self::Item>;

    /// Copy of `self` with `index` replaced by `item`.
    fn with_item(self, index: usize, item: Self::Item) -> Result<Self, BindError>;

    /// Copy of `self` with `item` inserted before `index`.
    fn inserted(self, index: usize, item: Self::Item) -> Result<Self, BindError>;

    /// Copy of `self` without the item at `index`.
    fn removed(self, index: usize) -> Result<Self, BindError>;

    /// Copy of `self` with the item at `from` moved to `to`.
    fn moved(self, from: usize, to: usize) -> Result<Self, BindError> {
        let item = self.item(from).ok_or(BindError::IndexOutOfRange {
            index: from,
            len: self.len(),
        })?;
        self.removed(from)?.inserted(to, item)
    }

    /// Whether items can be written at all.
    fn is_read_only(&self) -> bool {
        false
    }

    /// Whether the length can change.
    fn is_fixed_size(&self) -> bool {
        false
    }
}

fn check_index(index: usize, len: usize) -> Result<(), BindError> {
    if index < len {
        Ok(())
    } else {
        Err(BindError::IndexOutOfRange { index, len })
    }
}

impl<T: Clone + 'static> ListValue for Vec<T> {
    type Item = T;

    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn item(&self, index: usize) -> Option<T> {
        self.get(index).cloned()
    }

    fn with_item(mut self, index: usize, item: T) -> Result<Self, BindError> {
        check_index(index, self.len())?;
        self[index] = item;
        Ok(self)
    }

    fn inserted(mut self, index: usize, item: T) -> Result<Self, BindError> {
        if index > self.len() {
            return Err(BindError::IndexOutOfRange {
                index,
                len: self.len(),
            });
        }
        self.insert(index, item);
        Ok(self)
    }

    fn removed(mut self, index: usize) -> Result<Self, BindError> {
        check_index(index, self.len())?;
        self.remove(index);
        Ok(self)
    }
}

impl<T: Clone + 'static, const N: usize> ListValue for [T; N] {
    type Item = T;

    fn len(&self) -> usize {
        N
    }

    fn item(&self, index: usize) -> Option<T> {
        self.get(index).cloned()
    }

    fn with_item(mut self, index: usize, item: T) -> Result<Self, BindError> {
        check_index(index, N)?;
        self[index] = item;
        Ok(self)
    }

    fn inserted(self, _index: usize, _item: T) -> Result<Self, BindError> {
        Err(BindError::FixedSize)
    }

    fn removed(self, _index: usize) -> Result<Self, BindError> {
        Err(BindError::FixedSize)
    }

    fn moved(mut self, from: usize, to: usize) -> Result<Self, BindError> {
        check_index(from, N)?;
        check_index(to, N)?;
        if from < to {
            self[from..=to].rotate_left(1);
        } else {
            self[to..=from].rotate_right(1);
        }
        Ok(self)
    }

    fn is_fixed_size(&self) -> bool {
        true
    }
}

impl<T: Clone + 'static> ListValue for Rc<[T]> {
    type Item = T;

    fn len(&self) -> usize {
        <[T]>::len(self)
    }

    fn item(&self, index: usize) -> Option<T> {
        self.get(index).cloned()
    }

    fn with_item(self, _index: usize, _item: T) -> Result<Self, BindError> {
        Err(BindError::ReadOnly)
    }

    fn inserted(self, _index: usize, _item: T) -> Result<Self, BindError> {
        Err(BindError::ReadOnly)
    }

    fn removed(self, _index: usize) -> Result<Self, BindError> {
        Err(BindError::ReadOnly)
    }

    fn is_read_only(&self) -> bool {
        true
    }

    fn is_fixed_size(&self) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// ListBinder
// ---------------------------------------------------------------------------

/// Index-addressed access and structural edits on a list binder.
pub trait ListBinder<L: ListValue> {
    /// Live length; a null list has length 0.
    fn list_len(&self) -> usize;

    /// Child binder for `index`, reading through the current collection.
    fn item_binder(&self, index: usize) -> Binder<L::Item>;

    /// Binder read-only OR collection read-only.
    fn is_list_read_only(&self) -> bool;

    fn is_list_fixed_size(&self) -> bool;

    /// Insert a copy of item `index` right after it.
    ///
    /// Past the end, a copy of the last item is appended; an empty list gets
    /// `Item::default()`.
    fn duplicate_item(&self, index: usize) -> Result<(), BindError>
    where
        L::Item: Default;

    fn remove_item(&self, index: usize) -> Result<(), BindError>;

    fn push_item(&self, item: L::Item) -> Result<(), BindError>;

    fn move_item(&self, from: usize, to: usize) -> Result<(), BindError>;
}

impl<L: ListValue> ListBinder<L> for Binder<L> {
    fn list_len(&self) -> usize {
        self.try_get().map_or(0, |list| list.len())
    }

    fn item_binder(&self, index: usize) -> Binder<L::Item> {
        self.child(
            move |list: &L| list.item(index),
            move |list: L, item| list.with_item(index, item),
        )
    }

    fn is_list_read_only(&self) -> bool {
        self.is_read_only() || self.try_get().is_some_and(|list| list.is_read_only())
    }

    fn is_list_fixed_size(&self) -> bool {
        self.try_get().is_some_and(|list| list.is_fixed_size())
    }

    fn duplicate_item(&self, index: usize) -> Result<(), BindError>
    where
        L::Item: Default,
    {
        let list = self.try_get().ok_or(BindError::Null)?;
        let (at, item) = match list.item(index) {
            Some(item) => (index + 1, item),
            None => {
                let len = list.len();
                let last = len.checked_sub(1).and_then(|i| list.item(i));
                (len, last.unwrap_or_default())
            }
        };
        let replaced = list.inserted(at, item)?;
        tracing::debug!(index, at, "duplicated list item");
        self.set(replaced)
    }

    fn remove_item(&self, index: usize) -> Result<(), BindError> {
        let list = self.try_get().ok_or(BindError::Null)?;
        let replaced = list.removed(index)?;
        tracing::debug!(index, "removed list item");
        self.set(replaced)
    }

    fn push_item(&self, item: L::Item) -> Result<(), BindError> {
        let list = self.try_get().ok_or(BindError::Null)?;
        let len = list.len();
        self.set(list.inserted(len, item)?)
    }

    fn move_item(&self, from: usize, to: usize) -> Result<(), BindError> {
        let list = self.try_get().ok_or(BindError::Null)?;
        let len = list.len();
        check_index(from, len)?;
        check_index(to, len)?;
        if from == to {
            return Ok(());
        }
        let replaced = list.moved(from, to)?;
        tracing::debug!(from, to, "moved list item");
        self.set(replaced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::cell::RefCell;

    fn vec_binder(values: Vec<i32>) -> (Rc<RefCell<Vec<i32>>>, Binder<Vec<i32>>) {
        let cell = Rc::new(RefCell::new(values));
        let binder = Binder::from_cell(Rc::clone(&cell));
        (cell, binder)
    }

    #[test]
    fn duplicate_inserts_copy_after_index() {
        let (cell, binder) = vec_binder(vec![10, 20]);
        binder.duplicate_item(1).unwrap();
        assert_eq!(*cell.borrow(), vec![10, 20, 20]);
    }

    #[test]
    fn duplicate_on_empty_list_appends_default() {
        let (cell, binder) = vec_binder(Vec::new());
        binder.duplicate_item(0).unwrap();
        assert_eq!(*cell.borrow(), vec![0]);
    }

    #[test]
    fn remove_and_move() {
        let (cell, binder) = vec_binder(vec![1, 2, 3]);
        binder.remove_item(0).unwrap();
        assert_eq!(*cell.borrow(), vec![2, 3]);
        binder.move_item(0, 1).unwrap();
        assert_eq!(*cell.borrow(), vec![3, 2]);
        binder.push_item(7).unwrap();
        assert_eq!(*cell.borrow(), vec![3, 2, 7]);
    }

    #[test]
    fn stale_item_binder_does_not_resurrect_index() {
        let (cell, binder) = vec_binder(vec![1, 2, 3]);
        let third = binder.item_binder(2);
        *cell.borrow_mut() = vec![1];

        assert_eq!(third.try_get(), None);
        assert_eq!(third.get(), 0);
        assert_eq!(
            third.set(9),
            Err(BindError::IndexOutOfRange { index: 2, len: 1 })
        );
        assert_eq!(*cell.borrow(), vec![1]);
    }

    #[test]
    fn fixed_size_array_rejects_structural_edits() {
        let cell = Rc::new(RefCell::new([1, 2]));
        let binder = Binder::from_cell(Rc::clone(&cell));
        assert!(binder.is_list_fixed_size());
        assert!(!binder.is_list_read_only());
        assert_eq!(binder.duplicate_item(0), Err(BindError::FixedSize));
        binder.item_binder(1).set(5).unwrap();
        assert_eq!(*cell.borrow(), [1, 5]);
        binder.move_item(0, 1).unwrap();
        assert_eq!(*cell.borrow(), [5, 1]);
    }

    #[test]
    fn rc_slice_is_read_only() {
        let list: Rc<[i32]> = Rc::from(vec![1, 2]);
        let binder = Binder::from_cell(Rc::new(RefCell::new(list)));
        assert!(binder.is_list_read_only());
        assert_eq!(binder.item_binder(0).set(3), Err(BindError::ReadOnly));
        assert_eq!(binder.remove_item(0), Err(BindError::ReadOnly));
    }

    #[test]
    fn read_only_binder_makes_list_read_only() {
        let binder = Binder::constant(vec![1, 2]);
        assert!(binder.is_list_read_only());
        assert_eq!(binder.push_item(3), Err(BindError::ReadOnly));
    }

    proptest! {
        #[test]
        fn item_write_then_read_round_trips(
            values in proptest::collection::vec(any::<i32>(), 1..16),
            pick in any::<prop::sample::Index>(),
            v in any::<i32>(),
        ) {
            let (_cell, binder) = vec_binder(values.clone());
            let index = pick.index(values.len());
            let item = binder.item_binder(index);
            item.set(v).unwrap();
            prop_assert_eq!(item.get(), v);
            prop_assert_eq!(binder.list_len(), values.len());
        }

        #[test]
        fn shrunk_parent_never_resurrects(
            len in 1usize..16,
            keep in 0usize..16,
        ) {
            let keep = keep.min(len - 1);
            let (cell, binder) = vec_binder((0..len as i32).collect());
            let last = binder.item_binder(len - 1);
            cell.borrow_mut().truncate(keep);
            prop_assert_eq!(last.try_get(), None);
            prop_assert!(last.set(1).is_err());
            prop_assert_eq!(binder.list_len(), keep);
        }
    }
}
