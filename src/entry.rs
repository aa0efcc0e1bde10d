use core::{pin::Pin, ptr::NonNull};

use crate::{AvlTree, InsertAs, Links, TreeNode};

/// A view into a single entry in an [`AvlTree`], which may be either vacant or occupied.
///
/// Returned by [`AvlTree::entry`]. Either way, the tree has already been searched, so completing
/// the entry does not descend the tree again.
pub enum Entry<'tree, T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    Vacant(VacantEntry<'tree, T>),
    Occupied(OccupiedEntry<'tree, T>),
}

impl<'tree, T> Entry<'tree, T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    pub(crate) unsafe fn vacant(tree: &'tree mut AvlTree<T>, insert_as: InsertAs<T>) -> Self {
        Entry::Vacant(VacantEntry { tree, insert_as })
    }

    pub(crate) unsafe fn occupied(tree: &'tree mut AvlTree<T>, node: NonNull<T>) -> Self {
        Entry::Occupied(OccupiedEntry { tree, node })
    }

    /// Returns `true` if the tree already holds an element for this entry's key.
    pub fn is_occupied(&self) -> bool {
        matches!(self, Entry::Occupied(_))
    }
}

/// A view into a vacant entry in an [`AvlTree`].
pub struct VacantEntry<'tree, T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    tree: &'tree mut AvlTree<T>,
    insert_as: InsertAs<T>,
}

impl<'tree, T> VacantEntry<'tree, T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    /// Inserts `item` at the key associated with this entry and rebalances the tree.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the key returned by `item.key()` is equal to the key used to
    /// retrieve this entry.
    pub unsafe fn insert(self, item: T::Handle) -> Pin<&'tree mut T> {
        let mut ptr = T::into_ptr(item);

        unsafe {
            self.tree.insert_at(self.insert_as, ptr);
            Pin::new_unchecked(ptr.as_mut())
        }
    }
}

/// A view into an occupied entry in an [`AvlTree`].
pub struct OccupiedEntry<'tree, T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    tree: &'tree mut AvlTree<T>,
    node: NonNull<T>,
}

impl<'tree, T> OccupiedEntry<'tree, T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    /// Returns a reference to the item in the entry.
    pub fn get(&self) -> Pin<&T> {
        // SAFETY: `self.tree` is mutably borrowed for `'tree`, and `self.node` is guaranteed pinned
        // by contract with `Linked`.
        unsafe { Pin::new_unchecked(self.node.as_ref()) }
    }

    /// Returns a pinned mutable reference to the item in the entry.
    ///
    /// The key of the item must not be modified in a way that changes its ordering relative to the
    /// keys of other items.
    pub fn get_mut(&mut self) -> Pin<&mut T> {
        // SAFETY: as for `get`, and `self` is mutably borrowed for the returned lifetime.
        unsafe { Pin::new_unchecked(self.node.as_mut()) }
    }

    /// Converts the entry into a pinned mutable reference to its item, bound to the lifetime of
    /// the tree borrow.
    pub fn into_mut(mut self) -> Pin<&'tree mut T> {
        unsafe { Pin::new_unchecked(self.node.as_mut()) }
    }

    /// Inserts a new item into the entry, returning the previous item.
    ///
    /// The new item takes over the position and balance factor of the previous one, so the shape
    /// of the tree does not change.
    ///
    /// # Safety
    ///
    /// The caller must ensure that `item`'s key is equivalent to the key of the existing item.
    pub unsafe fn insert(&mut self, item: T::Handle) -> T::Handle {
        let new_ptr = T::into_ptr(item);
        let old_ptr = self.node;

        // Point this entry at the new item.
        self.node = new_ptr;

        unsafe { self.tree.replace_at(old_ptr, new_ptr) }
    }

    /// Removes and returns the item pointed to by this entry, rebalancing the tree.
    pub fn remove(self) -> T::Handle {
        unsafe { self.tree.remove_at(self.node) }
    }
}
