//! An intrusive AVL tree.
#![cfg_attr(not(test), no_std)]

// Conventions used in comments:
// - The height of the subtree rooted at a node `x` is denoted `h(x)`. An empty subtree has height
//   -1 and a leaf has height 0.
// - The balance factor of `x` is `b(x) = h(right(x)) - h(left(x))`.
// - `x` is left-heavy if `b(x) < 0`, right-heavy if `b(x) > 0` and even otherwise.
//
// The fundamental invariants of an AVL tree are:
// 1. An in-order traversal yields strictly ascending keys.
// 2. Every node is left-heavy by one, even, or right-heavy by one.
//
// Corollaries:
// 3. A tree of `n` nodes has height at most ~1.44 log2(n + 2).
//
//    Proof sketch: the sparsest AVL tree of height `h` has `N(h) = N(h - 1) + N(h - 2) + 1` nodes,
//    a Fibonacci recurrence.
//
// 4. Rebalancing never needs to look further than one node beyond the path from the modified node
//    to the root, since (2) bounds the factor of every node off that path.
//
// Invariant (2) is only broken transiently, at exactly one node on the path being repaired, whose
// factor is then ±2.

use core::{
    borrow::Borrow, cell::UnsafeCell, cmp::Ordering, fmt, marker::PhantomPinned, mem, ops::Not,
    pin::Pin,
    ptr::{self, NonNull},
};

pub use cordyceps::Linked;
use tracing::trace;

mod balance;
mod debug;
mod entry;
mod error;
mod iter;
#[cfg(feature = "alloc")]
pub mod map;
#[cfg(all(any(test, feature = "model"), feature = "alloc"))]
pub mod model;
mod rebalance;
#[cfg(all(test, feature = "alloc"))]
mod tests;

pub use balance::Balance;
pub use entry::{Entry, OccupiedEntry, VacantEntry};
pub use error::KeyError;
pub use iter::Iter;
#[cfg(feature = "alloc")]
pub use map::AvlMap;

pub trait TreeNode<L>: Linked<L> {
    type Key: Ord;

    fn key(&self) -> &Self::Key;
}

/// An intrusive AVL tree.
///
/// Every node carries a balance factor in its [`Links`], which insertion and removal keep within
/// `-1..=1` by rotating at most `O(log(n))` nodes. Removal of a node with two children swaps it
/// with its in-order predecessor before unlinking it.
pub struct AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    root: Link<T>,
    len: usize,
}

pub struct Links<T: ?Sized> {
    inner: UnsafeCell<LinksInner<T>>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Dir {
    Left = 0,
    Right = 1,
}

impl Not for Dir {
    type Output = Dir;

    fn not(self) -> Self::Output {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

#[repr(C)]
struct LinksInner<T: ?Sized> {
    parent: Link<T>,
    children: [Link<T>; 2],
    balance: Balance,
    _unpin: PhantomPinned,
}

type Link<T> = Option<NonNull<T>>;

// Where a vacant key would be linked into the tree.
pub(crate) enum InsertAs<T: ?Sized> {
    Root,
    Child { parent: NonNull<T>, dir: Dir },
}

// SAFETY: The tree owns its elements through `T::Handle`, so it may move between threads whenever
// the elements may.
unsafe impl<T> Send for AvlTree<T> where T: TreeNode<Links<T>> + ?Sized + Send {}

// SAFETY: No method taking `&self` writes through a link.
unsafe impl<T> Sync for AvlTree<T> where T: TreeNode<Links<T>> + ?Sized + Sync {}

// SAFETY: Links are only written through the tree that owns the element they are part of.
unsafe impl<T: ?Sized + Send> Send for Links<T> {}
unsafe impl<T: ?Sized + Sync> Sync for Links<T> {}

impl<T> AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    /// Returns a new empty tree.
    pub const fn new() -> AvlTree<T> {
        AvlTree { root: None, len: 0 }
    }

    /// Returns `true` if the tree contains no elements.
    pub const fn is_empty(&self) -> bool {
        let empty = self.len() == 0;

        if cfg!(debug_assertions) {
            // Can't use assert_eq!() in const fn.
            assert!(empty == self.root.is_none());
        }

        empty
    }

    /// Returns the number of elements in the tree.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns the height of the tree, i.e. the number of edges on its longest root-to-leaf path.
    ///
    /// Returns `None` if the tree is empty. This operation completes in _O(log(n))_ time.
    pub fn height(&self) -> Option<usize> {
        let mut cur = self.root?;
        let mut height = 0;

        // The taller subtree of every node is on its heavy side.
        loop {
            let links = unsafe { self.links(cur) };

            let next = match links.balance().heavy_side() {
                Some(Dir::Right) => links.right(),
                _ => links.left(),
            };

            match next {
                Some(next) => {
                    cur = next;
                    height += 1;
                }
                None => return Some(height),
            }
        }
    }

    /// Returns a reference to the element corresponding to `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<Pin<&T>>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let ptr = self.get_raw(key)?;
        unsafe { Some(Pin::new_unchecked(ptr.as_ref())) }
    }

    /// Returns a pinned mutable reference to the element corresponding to `key`.
    ///
    /// The key of the element must not be modified in a way that changes its ordering relative to
    /// the keys of other elements.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<Pin<&mut T>>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut ptr = self.get_raw(key)?;
        unsafe { Some(Pin::new_unchecked(ptr.as_mut())) }
    }

    /// Returns `true` if the tree contains an element corresponding to `key`.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get_raw(key).is_some()
    }

    fn get_raw<Q>(&self, key: &Q) -> Link<T>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self.find_slot(key) {
            Ok(node) => Some(node),
            Err(_) => None,
        }
    }

    // Descends the tree looking for `key`.
    //
    // Returns the node holding `key`, or the position a node with that key would be linked at.
    fn find_slot<Q>(&self, key: &Q) -> Result<NonNull<T>, InsertAs<T>>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let Some(mut cur) = self.root else {
            return Err(InsertAs::Root);
        };

        loop {
            let dir = match key.cmp(unsafe { cur.as_ref() }.key().borrow()) {
                Ordering::Less => Dir::Left,
                Ordering::Equal => return Ok(cur),
                Ordering::Greater => Dir::Right,
            };

            match unsafe { self.links(cur) }.child(dir) {
                Some(child) => cur = child,
                None => return Err(InsertAs::Child { parent: cur, dir }),
            }
        }
    }

    /// Returns the entry corresponding to `key`, which is either vacant or occupied.
    pub fn entry<Q>(&mut self, key: &Q) -> Entry<'_, T>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self.find_slot(key) {
            Ok(node) => unsafe { Entry::occupied(self, node) },
            Err(insert_as) => unsafe { Entry::vacant(self, insert_as) },
        }
    }

    /// Returns the minimum element of the tree.
    pub fn first(&self) -> Option<Pin<&T>> {
        let first = self.first_raw()?;
        unsafe { Some(Pin::new_unchecked(first.as_ref())) }
    }

    /// Returns the maximum element of the tree.
    pub fn last(&self) -> Option<Pin<&T>> {
        let last = self.last_raw()?;
        unsafe { Some(Pin::new_unchecked(last.as_ref())) }
    }

    /// Returns the element with the greatest key less than `key`.
    ///
    /// `key` does not need to be present in the tree.
    pub fn predecessor<Q>(&self, key: &Q) -> Option<Pin<&T>>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let ptr = self.neighbor_of_key(key, Dir::Left)?;
        unsafe { Some(Pin::new_unchecked(ptr.as_ref())) }
    }

    /// Returns the element with the least key greater than `key`.
    ///
    /// `key` does not need to be present in the tree.
    pub fn successor<Q>(&self, key: &Q) -> Option<Pin<&T>>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let ptr = self.neighbor_of_key(key, Dir::Right)?;
        unsafe { Some(Pin::new_unchecked(ptr.as_ref())) }
    }

    /// Returns an iterator over the elements of the tree in ascending key order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self)
    }

    pub(crate) fn first_raw(&self) -> Link<T> {
        self.root
            .map(|root| unsafe { self.extreme_in_subtree(root, Dir::Left) })
    }

    pub(crate) fn last_raw(&self) -> Link<T> {
        self.root
            .map(|root| unsafe { self.extreme_in_subtree(root, Dir::Right) })
    }

    // Returns the in-order neighbor of `key` in direction `dir`: the predecessor for `Dir::Left`,
    // the successor for `Dir::Right`.
    fn neighbor_of_key<Q>(&self, key: &Q, dir: Dir) -> Link<T>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut best = None;
        let mut opt_cur = self.root;

        while let Some(cur) = opt_cur {
            unsafe {
                let toward = match key.cmp(cur.as_ref().key().borrow()) {
                    Ordering::Less => Dir::Left,
                    Ordering::Greater => Dir::Right,
                    Ordering::Equal => {
                        return self
                            .links(cur)
                            .child(dir)
                            .map(|child| self.extreme_in_subtree(child, !dir))
                            .or(best);
                    }
                };

                // Moving away from `dir` passes a node lying in direction `dir` of `key`.
                if toward == !dir {
                    best = Some(cur);
                }

                opt_cur = self.links(cur).child(toward);
            }
        }

        best
    }

    #[inline]
    pub(crate) unsafe fn predecessor_raw(&self, node: NonNull<T>) -> Link<T> {
        unsafe { self.neighbor_raw(node, Dir::Left) }
    }

    #[inline]
    pub(crate) unsafe fn successor_raw(&self, node: NonNull<T>) -> Link<T> {
        unsafe { self.neighbor_raw(node, Dir::Right) }
    }

    // Returns the in-order neighbor of `node` in direction `dir`.
    unsafe fn neighbor_raw(&self, node: NonNull<T>, dir: Dir) -> Link<T> {
        unsafe {
            // The neighbor is the nearest node of the subtree in direction `dir`, if there is one.
            if let Some(child) = self.links(node).child(dir) {
                return Some(self.extreme_in_subtree(child, !dir));
            }

            // Otherwise, it is the first ancestor reached from its `!dir` side.
            let mut cur = node;
            while let Some(parent) = self.links(cur).parent() {
                if self.which_child(parent, cur) == !dir {
                    return Some(parent);
                }

                cur = parent;
            }

            None
        }
    }

    // Returns the last node reached by following `dir` links from `root`.
    #[inline]
    unsafe fn extreme_in_subtree(&self, root: NonNull<T>, dir: Dir) -> NonNull<T> {
        let mut cur = root;

        while let Some(next) = unsafe { self.links(cur).child(dir) } {
            cur = next;
        }

        cur
    }

    /// Inserts an item into the tree.
    ///
    /// If the tree already contains an element with an equal key, `item` takes its place and the
    /// previous element is returned.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn insert(&mut self, item: T::Handle) -> Option<T::Handle> {
        let ptr = T::into_ptr(item);

        // SAFETY: `ptr` was just produced from a handle, and is not linked into any tree.
        unsafe {
            match self.find_slot(ptr.as_ref().key()) {
                Ok(existing) => Some(self.replace_at(existing, ptr)),
                Err(insert_as) => {
                    self.insert_at(insert_as, ptr);
                    None
                }
            }
        }
    }

    // Links `node` into the tree at `insert_as` and restores balance.
    //
    // # Safety
    //
    // The caller must ensure that `insert_as` was produced by `find_slot` for `node`'s key, and
    // that the tree has not been modified since.
    pub(crate) unsafe fn insert_at(&mut self, insert_as: InsertAs<T>, node: NonNull<T>) {
        unsafe {
            self.links_mut(node).clear();

            match insert_as {
                InsertAs::Root => {
                    debug_assert!(self.root.is_none(), "tree must be empty to insert a root");
                    self.root = Some(node);
                }

                InsertAs::Child { parent, dir } => {
                    debug_assert!(
                        self.links(parent).child(dir).is_none(),
                        "insertion slot must be vacant"
                    );

                    self.links_mut(parent).set_child(dir, Some(node));
                    self.links_mut(node).set_parent(Some(parent));
                    self.rebalance_inserted(node);
                }
            }
        }

        self.len += 1;
    }

    // Links `new` into the position held by `old`, unlinks `old`, and returns its handle.
    //
    // # Safety
    //
    // The caller must ensure that `old` is an element of `self`, that `new` is not an element of
    // any tree, and that their keys are equal.
    pub(crate) unsafe fn replace_at(&mut self, old: NonNull<T>, new: NonNull<T>) -> T::Handle {
        unsafe {
            let old_links = self.links(old);
            let parent = old_links.parent();
            let left = old_links.left();
            let right = old_links.right();
            let balance = old_links.balance();

            self.replace_child_or_set_root(parent, old, Some(new));
            self.maybe_set_parent(left, Some(new));
            self.maybe_set_parent(right, Some(new));

            let new_links = self.links_mut(new);
            new_links.set_parent(parent);
            new_links.set_left(left);
            new_links.set_right(right);
            new_links.set_balance(balance);

            self.links_mut(old).clear();

            T::from_ptr(old)
        }
    }

    /// Removes the element corresponding to `key` from the tree, returning it.
    ///
    /// Returns `None` and leaves the tree untouched if no element corresponds to `key`.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<T::Handle>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let node = self.get_raw(key)?;
        Some(unsafe { self.remove_at(node) })
    }

    /// Removes and returns the minimum element of the tree.
    pub fn pop_first(&mut self) -> Option<T::Handle> {
        let first = self.first_raw()?;
        Some(unsafe { self.remove_at(first) })
    }

    /// Removes and returns the maximum element of the tree.
    pub fn pop_last(&mut self) -> Option<T::Handle> {
        let last = self.last_raw()?;
        Some(unsafe { self.remove_at(last) })
    }

    /// Removes an arbitrary node from the tree.
    ///
    /// # Safety
    ///
    /// It is the caller's responsibility to ensure that `node` is an element of `self`, and not any
    /// other tree.
    pub unsafe fn remove_at(&mut self, node: NonNull<T>) -> T::Handle {
        // There are three possible cases:
        //
        // 1. `node` has two children.
        //
        //    In this case `node` trades places (and balance factors) with its predecessor[^1]. The
        //    predecessor by definition has no right child, so `node` now has at most one child and
        //    this reduces to case 2 or 3.
        //
        // 2. `node` has one child.
        //
        //    The child is a leaf, since `node` is at most one-heavy. It is elevated to replace
        //    `node`.
        //
        // 3. `node` is a leaf.
        //
        //    It is unlinked from its parent.
        //
        // In every case, the subtree on one side of `node`'s parent lost one level of height, which
        // the removal rebalance walks up the tree from there.
        //
        // [^1]: The predecessor of a node `a` is the greatest node in `a`'s left subtree.

        unsafe {
            if let (Some(left), Some(_)) = (self.links(node).left(), self.links(node).right()) {
                let predecessor = self.extreme_in_subtree(left, Dir::Right);
                trace!("swapping removed node with its predecessor");
                self.swap_positions(node, predecessor);
            }

            let links = self.links(node);
            let parent = links.parent();
            let child = links.left().or(links.right());
            let side = parent.map(|p| self.which_child(p, node));

            self.replace_child_or_set_root(parent, node, child);
            self.maybe_set_parent(child, parent);

            self.links_mut(node).clear();
            self.len -= 1;

            if let (Some(parent), Some(side)) = (parent, side) {
                self.rebalance_removed(parent, side);
            }

            T::from_ptr(node)
        }
    }

    /// Clears the tree, removing all elements.
    pub fn clear(&mut self) {
        let mut opt_cur = self.root;

        while let Some(cur) = opt_cur {
            unsafe {
                // Descend to the minimum node.
                let cur = self.extreme_in_subtree(cur, Dir::Left);
                let parent = self.links(cur).parent();
                let right = self.links(cur).right();

                // Elevate the node's right child (which may be None).
                self.replace_child_or_set_root(parent, cur, right);
                self.maybe_set_parent(right, parent);

                // Drop the node.
                self.links_mut(cur).clear();
                drop(T::from_ptr(cur));
                self.len -= 1;

                // If the node had no right child, climb to the parent. If the node had no parent,
                // the tree is empty.
                opt_cur = right.or(parent);
            }
        }

        debug_assert!(self.root.is_none());
        debug_assert_eq!(self.len(), 0);
    }

    // Exchanges the positions of `a` and `b` in the tree, along with their balance factors.
    //
    // Each node keeps its own key, so the ordering invariant only survives if no other key lies
    // between the two.
    //
    // # Safety
    //
    // The caller must ensure that `a` and `b` are distinct elements of `self`.
    unsafe fn swap_positions(&mut self, a: NonNull<T>, b: NonNull<T>) {
        debug_assert_ne!(a, b);

        // Links that pointed at one of the pair must point at the other once they trade places.
        let swapped = |link: Link<T>| match link {
            Some(n) if ptr::addr_eq(n.as_ptr(), a.as_ptr()) => Some(b),
            Some(n) if ptr::addr_eq(n.as_ptr(), b.as_ptr()) => Some(a),
            other => other,
        };

        unsafe {
            let a_parent = self.links(a).parent();
            let b_parent = self.links(b).parent();
            let a_side = a_parent.map(|p| self.which_child(p, a));
            let b_side = b_parent.map(|p| self.which_child(p, b));

            let a_inner = self.links_mut(a).inner.get_mut();
            let b_inner = self.links_mut(b).inner.get_mut();
            mem::swap(a_inner, b_inner);

            for inner in [a_inner, b_inner] {
                inner.parent = swapped(inner.parent);
                inner.children = inner.children.map(swapped);
            }

            for (node, side) in [(a, b_side), (b, a_side)] {
                match (self.links(node).parent(), side) {
                    (Some(parent), Some(side)) => {
                        self.links_mut(parent).set_child(side, Some(node));
                    }
                    (None, _) => self.root = Some(node),
                    (Some(_), None) => unreachable!("a node with a parent must have a side"),
                }

                for dir in [Dir::Left, Dir::Right] {
                    self.maybe_set_parent(self.links(node).child(dir), Some(node));
                }
            }
        }
    }

    // Support methods ========================================================

    #[inline]
    pub(crate) unsafe fn links<'a>(&self, node: NonNull<T>) -> &'a Links<T> {
        unsafe { T::links(node).as_ref() }
    }

    #[inline]
    pub(crate) unsafe fn links_mut<'a>(&mut self, node: NonNull<T>) -> &'a mut Links<T> {
        unsafe { T::links(node).as_mut() }
    }

    #[inline]
    pub(crate) unsafe fn maybe_set_parent(&mut self, opt_node: Link<T>, parent: Link<T>) {
        let Some(node) = opt_node else {
            return;
        };

        unsafe { self.links_mut(node).set_parent(parent) };
    }

    #[inline]
    pub(crate) unsafe fn replace_child_or_set_root(
        &mut self,
        parent: Link<T>,
        old_child: NonNull<T>,
        new_child: Link<T>,
    ) {
        match parent {
            Some(parent) => unsafe { self.replace_child(parent, old_child, new_child) },
            None => self.root = new_child,
        }
    }

    // Replaces the child pointer of `parent` pointing at `old_child` with `new_child`.
    //
    // `new_child`'s parent pointer is not updated.
    //
    // # Safety
    //
    // The caller must ensure that the following conditions hold:
    // - `old_child` is a child node of `parent`.
    // - `new_child` is not a child node of `parent`.
    unsafe fn replace_child(
        &mut self,
        parent: NonNull<T>,
        old_child: NonNull<T>,
        new_child: Link<T>,
    ) {
        unsafe {
            let dir = self.which_child(parent, old_child);

            debug_assert!(
                new_child.is_none() || self.links(parent).child(!dir) != new_child,
                "`new_child` must not be a child of `parent`"
            );

            self.links_mut(parent).set_child(dir, new_child);
        }
    }

    #[inline]
    #[track_caller]
    pub(crate) unsafe fn which_child(&self, parent: NonNull<T>, child: NonNull<T>) -> Dir {
        unsafe {
            let links = self.links(parent);

            if links.left() == Some(child) {
                Dir::Left
            } else if links.right() == Some(child) {
                Dir::Right
            } else {
                unreachable!("`child` must be a child of `parent`")
            }
        }
    }
}

impl<T> AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
    T::Key: fmt::Debug,
{
    #[doc(hidden)]
    #[track_caller]
    pub fn assert_invariants(&self) {
        let mut count = 0;

        if let Some(root) = self.root {
            unsafe {
                assert_eq!(self.links(root).parent(), None, "root must not have a parent");
                self.assert_invariants_at(root, &mut count);
            }
        }

        assert_eq!(count, self.len, "length does not match the number of linked nodes");

        // Also exercises successor lookup across subtree boundaries.
        let mut keys = self.iter().map(|node| node.key());
        if let Some(mut prev) = keys.next() {
            for key in keys {
                assert!(prev < key, "keys out of order: {prev:?} before {key:?}");
                prev = key;
            }
        }
    }

    // Checks the subtree rooted at `node` and returns its height.
    unsafe fn assert_invariants_at(&self, node: NonNull<T>, count: &mut usize) -> i32 {
        *count += 1;

        unsafe {
            let key = node.as_ref().key();
            let mut heights = [-1; 2];

            for dir in [Dir::Left, Dir::Right] {
                if let Some(child) = self.links(node).child(dir) {
                    // Ensure child's parent link points to this node.
                    let parent = self
                        .links(child)
                        .parent()
                        .expect("child parent pointer not set");
                    assert_eq!(node, parent, "child of {key:?} points at another parent");

                    let expected = match dir {
                        Dir::Left => Ordering::Less,
                        Dir::Right => Ordering::Greater,
                    };
                    let child_key = child.as_ref().key();
                    assert_eq!(
                        child_key.cmp(key),
                        expected,
                        "{child_key:?} is on the wrong side of {key:?}"
                    );

                    heights[dir as usize] = self.assert_invariants_at(child, count);
                }
            }

            // Ensure the stored balance factor is exact and within bounds.
            let balance = self.links(node).balance();
            assert!(balance.is_valid(), "{key:?} is unbalanced ({balance})");
            assert_eq!(
                i32::from(balance.get()),
                heights[Dir::Right as usize] - heights[Dir::Left as usize],
                "balance factor of {key:?} does not match its subtree heights"
            );

            1 + heights[0].max(heights[1])
        }
    }
}

impl<T> Default for AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for AvlTree<T>
where
    T: TreeNode<Links<T>> + fmt::Debug + ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'tree, T> IntoIterator for &'tree AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    type Item = &'tree T;
    type IntoIter = Iter<'tree, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T> Drop for AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T: ?Sized> Links<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: UnsafeCell::new(LinksInner {
                parent: None,
                children: [None; 2],
                balance: Balance::EVEN,
                _unpin: PhantomPinned,
            }),
        }
    }

    /// Returns the balance factor of the node these links belong to.
    #[inline]
    pub fn balance(&self) -> Balance {
        unsafe { (*self.inner.get()).balance }
    }

    #[inline]
    fn is_leaf(&self) -> bool {
        self.left().is_none() && self.right().is_none()
    }

    #[inline]
    fn parent(&self) -> Link<T> {
        unsafe { (*self.inner.get()).parent }
    }

    #[inline]
    fn child(&self, dir: Dir) -> Link<T> {
        unsafe { (*self.inner.get()).children[dir as usize] }
    }

    #[inline]
    fn left(&self) -> Link<T> {
        self.child(Dir::Left)
    }

    #[inline]
    fn right(&self) -> Link<T> {
        self.child(Dir::Right)
    }

    #[inline]
    fn set_parent(&mut self, parent: Link<T>) -> Link<T> {
        mem::replace(&mut self.inner.get_mut().parent, parent)
    }

    #[inline]
    fn set_child(&mut self, dir: Dir, child: Link<T>) -> Link<T> {
        mem::replace(&mut self.inner.get_mut().children[dir as usize], child)
    }

    #[inline]
    fn set_left(&mut self, left: Link<T>) -> Link<T> {
        self.set_child(Dir::Left, left)
    }

    #[inline]
    fn set_right(&mut self, right: Link<T>) -> Link<T> {
        self.set_child(Dir::Right, right)
    }

    #[inline]
    fn set_balance(&mut self, balance: Balance) {
        self.inner.get_mut().balance = balance;
    }

    // Unlinks these links from any tree and resets the balance factor.
    #[inline]
    fn clear(&mut self) {
        let inner = self.inner.get_mut();
        inner.parent = None;
        inner.children = [None; 2];
        inner.balance = Balance::EVEN;
    }
}

impl<T: ?Sized> Default for Links<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for Links<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Links")
            .field("parent", &self.parent())
            .field("left", &self.left())
            .field("right", &self.right())
            .field("balance", &self.balance())
            .finish()
    }
}
