use core::ptr::NonNull;

use tracing::trace;

use crate::{AvlTree, Balance, Dir, Links, TreeNode};

impl<T> AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    // Performs a rotation in direction `dir` at `down`, moving its `!dir` child `up` into its place
    // and `down` into the `dir` child slot of `up`. The `dir` child of `up` moves across to become
    // the `!dir` child of `down`.
    //
    // Balance factors of `down` and `up` are recomputed; no other node's factor changes. Returns
    // `up`, the new root of the subtree.
    //
    // # Safety
    //
    // The caller must ensure that `down` is an element of `self`.
    #[track_caller]
    unsafe fn rotate(&mut self, down: NonNull<T>, dir: Dir) -> NonNull<T> {
        unsafe {
            let up = self
                .links(down)
                .child(!dir)
                .expect("rotation requires a child to lift");

            let across = self.links(up).child(dir);
            let parent = self.links(down).parent();

            self.links_mut(down).set_child(!dir, across);
            self.maybe_set_parent(across, Some(down));

            self.replace_child_or_set_root(parent, down, Some(up));
            self.links_mut(up).set_parent(parent);

            self.links_mut(up).set_child(dir, Some(down));
            self.links_mut(down).set_parent(Some(up));

            let (down_balance, up_balance) =
                Balance::rotated(self.links(down).balance(), self.links(up).balance(), dir);
            self.links_mut(down).set_balance(down_balance);
            self.links_mut(up).set_balance(up_balance);

            trace!(?dir, %down_balance, %up_balance, "rotated");

            up
        }
    }

    // Restores balance at `node`, whose balance factor is ±2.
    //
    // Performs a single rotation if the child on the heavy side leans the same way or is even,
    // and a double rotation otherwise. Returns the new root of the subtree and whether its height
    // is one less than it was with `node` as root.
    //
    // # Safety
    //
    // The caller must ensure that `node` is an element of `self`, and that every other node in its
    // subtree is at most one-heavy.
    #[track_caller]
    unsafe fn repair(&mut self, node: NonNull<T>) -> (NonNull<T>, bool) {
        unsafe {
            let balance = self.links(node).balance();
            debug_assert!(!balance.is_valid(), "repair of a balanced node");

            let heavy = balance
                .heavy_side()
                .expect("an unbalanced node must have a heavy side");
            let child = self
                .links(node)
                .child(heavy)
                .expect("the heavy side of an unbalanced node must not be empty");
            let child_balance = self.links(child).balance();

            trace!(%balance, %child_balance, ?heavy, "repairing");

            if child_balance.heavy_side() == Some(!heavy) {
                // The heavy grandchild is on the inside; lift it above both.
                self.rotate(child, heavy);
            }

            let root = self.rotate(node, !heavy);

            // Only an even child leaves the height of the subtree unchanged, which deletion
            // can produce but insertion cannot.
            (root, child_balance != Balance::EVEN)
        }
    }

    // Performs a bottom-up rebalance of the tree after the insertion of the leaf `node`.
    //
    // Each ancestor leans one step further towards the path the new leaf was inserted on. The walk
    // stops at the first ancestor whose height did not change, or after the single repair that
    // restores the height the first unbalanced ancestor had before the insertion.
    //
    // # Safety
    //
    // The caller must ensure that `node` is a leaf element of `self` which was just linked in.
    pub(crate) unsafe fn rebalance_inserted(&mut self, node: NonNull<T>) {
        unsafe {
            debug_assert!(self.links(node).is_leaf());
            debug_assert_eq!(self.links(node).balance(), Balance::EVEN);

            let mut child = node;

            while let Some(parent) = self.links(child).parent() {
                let dir = self.which_child(parent, child);
                let balance = self.links(parent).balance().grow(dir);
                self.links_mut(parent).set_balance(balance);

                if balance == Balance::EVEN {
                    // The shorter side caught up; the height of `parent` is unchanged.
                    return;
                }

                if !balance.is_valid() {
                    self.repair(parent);
                    return;
                }

                // `parent` went from even to one-heavy and grew taller.
                child = parent;
            }
        }
    }

    // Performs a bottom-up rebalance of the tree after the subtree on the `dir` side of `parent`
    // lost one level of height.
    //
    // Unlike insertion, a repair may itself shorten the subtree, so the walk can continue all the
    // way to the root.
    //
    // # Safety
    //
    // The caller must ensure that `parent` is an element of `self`.
    pub(crate) unsafe fn rebalance_removed(&mut self, mut parent: NonNull<T>, mut dir: Dir) {
        unsafe {
            loop {
                let balance = self.links(parent).balance().shrink(dir);
                self.links_mut(parent).set_balance(balance);

                let subtree = if balance == Balance::EVEN {
                    // The taller side shrank, and with it the subtree.
                    parent
                } else if balance.is_valid() {
                    // `parent` went from even to one-heavy and kept its height.
                    return;
                } else {
                    match self.repair(parent) {
                        (root, true) => root,
                        (_, false) => return,
                    }
                };

                let Some(grandparent) = self.links(subtree).parent() else {
                    return;
                };

                dir = self.which_child(grandparent, subtree);
                parent = grandparent;
            }
        }
    }
}
