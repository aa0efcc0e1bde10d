use core::ptr::NonNull;

use crate::{AvlTree, Dir, Links, TreeNode};

impl<T> AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    /// Returns `true` if every leaf of the tree lies at the same depth.
    ///
    /// Nodes with a single child are not leaves. An empty tree trivially satisfies this.
    pub fn leaf_depths_equal(&self) -> bool {
        let Some(root) = self.root else {
            return true;
        };

        let mut leaf_depth = None;
        unsafe { self.leaf_depths_equal_at(root, 0, &mut leaf_depth) }
    }

    unsafe fn leaf_depths_equal_at(
        &self,
        node: NonNull<T>,
        depth: usize,
        leaf_depth: &mut Option<usize>,
    ) -> bool {
        unsafe {
            let links = self.links(node);

            if links.is_leaf() {
                return *leaf_depth.get_or_insert(depth) == depth;
            }

            [Dir::Left, Dir::Right].into_iter().all(|dir| match links.child(dir) {
                Some(child) => self.leaf_depths_equal_at(child, depth + 1, leaf_depth),
                None => true,
            })
        }
    }
}

#[cfg(feature = "alloc")]
mod dot {
    extern crate alloc;

    use alloc::{collections::VecDeque, string::String};
    use core::{fmt, fmt::Write as _, ptr::NonNull};

    use crate::{AvlTree, Dir, Links, TreeNode};

    enum Item<T: ?Sized> {
        Node(NonNull<T>),
        Missing(usize),
    }

    impl<T> AvlTree<T>
    where
        T: TreeNode<Links<T>> + ?Sized,
        T::Key: fmt::Display,
    {
        /// Writes the tree to `w` in [graphviz] format, one rank per tree level.
        ///
        /// Each node is labelled with its key and balance factor. Missing children are drawn as
        /// points one rank below their parent, so that left and right children remain
        /// distinguishable.
        ///
        /// [graphviz]: https://graphviz.org/doc/info/lang.html
        pub fn dotgraph<W>(&self, name: &str, mut w: W) -> fmt::Result
        where
            W: fmt::Write,
        {
            let Some(root) = self.root else {
                return write!(w, "digraph \"graph-{name}\" {{}}");
            };

            writeln!(
                w,
                "digraph \"graph-{name}\" {{\n subgraph \"subgraph-{name}\" {{"
            )?;

            // Edges are collected separately and written after every rank.
            let mut edges = String::new();
            let mut queue = VecDeque::from([Item::Node(root)]);
            let mut missing = 0;

            while !queue.is_empty() {
                write!(w, "{{rank=same; ")?;

                for _ in 0..queue.len() {
                    let node = match queue.pop_front() {
                        Some(Item::Node(node)) => node,
                        Some(Item::Missing(id)) => {
                            write!(w, "\"graph{name}-missing{id}\" [shape=point]; ")?;
                            continue;
                        }
                        None => break,
                    };

                    let (key, links) = unsafe { (node.as_ref().key(), self.links(node)) };
                    let balance = links.balance();
                    write!(w, "\"graph{name}-{key}\" [label=\"{key}:{balance}\"]; ")?;

                    for dir in [Dir::Left, Dir::Right] {
                        match links.child(dir) {
                            Some(child) => {
                                let child_key = unsafe { child.as_ref().key() };
                                writeln!(
                                    edges,
                                    "\"graph{name}-{key}\" -> \"graph{name}-{child_key}\";"
                                )?;
                                queue.push_back(Item::Node(child));
                            }
                            None => {
                                writeln!(
                                    edges,
                                    "\"graph{name}-{key}\" -> \"graph{name}-missing{missing}\";"
                                )?;
                                queue.push_back(Item::Missing(missing));
                                missing += 1;
                            }
                        }
                    }
                }

                writeln!(w, "}}")?;
            }

            w.write_str(&edges)?;
            w.write_str(" }\n}")
        }
    }
}
