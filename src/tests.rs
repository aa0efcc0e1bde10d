extern crate std;

use std::{ops::Range, prelude::v1::*};

use proptest::prelude::*;

use crate::model::{self, TestNode};

use super::*;

fn tree_of(keys: &[u32]) -> AvlTree<TestNode> {
    let mut tree: AvlTree<TestNode> = AvlTree::new();

    for &key in keys {
        assert!(tree.insert(TestNode::new(key)).is_none());
        tree.assert_invariants();
    }

    tree
}

fn keys_of(tree: &AvlTree<TestNode>) -> Vec<u32> {
    tree.iter().map(|node| node.key).collect()
}

fn shape(tree: &AvlTree<TestNode>, link: Link<TestNode>) -> Option<(u32, i8)> {
    link.map(|node| unsafe { (node.as_ref().key, tree.links(node).balance().get()) })
}

// Returns the key and balance factor of the root, and of its left and right children.
fn root_shape(tree: &AvlTree<TestNode>) -> [Option<(u32, i8)>; 3] {
    let root = tree.root;
    let (left, right) = match root {
        Some(root) => unsafe { (tree.links(root).left(), tree.links(root).right()) },
        None => (None, None),
    };

    [shape(tree, root), shape(tree, left), shape(tree, right)]
}

// Returns every permutation of `keys`.
fn permutations(keys: &[u32]) -> Vec<Vec<u32>> {
    if keys.len() <= 1 {
        return vec![keys.to_vec()];
    }

    let mut out = Vec::new();
    for (i, &first) in keys.iter().enumerate() {
        let mut rest = keys.to_vec();
        rest.remove(i);

        for mut perm in permutations(&rest) {
            perm.insert(0, first);
            out.push(perm);
        }
    }

    out
}

fn insert_find_all(keys: &[u32]) {
    let tree = tree_of(keys);

    for key in keys {
        let node = tree.get_raw(key).expect("item not found");
        assert_eq!(unsafe { node.as_ref().key() }, key);
    }
}

#[test]
fn zero_elems_find() {
    insert_find_all(&[]);
}

#[test]
fn single_elem_find() {
    insert_find_all(&[0]);
}

#[test]
fn small_permutations_find() {
    for n in 2..=6 {
        let keys: Vec<u32> = (0..n).collect();

        for perm in permutations(&keys) {
            insert_find_all(&perm);
        }
    }
}

fn insert_remove_all(keys: &[u32]) {
    let mut tree = tree_of(keys);

    for key in keys {
        let node = tree.get_raw(key).expect("item not found");
        unsafe { tree.remove_at(node) };
        tree.assert_invariants();
    }

    assert!(tree.is_empty());

    for &key in keys {
        tree.insert(TestNode::new(key));
        tree.assert_invariants();
    }

    for key in keys.iter().rev() {
        assert_eq!(tree.remove(key).map(|node| node.key), Some(*key));
        tree.assert_invariants();
    }

    assert!(tree.is_empty());
    assert_eq!(tree.height(), None);
}

#[test]
fn remove_one() {
    insert_remove_all(&[0]);
}

#[test]
fn small_permutations_remove() {
    for n in 2..=6 {
        let keys: Vec<u32> = (0..n).collect();

        for perm in permutations(&keys) {
            insert_remove_all(&perm);
        }
    }
}

#[test]
fn ascending_insert_rotates_left() {
    let tree = tree_of(&[1, 2, 3]);

    assert_eq!(
        root_shape(&tree),
        [Some((2, 0)), Some((1, 0)), Some((3, 0))]
    );
}

#[test]
fn descending_insert_rotates_right() {
    let tree = tree_of(&[3, 2, 1]);

    assert_eq!(
        root_shape(&tree),
        [Some((2, 0)), Some((1, 0)), Some((3, 0))]
    );
}

#[test]
fn zig_zag_insert_rotates_twice() {
    for keys in [[1, 3, 2], [3, 1, 2]] {
        let tree = tree_of(&keys);

        assert_eq!(
            root_shape(&tree),
            [Some((2, 0)), Some((1, 0)), Some((3, 0))],
            "inserting {keys:?}"
        );
    }
}

#[test]
fn remove_root_of_complete_tree() {
    let mut tree = tree_of(&[4, 2, 6, 1, 3, 5, 7]);
    assert_eq!(tree.height(), Some(2));
    assert!(tree.leaf_depths_equal());

    let removed = tree.remove(&4).expect("root should be present");
    assert_eq!(removed.key, 4);
    tree.assert_invariants();

    assert_eq!(tree.height(), Some(2));
    assert_eq!(keys_of(&tree), [1, 2, 3, 5, 6, 7]);

    // The predecessor takes the root's place.
    assert_eq!(
        root_shape(&tree),
        [Some((3, 0)), Some((2, -1)), Some((6, 0))]
    );
    assert!(tree.leaf_depths_equal());

    tree.remove(&1);
    tree.assert_invariants();
    assert!(!tree.leaf_depths_equal());
}

#[test]
fn remove_with_adjacent_predecessor() {
    // 2 has two children, and its predecessor 1 is its own left child.
    let mut tree = tree_of(&[2, 1, 3]);

    tree.remove(&2);
    tree.assert_invariants();

    assert_eq!(root_shape(&tree), [Some((1, 1)), None, Some((3, 0))]);
}

#[test]
fn removal_repairs_up_to_root() {
    // A Fibonacci tree: every internal node is left-heavy, so removing the rightmost leaf shortens
    // every subtree on the path and forces a rotation at more than one level.
    let mut tree = tree_of(&[8, 5, 11, 3, 7, 10, 12, 2, 4, 6, 9, 1]);
    assert_eq!(tree.height(), Some(4));

    tree.remove(&12);
    tree.assert_invariants();
    assert_eq!(tree.height(), Some(3));

    assert_eq!(keys_of(&tree), [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]);
}

#[test]
fn remove_missing_is_noop() {
    let mut tree = tree_of(&[1, 2, 3]);

    assert!(tree.remove(&4).is_none());
    assert!(tree.remove(&0).is_none());

    tree.assert_invariants();
    assert_eq!(keys_of(&tree), [1, 2, 3]);
    assert_eq!(root_shape(&tree)[0], Some((2, 0)));
}

#[test]
fn duplicate_insert_replaces_in_place() {
    let mut tree = tree_of(&[4, 2, 6, 1, 3, 5, 7]);
    let before = root_shape(&tree);

    let old = tree.insert(TestNode::new(2)).expect("key 2 was present");
    assert_eq!(old.key, 2);
    assert!(old.links.balance() == Balance::EVEN);

    tree.assert_invariants();
    assert_eq!(tree.len(), 7);
    assert_eq!(tree.height(), Some(2));
    assert_eq!(root_shape(&tree), before);
}

#[test]
fn replacing_the_root() {
    let mut tree = tree_of(&[1]);

    let old = tree.insert(TestNode::new(1)).expect("key 1 was present");
    assert_eq!(old.key, 1);

    tree.assert_invariants();
    assert_eq!(tree.len(), 1);
}

#[test]
fn entry_vacant_then_occupied() {
    let mut tree = tree_of(&[10, 20]);

    match tree.entry(&15) {
        Entry::Vacant(vacant) => {
            let node = unsafe { vacant.insert(TestNode::new(15)) };
            assert_eq!(node.key, 15);
        }
        Entry::Occupied(_) => panic!("15 is not in the tree"),
    }
    tree.assert_invariants();

    let entry = tree.entry(&15);
    assert!(entry.is_occupied());
    let Entry::Occupied(occupied) = entry else {
        unreachable!()
    };
    assert_eq!(occupied.get().key, 15);
    assert_eq!(occupied.remove().key, 15);

    tree.assert_invariants();
    assert_eq!(keys_of(&tree), [10, 20]);
}

#[test]
fn neighbors() {
    let tree = tree_of(&[10, 20, 30, 40, 50]);
    let key = |node: Option<Pin<&TestNode>>| node.map(|n| n.key);

    assert_eq!(key(tree.predecessor(&30)), Some(20));
    assert_eq!(key(tree.predecessor(&35)), Some(30));
    assert_eq!(key(tree.predecessor(&10)), None);
    assert_eq!(key(tree.successor(&30)), Some(40));
    assert_eq!(key(tree.successor(&5)), Some(10));
    assert_eq!(key(tree.successor(&50)), None);
    assert_eq!(key(tree.first()), Some(10));
    assert_eq!(key(tree.last()), Some(50));
}

#[test]
fn iter_both_ends() {
    let tree = tree_of(&[5, 3, 8, 1, 4, 7, 9, 2, 6]);

    let mut iter = tree.iter();
    assert_eq!(iter.len(), 9);
    assert_eq!(iter.next().map(|n| n.key), Some(1));
    assert_eq!(iter.next_back().map(|n| n.key), Some(9));

    let middle: Vec<u32> = iter.by_ref().map(|n| n.key).collect();
    assert_eq!(middle, [2, 3, 4, 5, 6, 7, 8]);
    assert!(iter.next().is_none());
    assert!(iter.next_back().is_none());

    let rev: Vec<u32> = tree.iter().rev().map(|n| n.key).collect();
    assert_eq!(rev, [9, 8, 7, 6, 5, 4, 3, 2, 1]);
}

#[test]
fn pop_until_empty() {
    let mut tree = tree_of(&[3, 1, 4, 5, 9, 2, 6]);

    let mut popped = Vec::new();
    while let Some(node) = tree.pop_first() {
        popped.push(node.key);
        tree.assert_invariants();

        if let Some(node) = tree.pop_last() {
            popped.push(node.key);
            tree.assert_invariants();
        }
    }

    assert_eq!(popped, [1, 9, 2, 6, 3, 5, 4]);
}

#[test]
fn clear_releases_every_node() {
    let mut tree = tree_of(&(0..100).collect::<Vec<_>>());

    tree.clear();
    tree.assert_invariants();
    assert!(tree.is_empty());
    assert!(tree.first().is_none());

    // The tree is still usable after clearing.
    tree.insert(TestNode::new(7));
    tree.assert_invariants();
    assert_eq!(keys_of(&tree), [7]);
}

#[test]
fn dotgraph_labels_balance() {
    let tree = tree_of(&[2, 1]);

    let mut out = String::new();
    tree.dotgraph("t", &mut out).unwrap();

    assert!(out.starts_with("digraph \"graph-t\""));
    assert!(out.contains("[label=\"2:-1\"]"));
    assert!(out.contains("[label=\"1:+0\"]"));
    assert!(out.contains("\"grapht-2\" -> \"grapht-1\";"));

    // Missing children sit on the rank below their parent.
    let rank_of = |label: &str| {
        out.lines()
            .find(|line| line.starts_with("{rank=same;") && line.contains(label))
            .expect("every node is ranked")
    };
    assert!(!rank_of("\"grapht-2\" [label").contains("missing"));
    assert!(rank_of("\"grapht-1\" [label").contains("\"grapht-missing0\" [shape=point]"));
    assert!(rank_of("\"grapht-missing1\"").contains("\"grapht-missing2\""));
    assert!(out.contains("\"grapht-2\" -> \"grapht-missing0\";"));

    let mut empty = String::new();
    tree_of(&[]).dotgraph("e", &mut empty).unwrap();
    assert_eq!(empty, "digraph \"graph-e\" {}");
}

#[test]
fn traced_removals() {
    use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

    let _trace = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .set_default();

    insert_remove_all(&[5, 2, 8, 1, 3, 7, 9, 4, 6]);
}

#[test]
fn map_overwrites_in_place() {
    let mut map = AvlMap::new();

    assert_eq!(map.insert("b", 1), None);
    assert_eq!(map.insert("a", 2), None);
    assert_eq!(map.insert("c", 3), None);
    let height = map.height();

    assert_eq!(map.insert("a", 20), Some(2));
    assert_eq!(map.len(), 3);
    assert_eq!(map.height(), height);
    assert_eq!(map["a"], 20);

    *map.get_mut("c").expect("c is present") += 1;
    assert_eq!(map.get("c"), Some(&4));

    assert_eq!(map.try_get("z"), Err(KeyError));
    assert_eq!(map.remove("z"), None);
    assert_eq!(map.remove("b"), Some(1));

    map.assert_invariants();
    assert_eq!(map.iter().collect::<Vec<_>>(), [(&"a", &20), (&"c", &4)]);
    assert_eq!(format!("{map:?}"), r#"{"a": 20, "c": 4}"#);
}

#[test]
#[should_panic(expected = "key not found")]
fn map_index_missing_panics() {
    let map: AvlMap<u32, u32> = (0..4).map(|k| (k, k * 10)).collect();
    let _value: u32 = map[&4];
}

#[test]
fn map_from_iter_and_navigation() {
    let mut map: AvlMap<u32, char> = "avltree".chars().zip(1..).map(|(c, k)| (k, c)).collect();
    map.assert_invariants();

    assert_eq!(map.keys().copied().collect::<Vec<_>>(), [1, 2, 3, 4, 5, 6, 7]);
    assert_eq!(map.values().rev().collect::<String>(), "eertlva");
    assert_eq!(map.first_key_value(), Some((&1, &'a')));
    assert_eq!(map.last_key_value(), Some((&7, &'e')));
    assert_eq!(map.predecessor(&4), Some((&3, &'l')));
    assert_eq!(map.successor(&4), Some((&5, &'r')));

    assert_eq!(map.pop_first(), Some((1, 'a')));
    assert_eq!(map.pop_last(), Some((7, 'e')));
    map.assert_invariants();

    map.clear();
    assert!(map.is_empty());
    assert_eq!(map.first_key_value(), None);
}

#[test]
fn tree_is_send_and_sync() {
    fn assert_send_sync<S: Send + Sync>() {}

    assert_send_sync::<AvlMap<u64, String>>();
}

#[cfg(miri)]
const FUZZ_RANGE: Range<usize> = 0..10;

#[cfg(not(miri))]
const FUZZ_RANGE: Range<usize> = 0..1000;

// 1.4405 log2(n + 2) - 0.3277 is the tightest known bound on the height of an AVL tree.
fn height_bound(len: usize) -> f64 {
    1.4405 * ((len + 2) as f64).log2() - 0.3277
}

proptest::proptest! {
    #![proptest_config(ProptestConfig {
        max_shrink_iters: 65536,
        .. ProptestConfig::default()
    })]

    #[test]
    fn btree_equivalence(ops in proptest::collection::vec(model::op_strategy(), FUZZ_RANGE)) {
        model::run_btree_equivalence(ops);
    }

    #[test]
    fn map_equivalence(ops in proptest::collection::vec(model::op_strategy(), FUZZ_RANGE)) {
        model::run_map_equivalence(ops);
    }

    #[test]
    fn round_trip_in_any_order(
        keys in proptest::collection::btree_set(any::<u32>(), 0..200)
            .prop_map(|set| set.into_iter().collect::<Vec<_>>())
            .prop_shuffle(),
        removal_order in proptest::collection::vec(any::<prop::sample::Index>(), 200),
    ) {
        let mut tree = tree_of(&keys);

        let height = tree.height().map_or(0.0, |h| h as f64);
        prop_assert!(height <= height_bound(keys.len()), "height {height} for {} keys", keys.len());

        let mut remaining = keys.clone();
        for index in removal_order.iter().take(keys.len()) {
            let key = remaining.swap_remove(index.index(remaining.len()));

            prop_assert_eq!(tree.remove(&key).map(|node| node.key), Some(key));
            tree.assert_invariants();
        }

        prop_assert!(tree.is_empty());
        prop_assert_eq!(tree.height(), None);
    }
}
