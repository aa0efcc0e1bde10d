use core::fmt;

use crate::Dir;

/// The balance factor of a node: the height of its right subtree minus the height of its left
/// subtree.
///
/// Every node of a tree at rest is left-heavy, even or right-heavy. A factor of ±2 only exists
/// while the tree is being rebalanced.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Balance(i8);

impl Balance {
    pub const LEFT_HEAVY: Balance = Balance(-1);
    pub const EVEN: Balance = Balance(0);
    pub const RIGHT_HEAVY: Balance = Balance(1);

    #[inline]
    #[track_caller]
    pub(crate) fn new(factor: i8) -> Balance {
        assert!(
            (-2..=2).contains(&factor),
            "balance factor {factor} is out of range"
        );

        Balance(factor)
    }

    /// Returns the balance factor as an integer.
    #[inline]
    pub const fn get(self) -> i8 {
        self.0
    }

    /// Returns `true` if the factor is one a node may hold outside of rebalancing.
    #[inline]
    pub const fn is_valid(self) -> bool {
        -1 <= self.0 && self.0 <= 1
    }

    /// Returns the side whose subtree is taller, if any.
    #[inline]
    pub(crate) fn heavy_side(self) -> Option<Dir> {
        match self.0 {
            0 => None,
            f if f < 0 => Some(Dir::Left),
            _ => Some(Dir::Right),
        }
    }

    /// Returns the factor after the subtree on `dir` grew by one level.
    #[inline]
    #[track_caller]
    pub(crate) fn grow(self, dir: Dir) -> Balance {
        match dir {
            Dir::Left => Balance::new(self.0 - 1),
            Dir::Right => Balance::new(self.0 + 1),
        }
    }

    /// Returns the factor after the subtree on `dir` shrank by one level.
    #[inline]
    #[track_caller]
    pub(crate) fn shrink(self, dir: Dir) -> Balance {
        self.grow(!dir)
    }

    /// Returns the factors of `down` and `up` after a rotation in direction `dir`, where `up` is
    /// the `!dir` child of `down` before the rotation and its parent afterwards.
    ///
    /// The result holds for any pre-rotation factors, so the same rule serves single rotations,
    /// both halves of a double rotation, and the height-preserving case of deletion repair.
    #[track_caller]
    pub(crate) fn rotated(down: Balance, up: Balance, dir: Dir) -> (Balance, Balance) {
        // Worked out for a left rotation; a right rotation is its mirror image.
        let sign = match dir {
            Dir::Left => 1,
            Dir::Right => -1,
        };

        let (x, y) = (down.0 * sign, up.0 * sign);

        let x_new = x - 1 - y.max(0);
        let y_new = y - 1 + x_new.min(0);

        (Balance::new(x_new * sign), Balance::new(y_new * sign))
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Checks the post-rotation factors against ones computed from explicit subtree heights.
    fn rotate_by_heights(a: i8, b: i8, c: i8, dir: Dir) {
        // Before a left rotation: down = (a, up), up = (b, c).
        // After: up = (down, c), down = (a, b).
        let (a, b, c) = match dir {
            Dir::Left => (a, b, c),
            Dir::Right => (c, b, a),
        };

        let up_height = 1 + b.max(c);
        let down_before = up_height - a;
        let up_before = c - b;

        let down_after = b - a;
        let up_after = c - (1 + a.max(b));

        let (down_before, up_before, down_after, up_after) = match dir {
            Dir::Left => (down_before, up_before, down_after, up_after),
            Dir::Right => (-down_before, -up_before, -down_after, -up_after),
        };

        let expected = (Balance(down_after), Balance(up_after));
        let computed = Balance::rotated(Balance(down_before), Balance(up_before), dir);
        assert_eq!(
            computed, expected,
            "heights ({a}, {b}, {c}) rotated {dir:?}"
        );
    }

    #[test]
    fn rotation_matches_heights() {
        for dir in [Dir::Left, Dir::Right] {
            for a in 0..4 {
                for b in 0..4 {
                    for c in 0..4 {
                        let in_range = |f: i8| (-2..=2).contains(&f);

                        if in_range(1 + b.max(c) - a)
                            && in_range(c - b)
                            && in_range(b - a)
                            && in_range(c - (1 + a.max(b)))
                        {
                            rotate_by_heights(a, b, c, dir);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn deletion_closed_form() {
        // An even pivot leaves the pair leaning towards each other.
        assert_eq!(
            Balance::rotated(Balance(2), Balance::EVEN, Dir::Left),
            (Balance::RIGHT_HEAVY, Balance::LEFT_HEAVY)
        );
        assert_eq!(
            Balance::rotated(Balance(-2), Balance::EVEN, Dir::Right),
            (Balance::LEFT_HEAVY, Balance::RIGHT_HEAVY)
        );

        // A pivot leaning the same way leaves both even.
        assert_eq!(
            Balance::rotated(Balance(2), Balance::RIGHT_HEAVY, Dir::Left),
            (Balance::EVEN, Balance::EVEN)
        );
        assert_eq!(
            Balance::rotated(Balance(-2), Balance::LEFT_HEAVY, Dir::Right),
            (Balance::EVEN, Balance::EVEN)
        );
    }

    #[test]
    fn grow_and_shrink() {
        assert_eq!(Balance::EVEN.grow(Dir::Left), Balance::LEFT_HEAVY);
        assert_eq!(Balance::EVEN.grow(Dir::Right), Balance::RIGHT_HEAVY);
        assert_eq!(Balance::LEFT_HEAVY.shrink(Dir::Left), Balance::EVEN);
        assert_eq!(Balance::LEFT_HEAVY.shrink(Dir::Right), Balance(-2));
        assert!(!Balance(2).is_valid());
        assert_eq!(Balance(-2).heavy_side(), Some(Dir::Left));
        assert_eq!(Balance::EVEN.heavy_side(), None);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn out_of_range_is_fatal() {
        Balance(2).grow(Dir::Right);
    }
}
