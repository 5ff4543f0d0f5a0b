use std::fmt;

/// One drawn connection between two residues.
///
/// The first coordinate keys adjacency packing, so `(1, 5)` and `(5, 1)` are
/// different pairs. Use [`EdgePair::unordered`] for intra-structure contacts
/// where the direction carries no meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgePair {
    first: u32,
    second: u32,
}

impl EdgePair {
    /// Pair in the given order.
    #[must_use]
    pub const fn new(first: u32, second: u32) -> Self {
        Self { first, second }
    }

    /// Pair normalised so that `first <= second`.
    #[must_use]
    pub fn unordered(a: u32, b: u32) -> Self {
        Self {
            first: a.min(b),
            second: a.max(b),
        }
    }

    /// Residue keying the adjacency list.
    #[must_use]
    pub const fn first(&self) -> u32 {
        self.first
    }

    /// Residue listed as a target.
    #[must_use]
    pub const fn second(&self) -> u32 {
        self.second
    }

    /// Whether both ends are the same residue.
    #[must_use]
    pub const fn is_self_pair(&self) -> bool {
        self.first == self.second
    }
}

impl From<(u32, u32)> for EdgePair {
    fn from((first, second): (u32, u32)) -> Self {
        Self::new(first, second)
    }
}

impl fmt::Display for EdgePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.first, self.second)
    }
}
