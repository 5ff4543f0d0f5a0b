//! Collision-free renderer object names.
//!
//! Every selection, group, edge set and triangle the relay creates in the
//! renderer gets a name carrying a session-unique serial, so successive
//! requests never overwrite each other's objects.

use std::fmt;

/// Role tag embedded in an [`ObjectName`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    /// Residue selection (contact map nodes).
    Nodes,
    /// Contact edge set.
    Cont,
    /// Triangle set.
    Tri,
    /// Superposition result.
    Sup,
    /// Object group.
    Grp,
    /// Caller-defined role tag.
    Custom(String),
}

impl Role {
    /// Tag text used inside object names.
    #[must_use]
    pub fn tag(&self) -> &str {
        match self {
            Self::Nodes => "Nodes",
            Self::Cont => "Cont",
            Self::Tri => "Tri",
            Self::Sup => "Sup",
            Self::Grp => "Grp",
            Self::Custom(tag) => tag,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Identifier of a renderer-side object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectName(String);

impl ObjectName {
    /// Wrap a name that was not minted by a [`NameAllocator`], e.g. the
    /// object a structure was loaded as.
    #[must_use]
    pub fn external(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The name text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ObjectName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// `Sel<serial>_<structure_id>_<role>`.
#[must_use]
pub fn compose_name(role: &Role, structure_id: &str, serial: u64) -> ObjectName {
    ObjectName(format!("Sel{serial}_{structure_id}_{role}"))
}

/// Mints session-unique serials and the names built from them.
///
/// Owned by a single session; not shared between threads.
#[derive(Debug, Default)]
pub struct NameAllocator {
    last: u64,
}

impl NameAllocator {
    /// Allocator whose first serial is 1.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Next serial. Strictly increasing, starting at 1.
    ///
    /// # Panics
    ///
    /// Running out of `u64` serials is a program error and panics in every
    /// build profile rather than handing out a repeated name.
    #[allow(clippy::panic)]
    pub fn next_serial(&mut self) -> u64 {
        let Some(next) = self.last.checked_add(1) else {
            panic!("name serials exhausted after {}", self.last);
        };
        self.last = next;
        next
    }

    /// Last serial handed out (0 before the first allocation).
    #[must_use]
    pub fn last_serial(&self) -> u64 {
        self.last
    }

    /// Fresh name for an object of `role` belonging to `structure_id`.
    pub fn allocate(&mut self, role: &Role, structure_id: &str) -> ObjectName {
        let serial = self.next_serial();
        compose_name(role, structure_id, serial)
    }

    /// `<top_level>_<structure_id>_<tag>`: a sub-group under an allocated
    /// top-level group. Unique as long as `top_level` is.
    #[must_use]
    pub fn sub_group(
        top_level: &ObjectName,
        structure_id: &str,
        tag: &Role,
    ) -> ObjectName {
        ObjectName(format!("{top_level}_{structure_id}_{tag}"))
    }

    /// Fresh color index name, drawn from the shared serial counter.
    pub fn allocate_color(&mut self) -> ObjectName {
        let serial = self.next_serial();
        ObjectName(format!("Color{serial}"))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn serials_start_at_one_and_increase() {
        let mut names = NameAllocator::new();
        assert_eq!(names.last_serial(), 0);
        assert_eq!(names.next_serial(), 1);
        assert_eq!(names.next_serial(), 2);
        assert_eq!(names.last_serial(), 2);
    }

    #[test]
    fn last_serial_is_handed_out_once() {
        let mut names = NameAllocator { last: u64::MAX - 1 };
        assert_eq!(names.next_serial(), u64::MAX);
        assert_eq!(names.last_serial(), u64::MAX);
    }

    #[test]
    #[should_panic(expected = "name serials exhausted")]
    fn serial_overflow_is_fatal() {
        let mut names = NameAllocator { last: u64::MAX };
        let _ = names.next_serial();
    }

    #[test]
    fn contact_names_follow_selection_scheme() {
        let mut names = NameAllocator::new();
        let got: Vec<String> = (0..3)
            .map(|_| names.allocate(&Role::Cont, "X1A").to_string())
            .collect();
        assert_eq!(got, ["Sel1_X1A_Cont", "Sel2_X1A_Cont", "Sel3_X1A_Cont"]);
    }

    #[test]
    fn compose_is_deterministic() {
        let a = compose_name(&Role::Tri, "1ABC", 7);
        let b = compose_name(&Role::Tri, "1ABC", 7);
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "Sel7_1ABC_Tri");
    }

    #[test]
    fn names_never_repeat_across_roles() {
        let mut names = NameAllocator::new();
        let roles = [
            Role::Nodes,
            Role::Cont,
            Role::Tri,
            Role::Sup,
            Role::Grp,
            Role::Custom("Hull".into()),
        ];
        let mut seen = HashSet::new();
        for i in 0..1200 {
            let name = if i % 7 == 0 {
                names.allocate_color()
            } else {
                names.allocate(&roles[i % roles.len()], "1ABC")
            };
            assert!(seen.insert(name), "duplicate name at allocation {i}");
        }
        assert_eq!(seen.len(), 1200);
    }

    #[test]
    fn sub_groups_nest_under_top_level() {
        let mut names = NameAllocator::new();
        let top = names.allocate(&Role::Grp, "1ABC");
        let nodes = NameAllocator::sub_group(&top, "1ABC", &Role::Nodes);
        assert_eq!(nodes.as_str(), "Sel1_1ABC_Grp_1ABC_Nodes");
    }
}
