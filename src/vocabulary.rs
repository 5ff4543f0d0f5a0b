//! Rendering of visualization requests into renderer command text.
//!
//! The relay treats commands as opaque lines; a [`Vocabulary`] is the one
//! place that knows the renderer's syntax. [`PymolVocabulary`] targets a
//! PyMOL-compatible renderer and is what the facade uses by default.

use std::path::Path;

use crate::command::Command;
use crate::error::RelayError;
use crate::naming::ObjectName;

/// Where an edge set is drawn: the object holding the connections and the
/// selections its two coordinates index into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeTarget {
    /// Object the connections are drawn into.
    pub object: ObjectName,
    /// Selection (usually a loaded structure) the first coordinate indexes.
    pub first: String,
    /// Selection the second coordinate indexes.
    pub second: String,
}

impl EdgeTarget {
    /// Target whose both coordinates index the same structure.
    #[must_use]
    pub fn within(object: ObjectName, structure: &str) -> Self {
        Self {
            object,
            first: structure.to_owned(),
            second: structure.to_owned(),
        }
    }
}

/// Renderer command syntax.
///
/// Residue lists are passed pre-encoded as interval-run text (see
/// [`crate::compact::runs`]) and must be embedded verbatim, exactly once,
/// so that command length grows linearly with the run text.
pub trait Vocabulary: Send + Sync {
    /// Commands loading the structure file at `path` as `object`.
    fn load(
        &self,
        path: &Path,
        object: &str,
    ) -> Result<Vec<Command>, RelayError>;

    /// One connection between residue `first` and residue `second`.
    fn connect_pair(
        &self,
        target: &EdgeTarget,
        first: u32,
        second: u32,
    ) -> Result<Command, RelayError>;

    /// Connections from residue `source` to every residue in `runs`.
    fn connect_runs(
        &self,
        target: &EdgeTarget,
        source: u32,
        runs: &str,
    ) -> Result<Command, RelayError>;

    /// Named selection of the residues in `runs` of `structure`.
    fn select(
        &self,
        name: &ObjectName,
        structure: &str,
        runs: &str,
    ) -> Result<Command, RelayError>;

    /// Add the residues in `runs` of `structure` to an existing selection.
    fn extend_selection(
        &self,
        name: &ObjectName,
        structure: &str,
        runs: &str,
    ) -> Result<Command, RelayError>;

    /// Group `members` under `group`.
    fn group(
        &self,
        group: &ObjectName,
        members: &[ObjectName],
    ) -> Result<Command, RelayError>;

    /// Define `color` as the given RGB triple (components in `0.0..=1.0`).
    fn define_color(
        &self,
        color: &ObjectName,
        rgb: [f32; 3],
    ) -> Result<Command, RelayError>;

    /// One filled triangle spanning three residues of `structure`.
    fn triangle(
        &self,
        name: &ObjectName,
        structure: &str,
        corners: [u32; 3],
        color: &ObjectName,
    ) -> Result<Command, RelayError>;

    /// Superpose selection `mobile` onto selection `reference`.
    fn superpose(
        &self,
        mobile: &ObjectName,
        reference: &ObjectName,
    ) -> Result<Command, RelayError>;

    /// Remove an object from the renderer.
    fn delete(&self, name: &ObjectName) -> Result<Command, RelayError>;
}

/// PyMOL command syntax.
///
/// Connections are drawn as `distance` objects between alpha carbons.
/// `triangle` is not a PyMOL built-in; the session prologue is expected to
/// register it.
#[derive(Debug, Clone, Copy, Default)]
pub struct PymolVocabulary;

impl PymolVocabulary {
    fn alpha_carbons(selection: &str, residues: &str) -> String {
        format!("{selection} and resi {residues} and name ca")
    }
}

impl Vocabulary for PymolVocabulary {
    fn load(
        &self,
        path: &Path,
        object: &str,
    ) -> Result<Vec<Command>, RelayError> {
        Ok(vec![
            Command::new(format!("load {}, {object}", path.display()))?,
            Command::new(format!("hide everything, {object}"))?,
            Command::new(format!("show cartoon, {object}"))?,
        ])
    }

    fn connect_pair(
        &self,
        target: &EdgeTarget,
        first: u32,
        second: u32,
    ) -> Result<Command, RelayError> {
        Command::new(format!(
            "distance {}, {}, {}",
            target.object,
            Self::alpha_carbons(&target.first, &first.to_string()),
            Self::alpha_carbons(&target.second, &second.to_string()),
        ))
    }

    fn connect_runs(
        &self,
        target: &EdgeTarget,
        source: u32,
        runs: &str,
    ) -> Result<Command, RelayError> {
        Command::new(format!(
            "distance {}, {}, {}",
            target.object,
            Self::alpha_carbons(&target.first, &source.to_string()),
            Self::alpha_carbons(&target.second, runs),
        ))
    }

    fn select(
        &self,
        name: &ObjectName,
        structure: &str,
        runs: &str,
    ) -> Result<Command, RelayError> {
        Command::new(format!("select {name}, {structure} and resi {runs}"))
    }

    fn extend_selection(
        &self,
        name: &ObjectName,
        structure: &str,
        runs: &str,
    ) -> Result<Command, RelayError> {
        Command::new(format!(
            "select {name}, {name} or ({structure} and resi {runs})"
        ))
    }

    fn group(
        &self,
        group: &ObjectName,
        members: &[ObjectName],
    ) -> Result<Command, RelayError> {
        let members: Vec<&str> =
            members.iter().map(ObjectName::as_str).collect();
        Command::new(format!("group {group}, {}", members.join(" ")))
    }

    fn define_color(
        &self,
        color: &ObjectName,
        rgb: [f32; 3],
    ) -> Result<Command, RelayError> {
        let [r, g, b] = rgb.map(|c| c.clamp(0.0, 1.0));
        Command::new(format!("set_color {color}, [{r:.3}, {g:.3}, {b:.3}]"))
    }

    fn triangle(
        &self,
        name: &ObjectName,
        structure: &str,
        corners: [u32; 3],
        color: &ObjectName,
    ) -> Result<Command, RelayError> {
        let [a, b, c] = corners.map(|residue| {
            Self::alpha_carbons(structure, &residue.to_string())
        });
        Command::new(format!("triangle {name}, {a}, {b}, {c}, {color}"))
    }

    fn superpose(
        &self,
        mobile: &ObjectName,
        reference: &ObjectName,
    ) -> Result<Command, RelayError> {
        Command::new(format!(
            "pair_fit {mobile} and name ca, {reference} and name ca"
        ))
    }

    fn delete(&self, name: &ObjectName) -> Result<Command, RelayError> {
        Command::new(format!("delete {name}"))
    }
}
