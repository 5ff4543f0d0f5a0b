//! Edge-set compaction.
//!
//! Small edge sets become one connect command per edge. Large ones are
//! packed into adjacency lists keyed by the first coordinate, each list
//! rendered as a single command with its targets encoded as interval runs,
//! so the number of commands tracks the number of distinct sources rather
//! than the number of edges.

mod edge;
pub mod runs;

use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeInclusive;

pub use edge::EdgePair;

use crate::command::Command;
use crate::error::RelayError;
use crate::options::CompactionOptions;
use crate::vocabulary::{EdgeTarget, Vocabulary};

/// Adjacency list of one source residue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedGroup {
    /// Shared first coordinate.
    pub source: u32,
    /// Ascending, non-overlapping runs of second coordinates.
    pub runs: Vec<RangeInclusive<u32>>,
}

impl PackedGroup {
    /// Second coordinates in ascending order.
    pub fn targets(&self) -> impl Iterator<Item = u32> + '_ {
        self.runs.iter().flat_map(Clone::clone)
    }

    /// Run text, e.g. `2-4+7`.
    #[must_use]
    pub fn runs_text(&self) -> String {
        runs::format_runs(&self.runs)
    }
}

/// Outcome of planning an edge set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compaction {
    /// Nothing to draw.
    Empty,
    /// At or below the threshold: one command per edge, ascending.
    Pairs(Vec<EdgePair>),
    /// Above the threshold: one adjacency list per source, ascending.
    Packed(Vec<PackedGroup>),
}

impl Compaction {
    /// Reconstruct the exact edge set this plan draws.
    #[must_use]
    pub fn edges(&self) -> BTreeSet<EdgePair> {
        match self {
            Self::Empty => BTreeSet::new(),
            Self::Pairs(pairs) => pairs.iter().copied().collect(),
            Self::Packed(groups) => groups
                .iter()
                .flat_map(|g| {
                    g.targets().map(move |t| EdgePair::new(g.source, t))
                })
                .collect(),
        }
    }
}

/// Turns edge sets into connect commands within configured limits.
#[derive(Debug, Clone)]
pub struct EdgeCompactor {
    threshold: usize,
    max_groups: usize,
    max_command_len: usize,
}

impl Default for EdgeCompactor {
    fn default() -> Self {
        Self::new(&CompactionOptions::default())
    }
}

impl EdgeCompactor {
    /// Compactor using the given limits.
    #[must_use]
    pub fn new(options: &CompactionOptions) -> Self {
        Self {
            threshold: options.threshold,
            max_groups: options.max_groups,
            max_command_len: options.max_command_len,
        }
    }

    /// Edge count above which edges are packed.
    #[must_use]
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Longest command, in bytes, before a residue list is split.
    #[must_use]
    pub fn max_command_len(&self) -> usize {
        self.max_command_len
    }

    /// Decide how `edges` will be drawn.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::SelectionTooLarge`] when packing leaves more
    /// distinct sources than the group ceiling.
    pub fn compact(
        &self,
        edges: &BTreeSet<EdgePair>,
    ) -> Result<Compaction, RelayError> {
        if edges.is_empty() {
            return Ok(Compaction::Empty);
        }
        if edges.len() <= self.threshold {
            return Ok(Compaction::Pairs(edges.iter().copied().collect()));
        }

        let mut adjacency: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
        // BTreeSet order is (first, second), so each list fills ascending.
        for edge in edges {
            adjacency.entry(edge.first()).or_default().push(edge.second());
        }
        if adjacency.len() > self.max_groups {
            return Err(RelayError::SelectionTooLarge {
                groups: adjacency.len(),
                limit: self.max_groups,
            });
        }

        let groups = adjacency
            .into_iter()
            .map(|(source, targets)| PackedGroup {
                source,
                runs: runs::to_runs(targets),
            })
            .collect::<Vec<_>>();
        log::debug!(
            "packed {} edges into {} adjacency lists",
            edges.len(),
            groups.len()
        );
        Ok(Compaction::Packed(groups))
    }

    /// Render a plan into commands for `target`.
    ///
    /// A packed group whose command would exceed the length ceiling is
    /// split over consecutive sub-runs of the same source.
    ///
    /// # Errors
    ///
    /// Propagates [`RelayError::InvalidCommand`] from the vocabulary.
    pub fn render(
        &self,
        compaction: &Compaction,
        target: &EdgeTarget,
        vocabulary: &dyn Vocabulary,
    ) -> Result<Vec<Command>, RelayError> {
        match compaction {
            Compaction::Empty => Ok(Vec::new()),
            Compaction::Pairs(pairs) => pairs
                .iter()
                .map(|e| vocabulary.connect_pair(target, e.first(), e.second()))
                .collect(),
            Compaction::Packed(groups) => {
                let mut commands = Vec::with_capacity(groups.len());
                for group in groups {
                    let overhead =
                        vocabulary.connect_runs(target, group.source, "")?.len();
                    let budget = self.max_command_len.saturating_sub(overhead);
                    for chunk in runs::chunk_runs(&group.runs, budget) {
                        commands.push(vocabulary.connect_runs(
                            target,
                            group.source,
                            &runs::format_runs(&chunk),
                        )?);
                    }
                }
                Ok(commands)
            }
        }
    }

    /// [`compact`](Self::compact) followed by [`render`](Self::render).
    ///
    /// # Errors
    ///
    /// As for either step.
    pub fn compact_commands(
        &self,
        edges: &BTreeSet<EdgePair>,
        target: &EdgeTarget,
        vocabulary: &dyn Vocabulary,
    ) -> Result<Vec<Command>, RelayError> {
        let compaction = self.compact(edges)?;
        self.render(&compaction, target, vocabulary)
    }
}
