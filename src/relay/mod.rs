//! The facade host applications drive.
//!
//! Each request mints fresh object names, renders its commands through the
//! session's [`Vocabulary`], and delivers them as one acknowledged batch.
//! Requests made while no renderer is connected come back as
//! [`Delivery::Dropped`] instead of failing.

mod receipt;

use std::collections::BTreeSet;
use std::path::Path;

pub use receipt::{Delivery, Receipt};

use crate::channel::{ChannelState, FlushOutcome};
use crate::command::Command;
use crate::compact::{runs, EdgeCompactor, EdgePair};
use crate::error::RelayError;
use crate::naming::{NameAllocator, ObjectName, Role};
use crate::options::{CompactionOptions, RelayOptions};
use crate::session::Session;
use crate::vocabulary::{EdgeTarget, PymolVocabulary, Vocabulary};

/// Residues of one structure taking part in a superposition.
#[derive(Debug, Clone, Copy)]
pub struct StructureResidues<'a> {
    /// Structure (loaded object) id.
    pub structure: &'a str,
    /// Residues to fit on.
    pub residues: &'a BTreeSet<u32>,
}

/// Turns visualization requests into acknowledged command batches.
pub struct Relay {
    session: Session,
    names: NameAllocator,
    compactor: EdgeCompactor,
    vocabulary: Box<dyn Vocabulary>,
}

impl Relay {
    /// Launch and initialize a renderer session.
    ///
    /// A renderer that fails to launch or to acknowledge the prologue does
    /// not fail the call: the relay comes back in no-renderer or degraded
    /// mode and the failure is logged.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Io`] if the channel's working directory cannot
    /// be prepared.
    pub fn start(options: &RelayOptions) -> Result<Self, RelayError> {
        let mut session = Session::startup(
            options.process.clone(),
            options.channel.clone(),
        )?;
        if let Err(e) = session.initialize() {
            log::error!("renderer prologue failed: {e}");
        }
        Ok(Self::new(session, &options.compaction))
    }

    /// Facade over an existing session, using PyMOL syntax.
    #[must_use]
    pub fn new(session: Session, compaction: &CompactionOptions) -> Self {
        Self {
            session,
            names: NameAllocator::new(),
            compactor: EdgeCompactor::new(compaction),
            vocabulary: Box::new(PymolVocabulary),
        }
    }

    /// Replace the command syntax.
    #[must_use]
    pub fn with_vocabulary(mut self, vocabulary: Box<dyn Vocabulary>) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    /// The underlying session.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Mutable access to the underlying session.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// The session's name allocator.
    #[must_use]
    pub fn names(&self) -> &NameAllocator {
        &self.names
    }

    /// Load a structure file as object `structure_id`.
    ///
    /// # Errors
    ///
    /// [`RelayError::Degraded`] until the relay is reconnected after a
    /// timeout; otherwise whatever delivering the batch reports.
    pub fn load_structure(
        &mut self,
        path: &Path,
        structure_id: &str,
    ) -> Result<Receipt, RelayError> {
        if !self.accepting()? {
            return Ok(Receipt::dropped());
        }
        let commands = self.vocabulary.load(path, structure_id)?;
        self.deliver(vec![ObjectName::external(structure_id)], commands)
    }

    /// Draw `edges` between residues of `first` (first coordinates) and
    /// `second` (second coordinates) as a new contact object.
    ///
    /// Pairs are kept in the order given, so `(1, 5)` and `(5, 1)` draw two
    /// connections. Build intra-structure contacts with
    /// [`EdgePair::unordered`] to collapse them.
    ///
    /// # Errors
    ///
    /// [`RelayError::SelectionTooLarge`] when the set packs into too many
    /// groups; nothing is sent in that case. Otherwise as for
    /// [`load_structure`](Self::load_structure).
    pub fn draw_edges(
        &mut self,
        first: &str,
        second: &str,
        edges: &BTreeSet<EdgePair>,
    ) -> Result<Receipt, RelayError> {
        if !self.accepting()? {
            return Ok(Receipt::dropped());
        }
        let compaction = self.compactor.compact(edges)?;
        if edges.is_empty() {
            return Ok(Receipt::nothing());
        }
        let target = EdgeTarget {
            object: self.names.allocate(&Role::Cont, first),
            first: first.to_owned(),
            second: second.to_owned(),
        };
        let commands = self.compactor.render(
            &compaction,
            &target,
            self.vocabulary.as_ref(),
        )?;
        self.deliver(vec![target.object], commands)
    }

    /// Select `residues` of `structure_id` as a new node selection.
    ///
    /// # Errors
    ///
    /// [`RelayError::Degraded`] until the relay is reconnected after a
    /// timeout; otherwise whatever delivering the batch reports.
    pub fn select_residues(
        &mut self,
        structure_id: &str,
        residues: &BTreeSet<u32>,
    ) -> Result<Receipt, RelayError> {
        if !self.accepting()? {
            return Ok(Receipt::dropped());
        }
        if residues.is_empty() {
            return Ok(Receipt::nothing());
        }
        let name = self.names.allocate(&Role::Nodes, structure_id);
        let commands = self.selection_commands(&name, structure_id, residues)?;
        self.deliver(vec![name], commands)
    }

    /// Group existing objects under a new group named after
    /// `structure_id`.
    ///
    /// # Errors
    ///
    /// [`RelayError::Degraded`] until the relay is reconnected after a
    /// timeout; otherwise whatever delivering the batch reports.
    pub fn group(
        &mut self,
        structure_id: &str,
        members: &[ObjectName],
    ) -> Result<Receipt, RelayError> {
        if !self.accepting()? {
            return Ok(Receipt::dropped());
        }
        if members.is_empty() {
            return Ok(Receipt::nothing());
        }
        let group = self.names.allocate(&Role::Grp, structure_id);
        let command = self.vocabulary.group(&group, members)?;
        self.deliver(vec![group], vec![command])
    }

    /// Draw filled triangles between residue triples of `structure_id`,
    /// all in one freshly defined color.
    ///
    /// # Errors
    ///
    /// [`RelayError::Degraded`] until the relay is reconnected after a
    /// timeout; otherwise whatever delivering the batch reports.
    pub fn draw_triangles(
        &mut self,
        structure_id: &str,
        triangles: &[[u32; 3]],
        rgb: [f32; 3],
    ) -> Result<Receipt, RelayError> {
        if !self.accepting()? {
            return Ok(Receipt::dropped());
        }
        if triangles.is_empty() {
            return Ok(Receipt::nothing());
        }
        let name = self.names.allocate(&Role::Tri, structure_id);
        let color = self.names.allocate_color();
        let mut commands = Vec::with_capacity(triangles.len() + 1);
        commands.push(self.vocabulary.define_color(&color, rgb)?);
        for corners in triangles {
            commands.push(self.vocabulary.triangle(
                &name,
                structure_id,
                *corners,
                &color,
            )?);
        }
        self.deliver(vec![name, color], commands)
    }

    /// Superpose `mobile` onto `reference`, fitting on the given residues.
    ///
    /// Both residue selections are created as named objects.
    ///
    /// # Errors
    ///
    /// As for [`select_residues`](Self::select_residues).
    pub fn superpose(
        &mut self,
        mobile: StructureResidues<'_>,
        reference: StructureResidues<'_>,
    ) -> Result<Receipt, RelayError> {
        if !self.accepting()? {
            return Ok(Receipt::dropped());
        }
        if mobile.residues.is_empty() || reference.residues.is_empty() {
            return Ok(Receipt::nothing());
        }
        let mobile_sel = self.names.allocate(&Role::Sup, mobile.structure);
        let reference_sel =
            self.names.allocate(&Role::Sup, reference.structure);
        let mut commands = self.selection_commands(
            &mobile_sel,
            mobile.structure,
            mobile.residues,
        )?;
        commands.extend(self.selection_commands(
            &reference_sel,
            reference.structure,
            reference.residues,
        )?);
        commands.push(self.vocabulary.superpose(&mobile_sel, &reference_sel)?);
        self.deliver(vec![mobile_sel, reference_sel], commands)
    }

    /// Remove objects from the renderer.
    ///
    /// # Errors
    ///
    /// [`RelayError::Degraded`] until the relay is reconnected after a
    /// timeout; otherwise whatever delivering the batch reports.
    pub fn delete(
        &mut self,
        objects: &[ObjectName],
    ) -> Result<Receipt, RelayError> {
        if !self.accepting()? {
            return Ok(Receipt::dropped());
        }
        let commands = objects
            .iter()
            .map(|name| self.vocabulary.delete(name))
            .collect::<Result<Vec<_>, _>>()?;
        self.deliver(Vec::new(), commands)
    }

    /// Deliver caller-supplied commands as one batch.
    ///
    /// # Errors
    ///
    /// [`RelayError::Degraded`] until the relay is reconnected after a
    /// timeout; otherwise whatever delivering the batch reports.
    pub fn send_raw(
        &mut self,
        commands: Vec<Command>,
    ) -> Result<Receipt, RelayError> {
        if !self.accepting()? {
            return Ok(Receipt::dropped());
        }
        self.deliver(Vec::new(), commands)
    }

    /// Explicitly reconnect after a timeout or transport failure.
    ///
    /// # Errors
    ///
    /// See [`Session::reconnect`].
    pub fn reconnect(&mut self) -> Result<(), RelayError> {
        self.session.reconnect()
    }

    /// Quit the renderer. Idempotent.
    pub fn shutdown(&mut self) {
        self.session.shutdown();
    }

    /// `Ok(true)` when requests can be delivered, `Ok(false)` when they
    /// should be dropped, `Err` when the channel needs a reconnect first.
    fn accepting(&self) -> Result<bool, RelayError> {
        match self.session.channel().state() {
            ChannelState::Idle => Ok(true),
            ChannelState::Degraded => Err(RelayError::Degraded),
            _ => Ok(false),
        }
    }

    fn selection_commands(
        &self,
        name: &ObjectName,
        structure: &str,
        residues: &BTreeSet<u32>,
    ) -> Result<Vec<Command>, RelayError> {
        let all = runs::to_runs(residues.iter().copied());
        let overhead = self
            .vocabulary
            .extend_selection(name, structure, "")?
            .len();
        let budget = self.compactor.max_command_len().saturating_sub(overhead);
        runs::chunk_runs(&all, budget)
            .iter()
            .enumerate()
            .map(|(i, chunk)| {
                let text = runs::format_runs(chunk);
                if i == 0 {
                    self.vocabulary.select(name, structure, &text)
                } else {
                    self.vocabulary.extend_selection(name, structure, &text)
                }
            })
            .collect()
    }

    fn deliver(
        &mut self,
        objects: Vec<ObjectName>,
        commands: Vec<Command>,
    ) -> Result<Receipt, RelayError> {
        if commands.is_empty() {
            return Ok(Receipt {
                objects,
                delivery: Delivery::Nothing,
            });
        }
        let channel = self.session.channel_mut();
        channel.enqueue_all(commands);
        let delivery = match channel.flush()? {
            FlushOutcome::Acknowledged { seq } => Delivery::Acknowledged { seq },
            FlushOutcome::Empty => Delivery::Dropped,
        };
        Ok(Receipt { objects, delivery })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::test_support::{quick_options, EchoRenderer, SharedSink};
    use crate::options::ProcessOptions;

    struct Harness {
        relay: Relay,
        renderer: EchoRenderer,
        _dir: tempfile::TempDir,
    }

    fn harness(compaction: &CompactionOptions) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let options = quick_options(dir.path());
        let renderer = EchoRenderer::new(&options.ack_path(), "END");
        let session = Session::attach(
            ProcessOptions::default(),
            options,
            Box::new(renderer.clone()),
        )
        .unwrap();
        Harness {
            relay: Relay::new(session, compaction),
            renderer,
            _dir: dir,
        }
    }

    fn edges(pairs: impl IntoIterator<Item = (u32, u32)>) -> BTreeSet<EdgePair> {
        pairs.into_iter().map(EdgePair::from).collect()
    }

    #[test]
    fn load_then_draw_contacts() {
        let mut h = harness(&CompactionOptions::default());
        let loaded = h
            .relay
            .load_structure(Path::new("/data/1abc.pdb"), "1ABC")
            .unwrap();
        assert_eq!(loaded.delivery, Delivery::Acknowledged { seq: 1 });

        let drawn = h
            .relay
            .draw_edges("1ABC", "1ABC", &edges([(1, 2), (1, 3), (1, 5)]))
            .unwrap();
        assert_eq!(drawn.delivery, Delivery::Acknowledged { seq: 2 });
        assert_eq!(drawn.object().unwrap().as_str(), "Sel1_1ABC_Cont");

        let executed = h.renderer.executed();
        assert_eq!(executed.len(), 6);
        assert_eq!(executed[0], "load /data/1abc.pdb, 1ABC");
        assert!(executed[5].starts_with("distance Sel1_1ABC_Cont, "));
    }

    #[test]
    fn large_edge_sets_are_packed() {
        let mut h = harness(&CompactionOptions::default());
        let receipt = h
            .relay
            .draw_edges("1ABC", "2XYZ", &edges((2..=1001).map(|t| (1, t))))
            .unwrap();
        assert!(receipt.is_acknowledged());
        assert_eq!(
            h.renderer.executed(),
            ["distance Sel1_1ABC_Cont, 1ABC and resi 1 and name ca, \
              2XYZ and resi 2-1001 and name ca"]
        );
    }

    #[test]
    fn oversized_selection_never_reaches_the_channel() {
        let mut h = harness(&CompactionOptions {
            threshold: 5,
            max_groups: 3,
            max_command_len: 1000,
        });
        let result =
            h.relay.draw_edges("1ABC", "1ABC", &edges((0..10).map(|i| (i, 50))));
        assert!(matches!(
            result,
            Err(RelayError::SelectionTooLarge { groups: 10, limit: 3 })
        ));
        assert_eq!(h.relay.session().channel().last_seq(), 0);
        assert_eq!(h.relay.names().last_serial(), 0);
    }

    #[test]
    fn empty_requests_do_not_flush() {
        let mut h = harness(&CompactionOptions::default());
        let receipt =
            h.relay.draw_edges("1ABC", "1ABC", &BTreeSet::new()).unwrap();
        assert_eq!(receipt, Receipt::nothing());
        let receipt = h.relay.draw_triangles("1ABC", &[], [1.0; 3]).unwrap();
        assert_eq!(receipt.delivery, Delivery::Nothing);
        assert_eq!(h.relay.send_raw(Vec::new()).unwrap().delivery, Delivery::Nothing);
        assert_eq!(h.relay.session().channel().last_seq(), 0);
    }

    #[test]
    fn selections_group_under_fresh_names() {
        let mut h = harness(&CompactionOptions::default());
        let nodes = h
            .relay
            .select_residues("1ABC", &BTreeSet::from([4, 5, 6, 9]))
            .unwrap();
        let contacts = h
            .relay
            .draw_edges("1ABC", "1ABC", &edges([(4, 9)]))
            .unwrap();
        let members: Vec<ObjectName> =
            nodes.objects.into_iter().chain(contacts.objects).collect();
        let group = h.relay.group("1ABC", &members).unwrap();

        assert_eq!(group.object().unwrap().as_str(), "Sel3_1ABC_Grp");
        let executed = h.renderer.executed();
        assert_eq!(executed[0], "select Sel1_1ABC_Nodes, 1ABC and resi 4-6+9");
        assert_eq!(
            executed.last().unwrap(),
            "group Sel3_1ABC_Grp, Sel1_1ABC_Nodes Sel2_1ABC_Cont"
        );
    }

    #[test]
    fn long_selections_are_extended_in_pieces() {
        let mut h = harness(&CompactionOptions {
            max_command_len: 100,
            ..CompactionOptions::default()
        });
        let residues: BTreeSet<u32> = (0..200).map(|i| i * 3).collect();
        let receipt = h.relay.select_residues("1ABC", &residues).unwrap();
        assert!(receipt.is_acknowledged());

        let executed = h.renderer.executed();
        assert!(executed.len() > 1);
        assert!(executed[0].starts_with("select Sel1_1ABC_Nodes, 1ABC and"));
        assert!(executed[1]
            .starts_with("select Sel1_1ABC_Nodes, Sel1_1ABC_Nodes or (1ABC"));
        let decoded: BTreeSet<u32> = executed
            .iter()
            .map(|cmd| {
                let runs = cmd.rsplit("resi ").next().unwrap();
                runs.trim_end_matches(')').to_owned()
            })
            .flat_map(|text| runs::parse_runs(&text).unwrap())
            .flatten()
            .collect();
        assert_eq!(decoded, residues);
    }

    #[test]
    fn triangles_share_one_color() {
        let mut h = harness(&CompactionOptions::default());
        let receipt = h
            .relay
            .draw_triangles("1ABC", &[[1, 2, 3], [2, 3, 4]], [0.2, 0.4, 0.6])
            .unwrap();
        assert_eq!(receipt.objects.len(), 2);
        assert_eq!(receipt.objects[1].as_str(), "Color2");

        let executed = h.renderer.executed();
        assert_eq!(executed[0], "set_color Color2, [0.200, 0.400, 0.600]");
        assert_eq!(executed.len(), 3);
        assert!(executed[1].starts_with("triangle Sel1_1ABC_Tri, "));
        assert!(executed[2].ends_with(", Color2"));
    }

    #[test]
    fn superpose_selects_then_fits() {
        let mut h = harness(&CompactionOptions::default());
        let mobile = BTreeSet::from([1, 2, 3]);
        let reference = BTreeSet::from([11, 12, 13]);
        let receipt = h
            .relay
            .superpose(
                StructureResidues { structure: "1ABC", residues: &mobile },
                StructureResidues { structure: "2XYZ", residues: &reference },
            )
            .unwrap();
        assert!(receipt.is_acknowledged());
        assert_eq!(
            h.renderer.executed(),
            [
                "select Sel1_1ABC_Sup, 1ABC and resi 1-3",
                "select Sel2_2XYZ_Sup, 2XYZ and resi 11-13",
                "pair_fit Sel1_1ABC_Sup and name ca, Sel2_2XYZ_Sup and name ca",
            ]
        );
    }

    #[test]
    fn shutdown_sends_quit_outside_the_command_file() {
        let mut h = harness(&CompactionOptions::default());
        let _ = h.relay.send_raw(vec![Command::new("zoom").unwrap()]).unwrap();
        h.relay.shutdown();

        assert_eq!(h.renderer.executed(), ["zoom"]);
        let direct = h.renderer.direct();
        assert_eq!(direct.len(), 1);
        assert_eq!(direct[0], "quit");
        assert!(matches!(
            h.relay.send_raw(vec![Command::new("zoom").unwrap()]),
            Ok(Receipt { delivery: Delivery::Dropped, .. })
        ));
    }

    #[test]
    fn delete_removes_named_objects() {
        let mut h = harness(&CompactionOptions::default());
        let receipt = h
            .relay
            .delete(&[ObjectName::external("Sel1_1ABC_Cont")])
            .unwrap();
        assert!(receipt.objects.is_empty());
        assert_eq!(h.renderer.executed(), ["delete Sel1_1ABC_Cont"]);
    }

    #[test]
    fn missing_renderer_drops_requests() {
        let dir = tempfile::tempdir().unwrap();
        let mut options = RelayOptions::default();
        options.process.executable = "/nonexistent/molrelay-renderer".into();
        options.channel = quick_options(dir.path());
        let mut relay = Relay::start(&options).unwrap();

        let receipt = relay
            .draw_edges("1ABC", "1ABC", &edges([(1, 2)]))
            .unwrap();
        assert_eq!(receipt, Receipt::dropped());
        assert_eq!(relay.names().last_serial(), 0);
        relay.shutdown();
        relay.shutdown();
    }

    #[test]
    fn degraded_relay_refuses_until_reconnected() {
        let dir = tempfile::tempdir().unwrap();
        let options = quick_options(dir.path());
        let session = Session::attach(
            ProcessOptions::default(),
            options,
            Box::new(SharedSink::default()),
        )
        .unwrap();
        let mut relay = Relay::new(session, &CompactionOptions::default());

        let cmd = Command::new("zoom").unwrap();
        assert!(matches!(
            relay.send_raw(vec![cmd.clone()]),
            Err(RelayError::AckTimeout { seq: 1, .. })
        ));
        assert!(matches!(
            relay.send_raw(vec![cmd]),
            Err(RelayError::Degraded)
        ));
        relay.reconnect().unwrap();
        assert!(relay.session().channel().is_ready());
    }
}
