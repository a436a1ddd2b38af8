use bit_set::BitSet;
use itertools::Itertools;
use tracing::{debug, trace};

use crate::{
    automaton::{show_row, Automaton, IncompleteTransitionError, OutputIndex, StateIndex},
    math::{Map, Partition},
};

/// The history of a run of Moore's partition refinement: `P0` groups the accessible states by
/// the outputs they emit, and every further partition refines its predecessor by the blocks
/// that the successors of a state fall into. The last partition is the fixpoint, refining it
/// once more reproduces it. That reproduced copy is not stored, so the sequence holds at most
/// as many partitions as there are accessible states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionSequence(Vec<Partition<StateIndex>>);

impl PartitionSequence {
    /// The output-based partition `P0`.
    pub fn initial(&self) -> &Partition<StateIndex> {
        &self.0[0]
    }

    /// The coarsest partition that is consistent with outputs and transitions.
    pub fn fixpoint(&self) -> &Partition<StateIndex> {
        &self.0[self.0.len() - 1]
    }

    /// Number of recorded partitions.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false, there is at least the initial partition.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of refinement rounds that split at least one block.
    pub fn rounds(&self) -> usize {
        self.0.len() - 1
    }

    /// Iterates over `P0, P1, …, Pk`.
    pub fn iter(&self) -> std::slice::Iter<'_, Partition<StateIndex>> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a PartitionSequence {
    type Item = &'a Partition<StateIndex>;
    type IntoIter = std::slice::Iter<'a, Partition<StateIndex>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Groups the accessible states by their output signature, that is the sequence of outputs
/// emitted on each input symbol in declaration order. Blocks are created in the order in
/// which their first state is declared.
fn initial_partition(automaton: &Automaton, accessible: &BitSet) -> Partition<StateIndex> {
    let mut blocks: Vec<Vec<StateIndex>> = vec![];
    let mut by_signature: Map<Vec<Option<OutputIndex>>, usize> = Map::default();

    for q in automaton
        .states()
        .positions()
        .filter(|q| accessible.contains(*q))
    {
        let signature = automaton
            .inputs()
            .positions()
            .map(|a| automaton.transition(q, a).map(|t| t.output))
            .collect_vec();
        trace!(
            "output signature of {} is {signature:?}",
            automaton.state_label(q)
        );
        let id = *by_signature.entry(signature).or_insert_with(|| {
            blocks.push(vec![]);
            blocks.len() - 1
        });
        blocks[id].push(q);
    }

    Partition::new(blocks)
}

/// Performs one refinement step. Each state is keyed by the block it currently belongs to
/// followed by the blocks its successors belong to; states with equal keys stay together.
/// Since the current block is part of the key, states from different blocks are never merged.
fn refine(automaton: &Automaton, partition: &Partition<StateIndex>) -> Partition<StateIndex> {
    let lookup = partition.block_table(automaton.size());
    let mut blocks: Vec<Vec<StateIndex>> = vec![];
    let mut by_signature: Map<(usize, Vec<Option<usize>>), usize> = Map::default();

    for (i, block) in partition.iter().enumerate() {
        for &q in block {
            let successors = automaton
                .inputs()
                .positions()
                .map(|a| {
                    automaton
                        .transition(q, a)
                        .and_then(|t| lookup.get(t.target).copied().flatten())
                })
                .collect_vec();
            trace!(
                "{} [{}] has successor blocks {successors:?}",
                automaton.state_label(q),
                show_row(automaton, q)
            );
            let id = *by_signature.entry((i, successors)).or_insert_with(|| {
                blocks.push(vec![]);
                blocks.len() - 1
            });
            blocks[id].push(q);
        }
    }

    Partition::new(blocks)
}

/// Runs Moore's algorithm on the accessible part of `automaton` until a fixpoint is reached.
/// The transition function is expected to be total.
pub(crate) fn moore_partition_refinement(automaton: &Automaton) -> PartitionSequence {
    let accessible = automaton.accessible_states();
    let mut current = initial_partition(automaton, accessible);
    debug!(
        "initial partition has {} blocks: {}",
        current.size(),
        automaton.show_partition(&current)
    );

    let mut history = vec![];
    loop {
        let next = refine(automaton, &current);
        debug_assert!(next.refines(&current));
        // refinement only splits, so an equal number of blocks means nothing was split
        let stable = next.size() == current.size();
        debug!(
            "round {}: {} -> {} blocks",
            history.len() + 1,
            current.size(),
            next.size()
        );
        history.push(current);
        if stable {
            break;
        }
        current = next;
    }

    PartitionSequence(history)
}

impl Automaton {
    /// Computes the sequence of partitions produced by Moore's minimization algorithm on the
    /// accessible states. The result is cached until the transition table changes. Fails if
    /// some state lacks a transition.
    pub fn partition_sequence(&self) -> Result<&PartitionSequence, IncompleteTransitionError> {
        if let Some(sequence) = self.partitions.get() {
            return Ok(sequence);
        }
        self.ensure_complete()?;
        let sequence = moore_partition_refinement(self);
        Ok(self.partitions.get_or_init(|| sequence))
    }

    /// Renders a partition of the states of `self` by the labels of its members, for example
    /// `{A, D} {B, C}`.
    pub fn show_partition(&self, partition: &Partition<StateIndex>) -> String {
        partition
            .iter()
            .map(|block| format!("{{{}}}", block.iter().map(|&q| self.state_label(q)).join(", ")))
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use crate::automaton::tests::abcd;
    use crate::math::Partition;
    use crate::prelude::*;

    #[test_log::test]
    fn abcd_refinement() {
        let mm = abcd();
        let sequence = mm.partition_sequence().unwrap();

        assert_eq!(sequence.len(), 2);
        assert_eq!(sequence.rounds(), 1);
        assert_eq!(
            sequence.initial(),
            &Partition::new([vec![0, 3], vec![1, 2]])
        );
        assert_eq!(mm.show_partition(sequence.initial()), "{A, D} {B, C}");
        // discovery order is deterministic
        assert_eq!(mm.show_partition(sequence.fixpoint()), "{A} {D} {B, C}");
    }

    #[test]
    fn unreachable_states_do_not_participate() {
        let mut mm = Automaton::new(["a"], ["0", "1"], ["p", "q", "r"], "p").unwrap();
        mm.add_transition("p", "q", "a", "0").unwrap();
        mm.add_transition("q", "p", "a", "0").unwrap();
        mm.add_transition("r", "r", "a", "1").unwrap();

        let sequence = mm.partition_sequence().unwrap();
        assert_eq!(sequence.len(), 1);
        assert_eq!(mm.show_partition(sequence.fixpoint()), "{p, q}");
    }

    #[test]
    fn incomplete_automaton_is_rejected() {
        let mut mm = Automaton::new(["a", "b"], ["0"], ["p"], "p").unwrap();
        mm.add_transition("p", "p", "a", "0").unwrap();
        assert_eq!(
            mm.partition_sequence().unwrap_err(),
            IncompleteTransitionError {
                state: "p".into(),
                symbol: "b".into()
            }
        );
    }

    #[test]
    fn chain_needs_one_round_per_state() {
        // a counter that only emits 1 on the step leaving the last state
        let n = 5;
        let labels: Vec<_> = (0..n).map(|i| format!("s{i}")).collect();
        let mut mm = Automaton::new(["a"], ["0", "1"], labels.clone(), "s0").unwrap();
        for i in 0..n {
            let output = if i + 1 == n { "1" } else { "0" };
            mm.add_transition(&labels[i], &labels[(i + 1) % n], "a", output)
                .unwrap();
        }

        let sequence = mm.partition_sequence().unwrap();
        assert_eq!(sequence.fixpoint().size(), n);
        assert!(sequence.len() <= n);
        for (coarse, fine) in sequence.iter().zip(sequence.iter().skip(1)) {
            assert!(fine.refines(coarse));
            assert!(fine.size() > coarse.size());
        }
    }

    #[test]
    fn long_chain_splits_one_state_per_round() {
        let n = 1000;
        let labels: Vec<_> = (0..n).map(|i| format!("s{i}")).collect();
        let mut mm = Automaton::new(["a"], ["0", "1"], labels.clone(), "s0").unwrap();
        for i in 0..n {
            let output = if i + 1 == n { "1" } else { "0" };
            mm.add_transition(&labels[i], &labels[(i + 1) % n], "a", output)
                .unwrap();
        }

        let sequence = mm.partition_sequence().unwrap();
        assert_eq!(sequence.len(), n - 1);
        assert_eq!(sequence.fixpoint().size(), n);
        for (i, partition) in sequence.iter().enumerate() {
            assert_eq!(partition.size(), i + 2);
        }
    }

    #[test]
    fn empty_input_alphabet() {
        let mm = Automaton::new(Vec::<&str>::new(), ["0"], ["p", "q"], "p").unwrap();
        let sequence = mm.partition_sequence().unwrap();
        assert_eq!(mm.show_partition(sequence.fixpoint()), "{p}");
    }
}
