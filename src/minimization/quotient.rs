use bit_set::BitSet;
use thiserror::Error;
use tracing::trace;

use crate::{
    alphabet::Alphabet,
    automaton::{Automaton, IncompleteTransitionError, StateIndex, Transition},
    math::Partition,
};

/// Reasons for which the quotient of an [`Automaton`] by a [`Partition`] cannot be built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum QuotientError {
    #[error(transparent)]
    Incomplete(#[from] IncompleteTransitionError),
    #[error("state `{0}` is reached but not covered by the partition")]
    Uncovered(String),
    #[error("partition refers to state index {0}, which does not exist")]
    UnknownIndex(StateIndex),
    #[error("block {0} of the partition is empty")]
    EmptyBlock(usize),
    #[error("state `{0}` lies in more than one block of the partition")]
    Overlap(String),
}

/// A quotient merges the states of an [`Automaton`] which lie in the same block of some
/// [`Partition`] into a single state. We assume that the partition is a congruence, meaning
/// that for two blocks `X, Y`, all `p`, `q` in `X` and every symbol `a`, `p` moves on `a` into
/// `Y` with output `o` if and only if `q` does. The transitions of a block are thus those of any
/// of its members, and we simply take the smallest one as representative.
///
/// The states of the quotient are named `q0, q1, …` following the order of the blocks.
/// States of the original automaton that no block covers (usually the inaccessible ones) have
/// no counterpart.
#[derive(Debug, Clone)]
pub struct Quotient {
    automaton: Automaton,
    classes: Vec<Option<StateIndex>>,
}

impl Quotient {
    /// Gives a reference to the quotient automaton.
    pub fn automaton(&self) -> &Automaton {
        &self.automaton
    }

    /// Consumes `self` and returns the quotient automaton.
    pub fn into_automaton(self) -> Automaton {
        self.automaton
    }

    /// Returns the state of the quotient that represents the given state of the original
    /// automaton, if that state is covered.
    pub fn class_of(&self, state: StateIndex) -> Option<StateIndex> {
        self.classes.get(state).copied().flatten()
    }

    pub(crate) fn into_parts(self) -> (Automaton, Vec<Option<StateIndex>>) {
        (self.automaton, self.classes)
    }
}

impl Automaton {
    /// Builds the [`Quotient`] of `self` by the given partition. The input alphabet and the
    /// output alphabet are kept, the initial state of the quotient is the block containing the
    /// initial state of `self`. `self` is not modified.
    ///
    /// The partition must consist of disjoint blocks of existing states that cover the
    /// initial state and every successor of a covered state, otherwise a [`QuotientError`]
    /// is returned.
    pub fn quotient(&self, partition: &Partition<StateIndex>) -> Result<Quotient, QuotientError> {
        let mut covered = BitSet::with_capacity(self.size());
        for &q in partition.iter().flatten() {
            if q >= self.size() {
                return Err(QuotientError::UnknownIndex(q));
            }
            if !covered.insert(q) {
                return Err(QuotientError::Overlap(self.state_label(q).to_string()));
            }
        }
        let classes = partition.block_table(self.size());
        let class_of = |q: StateIndex| {
            classes
                .get(q)
                .copied()
                .flatten()
                .ok_or_else(|| QuotientError::Uncovered(self.state_label(q).to_string()))
        };

        let initial = class_of(self.initial())?;
        let mut table = Vec::with_capacity(partition.size());
        for (i, block) in partition.iter().enumerate() {
            let &representative = block.first().ok_or(QuotientError::EmptyBlock(i))?;
            let row = self
                .inputs()
                .positions()
                .map(|a| -> Result<_, QuotientError> {
                    let t = self.transition(representative, a).ok_or_else(|| {
                        IncompleteTransitionError {
                            state: self.state_label(representative).to_string(),
                            symbol: self.inputs().try_nth(a).unwrap_or("?").to_string(),
                        }
                    })?;
                    Ok(Some(Transition::new(class_of(t.target)?, t.output)))
                })
                .collect::<Result<Vec<_>, _>>()?;
            trace!(
                "block q{i} is represented by {}",
                self.state_label(representative)
            );
            table.push(row);
        }

        let automaton = Automaton::from_parts(
            self.inputs().clone(),
            self.outputs().clone(),
            Alphabet::numbered("q", partition.size()),
            initial,
            table,
        );
        Ok(Quotient { automaton, classes })
    }
}

#[cfg(test)]
mod tests {
    use super::QuotientError;
    use crate::automaton::tests::abcd;
    use crate::math::Partition;
    use crate::prelude::*;

    #[test]
    fn quotient_test() {
        let mm = abcd();
        let quot = mm
            .quotient(&Partition::new([vec![0], vec![3], vec![1, 2]]))
            .unwrap();
        let min = quot.automaton();

        assert_eq!(min.size(), 3);
        assert_eq!(min.initial(), 0);
        assert_eq!(quot.class_of(1), Some(2));
        assert_eq!(quot.class_of(2), Some(2));
        for (i, (target, output)) in [(2, 0), (2, 0), (1, 0), (1, 0), (1, 1), (1, 1)]
            .into_iter()
            .enumerate()
        {
            let (q, a) = (i / 2, i % 2);
            assert_eq!(min.transition(q, a), Some(Transition::new(target, output)));
        }
        assert!(min.is_complete());
        assert!(min.bisimilar(&mm));
        // the input is left untouched
        assert_eq!(mm.size(), 4);
    }

    #[test]
    fn initial_state_follows_its_block() {
        let mm = abcd();
        let quot = mm
            .quotient(&Partition::new([vec![3], vec![1, 2], vec![0]]))
            .unwrap();
        assert_eq!(quot.automaton().initial(), 2);
        assert_eq!(quot.automaton().state_label(2), "q2");
    }

    #[test]
    fn invalid_partitions() {
        let mm = abcd();
        assert_eq!(
            mm.quotient(&Partition::new([vec![0], vec![1, 2]]))
                .unwrap_err(),
            QuotientError::Uncovered("D".into())
        );
        assert_eq!(
            mm.quotient(&Partition::new([vec![0, 1, 2, 3, 9]]))
                .unwrap_err(),
            QuotientError::UnknownIndex(9)
        );
        assert_eq!(
            mm.quotient(&Partition::new([vec![1, 2, 3]])).unwrap_err(),
            QuotientError::Uncovered("A".into())
        );
        assert_eq!(
            mm.quotient(&Partition::new([vec![0, 1, 2], vec![1], vec![3]]))
                .unwrap_err(),
            QuotientError::Overlap("B".into())
        );
    }
}
