use std::collections::VecDeque;

use bit_set::BitSet;
use itertools::Itertools;
use tracing::debug;

use crate::automaton::{Automaton, StateIndex, SymbolIndex};

/// Type alias for a minimal representative of a state which is its length-lexicographically minimal
/// access sequence and its state index.
pub type MinimalRepresentative = (Vec<SymbolIndex>, StateIndex);

/// Iterator that yields the minimal representatives of all states reachable from a given
/// origin. A minimal representative for a state `q` is the length-lexicographically minimal
/// word with which `q` can be reached. The traversal keeps an explicit queue, so it does not
/// recurse no matter how large the automaton is.
#[derive(Debug, Clone)]
pub struct MinimalRepresentatives<'a> {
    automaton: &'a Automaton,
    seen: BitSet,
    queue: VecDeque<MinimalRepresentative>,
}

impl<'a> MinimalRepresentatives<'a> {
    /// Starts the traversal in `origin`.
    pub fn new(automaton: &'a Automaton, origin: StateIndex) -> Self {
        let mut seen = BitSet::with_capacity(automaton.size());
        seen.insert(origin);
        let queue = [(vec![], origin)].into_iter().collect();
        Self {
            automaton,
            seen,
            queue,
        }
    }
}

impl Iterator for MinimalRepresentatives<'_> {
    type Item = MinimalRepresentative;

    fn next(&mut self) -> Option<Self::Item> {
        let (access, q) = self.queue.pop_front()?;
        let automaton = self.automaton;
        for (sym, t) in automaton.transitions_from(q) {
            if self.seen.insert(t.target) {
                let mut new_access = access.clone();
                new_access.push(sym);
                self.queue.push_back((new_access, t.target));
            }
        }
        Some((access, q))
    }
}

/// Allows iterating over the indices of all reachable states of an [`Automaton`] in
/// breadth-first order.
#[derive(Debug, Clone)]
pub struct ReachableStateIndices<'a>(MinimalRepresentatives<'a>);

impl<'a> ReachableStateIndices<'a> {
    /// Starts the traversal in `origin`.
    pub fn new(automaton: &'a Automaton, origin: StateIndex) -> Self {
        Self(MinimalRepresentatives::new(automaton, origin))
    }
}

impl Iterator for ReachableStateIndices<'_> {
    type Item = StateIndex;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(_, q)| q)
    }
}

impl Automaton {
    /// Returns the minimal representatives of all states reachable from the initial state.
    pub fn minimal_representatives(&self) -> MinimalRepresentatives<'_> {
        MinimalRepresentatives::new(self, self.initial())
    }

    /// Returns the indices of all states reachable from the initial state, in breadth-first
    /// order.
    pub fn reachable_state_indices(&self) -> ReachableStateIndices<'_> {
        ReachableStateIndices::new(self, self.initial())
    }

    /// Returns the set of states that are reachable from the initial state. The set is
    /// computed once and cached until the transition table changes. Undefined transitions are
    /// simply not followed.
    pub fn accessible_states(&self) -> &BitSet {
        self.accessible.get_or_init(|| {
            let accessible: BitSet = self.reachable_state_indices().collect();
            debug!(
                "{} of {} states are accessible",
                accessible.len(),
                self.size()
            );
            accessible
        })
    }

    /// Returns true if the given state is reachable from the initial state.
    pub fn is_accessible(&self, state: StateIndex) -> bool {
        self.accessible_states().contains(state)
    }

    /// Returns all states that cannot be reached from the initial state, in the order in
    /// which they are declared.
    pub fn inaccessible_states(&self) -> Vec<StateIndex> {
        let accessible = self.accessible_states();
        self.states()
            .positions()
            .filter(|q| !accessible.contains(*q))
            .collect()
    }

    /// Labels of the accessible states, in declaration order.
    pub fn accessible_state_names(&self) -> Vec<&str> {
        let accessible = self.accessible_states();
        self.states()
            .positions()
            .filter(|q| accessible.contains(*q))
            .map(|q| self.state_label(q))
            .collect()
    }

    /// Labels of the inaccessible states, in declaration order.
    pub fn inaccessible_state_names(&self) -> Vec<&str> {
        self.inaccessible_states()
            .into_iter()
            .map(|q| self.state_label(q))
            .collect_vec()
    }
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use crate::automaton::tests::abcd;
    use crate::prelude::*;

    #[test]
    fn reachable_states() {
        let mut mm = Automaton::new(["a", "b"], ["0", "1"], ["0", "1", "2", "3"], "0").unwrap();
        for (state, row) in [
            ("0", [("1", "0"), ("0", "0")]),
            ("1", [("2", "0"), ("0", "0")]),
            ("2", [("2", "1"), ("2", "1")]),
            ("3", [("0", "1"), ("3", "1")]),
        ] {
            mm.add_transitions(state, TransitionRow::Positional(row.to_vec()))
                .unwrap();
        }

        assert_eq!(
            mm.minimal_representatives().collect_vec(),
            vec![(vec![], 0), (vec![0], 1), (vec![0, 0], 2)]
        );
        assert_eq!(mm.reachable_state_indices().collect_vec(), vec![0, 1, 2]);
        assert_eq!(mm.inaccessible_states(), vec![3]);
        assert_eq!(mm.inaccessible_state_names(), vec!["3"]);
        assert_eq!(mm.accessible_state_names(), vec!["0", "1", "2"]);
        assert!(mm.is_accessible(2));
        assert!(!mm.is_accessible(3));
    }

    #[test]
    fn accessible_and_inaccessible_cover_all_states() {
        let mm = abcd();
        assert!(mm.inaccessible_states().is_empty());
        assert_eq!(mm.accessible_states().len(), 4);
    }

    #[test]
    fn cache_is_dropped_on_write() {
        let mut mm = Automaton::new(["a"], ["0"], ["p", "q"], "p").unwrap();
        mm.add_transition("p", "p", "a", "0").unwrap();
        assert_eq!(mm.inaccessible_state_names(), vec!["q"]);
        mm.add_transition("p", "q", "a", "0").unwrap();
        assert!(mm.inaccessible_states().is_empty());
    }

    #[test]
    fn partial_tables_are_traversed() {
        let mut mm = Automaton::new(["a", "b"], ["0"], ["p", "q", "r"], "p").unwrap();
        mm.add_transition("p", "q", "b", "0").unwrap();
        assert_eq!(mm.accessible_state_names(), vec!["p", "q"]);
    }
}
