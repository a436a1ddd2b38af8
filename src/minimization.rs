use thiserror::Error;
use tracing::info;

use crate::automaton::{Automaton, IncompleteTransitionError, StateIndex};

mod partition_refinement;
pub use partition_refinement::PartitionSequence;

mod quotient;
pub use quotient::{Quotient, QuotientError};

/// Everything that can go wrong while minimizing an [`Automaton`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum MinimizationError {
    #[error(transparent)]
    Incomplete(#[from] IncompleteTransitionError),
    #[error(transparent)]
    Quotient(#[from] QuotientError),
}

/// The outcome of [`Automaton::minimize`]: the minimal automaton together with the
/// intermediate results that led to it.
#[derive(Debug, Clone)]
pub struct Minimization {
    minimized: Automaton,
    partitions: PartitionSequence,
    inaccessible: Vec<StateIndex>,
    classes: Vec<Option<StateIndex>>,
}

impl Minimization {
    /// The minimal automaton.
    pub fn automaton(&self) -> &Automaton {
        &self.minimized
    }

    /// Consumes `self`, returning the minimal automaton.
    pub fn into_automaton(self) -> Automaton {
        self.minimized
    }

    /// The partitions `P0, …, Pk` computed during refinement, over states of the input.
    pub fn partitions(&self) -> &PartitionSequence {
        &self.partitions
    }

    /// States of the input that cannot be reached and were dropped.
    pub fn inaccessible_states(&self) -> &[StateIndex] {
        &self.inaccessible
    }

    /// The state of the minimal automaton that stands for the given state of the input, or
    /// `None` if that state is inaccessible.
    pub fn class_of(&self, state: StateIndex) -> Option<StateIndex> {
        self.classes.get(state).copied().flatten()
    }

    /// Returns true if the input already was minimal, i.e. no state was dropped or merged.
    pub fn is_minimal(&self) -> bool {
        self.inaccessible.is_empty() && self.minimized.size() == self.classes.len()
    }
}

impl Automaton {
    /// Computes the unique (up to renaming of states) minimal automaton that behaves like
    /// `self`: started in corresponding states, both produce the same output sequence for
    /// every input word. Inaccessible states are removed, then Moore's partition refinement
    /// determines which of the remaining states are equivalent, and finally every class of
    /// equivalent states is collapsed into one state of the [`Quotient`].
    ///
    /// Fails with [`MinimizationError::Incomplete`] if the transition function is not total.
    ///
    /// # Example
    /// ```
    /// use transducers::prelude::*;
    ///
    /// let mut mm = Automaton::new(["a"], ["0", "1"], ["p", "q", "r"], "p").unwrap();
    /// mm.add_transition("p", "q", "a", "0").unwrap();
    /// mm.add_transition("q", "p", "a", "0").unwrap();
    /// mm.add_transition("r", "p", "a", "1").unwrap();
    ///
    /// let min = mm.minimize().unwrap();
    /// assert_eq!(min.automaton().size(), 1);
    /// assert_eq!(min.inaccessible_states(), &[2]);
    /// assert!(min.automaton().bisimilar(&mm));
    /// ```
    pub fn minimize(&self) -> Result<Minimization, MinimizationError> {
        let partitions = self.partition_sequence()?.clone();
        let (minimized, classes) = self.quotient(partitions.fixpoint())?.into_parts();
        info!(
            "minimized automaton from {} to {} states in {} rounds",
            self.size(),
            minimized.size(),
            partitions.rounds()
        );
        Ok(Minimization {
            minimized,
            partitions,
            inaccessible: self.inaccessible_states(),
            classes,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::automaton::tests::abcd;
    use crate::prelude::*;

    #[test_log::test]
    fn abcd_minimizes_to_three_states() {
        let mm = abcd();
        let min = mm.minimize().unwrap();

        assert!(min.inaccessible_states().is_empty());
        assert_eq!(min.partitions().len(), 2);
        assert_eq!(
            mm.show_partition(min.partitions().fixpoint()),
            "{A} {D} {B, C}"
        );
        assert_eq!(min.automaton().size(), 3);
        assert_eq!(min.class_of(1), min.class_of(2));
        assert_ne!(min.class_of(0), min.class_of(3));
        assert_eq!(min.automaton().initial(), 0);
        assert!(!min.is_minimal());
        assert!(min.automaton().bisimilar(&mm));
    }

    #[test]
    fn inaccessible_states_are_dropped() {
        let mut mm = Automaton::new(["a"], ["x", "y"], ["p", "q", "u"], "p").unwrap();
        mm.add_transition("p", "q", "a", "x").unwrap();
        mm.add_transition("q", "q", "a", "y").unwrap();
        mm.add_transition("u", "p", "a", "x").unwrap();

        let min = mm.minimize().unwrap();
        assert_eq!(min.inaccessible_states(), &[2]);
        assert_eq!(min.class_of(2), None);
        assert_eq!(min.automaton().size(), 2);
        assert_eq!(min.automaton().map(["a", "a", "a"]), Some(vec!["x", "y", "y"]));
    }

    #[test]
    fn minimizing_a_minimal_automaton_is_idempotent() {
        let min = abcd().minimize().unwrap().into_automaton();
        let again = min.minimize().unwrap();

        assert!(again.is_minimal());
        assert_eq!(again.automaton().size(), min.size());
        for q in min.states().positions() {
            assert_eq!(again.class_of(q), Some(q));
        }
        assert!(again.automaton().bisimilar(&min));
    }

    #[test]
    fn incomplete_automaton_is_not_minimized() {
        let mut mm = Automaton::new(["a", "b"], ["0"], ["p", "q"], "p").unwrap();
        mm.add_transition("p", "q", "a", "0").unwrap();
        mm.add_transition("p", "q", "b", "0").unwrap();
        mm.add_transition("q", "q", "a", "0").unwrap();
        assert_eq!(
            mm.minimize().unwrap_err(),
            MinimizationError::Incomplete(IncompleteTransitionError {
                state: "q".into(),
                symbol: "b".into()
            })
        );
    }

    #[cfg(feature = "random")]
    mod properties {
        use itertools::Itertools;

        use crate::prelude::*;
        use crate::random::generate_random_mealy_with;

        /// All words over `symbols` letters of length at most `max_len`.
        fn words(symbols: usize, max_len: usize) -> Vec<Vec<usize>> {
            let mut layer = vec![vec![]];
            let mut all = layer.clone();
            for _ in 0..max_len {
                layer = layer
                    .iter()
                    .flat_map(|w| {
                        (0..symbols).map(move |a| {
                            let mut extended: Vec<usize> = w.clone();
                            extended.push(a);
                            extended
                        })
                    })
                    .collect();
                all.extend(layer.iter().cloned());
            }
            all
        }

        #[test_log::test]
        fn accessible_and_inaccessible_partition_states() {
            let mut rng = fastrand::Rng::with_seed(7);
            for _ in 0..50 {
                let mm = generate_random_mealy_with(&mut rng, 2, 2, 8);
                let accessible = mm.accessible_states();
                let inaccessible = mm.inaccessible_states();
                assert_eq!(accessible.len() + inaccessible.len(), mm.size());
                assert!(inaccessible.iter().all(|q| !accessible.contains(*q)));
            }
        }

        #[test_log::test]
        fn partitions_refine_each_other() {
            let mut rng = fastrand::Rng::with_seed(11);
            for _ in 0..50 {
                let mm = generate_random_mealy_with(&mut rng, 2, 2, 10);
                let sequence = mm.partition_sequence().unwrap();
                assert!(sequence.len() <= mm.accessible_states().len());
                for (coarse, fine) in sequence.iter().tuple_windows() {
                    assert!(fine.refines(coarse));
                }
            }
        }

        #[test_log::test]
        fn minimization_preserves_behavior() {
            let mut rng = fastrand::Rng::with_seed(23);
            for _ in 0..30 {
                let mm = generate_random_mealy_with(&mut rng, 2, 3, 7);
                let min = mm.minimize().unwrap();
                for q in mm.reachable_state_indices() {
                    let p = min.class_of(q).unwrap();
                    for word in words(2, 4) {
                        assert_eq!(
                            mm.outputs_from(q, word.iter().copied()),
                            min.automaton().outputs_from(p, word.iter().copied())
                        );
                    }
                }
                assert!(min.automaton().bisimilar(&mm));
            }
        }

        #[test_log::test]
        fn blocks_are_exactly_the_equivalence_classes() {
            let mut rng = fastrand::Rng::with_seed(42);
            for _ in 0..30 {
                let mm = generate_random_mealy_with(&mut rng, 2, 2, 8);
                let min = mm.minimize().unwrap();
                let accessible = mm.reachable_state_indices().collect_vec();
                let all_words = words(2, mm.size());
                for (&p, &q) in accessible.iter().tuple_combinations() {
                    let same_block = min.class_of(p) == min.class_of(q);
                    let indistinguishable = all_words.iter().all(|w| {
                        mm.outputs_from(p, w.iter().copied())
                            == mm.outputs_from(q, w.iter().copied())
                    });
                    assert_eq!(same_block, indistinguishable);
                    assert_eq!(same_block, mm.separating_word(p, q).is_none());
                }
            }
        }

        #[test]
        fn minimization_is_idempotent() {
            let mut rng = fastrand::Rng::with_seed(5);
            for _ in 0..30 {
                let min = generate_random_mealy_with(&mut rng, 3, 2, 9)
                    .minimize()
                    .unwrap()
                    .into_automaton();
                let again = min.minimize().unwrap();
                assert!(again.is_minimal());
                assert_eq!(again.automaton().size(), min.size());
            }
        }
    }
}
