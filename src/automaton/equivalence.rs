use std::collections::VecDeque;

use tracing::trace;

use crate::math::Set;

use super::{Automaton, StateIndex, SymbolIndex};

/// Searches the product of `left` (started in `p`) and `right` (started in `q`) breadth-first
/// for a shortest word on which the two produce different outputs. Only symbols of `left` are
/// considered, `symbols[a]` gives the position of the a-th symbol of `left` in `right`. A
/// transition that exists on one side only separates as well.
fn restricted_witness(
    left: &Automaton,
    p: StateIndex,
    right: &Automaton,
    q: StateIndex,
    symbols: &[Option<SymbolIndex>],
) -> Option<Vec<SymbolIndex>> {
    let mut seen = Set::from_iter([(p, q)]);
    let mut queue = VecDeque::from([(vec![], p, q)]);

    while let Some((word, l, r)) = queue.pop_front() {
        for (a, b) in symbols.iter().enumerate() {
            let lt = left.transition(l, a);
            let rt = b.and_then(|b| right.transition(r, b));
            let extended = || {
                let mut extended = word.clone();
                extended.push(a);
                extended
            };
            match (lt, rt) {
                (Some(lt), Some(rt)) => {
                    if left.outputs().try_nth(lt.output) != right.outputs().try_nth(rt.output) {
                        return Some(extended());
                    }
                    if seen.insert((lt.target, rt.target)) {
                        queue.push_back((extended(), lt.target, rt.target));
                    }
                }
                (None, None) => {}
                _ => return Some(extended()),
            }
        }
    }
    None
}

/// Maps each input symbol of `from` to the position of the equally labelled symbol in `to`.
fn symbol_correspondence(from: &Automaton, to: &Automaton) -> Vec<Option<SymbolIndex>> {
    from.inputs()
        .labels()
        .map(|sym| to.inputs().try_position(sym))
        .collect()
}

impl Automaton {
    /// Computes a shortest word (as symbol positions) on which the states `p` and `q` emit
    /// different output sequences. If the two states are equivalent, `None` is returned.
    pub fn separating_word(&self, p: StateIndex, q: StateIndex) -> Option<Vec<SymbolIndex>> {
        let identity: Vec<_> = self.inputs().positions().map(Some).collect();
        restricted_witness(self, p, self, q, &identity)
    }

    /// Attempts to construct a word (given by its labels) that separates `self` from `other`
    /// when both are started in their initial states. Symbols are matched by label, a symbol
    /// that only one of the two machines knows separates them immediately. If no such word
    /// exists, `None` is returned.
    pub fn witness_inequivalence(&self, other: &Automaton) -> Option<Vec<String>> {
        let forward = restricted_witness(
            self,
            self.initial(),
            other,
            other.initial(),
            &symbol_correspondence(self, other),
        )
        .map(|word| labels_of(self, &word));
        let backward = restricted_witness(
            other,
            other.initial(),
            self,
            self.initial(),
            &symbol_correspondence(other, self),
        )
        .map(|word| labels_of(other, &word));

        let witness = match (forward, backward) {
            (Some(f), Some(b)) => Some(if b.len() < f.len() { b } else { f }),
            (f, b) => f.or(b),
        };
        if let Some(word) = &witness {
            trace!("found separating word {word:?}");
        }
        witness
    }

    /// Returns true if and only if both machines produce the same outputs on every input.
    pub fn bisimilar(&self, other: &Automaton) -> bool {
        self.witness_inequivalence(other).is_none()
    }
}

fn labels_of(automaton: &Automaton, word: &[SymbolIndex]) -> Vec<String> {
    word.iter()
        .map(|&a| automaton.inputs().try_nth(a).unwrap_or("?").to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::automaton::tests::abcd;
    use crate::prelude::*;

    fn mealy(rows: [(&str, [(&str, &str); 2]); 3]) -> Automaton {
        let mut mm = Automaton::new(["a", "b"], ["0", "1", "2"], ["0", "1", "2"], "0").unwrap();
        for (state, row) in rows {
            mm.add_transitions(state, TransitionRow::Positional(row.to_vec()))
                .unwrap();
        }
        mm
    }

    #[test]
    fn mealy_equivalence() {
        let mm1 = mealy([
            ("0", [("1", "0"), ("0", "1")]),
            ("1", [("1", "0"), ("0", "2")]),
            ("2", [("1", "0"), ("0", "0")]),
        ]);
        let mm2 = mealy([
            ("0", [("1", "0"), ("0", "1")]),
            ("1", [("1", "0"), ("0", "2")]),
            ("2", [("1", "0"), ("1", "0")]),
        ]);
        // state 2 is unreachable, so the machines only differ in an invisible part
        assert!(mm1.bisimilar(&mm2));
        assert_eq!(mm1.separating_word(0, 1), Some(vec![1]));
        assert_eq!(mm1.separating_word(1, 1), None);
    }

    #[test]
    fn separating_words_of_abcd() {
        let mm = abcd();
        assert_eq!(mm.separating_word(1, 2), None);
        assert_eq!(mm.separating_word(0, 3), Some(vec![0, 0]));
        assert_eq!(mm.separating_word(0, 1), Some(vec![0]));
    }

    #[test]
    fn unmatched_symbols_separate() {
        let mut left = Automaton::new(["a"], ["0"], ["p"], "p").unwrap();
        left.add_transition("p", "p", "a", "0").unwrap();
        let mut right = Automaton::new(["a", "b"], ["0"], ["p"], "p").unwrap();
        right.add_transition("p", "p", "a", "0").unwrap();
        right.add_transition("p", "p", "b", "0").unwrap();
        assert_eq!(left.witness_inequivalence(&right), Some(vec!["b".to_string()]));
        assert!(!right.bisimilar(&left));
    }
}
