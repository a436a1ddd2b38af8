use std::cell::OnceCell;

use bit_set::BitSet;
use itertools::Itertools;
use thiserror::Error;
use tracing::trace;

use crate::{alphabet::Alphabet, minimization::PartitionSequence};

mod equivalence;

/// Position of a state in the state set `Q`.
pub type StateIndex = usize;
/// Position of a symbol in the input alphabet `S`.
pub type SymbolIndex = usize;
/// Position of a symbol in the output alphabet `R`.
pub type OutputIndex = usize;

/// The value of the transition function for one `(state, symbol)` pair: the state that is
/// reached together with the output that is emitted on the way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Transition {
    /// The state that is reached.
    pub target: StateIndex,
    /// The emitted output.
    pub output: OutputIndex,
}

impl Transition {
    /// Creates a new transition.
    pub fn new(target: StateIndex, output: OutputIndex) -> Self {
        Self { target, output }
    }
}

/// Names one of the three label sequences of an [`Automaton`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    /// The input alphabet `S`.
    Input,
    /// The output alphabet `R`.
    Output,
    /// The state set `Q`.
    State,
}

impl std::fmt::Display for LabelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LabelKind::Input => write!(f, "input alphabet"),
            LabelKind::Output => write!(f, "output alphabet"),
            LabelKind::State => write!(f, "state set"),
        }
    }
}

/// Errors that arise when an automaton is declared or a transition is written which refers
/// to something that was not declared.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum ValidationError {
    #[error("unknown state `{0}`")]
    UnknownState(String),
    #[error("unknown input symbol `{0}`")]
    UnknownInput(String),
    #[error("unknown output symbol `{0}`")]
    UnknownOutput(String),
    #[error("`{label}` is declared twice in the {kind}")]
    DuplicateLabel { kind: LabelKind, label: String },
    #[error("row for state `{state}` has {found} entries, but only {expected} input symbols are declared")]
    RowTooLong {
        state: String,
        expected: usize,
        found: usize,
    },
}

/// Raised when minimization is requested for an automaton whose transition function is not
/// total.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("state `{state}` has no transition on input `{symbol}`")]
pub struct IncompleteTransitionError {
    /// Label of the state that lacks a transition.
    pub state: String,
    /// Label of the input symbol for which the transition is missing.
    pub symbol: String,
}

/// The transitions of a single state, handed to [`Automaton::add_transitions`] at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionRow<S> {
    /// Entries of the form `(stimulus, destination, output)`.
    Keyed(Vec<(S, S, S)>),
    /// Entries of the form `(destination, output)`, where the i-th entry belongs to the i-th
    /// declared input symbol.
    Positional(Vec<(S, S)>),
}

/// A deterministic finite-state transducer in the style of a Mealy machine. It consists of an
/// input alphabet `S`, an output alphabet `R`, a set of states `Q` with a designated initial
/// state, and a transition function `δ: Q × S → Q × R`.
///
/// The transition function is stored as a dense table indexed by the positions of states and
/// symbols. It is filled through [`Automaton::add_transition`] and
/// [`Automaton::add_transitions`], which validate every label that is written. Results that
/// are derived from the table (the accessible states and the partition sequence) are computed
/// lazily, cached, and dropped whenever the table changes.
///
/// # Example
/// ```
/// use transducers::prelude::*;
///
/// let mut mm = Automaton::new(["a", "b"], ["0", "1"], ["p", "q"], "p").unwrap();
/// mm.add_transitions("p", TransitionRow::Positional(vec![("q", "0"), ("p", "1")]))
///     .unwrap();
/// mm.add_transitions("q", TransitionRow::Keyed(vec![("a", "q", "1"), ("b", "p", "0")]))
///     .unwrap();
/// assert!(mm.is_complete());
/// assert_eq!(mm.map(["a", "a", "b"]), Some(vec!["0", "1", "0"]));
/// ```
#[derive(Debug, Clone)]
pub struct Automaton {
    inputs: Alphabet,
    outputs: Alphabet,
    states: Alphabet,
    initial: StateIndex,
    table: Vec<Vec<Option<Transition>>>,
    pub(crate) accessible: OnceCell<BitSet>,
    pub(crate) partitions: OnceCell<PartitionSequence>,
}

impl Automaton {
    /// Declares a new automaton without any transitions. Fails if one of the label sequences
    /// contains a duplicate or if `initial` is not among `states`.
    pub fn new<I, O, Q, S, T, U>(
        inputs: I,
        outputs: O,
        states: Q,
        initial: &str,
    ) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        O: IntoIterator<Item = T>,
        Q: IntoIterator<Item = U>,
        S: Into<String>,
        T: Into<String>,
        U: Into<String>,
    {
        let duplicate = |kind: LabelKind| {
            move |label: String| ValidationError::DuplicateLabel { kind, label }
        };
        let inputs = Alphabet::try_from_labels(inputs).map_err(duplicate(LabelKind::Input))?;
        let outputs = Alphabet::try_from_labels(outputs).map_err(duplicate(LabelKind::Output))?;
        let states = Alphabet::try_from_labels(states).map_err(duplicate(LabelKind::State))?;
        let initial = states
            .try_position(initial)
            .ok_or_else(|| ValidationError::UnknownState(initial.to_string()))?;
        let table = vec![vec![None; inputs.size()]; states.size()];
        Ok(Self::from_parts(inputs, outputs, states, initial, table))
    }

    /// Assembles an automaton from parts that are already known to be consistent.
    pub(crate) fn from_parts(
        inputs: Alphabet,
        outputs: Alphabet,
        states: Alphabet,
        initial: StateIndex,
        table: Vec<Vec<Option<Transition>>>,
    ) -> Self {
        debug_assert_eq!(table.len(), states.size());
        debug_assert!(table.iter().all(|row| row.len() == inputs.size()));
        Self {
            inputs,
            outputs,
            states,
            initial,
            table,
            accessible: OnceCell::new(),
            partitions: OnceCell::new(),
        }
    }

    /// The input alphabet `S`.
    pub fn inputs(&self) -> &Alphabet {
        &self.inputs
    }

    /// The output alphabet `R`.
    pub fn outputs(&self) -> &Alphabet {
        &self.outputs
    }

    /// The states `Q`.
    pub fn states(&self) -> &Alphabet {
        &self.states
    }

    /// Index of the initial state.
    pub fn initial(&self) -> StateIndex {
        self.initial
    }

    /// Number of states.
    pub fn size(&self) -> usize {
        self.states.size()
    }

    /// Label of the state with the given index. Indices that are out of range yield `"?"`.
    pub fn state_label(&self, state: StateIndex) -> &str {
        self.states.try_nth(state).unwrap_or("?")
    }

    /// Returns the transition taken from `state` on the symbol at position `symbol`, if it
    /// has been defined.
    pub fn transition(&self, state: StateIndex, symbol: SymbolIndex) -> Option<Transition> {
        self.table.get(state)?.get(symbol).copied().flatten()
    }

    /// Iterates over the defined transitions leaving `state`, together with their symbol.
    pub fn transitions_from(
        &self,
        state: StateIndex,
    ) -> impl Iterator<Item = (SymbolIndex, Transition)> + '_ {
        self.table
            .get(state)
            .into_iter()
            .flat_map(|row| row.iter().enumerate())
            .filter_map(|(a, t)| t.map(|t| (a, t)))
    }

    /// Writes `δ(src, stimulus) = (dest, output)`, overwriting a previous value.
    pub fn add_transition(
        &mut self,
        src: &str,
        dest: &str,
        stimulus: &str,
        output: &str,
    ) -> Result<(), ValidationError> {
        let source = self.state_position(src)?;
        let transition = self.resolve(dest, output)?;
        let symbol = self
            .inputs
            .try_position(stimulus)
            .ok_or_else(|| ValidationError::UnknownInput(stimulus.to_string()))?;
        self.set_transition(source, symbol, transition);
        Ok(())
    }

    /// Writes all transitions of `state` that are given in `row`. Each entry is validated in
    /// the same way as a call to [`Automaton::add_transition`]; the first failing entry aborts
    /// the operation.
    pub fn add_transitions<S: AsRef<str>>(
        &mut self,
        state: &str,
        row: TransitionRow<S>,
    ) -> Result<(), ValidationError> {
        match row {
            TransitionRow::Keyed(entries) => {
                for (stimulus, dest, output) in entries {
                    self.add_transition(state, dest.as_ref(), stimulus.as_ref(), output.as_ref())?;
                }
            }
            TransitionRow::Positional(entries) => {
                let source = self.state_position(state)?;
                if entries.len() > self.inputs.size() {
                    return Err(ValidationError::RowTooLong {
                        state: state.to_string(),
                        expected: self.inputs.size(),
                        found: entries.len(),
                    });
                }
                for (symbol, (dest, output)) in entries.into_iter().enumerate() {
                    let transition = self.resolve(dest.as_ref(), output.as_ref())?;
                    self.set_transition(source, symbol, transition);
                }
            }
        }
        Ok(())
    }

    /// Returns true if every state has a transition for every input symbol.
    pub fn is_complete(&self) -> bool {
        self.ensure_complete().is_ok()
    }

    /// Verifies that the transition function is total, reporting the first missing pair in
    /// declaration order otherwise.
    pub fn ensure_complete(&self) -> Result<(), IncompleteTransitionError> {
        for (q, row) in self.table.iter().enumerate() {
            if let Some(a) = row.iter().position(Option::is_none) {
                return Err(IncompleteTransitionError {
                    state: self.state_label(q).to_string(),
                    symbol: self.inputs.try_nth(a).unwrap_or("?").to_string(),
                });
            }
        }
        Ok(())
    }

    /// Runs the word given as symbol positions from `state` and collects the emitted outputs.
    /// Returns `None` if some transition along the way is undefined.
    pub fn outputs_from<W>(&self, state: StateIndex, word: W) -> Option<Vec<OutputIndex>>
    where
        W: IntoIterator<Item = SymbolIndex>,
    {
        let mut current = state;
        let mut produced = vec![];
        for symbol in word {
            let t = self.transition(current, symbol)?;
            produced.push(t.output);
            current = t.target;
        }
        Some(produced)
    }

    /// Transduces the given word of input labels starting in the initial state, returning the
    /// labels of the emitted outputs. If a label is unknown or a transition is missing, `None`
    /// is returned.
    pub fn map<W, S>(&self, word: W) -> Option<Vec<&str>>
    where
        W: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let symbols: Vec<_> = word
            .into_iter()
            .map(|sym| self.inputs.try_position(sym.as_ref()))
            .collect::<Option<_>>()?;
        self.outputs_from(self.initial, symbols)?
            .into_iter()
            .map(|o| self.outputs.try_nth(o))
            .collect()
    }

    /// Renders the transition table, one row per state and one column per input symbol. A
    /// cell shows the reached state and the emitted output, undefined cells show `-`. The
    /// initial state is marked with an arrow.
    pub fn transition_table(&self) -> String {
        let mut b = tabled::builder::Builder::default();
        b.push_record(
            std::iter::once("Q".to_string()).chain(self.inputs.labels().map(String::from)),
        );
        for q in self.states.positions() {
            let marker = if q == self.initial { "-> " } else { "" };
            let row = std::iter::once(format!("{marker}{}", self.state_label(q))).chain(
                self.inputs.positions().map(|a| match self.transition(q, a) {
                    Some(t) => format!(
                        "{}, {}",
                        self.state_label(t.target),
                        self.outputs.try_nth(t.output).unwrap_or("?")
                    ),
                    None => "-".to_string(),
                }),
            );
            b.push_record(row);
        }
        b.build().with(tabled::settings::Style::ascii()).to_string()
    }

    fn state_position(&self, label: &str) -> Result<StateIndex, ValidationError> {
        self.states
            .try_position(label)
            .ok_or_else(|| ValidationError::UnknownState(label.to_string()))
    }

    fn resolve(&self, dest: &str, output: &str) -> Result<Transition, ValidationError> {
        let target = self.state_position(dest)?;
        let output = self
            .outputs
            .try_position(output)
            .ok_or_else(|| ValidationError::UnknownOutput(output.to_string()))?;
        Ok(Transition::new(target, output))
    }

    fn set_transition(&mut self, state: StateIndex, symbol: SymbolIndex, transition: Transition) {
        trace!(
            "setting δ({}, {}) = ({}, {})",
            self.state_label(state),
            self.inputs.try_nth(symbol).unwrap_or("?"),
            self.state_label(transition.target),
            self.outputs.try_nth(transition.output).unwrap_or("?")
        );
        self.table[state][symbol] = Some(transition);
        self.accessible.take();
        self.partitions.take();
    }
}

impl std::fmt::Display for Automaton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "states = {}", self.states)?;
        writeln!(f, "input alphabet = {}", self.inputs)?;
        writeln!(f, "output alphabet = {}", self.outputs)?;
        writeln!(f, "initial state = {}", self.state_label(self.initial))?;
        write!(f, "{}", self.transition_table())
    }
}

/// Summarizes the transitions of a state as `a -> (q, o)` pairs, useful in log output.
pub(crate) fn show_row(automaton: &Automaton, state: StateIndex) -> String {
    automaton
        .transitions_from(state)
        .map(|(a, t)| {
            format!(
                "{} -> ({}, {})",
                automaton.inputs().try_nth(a).unwrap_or("?"),
                automaton.state_label(t.target),
                automaton.outputs().try_nth(t.output).unwrap_or("?")
            )
        })
        .join(", ")
}
