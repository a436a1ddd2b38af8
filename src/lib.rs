//! Library for minimizing finite-state transducers in Rust.
//!
//! A transducer, or Mealy machine, consists of an input alphabet $S$, an output alphabet $R$, a finite set of states $Q$ with a designated initial state, and a transition function $\delta: Q \times S \to Q \times R$. Reading an input symbol moves the machine to the next state and emits one output symbol, so a word of length $n$ produces $n$ outputs. All three label sequences are fixed up front and the transition function is stored as a dense table indexed by positions in $Q$ and $S$.
//!
//! The central operation is [`Automaton::minimize`], which computes the smallest transducer that behaves like a given one. It proceeds in three steps, each of which is also available on its own:
//! - [`Automaton::accessible_states`] determines the states that can be reached from the initial state. All others can never influence any output and are dropped.
//! - [`Automaton::partition_sequence`] runs Moore's partition refinement on the accessible states. It starts by grouping states that emit the same outputs and repeatedly splits groups whose members move into different groups, until nothing changes anymore. Each intermediate partition is recorded.
//! - [`Automaton::quotient`] collapses every block of the final partition into a single state.
//!
//! Test cases given as text can be read with [`input::TestCases`] and turned into printable results with [`report::process`].
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// The prelude is supposed to make using this package easier. Including everything, i.e.
/// `use transducers::prelude::*;` should be enough to use the package.
pub mod prelude {
    pub use super::{
        alphabet::Alphabet,
        automaton::{
            Automaton, IncompleteTransitionError, LabelKind, OutputIndex, StateIndex,
            SymbolIndex, Transition, TransitionRow, ValidationError,
        },
        input::{CaseError, Dialect, MalformedInputError, TestCase, TestCases},
        math::Partition,
        minimization::{
            Minimization, MinimizationError, PartitionSequence, Quotient, QuotientError,
        },
        reachable::{MinimalRepresentatives, ReachableStateIndices},
        report::{process, CaseOutcome, RenderOptions, Report},
    };
}

/// This module contains some definitions of mathematical objects which are used throughout the crate and
/// do not really fit to the top level.
pub mod math;

/// Module that contains the ordered label sequences used for inputs, outputs and states.
pub mod alphabet;

/// Defines the transducer model and its validated construction.
pub mod automaton;
pub use automaton::Automaton;

/// Reachability analysis, i.e. which states can be reached from the initial state.
pub mod reachable;

/// Contains Moore's partition refinement and the construction of quotients.
pub mod minimization;

pub mod input;

/// Turns test cases into human readable reports.
pub mod report;

/// Implements the generation of random transducers.
#[cfg(feature = "random")]
pub mod random;
