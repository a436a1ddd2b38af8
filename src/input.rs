//! Reading test cases from text.
//!
//! The input starts with the number of test cases, followed by the test cases themselves.
//! Each test case consists of
//! - a dialect tag, `mealy` (or `1`) or `moore` (or `2`),
//! - a line with the input symbols,
//! - a line with the output symbols,
//! - a line with the states, the first of which is the initial state,
//! - one transition row per state.
//!
//! In the `mealy` dialect a row reads `src d_1 o_1 … d_n o_n`, giving for the i-th input
//! symbol the reached state and the emitted output. In the `moore` dialect a row reads
//! `src o d_1 … d_n`, the single output `o` is emitted on every transition leaving `src`.
//! Tokens are separated by whitespace and lines starting with `#` are ignored. A blank line
//! in place of the input or output symbols declares an empty alphabet. Blank lines anywhere
//! else are skipped.
//!
//! ```text
//! 1
//! mealy
//! a b
//! 0 1
//! A B
//! A B 0 A 1
//! B B 1 A 0
//! ```
use std::str::FromStr;

use itertools::Itertools;
use thiserror::Error;
use tracing::{debug, trace};

use crate::{
    automaton::{Automaton, TransitionRow, ValidationError},
    minimization::MinimizationError,
};

/// Abstracts the types of errors that can occur when the text of a test case does not have
/// the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum MalformedInputError {
    #[error("missing number of test cases")]
    MissingCaseCount,
    #[error("invalid number of test cases `{0}`")]
    InvalidCaseCount(String),
    #[error("input ended while reading the {0}")]
    UnexpectedEnd(&'static str),
    #[error("unknown row dialect `{0}`, expected `mealy` or `moore`")]
    UnknownDialect(String),
    #[error("the state list is empty")]
    NoStates,
    #[error("transition row {row} has {found} columns, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// A failure that is tied to a single test case. Other test cases are not affected by it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum CaseError {
    #[error("malformed input: {0}")]
    Malformed(#[from] MalformedInputError),
    #[error("invalid transition data: {0}")]
    Validation(#[from] ValidationError),
    #[error("cannot minimize: {0}")]
    Minimization(#[from] MinimizationError),
}

/// The layout of the transition rows of a test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Every input symbol column carries its own destination and output.
    Mealy,
    /// One output per row, shared by all transitions leaving the state.
    Moore,
}

impl FromStr for Dialect {
    type Err = MalformedInputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mealy" | "1" => Ok(Dialect::Mealy),
            "moore" | "2" => Ok(Dialect::Moore),
            _ => Err(MalformedInputError::UnknownDialect(s.to_string())),
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::Mealy => write!(f, "mealy"),
            Dialect::Moore => write!(f, "moore"),
        }
    }
}

impl Dialect {
    /// Number of columns (including the source state) of a row over `symbols` input symbols.
    pub fn row_width(&self, symbols: usize) -> usize {
        match self {
            Dialect::Mealy => 2 * symbols + 1,
            Dialect::Moore => symbols + 2,
        }
    }

    /// Splits a row into its source state and the transitions in declaration order. Fails if
    /// the row does not have [`Dialect::row_width`] columns.
    fn split_row<'a>(
        &self,
        row: usize,
        tokens: &[&'a str],
        symbols: usize,
    ) -> Result<(&'a str, TransitionRow<&'a str>), MalformedInputError> {
        let expected = self.row_width(symbols);
        if tokens.len() != expected {
            return Err(MalformedInputError::RowWidth {
                row,
                expected,
                found: tokens.len(),
            });
        }
        let entries = match self {
            Dialect::Mealy => tokens[1..].iter().copied().tuples::<(&str, &str)>().collect_vec(),
            Dialect::Moore => tokens[2..].iter().map(|&dest| (dest, tokens[1])).collect(),
        };
        Ok((tokens[0], TransitionRow::Positional(entries)))
    }
}

/// A single parsed test case.
#[derive(Debug, Clone)]
pub struct TestCase {
    /// The dialect the rows were written in.
    pub dialect: Dialect,
    /// The automaton described by the test case.
    pub automaton: Automaton,
}

/// Iterator over the test cases contained in some text. Every test case is read in full
/// before it is interpreted, so an error in one test case leaves the following ones intact.
/// Only if the input ends in the middle of a test case does the iteration stop early.
#[derive(Debug, Clone)]
pub struct TestCases {
    lines: std::vec::IntoIter<String>,
    remaining: usize,
    exhausted: bool,
}

impl TestCases {
    /// Reads the number of test cases from the first relevant line and prepares iteration
    /// over the test cases.
    pub fn try_from_lines<I, S>(lines: I) -> Result<Self, MalformedInputError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut lines = lines
            .into_iter()
            .filter_map(|line| {
                let line = line.as_ref().trim();
                (!line.starts_with('#')).then(|| line.to_string())
            })
            .collect_vec()
            .into_iter();

        let header = lines
            .find(|line| !line.is_empty())
            .ok_or(MalformedInputError::MissingCaseCount)?;
        let remaining = header
            .parse::<usize>()
            .map_err(|_| MalformedInputError::InvalidCaseCount(header.clone()))?;
        debug!("reading {remaining} test cases");

        Ok(Self {
            lines,
            remaining,
            exhausted: false,
        })
    }

    /// Same as [`TestCases::try_from_lines`], taking the whole input as one string.
    pub fn try_from_str(input: &str) -> Result<Self, MalformedInputError> {
        Self::try_from_lines(input.lines())
    }

    /// Returns the next line as is, which may be blank.
    fn expect_line(&mut self, what: &'static str) -> Result<String, MalformedInputError> {
        self.lines
            .next()
            .ok_or(MalformedInputError::UnexpectedEnd(what))
    }

    /// Returns the next line that is not blank.
    fn expect_content(&mut self, what: &'static str) -> Result<String, MalformedInputError> {
        self.lines
            .find(|line| !line.is_empty())
            .ok_or(MalformedInputError::UnexpectedEnd(what))
    }

    fn read_case(&mut self) -> Result<TestCase, CaseError> {
        let tag = self.expect_content("dialect tag")?;
        let inputs = self.expect_line("input alphabet")?;
        let outputs = self.expect_line("output alphabet")?;
        let states = self.expect_content("state list")?;
        let states = states.split_whitespace().collect_vec();
        let rows = (0..states.len())
            .map(|_| self.expect_content("transition rows"))
            .collect::<Result<Vec<_>, _>>()?;

        let dialect: Dialect = tag.parse()?;
        let initial = *states.first().ok_or(MalformedInputError::NoStates)?;
        let mut automaton = Automaton::new(
            inputs.split_whitespace(),
            outputs.split_whitespace(),
            states.iter().copied(),
            initial,
        )?;
        trace!("declared automaton with {} states", automaton.size());

        let symbols = automaton.inputs().size();
        for (i, row) in rows.iter().enumerate() {
            let tokens = row.split_whitespace().collect_vec();
            let (state, transitions) = dialect.split_row(i + 1, &tokens, symbols)?;
            automaton.add_transitions(state, transitions)?;
        }

        Ok(TestCase { dialect, automaton })
    }
}

impl Iterator for TestCases {
    type Item = Result<TestCase, CaseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 || self.exhausted {
            return None;
        }
        self.remaining -= 1;
        let case = self.read_case();
        if let Err(CaseError::Malformed(MalformedInputError::UnexpectedEnd(what))) = &case {
            debug!("input ended while reading the {what}, stopping");
            self.exhausted = true;
        }
        Some(case)
    }
}
