use itertools::Itertools;
use owo_colors::OwoColorize;
use tracing::{debug, warn};

use crate::{
    automaton::Automaton,
    input::{CaseError, Dialect, MalformedInputError, TestCase, TestCases},
    minimization::Minimization,
};

/// Controls how a [`Report`] is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Highlight section headers with ANSI escape codes.
    pub colored: bool,
}

/// The human readable result of processing one test case: the automaton as it was read, its
/// inaccessible states, the sequence of partitions and the minimized automaton.
#[derive(Debug, Clone)]
pub struct Report {
    index: usize,
    dialect: Dialect,
    original: Automaton,
    minimization: Minimization,
}

/// The result of processing a single test case.
pub type CaseOutcome = Result<Report, CaseError>;

impl Report {
    /// Minimizes the automaton of the given test case and assembles the report. `index`
    /// is the 1-based position of the test case in its input.
    pub fn new(index: usize, case: TestCase) -> Result<Self, CaseError> {
        let minimization = case.automaton.minimize()?;
        Ok(Self {
            index,
            dialect: case.dialect,
            original: case.automaton,
            minimization,
        })
    }

    /// Position of the test case in its input, starting at 1.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The automaton as it was read.
    pub fn original(&self) -> &Automaton {
        &self.original
    }

    /// The result of minimizing [`Report::original`].
    pub fn minimization(&self) -> &Minimization {
        &self.minimization
    }

    /// Renders the report as text.
    pub fn render(&self, options: RenderOptions) -> String {
        let header = |text: String| {
            if options.colored {
                text.bold().blue().to_string()
            } else {
                text
            }
        };
        let original = &self.original;
        let minimized = self.minimization.automaton();

        let mut out = String::new();
        out.push_str(&header(format!("== case {} ({}) ==", self.index, self.dialect)));
        out.push('\n');
        out.push_str(&original.to_string());
        out.push('\n');

        let inaccessible = self
            .minimization
            .inaccessible_states()
            .iter()
            .map(|&q| original.state_label(q))
            .join(", ");
        out.push_str(&header("inaccessible states:".to_string()));
        if inaccessible.is_empty() {
            out.push_str(" none\n");
        } else {
            out.push_str(&format!(" {inaccessible}\n"));
        }

        out.push_str(&header("partitions:".to_string()));
        out.push('\n');
        for (i, partition) in self.minimization.partitions().iter().enumerate() {
            out.push_str(&format!("  P{i}: {}\n", original.show_partition(partition)));
        }

        out.push_str(&header("classes:".to_string()));
        out.push('\n');
        for (block, class) in self
            .minimization
            .partitions()
            .fixpoint()
            .iter()
            .zip(minimized.states().labels())
        {
            out.push_str(&format!(
                "  {class} = {{{}}}\n",
                block.iter().map(|&q| original.state_label(q)).join(", ")
            ));
        }

        out.push_str(&header("minimized:".to_string()));
        out.push('\n');
        out.push_str(&minimized.to_string());
        out.push('\n');
        out
    }
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render(RenderOptions::default()))
    }
}

/// Processes every test case contained in `input`, returning one outcome per test case in
/// input order. Each test case is handled on its own automaton, so a failing test case has no
/// effect on the others. Only a missing or invalid number of test cases fails as a whole.
///
/// # Example
/// ```
/// let input = "1\nmealy\na\n0 1\np q\np q 0\nq p 0\n";
/// let outcomes = transducers::report::process(input).unwrap();
/// let report = outcomes[0].as_ref().unwrap();
/// assert_eq!(report.minimization().automaton().size(), 1);
/// ```
pub fn process(input: &str) -> Result<Vec<CaseOutcome>, MalformedInputError> {
    let cases = TestCases::try_from_str(input)?;
    let outcomes = cases
        .enumerate()
        .map(|(i, case)| {
            let outcome = case.and_then(|case| Report::new(i + 1, case));
            match &outcome {
                Ok(report) => debug!(
                    "case {}: {} -> {} states",
                    i + 1,
                    report.original().size(),
                    report.minimization().automaton().size()
                ),
                Err(e) => warn!("case {} failed: {e}", i + 1),
            }
            outcome
        })
        .collect();
    Ok(outcomes)
}
