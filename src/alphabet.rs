use itertools::Itertools;

use crate::math::Bijection;

/// An ordered, finite sequence of distinct labels. This is used for the input alphabet `S`,
/// the output alphabet `R` as well as the set of states `Q` of an [`crate::Automaton`]. Each
/// label is identified with its position, and all computations inside the crate work on
/// these positions only.
///
/// # Example
/// ```
/// use transducers::alphabet::Alphabet;
///
/// let alphabet = Alphabet::try_from_labels(["a", "b"]).unwrap();
/// assert_eq!(alphabet.try_position("b"), Some(1));
/// assert_eq!(alphabet.try_nth(0), Some("a"));
/// assert!(Alphabet::try_from_labels(["a", "a"]).is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Alphabet(Bijection<usize, String>);

impl Alphabet {
    /// Creates an alphabet from the given labels, keeping their order. Fails with the first
    /// label that appears more than once.
    pub fn try_from_labels<I, S>(labels: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut bijection = Bijection::new();
        for (i, label) in labels.into_iter().enumerate() {
            if let Err((_, label)) = bijection.insert_no_overwrite(i, label.into()) {
                return Err(label);
            }
        }
        Ok(Self(bijection))
    }

    /// Creates an alphabet of `size` labels, where the i-th label is `prefix` followed by `i`.
    pub fn numbered(prefix: &str, size: usize) -> Self {
        Self((0..size).map(|i| (i, format!("{prefix}{i}"))).collect())
    }

    /// Returns the number of labels.
    pub fn size(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the alphabet has no labels.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the label at position `pos`.
    pub fn try_nth(&self, pos: usize) -> Option<&str> {
        self.0.get_by_left(&pos).map(String::as_str)
    }

    /// Returns the position of `label`.
    pub fn try_position(&self, label: &str) -> Option<usize> {
        self.0.get_by_right(label).copied()
    }

    /// Returns true if `label` belongs to the alphabet.
    pub fn contains(&self, label: &str) -> bool {
        self.0.contains_right(label)
    }

    /// Iterates over all positions.
    pub fn positions(&self) -> std::ops::Range<usize> {
        0..self.size()
    }

    /// Iterates over the labels in order.
    pub fn labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.iter().map(|(_, label)| label.as_str())
    }
}

impl std::fmt::Display for Alphabet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({})", self.labels().join(", "))
    }
}
