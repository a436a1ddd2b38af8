use std::{collections::BTreeSet, hash::Hash};

/// Type alias for sets, we use this to hide which type of `HashSet` we are actually using.
pub type Set<S> = fxhash::FxHashSet<S>;
/// Type alias for maps, we use this to hide which type of `HashMap` we are actually using.
pub type Map<K, V> = fxhash::FxHashMap<K, V>;

/// Represents a bijective mapping between `L` and `R`, that is a mapping which associates
/// each `L` with precisely one `R` and vice versa.
pub type Bijection<L, R> = bimap::BiBTreeMap<L, R>;

/// A partition groups elements of type `I` into pairwise disjoint, non-empty blocks. The
/// blocks are kept in the order in which they were discovered, which makes the position of a
/// block usable as a stable name. Equality ignores that order: two partitions are equal if
/// they consist of the same blocks.
#[derive(Debug, Clone)]
pub struct Partition<I: Hash + Eq>(Vec<BTreeSet<I>>);

impl<I: Hash + Eq> std::ops::Deref for Partition<I> {
    type Target = Vec<BTreeSet<I>>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'a, I: Hash + Eq> IntoIterator for &'a Partition<I> {
    type Item = &'a BTreeSet<I>;
    type IntoIter = std::slice::Iter<'a, BTreeSet<I>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<I: Hash + Eq> PartialEq for Partition<I> {
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        let blocks: Set<&BTreeSet<I>> = other.iter().collect();
        self.iter().all(|block| blocks.contains(block))
    }
}
impl<I: Hash + Eq> Eq for Partition<I> {}

impl<I: Hash + Eq + Ord> Partition<I> {
    /// Returns the size of the partition, i.e. the number of blocks.
    pub fn size(&self) -> usize {
        self.0.len()
    }

    /// Builds a new partition from an iterator that yields iterators which yield elements
    /// of type `I`. Empty blocks are dropped.
    pub fn new<X: IntoIterator<Item = I>, Y: IntoIterator<Item = X>>(iter: Y) -> Self {
        Self(
            iter.into_iter()
                .map(|it| it.into_iter().collect::<BTreeSet<_>>())
                .filter(|block| !block.is_empty())
                .collect(),
        )
    }

    /// Returns the position of the block containing `element`, if there is one.
    pub fn block_of(&self, element: &I) -> Option<usize> {
        self.0.iter().position(|block| block.contains(element))
    }

    /// Returns true if every block of `self` is contained in some block of `coarser`.
    pub fn refines(&self, coarser: &Self) -> bool {
        let owner: Map<&I, usize> = coarser
            .iter()
            .enumerate()
            .flat_map(|(i, block)| block.iter().map(move |x| (x, i)))
            .collect();
        self.0.iter().all(|block| {
            let mut owners = block.iter().map(|x| owner.get(x));
            match owners.next() {
                Some(Some(first)) => owners.all(|o| o == Some(first)),
                Some(None) => false,
                None => true,
            }
        })
    }
}

impl Partition<usize> {
    /// Builds a dense lookup table of length `universe` that stores for each element the
    /// position of its block, or `None` if the element is not covered.
    pub fn block_table(&self, universe: usize) -> Vec<Option<usize>> {
        let mut table = vec![None; universe];
        for (i, block) in self.0.iter().enumerate() {
            for &q in block {
                if let Some(slot) = table.get_mut(q) {
                    *slot = Some(i);
                }
            }
        }
        table
    }
}

impl<I: Hash + Eq + Ord> From<Vec<BTreeSet<I>>> for Partition<I> {
    fn from(value: Vec<BTreeSet<I>>) -> Self {
        Self(value)
    }
}
