use std::cmp::Ordering;

/// Open set entry.
///
/// `sequence` is the insertion counter; among entries with equal estimate
/// the earliest inserted one is popped first.
#[derive(Debug, Clone, Copy)]
pub(super) struct State<N> {
    pub(super) estimate: f64,
    pub(super) cost: f64,
    pub(super) sequence: u64,
    pub(super) node: N,
}

// Implement Ord for State to use in BinaryHeap
impl<N> Ord for State<N> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap by estimate, then by sequence (reversed from standard Rust BinaryHeap)
        other
            .estimate
            .total_cmp(&self.estimate)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl<N> PartialOrd for State<N> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<N> PartialEq for State<N> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<N> Eq for State<N> {}
