//! Module: update::graph
//! Responsibility: directed multigraph with labelled edges and the two
//! topological sorts that order row writes.
//! Does not own: what the vertices or labels mean.
//! Boundary: vertices live in an arena; every algorithm works on arena
//! indices and clones vertices only into its result.

mod cycle;


pub use cycle::reconstruct_cycle;

use crate::error::InternalError;
use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    fmt::Display,
    hash::Hash,
};
use tracing::{debug, warn};

///
/// CycleEdge
///
/// One edge of a reconstructed cycle, in walk order.
///

#[derive(Debug)]
pub struct CycleEdge<'g, V, E> {
    pub from: &'g V,
    pub to: &'g V,
    pub labels: &'g [E],
}

/// Renders a reconstructed cycle for the circular dependency error.
pub type CycleFormatter<'f, V, E> = dyn Fn(&[CycleEdge<'_, V, E>]) -> String + 'f;

/// Decides whether the sort may ignore the edge `from -> to`.
pub type EdgeBreaker<'f, V, E> = dyn Fn(&V, &V, &[E]) -> bool + 'f;

///
/// Multigraph
///
/// Vertices have set semantics. Each ordered vertex pair carries a list of
/// labels; adding the same label twice keeps both.
///

#[derive(Clone, Debug)]
pub struct Multigraph<V, E> {
    vertices: Vec<V>,
    index: HashMap<V, usize>,
    successors: Vec<BTreeMap<usize, Vec<E>>>,
    predecessors: Vec<BTreeSet<usize>>,
    edge_count: usize,
}

impl<V, E> Default for Multigraph<V, E> {
    fn default() -> Self {
        Self {
            vertices: Vec::new(),
            index: HashMap::new(),
            successors: Vec::new(),
            predecessors: Vec::new(),
            edge_count: 0,
        }
    }
}

impl<V, E> Multigraph<V, E>
where
    V: Clone + Eq + Hash,
{
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `vertex`; returns false when it was already present.
    pub fn add_vertex(&mut self, vertex: V) -> bool {
        if self.index.contains_key(&vertex) {
            return false;
        }

        self.index.insert(vertex.clone(), self.vertices.len());
        self.vertices.push(vertex);
        self.successors.push(BTreeMap::new());
        self.predecessors.push(BTreeSet::new());

        true
    }

    pub fn add_vertices(&mut self, vertices: impl IntoIterator<Item = V>) {
        for vertex in vertices {
            self.add_vertex(vertex);
        }
    }

    pub fn add_edge(&mut self, from: &V, to: &V, edge: E) -> Result<(), InternalError> {
        self.add_edges(from, to, [edge])
    }

    /// Append `edges` to the label list of `from -> to`. Both endpoints must
    /// already be vertices.
    pub fn add_edges(
        &mut self,
        from: &V,
        to: &V,
        edges: impl IntoIterator<Item = E>,
    ) -> Result<(), InternalError> {
        let from = self.position(from).ok_or_else(|| {
            InternalError::graph_invariant("edge source is not a vertex of the graph")
        })?;
        let to = self.position(to).ok_or_else(|| {
            InternalError::graph_invariant("edge target is not a vertex of the graph")
        })?;

        let labels = self.successors[from].entry(to).or_default();
        let before = labels.len();
        labels.extend(edges);
        self.edge_count += labels.len() - before;
        self.predecessors[to].insert(from);

        Ok(())
    }

    /// Labels of `from -> to`, empty when there is no such edge.
    #[must_use]
    pub fn edges(&self, from: &V, to: &V) -> &[E] {
        match (self.position(from), self.position(to)) {
            (Some(from), Some(to)) => self.labels(from, to),
            _ => &[],
        }
    }

    pub fn outgoing_neighbours(&self, vertex: &V) -> impl Iterator<Item = &V> + '_ {
        self.position(vertex)
            .into_iter()
            .flat_map(|idx| self.successors[idx].keys())
            .map(|idx| &self.vertices[*idx])
    }

    pub fn incoming_neighbours(&self, vertex: &V) -> impl Iterator<Item = &V> + '_ {
        self.position(vertex)
            .into_iter()
            .flat_map(|idx| self.predecessors[idx].iter())
            .map(|idx| &self.vertices[*idx])
    }

    /// Vertices in insertion order.
    #[must_use]
    pub fn vertices(&self) -> &[V] {
        &self.vertices
    }

    #[must_use]
    pub fn contains(&self, vertex: &V) -> bool {
        self.index.contains_key(vertex)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Total number of labels across all vertex pairs.
    #[must_use]
    pub const fn edge_count(&self) -> usize {
        self.edge_count
    }

    fn position(&self, vertex: &V) -> Option<usize> {
        self.index.get(vertex).copied()
    }

    fn labels(&self, from: usize, to: usize) -> &[E] {
        self.successors[from].get(&to).map_or(&[], Vec::as_slice)
    }

    // In-degree counted per distinct predecessor vertex.
    fn predecessor_counts(&self) -> Vec<usize> {
        self.predecessors.iter().map(BTreeSet::len).collect()
    }
}

impl<V, E> Multigraph<V, E>
where
    V: Clone + Display + Eq + Hash,
{
    /// Flat topological order (Kahn's algorithm).
    ///
    /// When the sort stalls, `can_break_edge` is offered the incoming edges
    /// of every unsorted vertex in turn; each approved edge is ignored from
    /// then on. When nothing can be broken one concrete cycle is reported.
    pub fn topological_sort(
        &self,
        can_break_edge: Option<&EdgeBreaker<'_, V, E>>,
        format_cycle: Option<&CycleFormatter<'_, V, E>>,
    ) -> Result<Vec<V>, InternalError> {
        let total = self.vertices.len();
        let mut counts = self.predecessor_counts();
        let mut sorted: Vec<usize> = (0..total).filter(|idx| counts[*idx] == 0).collect();
        let mut broken: HashSet<(usize, usize)> = HashSet::new();
        let mut cursor = 0;

        while sorted.len() < total {
            while cursor < sorted.len() {
                let vertex = sorted[cursor];
                cursor += 1;

                for successor in self.successors[vertex].keys() {
                    if broken.contains(&(vertex, *successor)) {
                        continue;
                    }
                    counts[*successor] -= 1;
                    if counts[*successor] == 0 {
                        sorted.push(*successor);
                    }
                }
            }

            if sorted.len() < total
                && !self.break_one_edge(can_break_edge, &mut counts, &mut broken, &mut sorted)
            {
                return Err(self.cycle_error(&counts, &broken, format_cycle));
            }
        }

        debug!(vertices = total, broken_edges = broken.len(), "update.graph.sorted");

        Ok(sorted.into_iter().map(|idx| self.vertices[idx].clone()).collect())
    }

    /// Group vertices into successive independent sets.
    ///
    /// Set 0 holds every vertex without predecessors; set `i` holds the
    /// vertices whose last predecessor was in set `i - 1`. No edge connects
    /// two vertices of one set.
    pub fn batching_topological_sort(
        &self,
        format_cycle: Option<&CycleFormatter<'_, V, E>>,
    ) -> Result<Vec<Vec<V>>, InternalError> {
        let total = self.vertices.len();
        let mut counts = self.predecessor_counts();
        let mut current: Vec<usize> = (0..total).filter(|idx| counts[*idx] == 0).collect();
        let mut batches = Vec::new();
        let mut processed = 0;

        while !current.is_empty() {
            let mut next = Vec::new();
            for vertex in &current {
                for successor in self.successors[*vertex].keys() {
                    counts[*successor] -= 1;
                    if counts[*successor] == 0 {
                        next.push(*successor);
                    }
                }
            }

            processed += current.len();
            batches.push(current.iter().map(|idx| self.vertices[*idx].clone()).collect());
            current = next;
        }

        if processed < total {
            return Err(self.cycle_error(&counts, &HashSet::new(), format_cycle));
        }

        debug!(
            vertices = total,
            batches = batches.len(),
            "update.graph.batched"
        );

        Ok(batches)
    }

    // Try the breaker against incoming edges of unsorted vertices; true when
    // an edge was broken.
    fn break_one_edge(
        &self,
        can_break_edge: Option<&EdgeBreaker<'_, V, E>>,
        counts: &mut [usize],
        broken: &mut HashSet<(usize, usize)>,
        sorted: &mut Vec<usize>,
    ) -> bool {
        let Some(can_break_edge) = can_break_edge else {
            return false;
        };

        for candidate in 0..self.vertices.len() {
            if counts[candidate] == 0 {
                continue;
            }

            for predecessor in &self.predecessors[candidate] {
                let edge = (*predecessor, candidate);
                if counts[*predecessor] == 0 || broken.contains(&edge) {
                    continue;
                }

                if can_break_edge(
                    &self.vertices[*predecessor],
                    &self.vertices[candidate],
                    self.labels(*predecessor, candidate),
                ) {
                    broken.insert(edge);
                    counts[candidate] -= 1;
                    if counts[candidate] == 0 {
                        sorted.push(candidate);
                    }

                    return true;
                }
            }
        }

        false
    }

    fn cycle_error(
        &self,
        counts: &[usize],
        broken: &HashSet<(usize, usize)>,
        format_cycle: Option<&CycleFormatter<'_, V, E>>,
    ) -> InternalError {
        let cycle = cycle::reconstruct_cycle_indices(self, counts, broken);
        if cycle.len() < 2 {
            return InternalError::graph_invariant(
                "topological sort stalled but no cycle could be reconstructed",
            );
        }

        let description = match format_cycle {
            Some(format_cycle) => {
                let edges: Vec<CycleEdge<'_, V, E>> = cycle
                    .windows(2)
                    .map(|pair| CycleEdge {
                        from: &self.vertices[pair[0]],
                        to: &self.vertices[pair[1]],
                        labels: self.labels(pair[0], pair[1]),
                    })
                    .collect();
                format_cycle(&edges)
            }
            None => cycle
                .iter()
                .map(|idx| self.vertices[*idx].to_string())
                .collect::<Vec<_>>()
                .join(" -> "),
        };

        warn!(cycle_len = cycle.len() - 1, "update.graph.cycle_detected");

        InternalError::circular_dependency(description)
    }
}
