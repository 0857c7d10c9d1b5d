use crate::update::graph::Multigraph;
use std::{collections::HashSet, hash::Hash};

/// Reconstruct one concrete cycle from a stalled sort.
///
/// `remaining` holds the unresolved predecessor count of every vertex, in
/// insertion order; zero means the vertex was sorted. The walk starts at the
/// first unresolved vertex and follows unresolved predecessors until it
/// reaches a vertex it already passed. The result is closed: its first and
/// last vertex are the same, and consecutive pairs are edges in graph
/// direction. Empty when nothing is unresolved.
#[must_use]
pub fn reconstruct_cycle<V, E>(graph: &Multigraph<V, E>, remaining: &[usize]) -> Vec<V>
where
    V: Clone + Eq + Hash,
{
    reconstruct_cycle_indices(graph, remaining, &HashSet::new())
        .into_iter()
        .map(|idx| graph.vertices[idx].clone())
        .collect()
}

/// Same walk over arena indices; edges in `broken` were already approved
/// for removal by the sort and are never followed.
pub(super) fn reconstruct_cycle_indices<V, E>(
    graph: &Multigraph<V, E>,
    remaining: &[usize],
    broken: &HashSet<(usize, usize)>,
) -> Vec<usize> {
    // -1 marks vertices already on the walk.
    let mut counts: Vec<isize> = remaining
        .iter()
        .map(|count| isize::try_from(*count).unwrap_or(isize::MAX))
        .collect();

    let Some(start) = counts.iter().position(|count| *count != 0) else {
        return Vec::new();
    };

    let mut walk = vec![start];
    let mut current = start;
    loop {
        let next = graph.predecessors[current]
            .iter()
            .copied()
            .find(|idx| {
                !broken.contains(&(*idx, current))
                    && counts.get(*idx).is_some_and(|count| *count != 0)
            });
        let Some(next) = next else {
            break;
        };

        counts[current] = -1;
        walk.push(next);
        if counts[next] == -1 {
            break;
        }
        current = next;
    }

    walk.reverse();

    // Drop the lead-in that brought the walk to the cycle.
    let first = walk[0];
    if let Some(end) = walk.iter().rposition(|idx| *idx == first) {
        walk.truncate(end + 1);
    }

    walk
}
