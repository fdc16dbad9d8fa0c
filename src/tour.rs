//! Greedy nearest-neighbor walk over a delivery graph.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::time::{Duration, Instant};

use crate::error::{BatchError, Result};
use crate::graph::{DeliveryGraph, Edge, NodeRole};
use crate::record::{DeliveryRecord, OptimizedRoute};

/// Cooperative stop conditions for one batch: a shared cancellation flag
/// and an optional deadline measured from when the batch started.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Interrupt<'a> {
    cancelled: Option<&'a AtomicBool>,
    deadline: Option<(Instant, Duration)>,
}

impl<'a> Interrupt<'a> {
    pub(crate) fn none() -> Self {
        Self {
            cancelled: None,
            deadline: None,
        }
    }

    pub(crate) fn new(cancelled: &'a AtomicBool, timeout: Option<Duration>) -> Self {
        Self {
            cancelled: Some(cancelled),
            deadline: timeout.map(|timeout| (Instant::now() + timeout, timeout)),
        }
    }

    pub(crate) fn check(&self) -> std::result::Result<(), BatchError> {
        if let Some((deadline, timeout)) = self.deadline {
            if Instant::now() >= deadline {
                return Err(BatchError::Timeout(timeout));
            }
        }
        if let Some(flag) = self.cancelled {
            if flag.load(AtomicOrdering::Relaxed) {
                return Err(BatchError::Cancelled);
            }
        }
        Ok(())
    }
}

/// Optimize one batch in isolation.
///
/// Returns one route per distinct `delivery_id`, in visiting order. An empty
/// batch yields an empty result.
pub fn optimize_batch(batch_index: usize, records: &[DeliveryRecord]) -> Result<Vec<OptimizedRoute>> {
    optimize_batch_with(batch_index, records, &Interrupt::none()).map_err(|err| err.in_batch(batch_index))
}

pub(crate) fn optimize_batch_with(
    batch_index: usize,
    records: &[DeliveryRecord],
    interrupt: &Interrupt<'_>,
) -> std::result::Result<Vec<OptimizedRoute>, BatchError> {
    if records.is_empty() {
        return Ok(Vec::new());
    }

    tracing::debug!(batch = batch_index, rows = records.len(), "Optimizing batch");

    let graph = DeliveryGraph::build(records, interrupt)?;
    let path = greedy_tour(&graph, interrupt)?;
    let routes = routes_from_path(batch_index, records, &graph, &path);

    tracing::debug!(
        batch = batch_index,
        routes = routes.len(),
        zone = %graph.projection().zone(),
        "Completed batch optimization"
    );
    Ok(routes)
}

/// Visit every node once, returning node ids in visiting order.
///
/// Starts at the first pickup. From each node, moves to the cheapest
/// unvisited successor (ties to the lower node id). At a dead end, jumps to
/// the lowest unvisited node id.
pub(crate) fn greedy_tour(graph: &DeliveryGraph, interrupt: &Interrupt<'_>) -> std::result::Result<Vec<usize>, BatchError> {
    if graph.is_empty() {
        return Ok(Vec::new());
    }

    let start = graph
        .nodes()
        .iter()
        .find(|node| node.role == NodeRole::Pickup)
        .map(|node| node.id)
        .ok_or(BatchError::NoPickupNodes)?;

    let total = graph.len();
    let mut visited = vec![false; total];
    let mut path = Vec::with_capacity(total);
    // Every id below `cursor` is known to be visited.
    let mut cursor = 0;

    let mut current = start;
    visited[current] = true;
    path.push(current);

    while path.len() < total {
        interrupt.check()?;

        let next = match nearest_unvisited(graph.edges(current), &visited) {
            Some(next) => next,
            None => {
                while cursor < total && visited[cursor] {
                    cursor += 1;
                }
                if cursor == total {
                    break;
                }
                cursor
            }
        };

        visited[next] = true;
        path.push(next);
        current = next;
    }

    Ok(path)
}

fn nearest_unvisited(edges: &[Edge], visited: &[bool]) -> Option<usize> {
    edges
        .iter()
        .filter(|edge| !visited[edge.to])
        .min_by(|a, b| match a.weight.total_cmp(&b.weight) {
            Ordering::Equal => a.to.cmp(&b.to),
            other => other,
        })
        .map(|edge| edge.to)
}

/// Keep pickup visits, first occurrence per delivery. Geometry is the
/// record's own WGS84 pickup point.
fn routes_from_path(
    batch_index: usize,
    records: &[DeliveryRecord],
    graph: &DeliveryGraph,
    path: &[usize],
) -> Vec<OptimizedRoute> {
    let mut seen = HashSet::new();
    let mut routes = Vec::new();

    for node in path.iter().filter_map(|&id| graph.node(id)) {
        if node.role != NodeRole::Pickup || !seen.insert(node.delivery_id) {
            continue;
        }
        let Some(record) = records.get(node.record) else {
            continue;
        };

        routes.push(OptimizedRoute {
            delivery: record.clone(),
            geometry: record.pickup(),
            batch_index,
            sequence: routes.len(),
        });
    }

    routes
}
