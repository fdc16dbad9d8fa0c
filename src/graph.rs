//! Per-batch delivery graph over projected pickup/dropoff points.
//!
//! Node ids follow creation order: the i-th record of a batch owns pickup
//! node `2 * i` and dropoff node `2 * i + 1`. Pickups carry all outgoing
//! edges; dropoffs are sinks.

use serde::{Deserialize, Serialize};

use crate::error::BatchError;
use crate::projection::{PlanarPoint, UtmProjection, planar_distance};
use crate::record::{DeliveryRecord, GeoPoint};
use crate::tour::Interrupt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeRole {
    Pickup,
    Dropoff,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub id: usize,
    pub role: NodeRole,
    pub delivery_id: u64,
    /// Index of the owning record within the batch.
    pub record: usize,
    pub point: PlanarPoint,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub to: usize,
    pub weight: f64,
}

/// Directed, weighted graph owned by a single batch optimization.
#[derive(Debug)]
pub struct DeliveryGraph {
    projection: UtmProjection,
    nodes: Vec<GraphNode>,
    edges: Vec<Vec<Edge>>,
}

impl DeliveryGraph {
    pub fn pickup_id(record: usize) -> usize {
        2 * record
    }

    pub fn dropoff_id(record: usize) -> usize {
        2 * record + 1
    }

    /// Project a batch and connect every pickup to every dropoff.
    ///
    /// The whole batch uses the UTM zone of its first pickup point.
    pub(crate) fn build(records: &[DeliveryRecord], interrupt: &Interrupt<'_>) -> Result<Self, BatchError> {
        let first = records
            .first()
            .ok_or_else(|| BatchError::data("cannot build a graph for an empty batch"))?;
        let projection = UtmProjection::for_reference(first.pickup())
            .map_err(|err| BatchError::data(format!("delivery {}: {err}", first.delivery_id)))?;

        let mut nodes = Vec::with_capacity(records.len() * 2);
        for (index, record) in records.iter().enumerate() {
            for (role, location) in [
                (NodeRole::Pickup, record.pickup()),
                (NodeRole::Dropoff, record.dropoff()),
            ] {
                let point = project(&projection, record, location)?;
                nodes.push(GraphNode {
                    id: nodes.len(),
                    role,
                    delivery_id: record.delivery_id,
                    record: index,
                    point,
                });
            }
        }

        let mut edges = vec![Vec::new(); nodes.len()];
        for i in 0..records.len() {
            interrupt.check()?;

            let pickup = &nodes[Self::pickup_id(i)];
            let mut outgoing = Vec::with_capacity(records.len());
            outgoing.push(Edge {
                to: Self::dropoff_id(i),
                weight: 0.0,
            });
            for j in (0..records.len()).filter(|&j| j != i) {
                let dropoff = &nodes[Self::dropoff_id(j)];
                outgoing.push(Edge {
                    to: dropoff.id,
                    weight: planar_distance(&pickup.point, &dropoff.point),
                });
            }
            edges[Self::pickup_id(i)] = outgoing;
        }

        tracing::trace!(
            nodes = nodes.len(),
            zone = %projection.zone(),
            "Built delivery graph"
        );

        Ok(Self {
            projection,
            nodes,
            edges,
        })
    }

    pub fn projection(&self) -> &UtmProjection {
        &self.projection
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn node(&self, id: usize) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    /// Outgoing edges of `id`; empty for dropoffs and unknown ids.
    pub fn edges(&self, id: usize) -> &[Edge] {
        self.edges.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn edge_count(&self) -> usize {
        self.edges.iter().map(Vec::len).sum()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

fn project(projection: &UtmProjection, record: &DeliveryRecord, location: GeoPoint) -> Result<PlanarPoint, BatchError> {
    projection.forward(location).map_err(|err| {
        BatchError::data(format!(
            "delivery {} at ({}, {}) has no finite projection: {err}",
            record.delivery_id,
            location.x(),
            location.y(),
        ))
    })
}
