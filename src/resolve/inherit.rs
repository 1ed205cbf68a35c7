// Asset inheritance ordering
//
//  Copyright (C) 2019-2023 MALR contributors.
//
//  This file is part of MALR.
//
//  This program is free software: you can redistribute it and/or modify
//  it under the terms of the GNU General Public License as published by
//  the Free Software Foundation, either version 3 of the License, or
//  (at your option) any later version.
//
//  This program is distributed in the hope that it will be useful,
//  but WITHOUT ANY WARRANTY; without even the implied warranty of
//  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//  GNU General Public License for more details.
//
//  You should have received a copy of the GNU General Public License
//  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Cycle detection and topological ordering of the `extends` graph.
//!
//! The graph has one node per asset and an edge from each asset to its
//!   super-asset.
//! Since inheritance is single,
//!   every node has an out-degree of at most one and a depth-first search
//!   from any node follows a single path.
//!
//! The search is the usual three-color DFS:
//!   a node is _visited_ when it is pushed onto the current path and
//!   _finished_ once its entire path has been emitted.
//! Encountering a node that is visited but not finished means the path
//!   has looped back onto itself.
//!
//! Nodes are emitted super-before-sub,
//!   which is the order in which every later phase processes assets so
//!   that an asset is never processed before the assets it inherits from.
//! Members of a cycle are never emitted.

use fixedbitset::FixedBitSet;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::{
    global::ModelIdSize,
    model::{AssetId, Model},
};

type ExtendsGraph = DiGraph<AssetId, (), ModelIdSize>;

/// Result of ordering the `extends` graph.
#[derive(Debug, Default, PartialEq, Eq)]
pub(super) struct Hierarchy {
    /// Assets not part of any cycle,
    ///   super-assets first.
    pub order: Vec<AssetId>,

    /// Each distinct cycle,
    ///   beginning with the member first reached by the search.
    pub cycles: Vec<Vec<AssetId>>,
}

impl Hierarchy {
    /// Order all assets of `model` by their super-asset references.
    pub fn build(model: &Model) -> Self {
        let graph = extends_graph(model);
        let node_count = graph.node_count();

        let mut visited = FixedBitSet::with_capacity(node_count);
        let mut finished = FixedBitSet::with_capacity(node_count);
        let mut cyclic = FixedBitSet::with_capacity(node_count);
        let mut hierarchy = Self::default();

        for start in graph.node_indices() {
            let mut path: Vec<NodeIndex<ModelIdSize>> = Vec::new();
            let mut next = Some(start);

            while let Some(node) = next {
                let i = node.index();

                if finished.contains(i) {
                    break;
                }

                if visited.put(i) {
                    // Still on the current path;
                    //   everything from its first occurrence loops.
                    if let Some(pos) = path.iter().position(|&n| n == node) {
                        let cycle = &path[pos..];
                        for member in cycle {
                            cyclic.insert(member.index());
                        }

                        hierarchy
                            .cycles
                            .push(cycle.iter().map(|&n| graph[n]).collect());
                    }

                    break;
                }

                path.push(node);
                next = graph.neighbors(node).next();
            }

            for node in path.into_iter().rev() {
                finished.insert(node.index());

                if !cyclic.contains(node.index()) {
                    hierarchy.order.push(graph[node]);
                }
            }
        }

        hierarchy
    }

    pub fn has_cycles(&self) -> bool {
        !self.cycles.is_empty()
    }
}

fn extends_graph(model: &Model) -> ExtendsGraph {
    let mut graph =
        ExtendsGraph::with_capacity(model.assets.len(), model.assets.len());

    // Node indices mirror asset indices.
    for asset in model.assets() {
        graph.add_node(asset.id());
    }

    for asset in model.assets() {
        if let Some(sup) = asset.super_asset() {
            graph.add_edge(
                NodeIndex::new(asset.id().index()),
                NodeIndex::new(sup.index()),
                (),
            );
        }
    }

    graph
}
