// src/dag/graph.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::errors::{Result, ShardschedError};
use crate::types::ShardId;

/// Validated adjacency information for a shard registry.
///
/// Building one checks that every dependency id is in range and that the
/// graph is acyclic, so everything downstream can rely on both.
#[derive(Debug, Clone)]
pub struct ShardGraph {
    /// Direct dependencies per shard.
    dependencies: Vec<Vec<ShardId>>,
    /// Direct dependents per shard (the reverse edges).
    dependents: Vec<Vec<ShardId>>,
    topological_order: Vec<ShardId>,
}

impl ShardGraph {
    /// Build from `(label, dependencies)` pairs in id order. Labels are only
    /// used for error messages.
    pub fn build<'a, I>(nodes: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a [ShardId])>,
    {
        let nodes: Vec<(&str, &[ShardId])> = nodes.into_iter().collect();
        let len = nodes.len();

        let mut dependencies = Vec::with_capacity(len);
        let mut dependents = vec![Vec::new(); len];

        for (id, (_, deps)) in nodes.iter().enumerate() {
            for &dep in deps.iter() {
                if dep >= len {
                    return Err(ShardschedError::UnknownDependency {
                        shard: id,
                        dependency: dep,
                    });
                }
                if !dependents[dep].contains(&id) {
                    dependents[dep].push(id);
                }
            }
            dependencies.push(deps.to_vec());
        }

        // Edge direction: dep -> shard.
        let mut graph: DiGraphMap<ShardId, ()> = DiGraphMap::with_capacity(len, 0);
        for id in 0..len {
            graph.add_node(id);
        }
        for (id, deps) in dependencies.iter().enumerate() {
            for &dep in deps {
                graph.add_edge(dep, id, ());
            }
        }

        // A topological sort fails on any cycle, self-loops included.
        let topological_order = match toposort(&graph, None) {
            Ok(order) => order,
            Err(cycle) => {
                let id = cycle.node_id();
                let label = nodes.get(id).map(|(label, _)| *label).unwrap_or("<unknown>");
                return Err(ShardschedError::DependencyCycle(format!(
                    "cycle detected in shard graph involving shard '{label}' (id {id})"
                )));
            }
        };

        Ok(Self {
            dependencies,
            dependents,
            topological_order,
        })
    }

    /// Build from bare dependency lists; shards are labelled `shard-<id>`.
    pub fn from_dependencies(deps: &[Vec<ShardId>]) -> Result<Self> {
        let labels: Vec<String> = (0..deps.len()).map(|id| format!("shard-{id}")).collect();
        Self::build(
            labels
                .iter()
                .map(String::as_str)
                .zip(deps.iter().map(Vec::as_slice)),
        )
    }

    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    pub fn dependencies_of(&self, id: ShardId) -> &[ShardId] {
        self.dependencies
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn dependents_of(&self, id: ShardId) -> &[ShardId] {
        self.dependents.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Shards with no dependencies.
    pub fn roots(&self) -> impl Iterator<Item = ShardId> + '_ {
        self.dependencies
            .iter()
            .enumerate()
            .filter(|(_, deps)| deps.is_empty())
            .map(|(id, _)| id)
    }

    /// One valid execution order (every shard after all its dependencies).
    pub fn topological_order(&self) -> &[ShardId] {
        &self.topological_order
    }
}
