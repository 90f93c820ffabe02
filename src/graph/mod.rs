//! Connection merging and connectivity analysis over the concept graph.
//!
//! Connections are stored as name lists on each concept. Analysis builds an
//! adjacency index (name -> neighbor indices) once per call so the BFS does
//! O(1) lookups instead of rescanning the concept array.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::store::KnowledgeGraph;

/// A concept-to-concept relationship proposed by the LLM.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectionProposal {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub relationship: String,
}

/// Merge proposed connections into the graph's concept records.
///
/// Each proposal adds `to` to `from`'s connection list and vice versa, skipping
/// edges already present, so replaying the same proposals is a no-op. Proposals
/// naming unknown concepts are skipped with a warning.
///
/// Returns the number of edge entries actually added.
pub fn merge_connections(graph: &mut KnowledgeGraph, proposals: &[ConnectionProposal]) -> usize {
    let known: HashSet<String> = graph.concepts.iter().map(|c| c.name.clone()).collect();
    let mut added = 0;

    for proposal in proposals {
        if !known.contains(&proposal.from) || !known.contains(&proposal.to) {
            tracing::warn!(
                from = %proposal.from,
                to = %proposal.to,
                "Skipping connection naming unknown concept"
            );
            continue;
        }
        if proposal.from == proposal.to {
            continue;
        }

        for (owner, target) in [
            (&proposal.from, &proposal.to),
            (&proposal.to, &proposal.from),
        ] {
            if let Some(concept) = graph.concepts.iter_mut().find(|c| &c.name == owner) {
                if !concept.connections.contains(target) {
                    concept.connections.push(target.clone());
                    added += 1;
                }
            }
        }
    }

    added
}

/// Index of concept names to the indices of their neighbors.
pub struct AdjacencyIndex {
    name_to_idx: HashMap<String, usize>,
    neighbors: Vec<HashSet<usize>>,
}

impl AdjacencyIndex {
    /// Build the index from the graph, treating connections as undirected.
    ///
    /// Connections naming concepts not in the graph are ignored.
    #[must_use]
    pub fn build(graph: &KnowledgeGraph) -> Self {
        let name_to_idx: HashMap<String, usize> = graph
            .concepts
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect();

        let mut neighbors = vec![HashSet::new(); graph.concepts.len()];
        for (i, concept) in graph.concepts.iter().enumerate() {
            for target in &concept.connections {
                if let Some(&j) = name_to_idx.get(target) {
                    neighbors[i].insert(j);
                    neighbors[j].insert(i);
                }
            }
        }

        Self {
            name_to_idx,
            neighbors,
        }
    }

    /// Neighbor names of a concept.
    #[must_use]
    pub fn neighbors_of(&self, name: &str) -> Vec<&str> {
        let Some(&idx) = self.name_to_idx.get(name) else {
            return Vec::new();
        };
        let mut names: Vec<&str> = self.neighbors[idx]
            .iter()
            .filter_map(|&j| {
                self.name_to_idx
                    .iter()
                    .find(|&(_, &v)| v == j)
                    .map(|(k, _)| k.as_str())
            })
            .collect();
        names.sort_unstable();
        names
    }

    /// Number of indexed concepts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    /// Whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }
}

/// A connected component of the concept graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Member concept names, sorted.
    pub members: Vec<String>,
    /// Mean confidence across members.
    pub average_confidence: f64,
}

impl Cluster {
    /// Number of concepts in the cluster.
    #[must_use]
    pub fn size(&self) -> usize {
        self.members.len()
    }
}

/// Compute connected components via BFS over the adjacency index.
///
/// Clusters are returned largest first; isolated concepts form singleton
/// clusters.
#[must_use]
pub fn clusters(graph: &KnowledgeGraph) -> Vec<Cluster> {
    let index = AdjacencyIndex::build(graph);
    let n = graph.concepts.len();
    let mut visited = vec![false; n];
    let mut result = Vec::new();

    for start in 0..n {
        if visited[start] {
            continue;
        }

        let mut component = Vec::new();
        let mut queue = VecDeque::new();
        visited[start] = true;
        queue.push_back(start);

        while let Some(i) = queue.pop_front() {
            component.push(i);
            for &j in &index.neighbors[i] {
                if !visited[j] {
                    visited[j] = true;
                    queue.push_back(j);
                }
            }
        }

        let mut members: Vec<String> = component
            .iter()
            .map(|&i| graph.concepts[i].name.clone())
            .collect();
        members.sort_unstable();
        let average_confidence =
            component.iter().map(|&i| graph.concepts[i].confidence).sum::<f64>()
                / component.len() as f64;

        result.push(Cluster {
            members,
            average_confidence,
        });
    }

    result.sort_by(|a, b| b.size().cmp(&a.size()));
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Concept;

    fn graph_with(concepts: Vec<Concept>) -> KnowledgeGraph {
        KnowledgeGraph {
            concepts,
            ..KnowledgeGraph::default()
        }
    }

    fn proposal(from: &str, to: &str) -> ConnectionProposal {
        ConnectionProposal {
            from: from.to_string(),
            to: to.to_string(),
            relationship: String::new(),
        }
    }

    #[test]
    fn test_merge_adds_both_directions() {
        let mut graph = graph_with(vec![Concept::new("A", 0.5, ""), Concept::new("B", 0.5, "")]);
        let added = merge_connections(&mut graph, &[proposal("A", "B")]);

        assert_eq!(added, 2);
        assert_eq!(graph.concepts[0].connections, vec!["B"]);
        assert_eq!(graph.concepts[1].connections, vec!["A"]);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut graph = graph_with(vec![Concept::new("A", 0.5, ""), Concept::new("B", 0.5, "")]);
        merge_connections(&mut graph, &[proposal("A", "B")]);
        let added = merge_connections(&mut graph, &[proposal("A", "B")]);

        assert_eq!(added, 0);
        assert_eq!(graph.concepts[0].connections.len(), 1);
    }

    #[test]
    fn test_merge_skips_unknown_concepts() {
        let mut graph = graph_with(vec![Concept::new("A", 0.5, "")]);
        let added = merge_connections(&mut graph, &[proposal("A", "ghost")]);

        assert_eq!(added, 0);
        assert!(graph.concepts[0].connections.is_empty());
    }

    #[test]
    fn test_merge_skips_self_edges() {
        let mut graph = graph_with(vec![Concept::new("A", 0.5, "")]);
        let added = merge_connections(&mut graph, &[proposal("A", "A")]);
        assert_eq!(added, 0);
    }

    #[test]
    fn test_two_connected_concepts_form_one_cluster() {
        // Store with A and B where only B lists the connection.
        let a = Concept::new("A", 0.5, "");
        let mut b = Concept::new("B", 0.5, "");
        b.connections.push("A".to_string());
        let graph = graph_with(vec![a, b]);

        let found = clusters(&graph);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].size(), 2);
        assert_eq!(found[0].members, vec!["A", "B"]);
    }

    #[test]
    fn test_isolated_concepts_are_singletons() {
        let graph = graph_with(vec![
            Concept::new("A", 0.2, ""),
            Concept::new("B", 0.4, ""),
            Concept::new("C", 0.6, ""),
        ]);
        let found = clusters(&graph);
        assert_eq!(found.len(), 3);
        assert!(found.iter().all(|c| c.size() == 1));
    }

    #[test]
    fn test_clusters_sorted_largest_first() {
        let mut a = Concept::new("A", 0.5, "");
        a.connections.push("B".to_string());
        let mut b = Concept::new("B", 0.5, "");
        b.connections.push("C".to_string());
        let graph = graph_with(vec![
            a,
            b,
            Concept::new("C", 0.5, ""),
            Concept::new("lonely", 0.5, ""),
        ]);

        let found = clusters(&graph);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].size(), 3);
        assert_eq!(found[1].size(), 1);
    }

    #[test]
    fn test_cluster_average_confidence() {
        let mut a = Concept::new("A", 0.2, "");
        a.connections.push("B".to_string());
        let graph = graph_with(vec![a, Concept::new("B", 0.8, "")]);

        let found = clusters(&graph);
        assert!((found[0].average_confidence - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_connections_to_missing_names_are_ignored() {
        let mut a = Concept::new("A", 0.5, "");
        a.connections.push("deleted".to_string());
        let graph = graph_with(vec![a]);

        let found = clusters(&graph);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].size(), 1);
    }

    #[test]
    fn test_adjacency_neighbors_of() {
        let mut a = Concept::new("A", 0.5, "");
        a.connections.push("B".to_string());
        let graph = graph_with(vec![a, Concept::new("B", 0.5, "")]);

        let index = AdjacencyIndex::build(&graph);
        assert_eq!(index.neighbors_of("A"), vec!["B"]);
        assert_eq!(index.neighbors_of("B"), vec!["A"]);
        assert!(index.neighbors_of("missing").is_empty());
    }

    #[test]
    fn test_empty_graph() {
        let graph = KnowledgeGraph::default();
        assert!(clusters(&graph).is_empty());
        assert!(AdjacencyIndex::build(&graph).is_empty());
    }
}
