//! Relationship multigraph and anchor inference.
//!
//! SPDX relationships form a directed multigraph over element ids. Merging
//! two documents needs two structural anchors of each graph:
//! - the *root*: the element that DESCRIBES the content and has no incoming edge
//! - the *middle*: the root's child that groups the real packages
//!
//! Shapes that do not yield exactly one of each are rejected instead of
//! guessed at.

use crate::error::{MergeErrorKind, Result, SbomMergeError};
use crate::model::{Relationship, RelationshipType};
use indexmap::{IndexMap, IndexSet};
use std::collections::{HashSet, VecDeque};

/// Structural anchors of a relationship graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchors {
    pub root: String,
    pub middle: String,
}

/// Adjacency view over a relationship list.
pub struct RelationshipGraph<'a> {
    edges: &'a [Relationship],
    outgoing: IndexMap<&'a str, Vec<usize>>,
    targets: HashSet<&'a str>,
}

impl<'a> RelationshipGraph<'a> {
    #[must_use]
    pub fn new(edges: &'a [Relationship]) -> Self {
        let mut outgoing: IndexMap<&str, Vec<usize>> = IndexMap::new();
        let mut targets = HashSet::new();
        for (idx, edge) in edges.iter().enumerate() {
            outgoing
                .entry(edge.spdx_element_id.as_str())
                .or_default()
                .push(idx);
            targets.insert(edge.related_spdx_element.as_str());
        }
        Self {
            edges,
            outgoing,
            targets,
        }
    }

    /// Edges leaving `id`.
    pub fn children(&self, id: &str) -> impl Iterator<Item = &'a Relationship> + '_ {
        let edges = self.edges;
        self.outgoing
            .get(id)
            .into_iter()
            .flatten()
            .map(move |&idx| &edges[idx])
    }

    #[must_use]
    pub fn has_incoming(&self, id: &str) -> bool {
        self.targets.contains(id)
    }

    #[must_use]
    pub fn has_outgoing(&self, id: &str) -> bool {
        self.outgoing.contains_key(id)
    }

    /// The element that DESCRIBES the document content.
    pub fn root(&self) -> Result<&'a str> {
        let describing: IndexSet<&'a str> = self
            .edges
            .iter()
            .filter(|e| e.relationship_type == RelationshipType::Describes)
            .map(|e| e.spdx_element_id.as_str())
            .collect();
        let Some(&first) = describing.first() else {
            return Err(SbomMergeError::missing_describes("inferring root element"));
        };

        let roots: Vec<&'a str> = describing
            .iter()
            .copied()
            .filter(|id| !self.has_incoming(id))
            .collect();
        match roots.as_slice() {
            [root] => Ok(*root),
            [] => Err(SbomMergeError::merge(
                "inferring root element",
                MergeErrorKind::CyclicGraph {
                    element: first.to_string(),
                },
            )),
            _ => Err(ambiguous("root", &roots)),
        }
    }

    /// The root's child that itself has children.
    ///
    /// A root whose only child is a leaf (a document describing a single
    /// package) uses that described element as middle.
    pub fn middle(&self, root: &str) -> Result<&'a str> {
        let children: IndexSet<&'a str> = self
            .children(root)
            .map(|e| e.related_spdx_element.as_str())
            .filter(|child| *child != root)
            .collect();

        let grouping: Vec<&'a str> = children
            .iter()
            .copied()
            .filter(|child| self.has_outgoing(child))
            .collect();
        match grouping.as_slice() {
            [middle] => return Ok(*middle),
            [] => {}
            _ => return Err(ambiguous("middle", &grouping)),
        }

        let described: IndexSet<&'a str> = self
            .children(root)
            .filter(|e| e.relationship_type == RelationshipType::Describes)
            .map(|e| e.related_spdx_element.as_str())
            .collect();
        match described.len() {
            1 => Ok(described[0]),
            0 => Err(SbomMergeError::missing_describes("inferring middle element")),
            _ => Err(ambiguous(
                "middle",
                &described.iter().copied().collect::<Vec<_>>(),
            )),
        }
    }

    /// Root and middle together.
    pub fn anchors(&self) -> Result<Anchors> {
        let root = self.root()?;
        let middle = self.middle(root)?;
        Ok(Anchors {
            root: root.to_string(),
            middle: middle.to_string(),
        })
    }

    /// Every element reachable from `start`, including `start` when it has edges.
    #[must_use]
    pub fn reachable_from(&self, start: &str) -> HashSet<&'a str> {
        let mut seen: HashSet<&'a str> = HashSet::new();
        let mut queue: VecDeque<&'a str> = VecDeque::new();
        if let Some((&key, _)) = self.outgoing.get_key_value(start) {
            queue.push_back(key);
        }
        while let Some(id) = queue.pop_front() {
            if !seen.insert(id) {
                continue;
            }
            for edge in self.children(id) {
                queue.push_back(edge.related_spdx_element.as_str());
            }
        }
        seen
    }
}

fn ambiguous(role: &'static str, candidates: &[&str]) -> SbomMergeError {
    SbomMergeError::merge(
        format!("inferring {role} element"),
        MergeErrorKind::AmbiguousAnchor {
            role,
            candidates: candidates.iter().map(|c| (*c).to_string()).collect(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rel(from: &str, kind: RelationshipType, to: &str) -> Relationship {
        Relationship::new(from, kind, to)
    }

    fn standard() -> Vec<Relationship> {
        vec![
            rel("SPDXRef-DOCUMENT", RelationshipType::Describes, "SPDXRef-image"),
            rel("SPDXRef-image", RelationshipType::Contains, "SPDXRef-a"),
            rel("SPDXRef-image", RelationshipType::Contains, "SPDXRef-b"),
            rel("SPDXRef-a", RelationshipType::DependsOn, "SPDXRef-b"),
        ]
    }

    #[test]
    fn test_anchors_of_standard_graph() {
        let edges = standard();
        let anchors = RelationshipGraph::new(&edges).anchors().unwrap();
        assert_eq!(anchors.root, "SPDXRef-DOCUMENT");
        assert_eq!(anchors.middle, "SPDXRef-image");
    }

    #[test]
    fn test_builder_sources_are_not_roots() {
        let mut edges = vec![rel("SPDXRef-builder", RelationshipType::BuildToolOf, "SPDXRef-image")];
        edges.extend(standard());
        let graph = RelationshipGraph::new(&edges);
        assert!(!graph.has_incoming("SPDXRef-builder"));
        assert_eq!(graph.root().unwrap(), "SPDXRef-DOCUMENT");
    }

    #[test]
    fn test_missing_describes_is_fatal() {
        let edges = vec![rel("SPDXRef-image", RelationshipType::Contains, "SPDXRef-a")];
        let err = RelationshipGraph::new(&edges).anchors().unwrap_err();
        assert!(matches!(
            err,
            SbomMergeError::Merge {
                source: MergeErrorKind::MissingDescribes,
                ..
            }
        ));
    }

    #[test]
    fn test_leaf_middle_falls_back_to_described_element() {
        let edges = vec![rel(
            "SPDXRef-DOCUMENT",
            RelationshipType::Describes,
            "SPDXRef-DocumentRoot-Unknown",
        )];
        let anchors = RelationshipGraph::new(&edges).anchors().unwrap();
        assert_eq!(anchors.middle, "SPDXRef-DocumentRoot-Unknown");
    }

    #[test]
    fn test_multi_branch_middle_is_rejected() {
        let edges = vec![
            rel("SPDXRef-DOCUMENT", RelationshipType::Describes, "SPDXRef-x"),
            rel("SPDXRef-DOCUMENT", RelationshipType::Describes, "SPDXRef-y"),
            rel("SPDXRef-x", RelationshipType::Contains, "SPDXRef-a"),
            rel("SPDXRef-y", RelationshipType::Contains, "SPDXRef-b"),
        ];
        let err = RelationshipGraph::new(&edges).anchors().unwrap_err();
        assert!(matches!(
            err,
            SbomMergeError::Merge {
                source: MergeErrorKind::AmbiguousAnchor { role: "middle", .. },
                ..
            }
        ));
    }

    #[test]
    fn test_cyclic_root_is_rejected() {
        let edges = vec![
            rel("SPDXRef-DOCUMENT", RelationshipType::Describes, "SPDXRef-image"),
            rel("SPDXRef-image", RelationshipType::Contains, "SPDXRef-DOCUMENT"),
        ];
        let err = RelationshipGraph::new(&edges).root().unwrap_err();
        assert!(matches!(
            err,
            SbomMergeError::Merge {
                source: MergeErrorKind::CyclicGraph { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_two_describing_roots_are_rejected() {
        let edges = vec![
            rel("SPDXRef-DOCUMENT", RelationshipType::Describes, "SPDXRef-a"),
            rel("SPDXRef-OTHER", RelationshipType::Describes, "SPDXRef-b"),
        ];
        let err = RelationshipGraph::new(&edges).root().unwrap_err();
        assert!(matches!(
            err,
            SbomMergeError::Merge {
                source: MergeErrorKind::AmbiguousAnchor { role: "root", .. },
                ..
            }
        ));
    }

    #[test]
    fn test_children_and_incoming() {
        let edges = standard();
        let graph = RelationshipGraph::new(&edges);
        assert_eq!(graph.children("SPDXRef-image").count(), 2);
        assert!(graph.has_incoming("SPDXRef-b"));
        assert!(!graph.has_incoming("SPDXRef-DOCUMENT"));
    }

    #[test]
    fn test_reachable_from_root() {
        let mut edges = standard();
        edges.push(rel("SPDXRef-orphan", RelationshipType::Contains, "SPDXRef-c"));
        let graph = RelationshipGraph::new(&edges);
        let reachable = graph.reachable_from("SPDXRef-DOCUMENT");
        assert!(reachable.contains("SPDXRef-b"));
        assert!(!reachable.contains("SPDXRef-c"));
    }
}
