//! Entity graph: typed nodes and directed, labeled links between them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Kinds of entity the graph tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    Character,
    Location,
    Item,
    Concept,
}

impl NodeType {
    pub const ALL: [NodeType; 4] = [
        NodeType::Character,
        NodeType::Location,
        NodeType::Item,
        NodeType::Concept,
    ];

    /// Get the display name for this node type.
    pub fn name(&self) -> &'static str {
        match self {
            NodeType::Character => "Character",
            NodeType::Location => "Location",
            NodeType::Item => "Item",
            NodeType::Concept => "Concept",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NodeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeType::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown entity type '{s}'"))
    }
}

/// A node in the knowledge graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityNode {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: NodeType,
    /// Display position.
    pub x: f64,
    pub y: f64,
    /// Open-ended attributes shown by the inspector.
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl EntityNode {
    pub fn new(id: impl Into<String>, label: impl Into<String>, kind: NodeType) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind,
            x: 0.0,
            y: 0.0,
            data: Map::new(),
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

/// A directed, labeled edge. Duplicates are allowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityLink {
    pub source: String,
    pub target: String,
    pub label: String,
}

impl EntityLink {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            label: label.into(),
        }
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

/// Filter used by the tabular entity browser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityFilter {
    /// `None` shows every type.
    pub kind: Option<NodeType>,
    /// Case-insensitive substring matched against label and id.
    pub search: String,
}

impl EntityFilter {
    pub fn matches(&self, node: &EntityNode) -> bool {
        if self.kind.is_some_and(|k| k != node.kind) {
            return false;
        }
        if self.search.is_empty() {
            return true;
        }
        let needle = self.search.to_lowercase();
        node.label.to_lowercase().contains(&needle) || node.id.to_lowercase().contains(&needle)
    }
}

/// The live set of nodes and links.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphStore {
    nodes: Vec<EntityNode>,
    links: Vec<EntityLink>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(nodes: Vec<EntityNode>, links: Vec<EntityLink>) -> Self {
        Self { nodes, links }
    }

    pub fn nodes(&self) -> &[EntityNode] {
        &self.nodes
    }

    pub fn links(&self) -> &[EntityLink] {
        &self.links
    }

    pub fn node(&self, id: &str) -> Option<&EntityNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut EntityNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    /// Insert a node. Ids are unique, so a node whose id is already taken
    /// is dropped and `false` returned.
    pub fn add_node(&mut self, node: EntityNode) -> bool {
        if self.contains(&node.id) {
            return false;
        }
        self.nodes.push(node);
        true
    }

    pub fn add_link(&mut self, link: EntityLink) {
        self.links.push(link);
    }

    /// Remove a node and every link that references it.
    ///
    /// Returns the removed node and the number of links dropped with it,
    /// or `None` if no node has that id.
    pub fn remove_node(&mut self, id: &str) -> Option<(EntityNode, usize)> {
        let index = self.nodes.iter().position(|n| n.id == id)?;
        let node = self.nodes.remove(index);

        let before = self.links.len();
        self.links.retain(|l| !l.touches(id));
        Some((node, before - self.links.len()))
    }

    /// Replace a node's attribute map. Returns `false` if the node is missing.
    pub fn set_data(&mut self, id: &str, data: Map<String, Value>) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.data = data;
                true
            }
            None => false,
        }
    }

    /// Labels in insertion order, as sent to the narrative engine.
    pub fn labels(&self) -> Vec<String> {
        self.nodes.iter().map(|n| n.label.clone()).collect()
    }

    /// Nodes visible under the given browser filter.
    pub fn filter<'a>(&'a self, filter: &'a EntityFilter) -> impl Iterator<Item = &'a EntityNode> {
        self.nodes.iter().filter(move |n| filter.matches(n))
    }

    /// Outgoing and incoming links of a node.
    pub fn links_of<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a EntityLink> {
        self.links.iter().filter(move |l| l.touches(id))
    }

    /// Display label for a node id, falling back to the raw id for dangling links.
    pub fn label_of<'a>(&'a self, id: &'a str) -> &'a str {
        self.node(id).map(|n| n.label.as_str()).unwrap_or(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_graph() -> GraphStore {
        GraphStore::from_parts(
            vec![
                EntityNode::new("player", "Player", NodeType::Character),
                EntityNode::new("loc1", "Dark Forest", NodeType::Location),
                EntityNode::new("npc1", "Goblin Scout", NodeType::Character),
                EntityNode::new("item1", "Rusty Dagger", NodeType::Item),
            ],
            vec![
                EntityLink::new("player", "loc1", "LOCATED_AT"),
                EntityLink::new("npc1", "loc1", "GUARDS"),
                EntityLink::new("player", "item1", "OWNS"),
                EntityLink::new("npc1", "player", "HATES"),
            ],
        )
    }

    #[test]
    fn test_cascade_delete_removes_only_incident_links() {
        let mut graph = sample_graph();
        let (removed, dropped) = graph.remove_node("npc1").unwrap();

        assert_eq!(removed.label, "Goblin Scout");
        assert_eq!(dropped, 2);
        assert!(!graph.contains("npc1"));
        assert_eq!(graph.links().len(), 2);
        assert!(graph.links().iter().all(|l| !l.touches("npc1")));
        assert!(graph
            .links()
            .contains(&EntityLink::new("player", "loc1", "LOCATED_AT")));
        assert!(graph
            .links()
            .contains(&EntityLink::new("player", "item1", "OWNS")));
    }

    #[test]
    fn test_remove_missing_node() {
        let mut graph = sample_graph();
        assert!(graph.remove_node("nope").is_none());
        assert_eq!(graph.nodes().len(), 4);
        assert_eq!(graph.links().len(), 4);
    }

    #[test]
    fn test_add_node_rejects_taken_id() {
        let mut graph = sample_graph();
        assert!(!graph.add_node(EntityNode::new("npc1", "Goblin Twin", NodeType::Character)));
        assert_eq!(graph.nodes().iter().filter(|n| n.id == "npc1").count(), 1);
        assert_eq!(graph.node("npc1").unwrap().label, "Goblin Scout");

        assert!(graph.add_node(EntityNode::new("npc2", "Goblin Twin", NodeType::Character)));
        assert_eq!(graph.nodes().len(), 5);
    }

    #[test]
    fn test_duplicate_links_coexist() {
        let mut graph = sample_graph();
        graph.add_link(EntityLink::new("player", "loc1", "LOCATED_AT"));
        assert_eq!(graph.links().len(), 5);

        let (_, dropped) = graph.remove_node("loc1").unwrap();
        assert_eq!(dropped, 3);
    }

    #[test]
    fn test_filter_by_type_and_search() {
        let graph = sample_graph();

        let characters = EntityFilter {
            kind: Some(NodeType::Character),
            search: String::new(),
        };
        assert_eq!(graph.filter(&characters).count(), 2);

        let goblin = EntityFilter {
            kind: None,
            search: "GOBLIN".to_string(),
        };
        let hits: Vec<_> = graph.filter(&goblin).map(|n| n.id.as_str()).collect();
        assert_eq!(hits, vec!["npc1"]);

        // Search also matches ids
        let by_id = EntityFilter {
            kind: Some(NodeType::Item),
            search: "item".to_string(),
        };
        assert_eq!(graph.filter(&by_id).count(), 1);
    }

    #[test]
    fn test_node_type_parse() {
        assert_eq!("location".parse::<NodeType>(), Ok(NodeType::Location));
        assert_eq!("CONCEPT".parse::<NodeType>(), Ok(NodeType::Concept));
        assert!("Dragon".parse::<NodeType>().is_err());
    }

    #[test]
    fn test_node_serializes_type_field() {
        let node = EntityNode::new("item1", "Rusty Dagger", NodeType::Item)
            .at(250.0, 200.0)
            .with_attr("damage", "1d4");
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "Item");
        assert_eq!(json["data"]["damage"], "1d4");

        let back: EntityNode =
            serde_json::from_str(r#"{"id":"a","label":"A","type":"Concept","x":1,"y":2}"#)
                .unwrap();
        assert!(back.data.is_empty());
    }
}
