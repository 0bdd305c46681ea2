use crate::ast::{ASTNode, NodeKind};
use serde::Serialize;
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub id: usize,
    pub kind: NodeKind,
    pub label: String,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct GraphEdge {
    pub parent: usize,
    pub child: usize,
}

/// Labelled nodes and parent→child edges of a parsed expression, ready to
/// hand to a graph renderer. Ids are assigned in pre-order from 0, so the
/// root is always node 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TreeGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl TreeGraph {
    pub fn from_ast(ast: &ASTNode) -> Self {
        let mut graph = TreeGraph::default();
        graph.visit(ast, None);
        graph
    }

    fn visit(&mut self, node: &ASTNode, parent: Option<usize>) {
        let id = self.nodes.len();
        self.nodes.push(GraphNode {
            id,
            kind: node.kind(),
            label: node.label(),
        });
        if let Some(parent) = parent {
            self.edges.push(GraphEdge { parent, child: id });
        }
        for child in node.children() {
            self.visit(child, Some(id));
        }
    }

    /// Renders the graph in Graphviz DOT syntax.
    pub fn to_dot(&self) -> String {
        let mut dot = String::from("digraph expression {\n");
        for node in &self.nodes {
            let _ = writeln!(
                dot,
                "    n{} [label=\"{}\"];",
                node.id,
                node.label.replace('\\', "\\\\").replace('"', "\\\"")
            );
        }
        for edge in &self.edges {
            let _ = writeln!(dot, "    n{} -> n{};", edge.parent, edge.child);
        }
        dot.push_str("}\n");
        dot
    }
}
