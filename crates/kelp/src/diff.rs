//! Reconciles a fresh layout against the retained state of the previous commit.
//!
//! Nodes, parent/child links and connections are each partitioned into entering, persisting and
//! exiting entities. The returned state holds the freshly computed target geometry of everything
//! visible, regardless of how far the painter got with the previous transitions, so commits
//! compose from geometric truth rather than from an animation frame.

use crate::connection::RoutedConnection;
use crate::geom::EdgeGeometry;
use crate::layout::LayoutResult;
use crate::model::{ConnectionKey, HierarchyModel, NodeId, Point};
use crate::scale::TINY;
use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Node,
    Link,
    Connection,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityId {
    Node(NodeId),
    /// Link from a node to its parent, keyed by the child.
    Link(NodeId),
    Connection(ConnectionKey),
}

impl EntityId {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityId::Node(_) => EntityKind::Node,
            EntityId::Link(_) => EntityKind::Link,
            EntityId::Connection(_) => EntityKind::Connection,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Enter,
    Update,
    Exit,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Shape {
    Circle { center: Point, radius: f64 },
    Path(EdgeGeometry),
}

impl Shape {
    pub fn lerp(&self, other: &Shape, t: f64) -> Shape {
        match (self, other) {
            (
                Shape::Circle { center: c0, radius: r0 },
                Shape::Circle { center: c1, radius: r1 },
            ) => Shape::Circle {
                center: c0.lerp(*c1, t),
                radius: r0 + (r1 - r0) * t,
            },
            (Shape::Path(g0), Shape::Path(g1)) => Shape::Path(g0.lerp(g1, t)),
            _ => {
                if t < 1.0 {
                    self.clone()
                } else {
                    other.clone()
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaintInstruction {
    pub entity: EntityId,
    pub kind: EntityKind,
    pub phase: Phase,
    pub transition_from: Shape,
    pub transition_to: Shape,
    pub opacity_from: f64,
    pub opacity_to: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetainedNode {
    pub position: Point,
    pub radius: f64,
    pub parent: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetainedConnection {
    pub key: ConnectionKey,
    pub geometry: EdgeGeometry,
    pub resolved_from: NodeId,
}

/// Target geometry of the last commit, the baseline for the next one.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderState {
    committed: bool,
    root: Option<NodeId>,
    nodes: IndexMap<NodeId, RetainedNode>,
    links: IndexMap<NodeId, EdgeGeometry>,
    #[serde(serialize_with = "serialize_values")]
    connections: IndexMap<ConnectionKey, RetainedConnection>,
}

// Connection keys are not strings, so they cannot be JSON object keys.
fn serialize_values<S: serde::Serializer>(
    map: &IndexMap<ConnectionKey, RetainedConnection>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(map.values())
}

impl RenderState {
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    pub fn node(&self, id: &NodeId) -> Option<&RetainedNode> {
        self.nodes.get(id)
    }

    pub fn position(&self, id: &NodeId) -> Option<Point> {
        self.nodes.get(id).map(|n| n.position)
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    pub fn link(&self, child: &NodeId) -> Option<&EdgeGeometry> {
        self.links.get(child)
    }

    pub fn connection(&self, key: &ConnectionKey) -> Option<&RetainedConnection> {
        self.connections.get(key)
    }

    pub fn root(&self) -> Option<&NodeId> {
        self.root.as_ref()
    }

    fn root_position(&self) -> Option<Point> {
        self.root.as_ref().and_then(|r| self.position(r))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Commit {
    pub instructions: Vec<PaintInstruction>,
    pub state: RenderState,
}

impl Commit {
    pub fn count(&self, kind: EntityKind, phase: Phase) -> usize {
        self.instructions
            .iter()
            .filter(|i| i.kind == kind && i.phase == phase)
            .count()
    }

    pub fn instruction(&self, entity: &EntityId) -> Option<&PaintInstruction> {
        self.instructions.iter().find(|i| &i.entity == entity)
    }
}

struct Context<'a> {
    model: &'a HierarchyModel,
    layout: &'a LayoutResult,
    previous: &'a RenderState,
}

impl Context<'_> {
    /// Where an entering entity under `id` grows from: its parent's previous position, else the
    /// previous root.
    ///
    /// When the parent itself is entering, the walk continues up the ancestor chain and the
    /// nearest ancestor that was on screen wins over the root, so a subtree opened several
    /// levels at once unfolds from the node that was clicked.
    fn enter_origin(&self, id: &NodeId, fresh: Point) -> Point {
        if !self.previous.committed {
            return fresh;
        }
        let from_chain = self.model.ancestor_chain(id).and_then(|chain| {
            chain
                .iter()
                .rev()
                .skip(1)
                .find_map(|a| self.previous.position(a))
        });
        from_chain
            .or_else(|| self.previous.root_position())
            .unwrap_or(fresh)
    }

    /// Where an exiting entity under `id` collapses into: the nearest ancestor visible now.
    fn exit_target(&self, id: &NodeId) -> Point {
        let from_chain = self.model.ancestor_chain(id).and_then(|chain| {
            chain
                .iter()
                .rev()
                .skip(1)
                .find_map(|a| self.layout.position(a))
        });
        from_chain
            .or_else(|| {
                let parent = self.previous.node(id)?.parent.as_ref()?;
                self.layout.position(parent)
            })
            .or_else(|| self.layout.root().map(|r| r.position))
            .unwrap_or_default()
    }

    /// Current position of a resolved connection endpoint that may have just appeared.
    fn endpoint_origin(&self, id: &NodeId, fresh: Point) -> Point {
        match self.previous.position(id) {
            Some(p) => p,
            None => self.enter_origin(id, fresh),
        }
    }
}

fn enter_opacity(first_commit: bool) -> f64 {
    if first_commit { 1.0 } else { TINY }
}

/// Partitions the fresh layout and connections against `previous`.
pub fn diff(
    model: &HierarchyModel,
    layout: &LayoutResult,
    connections: &[RoutedConnection],
    previous: &RenderState,
) -> Commit {
    let cx = Context {
        model,
        layout,
        previous,
    };
    let first = !previous.committed;
    let mut instructions = Vec::new();
    let mut next = RenderState {
        committed: true,
        root: layout.root().map(|r| r.id.clone()),
        ..Default::default()
    };

    // Nodes.
    for n in &layout.nodes {
        let to = Shape::Circle {
            center: n.position,
            radius: n.radius,
        };
        let instruction = match previous.node(&n.id) {
            Some(old) => PaintInstruction {
                entity: EntityId::Node(n.id.clone()),
                kind: EntityKind::Node,
                phase: Phase::Update,
                transition_from: Shape::Circle {
                    center: old.position,
                    radius: old.radius,
                },
                transition_to: to,
                opacity_from: 1.0,
                opacity_to: 1.0,
            },
            None => PaintInstruction {
                entity: EntityId::Node(n.id.clone()),
                kind: EntityKind::Node,
                phase: Phase::Enter,
                transition_from: Shape::Circle {
                    center: cx.enter_origin(&n.id, n.position),
                    radius: if first { n.radius } else { TINY },
                },
                transition_to: to,
                opacity_from: enter_opacity(first),
                opacity_to: 1.0,
            },
        };
        instructions.push(instruction);
        next.nodes.insert(
            n.id.clone(),
            RetainedNode {
                position: n.position,
                radius: n.radius,
                parent: n.parent.clone(),
            },
        );
    }
    for (id, old) in &previous.nodes {
        if layout.contains(id) {
            continue;
        }
        instructions.push(PaintInstruction {
            entity: EntityId::Node(id.clone()),
            kind: EntityKind::Node,
            phase: Phase::Exit,
            transition_from: Shape::Circle {
                center: old.position,
                radius: old.radius,
            },
            transition_to: Shape::Circle {
                center: cx.exit_target(id),
                radius: TINY,
            },
            opacity_from: 1.0,
            opacity_to: TINY,
        });
    }

    // Parent/child links.
    for n in &layout.nodes {
        let Some(parent) = n.parent.as_ref().and_then(|p| layout.get(p)) else {
            continue;
        };
        let geometry = EdgeGeometry::diagonal(parent.position, n.position);
        let instruction = match previous.link(&n.id) {
            Some(old) => PaintInstruction {
                entity: EntityId::Link(n.id.clone()),
                kind: EntityKind::Link,
                phase: Phase::Update,
                transition_from: Shape::Path(old.clone()),
                transition_to: Shape::Path(geometry.clone()),
                opacity_from: 1.0,
                opacity_to: 1.0,
            },
            None => {
                let from = if first {
                    geometry.clone()
                } else {
                    geometry.degenerate_like(cx.enter_origin(&n.id, n.position))
                };
                PaintInstruction {
                    entity: EntityId::Link(n.id.clone()),
                    kind: EntityKind::Link,
                    phase: Phase::Enter,
                    transition_from: Shape::Path(from),
                    transition_to: Shape::Path(geometry.clone()),
                    opacity_from: enter_opacity(first),
                    opacity_to: 1.0,
                }
            }
        };
        instructions.push(instruction);
        next.links.insert(n.id.clone(), geometry);
    }
    for (child, old) in &previous.links {
        if next.links.contains_key(child) {
            continue;
        }
        instructions.push(PaintInstruction {
            entity: EntityId::Link(child.clone()),
            kind: EntityKind::Link,
            phase: Phase::Exit,
            transition_from: Shape::Path(old.clone()),
            transition_to: Shape::Path(old.degenerate_like(cx.exit_target(child))),
            opacity_from: 1.0,
            opacity_to: TINY,
        });
    }

    // Connections.
    for c in connections {
        let instruction = match previous.connection(&c.key) {
            Some(old) => PaintInstruction {
                entity: EntityId::Connection(c.key.clone()),
                kind: EntityKind::Connection,
                phase: Phase::Update,
                transition_from: Shape::Path(old.geometry.clone()),
                transition_to: Shape::Path(c.geometry.clone()),
                opacity_from: 1.0,
                opacity_to: 1.0,
            },
            None => {
                let from = if first {
                    c.geometry.clone()
                } else {
                    let fresh = layout.position(&c.resolved_from).unwrap_or_default();
                    c.geometry
                        .degenerate_like(cx.endpoint_origin(&c.resolved_from, fresh))
                };
                PaintInstruction {
                    entity: EntityId::Connection(c.key.clone()),
                    kind: EntityKind::Connection,
                    phase: Phase::Enter,
                    transition_from: Shape::Path(from),
                    transition_to: Shape::Path(c.geometry.clone()),
                    opacity_from: enter_opacity(first),
                    opacity_to: 1.0,
                }
            }
        };
        instructions.push(instruction);
        next.connections.insert(
            c.key.clone(),
            RetainedConnection {
                key: c.key.clone(),
                geometry: c.geometry.clone(),
                resolved_from: c.resolved_from.clone(),
            },
        );
    }
    for (key, old) in &previous.connections {
        if next.connections.contains_key(key) {
            continue;
        }
        let target = layout
            .position(&old.resolved_from)
            .unwrap_or_else(|| cx.exit_target(&old.resolved_from));
        instructions.push(PaintInstruction {
            entity: EntityId::Connection(key.clone()),
            kind: EntityKind::Connection,
            phase: Phase::Exit,
            transition_from: Shape::Path(old.geometry.clone()),
            transition_to: Shape::Path(old.geometry.degenerate_like(target)),
            opacity_from: 1.0,
            opacity_to: TINY,
        });
    }

    let commit = Commit {
        instructions,
        state: next,
    };
    tracing::debug!(
        entering = commit.count(EntityKind::Node, Phase::Enter),
        persisting = commit.count(EntityKind::Node, Phase::Update),
        exiting = commit.count(EntityKind::Node, Phase::Exit),
        connections = connections.len(),
        "render commit"
    );
    commit
}
