use kelp::scale::TINY;
use kelp::{EntityId, EntityKind, NodeId, Phase, Shape, TreeChart, TreeConfig};
use serde_json::{Value, json};
use std::path::PathBuf;

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

fn fixture(name: &str) -> Value {
    let path = workspace_root().join("fixtures").join(name);
    let text = std::fs::read_to_string(&path).expect("fixture");
    serde_json::from_str(&text).expect("fixture json")
}

fn chart(doc: Value) -> TreeChart {
    let mut chart = TreeChart::new(TreeConfig::default()).unwrap();
    assert!(chart.bind(doc).unwrap());
    chart
}

fn node(id: u64) -> EntityId {
    EntityId::Node(NodeId::Int(id))
}

fn center(shape: &Shape) -> kelp::Point {
    match shape {
        Shape::Circle { center, .. } => *center,
        Shape::Path(g) => panic!("expected a circle, got {g:?}"),
    }
}

#[test]
fn render_without_data_is_none() {
    let mut chart = TreeChart::new(TreeConfig::default()).unwrap();
    assert!(chart.render().is_none());
}

#[test]
fn first_commit_does_not_animate() {
    let mut chart = chart(fixture("basic.json"));
    let commit = chart.render().unwrap();

    assert_eq!(commit.count(EntityKind::Node, Phase::Enter), 4);
    assert_eq!(commit.count(EntityKind::Link, Phase::Enter), 3);
    for ins in &commit.instructions {
        assert_eq!(ins.transition_from, ins.transition_to, "{:?}", ins.entity);
        assert_eq!(ins.opacity_from, 1.0);
    }
    assert!(commit.state.is_committed());
}

#[test]
fn rerender_without_changes_is_stable() {
    let mut chart = chart(fixture("basic.json"));
    let first = chart.render().unwrap();
    let second = chart.render().unwrap();

    assert_eq!(second.count(EntityKind::Node, Phase::Update), 4);
    assert_eq!(second.count(EntityKind::Node, Phase::Enter), 0);
    assert_eq!(second.count(EntityKind::Node, Phase::Exit), 0);
    for ins in &second.instructions {
        assert_eq!(ins.transition_from, ins.transition_to, "{:?}", ins.entity);
    }
    assert_eq!(first.state, second.state);
}

#[test]
fn collapsed_nodes_exit_into_their_visible_ancestor() {
    let mut chart = chart(fixture("basic.json"));
    chart.render();
    let old_four = chart.state().position(&NodeId::Int(4)).unwrap();

    chart.collapse(Some(1));
    let commit = chart.render().unwrap();

    assert_eq!(commit.count(EntityKind::Node, Phase::Exit), 1);
    assert_eq!(commit.count(EntityKind::Link, Phase::Exit), 1);
    let exit = commit.instruction(&node(4)).unwrap();
    assert_eq!(exit.phase, Phase::Exit);
    assert_eq!(center(&exit.transition_from), old_four);
    // Node 3's fresh position, not the one it had before the collapse.
    let three_now = commit.state.position(&NodeId::Int(3)).unwrap();
    assert_eq!(center(&exit.transition_to), three_now);
    assert_eq!(exit.opacity_to, TINY);
    assert!(commit.state.node(&NodeId::Int(4)).is_none());

    let link = commit
        .instruction(&EntityId::Link(NodeId::Int(4)))
        .unwrap();
    match &link.transition_to {
        Shape::Path(g) => {
            assert!(g.is_degenerate());
            assert_eq!(g.start(), Some(three_now));
        }
        other => panic!("expected a path, got {other:?}"),
    }
}

#[test]
fn expanded_nodes_enter_from_previous_ancestor_position() {
    let mut chart = chart(fixture("basic.json"));
    chart.collapse(Some(0));
    chart.render();
    let root_before = chart.state().position(&NodeId::Int(1)).unwrap();

    chart.expand(None);
    let commit = chart.render().unwrap();
    assert_eq!(commit.count(EntityKind::Node, Phase::Enter), 3);
    for id in [2, 3, 4] {
        let ins = commit.instruction(&node(id)).unwrap();
        assert_eq!(ins.phase, Phase::Enter);
        assert_eq!(center(&ins.transition_from), root_before);
        assert_eq!(ins.opacity_from, TINY);
        match &ins.transition_from {
            Shape::Circle { radius, .. } => assert_eq!(*radius, TINY),
            Shape::Path(_) => unreachable!(),
        }
    }
    let root = commit.instruction(&node(1)).unwrap();
    assert_eq!(root.phase, Phase::Update);
}

#[test]
fn state_holds_targets_of_every_visible_entity() {
    let mut chart = chart(fixture("basic.json"));
    chart.render();
    chart.toggle(&NodeId::Int(3));
    let commit = chart.render().unwrap();
    let layout = chart.layout().unwrap();

    let retained: Vec<&NodeId> = commit.state.node_ids().collect();
    let visible: Vec<&NodeId> = layout.ids().collect();
    assert_eq!(retained, visible);
    for n in &layout.nodes {
        assert_eq!(commit.state.position(&n.id), Some(n.position));
    }
    assert!(commit.state.link(&NodeId::Int(4)).is_none());
    assert!(commit.state.link(&NodeId::Int(3)).is_some());
}

#[test]
fn connections_follow_the_three_way_partition() {
    let doc = json!({
        "id": 1,
        "children": [
            { "id": 2, "children": [{ "id": 21 }] },
            { "id": 3 }
        ],
        "connections": [{ "from": 21, "to": 3 }]
    });
    let mut chart = chart(doc);
    let first = chart.render().unwrap();
    assert_eq!(first.count(EntityKind::Connection, Phase::Enter), 1);

    // Endpoint moves to node 2, the key is unchanged.
    chart.toggle(&NodeId::Int(2));
    let second = chart.render().unwrap();
    assert_eq!(second.count(EntityKind::Connection, Phase::Update), 1);

    chart.model_mut().unwrap().set_connections(Vec::new());
    let third = chart.render().unwrap();
    assert_eq!(third.count(EntityKind::Connection, Phase::Exit), 1);
    let exit = third
        .instructions
        .iter()
        .find(|i| i.kind == EntityKind::Connection)
        .unwrap();
    match &exit.transition_to {
        Shape::Path(g) => assert!(g.is_degenerate()),
        other => panic!("expected a path, got {other:?}"),
    }
}

#[test]
fn rebinding_equal_document_is_a_noop() {
    let mut chart = chart(fixture("basic.json"));
    chart.collapse(Some(1));
    assert!(!chart.bind(fixture("basic.json")).unwrap());
    assert_eq!(chart.model().unwrap().visible_ids().len(), 3);
}

#[test]
fn rebinding_new_document_keeps_retained_state() {
    let mut chart = chart(fixture("basic.json"));
    chart.render();
    let changed = json!({
        "id": 1,
        "name": "root",
        "children": [{ "id": 3, "name": "b" }, { "id": 5, "name": "e" }]
    });
    assert!(chart.bind(changed).unwrap());
    let commit = chart.render().unwrap();

    assert_eq!(commit.instruction(&node(1)).unwrap().phase, Phase::Update);
    assert_eq!(commit.instruction(&node(3)).unwrap().phase, Phase::Update);
    assert_eq!(commit.instruction(&node(5)).unwrap().phase, Phase::Enter);
    assert_eq!(commit.instruction(&node(2)).unwrap().phase, Phase::Exit);
    assert_eq!(commit.instruction(&node(4)).unwrap().phase, Phase::Exit);
}

#[test]
fn invalid_document_is_rejected_on_bind() {
    let mut chart = TreeChart::new(TreeConfig::default()).unwrap();
    let err = chart
        .bind(json!({ "id": 1, "children": [{ "id": 1 }] }))
        .unwrap_err();
    assert!(matches!(err, kelp::Error::InvalidHierarchy { .. }));
    assert!(chart.model().is_none());
}

#[test]
fn grandchild_enters_from_grandparent_when_parent_is_new() {
    let mut chart = chart(json!({
        "id": 1,
        "children": [{ "id": 2, "children": [{ "id": 3, "children": [{ "id": 4 }] }] }]
    }));
    chart.collapse(Some(1));
    chart.render();
    let two_before = chart.state().position(&NodeId::Int(2)).unwrap();
    let root_before = chart.state().position(&NodeId::Int(1)).unwrap();
    assert_ne!(two_before, root_before);

    chart.expand(None);
    let commit = chart.render().unwrap();
    for id in [3, 4] {
        let ins = commit.instruction(&node(id)).unwrap();
        assert_eq!(ins.phase, Phase::Enter);
        assert_eq!(center(&ins.transition_from), two_before, "node {id}");
    }
}
