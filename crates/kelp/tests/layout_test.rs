use kelp::config::DEFAULT_MARGIN;
use kelp::layout::{default_separation, layout, max_level_width};
use kelp::model::Node;
use kelp::scale::TINY;
use kelp::{HierarchyModel, LayoutResult, NodeId, RadiusPolicy, TreeConfig, bind};
use serde_json::Value;
use std::collections::BTreeMap;
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

fn org_model() -> HierarchyModel {
    bind(&fixture("connections.json")["tree"]).unwrap()
}

/// Checks every adjacent same-depth pair against `gap`, scaled by the node height.
fn assert_separation(
    model: &HierarchyModel,
    result: &LayoutResult,
    gap: impl Fn(&Node, &Node) -> f64,
) {
    let mut rows: BTreeMap<usize, Vec<_>> = BTreeMap::new();
    for n in &result.nodes {
        rows.entry(n.depth).or_default().push(n);
    }
    for row in rows.values() {
        for pair in row.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let want = gap(model.get(a.index), model.get(b.index)) * result.node_height;
            let got = b.position.y - a.position.y;
            assert!(
                got + 1e-6 >= want,
                "{} -> {}: distance {got} < required {want}",
                a.id,
                b.id
            );
        }
    }
}

#[test]
fn basic_example_positions() {
    let model = bind(&fixture("basic.json")).unwrap();
    let result = layout(&model, &TreeConfig::default());

    let depths: Vec<usize> = result.nodes.iter().map(|n| n.depth).collect();
    assert_eq!(depths, vec![0, 1, 1, 2]);
    for n in &result.nodes {
        assert_eq!(n.position.x, n.depth as f64 * result.column_width);
    }
    let y = |id: u64| result.position(&NodeId::Int(id)).unwrap().y;
    assert!(y(2) < y(3));
    // Parent centred over its single child.
    assert!((y(3) - y(4)).abs() < 1e-9);
    assert!((y(1) - (y(2) + y(3)) / 2.0).abs() < 1e-9);
    assert_separation(&model, &result, default_separation);
}

#[test]
fn separation_holds_in_every_visibility_state() {
    let mut model = org_model();
    let config = TreeConfig::default();
    assert_separation(&model, &layout(&model, &config), default_separation);

    for id in ["web", "eng", "ops", "eng", "web", "root", "root"] {
        model.toggle(&NodeId::from(id));
        assert_separation(&model, &layout(&model, &config), default_separation);
    }
    model.collapse(Some(2));
    assert_separation(&model, &layout(&model, &config), default_separation);
}

#[test]
fn custom_separation_replaces_the_table() {
    let model = org_model();
    let config = TreeConfig::default().with_separation(|_, _| 10.0);
    let result = layout(&model, &config);
    assert_separation(&model, &result, |_, _| 10.0);
}

#[test]
fn layout_is_idempotent() {
    let mut model = org_model();
    model.toggle(&NodeId::from("ops"));
    let config = TreeConfig::default();
    let a = layout(&model, &config);
    let b = layout(&model, &config);
    let pa: Vec<_> = a.nodes.iter().map(|n| (n.id.clone(), n.position)).collect();
    let pb: Vec<_> = b.nodes.iter().map(|n| (n.id.clone(), n.position)).collect();
    assert_eq!(pa, pb);
    assert_eq!(a.height, b.height);
}

#[test]
fn range_radius_over_zero_values_is_constant_min() {
    let model = bind(&fixture("zero_values.json")).unwrap();
    let config = TreeConfig {
        radius: RadiusPolicy::Range { min: 4.0, max: 20.0 },
        ..Default::default()
    };
    let result = layout(&model, &config);
    assert_eq!(result.nodes.len(), 5);
    for n in &result.nodes {
        assert_eq!(n.radius, 4.0, "{}", n.id);
    }
}

#[test]
fn range_radius_scales_values() {
    let model = org_model();
    let config = TreeConfig {
        radius: RadiusPolicy::Range { min: 4.0, max: 20.0 },
        ..Default::default()
    };
    let result = layout(&model, &config);
    let r = |id: &str| result.get(&NodeId::from(id)).unwrap().radius;
    assert_eq!(r("web"), 20.0);
    assert!(r("css") > 4.0 && r("css") < r("support"));
    assert_eq!(r("legal"), TINY);
}

#[test]
fn derived_radius_is_used_per_node() {
    let model = org_model();
    let config = TreeConfig::default().with_radius_fn(|n| 2.0 + n.depth as f64);
    let result = layout(&model, &config);
    for n in &result.nodes {
        assert_eq!(n.radius, 2.0 + n.depth as f64);
    }
}

#[test]
fn tiny_canvas_never_produces_nan() {
    let model = org_model();
    for (width, height) in [(1.0, Some(1.0)), (0.0, Some(0.0)), (-50.0, None), (10.0, Some(2.0))] {
        let config = TreeConfig {
            width,
            height,
            ..Default::default()
        };
        let result = layout(&model, &config);
        assert!(result.column_width >= 1.0);
        assert!(result.node_height > 0.0 && result.node_height.is_finite());
        for n in &result.nodes {
            assert!(n.position.is_finite(), "{} at {:?}", n.id, n.position);
            assert!(n.radius.is_finite());
        }
    }
}

#[test]
fn auto_height_follows_widest_level() {
    let mut model = bind(&fixture("basic.json")).unwrap();
    let config = TreeConfig::default();
    assert_eq!(max_level_width(&model, &model.visible_nodes()), 2);
    let result = layout(&model, &config);
    assert_eq!(result.height, 2.0 * 30.0 + 2.0 * DEFAULT_MARGIN);

    model.collapse(Some(0));
    let result = layout(&model, &config);
    assert_eq!(result.height, 30.0 + 2.0 * DEFAULT_MARGIN);

    let fixed = TreeConfig {
        height: Some(500.0),
        ..Default::default()
    };
    assert_eq!(layout(&model, &fixed).height, 500.0);

    let aspect = TreeConfig {
        pixels_per_node: 0.0,
        aspect: 0.5,
        ..Default::default()
    };
    assert_eq!(layout(&model, &aspect).height, 400.0);
}

#[test]
fn deepest_level_fits_inside_reserved_width() {
    let model = org_model();
    let config = TreeConfig::default();
    let result = layout(&model, &config);
    let deepest = result.nodes.iter().map(|n| n.position.x).fold(0.0, f64::max);
    let reserved = model.max_label_length() as f64 * config.glyph_width;
    assert!(deepest + reserved <= result.inner_width + 1e-9);
}

#[test]
fn labels_follow_sibling_state() {
    let mut model = org_model();
    // Only "ops" open among root's expandable children.
    model.toggle(&NodeId::from("eng"));
    let result = layout(&model, &TreeConfig::default());
    let shown = |id: &str| result.get(&NodeId::from(id)).unwrap().label_visible;
    assert!(shown("ops"));
    assert!(!shown("eng"));
    assert!(!shown("legal"));
    assert!(shown("root"));

    let config = TreeConfig::default().with_label_visibility(|_, _| false);
    let result = layout(&model, &config);
    assert!(result.nodes.iter().all(|n| !n.label_visible));
}
