#![forbid(unsafe_code)]

//! `kelp` lays out and animates a collapsible, horizontally growing tree.
//!
//! A commit runs three synchronous stages against the bound [`HierarchyModel`]:
//! - [`layout::layout`] positions the visible subtree,
//! - [`connection::route_connections`] resolves declared cross-links to visible endpoints,
//! - [`diff::diff`] partitions nodes, links and connections into entering, persisting and
//!   exiting entities against the retained state of the previous commit.
//!
//! The resulting paint instructions can be fed to an [`transition::Animator`], which keeps one
//! interruptible task per entity.

pub mod config;
pub mod connection;
pub mod diff;
pub mod error;
pub mod geom;
pub mod hierarchy;
mod json;
pub mod layout;
pub mod model;
pub mod path;
pub mod scale;
pub mod transition;
pub mod visibility;

pub use config::{RadiusPolicy, TreeConfig};
pub use diff::{Commit, EntityId, EntityKind, PaintInstruction, Phase, RenderState, Shape};
pub use error::{Error, Result};
pub use hierarchy::{HierarchyBuilder, bind};
pub use layout::{LaidOutNode, LayoutResult};
pub use model::{Connection, HierarchyModel, Node, NodeId, Point};
pub use transition::{Animator, Frame};
pub use visibility::OpenState;

use serde_json::Value;
use std::time::Duration;

/// One commit: layout, connection routing and diff against `previous`.
pub fn render(model: &HierarchyModel, config: &TreeConfig, previous: &RenderState) -> Commit {
    let laid_out = layout::layout(model, config);
    let routed = connection::route_connections(model, &laid_out);
    diff::diff(model, &laid_out, &routed, previous)
}

/// Stateful component: the bound document, its model, the retained render state and the
/// running transitions.
#[derive(Debug)]
pub struct TreeChart {
    config: TreeConfig,
    source: Option<Value>,
    model: Option<HierarchyModel>,
    state: RenderState,
    animator: Animator,
}

impl TreeChart {
    pub fn new(config: TreeConfig) -> Result<Self> {
        config.validate()?;
        let animator = Animator::new(config.duration());
        Ok(Self {
            config,
            source: None,
            model: None,
            state: RenderState::default(),
            animator,
        })
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Binds a document with the default accessors.
    ///
    /// Returns `false` when `source` equals the bound document; the model and its open state
    /// are then left untouched. A different document rebuilds the model while the retained
    /// render state persists.
    pub fn bind(&mut self, source: Value) -> Result<bool> {
        if self.source.as_ref() == Some(&source) {
            return Ok(false);
        }
        let model = hierarchy::bind(&source)?;
        self.model = Some(model);
        self.source = Some(source);
        Ok(true)
    }

    /// Installs a model built elsewhere, e.g. with custom accessors.
    pub fn set_model(&mut self, model: HierarchyModel) {
        self.source = None;
        self.model = Some(model);
    }

    pub fn model(&self) -> Option<&HierarchyModel> {
        self.model.as_ref()
    }

    pub fn model_mut(&mut self) -> Option<&mut HierarchyModel> {
        self.model.as_mut()
    }

    pub fn expand(&mut self, depth_limit: Option<usize>) {
        if let Some(m) = self.model.as_mut() {
            m.expand(depth_limit);
        }
    }

    pub fn collapse(&mut self, depth_limit: Option<usize>) {
        if let Some(m) = self.model.as_mut() {
            m.collapse(depth_limit);
        }
    }

    pub fn toggle(&mut self, id: &NodeId) -> bool {
        self.model.as_mut().is_some_and(|m| m.toggle(id))
    }

    pub fn snapshot_open_state(&self) -> OpenState {
        self.model
            .as_ref()
            .map(HierarchyModel::snapshot_open_state)
            .unwrap_or_default()
    }

    pub fn restore_open_state(&mut self, snapshot: &OpenState) {
        if let Some(m) = self.model.as_mut() {
            m.restore_open_state(snapshot);
        }
    }

    pub fn layout(&self) -> Option<LayoutResult> {
        self.model.as_ref().map(|m| layout::layout(m, &self.config))
    }

    /// Commits the current model and starts its transitions. `None` before anything is bound.
    pub fn render(&mut self) -> Option<Commit> {
        let model = self.model.as_ref()?;
        let commit = render(model, &self.config, &self.state);
        self.state = commit.state.clone();
        self.animator.apply(&commit.instructions);
        Some(commit)
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn animator(&self) -> &Animator {
        &self.animator
    }

    pub fn tick(&mut self, dt: Duration) {
        self.animator.tick(dt);
    }
}
