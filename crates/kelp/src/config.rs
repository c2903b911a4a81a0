//! Render configuration.
//!
//! The serializable part mirrors the JSON options accepted by the CLI (camelCase keys). Closures
//! (derived radius, separation and label-visibility overrides) can only be installed from code.

use crate::model::Node;
use crate::{Error, Result};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_WIDTH: f64 = 800.0;
pub const DEFAULT_ASPECT: f64 = 1.0;
pub const DEFAULT_MARGIN: f64 = 16.0;
pub const DEFAULT_PIXELS_PER_NODE: f64 = 30.0;
pub const DEFAULT_RADIUS: f64 = 4.5;
/// Average glyph width used to estimate label extents without measuring text.
pub const DEFAULT_GLYPH_WIDTH: f64 = 8.39;
pub const DEFAULT_TEXT_GAP: f64 = 10.0;
pub const DEFAULT_DURATION_MS: u64 = 666;

pub type RadiusFn = dyn Fn(&Node) -> f64 + Send + Sync;
pub type SeparationFn = dyn Fn(&Node, &Node) -> f64 + Send + Sync;
pub type LabelVisibilityFn = dyn Fn(&Node, &LabelPeers) -> bool + Send + Sync;

/// Open/expandable counts among a node's siblings (node inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LabelPeers {
    pub open: usize,
    pub expandable: usize,
}

#[derive(Clone)]
pub enum RadiusPolicy {
    Constant(f64),
    /// `value` mapped through a power scale over the model's value range.
    Range { min: f64, max: f64 },
    Derived(Arc<RadiusFn>),
}

impl fmt::Debug for RadiusPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RadiusPolicy::Constant(r) => f.debug_tuple("Constant").field(r).finish(),
            RadiusPolicy::Range { min, max } => f
                .debug_struct("Range")
                .field("min", min)
                .field("max", max)
                .finish(),
            RadiusPolicy::Derived(_) => f.write_str("Derived(..)"),
        }
    }
}

impl Default for RadiusPolicy {
    fn default() -> Self {
        Self::Constant(DEFAULT_RADIUS)
    }
}

impl<'de> Deserialize<'de> for RadiusPolicy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Constant(f64),
            Range([f64; 2]),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Constant(r) => Ok(RadiusPolicy::Constant(r)),
            Raw::Range([min, max]) => Ok(RadiusPolicy::Range { min, max }),
        }
    }
}

#[derive(Clone)]
pub struct SeparationOverride(pub Arc<SeparationFn>);

impl fmt::Debug for SeparationOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SeparationOverride(..)")
    }
}

#[derive(Clone)]
pub struct LabelVisibilityOverride(pub Arc<LabelVisibilityFn>);

impl fmt::Debug for LabelVisibilityOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LabelVisibilityOverride(..)")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TreeConfig {
    pub width: f64,
    pub height: Option<f64>,
    /// Auto-height pixels per visible sibling row; `0` disables auto height.
    pub pixels_per_node: f64,
    pub aspect: f64,
    pub margin: f64,
    pub radius: RadiusPolicy,
    pub glyph_width: f64,
    pub text_gap: f64,
    pub duration_ms: u64,
    #[serde(skip)]
    pub separation: Option<SeparationOverride>,
    #[serde(skip)]
    pub label_visibility: Option<LabelVisibilityOverride>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: None,
            pixels_per_node: DEFAULT_PIXELS_PER_NODE,
            aspect: DEFAULT_ASPECT,
            margin: DEFAULT_MARGIN,
            radius: RadiusPolicy::default(),
            glyph_width: DEFAULT_GLYPH_WIDTH,
            text_gap: DEFAULT_TEXT_GAP,
            duration_ms: DEFAULT_DURATION_MS,
            separation: None,
            label_visibility: None,
        }
    }
}

impl TreeConfig {
    pub fn from_json(value: &Value) -> Result<Self> {
        let cfg: TreeConfig = crate::json::from_value_ref(value)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if let RadiusPolicy::Range { min, max } = self.radius {
            if !(min.is_finite() && max.is_finite()) || min > max || min < 0.0 {
                return Err(Error::InvalidConfig {
                    message: format!("radius range [{min}, {max}] must satisfy 0 <= min <= max"),
                });
            }
        }
        if !self.pixels_per_node.is_finite() || self.pixels_per_node < 0.0 {
            return Err(Error::InvalidConfig {
                message: format!("pixelsPerNode must be >= 0, got {}", self.pixels_per_node),
            });
        }
        Ok(())
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    pub fn with_separation(
        mut self,
        f: impl Fn(&Node, &Node) -> f64 + Send + Sync + 'static,
    ) -> Self {
        self.separation = Some(SeparationOverride(Arc::new(f)));
        self
    }

    pub fn with_label_visibility(
        mut self,
        f: impl Fn(&Node, &LabelPeers) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.label_visibility = Some(LabelVisibilityOverride(Arc::new(f)));
        self
    }

    pub fn with_radius_fn(mut self, f: impl Fn(&Node) -> f64 + Send + Sync + 'static) -> Self {
        self.radius = RadiusPolicy::Derived(Arc::new(f));
        self
    }
}
