//! Node radius resolution.

use crate::config::RadiusPolicy;
use crate::model::{Node, ValueRange};

/// Stand-in for "invisible": small enough to disappear, large enough to stay a valid radius.
pub const TINY: f64 = 1e-6;

pub const VALUE_EXPONENT: f64 = 1.1;

/// Power scale `y = sign(x) * |x|^k` mapped linearly from a domain onto `[r0, r1]`, clamped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowScale {
    exponent: f64,
    d0: f64,
    d1: f64,
    r0: f64,
    r1: f64,
}

fn raise(x: f64, k: f64) -> f64 {
    if x < 0.0 { -(-x).powf(k) } else { x.powf(k) }
}

impl PowScale {
    pub fn new(exponent: f64, domain: (f64, f64), range: (f64, f64)) -> Self {
        Self {
            exponent,
            d0: raise(domain.0, exponent),
            d1: raise(domain.1, exponent),
            r0: range.0,
            r1: range.1,
        }
    }

    pub fn apply(&self, x: f64) -> f64 {
        let span = self.d1 - self.d0;
        if !span.is_normal() || !x.is_finite() {
            return self.r0;
        }
        let t = ((raise(x, self.exponent) - self.d0) / span).clamp(0.0, 1.0);
        self.r0 + (self.r1 - self.r0) * t
    }
}

/// A [`RadiusPolicy`] resolved against one model into a single callable.
pub(crate) enum ResolvedRadius<'a> {
    Constant(f64),
    Scaled(PowScale),
    Derived(&'a (dyn Fn(&Node) -> f64 + Send + Sync)),
}

impl<'a> ResolvedRadius<'a> {
    pub(crate) fn resolve(policy: &'a RadiusPolicy, values: ValueRange) -> Self {
        match policy {
            RadiusPolicy::Constant(r) => Self::Constant(*r),
            RadiusPolicy::Range { min, .. } if values.is_degenerate() => Self::Constant(*min),
            RadiusPolicy::Range { min, max } => Self::Scaled(PowScale::new(
                VALUE_EXPONENT,
                (values.min, values.max),
                (*min, *max),
            )),
            RadiusPolicy::Derived(f) => Self::Derived(f.as_ref()),
        }
    }

    pub(crate) fn radius(&self, node: &Node) -> f64 {
        let r = match self {
            Self::Constant(r) => *r,
            Self::Scaled(scale) => match node.value {
                Some(v) => scale.apply(v),
                None => TINY,
            },
            Self::Derived(f) => f(node),
        };
        if r.is_finite() { r.max(TINY) } else { TINY }
    }
}
