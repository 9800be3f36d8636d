//! Effect descriptors and the kind -> constructor registry.
//!
//! A descriptor is a flat JSON-style record: `kind` plus the variant's
//! parameters, e.g. `{"kind": "stroke", "size": 2, "opacity": 100, "color": [255, 0, 0]}`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::{
    Effect, GlowParams, OuterGlowEffect, ShadowEffect, ShadowParams, StrokeEffect, StrokeParams,
};
use crate::error::{Error, Result};
use crate::filters::core::Rgb;
use crate::filters::Acceleration;

/// Registered effect kinds, in registry order.
pub const EFFECT_KINDS: [&str; 3] = ["stroke", "shadow", "glow"];

type Constructor = fn(&Map<String, Value>, Acceleration) -> Result<Effect>;

const REGISTRY: [(&str, Constructor); 3] = [
    (StrokeEffect::NAME, build_stroke),
    (ShadowEffect::NAME, build_shadow),
    (OuterGlowEffect::NAME, build_glow),
];

/// Declarative description of one effect.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EffectDescriptor {
    pub kind: String,
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl EffectDescriptor {
    /// Build a descriptor from a kind and a JSON object of parameters.
    ///
    /// Non-object `params` yield an empty parameter set.
    pub fn new(kind: impl Into<String>, params: Value) -> Self {
        let params = match params {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            kind: kind.into(),
            params,
        }
    }

    pub fn stroke(size: i32, opacity: u8, color: Rgb) -> Self {
        Self::new(
            StrokeEffect::NAME,
            json!({ "size": size, "opacity": opacity, "color": color }),
        )
    }

    pub fn shadow(size: i32, spread: u8, opacity: u8, color: Rgb) -> Self {
        Self::new(
            ShadowEffect::NAME,
            json!({ "size": size, "spread": spread, "opacity": opacity, "color": color }),
        )
    }

    pub fn glow(size: i32, spread: u8, opacity: u8, color: Rgb) -> Self {
        Self::new(
            OuterGlowEffect::NAME,
            json!({ "size": size, "spread": spread, "opacity": opacity, "color": color }),
        )
    }

    /// Set or replace one parameter.
    pub fn with_param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    /// Parse a JSON array of descriptors.
    pub fn parse_list(json: &str) -> Result<Vec<Self>> {
        serde_json::from_str(json).map_err(|e| Error::Descriptor(e.to_string()))
    }

    /// Construct the effect this descriptor names.
    pub fn build(&self, accel: Acceleration) -> Result<Effect> {
        create(self, accel)
    }
}

/// Construct the effect variant named by `descriptor.kind`.
///
/// Fails with [`Error::UnknownEffect`] for unregistered kinds and with
/// [`Error::Parameter`] / [`Error::Range`] for bad parameters.
pub fn create(descriptor: &EffectDescriptor, accel: Acceleration) -> Result<Effect> {
    let (_, constructor) = REGISTRY
        .iter()
        .find(|(name, _)| *name == descriptor.kind)
        .ok_or_else(|| Error::UnknownEffect {
            kind: descriptor.kind.clone(),
            valid: EFFECT_KINDS.to_vec(),
        })?;
    constructor(&descriptor.params, accel)
}

fn params<T: DeserializeOwned>(effect: &'static str, map: &Map<String, Value>) -> Result<T> {
    T::deserialize(Value::Object(map.clone())).map_err(|e| Error::parameter(effect, e))
}

fn build_stroke(map: &Map<String, Value>, accel: Acceleration) -> Result<Effect> {
    let p: StrokeParams = params(StrokeEffect::NAME, map)?;
    StrokeEffect::from_params(p, accel).map(Effect::Stroke)
}

fn build_shadow(map: &Map<String, Value>, accel: Acceleration) -> Result<Effect> {
    let p: ShadowParams = params(ShadowEffect::NAME, map)?;
    ShadowEffect::from_params(p, accel).map(Effect::Shadow)
}

fn build_glow(map: &Map<String, Value>, accel: Acceleration) -> Result<Effect> {
    let p: GlowParams = params(OuterGlowEffect::NAME, map)?;
    OuterGlowEffect::from_params(p, accel).map(Effect::Glow)
}
