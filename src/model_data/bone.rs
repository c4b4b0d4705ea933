use serde::{Deserialize, Serialize};
use crate::shared_types::default_none_parent;

#[derive(Clone, Deserialize, Serialize, Debug)]
pub struct RawBone {
    // authoring tools may leave the name blank; the runtime falls back
    // to a synthetic label derived from the bone id
    #[serde(default)]
    pub name: String,

    #[serde(default = "default_none_parent")]
    pub parent: String,

    #[serde(default)]
    pub length: f32,

    #[serde(default)]
    pub transform: super::transform::RawTransform,
}
