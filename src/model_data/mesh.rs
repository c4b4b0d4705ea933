use serde::{Deserialize, Serialize};
use crate::shared_types::default_none_parent;

// Skinned geometry rides along for model re-serialization only: meshes are
// non-bone scene nodes and never enter the bone tree.
#[derive(Clone, Deserialize, Serialize, Debug)]
pub struct RawMesh {
    pub name: String,

    #[serde(default = "default_none_parent")]
    pub parent: String,

    #[serde(default)]
    pub vertices: Vec<f32>,

    #[serde(default)]
    pub triangles: Vec<u16>,

    #[serde(default)]
    pub weights: Vec<f32>,
}
