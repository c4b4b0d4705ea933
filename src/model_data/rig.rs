use serde::{Deserialize, Serialize};

#[derive(Clone, Deserialize, Serialize, Debug)]
pub struct RawRigData {
    pub name: String,

    #[serde(rename = "bone")]
    #[serde(default)]
    pub bones: Vec<super::bone::RawBone>,

    #[serde(rename = "mesh")]
    #[serde(default)]
    pub meshes: Vec<super::mesh::RawMesh>,
}
