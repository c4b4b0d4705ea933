pub mod rig;
pub mod bone;
pub mod mesh;
pub mod transform;
pub mod pose;

use serde::{Deserialize, Serialize};

#[derive(Clone, Deserialize, Serialize, Debug)]
pub struct RawModelData {
    pub name: String,

    #[serde(default)]
    pub version: String,

    #[serde(rename = "rig")]
    #[serde(default)]
    pub rigs: Vec<rig::RawRigData>,
}
