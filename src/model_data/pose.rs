use serde::{Deserialize, Serialize};
use crate::shared_types::Point3;

// A pose preset assigns local transform overrides to bones by name,
// the same way MMD-style pose files do. Stored as RON.
#[derive(Clone, Deserialize, Serialize, Debug)]
pub struct RawPosePreset {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub bones: Vec<RawBonePose>,
}

#[derive(Clone, Deserialize, Serialize, Debug)]
pub struct RawBonePose {
    pub name: String,

    #[serde(default)]
    pub position: Option<Point3>,

    // intrinsic X-Y-Z Euler angles, degrees
    #[serde(default)]
    pub rotation: Option<Point3>,

    #[serde(default)]
    pub scale: Option<Point3>,
}
