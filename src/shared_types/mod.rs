use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Deserialize, Serialize, Default, Debug, PartialEq)]
pub struct Point3 {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl From<nalgebra::Vector3<f32>> for Point3 {
    fn from(v: nalgebra::Vector3<f32>) -> Self {
        Self { x: v.x, y: v.y, z: v.z }
    }
}

impl From<Point3> for nalgebra::Vector3<f32> {
    fn from(p: Point3) -> Self {
        nalgebra::Vector3::new(p.x, p.y, p.z)
    }
}

pub(crate) fn default_one() -> f32 { 1.0 }
pub(crate) fn default_none_parent() -> String { "__none__".into() }
