use serde::{Deserialize, Serialize};
use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use crate::shared_types::default_one;

#[derive(Copy, Clone, Deserialize, Serialize, Debug)]
pub struct RawTransform {
    #[serde(default)]
    pub x: f32,

    #[serde(default)]
    pub y: f32,

    #[serde(default)]
    pub z: f32,

    #[serde(default)]
    #[serde(rename = "qX")]
    pub quat_x: f32,

    #[serde(default)]
    #[serde(rename = "qY")]
    pub quat_y: f32,

    #[serde(default)]
    #[serde(rename = "qZ")]
    pub quat_z: f32,

    #[serde(default = "default_one")]
    #[serde(rename = "qW")]
    pub quat_w: f32,

    #[serde(default = "default_one")]
    #[serde(rename = "scX")]
    pub scale_x: f32,

    #[serde(default = "default_one")]
    #[serde(rename = "scY")]
    pub scale_y: f32,

    #[serde(default = "default_one")]
    #[serde(rename = "scZ")]
    pub scale_z: f32,
}

impl Default for RawTransform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            quat_x: 0.0,
            quat_y: 0.0,
            quat_z: 0.0,
            quat_w: 1.0,
            scale_x: 1.0,
            scale_y: 1.0,
            scale_z: 1.0,
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub struct PurifiedTransform {
    pub position: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub scale: Vector3<f32>,
}

impl From<RawTransform> for PurifiedTransform {
    fn from(initial: RawTransform) -> Self {
        Self {
            position: Vector3::new(initial.x, initial.y, initial.z),
            rotation: UnitQuaternion::from_quaternion(Quaternion::new(
                initial.quat_w,
                initial.quat_x,
                initial.quat_y,
                initial.quat_z,
            )),
            scale: Vector3::new(initial.scale_x, initial.scale_y, initial.scale_z),
        }
    }
}

impl From<PurifiedTransform> for RawTransform {
    fn from(transform: PurifiedTransform) -> Self {
        let quat = transform.rotation.into_inner();
        Self {
            x: transform.position.x,
            y: transform.position.y,
            z: transform.position.z,
            quat_x: quat.i,
            quat_y: quat.j,
            quat_z: quat.k,
            quat_w: quat.w,
            scale_x: transform.scale.x,
            scale_y: transform.scale.y,
            scale_z: transform.scale.z,
        }
    }
}

impl Default for PurifiedTransform {
    fn default() -> Self {
        RawTransform::default().into()
    }
}
