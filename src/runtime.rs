use crate::model_data::bone::RawBone;
use crate::model_data::pose::RawPosePreset;
use crate::model_data::rig::RawRigData;
use crate::model_data::transform::{PurifiedTransform, RawTransform};
use crate::model_data::RawModelData;
use crate::export::{compose_document, ExportSink, ModelSerializer, MODEL_FILE_NAME, POSE_FILE_NAME};
use indextree::Arena;
use nalgebra::{Matrix4, Point3, Translation3, UnitQuaternion};
use std::collections::{HashMap, VecDeque};
use std::ops::IndexMut;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("malformed model file: {0}")]
    MalformedModel(#[from] serde_json::Error),
    #[error("malformed pose preset: {0}")]
    MalformedPreset(#[from] ron::Error),
    #[error("model has no rig named `{0}`")]
    NoSuchRig(String),
}

#[derive(Clone, Debug)]
pub struct Bone {
    id: usize,
    parent_id: Option<usize>,
    name: String,
    pub length: f32,
    pub transform: PurifiedTransform,
}

impl Bone {
    fn from_raw(id: usize, raw: &RawBone, all_bones: &[RawBone]) -> Self {
        let RawBone { name, parent, length, transform } = raw;
        let parent_id = (0..all_bones.len())
            .find(|&it| !all_bones[it].name.is_empty() && all_bones[it].name.eq(parent));
        Self {
            id,
            parent_id,
            name: name.clone(),
            length: *length,
            transform: (*transform).into(),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn parent_id(&self) -> Option<usize> {
        self.parent_id
    }

    pub fn name(&self) -> Option<&str> {
        if self.name.is_empty() { None } else { Some(&self.name) }
    }

    /// Bone name, or a synthetic label when the authoring tool left it blank.
    pub fn joint_label(&self) -> String {
        if self.name.is_empty() {
            format!("bone_{}", self.id)
        } else {
            self.name.clone()
        }
    }
}

#[derive(Copy, Clone, Debug)]
struct BoneInfo {
    id: usize,
    is_dirty: bool,
}

pub struct RuntimeRig {
    bone_lookup: Arc<HashMap<String, usize>>,
    rest_pose_bones: Arc<Vec<Bone>>,

    bone_tree: Arena<BoneInfo>,
    tree_handles: Vec<indextree::NodeId>,

    bones: Vec<Bone>,
    pose_matrices: Vec<Matrix4<f32>>,

    buffer_deque: VecDeque<indextree::NodeId>,
}

impl RuntimeRig {
    pub fn extract(raw_rig: &RawRigData) -> (String, Self) {
        let RawRigData { name, bones, .. } = raw_rig;
        let mut bone_vec = Vec::with_capacity(bones.len());
        let mut bone_lookup = HashMap::new();
        for bone in bones.iter() {
            if !bone.name.is_empty() {
                bone_lookup.insert(bone.name.clone(), bone_vec.len());
            }
            bone_vec.push(Bone::from_raw(bone_vec.len(), bone, &bones[..]));
        }

        // raw files list parents before their children
        let mut bone_tree = Arena::new();
        let mut tree_handles: Vec<indextree::NodeId> = Vec::with_capacity(bone_vec.len());
        for i in 0..bone_vec.len() {
            let bone = &bone_vec[i];
            let handle = bone_tree.new_node(BoneInfo { id: i, is_dirty: true });
            if let Some(pid) = bone.parent_id {
                let parent_handle = tree_handles[pid];
                parent_handle.append(handle, &mut bone_tree);
            }
            tree_handles.push(handle);
        }

        let pose_matrices = vec![Matrix4::identity(); bone_vec.len()];
        let mut rig = Self {
            bone_lookup: Arc::new(bone_lookup),
            rest_pose_bones: Arc::new(bone_vec.clone()),
            bone_tree,
            tree_handles,
            bones: bone_vec,
            pose_matrices,
            buffer_deque: VecDeque::new(),
        };
        rig.update_matrices();
        (name.clone(), rig)
    }

    pub fn instantiate(&self) -> Self {
        Self {
            bone_lookup: self.bone_lookup.clone(),
            rest_pose_bones: self.rest_pose_bones.clone(),
            bone_tree: self.bone_tree.clone(),
            tree_handles: self.tree_handles.clone(),
            bones: self.bones.clone(),
            pose_matrices: self.pose_matrices.clone(),
            buffer_deque: VecDeque::new(),
        }
    }

    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn bone(&self, bone_id: usize) -> &Bone {
        &self.bones[bone_id]
    }

    pub fn get_bone_by_name(&self, bone_name: &str) -> Option<usize> {
        self.bone_lookup.get(bone_name).map(|&it| it)
    }

    /// Bone children of a bone, in tree order. Non-bone scene nodes never
    /// enter the arena, so no filtering happens here.
    pub fn bone_children<'a>(&'a self, bone_id: usize) -> impl Iterator<Item = usize> + 'a {
        self.tree_handles[bone_id]
            .children(&self.bone_tree)
            .map(move |it| self.bone_tree.get(it).unwrap().get().id)
    }

    /// First bone whose parent is not itself a bone, falling back to the
    /// first bone of the set.
    pub fn export_root(&self) -> Option<usize> {
        if self.bones.is_empty() {
            return None;
        }
        Some(
            self.bones
                .iter()
                .find(|it| it.parent_id.is_none())
                .map(|it| it.id)
                .unwrap_or(0),
        )
    }

    pub fn get_bone_world_position(&self, bone_id: usize) -> Point3<f32> {
        self.pose_matrices[bone_id].transform_point(&Point3::origin())
    }

    /// World position of the bone's far end (length along its local X axis),
    /// for hosts drawing bone markers as segments.
    pub fn get_bone_world_tip(&self, bone_id: usize) -> Point3<f32> {
        let bone = &self.bones[bone_id];
        self.pose_matrices[bone_id].transform_point(&Point3::new(bone.length, 0.0, 0.0))
    }

    pub fn pose_bones(&mut self) -> BonesMut {
        BonesMut { rig: self }
    }

    pub fn reset_pose(&mut self) {
        let rest_pose = self.rest_pose_bones.clone();
        for i in 0..self.bones.len() {
            let mut bones_mut = BonesMut { rig: self };
            bones_mut[i].transform = rest_pose[i].transform;
        }
        self.update_matrices();
    }

    pub fn apply_pose_preset(&mut self, preset: &RawPosePreset) {
        for bone_pose in preset.bones.iter() {
            let bone_id = match self.get_bone_by_name(&bone_pose.name) {
                Some(it) => it,
                None => continue,
            };
            let mut bones_mut = BonesMut { rig: self };
            if let Some(position) = bone_pose.position {
                bones_mut[bone_id].transform.position = position.into();
            }
            if let Some(rotation) = bone_pose.rotation {
                bones_mut[bone_id].transform.rotation = UnitQuaternion::from_euler_angles(
                    rotation.x.to_radians(),
                    rotation.y.to_radians(),
                    rotation.z.to_radians(),
                );
            }
            if let Some(scale) = bone_pose.scale {
                bones_mut[bone_id].transform.scale = scale.into();
            }
        }
        self.update_matrices();
    }

    pub fn update_matrices(&mut self) {
        for &node_id in self.tree_handles.iter() {
            let node = self.bone_tree.get_mut(node_id).unwrap().get_mut();
            if node.is_dirty {
                node.is_dirty = false;
            } else {
                continue;
            }
            let bone_id = node.id;
            let bone = &self.bones[bone_id];
            let parent_transform = match bone.parent_id {
                None => Matrix4::identity(),
                Some(pid) => self.pose_matrices[pid],
            };
            let transition_local = Translation3::from(bone.transform.position).to_homogeneous();
            let rotation_matrix = bone.transform.rotation.to_homogeneous();
            let scale_matrix = Matrix4::new_nonuniform_scaling(&bone.transform.scale);
            self.pose_matrices[bone_id] =
                parent_transform * transition_local * rotation_matrix * scale_matrix;
        }
    }
}

/// Mutable view over a rig's bones: every mutation marks the touched bone's
/// subtree so the next `update_matrices` recomputes it.
pub struct BonesMut<'a> {
    rig: &'a mut RuntimeRig,
}

impl<'a> core::ops::Index<usize> for BonesMut<'a> {
    type Output = Bone;
    fn index(&self, index: usize) -> &Self::Output {
        &self.rig.bones[index]
    }
}

impl<'a> IndexMut<usize> for BonesMut<'a> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        let node_id = self.rig.tree_handles[index];
        for node_id in node_id.descendants(&self.rig.bone_tree) {
            self.rig.buffer_deque.push_back(node_id);
        }
        while let Some(node_id) = self.rig.buffer_deque.pop_front() {
            let node = self.rig.bone_tree.get_mut(node_id).unwrap().get_mut();
            node.is_dirty = true;
        }
        &mut self.rig.bones[index]
    }
}

pub struct SkinnedModelData {
    raw: RawModelData,
    rigs: HashMap<String, RuntimeRig>,
}

impl SkinnedModelData {
    pub fn load(model_file_bytes: &[u8]) -> Result<Self, LoadError> {
        let raw: RawModelData = serde_json::from_slice(model_file_bytes)?;
        let mut rigs = HashMap::new();
        for rig in raw.rigs.iter() {
            let (name, runtime_rig) = RuntimeRig::extract(rig);
            rigs.insert(name, runtime_rig);
        }
        debug!(model = %raw.name, rigs = rigs.len(), "loaded skinned model");
        Ok(Self { raw, rigs })
    }

    pub fn raw(&self) -> &RawModelData {
        &self.raw
    }

    pub fn instantiate_rig(&self, rig_name: &str) -> Option<RuntimeRig> {
        self.rigs.get(rig_name).map(|it| it.instantiate())
    }
}

struct LoadedModel {
    raw: RawModelData,
    rig_name: String,
    rig: RuntimeRig,
}

/// Explicit editing session owned by the caller: holds the current model,
/// replaces it on each load and drops it on clear.
pub struct EditorSession {
    model: Option<LoadedModel>,
}

impl EditorSession {
    pub fn new() -> Self {
        Self { model: None }
    }

    pub fn load_model(&mut self, model_file_bytes: &[u8], rig_name: &str) -> Result<(), LoadError> {
        let model_data = SkinnedModelData::load(model_file_bytes)?;
        let rig = model_data
            .instantiate_rig(rig_name)
            .ok_or_else(|| LoadError::NoSuchRig(rig_name.to_string()))?;
        self.model = Some(LoadedModel {
            raw: model_data.raw.clone(),
            rig_name: rig_name.to_string(),
            rig,
        });
        Ok(())
    }

    pub fn clear_model(&mut self) {
        self.model = None;
    }

    pub fn rig(&self) -> Option<&RuntimeRig> {
        self.model.as_ref().map(|it| &it.rig)
    }

    pub fn rig_mut(&mut self) -> Option<&mut RuntimeRig> {
        self.model.as_mut().map(|it| &mut it.rig)
    }

    pub fn apply_pose_preset(&mut self, preset_file_bytes: &[u8]) -> Result<(), LoadError> {
        let preset: RawPosePreset = ron::de::from_bytes(preset_file_bytes)?;
        if let Some(model) = self.model.as_mut() {
            model.rig.apply_pose_preset(&preset);
        }
        Ok(())
    }

    /// Captures the current pose as a single-frame motion file and hands it
    /// to the delivery collaborator. Silently does nothing without a model
    /// or with an empty bone set.
    pub fn export_pose(&self, sink: &mut dyn ExportSink) {
        let rig = match self.model.as_ref() {
            Some(model) => &model.rig,
            None => return,
        };
        if let Some(document) = compose_document(rig) {
            debug!(bytes = document.len(), "captured pose document");
            sink.deliver(POSE_FILE_NAME, document.as_bytes());
        }
    }

    /// Secondary export: writes the posed bone transforms back into the raw
    /// model and delegates serialization to the external collaborator.
    pub fn export_model(&self, serializer: &dyn ModelSerializer, sink: &mut dyn ExportSink) {
        let model = match self.model.as_ref() {
            Some(model) => model,
            None => return,
        };
        let mut posed = model.raw.clone();
        for raw_rig in posed.rigs.iter_mut() {
            if !raw_rig.name.eq(&model.rig_name) {
                continue;
            }
            for (raw_bone, bone) in raw_rig.bones.iter_mut().zip(model.rig.bones.iter()) {
                raw_bone.transform = RawTransform::from(bone.transform);
            }
        }
        let payload = serializer.serialize(&posed);
        sink.deliver(MODEL_FILE_NAME, &payload);
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new()
    }
}
