use crate::{
    Error, InstanceSet, Joint, LayerArray, MAX_JOINT_CHILDREN, Placement, SceneGraph, Skeleton,
};
use glam::{Mat4, Vec3, Vec4};
use std::sync::Arc;

/// Floats per packed joint: translate, rotate and scale as vec4 plus eight child slots.
pub const JOINT_RECORD_FLOATS: usize = 20;

/// Floats in front of the rest-pose joints in the skeleton info buffer: four counts plus the
/// armature matrix.
pub const SKELETON_INFO_HEADER_FLOATS: usize = 20;

/// Facing direction every instance starts with.
pub const DEFAULT_FORWARD: Vec4 = Vec4::new(0.0, 0.0, -1.0, 0.0);

/// GPU layout of one joint, 80 bytes.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct JointRecord {
    pub translate: [f32; 4],
    /// Euler degrees, intrinsic Z-Y-X.
    pub rotate: [f32; 4],
    pub scale: [f32; 4],
    /// Child joint indices, unused slots are `-1`.
    pub children: [i32; MAX_JOINT_CHILDREN],
}

impl JointRecord {
    pub fn translate(&self) -> Vec3 {
        Vec4::from(self.translate).truncate()
    }

    pub fn rotate(&self) -> Vec3 {
        Vec4::from(self.rotate).truncate()
    }

    pub fn scale(&self) -> Vec3 {
        Vec4::from(self.scale).truncate()
    }

    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.translate())
            * crate::euler_to_rotation_matrix(self.rotate())
            * Mat4::from_scale(self.scale())
    }

    pub fn child_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.children
            .iter()
            .take_while(|&&c| c >= 0)
            .map(|&c| c as usize)
    }
}

impl From<&Joint> for JointRecord {
    fn from(joint: &Joint) -> Self {
        let mut children = [-1i32; MAX_JOINT_CHILDREN];
        for (slot, &child) in children.iter_mut().zip(&joint.children) {
            *slot = child as i32;
        }
        Self {
            translate: joint.translate.extend(0.0).to_array(),
            rotate: joint.rotate.extend(0.0).to_array(),
            scale: joint.scale.extend(0.0).to_array(),
            children,
        }
    }
}

/// Leading part of the skeleton info buffer.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SkeletonInfoHeader {
    pub joint_count: f32,
    pub root_count: f32,
    pub layer_len: f32,
    pub padding: f32,
    pub armature: [f32; 16],
}

/// Byte views of every buffer the pose evaluator and the renderer read.
#[derive(Copy, Clone, Debug)]
pub struct SerializedBuffers<'a> {
    /// `[joint_count, root_count, layer_len, -1]`, armature matrix, one rest-pose skeleton.
    pub skeleton_info: &'a [u8],
    pub parent_indices: &'a [u8],
    pub layer_array: &'a [u8],
    /// `instance_count` consecutive skeletons of [`JointRecord`]s.
    pub joints: &'a [u8],
    /// Rest-pose world matrix of every joint node, per instance.
    pub joint_world_matrices: &'a [u8],
    pub placements: &'a [u8],
    pub velocity: &'a [u8],
    pub forward: &'a [u8],
    pub target_position: &'a [u8],
    pub behavior: &'a [u8],
}

/// One bind-pose skeleton replicated across every instance, plus per-instance driver state.
///
/// The parent table and the layer array are shared; the joint buffer holds one full copy of the
/// rest pose per instance.
#[derive(Clone, Debug)]
pub struct InstancePosePack {
    skeleton: Arc<Skeleton>,
    layers: Arc<LayerArray>,
    armature: Mat4,
    header: SkeletonInfoHeader,
    skeleton_info: Vec<u32>,
    joints: Vec<JointRecord>,
    joint_world_matrices: Vec<Mat4>,
    placements: Vec<Mat4>,
    names: Vec<String>,
    velocity: Vec<Vec4>,
    forward: Vec<Vec4>,
    target_position: Vec4,
    behavior: Vec4,
}

impl InstancePosePack {
    /// Extracts the skin of `graph` and packs it for `instances`.
    pub fn from_graph(graph: &SceneGraph, instances: &InstanceSet) -> Result<Self, Error> {
        let skeleton = Arc::new(Skeleton::from_scene(graph.data())?);
        let layers = Arc::new(LayerArray::build(&skeleton)?);
        Self::build(graph, skeleton, layers, instances)
    }

    pub fn build(
        graph: &SceneGraph,
        skeleton: Arc<Skeleton>,
        layers: Arc<LayerArray>,
        instances: &InstanceSet,
    ) -> Result<Self, Error> {
        let joint_count = skeleton.joint_count();
        let scheduled = layers.evaluation_order().count();
        if scheduled != joint_count {
            return Err(Error::JointCountMismatch {
                expected: joint_count,
                actual: scheduled,
            });
        }

        let rest_pose = skeleton
            .joints()
            .iter()
            .map(JointRecord::from)
            .collect::<Vec<_>>();
        let rest_world = skeleton
            .joints()
            .iter()
            .map(|joint| {
                graph.world(joint.node).ok_or(Error::UnknownNode {
                    node: joint.node,
                    node_count: graph.node_count(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let armature = graph.armature_transform();
        let header = SkeletonInfoHeader {
            joint_count: joint_count as f32,
            root_count: skeleton.roots().len() as f32,
            layer_len: layers.len() as f32,
            padding: -1.0,
            armature: armature.to_cols_array(),
        };
        let mut skeleton_info =
            Vec::with_capacity(SKELETON_INFO_HEADER_FLOATS + joint_count * JOINT_RECORD_FLOATS);
        skeleton_info.extend_from_slice(bytemuck::cast_slice::<_, u32>(std::slice::from_ref(
            &header,
        )));
        skeleton_info.extend_from_slice(bytemuck::cast_slice::<_, u32>(&rest_pose));

        let instance_count = instances.len();
        let joints = rest_pose.repeat(instance_count);
        let joint_world_matrices = rest_world.repeat(instance_count);
        let (placements, names) = instances
            .placements()
            .iter()
            .map(|p| (p.transform, p.name.clone()))
            .unzip();

        log::debug!(
            "packed {instance_count} instances x {joint_count} joints ({} layer entries)",
            layers.len()
        );

        Ok(Self {
            skeleton,
            layers,
            armature,
            header,
            skeleton_info,
            joints,
            joint_world_matrices,
            placements,
            names,
            velocity: vec![Vec4::ZERO; instance_count],
            forward: vec![DEFAULT_FORWARD; instance_count],
            target_position: Vec4::ZERO,
            behavior: Vec4::ZERO,
        })
    }

    /// Re-derives the skeleton from the source tree and re-replicates it for `instances`.
    ///
    /// Velocity and forward go back to their defaults; the shared target and behavior are kept.
    /// On error the previous pack stays untouched.
    pub fn refresh(&mut self, graph: &SceneGraph, instances: &InstanceSet) -> Result<(), Error> {
        let mut fresh = Self::from_graph(graph, instances)?;
        fresh.target_position = self.target_position;
        fresh.behavior = self.behavior;
        *self = fresh;
        Ok(())
    }

    /// Re-derives the rest pose from `graph` for the current instances.
    ///
    /// Every joint slot and rest-world matrix is re-seeded. Placements, names and all driver state
    /// are kept. On error the previous pack stays untouched.
    pub fn rebuild_rest_pose(&mut self, graph: &SceneGraph) -> Result<(), Error> {
        let instances = InstanceSet::from_placements(
            self.placements
                .iter()
                .zip(&self.names)
                .map(|(transform, name)| Placement::new(name.clone(), *transform))
                .collect(),
        );
        let mut fresh = Self::from_graph(graph, &instances)?;
        fresh.velocity = std::mem::take(&mut self.velocity);
        fresh.forward = std::mem::take(&mut self.forward);
        fresh.target_position = self.target_position;
        fresh.behavior = self.behavior;
        *self = fresh;
        Ok(())
    }

    pub fn instance_count(&self) -> usize {
        self.placements.len()
    }

    pub fn joint_count(&self) -> usize {
        self.skeleton.joint_count()
    }

    pub fn skeleton(&self) -> &Arc<Skeleton> {
        &self.skeleton
    }

    pub fn layers(&self) -> &Arc<LayerArray> {
        &self.layers
    }

    pub fn armature_transform(&self) -> Mat4 {
        self.armature
    }

    pub fn parent_indices(&self) -> &[i32] {
        self.skeleton.parents()
    }

    pub fn layer_array(&self) -> &[i32] {
        self.layers.as_slice()
    }

    pub fn skeleton_info_header(&self) -> &SkeletonInfoHeader {
        &self.header
    }

    /// Header words followed by one rest-pose skeleton.
    pub fn skeleton_info(&self) -> &[u32] {
        &self.skeleton_info
    }

    /// All instances' joints back to back.
    pub fn joints(&self) -> &[JointRecord] {
        &self.joints
    }

    pub fn instance_joints(&self, instance: usize) -> Result<&[JointRecord], Error> {
        let range = self.instance_range(instance)?;
        Ok(&self.joints[range])
    }

    /// Overwrites one instance's joint slot, e.g. with posed output read back from the evaluator.
    pub fn write_instance_joints(
        &mut self,
        instance: usize,
        records: &[JointRecord],
    ) -> Result<(), Error> {
        let range = self.instance_range(instance)?;
        if records.len() != range.len() {
            return Err(Error::JointCountMismatch {
                expected: range.len(),
                actual: records.len(),
            });
        }
        self.joints[range].copy_from_slice(records);
        Ok(())
    }

    pub fn joint_world_matrices(&self) -> &[Mat4] {
        &self.joint_world_matrices
    }

    pub fn placements(&self) -> &[Mat4] {
        &self.placements
    }

    pub fn instance_name(&self, instance: usize) -> Option<&str> {
        self.names.get(instance).map(String::as_str)
    }

    pub fn velocity(&self) -> &[Vec4] {
        &self.velocity
    }

    pub fn forward(&self) -> &[Vec4] {
        &self.forward
    }

    pub fn target_position(&self) -> Vec4 {
        self.target_position
    }

    pub fn behavior(&self) -> Vec4 {
        self.behavior
    }

    pub fn set_velocity(&mut self, instance: usize, velocity: Vec4) -> Result<(), Error> {
        let count = self.instance_count();
        let slot = self
            .velocity
            .get_mut(instance)
            .ok_or(Error::InstanceOutOfRange {
                index: instance,
                count,
            })?;
        *slot = velocity;
        Ok(())
    }

    pub fn set_forward(&mut self, instance: usize, forward: Vec4) -> Result<(), Error> {
        let count = self.instance_count();
        let slot = self
            .forward
            .get_mut(instance)
            .ok_or(Error::InstanceOutOfRange {
                index: instance,
                count,
            })?;
        *slot = forward;
        Ok(())
    }

    /// Shared by all instances.
    pub fn set_target_position(&mut self, target: Vec4) {
        self.target_position = target;
    }

    /// Shared by all instances.
    pub fn set_behavior(&mut self, behavior: Vec4) {
        self.behavior = behavior;
    }

    pub fn buffers(&self) -> SerializedBuffers<'_> {
        SerializedBuffers {
            skeleton_info: bytemuck::cast_slice(&self.skeleton_info),
            parent_indices: bytemuck::cast_slice(self.skeleton.parents()),
            layer_array: bytemuck::cast_slice(self.layers.as_slice()),
            joints: bytemuck::cast_slice(&self.joints),
            joint_world_matrices: bytemuck::cast_slice(&self.joint_world_matrices),
            placements: bytemuck::cast_slice(&self.placements),
            velocity: bytemuck::cast_slice(&self.velocity),
            forward: bytemuck::cast_slice(&self.forward),
            target_position: bytemuck::bytes_of(&self.target_position),
            behavior: bytemuck::bytes_of(&self.behavior),
        }
    }

    fn instance_range(&self, instance: usize) -> Result<std::ops::Range<usize>, Error> {
        let count = self.instance_count();
        if instance >= count {
            return Err(Error::InstanceOutOfRange {
                index: instance,
                count,
            });
        }
        let joint_count = self.joint_count();
        let start = instance * joint_count;
        Ok(start..start + joint_count)
    }
}
