use crate::{Error, SceneData, euler_to_rotation_matrix, local_trs, quaternion_to_euler};
use glam::{Mat4, Vec3};
use std::collections::HashMap;

/// Hard limit on the number of children a joint can record.
pub const MAX_JOINT_CHILDREN: usize = 8;

/// Rest-pose local transform of one skeleton joint.
#[derive(Clone, Debug, PartialEq)]
pub struct Joint {
    /// Source node index. Only used to map back to the scene.
    pub node: usize,
    pub translate: Vec3,
    /// Euler degrees, intrinsic Z-Y-X.
    pub rotate: Vec3,
    pub scale: Vec3,
    /// Dense joint indices, at most [`MAX_JOINT_CHILDREN`].
    pub children: Vec<usize>,
}

impl Joint {
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.translate)
            * euler_to_rotation_matrix(self.rotate)
            * Mat4::from_scale(self.scale)
    }
}

/// Flattened joint hierarchy of a skin.
///
/// Joint indices are dense (`0..joint_count`) and follow the order of the skin joint list, not
/// node indices. The value is never mutated after extraction; re-extraction builds a new one.
#[derive(Clone, Debug, Default)]
pub struct Skeleton {
    joints: Vec<Joint>,
    parents: Vec<i32>,
    roots: Vec<usize>,
    joint_by_name: HashMap<String, usize>,
}

impl Skeleton {
    /// Extracts the skeleton of `data.skin_joints`.
    pub fn from_scene(data: &SceneData) -> Result<Self, Error> {
        Self::extract(data, &data.skin_joints)
    }

    /// Extracts joints for `joint_nodes` in one pass over the list.
    pub fn extract(data: &SceneData, joint_nodes: &[usize]) -> Result<Self, Error> {
        let node_count = data.nodes.len();
        let mut joint_index = HashMap::with_capacity(joint_nodes.len());
        for (joint, &node) in joint_nodes.iter().enumerate() {
            if node >= node_count {
                return Err(Error::UnknownNode { node, node_count });
            }
            if joint_index.insert(node, joint).is_some() {
                return Err(Error::DuplicateJoint { node });
            }
        }

        let joint_count = joint_nodes.len();
        let mut joints = Vec::with_capacity(joint_count);
        let mut parents = vec![-1i32; joint_count];
        let mut is_root = vec![true; joint_count];
        let mut joint_by_name = HashMap::new();

        for (joint, &node_index) in joint_nodes.iter().enumerate() {
            let node = &data.nodes[node_index];
            if node.children.len() > MAX_JOINT_CHILDREN {
                return Err(Error::JointChildCapacity {
                    joint,
                    node: node_index,
                    count: node.children.len(),
                    limit: MAX_JOINT_CHILDREN,
                });
            }

            let mut children = Vec::with_capacity(node.children.len());
            for &child_node in &node.children {
                let Some(&child) = joint_index.get(&child_node) else {
                    return Err(Error::JointChildNotInSkin {
                        joint,
                        node: node_index,
                        child: child_node,
                    });
                };
                if parents[child] != -1 {
                    return Err(Error::JointParentConflict {
                        child,
                        existing: parents[child] as usize,
                        parent: joint,
                    });
                }
                children.push(child);
                is_root[child] = false;
                parents[child] = joint as i32;
            }

            let (translate, rotation, scale) = local_trs(&node.transform);
            joints.push(Joint {
                node: node_index,
                translate,
                rotate: quaternion_to_euler(rotation),
                scale,
                children,
            });

            if !node.name.is_empty() {
                joint_by_name.entry(node.name.clone()).or_insert(joint);
            }
        }

        let roots = is_root
            .iter()
            .enumerate()
            .filter_map(|(i, root)| root.then_some(i))
            .collect::<Vec<_>>();

        check_reaches_root(&parents, joint_nodes)?;

        log::debug!(
            "extracted skeleton: {} joints, {} roots",
            joints.len(),
            roots.len()
        );

        Ok(Self {
            joints,
            parents,
            roots,
            joint_by_name,
        })
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    pub fn joint(&self, index: usize) -> Option<&Joint> {
        self.joints.get(index)
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    /// Parent joint of each joint, `-1` for roots.
    pub fn parents(&self) -> &[i32] {
        &self.parents
    }

    pub fn parent(&self, joint: usize) -> Option<usize> {
        let parent = *self.parents.get(joint)?;
        (parent >= 0).then_some(parent as usize)
    }

    /// Joints that are nobody's child, in joint order.
    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    /// Diagnostic lookup only.
    pub fn joint_index_by_name(&self, name: &str) -> Option<usize> {
        self.joint_by_name.get(name).copied()
    }
}

/// Rejects joints whose parent chain loops instead of ending at a root.
fn check_reaches_root(parents: &[i32], joint_nodes: &[usize]) -> Result<(), Error> {
    for start in 0..parents.len() {
        let mut current = start;
        let mut steps = 0usize;
        while parents[current] >= 0 {
            current = parents[current] as usize;
            steps += 1;
            if steps > parents.len() {
                return Err(Error::NodeCycle {
                    node: joint_nodes[start],
                });
            }
        }
    }
    Ok(())
}
