//! CPU reference for the per-instance pose kernel.
//!
//! The parallel evaluator runs one sequential walk of the layer array per instance. This module
//! performs the same walk on the CPU: no recursion, no pointer chasing, and a parent is always
//! finished before any of its children is reached.

use crate::{Error, InstancePosePack, JointRecord, LAYER_SENTINEL};
use glam::Mat4;

/// World matrices of one skeleton's joints, walked in layer order below `armature`.
pub fn evaluate_world_pose(
    joints: &[JointRecord],
    parents: &[i32],
    layers: &[i32],
    armature: Mat4,
) -> Result<Vec<Mat4>, Error> {
    let joint_count = joints.len();
    if parents.len() != joint_count {
        return Err(Error::JointCountMismatch {
            expected: joint_count,
            actual: parents.len(),
        });
    }

    let mut world = vec![Mat4::IDENTITY; joint_count];
    let mut evaluated = vec![false; joint_count];
    for &entry in layers {
        if entry == LAYER_SENTINEL {
            continue;
        }
        let joint = entry as usize;
        if entry < 0 || joint >= joint_count {
            return Err(Error::LayerOverflow { joint_count });
        }

        let parent_world = match parents[joint] {
            parent if parent >= 0 => {
                let parent = parent as usize;
                if !evaluated.get(parent).copied().unwrap_or(false) {
                    return Err(Error::ParentNotEvaluated { joint, parent });
                }
                world[parent]
            }
            _ => armature,
        };
        world[joint] = parent_world * joints[joint].local_matrix();
        evaluated[joint] = true;
    }

    let scheduled = evaluated.iter().filter(|e| **e).count();
    if scheduled != joint_count {
        return Err(Error::LayerIncomplete {
            scheduled,
            joint_count,
        });
    }
    Ok(world)
}

impl InstancePosePack {
    /// Evaluates the current joint slot of `instance`.
    pub fn evaluate_instance(&self, instance: usize) -> Result<Vec<Mat4>, Error> {
        evaluate_world_pose(
            self.instance_joints(instance)?,
            self.parent_indices(),
            self.layer_array(),
            self.armature_transform(),
        )
    }
}
