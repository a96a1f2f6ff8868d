use crate::{Error, Joint, Skeleton};

/// Separates consecutive layers in a [`LayerArray`].
pub const LAYER_SENTINEL: i32 = -1;

/// Breadth-first evaluation order of a skeleton.
///
/// Joint indices are grouped into layers, each terminated by [`LAYER_SENTINEL`]. Layer 0 holds the
/// roots and layer `k` holds the children of layer `k - 1`, so walking the array front to back
/// always reaches a parent before any of its children.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LayerArray {
    entries: Vec<i32>,
    layer_count: usize,
}

impl LayerArray {
    pub fn build(skeleton: &Skeleton) -> Result<Self, Error> {
        Self::schedule(skeleton.roots(), skeleton.parents(), skeleton.joints())
    }

    /// Layers `joints` starting from `roots`.
    ///
    /// `parents` is only used to validate the child lists. An empty skeleton yields an empty array
    /// without any sentinel.
    pub fn schedule(roots: &[usize], parents: &[i32], joints: &[Joint]) -> Result<Self, Error> {
        let joint_count = joints.len();
        if joint_count == 0 {
            return Ok(Self::default());
        }

        let mut scheduled = vec![false; joint_count];
        let mut entries = Vec::with_capacity(joint_count * 2);
        for &root in roots {
            mark_scheduled(&mut scheduled, root, joint_count)?;
            entries.push(root as i32);
        }
        entries.push(LAYER_SENTINEL);
        let mut emitted = roots.len();
        let mut layer_count = 1usize;

        let mut layer_start = 0usize;
        let mut layer_end = roots.len();
        // Each productive pass schedules at least one new joint, so `joint_count` passes suffice.
        for _ in 0..joint_count {
            let mut appended = 0usize;
            for position in layer_start..layer_end {
                let parent = entries[position] as usize;
                for &child in &joints[parent].children {
                    let recorded = parents.get(child).copied().unwrap_or(LAYER_SENTINEL);
                    if recorded != parent as i32 {
                        return Err(Error::LayerParentMismatch {
                            child,
                            listed_parent: parent,
                            recorded_parent: recorded,
                        });
                    }
                    mark_scheduled(&mut scheduled, child, joint_count)?;
                    emitted += 1;
                    if emitted > joint_count {
                        return Err(Error::LayerOverflow { joint_count });
                    }
                    entries.push(child as i32);
                    appended += 1;
                }
            }

            if appended == 0 {
                break;
            }
            entries.push(LAYER_SENTINEL);
            layer_count += 1;
            layer_start = layer_end + 1;
            layer_end = entries.len() - 1;
        }

        if emitted != joint_count {
            return Err(Error::LayerIncomplete {
                scheduled: emitted,
                joint_count,
            });
        }

        log::debug!(
            "scheduled {joint_count} joints into {layer_count} layers ({} entries)",
            entries.len()
        );
        Ok(Self {
            entries,
            layer_count,
        })
    }

    /// Joint indices and sentinels, exactly as uploaded.
    pub fn as_slice(&self) -> &[i32] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn layer_count(&self) -> usize {
        self.layer_count
    }

    /// Iterates the layers without their sentinels.
    pub fn layers(&self) -> impl Iterator<Item = &[i32]> + '_ {
        self.entries
            .split(|&e| e == LAYER_SENTINEL)
            .take(self.layer_count)
    }

    /// Layer index of `joint`, i.e. the number of sentinels in front of it.
    pub fn layer_of(&self, joint: usize) -> Option<usize> {
        let position = self.entries.iter().position(|&e| e == joint as i32)?;
        Some(
            self.entries[..position]
                .iter()
                .filter(|&&e| e == LAYER_SENTINEL)
                .count(),
        )
    }

    /// Joint indices in evaluation order.
    pub fn evaluation_order(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries
            .iter()
            .filter(|&&e| e != LAYER_SENTINEL)
            .map(|&e| e as usize)
    }
}

fn mark_scheduled(scheduled: &mut [bool], joint: usize, joint_count: usize) -> Result<(), Error> {
    let Some(slot) = scheduled.get_mut(joint) else {
        return Err(Error::LayerOverflow { joint_count });
    };
    if *slot {
        return Err(Error::DuplicateLayerEntry { joint });
    }
    *slot = true;
    Ok(())
}
