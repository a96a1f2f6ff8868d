use crate::{
    Error, GraphOptions, InstancePosePack, InstanceSet, NodeTransform, ResolveStats, SceneData,
    SceneGraph,
};
use glam::Mat4;
use std::sync::Arc;

/// A loaded model together with all of its instances.
///
/// Owns the world-transform graph of the node tree and, for skinned models, the packed pose
/// buffers shared with the evaluator.
#[derive(Clone, Debug)]
pub struct ModelGroup {
    graph: SceneGraph,
    instances: InstanceSet,
    pack: Option<InstancePosePack>,
}

impl ModelGroup {
    pub fn new(data: Arc<SceneData>, instances: InstanceSet) -> Result<Self, Error> {
        Self::with_options(data, instances, GraphOptions::default())
    }

    pub fn with_options(
        data: Arc<SceneData>,
        instances: InstanceSet,
        options: GraphOptions,
    ) -> Result<Self, Error> {
        let graph = SceneGraph::with_options(data, options)?;
        let pack = Self::pack_for(&graph, &instances)?;
        Ok(Self {
            graph,
            instances,
            pack,
        })
    }

    fn pack_for(
        graph: &SceneGraph,
        instances: &InstanceSet,
    ) -> Result<Option<InstancePosePack>, Error> {
        if !graph.data().is_skinned() {
            return Ok(None);
        }
        InstancePosePack::from_graph(graph, instances).map(Some)
    }

    /// Replaces the instance set and rebuilds the packed buffers for it.
    pub fn refresh_instances(&mut self, instances: InstanceSet) -> Result<(), Error> {
        match &mut self.pack {
            Some(pack) => pack.refresh(&self.graph, &instances)?,
            None => self.pack = Self::pack_for(&self.graph, &instances)?,
        }
        self.instances = instances;
        Ok(())
    }

    /// Edits a node and re-resolves its subtree, then re-seeds the packed rest pose from the
    /// edited tree. Per-instance velocity and forward survive the edit.
    pub fn set_local_transform(
        &mut self,
        node: usize,
        transform: NodeTransform,
    ) -> Result<ResolveStats, Error> {
        let mut graph = self.graph.clone();
        let stats = graph.set_local_transform(node, transform)?;
        if let Some(pack) = &mut self.pack {
            pack.rebuild_rest_pose(&graph)?;
        }
        self.graph = graph;
        Ok(stats)
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn instances(&self) -> &InstanceSet {
        &self.instances
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    pub fn pack(&self) -> Option<&InstancePosePack> {
        self.pack.as_ref()
    }

    pub fn pack_mut(&mut self) -> Option<&mut InstancePosePack> {
        self.pack.as_mut()
    }

    pub fn is_skinned(&self) -> bool {
        self.pack.is_some()
    }

    pub fn world(&self, node: usize) -> Option<Mat4> {
        self.graph.world(node)
    }
}
