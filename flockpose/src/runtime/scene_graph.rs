use crate::{Error, NodeTransform, SceneData, resolve_local};
use glam::Mat4;
use std::sync::Arc;

/// Node name whose world transform is additionally captured as the armature transform.
pub const DEFAULT_ARMATURE_NODE_NAME: &str = "Armature";

#[derive(Clone, Debug)]
pub struct GraphOptions {
    /// World transform applied above every parentless node.
    pub root_transform: Mat4,
    pub armature_node_name: String,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            root_transform: Mat4::IDENTITY,
            armature_node_name: DEFAULT_ARMATURE_NODE_NAME.to_string(),
        }
    }
}

/// Work done by a single resolve call.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ResolveStats {
    /// Nodes whose world transform was (re)computed.
    pub recomputed: usize,
    /// Calls that found an already resolved node and stopped there.
    pub cache_hits: usize,
}

/// World transforms for every node of a scene.
///
/// Nodes are addressed by their index in `SceneData::nodes`. The graph owns its cache; a node is
/// either unresolved or holds `world = world(parent) * local` (or `root_transform * local` when it
/// has no parent).
#[derive(Clone, Debug)]
pub struct SceneGraph {
    data: Arc<SceneData>,
    options: GraphOptions,
    parents: Vec<Option<usize>>,
    roots: Vec<usize>,
    armature_node: Option<usize>,
    state: ResolveState,
}

#[derive(Clone, Debug, Default)]
struct ResolveState {
    locals: Vec<Mat4>,
    local_valid: Vec<bool>,
    worlds: Vec<Mat4>,
    resolved: Vec<bool>,
    visiting: Vec<bool>,
    armature_transform: Option<Mat4>,
}

enum ResolveFrame {
    Enter {
        node: usize,
        parent_world: Mat4,
        force: bool,
    },
    /// The subtree below `node` is done.
    Leave { node: usize },
}

impl ResolveState {
    fn new(node_count: usize) -> Self {
        Self {
            locals: vec![Mat4::IDENTITY; node_count],
            local_valid: vec![false; node_count],
            worlds: vec![Mat4::IDENTITY; node_count],
            resolved: vec![false; node_count],
            visiting: vec![false; node_count],
            armature_transform: None,
        }
    }
}

impl SceneGraph {
    pub fn new(data: Arc<SceneData>) -> Result<Self, Error> {
        Self::with_options(data, GraphOptions::default())
    }

    /// Validates the node tree and resolves every world transform.
    pub fn with_options(data: Arc<SceneData>, options: GraphOptions) -> Result<Self, Error> {
        let node_count = data.nodes.len();
        let mut parents: Vec<Option<usize>> = vec![None; node_count];
        for (index, node) in data.nodes.iter().enumerate() {
            for &child in &node.children {
                let Some(slot) = parents.get_mut(child) else {
                    return Err(Error::UnknownNode {
                        node: child,
                        node_count,
                    });
                };
                if let Some(first) = *slot {
                    return Err(Error::MultipleParents {
                        node: child,
                        first,
                        second: index,
                    });
                }
                *slot = Some(index);
            }
        }

        let roots = parents
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.is_none().then_some(i))
            .collect::<Vec<_>>();

        let armature_node = data
            .nodes
            .iter()
            .position(|n| n.name == options.armature_node_name);

        let mut graph = Self {
            data,
            options,
            parents,
            roots,
            armature_node,
            state: ResolveState::default(),
        };
        graph.rebuild()?;
        Ok(graph)
    }

    /// Drops every cached transform and resolves the whole tree again from its roots.
    pub fn rebuild(&mut self) -> Result<ResolveStats, Error> {
        let node_count = self.data.nodes.len();
        let mut state = ResolveState::new(node_count);
        let mut stats = ResolveStats::default();
        for &root in &self.roots {
            self.resolve_node(&mut state, root, self.options.root_transform, false, &mut stats)?;
        }

        // Every parentless node has been walked, so anything left over hangs off a cycle.
        if let Some(node) = state.resolved.iter().position(|r| !*r) {
            return Err(Error::NodeCycle { node });
        }

        log::debug!(
            "resolved {} nodes from {} roots (armature node: {:?})",
            stats.recomputed,
            self.roots.len(),
            self.armature_node
        );
        self.state = state;
        Ok(stats)
    }

    /// Resolves `node` below `parent_world`.
    ///
    /// Without `force_below`, an already resolved node is a cache hit and its subtree is skipped.
    /// A node that gets recomputed always forces its whole subtree, since the children depend on
    /// the new value. On error nothing is published.
    pub fn resolve(
        &mut self,
        node: usize,
        parent_world: Mat4,
        force_below: bool,
    ) -> Result<ResolveStats, Error> {
        self.check_node(node)?;
        let mut state = self.state.clone();
        let mut stats = ResolveStats::default();
        self.resolve_node(&mut state, node, parent_world, force_below, &mut stats)?;
        log::trace!(
            "resolve node {node}: {} recomputed, {} cache hits",
            stats.recomputed,
            stats.cache_hits
        );
        self.state = state;
        Ok(stats)
    }

    /// Depth-first walk on an explicit stack. Children are visited in child-list order.
    fn resolve_node(
        &self,
        state: &mut ResolveState,
        node: usize,
        parent_world: Mat4,
        force_below: bool,
        stats: &mut ResolveStats,
    ) -> Result<(), Error> {
        let mut stack = vec![ResolveFrame::Enter {
            node,
            parent_world,
            force: force_below,
        }];

        while let Some(frame) = stack.pop() {
            let (node, parent_world, force) = match frame {
                ResolveFrame::Enter {
                    node,
                    parent_world,
                    force,
                } => (node, parent_world, force),
                ResolveFrame::Leave { node } => {
                    state.visiting[node] = false;
                    continue;
                }
            };

            if !force && state.resolved[node] {
                stats.cache_hits += 1;
                continue;
            }
            if state.visiting[node] {
                return Err(Error::NodeCycle { node });
            }
            state.visiting[node] = true;

            if !state.local_valid[node] {
                state.locals[node] = resolve_local(&self.data.nodes[node].transform);
                state.local_valid[node] = true;
            }
            let world = parent_world * state.locals[node];
            state.worlds[node] = world;
            state.resolved[node] = true;
            stats.recomputed += 1;

            if self.armature_node == Some(node) {
                state.armature_transform = Some(world);
            }

            // A recomputed node always forces its children.
            stack.push(ResolveFrame::Leave { node });
            stack.extend(
                self.data.nodes[node]
                    .children
                    .iter()
                    .rev()
                    .map(|&child| ResolveFrame::Enter {
                        node: child,
                        parent_world: world,
                        force: true,
                    }),
            );
        }
        Ok(())
    }

    /// Replaces the local transform of `node` and re-resolves its subtree.
    ///
    /// Editing a node is always paired with a forced resolve, so descendants never keep a world
    /// transform derived from the old value.
    pub fn set_local_transform(
        &mut self,
        node: usize,
        transform: NodeTransform,
    ) -> Result<ResolveStats, Error> {
        self.check_node(node)?;
        Arc::make_mut(&mut self.data).nodes[node].transform = transform;
        self.state.local_valid[node] = false;
        let parent_world = self.parent_world(node);
        self.resolve(node, parent_world, true)
    }

    /// Changes the transform above all parentless nodes and re-resolves them.
    pub fn set_root_transform(&mut self, root_transform: Mat4) -> Result<ResolveStats, Error> {
        self.options.root_transform = root_transform;
        let mut state = self.state.clone();
        let mut stats = ResolveStats::default();
        for &root in &self.roots {
            self.resolve_node(&mut state, root, root_transform, true, &mut stats)?;
        }
        self.state = state;
        Ok(stats)
    }

    fn parent_world(&self, node: usize) -> Mat4 {
        match self.parents[node] {
            Some(parent) => self.state.worlds[parent],
            None => self.options.root_transform,
        }
    }

    fn check_node(&self, node: usize) -> Result<(), Error> {
        if node < self.data.nodes.len() {
            Ok(())
        } else {
            Err(Error::UnknownNode {
                node,
                node_count: self.data.nodes.len(),
            })
        }
    }

    pub fn data(&self) -> &Arc<SceneData> {
        &self.data
    }

    pub fn options(&self) -> &GraphOptions {
        &self.options
    }

    pub fn node_count(&self) -> usize {
        self.data.nodes.len()
    }

    pub fn parent(&self, node: usize) -> Option<usize> {
        self.parents.get(node).copied().flatten()
    }

    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    pub fn is_resolved(&self, node: usize) -> bool {
        self.state.resolved.get(node).copied().unwrap_or(false)
    }

    pub fn world(&self, node: usize) -> Option<Mat4> {
        self.is_resolved(node).then(|| self.state.worlds[node])
    }

    /// Cached local matrix of `node`, if it has been resolved since the last edit.
    pub fn local(&self, node: usize) -> Option<Mat4> {
        let valid = self.state.local_valid.get(node).copied().unwrap_or(false);
        valid.then(|| self.state.locals[node])
    }

    /// World transforms keyed by node index, for every resolved node.
    pub fn world_transforms(&self) -> impl Iterator<Item = (usize, Mat4)> + '_ {
        self.state
            .worlds
            .iter()
            .zip(&self.state.resolved)
            .enumerate()
            .filter_map(|(i, (world, resolved))| resolved.then_some((i, *world)))
    }

    /// World transform of the armature node, identity when the scene has none.
    pub fn armature_transform(&self) -> Mat4 {
        self.state.armature_transform.unwrap_or(Mat4::IDENTITY)
    }

    pub fn armature_node(&self) -> Option<usize> {
        self.armature_node
    }

    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        self.data.find_node(name)
    }
}
