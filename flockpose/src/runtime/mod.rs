mod group;
mod instance_pack;
mod layers;
mod pose;
mod scene_graph;
mod skeleton;

pub use group::*;
pub use instance_pack::*;
pub use layers::*;
pub use pose::*;
pub use scene_graph::*;
pub use skeleton::*;
