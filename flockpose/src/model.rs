use glam::{Mat4, Quat, Vec3};

/// Raw local transform of a node as handed over by the asset loader.
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeTransform {
    /// Explicit local matrix, used verbatim.
    Matrix(Mat4),
    /// Separate TRS fields; missing ones take the glTF defaults.
    Trs {
        translation: Option<Vec3>,
        rotation: Option<Quat>,
        scale: Option<Vec3>,
    },
    #[default]
    Identity,
}

impl NodeTransform {
    pub fn from_translation(translation: Vec3) -> Self {
        Self::Trs {
            translation: Some(translation),
            rotation: None,
            scale: None,
        }
    }

    pub fn from_trs(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self::Trs {
            translation: Some(translation),
            rotation: Some(rotation),
            scale: Some(scale),
        }
    }
}

#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    /// Diagnostic name only. Hierarchy is always expressed through indices.
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub transform: NodeTransform,
    /// Indices into `SceneData::nodes`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub children: Vec<usize>,
}

impl Node {
    pub fn new(name: impl Into<String>, transform: NodeTransform) -> Self {
        Self {
            name: name.into(),
            transform,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = usize>) -> Self {
        self.children = children.into_iter().collect();
        self
    }
}

/// Fully materialized node tree of one loaded model.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SceneData {
    pub nodes: Vec<Node>,
    /// Node indices that make up the skin, in joint order. Empty when the model is not skinned.
    #[cfg_attr(feature = "serde", serde(default))]
    pub skin_joints: Vec<usize>,
}

impl SceneData {
    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn is_skinned(&self) -> bool {
        !self.skin_joints.is_empty()
    }

    pub fn find_node(&self, name: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.name == name)
    }
}

/// One placed copy of a model.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Placement {
    pub name: String,
    pub transform: Mat4,
}

impl Placement {
    pub fn new(name: impl Into<String>, transform: Mat4) -> Self {
        Self {
            name: name.into(),
            transform,
        }
    }

    /// Placement from translate, rotate (Euler degrees, Z-Y-X) and scale.
    pub fn from_euler_trs(
        name: impl Into<String>,
        translation: Vec3,
        euler_degrees: Vec3,
        scale: Vec3,
    ) -> Self {
        let transform = Mat4::from_translation(translation)
            * crate::euler_to_rotation_matrix(euler_degrees)
            * Mat4::from_scale(scale);
        Self::new(name, transform)
    }
}

impl Default for Placement {
    fn default() -> Self {
        Self::new("", Mat4::IDENTITY)
    }
}

/// The instances of one model.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InstanceSet {
    placements: Vec<Placement>,
}

impl InstanceSet {
    /// Builds a set from parallel placement/name arrays.
    pub fn new(transforms: Vec<Mat4>, names: Vec<String>) -> Result<Self, crate::Error> {
        if transforms.len() != names.len() {
            return Err(crate::Error::InstanceCountMismatch {
                placements: transforms.len(),
                names: names.len(),
            });
        }
        let placements = transforms
            .into_iter()
            .zip(names)
            .map(|(transform, name)| Placement { name, transform })
            .collect();
        Ok(Self { placements })
    }

    /// `count` unnamed instances at the origin.
    pub fn identity(count: usize) -> Self {
        Self {
            placements: vec![Placement::default(); count],
        }
    }

    pub fn from_placements(placements: Vec<Placement>) -> Self {
        Self { placements }
    }

    pub fn push(&mut self, placement: Placement) {
        self.placements.push(placement);
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }
}
