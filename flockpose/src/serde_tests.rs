use crate::{NodeTransform, SceneData, SceneGraph, Skeleton};
use glam::{Quat, Vec3};
use std::sync::Arc;

const BIRD: &str = r#"{
    "nodes": [
        { "name": "Armature", "transform": "Identity", "children": [1, 3] },
        {
            "name": "spine",
            "transform": { "Trs": { "translation": [0.0, 1.0, 0.0] } },
            "children": [2]
        },
        {
            "name": "head",
            "transform": { "Trs": { "translation": [0.0, 0.5, 0.0], "rotation": [0.0, 0.0, 0.0, 1.0] } }
        },
        {
            "name": "body",
            "transform": { "Matrix": [1,0,0,0, 0,1,0,0, 0,0,1,0, 2,0,0,1] }
        }
    ],
    "skin_joints": [1, 2]
}"#;

#[test]
fn scene_loads_from_json() {
    let scene: SceneData = serde_json::from_str(BIRD).unwrap();
    assert_eq!(scene.nodes.len(), 4);
    assert_eq!(scene.skin_joints, vec![1, 2]);
    assert_eq!(
        scene.nodes[1].transform,
        NodeTransform::Trs {
            translation: Some(Vec3::new(0.0, 1.0, 0.0)),
            rotation: None,
            scale: None,
        }
    );
    assert_eq!(
        scene.nodes[2].transform,
        NodeTransform::Trs {
            translation: Some(Vec3::new(0.0, 0.5, 0.0)),
            rotation: Some(Quat::IDENTITY),
            scale: None,
        }
    );
    assert!(scene.nodes[3].children.is_empty());

    let graph = SceneGraph::new(Arc::new(scene.clone())).unwrap();
    let head = graph.world(2).unwrap().transform_point3(Vec3::ZERO);
    assert!(head.abs_diff_eq(Vec3::new(0.0, 1.5, 0.0), 1.0e-6));
    let body = graph.world(3).unwrap().transform_point3(Vec3::ZERO);
    assert!(body.abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), 1.0e-6));

    let skeleton = Skeleton::from_scene(&scene).unwrap();
    assert_eq!(skeleton.parents(), &[-1, 0]);
}

#[test]
fn missing_node_fields_take_defaults() {
    let scene: SceneData = serde_json::from_str(r#"{ "nodes": [ {} ] }"#).unwrap();
    assert_eq!(scene.nodes[0].transform, NodeTransform::Identity);
    assert!(scene.nodes[0].name.is_empty());
    assert!(!scene.is_skinned());
}
