use crate::{Error, ErrorKind, InstanceSet, Node, NodeTransform, Placement, SceneData};
use glam::{Mat4, Vec3};

#[test]
fn euler_placement_composes_translate_rotate_scale() {
    let placement = Placement::from_euler_trs(
        "bird",
        Vec3::new(1.0, 2.0, 3.0),
        Vec3::new(0.0, 90.0, 0.0),
        Vec3::splat(2.0),
    );
    assert_eq!(placement.name, "bird");
    // X scaled to 2, turned about Y onto -Z, then moved.
    let p = placement.transform.transform_point3(Vec3::X);
    assert!(p.abs_diff_eq(Vec3::new(1.0, 2.0, 1.0), 1.0e-5), "{p}");
}

#[test]
fn parallel_arrays_build_an_instance_set() {
    let set = InstanceSet::new(
        vec![Mat4::IDENTITY, Mat4::from_translation(Vec3::X)],
        vec!["a".to_string(), "b".to_string()],
    )
    .unwrap();
    assert_eq!(set.len(), 2);
    assert_eq!(set.placements()[1].name, "b");
    assert_eq!(set.placements()[1].transform, Mat4::from_translation(Vec3::X));
}

#[test]
fn mismatched_names_are_rejected() {
    let err = InstanceSet::new(vec![Mat4::IDENTITY; 3], vec!["only".to_string()]).unwrap_err();
    assert!(
        matches!(
            err,
            Error::InstanceCountMismatch {
                placements: 3,
                names: 1
            }
        ),
        "{err}"
    );
    assert_eq!(err.kind(), ErrorKind::Capacity);
}

#[test]
fn identity_instances_sit_at_the_origin() {
    let mut set = InstanceSet::identity(2);
    assert!(set.placements().iter().all(|p| p.transform == Mat4::IDENTITY));
    set.push(Placement::new("extra", Mat4::from_scale(Vec3::splat(3.0))));
    assert_eq!(set.len(), 3);
    assert!(InstanceSet::default().is_empty());
}

#[test]
fn nodes_are_looked_up_by_name() {
    let scene = SceneData {
        nodes: vec![
            Node::new("Armature", NodeTransform::Identity).with_children([1]),
            Node::new("wing", NodeTransform::Identity),
        ],
        skin_joints: Vec::new(),
    };
    assert_eq!(scene.find_node("wing"), Some(1));
    assert_eq!(scene.find_node("tail"), None);
    assert_eq!(scene.node(0).map(|n| n.children.as_slice()), Some(&[1][..]));
    assert!(!scene.is_skinned());
}
