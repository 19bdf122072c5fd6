use approx::assert_abs_diff_eq;
use vmesh::prelude::*;

fn unit_box() -> UnstructuredMesh {
    meshgen::box_hex([2, 2, 2], [0.0; 3], [1.0; 3], MeshGenOptions::default())
        .expect("valid box")
}

#[test]
fn counts_and_element_nodes() {
    let mesh = unit_box();
    let vm = VirtualMeshAdapter::new(&mesh).unwrap();
    assert_eq!(vm.dimensionality(), 3);
    assert_eq!(vm.num_nodes(), 27);
    assert_eq!(vm.num_elems(), 8);
    assert_eq!(vm.num_edges().unwrap(), 54);
    assert_eq!(vm.num_faces().unwrap(), 36);
    for e in 0..8u32 {
        let nodes = vm.nodes_of(Entity::Elem(e.into())).unwrap();
        assert_eq!(nodes.len(), 8);
    }
}

#[test]
fn neighbors_across_shared_faces() {
    let mesh = unit_box();
    let vm = VirtualMeshAdapter::new(&mesh).unwrap();
    assert!(vm.synchronize(SyncFlags::ELEM_NEIGHBORS));
    assert!(vm.synchronized().contains(SyncFlags::ELEM_NEIGHBORS));

    let e0 = ElemIndex::new(0);
    let mut nbrs = Vec::new();
    vm.get_neighbors(e0, &mut nbrs).unwrap();
    nbrs.sort_unstable();
    assert_eq!(nbrs, vec![ElemIndex::new(1), ElemIndex::new(2), ElemIndex::new(4)]);

    let mut delems = Vec::new();
    vm.get_delems(Entity::Elem(e0), &mut delems).unwrap();
    assert_eq!(delems.len(), 6);
    let mut interior = 0;
    for &d in &delems {
        match vm.get_neighbor(e0, d).unwrap() {
            Some(n) => {
                interior += 1;
                assert!(!vm.is_boundary(d).unwrap());
                // the relation is symmetric
                assert_eq!(vm.get_neighbor(n, d).unwrap(), Some(e0));
            }
            None => assert!(vm.is_boundary(d).unwrap()),
        }
    }
    assert_eq!(interior, 3);
}

#[test]
fn center_weights_and_interpolation() {
    let mesh = unit_box();
    let vm = VirtualMeshAdapter::new(&mesh).unwrap();
    let w = vm.weights(&[0.5, 0.5, 0.5]).unwrap();
    assert_eq!(w.len(), 8);
    for wi in &w {
        assert_abs_diff_eq!(*wi, 0.125, epsilon = 1e-15);
    }
    let p = vm.interpolate(&[0.5, 0.5, 0.5], ElemIndex::new(7)).unwrap();
    for k in 0..3 {
        assert_abs_diff_eq!(p[k], 0.75, epsilon = 1e-12);
    }
    assert_abs_diff_eq!(
        vm.det_jacobian(&[0.2, 0.7, 0.1], ElemIndex::new(3)).unwrap(),
        0.125,
        epsilon = 1e-12
    );
}

#[test]
fn locate_round_trips_through_interpolate() {
    let mesh = unit_box();
    let vm = VirtualMeshAdapter::new(&mesh).unwrap();
    let target = [0.75, 0.25, 0.3];
    let (elem, coords) = vm.locate(&target).unwrap().expect("inside the box");
    assert_eq!(elem, ElemIndex::new(1));
    let back = vm.interpolate(&coords, elem).unwrap();
    for k in 0..3 {
        assert_abs_diff_eq!(back[k], target[k], epsilon = 1e-9);
    }
    assert!(vm.locate(&[1.5, 0.5, 0.5]).unwrap().is_none());

    let (node, dist) = vm.find_closest_node(&[0.9, 0.1, 0.05]).unwrap().unwrap();
    assert_eq!(vm.get_point(node).unwrap(), [1.0, 0.0, 0.0]);
    assert_abs_diff_eq!(dist, (0.01f64 + 0.01 + 0.0025).sqrt(), epsilon = 1e-12);
}

#[test]
fn lattice_answers_like_the_generated_box() {
    let lattice = LatticeMesh::new([3, 3, 3], [0.0; 3], [1.0; 3]).unwrap();
    let generated = unit_box();
    let a = VirtualMeshAdapter::new(&lattice).unwrap();
    let b = VirtualMeshAdapter::new(&generated).unwrap();
    assert_eq!(a.synchronized(), SyncFlags::ALL);
    assert_eq!(a.num_nodes(), b.num_nodes());
    assert_eq!(a.num_edges().unwrap(), b.num_edges().unwrap());
    assert_eq!(a.num_faces().unwrap(), b.num_faces().unwrap());
    for e in 0..8u32 {
        let pa = a.get_center(Entity::Elem(e.into())).unwrap();
        let pb = b.get_center(Entity::Elem(e.into())).unwrap();
        for k in 0..3 {
            assert_abs_diff_eq!(pa[k], pb[k], epsilon = 1e-12);
        }
    }
}
