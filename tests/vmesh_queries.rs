use approx::assert_abs_diff_eq;
use vmesh::prelude::*;

fn unit_box() -> UnstructuredMesh {
    meshgen::box_hex([2, 2, 2], [0.0; 3], [1.0; 3], MeshGenOptions::default())
        .expect("valid box")
}

#[test]
fn sizes_of_each_entity_kind() {
    let mesh = unit_box();
    let vm = VirtualMeshAdapter::new(&mesh).unwrap();
    let e0 = ElemIndex::new(0);
    assert_eq!(vm.get_size(Entity::Node(NodeIndex::new(4))).unwrap(), 0.0);
    assert_abs_diff_eq!(vm.get_size(Entity::Elem(e0)).unwrap(), 0.125, epsilon = 1e-12);
    assert_abs_diff_eq!(
        vm.get_size(Entity::Cell(CellIndex::new(7))).unwrap(),
        0.125,
        epsilon = 1e-12
    );

    let mut edges = Vec::new();
    vm.get_edges(Entity::Elem(e0), &mut edges).unwrap();
    for &e in &edges {
        assert_abs_diff_eq!(vm.get_size(Entity::Edge(e)).unwrap(), 0.5, epsilon = 1e-12);
    }
    let mut delems = Vec::new();
    vm.get_delems(Entity::Elem(e0), &mut delems).unwrap();
    for &d in &delems {
        assert_abs_diff_eq!(vm.get_size(Entity::DElem(d)).unwrap(), 0.25, epsilon = 1e-12);
    }

    let tets = meshgen::box_tet([1, 2, 1], [0.0; 3], [2.0, 1.0, 3.0], MeshGenOptions::default())
        .unwrap();
    let vm = VirtualMeshAdapter::new(&tets).unwrap();
    let volume: f64 = (0..vm.num_elems() as u32)
        .map(|e| vm.get_size(Entity::Elem(e.into())).unwrap())
        .sum();
    assert_abs_diff_eq!(volume, 6.0, epsilon = 1e-12);
}

#[test]
fn surface_sizes_use_lengths_and_areas() {
    let mesh = meshgen::rect_tri(2, 2, [0.0; 2], [1.0; 2], MeshGenOptions::default()).unwrap();
    let vm = VirtualMeshAdapter::new(&mesh).unwrap();
    let area: f64 = (0..vm.num_elems() as u32)
        .map(|e| vm.get_size(Entity::Elem(e.into())).unwrap())
        .sum();
    assert_abs_diff_eq!(area, 1.0, epsilon = 1e-12);
    let mut lengths: Vec<f64> = (0..vm.num_delems().unwrap() as u32)
        .map(|d| vm.get_size(Entity::DElem(DElemIndex::new(d))).unwrap())
        .collect();
    lengths.sort_by(f64::total_cmp);
    assert_abs_diff_eq!(lengths[0], 0.5, epsilon = 1e-12);
    assert_abs_diff_eq!(lengths[lengths.len() - 1], 0.5 * 2.0_f64.sqrt(), epsilon = 1e-12);
}

#[test]
fn lookup_by_node_set_ignores_order() {
    let mesh = unit_box();
    let vm = VirtualMeshAdapter::new(&mesh).unwrap();
    let e3 = ElemIndex::new(3);
    let mut nodes = vm.nodes_of(Entity::Elem(e3)).unwrap();
    nodes.reverse();
    assert_eq!(vm.get_elem(&nodes).unwrap(), Some(e3));
    assert_eq!(vm.get_cell(&nodes).unwrap(), Some(CellIndex::new(3)));

    let mut faces = Vec::new();
    vm.get_faces(Entity::Elem(e3), &mut faces).unwrap();
    for &f in &faces {
        let mut nodes = vm.nodes_of(Entity::Face(f)).unwrap();
        nodes.rotate_left(1);
        assert_eq!(vm.get_face(&nodes).unwrap(), Some(f));
        assert_eq!(vm.get_delem(&nodes).unwrap(), Some(DElemIndex::new(f.get())));
    }

    let mut edges = Vec::new();
    vm.get_edges(Entity::Elem(e3), &mut edges).unwrap();
    for &e in &edges {
        let mut nodes = vm.nodes_of(Entity::Edge(e)).unwrap();
        nodes.swap(0, 1);
        assert_eq!(vm.get_edge(&nodes).unwrap(), Some(e));
    }

    // opposite corners of the box share no edge
    let diagonal = [NodeIndex::new(0), NodeIndex::new(26)];
    assert_eq!(vm.get_edge(&diagonal).unwrap(), None);
    assert_eq!(vm.get_elem(&[]).unwrap(), None);
    // a strict subset of an element's nodes is not that element
    assert_eq!(vm.get_elem(&nodes[..4]).unwrap(), None);
}

#[test]
fn lookup_on_a_surface_mesh() {
    let mesh = meshgen::rect_tri(1, 1, [0.0; 2], [1.0; 2], MeshGenOptions::default()).unwrap();
    let vm = VirtualMeshAdapter::new(&mesh).unwrap();
    let [a, b, c] = [0u32, 1, 3].map(NodeIndex::new);
    assert_eq!(vm.get_elem(&[c, a, b]).unwrap(), Some(ElemIndex::new(0)));
    let delem = vm.get_delem(&[b, a]).unwrap().expect("bottom edge");
    assert_eq!(vm.nodes_of(Entity::DElem(delem)).unwrap().len(), 2);
    assert!(matches!(
        vm.get_cell(&[a, b, c]),
        Err(MeshError::Unsupported { dimension: 2, .. })
    ));
}

#[test]
fn closest_elem_inside_outside_and_capped() {
    let mesh = unit_box();
    let vm = VirtualMeshAdapter::new(&mesh).unwrap();

    let p = [0.3, 0.6, 0.8];
    let hit = vm.find_closest_elem(&p).unwrap().unwrap();
    assert_eq!(hit.distance, 0.0);
    assert_eq!(hit.point, p);
    assert!(vm.is_inside(&p, hit.elem).unwrap());

    let side = vm.find_closest_elem(&[1.5, 0.25, 0.25]).unwrap().unwrap();
    assert_eq!(side.elem, ElemIndex::new(1));
    assert_abs_diff_eq!(side.distance, 0.5, epsilon = 1e-9);
    for (a, b) in side.point.iter().zip([1.0, 0.25, 0.25]) {
        assert_abs_diff_eq!(*a, b, epsilon = 1e-9);
    }
    let back = vm.interpolate(&side.coords, side.elem).unwrap();
    for (a, b) in back.iter().zip(side.point) {
        assert_abs_diff_eq!(*a, b, epsilon = 1e-12);
    }

    let corner = vm.find_closest_elem(&[2.0, 2.0, 2.0]).unwrap().unwrap();
    assert_eq!(corner.elem, ElemIndex::new(7));
    assert_abs_diff_eq!(corner.distance, 3.0_f64.sqrt(), epsilon = 1e-9);

    assert_eq!(vm.find_closest_elem_within(&[1.5, 0.25, 0.25], 0.4).unwrap(), None);
    assert!(vm.find_closest_elem_within(&[1.5, 0.25, 0.25], 0.6).unwrap().is_some());
}

#[test]
fn closest_elem_off_an_embedded_surface() {
    let mesh = meshgen::rect_tri(2, 2, [0.0; 2], [1.0; 2], MeshGenOptions::default()).unwrap();
    let vm = VirtualMeshAdapter::new(&mesh).unwrap();
    let found = vm.find_closest_elem(&[0.3, 0.6, 1.0]).unwrap().unwrap();
    assert_abs_diff_eq!(found.distance, 1.0, epsilon = 1e-7);
    assert_abs_diff_eq!(found.point[0], 0.3, epsilon = 1e-7);
    assert_abs_diff_eq!(found.point[1], 0.6, epsilon = 1e-7);

    let empty = UnstructuredMesh::new(Basis::linear(ElementFamily::Quad));
    let vm = VirtualMeshAdapter::new(&empty).unwrap();
    assert_eq!(vm.find_closest_elem(&[0.0; 3]).unwrap(), None);
}

#[test]
fn point_weights_locate_then_weigh() {
    let mesh = unit_box();
    let vm = VirtualMeshAdapter::new(&mesh).unwrap();
    let p = [0.3, 0.6, 0.8];
    let mut w = Vec::new();
    let elem = vm.get_interpolate_weights(&p, &mut w).unwrap().expect("inside");
    assert_abs_diff_eq!(w.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
    let mut points = Vec::new();
    vm.get_points(Entity::Elem(elem), &mut points).unwrap();
    for k in 0..3 {
        let x: f64 = w.iter().zip(&points).map(|(wi, q)| wi * q[k]).sum();
        assert_abs_diff_eq!(x, p[k], epsilon = 1e-9);
    }

    let mut w = vec![1.0; 8];
    assert_eq!(vm.get_interpolate_weights(&[3.0, 0.0, 0.0], &mut w).unwrap(), None);
    assert!(w.is_empty());
    let mut g = vec![1.0; 24];
    assert_eq!(vm.get_gradient_weights(&[3.0, 0.0, 0.0], &mut g).unwrap(), None);
    assert!(g.is_empty());
}

#[test]
fn gradient_weights_recover_a_linear_field() {
    let mesh = meshgen::box_tet([2, 1, 1], [0.0; 3], [2.0, 1.0, 3.0], MeshGenOptions::default())
        .unwrap();
    let vm = VirtualMeshAdapter::new(&mesh).unwrap();
    let field = |q: &Point| 2.0 * q[0] + 3.0 * q[1] - q[2];
    let p = [1.3, 0.4, 2.2];
    let mut g = Vec::new();
    let elem = vm.get_gradient_weights(&p, &mut g).unwrap().expect("inside");
    let n = vm.num_weights();
    assert_eq!(g.len(), 3 * n);
    let mut points = Vec::new();
    vm.get_points(Entity::Elem(elem), &mut points).unwrap();
    let u: Vec<f64> = points.iter().map(field).collect();
    for (a, expected) in [2.0, 3.0, -1.0].into_iter().enumerate() {
        let d: f64 = g[a * n..(a + 1) * n].iter().zip(&u).map(|(gi, ui)| gi * ui).sum();
        assert_abs_diff_eq!(d, expected, epsilon = 1e-9);
    }
}

#[test]
fn schemes_follow_the_element_family() {
    let mesh = meshgen::rect_tri(2, 2, [0.0; 2], [1.0; 2], MeshGenOptions::default()).unwrap();
    let vm = VirtualMeshAdapter::new(&mesh).unwrap();
    let gauss = vm.get_gaussian_scheme(2).unwrap();
    assert_eq!(gauss.family, ElementFamily::Triangle);
    assert_eq!((gauss.kind, gauss.len()), (SchemeKind::Gaussian, 3));
    let regular = vm.get_regular_scheme(3).unwrap();
    assert_eq!((regular.kind, regular.len()), (SchemeKind::Regular, 9));
    assert!(vm.get_regular_scheme(0).is_err());

    // the regular scheme integrates constants over the whole mesh
    let mut area = 0.0;
    for e in 0..vm.num_elems() as u32 {
        for (x, w) in regular.reference_points().zip(&regular.weights) {
            area += w * vm.det_jacobian(x, e.into()).unwrap();
        }
    }
    assert_abs_diff_eq!(area, 1.0, epsilon = 1e-12);
}
