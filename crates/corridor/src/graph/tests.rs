use super::*;
use crate::error::Element;
use nalgebra::dvector;

fn unit_boxes(n: usize) -> Vec<HPolytope> {
    (0..n)
        .map(|i| {
            let lo = i as f64;
            HPolytope::from_box(&[lo, 0.0], &[lo + 1.0, 1.0]).unwrap()
        })
        .collect()
}

#[test]
fn build_assigns_region_ids_and_edges() {
    let g = RegionGraph::build(unit_boxes(3), &[(0, 1), (1, 2), (1, 0)]).unwrap();
    assert_eq!(g.num_vertices(), 3);
    assert_eq!(g.num_edges(), 3);
    assert_eq!(g.dim(), 2);
    for i in 0..3 {
        assert_eq!(g.vertex(VertexId(i)).unwrap().kind, VertexKind::Region(i));
    }
    let e = g.edge_between(VertexId(1), VertexId(2)).unwrap();
    assert_eq!(e.id, EdgeId(1));
    assert_eq!(g.edge(EdgeId(2)).unwrap().to, VertexId(0));
    assert_eq!(g.successors(VertexId(1)).unwrap(), vec![VertexId(2), VertexId(0)]);
    assert_eq!(g.predecessors(VertexId(0)).unwrap(), vec![VertexId(1)]);
    let adj = g.adjacency_list();
    assert_eq!(adj[&VertexId(0)], vec![VertexId(1)]);
    assert!(adj[&VertexId(2)].is_empty());
}

#[test]
fn adjacency_is_never_inferred_from_overlap() {
    // Boxes 0 and 1 touch, but no pair is given.
    let g = RegionGraph::build(unit_boxes(2), &[]).unwrap();
    assert_eq!(
        g.edge_between(VertexId(0), VertexId(1)).unwrap_err(),
        GcsError::UnknownElement(Element::Transition(VertexId(0), VertexId(1)))
    );
}

#[test]
fn malformed_inputs_are_rejected() {
    assert!(matches!(
        RegionGraph::build(unit_boxes(2), &[(0, 2)]),
        Err(GcsError::MalformedGraph(_))
    ));
    assert!(matches!(
        RegionGraph::build(unit_boxes(2), &[(1, 1)]),
        Err(GcsError::MalformedGraph(_))
    ));
    assert!(matches!(
        RegionGraph::build(unit_boxes(2), &[(0, 1), (0, 1)]),
        Err(GcsError::MalformedGraph(_))
    ));
    assert!(matches!(
        RegionGraph::build(Vec::new(), &[]),
        Err(GcsError::MalformedGraph(_))
    ));
    let mut mixed = unit_boxes(1);
    mixed.push(HPolytope::from_box(&[0.0], &[1.0]).unwrap());
    assert!(matches!(
        RegionGraph::build(mixed, &[]),
        Err(GcsError::MalformedGraph(_))
    ));
}

#[test]
fn lookups_are_stable_across_calls() {
    let g = RegionGraph::build(unit_boxes(4), &[(0, 1), (1, 2), (2, 3)]).unwrap();
    for _ in 0..3 {
        for i in 0..4 {
            assert_eq!(g.vertex(VertexId(i)).unwrap().id, VertexId(i));
        }
        for (k, (u, v)) in [(0, 1), (1, 2), (2, 3)].into_iter().enumerate() {
            let e = g.edge_between(VertexId(u), VertexId(v)).unwrap();
            assert_eq!(e.id, EdgeId(k));
            assert_eq!(*g.edge(e.id).unwrap(), *e);
        }
    }
    assert!(matches!(
        g.vertex(VertexId(4)),
        Err(GcsError::UnknownElement(Element::Vertex(VertexId(4))))
    ));
}

#[test]
fn ephemeral_vertices_take_fresh_ids_and_leave_holes() {
    let mut g = RegionGraph::build(unit_boxes(2), &[(0, 1)]).unwrap();
    let p = dvector![0.5, 0.5];
    assert_eq!(g.containing_regions(&p, 1e-9), vec![VertexId(0)]);
    let s = g.add_ephemeral(VertexKind::Start(p)).unwrap();
    assert_eq!(s, VertexId(2));
    let e = g.connect(s, VertexId(0)).unwrap();
    assert_eq!(e, EdgeId(1));
    assert_eq!(g.connect(s, VertexId(0)).unwrap(), e);

    let removed = g.remove_ephemeral(s).unwrap();
    assert_eq!(removed, vec![e]);
    assert!(g.vertex(s).is_err());
    assert!(g.edge(e).is_err());
    assert!(g.predecessors(VertexId(0)).unwrap().is_empty());

    let s2 = g.add_ephemeral(VertexKind::Start(dvector![1.5, 0.5])).unwrap();
    assert_eq!(s2, VertexId(3));
    assert!(g.remove_ephemeral(VertexId(0)).is_err());
    assert!(matches!(
        g.add_ephemeral(VertexKind::Goal(dvector![0.5])),
        Err(GcsError::DimensionMismatch { expected: 2, got: 1 })
    ));
    assert!(g.add_ephemeral(VertexKind::Region(0)).is_err());
}

#[test]
fn anchor_churn_does_not_grow_storage() {
    let mut g = RegionGraph::build(unit_boxes(2), &[(0, 1)]).unwrap();
    let mut last = None;
    for _ in 0..50 {
        let s = g.add_ephemeral(VertexKind::Start(dvector![0.5, 0.5])).unwrap();
        let e = g.connect(s, VertexId(0)).unwrap();
        if let Some((prev_s, prev_e)) = last {
            assert!(s > prev_s && e > prev_e);
        }
        last = Some((s, e));
        g.remove_ephemeral(s).unwrap();
    }
    assert_eq!(last, Some((VertexId(51), EdgeId(50))));
    assert_eq!(g.vertices.len(), 2);
    assert_eq!(g.edges.len(), 1);
    assert_eq!(g.out.len(), 2);
    assert_eq!(g.inc.len(), 2);
    assert_eq!(g.out[&VertexId(0)], vec![EdgeId(0)]);
    assert!(g.vertex(VertexId(51)).is_err());
}

#[test]
fn resolve_path_validates_ids_edges_and_revisits() {
    let g = RegionGraph::build(unit_boxes(3), &[(0, 1), (1, 2), (2, 1)]).unwrap();
    let p = g
        .resolve_path(&[VertexId(0), VertexId(1), VertexId(2)], None)
        .unwrap();
    assert_eq!(p.edges, vec![EdgeId(0), EdgeId(1)]);
    assert_eq!(p.prefix(2).edges, vec![EdgeId(0)]);
    assert_eq!(p.prefix(1).edges, Vec::<EdgeId>::new());

    let explicit = g
        .resolve_path(&[VertexId(0), VertexId(1)], Some(&[EdgeId(0)]))
        .unwrap();
    assert_eq!(explicit.edges, vec![EdgeId(0)]);

    assert!(matches!(
        g.resolve_path(&[VertexId(0), VertexId(9)], None),
        Err(GcsError::UnknownElement(Element::Vertex(VertexId(9))))
    ));
    assert!(matches!(
        g.resolve_path(&[VertexId(0), VertexId(2)], None),
        Err(GcsError::UnknownElement(Element::Transition(..)))
    ));
    assert!(matches!(
        g.resolve_path(&[VertexId(1), VertexId(2), VertexId(1)], None),
        Err(GcsError::InvalidPath(_))
    ));
    assert!(matches!(
        g.resolve_path(&[VertexId(0), VertexId(1)], Some(&[EdgeId(1)])),
        Err(GcsError::InvalidPath(_))
    ));
    assert!(matches!(
        g.resolve_path(&[VertexId(0), VertexId(1)], Some(&[])),
        Err(GcsError::InvalidPath(_))
    ));
    assert!(matches!(g.resolve_path(&[], None), Err(GcsError::InvalidPath(_))));
}
