use std::sync::Arc;

use nalgebra::{dmatrix, dvector};

use super::*;
use crate::graph::{EdgeId, RegionGraph, VertexId, VertexKind};
use crate::region::HPolytope;
use crate::vars::Var;

fn corridor(order: usize) -> (RegionGraph, Assembler) {
    let regions = vec![
        HPolytope::from_box(&[0.0, 0.0], &[1.0, 1.0]).unwrap(),
        HPolytope::from_box(&[1.0, 0.0], &[2.0, 1.0]).unwrap(),
        HPolytope::from_box(&[2.0, 0.0], &[3.0, 1.0]).unwrap(),
    ];
    let g = RegionGraph::build(regions, &[(0, 1), (1, 2)]).unwrap();
    let cfg = AssemblerCfg {
        order,
        num_positions: 2,
        h_min: 1e-3,
        h_max: 1.0,
    };
    let a = Assembler::new(&g, cfg, Arc::new(LinearTimeCost)).unwrap();
    (g, a)
}

fn tags<T>(bs: &[Binding<T>]) -> Vec<Tag> {
    bs.iter().map(|b| b.tag).collect()
}

#[test]
fn construction_adds_only_set_constraints() {
    let (_g, a) = corridor(2);
    let v0 = VertexId(0);
    assert!(a.vertex_costs(v0).is_empty());
    assert_eq!(
        tags(a.vertex_constraints(v0)),
        vec![Tag::Membership, Tag::Duration]
    );
    // 4 half-spaces × 3 control points
    assert_eq!(a.vertex_constraints(v0)[0].term.rows().len(), 12);
    assert!(a.edge_constraints(EdgeId(0)).is_empty());
}

#[test]
fn add_calls_append_per_element() {
    let (g, mut a) = corridor(3);
    a.add_path_length_cost(&g, 1.0).unwrap();
    a.add_time_cost(&g, 0.5).unwrap();
    a.add_path_continuity_constraint(&g, 1).unwrap();
    a.add_velocity_constraint(&g, &[-1.0, -1.0], &[1.0, 1.0]).unwrap();

    let v1 = VertexId(1);
    let costs = tags(a.vertex_costs(v1));
    assert_eq!(costs.iter().filter(|t| **t == Tag::PathLength).count(), 3);
    assert_eq!(costs.iter().filter(|t| **t == Tag::Time).count(), 1);
    let velocity = a
        .vertex_constraints(v1)
        .iter()
        .find(|b| b.tag == Tag::Velocity)
        .unwrap();
    // 3 differences × 2 dims × 2 sides
    assert_eq!(velocity.term.rows().len(), 12);
    let cont = &a.edge_constraints(EdgeId(0))[0];
    assert_eq!(cont.tag, Tag::Continuity);
    // C0 and C1, 2 dims each
    assert_eq!(cont.term.rows().len(), 4);
    // The continuity mask touches both endpoints and nothing else.
    assert!(cont
        .mask
        .iter()
        .all(|v| v.vertex == VertexId(0) || v.vertex == VertexId(1)));

    // A second registration appends.
    a.add_path_length_cost(&g, 2.0).unwrap();
    assert_eq!(
        tags(a.vertex_costs(v1))
            .iter()
            .filter(|t| **t == Tag::PathLength)
            .count(),
        6
    );
}

#[test]
fn path_length_cost_evaluates_control_polygon() {
    let (g, mut a) = corridor(2);
    a.add_path_length_cost(&g, 2.0).unwrap();
    let vv = *a.vars().get(VertexId(0)).unwrap();
    // Control points (0,0), (3,4), (3,4) → polygon length 5, weighted 10.
    let value = |v: Var| match v.slot {
        s if s == vv.control(1, 0).slot || s == vv.control(2, 0).slot => 3.0,
        s if s == vv.control(1, 1).slot || s == vv.control(2, 1).slot => 4.0,
        _ => 0.0,
    };
    let total: f64 = a
        .vertex_costs(VertexId(0))
        .iter()
        .map(|b| b.term.eval(&value))
        .sum();
    assert!((total - 10.0).abs() < 1e-12);
}

#[test]
fn weight_matrix_must_match_dimension() {
    let (g, mut a) = corridor(1);
    assert!(a
        .add_path_length_cost_matrix(&g, dmatrix![1.0, 0.0, 0.0])
        .is_err());
    a.add_path_length_cost_matrix(&g, dmatrix![1.0, 0.0; 0.0, 3.0])
        .unwrap();
    assert!(a.add_path_length_cost(&g, -1.0).is_err());
    assert!(a.add_path_continuity_constraint(&g, 2).is_err());
    assert!(a.add_velocity_constraint(&g, &[0.0], &[1.0]).is_err());
}

#[test]
fn continuity_matches_derivatives_of_the_bezier_ends() {
    let (g, mut a) = corridor(2);
    a.add_path_continuity_constraint(&g, 1).unwrap();
    let u = *a.vars().get(VertexId(0)).unwrap();
    let v = *a.vars().get(VertexId(1)).unwrap();
    // u: (0,0)->(0.5,0.5)->(1,0.5), end derivative 2*(0.5,0); v starts at (1,0.5)
    // with derivative 2*(0.5,0): C0 and C1 hold.
    let value = |x: Var| {
        let pts: [(f64, f64); 3] = if x.vertex == u.vertex {
            [(0.0, 0.0), (0.5, 0.5), (1.0, 0.5)]
        } else {
            [(1.0, 0.5), (1.5, 0.5), (1.75, 0.25)]
        };
        let k = x.slot / 2;
        if k > 2 {
            return 0.0;
        }
        if x.slot % 2 == 0 {
            pts[k].0
        } else {
            pts[k].1
        }
    };
    let cont = &a.edge_constraints(EdgeId(0))[0];
    assert!(cont.term.violation(&value) < 1e-12);
    assert_eq!(v.order(), 2);
}

#[test]
fn ephemeral_vertices_replay_registered_formulations() {
    let (mut g, mut a) = corridor(2);
    a.add_path_length_cost(&g, 1.0).unwrap();
    a.add_time_cost(&g, 1.0).unwrap();
    a.add_path_continuity_constraint(&g, 1).unwrap();
    let s = g
        .add_ephemeral(VertexKind::Start(dvector![0.5, 0.5]))
        .unwrap();
    let e = g.connect(s, VertexId(0)).unwrap();
    a.register_vertex(&g, s).unwrap();
    a.register_edge(&g, e).unwrap();

    // Single control point: no path-length terms, and no time on start/goal.
    assert!(a.vertex_costs(s).is_empty());
    assert_eq!(
        tags(a.vertex_constraints(s)),
        vec![Tag::PointEquality, Tag::Duration]
    );
    // Only C0 survives on an edge into an order-0 vertex.
    assert_eq!(a.edge_constraints(e)[0].term.rows().len(), 2);

    a.release_edge(e);
    a.release_vertex(s);
    assert!(a.vars().get(s).is_none());
    assert!(a.edge_constraints(e).is_empty());
}

#[test]
fn induced_problem_contains_only_path_bindings() {
    let (g, mut a) = corridor(1);
    a.add_path_length_cost(&g, 1.0).unwrap();
    a.add_path_continuity_constraint(&g, 0).unwrap();
    let path = g.resolve_path(&[VertexId(0), VertexId(1)], None).unwrap();
    let p = a.induce(&path).unwrap();
    assert_eq!(p.blocks.len(), 2);
    assert_eq!(p.num_vars, 10);
    assert_eq!(p.blocks[1].offset, 5);
    assert!(p
        .costs
        .iter()
        .all(|b| b.mask.iter().all(|v| v.vertex != VertexId(2))));
    assert!(p
        .constraints
        .iter()
        .all(|b| b.mask.iter().all(|v| v.vertex != VertexId(2))));
    // 2 vertices × (membership + duration) + 1 continuity
    assert_eq!(p.constraints.len(), 5);
    let x0 = a.vars().get(VertexId(1)).unwrap().control(1, 1);
    assert_eq!(p.column(x0), Some(5 + 3));
}
