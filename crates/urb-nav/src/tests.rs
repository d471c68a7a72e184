//! Unit tests for urb-nav.
//!
//! All tests run on hand-crafted graphs so nothing touches the filesystem
//! except the loader tests, which go through `tempfile`.

#[cfg(test)]
mod helpers {
    use urb_core::Point3;

    use crate::{PedGraph, PedGraphBuilder, VehGraph, VehGraphBuilder, VehRoute, VehSign};

    /// A straight one-way chain:
    ///
    /// ```text
    /// n1(0,0) → n2(10,0) → n3(20,0) → n4(30,0)
    /// ```
    ///
    /// All intermediate approaches route Left; n4 is terminal.  Nodes n1..n3
    /// are spawn nodes so plans can be respawned anywhere along the chain.
    pub fn chain_graph() -> (VehGraph, [urb_core::NodeId; 4]) {
        let mut b = VehGraphBuilder::new();
        let n1 = b.add_node(Point3::new(0.0, 0.0, 0.0));
        let n2 = b.add_node(Point3::new(10.0, 0.0, 0.0));
        let n3 = b.add_node(Point3::new(20.0, 0.0, 0.0));
        let n4 = b.add_node(Point3::new(30.0, 0.0, 0.0));
        b.connect(n1, n2).unwrap();
        b.connect(n2, n3).unwrap();
        b.connect(n3, n4).unwrap();
        b.set_approach(n1, 0, VehSign::Spawn, VehRoute::Left);
        b.set_route(n2, 0, VehRoute::Left);
        b.set_route(n3, 0, VehRoute::Left);
        b.set_spawn_count(3);
        (b.build().unwrap(), [n1, n2, n3, n4])
    }

    /// Two perpendicular one-way routes meeting at node N:
    ///
    /// ```text
    /// a0(-40,0) → a1(-20,0) → N(0,0) → a2(10,0)      (enters N on way 0)
    /// b0(0,-40) → b1(0,-20) → N      → b2(0,10)      (enters N on way 1)
    /// ```
    ///
    /// With `yield_on_a`, route A carries a Yield sign at a1.
    pub struct Crossing {
        pub graph: VehGraph,
        pub n: urb_core::NodeId,
        /// Spawn indices that place a plan at the start of route A / route B.
        pub spawn_a: u32,
        pub spawn_b: u32,
    }

    pub fn crossing_graph(yield_on_a: bool) -> Crossing {
        let mut b = VehGraphBuilder::new();
        let a0 = b.add_node(Point3::new(-40.0, 0.0, 0.0));
        let a1 = b.add_node(Point3::new(-20.0, 0.0, 0.0));
        let n = b.add_node(Point3::new(0.0, 0.0, 0.0));
        let a2 = b.add_node(Point3::new(10.0, 0.0, 0.0));
        let b0 = b.add_node(Point3::new(0.0, -40.0, 0.0));
        let b1 = b.add_node(Point3::new(0.0, -20.0, 0.0));
        let b2 = b.add_node(Point3::new(0.0, 10.0, 0.0));

        b.connect(a0, a1).unwrap();
        assert_eq!(b.connect(a1, n).unwrap(), 0); // A enters N on way 0
        b.connect(n, a2).unwrap();
        b.connect(b0, b1).unwrap();
        assert_eq!(b.connect(b1, n).unwrap(), 1); // B enters N on way 1
        b.connect(n, b2).unwrap();

        b.set_route(a0, 0, VehRoute::Left);
        b.set_route(a1, 0, VehRoute::Left);
        b.set_route(b0, 0, VehRoute::Left);
        b.set_route(b1, 0, VehRoute::Left);
        b.set_route(n, 0, VehRoute::Left); // A exits via next[0] = a2
        b.set_route(n, 1, VehRoute::Right); // B exits via next[1] = b2
        if yield_on_a {
            b.set_sign(a1, 0, VehSign::Yield);
        }
        b.set_spawn_count(6);

        Crossing {
            graph:   b.build().unwrap(),
            n,
            spawn_a: 0, // spawn node a0 (id 1)
            spawn_b: 4, // spawn node b0 (id 5)
        }
    }

    /// A sidewalk cross: center C with four arms at E/N/W/S, 10 m each.
    pub fn ped_cross() -> (PedGraph, [urb_core::NodeId; 5]) {
        let mut b = PedGraphBuilder::new();
        let c = b.add_node(Point3::new(0.0, 0.0, 0.0));
        let e = b.add_node(Point3::new(10.0, 0.0, 0.0));
        let n = b.add_node(Point3::new(0.0, 10.0, 0.0));
        let w = b.add_node(Point3::new(-10.0, 0.0, 0.0));
        let s = b.add_node(Point3::new(0.0, -10.0, 0.0));
        b.connect(c, e).unwrap();
        b.connect(c, n).unwrap();
        b.connect(c, w).unwrap();
        b.connect(c, s).unwrap();
        b.set_spawn_count(1);
        (b.build().unwrap(), [c, e, n, w, s])
    }
}

// ── SemaphoreTable ────────────────────────────────────────────────────────────

#[cfg(test)]
mod semaphore {
    use std::io::Cursor;

    use crate::{NavError, SemaphoreTable};

    #[test]
    fn green_share_matches_configuration() {
        // Over any total-second window, is_green holds for exactly `green`
        // of the seconds.
        for &(total, green, phase) in &[(5u8, 2u8, 0u8), (30, 10, 10), (255, 254, 3)] {
            let mut table = SemaphoreTable::new();
            table.configure(1, total, green, phase).unwrap();

            let mut greens = 0;
            for _ in 0..2 * total as u32 {
                if table.is_green(1) {
                    greens += 1;
                }
                table.tick(1.0);
            }
            assert_eq!(greens, 2 * green as u32, "total={total} green={green}");
        }
    }

    #[test]
    fn phase_shifts_the_window() {
        // is_green depends only on (clock + phase) mod total.
        let mut shifted = SemaphoreTable::new();
        shifted.configure(1, 20, 7, 13).unwrap();

        let mut advanced = SemaphoreTable::new();
        advanced.configure(1, 20, 7, 0).unwrap();
        advanced.tick(13.0);

        for _ in 0..40 {
            assert_eq!(shifted.is_green(1), advanced.is_green(1));
            shifted.tick(1.0);
            advanced.tick(1.0);
        }
    }

    #[test]
    fn residual_accumulates_into_whole_seconds() {
        let mut table = SemaphoreTable::new();
        for _ in 0..5 {
            table.tick(0.4);
        }
        assert_eq!(table.clock_secs(), 2);
    }

    #[test]
    fn wrap_scenario() {
        // tick(15) twice plus tick(0.5) lands the clock exactly on 30 s; a
        // 30/10/0 signal is green again at that instant.
        let mut table = SemaphoreTable::new();
        table.configure(1, 30, 10, 0).unwrap();
        table.tick(15.0);
        table.tick(15.0);
        table.tick(0.5);
        assert_eq!(table.clock_secs(), 30);
        assert!(table.is_green(1));
    }

    #[test]
    fn configure_rejects_bad_input() {
        let mut table = SemaphoreTable::new();
        assert!(matches!(
            table.configure(0, 30, 10, 0),
            Err(NavError::SemaphoreIndex { .. })
        ));
        assert!(matches!(
            table.configure(256, 30, 10, 0),
            Err(NavError::SemaphoreIndex { .. })
        ));
        assert!(matches!(
            table.configure(1, 10, 11, 0),
            Err(NavError::SemaphoreTimes { .. })
        ));
        assert!(matches!(
            table.configure(1, 10, 0, 0),
            Err(NavError::SemaphoreTimes { .. })
        ));
    }

    #[test]
    fn load_skips_junk_lines_and_applies_good_ones() {
        let text = "# city center signals\n\n1 30 10 0\nnot a line\n2 20 5 13\n";
        let mut table = SemaphoreTable::new();
        table.load_reader(Cursor::new(text)).unwrap();

        // Signal 1: green for the first 10 s.
        assert!(table.is_green(1));
        // Signal 2: (0 + 13) % 20 = 13 >= 5 → red.
        assert!(!table.is_green(2));
    }

    #[test]
    fn load_rejects_impossible_triples() {
        let mut table = SemaphoreTable::new();
        let result = table.load_reader(Cursor::new("1 10 20 0\n"));
        assert!(matches!(result, Err(NavError::SemaphoreTimes { .. })));

        let result = table.load_reader(Cursor::new("300 30 10 0\n"));
        assert!(matches!(result, Err(NavError::SemaphoreIndex { .. })));
    }

    #[test]
    fn tick_never_goes_backward() {
        let mut table = SemaphoreTable::new();
        table.tick(5.0);
        table.tick(-3.0);
        assert_eq!(table.clock_secs(), 5);
    }
}

// ── Vehicle graph I/O ─────────────────────────────────────────────────────────

#[cfg(test)]
mod veh_graph {
    use crate::{NavError, VehGraph};

    #[test]
    fn write_load_write_roundtrip() {
        let (graph, _) = super::helpers::chain_graph();

        let mut first = Vec::new();
        graph.write_to(&mut first).unwrap();

        let reloaded = VehGraph::load_reader(first.as_slice()).unwrap();
        assert_eq!(reloaded.node_count(), graph.node_count());
        assert_eq!(reloaded.spawn_count(), graph.spawn_count());

        let mut second = Vec::new();
        reloaded.write_to(&mut second).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn load_from_path() {
        let (graph, _) = super::helpers::chain_graph();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.dat");
        graph.save_path(&path).unwrap();

        let reloaded = VehGraph::load_path(&path).unwrap();
        assert_eq!(reloaded.node_count(), 5);
        assert_eq!(reloaded.spawn_count(), 3);
        let n2 = reloaded.node(urb_core::NodeId(2));
        assert_eq!(n2.pos.x, 10.0);
    }

    #[test]
    fn bad_magic_is_rejected() {
        let (graph, _) = super::helpers::chain_graph();
        let mut bytes = Vec::new();
        graph.write_to(&mut bytes).unwrap();
        bytes[0] = b'X';
        assert!(matches!(
            VehGraph::load_reader(bytes.as_slice()),
            Err(NavError::BadMagic { .. })
        ));
    }

    #[test]
    fn short_read_is_rejected() {
        let (graph, _) = super::helpers::chain_graph();
        let mut bytes = Vec::new();
        graph.write_to(&mut bytes).unwrap();
        bytes.truncate(bytes.len() - 40); // lose the last node and then some
        assert!(matches!(
            VehGraph::load_reader(bytes.as_slice()),
            Err(NavError::ShortRead { .. })
        ));
    }

    #[test]
    fn dangling_link_is_rejected() {
        let (graph, _) = super::helpers::chain_graph();
        let mut bytes = Vec::new();
        graph.write_to(&mut bytes).unwrap();
        // next[0] of node 1 lives at header(32) + 1*32 + 12.
        bytes[32 + 32 + 12..32 + 32 + 16].copy_from_slice(&999u32.to_le_bytes());
        assert!(matches!(
            VehGraph::load_reader(bytes.as_slice()),
            Err(NavError::DanglingLink { node: 1, target: 999 })
        ));
    }

    #[test]
    fn invalid_sign_nibble_is_rejected() {
        let (graph, _) = super::helpers::chain_graph();
        let mut bytes = Vec::new();
        graph.write_to(&mut bytes).unwrap();
        bytes[32 + 32] = 0x0F; // from0 of node 1: sign nibble 15
        assert!(matches!(
            VehGraph::load_reader(bytes.as_slice()),
            Err(NavError::BadField { field: "from0", .. })
        ));
    }

    #[test]
    fn inconsistent_header_is_rejected() {
        let (graph, _) = super::helpers::chain_graph();
        let mut bytes = Vec::new();
        graph.write_to(&mut bytes).unwrap();
        // num_spawns = num_nodes is impossible (node 0 is reserved).
        let nodes = graph.node_count() as u32;
        bytes[20..24].copy_from_slice(&nodes.to_le_bytes());
        assert!(matches!(
            VehGraph::load_reader(bytes.as_slice()),
            Err(NavError::BadHeader(_))
        ));
    }
}

// ── Vehicle planner ───────────────────────────────────────────────────────────

#[cfg(test)]
mod veh_plan {
    use crate::{NavContext, PlanQuery, VehNav};

    fn query(x: f32, y: f32) -> PlanQuery {
        PlanQuery { x, y, length: 4.0, speed: 10.0, horizon: 10.0 }
    }

    #[test]
    fn straight_line_following() {
        // Two vehicles on the same chain; the one ahead keeps every slot and
        // the follower sees it as a same-way collision.
        let (graph, [n1, n2, n3, n4]) = super::helpers::chain_graph();
        let mut nav = VehNav::new(graph);
        let ctx = NavContext::default();

        let b = nav.create_plan(7);
        nav.respawn(b, 10.0, Some(0)); // prev = n1, curr = n2
        let a = nav.create_plan(8);
        nav.respawn(a, 10.0, Some(0));

        // B first: at (8, 0), two metres short of n2.
        let step_b = nav.planify(b, &query(8.0, 0.0), &ctx).unwrap();
        assert!(step_b.collision.is_none());

        // B owns the whole chain with path distances 0, 2, 12, 22.
        let dists: Vec<f32> = [n1, n2, n3, n4]
            .iter()
            .map(|&n| {
                let (owner, dist, _) = nav.reservation(n, 0, &ctx).unwrap();
                assert_eq!(owner, b);
                dist
            })
            .collect();
        assert_eq!(dists, vec![0.0, 2.0, 12.0, 22.0]);

        // A second, ten metres behind B: loses n2 on its own way.
        let step_a = nav.planify(a, &query(-2.0, 0.0), &ctx).unwrap();
        let info = step_a.collision.expect("follower must collide");
        assert_eq!(info.plan, Some(b));
        assert_eq!(info.node, n2);
        assert!(info.my_way);
        assert!((info.dist - 12.0).abs() < 1e-4); // A → n2 along the lane
        assert!((info.time - 1.2).abs() < 1e-4);
    }

    #[test]
    fn closer_plan_overwrites_farther_plan() {
        // Planner monotonicity: a strictly smaller distance steals the slot;
        // an equal-or-larger one never does.
        let (graph, [_, n2, ..]) = super::helpers::chain_graph();
        let mut nav = VehNav::new(graph);
        let ctx = NavContext::default();

        let far = nav.create_plan(1);
        nav.respawn(far, 10.0, Some(0));
        let close = nav.create_plan(2);
        nav.respawn(close, 10.0, Some(0));

        // Far vehicle writes n2 first with dist 12.
        nav.planify(far, &query(-2.0, 0.0), &ctx).unwrap();
        let (owner, dist, _) = nav.reservation(n2, 0, &ctx).unwrap();
        assert_eq!((owner, dist), (far, 12.0));

        // The closer vehicle overwrites it.
        let step = nav.planify(close, &query(8.0, 0.0), &ctx).unwrap();
        assert!(step.collision.is_none());
        let (owner, dist, _) = nav.reservation(n2, 0, &ctx).unwrap();
        assert_eq!((owner, dist), (close, 2.0));
    }

    #[test]
    fn equal_distance_first_writer_wins() {
        let (graph, [_, n2, ..]) = super::helpers::chain_graph();
        let mut nav = VehNav::new(graph);
        let ctx = NavContext::default();

        let first = nav.create_plan(1);
        nav.respawn(first, 10.0, Some(0));
        let second = nav.create_plan(2);
        nav.respawn(second, 10.0, Some(0));

        nav.planify(first, &query(-2.0, 0.0), &ctx).unwrap();
        let step = nav.planify(second, &query(-2.0, 0.0), &ctx).unwrap();

        let (owner, ..) = nav.reservation(n2, 0, &ctx).unwrap();
        assert_eq!(owner, first);
        assert_eq!(step.collision.unwrap().plan, Some(first));
    }

    #[test]
    fn crossing_equal_time_first_arrival_wins() {
        // No signs: with identical distance and speed, strict `<` keeps the
        // slot with whoever planned first.
        let crossing = super::helpers::crossing_graph(false);
        let mut nav = VehNav::new(crossing.graph);
        let ctx = NavContext::default();

        let b = nav.create_plan(1);
        nav.respawn(b, 10.0, Some(crossing.spawn_b));
        let a = nav.create_plan(2);
        nav.respawn(a, 10.0, Some(crossing.spawn_a));

        let step_b = nav.planify(b, &query(0.0, -30.0), &ctx).unwrap();
        assert!(step_b.collision.is_none());

        let step_a = nav.planify(a, &query(-30.0, 0.0), &ctx).unwrap();
        let info = step_a.collision.expect("cross traffic must collide");
        assert_eq!(info.plan, Some(b));
        assert_eq!(info.node, crossing.n);
        assert!(!info.my_way);
    }

    #[test]
    fn yield_sign_loses_the_crossing() {
        // A passes a Yield: its arrival time is scaled ×10, so even planning
        // first it cannot hold the crossing against B.
        let crossing = super::helpers::crossing_graph(true);
        let mut nav = VehNav::new(crossing.graph);
        let ctx = NavContext::default();

        let a = nav.create_plan(1);
        nav.respawn(a, 10.0, Some(crossing.spawn_a));
        let b = nav.create_plan(2);
        nav.respawn(b, 10.0, Some(crossing.spawn_b));

        // A first: claims N's way-0 slot with scaled time 30 s.
        let step_a = nav.planify(a, &query(-30.0, 0.0), &ctx).unwrap();
        assert!(step_a.collision.is_none());
        let (_, _, time) = nav.reservation(crossing.n, 0, &ctx).unwrap();
        assert!((time - 30.0).abs() < 1e-3);

        // B still wins the crossing: its raw 3 s beat A's scaled 30 s.
        let step_b = nav.planify(b, &query(0.0, -30.0), &ctx).unwrap();
        assert!(step_b.collision.is_none());

        // Replanned after B, A now reads the conflict.
        let step_a = nav.planify(a, &query(-30.0, 0.0), &ctx).unwrap();
        let info = step_a.collision.expect("yielding vehicle must collide");
        assert_eq!(info.plan, Some(b));
        assert!(!info.my_way);
    }

    #[test]
    fn red_semaphore_stops_the_walk() {
        use crate::{SemaphoreTable, VehSign};

        // Chain with a signalled junction at n3 (signal type 5), red at
        // clock 0: (0 + 10) % 30 = 10 >= 10.
        let (graph, [_, n2, n3, n4]) = {
            use urb_core::Point3;
            let mut b = crate::VehGraphBuilder::new();
            let n1 = b.add_node(Point3::new(0.0, 0.0, 0.0));
            let n2 = b.add_node(Point3::new(10.0, 0.0, 0.0));
            let n3 = b.add_node(Point3::new(20.0, 0.0, 0.0));
            let n4 = b.add_node(Point3::new(30.0, 0.0, 0.0));
            b.connect(n1, n2).unwrap();
            b.connect(n2, n3).unwrap();
            b.connect(n3, n4).unwrap();
            b.set_approach(n1, 0, VehSign::Spawn, crate::VehRoute::Left);
            b.set_route(n2, 0, crate::VehRoute::Left);
            b.set_approach(n3, 0, VehSign::Semaphore, crate::VehRoute::Left);
            b.set_semaphore(n3, 5);
            b.set_spawn_count(1);
            (b.build().unwrap(), [n1, n2, n3, n4])
        };

        let mut semaphores = SemaphoreTable::new();
        semaphores.configure(5, 30, 10, 10).unwrap();
        let ctx = crate::NavContext::new(semaphores);

        let mut nav = VehNav::new(graph);
        let plan = nav.create_plan(3);
        nav.respawn(plan, 10.0, Some(0));

        let step = nav.planify(plan, &query(-2.0, 0.0), &ctx).unwrap();

        // Target never reaches past the light; the collision names the signal.
        assert_eq!(step.target, n2);
        let info = step.collision.expect("red light must collide");
        assert_eq!(info.node, n3);
        assert_eq!(info.semaphore, 5);
        assert_eq!(info.plan, None);
        assert!(info.my_way);

        // No reservation beyond the signalled node.
        assert!(nav.reservation(n4, 0, &ctx).is_none());
    }

    #[test]
    fn overpassing_advances_the_plan() {
        let (graph, [_, n2, n3, _]) = super::helpers::chain_graph();
        let mut nav = VehNav::new(graph);
        let ctx = NavContext::default();

        let plan = nav.create_plan(4);
        nav.respawn(plan, 10.0, Some(0)); // prev n1, curr n2

        // Just past n2: within one length and behind it along the lane.
        nav.planify(plan, &query(10.5, 0.0), &ctx).unwrap();
        assert_eq!(nav.previous(plan), n2);
        assert_eq!(nav.current(plan), n3);
    }

    #[test]
    fn fork_follows_the_turn_bits() {
        use crate::{VehGraphBuilder, VehRoute};
        use urb_core::{Point3, TurnBits};

        let mut b = VehGraphBuilder::new();
        let f0 = b.add_node(Point3::new(0.0, 0.0, 0.0));
        let fork = b.add_node(Point3::new(10.0, 0.0, 0.0));
        let left = b.add_node(Point3::new(20.0, 5.0, 0.0));
        let right = b.add_node(Point3::new(20.0, -5.0, 0.0));
        b.connect(f0, fork).unwrap();
        b.connect(fork, left).unwrap();
        b.connect(fork, right).unwrap();
        b.set_route(f0, 0, VehRoute::Left);
        b.set_route(fork, 0, VehRoute::Any);
        b.set_spawn_count(1);
        let mut nav = VehNav::new(b.build().unwrap());
        let ctx = NavContext::default();

        let seed = 0x5EED;
        let plan = nav.create_plan(seed);
        nav.respawn(plan, 10.0, Some(0)); // prev f0, curr fork

        // Drive just past the fork so the branch is committed.
        nav.planify(plan, &query(10.5, 0.0), &ctx).unwrap();

        let mut expect = TurnBits::seed(seed);
        let chosen = [left, right][expect.turn().side()];
        assert_eq!(nav.current(plan), chosen);
        assert_eq!(nav.previous(plan), fork);
    }

    #[test]
    fn speed_sign_tightens_the_cached_limit() {
        use crate::{VehGraphBuilder, VehRoute, VehSign};
        use urb_core::Point3;

        let mut b = VehGraphBuilder::new();
        let n1 = b.add_node(Point3::new(0.0, 0.0, 0.0));
        let n2 = b.add_node(Point3::new(10.0, 0.0, 0.0));
        let n3 = b.add_node(Point3::new(20.0, 0.0, 0.0));
        let n4 = b.add_node(Point3::new(30.0, 0.0, 0.0));
        b.connect(n1, n2).unwrap();
        b.connect(n2, n3).unwrap();
        b.connect(n3, n4).unwrap();
        b.set_route(n1, 0, VehRoute::Left);
        b.set_route(n2, 0, VehRoute::Left);
        b.set_approach(n3, 0, VehSign::Speed, VehRoute::Left);
        b.set_sign(n3, 1, VehSign::Speed);
        b.set_semaphore(n3, 30); // 30 km/h
        b.set_spawn_count(1);
        let mut nav = VehNav::new(b.build().unwrap());
        let ctx = NavContext::default();

        let plan = nav.create_plan(1);
        nav.respawn(plan, 20.0, Some(0)); // 20 m/s → cached 72 km/h
        assert_eq!(nav.speed_limit_kmh(plan), 72);

        let step = nav
            .planify(plan, &PlanQuery { x: -2.0, y: 0.0, length: 4.0, speed: 20.0, horizon: 10.0 }, &ctx)
            .unwrap();
        assert_eq!(nav.speed_limit_kmh(plan), 30);
        assert!((step.speed_limit - 30.0 * (1000.0 / 3600.0)).abs() < 1e-4);
    }

    #[test]
    fn own_node_is_always_owned_with_zero_distance() {
        let (graph, [n1, ..]) = super::helpers::chain_graph();
        let mut nav = VehNav::new(graph);
        let ctx = NavContext::default();

        let behind = nav.create_plan(1);
        nav.respawn(behind, 10.0, Some(0));
        let ahead = nav.create_plan(2);
        nav.respawn(ahead, 10.0, Some(0));

        // `ahead` claims n1 with dist 0 (it stands on it); `behind` replans
        // later but cannot have n1 — its own unconditional claim wins though,
        // since the stand-on claim is written last.
        nav.planify(ahead, &query(0.0, 0.0), &ctx).unwrap();
        let (owner, dist, time) = nav.reservation(n1, 0, &ctx).unwrap();
        assert_eq!((owner, dist, time), (ahead, 0.0, 0.0));

        nav.planify(behind, &query(0.0, 0.0), &ctx).unwrap();
        let (owner, dist, _) = nav.reservation(n1, 0, &ctx).unwrap();
        assert_eq!((owner, dist), (behind, 0.0));
    }

    #[test]
    fn reservations_expire_with_the_epoch() {
        let (graph, [_, n2, ..]) = super::helpers::chain_graph();
        let mut nav = VehNav::new(graph);
        let mut ctx = NavContext::default();

        let plan = nav.create_plan(1);
        nav.respawn(plan, 10.0, Some(0));
        nav.planify(plan, &query(-2.0, 0.0), &ctx).unwrap();
        assert!(nav.reservation(n2, 0, &ctx).is_some());

        // Still live one frame later (stamped epoch + 1)…
        ctx.advance_frame(0.1);
        assert!(nav.reservation(n2, 0, &ctx).is_some());

        // …and stale after two.
        ctx.advance_frame(0.1);
        assert!(nav.reservation(n2, 0, &ctx).is_none());
    }

    #[test]
    fn despawn_kills_outstanding_reservations() {
        let (graph, [_, n2, ..]) = super::helpers::chain_graph();
        let mut nav = VehNav::new(graph);
        let ctx = NavContext::default();

        let plan = nav.create_plan(1);
        nav.respawn(plan, 10.0, Some(0));
        nav.planify(plan, &query(-2.0, 0.0), &ctx).unwrap();
        nav.despawn(plan);

        // The slot's epoch is still fresh but the generation no longer
        // resolves, even after the slot is recycled.
        assert!(nav.reservation(n2, 0, &ctx).is_none());
        let recycled = nav.create_plan(9);
        assert_eq!(recycled, plan);
        assert!(nav.reservation(n2, 0, &ctx).is_none());
    }

    #[test]
    fn planify_on_despawned_plan_is_null() {
        let (graph, _) = super::helpers::chain_graph();
        let mut nav = VehNav::new(graph);
        let ctx = NavContext::default();

        let plan = nav.create_plan(1);
        nav.respawn(plan, 10.0, Some(0));
        nav.despawn(plan);
        let revived = nav.create_plan(2);
        assert!(nav.planify(revived, &query(0.0, 0.0), &ctx).is_none());
    }

    #[test]
    fn nearby_reports_vehicles_standing_on_the_route() {
        let (graph, _) = super::helpers::chain_graph();
        let mut nav = VehNav::new(graph);
        let ctx = NavContext::default();

        // `parked` stands exactly on n3 (its prev); `walker` looks ahead from n2.
        let parked = nav.create_plan(1);
        nav.respawn(parked, 10.0, Some(2)); // prev n3, curr n4
        nav.planify(parked, &query(20.0, 0.0), &ctx).unwrap();

        let walker = nav.create_plan(2);
        nav.respawn(walker, 10.0, Some(0)); // prev n1, curr n2

        let mut seen = Vec::new();
        nav.nearby(walker, 35.0, &ctx, |other| seen.push(other));
        assert_eq!(seen, vec![parked]);

        // A short budget still reports one hop past the current node.
        let mut seen = Vec::new();
        nav.nearby(walker, 5.0, &ctx, |other| seen.push(other));
        assert_eq!(seen, vec![parked]);
    }

    #[test]
    fn curvature_is_one_on_a_straight_road() {
        let (graph, _) = super::helpers::chain_graph();
        let mut nav = VehNav::new(graph);
        let ctx = NavContext::default();

        let plan = nav.create_plan(1);
        nav.respawn(plan, 10.0, Some(0));
        let step = nav
            .planify(plan, &PlanQuery { x: 0.0, y: 0.0, length: 4.0, speed: 10.0, horizon: 2.0 }, &ctx)
            .unwrap();
        assert!((step.curvature - 1.0).abs() < 1e-3, "got {}", step.curvature);
    }
}

// ── Pedestrian planner ────────────────────────────────────────────────────────

#[cfg(test)]
mod ped_plan {
    use urb_core::NodeId;

    use crate::{PedGraphBuilder, PedPlan};

    #[test]
    fn two_neighbors_no_uturn() {
        // A node with neighbors A (= prev) and B: arrival always advances to B.
        use urb_core::Point3;
        let mut b = PedGraphBuilder::new();
        let a = b.add_node(Point3::new(-10.0, 0.0, 0.0));
        let mid = b.add_node(Point3::new(0.0, 0.0, 0.0));
        let bb = b.add_node(Point3::new(10.0, 0.0, 0.0));
        b.connect(a, mid).unwrap();
        b.connect(mid, bb).unwrap();
        b.set_spawn_count(1);
        let graph = b.build().unwrap();

        let mut plan = PedPlan::new(1);
        plan.curr = mid;
        plan.prev = a;

        // Within arrival distance of mid → commit to bb.
        let target = plan.planify(&graph, -0.5, 0.0, 0.0, 1.0).unwrap();
        assert_eq!(target, bb);
        assert_eq!(plan.prev, mid);

        // Outside arrival distance nothing changes.
        let mut unmoved = PedPlan::new(1);
        unmoved.curr = mid;
        unmoved.prev = a;
        let target = unmoved.planify(&graph, -8.0, 0.0, 0.0, 1.0).unwrap();
        assert_eq!(target, mid);
        assert_eq!(unmoved.prev, a);
    }

    #[test]
    fn single_neighbor_bounces_back() {
        use urb_core::Point3;
        let mut b = PedGraphBuilder::new();
        let end = b.add_node(Point3::new(0.0, 0.0, 0.0));
        let inner = b.add_node(Point3::new(10.0, 0.0, 0.0));
        let far = b.add_node(Point3::new(20.0, 0.0, 0.0));
        b.connect(end, inner).unwrap();
        b.connect(inner, far).unwrap();
        b.set_spawn_count(1);
        let graph = b.build().unwrap();

        let mut plan = PedPlan::new(1);
        plan.curr = end;
        plan.prev = inner;

        let target = plan.planify(&graph, 0.2, 0.0, 0.0, 1.0).unwrap();
        assert_eq!(target, inner);
    }

    #[test]
    fn respawn_places_on_spawn_node() {
        let (graph, [c, ..]) = super::helpers::ped_cross();
        let mut plan = PedPlan::new(42);
        let node = plan.respawn(&graph, 0);
        assert_eq!(node, c);
        assert_eq!(plan.curr, c);
        assert_eq!(plan.prev, c);
    }

    #[test]
    fn despawned_plan_returns_none() {
        let (graph, _) = super::helpers::ped_cross();
        let mut plan = PedPlan::new(1);
        assert!(plan.planify(&graph, 0.0, 0.0, 0.0, 1.0).is_none());
        assert!(plan.re_planify(&graph, 0.0).is_none());
    }

    #[test]
    fn four_way_choice_is_angle_biased() {
        // Pedestrian facing west (heading π): the forward neighbor (west arm)
        // carries weight 128 of 256; the node behind carries weight 0.
        //
        // One selection per seed keeps draws independent of the weak
        // generator's serial correlation.
        let (graph, [c, e, n, w, s]) = super::helpers::ped_cross();

        let trials = 4096;
        let mut counts = std::collections::HashMap::<NodeId, u32>::new();
        for seed in 0..trials {
            let mut plan = PedPlan::new(seed);
            plan.curr = c;
            plan.prev = NodeId::INVALID;
            let target = plan
                .planify(&graph, 0.1, 0.0, std::f32::consts::PI, 1.0)
                .unwrap();
            *counts.entry(target).or_default() += 1;
        }

        let freq = |node: NodeId| counts.get(&node).copied().unwrap_or(0) as f64 / trials as f64;
        assert!((freq(w) - 0.5).abs() < 0.06, "west {}", freq(w));
        assert!(freq(e) < 0.02, "east {}", freq(e));
        assert!((freq(n) - 0.25).abs() < 0.06, "north {}", freq(n));
        assert!((freq(s) - 0.25).abs() < 0.06, "south {}", freq(s));
    }

    #[test]
    fn re_planify_reverses_the_bias() {
        // Facing west but re-planning: the escape reference flips, so the
        // *east* arm now carries the big weight.
        let (graph, [c, e, _, w, _]) = super::helpers::ped_cross();

        let trials = 2048;
        let mut east = 0u32;
        let mut west = 0u32;
        for seed in 0..trials {
            let mut plan = PedPlan::new(seed);
            plan.curr = c;
            plan.prev = NodeId::INVALID;
            let target = plan.re_planify(&graph, std::f32::consts::PI).unwrap();
            if target == e {
                east += 1;
            } else if target == w {
                west += 1;
            }
        }
        assert!(east as f64 / trials as f64 > 0.4, "east {east}");
        assert!(west < 50, "west {west}");
    }
}

// ── Pedestrian graph I/O ──────────────────────────────────────────────────────

#[cfg(test)]
mod ped_graph {
    use crate::{NavError, PedGraph};

    #[test]
    fn write_load_write_roundtrip() {
        let (graph, _) = super::helpers::ped_cross();

        let mut first = Vec::new();
        graph.write_to(&mut first).unwrap();
        let reloaded = PedGraph::load_reader(first.as_slice()).unwrap();
        let mut second = Vec::new();
        reloaded.write_to(&mut second).unwrap();
        assert_eq!(first, second);

        assert_eq!(reloaded.node_count(), graph.node_count());
        let center = reloaded.node(urb_core::NodeId(1));
        assert_eq!(center.count, 4);
    }

    #[test]
    fn baked_angles_follow_positions() {
        let (graph, [c, ..]) = super::helpers::ped_cross();
        let node = graph.node(c);
        // Arms were connected E, N, W, S → angles 0, 64, 128, 192.
        let angs: Vec<u8> = node.na.iter().map(|na| na.ang).collect();
        assert_eq!(angs, vec![0, 64, 128, 192]);
    }

    #[test]
    fn bad_magic_is_rejected() {
        let (graph, _) = super::helpers::ped_cross();
        let mut bytes = Vec::new();
        graph.write_to(&mut bytes).unwrap();
        bytes[4] = b'!';
        assert!(matches!(
            PedGraph::load_reader(bytes.as_slice()),
            Err(NavError::BadMagic { .. })
        ));
    }

    #[test]
    fn bad_neighbor_count_is_rejected() {
        let (graph, _) = super::helpers::ped_cross();
        let mut bytes = Vec::new();
        graph.write_to(&mut bytes).unwrap();
        bytes[32 + 32 + 3] = 5; // count of node 1
        assert!(matches!(
            PedGraph::load_reader(bytes.as_slice()),
            Err(NavError::BadField { field: "count", .. })
        ));
    }
}
