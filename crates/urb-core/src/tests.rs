//! Unit tests for urb-core primitives.

#[cfg(test)]
mod ids {
    use crate::{EntityId, NodeId, PlanId};

    #[test]
    fn index_roundtrip() {
        let id = PlanId(42);
        assert_eq!(id.index(), 42);
        assert_eq!(PlanId::try_from(42usize).unwrap(), id);
    }

    #[test]
    fn ordering() {
        assert!(PlanId(0) < PlanId(1));
        assert!(NodeId(100) > NodeId(99));
    }

    #[test]
    fn sentinels() {
        // Graph nodes reserve index 0; slab IDs use MAX.
        assert_eq!(NodeId::INVALID.0, 0);
        assert_eq!(PlanId::INVALID.0, u32::MAX);
        assert_eq!(EntityId::INVALID.0, u32::MAX);
        assert!(!NodeId::INVALID.is_valid());
        assert!(NodeId(1).is_valid());
    }

    #[test]
    fn default_is_invalid() {
        assert_eq!(NodeId::default(), NodeId::INVALID);
        assert_eq!(PlanId::default(), PlanId::INVALID);
    }

    #[test]
    fn display() {
        assert_eq!(NodeId(7).to_string(), "NodeId(7)");
    }
}

#[cfg(test)]
mod rng {
    use crate::{Turn, TurnBits};

    #[test]
    fn seed_is_deterministic() {
        assert_eq!(TurnBits::seed(123).word(), TurnBits::seed(123).word());
        assert_ne!(TurnBits::seed(123).word(), TurnBits::seed(124).word());
    }

    #[test]
    fn peek_matches_consume_order() {
        let bits = TurnBits::seed(0xDEAD_BEEF);
        let peeked: Vec<Turn> = (0..8).map(|i| bits.direction(i)).collect();

        let mut consuming = bits;
        let consumed: Vec<Turn> = (0..8).map(|_| consuming.turn()).collect();

        assert_eq!(peeked, consumed);
    }

    #[test]
    fn turn_refills_the_word() {
        // After 32 consumed bits every original bit is gone but the word is
        // still fully populated.
        let mut bits = TurnBits::seed(7);
        for _ in 0..32 {
            bits.turn();
        }
        assert_ne!(bits.word(), 0);
        assert_ne!(bits.word(), TurnBits::seed(7).word());
    }

    #[test]
    fn next_word_sequence_is_reproducible() {
        let mut a = TurnBits::seed(99);
        let mut b = TurnBits::seed(99);
        for _ in 0..16 {
            assert_eq!(a.next_word(), b.next_word());
        }
    }

    #[test]
    fn turn_side_indexes_forks() {
        assert_eq!(Turn::Left.side(), 0);
        assert_eq!(Turn::Right.side(), 1);
    }
}

#[cfg(test)]
mod geo {
    use crate::{Point2, Point3};

    #[test]
    fn distance() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(3.0, 4.0);
        assert_eq!(a.dist_sq(b), 25.0);
        assert_eq!(a.dist(b), 5.0);
    }

    #[test]
    fn dot_and_sub() {
        let a = Point2::new(1.0, 2.0);
        let b = Point2::new(3.0, -1.0);
        assert_eq!(a.dot(b), 1.0);
        assert_eq!(b.sub(a), Point2::new(2.0, -3.0));
    }

    #[test]
    fn xy_projection() {
        let p = Point3::new(1.0, 2.0, 3.0);
        assert_eq!(p.xy(), Point2::new(1.0, 2.0));
    }
}

#[cfg(test)]
mod units {
    use crate::{kmh_to_mps, mps_to_kmh};

    #[test]
    fn roundtrip() {
        let v = 50.0;
        assert!((mps_to_kmh(kmh_to_mps(v)) - v).abs() < 1e-4);
    }

    #[test]
    fn known_values() {
        assert!((kmh_to_mps(36.0) - 10.0).abs() < 1e-5);
        assert!((mps_to_kmh(10.0) - 36.0).abs() < 1e-4);
    }
}
