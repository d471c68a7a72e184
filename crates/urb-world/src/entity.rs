//! Entity classification.

/// What kind of dynamic entity a world slot holds.
///
/// The kind is fixed at spawn time and drives behavioral dispatch when a
/// neighbor query returns a mixed bag of entities.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EntityKind {
    /// The player-controlled bus.
    Bus,
    /// An ambient autonomous vehicle.
    Vehicle,
    /// An ambient pedestrian.
    Pedestrian,
    /// A static obstacle (street furniture, parked props).
    Object,
}
