//! Positions, directions, and connection sets for the block grid.
//!
//! A node is identified by its integer 3D [`BlockPos`]; its rotational
//! interface is the set of faces it connects through, stored compactly in a
//! [`DirSet`]. Direction order is fixed (Down, Up, North, South, West, East)
//! so every traversal in the engine iterates neighbors deterministically.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// BlockPos
// ---------------------------------------------------------------------------

/// An integer position on the 3D block grid. Node identity key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The neighboring position one block along `dir`.
    pub fn offset(&self, dir: Direction) -> BlockPos {
        let (dx, dy, dz) = dir.unit();
        BlockPos::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Manhattan distance to another position.
    pub fn manhattan_distance(&self, other: &BlockPos) -> u32 {
        (self.x - other.x).unsigned_abs()
            + (self.y - other.y).unsigned_abs()
            + (self.z - other.z).unsigned_abs()
    }
}

// ---------------------------------------------------------------------------
// Axis / Direction
// ---------------------------------------------------------------------------

/// A coordinate axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// The six axis-aligned unit directions.
///
/// Discriminant order matches [`Direction::all`] and the bit layout of
/// [`DirSet`]; opposite directions pair up as (2n, 2n+1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    Down,
    Up,
    North,
    South,
    West,
    East,
}

impl Direction {
    /// All six directions in deterministic engine order.
    pub fn all() -> [Direction; 6] {
        [
            Direction::Down,
            Direction::Up,
            Direction::North,
            Direction::South,
            Direction::West,
            Direction::East,
        ]
    }

    /// The opposing direction.
    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Down => Direction::Up,
            Direction::Up => Direction::Down,
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
            Direction::East => Direction::West,
        }
    }

    /// The axis this direction lies on.
    pub fn axis(&self) -> Axis {
        match self {
            Direction::Down | Direction::Up => Axis::Y,
            Direction::North | Direction::South => Axis::Z,
            Direction::West | Direction::East => Axis::X,
        }
    }

    /// Whether this is the positive-coordinate direction on its axis.
    pub fn is_positive(&self) -> bool {
        matches!(self, Direction::Up | Direction::South | Direction::East)
    }

    /// Unit offset (dx, dy, dz) for this direction.
    pub fn unit(&self) -> (i32, i32, i32) {
        match self {
            Direction::Down => (0, -1, 0),
            Direction::Up => (0, 1, 0),
            Direction::North => (0, 0, -1),
            Direction::South => (0, 0, 1),
            Direction::West => (-1, 0, 0),
            Direction::East => (1, 0, 0),
        }
    }

    /// Both directions along an axis, low side first.
    pub fn along(axis: Axis) -> [Direction; 2] {
        match axis {
            Axis::X => [Direction::West, Direction::East],
            Axis::Y => [Direction::Down, Direction::Up],
            Axis::Z => [Direction::North, Direction::South],
        }
    }

    fn bit(&self) -> u8 {
        1 << (*self as u8)
    }
}

// ---------------------------------------------------------------------------
// DirSet
// ---------------------------------------------------------------------------

/// A compact set of connection directions. Cheap to copy and compare.
///
/// Backed by one bit per [`Direction`]; iteration follows the engine
/// direction order regardless of insertion order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DirSet(u8);

impl DirSet {
    /// The empty set.
    pub fn empty() -> Self {
        Self(0)
    }

    /// The set holding both directions along `axis`.
    pub fn axis_pair(axis: Axis) -> Self {
        Direction::along(axis).into_iter().collect()
    }

    /// The set holding a single direction.
    pub fn single(dir: Direction) -> Self {
        Self(dir.bit())
    }

    pub fn insert(&mut self, dir: Direction) {
        self.0 |= dir.bit();
    }

    pub fn remove(&mut self, dir: Direction) {
        self.0 &= !dir.bit();
    }

    pub fn contains(&self, dir: Direction) -> bool {
        self.0 & dir.bit() != 0
    }

    pub fn len(&self) -> u32 {
        self.0.count_ones()
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Iterate contained directions in engine order.
    pub fn iter(&self) -> impl Iterator<Item = Direction> + '_ {
        Direction::all().into_iter().filter(|d| self.contains(*d))
    }
}

impl FromIterator<Direction> for DirSet {
    fn from_iter<I: IntoIterator<Item = Direction>>(iter: I) -> Self {
        let mut set = DirSet::empty();
        for dir in iter {
            set.insert(dir);
        }
        set
    }
}
