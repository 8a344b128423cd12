use std::fmt::{Debug, Display};

use serde::{Deserialize, Serialize};

use crate::time::TimeS;

/// A waypoint on the emulated grid.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        (dx * dx + dy * dy).sqrt()
    }
}

impl Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

impl From<[i64; 2]> for Point {
    fn from(f: [i64; 2]) -> Self {
        Self { x: f[0], y: f[1] }
    }
}

/// A position fix. Readers always receive the whole triple, never a
/// partially updated one.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
    pub point: Point,
    pub t: TimeS,
}

impl Position {
    pub fn new(point: Point, t: TimeS) -> Self {
        Self { point, t }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Heading {
    #[serde(rename = "N")]
    North,
    #[serde(rename = "S")]
    South,
    #[default]
    #[serde(rename = "E")]
    East,
    #[serde(rename = "W")]
    West,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Forward,
    Backward,
    Halted,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PowerStatus {
    #[default]
    Off,
    On,
}

/// Vehicle dynamics as read off the OBD-II interface. Single writer is the
/// motor worker, everyone else gets snapshots.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VehicleDynamics {
    pub speed: u32,
    pub direction: Direction,
    pub heading: Heading,
    pub status: PowerStatus,
}

/// An ordered sequence of waypoints. Insertion order is the direction of
/// travel; a route is immutable once assigned except through an explicit
/// route assignment.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Route(Vec<Point>);

impl Route {
    pub fn new(waypoints: Vec<Point>) -> Self {
        Self(waypoints)
    }

    pub fn waypoints(&self) -> &[Point] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<&Point> {
        self.0.first()
    }

    pub fn last(&self) -> Option<&Point> {
        self.0.last()
    }
}

impl From<Vec<Point>> for Route {
    fn from(waypoints: Vec<Point>) -> Self {
        Self(waypoints)
    }
}

impl FromIterator<Point> for Route {
    fn from_iter<T: IntoIterator<Item = Point>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
