use cits_core::mobility::{Direction, Heading, Position, VehicleDynamics};
use cits_core::time::TimeS;

/// Dead-reckoning substitute for a GPS fix: fixed deltas per tick along the
/// vehicle's heading. No kinematic realism is intended; the stack only needs
/// positions that move.
#[derive(Clone, Copy, Debug)]
pub struct DeadReckoning {
    pub delta_x: i64,
    pub delta_y: i64,
}

impl Default for DeadReckoning {
    fn default() -> Self {
        Self {
            delta_x: 5,
            delta_y: 2,
        }
    }
}

impl DeadReckoning {
    /// The next position estimate. Halted vehicles hold their fix, but the
    /// timestamp still advances so readers can tell the fix is current.
    pub fn advance(
        &self,
        position: Position,
        dynamics: &VehicleDynamics,
        now: TimeS,
    ) -> Position {
        let mut next = position;
        next.t = now;
        match (dynamics.heading, dynamics.direction) {
            (_, Direction::Halted) => {}
            (Heading::East, Direction::Forward) | (Heading::West, Direction::Backward) => {
                next.point.x += self.delta_x;
            }
            (Heading::East, Direction::Backward) | (Heading::West, Direction::Forward) => {
                next.point.x -= self.delta_x;
            }
            (Heading::North, Direction::Forward) | (Heading::South, Direction::Backward) => {
                next.point.y += self.delta_y;
            }
            (Heading::North, Direction::Backward) | (Heading::South, Direction::Forward) => {
                next.point.y -= self.delta_y;
            }
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use cits_core::mobility::{Point, PowerStatus};

    use super::*;

    fn dynamics(heading: Heading, direction: Direction) -> VehicleDynamics {
        VehicleDynamics {
            speed: 40,
            direction,
            heading,
            status: PowerStatus::On,
        }
    }

    #[test]
    fn eastbound_forward_advances_x() {
        let model = DeadReckoning::default();
        let start = Position::new(Point::new(10, 0), TimeS::new(1));
        let next = model.advance(start, &dynamics(Heading::East, Direction::Forward), TimeS::new(2));
        assert_eq!(next.point, Point::new(15, 0));
        assert_eq!(next.t, TimeS::new(2));
    }

    #[test]
    fn westbound_forward_retreats_x() {
        let model = DeadReckoning::default();
        let start = Position::new(Point::new(10, 0), TimeS::new(1));
        let next = model.advance(start, &dynamics(Heading::West, Direction::Forward), TimeS::new(2));
        assert_eq!(next.point, Point::new(5, 0));
    }

    #[test]
    fn halted_vehicle_keeps_its_fix() {
        let model = DeadReckoning::default();
        let start = Position::new(Point::new(10, 3), TimeS::new(1));
        let next = model.advance(
            start,
            &dynamics(Heading::North, Direction::Halted),
            TimeS::new(5),
        );
        assert_eq!(next.point, start.point);
        assert_eq!(next.t, TimeS::new(5));
    }
}
