use cits_core::message::FleetReport;
use cits_core::mobility::{Point, Position, Route};
use cits_core::node::NodeId;
use cits_core::time::TimeS;

pub fn point(x: i64, y: i64) -> Point {
    Point::new(x, y)
}

pub fn route(waypoints: &[(i64, i64)]) -> Route {
    waypoints.iter().map(|&(x, y)| Point::new(x, y)).collect()
}

pub fn fleet_report(
    obu: u32,
    rsu: u32,
    waypoints: &[(i64, i64)],
    expiry_hint: Option<TimeS>,
) -> FleetReport {
    FleetReport {
        obu_id: NodeId::from(obu),
        position: Position::new(point(0, 0), TimeS::new(0)),
        originating_rsu: NodeId::from(rsu),
        route: route(waypoints),
        expiry_hint,
    }
}
