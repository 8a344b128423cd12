use log::debug;
use serde::Deserialize;

use cits_core::message::{BusRequest, FleetReport};
use cits_core::mobility::{Point, Route};
use cits_core::node::NodeId;
use cits_core::time::TimeS;

/// Tunables of the arrival estimate. The margin multiplier models traffic
/// variance on top of the free-flow estimate.
#[derive(Deserialize, Debug, Clone)]
pub struct DispatchSettings {
    /// Cruise velocity in route units per hour.
    #[serde(default = "default_velocity")]
    pub velocity: f64,
    /// Dwell seconds per intermediate stop.
    #[serde(default = "default_stop_dwell")]
    pub stop_dwell: u64,
    #[serde(default = "default_margin_multiplier")]
    pub margin_multiplier: f64,
}

fn default_velocity() -> f64 {
    40.0
}

fn default_stop_dwell() -> u64 {
    20
}

fn default_margin_multiplier() -> f64 {
    1.6
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            velocity: default_velocity(),
            stop_dwell: default_stop_dwell(),
            margin_multiplier: default_margin_multiplier(),
        }
    }
}

/// A feasible match: the chosen bus, its route with the passenger's stops
/// spliced in, and the margin-padded arrival estimate.
#[derive(Clone, Debug, PartialEq)]
pub struct Assignment {
    pub bus_id: NodeId,
    pub route: Route,
    pub estimated_arrival: TimeS,
}

/// First-fit matching of a passenger request against the fleet. Pure
/// computation over a table snapshot; `None` is the no-match result.
#[derive(Clone, Debug, Default)]
pub struct Dispatcher {
    settings: DispatchSettings,
}

impl Dispatcher {
    pub fn new(settings: DispatchSettings) -> Self {
        Self { settings }
    }

    /// Finds a bus that can serve the request within its deadline.
    ///
    /// Stages run in order with no backtracking: area filter over every
    /// candidate, direction filter, first-fit selection, route splice,
    /// client leg extraction, arrival estimate, deadline check. Identical
    /// snapshot and request always produce the identical result.
    pub fn choose_bus(&self, fleet: &[FleetReport], request: &BusRequest) -> Option<Assignment> {
        let bus = fleet.iter().find(|candidate| {
            covers_area(&candidate.route, request) && heading_compatible(&candidate.route, request)
        })?;

        let spliced = splice(&bus.route, request.src, request.dest);
        let leg = client_leg(&spliced, request.src, request.dest);
        let total_secs = self.travel_secs(leg);
        let margin = (self.settings.margin_multiplier * total_secs) - total_secs;
        let padded = total_secs + margin;
        if padded > request.max_arrival.as_f64() {
            debug!(
                "Bus {} misses the deadline for request {}: {:.0}s > {}s",
                bus.obu_id, request.request_id, padded, request.max_arrival
            );
            return None;
        }
        Some(Assignment {
            bus_id: bus.obu_id,
            route: spliced,
            estimated_arrival: TimeS::new(padded.ceil() as u64),
        })
    }

    /// Free-flow travel time over the client leg plus one dwell per
    /// intermediate stop.
    fn travel_secs(&self, leg: &[Point]) -> f64 {
        let distance: f64 = leg.windows(2).map(|pair| pair[0].distance(&pair[1])).sum();
        let travel = distance / self.settings.velocity * 3600.0;
        let stops = leg.len().saturating_sub(2) as f64;
        travel + stops * self.settings.stop_dwell as f64
    }
}

/// The axis-aligned bounding box of the route must contain both endpoints
/// of the request, bounds inclusive.
fn covers_area(route: &Route, request: &BusRequest) -> bool {
    let Some(first) = route.first() else {
        return false;
    };
    let mut min = *first;
    let mut max = *first;
    for wp in route.waypoints() {
        min.x = min.x.min(wp.x);
        min.y = min.y.min(wp.y);
        max.x = max.x.max(wp.x);
        max.y = max.y.max(wp.y);
    }
    let inside = |p: &Point| p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y;
    inside(&request.src) && inside(&request.dest)
}

/// Quadrant-aligned direction check on net displacement vectors, a cheap
/// proxy for an angular test. Rejects any axis moving opposite ways; an
/// axis with no displacement on either side is neutral, but a fully
/// stationary pairing is no heading at all. Single-waypoint routes have an
/// undefined displacement and never pass.
fn heading_compatible(route: &Route, request: &BusRequest) -> bool {
    let (Some(first), Some(last)) = (route.first(), route.last()) else {
        return false;
    };
    if route.len() < 2 {
        return false;
    }
    let bus = Point::new(last.x - first.x, last.y - first.y);
    let client = Point::new(request.dest.x - request.src.x, request.dest.y - request.src.y);
    let prod_x = bus.x * client.x;
    let prod_y = bus.y * client.y;
    if prod_x < 0 || prod_y < 0 {
        return false;
    }
    prod_x > 0 || prod_y > 0
}

/// Splices the passenger's stops into the route, preserving the relative
/// order of all original waypoints. Each stop goes immediately before the
/// first waypoint that dominates it coordinate-wise, or at the end when
/// none does. A stop already on the route is never duplicated.
fn splice(route: &Route, src: Point, dest: Point) -> Route {
    let mut waypoints = route.waypoints().to_vec();
    insert_stop(&mut waypoints, src);
    insert_stop(&mut waypoints, dest);
    Route::from(waypoints)
}

fn insert_stop(waypoints: &mut Vec<Point>, stop: Point) {
    if waypoints.contains(&stop) {
        return;
    }
    let at = waypoints
        .iter()
        .position(|wp| wp.x >= stop.x && wp.y >= stop.y)
        .unwrap_or(waypoints.len());
    waypoints.insert(at, stop);
}

/// The contiguous stretch of the spliced route between the passenger's two
/// stops, endpoints included.
fn client_leg(route: &Route, src: Point, dest: Point) -> &[Point] {
    let waypoints = route.waypoints();
    let src_at = waypoints.iter().position(|wp| *wp == src);
    let dest_at = waypoints.iter().position(|wp| *wp == dest);
    match (src_at, dest_at) {
        (Some(a), Some(b)) => {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            &waypoints[lo..=hi]
        }
        _ => waypoints,
    }
}

#[cfg(test)]
mod tests {
    use cits_testutils::report::fleet_report;

    use super::*;

    fn bus(obu: u32, waypoints: &[(i64, i64)]) -> FleetReport {
        fleet_report(obu, 1, waypoints, None)
    }

    fn request(src: (i64, i64), dest: (i64, i64), max_arrival: u64) -> BusRequest {
        BusRequest {
            src: Point::new(src.0, src.1),
            dest: Point::new(dest.0, dest.1),
            max_arrival: TimeS::new(max_arrival),
            request_id: 1,
        }
    }

    #[test]
    fn empty_fleet_yields_no_match() {
        let dispatcher = Dispatcher::default();
        assert!(dispatcher
            .choose_bus(&[], &request((1, 0), (3, 0), 1000))
            .is_none());
    }

    #[test]
    fn feasible_bus_is_matched_with_spliced_route() {
        let dispatcher = Dispatcher::default();
        let fleet = vec![bus(9, &[(0, 0), (4, 0)])];
        let assignment = dispatcher
            .choose_bus(&fleet, &request((1, 0), (3, 0), 1000))
            .expect("expected a match");
        assert_eq!(assignment.bus_id, NodeId::from(9));
        assert_eq!(
            assignment.route.waypoints(),
            &[
                Point::new(0, 0),
                Point::new(1, 0),
                Point::new(3, 0),
                Point::new(4, 0)
            ]
        );
        assert!(assignment.estimated_arrival <= TimeS::new(1000));
    }

    #[test]
    fn deadline_too_tight_yields_no_match() {
        let dispatcher = Dispatcher::default();
        let fleet = vec![bus(9, &[(0, 0), (4, 0)])];
        assert!(dispatcher
            .choose_bus(&fleet, &request((1, 0), (3, 0), 1))
            .is_none());
    }

    #[test]
    fn result_is_deterministic() {
        let dispatcher = Dispatcher::default();
        let fleet = vec![bus(9, &[(0, 0), (4, 0)]), bus(11, &[(0, 0), (8, 8)])];
        let req = request((1, 0), (3, 0), 1000);
        let first = dispatcher.choose_bus(&fleet, &req);
        for _ in 0..10 {
            assert_eq!(dispatcher.choose_bus(&fleet, &req), first);
        }
    }

    #[test]
    fn last_candidate_is_not_skipped() {
        let dispatcher = Dispatcher::default();
        // Only the final fleet entry is feasible.
        let fleet = vec![
            bus(2, &[(100, 100), (120, 120)]),
            bus(3, &[(50, 50)]),
            bus(9, &[(0, 0), (4, 0)]),
        ];
        let assignment = dispatcher
            .choose_bus(&fleet, &request((1, 0), (3, 0), 1000))
            .expect("expected the last candidate to match");
        assert_eq!(assignment.bus_id, NodeId::from(9));
    }

    #[test]
    fn bus_heading_away_is_rejected() {
        let dispatcher = Dispatcher::default();
        // Bus runs east-to-west, the passenger wants to go west-to-east.
        let fleet = vec![bus(9, &[(4, 0), (0, 0)])];
        assert!(dispatcher
            .choose_bus(&fleet, &request((1, 0), (3, 0), 1000))
            .is_none());
    }

    #[test]
    fn single_waypoint_route_is_filtered_out() {
        let dispatcher = Dispatcher::default();
        let fleet = vec![bus(9, &[(2, 0)])];
        assert!(dispatcher
            .choose_bus(&fleet, &request((2, 0), (2, 0), 1000))
            .is_none());
    }

    #[test]
    fn splice_is_idempotent() {
        let route = Route::new(vec![Point::new(0, 0), Point::new(4, 0)]);
        let src = Point::new(1, 0);
        let dest = Point::new(3, 0);
        let once = splice(&route, src, dest);
        let twice = splice(&once, src, dest);
        assert_eq!(once, twice);
        assert_eq!(once.len(), 4);
    }

    #[test]
    fn stop_beyond_all_waypoints_is_appended() {
        let mut waypoints = vec![Point::new(0, 0), Point::new(2, 0)];
        insert_stop(&mut waypoints, Point::new(5, 0));
        assert_eq!(waypoints.last(), Some(&Point::new(5, 0)));
    }

    #[test]
    fn dwell_time_counts_intermediate_stops() {
        let dispatcher = Dispatcher::default();
        // Client leg (0,0) -> (2,0) -> (4,0): one intermediate stop.
        let with_stop = vec![bus(9, &[(0, 0), (2, 0), (4, 0)])];
        let direct = vec![bus(9, &[(0, 0), (4, 0)])];
        let req = request((0, 0), (4, 0), 10_000);
        let slower = dispatcher.choose_bus(&with_stop, &req).unwrap();
        let faster = dispatcher.choose_bus(&direct, &req).unwrap();
        assert!(slower.estimated_arrival > faster.estimated_arrival);
    }
}
