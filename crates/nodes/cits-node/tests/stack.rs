use std::sync::Arc;
use std::thread;
use std::time::Duration;

use cits_core::mobility::{Direction, Heading};
use cits_core::node::{NodeId, NodeRole};
use cits_core::time::TimeS;
use cits_models::fleet;
use cits_node::logger::LogSettings;
use cits_node::node::builder::{assemble, NodeHandle};
use cits_node::node::config::{NodeConfig, NodeSettings, RequestSettings, StackSettings};
use cits_testutils::report::route;
use cits_testutils::transport::LoopbackHub;

fn node_config(
    id: u32,
    role: NodeRole,
    position: [i64; 2],
    route_id: Option<&str>,
    warmup: u64,
    request: Option<RequestSettings>,
) -> NodeConfig {
    NodeConfig {
        node_settings: NodeSettings {
            id: NodeId::from(id),
            role,
            position,
            speed: 0,
            direction: Direction::default(),
            heading: Heading::default(),
            route_id: route_id.map(str::to_owned),
            waypoints: None,
        },
        stack_settings: StackSettings {
            warmup: TimeS::new(warmup),
            request,
            ..Default::default()
        },
        transport_settings: Default::default(),
        dispatch_settings: Default::default(),
        den_settings: Default::default(),
        safety_settings: Default::default(),
        log_settings: LogSettings {
            log_path: ".".to_owned(),
            log_level: "info".to_owned(),
            log_file_name: "test.log".to_owned(),
            log_overwrite: true,
        },
    }
}

fn bring_up(hub: &LoopbackHub, config: NodeConfig) -> NodeHandle {
    let node = assemble(config, Arc::new(hub.endpoint())).expect("stack must come up");
    node.start();
    node
}

fn passenger_request() -> RequestSettings {
    RequestSettings {
        src: [1, 0],
        dest: [2, 0],
        max_arrival_secs: 1000,
        request_id: 7,
    }
}

#[test]
fn obu_awareness_populates_rsu_fleet() {
    let hub = LoopbackHub::new();
    let rsu = bring_up(&hub, node_config(1, NodeRole::Rsu, [50, 50], None, 0, None));
    let _bus = bring_up(&hub, node_config(2, NodeRole::Obu, [0, 0], Some("C1"), 0, None));

    thread::sleep(Duration::from_secs(3));

    let table = rsu.fleet();
    let table = fleet::lock(&table);
    let entry = table.get(&NodeId::from(2)).expect("bus must be tracked");
    assert_eq!(entry.originating_rsu, NodeId::from(1));
    assert_eq!(entry.route, route(&[(0, 0), (4, 0)]));
}

#[test]
fn request_round_trip_assigns_route_to_the_bus() {
    let hub = LoopbackHub::new();
    let _rsu = bring_up(&hub, node_config(1, NodeRole::Rsu, [50, 50], None, 0, None));
    let bus = bring_up(&hub, node_config(2, NodeRole::Obu, [0, 0], Some("C1"), 0, None));
    // Close enough to the RSU for the request's region of interest, far
    // enough from the bus to stay clear of the safety distances.
    let _passenger = bring_up(
        &hub,
        node_config(
            3,
            NodeRole::Obu,
            [60, 50],
            None,
            2,
            Some(passenger_request()),
        ),
    );

    thread::sleep(Duration::from_secs(5));

    // The assigned route is the bus route with the passenger stops spliced
    // into travel order.
    let adopted = bus.route().snapshot();
    assert_eq!(adopted, route(&[(0, 0), (1, 0), (2, 0), (4, 0)]));
}

#[test]
fn den_from_own_role_is_ignored() {
    let hub = LoopbackHub::new();
    // The request comes from an RSU, so the receiving RSU must suppress it
    // even though a feasible bus is in its fleet.
    let _requesting_rsu = bring_up(
        &hub,
        node_config(1, NodeRole::Rsu, [50, 50], None, 2, Some(passenger_request())),
    );
    let _other_rsu = bring_up(&hub, node_config(4, NodeRole::Rsu, [60, 60], None, 0, None));
    let bus = bring_up(&hub, node_config(2, NodeRole::Obu, [0, 0], Some("C1"), 0, None));

    thread::sleep(Duration::from_secs(5));

    let unchanged = bus.route().snapshot();
    assert_eq!(unchanged, route(&[(0, 0), (4, 0)]));
}
