use std::io;
use std::path::Path;
use std::sync::Arc;

use log::info;

use cits_core::cell::{state_cell, StateReader};
use cits_core::mobility::{Position, Route, VehicleDynamics};
use cits_core::node::NodeInfo;
use cits_core::pipeline::{mailbox, WorkerSet};
use cits_core::time::TimeS;
use cits_core::transport::Transport;
use cits_models::dispatch::Dispatcher;
use cits_models::fleet::{self, FleetTable, SharedFleet};
use cits_models::geonet::DenControl;
use cits_models::kinematics::DeadReckoning;

use crate::logger;
use crate::node::config::{NodeConfig, NodeConfigReader};
use crate::stack::application::{ApplicationRx, ApplicationTx, Business, FleetPrune};
use crate::stack::facilities::{CaServiceRx, CaServiceTx, DenServiceRx, DenServiceTx};
use crate::stack::link::{LinkRx, LinkTx};
use crate::stack::network::{BeaconRx, BeaconTx, GeonetRx, GeonetTx};
use crate::stack::vehicle::{Locator, Motor};
use crate::transport::UdpMulticastTransport;

const WORKER_COUNT: usize = 16;

/// Prepares one emulated node from its TOML settings file.
pub struct NodeBuilder {
    config: NodeConfig,
    config_path: String,
}

impl NodeBuilder {
    pub fn new(config_file: &str) -> Self {
        if !Path::new(config_file).exists() {
            panic!("Configuration file is not found at {}", config_file);
        }
        let config = NodeConfigReader::new(config_file)
            .parse()
            .unwrap_or_else(|e| panic!("Error while parsing the configuration file: {}", e));
        let config_path = Path::new(config_file)
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_string_lossy()
            .into_owned();
        Self {
            config,
            config_path,
        }
    }

    /// Initializes logging, joins the multicast medium and brings up the
    /// whole worker stack, still parked on the start barrier.
    pub fn build(self) -> NodeHandle {
        logger::initiate_logger(Path::new(&self.config_path), &self.config.log_settings);
        let transport = UdpMulticastTransport::open(&self.config.transport_settings)
            .unwrap_or_else(|e| panic!("Error while joining the multicast group: {}", e));
        assemble(self.config, Arc::new(transport))
            .unwrap_or_else(|e| panic!("Error while spawning the node workers: {}", e))
    }
}

/// Wires the mailboxes, state cells and workers of one node over the given
/// medium. Split from [NodeBuilder] so tests can substitute the transport.
pub fn assemble(config: NodeConfig, transport: Arc<dyn Transport>) -> io::Result<NodeHandle> {
    let settings = &config.node_settings;
    let node = NodeInfo {
        id: settings.id,
        role: settings.role,
    };
    info!("Bringing up the stack of {}", node);

    let (position_writer, position) =
        state_cell(Position::new(settings.initial_point(), TimeS::now()));
    let (dynamics_writer, dynamics) = state_cell(settings.initial_dynamics());
    let (route_writer, route) = state_cell(settings.initial_route());

    let fleet = fleet::shared(FleetTable::new(settings.id));
    let dispatcher = Dispatcher::new(config.dispatch_settings.clone());
    let den_control = DenControl::new();

    let (beacon_out, beacon_in) = mailbox();
    let (data_out, data_in) = mailbox();
    let (frame_out, frame_in) = mailbox();
    let (service_out, service_in) = mailbox();
    let (ca_out, ca_in) = mailbox();
    let (den_out, den_in) = mailbox();
    let (indication_out, indication_in) = mailbox();
    let (business_out, business_in) = mailbox();
    let (business_event_out, business_event_in) = mailbox();
    let (den_event_out, den_event_in) = mailbox();
    let (ca_trigger_out, ca_trigger_in) = mailbox();
    let (motor_out, motor_in) = mailbox();

    let link_rx = LinkRx::builder()
        .transport(Arc::clone(&transport))
        .beacon_out(beacon_out)
        .data_out(data_out)
        .build();
    let link_tx = LinkTx::builder()
        .transport(Arc::clone(&transport))
        .frames(frame_in)
        .build();
    let beacon_tx = BeaconTx::builder()
        .node(settings.id)
        .interval(config.stack_settings.beacon_interval)
        .position(position.clone())
        .link_out(frame_out.clone())
        .build();
    let beacon_rx = BeaconRx::builder()
        .node(settings.id)
        .ingress(beacon_in)
        .build();
    let geonet_tx = GeonetTx::builder()
        .egress(service_in)
        .link_out(frame_out.clone())
        .hop_limit(config.den_settings.hop_limit)
        .roi_radius(config.den_settings.roi_radius)
        .build();
    let geonet_rx = GeonetRx::builder()
        .control(den_control)
        .position(position.clone())
        .ingress(data_in)
        .ca_out(ca_out)
        .den_out(den_out)
        .link_out(frame_out)
        .build();
    let ca_service_tx = CaServiceTx::builder()
        .node(node)
        .position(position.clone())
        .dynamics(dynamics.clone())
        .route(route.clone())
        .fleet(Arc::clone(&fleet))
        .trigger(ca_trigger_in)
        .egress(service_out.clone())
        .build();
    let ca_service_rx = CaServiceRx::builder()
        .ingress(ca_in)
        .indications(indication_out.clone())
        .build();
    let den_service_tx = DenServiceTx::builder()
        .node(node)
        .position(position.clone())
        .events(den_event_in)
        .egress(service_out)
        .build();
    let den_service_rx = DenServiceRx::builder()
        .ingress(den_in)
        .indications(indication_out)
        .build();
    let application_tx = ApplicationTx::builder()
        .node(node)
        .warmup(config.stack_settings.warmup)
        .ca_interval(config.stack_settings.ca_interval)
        .scripted_request(
            config
                .stack_settings
                .request
                .as_ref()
                .map(|r| r.to_request()),
        )
        .ca_trigger(ca_trigger_out)
        .den_events(den_event_out)
        .business_events(business_event_in)
        .build();
    let application_rx = ApplicationRx::builder()
        .indications(indication_in)
        .business_out(business_out)
        .build();
    let business = Business::builder()
        .node(node)
        .dispatcher(dispatcher)
        .fleet(Arc::clone(&fleet))
        .safety(config.safety_settings)
        .position(position.clone())
        .route(route_writer)
        .indications(business_in)
        .events_out(business_event_out)
        .motor_out(motor_out)
        .build();
    let fleet_prune = FleetPrune::builder()
        .fleet(Arc::clone(&fleet))
        .interval(config.stack_settings.prune_interval)
        .build();
    let motor = Motor::builder()
        .dynamics(dynamics_writer)
        .commands(motor_in)
        .build();
    let locator = Locator::builder()
        .model(DeadReckoning::default())
        .interval(config.stack_settings.location_interval)
        .position(position_writer)
        .dynamics(dynamics.clone())
        .build();

    let mut workers = WorkerSet::new(WORKER_COUNT);
    workers.spawn("link_rx", move || link_rx.run())?;
    workers.spawn("link_tx", move || link_tx.run())?;
    workers.spawn("beacon_tx", move || beacon_tx.run())?;
    workers.spawn("beacon_rx", move || beacon_rx.run())?;
    workers.spawn("geonet_tx", move || geonet_tx.run())?;
    workers.spawn("geonet_rx", move || geonet_rx.run())?;
    workers.spawn("ca_service_tx", move || ca_service_tx.run())?;
    workers.spawn("ca_service_rx", move || ca_service_rx.run())?;
    workers.spawn("den_service_tx", move || den_service_tx.run())?;
    workers.spawn("den_service_rx", move || den_service_rx.run())?;
    workers.spawn("application_tx", move || application_tx.run())?;
    workers.spawn("application_rx", move || application_rx.run())?;
    workers.spawn("business", move || business.run())?;
    workers.spawn("fleet_prune", move || fleet_prune.run())?;
    workers.spawn("motor", move || motor.run())?;
    workers.spawn("locator", move || locator.run())?;

    Ok(NodeHandle {
        info: node,
        workers,
        fleet,
        position,
        dynamics,
        route,
    })
}

/// A fully wired node, parked on the start barrier until [NodeHandle::start].
pub struct NodeHandle {
    info: NodeInfo,
    workers: WorkerSet,
    fleet: SharedFleet,
    position: StateReader<Position>,
    dynamics: StateReader<VehicleDynamics>,
    route: StateReader<Route>,
}

impl NodeHandle {
    pub fn info(&self) -> NodeInfo {
        self.info
    }

    /// Releases all workers past the start barrier in one step.
    pub fn start(&self) {
        info!(
            "Releasing {} workers of {}",
            self.workers.worker_count(),
            self.info
        );
        self.workers.release();
    }

    /// Blocks until the stack winds down.
    pub fn join(self) {
        self.workers.join();
    }

    pub fn fleet(&self) -> SharedFleet {
        Arc::clone(&self.fleet)
    }

    pub fn position(&self) -> StateReader<Position> {
        self.position.clone()
    }

    pub fn dynamics(&self) -> StateReader<VehicleDynamics> {
        self.dynamics.clone()
    }

    pub fn route(&self) -> StateReader<Route> {
        self.route.clone()
    }
}
