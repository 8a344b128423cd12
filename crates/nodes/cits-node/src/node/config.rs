use std::path::PathBuf;

use serde::Deserialize;

use cits_core::message::BusRequest;
use cits_core::mobility::{Direction, Heading, Point, Route, VehicleDynamics};
use cits_core::node::{NodeId, NodeRole};
use cits_core::time::TimeS;
use cits_models::dispatch::DispatchSettings;
use cits_models::geonet::DenSettings;

use crate::logger::LogSettings;
use crate::stack::application::SafetySettings;

#[derive(Deserialize, Debug, Clone)]
pub struct NodeConfig {
    pub node_settings: NodeSettings,
    #[serde(default)]
    pub stack_settings: StackSettings,
    #[serde(default)]
    pub transport_settings: TransportSettings,
    #[serde(default)]
    pub dispatch_settings: DispatchSettings,
    #[serde(default)]
    pub den_settings: DenSettings,
    #[serde(default)]
    pub safety_settings: SafetySettings,
    pub log_settings: LogSettings,
}

#[derive(Deserialize, Debug, Clone)]
pub struct NodeSettings {
    pub id: NodeId,
    pub role: NodeRole,
    pub position: [i64; 2],
    #[serde(default)]
    pub speed: u32,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub heading: Heading,
    /// One of the preset circulation routes, e.g. "C1" or "C2".
    pub route_id: Option<String>,
    /// Explicit waypoints; takes precedence over `route_id`.
    pub waypoints: Option<Vec<[i64; 2]>>,
}

impl NodeSettings {
    pub fn initial_point(&self) -> Point {
        Point::from(self.position)
    }

    pub fn initial_dynamics(&self) -> VehicleDynamics {
        VehicleDynamics {
            speed: self.speed,
            direction: self.direction,
            heading: self.heading,
            status: Default::default(),
        }
    }

    pub fn initial_route(&self) -> Route {
        if let Some(waypoints) = &self.waypoints {
            return waypoints.iter().map(|&wp| Point::from(wp)).collect();
        }
        match self.route_id.as_deref() {
            Some(name) => named_route(name)
                .unwrap_or_else(|| panic!("Unknown route id {}, expected C1 or C2", name)),
            None => Route::default(),
        }
    }
}

fn named_route(name: &str) -> Option<Route> {
    match name {
        "C1" => Some(Route::new(vec![Point::new(0, 0), Point::new(4, 0)])),
        "C2" => Some(Route::new(vec![Point::new(3, 0), Point::new(0, 0)])),
        _ => None,
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct StackSettings {
    /// Delay before the application starts generating traffic, giving the
    /// neighborhood time to come up.
    #[serde(default = "default_warmup")]
    pub warmup: TimeS,
    #[serde(default = "default_ca_interval")]
    pub ca_interval: TimeS,
    #[serde(default = "default_beacon_interval")]
    pub beacon_interval: TimeS,
    #[serde(default = "default_prune_interval")]
    pub prune_interval: TimeS,
    #[serde(default = "default_location_interval")]
    pub location_interval: TimeS,
    /// Scripted passenger request issued once after warm-up, in place of
    /// the reference implementation's interactive prompts.
    pub request: Option<RequestSettings>,
}

fn default_warmup() -> TimeS {
    TimeS::new(10)
}

fn default_ca_interval() -> TimeS {
    TimeS::new(1)
}

fn default_beacon_interval() -> TimeS {
    TimeS::new(1)
}

fn default_prune_interval() -> TimeS {
    TimeS::new(1)
}

fn default_location_interval() -> TimeS {
    TimeS::new(1)
}

impl Default for StackSettings {
    fn default() -> Self {
        Self {
            warmup: default_warmup(),
            ca_interval: default_ca_interval(),
            beacon_interval: default_beacon_interval(),
            prune_interval: default_prune_interval(),
            location_interval: default_location_interval(),
            request: None,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct RequestSettings {
    pub src: [i64; 2],
    pub dest: [i64; 2],
    pub max_arrival_secs: u64,
    #[serde(default = "default_request_id")]
    pub request_id: u64,
}

fn default_request_id() -> u64 {
    1
}

impl RequestSettings {
    pub fn to_request(&self) -> BusRequest {
        BusRequest {
            src: Point::from(self.src),
            dest: Point::from(self.dest),
            max_arrival: TimeS::new(self.max_arrival_secs),
            request_id: self.request_id,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct TransportSettings {
    #[serde(default = "default_group")]
    pub group: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_group() -> String {
    "239.0.0.77".to_owned()
}

fn default_port() -> u16 {
    47_001
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            group: default_group(),
            port: default_port(),
        }
    }
}

pub struct NodeConfigReader {
    file_path: PathBuf,
}

impl NodeConfigReader {
    pub fn new(file_name: &str) -> Self {
        let file_path = PathBuf::from(file_name);
        Self { file_path }
    }

    pub fn parse(&self) -> Result<NodeConfig, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(&self.file_path)?;
        let config: NodeConfig = toml::from_str(&contents)?;
        Ok(config)
    }
}
