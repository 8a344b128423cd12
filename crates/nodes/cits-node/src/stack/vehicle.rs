use std::thread;

use log::{debug, info};
use typed_builder::TypedBuilder;

use cits_core::cell::{StateReader, StateWriter};
use cits_core::mobility::{Direction, Position, PowerStatus, VehicleDynamics};
use cits_core::pipeline::Inbox;
use cits_core::time::TimeS;
use cits_models::kinematics::DeadReckoning;

/// Commands the business worker issues to the drivetrain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MotorCommand {
    EnterVehicle,
    PowerOn,
    MoveForward,
    MoveSlower,
    Stop,
    TestDrive,
}

/// Emulated drivetrain. Sole writer of the vehicle dynamics cell; commands
/// arrive from the business worker and each one is folded into a fresh
/// dynamics snapshot.
#[derive(TypedBuilder)]
pub struct Motor {
    dynamics: StateWriter<VehicleDynamics>,
    commands: Inbox<MotorCommand>,
    #[builder(default = 40)]
    cruise_speed: u32,
}

impl Motor {
    pub fn run(self) {
        let mut current = self.dynamics.load();
        for command in self.commands.iter() {
            match command {
                MotorCommand::EnterVehicle => {
                    debug!("Driver on board");
                }
                MotorCommand::PowerOn => {
                    current.status = PowerStatus::On;
                    info!("Motor powered on");
                }
                MotorCommand::MoveForward => {
                    current.direction = Direction::Forward;
                    current.speed = self.cruise_speed;
                    info!("Moving forward at {}", current.speed);
                }
                MotorCommand::MoveSlower => {
                    current.speed /= 2;
                    info!("Slowing down to {}", current.speed);
                }
                MotorCommand::Stop => {
                    current.direction = Direction::Halted;
                    current.speed = 0;
                    info!("Full stop");
                }
                MotorCommand::TestDrive => {
                    current.status = PowerStatus::On;
                    current.direction = Direction::Forward;
                    current.speed = self.cruise_speed;
                    info!("Test drive at {}", current.speed);
                }
            }
            self.dynamics.store(current);
        }
    }
}

/// Emulated positioning unit. Sole writer of the position cell; advances
/// the fix by dead reckoning from the current dynamics.
#[derive(TypedBuilder)]
pub struct Locator {
    model: DeadReckoning,
    interval: TimeS,
    position: StateWriter<Position>,
    dynamics: StateReader<VehicleDynamics>,
}

impl Locator {
    pub fn run(self) {
        loop {
            thread::sleep(self.interval.to_duration());
            let dynamics = self.dynamics.snapshot();
            if dynamics.status == PowerStatus::Off {
                continue;
            }
            let current = self.position.load();
            let next = self.model.advance(current, &dynamics, TimeS::now());
            if next.point != current.point {
                debug!("Position fix {} at {}", next.point, next.t);
            }
            self.position.store(next);
        }
    }
}
