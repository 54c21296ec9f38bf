pub mod actuator;
pub mod config;
pub mod control_loop;
pub mod flight_controller;
pub mod host;
pub mod ingestor;
pub mod log;
pub mod mixer;
pub mod mock;
pub mod pid;
pub mod state;
pub mod telemetry;
pub mod types;

pub use control_loop::Phase;
pub use flight_controller::FlightController;
