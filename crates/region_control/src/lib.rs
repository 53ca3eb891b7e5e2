pub mod active_config;
pub mod catalog;
pub mod controller;
pub mod service;

pub use active_config::{ActiveConfig, ConfigStore};
pub use catalog::RegionCatalog;
pub use controller::{ControllerConfig, RegionController};
pub use service::{ServiceAction, ServiceError, ServiceManager, SystemctlManager};
