pub mod backend_map;
pub mod config;
pub mod plan;

pub use backend_map::{BackendMap, BoxDescriptor, Instance, ServiceDescriptor, ServiceInstance};
pub use config::{BoxSpec, FleetConfig, HookCommand, OutputConfig, ServiceSpec};
pub use plan::{Play, Playbook, Task};
