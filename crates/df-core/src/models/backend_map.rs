use serde::{Deserialize, Serialize};

/// One named network-facing process within a box, as recorded in the layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceDescriptor {
    pub id: String,
    pub name: String,
    pub description: String,
    pub proxy: String,
}

/// A deployable group of services, one compose unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoxDescriptor {
    pub id: String,
    pub name: String,
    pub services: Vec<ServiceDescriptor>,
}

/// One concrete endpoint of one service in one running replica.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceInstance {
    pub box_id: String,
    pub service_id: String,
    /// Endpoint as `"host:port"`.
    pub host: String,
}

impl ServiceInstance {
    /// The host component of the endpoint.
    pub fn host_part(&self) -> &str {
        self.host.split(':').next().unwrap_or(&self.host)
    }

    /// The port component of the endpoint, if it parses.
    pub fn port_part(&self) -> Option<u16> {
        self.host.split(':').nth(1)?.parse().ok()
    }
}

/// One full running replica of all boxes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Instance {
    /// String-encoded monotonic integer.
    pub id: String,
    pub services: Vec<ServiceInstance>,
}

/// The persisted root state: logical layout plus live instances.
///
/// This is the contract with the load balancer and with subsequent runs;
/// field names and order are part of the on-disk format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackendMap {
    pub lb_endpoint: String,
    pub layout: Vec<BoxDescriptor>,
    pub backends: Vec<Instance>,
}

impl BackendMap {
    /// A fresh map with no live instances.
    pub fn new(lb_endpoint: String, layout: Vec<BoxDescriptor>) -> Self {
        Self {
            lb_endpoint,
            layout,
            backends: Vec::new(),
        }
    }

    /// Highest numeric instance id currently allocated, 0 when none exist.
    pub fn max_instance_id(&self) -> u64 {
        self.backends
            .iter()
            .filter_map(|instance| instance.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0)
    }
}
