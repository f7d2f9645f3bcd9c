//! Load-aware host placement from inventory and existing instances.

use tracing::warn;

use crate::error::{DeployError, Result};
use crate::models::Instance;

/// Loopback endpoints are placement placeholders, not real inventory
/// members, and never count toward a host's load.
pub const LOOPBACK_PLACEHOLDER: &str = "127.0.0.1";

/// Pick the host carrying the fewest service instances. Ties go to the
/// host supplied earliest, so placement is stable for a given inventory
/// order. An empty inventory collapses to the synthetic host `localhost`.
pub fn choose(hosts: &[String], backends: &[Instance], ignored_host: &str) -> String {
    if hosts.is_empty() {
        return "localhost".to_string();
    }

    let mut counts = vec![0usize; hosts.len()];
    let mut strays: Vec<&str> = Vec::new();
    for instance in backends {
        for service in &instance.services {
            let endpoint_host = service.host_part();
            if endpoint_host == ignored_host {
                continue;
            }
            match hosts.iter().position(|h| h == endpoint_host) {
                Some(index) => counts[index] += 1,
                None => {
                    if !strays.contains(&endpoint_host) {
                        warn!(host = endpoint_host, "endpoint host not in inventory");
                        strays.push(endpoint_host);
                    }
                }
            }
        }
    }

    let mut best = 0;
    for (index, count) in counts.iter().enumerate() {
        if *count < counts[best] {
            best = index;
        }
    }
    hosts[best].clone()
}

/// The single host an instance lives on. More than one distinct host is an
/// inconsistency and is reported, never collapsed to one value. No
/// endpoints at all resolves to `localhost`.
pub fn instance_host(instance: &Instance) -> Result<String> {
    let mut hosts: Vec<&str> = Vec::new();
    for service in &instance.services {
        let host = service.host_part();
        if !hosts.contains(&host) {
            hosts.push(host);
        }
    }
    match hosts.as_slice() {
        [] => Ok("localhost".to_string()),
        [host] => Ok((*host).to_string()),
        _ => Err(DeployError::Inconsistency {
            instance: instance.id.clone(),
            hosts: hosts.iter().map(|h| h.to_string()).collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ServiceInstance;

    fn instance_on(id: &str, endpoints: &[&str]) -> Instance {
        Instance {
            id: id.into(),
            services: endpoints
                .iter()
                .map(|endpoint| ServiceInstance {
                    box_id: "web".into(),
                    service_id: "http".into(),
                    host: (*endpoint).to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn empty_inventory_defaults_to_localhost() {
        assert_eq!(choose(&[], &[], LOOPBACK_PLACEHOLDER), "localhost");
    }

    #[test]
    fn fresh_inventory_ties_break_by_supplied_order() {
        let hosts = vec!["a".to_string(), "b".to_string()];
        assert_eq!(choose(&hosts, &[], LOOPBACK_PLACEHOLDER), "a");
    }

    #[test]
    fn least_loaded_host_wins() {
        let hosts = vec!["a".to_string(), "b".to_string()];
        let backends = vec![instance_on("1", &["a:8000", "a:8001"])];
        assert_eq!(choose(&hosts, &backends, LOOPBACK_PLACEHOLDER), "b");
    }

    #[test]
    fn loopback_endpoints_do_not_count() {
        let hosts = vec!["127.0.0.1".to_string(), "b".to_string()];
        let backends = vec![instance_on("1", &["127.0.0.1:8000"])];
        // The loopback placeholder carries no load, so insertion order wins.
        assert_eq!(choose(&hosts, &backends, LOOPBACK_PLACEHOLDER), "127.0.0.1");
    }

    #[test]
    fn stray_hosts_carry_no_load() {
        let hosts = vec!["a".to_string(), "b".to_string()];
        // Endpoints on a host missing from inventory are ignored by the
        // counts, so placement still starts from the front of the list.
        let backends = vec![
            instance_on("1", &["gone:8000", "gone:8001"]),
            instance_on("2", &["gone:8002"]),
        ];
        assert_eq!(choose(&hosts, &backends, LOOPBACK_PLACEHOLDER), "a");
    }

    #[test]
    fn instance_host_resolves_single_host() {
        let instance = instance_on("1", &["a:8000", "a:8001"]);
        assert_eq!(instance_host(&instance).unwrap(), "a");
    }

    #[test]
    fn instance_host_defaults_to_localhost_when_empty() {
        let instance = instance_on("1", &[]);
        assert_eq!(instance_host(&instance).unwrap(), "localhost");
    }

    #[test]
    fn multi_host_instance_is_an_error() {
        let instance = instance_on("1", &["a:8000", "b:8001"]);
        assert!(matches!(
            instance_host(&instance),
            Err(DeployError::Inconsistency { .. })
        ));
    }
}
