use std::path::Path;

use crate::error::{DeployError, Result};
use crate::models::FleetConfig;

pub fn load(path: &Path) -> Result<FleetConfig> {
    if !path.exists() {
        return Err(DeployError::ConfigNotFound(path.to_path_buf()));
    }
    let contents = std::fs::read_to_string(path)?;
    let config: FleetConfig =
        serde_yaml::from_str(&contents).map_err(|e| DeployError::InvalidConfig(e.to_string()))?;
    if config.boxes.is_empty() {
        return Err(DeployError::InvalidConfig(
            "at least one box is required".into(),
        ));
    }
    if config.output.max_port < config.output.min_port {
        return Err(DeployError::InvalidConfig(format!(
            "max_port {} is below min_port {}",
            config.output.max_port, config.output.min_port
        )));
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const FULL_CONFIG: &str = r#"
version: 1
output:
  backend_map: backend_map.yml
  min_port: 8000
  max_port: 9000
  interface_ip: 0.0.0.0
target: docker
lb_endpoint: lb.internal:80
launch_command:
  command: systemctl reload haproxy
  context: /etc/haproxy
stop_command:
  command: systemctl stop haproxy
  context: /etc/haproxy
boxes:
  - name: web
    services:
      - name: http
        description: public http
        port: 80
        protocol: tcp
inventory: hosts.ini
registry: registry.internal:5000
"#;

    #[test]
    fn parse_full_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        fs::write(&path, FULL_CONFIG).unwrap();

        let config = load(&path).unwrap();
        assert_eq!(config.version, 1);
        assert_eq!(config.output.min_port, 8000);
        assert_eq!(config.lb_endpoint, "lb.internal:80");
        assert_eq!(config.boxes[0].services[0].port, 80);
        assert_eq!(config.inventory.as_deref(), Some("hosts.ini"));
        assert_eq!(config.registry.as_deref(), Some("registry.internal:5000"));
        assert_eq!(
            config.launch_command.unwrap().command,
            "systemctl reload haproxy"
        );
    }

    #[test]
    fn parse_minimal_config() {
        let yaml = r#"
version: 1
output:
  backend_map: backend_map.yml
  min_port: 8000
  max_port: 9000
  interface_ip: 0.0.0.0
target: docker
lb_endpoint: lb:80
boxes:
  - name: web
    services:
      - name: http
        description: d
        port: 80
        protocol: tcp
"#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        fs::write(&path, yaml).unwrap();

        let config = load(&path).unwrap();
        assert!(config.inventory.is_none());
        assert!(config.registry.is_none());
        assert!(config.launch_command.is_none());
    }

    #[test]
    fn missing_config_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load(&dir.path().join("config.yml")),
            Err(DeployError::ConfigNotFound(_))
        ));
    }

    #[test]
    fn inverted_port_range_is_invalid() {
        let yaml = FULL_CONFIG.replace("max_port: 9000", "max_port: 7000");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        fs::write(&path, yaml).unwrap();
        assert!(matches!(load(&path), Err(DeployError::InvalidConfig(_))));
    }
}
