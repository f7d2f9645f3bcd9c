use serde::Deserialize;

/// Declared topology plus output settings, loaded from the operator's
/// config file. The layout minted from `boxes` on first run is the identity
/// source of truth afterwards.
#[derive(Debug, Clone, Deserialize)]
pub struct FleetConfig {
    pub version: u32,
    pub output: OutputConfig,
    /// Local directory holding the compose template tree.
    pub target: String,
    pub lb_endpoint: String,
    #[serde(default)]
    pub launch_command: Option<HookCommand>,
    #[serde(default)]
    pub stop_command: Option<HookCommand>,
    pub boxes: Vec<BoxSpec>,
    /// Path to an inventory file listing deploy hosts.
    #[serde(default)]
    pub inventory: Option<String>,
    /// Registry URL for image substitution, applied by an external tool.
    #[serde(default)]
    pub registry: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Where the backend map is persisted.
    pub backend_map: String,
    pub min_port: u16,
    pub max_port: u16,
    pub interface_ip: String,
}

/// A shell command with the directory to run it from.
#[derive(Debug, Clone, Deserialize)]
pub struct HookCommand {
    pub command: String,
    pub context: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BoxSpec {
    pub name: String,
    pub services: Vec<ServiceSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceSpec {
    pub name: String,
    pub description: String,
    /// Container-side port the service listens on.
    pub port: u16,
    pub protocol: String,
}
