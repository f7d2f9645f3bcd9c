//! Hostname extraction from an INI-style inventory file.
//!
//! Only the host names matter here; group structure and per-host variables
//! belong to the executor. Hosts keep first-seen order, which the balancer
//! relies on for stable tie-breaking.

use std::path::Path;

use crate::error::Result;

/// Hosts from the inventory file, or the synthetic `localhost` when no
/// inventory is configured or it lists no hosts.
pub fn load_hostnames(path: Option<&Path>) -> Result<Vec<String>> {
    let Some(path) = path else {
        return Ok(vec!["localhost".to_string()]);
    };
    let contents = std::fs::read_to_string(path)?;
    let hosts = parse_hostnames(&contents);
    if hosts.is_empty() {
        return Ok(vec!["localhost".to_string()]);
    }
    Ok(hosts)
}

fn parse_hostnames(contents: &str) -> Vec<String> {
    let mut hosts = Vec::new();
    for raw_line in contents.lines() {
        let line = raw_line.split(['#', ';']).next().unwrap_or("").trim();
        if line.is_empty() || line.starts_with('[') {
            continue;
        }
        let Some(name) = line.split_whitespace().next() else {
            continue;
        };
        // Lines like `ansible_user=deploy` are variables, not hosts.
        if name.contains('=') {
            continue;
        }
        if !hosts.iter().any(|h| h == name) {
            hosts.push(name.to_string());
        }
    }
    hosts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_inventory_defaults_to_localhost() {
        assert_eq!(load_hostnames(None).unwrap(), ["localhost"]);
    }

    #[test]
    fn parses_hosts_in_first_seen_order() {
        let contents = "\
[web]
node-a ansible_user=deploy
node-b

[db]
node-c
node-a
";
        assert_eq!(parse_hostnames(contents), ["node-a", "node-b", "node-c"]);
    }

    #[test]
    fn skips_comments_and_variable_lines() {
        let contents = "\
# fleet hosts
node-a  # primary
; legacy comment style
ansible_port=2222
node-b
";
        assert_eq!(parse_hostnames(contents), ["node-a", "node-b"]);
    }

    #[test]
    fn empty_inventory_file_defaults_to_localhost() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hosts.ini");
        std::fs::write(&path, "# nothing here\n").unwrap();
        assert_eq!(load_hostnames(Some(&path)).unwrap(), ["localhost"]);
    }
}
