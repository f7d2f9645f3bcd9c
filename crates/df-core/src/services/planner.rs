//! The deployment planner: turns a command, the persisted backend map, and
//! the declared topology into an updated map plus an ordered list of
//! host-scoped plays for the external executor.
//!
//! Planning is synchronous and sequential. Each deploy iteration observes
//! every prior iteration of the same batch, so ID, port, and host
//! computations stay consistent without locking. Nothing here executes or
//! persists; the caller saves the map only after the whole batch plans
//! without error.

use tracing::{error, info};

use crate::error::Result;
use crate::models::{BackendMap, FleetConfig, Instance, Play, Task};
use crate::services::{balance, compose, ports};

pub struct Planner {
    /// Remote root under which per-instance directories live. Threaded in
    /// explicitly; the planner holds no ambient filesystem state.
    deploy_root: String,
    /// Remote path of the template tree copied for each instance.
    template_source: String,
    inventory: Vec<String>,
}

impl Planner {
    pub fn new(
        deploy_root: impl Into<String>,
        template_source: impl Into<String>,
        inventory: Vec<String>,
    ) -> Self {
        Self {
            deploy_root: deploy_root.into(),
            template_source: template_source.into(),
            inventory,
        }
    }

    fn instance_dir(&self, instance_id: &str) -> String {
        format!("{}/{}", self.deploy_root, instance_id)
    }

    /// The play that always precedes command-specific plays: make sure the
    /// deploy root exists on every inventory host.
    pub fn bootstrap_play(&self) -> Play {
        let hosts = if self.inventory.is_empty() {
            vec!["localhost".to_string()]
        } else {
            self.inventory.clone()
        };
        Play {
            name: "Init deploy root".into(),
            hosts,
            tasks: vec![Task::Mkdir {
                name: "Create deployment directory".into(),
                path: self.deploy_root.clone(),
            }],
        }
    }

    /// Plan `count` new instances. The whole batch's port budget is
    /// validated up front, before the first play is built.
    pub fn deploy(
        &self,
        count: u32,
        map: &mut BackendMap,
        config: &FleetConfig,
        template: &str,
    ) -> Result<Vec<Play>> {
        let band_width = ports::required_ports_per_instance(&config.boxes);
        let start_port = ports::next_start_port(map, config.output.min_port);
        ports::check_port_budget(start_port, count, band_width, config.output.max_port)?;

        info!(count, start_port, "planning deployment");

        let mut next_id = map.max_instance_id() + 1;
        let mut next_port = start_port;
        let mut plays = Vec::with_capacity(count as usize);

        for _ in 0..count {
            let host = balance::choose(
                &self.inventory,
                &map.backends,
                balance::LOOPBACK_PLACEHOLDER,
            );
            let interface = numeric_interface(&host);

            let (document, services) =
                compose::render(template, &map.layout, &config.boxes, interface, next_port)?;
            let instance = Instance {
                id: next_id.to_string(),
                services,
            };
            let dir = self.instance_dir(&instance.id);

            info!(instance = %instance.id, host = %host, "building deploy play");
            plays.push(Play {
                name: format!("Deploy Instance {}", instance.id),
                hosts: vec![host],
                tasks: vec![
                    Task::CopyTree {
                        name: "Copy template tree".into(),
                        src: self.template_source.clone(),
                        dest: dir.clone(),
                    },
                    Task::WriteFile {
                        name: "Write docker-compose.yml".into(),
                        path: format!("{dir}/docker-compose.yml"),
                        content: document,
                    },
                    self.start_task(&dir),
                ],
            });

            // Visible to the next iteration's host and port computation.
            map.backends.push(instance);
            next_id += 1;
            next_port += band_width;
        }

        Ok(plays)
    }

    /// Plan the teardown of one instance. A missing ID is a logged no-op;
    /// an instance spanning multiple hosts aborts planning.
    pub fn destroy(&self, target: &str, map: &mut BackendMap) -> Result<Vec<Play>> {
        let Some(index) = map.backends.iter().position(|i| i.id == target) else {
            error!(instance = target, "instance does not exist");
            return Ok(Vec::new());
        };
        let host = balance::instance_host(&map.backends[index])?;

        info!(instance = target, host = %host, "planning destruction");
        let play = Play {
            name: format!("Destroy Instance {target}"),
            hosts: vec![host],
            tasks: self.teardown_tasks(target),
        };
        map.backends.remove(index);
        Ok(vec![play])
    }

    /// Plan teardown of every instance, one independent play each. An
    /// instance whose host cannot be resolved is logged, skipped, and kept
    /// in the map; the rest proceed. Backends are cleared only after all
    /// plays are constructed.
    pub fn destroy_all(&self, map: &mut BackendMap) -> Vec<Play> {
        info!(count = map.backends.len(), "planning destruction of all instances");

        let mut plays = Vec::new();
        let mut retained = Vec::new();
        for instance in &map.backends {
            match balance::instance_host(instance) {
                Ok(host) => plays.push(Play {
                    name: format!("Destroy Instance {}", instance.id),
                    hosts: vec![host],
                    tasks: self.teardown_tasks(&instance.id),
                }),
                Err(err) => {
                    error!(instance = %instance.id, %err, "skipping unresolvable instance");
                    retained.push(instance.clone());
                }
            }
        }
        map.backends = retained;
        plays
    }

    /// Plan a full stop, delete, start cycle for one instance. The map is
    /// not altered.
    pub fn restart(&self, target: &str, map: &BackendMap) -> Result<Vec<Play>> {
        let Some(instance) = map.backends.iter().find(|i| i.id == target) else {
            error!(instance = target, "instance does not exist");
            return Ok(Vec::new());
        };
        let host = balance::instance_host(instance)?;
        let dir = self.instance_dir(target);

        info!(instance = target, host = %host, "planning restart");
        let mut tasks = self.stop_tasks(target);
        tasks.extend(self.delete_tasks(target));
        tasks.push(self.start_task(&dir));

        Ok(vec![Play {
            name: format!("Restart Instance {target}"),
            hosts: vec![host],
            tasks,
        }])
    }

    /// One independent restart play per instance, degrading per instance
    /// on unresolvable hosts. No ordering guarantee across instances.
    pub fn restart_all(&self, map: &BackendMap) -> Vec<Play> {
        info!(count = map.backends.len(), "planning restart of all instances");

        let mut plays = Vec::new();
        for instance in &map.backends {
            match self.restart(&instance.id, map) {
                Ok(instance_plays) => plays.extend(instance_plays),
                Err(err) => {
                    error!(instance = %instance.id, %err, "skipping unresolvable instance");
                }
            }
        }
        plays
    }

    fn stop_tasks(&self, instance_id: &str) -> Vec<Task> {
        vec![Task::ComposeCommand {
            name: "Stop deployment".into(),
            args: "down".into(),
            project_dir: self.instance_dir(instance_id),
        }]
    }

    fn delete_tasks(&self, instance_id: &str) -> Vec<Task> {
        let dir = self.instance_dir(instance_id);
        vec![
            Task::ComposeCommand {
                name: "Delete deployment".into(),
                args: "rm --force --stop".into(),
                project_dir: dir.clone(),
            },
            Task::RemovePath {
                name: "Delete deployment directory".into(),
                path: dir,
            },
        ]
    }

    fn start_task(&self, dir: &str) -> Task {
        Task::ComposeCommand {
            name: "Start deployment".into(),
            args: "up -d --build --force-recreate".into(),
            project_dir: dir.to_string(),
        }
    }

    fn teardown_tasks(&self, instance_id: &str) -> Vec<Task> {
        let mut tasks = self.stop_tasks(instance_id);
        tasks.extend(self.delete_tasks(instance_id));
        tasks
    }
}

/// Instance IDs in persisted order. Read-only; produces no play.
pub fn list_ids(map: &BackendMap) -> Vec<String> {
    map.backends.iter().map(|i| i.id.clone()).collect()
}

/// Bindings always use a numeric interface address; the synthetic
/// `localhost` host maps to the loopback literal.
fn numeric_interface(host: &str) -> &str {
    if host == "localhost" {
        balance::LOOPBACK_PLACEHOLDER
    } else {
        host
    }
}
