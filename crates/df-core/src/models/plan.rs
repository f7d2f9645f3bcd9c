use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};
use serde_yaml::{Mapping, Value};

use crate::error::Result;

/// One declarative, idempotent remote action. The set is closed: the
/// external executor only ever sees these five shapes, serialized as
/// `{name, action, args}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    Mkdir {
        name: String,
        path: String,
    },
    CopyTree {
        name: String,
        src: String,
        dest: String,
    },
    WriteFile {
        name: String,
        path: String,
        content: String,
    },
    RemovePath {
        name: String,
        path: String,
    },
    ComposeCommand {
        name: String,
        args: String,
        project_dir: String,
    },
}

impl Task {
    pub fn name(&self) -> &str {
        match self {
            Task::Mkdir { name, .. }
            | Task::CopyTree { name, .. }
            | Task::WriteFile { name, .. }
            | Task::RemovePath { name, .. }
            | Task::ComposeCommand { name, .. } => name,
        }
    }

    /// Executor-side module name.
    pub fn action(&self) -> &'static str {
        match self {
            Task::Mkdir { .. } | Task::RemovePath { .. } => "file",
            Task::CopyTree { .. } | Task::WriteFile { .. } => "copy",
            Task::ComposeCommand { .. } => "docker_compose",
        }
    }

    fn args(&self) -> Mapping {
        let mut args = Mapping::new();
        let mut put = |key: &str, value: &str| {
            args.insert(
                Value::String(key.to_string()),
                Value::String(value.to_string()),
            );
        };
        match self {
            Task::Mkdir { path, .. } => {
                put("path", path);
                put("state", "directory");
            }
            Task::CopyTree { src, dest, .. } => {
                put("src", src);
                put("dest", dest);
            }
            Task::WriteFile { path, content, .. } => {
                put("content", content);
                put("dest", path);
            }
            Task::RemovePath { path, .. } => {
                put("path", path);
                put("state", "absent");
            }
            Task::ComposeCommand {
                args: compose_args,
                project_dir,
                ..
            } => {
                put("args", compose_args);
                put("project_src", project_dir);
            }
        }
        args
    }
}

#[derive(Serialize)]
struct WireTask<'a> {
    name: &'a str,
    action: &'a str,
    args: Mapping,
}

impl Serialize for Task {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        WireTask {
            name: self.name(),
            action: self.action(),
            args: self.args(),
        }
        .serialize(serializer)
    }
}

/// One host-scoped batch of tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Play {
    pub name: String,
    pub hosts: Vec<String>,
    pub tasks: Vec<Task>,
}

#[derive(Serialize)]
struct WirePlay<'a> {
    name: &'a str,
    hosts: &'a [String],
    tasks: &'a [Task],
    gather_facts: bool,
}

impl Serialize for Play {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        WirePlay {
            name: &self.name,
            hosts: &self.hosts,
            tasks: &self.tasks,
            gather_facts: false,
        }
        .serialize(serializer)
    }
}

/// The ordered plan handed to the external executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playbook(pub Vec<Play>);

impl Serialize for Playbook {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for play in &self.0 {
            seq.serialize_element(play)?;
        }
        seq.end()
    }
}

impl Playbook {
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub async fn write(&self, path: &std::path::Path) -> Result<()> {
        tokio::fs::write(path, self.to_yaml()?).await?;
        Ok(())
    }
}
