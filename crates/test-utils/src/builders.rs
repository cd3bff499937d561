#![allow(dead_code)]

use std::collections::BTreeMap;

use taskflow::config::{ConfigFile, FlowSection, RawConfigFile, TaskConfig};
use taskflow::types::HumanDuration;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                flow: FlowSection::default(),
                task: BTreeMap::new(),
            },
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.config.flow.name = Some(name.to_string());
        self
    }

    pub fn with_timeout(mut self, duration: &str) -> Self {
        self.config.flow.timeout = Some(parse_duration(duration));
        self
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new(cmd: &str) -> Self {
        Self {
            task: TaskConfig {
                cmd: cmd.to_string(),
                after: vec![],
                timeout: None,
                retry_interval: None,
            },
        }
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.after.push(dep.to_string());
        self
    }

    pub fn timeout(mut self, duration: &str) -> Self {
        self.task.timeout = Some(parse_duration(duration));
        self
    }

    pub fn retry_interval(mut self, duration: &str) -> Self {
        self.task.retry_interval = Some(parse_duration(duration));
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}

fn parse_duration(s: &str) -> HumanDuration {
    s.parse().expect("valid duration in test builder")
}
