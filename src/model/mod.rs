//! Desired-state topology tree
//!
//! The tree is built by an external loader and is read-only to the rest of the
//! crate. Every collection keeps declaration order so generation stays
//! deterministic.

pub mod platform;
pub mod users;

pub use platform::{
    Component, ControlCenterInstance, Platform, PlatformComponent, RbacAssignment, RbacRoles,
    SchemaRegistryInstance,
};
pub use users::{
    Connector, Consumer, CustomRoleAssignment, KSqlApp, KStream, Producer, TopicAccess, User,
};

use serde::{Deserialize, Serialize};

pub const DEFAULT_CONTEXT: &str = "default";
pub const DEFAULT_PROJECT: &str = "default";

fn default_context() -> String {
    DEFAULT_CONTEXT.to_string()
}

fn default_project() -> String {
    DEFAULT_PROJECT.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    #[serde(default = "default_context")]
    pub context: String,
    /// Free-form metadata; values take part in the default naming scheme
    #[serde(default)]
    pub others: Vec<(String, String)>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub platform: Option<Platform>,
    /// Topics named verbatim, outside any project prefix
    #[serde(default)]
    pub special_topics: Vec<Topic>,
}

impl Default for Topology {
    fn default() -> Self {
        Self::new(DEFAULT_CONTEXT)
    }
}

impl Topology {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            others: Vec::new(),
            projects: Vec::new(),
            platform: None,
            special_topics: Vec::new(),
        }
    }

    pub fn add_other(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.others.push((key.into(), value.into()));
    }

    pub fn add_project(&mut self, project: Project) {
        self.projects.push(project);
    }

    pub fn add_special_topic(&mut self, topic: Topic) {
        self.special_topics.push(topic);
    }

    pub fn set_platform(&mut self, platform: Platform) {
        self.platform = Some(platform);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    #[serde(default = "default_project")]
    pub name: String,
    #[serde(default)]
    pub topics: Vec<Topic>,
    #[serde(default)]
    pub consumers: Vec<Consumer>,
    #[serde(default)]
    pub producers: Vec<Producer>,
    #[serde(default)]
    pub streams: Vec<KStream>,
    #[serde(default)]
    pub connectors: Vec<Connector>,
    #[serde(default)]
    pub ksql_apps: Vec<KSqlApp>,
    /// Principals holding custom catalog roles
    #[serde(default)]
    pub others: Vec<CustomRoleAssignment>,
}

impl Default for Project {
    fn default() -> Self {
        Self::new(DEFAULT_PROJECT)
    }
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            topics: Vec::new(),
            consumers: Vec::new(),
            producers: Vec::new(),
            streams: Vec::new(),
            connectors: Vec::new(),
            ksql_apps: Vec::new(),
            others: Vec::new(),
        }
    }

    pub fn add_topic(&mut self, topic: Topic) {
        self.topics.push(topic);
    }

    /// Project-level consumers plus the topic's own, without exact duplicates.
    ///
    /// Entries sharing a principal but differing in attributes are all kept.
    pub fn consumers_for(&self, topic: &Topic) -> Vec<Consumer> {
        union(&self.consumers, &topic.consumers)
    }

    pub fn producers_for(&self, topic: &Topic) -> Vec<Producer> {
        union(&self.producers, &topic.producers)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub name: String,
    #[serde(default)]
    pub consumers: Vec<Consumer>,
    #[serde(default)]
    pub producers: Vec<Producer>,
}

impl Topic {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            consumers: Vec::new(),
            producers: Vec::new(),
        }
    }

    pub fn with_consumers(mut self, consumers: Vec<Consumer>) -> Self {
        self.consumers = consumers;
        self
    }

    pub fn with_producers(mut self, producers: Vec<Producer>) -> Self {
        self.producers = producers;
        self
    }
}

fn union<T: PartialEq + Clone>(first: &[T], second: &[T]) -> Vec<T> {
    let mut merged: Vec<T> = Vec::with_capacity(first.len() + second.len());
    for item in first.iter().chain(second) {
        if !merged.contains(item) {
            merged.push(item.clone());
        }
    }
    merged
}
