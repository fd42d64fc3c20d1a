//! Project prefix and topic name resolution
//!
//! The built-in scheme joins the topology context, every `others` value and the
//! project name with the configured separator (`ctx.source.project.`). Custom
//! formats are minijinja templates rendered with undefined values treated as
//! errors, so a template that references a missing token fails instead of
//! producing a shorter, broader name.

use crate::config::NamingConfig;
use crate::error::{Result, TopologyError};
use crate::model::{Project, Topic, Topology};

use minijinja::{Environment, UndefinedBehavior};
use std::collections::BTreeMap;

pub struct NameResolver<'a> {
    config: &'a NamingConfig,
    env: Environment<'static>,
}

impl<'a> NameResolver<'a> {
    pub fn new(config: &'a NamingConfig) -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        Self { config, env }
    }

    /// Prefix shared by every topic of the project
    pub fn project_prefix(&self, topology: &Topology, project: &Project) -> Result<String> {
        if !self.config.has_custom_project_format() {
            let sep = &self.config.separator;
            let mut prefix = String::new();
            prefix.push_str(&topology.context);
            prefix.push_str(sep);
            for (_, value) in &topology.others {
                prefix.push_str(value);
                prefix.push_str(sep);
            }
            prefix.push_str(&project.name);
            prefix.push_str(sep);
            return Ok(prefix);
        }

        let vars = Self::variables(topology, project, None);
        self.render(&self.config.project_prefix_format, &vars)
    }

    /// Fully qualified name of a project topic
    pub fn topic_name(&self, topology: &Topology, project: &Project, topic: &Topic) -> Result<String> {
        if self.config.has_custom_topic_format() {
            let vars = Self::variables(topology, project, Some(topic));
            return self.render(&self.config.topic_prefix_format, &vars);
        }

        let mut prefix = self.project_prefix(topology, project)?;
        if !prefix.is_empty() && !prefix.ends_with(self.config.separator.as_str()) {
            prefix.push_str(&self.config.separator);
        }
        Ok(format!("{}{}", prefix, topic.name))
    }

    fn variables(
        topology: &Topology,
        project: &Project,
        topic: Option<&Topic>,
    ) -> BTreeMap<String, String> {
        let mut vars = BTreeMap::new();
        for (key, value) in &topology.others {
            vars.insert(key.clone(), value.clone());
        }
        vars.insert("context".to_string(), topology.context.clone());
        vars.insert("project".to_string(), project.name.clone());
        if let Some(topic) = topic {
            vars.insert("topic".to_string(), topic.name.clone());
        }
        vars
    }

    fn render(&self, template: &str, vars: &BTreeMap<String, String>) -> Result<String> {
        self.env
            .render_str(template, vars)
            .map_err(|e| TopologyError::prefix_resolution(template, e.to_string()))
    }
}

/// Render a one-off template against string variables, failing on any unresolved token
pub fn render_template(template: &str, vars: &BTreeMap<&str, &str>) -> Result<String> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.render_str(template, vars)
        .map_err(|e| TopologyError::prefix_resolution(template, e.to_string()))
}
