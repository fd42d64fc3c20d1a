mod common;

use common::{file_plan, run_topology, FailingProvider, TestTopologyBuilder};
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;
use tempfile::TempDir;
use topology_acls::acl::{
    AclOperation, AclsBindingsBuilder, PatternType, ResourcePattern, TopologyAclBinding,
};
use topology_acls::backend::{Backend, BackendState, FileBackend};
use topology_acls::manager::AccessControlManager;
use topology_acls::plan::PlanState;
use topology_acls::provider::InMemoryAclsProvider;
use topology_acls::{Config, TopologyError};

fn consumer_bindings(principal: &str, topic: &str) -> BTreeSet<TopologyAclBinding> {
    let topic = ResourcePattern::topic(topic, PatternType::Literal);
    [
        TopologyAclBinding::allow(principal, topic.clone(), AclOperation::Describe),
        TopologyAclBinding::allow(principal, topic, AclOperation::Read),
        TopologyAclBinding::allow(
            principal,
            ResourcePattern::group("*", PatternType::Literal),
            AclOperation::Read,
        ),
    ]
    .into_iter()
    .collect()
}

fn two_consumers() -> TestTopologyBuilder {
    TestTopologyBuilder::create_project()
        .add_topic("topicA")
        .add_consumer("User:app1")
        .add_consumer("User:app2")
}

fn persisted(state_file: &std::path::Path) -> BTreeSet<TopologyAclBinding> {
    let mut backend = FileBackend::new(state_file);
    let state = backend.load().unwrap().unwrap_or_else(BackendState::empty);
    backend.close().unwrap();
    state.bindings.into_iter().collect()
}

#[test]
fn test_dry_run_mode() {
    let dir = TempDir::new().unwrap();
    let state_file = dir.path().join(".cluster-state");
    let config = Config::default();
    let provider = InMemoryAclsProvider::new();
    let builder = AclsBindingsBuilder::new(&config);

    let topology = TestTopologyBuilder::create_project_named("foo", "project")
        .add_topic("topicA")
        .add_consumer("User:app1")
        .build_topology();

    let mut plan = file_plan(&state_file).unwrap();
    let manager = AccessControlManager::new(&provider, &builder, &config);
    manager.update_plan(&topology, &mut plan).unwrap();

    let report = plan.run(true, &provider, config.delete_policy()).unwrap();

    assert!(report.dry_run);
    assert_eq!(report.created, consumer_bindings("User:app1", "foo.project.topicA"));
    assert!(provider.create_calls().is_empty());
    assert!(provider.clear_calls().is_empty());
    assert!(!state_file.exists());
    assert_eq!(plan.state(), PlanState::Reported);

    let output = String::from_utf8(plan.output().clone()).unwrap();
    assert_eq!(output.matches("Action: ").count(), 1);
    assert!(output.contains("ALLOW User:app1 READ on TOPIC:foo.project.topicA (LITERAL) from *"));
}

#[test]
fn test_apply_issues_one_batched_create() {
    let dir = TempDir::new().unwrap();
    let state_file = dir.path().join(".cluster-state");
    let config = Config::default();
    let provider = InMemoryAclsProvider::new();
    let builder = AclsBindingsBuilder::new(&config);
    let topology = two_consumers().add_producer("User:app3").build_topology();

    let report = run_topology(&config, &builder, &provider, &topology, &state_file, false).unwrap();

    let calls = provider.create_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0], report.created);
    assert_eq!(persisted(&state_file), report.created);

    // Unchanged topology means nothing to do
    let provider = InMemoryAclsProvider::new();
    let report = run_topology(&config, &builder, &provider, &topology, &state_file, false).unwrap();
    assert!(report.created.is_empty());
    assert!(provider.create_calls().is_empty());
}

#[test]
fn test_acl_delete_with_option_disabled() {
    let dir = TempDir::new().unwrap();
    let state_file = dir.path().join(".cluster-state");
    let config = Config::default();
    let builder = AclsBindingsBuilder::new(&config);
    let mut topology = two_consumers();

    let provider = InMemoryAclsProvider::new();
    run_topology(&config, &builder, &provider, &topology.build_topology(), &state_file, false).unwrap();
    assert_eq!(provider.create_calls().len(), 1);

    topology.remove_consumer("User:app2");

    let provider = InMemoryAclsProvider::new();
    let report =
        run_topology(&config, &builder, &provider, &topology.build_topology(), &state_file, false)
            .unwrap();

    assert!(provider.clear_calls().is_empty());
    let stale = consumer_bindings("User:app2", "ctx.project.topicA");
    assert_eq!(report.skipped_deletions, stale);
    assert!(persisted(&state_file).is_superset(&stale));
}

#[test]
fn test_acl_delete_with_option_enabled() {
    let dir = TempDir::new().unwrap();
    let state_file = dir.path().join(".cluster-state");
    let mut config = Config::default();
    config.deletion.allow_delete_bindings = true;
    config.deletion.allow_delete_topics = false;
    let builder = AclsBindingsBuilder::new(&config);
    let mut topology = two_consumers();

    let provider = InMemoryAclsProvider::new();
    run_topology(&config, &builder, &provider, &topology.build_topology(), &state_file, false).unwrap();

    topology.remove_consumer("User:app2");

    let provider = InMemoryAclsProvider::new();
    run_topology(&config, &builder, &provider, &topology.build_topology(), &state_file, false).unwrap();

    let removed = consumer_bindings("User:app2", "ctx.project.topicA");
    assert_eq!(provider.clear_calls(), vec![removed.clone()]);
    assert!(provider.create_calls().is_empty());
    assert!(persisted(&state_file).is_disjoint(&removed));
}

#[test]
fn test_removed_topic_bindings_need_topic_delete_flag() {
    let dir = TempDir::new().unwrap();
    let state_file = dir.path().join(".cluster-state");
    let mut config = Config::default();
    config.deletion.allow_delete_bindings = true;
    let builder = AclsBindingsBuilder::new(&config);

    let mut topology = TestTopologyBuilder::create_project()
        .add_topic("topicA")
        .add_topic("topicB")
        .add_consumer("User:app1");

    let provider = InMemoryAclsProvider::new();
    run_topology(&config, &builder, &provider, &topology.build_topology(), &state_file, false).unwrap();

    topology.remove_topic("topicB");

    let provider = InMemoryAclsProvider::new();
    let report =
        run_topology(&config, &builder, &provider, &topology.build_topology(), &state_file, false)
            .unwrap();

    assert!(provider.clear_calls().is_empty());
    assert_eq!(report.skipped_deletions.len(), 2);
    assert!(report
        .skipped_deletions
        .iter()
        .all(|b| b.resource_name() == "ctx.project.topicB"));

    config.deletion.allow_delete_topics = true;
    let provider = InMemoryAclsProvider::new();
    let report =
        run_topology(&config, &builder, &provider, &topology.build_topology(), &state_file, false)
            .unwrap();

    assert_eq!(provider.clear_calls().len(), 1);
    assert_eq!(report.deleted.len(), 2);
    assert!(report.skipped_deletions.is_empty());
}

#[test]
fn test_plan_runs_once() {
    let dir = TempDir::new().unwrap();
    let state_file = dir.path().join(".cluster-state");
    let provider = InMemoryAclsProvider::new();

    let mut plan = file_plan(&state_file).unwrap();
    plan.run(false, &provider, Default::default()).unwrap();

    let second = plan.run(false, &provider, Default::default());
    assert!(matches!(second, Err(TopologyError::InvalidOperation(_))));
}

#[test]
fn test_state_lock_held_until_run_completes() {
    let dir = TempDir::new().unwrap();
    let state_file = dir.path().join(".cluster-state");
    let provider = InMemoryAclsProvider::new();

    let mut plan = file_plan(&state_file).unwrap();
    assert!(matches!(file_plan(&state_file), Err(TopologyError::BackendLocked(_))));

    plan.run(false, &provider, Default::default()).unwrap();
    assert!(file_plan(&state_file).is_ok());
}

#[test]
fn test_provider_failure_releases_lock() {
    let dir = TempDir::new().unwrap();
    let state_file = dir.path().join(".cluster-state");
    let config = Config::default();
    let builder = AclsBindingsBuilder::new(&config);
    let topology = two_consumers().build_topology();

    let mut plan = file_plan(&state_file).unwrap();
    let manager = AccessControlManager::new(&FailingProvider, &builder, &config);
    manager.update_plan(&topology, &mut plan).unwrap();

    let result = plan.run(false, &FailingProvider, config.delete_policy());
    assert!(matches!(result, Err(TopologyError::Provider(_))));
    assert_eq!(plan.state(), PlanState::Failed);
    assert!(!state_file.exists());
    assert!(file_plan(&state_file).is_ok());
}

#[test]
fn test_cluster_truth_mode_recreates_missing_bindings() {
    let dir = TempDir::new().unwrap();
    let state_file = dir.path().join(".cluster-state");
    let mut config = Config::default();
    config.state.from_cluster = true;
    let builder = AclsBindingsBuilder::new(&config);
    let topology = two_consumers().build_topology();

    let provider = InMemoryAclsProvider::new();
    run_topology(&config, &builder, &provider, &topology, &state_file, false).unwrap();
    assert!(state_file.exists());

    // The cluster lost everything; the persisted state still claims it is there
    let empty_cluster = InMemoryAclsProvider::new();
    let report =
        run_topology(&config, &builder, &empty_cluster, &topology, &state_file, false).unwrap();

    assert_eq!(report.created.len(), 6);
    assert_eq!(empty_cluster.create_calls().len(), 1);
}

#[test]
fn test_narrowed_topic_scope_leaves_old_bindings_alone() {
    let dir = TempDir::new().unwrap();
    let state_file = dir.path().join(".cluster-state");
    let mut config = Config::default();
    config.naming.topic_prefix_format = "{{topic}}".to_string();
    config.deletion.allow_delete_bindings = true;
    config.deletion.allow_delete_topics = true;

    let topology = TestTopologyBuilder::create_project()
        .add_topic("topicA")
        .add_topic("NamespaceA_topicA")
        .add_consumer("User:app1")
        .build_topology();

    let builder = AclsBindingsBuilder::new(&config);
    let provider = InMemoryAclsProvider::new();
    run_topology(&config, &builder, &provider, &topology, &state_file, false).unwrap();
    let outside = consumer_bindings("User:app1", "topicA");
    assert!(persisted(&state_file).is_superset(&outside));

    config.scope.topic_managed_prefixes = vec!["NamespaceA".to_string()];
    let builder = AclsBindingsBuilder::new(&config);
    let provider = InMemoryAclsProvider::new();
    let report = run_topology(&config, &builder, &provider, &topology, &state_file, false).unwrap();

    assert!(report.deleted.is_empty());
    assert!(report.created.is_empty());
    assert!(provider.clear_calls().is_empty());
    assert!(persisted(&state_file).is_superset(&outside));
}
