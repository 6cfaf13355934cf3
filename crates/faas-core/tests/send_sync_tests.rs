//! Tests to verify that all public types are Send + Sync as required.

use faas_core::stats::ExecutionStats;
use faas_core::traits::{CodeExecutor, FunctionStore, TenantResolver};
use faas_core::*;

const fn assert_send_sync<T: Send + Sync + ?Sized>() {}

#[test]
fn test_domain_types_are_send_sync() {
    assert_send_sync::<TenantId>();
    assert_send_sync::<FunctionId>();
    assert_send_sync::<ExecutionId>();
    assert_send_sync::<Language>();
    assert_send_sync::<ResourcePolicy>();
}

#[test]
fn test_entities_are_send_sync() {
    assert_send_sync::<Function>();
    assert_send_sync::<ExecutionRecord>();
    assert_send_sync::<ExecutionOutcome>();
    assert_send_sync::<ExecutionStats>();
}

#[test]
fn test_config_types_are_send_sync() {
    assert_send_sync::<EngineConfig>();
    assert_send_sync::<SandboxConfig>();
}

#[test]
fn test_trait_objects_are_send_sync() {
    assert_send_sync::<dyn CodeExecutor>();
    assert_send_sync::<dyn FunctionStore>();
    assert_send_sync::<dyn TenantResolver>();
}

#[test]
fn test_error_is_send_sync() {
    assert_send_sync::<Error>();
}
