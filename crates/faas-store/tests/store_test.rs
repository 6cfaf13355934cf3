//! Behavior shared by every `FunctionStore` backend.
//!
//! Each scenario runs against `MemoryStore` and a `FileStore` in a
//! temporary directory.

use chrono::Utc;
use faas_core::traits::FunctionStore;
use faas_core::{
    Enforcement, ExecutionId, ExecutionRecord, ExecutionStatus, Function, FunctionId, Language,
    ResourcePolicy, TenantId,
};
use faas_store::{FileStore, MemoryStore};
use tempfile::TempDir;

async fn backends() -> (Vec<Box<dyn FunctionStore>>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let file = FileStore::open(dir.path()).await.unwrap();
    (vec![Box::new(MemoryStore::new()), Box::new(file)], dir)
}

fn function(tenant: &str, name: &str) -> Function {
    Function {
        id: FunctionId::new(),
        tenant: TenantId::new(tenant),
        name: name.to_string(),
        language: Language::Python,
        source: "print(event)\n".to_string(),
        created_at: Utc::now(),
        policy: ResourcePolicy::default(),
    }
}

fn record(function: &Function, output: &str) -> ExecutionRecord {
    ExecutionRecord {
        id: ExecutionId::new(),
        function_id: function.id,
        timestamp: Utc::now(),
        input: "{}".to_string(),
        output: output.to_string(),
        error: String::new(),
        success: true,
        duration_ms: 12,
        status: ExecutionStatus::Succeeded,
        policy: function.policy,
        enforcement: Enforcement::none(),
    }
}

/// Saved functions come back unchanged.
#[tokio::test]
async fn test_save_and_find_function() {
    let (stores, _dir) = backends().await;
    for store in stores {
        let f = function("acme", "greet");
        store.save_function(&f).await.unwrap();

        let found = store.find_function(&f.id).await.unwrap();
        assert_eq!(found, Some(f));
        assert!(store.find_function(&FunctionId::new()).await.unwrap().is_none());
    }
}

/// Saving an existing id replaces the definition.
#[tokio::test]
async fn test_save_function_replaces() {
    let (stores, _dir) = backends().await;
    for store in stores {
        let mut f = function("acme", "v1");
        store.save_function(&f).await.unwrap();
        f.name = "v2".to_string();
        store.save_function(&f).await.unwrap();

        assert_eq!(store.find_function(&f.id).await.unwrap().unwrap().name, "v2");
        let tenant = TenantId::new("acme");
        assert_eq!(store.count_functions_by_tenant(&tenant).await.unwrap(), 1);
    }
}

/// Listing and counting only see the tenant's own functions.
#[tokio::test]
async fn test_tenant_scoping() {
    let (stores, _dir) = backends().await;
    for store in stores {
        for name in ["a", "b", "c"] {
            store.save_function(&function("acme", name)).await.unwrap();
        }
        store.save_function(&function("globex", "x")).await.unwrap();

        let acme = TenantId::new("acme");
        let globex = TenantId::new("globex");
        assert_eq!(store.count_functions_by_tenant(&acme).await.unwrap(), 3);
        assert_eq!(store.count_functions_by_tenant(&globex).await.unwrap(), 1);
        assert!(
            store
                .find_functions_by_tenant(&acme)
                .await
                .unwrap()
                .iter()
                .all(|f| f.tenant == acme)
        );
        assert_eq!(
            store
                .count_functions_by_tenant(&TenantId::new("nobody"))
                .await
                .unwrap(),
            0
        );
    }
}

/// Execution records are kept per function and removed together.
#[tokio::test]
async fn test_execution_history() {
    let (stores, _dir) = backends().await;
    for store in stores {
        let f = function("acme", "greet");
        let g = function("acme", "other");
        store.save_function(&f).await.unwrap();

        let first = record(&f, "1\n");
        let second = record(&f, "2\n");
        store.save_execution(&first).await.unwrap();
        store.save_execution(&second).await.unwrap();
        store.save_execution(&record(&g, "x\n")).await.unwrap();

        let mut history = store.find_executions_by_function(&f.id).await.unwrap();
        history.sort_by(|a, b| a.output.cmp(&b.output));
        assert_eq!(history, vec![first, second]);

        assert_eq!(store.delete_executions_by_function(&f.id).await.unwrap(), 2);
        assert!(store.find_executions_by_function(&f.id).await.unwrap().is_empty());
        assert_eq!(store.delete_executions_by_function(&f.id).await.unwrap(), 0);
        assert_eq!(store.find_executions_by_function(&g.id).await.unwrap().len(), 1);
    }
}

/// Deleting reports whether anything was removed.
#[tokio::test]
async fn test_delete_function() {
    let (stores, _dir) = backends().await;
    for store in stores {
        let f = function("acme", "greet");
        store.save_function(&f).await.unwrap();

        assert!(store.delete_function(&f.id).await.unwrap());
        assert!(!store.delete_function(&f.id).await.unwrap());
        assert!(store.find_function(&f.id).await.unwrap().is_none());
    }
}

/// A file store reopened on the same directory sees earlier writes.
#[tokio::test]
async fn test_file_store_persists_across_instances() {
    let dir = tempfile::tempdir().unwrap();
    let f = function("acme", "greet");
    let r = record(&f, "hello\n");
    {
        let store = FileStore::open(dir.path()).await.unwrap();
        store.save_function(&f).await.unwrap();
        store.save_execution(&r).await.unwrap();
    }

    let store = FileStore::open(dir.path()).await.unwrap();
    assert_eq!(store.find_function(&f.id).await.unwrap(), Some(f.clone()));
    assert_eq!(
        store.find_executions_by_function(&f.id).await.unwrap(),
        vec![r]
    );
}

/// Concurrent writers do not lose records.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_execution_writes() {
    let dir = tempfile::tempdir().unwrap();
    let store = std::sync::Arc::new(FileStore::open(dir.path()).await.unwrap());
    let f = function("acme", "greet");

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let store = std::sync::Arc::clone(&store);
            let r = record(&f, &format!("{i}\n"));
            tokio::spawn(async move { store.save_execution(&r).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(
        store.find_executions_by_function(&f.id).await.unwrap().len(),
        16
    );
}
