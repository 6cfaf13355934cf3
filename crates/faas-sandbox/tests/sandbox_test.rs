//! Sandbox tests against real interpreters.
//!
//! Each test checks for its interpreter on `PATH` and returns early when
//! it is missing, so the suite passes on hosts without Node or Python.
//!
//! Covers:
//! - Input delivery and output capture
//! - Exit codes and stderr
//! - Wall-clock timeouts
//! - Environment and working directory isolation
//! - Memory limits
//! - Concurrent invocations

use faas_core::traits::CodeExecutor;
use faas_core::{ExecutionRequest, ExecutionStatus, Language, ResourcePolicy, SandboxConfig};
use faas_sandbox::SandboxExecutor;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("faas_sandbox=debug")
        .with_test_writer()
        .try_init();
}

fn has_interpreter(language: Language) -> bool {
    let found = which::which(language.default_interpreter()).is_ok();
    if !found {
        eprintln!("skipping: {} not found", language.default_interpreter());
    }
    found
}

fn python<'a>(source: &'a str, input: &'a str) -> ExecutionRequest<'a> {
    ExecutionRequest {
        language: Language::Python,
        source,
        input,
        policy: ResourcePolicy::default(),
    }
}

/// Input arrives through the environment and stdout is captured.
#[tokio::test]
async fn test_python_input_and_output() {
    init_tracing();
    if !has_interpreter(Language::Python) {
        return;
    }

    let executor = SandboxExecutor::new(SandboxConfig::default());
    let outcome = executor
        .execute(python(
            "import json, os\nevent = json.loads(os.environ['FUNCTION_INPUT'])\nprint(event['name'].upper())\n",
            r#"{"name": "faas"}"#,
        ))
        .await;

    assert_eq!(outcome.status, ExecutionStatus::Succeeded, "{outcome:?}");
    assert_eq!(outcome.stdout, "FAAS\n");
    assert_eq!(outcome.exit_code, Some(0));
    assert_eq!(outcome.message, None);
}

/// A non-zero exit is a failure carrying stderr and the exit code.
#[tokio::test]
async fn test_python_nonzero_exit() {
    init_tracing();
    if !has_interpreter(Language::Python) {
        return;
    }

    let executor = SandboxExecutor::new(SandboxConfig::default());
    let outcome = executor
        .execute(python(
            "import sys\nprint('partial')\nsys.stderr.write('boom\\n')\nsys.exit(3)\n",
            "{}",
        ))
        .await;

    assert_eq!(outcome.status, ExecutionStatus::Failed);
    assert_eq!(outcome.exit_code, Some(3));
    assert_eq!(outcome.stdout, "partial\n");
    assert_eq!(outcome.stderr, "boom\n");
    assert_eq!(outcome.error_text(), "boom\nProcess exited with code 3");
}

/// An uncaught exception is a failure with the traceback on stderr.
#[tokio::test]
async fn test_python_exception() {
    init_tracing();
    if !has_interpreter(Language::Python) {
        return;
    }

    let executor = SandboxExecutor::new(SandboxConfig::default());
    let outcome = executor
        .execute(python("raise ValueError('bad input')\n", "{}"))
        .await;

    assert_eq!(outcome.status, ExecutionStatus::Failed);
    assert_eq!(outcome.exit_code, Some(1));
    assert!(outcome.stderr.contains("ValueError: bad input"));
}

/// A run past its timeout is killed and reported as timed out.
#[tokio::test]
async fn test_timeout_kills_process() {
    init_tracing();
    if !has_interpreter(Language::Python) {
        return;
    }

    let executor = SandboxExecutor::new(SandboxConfig::default());
    let mut request = python("while True:\n    pass\n", "{}");
    request.policy.timeout_secs = 1;

    let outcome = executor.execute(request).await;

    assert_eq!(outcome.status, ExecutionStatus::TimedOut);
    assert_eq!(outcome.exit_code, None);
    assert_eq!(
        outcome.message.as_deref(),
        Some("Execution timed out after 1s")
    );
    assert!(outcome.duration >= Duration::from_secs(1));
    assert!(outcome.duration < Duration::from_secs(5), "{:?}", outcome.duration);
}

/// The workspace is the working directory and HOME, and is gone afterwards.
#[tokio::test]
async fn test_workspace_isolation() {
    init_tracing();
    if !has_interpreter(Language::Python) {
        return;
    }

    let root = tempfile::tempdir().unwrap();
    let config = SandboxConfig {
        workspace_root: Some(root.path().to_path_buf()),
        ..SandboxConfig::default()
    };
    let executor = SandboxExecutor::new(config);
    let outcome = executor
        .execute(python(
            "import os\nprint(os.environ['HOME'])\nprint(sorted(os.listdir('.')))\n",
            "{}",
        ))
        .await;

    assert_eq!(outcome.status, ExecutionStatus::Succeeded, "{outcome:?}");
    let mut lines = outcome.stdout.lines();
    let home = lines.next().unwrap();
    assert!(Path::new(home).starts_with(root.path()), "{home}");
    assert_eq!(lines.next(), Some("['function.py']"));
    assert!(!Path::new(home).exists());
    assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
}

/// Host environment variables outside the inherit list are not visible.
#[tokio::test]
async fn test_environment_is_cleared() {
    init_tracing();
    if !has_interpreter(Language::Python) {
        return;
    }
    let Some((key, _)) = std::env::vars().find(|(k, _)| {
        !matches!(k.as_str(), "PATH" | "HOME" | "FUNCTION_INPUT")
            && !k.starts_with("LC_")
            && !k.starts_with("LANG")
            && !k.is_empty()
            && k.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    }) else {
        return;
    };

    let executor = SandboxExecutor::new(SandboxConfig::default());
    let outcome = executor
        .execute(python(
            &format!("import os\nprint(os.environ.get('{key}'))\nprint('PATH' in os.environ)\n"),
            "{}",
        ))
        .await;

    assert_eq!(outcome.status, ExecutionStatus::Succeeded, "{outcome:?}");
    assert_eq!(outcome.stdout, "None\nTrue\n");
}

/// Python allocations beyond the memory limit fail.
#[cfg(unix)]
#[tokio::test]
async fn test_python_memory_limit() {
    init_tracing();
    if !has_interpreter(Language::Python) {
        return;
    }

    let executor = SandboxExecutor::new(SandboxConfig::default());
    let mut request = python(
        "data = bytearray(2 * 1024 * 1024 * 1024)\nprint(len(data))\n",
        "{}",
    );
    request.policy.memory_limit_mb = 256;

    let outcome = executor.execute(request).await;

    assert_eq!(outcome.status, ExecutionStatus::Failed, "{outcome:?}");
    assert!(outcome.stderr.contains("MemoryError"), "{}", outcome.stderr);
    assert!(outcome.enforcement.mechanisms.contains(&"rlimit-as".to_string()));
}

/// JavaScript functions receive input and get a heap limit.
#[tokio::test]
async fn test_javascript_execution() {
    init_tracing();
    if !has_interpreter(Language::JavaScript) {
        return;
    }

    let executor = SandboxExecutor::new(SandboxConfig::default());
    let outcome = executor
        .execute(ExecutionRequest {
            language: Language::JavaScript,
            source: "const event = JSON.parse(process.env.FUNCTION_INPUT);\nconsole.log(event.n * 2);\n",
            input: r#"{"n": 21}"#,
            policy: ResourcePolicy::default(),
        })
        .await;

    assert_eq!(outcome.status, ExecutionStatus::Succeeded, "{outcome:?}");
    assert_eq!(outcome.stdout, "42\n");
    assert!(outcome.enforcement.mechanisms.contains(&"v8-heap".to_string()));
}

/// Concurrent invocations do not see each other's input or files.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_invocations() {
    init_tracing();
    if !has_interpreter(Language::Python) {
        return;
    }

    let executor = Arc::new(SandboxExecutor::new(SandboxConfig::default()));
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let executor = Arc::clone(&executor);
            tokio::spawn(async move {
                let input = format!("{{\"i\": {i}}}");
                let request = ExecutionRequest {
                    language: Language::Python,
                    source: "import json, os\nprint(json.loads(os.environ['FUNCTION_INPUT'])['i'])\n",
                    input: &input,
                    policy: ResourcePolicy::default(),
                };
                executor.execute(request).await
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let outcome = handle.await.unwrap();
        assert_eq!(outcome.status, ExecutionStatus::Succeeded);
        assert_eq!(outcome.stdout, format!("{i}\n"));
    }
}
