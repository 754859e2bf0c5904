//! Live sandbox tests
//!
//! These need a running sandbox container and are ignored by default:
//!
//! ```sh
//! docker run --security-opt seccomp=unconfined --rm -it -p 8081:8080 ghcr.io/agent-infra/sandbox:latest
//! SANDBOX_URL=http://localhost:8081 cargo test -p keystone-sandbox -- --ignored
//! ```

use keystone_sandbox::{DEFAULT_SANDBOX_URL, HttpSandbox, JupyterOutput, SandboxApi};

fn live_sandbox() -> HttpSandbox {
    let url = std::env::var("SANDBOX_URL").unwrap_or_else(|_| DEFAULT_SANDBOX_URL.to_string());
    HttpSandbox::new(&url).expect("valid SANDBOX_URL")
}

#[tokio::test]
#[ignore = "requires a running sandbox"]
async fn test_live_execute_python() {
    let sandbox = live_sandbox();
    let exec = sandbox.execute_code("print('hello')").await.unwrap();
    let printed = exec.outputs.iter().any(|out| {
        matches!(out, JupyterOutput::Stream { text: Some(t), .. } if t.contains("hello"))
    });
    assert!(printed, "unexpected outputs: {:?}", exec.outputs);
}

#[tokio::test]
#[ignore = "requires a running sandbox"]
async fn test_live_run_shell() {
    let sandbox = live_sandbox();
    let result = sandbox.exec_command("echo hi").await.unwrap();
    assert!(result.output.unwrap_or_default().contains("hi"));
    assert_eq!(result.exit_code, Some(0));
}

#[tokio::test]
#[ignore = "requires a running sandbox"]
async fn test_live_file_round_trip() {
    let sandbox = live_sandbox();
    let path = "/home/gem/test_round_trip.txt";
    let content = "round trip content";

    sandbox.write_file(path, content).await.unwrap();
    let read = sandbox.read_file(path).await.unwrap();
    assert_eq!(read.content, content);
}
