//! Create three virtual machines concurrently and follow their tasks.
//!
//! ```text
//! VMMANAGER_URL=https://vm6.example.com \
//! VMMANAGER_EMAIL=admin@example.com \
//! VMMANAGER_PASSWORD=secret \
//! cargo run -p vmmanager-vm --example create_hosts
//! ```

use anyhow::Context;
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use vmmanager_auth::{AuthSession, Credentials};
use vmmanager_core::{AreaSession, SessionConfig};
use vmmanager_vm::VmSession;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let url = std::env::var("VMMANAGER_URL").context("VMMANAGER_URL is not set")?;
    let email = std::env::var("VMMANAGER_EMAIL").context("VMMANAGER_EMAIL is not set")?;
    let password = std::env::var("VMMANAGER_PASSWORD").context("VMMANAGER_PASSWORD is not set")?;
    let verify = std::env::var("VMMANAGER_INSECURE").is_err();

    let config = SessionConfig::new(url)?.with_tls_verify(verify);

    let auth = AuthSession::open(&config)?;
    let token = auth.token(&Credentials::new(email, password)).await?;
    auth.close();

    let vm = VmSession::open(&token.authorize(config))?;

    let params: Vec<_> = (1..=3)
        .map(|n| {
            json!({
                "name": format!("demo-{n:02}"),
                "cluster": 1,
                "os": 1,
                "cpu_number": 1,
                "ram_mib": 1024,
                "hdd_mib": 10240,
                "password": "Ch4ngeMe!",
            })
        })
        .collect();

    let (first, second, third) = tokio::join!(
        vm.host_create(&params[0]),
        vm.host_create(&params[1]),
        vm.host_create(&params[2]),
    );

    for (params, outcome) in params.iter().zip([first, second, third]) {
        match outcome {
            Ok(body) => {
                let operation = vm.host_operation(&body)?;
                info!(name = %params["name"], host = ?operation.id, "host creation accepted");
                if let Some(consul_id) = operation.task {
                    let task = vm.first_task_by_consul_id(consul_id).await?;
                    info!(%consul_id, ?task, "task manager record");
                }
            }
            Err(err) => warn!(name = %params["name"], status = ?err.status(), "host creation failed: {err}"),
        }
    }

    vm.close();
    Ok(())
}
