//! Concurrent host creation through one shared session.
//!
//! Three creations run at once over the same connection pool; one of them is
//! rejected with 422 and must not disturb the other two.

use serde_json::json;
use vmmanager_core::{AreaSession, Error, SessionConfig};
use vmmanager_vm::VmSession;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_host(server: &MockServer, name: &str, status: u16, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/vm/v3/host"))
        .and(body_partial_json(json!({"name": name})))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_three_concurrent_creates_one_rejected() {
    let server = MockServer::start().await;
    mount_host(&server, "web-01", 200, json!({"id": 101, "task": 9001})).await;
    mount_host(
        &server,
        "web-02",
        422,
        json!({"error": {"code": 4001, "msg": "Not enough resources"}}),
    )
    .await;
    mount_host(&server, "web-03", 200, json!({"id": 103, "task": 9003})).await;

    let config = SessionConfig::new(server.uri()).unwrap();
    let vm = VmSession::open(&config).unwrap();
    let handle = vm.connection();

    let first = json!({"name": "web-01", "cluster": 1});
    let second = json!({"name": "web-02", "cluster": 1});
    let third = json!({"name": "web-03", "cluster": 1});

    let (a, b, c) = tokio::join!(
        vm.host_create(&first),
        vm.host_create(&second),
        vm.host_create(&third),
    );

    let a = vm.host_operation(&a.unwrap()).unwrap();
    assert_eq!(a.task.map(u64::from), Some(9001));

    match b.unwrap_err() {
        Error::HttpResponse { status, body, .. } => {
            assert_eq!(status, 422);
            assert!(body.contains("Not enough resources"));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let c = vm.host_operation(&c.unwrap()).unwrap();
    assert_eq!(c.id.map(u64::from), Some(103));

    // The failed sibling leaves the session usable.
    assert!(!handle.is_closed());
    let follow_up = vm.get_task(1_u64).await;
    assert!(matches!(follow_up, Err(Error::HttpResponse { status: 404, .. })));

    vm.close();
    assert_eq!(handle.release_count(), 1);
}

#[tokio::test]
async fn test_concurrent_task_lookups_are_independent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/vm/v3/task"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"list": []})))
        .mount(&server)
        .await;

    let config = SessionConfig::new(server.uri()).unwrap();
    let vm = VmSession::open(&config).unwrap();

    let (r1, r2, r3) = tokio::join!(
        vm.get_task_by_consul_id(1_u64),
        vm.get_task_by_consul_id(2_u64),
        vm.get_task_by_consul_id(3_u64),
    );

    for tasks in [r1, r2, r3] {
        assert!(tasks.unwrap().is_empty());
    }
}
