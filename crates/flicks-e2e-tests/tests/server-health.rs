use flicks_e2e_tests::{base_url, launch_env, prepare_env};
use tracing::info;
use tracing_test::traced_test;

#[tokio::test]
#[traced_test]
async fn test_health() {
    let (args, _config_guard) = prepare_env("test_health").await.unwrap();
    let base_url = base_url(&args).unwrap();

    let (client, _server) = launch_env(args).await.unwrap();

    let url = base_url.join("v1/healthcheck").unwrap();
    let response = client.get(url).send().await.unwrap();
    info! {"Response: {:#?}", response};
    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!("available", body["status"]);
    assert_eq!("development", body["system_info"]["environment"]);
    assert!(body["system_info"]["version"].is_string());

    let url = base_url.join("v2/movies").unwrap();
    let response = client.get(url).send().await.unwrap();
    assert_eq!(404, response.status().as_u16());
}
