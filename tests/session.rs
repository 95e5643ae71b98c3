//! Session-credential mirroring tests.

use httpmock::prelude::*;
use multiserver_client::{ClientConfig, HostConfig, MultiServerClient};

fn session_config(project: &str, host: &str) -> ClientConfig {
    let mut config = ClientConfig::default();
    config.project_key = project.into();
    config.hosts = vec![HostConfig::new(host)];
    config.probe_path = None;
    config.session_enabled = true;
    config
}

#[tokio::test]
async fn authorization_header_is_mirrored_through_storage() {
    let app = MockServer::start_async().await;

    app.mock_async(|when, then| {
        when.method(GET).path("/login");
        then.status(200).header("authorization", "token-1");
    })
    .await;
    let authed = app
        .mock_async(|when, then| {
            when.method(GET).path("/me").header("authorization", "token-1");
            then.status(200);
        })
        .await;

    let client = MultiServerClient::new(session_config("sess", &app.base_url())).unwrap();

    // Response header lands in storage under {project_key}_session.
    client.get("/login").await.unwrap();
    assert_eq!(
        client.storage().get("sess_session").as_deref(),
        Some("token-1")
    );

    // And rides along on the next request.
    let response = client.get("/me").await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(authed.hits_async().await, 1);
}

#[tokio::test]
async fn empty_authorization_header_clears_the_session() {
    let app = MockServer::start_async().await;

    app.mock_async(|when, then| {
        when.method(GET).path("/login");
        then.status(200).header("authorization", "token-9");
    })
    .await;
    app.mock_async(|when, then| {
        when.method(GET).path("/logout");
        then.status(200).header("authorization", "");
    })
    .await;

    let client = MultiServerClient::new(session_config("clear", &app.base_url())).unwrap();

    client.get("/login").await.unwrap();
    assert!(client.storage().get("clear_session").is_some());

    client.get("/logout").await.unwrap();
    assert_eq!(client.storage().get("clear_session"), None);
}

#[tokio::test]
async fn responses_without_authorization_leave_session_untouched() {
    let app = MockServer::start_async().await;

    app.mock_async(|when, then| {
        when.method(GET).path("/login");
        then.status(200).header("authorization", "token-2");
    })
    .await;
    app.mock_async(|when, then| {
        when.method(GET).path("/plain");
        then.status(200);
    })
    .await;

    let client = MultiServerClient::new(session_config("keep", &app.base_url())).unwrap();

    client.get("/login").await.unwrap();
    client.get("/plain").await.unwrap();
    assert_eq!(
        client.storage().get("keep_session").as_deref(),
        Some("token-2")
    );
}

#[tokio::test]
async fn session_glue_disabled_by_default() {
    let app = MockServer::start_async().await;

    app.mock_async(|when, then| {
        when.method(GET).path("/login");
        then.status(200).header("authorization", "token-3");
    })
    .await;

    let mut config = session_config("off", &app.base_url());
    config.session_enabled = false;

    let client = MultiServerClient::new(config).unwrap();
    client.get("/login").await.unwrap();
    assert_eq!(client.storage().get("off_session"), None);
}
