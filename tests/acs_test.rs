#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use reqwest::Url;
use subclean::{
    acs::{APP_ID, AcsClient, DeleteOutcome, SubscriberDeleter},
    store::SubscriberId,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path},
};

fn client(server: &MockServer) -> AcsClient {
    AcsClient::new(Url::parse(&server.uri()).unwrap()).unwrap()
}

#[tokio::test]
async fn test_delete_request_shape() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/cc/subscriber/8d1b4c2e-0f6a-4c57-9a3e-2b1f00c0ffee"))
        .and(header("appid", APP_ID))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = client(&server)
        .delete(&SubscriberId::from("8d1b4c2e-0f6a-4c57-9a3e-2b1f00c0ffee"))
        .await
        .unwrap();
    assert_eq!(outcome, DeleteOutcome::Deleted);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let request = requests.first().unwrap();
    assert_eq!(request.method.as_str(), "DELETE");
    assert_eq!(
        request.headers.get("appid").unwrap().to_str().unwrap(),
        "Cleanup"
    );
}

#[tokio::test]
async fn test_delete_statuses() {
    for status in [201, 204, 400, 404, 500, 503] {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;

        let outcome = client(&server)
            .delete(&SubscriberId::from("s1"))
            .await
            .unwrap();
        assert_eq!(outcome, DeleteOutcome::Rejected(status));
    }
}

#[tokio::test]
async fn test_delete_transport_failure() {
    let acs = AcsClient::new(Url::parse("http://127.0.0.1:1").unwrap()).unwrap();
    let err = acs.delete(&SubscriberId::from("s1")).await.unwrap_err();
    assert!(format!("{err:#}").contains("DELETE http://127.0.0.1:1/cc/subscriber/s1"));
}
