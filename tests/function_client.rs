use campaign_console::campaign::StageTrigger;
use campaign_console::functions::{
    stage_payload, FunctionError, FunctionInvoker, FunctionSettings, HttpFunctionInvoker,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings(endpoint: String, api_key: Option<&str>) -> FunctionSettings {
    FunctionSettings {
        endpoint,
        project: "console-test".to_string(),
        api_key: api_key.map(str::to_string),
    }
}

#[tokio::test]
async fn creates_async_execution_with_stringified_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/functions/create-certs/executions"))
        .and(header("X-Appwrite-Project", "console-test"))
        .and(header("X-Appwrite-Key", "secret"))
        .and(body_json(json!({
            "body": "{\"campaignId\":\"42\"}",
            "async": true,
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"$id": "exec-1"})))
        .expect(1)
        .mount(&server)
        .await;

    let invoker = HttpFunctionInvoker::new(settings(server.uri(), Some("secret"))).unwrap();
    invoker
        .invoke(StageTrigger::Create.function_id(), stage_payload(42))
        .await
        .expect("execution accepted");
}

#[tokio::test]
async fn api_key_header_is_omitted_when_not_configured() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/functions/send-email/executions"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&server)
        .await;

    let endpoint = format!("{}/", server.uri());
    let invoker = HttpFunctionInvoker::new(settings(endpoint, None)).unwrap();
    invoker.invoke("send-email", stage_payload(7)).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("x-appwrite-key").is_none());
}

#[tokio::test]
async fn non_success_status_is_an_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/functions/create-email-obj/executions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("missing scope"))
        .mount(&server)
        .await;

    let invoker = HttpFunctionInvoker::new(settings(server.uri(), None)).unwrap();
    let err = invoker
        .invoke("create-email-obj", stage_payload(1))
        .await
        .unwrap_err();

    match err {
        FunctionError::Api(status, body) => {
            assert_eq!(status, 401);
            assert_eq!(body, "missing scope");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn unreachable_endpoint_is_a_network_error() {
    let invoker =
        HttpFunctionInvoker::new(settings("http://127.0.0.1:1".to_string(), None)).unwrap();
    let err = invoker.invoke("send-email", stage_payload(1)).await.unwrap_err();
    assert!(matches!(err, FunctionError::Network(_)));
}
