use mockito::Matcher;
use proxy_probe::rpc_core::errors::ProbeError;
use proxy_probe::rpc_core::methods::{RequestFactory, RpcMethod};
use proxy_probe::rpc_core::models::{BlockTag, CallRequest, RpcReply, Tristate};
use proxy_probe::transport::client::RpcClient;
use serde_json::json;
use std::time::Duration;

fn client(url: &str) -> RpcClient {
    RpcClient::with_http_client(url, reqwest::Client::new(), Duration::from_secs(5))
}

#[tokio::test]
async fn test_block_number_scenario() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .match_header("content-type", "application/json")
        .match_body(Matcher::PartialJson(json!({
            "jsonrpc": "2.0",
            "method": "eth_blockNumber",
            "params": [],
            "id": 1
        })))
        .with_status(200)
        .with_body(r#"{"jsonrpc":"2.0","id":1,"result":"0x10"}"#)
        .create_async()
        .await;

    let client = client(&server.url());
    let request = client.factory().build(RpcMethod::BlockNumber, vec![]);
    let reply = client.call(&request).await.unwrap();

    let success = reply.as_success().expect("success reply");
    assert_eq!(success.id, request.id());
    assert!(success.result.as_str().unwrap().starts_with("0x"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_call_with_null_fields_scenario() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({
            "method": "eth_call",
            "params": [{"to": null, "data": null}, "latest"],
            "id": 7
        })))
        .with_status(200)
        .with_body(
            r#"{"jsonrpc":"2.0","id":7,"error":{"code":-32602,"message":"missing value for required argument 0"}}"#,
        )
        .create_async()
        .await;

    let client = client(&server.url());
    let call = CallRequest::new()
        .with_to(Tristate::<String>::Null)
        .with_data(Tristate::<String>::Null);
    let params = client.factory().call(&call, BlockTag::Latest.into()).params().to_vec();
    let request = RequestFactory::new().build_with_id(RpcMethod::Call, params, 7);

    let reply = client.call(&request).await.unwrap();
    let error = reply.as_error().expect("error reply");
    assert_eq!(error.error.message, "missing value for required argument 0");
    assert_eq!(error.id, Some(request.id()));
}

#[tokio::test]
async fn test_null_result_is_success() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/")
        .with_body(r#"{"jsonrpc":"2.0","id":1,"result":null}"#)
        .create_async()
        .await;

    let client = client(&server.url());
    let request = client.factory().get_transaction_receipt("0xdeadbeef");
    let reply = client.call(&request).await.unwrap();
    assert!(matches!(reply, RpcReply::Success(ref r) if r.result.is_null()));
}

#[tokio::test]
async fn test_http_error_without_envelope() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/")
        .with_status(502)
        .with_body("Bad Gateway")
        .create_async()
        .await;

    let client = client(&server.url());
    let err = client.block_number().await.unwrap_err();
    match err {
        ProbeError::Http { status, body } => {
            assert_eq!(status, 502);
            assert_eq!(body, "Bad Gateway");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_error_envelope_with_http_500_is_still_a_reply() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/")
        .with_status(500)
        .with_body(r#"{"jsonrpc":"2.0","id":null,"error":{"code":-32700,"message":"Parse error"}}"#)
        .create_async()
        .await;

    let client = client(&server.url());
    let request = client.factory().block_number();
    let reply = client.call(&request).await.unwrap();
    assert_eq!(reply.id(), None);
    assert_eq!(reply.as_error().unwrap().error.code, -32700);
}

#[tokio::test]
async fn test_typed_helpers_decode_quantities() {
    let mut server = mockito::Server::new_async().await;
    let _balance = server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({"method": "eth_getBalance"})))
        .with_body(r#"{"jsonrpc":"2.0","id":1,"result":"0xde0b6b3a7640000"}"#)
        .create_async()
        .await;
    let _net = server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({"method": "net_version"})))
        .with_body(r#"{"jsonrpc":"2.0","id":2,"result":"245022926"}"#)
        .create_async()
        .await;

    let client = client(&server.url());
    assert_eq!(
        client.get_balance("0x0000000000000000000000000000000000000001").await.unwrap(),
        1_000_000_000_000_000_000
    );
    let neon = client
        .get_balance_neon("0x0000000000000000000000000000000000000001")
        .await
        .unwrap();
    assert!((neon - 1.0).abs() < 1e-12);
    assert_eq!(client.chain_id_via_net_version().await.unwrap(), 245022926);
}

#[tokio::test]
async fn test_rpc_error_surfaces_through_typed_helper() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/")
        .with_body(r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"nonce too low"}}"#)
        .create_async()
        .await;

    let client = client(&server.url());
    let err = client.send_raw_transaction("0xf86c").await.unwrap_err();
    assert!(matches!(err, ProbeError::Rpc { code: -32000, ref message } if message == "nonce too low"));
}
