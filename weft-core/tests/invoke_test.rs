use echo_service::{EchoServiceServer, file_descriptor_set};
use echo_service_impl::EchoServiceImpl;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tonic::Code;
use tonic::service::Routes;
use weft_core::descriptor::ResolveError;
use weft_core::grpc::client::GrpcClient;
use weft_core::invoke::{InvokeError, invoke_unary};
use weft_core::reflection::client::{ReflectionClient, ReflectionResolveError};

mod echo_service_impl;

fn setup() -> (
    ReflectionClient<Routes>,
    GrpcClient<Routes>,
    Arc<AtomicUsize>,
) {
    let reflection_service = tonic_reflection::server::Builder::configure()
        .register_file_descriptor_set(file_descriptor_set())
        .build_v1()
        .unwrap();

    let (echo_impl, counter) = EchoServiceImpl::new();
    let service = Routes::new(reflection_service).add_service(EchoServiceServer::new(echo_impl));

    (
        ReflectionClient::new(service.clone()),
        GrpcClient::new(service),
        counter,
    )
}

#[tokio::test]
async fn lists_services_via_reflection() {
    let (mut reflection, _, _) = setup();

    let services = reflection.list_services().await.unwrap();
    assert!(services.contains(&"echo.EchoService".to_string()));
    assert!(services.contains(&"grpc.reflection.v1.ServerReflection".to_string()));
}

#[tokio::test]
async fn unary_call_resolves_schema_and_propagates_headers() {
    let (mut reflection, mut grpc, counter) = setup();

    let envelope = invoke_unary(
        &mut reflection,
        &mut grpc,
        "echo.EchoService/UnaryEcho",
        &["X-Request-Id: abc".to_string()],
        [json!({"message": "hello"})],
    )
    .await
    .unwrap();

    assert_eq!(envelope.payload, json!({"message": "hello"}));
    assert_eq!(
        envelope
            .headers
            .get("x-request-id")
            .unwrap()
            .to_str()
            .unwrap(),
        "abc"
    );
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn dot_separated_symbols_resolve_too() {
    let (mut reflection, mut grpc, _) = setup();

    let envelope = invoke_unary(
        &mut reflection,
        &mut grpc,
        "echo.EchoService.UnaryEcho",
        &[],
        [json!({"message": "dotted"})],
    )
    .await
    .unwrap();

    assert_eq!(envelope.payload, json!({"message": "dotted"}));
}

#[tokio::test]
async fn empty_supplier_sends_the_empty_message() {
    let (mut reflection, mut grpc, counter) = setup();

    let envelope = invoke_unary(
        &mut reflection,
        &mut grpc,
        "echo.EchoService/UnaryEcho",
        &[],
        [],
    )
    .await
    .unwrap();

    assert!(envelope.payload.is_object());
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn malformed_symbol_is_a_parse_error() {
    let (mut reflection, mut grpc, counter) = setup();

    let result = invoke_unary(&mut reflection, &mut grpc, "noseparator", &[], []).await;

    assert!(matches!(
        result,
        Err(InvokeError::Resolve(ResolveError::Symbol(_)))
    ));
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unknown_service_surfaces_the_reflection_failure() {
    let (mut reflection, mut grpc, _) = setup();

    let result = invoke_unary(
        &mut reflection,
        &mut grpc,
        "echo.GhostService/UnaryEcho",
        &[],
        [],
    )
    .await;

    assert!(matches!(
        result,
        Err(InvokeError::Reflection(
            ReflectionResolveError::ServerStreamFailure(status)
        )) if status.code() == Code::NotFound
    ));
}

#[tokio::test]
async fn unknown_method_is_reported_by_name() {
    let (mut reflection, mut grpc, _) = setup();

    let result = invoke_unary(
        &mut reflection,
        &mut grpc,
        "echo.EchoService/GhostMethod",
        &[],
        [],
    )
    .await;

    assert!(matches!(
        result,
        Err(InvokeError::Resolve(ResolveError::MethodNotFound { method, .. }))
            if method == "GhostMethod"
    ));
}

#[tokio::test]
async fn second_message_fails_before_the_network_call() {
    let (mut reflection, mut grpc, counter) = setup();

    let result = invoke_unary(
        &mut reflection,
        &mut grpc,
        "echo.EchoService/UnaryEcho",
        &[],
        [json!({"message": "one"}), json!({"message": "two"})],
    )
    .await;

    assert!(matches!(
        result,
        Err(InvokeError::MultipleMessagesForUnary(method))
            if method == "echo.EchoService.UnaryEcho"
    ));
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn streaming_methods_are_refused() {
    let (mut reflection, mut grpc, counter) = setup();

    let result = invoke_unary(
        &mut reflection,
        &mut grpc,
        "echo.EchoService/ServerStreamingEcho",
        &[],
        [json!({"message": "x"})],
    )
    .await;

    assert!(matches!(
        result,
        Err(InvokeError::StreamingUnsupported(_))
    ));
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn schema_mismatch_is_an_encode_error() {
    let (mut reflection, mut grpc, counter) = setup();

    let result = invoke_unary(
        &mut reflection,
        &mut grpc,
        "echo.EchoService/UnaryEcho",
        &[],
        [json!({"ghost_field": "oops"})],
    )
    .await;

    assert!(matches!(result, Err(InvokeError::Encode { .. })));
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn non_ok_status_carries_code_and_message() {
    let (mut reflection, mut grpc, _) = setup();

    let result = invoke_unary(
        &mut reflection,
        &mut grpc,
        "echo.EchoService/FailingEcho",
        &[],
        [json!({"message": "x"})],
    )
    .await;

    assert!(matches!(
        result,
        Err(InvokeError::Status { code, ref message })
            if code == Code::FailedPrecondition && message == "scripted failure"
    ));
}
