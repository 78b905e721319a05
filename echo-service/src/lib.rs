//! # Echo Service
//!
//! **INTERNAL USE ONLY**: This crate exists solely to provide a gRPC server
//! implementation and descriptor set for integration testing the `weft` tool.
//! It is not intended for production use.
//!
//! The Protobuf bindings, the descriptor set, and the server glue are
//! maintained by hand (mirroring what `tonic-prost-build` would emit for
//! `echo.proto`) so the fixture builds without a protoc toolchain.

use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{
    DescriptorProto, FieldDescriptorProto, FileDescriptorProto, FileDescriptorSet,
    MethodDescriptorProto, ServiceDescriptorProto,
};

pub mod pb {
    //! Message types for `echo.EchoService`. Field numbers are kept in sync
    //! with [`file_descriptor_set`](super::file_descriptor_set).

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct EchoRequest {
        #[prost(string, tag = "1")]
        pub message: ::prost::alloc::string::String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct EchoResponse {
        #[prost(string, tag = "1")]
        pub message: ::prost::alloc::string::String,
    }
}

pub use server::{EchoService, EchoServiceServer};

/// The descriptor set describing `echo.EchoService`, equivalent to compiling:
///
/// ```proto
/// syntax = "proto3";
/// package echo;
///
/// message EchoRequest { string message = 1; }
/// message EchoResponse { string message = 1; }
///
/// service EchoService {
///   rpc UnaryEcho(EchoRequest) returns (EchoResponse);
///   rpc FailingEcho(EchoRequest) returns (EchoResponse);
///   rpc ServerStreamingEcho(EchoRequest) returns (stream EchoResponse);
/// }
/// ```
///
/// `ServerStreamingEcho` is declared but not served: it exists so clients can
/// observe a streaming method descriptor.
pub fn file_descriptor_set() -> FileDescriptorSet {
    let string_field = |name: &str| FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(1),
        label: Some(Label::Optional as i32),
        r#type: Some(Type::String as i32),
        json_name: Some(name.to_string()),
        ..Default::default()
    };

    let message = |name: &str| DescriptorProto {
        name: Some(name.to_string()),
        field: vec![string_field("message")],
        ..Default::default()
    };

    let unary = |name: &str| MethodDescriptorProto {
        name: Some(name.to_string()),
        input_type: Some(".echo.EchoRequest".to_string()),
        output_type: Some(".echo.EchoResponse".to_string()),
        ..Default::default()
    };

    FileDescriptorSet {
        file: vec![FileDescriptorProto {
            name: Some("echo.proto".to_string()),
            package: Some("echo".to_string()),
            syntax: Some("proto3".to_string()),
            message_type: vec![message("EchoRequest"), message("EchoResponse")],
            service: vec![ServiceDescriptorProto {
                name: Some("EchoService".to_string()),
                method: vec![
                    unary("UnaryEcho"),
                    unary("FailingEcho"),
                    MethodDescriptorProto {
                        server_streaming: Some(true),
                        ..unary("ServerStreamingEcho")
                    },
                ],
                ..Default::default()
            }],
            ..Default::default()
        }],
    }
}

mod server {
    //! Hand-maintained equivalent of the `tonic-prost-build` server glue for
    //! the unary methods of `echo.EchoService`.

    use super::pb::{EchoRequest, EchoResponse};
    use tonic::codegen::*;

    #[async_trait]
    pub trait EchoService: std::marker::Send + std::marker::Sync + 'static {
        async fn unary_echo(
            &self,
            request: tonic::Request<EchoRequest>,
        ) -> std::result::Result<tonic::Response<EchoResponse>, tonic::Status>;

        async fn failing_echo(
            &self,
            request: tonic::Request<EchoRequest>,
        ) -> std::result::Result<tonic::Response<EchoResponse>, tonic::Status>;
    }

    #[derive(Debug)]
    pub struct EchoServiceServer<T> {
        inner: Arc<T>,
    }

    impl<T> EchoServiceServer<T> {
        pub fn new(inner: T) -> Self {
            Self {
                inner: Arc::new(inner),
            }
        }
    }

    impl<T> Clone for EchoServiceServer<T> {
        fn clone(&self) -> Self {
            Self {
                inner: Arc::clone(&self.inner),
            }
        }
    }

    impl<T, B> Service<http::Request<B>> for EchoServiceServer<T>
    where
        T: EchoService,
        B: Body + std::marker::Send + 'static,
        B::Error: Into<StdError> + std::marker::Send + 'static,
    {
        type Response = http::Response<tonic::body::Body>;
        type Error = std::convert::Infallible;
        type Future = BoxFuture<Self::Response, Self::Error>;

        fn poll_ready(
            &mut self,
            _cx: &mut Context<'_>,
        ) -> Poll<std::result::Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: http::Request<B>) -> Self::Future {
            match req.uri().path() {
                "/echo.EchoService/UnaryEcho" => {
                    #[allow(non_camel_case_types)]
                    struct UnaryEchoSvc<T: EchoService>(pub Arc<T>);
                    impl<T: EchoService> tonic::server::UnaryService<EchoRequest> for UnaryEchoSvc<T> {
                        type Response = EchoResponse;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(&mut self, request: tonic::Request<EchoRequest>) -> Self::Future {
                            let inner = Arc::clone(&self.0);
                            let fut =
                                async move { <T as EchoService>::unary_echo(&inner, request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = Arc::clone(&self.inner);
                    let fut = async move {
                        let method = UnaryEchoSvc(inner);
                        let codec = tonic_prost::ProstCodec::default();
                        let mut grpc = tonic::server::Grpc::new(codec);
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/echo.EchoService/FailingEcho" => {
                    #[allow(non_camel_case_types)]
                    struct FailingEchoSvc<T: EchoService>(pub Arc<T>);
                    impl<T: EchoService> tonic::server::UnaryService<EchoRequest> for FailingEchoSvc<T> {
                        type Response = EchoResponse;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(&mut self, request: tonic::Request<EchoRequest>) -> Self::Future {
                            let inner = Arc::clone(&self.0);
                            let fut = async move {
                                <T as EchoService>::failing_echo(&inner, request).await
                            };
                            Box::pin(fut)
                        }
                    }
                    let inner = Arc::clone(&self.inner);
                    let fut = async move {
                        let method = FailingEchoSvc(inner);
                        let codec = tonic_prost::ProstCodec::default();
                        let mut grpc = tonic::server::Grpc::new(codec);
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                _ => Box::pin(async move {
                    let mut response = http::Response::new(tonic::body::Body::default());
                    let headers = response.headers_mut();
                    headers.insert(
                        http::header::CONTENT_TYPE,
                        http::HeaderValue::from_static("application/grpc"),
                    );
                    headers.insert("grpc-status", http::HeaderValue::from_static("12"));
                    Ok(response)
                }),
            }
        }
    }

    impl<T> tonic::server::NamedService for EchoServiceServer<T> {
        const NAME: &'static str = "echo.EchoService";
    }
}
