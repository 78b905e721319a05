//! # Generic gRPC Client
//!
//! Wraps a standard `tonic` client to provide a schema-agnostic interface for
//! unary gRPC communication. It does not need to know the structure of the data
//! it is sending; it simply ensures the connection is established and passes
//! the `serde_json::Value` and `MethodDescriptor` to the
//! [`super::codec::JsonCodec`].
//!
//! * **Dynamic Pathing**: constructs the HTTP/2 path (e.g.
//!   `/package.Service/Method`) at runtime.
//! * **Metadata Handling**: attaches a prepared
//!   [`tonic::metadata::MetadataMap`] to the outgoing request.
use super::codec::JsonCodec;
use crate::BoxError;
use http_body::Body as HttpBody;
use prost_reflect::MethodDescriptor;
use std::str::FromStr;
use tonic::metadata::MetadataMap;
use tonic::{client::GrpcService, transport::Channel};

#[derive(thiserror::Error, Debug)]
pub enum GrpcRequestError {
    #[error("Internal error, the client was not ready: '{0}'")]
    ClientNotReady(#[source] BoxError),
}

/// The decoded result of a successful unary exchange.
#[derive(Debug, Clone)]
pub struct ResponseEnvelope {
    /// Header metadata received with the response.
    pub headers: MetadataMap,
    /// The decoded response payload.
    pub payload: serde_json::Value,
}

/// A generic client for dynamic unary gRPC calls.
pub struct GrpcClient<S = Channel> {
    client: tonic::client::Grpc<S>,
}

impl<S> GrpcClient<S>
where
    S: GrpcService<tonic::body::Body>,
    S::Error: Into<BoxError>,
    S::ResponseBody: HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
    <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
{
    pub fn new(service: S) -> Self {
        let client = tonic::client::Grpc::new(service);
        Self { client }
    }

    /// Performs a Unary gRPC call (Single Request -> Single Response).
    ///
    /// # Returns
    /// * `Ok(Ok(ResponseEnvelope))` - Successful RPC execution.
    /// * `Ok(Err(Status))` - RPC executed, but server returned a non-OK status.
    /// * `Err(GrpcRequestError)` - Failed to send the request at all.
    pub async fn unary(
        &mut self,
        method: MethodDescriptor,
        payload: serde_json::Value,
        metadata: MetadataMap,
    ) -> Result<Result<ResponseEnvelope, tonic::Status>, GrpcRequestError> {
        self.client
            .ready()
            .await
            .map_err(|e| GrpcRequestError::ClientNotReady(e.into()))?;

        let codec = JsonCodec::new(method.input(), method.output());
        let path = http_path(&method);

        let mut request = tonic::Request::new(payload);
        *request.metadata_mut() = metadata;

        match self.client.unary(request, path, codec).await {
            Ok(response) => {
                let headers = response.metadata().clone();
                Ok(Ok(ResponseEnvelope {
                    headers,
                    payload: response.into_inner(),
                }))
            }
            Err(status) => Ok(Err(status)),
        }
    }
}

fn http_path(method: &MethodDescriptor) -> http::uri::PathAndQuery {
    let path = format!("/{}/{}", method.parent_service().full_name(), method.name());
    http::uri::PathAndQuery::from_str(&path).expect("valid gRPC path")
}
