//! # Invocation Pipeline
//!
//! One full dynamic unary call, end to end:
//!
//! `resolve method → fetch extensions → encode request → attach metadata →
//! send → await response → classify status`.
//!
//! Only unary semantics are supported. The request messages come from a
//! supplier: yielding a second message for a unary method is a usage error that
//! is caught before anything is sent; yielding none sends the empty message.
//! A non-OK terminal status never produces a payload; it is surfaced as
//! [`InvokeError::Status`] carrying the code and message, and is not retried.

use crate::BoxError;
use crate::descriptor::{ResolveError, SchemaResolutionError, fetch_all_extensions, resolve_method};
use crate::grpc::client::{GrpcClient, GrpcRequestError, ResponseEnvelope};
use crate::metadata::{MetadataError, metadata_from_headers, to_metadata_map};
use crate::reflection::client::{ReflectionClient, ReflectionResolveError};
use crate::symbol::parse_symbol;
use http_body::Body as HttpBody;
use prost_reflect::{DescriptorError, DescriptorPool, DynamicMessage};
use tonic::client::GrpcService;

/// Errors that can occur during a dynamic unary invocation.
#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("Reflection resolution failed: '{0}'")]
    Reflection(#[from] ReflectionResolveError),

    #[error("Failed to decode file descriptor set: '{0}'")]
    Descriptor(#[from] DescriptorError),

    #[error(transparent)]
    Extensions(#[from] SchemaResolutionError),

    #[error("Method '{0}' is a unary RPC, but request data contained more than one message")]
    MultipleMessagesForUnary(String),

    #[error("Method '{0}' is a streaming RPC, only unary methods are supported")]
    StreamingUnsupported(String),

    #[error("Request for '{symbol}' does not match the resolved schema: {source}")]
    Encode {
        symbol: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error("gRPC client request error: '{0}'")]
    Request(#[from] GrpcRequestError),

    #[error("Call failed with status {code:?}: {message}")]
    Status { code: tonic::Code, message: String },
}

/// Executes one dynamic unary call against `symbol`
/// (`"package.Service/Method"` or `"package.Service.Method"`).
///
/// The schema is fetched through `reflection` at call time; extensions of every
/// message type the method touches are resolved before encoding. `headers` are
/// `"Name: Value"` strings, folded and base64-handled per [`crate::metadata`].
/// `requests` must yield at most one message.
pub async fn invoke_unary<S, I>(
    reflection: &mut ReflectionClient<S>,
    grpc: &mut GrpcClient<S>,
    symbol: &str,
    headers: &[String],
    requests: I,
) -> Result<ResponseEnvelope, InvokeError>
where
    I: IntoIterator<Item = serde_json::Value>,
    S: GrpcService<tonic::body::Body> + Send,
    S::Error: Into<BoxError>,
    S::Future: Send,
    S::ResponseBody: HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
    <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
{
    let (service_name, _) = parse_symbol(symbol).map_err(ResolveError::from)?;

    let fd_set = reflection.file_descriptor_set_by_symbol(service_name).await?;
    let mut pool = DescriptorPool::from_file_descriptor_set(fd_set)?;

    let method = resolve_method(&pool, symbol)?;
    tracing::debug!(method = method.full_name(), "resolved method descriptor");

    if method.is_client_streaming() || method.is_server_streaming() {
        return Err(InvokeError::StreamingUnsupported(
            method.full_name().to_string(),
        ));
    }

    fetch_all_extensions(
        reflection,
        &mut pool,
        [method.input(), method.output()],
    )
    .await?;

    // Descriptor handles snapshot the pool they were resolved from, so the
    // method is re-resolved after extension registration to make the codec see
    // the extended schema.
    let method = resolve_method(&pool, symbol)?;

    let mut supplier = requests.into_iter();
    let payload = supplier.next().unwrap_or_else(|| serde_json::json!({}));
    if supplier.next().is_some() {
        return Err(InvokeError::MultipleMessagesForUnary(
            method.full_name().to_string(),
        ));
    }

    // Pre-validate so schema mismatches surface as a typed encode error before
    // any bytes are written to the wire.
    DynamicMessage::deserialize(method.input(), payload.clone()).map_err(|source| {
        InvokeError::Encode {
            symbol: symbol.to_string(),
            source,
        }
    })?;

    let metadata = to_metadata_map(&metadata_from_headers(headers))?;

    tracing::debug!(
        method = method.full_name(),
        header_count = metadata.len(),
        "sending unary request"
    );

    match grpc.unary(method, payload, metadata).await? {
        Ok(envelope) => Ok(envelope),
        Err(status) => Err(InvokeError::Status {
            code: status.code(),
            message: status.message().to_string(),
        }),
    }
}
