//! # Descriptor Resolution
//!
//! Resolves a method symbol against a runtime-fetched [`DescriptorPool`] and
//! pulls in every schema extension the server knows about for the message types
//! the method touches.
//!
//! Extensions are discovered by walking the input and output message types
//! depth-first: any nested message type that declares extension ranges is
//! queried on the server, and the files defining its extensions are registered
//! into the live pool. Real-world schemas are frequently self- or mutually
//! referential, so the walk keeps a visited set keyed by fully-qualified type
//! name.

use crate::BoxError;
use crate::reflection::client::{ReflectionClient, ReflectionResolveError};
use crate::symbol::{SymbolParseError, parse_symbol};
use async_trait::async_trait;
use http_body::Body as HttpBody;
use prost_reflect::{DescriptorError, DescriptorPool, Kind, MessageDescriptor, MethodDescriptor};
use prost_types::FileDescriptorSet;
use std::collections::HashSet;
use tonic::client::GrpcService;

/// Errors that can occur while resolving a method symbol.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error(transparent)]
    Symbol(#[from] SymbolParseError),
    #[error("Target server does not expose service '{0}'")]
    ServiceNotFound(String),
    #[error("Service '{service}' does not include a method named '{method}'")]
    MethodNotFound { service: String, method: String },
}

/// Errors that can occur while resolving server extensions.
#[derive(Debug, thiserror::Error)]
pub enum SchemaResolutionError {
    #[error("Failed to query extensions of type '{type_name}': {source}")]
    Query {
        type_name: String,
        #[source]
        source: ReflectionResolveError,
    },
    #[error("Could not register extensions of type '{type_name}': {source}")]
    Register {
        type_name: String,
        #[source]
        source: DescriptorError,
    },
}

/// Resolves a `"service/method"` (or `"service.method"`) symbol into the method
/// descriptor held by `pool`.
pub fn resolve_method(
    pool: &DescriptorPool,
    symbol: &str,
) -> Result<MethodDescriptor, ResolveError> {
    let (service_name, method_name) = parse_symbol(symbol)?;

    let service = pool
        .get_service_by_name(service_name)
        .ok_or_else(|| ResolveError::ServiceNotFound(service_name.to_string()))?;

    service
        .methods()
        .find(|m| m.name() == method_name)
        .ok_or_else(|| ResolveError::MethodNotFound {
            service: service_name.to_string(),
            method: method_name.to_string(),
        })
}

/// The remote lookups needed by the extension walk.
///
/// Implemented by [`ReflectionClient`]; kept as a trait so the walk can be
/// exercised against a scripted source in tests.
#[async_trait]
pub trait ExtensionSource {
    /// Tag numbers of all extensions of `type_name` known to the server.
    async fn all_extension_numbers_of_type(
        &mut self,
        type_name: &str,
    ) -> Result<Vec<i32>, ReflectionResolveError>;

    /// The file (with transitive dependencies) defining extension `number` of
    /// `type_name`.
    async fn file_containing_extension(
        &mut self,
        type_name: &str,
        number: i32,
    ) -> Result<FileDescriptorSet, ReflectionResolveError>;
}

#[async_trait]
impl<S> ExtensionSource for ReflectionClient<S>
where
    S: GrpcService<tonic::body::Body> + Send,
    S::Error: Into<BoxError>,
    S::Future: Send,
    S::ResponseBody: HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
    <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
{
    async fn all_extension_numbers_of_type(
        &mut self,
        type_name: &str,
    ) -> Result<Vec<i32>, ReflectionResolveError> {
        ReflectionClient::all_extension_numbers_of_type(self, type_name).await
    }

    async fn file_containing_extension(
        &mut self,
        type_name: &str,
        number: i32,
    ) -> Result<FileDescriptorSet, ReflectionResolveError> {
        ReflectionClient::file_containing_extension(self, type_name, number).await
    }
}

/// Walks `roots` and every nested message type depth-first, registering all
/// server-known extensions into `pool`.
///
/// Types without declared extension ranges are skipped without a remote
/// round-trip. Returns the set of visited type names; each type is visited at
/// most once even when the schema graph contains cycles.
pub async fn fetch_all_extensions<S>(
    source: &mut S,
    pool: &mut DescriptorPool,
    roots: impl IntoIterator<Item = MessageDescriptor>,
) -> Result<HashSet<String>, SchemaResolutionError>
where
    S: ExtensionSource + Send,
{
    let mut visited = HashSet::new();
    let mut stack: Vec<MessageDescriptor> = roots.into_iter().collect();

    while let Some(message) = stack.pop() {
        let type_name = message.full_name().to_string();
        if !visited.insert(type_name.clone()) {
            continue;
        }

        if !message.descriptor_proto().extension_range.is_empty() {
            register_extensions_of(source, pool, &type_name).await?;
        }

        for field in message.fields() {
            if let Kind::Message(nested) = field.kind() {
                stack.push(nested);
            }
        }
    }

    Ok(visited)
}

async fn register_extensions_of<S>(
    source: &mut S,
    pool: &mut DescriptorPool,
    type_name: &str,
) -> Result<(), SchemaResolutionError>
where
    S: ExtensionSource + Send,
{
    let numbers = source
        .all_extension_numbers_of_type(type_name)
        .await
        .map_err(|source| SchemaResolutionError::Query {
            type_name: type_name.to_string(),
            source,
        })?;

    tracing::debug!(%type_name, extensions = numbers.len(), "resolved extension numbers");

    for number in numbers {
        let fd_set = source
            .file_containing_extension(type_name, number)
            .await
            .map_err(|source| SchemaResolutionError::Query {
                type_name: type_name.to_string(),
                source,
            })?;

        // Files already present in the pool are skipped so that re-registering
        // a dependency under the same name cannot conflict.
        let fresh: Vec<_> = fd_set
            .file
            .into_iter()
            .filter(|file| pool.get_file_by_name(file.name()).is_none())
            .collect();

        pool.add_file_descriptor_set(FileDescriptorSet { file: fresh })
            .map_err(|source| SchemaResolutionError::Register {
                type_name: type_name.to_string(),
                source,
            })?;
    }

    Ok(())
}
