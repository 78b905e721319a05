//! # Weft Core
//!
//! `weft-core` is the foundational library powering the Weft CLI. It combines two
//! engines:
//!
//! * A **dynamic invocation engine**: a gRPC client capable of calling any server
//!   without compile-time knowledge of the Protobuf schema. Method and message
//!   shapes are resolved at call time through the gRPC Server Reflection
//!   Protocol, including any schema extensions the server knows about.
//! * A **sequential flow engine**: ordered test scenarios ("flows") whose steps
//!   are dynamic gRPC calls or plain HTTP calls. Each step's decoded output is
//!   recorded in a per-run context, can be projected into a later step's request
//!   body through `$path` templating, and is checked against declarative
//!   assertions. The first failure of any kind aborts the remaining steps.
//!
//! ## Key Components
//!
//! * **[`invoke::invoke_unary`]:** One full dynamic unary call: symbol parsing,
//!   descriptor and extension resolution, JSON encoding, metadata handling and
//!   status classification.
//! * **[`flow::LinearFlow`]:** The step sequencer. It owns the per-run
//!   [`flow::FlowContext`] and evaluates assertions through an extensible
//!   [`assert::OperatorRegistry`].
//! * **[`executor::StepExecutor`]:** The capability interface shared by the RPC
//!   and REST step implementations; the flow engine depends only on this trait.
//!
//! ## Internal clients
//!
//! * **[`grpc::client::GrpcClient`]:** A dynamic unary gRPC client using a custom
//!   JSON codec.
//! * **[`reflection::client::ReflectionClient`]:** A gRPC Server Reflection
//!   consumer covering the operations the invocation engine needs: symbol
//!   resolution, service listing and extension lookups.
//!
//! ## Re-exports
//!
//! This crate re-exports `prost`, `prost-reflect`, and `tonic` to ensure that
//! consumers use compatible versions of these underlying dependencies.
pub mod assert;
pub mod connect;
pub mod descriptor;
pub mod executor;
pub mod flow;
pub mod grpc;
pub mod invoke;
pub mod metadata;
pub mod path;
pub mod reflection;
pub mod symbol;

// Re-exports
pub use prost;
pub use prost_reflect;
pub use tonic;

/// Type alias for the standard boxed error used in generic bounds.
type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
