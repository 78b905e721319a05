//! # Generic gRPC Transport
//!
//! A thin, schema-agnostic gRPC client layer. The [`client::GrpcClient`] drives
//! a `tonic` channel with the [`codec::JsonCodec`], so requests and responses
//! travel as `serde_json::Value` and the Protobuf shapes are supplied at call
//! time through resolved descriptors.
pub mod client;
pub mod codec;
