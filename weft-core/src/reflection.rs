//! # Server Reflection
//!
//! This module contains the logic necessary to interact with the gRPC Server
//! Reflection Protocol.
//!
//! It enables the invocation engine to query a server for its own Protobuf
//! schema at runtime, so that calls can be made without pre-compiled
//! descriptors. The protocol bindings come from `tonic-reflection`'s shipped
//! `pb::v1` module; only the consumer side is implemented here.
pub mod client;
