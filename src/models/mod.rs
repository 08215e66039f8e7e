//! Request and Response models for the document cache API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{
    ArrayRequest, CreateCollectionRequest, QueryRequest, ReplaceRequest, UpdateRequest,
};
pub use responses::{
    CollectionsResponse, CreatedResponse, ErrorResponse, HealthResponse, MatchedResponse,
    RemovedResponse, StatsResponse,
};
