/// API route handlers
///
/// - `health`: Health check endpoint
/// - `operations`: Single entry point for every engine operation

pub mod health;
pub mod operations;
