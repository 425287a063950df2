/// Audit logging for privileged property access and destructive operations.
pub mod audit;
/// Configuration management for stores and property sources.
pub mod config;
/// Logging setup.
pub mod telemetry;
