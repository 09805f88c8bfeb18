//! Standard error messages for consistent error responses.

pub const INVALID_JSON: &str = "Invalid JSON payload";
pub const VALIDATION_FAILED: &str = "Validation failed";
pub const ROUTE_NOT_FOUND: &str = "The requested resource was not found";
pub const METHOD_NOT_ALLOWED: &str = "The HTTP method is not allowed for this resource";
