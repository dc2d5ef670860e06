//! JSON-RPC error codes used by the stdio transport.

pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
