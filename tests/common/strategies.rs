use proptest::prelude::*;

/// Strategy for generating resource names
pub fn resource_name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z_]{0,15}"
}

/// Strategy for generating record ids
pub fn record_id_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9-]{1,12}"
}

/// Strategy for generating cache keys of any shape
pub fn cache_key_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9:=&_-]{0,40}"
}

/// Strategy for generating query parameter sets
pub fn query_params_strategy() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec(("[a-z_]{1,10}", "[a-zA-Z0-9]{0,8}"), 0..6)
}

/// Strategy for generating HTTP error statuses
pub fn error_status_strategy() -> impl Strategy<Value = u16> {
    400u16..600
}
