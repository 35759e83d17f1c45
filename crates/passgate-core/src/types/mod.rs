//! Validated value types.
//!
//! These types enforce their invariants at construction time.

mod api_url;
mod namespace;

pub use api_url::ApiUrl;
pub use namespace::Namespace;
