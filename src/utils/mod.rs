pub mod username_cache;
pub mod username_filter;
