pub mod archive;
pub mod deps;
pub mod host;
pub mod http;
pub mod ops;
pub mod runtime;
pub mod source;
pub mod store;
