// Adapters layer: concrete table stores and the transports that drive the handler.

pub mod csv_store;
pub mod form_body;
pub mod http;
pub mod lambda_event;
pub mod memory_store;
pub mod remote_store;
pub mod store;
