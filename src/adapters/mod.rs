// Adapters layer: concrete implementations of the domain ports.

pub mod http_gateway;
pub mod templates;

pub use http_gateway::HttpGateway;
pub use templates::TemplateRegistry;
