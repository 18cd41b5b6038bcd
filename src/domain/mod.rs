// Domain layer: resource model and the ports the services depend on.

pub mod model;
pub mod ports;
