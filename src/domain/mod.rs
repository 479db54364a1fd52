// Domain layer: entities and the ports (interfaces) the services depend on.

pub mod model;
pub mod ports;
