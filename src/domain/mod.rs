// Domain layer: request/response models and ports (interfaces) for models and configuration.

pub mod model;
pub mod ports;
