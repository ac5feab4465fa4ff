// Domain layer: request/response models and ports. No HTTP types here.

pub mod model;
pub mod ports;
