// Domain layer: core models and ports (interfaces) for the relocation workflow.

pub mod model;
pub mod ports;
