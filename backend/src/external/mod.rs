//! External device integrations

pub mod weighbridge;

pub use weighbridge::WeighbridgeClient;
