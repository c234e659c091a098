//! Domain models shared between the backend and the desktop UI (via WASM)

pub mod grade;

pub use grade::*;
