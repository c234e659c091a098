//! HTTP handlers for the Paddy Collection Management Platform

pub mod farmer;
pub mod grade;
pub mod health;
pub mod manufacturer;
pub mod price;
pub mod product;
pub mod purchase;
pub mod sale;
pub mod season;
pub mod stockpile;
pub mod weighbridge;

pub use farmer::*;
pub use grade::*;
pub use health::*;
pub use manufacturer::*;
pub use price::*;
pub use product::*;
pub use purchase::*;
pub use sale::*;
pub use season::*;
pub use stockpile::*;
pub use weighbridge::*;
