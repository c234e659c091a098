//! Business logic services for the Paddy Collection Management Platform

pub mod farmer;
pub mod grade;
pub mod manufacturer;
pub mod price;
pub mod product;
pub mod purchase;
pub mod sale;
pub mod season;
pub mod stockpile;

pub use farmer::FarmerService;
pub use grade::GradeService;
pub use manufacturer::ManufacturerService;
pub use price::PricingService;
pub use product::ProductService;
pub use purchase::PurchaseService;
pub use sale::SalesService;
pub use season::SeasonService;
pub use stockpile::StockpileService;
