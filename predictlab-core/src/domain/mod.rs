//! Domain types for PredictLab

pub mod bar;
pub mod frame;

pub use bar::PriceBar;
pub use frame::PriceFrame;
