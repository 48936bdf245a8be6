pub mod analysis;
pub mod scenarios;
