pub mod dto;
mod service;

pub use service::NutrientService;
