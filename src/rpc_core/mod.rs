pub mod constants;
pub mod errors;
pub mod methods;
pub mod models;
