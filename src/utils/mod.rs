pub mod logging;
pub mod quantity;
pub mod time;
