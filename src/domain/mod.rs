pub mod actor;
pub mod weather;
