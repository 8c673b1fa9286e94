pub mod bolt;
pub mod mixer;
pub mod rain;
pub mod registry;
pub mod strike;
