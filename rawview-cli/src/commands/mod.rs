pub mod identifiers;
pub mod open;
pub mod plugins;
