pub mod loader;
pub mod schema;

pub use loader::{DataLoadError, Scenario, load_network_input, load_scenario};
