//! HTTP API handlers for birdcall-id

pub mod birds;
pub mod health;
pub mod identify;

pub use birds::bird_routes;
pub use health::health_routes;
pub use identify::identify_routes;
