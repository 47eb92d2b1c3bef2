pub mod directional_coupler;
pub mod edge_coupler;
pub mod taper;
