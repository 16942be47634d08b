pub mod enricher;
pub mod llm;
pub mod optimizer;
pub mod osrm;
pub mod places;
pub mod route_planner;
pub mod structured;
