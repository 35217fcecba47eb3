pub mod network;
pub mod optimizer;
pub mod trainer;
