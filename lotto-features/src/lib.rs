pub mod config;
pub mod error;
pub mod linalg;
pub mod regressor;
pub mod scaler;
pub mod windows;
