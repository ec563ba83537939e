pub mod cache;
pub mod delay;
pub mod export;
pub mod frequency;
pub mod patterns;
