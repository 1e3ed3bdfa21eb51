//! # Dogonomics Core
//!
//! 核心基础设施：配置、日志、错误、缓存

pub mod cache;
pub mod config;
pub mod error;
pub mod logger;
