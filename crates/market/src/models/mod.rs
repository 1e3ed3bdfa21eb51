//! 行情数据模型

pub mod chart;
pub mod detail;
pub mod financials;
pub mod flexible_float;
pub mod profile;
pub mod quote;

// 重新导出常用类型
pub use chart::*;
pub use detail::*;
pub use financials::*;
pub use flexible_float::*;
pub use profile::*;
pub use quote::*;
