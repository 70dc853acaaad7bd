// crates/fv_foundation/src/lib.rs

//! ForestVTK Foundation Layer
//!
//! 基础层，提供整个项目共享的最小抽象。
//!
//! # 模块概览
//!
//! - [`dimension`]: 编译期维度标记 (D2/D3)，包含角点数、最大层级和 VTK 单元类型
//! - [`error`]: 统一错误类型
//!
//! # 示例
//!
//! ```
//! use fv_foundation::dimension::{Dimension, D2, D3};
//!
//! assert_eq!(D2::CORNERS, 4);
//! assert_eq!(D3::CORNERS, 8);
//! assert_eq!(D3::VTK_NODE_ORDER, &[0, 1, 3, 2, 4, 5, 7, 6]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dimension;
pub mod error;

// 重导出常用类型
pub use dimension::{Dimension, D2, D3};
pub use error::{FvError, FvResult};
