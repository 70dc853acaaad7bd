// crates/fv_foundation/src/error.rs

//! 错误处理模块，定义统一错误类型
//!
//! 提供 `FvError` 枚举和 `FvResult` 类型别名，供森林、几何和通信层使用。
//! IO 层错误在 `fv_io` 中扩展，并可转换回 `FvError`。
//!
//! # 示例
//!
//! ```
//! use fv_foundation::error::{FvError, FvResult};
//!
//! fn check_level(level: u8) -> FvResult<()> {
//!     if level > 29 {
//!         return Err(FvError::invalid_input("层级超出范围"));
//!     }
//!     Ok(())
//! }
//! assert!(check_level(30).is_err());
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// 统一结果类型
pub type FvResult<T> = Result<T, FvError>;

/// ForestVTK 错误类型
#[derive(Error, Debug)]
pub enum FvError {
    /// IO 错误
    #[error("IO错误: {path}: {source}")]
    Io {
        /// 出错的文件路径
        path: PathBuf,
        /// 底层 IO 错误
        #[source]
        source: std::io::Error,
    },

    /// 无效输入
    #[error("无效的输入数据: {message}")]
    InvalidInput {
        /// 说明无效原因
        message: String,
    },

    /// 数组大小不匹配
    #[error("数组大小不匹配: {name} 期望{expected}, 实际{actual}")]
    SizeMismatch {
        /// 数据名称
        name: String,
        /// 期望大小
        expected: usize,
        /// 实际大小
        actual: usize,
    },

    /// 配置错误
    #[error("配置错误: {message}")]
    Config {
        /// 具体错误信息
        message: String,
    },

    /// 协议使用错误（调用顺序等）
    #[error("协议错误: {message}")]
    Protocol {
        /// 具体错误信息
        message: String,
    },

    /// 内部错误
    #[error("内部错误: {message}")]
    Internal {
        /// 内部错误描述
        message: String,
    },
}

impl FvError {
    /// 创建 IO 错误
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// 创建无效输入错误
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// 创建大小不匹配错误
    pub fn size_mismatch(name: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::SizeMismatch {
            name: name.into(),
            expected,
            actual,
        }
    }

    /// 创建配置错误
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// 创建协议错误
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// 是否为文件系统错误
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}
