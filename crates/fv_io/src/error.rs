// crates/fv_io/src/error.rs
//! IO 错误类型定义
//!
//! 错误分两类：
//!
//! - 文件系统错误：无法创建、写入或关闭分片/清单文件
//! - 协议错误：违反 header → fields → footer 调用顺序，或字段不合法
//!
//! 两类错误都同步返回给调用方，本层从不重试。
//! 所有错误最终可转换为 `FvError` 以实现跨层错误传递。

use crate::field::Association;
use fv_foundation::FvError;
use std::path::PathBuf;
use thiserror::Error;

/// IO 模块结果类型别名
pub type IoResult<T> = Result<T, IoError>;

/// IO 错误枚举
#[derive(Error, Debug)]
pub enum IoError {
    /// 文件系统错误
    #[error("文件系统错误: {path}: {source}")]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 重复写入文件头
    #[error("文件头已写入: 会话 {base} 仍处于打开状态")]
    HeaderAlreadyWritten { base: String },

    /// 尚未写入文件头
    #[error("{operation} 需要先调用 write_header")]
    HeaderNotWritten { operation: &'static str },

    /// 会话已关闭
    #[error("{operation} 调用时会话已关闭")]
    SessionClosed { operation: &'static str },

    /// 分片因先前的文件系统错误被放弃
    #[error("分片已放弃: {path}")]
    PieceAborted { path: PathBuf },

    /// footer 的基础文件名与 header 不一致
    #[error("基础文件名不匹配: 打开的会话为 {expected}, 调用参数为 {actual}")]
    BaseNameMismatch { expected: String, actual: String },

    /// 基础文件名无效
    #[error("无效的基础文件名: {base:?}")]
    InvalidBaseName { base: String },

    /// 字段名重复
    #[error("字段名重复: {name}")]
    DuplicateField { name: String },

    /// 字段名无效
    #[error("无效的字段名: {name:?}")]
    InvalidFieldName { name: String },

    /// 字段长度与点数/单元数不匹配
    #[error("字段长度不匹配: {name} 期望 {expected}, 实际 {actual}")]
    FieldLengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// 数据段已关闭，不能再次打开
    #[error("字段 {name} 所属的 {association} 数据段已关闭")]
    SectionClosed {
        name: String,
        association: Association,
    },

    /// 分片超出 Int32 下标范围
    #[error("分片过大: {points} 个点超出 Int32 范围")]
    PieceTooLarge { points: usize },

    /// 其他进程失败，清单未写出
    #[error("其他进程导出失败，未写出并行清单")]
    PeerFailed,

    /// 配置错误
    #[error("导出配置错误: {message}")]
    Config { message: String },

    /// 基础层错误转换
    #[error("基础层错误: {0}")]
    Foundation(#[from] FvError),
}

impl IoError {
    /// 创建文件系统错误
    pub fn file_system(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileSystem {
            path: path.into(),
            source,
        }
    }

    /// 创建配置错误
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// 是否为文件系统错误
    pub fn is_file_system_error(&self) -> bool {
        match self {
            Self::FileSystem { .. } | Self::PieceAborted { .. } => true,
            Self::Foundation(e) => e.is_io(),
            _ => false,
        }
    }

    /// 是否为协议使用错误
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            Self::HeaderAlreadyWritten { .. }
                | Self::HeaderNotWritten { .. }
                | Self::SessionClosed { .. }
                | Self::BaseNameMismatch { .. }
                | Self::DuplicateField { .. }
                | Self::InvalidFieldName { .. }
                | Self::FieldLengthMismatch { .. }
                | Self::SectionClosed { .. }
        )
    }
}

impl From<IoError> for FvError {
    fn from(err: IoError) -> Self {
        match err {
            IoError::FileSystem { path, source } => FvError::io(path, source),
            IoError::FieldLengthMismatch {
                name,
                expected,
                actual,
            } => FvError::size_mismatch(name, expected, actual),
            IoError::Config { message } => FvError::config(message),
            IoError::Foundation(e) => e,
            other if other.is_protocol_error() => FvError::protocol(other.to_string()),
            other => FvError::internal(other.to_string()),
        }
    }
}
