// crates/fv_io/src/vtu/mod.rs
//! VTU 格式支持模块
//!
//! - [`piece`]: 单进程分片 (`.vtu`) 写出器
//! - [`manifest`]: 并行清单 (`.pvtu`) 与 VisIt 索引 (`.visit`)
//! - [`encoder`]: 数据数组的 ASCII/Base64 编码
//!
//! # 文件命名
//!
//! - 分片：`<base>_<rank>.vtu`，进程编号补零到 4 位
//! - 清单：`<base>.pvtu`
//!
//! `base` 可以带目录；清单中的分片引用只使用文件名部分，因此清单与分片必须位于同一目录。

pub mod encoder;
pub mod manifest;
pub mod piece;

use crate::error::{IoError, IoResult};
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// 分片文件扩展名
pub const PIECE_EXTENSION: &str = "vtu";

/// 并行清单扩展名
pub const MANIFEST_EXTENSION: &str = "pvtu";

/// VisIt 索引扩展名
pub const VISIT_EXTENSION: &str = "visit";

/// 第 `rank` 个分片的路径
pub fn piece_path(base: &str, rank: usize) -> PathBuf {
    PathBuf::from(format!("{base}_{rank:04}.{PIECE_EXTENSION}"))
}

/// 并行清单路径
pub fn manifest_path(base: &str) -> PathBuf {
    PathBuf::from(format!("{base}.{MANIFEST_EXTENSION}"))
}

/// VisIt 索引路径
pub fn visit_path(base: &str) -> PathBuf {
    PathBuf::from(format!("{base}.{VISIT_EXTENSION}"))
}

/// 清单中引用第 `rank` 个分片的相对文件名
pub(crate) fn piece_source(base: &str, rank: usize) -> IoResult<String> {
    piece_path(base, rank)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| IoError::InvalidBaseName {
            base: base.to_string(),
        })
}

/// 转义 XML 属性值中的特殊字符
pub(crate) fn escape_attribute(value: &str) -> Cow<'_, str> {
    if !value.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(value);
    }
    let mut out = String::with_capacity(value.len() + 8);
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    Cow::Owned(out)
}

/// 基础文件名必须非空且以文件名结尾
pub(crate) fn check_base_name(base: &str) -> IoResult<()> {
    let ends_with_name = Path::new(base).file_name().is_some()
        && !base.ends_with('/')
        && !base.ends_with(std::path::MAIN_SEPARATOR);
    if base.is_empty() || !ends_with_name {
        return Err(IoError::InvalidBaseName {
            base: base.to_string(),
        });
    }
    Ok(())
}
