// crates/fv_io/src/config.rs

//! 导出配置
//!
//! 所有字段都有默认值，JSON 中缺省的字段取默认值。
//!
//! ```
//! use fv_io::config::{Encoding, ExportConfig};
//!
//! let config: ExportConfig = serde_json::from_str(r#"{ "encoding": "binary" }"#).unwrap();
//! assert_eq!(config.encoding, Encoding::Binary);
//! assert_eq!(config.scale, 1.0);
//! ```

use crate::error::{IoError, IoResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 数据数组编码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// 文本
    #[default]
    Ascii,
    /// 内联 base64（UInt32 字节数头 + 小端数据）
    Binary,
}

impl Encoding {
    /// VTK `format` 属性值
    pub fn vtk_format(&self) -> &'static str {
        match self {
            Self::Ascii => "ascii",
            Self::Binary => "binary",
        }
    }
}

/// 点坐标和浮点字段的写出精度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    /// 单精度，VTK `Float32`
    #[default]
    F32,
    /// 双精度，VTK `Float64`
    F64,
}

impl Precision {
    /// VTK 类型名
    pub fn vtk_type(&self) -> &'static str {
        match self {
            Self::F32 => "Float32",
            Self::F64 => "Float64",
        }
    }
}

/// 导出配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// 数据数组编码
    pub encoding: Encoding,

    /// 浮点精度
    pub precision: Precision,

    /// 单元绕中心收缩比例，取值 (0, 1]，1 表示不收缩
    pub scale: f64,

    /// 写出 `treeid` 单元字段
    pub write_tree: bool,

    /// 写出 `level` 单元字段
    pub write_level: bool,

    /// `mpirank` 字段取进程编号对此值的余数
    pub wrap_rank: Option<usize>,

    /// 协调进程额外写出 VisIt `.visit` 文件
    pub write_visit: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            encoding: Encoding::Ascii,
            precision: Precision::F32,
            scale: 1.0,
            write_tree: false,
            write_level: false,
            wrap_rank: None,
            write_visit: false,
        }
    }
}

impl ExportConfig {
    /// 写出所有可选单元字段的配置
    pub fn full() -> Self {
        Self {
            write_tree: true,
            write_level: true,
            ..Default::default()
        }
    }

    /// 从 JSON 文件加载并校验
    pub fn from_json_file(path: impl AsRef<Path>) -> IoResult<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| IoError::file_system(path, e))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| IoError::config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// 校验取值范围
    pub fn validate(&self) -> IoResult<()> {
        if !(self.scale > 0.0 && self.scale <= 1.0) {
            return Err(IoError::config(format!(
                "scale 必须位于 (0, 1], 实际 {}",
                self.scale
            )));
        }
        if self.wrap_rank == Some(0) {
            return Err(IoError::config("wrap_rank 必须为正"));
        }
        Ok(())
    }

    /// 写出的 `mpirank` 值
    pub fn rank_value(&self, rank: usize) -> usize {
        match self.wrap_rank {
            Some(wrap) if wrap > 0 => rank % wrap,
            _ => rank,
        }
    }
}
