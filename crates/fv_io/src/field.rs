// crates/fv_io/src/field.rs

//! 数据字段描述
//!
//! 调用方在 header 与 footer 之间追加任意数量的具名字段。字段按点或按单元关联，
//! 元组数量必须等于分片的点数或单元数。

use std::fmt;

/// 字段关联的实体
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Association {
    /// 每个点一个元组，写入 `<PointData>`
    Point,
    /// 每个单元一个元组，写入 `<CellData>`
    Cell,
}

impl Association {
    /// VTK 数据段元素名
    pub fn section_tag(&self) -> &'static str {
        match self {
            Self::Point => "PointData",
            Self::Cell => "CellData",
        }
    }
}

impl fmt::Display for Association {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.section_tag())
    }
}

/// 数值类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberType {
    /// 32 位整数
    Int32,
    /// 浮点，写出精度由配置决定
    Float,
}

/// 字段类型：数值类型 × 分量数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldKind {
    /// 数值类型
    pub number: NumberType,
    /// 分量数（标量 1，向量 3）
    pub components: usize,
}

/// 字段数据（借用调用方的数组）
#[derive(Debug, Clone, Copy)]
pub enum FieldData<'a> {
    /// 浮点标量
    ScalarF64(&'a [f64]),
    /// 浮点三维向量
    VectorF64(&'a [[f64; 3]]),
    /// 整数标量
    ScalarI32(&'a [i32]),
    /// 整数三维向量
    VectorI32(&'a [[i32; 3]]),
}

impl FieldData<'_> {
    /// 元组数量
    pub fn len(&self) -> usize {
        match self {
            Self::ScalarF64(v) => v.len(),
            Self::VectorF64(v) => v.len(),
            Self::ScalarI32(v) => v.len(),
            Self::VectorI32(v) => v.len(),
        }
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 字段类型
    pub fn kind(&self) -> FieldKind {
        let (number, components) = match self {
            Self::ScalarF64(_) => (NumberType::Float, 1),
            Self::VectorF64(_) => (NumberType::Float, 3),
            Self::ScalarI32(_) => (NumberType::Int32, 1),
            Self::VectorI32(_) => (NumberType::Int32, 3),
        };
        FieldKind { number, components }
    }
}

/// 一次字段写入
#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor<'a> {
    /// 字段名，会话内唯一
    pub name: &'a str,
    /// 关联实体
    pub association: Association,
    /// 数据
    pub data: FieldData<'a>,
}

impl<'a> FieldDescriptor<'a> {
    /// 创建字段描述
    pub fn new(name: &'a str, association: Association, data: FieldData<'a>) -> Self {
        Self {
            name,
            association,
            data,
        }
    }

    /// 单元浮点标量
    pub fn cell_scalar(name: &'a str, values: &'a [f64]) -> Self {
        Self::new(name, Association::Cell, FieldData::ScalarF64(values))
    }

    /// 单元浮点向量
    pub fn cell_vector(name: &'a str, values: &'a [[f64; 3]]) -> Self {
        Self::new(name, Association::Cell, FieldData::VectorF64(values))
    }

    /// 单元整数标量
    pub fn cell_int(name: &'a str, values: &'a [i32]) -> Self {
        Self::new(name, Association::Cell, FieldData::ScalarI32(values))
    }

    /// 点浮点标量
    pub fn point_scalar(name: &'a str, values: &'a [f64]) -> Self {
        Self::new(name, Association::Point, FieldData::ScalarF64(values))
    }

    /// 点浮点向量
    pub fn point_vector(name: &'a str, values: &'a [[f64; 3]]) -> Self {
        Self::new(name, Association::Point, FieldData::VectorF64(values))
    }

    /// 点整数标量
    pub fn point_int(name: &'a str, values: &'a [i32]) -> Self {
        Self::new(name, Association::Point, FieldData::ScalarI32(values))
    }

    /// 字段类型
    pub fn kind(&self) -> FieldKind {
        self.data.kind()
    }

    /// 清单中登记的字段信息
    pub fn info(&self) -> FieldInfo {
        FieldInfo {
            name: self.name.to_string(),
            association: self.association,
            kind: self.kind(),
        }
    }
}

/// 已写出字段的元信息，用于并行清单声明
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    /// 字段名
    pub name: String,
    /// 关联实体
    pub association: Association,
    /// 字段类型
    pub kind: FieldKind,
}

/// 字段名可直接写入 XML 属性
pub(crate) fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && !name
            .chars()
            .any(|c| matches!(c, '"' | '<' | '>' | '&' | '\'') || c.is_control())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_len() {
        let v = [[1.0, 2.0, 3.0]; 5];
        let field = FieldDescriptor::point_vector("velocity", &v);
        assert_eq!(field.data.len(), 5);
        assert_eq!(
            field.kind(),
            FieldKind {
                number: NumberType::Float,
                components: 3
            }
        );

        let ids = [1, 2];
        let info = FieldDescriptor::cell_int("id", &ids).info();
        assert_eq!(info.association, Association::Cell);
        assert_eq!(info.kind.number, NumberType::Int32);
    }

    #[test]
    fn test_valid_names() {
        assert!(is_valid_name("mpirank"));
        assert!(is_valid_name("water depth"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("a\"b"));
        assert!(!is_valid_name("x<y"));
        assert!(!is_valid_name("line\nbreak"));
    }
}
