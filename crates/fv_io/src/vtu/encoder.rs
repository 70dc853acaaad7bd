//! 数据数组编码器 (ASCII / 内联 Base64)
//!
//! VTK 内联二进制格式：
//! - 每个数组一个数据块：Header (u32 字节数, 小端) + Data (原始小端二进制)
//! - Header 与 Data 连续编码为同一段 base64
//! - 写在 `<DataArray format="binary">` 元素内部

use crate::config::Encoding;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use std::io::{self, Write};

/// 可写入 VTK 数据数组的标量
pub trait VtkScalar: Copy {
    /// VTK `type` 属性值
    const VTK_TYPE: &'static str;

    /// 追加小端字节
    fn extend_le(self, buf: &mut Vec<u8>);

    /// 写出文本形式
    fn write_ascii<W: Write>(self, w: &mut W) -> io::Result<()>;
}

macro_rules! impl_vtk_float {
    ($t:ty, $name:literal) => {
        impl VtkScalar for $t {
            const VTK_TYPE: &'static str = $name;

            #[inline]
            fn extend_le(self, buf: &mut Vec<u8>) {
                buf.extend_from_slice(&self.to_le_bytes());
            }

            #[inline]
            fn write_ascii<W: Write>(self, w: &mut W) -> io::Result<()> {
                write!(w, "{:e}", self)
            }
        }
    };
}

macro_rules! impl_vtk_int {
    ($t:ty, $name:literal) => {
        impl VtkScalar for $t {
            const VTK_TYPE: &'static str = $name;

            #[inline]
            fn extend_le(self, buf: &mut Vec<u8>) {
                buf.extend_from_slice(&self.to_le_bytes());
            }

            #[inline]
            fn write_ascii<W: Write>(self, w: &mut W) -> io::Result<()> {
                write!(w, "{}", self)
            }
        }
    };
}

impl_vtk_float!(f32, "Float32");
impl_vtk_float!(f64, "Float64");
impl_vtk_int!(i32, "Int32");
impl_vtk_int!(u8, "UInt8");

/// 二进制编码器
#[derive(Debug, Default)]
pub struct BinaryEncoder {
    buffer: Vec<u8>,
}

impl BinaryEncoder {
    /// 创建新编码器
    pub fn new() -> Self {
        Self::default()
    }

    /// 编码一个完整数组：Header (4 bytes) + Data
    pub fn encode<T: VtkScalar>(&mut self, data: &[T]) -> io::Result<()> {
        let n_bytes = std::mem::size_of_val(data);
        let header = u32::try_from(n_bytes).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("数组 {n_bytes} 字节超出 UInt32 头范围"),
            )
        })?;
        self.buffer.reserve(4 + n_bytes);
        self.buffer.extend_from_slice(&header.to_le_bytes());
        for &v in data {
            v.extend_le(&mut self.buffer);
        }
        Ok(())
    }

    /// 取出 base64 文本并清空缓冲区
    pub fn finish(&mut self) -> String {
        let encoded = BASE64.encode(&self.buffer);
        self.buffer.clear();
        encoded
    }
}

/// 写出一个 `<DataArray>` 元素
///
/// `per_line` 控制 ASCII 模式下每行的数值个数。
pub(crate) fn write_data_array<W: Write, T: VtkScalar>(
    w: &mut W,
    encoding: Encoding,
    name: &str,
    components: usize,
    per_line: usize,
    values: &[T],
) -> io::Result<()> {
    write!(w, r#"        <DataArray type="{}" Name="{}""#, T::VTK_TYPE, name)?;
    if components > 1 {
        write!(w, r#" NumberOfComponents="{}""#, components)?;
    }
    writeln!(w, r#" format="{}">"#, encoding.vtk_format())?;

    match encoding {
        Encoding::Ascii => {
            for line in values.chunks(per_line.max(1)) {
                write!(w, "         ")?;
                for &v in line {
                    write!(w, " ")?;
                    v.write_ascii(w)?;
                }
                writeln!(w)?;
            }
        }
        Encoding::Binary => {
            let mut encoder = BinaryEncoder::new();
            encoder.encode(values)?;
            writeln!(w, "          {}", encoder.finish())?;
        }
    }

    writeln!(w, "        </DataArray>")?;
    Ok(())
}
