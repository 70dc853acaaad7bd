// tests/common/mod.rs

//! 测试辅助：从写出的 XML 中读回数据

#![allow(dead_code)]

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::Path;

/// 读取整个文件
pub fn read(path: impl AsRef<Path>) -> String {
    let path = path.as_ref();
    std::fs::read_to_string(path).unwrap_or_else(|e| panic!("读取 {} 失败: {e}", path.display()))
}

/// 读回 ASCII 数据数组
pub fn ascii_array(xml: &str, name: &str) -> Vec<f64> {
    let tag = format!(r#"Name="{name}""#);
    let start = xml
        .find(&tag)
        .unwrap_or_else(|| panic!("缺少数组 {name}"));
    let body = start + xml[start..].find('>').unwrap() + 1;
    let end = body + xml[body..].find("</DataArray>").unwrap();
    xml[body..end]
        .split_whitespace()
        .map(|s| s.parse::<f64>().unwrap())
        .collect()
}

/// 解码二进制数据数组，返回包含 UInt32 字节数头的原始字节
pub fn binary_payload(xml: &str, name: &str) -> Vec<u8> {
    let tag = format!(r#"Name="{name}""#);
    let start = xml
        .find(&tag)
        .unwrap_or_else(|| panic!("缺少数组 {name}"));
    let body = start + xml[start..].find('>').unwrap() + 1;
    let end = body + xml[body..].find("</DataArray>").unwrap();
    STANDARD.decode(xml[body..end].trim()).unwrap()
}

/// 读取属性值，例如 `NumberOfCells`
pub fn attribute(xml: &str, attr: &str) -> usize {
    let tag = format!(r#"{attr}=""#);
    let start = xml.find(&tag).unwrap() + tag.len();
    let end = start + xml[start..].find('"').unwrap();
    xml[start..end].parse().unwrap()
}

/// 清单中按出现顺序列出的分片文件名
pub fn manifest_sources(xml: &str) -> Vec<String> {
    xml.lines()
        .filter_map(|l| l.trim().strip_prefix(r#"<Piece Source=""#))
        .map(|rest| rest.trim_end_matches(r#""/>"#).to_string())
        .collect()
}
