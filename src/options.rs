use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ImportError;

/// 解析参数，原先写死在解析器里的默认值都集中到这里
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    pub week_ceiling: u32,          // 单/双周关键字与默认周次的上限
    pub total_weeks: u32,           // 学期总周数
    pub header_scan_rows: usize,    // 查找星期表头时扫描的行数
    pub label_column: usize,        // 节次标签所在列
    pub default_session_pairs: Vec<(u32, u32)>, // 找不到节次行时补齐的节次
    pub bare_number_sessions: bool, // 标签单元格只有数字时按单节处理
    pub sheet: Option<String>,      // 工作表名称，缺省取第一个非空表
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            week_ceiling: 20,
            total_weeks: 20,
            header_scan_rows: 10,
            label_column: 0,
            default_session_pairs: vec![(1, 2), (3, 4), (5, 6), (7, 8), (9, 10)],
            bare_number_sessions: false,
            sheet: None,
        }
    }
}

impl ParseOptions {
    pub fn from_toml_str(text: &str) -> Result<Self, ImportError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ImportError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// 课程没有写周次时使用的默认周次文本，如 "[1-20周]"
    pub fn default_week_text(&self) -> String {
        format!("[1-{}周]", self.week_ceiling)
    }
}
