use serde::{Deserialize, Serialize};

/// 表格读取后得到的原始二维单元格（按行存储）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawGrid {
    rows: Vec<Vec<Option<String>>>,
}

impl RawGrid {
    pub fn new(rows: Vec<Vec<Option<String>>>) -> Self {
        RawGrid { rows }
    }

    /// 从字符串构造，空字符串视为空单元格
    pub fn from_strings<S: AsRef<str>>(rows: &[Vec<S>]) -> Self {
        let rows = rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| {
                        let cell = cell.as_ref();
                        if cell.is_empty() {
                            None
                        } else {
                            Some(cell.to_string())
                        }
                    })
                    .collect()
            })
            .collect();
        RawGrid { rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// 最宽一行的列数
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// 越界或空单元格都返回 None
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .and_then(|c| c.as_deref())
    }

    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }
}

impl From<Vec<Vec<Option<String>>>> for RawGrid {
    fn from(rows: Vec<Vec<Option<String>>>) -> Self {
        RawGrid::new(rows)
    }
}
