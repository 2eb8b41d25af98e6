use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::grid::RawGrid;
use crate::options::ParseOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderColumn {
    pub column_index: usize,
    pub day_of_week: u8, // 1 = 星期一 ... 7 = 星期日
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRow {
    pub row_index: usize,
    pub start_session: u32,
    pub end_session: u32,
}

/// 星期表头的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeaderSource {
    Detected,     // 七天都在表格里找到
    Extrapolated, // 找到一部分，其余按列顺延
    Positional,   // 完全没找到，按列位置分配
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionSource {
    Detected,
    Synthesized,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridStructure {
    pub header_row: usize,
    pub header_columns: Vec<HeaderColumn>,
    pub session_rows: Vec<SessionRow>,
    pub header_source: HeaderSource,
    pub session_source: SessionSource,
}

static WEEKDAY_PATTERNS: Lazy<Vec<(u8, Regex)>> = Lazy::new(|| {
    [
        (1, r"(?i)^\s*(?:星期一|周一|礼拜一|mon(?:day)?\b)"),
        (2, r"(?i)^\s*(?:星期二|周二|礼拜二|tue(?:s(?:day)?)?\b)"),
        (3, r"(?i)^\s*(?:星期三|周三|礼拜三|wed(?:nesday)?\b)"),
        (4, r"(?i)^\s*(?:星期四|周四|礼拜四|thu(?:r(?:s(?:day)?)?)?\b)"),
        (5, r"(?i)^\s*(?:星期五|周五|礼拜五|fri(?:day)?\b)"),
        (6, r"(?i)^\s*(?:星期六|周六|礼拜六|sat(?:urday)?\b)"),
        (7, r"(?i)^\s*(?:星期[日天]|周[日天]|礼拜[日天]|sun(?:day)?\b)"),
    ]
    .iter()
    .map(|(day, pattern)| (*day, Regex::new(pattern).unwrap()))
    .collect()
});

static SESSION_RANGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"第?(\d+)[-~、至到,，](\d+)(?:节|讲|课)").unwrap());
static SINGLE_SESSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"第?(\d+)(?:节|讲|课)").unwrap());
static BARE_NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\d{1,2})\s*$").unwrap());
static SEMESTER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d{4}\s*[-－~至]\s*\d{4}\s*学年\s*第?\s*[一二三123]\s*学期").unwrap()
});

const MORNING: (u32, u32) = (1, 4);
const AFTERNOON: (u32, u32) = (5, 8);
const EVENING: (u32, u32) = (9, 12);

pub fn match_weekday(cell: &str) -> Option<u8> {
    WEEKDAY_PATTERNS
        .iter()
        .find(|(_, re)| re.is_match(cell))
        .map(|(day, _)| *day)
}

fn ordered(start: u32, end: u32) -> Option<(u32, u32)> {
    if start == 0 || end == 0 {
        return None;
    }
    Some((start.min(end), start.max(end)))
}

fn match_session_range(label: &str) -> Option<(u32, u32)> {
    let caps = SESSION_RANGE_RE.captures(label)?;
    ordered(caps[1].parse().ok()?, caps[2].parse().ok()?)
}

fn match_single_session(label: &str) -> Option<(u32, u32)> {
    let caps = SINGLE_SESSION_RE.captures(label)?;
    let session = caps[1].parse().ok()?;
    ordered(session, session)
}

fn match_day_part(label: &str) -> Option<(u32, u32)> {
    if ["上午", "早上", "早晨"].iter().any(|k| label.contains(k)) {
        Some(MORNING)
    } else if label.contains("下午") {
        Some(AFTERNOON)
    } else if ["晚上", "晚间", "夜间"].iter().any(|k| label.contains(k)) {
        Some(EVENING)
    } else {
        None
    }
}

fn match_bare_number(label: &str) -> Option<(u32, u32)> {
    let caps = BARE_NUMBER_RE.captures(label)?;
    let session: u32 = caps[1].parse().ok()?;
    if (1..=12).contains(&session) {
        Some((session, session))
    } else {
        None
    }
}

/// 识别节次标签，如 "第1-2节"、"3节"、"下午"
pub fn match_session_label(label: &str, bare_numbers: bool) -> Option<(u32, u32)> {
    match_session_range(label)
        .or_else(|| match_single_session(label))
        .or_else(|| match_day_part(label))
        .or_else(|| {
            if bare_numbers {
                match_bare_number(label)
            } else {
                None
            }
        })
}

pub fn detect_structure(grid: &RawGrid) -> GridStructure {
    detect_structure_with(grid, &ParseOptions::default())
}

pub fn detect_structure_with(grid: &RawGrid, options: &ParseOptions) -> GridStructure {
    let (header_row, header_columns, header_source) = detect_header(grid, options);
    let (session_rows, session_source) = detect_session_rows(grid, header_row, options);

    info!(
        "表格结构: 表头第{}行, {} 列星期({:?}), {} 行节次({:?})",
        header_row,
        header_columns.len(),
        header_source,
        session_rows.len(),
        session_source
    );

    GridStructure {
        header_row,
        header_columns,
        session_rows,
        header_source,
        session_source,
    }
}

fn detect_header(
    grid: &RawGrid,
    options: &ParseOptions,
) -> (usize, Vec<HeaderColumn>, HeaderSource) {
    let mut header_row = None;
    let mut columns: Vec<HeaderColumn> = Vec::new();

    for (row_index, row) in grid.rows().iter().enumerate().take(options.header_scan_rows) {
        for (column_index, cell) in row.iter().enumerate() {
            let Some(day) = cell.as_deref().and_then(match_weekday) else {
                continue;
            };
            // 每列、每天只取第一次出现
            if columns
                .iter()
                .any(|c| c.column_index == column_index || c.day_of_week == day)
            {
                continue;
            }
            header_row.get_or_insert(row_index);
            columns.push(HeaderColumn {
                column_index,
                day_of_week: day,
            });
        }
    }

    let Some(header_row) = header_row else {
        return (0, positional_columns(grid, options), HeaderSource::Positional);
    };

    if columns.len() == 7 {
        columns.sort_by_key(|c| c.column_index);
        return (header_row, columns, HeaderSource::Detected);
    }

    // 缺少的星期按最右侧的列依次向右补齐
    let max_column = columns.iter().map(|c| c.column_index).max().unwrap_or(0);
    let mut next_column = max_column + 1;
    for day in 1..=7u8 {
        if columns.iter().any(|c| c.day_of_week == day) {
            continue;
        }
        debug!("表头缺少星期{}，推断为第{}列", day, next_column);
        columns.push(HeaderColumn {
            column_index: next_column,
            day_of_week: day,
        });
        next_column += 1;
    }
    columns.sort_by_key(|c| c.column_index);
    (header_row, columns, HeaderSource::Extrapolated)
}

fn positional_columns(grid: &RawGrid, options: &ParseOptions) -> Vec<HeaderColumn> {
    let first_column = options.label_column + 1;
    let count = if grid.is_empty() {
        7
    } else {
        grid.column_count().saturating_sub(first_column).min(7)
    };
    debug!("未找到星期表头，按列位置分配 {} 列", count);
    (0..count)
        .map(|i| HeaderColumn {
            column_index: first_column + i,
            day_of_week: i as u8 + 1,
        })
        .collect()
}

fn detect_session_rows(
    grid: &RawGrid,
    header_row: usize,
    options: &ParseOptions,
) -> (Vec<SessionRow>, SessionSource) {
    let session_rows: Vec<SessionRow> = (header_row + 1..grid.row_count())
        .filter_map(|row_index| {
            let label = grid.cell(row_index, options.label_column)?;
            let (start_session, end_session) =
                match_session_label(label, options.bare_number_sessions)?;
            Some(SessionRow {
                row_index,
                start_session,
                end_session,
            })
        })
        .collect();

    if !session_rows.is_empty() {
        return (session_rows, SessionSource::Detected);
    }

    debug!("未找到节次行，从第{}行开始补齐默认节次", header_row + 1);
    let synthesized = options
        .default_session_pairs
        .iter()
        .enumerate()
        .map(|(i, &(start_session, end_session))| SessionRow {
            row_index: header_row + 1 + i,
            start_session,
            end_session,
        })
        .collect();
    (synthesized, SessionSource::Synthesized)
}

/// 从表头及其上方的标题行提取学期，如 "2025-2026学年第1学期"
pub fn detect_semester(grid: &RawGrid, header_row: usize) -> Option<String> {
    grid.rows()
        .iter()
        .take(header_row + 1)
        .flatten()
        .flatten()
        .find_map(|cell| SEMESTER_RE.find(cell))
        .map(|m| m.as_str().split_whitespace().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn days(structure: &GridStructure) -> Vec<(usize, u8)> {
        structure
            .header_columns
            .iter()
            .map(|c| (c.column_index, c.day_of_week))
            .collect()
    }

    #[test]
    fn test_detect_semester() {
        let grid = RawGrid::from_strings(&[
            vec!["", "张三 2025-2026学年 第1学期 课表"],
            vec!["", "周一"],
        ]);
        assert_eq!(
            detect_semester(&grid, 1).as_deref(),
            Some("2025-2026学年第1学期")
        );
        assert_eq!(detect_semester(&RawGrid::default(), 0), None);
    }

    #[test]
    fn test_match_weekday() {
        assert_eq!(match_weekday("星期一"), Some(1));
        assert_eq!(match_weekday(" 周三 "), Some(3));
        assert_eq!(match_weekday("礼拜天"), Some(7));
        assert_eq!(match_weekday("Thursday"), Some(4));
        assert_eq!(match_weekday("SAT"), Some(6));
        assert_eq!(match_weekday("Monkey"), None);
        assert_eq!(match_weekday("[1]数据结构[1-16周][1-2节]"), None);
    }

    #[test]
    fn test_match_session_label() {
        assert_eq!(match_session_label("第1-2节", true), Some((1, 2)));
        assert_eq!(match_session_label("3、4节", true), Some((3, 4)));
        assert_eq!(match_session_label("第5讲", true), Some((5, 5)));
        assert_eq!(match_session_label("上午", true), Some((1, 4)));
        assert_eq!(match_session_label("下午", true), Some((5, 8)));
        assert_eq!(match_session_label("晚间", true), Some((9, 12)));
        assert_eq!(match_session_label("7", true), Some((7, 7)));
        assert_eq!(match_session_label("7", false), None);
        assert_eq!(match_session_label("13", true), None);
        assert_eq!(match_session_label("备注", true), None);
    }

    #[test]
    fn test_detect_full_header() {
        let grid = RawGrid::from_strings(&[
            vec!["2025-2026学年第1学期课表"],
            vec![""],
            vec!["节次", "周一", "周二", "周三", "周四", "周五", "周六", "周日"],
            vec!["第1-2节", "", "", "", "", "", "", ""],
            vec!["备注"],
            vec!["第3节"],
            vec!["下午"],
            vec!["星期一"],
        ]);
        let structure = detect_structure(&grid);
        assert_eq!(structure.header_row, 2);
        assert_eq!(structure.header_source, HeaderSource::Detected);
        assert_eq!(
            days(&structure),
            vec![(1, 1), (2, 2), (3, 3), (4, 4), (5, 5), (6, 6), (7, 7)]
        );
        assert_eq!(structure.session_source, SessionSource::Detected);
        let rows: Vec<(usize, u32, u32)> = structure
            .session_rows
            .iter()
            .map(|r| (r.row_index, r.start_session, r.end_session))
            .collect();
        assert_eq!(rows, vec![(3, 1, 2), (5, 3, 3), (6, 5, 8)]);
    }

    #[test]
    fn test_extrapolate_missing_days() {
        let grid = RawGrid::from_strings(&[
            vec!["", "", "Mon", "Tue", "Wed", "Thu", "Fri"],
            vec!["1", "", "", "", "", "", ""],
        ]);
        let structure = detect_structure(&grid);
        assert_eq!(structure.header_source, HeaderSource::Extrapolated);
        assert_eq!(
            days(&structure),
            vec![(2, 1), (3, 2), (4, 3), (5, 4), (6, 5), (7, 6), (8, 7)]
        );
    }

    #[test]
    fn test_numeric_labels() {
        let grid = RawGrid::from_strings(&[
            vec!["", "周一", "周二", "周三", "周四", "周五", "周六", "周日"],
            vec!["1"],
            vec!["2"],
        ]);
        // 默认不把纯数字当作节次
        let structure = detect_structure(&grid);
        assert_eq!(structure.session_source, SessionSource::Synthesized);
        assert_eq!(structure.session_rows.len(), 5);
        assert_eq!(structure.session_rows[0].start_session, 1);
        assert_eq!(structure.session_rows[0].end_session, 2);

        let options = ParseOptions {
            bare_number_sessions: true,
            ..ParseOptions::default()
        };
        let structure = detect_structure_with(&grid, &options);
        assert_eq!(structure.session_source, SessionSource::Detected);
        let rows: Vec<(usize, u32, u32)> = structure
            .session_rows
            .iter()
            .map(|r| (r.row_index, r.start_session, r.end_session))
            .collect();
        assert_eq!(rows, vec![(1, 1, 1), (2, 2, 2)]);
    }

    #[test]
    fn test_positional_fallback() {
        let row = vec!["x"; 9];
        let grid = RawGrid::from_strings(&[row.clone(), row.clone(), row]);
        let structure = detect_structure(&grid);
        assert_eq!(structure.header_source, HeaderSource::Positional);
        assert_eq!(structure.header_row, 0);
        assert_eq!(
            days(&structure),
            vec![(1, 1), (2, 2), (3, 3), (4, 4), (5, 5), (6, 6), (7, 7)]
        );
        assert_eq!(structure.session_source, SessionSource::Synthesized);
        let rows: Vec<(usize, u32, u32)> = structure
            .session_rows
            .iter()
            .map(|r| (r.row_index, r.start_session, r.end_session))
            .collect();
        assert_eq!(
            rows,
            vec![(1, 1, 2), (2, 3, 4), (3, 5, 6), (4, 7, 8), (5, 9, 10)]
        );
    }

    #[test]
    fn test_empty_and_narrow_grids() {
        let structure = detect_structure(&RawGrid::default());
        assert_eq!(structure.header_columns.len(), 7);
        assert_eq!(structure.session_rows.len(), 5);
        assert_eq!(structure.session_rows[0].row_index, 1);

        let grid = RawGrid::from_strings(&[vec!["a", "b", "c", "d"]]);
        let structure = detect_structure(&grid);
        assert_eq!(days(&structure), vec![(1, 1), (2, 2), (3, 3)]);
    }
}
