use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};
use log::{debug, info};

use crate::error::ImportError;
use crate::grid::RawGrid;
use crate::options::ParseOptions;
use crate::{parse_timetable, ParsedSchedule};

/// 读取表格文件并解析课表
pub fn read_course_schedule_xlsx(
    path: impl AsRef<Path>,
    options: &ParseOptions,
) -> Result<ParsedSchedule, ImportError> {
    let path = path.as_ref();
    let grid = read_grid(path, options.sheet.as_deref())?;
    let source_name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    parse_timetable(&grid, &source_name, options)
}

/// 把工作表转换成二维单元格，未指定表名时取第一个非空工作表
pub fn read_grid(path: impl AsRef<Path>, sheet: Option<&str>) -> Result<RawGrid, ImportError> {
    let path = path.as_ref();
    let mut workbook = open_workbook_auto(path)?;
    info!("读取表格文件: {}", path.display());

    if let Some(name) = sheet {
        if !workbook.sheet_names().iter().any(|n| n == name) {
            return Err(ImportError::SheetNotFound(name.to_string()));
        }
        let range = workbook.worksheet_range(name)?;
        return Ok(range_to_grid(&range));
    }

    let sheet_names = workbook.sheet_names().to_owned();
    for name in sheet_names {
        match workbook.worksheet_range(&name) {
            Ok(range) if !range.is_empty() => {
                debug!("使用工作表: {}", name);
                return Ok(range_to_grid(&range));
            }
            Ok(_) => debug!("工作表为空: {}", name),
            Err(e) => debug!("工作表 {} 读取失败: {}", name, e),
        }
    }

    Err(ImportError::EmptyWorkbook)
}

/// 保留单元格的绝对位置，区域起点之前的行列补空
pub fn range_to_grid(range: &Range<Data>) -> RawGrid {
    let (start_row, start_column) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    let mut rows: Vec<Vec<Option<String>>> = vec![Vec::new(); start_row];
    for row in range.rows() {
        let mut cells: Vec<Option<String>> = vec![None; start_column];
        cells.extend(row.iter().map(cell_to_text));
        rows.push(cells);
    }
    RawGrid::new(rows)
}

fn cell_to_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(text) => Some(text.to_string()),
        _ => Some(cell.to_string()),
    }
}
