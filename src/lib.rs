pub mod assembler;
pub mod course_parser;
pub mod detector;
pub mod error;
pub mod grid;
pub mod options;
pub mod schedule;
pub mod week_parser;
pub mod xlsx_reader;

use log::info;
use serde::{Deserialize, Serialize};

pub use assembler::{assemble, assemble_with, Assembly};
pub use course_parser::{parse_course_token, parse_course_token_with, DraftCourse};
pub use detector::{
    detect_semester, detect_structure, detect_structure_with, GridStructure, HeaderColumn,
    HeaderSource, SessionRow, SessionSource,
};
pub use error::ImportError;
pub use grid::RawGrid;
pub use options::ParseOptions;
pub use schedule::{Course, Diagnostic, Schedule};
pub use week_parser::{parse_weeks, parse_weeks_with_ceiling, WeekSet};
pub use xlsx_reader::{read_course_schedule_xlsx, read_grid};

/// 一次解析的完整结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedSchedule {
    pub schedule: Schedule,
    pub structure: GridStructure,
    pub diagnostics: Vec<Diagnostic>,
}

/// 从二维单元格解析课表：识别结构、逐格解析课程、合并
///
/// 所有回退规则都用过之后仍然没有课程，或者既没有星期列也没有节次行，
/// 返回 `ImportError::NotATimetable`。
pub fn parse_timetable(
    grid: &RawGrid,
    source_name: &str,
    options: &ParseOptions,
) -> Result<ParsedSchedule, ImportError> {
    let structure = detect_structure_with(grid, options);
    let Assembly {
        mut schedule,
        diagnostics: dropped,
    } = assemble_with(
        grid,
        &structure.header_columns,
        &structure.session_rows,
        options,
    );
    schedule.source_name = source_name.to_string();
    schedule.semester = detect_semester(grid, structure.header_row);

    if schedule.courses.is_empty()
        || (structure.header_columns.is_empty() && structure.session_rows.is_empty())
    {
        return Err(ImportError::NotATimetable);
    }

    let mut diagnostics = Vec::new();
    if structure.header_source != HeaderSource::Detected {
        diagnostics.push(Diagnostic::HeaderFallback {
            source: structure.header_source,
        });
    }
    if structure.session_source == SessionSource::Synthesized {
        diagnostics.push(Diagnostic::SessionFallback {
            rows: structure.session_rows.len(),
        });
    }
    diagnostics.extend(dropped);

    info!(
        "{}: 共 {} 门课程, {} 条提示",
        source_name,
        schedule.courses.len(),
        diagnostics.len()
    );

    Ok(ParsedSchedule {
        schedule,
        structure,
        diagnostics,
    })
}
