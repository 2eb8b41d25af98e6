use std::collections::HashMap;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::course_parser::{parse_course_token_with, DraftCourse};
use crate::detector::{HeaderColumn, SessionRow};
use crate::grid::RawGrid;
use crate::options::ParseOptions;
use crate::schedule::{Course, Diagnostic, Schedule};
use crate::week_parser::WeekSet;

/// 组装结果：课表以及被丢弃课程的记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assembly {
    pub schedule: Schedule,
    pub diagnostics: Vec<Diagnostic>,
}

// (课程号, 课程名, 星期, 开始节, 结束节)
type MergeKey = (String, String, u8, u32, u32);

struct MergeGroup {
    key: MergeKey,
    first: DraftCourse,
    weeks: WeekSet,
    members: usize,
}

/// 把各种换行写法统一成 '\n' 再拆分，一个单元格里可能有多门课
pub fn split_fragments(cell: &str) -> Vec<&str> {
    cell.split(['\n', '\r'])
        .flat_map(|line| line.split("\\r\\n"))
        .flat_map(|line| line.split("\\n"))
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .collect()
}

pub fn assemble(
    grid: &RawGrid,
    header_columns: &[HeaderColumn],
    session_rows: &[SessionRow],
) -> Assembly {
    assemble_with(grid, header_columns, session_rows, &ParseOptions::default())
}

pub fn assemble_with(
    grid: &RawGrid,
    header_columns: &[HeaderColumn],
    session_rows: &[SessionRow],
    options: &ParseOptions,
) -> Assembly {
    let mut drafts: Vec<DraftCourse> = Vec::new();

    for session_row in session_rows {
        for column in header_columns {
            let Some(cell) = grid.cell(session_row.row_index, column.column_index) else {
                continue;
            };
            if cell.trim().is_empty() {
                continue;
            }

            for fragment in split_fragments(cell) {
                let Some(mut draft) = parse_course_token_with(fragment, options) else {
                    debug!(
                        "跳过非课程文本 (第{}行, 第{}列): {}",
                        session_row.row_index, column.column_index, fragment
                    );
                    continue;
                };
                draft.day_of_week = column.day_of_week;
                if draft.start_session == 0 {
                    draft.start_session = session_row.start_session;
                    draft.end_session = session_row.end_session;
                }
                drafts.push(draft);
            }
        }
    }

    let draft_count = drafts.len();
    let (courses, diagnostics) = merge_drafts(drafts);
    info!(
        "解析到 {} 条课程记录，合并后 {} 门，丢弃 {} 门",
        draft_count,
        courses.len(),
        diagnostics.len()
    );

    let mut schedule = Schedule::new(String::new()).with_total_weeks(options.total_weeks);
    schedule.courses = courses;

    Assembly {
        schedule,
        diagnostics,
    }
}

/// 相同课程号、名称、星期和节次的记录合并，周次取并集
fn merge_drafts(drafts: Vec<DraftCourse>) -> (Vec<Course>, Vec<Diagnostic>) {
    let mut index: HashMap<MergeKey, usize> = HashMap::new();
    let mut groups: Vec<MergeGroup> = Vec::new();

    for draft in drafts {
        let key = (
            draft.course_code.clone(),
            draft.name.clone(),
            draft.day_of_week,
            draft.start_session,
            draft.end_session,
        );
        match index.get(&key).copied() {
            Some(i) => {
                let group = &mut groups[i];
                group.weeks.union_with(&draft.weeks);
                group.members += 1;
            }
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(MergeGroup {
                    key,
                    weeks: draft.weeks.clone(),
                    first: draft,
                    members: 1,
                });
            }
        }
    }

    let mut courses = Vec::new();
    let mut diagnostics = Vec::new();

    for group in groups {
        let MergeGroup {
            key,
            first,
            weeks,
            members,
        } = group;

        if weeks.is_empty() {
            let diagnostic = Diagnostic::EmptyWeeks {
                course_code: first.course_code,
                name: first.name,
                day_of_week: first.day_of_week,
                start_session: first.start_session,
                end_session: first.end_session,
                week_range_text: first.week_range_text,
            };
            warn!("{}", diagnostic);
            diagnostics.push(diagnostic);
            continue;
        }

        let week_range_text = if members > 1 {
            format!("[{}]", weeks.to_range_text())
        } else {
            first.week_range_text
        };

        courses.push(Course {
            id: stable_id(&key),
            course_code: first.course_code,
            name: first.name,
            teacher: first.teacher,
            location: first.location,
            weeks,
            week_range_text,
            day_of_week: first.day_of_week,
            start_session: first.start_session,
            end_session: first.end_session,
        });
    }

    (courses, diagnostics)
}

fn stable_id(key: &MergeKey) -> String {
    let (code, name, day, start, end) = key;
    let mut hasher = Sha256::new();
    hasher.update(format!("{}\u{1f}{}\u{1f}{}\u{1f}{}\u{1f}{}", code, name, day, start, end));
    let digest = hasher.finalize();
    hex::encode(&digest[..8])
}
