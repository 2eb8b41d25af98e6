use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::detector::HeaderSource;
use crate::week_parser::WeekSet;

pub const DEFAULT_TOTAL_WEEKS: u32 = 20;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Course {
    pub id: String,
    pub course_code: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teacher: Option<String>,
    pub location: String,
    pub weeks: WeekSet,
    pub week_range_text: String, // 周次原文，如 "[1-16周]"
    pub day_of_week: u8,         // 星期几 (1-7)
    pub start_session: u32,      // 开始节次
    pub end_session: u32,        // 结束节次
}

impl Course {
    /// 节次显示文本，如 "3-4节"
    pub fn session_label(&self) -> String {
        if self.start_session == self.end_session {
            format!("{}节", self.start_session)
        } else {
            format!("{}-{}节", self.start_session, self.end_session)
        }
    }

    pub fn is_active_in_week(&self, week: u32) -> bool {
        self.weeks.contains(week)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Schedule {
    pub courses: Vec<Course>,
    pub total_weeks: u32,
    pub source_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semester: Option<String>, // 学期，如 "2025-2026学年第1学期"
}

impl Schedule {
    pub fn new(source_name: impl Into<String>) -> Self {
        Schedule {
            courses: Vec::new(),
            total_weeks: DEFAULT_TOTAL_WEEKS,
            source_name: source_name.into(),
            semester: None,
        }
    }

    pub fn with_total_weeks(mut self, total_weeks: u32) -> Self {
        self.total_weeks = total_weeks;
        self
    }

    pub fn courses_on_day(&self, day_of_week: u8) -> impl Iterator<Item = &Course> + '_ {
        self.courses
            .iter()
            .filter(move |c| c.day_of_week == day_of_week)
    }

    pub fn courses_in_week(&self, week: u32) -> impl Iterator<Item = &Course> + '_ {
        self.courses.iter().filter(move |c| c.is_active_in_week(week))
    }

    /// 某周某天的课程，按开始节次排序
    pub fn courses_at(&self, week: u32, day_of_week: u8) -> Vec<&Course> {
        let mut courses: Vec<&Course> = self
            .courses_on_day(day_of_week)
            .filter(|c| c.is_active_in_week(week))
            .collect();
        courses.sort_by_key(|c| (c.start_session, c.end_session));
        courses
    }

    /// 根据开学日期计算某天是第几周，开学前或超出总周数返回 None
    pub fn week_of(&self, semester_start: NaiveDate, date: NaiveDate) -> Option<u32> {
        let days = date.signed_duration_since(semester_start).num_days();
        if days < 0 {
            return None;
        }
        let week = u32::try_from(days / 7).ok()? + 1;
        (week <= self.total_weeks).then_some(week)
    }

    pub fn courses_on_date(&self, semester_start: NaiveDate, date: NaiveDate) -> Vec<&Course> {
        match self.week_of(semester_start, date) {
            Some(week) => {
                let day = date.weekday().number_from_monday() as u8;
                self.courses_at(week, day)
            }
            None => Vec::new(),
        }
    }
}

/// 解析过程中的非致命问题
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// 周次为空的课程被丢弃
    EmptyWeeks {
        course_code: String,
        name: String,
        day_of_week: u8,
        start_session: u32,
        end_session: u32,
        week_range_text: String,
    },
    HeaderFallback { source: HeaderSource },
    SessionFallback { rows: usize },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::EmptyWeeks {
                course_code,
                name,
                day_of_week,
                start_session,
                end_session,
                week_range_text,
            } => write!(
                f,
                "丢弃课程 [{}]{} (星期{} 第{}-{}节): 周次 {:?} 为空",
                course_code, name, day_of_week, start_session, end_session, week_range_text
            ),
            Diagnostic::HeaderFallback { source } => {
                write!(f, "未找到完整的星期表头，按 {:?} 方式分配列", source)
            }
            Diagnostic::SessionFallback { rows } => {
                write!(f, "未找到节次行，补齐 {} 行默认节次", rows)
            }
        }
    }
}
