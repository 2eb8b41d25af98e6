use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::options::ParseOptions;
use crate::week_parser::{parse_weeks_with_ceiling, WeekSet};

static CODE_NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[(\d+)\](.*?)(?:\[|$)").unwrap());

// 周次括号按顺序尝试：完整区间写法、单双周关键字
static WEEK_BRACKET_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\[\d+(?:\s*[-~至到]\s*\d+)?(?:\s*[,，]\s*\d+(?:\s*[-~至到]\s*\d+)?)*(?:单|双)?周\]",
        r"\[(?:单数?|双数?|偶数)周\]",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

static SESSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(\d+)(?:[-~－至到])?(\d+)?节\]").unwrap());

static TEACHER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:教师|老师)\s*[:：]\s*([^\s\[\]/,，;；]+)").unwrap());

static BRACKET_SPAN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\]]*\]").unwrap());

// 常见教室写法：教学楼+编号、实验楼+编号、楼栋字母+3~4位房间号
static LOCATION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?:第?[一二三四五六七八九十\d]+)?教学楼\s*[A-Za-z]?-?\d+",
        r"(?:第?[一二三四五六七八九十\d]+)?实验楼\s*[A-Za-z]?-?\d+",
        r"(?:^|[^A-Za-z\d])([A-Za-z]-?\d{3,4})(?:$|\D)",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

/// 合并前的单条课程
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DraftCourse {
    pub id: String,               // 课程号_开始节_结束节
    pub course_code: String,
    pub name: String,
    pub teacher: Option<String>,
    pub weeks: WeekSet,
    pub week_range_text: String,  // 原始周次括号，如 "[1-16周]"
    pub day_of_week: u8,          // 0 表示未知，由组装阶段填写
    pub start_session: u32,       // 0 表示未设置
    pub end_session: u32,
    pub location: String,
}

pub fn parse_course_token(text: &str) -> Option<DraftCourse> {
    parse_course_token_with(text, &ParseOptions::default())
}

/// 解析单元格中的一条课程，如 "[20230101]数据结构[1-16周][3-4节]A101"
///
/// 没有课程号或节次括号时返回 None，表示这段文字不是课程。
pub fn parse_course_token_with(text: &str, options: &ParseOptions) -> Option<DraftCourse> {
    let text = text.trim();

    let caps = CODE_NAME_RE.captures(text)?;
    let course_code = caps[1].to_string();
    let name = caps[2].trim().to_string();
    if name.is_empty() {
        debug!("课程号后没有课程名称: {}", text);
        return None;
    }

    let week_range_text = find_week_text(text).unwrap_or_else(|| options.default_week_text());
    let weeks = parse_weeks_with_ceiling(&week_range_text, options.week_ceiling);

    let Some((start_session, end_session)) = find_sessions(text) else {
        debug!("没有节次信息: {}", text);
        return None;
    };

    let (teacher, location) = extract_teacher_and_location(text);

    Some(DraftCourse {
        id: format!("{}_{}_{}", course_code, start_session, end_session),
        course_code,
        name,
        teacher,
        weeks,
        week_range_text,
        day_of_week: 0,
        start_session,
        end_session,
        location,
    })
}

fn find_week_text(text: &str) -> Option<String> {
    WEEK_BRACKET_PATTERNS
        .iter()
        .find_map(|re| re.find(text))
        .map(|m| m.as_str().to_string())
}

fn find_sessions(text: &str) -> Option<(u32, u32)> {
    let caps = SESSION_RE.captures(text)?;
    let start = caps[1].parse::<u32>().ok()?;
    let end = match caps.get(2) {
        Some(m) => m.as_str().parse::<u32>().ok()?,
        None => start,
    };
    if start == 0 || end == 0 {
        return None;
    }
    Some((start.min(end), start.max(end)))
}

fn extract_teacher_and_location(text: &str) -> (Option<String>, String) {
    let teacher_caps = TEACHER_RE.captures(text);
    let teacher = teacher_caps
        .as_ref()
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string());

    // 最后一个 "]" 之后的内容就是地点
    let trailing_start = text.rfind(']').map(|i| i + 1).unwrap_or(text.len());
    let location = match teacher_caps.as_ref().and_then(|caps| caps.get(0)) {
        Some(m) if m.start() >= trailing_start => {
            format!("{}{}", &text[trailing_start..m.start()], &text[m.end()..])
        }
        _ => text[trailing_start..].to_string(),
    };
    let location = location
        .trim_matches(|c: char| c.is_whitespace() || c == '/')
        .to_string();

    if !location.is_empty() {
        return (teacher, location);
    }

    let cleaned = BRACKET_SPAN_RE.replace_all(text, " ");
    let location = LOCATION_PATTERNS
        .iter()
        .find_map(|re| {
            re.captures(&cleaned)
                .and_then(|caps| caps.get(1).or_else(|| caps.get(0)))
                .map(|m| m.as_str().trim().to_string())
        })
        .unwrap_or_default();

    (teacher, location)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_token() {
        let course = parse_course_token("[20230101]数据结构[1-16周][3-4节]A101").unwrap();
        assert_eq!(course.course_code, "20230101");
        assert_eq!(course.name, "数据结构");
        assert_eq!(course.weeks.to_vec(), (1..=16).collect::<Vec<u32>>());
        assert_eq!(course.week_range_text, "[1-16周]");
        assert_eq!(course.start_session, 3);
        assert_eq!(course.end_session, 4);
        assert_eq!(course.location, "A101");
        assert_eq!(course.day_of_week, 0);
        assert_eq!(course.id, "20230101_3_4");
        assert_eq!(course.teacher, None);
    }

    #[test]
    fn test_missing_code_or_session() {
        assert!(parse_course_token("数据结构[1-16周][3-4节]A101").is_none());
        assert!(parse_course_token("[20230101]数据结构[1-16周]A101").is_none());
        assert!(parse_course_token("[20230101][1-16周][3-4节]").is_none());
        assert!(parse_course_token("[1]体育[1-16周][0节]").is_none());
        assert!(parse_course_token("").is_none());
    }

    #[test]
    fn test_default_weeks() {
        let course = parse_course_token("[1001]高等数学[1-2节]B203").unwrap();
        assert_eq!(course.week_range_text, "[1-20周]");
        assert_eq!(course.weeks.to_vec(), (1..=20).collect::<Vec<u32>>());

        let options = ParseOptions {
            week_ceiling: 18,
            ..ParseOptions::default()
        };
        let course = parse_course_token_with("[1001]高等数学[1-2节]B203", &options).unwrap();
        assert_eq!(course.weeks.len(), 18);
    }

    #[test]
    fn test_week_bracket_variants() {
        let course = parse_course_token("[1001]英语[1-8,10-12双周][5节]C301").unwrap();
        // 单双标记只作用于所在的片段
        assert_eq!(course.weeks.to_vec(), vec![1, 2, 3, 4, 5, 6, 7, 8, 10, 12]);
        assert_eq!((course.start_session, course.end_session), (5, 5));

        let course = parse_course_token("[1001]英语[6周][5至6节]C301").unwrap();
        assert_eq!(course.weeks.to_vec(), vec![6]);
        assert_eq!((course.start_session, course.end_session), (5, 6));

        let course = parse_course_token("[2002]电路实验[单周][7－8节]").unwrap();
        assert_eq!(course.week_range_text, "[单周]");
        assert_eq!(course.weeks.len(), 10);
        assert_eq!((course.start_session, course.end_session), (7, 8));
    }

    #[test]
    fn test_reversed_sessions() {
        let course = parse_course_token("[3]线性代数[1-8周][4-3节]").unwrap();
        assert_eq!((course.start_session, course.end_session), (3, 4));
    }

    #[test]
    fn test_teacher_extraction() {
        let course = parse_course_token("[1001]高等数学[1-16周][1-2节]B203 教师:李四").unwrap();
        assert_eq!(course.teacher.as_deref(), Some("李四"));
        assert_eq!(course.location, "B203");

        let course =
            parse_course_token("[1001]高等数学[1-16周][1-2节]B203/教师：王五/").unwrap();
        assert_eq!(course.teacher.as_deref(), Some("王五"));
        assert_eq!(course.location, "B203");
    }

    #[test]
    fn test_location_fallback() {
        let course = parse_course_token("[1001]线性代数 A305[1-8周][1-2节]").unwrap();
        assert_eq!(course.location, "A305");

        let course = parse_course_token("[1001]大学物理 第二教学楼201[1-8周][1-2节]").unwrap();
        assert_eq!(course.location, "第二教学楼201");

        let course = parse_course_token("[1001]电子实习 实验楼B12[1-8周][1-2节]").unwrap();
        assert_eq!(course.location, "实验楼B12");

        let course =
            parse_course_token("[1001]线性代数[1-8周][1-2节]A101[教师:张三]").unwrap();
        assert_eq!(course.location, "A101");
        assert_eq!(course.teacher.as_deref(), Some("张三"));

        let course = parse_course_token("[1001]线性代数[1-8周][1-2节]").unwrap();
        assert_eq!(course.location, "");
    }
}
