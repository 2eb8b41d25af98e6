use std::collections::BTreeSet;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// 默认的周次上限
pub const DEFAULT_WEEK_CEILING: u32 = 20;

// 超过这个数的周次视为无效输入
const MAX_WEEK: u32 = 999;

static SINGLE_WEEK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)周$").unwrap());
static RANGE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)\s*[-~至到]\s*(\d+)").unwrap());
static BARE_WEEK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)周?$").unwrap());
static WEEK_WITH_PARITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)(单|双)周?$").unwrap());

/// 周次集合，始终升序且不重复，不含 0
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeekSet(BTreeSet<u32>);

impl WeekSet {
    pub fn new() -> Self {
        WeekSet(BTreeSet::new())
    }

    pub fn insert(&mut self, week: u32) {
        if week > 0 {
            self.0.insert(week);
        }
    }

    pub fn contains(&self, week: u32) -> bool {
        self.0.contains(&week)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }

    pub fn union_with(&mut self, other: &WeekSet) {
        self.0.extend(other.iter());
    }

    pub fn to_vec(&self) -> Vec<u32> {
        self.iter().collect()
    }

    /// 压缩成区间文本，如 {1,2,3,5} -> "1-3,5周"，可以再交给 parse_weeks 解析
    pub fn to_range_text(&self) -> String {
        let mut segments: Vec<String> = Vec::new();
        let mut iter = self.iter().peekable();
        while let Some(start) = iter.next() {
            let mut end = start;
            while end.checked_add(1).is_some_and(|next| iter.peek() == Some(&next)) {
                end += 1;
                iter.next();
            }
            if start == end {
                segments.push(start.to_string());
            } else {
                segments.push(format!("{}-{}", start, end));
            }
        }
        if segments.is_empty() {
            return String::new();
        }
        format!("{}周", segments.join(","))
    }
}

impl FromIterator<u32> for WeekSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        let mut weeks = WeekSet::new();
        for week in iter {
            weeks.insert(week);
        }
        weeks
    }
}

impl Extend<u32> for WeekSet {
    fn extend<I: IntoIterator<Item = u32>>(&mut self, iter: I) {
        for week in iter {
            self.insert(week);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    Any,
    Odd,
    Even,
}

impl Parity {
    fn accepts(self, week: u32) -> bool {
        match self {
            Parity::Any => true,
            Parity::Odd => week % 2 == 1,
            Parity::Even => week % 2 == 0,
        }
    }

    fn from_segment(segment: &str) -> Self {
        if segment.contains('单') {
            Parity::Odd
        } else if segment.contains('双') {
            Parity::Even
        } else {
            Parity::Any
        }
    }
}

/// 单个周次片段的匹配结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentMatch {
    OddKeyword,
    EvenKeyword,
    Range { start: u32, end: u32, parity: Parity },
    Single(u32),
    // "5单" 只有一个周次，单双标记不再过滤
    SingleWithParity(u32),
    NoMatch,
}

type SegmentMatcher = fn(&str) -> Option<SegmentMatch>;

// 按优先级排列，取第一个命中的规则
const SEGMENT_MATCHERS: &[SegmentMatcher] = &[
    match_odd_keyword,
    match_even_keyword,
    match_range,
    match_single,
    match_single_with_parity,
];

fn match_odd_keyword(segment: &str) -> Option<SegmentMatch> {
    matches!(segment, "单" | "单周" | "单数" | "单数周").then_some(SegmentMatch::OddKeyword)
}

fn match_even_keyword(segment: &str) -> Option<SegmentMatch> {
    matches!(
        segment,
        "双" | "双周" | "双数" | "双数周" | "偶数" | "偶数周"
    )
    .then_some(SegmentMatch::EvenKeyword)
}

fn match_range(segment: &str) -> Option<SegmentMatch> {
    let caps = RANGE_RE.captures(segment)?;
    let start = caps[1].parse::<u32>().ok()?;
    let end = caps[2].parse::<u32>().ok()?;
    if end > MAX_WEEK {
        debug!("周次范围过大，忽略: {}", segment);
        return None;
    }
    Some(SegmentMatch::Range {
        start,
        end,
        parity: Parity::from_segment(segment),
    })
}

fn parse_week_number(digits: &str) -> Option<u32> {
    let week = digits.parse::<u32>().ok()?;
    if week > MAX_WEEK {
        debug!("周次过大，忽略: {}", digits);
        return None;
    }
    Some(week)
}

fn match_single(segment: &str) -> Option<SegmentMatch> {
    let caps = BARE_WEEK_RE.captures(segment)?;
    parse_week_number(&caps[1]).map(SegmentMatch::Single)
}

fn match_single_with_parity(segment: &str) -> Option<SegmentMatch> {
    let caps = WEEK_WITH_PARITY_RE.captures(segment)?;
    parse_week_number(&caps[1]).map(SegmentMatch::SingleWithParity)
}

pub fn classify_segment(segment: &str) -> SegmentMatch {
    SEGMENT_MATCHERS
        .iter()
        .find_map(|matcher| matcher(segment))
        .unwrap_or(SegmentMatch::NoMatch)
}

fn strip_brackets(text: &str) -> &str {
    text.trim()
        .trim_start_matches(|c| matches!(c, '[' | '【' | '(' | '（'))
        .trim_end_matches(|c| matches!(c, ']' | '】' | ')' | '）'))
        .trim()
}

pub fn parse_weeks(text: &str) -> WeekSet {
    parse_weeks_with_ceiling(text, DEFAULT_WEEK_CEILING)
}

/// 解析周次文本，如 "1-3,5-16周"、"单周"、"5周"，无法识别时返回空集合
pub fn parse_weeks_with_ceiling(text: &str, ceiling: u32) -> WeekSet {
    let body = strip_brackets(text);
    let mut weeks = WeekSet::new();

    // 单独一个周次，如 "5周"
    if let Some(caps) = SINGLE_WEEK_RE.captures(body) {
        if let Some(week) = parse_week_number(&caps[1]) {
            weeks.insert(week);
        }
        return weeks;
    }

    let body = body.strip_suffix('周').unwrap_or(body);

    let segments = body
        .split(|c| matches!(c, ',' | '，' | '·'))
        .map(str::trim)
        .filter(|s| !s.is_empty());

    for segment in segments {
        match classify_segment(segment) {
            SegmentMatch::OddKeyword => weeks.extend((1..=ceiling).filter(|w| w % 2 == 1)),
            SegmentMatch::EvenKeyword => weeks.extend((1..=ceiling).filter(|w| w % 2 == 0)),
            SegmentMatch::Range { start, end, parity } => {
                weeks.extend((start..=end).filter(|w| parity.accepts(*w)))
            }
            SegmentMatch::Single(week) | SegmentMatch::SingleWithParity(week) => {
                weeks.insert(week)
            }
            SegmentMatch::NoMatch => debug!("无法识别的周次片段: {}", segment),
        }
    }

    weeks
}
