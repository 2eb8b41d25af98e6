use std::io::Write;

use course_schedule::{parse_timetable, ImportError, ParseOptions, RawGrid};

#[test]
fn test_options_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "week_ceiling = 16").unwrap();
    writeln!(file, "label_column = 1").unwrap();
    writeln!(file, "bare_number_sessions = true").unwrap();

    let options = ParseOptions::from_file(file.path()).unwrap();
    assert_eq!(options.week_ceiling, 16);
    assert_eq!(options.label_column, 1);
    assert!(options.bare_number_sessions);

    // 标签在第二列，星期从第三列开始
    let grid = RawGrid::from_strings(&[
        vec!["", "", "星期一", "星期二"],
        vec!["", "第1-2节", "", "[3001]体育[单周][1-2节]操场"],
    ]);
    let parsed = parse_timetable(&grid, "gym", &options).unwrap();
    let course = &parsed.schedule.courses[0];
    assert_eq!(course.day_of_week, 2);
    assert_eq!(course.weeks.to_vec(), vec![1, 3, 5, 7, 9, 11, 13, 15]);
    assert_eq!(course.location, "操场");
}

#[test]
fn test_missing_options_file() {
    let result = ParseOptions::from_file("no/such/options.toml");
    assert!(matches!(result, Err(ImportError::Io(_))));
}
