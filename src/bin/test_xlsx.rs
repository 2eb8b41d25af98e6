use course_schedule::{read_course_schedule_xlsx, ParseOptions};
use std::env;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("用法: {} <课表文件.xlsx> [解析参数.toml]", args[0]);
        std::process::exit(2);
    }
    let path = &args[1];

    let options = match args.get(2) {
        Some(config) => match ParseOptions::from_file(config) {
            Ok(options) => options,
            Err(e) => {
                eprintln!("读取解析参数失败: {}", e);
                std::process::exit(1);
            }
        },
        None => ParseOptions::default(),
    };

    println!("正在读取表格文件: {}", path);
    println!("{}", "=".repeat(80));

    match read_course_schedule_xlsx(path, &options) {
        Ok(parsed) => {
            let schedule = &parsed.schedule;
            println!("\n解析成功！\n");
            println!("来源: {}", schedule.source_name);
            println!("总周数: {}", schedule.total_weeks);
            println!(
                "表头第 {} 行 ({:?}), 节次行 {} 行 ({:?})",
                parsed.structure.header_row,
                parsed.structure.header_source,
                parsed.structure.session_rows.len(),
                parsed.structure.session_source
            );
            println!("\n找到 {} 门课程:\n", schedule.courses.len());

            for (i, course) in schedule.courses.iter().enumerate() {
                println!("课程 {}:", i + 1);
                println!("  课程号: {}", course.course_code);
                println!("  名称: {}", course.name);
                println!("  教师: {}", course.teacher.as_deref().unwrap_or(""));
                println!("  地点: {}", course.location);
                println!("  节次: {}", course.session_label());
                println!("  周次: {} {:?}", course.week_range_text, course.weeks.to_vec());
                println!("  星期: {}", course.day_of_week);
                println!();
            }

            if !parsed.diagnostics.is_empty() {
                println!("提示:");
                for diagnostic in &parsed.diagnostics {
                    println!("  {}", diagnostic);
                }
            }

            // 输出JSON格式
            println!("\n{}", "=".repeat(80));
            println!("JSON输出:");
            println!("{}", "=".repeat(80));
            match serde_json::to_string_pretty(&parsed) {
                Ok(json) => println!("{}", json),
                Err(e) => eprintln!("JSON序列化失败: {}", e),
            }
        }
        Err(e) => {
            eprintln!("解析失败: {}", e);
            std::process::exit(1);
        }
    }
}
