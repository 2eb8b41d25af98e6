use course_schedule::{detect_structure, read_grid};
use std::env;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("用法: {} <课表文件.xlsx> [工作表名称]", args[0]);
        std::process::exit(2);
    }
    let path = &args[1];
    let sheet = args.get(2).map(String::as_str);

    println!("正在读取表格文件: {}", path);
    println!("{}", "=".repeat(80));

    let grid = match read_grid(path, sheet) {
        Ok(grid) => grid,
        Err(e) => {
            eprintln!("读取表格失败: {}", e);
            std::process::exit(1);
        }
    };

    println!("共 {} 行, 最多 {} 列\n", grid.row_count(), grid.column_count());
    for (row_index, row) in grid.rows().iter().enumerate() {
        for (column_index, cell) in row.iter().enumerate() {
            if let Some(text) = cell {
                println!("({}, {}) {:?}", row_index, column_index, text);
            }
        }
    }

    let structure = detect_structure(&grid);
    println!("\n{}", "=".repeat(80));
    println!("表头第 {} 行 ({:?})", structure.header_row, structure.header_source);
    for column in &structure.header_columns {
        println!("  第 {} 列 -> 星期{}", column.column_index, column.day_of_week);
    }
    println!("节次行 ({:?})", structure.session_source);
    for row in &structure.session_rows {
        println!("  第 {} 行 -> {}-{}节", row.row_index, row.start_session, row.end_session);
    }
}
