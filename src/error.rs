use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    /// 源文件无法读取或解码
    #[error("could not read source: {0}")]
    Read(#[from] calamine::Error),

    #[error("workbook has no non-empty worksheet")]
    EmptyWorkbook,

    #[error("worksheet not found: {0}")]
    SheetNotFound(String),

    /// 所有回退规则都用过之后仍然找不到课程
    #[error("source is not a recognizable timetable")]
    NotATimetable,

    #[error("could not parse options: {0}")]
    Options(#[from] toml::de::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
