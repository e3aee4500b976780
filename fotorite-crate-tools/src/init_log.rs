use std::io::Write;

use env_logger::fmt::Formatter;

fn format_record(buf: &mut Formatter, record: &log::Record) -> std::io::Result<()> {
    let level_style = match record.level() {
        log::Level::Error => {
            buf.default_level_style(log::Level::Error).fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red)))
        }
        log::Level::Warn => {
            buf.default_level_style(log::Level::Warn).fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow)))
        }
        log::Level::Info => {
            buf.default_level_style(log::Level::Info).fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green)))
        }
        level => buf.default_level_style(level),
    };
    let location_style = anstyle::Style::new().fg_color(Some(anstyle::Color::Rgb(anstyle::RgbColor(110, 110, 110))));

    // windows 下的路径分隔符也要处理
    let file = record.file().unwrap_or("").rsplit(['/', '\\']).next().unwrap_or("");
    let line = record.line().unwrap_or(!0);
    let time = chrono::Local::now().format("%H:%M:%S%.3f");

    writeln!(
        buf,
        "{level_style}[{time}] {:<5}{level_style:#} {location_style}[{file}:{line}]{location_style:#} {}",
        record.level(),
        record.args()
    )
}

fn builder() -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();
    builder.format(format_record).filter(None, log::LevelFilter::Info);
    // RUST_LOG 会覆盖默认的 Info 级别
    builder.parse_default_env();
    builder
}

/// 初始化全局 logger
///
/// 可以重复调用，只有第一次生效
pub fn init_log() {
    let _ = builder().try_init();
}

/// 测试中使用：输出会被 test harness 捕获
pub fn init_test_log() {
    let _ = builder().is_test(true).try_init();
}
