use std::{
    io::Write,
    sync::OnceLock,
    time::{Duration, Instant},
};

use env_logger::{Builder, WriteStyle};
use log::LevelFilter;

use crate::{config::LogConfig, error::CoordinatorResult};

static BOOT: OnceLock<Instant> = OnceLock::new();

#[derive(Debug, Clone)]
pub struct ConsoleLoggerConfig {
    pub level: LevelFilter,
    pub colors: bool,
    pub include_module: bool,
}

impl Default for ConsoleLoggerConfig {
    fn default() -> Self {
        Self { level: LevelFilter::Info, colors: true, include_module: true }
    }
}

impl ConsoleLoggerConfig {
    /// Layering: defaults -> config file -> environment.
    pub fn resolve(file: &LogConfig) -> Self {
        let mut cfg = Self::default();

        if let Some(level) = file.level.as_deref().and_then(|v| v.parse::<LevelFilter>().ok()) {
            cfg.level = level;
        }
        if let Some(colors) = file.colors {
            cfg.colors = colors;
        }
        if let Some(include_module) = file.include_module {
            cfg.include_module = include_module;
        }

        cfg.apply_env();
        cfg
    }

    fn apply_env(&mut self) {
        if let Some(level) = std::env::var("COORDINATOR_LOG")
            .ok()
            .and_then(|v| v.parse::<LevelFilter>().ok())
        {
            self.level = level;
        }
        if let Ok(v) = std::env::var("COORDINATOR_LOG_COLORS") {
            self.colors = v != "0";
        }
        if let Ok(v) = std::env::var("COORDINATOR_LOG_MODULE") {
            self.include_module = v != "0";
        }
    }
}

/// Installs the process-wide console logger.
///
/// Line format: `[+mm:ss.mmm] [LEVEL] target message`.
pub fn init_console_logger(config: &ConsoleLoggerConfig) -> CoordinatorResult<()> {
    let boot = *BOOT.get_or_init(Instant::now);

    let mut builder = Builder::new();
    builder.filter_level(config.level);
    builder.write_style(if config.colors { WriteStyle::Auto } else { WriteStyle::Never });

    let include_module = config.include_module;
    builder.format(move |buf, record| {
        let stamp = fmt_uptime(boot.elapsed());
        let style = buf.default_level_style(record.level());

        if include_module {
            writeln!(
                buf,
                "[{stamp}] {style}[{:<5}]{style:#} {:<25} {}",
                record.level(),
                record.target(),
                record.args()
            )
        } else {
            writeln!(buf, "[{stamp}] {style}[{:<5}]{style:#} {}", record.level(), record.args())
        }
    });

    builder.try_init()?;
    Ok(())
}

/// Uptime as `+mm:ss.mmm`, widened to `+hh:mm:ss.mmm` past the first hour.
fn fmt_uptime(d: Duration) -> String {
    let total_ms = d.as_millis() as u64;

    let ms = total_ms % 1000;
    let total_s = total_ms / 1000;

    let s = total_s % 60;
    let total_m = total_s / 60;

    let m = total_m % 60;
    let h = total_m / 60;

    if h > 0 {
        format!("+{:02}:{:02}:{:02}.{:03}", h, m, s, ms)
    } else {
        format!("+{:02}:{:02}.{:03}", m, s, ms)
    }
}
