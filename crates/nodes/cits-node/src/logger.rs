use std::fs;
use std::path::Path;

use chrono::Utc;
use log::LevelFilter;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct LogSettings {
    pub log_path: String,
    pub log_level: String,
    pub log_file_name: String,
    pub log_overwrite: bool,
}

fn logging_level(log_level: &str) -> LevelFilter {
    match log_level {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Info,
    }
}

pub fn initiate_logger(config_path: &Path, settings: &LogSettings) {
    let log_dir = config_path.join(&settings.log_path).join("logs");
    if !log_dir.exists() {
        fs::create_dir_all(&log_dir)
            .unwrap_or_else(|_| panic!("Error while creating the log directory"));
    }

    let mut log_file_path = log_dir.join(&settings.log_file_name);
    if log_file_path.exists() {
        if settings.log_overwrite {
            fs::remove_file(&log_file_path)
                .unwrap_or_else(|_| panic!("Error while clearing the log file"));
        } else {
            // Keep the old file, stamp a fresh name for this run.
            let stamp = Utc::now().format("_%d%m%Y_%H%M%S").to_string();
            let stem = settings
                .log_file_name
                .split('.')
                .next()
                .expect("failed to read log file name");
            log_file_path = log_dir.join(format!("{}{}.log", stem, stamp));
        }
    }

    let log_file = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y.%m.%d %H:%M:%S)} | {({l}):5.5} | {({f}:{L}):>40.40} — {m}{n}",
        )))
        .build(log_file_path)
        .unwrap_or_else(|e| panic!("Error while creating the log appender: {}", e));

    let logger_config = Config::builder()
        .appender(Appender::builder().build("node", Box::new(log_file)))
        .build(
            Root::builder()
                .appender("node")
                .build(logging_level(&settings.log_level)),
        )
        .unwrap_or_else(|e| panic!("Error while configuring the logger: {}", e));

    log4rs::init_config(logger_config)
        .unwrap_or_else(|e| panic!("Error while initializing logger with config: {}", e));
}
