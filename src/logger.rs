use chrono::Local;
use env_logger::{Builder, Env};
use std::io::Write;

/// `2026-10-19 14:03:11 [INFO] - message`. Defaults to `info`, `RUST_LOG` overrides.
pub fn init() {
    Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();

    log::debug!("Logger initialized.");
}
