//! 日志初始化
//!
use crate::config::LogSettings;
use crate::error::{AppError, AppResult};
use tracing_subscriber::EnvFilter;

/// 按配置安装全局 `tracing` 订阅器
///
/// 过滤指令无法解析时返回错误；已安装过全局订阅器时静默忽略，
/// 便于测试与库代码多次调用。
pub fn init(settings: &LogSettings) -> AppResult<()> {
    let filter =
        EnvFilter::try_new(&settings.level).map_err(|e| AppError::Logging(e.to_string()))?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let _ = if settings.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    Ok(())
}
