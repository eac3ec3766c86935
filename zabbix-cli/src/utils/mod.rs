use anyhow::Result;
use std::io::{self, Write};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;

/// 设置日志记录系统
///
/// - 库代码只使用 tracing 宏记录日志，在应用入口配置输出
/// - 支持 RUST_LOG 环境变量控制日志级别，`-v` 时默认 debug
/// - 终端输出简洁格式；文件按天滚动，带时间戳和级别
///
/// 返回的 guard 必须持有到程序结束，否则文件日志可能丢失。
pub fn setup_logging(verbose: bool, log_dir: &Path, file_name: &str) -> Result<WorkerGuard> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    // 根据verbose参数和环境变量确定日志级别
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level))
        // 过滤掉第三方库的详细日志，减少噪音
        .add_directive("reqwest=warn".parse()?)
        .add_directive("hyper=warn".parse()?);

    std::fs::create_dir_all(log_dir)?;
    let file_appender = tracing_appender::rolling::daily(log_dir, file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = fmt::layer()
        .with_target(false)
        .without_time()
        .compact();
    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}

/// 读取一行用户输入
///
/// Ctrl-C 或输入结束（EOF）时返回 None，调用方按"跳过"处理。
pub async fn prompt_line(prompt: &str) -> Result<Option<String>> {
    print!("{prompt}");
    io::stdout().flush()?;

    // 用独立线程读 stdin，Ctrl-C 后不阻塞运行时退出
    let (tx, rx) = tokio::sync::oneshot::channel();
    std::thread::spawn(move || {
        let mut input = String::new();
        let result = io::stdin().read_line(&mut input).map(|n| (n, input));
        let _ = tx.send(result);
    });

    tokio::select! {
        received = rx => match received {
            Ok(Ok((0, _))) | Err(_) => Ok(None),
            Ok(Ok((_, input))) => Ok(Some(input.trim().to_string())),
            Ok(Err(e)) => Err(e.into()),
        },
        _ = tokio::signal::ctrl_c() => {
            println!();
            Ok(None)
        }
    }
}

/// y/N 确认，只有输入 y 才返回 true
pub async fn confirm(prompt: &str) -> Result<bool> {
    Ok(prompt_line(prompt)
        .await?
        .is_some_and(|answer| is_yes(&answer)))
}

fn is_yes(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("y")
}

/// 文件大小的可读形式
pub fn format_size(size: u64) -> String {
    if size > 1024 * 1024 {
        format!("{:.1}MB", size as f64 / (1024.0 * 1024.0))
    } else if size > 1024 {
        format!("{:.1}KB", size as f64 / 1024.0)
    } else {
        format!("{size}B")
    }
}
