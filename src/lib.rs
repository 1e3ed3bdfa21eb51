//! # Dogonomics
//!
//! 股票新闻情绪分析与个股详情命令行

pub mod app;

use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use dogonomics_core::config::AppConfig;
use dogonomics_workerpool::TaskContext;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::app::bootstrap;

#[derive(Parser, Debug)]
#[command(name = "dogonomics")]
#[command(about = "Stock news sentiment and market detail")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// 拉取新闻并给出情绪结论
    Sentiment {
        #[arg(value_name = "SYMBOL")]
        symbol: String,

        /// 新闻条数（默认 NEWS_LIMIT）
        #[arg(short, long)]
        limit: Option<usize>,

        /// 推理并发数（默认 SENTIMENT_CONCURRENCY）
        #[arg(short, long)]
        concurrency: Option<usize>,

        /// 整个命令的超时秒数
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// 市场综合新闻情绪
    GeneralNews {
        #[arg(long, default_value = "general")]
        category: String,

        /// 新闻条数，最多 10
        #[arg(short, long)]
        limit: Option<usize>,

        #[arg(short, long)]
        concurrency: Option<usize>,

        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// 拼装个股详情
    Detail {
        #[arg(value_name = "SYMBOL")]
        symbol: String,

        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// 对一段文本打分
    Score {
        #[arg(long)]
        title: String,

        #[arg(long, default_value = "")]
        body: String,
    },
}

/// 应用初始化
pub async fn app_init() -> Result<()> {
    // 加载环境变量
    dotenv().ok();

    // 设置日志
    dogonomics_core::logger::setup_logging()?;

    info!("应用初始化完成");
    Ok(())
}

/// 运行主程序
pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    // Ctrl-C 取消根上下文，正在执行的任务会尽快退出
    let root = TaskContext::with_cancel(&TaskContext::background());
    let signal_ctx = root.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("收到关闭信号，取消进行中的任务");
            signal_ctx.cancel();
        }
    });

    let result = execute(&root, &config, cli.command).await;
    if let Err(e) = &result {
        error!("命令执行失败: {:#}", e);
    }
    result
}

fn scoped(root: &TaskContext, timeout_secs: Option<u64>) -> TaskContext {
    match timeout_secs {
        Some(secs) => TaskContext::with_timeout(root, Duration::from_secs(secs)),
        None => TaskContext::with_cancel(root),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn execute(root: &TaskContext, config: &AppConfig, command: Commands) -> Result<()> {
    match command {
        Commands::Sentiment {
            symbol,
            limit,
            concurrency,
            timeout_secs,
        } => {
            let cache = bootstrap::connect_cache(config).await;
            let service = bootstrap::build_sentiment_service(
                config,
                cache,
                concurrency.unwrap_or(config.sentiment_concurrency),
                limit.unwrap_or(config.news_limit),
            )?;
            let ctx = scoped(root, timeout_secs);
            let report = service.analyze_symbol(&ctx, &symbol).await?;
            print_json(&report)
        }
        Commands::GeneralNews {
            category,
            limit,
            concurrency,
            timeout_secs,
        } => {
            let cache = bootstrap::connect_cache(config).await;
            let limit = limit.unwrap_or(config.news_limit);
            let service = bootstrap::build_sentiment_service(
                config,
                cache,
                concurrency.unwrap_or(config.sentiment_concurrency),
                limit.max(1),
            )?;
            let ctx = scoped(root, timeout_secs);
            let report = service.analyze_general(&ctx, &category, limit).await?;
            print_json(&report)
        }
        Commands::Detail {
            symbol,
            timeout_secs,
        } => {
            let cache = bootstrap::connect_cache(config).await;
            let service = bootstrap::build_stock_detail_service(config, cache)?;
            let ctx = scoped(root, timeout_secs);
            let detail = service.stock_detail(&ctx, &symbol).await?;
            print_json(&detail)
        }
        Commands::Score { title, body } => {
            let scorer = bootstrap::build_scorer(config)?;
            let outcome = root.run_until_done(scorer.score(&title, &body)).await??;
            print_json(&outcome)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sentiment_flags() {
        let cli = Cli::try_parse_from([
            "dogonomics",
            "sentiment",
            "AAPL",
            "--limit",
            "8",
            "--concurrency",
            "2",
            "--timeout-secs",
            "20",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Commands::Sentiment {
                symbol: "AAPL".into(),
                limit: Some(8),
                concurrency: Some(2),
                timeout_secs: Some(20),
            }
        );
    }

    #[test]
    fn score_body_defaults_to_empty() {
        let cli = Cli::try_parse_from(["dogonomics", "score", "--title", "Apple beats"]).unwrap();
        assert_eq!(
            cli.command,
            Commands::Score {
                title: "Apple beats".into(),
                body: String::new(),
            }
        );
    }

    #[test]
    fn parses_general_news_with_defaults() {
        let cli = Cli::try_parse_from(["dogonomics", "general-news"]).unwrap();
        assert_eq!(
            cli.command,
            Commands::GeneralNews {
                category: "general".into(),
                limit: None,
                concurrency: None,
                timeout_secs: None,
            }
        );

        let cli =
            Cli::try_parse_from(["dogonomics", "general-news", "--category", "forex", "-l", "7"])
                .unwrap();
        assert!(matches!(
            cli.command,
            Commands::GeneralNews { ref category, limit: Some(7), .. } if category == "forex"
        ));
    }

    #[test]
    fn symbol_is_required() {
        assert!(Cli::try_parse_from(["dogonomics", "detail"]).is_err());
    }

    #[tokio::test]
    async fn zero_concurrency_is_rejected_before_any_request() {
        let config = AppConfig {
            app_env: "local".into(),
            finnhub_api_key: None,
            polygon_api_key: None,
            eodhd_api_key: None,
            sentiment_endpoint: "http://127.0.0.1:1/finbert".into(),
            sentiment_concurrency: 3,
            sentiment_max_retries: 0,
            news_limit: 5,
            request_timeout: Duration::from_secs(1),
            enable_cache: false,
            redis_url: String::new(),
            cache_ttl: Duration::from_secs(1),
        };
        let err = execute(
            &TaskContext::background(),
            &config,
            Commands::Sentiment {
                symbol: "AAPL".into(),
                limit: None,
                concurrency: Some(0),
                timeout_secs: None,
            },
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("concurrency"));
    }
}
