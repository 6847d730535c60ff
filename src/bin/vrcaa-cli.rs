//! VRCAA 收藏 CLI
//!
//! 非交互式 CLI，用于查看和修改账号收藏。
//! 每次运行先全量刷新本地镜像，再执行子命令。

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::{error, info};
use vrcaa_core_rust::vrc::client::{ClientConfig, DEFAULT_API_BASE_URL};
use vrcaa_core_rust::vrc::favorite::{
    FavoriteCategory, FavoriteDraft, FavoriteEntry, FavoriteGroup, FavoriteListener,
    FavoriteMirror, FavoriteMirrorConfig, FavoriteSnapshot, GroupVisibility,
};

/// VRCAA 收藏 CLI
#[derive(Parser, Debug)]
#[command(name = "vrcaa-cli")]
#[command(about = "VRCAA 收藏 CLI - 查看和管理世界/模型/好友收藏", long_about = None)]
struct Args {
    /// 当前用户 ID（usr_xxx）
    #[arg(long)]
    user_id: String,

    /// 登录后获得的 auth cookie
    #[arg(long)]
    auth_token: String,

    /// 二步验证 cookie
    #[arg(long, default_value = "")]
    two_factor_token: String,

    /// API 地址
    #[arg(long, default_value = DEFAULT_API_BASE_URL)]
    api_base_url: String,

    /// 日志级别（默认: info,vrcaa_core_rust=debug）
    #[arg(long, default_value = "info,vrcaa_core_rust=debug")]
    log_level: String,

    /// 日志文件
    #[arg(long, default_value = "vrcaa.log")]
    log_file: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 列出所有收藏分组和收藏
    List,
    /// 添加收藏
    Add {
        /// world / avatar / friend
        category: FavoriteCategory,
        /// 被收藏对象 ID
        id: String,
        /// 分组 tag，例如 worlds1、avatars2、group_0
        tag: String,
        /// 显示名（仅世界/模型）
        #[arg(long, default_value = "")]
        name: String,
        /// 缩略图（仅世界/模型）
        #[arg(long, default_value = "")]
        thumbnail: String,
    },
    /// 删除收藏
    Remove {
        category: FavoriteCategory,
        id: String,
    },
    /// 修改分组显示名和可见性
    UpdateGroup {
        tag: String,
        #[arg(long)]
        display_name: Option<String>,
        /// public / friends / private
        #[arg(long)]
        visibility: Option<GroupVisibility>,
    },
}

/// 初始化日志（同时输出到 stdout 和文件）
fn init_logger(log_level: &str, log_file: &str) -> Result<()> {
    use std::fs::OpenOptions;
    use std::io;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    // 优先使用环境变量 RUST_LOG（如果设置了），否则使用命令行参数
    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("无法创建日志文件 {}", log_file))?;

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(true);

    // 文件不需要颜色
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    info!("[CLI] 📝 日志已同时输出到控制台和文件: {}", log_file);
    Ok(())
}

/// 输出所有收藏变更
struct CliFavoriteListener;

#[async_trait::async_trait]
impl FavoriteListener for CliFavoriteListener {
    async fn on_favorites_refreshed(&self, snapshot: Arc<FavoriteSnapshot>) {
        info!(
            "[CLI/Favorite] 🔄 收藏已刷新，分组数: {}",
            snapshot.groups.len()
        );
    }

    async fn on_favorite_added(
        &self,
        category: FavoriteCategory,
        tag: String,
        entry: FavoriteEntry,
    ) {
        info!(
            "[CLI/Favorite] ⭐ 新增收藏 {} -> {} ({})",
            entry.subject_id(),
            tag,
            category
        );
    }

    async fn on_favorite_removed(
        &self,
        category: FavoriteCategory,
        tag: String,
        subject_id: String,
    ) {
        info!(
            "[CLI/Favorite] 🗑️ 删除收藏 {} <- {} ({})",
            subject_id, tag, category
        );
    }

    async fn on_group_metadata_changed(&self, tag: String, group: FavoriteGroup) {
        info!(
            "[CLI/Favorite] 🏷️ 分组 {} 已更新: {} / {}",
            tag, group.display_name, group.visibility
        );
    }
}

fn print_favorites(snapshot: &FavoriteSnapshot) {
    for category in FavoriteCategory::ALL {
        println!(
            "== {}（共 {} 个）",
            category,
            snapshot.favorite_count(category)
        );
        for (tag, entries) in snapshot.groups(category) {
            println!("  [{}] {}", tag, snapshot.group_display_name(tag));
            for entry in entries {
                if entry.display_name.is_empty() {
                    println!("    - {}", entry.subject_id());
                } else {
                    println!("    - {} ({})", entry.display_name, entry.subject_id());
                }
            }
        }
    }
    if let Some(at) = snapshot.refreshed_at {
        println!("刷新时间: {}", at.to_rfc3339());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logger(&args.log_level, &args.log_file)?;

    let mut client = ClientConfig::new(args.user_id.clone(), args.auth_token.clone());
    client.two_factor_token = args.two_factor_token.clone();
    client.api_base_url = args.api_base_url.clone();

    let mirror = FavoriteMirror::with_listener(
        FavoriteMirrorConfig::new(client),
        Arc::new(CliFavoriteListener),
    )?;

    info!("[CLI] 🔄 正在拉取收藏...");
    if !mirror.refresh().await {
        error!("[CLI] ❌ 拉取收藏失败");
        bail!("拉取收藏失败");
    }

    match args.command {
        Command::List => print_favorites(&mirror.snapshot()),
        Command::Add {
            category,
            id,
            tag,
            name,
            thumbnail,
        } => {
            let draft = FavoriteDraft::new(name, thumbnail);
            if !mirror.add_favorite(category, &id, &tag, Some(draft)).await {
                bail!("添加收藏失败: {}", id);
            }
        }
        Command::Remove { category, id } => {
            if !mirror.remove_favorite(category, &id).await {
                bail!("删除收藏失败（不存在或服务器拒绝）: {}", id);
            }
        }
        Command::UpdateGroup {
            tag,
            display_name,
            visibility,
        } => {
            let Some(mut group) = mirror.group_metadata(&tag) else {
                bail!("未知分组: {}", tag);
            };
            if let Some(display_name) = display_name {
                group.display_name = display_name;
            }
            if let Some(visibility) = visibility {
                group.visibility = visibility;
            }
            if !mirror.update_group_metadata(&tag, group).await {
                bail!("更新分组失败: {}", tag);
            }
        }
    }

    Ok(())
}
