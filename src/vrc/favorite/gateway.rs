//! 收藏远端接口抽象

use crate::vrc::favorite::models::{
    FavoriteCategory, FavoriteEntry, FavoriteGroup, FavoriteLimits, GroupVisibility,
};
use crate::vrc::favorite::types::AddedFavorite;
use anyhow::Result;
use async_trait::async_trait;

/// 收藏镜像访问服务器的唯一入口
///
/// 返回 `Err` 即表示调用失败（网络、认证、服务器错误不做区分）。
/// 重试、超时都由实现方负责，镜像本身不重试。
#[async_trait]
pub trait FavoriteGateway: Send + Sync {
    /// 获取各类别的收藏上限
    async fn get_favorite_limits(&self) -> Result<FavoriteLimits>;

    /// 获取某类别在服务器上的分组
    async fn get_favorite_groups(&self, category: FavoriteCategory) -> Result<Vec<FavoriteGroup>>;

    /// 获取某分组内的收藏（ID 已按类别映射好）
    async fn get_favorite_entries(
        &self,
        category: FavoriteCategory,
        tag: &str,
    ) -> Result<Vec<FavoriteEntry>>;

    /// 添加收藏，返回服务器分配的收藏记录 ID
    async fn add_favorite(
        &self,
        category: FavoriteCategory,
        subject_id: &str,
        tag: &str,
    ) -> Result<AddedFavorite>;

    /// 按收藏记录 ID 删除收藏
    async fn remove_favorite(&self, favorite_record_id: &str) -> Result<()>;

    /// 更新分组设置
    async fn update_favorite_group(
        &self,
        category: FavoriteCategory,
        name: &str,
        display_name: &str,
        visibility: GroupVisibility,
    ) -> Result<()>;
}
