//! 收藏监听器回调接口

use crate::vrc::favorite::models::{
    FavoriteCategory, FavoriteEntry, FavoriteGroup, FavoriteSnapshot,
};
use async_trait::async_trait;
use std::sync::Arc;

/// 收藏监听器回调接口，每次本地状态提交后触发
#[async_trait]
pub trait FavoriteListener: Send + Sync {
    /// 全量刷新完成，参数为新的完整快照
    async fn on_favorites_refreshed(&self, snapshot: Arc<FavoriteSnapshot>);

    /// 新增了一条收藏
    async fn on_favorite_added(
        &self,
        category: FavoriteCategory,
        tag: String,
        entry: FavoriteEntry,
    );

    /// 删除了一条收藏
    async fn on_favorite_removed(
        &self,
        category: FavoriteCategory,
        tag: String,
        subject_id: String,
    );

    /// 分组元数据变更
    async fn on_group_metadata_changed(&self, tag: String, group: FavoriteGroup);
}

/// 默认空实现（无操作）
pub struct EmptyFavoriteListener;

#[async_trait]
impl FavoriteListener for EmptyFavoriteListener {
    async fn on_favorites_refreshed(&self, _snapshot: Arc<FavoriteSnapshot>) {}

    async fn on_favorite_added(
        &self,
        _category: FavoriteCategory,
        _tag: String,
        _entry: FavoriteEntry,
    ) {
    }

    async fn on_favorite_removed(
        &self,
        _category: FavoriteCategory,
        _tag: String,
        _subject_id: String,
    ) {
    }

    async fn on_group_metadata_changed(&self, _tag: String, _group: FavoriteGroup) {}
}
