//! 收藏模块
//!
//! 维护世界、模型、好友三类收藏的本地镜像，写操作经服务器确认后再提交。

pub mod api;
pub mod gateway;
pub mod listener;
pub mod models;
pub mod service;
pub mod types;

// 重新导出主要类型
pub use api::FavoriteApi;
pub use gateway::FavoriteGateway;
pub use listener::{EmptyFavoriteListener, FavoriteListener};
pub use models::{
    CategoryCounts, FavoriteCategory, FavoriteDraft, FavoriteEntry, FavoriteGroup,
    FavoriteLimits, FavoriteMirrorConfig, FavoriteSnapshot, GroupVisibility, GroupedFavorites,
    IdMapping, UNKNOWN_GROUP_NAME,
};
pub use service::FavoriteMirror;
pub use types::AddedFavorite;
