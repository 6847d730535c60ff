//! 收藏 API DTO（请求和响应结构体）

use crate::vrc::favorite::models::{
    FavoriteCategory, FavoriteEntry, FavoriteGroup, FavoriteLimits, GroupVisibility,
};
use crate::vrc::types::{deserialize_string_or_null, deserialize_vec_or_null};
use serde::{Deserialize, Serialize};

/// 收藏上限响应
pub type FavoriteLimitsResp = FavoriteLimits;

/// 服务器返回的收藏分组
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFavoriteGroup {
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_string_or_null")]
    pub owner_id: String,
    /// 分组名，即本地使用的 tag
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_string_or_null")]
    pub display_name: String,
    #[serde(rename = "type")]
    pub category: FavoriteCategory,
    #[serde(default)]
    pub visibility: GroupVisibility,
    #[serde(default, deserialize_with = "deserialize_vec_or_null")]
    pub tags: Vec<String>,
}

impl From<RemoteFavoriteGroup> for FavoriteGroup {
    fn from(g: RemoteFavoriteGroup) -> Self {
        FavoriteGroup {
            tag: g.name,
            group_id: g.id,
            category: g.category,
            display_name: g.display_name,
            visibility: g.visibility,
        }
    }
}

/// 分组内收藏列表的单项
///
/// 世界/模型列表返回的是对象本身（带 name、thumbnailImageUrl），
/// 好友列表返回的是收藏关系（只有两个 ID）。字段含义见 [`crate::vrc::favorite::models::IdMapping`]。
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFavoriteItem {
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_string_or_null")]
    pub favorite_id: String,
    #[serde(default, deserialize_with = "deserialize_string_or_null")]
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_string_or_null")]
    pub thumbnail_image_url: String,
}

impl RemoteFavoriteItem {
    /// 按类别的 ID 映射转换为本地收藏
    pub fn into_entry(self, category: FavoriteCategory) -> FavoriteEntry {
        let (subject_id, record_id) = category.id_mapping().split(&self.id, &self.favorite_id);
        FavoriteEntry::confirmed(subject_id, record_id, self.name, self.thumbnail_image_url)
    }
}

/// 添加收藏请求
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFavoriteReq {
    #[serde(rename = "type")]
    pub category: FavoriteCategory,
    /// 被收藏对象 ID
    pub favorite_id: String,
    pub tags: Vec<String>,
}

/// 添加收藏响应（收藏关系）
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFavoriteResp {
    /// 收藏记录 ID
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_string_or_null")]
    pub favorite_id: String,
    #[serde(rename = "type", default)]
    pub category: Option<FavoriteCategory>,
    #[serde(default, deserialize_with = "deserialize_vec_or_null")]
    pub tags: Vec<String>,
}

/// 网关添加收藏成功后的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedFavorite {
    pub favorite_record_id: String,
}

impl AddFavoriteResp {
    /// 按类别的 ID 映射取出本地保存的收藏记录 ID
    ///
    /// 世界/模型取 `favoriteId`，好友取 `id`，与列表接口使用同一张映射表。
    pub fn into_added(self, category: FavoriteCategory) -> AddedFavorite {
        let (_, record_id) = category.id_mapping().split(&self.id, &self.favorite_id);
        AddedFavorite {
            favorite_record_id: record_id.to_string(),
        }
    }
}

/// 更新分组请求
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFavoriteGroupReq {
    pub display_name: String,
    pub visibility: GroupVisibility,
}
