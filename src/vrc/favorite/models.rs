//! 收藏本地模型定义

use crate::vrc::client::ClientConfig;
use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// 分组不存在时显示的名称
pub const UNKNOWN_GROUP_NAME: &str = "???";

/// 收藏类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FavoriteCategory {
    World,
    Avatar,
    Friend,
}

impl FavoriteCategory {
    /// 刷新时按此顺序逐类拉取
    pub const ALL: [FavoriteCategory; 3] = [
        FavoriteCategory::World,
        FavoriteCategory::Avatar,
        FavoriteCategory::Friend,
    ];

    /// 服务器使用的类别名
    pub fn as_str(&self) -> &'static str {
        match self {
            FavoriteCategory::World => "world",
            FavoriteCategory::Avatar => "avatar",
            FavoriteCategory::Friend => "friend",
        }
    }

    /// 第 index 个默认分组的 tag（index 从 0 开始）
    ///
    /// 世界和模型从 1 开始编号，好友从 0 开始且前缀不同，服务器就是这么命名的。
    pub fn default_group_tag(&self, index: u32) -> String {
        match self {
            FavoriteCategory::World => format!("worlds{}", index + 1),
            FavoriteCategory::Avatar => format!("avatars{}", index + 1),
            FavoriteCategory::Friend => format!("group_{}", index),
        }
    }

    /// 该类别列表接口的 ID 字段含义
    pub fn id_mapping(&self) -> IdMapping {
        match self {
            FavoriteCategory::World | FavoriteCategory::Avatar => IdMapping::SubjectFirst,
            FavoriteCategory::Friend => IdMapping::RecordFirst,
        }
    }
}

impl fmt::Display for FavoriteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FavoriteCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "world" => Ok(FavoriteCategory::World),
            "avatar" => Ok(FavoriteCategory::Avatar),
            "friend" => Ok(FavoriteCategory::Friend),
            other => Err(anyhow!("未知的收藏类别: {}", other)),
        }
    }
}

/// 收藏分组可见性（具体含义由服务器定义）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GroupVisibility {
    #[serde(rename = "public")]
    Public,
    #[serde(rename = "friends")]
    FriendsOnly,
    #[default]
    #[serde(rename = "private")]
    Private,
}

impl GroupVisibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupVisibility::Public => "public",
            GroupVisibility::FriendsOnly => "friends",
            GroupVisibility::Private => "private",
        }
    }
}

impl fmt::Display for GroupVisibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupVisibility {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(GroupVisibility::Public),
            "friends" => Ok(GroupVisibility::FriendsOnly),
            "private" => Ok(GroupVisibility::Private),
            other => Err(anyhow!("未知的分组可见性: {}", other)),
        }
    }
}

/// 列表接口返回的 `id` / `favoriteId` 两个字段分别代表什么
///
/// 世界、模型列表返回的是被收藏对象本身，好友列表返回的是收藏关系，
/// 两者的字段含义正好相反。下游依赖这个区别，不能统一。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdMapping {
    /// `id` 是被收藏对象 ID，`favoriteId` 是收藏记录 ID
    SubjectFirst,
    /// `id` 是收藏记录 ID，`favoriteId` 是被收藏对象 ID
    RecordFirst,
}

impl IdMapping {
    /// 返回 (subject_id, favorite_record_id)
    pub fn split<'a>(&self, id: &'a str, favorite_id: &'a str) -> (&'a str, &'a str) {
        match self {
            IdMapping::SubjectFirst => (id, favorite_id),
            IdMapping::RecordFirst => (favorite_id, id),
        }
    }
}

/// 单条收藏
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteEntry {
    /// 被收藏对象 ID，创建后不可变
    subject_id: String,
    /// 收藏记录 ID，服务器确认前为空，确认后固定
    #[serde(default)]
    favorite_record_id: Option<String>,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub thumbnail_url: String,
}

impl FavoriteEntry {
    /// 尚未被服务器确认的收藏
    pub fn pending(subject_id: impl Into<String>, draft: FavoriteDraft) -> Self {
        Self {
            subject_id: subject_id.into(),
            favorite_record_id: None,
            display_name: draft.display_name,
            thumbnail_url: draft.thumbnail_url,
        }
    }

    /// 服务器已确认的收藏
    pub fn confirmed(
        subject_id: impl Into<String>,
        favorite_record_id: impl Into<String>,
        display_name: impl Into<String>,
        thumbnail_url: impl Into<String>,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            favorite_record_id: Some(favorite_record_id.into()),
            display_name: display_name.into(),
            thumbnail_url: thumbnail_url.into(),
        }
    }

    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    pub fn favorite_record_id(&self) -> Option<&str> {
        self.favorite_record_id.as_deref()
    }

    pub fn is_confirmed(&self) -> bool {
        self.favorite_record_id.is_some()
    }

    /// 写入服务器下发的收藏记录 ID，已确认过的不会被覆盖
    ///
    /// 返回是否写入成功
    pub fn confirm(&mut self, favorite_record_id: impl Into<String>) -> bool {
        if self.favorite_record_id.is_some() {
            return false;
        }
        self.favorite_record_id = Some(favorite_record_id.into());
        true
    }
}

/// 调用方添加世界/模型收藏时附带的展示信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FavoriteDraft {
    pub display_name: String,
    pub thumbnail_url: String,
}

impl FavoriteDraft {
    pub fn new(display_name: impl Into<String>, thumbnail_url: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            thumbnail_url: thumbnail_url.into(),
        }
    }
}

/// 收藏分组元数据
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteGroup {
    /// 分组名，在所有类别中唯一，例如 "worlds1"
    pub tag: String,
    /// 服务器分组 ID
    pub group_id: String,
    pub category: FavoriteCategory,
    pub display_name: String,
    pub visibility: GroupVisibility,
}

/// 按类别计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCounts {
    #[serde(default)]
    pub world: u32,
    #[serde(default)]
    pub avatar: u32,
    #[serde(default)]
    pub friend: u32,
}

impl CategoryCounts {
    pub fn get(&self, category: FavoriteCategory) -> u32 {
        match category {
            FavoriteCategory::World => self.world,
            FavoriteCategory::Avatar => self.avatar,
            FavoriteCategory::Friend => self.friend,
        }
    }
}

/// 收藏数量上限
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteLimits {
    /// 每个类别最多的分组数
    #[serde(default)]
    pub max_favorite_groups: CategoryCounts,
    /// 每个分组最多的收藏数
    #[serde(default)]
    pub max_favorites_per_group: CategoryCounts,
}

/// 分组 tag -> 收藏列表
pub type GroupedFavorites = BTreeMap<String, Vec<FavoriteEntry>>;

/// 收藏镜像在某一时刻的完整状态，发布后不可变
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteSnapshot {
    pub worlds: GroupedFavorites,
    pub avatars: GroupedFavorites,
    pub friends: GroupedFavorites,
    /// 分组元数据，三个类别共用一个命名空间
    pub groups: HashMap<String, FavoriteGroup>,
    pub limits: Option<FavoriteLimits>,
    /// 最近一次成功刷新的时间
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl FavoriteSnapshot {
    pub fn groups(&self, category: FavoriteCategory) -> &GroupedFavorites {
        match category {
            FavoriteCategory::World => &self.worlds,
            FavoriteCategory::Avatar => &self.avatars,
            FavoriteCategory::Friend => &self.friends,
        }
    }

    pub(crate) fn groups_mut(&mut self, category: FavoriteCategory) -> &mut GroupedFavorites {
        match category {
            FavoriteCategory::World => &mut self.worlds,
            FavoriteCategory::Avatar => &mut self.avatars,
            FavoriteCategory::Friend => &mut self.friends,
        }
    }

    /// 按上限预建空分组
    pub(crate) fn seed_default_groups(&mut self, limits: &FavoriteLimits) {
        for category in FavoriteCategory::ALL {
            let lists = self.groups_mut(category);
            for i in 0..limits.max_favorite_groups.get(category) {
                lists.entry(category.default_group_tag(i)).or_default();
            }
        }
    }

    /// 线性扫描该类别下所有分组，命中即返回
    pub fn is_favorite(&self, category: FavoriteCategory, subject_id: &str) -> bool {
        self.find(category, subject_id).is_some()
    }

    /// 查找收藏记录 ID 和所在分组 tag
    pub fn lookup_favorite_record(
        &self,
        category: FavoriteCategory,
        subject_id: &str,
    ) -> Option<(Option<String>, String)> {
        self.find(category, subject_id).map(|(tag, entry)| {
            (
                entry.favorite_record_id().map(str::to_string),
                tag.to_string(),
            )
        })
    }

    fn find(&self, category: FavoriteCategory, subject_id: &str) -> Option<(&str, &FavoriteEntry)> {
        self.groups(category).iter().find_map(|(tag, entries)| {
            entries
                .iter()
                .find(|e| e.subject_id() == subject_id)
                .map(|e| (tag.as_str(), e))
        })
    }

    /// 分组显示名：优先 displayName，其次分组名，找不到分组时返回 "???"
    pub fn group_display_name(&self, tag: &str) -> String {
        match self.groups.get(tag) {
            Some(group) if !group.display_name.is_empty() => group.display_name.clone(),
            Some(group) if !group.tag.is_empty() => group.tag.clone(),
            _ => UNKNOWN_GROUP_NAME.to_string(),
        }
    }

    pub fn group_metadata(&self, tag: &str) -> Option<&FavoriteGroup> {
        self.groups.get(tag)
    }

    /// 该类别收藏总数
    pub fn favorite_count(&self, category: FavoriteCategory) -> usize {
        self.groups(category).values().map(Vec::len).sum()
    }
}

/// 收藏镜像配置
#[derive(Clone, Debug)]
pub struct FavoriteMirrorConfig {
    pub client: ClientConfig,
    /// 拉取分组内收藏时的分页大小
    pub page_size: usize,
}

impl FavoriteMirrorConfig {
    pub fn new(client: ClientConfig) -> Self {
        Self {
            client,
            page_size: 100,
        }
    }
}
