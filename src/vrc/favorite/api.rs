//! 收藏 HTTP API 客户端
//!
//! 负责所有收藏相关的 HTTP 请求

use crate::vrc::favorite::gateway::FavoriteGateway;
use crate::vrc::favorite::models::{
    FavoriteCategory, FavoriteEntry, FavoriteGroup, FavoriteLimits, GroupVisibility,
};
use crate::vrc::favorite::types::{
    AddFavoriteReq, AddFavoriteResp, AddedFavorite, FavoriteLimitsResp, RemoteFavoriteGroup,
    RemoteFavoriteItem, UpdateFavoriteGroupReq,
};
use crate::vrc::types::{handle_empty_response, handle_http_response};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::future::Future;
use tracing::{debug, info};
use uuid::Uuid;

/// 服务器允许一次拉取的最大分组数
const MAX_GROUPS_PER_REQUEST: usize = 50;

/// 服务器允许一次拉取的最大收藏数，超过会被静默截断
const MAX_ENTRIES_PER_REQUEST: usize = 100;

type FixedQuery = &'static [(&'static str, &'static str)];

const NO_QUERY: FixedQuery = &[];
// 好友收藏没有专用接口，走通用收藏列表并按类型过滤
const FRIEND_QUERY: FixedQuery = &[("type", "friend")];

/// 收藏相关的 HTTP API 客户端
pub struct FavoriteApi {
    client: reqwest::Client,
    api_base_url: String,
    user_id: String,
    page_size: usize,
}

impl FavoriteApi {
    /// 创建新的收藏 API 客户端
    ///
    /// `client` 应该已经在外部配置好认证 cookie
    pub fn new(client: reqwest::Client, api_base_url: String, user_id: String) -> Self {
        Self {
            client,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            user_id,
            page_size: MAX_ENTRIES_PER_REQUEST,
        }
    }

    /// 设置分组内收藏的分页大小，范围 1..=100
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.clamp(1, MAX_ENTRIES_PER_REQUEST);
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base_url, path)
    }

    /// 分组内收藏列表的接口路径和固定查询参数
    fn entries_endpoint(category: FavoriteCategory) -> (&'static str, FixedQuery) {
        match category {
            FavoriteCategory::World => ("worlds/favorites", NO_QUERY),
            FavoriteCategory::Avatar => ("avatars/favorites", NO_QUERY),
            FavoriteCategory::Friend => ("favorites", FRIEND_QUERY),
        }
    }

    /// 拉取一页分组内收藏
    async fn get_entries_page(
        &self,
        category: FavoriteCategory,
        tag: &str,
        offset: usize,
    ) -> Result<Vec<RemoteFavoriteItem>> {
        let operation_id = Uuid::new_v4().to_string();
        let (path, fixed_query) = Self::entries_endpoint(category);
        let url = self.url(path);

        debug!(
            "[FavoriteAPI]   请求URL: {}, tag: {}, offset: {}, 操作ID: {}",
            url, tag, offset, operation_id
        );

        let response = self
            .client
            .get(&url)
            .query(fixed_query)
            .query(&[
                ("tag", tag.to_string()),
                ("n", self.page_size.to_string()),
                ("offset", offset.to_string()),
            ])
            .send()
            .await
            .context("请求失败")?;

        handle_http_response(response, "分组收藏列表").await
    }
}

/// 按 offset 逐页拉取，直到某一页不满 `page_size` 为止
///
/// `page_size` 不能超过服务器单次上限，否则被截断的整页会被当成最后一页。
async fn collect_pages<T, F, Fut>(page_size: usize, mut fetch_page: F) -> Result<Vec<T>>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    let mut items = Vec::new();
    loop {
        let page = fetch_page(items.len()).await?;
        let page_len = page.len();
        items.extend(page);

        if page_len == 0 || page_len < page_size {
            break;
        }
    }
    Ok(items)
}

#[async_trait]
impl FavoriteGateway for FavoriteApi {
    async fn get_favorite_limits(&self) -> Result<FavoriteLimits> {
        let operation_id = Uuid::new_v4().to_string();
        let url = self.url("auth/user/favoritelimits");

        info!("[FavoriteAPI] 📡 请求收藏上限");
        debug!(
            "[FavoriteAPI]   请求URL: {}, 用户ID: {}, 操作ID: {}",
            url, self.user_id, operation_id
        );

        let response = self.client.get(&url).send().await.context("请求失败")?;
        let limits: FavoriteLimitsResp = handle_http_response(response, "收藏上限").await?;

        info!(
            "[FavoriteAPI] ✅ 收藏上限 - 世界分组: {}, 模型分组: {}, 好友分组: {}",
            limits.max_favorite_groups.world,
            limits.max_favorite_groups.avatar,
            limits.max_favorite_groups.friend
        );
        Ok(limits)
    }

    async fn get_favorite_groups(&self, category: FavoriteCategory) -> Result<Vec<FavoriteGroup>> {
        let operation_id = Uuid::new_v4().to_string();
        let url = self.url("favorite/groups");

        info!("[FavoriteAPI] 📡 请求收藏分组，类别: {}", category);
        debug!("[FavoriteAPI]   请求URL: {}, 操作ID: {}", url, operation_id);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("type", category.as_str().to_string()),
                ("n", MAX_GROUPS_PER_REQUEST.to_string()),
            ])
            .send()
            .await
            .context("请求失败")?;

        let groups: Vec<RemoteFavoriteGroup> =
            handle_http_response(response, "收藏分组").await?;

        info!(
            "[FavoriteAPI] ✅ 收藏分组响应，类别: {}, 分组数: {}",
            category,
            groups.len()
        );
        Ok(groups.into_iter().map(FavoriteGroup::from).collect())
    }

    async fn get_favorite_entries(
        &self,
        category: FavoriteCategory,
        tag: &str,
    ) -> Result<Vec<FavoriteEntry>> {
        info!(
            "[FavoriteAPI] 📡 请求分组收藏，类别: {}, 分组: {}",
            category, tag
        );

        let entries: Vec<FavoriteEntry> = collect_pages(self.page_size, move |offset| {
            self.get_entries_page(category, tag, offset)
        })
        .await?
        .into_iter()
        .map(|item| item.into_entry(category))
        .collect();

        info!(
            "[FavoriteAPI] ✅ 分组收藏响应，分组: {}, 收藏数: {}",
            tag,
            entries.len()
        );
        Ok(entries)
    }

    async fn add_favorite(
        &self,
        category: FavoriteCategory,
        subject_id: &str,
        tag: &str,
    ) -> Result<AddedFavorite> {
        let operation_id = Uuid::new_v4().to_string();
        let url = self.url("favorites");

        info!(
            "[FavoriteAPI] 📡 添加收藏，类别: {}, 对象: {}, 分组: {}",
            category, subject_id, tag
        );
        debug!("[FavoriteAPI]   请求URL: {}, 操作ID: {}", url, operation_id);

        let response = self
            .client
            .post(&url)
            .json(&AddFavoriteReq {
                category,
                favorite_id: subject_id.to_string(),
                tags: vec![tag.to_string()],
            })
            .send()
            .await
            .context("请求失败")?;

        let resp: AddFavoriteResp = handle_http_response(response, "添加收藏").await?;
        let added = resp.into_added(category);
        info!(
            "[FavoriteAPI] ✅ 添加收藏成功，收藏记录ID: {}",
            added.favorite_record_id
        );
        Ok(added)
    }

    async fn remove_favorite(&self, favorite_record_id: &str) -> Result<()> {
        let operation_id = Uuid::new_v4().to_string();
        let url = self.url(&format!("favorites/{}", favorite_record_id));

        info!("[FavoriteAPI] 📡 删除收藏，收藏记录ID: {}", favorite_record_id);
        debug!("[FavoriteAPI]   请求URL: {}, 操作ID: {}", url, operation_id);

        let response = self.client.delete(&url).send().await.context("请求失败")?;
        handle_empty_response(response, "删除收藏").await?;

        info!("[FavoriteAPI] ✅ 删除收藏成功");
        Ok(())
    }

    async fn update_favorite_group(
        &self,
        category: FavoriteCategory,
        name: &str,
        display_name: &str,
        visibility: GroupVisibility,
    ) -> Result<()> {
        let operation_id = Uuid::new_v4().to_string();
        let url = self.url(&format!(
            "favorite/group/{}/{}/{}",
            category, name, self.user_id
        ));

        info!(
            "[FavoriteAPI] 📡 更新收藏分组，分组: {}, 显示名: {}, 可见性: {}",
            name, display_name, visibility
        );
        debug!("[FavoriteAPI]   请求URL: {}, 操作ID: {}", url, operation_id);

        let response = self
            .client
            .put(&url)
            .json(&UpdateFavoriteGroupReq {
                display_name: display_name.to_string(),
                visibility,
            })
            .send()
            .await
            .context("请求失败")?;
        handle_empty_response(response, "更新收藏分组").await?;

        info!("[FavoriteAPI] ✅ 更新收藏分组成功");
        Ok(())
    }
}
