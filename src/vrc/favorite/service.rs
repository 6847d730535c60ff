//! 收藏镜像服务层
//!
//! 在本地维护一份服务器收藏的镜像（世界、模型、好友三类，按分组 tag 组织），
//! 所有写操作先经过服务器确认，成功后才提交到本地。
//!
//! 本地状态只有一个写入点：`watch::Sender` 中的不可变快照，每次提交整体替换，
//! 读方要么看到旧快照，要么看到完整的新快照。

use crate::vrc::client::build_http_client;
use crate::vrc::favorite::api::FavoriteApi;
use crate::vrc::favorite::gateway::FavoriteGateway;
use crate::vrc::favorite::listener::{EmptyFavoriteListener, FavoriteListener};
use crate::vrc::favorite::models::{
    FavoriteCategory, FavoriteDraft, FavoriteEntry, FavoriteGroup, FavoriteLimits,
    FavoriteMirrorConfig, FavoriteSnapshot,
};
use anyhow::{Context, Result};
use chrono::Utc;
use futures_util::future::try_join_all;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, warn};

/// 收藏镜像
pub struct FavoriteMirror {
    /// 远端接口
    gateway: Arc<dyn FavoriteGateway>,
    /// 收藏监听器
    listener: Arc<dyn FavoriteListener>,
    /// 当前快照，同时作为订阅通道
    state: watch::Sender<Arc<FavoriteSnapshot>>,
    /// 串行化所有写操作（远端调用 + 本地提交）
    write_lock: Mutex<()>,
}

impl FavoriteMirror {
    /// 创建新的收藏镜像（使用默认空监听器）
    pub fn new(config: FavoriteMirrorConfig) -> Result<Self> {
        Self::with_listener(config, Arc::new(EmptyFavoriteListener))
    }

    /// 创建新的收藏镜像（带自定义监听器，内部创建 HTTP 客户端）
    pub fn with_listener(
        config: FavoriteMirrorConfig,
        listener: Arc<dyn FavoriteListener>,
    ) -> Result<Self> {
        let http_client = build_http_client(&config.client)?;
        let api = FavoriteApi::new(
            http_client,
            config.client.api_base_url.clone(),
            config.client.user_id.clone(),
        )
        .with_page_size(config.page_size);

        info!(
            "[FavoriteMirror] 创建收藏镜像，用户ID: {}",
            config.client.user_id
        );
        Ok(Self::with_gateway(Arc::new(api), listener))
    }

    /// 使用外部提供的远端接口创建收藏镜像
    pub fn with_gateway(
        gateway: Arc<dyn FavoriteGateway>,
        listener: Arc<dyn FavoriteListener>,
    ) -> Self {
        let (state, _) = watch::channel(Arc::new(FavoriteSnapshot::default()));
        Self {
            gateway,
            listener,
            state,
            write_lock: Mutex::new(()),
        }
    }

    /// 当前快照
    pub fn snapshot(&self) -> Arc<FavoriteSnapshot> {
        self.state.borrow().clone()
    }

    /// 订阅快照变更
    pub fn subscribe(&self) -> watch::Receiver<Arc<FavoriteSnapshot>> {
        self.state.subscribe()
    }

    /// 最近一次刷新拿到的收藏上限
    pub fn limits(&self) -> Option<FavoriteLimits> {
        self.state.borrow().limits
    }

    pub fn is_favorite(&self, category: FavoriteCategory, subject_id: &str) -> bool {
        self.state.borrow().is_favorite(category, subject_id)
    }

    /// 查找收藏记录 ID 和所在分组 tag
    pub fn lookup_favorite_record(
        &self,
        category: FavoriteCategory,
        subject_id: &str,
    ) -> Option<(Option<String>, String)> {
        self.state
            .borrow()
            .lookup_favorite_record(category, subject_id)
    }

    pub fn group_display_name(&self, tag: &str) -> String {
        self.state.borrow().group_display_name(tag)
    }

    pub fn group_metadata(&self, tag: &str) -> Option<FavoriteGroup> {
        self.state.borrow().group_metadata(tag).cloned()
    }

    /// 在当前快照上修改并发布
    fn commit(&self, modify: impl FnOnce(&mut FavoriteSnapshot)) {
        self.state.send_modify(|snapshot| modify(Arc::make_mut(snapshot)));
    }

    /// 全量刷新
    ///
    /// 新状态从空白开始构建，全部拉取成功后一次性替换；任何一步失败都保留旧快照。
    pub async fn refresh(&self) -> bool {
        let _guard = self.write_lock.lock().await;
        info!("[FavoriteMirror] 🔄 开始全量刷新收藏...");

        let snapshot = match self.fetch_snapshot().await {
            Ok(snapshot) => Arc::new(snapshot),
            Err(e) => {
                error!("[FavoriteMirror] 全量刷新失败，保留旧数据: {:?}", e);
                return false;
            }
        };

        info!(
            "[FavoriteMirror] ✅ 全量刷新完成 - 世界: {}, 模型: {}, 好友: {}, 分组: {}",
            snapshot.favorite_count(FavoriteCategory::World),
            snapshot.favorite_count(FavoriteCategory::Avatar),
            snapshot.favorite_count(FavoriteCategory::Friend),
            snapshot.groups.len()
        );

        self.state.send_replace(snapshot.clone());
        self.listener.on_favorites_refreshed(snapshot).await;
        true
    }

    async fn fetch_snapshot(&self) -> Result<FavoriteSnapshot> {
        let limits = self
            .gateway
            .get_favorite_limits()
            .await
            .context("获取收藏上限失败")?;

        let mut snapshot = FavoriteSnapshot {
            limits: Some(limits),
            ..Default::default()
        };
        snapshot.seed_default_groups(&limits);

        for category in FavoriteCategory::ALL {
            let groups = self
                .gateway
                .get_favorite_groups(category)
                .await
                .with_context(|| format!("获取{}收藏分组失败", category))?;

            let entry_lists = try_join_all(
                groups
                    .iter()
                    .map(|group| self.gateway.get_favorite_entries(category, &group.tag)),
            )
            .await
            .with_context(|| format!("获取{}分组收藏失败", category))?;

            for (group, entries) in groups.into_iter().zip(entry_lists) {
                debug!(
                    "[FavoriteMirror]   分组 {} ({}) 收藏数: {}",
                    group.tag,
                    category,
                    entries.len()
                );
                snapshot
                    .groups_mut(category)
                    .entry(group.tag.clone())
                    .or_default()
                    .extend(entries);
                snapshot.groups.insert(group.tag.clone(), group);
            }
        }

        snapshot.refreshed_at = Some(Utc::now());
        Ok(snapshot)
    }

    /// 添加收藏
    ///
    /// 好友收藏直接由服务器响应生成，忽略 `draft`；世界/模型使用 `draft` 中的展示信息。
    pub async fn add_favorite(
        &self,
        category: FavoriteCategory,
        subject_id: &str,
        tag: &str,
        draft: Option<FavoriteDraft>,
    ) -> bool {
        let _guard = self.write_lock.lock().await;

        let added = match self.gateway.add_favorite(category, subject_id, tag).await {
            Ok(added) => added,
            Err(e) => {
                warn!(
                    "[FavoriteMirror] 添加收藏失败，类别: {}, 对象: {}, 分组: {}, 错误: {:?}",
                    category, subject_id, tag, e
                );
                return false;
            }
        };

        let draft = match category {
            FavoriteCategory::Friend => FavoriteDraft::default(),
            FavoriteCategory::World | FavoriteCategory::Avatar => draft.unwrap_or_default(),
        };
        let mut entry = FavoriteEntry::pending(subject_id, draft);
        entry.confirm(added.favorite_record_id);

        self.commit(|snapshot| {
            snapshot
                .groups_mut(category)
                .entry(tag.to_string())
                .or_default()
                .push(entry.clone());
        });
        info!(
            "[FavoriteMirror] 新增收藏: {} -> {} ({})",
            subject_id, tag, category
        );

        self.listener
            .on_favorite_added(category, tag.to_string(), entry)
            .await;
        true
    }

    /// 删除收藏
    ///
    /// 本地找不到（或尚无收藏记录 ID）时直接返回 false，不请求服务器。
    pub async fn remove_favorite(&self, category: FavoriteCategory, subject_id: &str) -> bool {
        let _guard = self.write_lock.lock().await;

        let Some((Some(record_id), tag)) = self.lookup_favorite_record(category, subject_id)
        else {
            debug!(
                "[FavoriteMirror] 本地无此收藏，跳过删除，类别: {}, 对象: {}",
                category, subject_id
            );
            return false;
        };

        if let Err(e) = self.gateway.remove_favorite(&record_id).await {
            warn!(
                "[FavoriteMirror] 删除收藏失败，对象: {}, 收藏记录ID: {}, 错误: {:?}",
                subject_id, record_id, e
            );
            return false;
        }

        self.commit(|snapshot| {
            if let Some(entries) = snapshot.groups_mut(category).get_mut(&tag) {
                entries.retain(|e| e.subject_id() != subject_id);
            }
        });
        info!(
            "[FavoriteMirror] 删除收藏: {} <- {} ({})",
            subject_id, tag, category
        );

        self.listener
            .on_favorite_removed(category, tag, subject_id.to_string())
            .await;
        true
    }

    /// 更新分组元数据（类别、分组名、显示名、可见性）
    ///
    /// `metadata.tag` 必须等于 `tag`，否则不请求服务器直接返回 false。
    /// 服务器确认后才写入本地。
    pub async fn update_group_metadata(&self, tag: &str, metadata: FavoriteGroup) -> bool {
        let _guard = self.write_lock.lock().await;

        if metadata.tag != tag {
            warn!(
                "[FavoriteMirror] 分组名不一致，拒绝更新: {} != {}",
                tag, metadata.tag
            );
            return false;
        }

        if let Err(e) = self
            .gateway
            .update_favorite_group(
                metadata.category,
                &metadata.tag,
                &metadata.display_name,
                metadata.visibility,
            )
            .await
        {
            warn!(
                "[FavoriteMirror] 更新分组失败，分组: {}, 错误: {:?}",
                tag, e
            );
            return false;
        }

        self.commit(|snapshot| {
            snapshot.groups.insert(tag.to_string(), metadata.clone());
        });
        info!(
            "[FavoriteMirror] 分组已更新: {} -> {} ({})",
            tag, metadata.display_name, metadata.visibility
        );

        self.listener
            .on_group_metadata_changed(tag.to_string(), metadata)
            .await;
        true
    }

    /// 清空镜像（登出时调用）
    pub async fn clear(&self) {
        let _guard = self.write_lock.lock().await;
        let snapshot = Arc::new(FavoriteSnapshot::default());
        self.state.send_replace(snapshot.clone());
        info!("[FavoriteMirror] 已清空本地收藏");
        self.listener.on_favorites_refreshed(snapshot).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vrc::favorite::models::{CategoryCounts, GroupVisibility};
    use crate::vrc::favorite::types::AddedFavorite;
    use async_trait::async_trait;
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex as StdMutex;

    /// 内存中的假远端
    #[derive(Default)]
    struct FakeGateway {
        limits: FavoriteLimits,
        groups: HashMap<FavoriteCategory, Vec<FavoriteGroup>>,
        entries: HashMap<String, Vec<FavoriteEntry>>,
        /// 依次分配的收藏记录 ID
        record_ids: StdMutex<VecDeque<String>>,
        /// 拉取该 tag 的收藏时失败
        failing_tag: Option<String>,
        fail: AtomicBool,
        calls: StdMutex<Vec<String>>,
    }

    impl FakeGateway {
        fn record(&self, call: String) -> Result<()> {
            self.calls.lock().unwrap().push(call);
            if self.fail.load(Ordering::SeqCst) {
                anyhow::bail!("gateway down");
            }
            Ok(())
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn set_failing(&self, fail: bool) {
            self.fail.store(fail, Ordering::SeqCst);
        }

        fn with_record_ids(self, ids: &[&str]) -> Self {
            *self.record_ids.lock().unwrap() = ids.iter().map(|s| s.to_string()).collect();
            self
        }
    }

    #[async_trait]
    impl FavoriteGateway for FakeGateway {
        async fn get_favorite_limits(&self) -> Result<FavoriteLimits> {
            self.record("limits".to_string())?;
            Ok(self.limits)
        }

        async fn get_favorite_groups(
            &self,
            category: FavoriteCategory,
        ) -> Result<Vec<FavoriteGroup>> {
            self.record(format!("groups:{}", category))?;
            Ok(self.groups.get(&category).cloned().unwrap_or_default())
        }

        async fn get_favorite_entries(
            &self,
            category: FavoriteCategory,
            tag: &str,
        ) -> Result<Vec<FavoriteEntry>> {
            self.record(format!("entries:{}:{}", category, tag))?;
            if self.failing_tag.as_deref() == Some(tag) {
                anyhow::bail!("entries of {} unavailable", tag);
            }
            Ok(self.entries.get(tag).cloned().unwrap_or_default())
        }

        async fn add_favorite(
            &self,
            category: FavoriteCategory,
            subject_id: &str,
            tag: &str,
        ) -> Result<AddedFavorite> {
            self.record(format!("add:{}:{}:{}", category, subject_id, tag))?;
            let favorite_record_id = self
                .record_ids
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| format!("fvrt_{}", subject_id));
            Ok(AddedFavorite { favorite_record_id })
        }

        async fn remove_favorite(&self, favorite_record_id: &str) -> Result<()> {
            self.record(format!("remove:{}", favorite_record_id))
        }

        async fn update_favorite_group(
            &self,
            category: FavoriteCategory,
            name: &str,
            display_name: &str,
            visibility: GroupVisibility,
        ) -> Result<()> {
            self.record(format!(
                "update:{}:{}:{}:{}",
                category, name, display_name, visibility
            ))
        }
    }

    #[derive(Default)]
    struct RecordingListener {
        events: StdMutex<Vec<String>>,
    }

    #[async_trait]
    impl FavoriteListener for RecordingListener {
        async fn on_favorites_refreshed(&self, snapshot: Arc<FavoriteSnapshot>) {
            self.events
                .lock()
                .unwrap()
                .push(format!("refreshed:{}", snapshot.groups.len()));
        }

        async fn on_favorite_added(
            &self,
            category: FavoriteCategory,
            tag: String,
            entry: FavoriteEntry,
        ) {
            self.events
                .lock()
                .unwrap()
                .push(format!("added:{}:{}:{}", category, tag, entry.subject_id()));
        }

        async fn on_favorite_removed(
            &self,
            category: FavoriteCategory,
            tag: String,
            subject_id: String,
        ) {
            self.events
                .lock()
                .unwrap()
                .push(format!("removed:{}:{}:{}", category, tag, subject_id));
        }

        async fn on_group_metadata_changed(&self, tag: String, group: FavoriteGroup) {
            self.events
                .lock()
                .unwrap()
                .push(format!("group:{}:{}", tag, group.display_name));
        }
    }

    fn group(tag: &str, category: FavoriteCategory, display_name: &str) -> FavoriteGroup {
        FavoriteGroup {
            tag: tag.to_string(),
            group_id: format!("fvgrp_{}", tag),
            category,
            display_name: display_name.to_string(),
            visibility: GroupVisibility::Private,
        }
    }

    fn limits(world: u32, avatar: u32, friend: u32) -> FavoriteLimits {
        FavoriteLimits {
            max_favorite_groups: CategoryCounts {
                world,
                avatar,
                friend,
            },
            ..Default::default()
        }
    }

    /// 世界上限 2：worlds1 有 w1，worlds2 为空
    fn world_gateway() -> FakeGateway {
        FakeGateway {
            limits: limits(2, 0, 0),
            groups: HashMap::from([(
                FavoriteCategory::World,
                vec![
                    group("worlds1", FavoriteCategory::World, ""),
                    group("worlds2", FavoriteCategory::World, "Later"),
                ],
            )]),
            entries: HashMap::from([(
                "worlds1".to_string(),
                vec![FavoriteEntry::confirmed("w1", "fvrt_w1", "World One", "")],
            )]),
            ..Default::default()
        }
    }

    /// 三个类别都有数据
    fn full_gateway() -> FakeGateway {
        FakeGateway {
            limits: limits(2, 1, 2),
            groups: HashMap::from([
                (
                    FavoriteCategory::World,
                    vec![group("worlds1", FavoriteCategory::World, "Hangouts")],
                ),
                (
                    FavoriteCategory::Avatar,
                    vec![group("avatars1", FavoriteCategory::Avatar, "Main")],
                ),
                (
                    FavoriteCategory::Friend,
                    vec![
                        group("group_0", FavoriteCategory::Friend, "Besties"),
                        group("group_5", FavoriteCategory::Friend, "Overflow"),
                    ],
                ),
            ]),
            entries: HashMap::from([
                (
                    "worlds1".to_string(),
                    vec![
                        FavoriteEntry::confirmed("w1", "fvrt_w1", "One", ""),
                        FavoriteEntry::confirmed("w2", "fvrt_w2", "Two", ""),
                    ],
                ),
                (
                    "avatars1".to_string(),
                    vec![FavoriteEntry::confirmed("a1", "fvrt_a1", "Avi", "")],
                ),
                (
                    "group_0".to_string(),
                    vec![FavoriteEntry::confirmed("u1", "fvrt_u1", "", "")],
                ),
                (
                    "group_5".to_string(),
                    vec![FavoriteEntry::confirmed("u5", "fvrt_u5", "", "")],
                ),
            ]),
            ..Default::default()
        }
    }

    fn mirror(gateway: Arc<FakeGateway>) -> FavoriteMirror {
        FavoriteMirror::with_gateway(gateway, Arc::new(EmptyFavoriteListener))
    }

    fn contents(
        snapshot: &FavoriteSnapshot,
    ) -> (
        crate::vrc::favorite::models::GroupedFavorites,
        crate::vrc::favorite::models::GroupedFavorites,
        crate::vrc::favorite::models::GroupedFavorites,
        HashMap<String, FavoriteGroup>,
    ) {
        (
            snapshot.worlds.clone(),
            snapshot.avatars.clone(),
            snapshot.friends.clone(),
            snapshot.groups.clone(),
        )
    }

    #[tokio::test]
    async fn refresh_populates_reported_groups() {
        let mirror = mirror(Arc::new(world_gateway()));

        assert!(mirror.refresh().await);

        assert!(mirror.is_favorite(FavoriteCategory::World, "w1"));
        assert!(!mirror.is_favorite(FavoriteCategory::World, "w2"));
        assert!(!mirror.is_favorite(FavoriteCategory::Avatar, "w1"));
        assert_eq!(mirror.group_display_name("worlds1"), "worlds1");
        assert_eq!(mirror.group_display_name("worlds2"), "Later");
        assert_eq!(mirror.group_display_name("avatars1"), "???");

        let snapshot = mirror.snapshot();
        assert_eq!(snapshot.worlds.len(), 2);
        assert!(snapshot.worlds["worlds2"].is_empty());
        assert!(snapshot.refreshed_at.is_some());
        assert_eq!(mirror.limits().map(|l| l.max_favorite_groups.world), Some(2));
    }

    #[tokio::test]
    async fn refresh_twice_matches_refresh_once() {
        let mirror = mirror(Arc::new(full_gateway()));

        assert!(mirror.refresh().await);
        let once = contents(&mirror.snapshot());
        assert!(mirror.refresh().await);
        let twice = contents(&mirror.snapshot());

        assert_eq!(once, twice);
        assert_eq!(twice.0["worlds1"].len(), 2);
    }

    #[tokio::test]
    async fn refresh_keeps_friend_metadata_and_extra_tags() {
        let mirror = mirror(Arc::new(full_gateway()));
        assert!(mirror.refresh().await);

        let snapshot = mirror.snapshot();
        assert_eq!(
            snapshot.friends.keys().collect::<Vec<_>>(),
            vec!["group_0", "group_1", "group_5"]
        );
        assert!(snapshot.is_favorite(FavoriteCategory::Friend, "u5"));
        assert_eq!(mirror.group_display_name("group_0"), "Besties");
        assert_eq!(
            mirror.group_metadata("avatars1").map(|g| g.category),
            Some(FavoriteCategory::Avatar)
        );
        assert_eq!(
            mirror.lookup_favorite_record(FavoriteCategory::World, "w2"),
            Some((Some("fvrt_w2".to_string()), "worlds1".to_string()))
        );
        assert_eq!(mirror.lookup_favorite_record(FavoriteCategory::World, "w9"), None);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_snapshot() {
        let gateway = Arc::new(world_gateway());
        let mirror = mirror(gateway.clone());
        assert!(mirror.refresh().await);
        let before = mirror.snapshot();

        gateway.set_failing(true);
        assert!(!mirror.refresh().await);
        assert_eq!(*mirror.snapshot(), *before);

        let broken = Arc::new(FakeGateway {
            failing_tag: Some("avatars1".to_string()),
            ..full_gateway()
        });
        let mirror = FavoriteMirror::with_gateway(broken, Arc::new(EmptyFavoriteListener));
        assert!(!mirror.refresh().await);
        assert!(!mirror.is_favorite(FavoriteCategory::World, "w1"));
        assert!(mirror.snapshot().worlds.is_empty());
    }

    #[tokio::test]
    async fn add_world_commits_after_confirmation() {
        let gateway = Arc::new(world_gateway().with_record_ids(&["fvrt_new"]));
        let mirror = mirror(gateway.clone());
        assert!(mirror.refresh().await);

        let draft = FavoriteDraft::new("Second World", "https://example.invalid/w2.png");
        assert!(
            mirror
                .add_favorite(FavoriteCategory::World, "w2", "worlds2", Some(draft))
                .await
        );

        assert!(mirror.is_favorite(FavoriteCategory::World, "w2"));
        let snapshot = mirror.snapshot();
        let entry = &snapshot.worlds["worlds2"][0];
        assert_eq!(entry.favorite_record_id(), Some("fvrt_new"));
        assert_eq!(entry.display_name, "Second World");
        assert_eq!(
            gateway.calls().last().map(String::as_str),
            Some("add:world:w2:worlds2")
        );
    }

    #[tokio::test]
    async fn add_avatar_without_draft_still_tracks_subject() {
        let mirror = mirror(Arc::new(FakeGateway::default()));

        assert!(
            mirror
                .add_favorite(FavoriteCategory::Avatar, "a7", "avatars1", None)
                .await
        );
        assert_eq!(
            mirror.lookup_favorite_record(FavoriteCategory::Avatar, "a7"),
            Some((Some("fvrt_a7".to_string()), "avatars1".to_string()))
        );
    }

    #[tokio::test]
    async fn add_friend_is_built_from_server_response() {
        let gateway = Arc::new(FakeGateway::default().with_record_ids(&["rec1"]));
        let mirror = mirror(gateway);

        let ignored = FavoriteDraft::new("Somebody", "https://example.invalid/u.png");
        assert!(
            mirror
                .add_favorite(FavoriteCategory::Friend, "u42", "group_0", Some(ignored))
                .await
        );

        let snapshot = mirror.snapshot();
        let entry = &snapshot.friends["group_0"][0];
        assert_eq!(entry.subject_id(), "u42");
        assert_eq!(entry.favorite_record_id(), Some("rec1"));
        assert!(entry.display_name.is_empty());
        assert!(entry.thumbnail_url.is_empty());
    }

    #[tokio::test]
    async fn failed_add_leaves_mirror_unchanged() {
        let gateway = Arc::new(world_gateway());
        let mirror = mirror(gateway.clone());
        assert!(mirror.refresh().await);
        let before = mirror.snapshot();

        gateway.set_failing(true);
        assert!(
            !mirror
                .add_favorite(FavoriteCategory::World, "w3", "worlds1", None)
                .await
        );
        assert!(!mirror.is_favorite(FavoriteCategory::World, "w3"));
        assert_eq!(*mirror.snapshot(), *before);
    }

    #[tokio::test]
    async fn remove_present_favorite() {
        let gateway = Arc::new(full_gateway());
        let mirror = mirror(gateway.clone());
        assert!(mirror.refresh().await);

        assert!(mirror.remove_favorite(FavoriteCategory::World, "w1").await);

        assert!(!mirror.is_favorite(FavoriteCategory::World, "w1"));
        assert!(mirror.is_favorite(FavoriteCategory::World, "w2"));
        assert_eq!(
            gateway.calls().last().map(String::as_str),
            Some("remove:fvrt_w1")
        );
    }

    #[tokio::test]
    async fn remove_absent_favorite_skips_gateway() {
        let gateway = Arc::new(full_gateway());
        let mirror = mirror(gateway.clone());
        assert!(mirror.refresh().await);
        let calls_before = gateway.calls().len();
        let before = mirror.snapshot();

        // a1 是模型收藏，不在好友分组里
        assert!(!mirror.remove_favorite(FavoriteCategory::Friend, "a1").await);
        assert!(!mirror.remove_favorite(FavoriteCategory::Avatar, "a9").await);

        assert_eq!(gateway.calls().len(), calls_before);
        assert_eq!(*mirror.snapshot(), *before);
    }

    #[tokio::test]
    async fn failed_remove_leaves_mirror_unchanged() {
        let gateway = Arc::new(full_gateway());
        let mirror = mirror(gateway.clone());
        assert!(mirror.refresh().await);
        let before = mirror.snapshot();

        gateway.set_failing(true);
        assert!(!mirror.remove_favorite(FavoriteCategory::Avatar, "a1").await);

        assert!(mirror.is_favorite(FavoriteCategory::Avatar, "a1"));
        assert_eq!(*mirror.snapshot(), *before);
    }

    #[tokio::test]
    async fn group_update_commits_only_on_success() {
        let gateway = Arc::new(full_gateway());
        let mirror = mirror(gateway.clone());
        assert!(mirror.refresh().await);

        let mut renamed = group("worlds1", FavoriteCategory::World, "Weekend");
        renamed.visibility = GroupVisibility::Public;
        assert!(mirror.update_group_metadata("worlds1", renamed.clone()).await);
        assert_eq!(mirror.group_metadata("worlds1"), Some(renamed));
        assert_eq!(
            gateway.calls().last().map(String::as_str),
            Some("update:world:worlds1:Weekend:public")
        );

        gateway.set_failing(true);
        let rejected = group("worlds1", FavoriteCategory::World, "Rejected");
        assert!(!mirror.update_group_metadata("worlds1", rejected).await);
        assert_eq!(mirror.group_display_name("worlds1"), "Weekend");
    }

    #[tokio::test]
    async fn group_update_rejects_mismatched_tag() {
        let gateway = Arc::new(full_gateway());
        let mirror = mirror(gateway.clone());
        assert!(mirror.refresh().await);
        let calls_before = gateway.calls().len();
        let before = mirror.snapshot();

        let other = group("worlds2", FavoriteCategory::World, "Elsewhere");
        assert!(!mirror.update_group_metadata("worlds1", other).await);

        assert_eq!(gateway.calls().len(), calls_before);
        assert_eq!(*mirror.snapshot(), *before);
        assert_eq!(mirror.group_display_name("worlds1"), "Hangouts");
        assert!(mirror.group_metadata("worlds2").is_none());
    }

    #[tokio::test]
    async fn observers_see_every_commit() {
        let gateway = Arc::new(full_gateway().with_record_ids(&["fvrt_u2"]));
        let listener = Arc::new(RecordingListener::default());
        let mirror = FavoriteMirror::with_gateway(gateway, listener.clone());
        let mut rx = mirror.subscribe();

        assert!(mirror.refresh().await);
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_favorite(FavoriteCategory::Friend, "u1"));

        assert!(
            mirror
                .add_favorite(FavoriteCategory::Friend, "u2", "group_1", None)
                .await
        );
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_favorite(FavoriteCategory::Friend, "u2"));

        assert!(mirror.remove_favorite(FavoriteCategory::Friend, "u1").await);
        mirror.clear().await;
        assert!(rx.borrow_and_update().friends.is_empty());

        assert_eq!(
            *listener.events.lock().unwrap(),
            vec![
                "refreshed:4".to_string(),
                "added:friend:group_1:u2".to_string(),
                "removed:friend:group_0:u1".to_string(),
                "refreshed:0".to_string(),
            ]
        );
    }
}
