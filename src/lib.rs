pub mod vrc;

// 重新导出常用类型，方便外部使用
pub use vrc::{
    client::ClientConfig,
    favorite::{
        FavoriteCategory, FavoriteEntry, FavoriteGateway, FavoriteGroup, FavoriteListener,
        FavoriteMirror, FavoriteMirrorConfig, FavoriteSnapshot,
    },
};
