//! Integration tests for the read/favorite flag store.
//!
//! The same scenarios run against the SQLite store (in-memory and on disk) and
//! the in-memory store, so both honour one contract.

use headlines::storage::{Database, FlagSet, FlagStore, MemoryFlagStore, SESSION_CATEGORY_KEY};
use pretty_assertions::assert_eq;

async fn test_db() -> Database {
    Database::open(":memory:").await.unwrap()
}

async fn toggle_twice_leaves_absent(store: &impl FlagStore) {
    let url = "https://x/1";
    assert!(store.toggle(FlagSet::Favorite, url).await.unwrap());
    assert!(store.contains(FlagSet::Favorite, url).await.unwrap());
    assert!(!store.toggle(FlagSet::Favorite, url).await.unwrap());
    assert!(!store.contains(FlagSet::Favorite, url).await.unwrap());
    assert!(store.members(FlagSet::Favorite).await.unwrap().is_empty());
}

async fn read_and_favorite_are_separate(store: &impl FlagStore) {
    store.add(FlagSet::Read, "https://x/a").await.unwrap();
    store.add(FlagSet::Favorite, "https://x/b").await.unwrap();

    assert_eq!(
        store.members(FlagSet::Read).await.unwrap(),
        vec!["https://x/a".to_string()]
    );
    assert_eq!(
        store.members(FlagSet::Favorite).await.unwrap(),
        vec!["https://x/b".to_string()]
    );

    store.remove(FlagSet::Read, "https://x/b").await.unwrap();
    assert!(store.contains(FlagSet::Favorite, "https://x/b").await.unwrap());
}

async fn keys_are_opaque(store: &impl FlagStore) {
    // Anything the API hands back is a valid key, even if it isn't a URL
    for key in ["", "not a url", "https://x/ünïcødé?q=1&r='2'"] {
        store.add(FlagSet::Read, key).await.unwrap();
        assert!(store.contains(FlagSet::Read, key).await.unwrap(), "{key:?}");
    }
    assert_eq!(store.members(FlagSet::Read).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_database_toggle_twice() {
    toggle_twice_leaves_absent(&test_db().await).await;
}

#[tokio::test]
async fn test_memory_toggle_twice() {
    toggle_twice_leaves_absent(&MemoryFlagStore::new()).await;
}

#[tokio::test]
async fn test_database_sets_are_separate() {
    read_and_favorite_are_separate(&test_db().await).await;
}

#[tokio::test]
async fn test_memory_sets_are_separate() {
    read_and_favorite_are_separate(&MemoryFlagStore::new()).await;
}

#[tokio::test]
async fn test_database_keys_are_opaque() {
    keys_are_opaque(&test_db().await).await;
}

#[tokio::test]
async fn test_memory_keys_are_opaque() {
    keys_are_opaque(&MemoryFlagStore::new()).await;
}

#[tokio::test]
async fn test_flags_survive_reopen() {
    let dir = std::env::temp_dir().join(format!("headlines-flags-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("flags.db");
    let path = path.to_str().unwrap();

    {
        let db = Database::open(path).await.unwrap();
        db.add(FlagSet::Read, "https://x/read").await.unwrap();
        db.toggle(FlagSet::Favorite, "https://x/fav").await.unwrap();
        db.set_preference(SESSION_CATEGORY_KEY, "science").await.unwrap();
        db.close().await;
    }

    let db = Database::open(path).await.unwrap();
    assert!(db.contains(FlagSet::Read, "https://x/read").await.unwrap());
    assert!(db.contains(FlagSet::Favorite, "https://x/fav").await.unwrap());
    assert_eq!(
        db.get_preference(SESSION_CATEGORY_KEY).await.unwrap().as_deref(),
        Some("science")
    );
    db.close().await;

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_reset_forgets_everything() {
    let db = test_db().await;
    db.add(FlagSet::Read, "https://x/1").await.unwrap();
    db.add(FlagSet::Favorite, "https://x/1").await.unwrap();
    db.set_preference(SESSION_CATEGORY_KEY, "sports").await.unwrap();

    db.reset().await.unwrap();

    for set in FlagSet::ALL {
        assert!(db.members(set).await.unwrap().is_empty());
    }
    assert_eq!(db.get_preference(SESSION_CATEGORY_KEY).await.unwrap(), None);
}
