//! Tag-link synchronization against the in-memory store.
//!
//! Covers link replacement, delete ordering, validation before store calls,
//! and the state left behind when a multi-step operation fails part way.

use std::sync::Arc;

use kbase_core::{
    Error, InMemoryRepository, ItemId, ItemRepository, NewTag, StoreOp, TagId,
    TagLinkRepository, TagLinkSynchronizer, TagRepository,
};

/// Repository with two level-1 and two level-2 tags.
async fn setup() -> (
    Arc<InMemoryRepository>,
    TagLinkSynchronizer<InMemoryRepository>,
    Vec<TagId>,
) {
    let repo = Arc::new(InMemoryRepository::new());
    let mut tag_ids = Vec::new();
    for (label, level) in [("Tech", 1), ("Life", 1), ("Routers", 2), ("Cooking", 2)] {
        let tag = TagRepository::insert(&*repo, NewTag::new(label, level).unwrap())
            .await
            .expect("Failed to seed tag");
        tag_ids.push(tag.id);
    }
    repo.clear_calls();
    let sync = TagLinkSynchronizer::new(repo.clone());
    (repo, sync, tag_ids)
}

#[tokio::test]
async fn test_create_links_distinct_tags() {
    let (repo, sync, tags) = setup().await;

    let item = sync
        .create_item_with_tags(" Networking Basics ", " body ", &[tags[0], tags[2], tags[0]])
        .await
        .expect("Failed to create item");

    assert_eq!(item.title, "Networking Basics");
    assert_eq!(item.text, "body");
    assert_eq!(repo.links_for(item.id), vec![tags[0], tags[2]]);
    assert_eq!(repo.calls(), vec![StoreOp::InsertItem, StoreOp::InsertLinks]);
}

#[tokio::test]
async fn test_create_without_tags_skips_link_insert() {
    let (repo, sync, _) = setup().await;

    let item = sync.create_item_with_tags("title", "text", &[]).await.unwrap();

    assert!(repo.links_for(item.id).is_empty());
    assert_eq!(repo.calls(), vec![StoreOp::InsertItem]);
}

#[tokio::test]
async fn test_create_with_empty_title_makes_no_store_call() {
    let (repo, sync, _) = setup().await;

    let err = sync.create_item_with_tags("", "body", &[]).await.unwrap_err();

    assert!(err.is_validation());
    assert!(repo.calls().is_empty());
}

#[tokio::test]
async fn test_create_with_whitespace_text_makes_no_store_call() {
    let (repo, sync, tags) = setup().await;

    let err = sync
        .create_item_with_tags("title", " \n\t ", &[tags[0]])
        .await
        .unwrap_err();

    assert!(err.is_validation());
    assert!(repo.calls().is_empty());
    assert!(ItemRepository::list(&*repo).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_link_failure_leaves_item_without_tags() {
    let (repo, sync, tags) = setup().await;
    repo.fail_next(StoreOp::InsertLinks);

    let err = sync
        .create_item_with_tags("title", "text", &[tags[0]])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Store(_)));

    let items = ItemRepository::list(&*repo).await.unwrap();
    assert_eq!(items.len(), 1);
    assert!(repo.links_for(items[0].id).is_empty());

    // Retrying the link step completes the item.
    sync.replace_item_tags(items[0].id, &[tags[0]]).await.unwrap();
    assert_eq!(repo.links_for(items[0].id), vec![tags[0]]);
}

#[tokio::test]
async fn test_replace_with_empty_removes_all_links() {
    let (repo, sync, tags) = setup().await;
    let item = sync
        .create_item_with_tags("title", "text", &tags)
        .await
        .unwrap();
    assert_eq!(repo.links_for(item.id).len(), 4);

    sync.replace_item_tags(item.id, &[]).await.unwrap();

    assert!(repo.links_for(item.id).is_empty());
}

#[tokio::test]
async fn test_replace_is_idempotent() {
    let (repo, sync, tags) = setup().await;
    let item = sync
        .create_item_with_tags("title", "text", &[tags[1]])
        .await
        .unwrap();

    sync.replace_item_tags(item.id, &[tags[0], tags[2]]).await.unwrap();
    sync.replace_item_tags(item.id, &[tags[0], tags[2]]).await.unwrap();

    assert_eq!(repo.links_for(item.id), vec![tags[0], tags[2]]);
}

#[tokio::test]
async fn test_replace_deletes_before_insert() {
    let (repo, sync, tags) = setup().await;
    let item = sync.create_item_with_tags("title", "text", &[]).await.unwrap();
    repo.clear_calls();

    sync.replace_item_tags(item.id, &[tags[0]]).await.unwrap();

    assert_eq!(repo.calls(), vec![StoreOp::DeleteLinks, StoreOp::InsertLinks]);
}

#[tokio::test]
async fn test_replace_insert_failure_leaves_zero_links() {
    let (repo, sync, tags) = setup().await;
    let item = sync
        .create_item_with_tags("title", "text", &[tags[0], tags[2]])
        .await
        .unwrap();
    repo.fail_next(StoreOp::InsertLinks);

    assert!(sync.replace_item_tags(item.id, &[tags[1]]).await.is_err());

    assert!(repo.links_for(item.id).is_empty());
}

#[tokio::test]
async fn test_update_writes_scalars_then_links() {
    let (repo, sync, tags) = setup().await;
    let item = sync
        .create_item_with_tags("old", "old text", &[tags[0]])
        .await
        .unwrap();
    repo.clear_calls();

    let updated = sync
        .update_item(item.id, "new", "new text", &[tags[1], tags[3]])
        .await
        .unwrap();

    assert_eq!(updated.title, "new");
    assert_eq!(repo.links_for(item.id), vec![tags[1], tags[3]]);
    assert_eq!(
        repo.calls(),
        vec![StoreOp::UpdateItem, StoreOp::DeleteLinks, StoreOp::InsertLinks]
    );
}

#[tokio::test]
async fn test_update_link_failure_keeps_new_scalars() {
    let (repo, sync, tags) = setup().await;
    let item = sync
        .create_item_with_tags("old", "old text", &[tags[0]])
        .await
        .unwrap();
    repo.fail_next(StoreOp::DeleteLinks);

    assert!(sync
        .update_item(item.id, "new", "new text", &[tags[1]])
        .await
        .is_err());

    let stored = ItemRepository::fetch(&*repo, item.id).await.unwrap();
    assert_eq!(stored.title, "new");
    assert_eq!(repo.links_for(item.id), vec![tags[0]], "links are stale");
}

#[tokio::test]
async fn test_update_validation_precedes_store() {
    let (repo, sync, _) = setup().await;
    let item = sync.create_item_with_tags("t", "x", &[]).await.unwrap();
    repo.clear_calls();

    let err = sync.update_item(item.id, "t", "", &[]).await.unwrap_err();

    assert!(err.is_validation());
    assert!(repo.calls().is_empty());
}

#[tokio::test]
async fn test_update_missing_item() {
    let (_, sync, _) = setup().await;
    let err = sync.update_item(ItemId(404), "t", "x", &[]).await.unwrap_err();
    assert!(matches!(err, Error::ItemNotFound(ItemId(404))));
}

#[tokio::test]
async fn test_delete_removes_links_then_item() {
    let (repo, sync, tags) = setup().await;
    let item = sync
        .create_item_with_tags("title", "text", &[tags[0], tags[2]])
        .await
        .unwrap();
    repo.clear_calls();

    sync.delete_item(item.id).await.unwrap();

    assert_eq!(repo.calls(), vec![StoreOp::DeleteLinks, StoreOp::DeleteItem]);
    assert_eq!(repo.link_count(), 0);
    assert!(ItemRepository::fetch(&*repo, item.id)
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
async fn test_second_delete_fails_on_item_step_only() {
    let (repo, sync, tags) = setup().await;
    let item = sync
        .create_item_with_tags("title", "text", &[tags[0]])
        .await
        .unwrap();
    sync.delete_item(item.id).await.unwrap();
    repo.clear_calls();

    let err = sync.delete_item(item.id).await.unwrap_err();

    assert!(matches!(err, Error::ItemNotFound(id) if id == item.id));
    assert_eq!(repo.calls(), vec![StoreOp::DeleteLinks, StoreOp::DeleteItem]);
}

#[tokio::test]
async fn test_delete_item_failure_is_retryable() {
    let (repo, sync, tags) = setup().await;
    let item = sync
        .create_item_with_tags("title", "text", &[tags[0]])
        .await
        .unwrap();
    repo.fail_next(StoreOp::DeleteItem);

    assert!(sync.delete_item(item.id).await.is_err());
    assert!(ItemRepository::fetch(&*repo, item.id).await.is_ok());
    assert!(repo.links_for(item.id).is_empty());

    sync.delete_item(item.id).await.unwrap();
    assert!(ItemRepository::list(&*repo).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_leaves_other_items_alone() {
    let (repo, sync, tags) = setup().await;
    let keep = sync
        .create_item_with_tags("keep", "text", &[tags[0]])
        .await
        .unwrap();
    let gone = sync
        .create_item_with_tags("gone", "text", &[tags[0]])
        .await
        .unwrap();

    sync.delete_item(gone.id).await.unwrap();

    assert_eq!(repo.links_for(keep.id), vec![tags[0]]);
}

#[tokio::test]
async fn test_item_detail_caps_tags() {
    let (repo, sync, _) = setup().await;
    let mut many = Vec::new();
    for i in 0..7 {
        let tag = TagRepository::insert(&*repo, NewTag::new(&format!("extra{}", i), 2).unwrap())
            .await
            .unwrap();
        many.push(tag.id);
    }
    let item = sync
        .create_item_with_tags("title", "text", &many)
        .await
        .unwrap();

    let detail = sync.item_detail(item.id).await.unwrap();

    assert_eq!(detail.tags.len(), 5);
    assert_eq!(detail.tag_ids(), many[..5].to_vec());
    assert_eq!(
        repo.get_for_item(item.id, 100).await.unwrap().len(),
        7,
        "all links are stored"
    );
}
