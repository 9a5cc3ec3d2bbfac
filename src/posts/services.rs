use anyhow::Context;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::warn;
use uuid::Uuid;

use super::dto::ImageUpload;
use crate::pagination::{Page, PageQuery, PageWindow, PAGE_SIZE};
use crate::repo::{models::PostView, BlogStore, PostScope};
use crate::storage::{ext_from_mime, StorageClient};

/// Characters kept as-is when a username becomes a path segment.
const SEGMENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'+')
    .remove(b'@');

/// Profile URL safe to put in a `Location` header, whatever the username holds.
pub fn profile_url(username: &str) -> String {
    format!("/profile/{}/", utf8_percent_encode(username, SEGMENT_ENCODE_SET))
}

/// Counts the scope, clamps the requested page, and fetches just that window.
pub async fn load_page(
    store: &dyn BlogStore,
    scope: PostScope,
    query: &PageQuery,
) -> anyhow::Result<Page<PostView>> {
    let count = store.count_posts(scope).await?;
    let window = PageWindow::new(count, query.requested(), PAGE_SIZE);
    let items = store
        .list_posts(scope, window.limit(), window.offset())
        .await?;
    Ok(Page { items, window })
}

/// Writes the upload under `posts/` and returns its media key.
pub async fn save_image(storage: &dyn StorageClient, upload: ImageUpload) -> anyhow::Result<String> {
    let ext = ext_from_mime(&upload.content_type)
        .with_context(|| format!("unsupported image type {}", upload.content_type))?;
    let key = format!("posts/{}.{}", Uuid::new_v4(), ext);
    storage
        .put_object(&key, upload.body, &upload.content_type)
        .await
        .with_context(|| format!("put_object {}", key))?;
    Ok(key)
}

/// Removes a file that no post references any more. Failures are only logged.
pub async fn discard_image(storage: &dyn StorageClient, key: &str) {
    if let Err(e) = storage.delete_object(key).await {
        warn!(error = %e, %key, "could not remove image");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_url_escapes_non_ascii() {
        assert_eq!(profile_url("leo"), "/profile/leo/");
        assert_eq!(profile_url("a.b@c+d-e"), "/profile/a.b@c+d-e/");
        assert_eq!(profile_url("лев"), "/profile/%D0%BB%D0%B5%D0%B2/");
    }
}
