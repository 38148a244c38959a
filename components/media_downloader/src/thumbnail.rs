// components/media_downloader/src/thumbnail.rs
//! Preview image lookup for video URLs.
//!
//! The preview URL is derived from the video identifier alone, no network
//! access happens here. Fetching the image, and falling back to
//! [`fallback_thumbnail_url`] when the full-size one is missing, is up to the
//! caller.

use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use url::Url;

const WATCH_HOSTS: &[&str] = &["www.youtube.com", "youtube.com"];
const SHORT_LINK_HOST: &str = "youtu.be";
const IMAGE_BASE: &str = "https://img.youtube.com/vi";

/// Pull the video identifier out of a watch, shorts or short-link URL
pub fn extract_video_id(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;

    let id = if WATCH_HOSTS.contains(&host) {
        if parsed.path() == "/watch" {
            parsed
                .query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned())?
        } else if let Some(rest) = parsed.path().strip_prefix("/shorts/") {
            rest.rsplit('/').next().unwrap_or_default().to_string()
        } else {
            return None;
        }
    } else if host == SHORT_LINK_HOST {
        parsed
            .path()
            .trim_start_matches('/')
            .split('/')
            .next()
            .unwrap_or_default()
            .to_string()
    } else {
        return None;
    };

    (!id.is_empty()).then_some(id)
}

/// Full resolution preview for a video identifier
pub fn max_res_thumbnail_url(video_id: &str) -> String {
    format!("{IMAGE_BASE}/{video_id}/maxresdefault.jpg")
}

/// Low resolution preview, which exists for every video
pub fn fallback_thumbnail_url(video_id: &str) -> String {
    format!("{IMAGE_BASE}/{video_id}/default.jpg")
}

/// Default derivation: URL → full resolution preview URL
pub fn derive_thumbnail_url(url: &str) -> Option<String> {
    extract_video_id(url).map(|id| max_res_thumbnail_url(&id))
}

/// Decides which cache entries to drop as new ones arrive
pub trait EvictionPolicy: Send {
    /// Record a newly inserted key, returning a key to evict if any
    fn on_insert(&mut self, key: &str) -> Option<String>;
}

/// Keep every entry for the life of the cache
#[derive(Debug, Default)]
pub struct Unbounded;

impl EvictionPolicy for Unbounded {
    fn on_insert(&mut self, _key: &str) -> Option<String> {
        None
    }
}

/// Drop the oldest entry once `capacity` is exceeded
#[derive(Debug)]
pub struct Fifo {
    capacity: usize,
    order: VecDeque<String>,
}

impl Fifo {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            order: VecDeque::new(),
        }
    }
}

impl EvictionPolicy for Fifo {
    fn on_insert(&mut self, key: &str) -> Option<String> {
        self.order.push_back(key.to_string());
        if self.order.len() > self.capacity {
            self.order.pop_front()
        } else {
            None
        }
    }
}

type Deriver = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

struct Cache {
    entries: HashMap<String, Option<String>>,
    policy: Box<dyn EvictionPolicy>,
}

/// Memoizing thumbnail lookup.
///
/// Failed lookups are cached too, as `None`; a missing key means "not computed
/// yet".
pub struct ThumbnailResolver {
    cache: Mutex<Cache>,
    derive: Deriver,
}

impl Default for ThumbnailResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ThumbnailResolver {
    pub fn new() -> Self {
        Self::with_policy(Unbounded)
    }

    pub fn with_policy(policy: impl EvictionPolicy + 'static) -> Self {
        Self::with_deriver(policy, derive_thumbnail_url)
    }

    /// Use a custom derivation step, e.g. to count how often it runs
    pub fn with_deriver(
        policy: impl EvictionPolicy + 'static,
        derive: impl Fn(&str) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            cache: Mutex::new(Cache {
                entries: HashMap::new(),
                policy: Box::new(policy),
            }),
            derive: Box::new(derive),
        }
    }

    pub fn resolve(&self, url: &str) -> Option<String> {
        if let Some(cached) = self.cache.lock().entries.get(url) {
            return cached.clone();
        }

        // derived outside the lock; the entry is published in one step
        let resolved = (self.derive)(url);

        let mut cache = self.cache.lock();
        if !cache.entries.contains_key(url) {
            cache.entries.insert(url.to_string(), resolved.clone());
            if let Some(evicted) = cache.policy.on_insert(url) {
                cache.entries.remove(&evicted);
                tracing::trace!("Evicted thumbnail entry for {}", evicted);
            }
        }
        resolved
    }

    /// Low resolution preview for `url`, for when the resolved one is not found
    pub fn fallback_for(&self, url: &str) -> Option<String> {
        extract_video_id(url).map(|id| fallback_thumbnail_url(&id))
    }

    pub fn len(&self) -> usize {
        self.cache.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[rstest]
    #[case("https://www.youtube.com/watch?v=ABC123", Some("ABC123"))]
    #[case("https://youtube.com/watch?feature=share&v=ABC123&t=10", Some("ABC123"))]
    #[case("https://youtu.be/XYZ789", Some("XYZ789"))]
    #[case("https://youtu.be/XYZ789?si=tracking", Some("XYZ789"))]
    #[case("https://www.youtube.com/shorts/QWE456", Some("QWE456"))]
    #[case("https://example.com/video", None)]
    #[case("https://www.youtube.com/channel/UC123", None)]
    #[case("https://www.youtube.com/watch", None)]
    #[case("https://www.youtube.com/shorts/", None)]
    #[case("https://youtu.be/", None)]
    #[case("not a url", None)]
    #[case("", None)]
    fn test_extract_video_id(#[case] url: &str, #[case] expected: Option<&str>) {
        assert_eq!(extract_video_id(url).as_deref(), expected);
    }

    #[test]
    fn test_resolve_builds_max_res_url() {
        let resolver = ThumbnailResolver::new();
        assert_eq!(
            resolver.resolve("https://www.youtube.com/watch?v=ABC123").as_deref(),
            Some("https://img.youtube.com/vi/ABC123/maxresdefault.jpg")
        );
        assert_eq!(resolver.resolve("https://example.com/video"), None);
    }

    #[test]
    fn test_fallback_uses_same_identifier() {
        let resolver = ThumbnailResolver::new();
        assert_eq!(
            resolver.fallback_for("https://youtu.be/XYZ789").as_deref(),
            Some("https://img.youtube.com/vi/XYZ789/default.jpg")
        );
    }

    fn counting_resolver(policy: impl EvictionPolicy + 'static) -> (ThumbnailResolver, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let probe = calls.clone();
        let resolver = ThumbnailResolver::with_deriver(policy, move |url| {
            probe.fetch_add(1, Ordering::SeqCst);
            derive_thumbnail_url(url)
        });
        (resolver, calls)
    }

    #[test]
    fn test_cache_derives_once() {
        let (resolver, calls) = counting_resolver(Unbounded);
        let url = "https://www.youtube.com/shorts/QWE456";

        let first = resolver.resolve(url);
        let second = resolver.resolve(url);
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cache_remembers_absent() {
        let (resolver, calls) = counting_resolver(Unbounded);
        assert_eq!(resolver.resolve("https://example.com/video"), None);
        assert_eq!(resolver.resolve("https://example.com/video"), None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(resolver.len(), 1);
    }

    #[test]
    fn test_fifo_evicts_oldest() {
        let (resolver, calls) = counting_resolver(Fifo::new(2));
        resolver.resolve("https://youtu.be/a");
        resolver.resolve("https://youtu.be/b");
        resolver.resolve("https://youtu.be/c");
        assert_eq!(resolver.len(), 2);

        // "a" was evicted and has to be derived again
        resolver.resolve("https://youtu.be/a");
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        resolver.resolve("https://youtu.be/c");
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }
}
