use crate::api::{CreateLink, LinkApi};
use crate::config::{HitExpiry, ServiceConfig};
use crate::error::{LinkError, Result};
use async_trait::async_trait;
use hop_core::{
    LinkRecord, LinkStats, LinkStore, NewLink, Owner, RedirectCache, ShortCode, StorageError,
};
use hop_generator::{Generator, SaltedDigestGenerator, UniqueCodeGenerator};
use jiff::Timestamp;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Orchestrates the link store, the redirect cache, and the code generator.
///
/// The store is the source of truth. The cache is advisory: its failures are
/// logged and treated as misses, never surfaced to the caller.
///
/// - **Resolve**: cache first, store on a miss, then populate the cache.
/// - **Create**: store only. New links are cached on their first redirect.
/// - **Update**: store first, then invalidate the cache.
/// - **Delete**: invalidate the cache, then delete from the store.
pub struct LinkService<S, C, G = SaltedDigestGenerator> {
    store: Arc<S>,
    cache: Arc<C>,
    generator: Arc<UniqueCodeGenerator<G>>,
    config: ServiceConfig,
}

impl<S, C, G> Clone for LinkService<S, C, G> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            cache: Arc::clone(&self.cache),
            generator: Arc::clone(&self.generator),
            config: self.config.clone(),
        }
    }
}

impl<S: LinkStore, C: RedirectCache> LinkService<S, C, SaltedDigestGenerator> {
    /// Creates a service generating salted digest codes as configured.
    pub fn new(store: S, cache: C, config: ServiceConfig) -> Self {
        let generator = UniqueCodeGenerator::from_config(&config.generator);
        Self::with_generator(store, cache, generator, config)
    }
}

impl<S: LinkStore, C: RedirectCache, G: Generator> LinkService<S, C, G> {
    /// Creates a service with a custom generator.
    ///
    /// The generator's own attempt bound takes precedence over
    /// `config.generator`.
    pub fn with_generator(
        store: S,
        cache: C,
        generator: UniqueCodeGenerator<G>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            store: Arc::new(store),
            cache: Arc::new(cache),
            generator: Arc::new(generator),
            config,
        }
    }

    pub async fn create_link(&self, request: CreateLink) -> Result<LinkRecord> {
        validate_url(&request.original_url)?;

        let record = match request.custom_alias {
            Some(alias) => {
                let code = ShortCode::custom(alias)
                    .map_err(|e| LinkError::InvalidAlias(e.to_string()))?;
                self.insert_alias(NewLink {
                    original_url: request.original_url,
                    code,
                    expires_at: request.expires_at,
                    owner: request.owner,
                })
                .await?
            }
            None => {
                self.insert_generated(request.original_url, request.expires_at, request.owner)
                    .await?
            }
        };

        info!(
            code = %record.short_code,
            id = %record.id,
            owner = record.owner.as_ref().map(Owner::as_str),
            "created link"
        );
        Ok(record)
    }

    pub async fn get_stats(&self, code_or_alias: &str) -> Result<LinkStats> {
        self.store
            .find_any(code_or_alias)
            .await?
            .filter(|record| record.answers_to(code_or_alias))
            .map(|record| record.stats())
            .ok_or_else(|| LinkError::NotFound(code_or_alias.to_owned()))
    }

    pub async fn search_by_url(&self, original_url: &str, owner: &Owner) -> Result<Vec<LinkRecord>> {
        Ok(self.store.search_by_url(original_url, owner).await?)
    }

    pub async fn update_link(
        &self,
        short_code: &str,
        original_url: &str,
        owner: &Owner,
    ) -> Result<LinkRecord> {
        validate_url(original_url)?;
        let record = self.authorize(short_code, owner).await?;

        let updated = self
            .store
            .update_url(record.id, original_url)
            .await?
            .ok_or_else(|| LinkError::NotFound(short_code.to_owned()))?;

        // Invalidate strictly after the store commit.
        self.invalidate(&updated).await;

        info!(code = %short_code, id = %updated.id, "updated link");
        Ok(updated)
    }

    pub async fn delete_link(&self, short_code: &str, owner: &Owner) -> Result<()> {
        let record = self.authorize(short_code, owner).await?;

        self.invalidate(&record).await;

        if !self.store.delete(record.id).await? {
            return Err(LinkError::NotFound(short_code.to_owned()));
        }

        info!(code = %short_code, id = %record.id, "deleted link");
        Ok(())
    }

    pub async fn resolve(&self, code_or_alias: &str) -> Result<String> {
        let now = Timestamp::now();

        match self.cache.get_url(code_or_alias).await {
            Ok(Some(url)) => return self.resolve_hit(code_or_alias, url, now).await,
            Ok(None) => trace!(code = %code_or_alias, "redirect cache miss"),
            Err(e) => {
                warn!(code = %code_or_alias, error = %e, "redirect cache lookup failed, using store")
            }
        }

        let record = self
            .store
            .find_active(code_or_alias, now)
            .await?
            .filter(|record| record.answers_to(code_or_alias))
            .ok_or_else(|| LinkError::NotFound(code_or_alias.to_owned()))?;

        if let Err(e) = self
            .cache
            .set_url(
                code_or_alias,
                &record.original_url,
                Some(self.config.cache_ttl),
            )
            .await
        {
            warn!(code = %code_or_alias, error = %e, "failed to populate redirect cache");
        }

        self.count_access(code_or_alias, &record, now).await?;
        Ok(record.original_url)
    }

    /// Confirms a cached destination against the store before serving it.
    async fn resolve_hit(&self, code_or_alias: &str, url: String, now: Timestamp) -> Result<String> {
        let found = self.store.find_any(code_or_alias).await?;
        let Some(record) = found.filter(|record| record.answers_to(code_or_alias)) else {
            debug!(code = %code_or_alias, "cached link no longer exists, evicting");
            self.evict(code_or_alias).await;
            return Err(LinkError::NotFound(code_or_alias.to_owned()));
        };

        if self.config.hit_expiry == HitExpiry::Strict && !record.is_active_at(now) {
            debug!(code = %code_or_alias, "cached link has expired, evicting");
            self.evict(code_or_alias).await;
            return Err(LinkError::NotFound(code_or_alias.to_owned()));
        }

        self.count_access(code_or_alias, &record, now).await?;
        Ok(url)
    }

    async fn count_access(&self, code_or_alias: &str, record: &LinkRecord, at: Timestamp) -> Result<()> {
        if self.store.record_access(record.id, at).await? {
            Ok(())
        } else {
            debug!(code = %code_or_alias, id = %record.id, "link deleted while resolving");
            Err(LinkError::NotFound(code_or_alias.to_owned()))
        }
    }

    async fn insert_alias(&self, link: NewLink) -> Result<LinkRecord> {
        let alias = link.code.as_str().to_owned();
        if self.store.code_exists(&alias).await? {
            return Err(LinkError::AliasConflict(alias));
        }

        // The existence check races with concurrent creates; the unique
        // index has the final word.
        self.store.insert(link).await.map_err(|e| match e {
            StorageError::Conflict(token) => LinkError::AliasConflict(token),
            other => LinkError::Storage(other),
        })
    }

    async fn insert_generated(
        &self,
        original_url: String,
        expires_at: Option<Timestamp>,
        owner: Option<Owner>,
    ) -> Result<LinkRecord> {
        // Existence checks and insert races draw from one budget.
        let mut attempts = self.generator.attempts();

        loop {
            let code = self
                .generator
                .generate_within(&*self.store, &original_url, &mut attempts)
                .await?;
            let link = NewLink {
                original_url: original_url.clone(),
                code,
                expires_at,
                owner: owner.clone(),
            };

            match self.store.insert(link).await {
                Ok(record) => return Ok(record),
                Err(StorageError::Conflict(code)) => {
                    debug!(
                        code = %code,
                        attempt = attempts.used(),
                        "generated code taken on insert, regenerating"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Finds the link by its exact short code and checks that `owner` owns it.
    async fn authorize(&self, short_code: &str, owner: &Owner) -> Result<LinkRecord> {
        let record = self
            .store
            .find_by_code(short_code)
            .await?
            .filter(|record| record.short_code == short_code)
            .ok_or_else(|| LinkError::NotFound(short_code.to_owned()))?;

        if !record.is_owned_by(owner) {
            warn!(code = %short_code, caller = %owner, "caller does not own link");
            return Err(LinkError::Forbidden(short_code.to_owned()));
        }
        Ok(record)
    }

    async fn invalidate(&self, record: &LinkRecord) {
        for key in record.cache_keys() {
            self.evict(key).await;
        }
    }

    async fn evict(&self, key: &str) {
        if let Err(e) = self.cache.del(key).await {
            warn!(code = %key, error = %e, "failed to evict redirect cache entry");
        }
    }
}

#[async_trait]
impl<S: LinkStore, C: RedirectCache, G: Generator> LinkApi for LinkService<S, C, G> {
    async fn create_link(&self, request: CreateLink) -> Result<LinkRecord> {
        LinkService::create_link(self, request).await
    }

    async fn get_stats(&self, code_or_alias: &str) -> Result<LinkStats> {
        LinkService::get_stats(self, code_or_alias).await
    }

    async fn search_by_url(&self, original_url: &str, owner: &Owner) -> Result<Vec<LinkRecord>> {
        LinkService::search_by_url(self, original_url, owner).await
    }

    async fn update_link(
        &self,
        short_code: &str,
        original_url: &str,
        owner: &Owner,
    ) -> Result<LinkRecord> {
        LinkService::update_link(self, short_code, original_url, owner).await
    }

    async fn delete_link(&self, short_code: &str, owner: &Owner) -> Result<()> {
        LinkService::delete_link(self, short_code, owner).await
    }

    async fn resolve(&self, code_or_alias: &str) -> Result<String> {
        LinkService::resolve(self, code_or_alias).await
    }
}

/// Validates that the URL is an absolute http or https URL with a host.
fn validate_url(url: &str) -> Result<()> {
    if url.is_empty() {
        return Err(LinkError::InvalidUrl("URL cannot be empty".to_string()));
    }

    let Some((scheme, rest)) = url.split_once("://") else {
        return Err(LinkError::InvalidUrl(format!(
            "URL must have a scheme and host: {url}"
        )));
    };

    let scheme = scheme.to_ascii_lowercase();
    if scheme != "http" && scheme != "https" {
        return Err(LinkError::InvalidUrl(format!(
            "URL scheme must be http or https: {scheme}"
        )));
    }

    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host = authority.rsplit('@').next().unwrap_or_default();
    if host.is_empty() || host.starts_with(':') || host.chars().any(char::is_whitespace) {
        return Err(LinkError::InvalidUrl(format!("URL must have a host: {url}")));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hop_cache::{MokaRedirectCache, NoopCache};
    use hop_core::{CacheError, LinkId, ReadLinkStore};
    use hop_generator::SeqGenerator;
    use hop_storage::InMemoryLinkStore;
    use jiff::SignedDuration;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    type TestService = LinkService<InMemoryLinkStore, MokaRedirectCache>;

    struct Harness {
        service: TestService,
        store: InMemoryLinkStore,
        cache: MokaRedirectCache,
    }

    fn harness_with(config: ServiceConfig) -> Harness {
        let store = InMemoryLinkStore::new();
        let cache = MokaRedirectCache::with_capacity(1_000);
        let service = LinkService::new(store.clone(), cache.clone(), config);
        Harness {
            service,
            store,
            cache,
        }
    }

    fn harness() -> Harness {
        harness_with(ServiceConfig::default())
    }

    fn alice() -> Owner {
        Owner::new("alice")
    }

    fn bob() -> Owner {
        Owner::new("bob")
    }

    /// A cache whose every operation fails.
    struct FailingCache;

    #[async_trait]
    impl RedirectCache for FailingCache {
        async fn get_url(&self, _key: &str) -> hop_core::cache::Result<Option<String>> {
            Err(CacheError::Unavailable("connection refused".to_string()))
        }

        async fn set_url(
            &self,
            _key: &str,
            _url: &str,
            _ttl: Option<Duration>,
        ) -> hop_core::cache::Result<()> {
            Err(CacheError::Unavailable("connection refused".to_string()))
        }

        async fn del(&self, _key: &str) -> hop_core::cache::Result<()> {
            Err(CacheError::Unavailable("connection refused".to_string()))
        }
    }

    /// A store that never reports a code as taken, so only the unique index
    /// on insert catches collisions.
    struct BlindStore(InMemoryLinkStore);

    #[async_trait]
    impl ReadLinkStore for BlindStore {
        async fn code_exists(&self, _code_or_alias: &str) -> hop_core::store::Result<bool> {
            Ok(false)
        }

        async fn find_active(
            &self,
            code_or_alias: &str,
            now: Timestamp,
        ) -> hop_core::store::Result<Option<LinkRecord>> {
            self.0.find_active(code_or_alias, now).await
        }

        async fn find_any(&self, code_or_alias: &str) -> hop_core::store::Result<Option<LinkRecord>> {
            self.0.find_any(code_or_alias).await
        }

        async fn find_by_code(&self, short_code: &str) -> hop_core::store::Result<Option<LinkRecord>> {
            self.0.find_by_code(short_code).await
        }

        async fn search_by_url(
            &self,
            original_url: &str,
            owner: &Owner,
        ) -> hop_core::store::Result<Vec<LinkRecord>> {
            self.0.search_by_url(original_url, owner).await
        }
    }

    #[async_trait]
    impl LinkStore for BlindStore {
        async fn insert(&self, link: NewLink) -> hop_core::store::Result<LinkRecord> {
            self.0.insert(link).await
        }

        async fn record_access(&self, id: LinkId, at: Timestamp) -> hop_core::store::Result<bool> {
            self.0.record_access(id, at).await
        }

        async fn update_url(
            &self,
            id: LinkId,
            original_url: &str,
        ) -> hop_core::store::Result<Option<LinkRecord>> {
            self.0.update_url(id, original_url).await
        }

        async fn delete(&self, id: LinkId) -> hop_core::store::Result<bool> {
            self.0.delete(id).await
        }
    }

    /// A store whose lookups ignore case, as a case-insensitive collation would.
    struct FoldingStore(InMemoryLinkStore);

    #[async_trait]
    impl ReadLinkStore for FoldingStore {
        async fn code_exists(&self, code_or_alias: &str) -> hop_core::store::Result<bool> {
            self.0.code_exists(&code_or_alias.to_lowercase()).await
        }

        async fn find_active(
            &self,
            code_or_alias: &str,
            now: Timestamp,
        ) -> hop_core::store::Result<Option<LinkRecord>> {
            self.0.find_active(&code_or_alias.to_lowercase(), now).await
        }

        async fn find_any(&self, code_or_alias: &str) -> hop_core::store::Result<Option<LinkRecord>> {
            self.0.find_any(&code_or_alias.to_lowercase()).await
        }

        async fn find_by_code(&self, short_code: &str) -> hop_core::store::Result<Option<LinkRecord>> {
            self.0.find_by_code(&short_code.to_lowercase()).await
        }

        async fn search_by_url(
            &self,
            original_url: &str,
            owner: &Owner,
        ) -> hop_core::store::Result<Vec<LinkRecord>> {
            self.0.search_by_url(original_url, owner).await
        }
    }

    #[async_trait]
    impl LinkStore for FoldingStore {
        async fn insert(&self, link: NewLink) -> hop_core::store::Result<LinkRecord> {
            self.0.insert(link).await
        }

        async fn record_access(&self, id: LinkId, at: Timestamp) -> hop_core::store::Result<bool> {
            self.0.record_access(id, at).await
        }

        async fn update_url(
            &self,
            id: LinkId,
            original_url: &str,
        ) -> hop_core::store::Result<Option<LinkRecord>> {
            self.0.update_url(id, original_url).await
        }

        async fn delete(&self, id: LinkId) -> hop_core::store::Result<bool> {
            self.0.delete(id).await
        }
    }

    /// A store where nine of every ten candidates are taken and every insert
    /// loses the race. Counts both kinds of call.
    #[derive(Clone, Default)]
    struct CrowdedStore {
        checks: Arc<AtomicUsize>,
        inserts: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ReadLinkStore for CrowdedStore {
        async fn code_exists(&self, _code_or_alias: &str) -> hop_core::store::Result<bool> {
            let n = self.checks.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(n % 10 != 0)
        }

        async fn find_active(
            &self,
            _code_or_alias: &str,
            _now: Timestamp,
        ) -> hop_core::store::Result<Option<LinkRecord>> {
            Ok(None)
        }

        async fn find_any(&self, _code_or_alias: &str) -> hop_core::store::Result<Option<LinkRecord>> {
            Ok(None)
        }

        async fn find_by_code(&self, _short_code: &str) -> hop_core::store::Result<Option<LinkRecord>> {
            Ok(None)
        }

        async fn search_by_url(
            &self,
            _original_url: &str,
            _owner: &Owner,
        ) -> hop_core::store::Result<Vec<LinkRecord>> {
            Ok(Vec::new())
        }
    }

    #[async_trait]
    impl LinkStore for CrowdedStore {
        async fn insert(&self, link: NewLink) -> hop_core::store::Result<LinkRecord> {
            self.inserts.fetch_add(1, Ordering::SeqCst);
            Err(StorageError::Conflict(link.code.as_str().to_owned()))
        }

        async fn record_access(&self, _id: LinkId, _at: Timestamp) -> hop_core::store::Result<bool> {
            Ok(false)
        }

        async fn update_url(
            &self,
            _id: LinkId,
            _original_url: &str,
        ) -> hop_core::store::Result<Option<LinkRecord>> {
            Ok(None)
        }

        async fn delete(&self, _id: LinkId) -> hop_core::store::Result<bool> {
            Ok(false)
        }
    }

    #[tokio::test]
    async fn example_scenario() {
        let h = harness();

        let record = h
            .service
            .create_link(CreateLink::new("https://example.com/page"))
            .await
            .unwrap();
        let code = record.short_code.clone();
        assert_eq!(code.len(), 7);
        assert!(code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert!(record.custom_alias.is_none());

        // Creation does not touch the cache.
        assert!(h.cache.get_url(&code).await.unwrap().is_none());

        let url = h.service.resolve(&code).await.unwrap();
        assert_eq!(url, "https://example.com/page");
        assert_eq!(
            h.cache.get_url(&code).await.unwrap().as_deref(),
            Some("https://example.com/page")
        );

        let url = h.service.resolve(&code).await.unwrap();
        assert_eq!(url, "https://example.com/page");

        let stats = h.service.get_stats(&code).await.unwrap();
        assert_eq!(stats.access_count, 2);
    }

    #[tokio::test]
    async fn concurrent_creates_yield_distinct_codes() {
        let h = harness();
        let service = Arc::new(h.service);

        let mut tasks = Vec::new();
        for i in 0..64 {
            let service = Arc::clone(&service);
            tasks.push(tokio::spawn(async move {
                service
                    .create_link(CreateLink::new(format!("https://example.com/{i}")))
                    .await
                    .unwrap()
                    .short_code
            }));
        }

        let mut codes = HashSet::new();
        for task in tasks {
            codes.insert(task.await.unwrap());
        }
        assert_eq!(codes.len(), 64);
        assert_eq!(h.store.len(), 64);
    }

    #[tokio::test]
    async fn repeated_resolution_returns_same_url() {
        let h = harness();
        let record = h
            .service
            .create_link(CreateLink::new("https://example.com"))
            .await
            .unwrap();

        for _ in 0..5 {
            assert_eq!(
                h.service.resolve(&record.short_code).await.unwrap(),
                "https://example.com"
            );
        }
    }

    #[tokio::test]
    async fn update_invalidates_cached_destination() {
        let h = harness();
        let record = h
            .service
            .create_link(CreateLink::new("https://a.example").with_owner(alice()))
            .await
            .unwrap();
        let code = record.short_code.clone();

        assert_eq!(h.service.resolve(&code).await.unwrap(), "https://a.example");

        let updated = h
            .service
            .update_link(&code, "https://b.example", &alice())
            .await
            .unwrap();
        assert_eq!(updated.original_url, "https://b.example");
        assert!(h.cache.get_url(&code).await.unwrap().is_none());

        assert_eq!(h.service.resolve(&code).await.unwrap(), "https://b.example");
    }

    #[tokio::test]
    async fn update_invalidates_alias_entry() {
        let h = harness();
        h.service
            .create_link(
                CreateLink::new("https://a.example")
                    .with_alias("promo")
                    .with_owner(alice()),
            )
            .await
            .unwrap();

        assert_eq!(h.service.resolve("promo").await.unwrap(), "https://a.example");
        h.service
            .update_link("promo", "https://b.example", &alice())
            .await
            .unwrap();

        assert_eq!(h.service.resolve("promo").await.unwrap(), "https://b.example");
    }

    #[tokio::test]
    async fn delete_invalidates_cached_destination() {
        let h = harness();
        let record = h
            .service
            .create_link(CreateLink::new("https://example.com").with_owner(alice()))
            .await
            .unwrap();
        let code = record.short_code.clone();

        h.service.resolve(&code).await.unwrap();
        h.service.delete_link(&code, &alice()).await.unwrap();

        assert!(h.cache.get_url(&code).await.unwrap().is_none());
        let err = h.service.resolve(&code).await.unwrap_err();
        assert!(matches!(err, LinkError::NotFound(_)));
    }

    #[tokio::test]
    async fn expired_link_is_not_resolved_on_cold_path() {
        let h = harness();
        let record = h
            .service
            .create_link(
                CreateLink::new("https://example.com")
                    .with_expiry(Timestamp::now() - SignedDuration::from_secs(60)),
            )
            .await
            .unwrap();

        let err = h.service.resolve(&record.short_code).await.unwrap_err();
        assert!(matches!(err, LinkError::NotFound(_)));
        assert!(h.cache.get_url(&record.short_code).await.unwrap().is_none());

        // Stats stay visible after expiry.
        let stats = h.service.get_stats(&record.short_code).await.unwrap();
        assert_eq!(stats.access_count, 0);
    }

    #[tokio::test]
    async fn future_expiry_still_resolves() {
        let h = harness();
        let record = h
            .service
            .create_link(
                CreateLink::new("https://example.com")
                    .with_expiry(Timestamp::now() + SignedDuration::from_secs(3600)),
            )
            .await
            .unwrap();

        assert_eq!(
            h.service.resolve(&record.short_code).await.unwrap(),
            "https://example.com"
        );
    }

    #[tokio::test]
    async fn relaxed_hit_serves_expired_link_from_cache() {
        let h = harness();
        let record = h
            .service
            .create_link(
                CreateLink::new("https://example.com")
                    .with_expiry(Timestamp::now() - SignedDuration::from_secs(60)),
            )
            .await
            .unwrap();
        h.cache
            .set_url(&record.short_code, "https://example.com", None)
            .await
            .unwrap();

        assert_eq!(
            h.service.resolve(&record.short_code).await.unwrap(),
            "https://example.com"
        );
        assert_eq!(
            h.service.get_stats(&record.short_code).await.unwrap().access_count,
            1
        );
    }

    #[tokio::test]
    async fn strict_hit_rejects_and_evicts_expired_link() {
        let h = harness_with(ServiceConfig::builder().hit_expiry(HitExpiry::Strict).build());
        let record = h
            .service
            .create_link(
                CreateLink::new("https://example.com")
                    .with_expiry(Timestamp::now() - SignedDuration::from_secs(60)),
            )
            .await
            .unwrap();
        h.cache
            .set_url(&record.short_code, "https://example.com", None)
            .await
            .unwrap();

        let err = h.service.resolve(&record.short_code).await.unwrap_err();
        assert!(matches!(err, LinkError::NotFound(_)));
        assert!(h.cache.get_url(&record.short_code).await.unwrap().is_none());
        assert_eq!(
            h.service.get_stats(&record.short_code).await.unwrap().access_count,
            0
        );
    }

    #[tokio::test]
    async fn stale_cache_entry_is_evicted_when_record_is_gone() {
        let h = harness();
        let record = h
            .service
            .create_link(CreateLink::new("https://example.com"))
            .await
            .unwrap();
        h.service.resolve(&record.short_code).await.unwrap();

        // Deleted behind the service's back.
        assert!(h.store.delete(record.id).await.unwrap());

        let err = h.service.resolve(&record.short_code).await.unwrap_err();
        assert!(matches!(err, LinkError::NotFound(_)));
        assert!(h.cache.get_url(&record.short_code).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_alias_conflicts() {
        let h = harness();
        h.service
            .create_link(CreateLink::new("https://one.example").with_alias("abc"))
            .await
            .unwrap();

        let err = h
            .service
            .create_link(CreateLink::new("https://two.example").with_alias("abc"))
            .await
            .unwrap_err();
        assert!(matches!(err, LinkError::AliasConflict(alias) if alias == "abc"));
    }

    #[tokio::test]
    async fn alias_equal_to_existing_code_conflicts() {
        let h = harness();
        let record = h
            .service
            .create_link(CreateLink::new("https://one.example"))
            .await
            .unwrap();

        let err = h
            .service
            .create_link(CreateLink::new("https://two.example").with_alias(record.short_code))
            .await
            .unwrap_err();
        assert!(matches!(err, LinkError::AliasConflict(_)));
    }

    #[tokio::test]
    async fn alias_becomes_the_short_code() {
        let h = harness();
        let record = h
            .service
            .create_link(CreateLink::new("https://example.com").with_alias("my-alias"))
            .await
            .unwrap();

        assert_eq!(record.short_code, "my-alias");
        assert_eq!(record.custom_alias.as_deref(), Some("my-alias"));
        assert_eq!(h.service.resolve("my-alias").await.unwrap(), "https://example.com");
    }

    #[tokio::test]
    async fn malformed_alias_is_rejected() {
        let h = harness();
        let too_long = "x".repeat(31);

        for alias in ["ab", "has space", "emoji🙂", too_long.as_str()] {
            let err = h
                .service
                .create_link(CreateLink::new("https://example.com").with_alias(alias))
                .await
                .unwrap_err();
            assert!(matches!(err, LinkError::InvalidAlias(_)), "alias {alias:?}");
        }
        assert!(h.store.is_empty());
    }

    #[tokio::test]
    async fn invalid_urls_are_rejected() {
        let h = harness();

        for url in [
            "",
            "not-a-url",
            "ftp://example.com",
            "https://",
            "https:///path",
            "http://:8080/x",
        ] {
            let err = h.service.create_link(CreateLink::new(url)).await.unwrap_err();
            assert!(matches!(err, LinkError::InvalidUrl(_)), "url {url:?}");
        }
    }

    #[test]
    fn valid_urls_pass_validation() {
        for url in [
            "https://example.com",
            "HTTP://example.com/path?q=1#frag",
            "https://user@example.com:8443/x",
            "http://127.0.0.1",
        ] {
            assert!(validate_url(url).is_ok(), "url {url:?}");
        }
    }

    #[tokio::test]
    async fn access_accounting_counts_every_resolution() {
        let h = harness();
        let record = h
            .service
            .create_link(CreateLink::new("https://example.com"))
            .await
            .unwrap();

        for _ in 0..4 {
            h.service.resolve(&record.short_code).await.unwrap();
        }
        let before_last = Timestamp::now();
        h.service.resolve(&record.short_code).await.unwrap();
        let after_last = Timestamp::now();

        let stats = h.service.get_stats(&record.short_code).await.unwrap();
        assert_eq!(stats.access_count, 5);
        let last = stats.last_accessed.unwrap();
        assert!(last >= before_last && last <= after_last);
    }

    #[tokio::test]
    async fn failed_resolution_does_not_count() {
        let h = harness();
        let err = h.service.resolve("missing").await.unwrap_err();
        assert!(matches!(err, LinkError::NotFound(_)));
        assert!(matches!(
            h.service.get_stats("missing").await.unwrap_err(),
            LinkError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn only_the_owner_may_update_or_delete() {
        let h = harness();
        let record = h
            .service
            .create_link(CreateLink::new("https://example.com").with_owner(alice()))
            .await
            .unwrap();
        let code = record.short_code.clone();

        let err = h
            .service
            .update_link(&code, "https://evil.example", &bob())
            .await
            .unwrap_err();
        assert!(matches!(err, LinkError::Forbidden(_)));

        let err = h.service.delete_link(&code, &bob()).await.unwrap_err();
        assert!(matches!(err, LinkError::Forbidden(_)));

        h.service
            .update_link(&code, "https://new.example", &alice())
            .await
            .unwrap();
        h.service.delete_link(&code, &alice()).await.unwrap();
        assert!(h.store.is_empty());
    }

    #[tokio::test]
    async fn anonymous_links_cannot_be_mutated() {
        let h = harness();
        let record = h
            .service
            .create_link(CreateLink::new("https://example.com"))
            .await
            .unwrap();

        let err = h
            .service
            .update_link(&record.short_code, "https://new.example", &alice())
            .await
            .unwrap_err();
        assert!(matches!(err, LinkError::Forbidden(_)));

        let err = h
            .service
            .delete_link(&record.short_code, &alice())
            .await
            .unwrap_err();
        assert!(matches!(err, LinkError::Forbidden(_)));
    }

    #[tokio::test]
    async fn mutating_unknown_code_is_not_found() {
        let h = harness();

        let err = h
            .service
            .update_link("missing", "https://example.com", &alice())
            .await
            .unwrap_err();
        assert!(matches!(err, LinkError::NotFound(_)));

        let err = h.service.delete_link("missing", &alice()).await.unwrap_err();
        assert!(matches!(err, LinkError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_rejects_invalid_url() {
        let h = harness();
        let record = h
            .service
            .create_link(CreateLink::new("https://example.com").with_owner(alice()))
            .await
            .unwrap();

        let err = h
            .service
            .update_link(&record.short_code, "javascript:alert(1)", &alice())
            .await
            .unwrap_err();
        assert!(matches!(err, LinkError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn search_is_owner_scoped() {
        let h = harness();
        for owner in [alice(), alice(), bob()] {
            h.service
                .create_link(CreateLink::new("https://example.com").with_owner(owner))
                .await
                .unwrap();
        }

        let found = h
            .service
            .search_by_url("https://example.com", &alice())
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|r| r.is_owned_by(&alice())));
        assert!(found[0].id > found[1].id);
    }

    #[tokio::test]
    async fn resolution_survives_cache_outage() {
        let store = InMemoryLinkStore::new();
        let service = LinkService::new(store, FailingCache, ServiceConfig::default());

        let record = service
            .create_link(CreateLink::new("https://example.com").with_owner(alice()))
            .await
            .unwrap();

        assert_eq!(
            service.resolve(&record.short_code).await.unwrap(),
            "https://example.com"
        );
        service
            .update_link(&record.short_code, "https://new.example", &alice())
            .await
            .unwrap();
        assert_eq!(
            service.resolve(&record.short_code).await.unwrap(),
            "https://new.example"
        );
        service.delete_link(&record.short_code, &alice()).await.unwrap();
    }

    #[tokio::test]
    async fn works_without_a_cache() {
        let service = LinkService::new(InMemoryLinkStore::new(), NoopCache, ServiceConfig::default());
        let record = service
            .create_link(CreateLink::new("https://example.com"))
            .await
            .unwrap();

        service.resolve(&record.short_code).await.unwrap();
        service.resolve(&record.short_code).await.unwrap();
        assert_eq!(
            service.get_stats(&record.short_code).await.unwrap().access_count,
            2
        );
    }

    #[tokio::test]
    async fn insert_conflict_triggers_regeneration() {
        let inner = InMemoryLinkStore::new();
        inner
            .insert(NewLink {
                original_url: "https://taken.example".to_string(),
                code: ShortCode::generated("hp000000"),
                expires_at: None,
                owner: None,
            })
            .await
            .unwrap();

        let service = LinkService::with_generator(
            BlindStore(inner),
            NoopCache,
            UniqueCodeGenerator::new(SeqGenerator::with_prefix("hp"), 5),
            ServiceConfig::default(),
        );

        let record = service
            .create_link(CreateLink::new("https://example.com"))
            .await
            .unwrap();
        assert_eq!(record.short_code, "hp000001");
    }

    #[tokio::test]
    async fn persistent_insert_conflicts_exhaust_attempts() {
        let inner = InMemoryLinkStore::new();
        for n in 0..3 {
            inner
                .insert(NewLink {
                    original_url: "https://taken.example".to_string(),
                    code: ShortCode::generated(format!("hp{n:06}")),
                    expires_at: None,
                    owner: None,
                })
                .await
                .unwrap();
        }

        let service = LinkService::with_generator(
            BlindStore(inner),
            NoopCache,
            UniqueCodeGenerator::new(SeqGenerator::with_prefix("hp"), 3),
            ServiceConfig::default(),
        );

        let err = service
            .create_link(CreateLink::new("https://example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, LinkError::ExhaustedRetries { attempts: 3 }));
    }

    #[tokio::test]
    async fn generator_exhaustion_surfaces() {
        let store = InMemoryLinkStore::new();
        store
            .insert(NewLink {
                original_url: "https://taken.example".to_string(),
                code: ShortCode::generated("hp000000"),
                expires_at: None,
                owner: None,
            })
            .await
            .unwrap();

        let service = LinkService::with_generator(
            store,
            NoopCache,
            UniqueCodeGenerator::new(SeqGenerator::with_prefix("hp"), 1),
            ServiceConfig::default(),
        );

        let err = service
            .create_link(CreateLink::new("https://example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, LinkError::ExhaustedRetries { attempts: 1 }));
    }

    #[tokio::test]
    async fn cache_entries_use_configured_ttl() {
        let h = harness_with(
            ServiceConfig::builder()
                .cache_ttl(Duration::from_millis(50))
                .build(),
        );
        let record = h
            .service
            .create_link(CreateLink::new("https://example.com"))
            .await
            .unwrap();

        h.service.resolve(&record.short_code).await.unwrap();
        assert!(h.cache.get_url(&record.short_code).await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(h.cache.get_url(&record.short_code).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn codes_and_aliases_resolve_case_sensitively() {
        let cache = MokaRedirectCache::with_capacity(100);
        let service = LinkService::new(
            FoldingStore(InMemoryLinkStore::new()),
            cache.clone(),
            ServiceConfig::default(),
        );
        service
            .create_link(
                CreateLink::new("https://example.com")
                    .with_alias("promo")
                    .with_owner(alice()),
            )
            .await
            .unwrap();

        let err = service.resolve("PROMO").await.unwrap_err();
        assert!(matches!(err, LinkError::NotFound(_)));
        assert!(cache.get_url("PROMO").await.unwrap().is_none());
        assert!(matches!(
            service.get_stats("PROMO").await.unwrap_err(),
            LinkError::NotFound(_)
        ));
        assert!(matches!(
            service.delete_link("PROMO", &alice()).await.unwrap_err(),
            LinkError::NotFound(_)
        ));

        assert_eq!(service.resolve("promo").await.unwrap(), "https://example.com");
        assert_eq!(service.get_stats("promo").await.unwrap().access_count, 1);
    }

    #[tokio::test]
    async fn attempt_budget_is_shared_across_insert_conflicts() {
        let store = CrowdedStore::default();
        let service = LinkService::new(store.clone(), NoopCache, ServiceConfig::default());

        let err = service
            .create_link(CreateLink::new("https://example.com"))
            .await
            .unwrap_err();

        assert!(matches!(err, LinkError::ExhaustedRetries { attempts: 10 }));
        assert_eq!(store.checks.load(Ordering::SeqCst), 10);
        assert_eq!(store.inserts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn reserved_alias_is_rejected() {
        let h = harness();
        for alias in ["health", "links"] {
            let err = h
                .service
                .create_link(CreateLink::new("https://example.com").with_alias(alias))
                .await
                .unwrap_err();
            assert!(matches!(err, LinkError::InvalidAlias(_)), "alias {alias:?}");
        }
        assert!(h.store.is_empty());
    }
}
