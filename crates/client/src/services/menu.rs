//! Menu, categories and announcement reads.
//!
//! [`MenuService::get_menu_items`] always goes to the network and refreshes
//! the cached listing; the other reads serve from the cache while fresh.

use eathub_core::{Announcement, Category, MenuItem, MenuItemId, MenuQuery};
use tracing::instrument;

use super::{ServiceContext, keys, require_id, segment, ttl};
use crate::Result;
use crate::retry::retry_request;

/// Raw menu calls.
pub mod base {
    use eathub_core::{Announcement, Category, MenuItem, MenuQuery};

    use crate::http::{ApiClient, ApiError};

    /// `GET /menu`
    pub async fn fetch_menu(api: &ApiClient, query: &MenuQuery) -> Result<Vec<MenuItem>, ApiError> {
        api.get("menu", &query.to_params()).await
    }

    /// `GET /menu/:id`
    pub async fn fetch_menu_item(api: &ApiClient, id: &str) -> Result<MenuItem, ApiError> {
        api.get(&format!("menu/{id}"), &[]).await
    }

    /// `GET /menu/featured`
    pub async fn fetch_featured(api: &ApiClient) -> Result<Vec<MenuItem>, ApiError> {
        api.get("menu/featured", &[]).await
    }

    /// `GET /categories`
    pub async fn fetch_categories(api: &ApiClient) -> Result<Vec<Category>, ApiError> {
        api.get("categories", &[]).await
    }

    /// `GET /menu/announcement`. No announcement reads as an inactive one.
    pub async fn fetch_announcement(api: &ApiClient) -> Result<Announcement, ApiError> {
        let announcement: Option<Announcement> = api.get("menu/announcement", &[]).await?;
        Ok(announcement.unwrap_or_default())
    }
}

/// Menu reads.
#[derive(Debug, Clone)]
pub struct MenuService {
    ctx: ServiceContext,
}

impl MenuService {
    #[must_use]
    pub const fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Current menu, always fetched; the cached listing is overwritten.
    ///
    /// # Errors
    ///
    /// Returns an error once retries are exhausted.
    #[instrument(skip(self), fields(query = %query.cache_suffix()))]
    pub async fn get_menu_items(&self, query: &MenuQuery) -> Result<Vec<MenuItem>> {
        let policy = self.ctx.read_policy();
        let api = &self.ctx.api;
        let items = self
            .ctx
            .cache
            .refresh(&keys::menu_list(&query.cache_suffix()), Some(ttl::MENU), || {
                retry_request(&policy, || base::fetch_menu(api, query))
            })
            .await?;
        Ok(items)
    }

    /// Menu, served from the cache while fresh.
    ///
    /// # Errors
    ///
    /// Returns an error on a cache miss once retries are exhausted.
    #[instrument(skip(self), fields(query = %query.cache_suffix()))]
    pub async fn get_menu_items_cached(&self, query: &MenuQuery) -> Result<Vec<MenuItem>> {
        let policy = self.ctx.read_policy();
        let api = &self.ctx.api;
        let items = self
            .ctx
            .cache
            .with_cache(&keys::menu_list(&query.cache_suffix()), Some(ttl::MENU), || {
                retry_request(&policy, || base::fetch_menu(api, query))
            })
            .await?;
        Ok(items)
    }

    /// One menu item.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidArgument`] for a blank id, or an API
    /// error (404 for unknown items).
    #[instrument(skip(self), fields(id = %id))]
    pub async fn get_menu_item(&self, id: &MenuItemId) -> Result<MenuItem> {
        require_id("Menu item id", id.as_str())?;
        let policy = self.ctx.read_policy();
        let api = &self.ctx.api;
        let id = segment(id.as_str());
        let item = self
            .ctx
            .cache
            .with_cache(&keys::menu_item(&id), Some(ttl::MENU), || {
                retry_request(&policy, || base::fetch_menu_item(api, &id))
            })
            .await?;
        Ok(item)
    }

    /// # Errors
    ///
    /// Returns an error on a cache miss once retries are exhausted.
    #[instrument(skip(self))]
    pub async fn get_featured_items(&self) -> Result<Vec<MenuItem>> {
        let policy = self.ctx.read_policy();
        let api = &self.ctx.api;
        let items = self
            .ctx
            .cache
            .with_cache(keys::MENU_FEATURED, Some(ttl::FEATURED), || {
                retry_request(&policy, || base::fetch_featured(api))
            })
            .await?;
        Ok(items)
    }

    /// # Errors
    ///
    /// Returns an error on a cache miss once retries are exhausted.
    #[instrument(skip(self))]
    pub async fn get_categories(&self) -> Result<Vec<Category>> {
        let policy = self.ctx.read_policy();
        let api = &self.ctx.api;
        let categories = self
            .ctx
            .cache
            .with_cache(keys::CATEGORIES_ALL, Some(ttl::CATEGORIES), || {
                retry_request(&policy, || base::fetch_categories(api))
            })
            .await?;
        Ok(categories)
    }

    /// # Errors
    ///
    /// Returns an error on a cache miss once retries are exhausted.
    #[instrument(skip(self))]
    pub async fn get_announcement(&self) -> Result<Announcement> {
        let policy = self.ctx.read_policy();
        let api = &self.ctx.api;
        let announcement = self
            .ctx
            .cache
            .with_cache(keys::MENU_ANNOUNCEMENT, Some(ttl::ANNOUNCEMENT), || {
                retry_request(&policy, || base::fetch_announcement(api))
            })
            .await?;
        Ok(announcement)
    }
}
