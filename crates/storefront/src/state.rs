//! Application state shared across the UI.
//!
//! [`Storefront`] owns every store and client and performs every user
//! operation. It is driven from a single event loop, so it needs no interior
//! locking: network calls are the only suspension points, and catalog fetches
//! can run detached through the ticketed [`CatalogPager`] API.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};

use dummymart_core::{Email, ProductId};

use crate::api::{CreatedUser, DummyJsonClient, Product};
use crate::cart::{CartStore, clamp_quantity};
use crate::catalog::{CatalogPager, FetchOutcome, FilterCriteria, Page, PageTicket};
use crate::config::StorefrontConfig;
use crate::error::{self, AppError, Result};
use crate::forms::{ContactForm, LoginForm, SignupForm};
use crate::models::session::Session;
use crate::scheduler::Scheduler;
use crate::services::cart_notifier::{AbandonedCartNotifier, CartNotifier, notifier_from_config};
use crate::services::{AuthService, ContactClient};
use crate::storage::LocalStorage;
use crate::theme::Theme;

/// Maximum number of related products shown on a details page.
pub const MAX_RELATED: usize = 4;

/// The storefront: catalog, cart, session, theme and their clients.
pub struct Storefront {
    config: StorefrontConfig,
    api: DummyJsonClient,
    contact: ContactClient,
    storage: LocalStorage,
    session: Option<Session>,
    cart: CartStore,
    pager: CatalogPager,
    notifier: AbandonedCartNotifier,
    theme: Theme,
}

impl Storefront {
    /// Create the storefront from configuration.
    ///
    /// Opens the storage file, restores a saved session and theme, and picks
    /// the notification channel. Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be opened or a client fails to
    /// build.
    pub fn new(config: StorefrontConfig) -> Result<Self> {
        let storage = LocalStorage::open(config.storage_path.clone())?;
        let notifier = notifier_from_config(&config.notify)?;
        Self::with_parts(config, storage, notifier)
    }

    /// Create the storefront with explicit storage and notifier.
    ///
    /// # Errors
    ///
    /// Returns an error if called outside a tokio runtime, if a stored
    /// session cannot be cleaned up, or if a client fails to build.
    pub fn with_parts(
        config: StorefrontConfig,
        mut storage: LocalStorage,
        notifier: Arc<dyn CartNotifier>,
    ) -> Result<Self> {
        let scheduler = Scheduler::current().map_err(|e| AppError::Internal(e.to_string()))?;
        let api = DummyJsonClient::new(&config.api)?;
        let contact = ContactClient::new(&config.contact_url)?;

        let session = Session::restore(&mut storage, Utc::now())?;
        if let Some(session) = &session {
            info!(user_id = %session.user_id, "session restored");
            error::set_sentry_user(
                &session.user_id,
                session.email.as_ref().map(Email::as_str),
            );
        }
        let theme = Theme::load(&storage);

        Ok(Self {
            pager: CatalogPager::new(config.page_size, config.scroll_threshold),
            notifier: AbandonedCartNotifier::new(scheduler, config.cart_notify_delay, notifier),
            config,
            api,
            contact,
            storage,
            session,
            cart: CartStore::new(),
            theme,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &StorefrontConfig {
        &self.config
    }

    /// Catalog client. Cheap to clone for detached fetches.
    #[must_use]
    pub const fn api(&self) -> &DummyJsonClient {
        &self.api
    }

    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        self.session.is_some()
    }

    #[must_use]
    pub const fn cart(&self) -> &CartStore {
        &self.cart
    }

    #[must_use]
    pub const fn pager(&self) -> &CatalogPager {
        &self.pager
    }

    #[must_use]
    pub const fn theme(&self) -> Theme {
        self.theme
    }

    /// Whether an abandoned-cart notification is waiting to fire.
    #[must_use]
    pub fn notification_pending(&self) -> bool {
        self.notifier.is_pending()
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Replace the filter criteria. Returns whether they changed.
    pub fn set_criteria(&mut self, criteria: FilterCriteria) -> bool {
        self.pager.set_criteria(criteria)
    }

    /// Reserve the next page if `distance_from_bottom` is within the scroll
    /// threshold.
    pub fn on_scroll(&mut self, distance_from_bottom: u32) -> Option<PageTicket> {
        self.pager.on_scroll(distance_from_bottom)
    }

    /// Reserve the next page if fewer than a page of products is visible.
    pub fn fill_ticket(&mut self) -> Option<PageTicket> {
        self.pager.fill_ticket()
    }

    /// Apply the result of a detached fetch.
    ///
    /// # Errors
    ///
    /// Returns the fetch error for a ticket that is still current.
    pub fn complete_fetch(
        &mut self,
        ticket: PageTicket,
        result: std::result::Result<Page, crate::api::ApiError>,
    ) -> Result<FetchOutcome> {
        Ok(self.pager.complete_fetch(ticket, result)?)
    }

    /// Fetch until a full page of products is visible or the catalog is
    /// exhausted.
    ///
    /// # Errors
    ///
    /// Returns the first fetch error.
    pub async fn fill_catalog(&mut self) -> Result<usize> {
        Ok(self.pager.fill(&self.api).await?)
    }

    /// Fetch one more page regardless of the fill rule.
    ///
    /// # Errors
    ///
    /// Returns the fetch error.
    pub async fn load_more(&mut self) -> Result<Option<FetchOutcome>> {
        Ok(self.pager.fetch_next(&self.api).await?)
    }

    /// Displayed products: everything fetched, filtered and sorted.
    #[must_use]
    pub fn visible_products(&self) -> Vec<Product> {
        self.pager.visible()
    }

    // =========================================================================
    // Product details
    // =========================================================================

    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] for an unknown ID, or a network error.
    pub async fn product(&self, id: ProductId) -> Result<Product> {
        Ok(self.api.get_product(id).await?)
    }

    /// Up to [`MAX_RELATED`] other products from the same category.
    ///
    /// # Errors
    ///
    /// Returns a network error.
    pub async fn related(&self, product: &Product) -> Result<Vec<Product>> {
        let listing = self.api.get_products_by_category(&product.category).await?;
        Ok(listing
            .products
            .into_iter()
            .filter(|candidate| candidate.id != product.id)
            .take(MAX_RELATED)
            .collect())
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Set the quantity of a product in the cart. Zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::LoginRequired`] for guests and [`AppError::Cart`]
    /// if the quantity exceeds stock. The cart is unchanged on error.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub fn set_cart_quantity(&mut self, product: &Product, quantity: u32) -> Result<()> {
        if self.session.is_none() {
            return Err(AppError::LoginRequired);
        }

        self.cart.set_quantity(product, quantity)?;
        error::add_breadcrumb(
            "cart",
            "Set quantity",
            Some(&[
                ("product_id", &product.id.to_string()),
                ("quantity", &quantity.to_string()),
            ]),
        );
        self.cart_changed();
        Ok(())
    }

    /// Add one unit, up to the available stock. Returns the new quantity.
    ///
    /// # Errors
    ///
    /// See [`Self::set_cart_quantity`].
    pub fn increment(&mut self, product: &Product) -> Result<u32> {
        let current = self.cart.quantity_of(product.id);
        let next = clamp_quantity(product, i64::from(current) + 1);
        self.set_cart_quantity(product, next)?;
        Ok(next)
    }

    /// Remove one unit; the line disappears at zero. Returns the new
    /// quantity.
    ///
    /// # Errors
    ///
    /// See [`Self::set_cart_quantity`].
    pub fn decrement(&mut self, product: &Product) -> Result<u32> {
        let current = self.cart.quantity_of(product.id);
        let next = clamp_quantity(product, i64::from(current) - 1);
        self.set_cart_quantity(product, next)?;
        Ok(next)
    }

    /// Remove a line by ID. Returns whether it was in the cart.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::LoginRequired`] for guests.
    pub fn remove_from_cart(&mut self, id: ProductId) -> Result<bool> {
        if self.session.is_none() {
            return Err(AppError::LoginRequired);
        }
        let removed = self.cart.remove(id);
        if removed {
            self.cart_changed();
        }
        Ok(removed)
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::LoginRequired`] for guests.
    pub fn clear_cart(&mut self) -> Result<()> {
        if self.session.is_none() {
            return Err(AppError::LoginRequired);
        }
        self.cart.clear();
        self.cart_changed();
        Ok(())
    }

    fn cart_changed(&mut self) {
        self.notifier.cart_changed(&self.cart, self.session.as_ref());
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Log in and persist the session. The cart is kept.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for blank fields, [`AppError::Auth`]
    /// for rejected credentials, or a network or storage error. The previous
    /// session is unchanged on error.
    pub async fn login(&mut self, form: &LoginForm) -> Result<&Session> {
        let session = AuthService::new(&self.api).login(form).await?;
        session.persist(&mut self.storage)?;

        info!(user_id = %session.user_id, "logged in");
        error::set_sentry_user(
            &session.user_id,
            session.email.as_ref().map(Email::as_str),
        );

        Ok(&*self.session.insert(session))
    }

    /// Log out: forget the saved session, then the in-memory one, empty the
    /// cart and drop any pending cart notification.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the saved session cannot be removed. The
    /// user stays logged in with the cart untouched in that case.
    pub fn logout(&mut self) -> Result<()> {
        Session::forget(&mut self.storage)?;
        self.notifier.cancel();
        self.cart.clear();
        error::clear_sentry_user();
        if let Some(session) = self.session.take() {
            info!(user_id = %session.user_id, "logged out");
        }
        Ok(())
    }

    /// Create an account. Does not log in.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for invalid fields,
    /// [`AppError::SignupRejected`] if the API refuses, or a network error.
    pub async fn signup(&self, form: &SignupForm) -> Result<CreatedUser> {
        Ok(AuthService::new(&self.api).signup(form).await?)
    }

    // =========================================================================
    // Contact & theme
    // =========================================================================

    /// Validate and send a contact message.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for invalid fields,
    /// [`AppError::ContactRejected`] if the relay reports failure, or a
    /// network error.
    pub async fn submit_contact(&self, form: &ContactForm) -> Result<()> {
        let message = form.validate()?;
        let response = self.contact.send(&message).await?;
        if !response.success {
            return Err(AppError::ContactRejected(response.message));
        }
        info!("contact message sent");
        Ok(())
    }

    /// Flip and persist the theme.
    ///
    /// # Errors
    ///
    /// Returns a storage error; the theme is unchanged in that case.
    pub fn toggle_theme(&mut self) -> Result<Theme> {
        let next = self.theme.toggled();
        next.save(&mut self.storage)?;
        self.theme = next;
        Ok(next)
    }
}
