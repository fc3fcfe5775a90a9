//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Credential login and account creation
//! - `mailer` - EmailJS delivery
//! - `cart_notifier` - Debounced abandoned-cart emails
//! - `contact` - Contact relay client

pub mod auth;
pub mod cart_notifier;
pub mod contact;
pub mod mailer;

pub use auth::{AuthError, AuthService};
pub use cart_notifier::{AbandonedCartNotifier, CartNotifier, CartSnapshot, LogNotifier};
pub use contact::{ContactClient, ContactResponse};
pub use mailer::{EmailJsClient, MailError};
