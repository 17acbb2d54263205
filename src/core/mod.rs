//! Business logic, independent of the HTTP layer.
//!
//! Every operation takes a `&DatabaseConnection` and returns
//! [`crate::errors::Result`].

/// Staff sign-in, token verification and permissions
pub mod auth;
/// Cart value and server-side re-pricing
pub mod cart;
/// Contact and franchise inquiries
pub mod contact;
/// Editable site content
pub mod content;
/// Invoice layout and PDF rendering
pub mod invoice;
/// Menu items
pub mod menu;
/// Orders and their status lifecycle
pub mod order;
/// Staff accounts
pub mod user;
