//! Command implementations, one module per configuration section
//!
//! - [`packages`]: native package template sync/diff
//! - [`aur`]: AUR package template sync/diff
//! - [`configuration`]: per-package configuration reconciliation
//! - [`users`]: user account provisioning

pub mod aur;
pub mod configuration;
pub mod packages;
pub mod users;
