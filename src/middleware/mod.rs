// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (access control, API auth, security headers).

pub mod access;
pub mod auth;
pub mod security;

pub use access::enforce_access;
pub use auth::{optional_auth, require_admin, require_auth};
