// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod activity_log;
pub mod deletion;
pub mod identity;
pub mod session;
pub mod storage;
pub mod upload;

pub use activity_log::ActivityLogger;
pub use deletion::{run_cascade, DeletionReport, UserDeletion, USER_DELETION_STEPS};
pub use identity::{IdentityAdmin, IdentityError};
pub use session::{CredentialProvider, JwtSessionProvider, ProviderError, ResolvedSession};
pub use storage::{AssetStore, BlobStore, LocalDiskStore, PublicRef};
pub use upload::{process_upload, UploadError, UploadRequest};
