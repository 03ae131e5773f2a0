/*
 * Copyright (C) 2025 The Phosh Developers
 *
 * SPDX-License-Identifier: GPL-3.0-or-later
 *
 * Author: Arun Mani J <arun.mani@tether.to>
 */

use std::io;

use ashpd::PortalError;

/// Failures reported to the caller of a file selector operation.
#[derive(Debug, thiserror::Error)]
pub enum FileSelectorError {
    /// A second operation arrived while one is still pending.
    #[error("File selector is already active")]
    AlreadyActive,

    #[error("File selector requires an attached session")]
    NoHostSession,

    #[error("Unable to resolve content reference {0}")]
    UnresolvedReference(String),

    /// The caller asked for an operation this backend does not implement.
    #[error("Unknown operation {0}")]
    UnknownOperation(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Platform picker failed: {0}")]
    Platform(String),
}

impl FileSelectorError {
    /// Stable code sent across the messaging boundary.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::AlreadyActive => "already_active",
            Self::NoHostSession => "no_activity",
            Self::UnresolvedReference(_) => "unresolved_reference",
            Self::UnknownOperation(_) => "unknown_operation",
            Self::Io(_) => "io_error",
            Self::Platform(_) => "platform_error",
        }
    }
}

impl From<FileSelectorError> for PortalError {
    fn from(error: FileSelectorError) -> Self {
        PortalError::Failed(format!("{}: {error}", error.code()))
    }
}
