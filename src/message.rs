/*
 * Copyright (C) 2025 The Phosh Developers
 *
 * SPDX-License-Identifier: GPL-3.0-or-later
 *
 * Author: Arun Mani J <arun.mani@tether.to>
 */

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::dispatcher::PlatformOutcome;
use crate::launcher::PickerToken;
use crate::Request;

static REQUEST_ID: AtomicUsize = AtomicUsize::new(1);

/// A message to the `GLib` world, where the file selector session lives.
#[allow(clippy::large_enum_variant)]
#[derive(Debug)]
pub enum Message {
    /// The host session started. Pickers may be launched from now on.
    Attach,
    /// The host session ended. Cached content is dropped along with any pending operation.
    Detach,
    /// The caller closed the request of given ID before it got a reply.
    Close { request_id: usize },
    /// A new request from the caller.
    Request { request_id: usize, request: Request },
    /// The platform picker launched under `token` has finished.
    PlatformResult {
        token: PickerToken,
        outcome: PlatformOutcome,
    },
}

impl Message {
    #[must_use]
    pub fn close(request_id: usize) -> Self {
        Self::Close { request_id }
    }

    pub fn request(request: Request) -> (usize, Self) {
        let request_id = REQUEST_ID.fetch_add(1, Ordering::SeqCst);
        let message = Self::Request {
            request_id,
            request,
        };
        (request_id, message)
    }

    #[must_use]
    pub fn platform_result(token: PickerToken, outcome: PlatformOutcome) -> Self {
        Self::PlatformResult { token, outcome }
    }
}
