/*
 * Copyright (C) 2025 The Phosh Developers
 *
 * SPDX-License-Identifier: GPL-3.0-or-later
 *
 * Author: Arun Mani J <arun.mani@tether.to>
 */

use gtk::glib;

use crate::launcher::PickerToken;
use crate::request::{Reply, Selection, SelectionRequest};
use crate::FileSelectorError;

/*
 * Admission control for the file selector. A session runs at most one picker at a time and a
 * request arriving while one is pending is turned away instead of queued.
 */

const LOG_DOMAIN: &str = "xdpp-fs-tracker";

/// The request currently owning the picker together with the channel its outcome goes to.
#[derive(Debug)]
pub struct PendingOperation {
    pub request_id: usize,
    pub request: SelectionRequest,
    pub reply: Reply,
    pub token: Option<PickerToken>,
}

impl PendingOperation {
    #[must_use]
    pub fn new(request_id: usize, request: SelectionRequest, reply: Reply) -> Self {
        Self {
            request_id,
            request,
            reply,
            token: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct PendingOperationTracker {
    active: Option<PendingOperation>,
}

impl PendingOperationTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    #[must_use]
    pub fn active(&self) -> Option<&PendingOperation> {
        self.active.as_ref()
    }

    /// Makes `operation` the active one. When another operation is already active, the
    /// existing state is left untouched and `operation` is handed back.
    pub fn try_begin(&mut self, operation: PendingOperation) -> Result<(), PendingOperation> {
        if let Some(active) = &self.active {
            glib::g_debug!(
                LOG_DOMAIN,
                "Request {} rejected, request {} is pending",
                operation.request_id,
                active.request_id
            );
            return Err(operation);
        }

        self.active = Some(operation);
        Ok(())
    }

    /// Records the token of the picker launched for the active operation.
    pub fn set_token(&mut self, token: PickerToken) {
        match &mut self.active {
            Some(active) => active.token = Some(token),
            None => glib::g_critical!(LOG_DOMAIN, "No active operation for {token:?}"),
        }
    }

    /// Whether `token` belongs to the active operation.
    #[must_use]
    pub fn is_awaiting(&self, token: PickerToken) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| active.token == Some(token))
    }

    /// Sends `result` to the active operation's caller and returns to idle. Without an active
    /// operation this does nothing.
    pub fn complete(&mut self, result: Result<Selection, FileSelectorError>) {
        let Some(operation) = self.active.take() else {
            glib::g_debug!(LOG_DOMAIN, "No active operation to complete");
            return;
        };

        glib::g_debug!(
            LOG_DOMAIN,
            "Completing request {}: {result:?}",
            operation.request_id
        );

        if operation.reply.send(result).is_err() {
            glib::g_warning!(
                LOG_DOMAIN,
                "Caller of request {} is gone",
                operation.request_id
            );
        }
    }

    /// Drops the active operation without replying to it.
    pub fn discard(&mut self) -> Option<PendingOperation> {
        let operation = self.active.take();
        if let Some(operation) = &operation {
            glib::g_debug!(
                LOG_DOMAIN,
                "Discarding request {}",
                operation.request_id
            );
        }
        operation
    }

    /// Turns a newcomer away with [`FileSelectorError::AlreadyActive`].
    pub fn reject_already_active(reply: Reply) {
        if reply.send(Err(FileSelectorError::AlreadyActive)).is_err() {
            glib::g_warning!(LOG_DOMAIN, "Rejected caller is gone");
        }
    }
}
