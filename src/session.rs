/*
 * Copyright (C) 2025 The Phosh Developers
 *
 * SPDX-License-Identifier: GPL-3.0-or-later
 *
 * Author: Arun Mani J <arun.mani@tether.to>
 */

use gtk::glib;

use crate::dispatcher::{PlatformOutcome, ResultDispatcher};
use crate::launcher::{PickerLauncher, PickerToken, Platform};
use crate::request::{Reply, SelectionRequest, TypeGroup};
use crate::resolver::{ContentProvider, PathResolver};
use crate::tracker::{PendingOperation, PendingOperationTracker};
use crate::{Config, FileSelectorError, Message, Request};

/*
 * A `Session` is the file selector as seen by its caller, for the lifetime of one host session.
 * It admits requests through the tracker, launches pickers and routes their results back.
 *
 * All of it runs on the GLib main thread. Copying picked content into the cache happens on that
 * thread too, so large files stall the loop until they are copied.
 */

const LOG_DOMAIN: &str = "xdpp-fs-session";

pub struct Session<P, C> {
    launcher: PickerLauncher<P>,
    tracker: PendingOperationTracker,
    dispatcher: ResultDispatcher<C>,
    attached: bool,
}

impl<P: Platform, C: ContentProvider> Session<P, C> {
    pub fn new(config: Config, platform: P, provider: C) -> Self {
        Self {
            launcher: PickerLauncher::new(platform),
            tracker: PendingOperationTracker::new(),
            dispatcher: ResultDispatcher::new(PathResolver::new(config, provider)),
            attached: false,
        }
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn tracker(&self) -> &PendingOperationTracker {
        &self.tracker
    }

    pub fn platform(&self) -> &P {
        self.launcher.platform()
    }

    pub fn resolver(&self) -> &PathResolver<C> {
        self.dispatcher.resolver()
    }

    pub fn attach(&mut self) {
        glib::g_debug!(LOG_DOMAIN, "Session attached");
        self.attached = true;
    }

    /// Ends the session. The cache is cleared and a pending operation is dropped without a
    /// reply, since its caller is gone with the session.
    pub fn detach(&mut self) {
        glib::g_debug!(LOG_DOMAIN, "Session detached");
        self.attached = false;
        if let Some(operation) = self.tracker.discard() {
            if let Some(token) = operation.token {
                self.launcher.dismiss(token);
            }
        }
        self.resolver().clear_cache();
    }

    pub fn handle(&mut self, message: Message) {
        match message {
            Message::Attach => self.attach(),
            Message::Detach => self.detach(),
            Message::Close { request_id } => self.close(request_id),
            Message::Request {
                request_id,
                request,
            } => self.request(request_id, request),
            Message::PlatformResult { token, outcome } => self.on_platform_result(token, outcome),
        }
    }

    pub fn request(&mut self, request_id: usize, request: Request) {
        let (selection, reply) = request.into_parts();
        self.begin(request_id, selection, reply);
    }

    pub fn open_file(
        &mut self,
        request_id: usize,
        allow_multiple: bool,
        type_groups: Vec<TypeGroup>,
        reply: Reply,
    ) {
        let request = SelectionRequest::open_file(allow_multiple, type_groups);
        self.begin(request_id, request, reply);
    }

    pub fn get_directory_path(
        &mut self,
        request_id: usize,
        initial_directory: Option<String>,
        reply: Reply,
    ) {
        let request = SelectionRequest::directory(initial_directory);
        self.begin(request_id, request, reply);
    }

    pub fn get_save_path(
        &mut self,
        request_id: usize,
        initial_directory: Option<String>,
        suggested_name: Option<String>,
        reply: Reply,
    ) {
        let request = SelectionRequest::save_file(initial_directory, suggested_name);
        self.begin(request_id, request, reply);
    }

    /// Dismisses the picker of `request_id` if it is the pending one. The outcome still
    /// arrives through the platform, as a cancellation.
    pub fn close(&mut self, request_id: usize) {
        let token = self
            .tracker
            .active()
            .filter(|active| active.request_id == request_id)
            .and_then(|active| active.token);

        match token {
            Some(token) => self.launcher.dismiss(token),
            None => glib::g_debug!(LOG_DOMAIN, "Request {request_id} is not pending"),
        }
    }

    pub fn on_platform_result(&mut self, token: PickerToken, outcome: PlatformOutcome) {
        self.dispatcher
            .on_platform_result(&mut self.tracker, token, outcome);
    }

    fn begin(&mut self, request_id: usize, request: SelectionRequest, reply: Reply) {
        if !self.attached {
            glib::g_warning!(
                LOG_DOMAIN,
                "No session to run {} for request {request_id}",
                request.kind.method()
            );
            if reply.send(Err(FileSelectorError::NoHostSession)).is_err() {
                glib::g_warning!(LOG_DOMAIN, "Caller of request {request_id} is gone");
            }
            return;
        }

        if let Err(rejected) = self
            .tracker
            .try_begin(PendingOperation::new(request_id, request, reply))
        {
            PendingOperationTracker::reject_already_active(rejected.reply);
            return;
        }

        let Some(active) = self.tracker.active() else {
            return;
        };
        match self.launcher.launch(&active.request) {
            Ok(token) => self.tracker.set_token(token),
            Err(error) => {
                glib::g_warning!(LOG_DOMAIN, "Unable to launch picker: {error}");
                self.tracker.complete(Err(error));
            }
        }
    }
}
