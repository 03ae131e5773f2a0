/*
 * Copyright (C) 2025 The Phosh Developers
 *
 * SPDX-License-Identifier: GPL-3.0-or-later
 *
 * Author: Arun Mani J <arun.mani@tether.to>
 */

use std::collections::HashMap;
use std::sync::RwLock;

use ashpd::async_trait::async_trait;
use ashpd::backend::Result;
use ashpd::desktop::HandleToken;
use ashpd::PortalError;
use gtk::glib;
use tokio::sync::mpsc::Sender;
use tokio::sync::oneshot::Receiver;

use crate::{FileSelectorError, Message, Request, Selection};

const LOG_DOMAIN: &str = "xdpp-fs-requester";

/// A requester is responsible for getting the portal requests from the ASHPD world and passing it
/// to the `GLib` world. It gets a `sender` through which it can communicate with the `GLib` world
/// about the requests.
#[async_trait]
pub trait Requester {
    fn new(sender: Sender<Message>) -> Self;
    fn sender(&self) -> &Sender<Message>;
    fn map(&self) -> &RwLock<HashMap<HandleToken, usize>>;

    async fn send_close(&self, token: &HandleToken) {
        let request_id = match self.map().write() {
            Ok(mut map) => map.remove(token),
            Err(error) => {
                glib::g_critical!(LOG_DOMAIN, "Request map poisoned: {error}");
                return;
            }
        };

        let Some(request_id) = request_id else {
            glib::g_critical!(LOG_DOMAIN, "Unknown handle: {token}");
            return;
        };

        if let Err(error) = self.sender().send(Message::close(request_id)).await {
            glib::g_critical!(LOG_DOMAIN, "Error: {error}");
        }
    }

    /// Hands `request` to the `GLib` world and waits for the reply arriving on `receiver`.
    async fn send_request(
        &self,
        token: &HandleToken,
        request: Request,
        receiver: Receiver<std::result::Result<Selection, FileSelectorError>>,
    ) -> Result<Selection> {
        glib::g_debug!(LOG_DOMAIN, "Request: {request:#?}");

        let (request_id, message) = Message::request(request);

        if let Ok(mut map) = self.map().write() {
            map.insert(token.clone(), request_id);
        }

        if let Err(error) = self.sender().send(message).await {
            glib::g_critical!(LOG_DOMAIN, "Error: {error}");
            self.forget(token);
            return Err(PortalError::Failed(String::from("Unknown error")));
        }

        let result = match receiver.await {
            Ok(response) => {
                glib::g_debug!(LOG_DOMAIN, "Response: {response:#?}");
                response.map_err(PortalError::from)
            }
            Err(error) => {
                glib::g_critical!(LOG_DOMAIN, "Error: {error}");
                Err(PortalError::Failed(String::from("Unknown error")))
            }
        };

        self.forget(token);
        result
    }

    fn forget(&self, token: &HandleToken) {
        if let Ok(mut map) = self.map().write() {
            map.remove(token);
        }
    }
}
