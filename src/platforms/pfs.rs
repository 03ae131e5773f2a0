/*
 * Copyright (C) 2025 The Phosh Developers
 *
 * SPDX-License-Identifier: GPL-3.0-or-later
 *
 * Author: Arun Mani J <arun.mani@tether.to>
 */

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use ashpd::url::Url;
use gtk::prelude::*;
use gtk::{gio, glib};
use pfs::file_selector::{FileSelector, FileSelectorMode};
use tokio::sync::mpsc::Sender;

use crate::dispatcher::{PlatformOutcome, PlatformPayload};
use crate::launcher::{DisplayFilter, PickerAction, PickerOptions, PickerToken, Platform};
use crate::utils::gettextf;
use crate::{FileSelectorError, Message};

/*
 * `PfsPlatform` presents pickers with the Phosh File Selector. When a selector window is done,
 * its outcome is posted back to the `GLib` world as a `PlatformResult` message.
 */

const LOG_DOMAIN: &str = "xdpp-fs-pfs";

type Windows = Rc<RefCell<HashMap<PickerToken, FileSelector>>>;

fn convert_filter(filter: &DisplayFilter) -> gtk::FileFilter {
    let gtk_filter = gtk::FileFilter::new();
    gtk_filter.set_name(Some(&filter.label));

    for mime_type in &filter.mime_types {
        gtk_filter.add_mime_type(mime_type);
    }

    for pattern in &filter.patterns {
        gtk_filter.add_pattern(pattern);
    }

    gtk_filter
}

fn convert_filters(filters: &[DisplayFilter]) -> gio::ListModel {
    let model = gio::ListStore::with_type(gtk::FileFilter::static_type());
    for filter in filters {
        model.append(&convert_filter(filter));
    }
    model.into()
}

fn outcome(success: bool, window: &FileSelector) -> PlatformOutcome {
    if !success {
        return PlatformOutcome::Cancelled;
    }

    let Some(uris) = window.selected() else {
        return PlatformOutcome::Cancelled;
    };

    let references: Vec<Url> = uris
        .iter()
        .filter_map(|uri| match Url::parse(uri) {
            Ok(url) => Some(url),
            Err(error) => {
                glib::g_warning!(LOG_DOMAIN, "Selector returned invalid URI {uri}: {error}");
                None
            }
        })
        .collect();

    if references.is_empty() {
        return PlatformOutcome::Cancelled;
    }

    PlatformOutcome::Selected(PlatformPayload::from_references(references))
}

/// Queues the outcome on the `GLib` main context, waiting for room in the channel if needed.
fn post(sender: &Sender<Message>, token: PickerToken, outcome: PlatformOutcome) {
    let sender = sender.clone();
    glib::spawn_future_local(async move {
        if let Err(error) = sender.send(Message::platform_result(token, outcome)).await {
            glib::g_critical!(LOG_DOMAIN, "Unable to post result of {token:?}: {error}");
        }
    });
}

pub struct PfsPlatform {
    sender: Sender<Message>,
    windows: Windows,
}

impl PfsPlatform {
    pub fn new(sender: Sender<Message>) -> Self {
        pfs::init::init();
        Self {
            sender,
            windows: Rc::new(RefCell::new(HashMap::new())),
        }
    }
}

impl Platform for PfsPlatform {
    fn start_picker(
        &self,
        token: PickerToken,
        options: PickerOptions,
    ) -> Result<(), FileSelectorError> {
        let mut props: Vec<(&str, glib::Value)> = Vec::new();
        let filters = options.display_filters(&gettextf("All Supported Types", &[]));

        let (mode, title, accept_label) = match options.action {
            PickerAction::GetContent => (
                FileSelectorMode::OpenFile,
                gettextf("Open File", &[]),
                gettextf("Open", &[]),
            ),
            PickerAction::OpenDocumentTree => (
                FileSelectorMode::OpenFile,
                gettextf("Select Folder", &[]),
                gettextf("Select", &[]),
            ),
            PickerAction::CreateDocument => (
                FileSelectorMode::SaveFile,
                gettextf("Save File", &[]),
                gettextf("Save", &[]),
            ),
        };

        props.push(("mode", mode.into()));
        props.push(("title", options.title.unwrap_or(title).into()));
        props.push((
            "accept-label",
            options.accept_label.unwrap_or(accept_label).into(),
        ));
        props.push((
            "directory",
            (options.action == PickerAction::OpenDocumentTree).into(),
        ));

        let current_filter = if filters.is_empty() {
            gtk::INVALID_LIST_POSITION
        } else {
            0
        };
        props.push(("current_filter", current_filter.into()));
        props.push(("filters", convert_filters(&filters).into()));

        let current_folder = options.initial_location.unwrap_or_else(glib::home_dir);
        props.push(("current-folder", gio::File::for_path(current_folder).into()));

        if let Some(name) = options.suggested_name {
            props.push(("filename", name.into()));
        }

        if options.allow_multiple {
            glib::g_debug!(LOG_DOMAIN, "Selector decides how many files {token:?} gets");
        }

        let window = FileSelector::new();
        window.set_properties_from_value(&props);

        let sender = self.sender.clone();
        let windows = Rc::clone(&self.windows);
        window.connect_closure(
            "done",
            false,
            glib::closure_local!(move |window: FileSelector, success: bool| {
                if windows.borrow_mut().remove(&token).is_none() {
                    glib::g_debug!(LOG_DOMAIN, "Selector of {token:?} was dismissed");
                    return;
                }
                post(&sender, token, outcome(success, &window));
            }),
        );

        if let Some(parent) = &options.window.parent {
            parent.identifier().set_parent_of(&window);
        } else {
            glib::g_warning!(LOG_DOMAIN, "Application does not have window identifier");
        }
        window.set_modal(options.window.modal);
        window.present();

        self.windows.borrow_mut().insert(token, window);
        Ok(())
    }

    fn dismiss(&self, token: PickerToken) {
        let window = self.windows.borrow_mut().remove(&token);
        if let Some(window) = window {
            window.close();
            post(&self.sender, token, PlatformOutcome::Cancelled);
        } else {
            glib::g_critical!(LOG_DOMAIN, "No window available to close for {token:?}");
        }
    }
}
