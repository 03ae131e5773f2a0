/*
 * Copyright (C) 2025 The Phosh Developers
 *
 * SPDX-License-Identifier: GPL-3.0-or-later
 *
 * Author: Arun Mani J <arun.mani@tether.to>
 */

use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use ashpd::async_trait::async_trait;
use ashpd::backend::file_chooser::{
    FileChooserImpl, OpenFileOptions, SaveFileOptions, SaveFilesOptions, SelectedFiles,
};
use ashpd::backend::request::RequestImpl;
use ashpd::backend::Result;
use ashpd::desktop::file_chooser::FileFilter;
use ashpd::desktop::HandleToken;
use ashpd::{AppID, PortalError, WindowIdentifierType};
use gtk::glib;
use tokio::sync::mpsc::Sender;
use tokio::sync::oneshot;

use crate::{
    FileSelectorError, Message, ParentWindow, Request, Requester, Selection, TypeGroup,
    WindowOptions,
};

/*
 * Handler for FileChooser interface requests. Opening files, picking a folder and choosing a
 * save location map onto the file selector's operations.
 */

const LOG_DOMAIN: &str = "xdpp-fs-file-chooser";

/// The extension matched by a `*.ext` glob, including the case-folded `*.[pP][nN][gG]` form.
fn extension_from_pattern(pattern: &str) -> Option<String> {
    let glob = pattern.strip_prefix("*.")?;
    let mut extension = String::new();
    let mut chars = glob.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '[' => {
                let class: String = chars.by_ref().take_while(|&ch| ch != ']').collect();
                let first = class.chars().next()?;
                if !class.chars().all(|ch| ch.eq_ignore_ascii_case(&first)) {
                    return None;
                }
                extension.extend(first.to_lowercase());
            }
            '*' | '?' | ']' => return None,
            ch => extension.extend(ch.to_lowercase()),
        }
    }

    (!extension.is_empty()).then_some(extension)
}

fn convert_file_filter(filter: &FileFilter) -> TypeGroup {
    let mut extensions = Vec::new();
    for pattern in filter.pattern_filters() {
        match extension_from_pattern(pattern) {
            Some(extension) => extensions.push(extension),
            None => glib::g_warning!(LOG_DOMAIN, "Dropping unsupported pattern {pattern}"),
        }
    }

    TypeGroup::new(filter.label())
        .extensions(extensions)
        .mime_types(
            filter
                .mimetype_filters()
                .into_iter()
                .map(|mime| mime.to_string()),
        )
}

fn path_string(path: impl AsRef<Path>) -> String {
    path.as_ref().to_string_lossy().into_owned()
}

fn selected_files(selection: Selection) -> Result<SelectedFiles> {
    let uris = selection.uris();
    if uris.is_empty() {
        return Err(PortalError::Cancelled(String::from("Cancelled by user")));
    }

    Ok(uris
        .into_iter()
        .fold(SelectedFiles::default(), |files, uri| files.uri(uri)))
}

pub struct FileChooser {
    sender: Sender<Message>,
    map: RwLock<HashMap<HandleToken, usize>>,
}

impl Requester for FileChooser {
    fn new(sender: Sender<Message>) -> Self {
        FileChooser {
            sender,
            map: RwLock::new(HashMap::new()),
        }
    }

    fn sender(&self) -> &Sender<Message> {
        &self.sender
    }

    fn map(&self) -> &RwLock<HashMap<HandleToken, usize>> {
        &self.map
    }
}

#[async_trait]
impl RequestImpl for FileChooser {
    async fn close(&self, token: HandleToken) {
        self.send_close(&token).await;
    }
}

/// Selectors are parented to the caller's window and modal unless asked otherwise.
fn window_options(
    identifier: Option<WindowIdentifierType>,
    modal: Option<bool>,
) -> WindowOptions {
    WindowOptions {
        parent: identifier.map(ParentWindow::new),
        modal: modal.unwrap_or(true),
    }
}

#[async_trait]
impl FileChooserImpl for FileChooser {
    async fn open_file(
        &self,
        token: HandleToken,
        app_id: Option<AppID>,
        window_identifier: Option<WindowIdentifierType>,
        title: &str,
        options: OpenFileOptions,
    ) -> Result<SelectedFiles> {
        glib::g_debug!(LOG_DOMAIN, "Open file for {app_id:?}");

        let (reply, receiver) = oneshot::channel();
        let title = (!title.is_empty()).then(|| String::from(title));
        let accept_label = options.accept_label().map(String::from);
        let initial_directory = options.current_folder().map(path_string);
        let window = window_options(window_identifier, options.modal());

        let request = if options.directory().unwrap_or(false) {
            Request::GetDirectoryPath {
                initial_directory,
                title,
                accept_label,
                window,
                reply,
            }
        } else {
            Request::OpenFile {
                allow_multiple: options.multiple().unwrap_or(false),
                type_groups: options.filters().iter().map(convert_file_filter).collect(),
                initial_directory,
                title,
                accept_label,
                window,
                reply,
            }
        };

        let selection = self.send_request(&token, request, receiver).await?;
        selected_files(selection)
    }

    async fn save_file(
        &self,
        token: HandleToken,
        app_id: Option<AppID>,
        window_identifier: Option<WindowIdentifierType>,
        title: &str,
        options: SaveFileOptions,
    ) -> Result<SelectedFiles> {
        glib::g_debug!(LOG_DOMAIN, "Save file for {app_id:?}");

        let (initial_directory, suggested_name) = match options.current_file() {
            Some(current_file) => {
                let current_file: &Path = current_file.as_ref();
                (
                    current_file.parent().map(path_string),
                    current_file
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned()),
                )
            }
            None => (
                options.current_folder().map(path_string),
                options.current_name().map(String::from),
            ),
        };

        let (reply, receiver) = oneshot::channel();
        let request = Request::GetSavePath {
            initial_directory,
            suggested_name,
            title: (!title.is_empty()).then(|| String::from(title)),
            accept_label: options.accept_label().map(String::from),
            window: window_options(window_identifier, options.modal()),
            reply,
        };

        let selection = self.send_request(&token, request, receiver).await?;
        selected_files(selection)
    }

    async fn save_files(
        &self,
        _token: HandleToken,
        app_id: Option<AppID>,
        _window_identifier: Option<WindowIdentifierType>,
        _title: &str,
        _options: SaveFilesOptions,
    ) -> Result<SelectedFiles> {
        let error = FileSelectorError::UnknownOperation(String::from("SaveFiles"));
        glib::g_critical!(LOG_DOMAIN, "Rejecting request from {app_id:?}: {error}");
        Err(error.into())
    }
}
