/*
 * Copyright (C) 2025 The Phosh Developers
 *
 * SPDX-License-Identifier: GPL-3.0-or-later
 *
 * Author: Arun Mani J <arun.mani@tether.to>
 */

use std::path::PathBuf;
use std::sync::Arc;

use ashpd::url::Url;
use ashpd::WindowIdentifierType;
use tokio::sync::oneshot::Sender;

use crate::FileSelectorError;

/// The single-shot channel through which an operation's outcome is sent back to its caller.
pub type Reply = Sender<Result<Selection, FileSelectorError>>;

/// A named group of acceptable file types, e.g. "Images" with `image/png` and `jpg`.
///
/// Extensions are kept without the leading dot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeGroup {
    pub label: String,
    pub extensions: Vec<String>,
    pub mime_types: Vec<String>,
}

impl TypeGroup {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions.extend(
            extensions
                .into_iter()
                .map(|extension| extension.as_ref().trim_start_matches('.').to_lowercase()),
        );
        self
    }

    #[must_use]
    pub fn mime_types<I, S>(mut self, mime_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mime_types.extend(mime_types.into_iter().map(Into::into));
        self
    }

    /// Glob patterns matching this group's extensions.
    pub fn patterns(&self) -> impl Iterator<Item = String> + '_ {
        self.extensions
            .iter()
            .map(|extension| format!("*.{extension}"))
    }
}

/// The caller's window a picker is shown on top of.
#[derive(Clone, Debug)]
pub struct ParentWindow(Arc<WindowIdentifierType>);

impl ParentWindow {
    #[must_use]
    pub fn new(identifier: WindowIdentifierType) -> Self {
        Self(Arc::new(identifier))
    }

    #[must_use]
    pub fn identifier(&self) -> &WindowIdentifierType {
        &self.0
    }
}

impl PartialEq for ParentWindow {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ParentWindow {}

/// How the picker window relates to the caller's window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WindowOptions {
    pub parent: Option<ParentWindow>,
    pub modal: bool,
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self {
            parent: None,
            modal: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionKind {
    OpenFile,
    OpenMultipleFiles,
    OpenDirectory,
    SaveFile,
}

impl SelectionKind {
    /// Name of the inbound method that creates this kind of request.
    #[must_use]
    pub fn method(self) -> &'static str {
        match self {
            Self::OpenFile | Self::OpenMultipleFiles => "openFile",
            Self::OpenDirectory => "getDirectoryPath",
            Self::SaveFile => "getSavePath",
        }
    }

    /// Whether the outcome of this kind of request is a list of paths.
    #[must_use]
    pub fn is_multiple(self) -> bool {
        self == Self::OpenMultipleFiles
    }
}

/// One picker invocation, as described by the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectionRequest {
    pub kind: SelectionKind,
    pub allowed_type_groups: Vec<TypeGroup>,
    pub initial_directory: Option<String>,
    pub suggested_name: Option<String>,
    pub title: Option<String>,
    pub confirm_button_text: Option<String>,
    pub window: WindowOptions,
}

impl SelectionRequest {
    fn new(kind: SelectionKind) -> Self {
        Self {
            kind,
            allowed_type_groups: Vec::new(),
            initial_directory: None,
            suggested_name: None,
            title: None,
            confirm_button_text: None,
            window: WindowOptions::default(),
        }
    }

    #[must_use]
    pub fn open_file(allow_multiple: bool, allowed_type_groups: Vec<TypeGroup>) -> Self {
        let kind = if allow_multiple {
            SelectionKind::OpenMultipleFiles
        } else {
            SelectionKind::OpenFile
        };
        Self {
            allowed_type_groups,
            ..Self::new(kind)
        }
    }

    #[must_use]
    pub fn directory(initial_directory: Option<String>) -> Self {
        Self {
            initial_directory,
            ..Self::new(SelectionKind::OpenDirectory)
        }
    }

    #[must_use]
    pub fn save_file(initial_directory: Option<String>, suggested_name: Option<String>) -> Self {
        Self {
            initial_directory,
            suggested_name,
            ..Self::new(SelectionKind::SaveFile)
        }
    }

    #[must_use]
    pub fn initial_directory(mut self, initial_directory: Option<String>) -> Self {
        self.initial_directory = initial_directory;
        self
    }

    #[must_use]
    pub fn title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    #[must_use]
    pub fn confirm_button_text(mut self, text: Option<String>) -> Self {
        self.confirm_button_text = text;
        self
    }

    #[must_use]
    pub fn window(mut self, window: WindowOptions) -> Self {
        self.window = window;
        self
    }

    #[must_use]
    pub fn allow_multiple(&self) -> bool {
        self.kind.is_multiple()
    }
}

/// The value an operation completes with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selection {
    /// Nothing was chosen.
    None,
    Path(PathBuf),
    Paths(Vec<PathBuf>),
}

impl Selection {
    /// What a cancelled picker of the given kind reports.
    #[must_use]
    pub fn cancelled(kind: SelectionKind) -> Self {
        if kind.is_multiple() {
            Self::Paths(Vec::new())
        } else {
            Self::None
        }
    }

    #[must_use]
    pub fn paths(&self) -> &[PathBuf] {
        match self {
            Self::None => &[],
            Self::Path(path) => std::slice::from_ref(path),
            Self::Paths(paths) => paths,
        }
    }

    /// The selection as `file://` URIs, dropping paths that cannot be expressed as one.
    #[must_use]
    pub fn uris(&self) -> Vec<Url> {
        self.paths()
            .iter()
            .filter_map(|path| Url::from_file_path(path).ok())
            .collect()
    }
}

/// Operations of the inbound call surface. Each carries the `reply` through which its outcome
/// must be sent exactly once.
#[derive(Debug)]
pub enum Request {
    OpenFile {
        allow_multiple: bool,
        type_groups: Vec<TypeGroup>,
        initial_directory: Option<String>,
        title: Option<String>,
        accept_label: Option<String>,
        window: WindowOptions,
        reply: Reply,
    },
    GetDirectoryPath {
        initial_directory: Option<String>,
        title: Option<String>,
        accept_label: Option<String>,
        window: WindowOptions,
        reply: Reply,
    },
    GetSavePath {
        initial_directory: Option<String>,
        suggested_name: Option<String>,
        title: Option<String>,
        accept_label: Option<String>,
        window: WindowOptions,
        reply: Reply,
    },
}

impl Request {
    /// Splits the request into its picker description and its reply channel.
    #[must_use]
    pub fn into_parts(self) -> (SelectionRequest, Reply) {
        match self {
            Request::OpenFile {
                allow_multiple,
                type_groups,
                initial_directory,
                title,
                accept_label,
                window,
                reply,
            } => (
                SelectionRequest::open_file(allow_multiple, type_groups)
                    .initial_directory(initial_directory)
                    .title(title)
                    .confirm_button_text(accept_label)
                    .window(window),
                reply,
            ),
            Request::GetDirectoryPath {
                initial_directory,
                title,
                accept_label,
                window,
                reply,
            } => (
                SelectionRequest::directory(initial_directory)
                    .title(title)
                    .confirm_button_text(accept_label)
                    .window(window),
                reply,
            ),
            Request::GetSavePath {
                initial_directory,
                suggested_name,
                title,
                accept_label,
                window,
                reply,
            } => (
                SelectionRequest::save_file(initial_directory, suggested_name)
                    .title(title)
                    .confirm_button_text(accept_label)
                    .window(window),
                reply,
            ),
        }
    }
}
