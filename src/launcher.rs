/*
 * Copyright (C) 2025 The Phosh Developers
 *
 * SPDX-License-Identifier: GPL-3.0-or-later
 *
 * Author: Arun Mani J <arun.mani@tether.to>
 */

use std::cell::Cell;
use std::path::{Path, PathBuf};

use ashpd::url::Url;
use gtk::glib;

use crate::request::{SelectionKind, SelectionRequest, TypeGroup, WindowOptions};
use crate::FileSelectorError;

/*
 * `PickerLauncher` turns a `SelectionRequest` into the options of a platform picker and starts
 * it. The platform picker runs on its own and reports back later with the token it was given.
 */

const LOG_DOMAIN: &str = "xdpp-fs-launcher";

/// Correlates a platform picker's result with the launch that started it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PickerToken(pub u64);

/// The system action a picker performs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PickerAction {
    /// Select a directory tree.
    OpenDocumentTree,
    /// Pick existing content.
    GetContent,
    /// Choose where a new document is created.
    CreateDocument,
}

impl From<SelectionKind> for PickerAction {
    fn from(kind: SelectionKind) -> Self {
        match kind {
            SelectionKind::OpenFile | SelectionKind::OpenMultipleFiles => Self::GetContent,
            SelectionKind::OpenDirectory => Self::OpenDocumentTree,
            SelectionKind::SaveFile => Self::CreateDocument,
        }
    }
}

/// Type groups flattened into the single filter a platform picker matches against.
///
/// An empty filter accepts anything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeFilter {
    pub mime_types: Vec<String>,
    pub patterns: Vec<String>,
}

impl TypeFilter {
    #[must_use]
    pub fn from_groups(groups: &[TypeGroup]) -> Self {
        let mut filter = Self::default();
        for group in groups {
            for mime_type in &group.mime_types {
                push_unique(&mut filter.mime_types, mime_type.clone());
            }
            for pattern in group.patterns() {
                push_unique(&mut filter.patterns, pattern);
            }
        }
        filter
    }

    /// The primary type of the picker: the only MIME type when exactly one is given, the
    /// wildcard when more patterns refine the match, and nothing for an empty filter.
    #[must_use]
    pub fn primary_type(&self) -> Option<&str> {
        match (self.mime_types.as_slice(), self.patterns.is_empty()) {
            ([], true) => None,
            ([only], true) => Some(only.as_str()),
            _ => Some("*/*"),
        }
    }
}

/// One entry of the filter list a picker shows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayFilter {
    pub label: String,
    pub mime_types: Vec<String>,
    pub patterns: Vec<String>,
}

impl From<&TypeGroup> for DisplayFilter {
    fn from(group: &TypeGroup) -> Self {
        Self {
            label: group.label.clone(),
            mime_types: group.mime_types.clone(),
            patterns: group.patterns().collect(),
        }
    }
}

fn push_unique(values: &mut Vec<String>, value: String) {
    if !values.contains(&value) {
        values.push(value);
    }
}

/// Everything a platform needs to present one picker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PickerOptions {
    pub action: PickerAction,
    pub allow_multiple: bool,
    pub type_filter: TypeFilter,
    /// The groups the filter was built from, kept for display.
    pub type_groups: Vec<TypeGroup>,
    pub initial_location: Option<PathBuf>,
    pub suggested_name: Option<String>,
    pub title: Option<String>,
    pub accept_label: Option<String>,
    pub window: WindowOptions,
}

impl PickerOptions {
    #[must_use]
    pub fn from_request(request: &SelectionRequest) -> Self {
        let action = PickerAction::from(request.kind);
        let suggested_name = match action {
            PickerAction::CreateDocument => request.suggested_name.clone(),
            _ => None,
        };

        Self {
            action,
            allow_multiple: request.allow_multiple(),
            type_filter: TypeFilter::from_groups(&request.allowed_type_groups),
            type_groups: request.allowed_type_groups.clone(),
            initial_location: request
                .initial_directory
                .as_deref()
                .and_then(initial_location),
            suggested_name,
            title: request.title.clone(),
            accept_label: request.confirm_button_text.clone(),
            window: request.window.clone(),
        }
    }

    /// The filters a picker lists, the first one being the selected one.
    ///
    /// With more than one group the flattened `type_filter` goes first under `all_label`, so
    /// the picker starts by matching every allowed type. No filters are listed when anything is
    /// accepted.
    #[must_use]
    pub fn display_filters(&self, all_label: &str) -> Vec<DisplayFilter> {
        if self.type_filter.primary_type().is_none() {
            return Vec::new();
        }

        let groups = self.type_groups.iter().map(DisplayFilter::from);
        if self.type_groups.len() < 2 {
            return groups.collect();
        }

        let all = DisplayFilter {
            label: all_label.to_owned(),
            mime_types: self.type_filter.mime_types.clone(),
            patterns: self.type_filter.patterns.clone(),
        };
        std::iter::once(all).chain(groups).collect()
    }
}

/// Interprets a directory hint given either as an absolute path or as a `file://` URI.
fn initial_location(hint: &str) -> Option<PathBuf> {
    if hint.is_empty() {
        return None;
    }

    if let Ok(url) = Url::parse(hint) {
        if url.scheme() == "file" {
            return url.to_file_path().ok();
        }
        glib::g_debug!(LOG_DOMAIN, "Cannot start a picker at {hint}");
        return None;
    }

    let path = Path::new(hint);
    if path.is_absolute() {
        Some(path.to_path_buf())
    } else {
        glib::g_debug!(LOG_DOMAIN, "Ignoring relative initial directory {hint}");
        None
    }
}

/// A host able to present system pickers.
pub trait Platform {
    /// Presents a picker without waiting for it. Its outcome must later be delivered exactly
    /// once under `token`.
    fn start_picker(&self, token: PickerToken, options: PickerOptions)
        -> Result<(), FileSelectorError>;

    /// Closes the picker started under `token`. The platform still reports its outcome, as a
    /// cancellation.
    fn dismiss(&self, token: PickerToken);
}

pub struct PickerLauncher<P> {
    platform: P,
    next_token: Cell<u64>,
}

impl<P: Platform> PickerLauncher<P> {
    pub fn new(platform: P) -> Self {
        Self {
            platform,
            next_token: Cell::new(1),
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn launch(&self, request: &SelectionRequest) -> Result<PickerToken, FileSelectorError> {
        let token = PickerToken(self.next_token.get());
        self.next_token.set(token.0 + 1);

        let options = PickerOptions::from_request(request);
        glib::g_debug!(LOG_DOMAIN, "Launching {token:?}: {options:#?}");
        self.platform.start_picker(token, options)?;
        Ok(token)
    }

    pub fn dismiss(&self, token: PickerToken) {
        glib::g_debug!(LOG_DOMAIN, "Dismissing {token:?}");
        self.platform.dismiss(token);
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use std::cell::RefCell;

    /// Platform recording what it was asked to present.
    #[derive(Debug, Default)]
    pub(crate) struct FakePlatform {
        pub launched: RefCell<Vec<(PickerToken, PickerOptions)>>,
        pub dismissed: RefCell<Vec<PickerToken>>,
        pub fail: Cell<bool>,
    }

    impl Platform for FakePlatform {
        fn start_picker(
            &self,
            token: PickerToken,
            options: PickerOptions,
        ) -> Result<(), FileSelectorError> {
            if self.fail.get() {
                return Err(FileSelectorError::Platform(String::from("no display")));
            }
            self.launched.borrow_mut().push((token, options));
            Ok(())
        }

        fn dismiss(&self, token: PickerToken) {
            self.dismissed.borrow_mut().push(token);
        }
    }

    #[test]
    fn test_actions_per_kind() {
        let launcher = PickerLauncher::new(FakePlatform::default());
        launcher
            .launch(&SelectionRequest::open_file(true, Vec::new()))
            .unwrap();
        launcher.launch(&SelectionRequest::directory(None)).unwrap();
        launcher
            .launch(&SelectionRequest::save_file(None, Some(String::from("a.txt"))))
            .unwrap();

        let launched = launcher.platform().launched.borrow();
        let actions: Vec<PickerAction> = launched.iter().map(|(_, o)| o.action).collect();
        assert_eq!(
            actions,
            vec![
                PickerAction::GetContent,
                PickerAction::OpenDocumentTree,
                PickerAction::CreateDocument
            ]
        );
        assert!(launched[0].1.allow_multiple);
        assert_eq!(launched[2].1.suggested_name.as_deref(), Some("a.txt"));
    }

    #[test]
    fn test_tokens_are_distinct() {
        let launcher = PickerLauncher::new(FakePlatform::default());
        let first = launcher.launch(&SelectionRequest::directory(None)).unwrap();
        let second = launcher.launch(&SelectionRequest::directory(None)).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_type_filter_flattens_groups() {
        let groups = vec![
            TypeGroup::new("Images")
                .extensions(["png", "jpg"])
                .mime_types(["image/png"]),
            TypeGroup::new("Also PNG")
                .extensions(["png"])
                .mime_types(["image/png", "image/webp"]),
        ];
        let filter = TypeFilter::from_groups(&groups);

        assert_eq!(filter.mime_types, vec!["image/png", "image/webp"]);
        assert_eq!(filter.patterns, vec!["*.png", "*.jpg"]);
        assert_eq!(filter.primary_type(), Some("*/*"));
    }

    #[test]
    fn test_type_filter_primary_type() {
        assert_eq!(TypeFilter::default().primary_type(), None);

        let groups = [TypeGroup::new("Text").mime_types(["text/plain"])];
        let single = TypeFilter::from_groups(&groups);
        assert_eq!(single.primary_type(), Some("text/plain"));
    }

    #[test]
    fn test_display_filters_lead_with_all_types() {
        let groups = vec![
            TypeGroup::new("Images").mime_types(["image/png"]),
            TypeGroup::new("Text").extensions(["txt"]),
        ];
        let options = PickerOptions::from_request(&SelectionRequest::open_file(false, groups));
        let filters = options.display_filters("All");

        let labels: Vec<&str> = filters.iter().map(|f| f.label.as_str()).collect();
        assert_eq!(labels, vec!["All", "Images", "Text"]);
        assert_eq!(filters[0].mime_types, vec!["image/png"]);
        assert_eq!(filters[0].patterns, vec!["*.txt"]);
    }

    #[test]
    fn test_display_filters_single_group_and_empty() {
        let groups = vec![TypeGroup::new("Text").mime_types(["text/plain"])];
        let options = PickerOptions::from_request(&SelectionRequest::open_file(false, groups));
        let filters = options.display_filters("All");
        assert_eq!(filters.len(), 1);
        assert_eq!(filters[0].label, "Text");

        // Groups with neither types nor extensions accept anything.
        let groups = vec![TypeGroup::new("Anything")];
        let options = PickerOptions::from_request(&SelectionRequest::open_file(false, groups));
        assert!(options.display_filters("All").is_empty());
    }

    #[test]
    fn test_window_options_reach_the_platform() {
        let window = WindowOptions {
            parent: None,
            modal: false,
        };
        let launcher = PickerLauncher::new(FakePlatform::default());
        launcher
            .launch(&SelectionRequest::directory(None).window(window.clone()))
            .unwrap();

        let launched = launcher.platform().launched.borrow();
        assert_eq!(launched[0].1.window, window);
    }

    #[test]
    fn test_suggested_name_only_for_save() {
        let mut request = SelectionRequest::directory(None);
        request.suggested_name = Some(String::from("ignored"));
        assert_eq!(PickerOptions::from_request(&request).suggested_name, None);
    }

    #[test]
    fn test_initial_location() {
        assert_eq!(initial_location(""), None);
        assert_eq!(initial_location("/home/user"), Some(PathBuf::from("/home/user")));
        assert_eq!(
            initial_location("file:///home/user/Documents"),
            Some(PathBuf::from("/home/user/Documents"))
        );
        assert_eq!(initial_location("content://tree/primary%3A"), None);
        assert_eq!(initial_location("relative/dir"), None);
    }

    #[test]
    fn test_launch_failure_is_reported() {
        let platform = FakePlatform::default();
        platform.fail.set(true);
        let launcher = PickerLauncher::new(platform);
        assert!(matches!(
            launcher.launch(&SelectionRequest::directory(None)),
            Err(FileSelectorError::Platform(_))
        ));
    }
}
