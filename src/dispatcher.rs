/*
 * Copyright (C) 2025 The Phosh Developers
 *
 * SPDX-License-Identifier: GPL-3.0-or-later
 *
 * Author: Arun Mani J <arun.mani@tether.to>
 */

use ashpd::url::Url;
use gtk::glib;

use crate::launcher::PickerToken;
use crate::request::{Selection, SelectionKind};
use crate::resolver::{ContentProvider, PathResolver};
use crate::tracker::PendingOperationTracker;
use crate::FileSelectorError;

/*
 * `ResultDispatcher` turns what a platform picker reports into the reply of the pending
 * operation. It is the only code completing operations in the tracker.
 */

const LOG_DOMAIN: &str = "xdpp-fs-dispatcher";

/// References a picker hands back: a single `data` reference, or a `clip` of several when
/// more than one item was chosen.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlatformPayload {
    pub data: Option<Url>,
    pub clip: Vec<Url>,
}

impl PlatformPayload {
    /// Payload for the given references, put in `data` or `clip` by count.
    #[must_use]
    pub fn from_references(mut references: Vec<Url>) -> Self {
        match references.len() {
            0 => Self::default(),
            1 => Self {
                data: references.pop(),
                clip: Vec::new(),
            },
            _ => Self {
                data: None,
                clip: references,
            },
        }
    }

    #[must_use]
    pub fn references(&self) -> Vec<Url> {
        if self.clip.is_empty() {
            self.data.iter().cloned().collect()
        } else {
            self.clip.clone()
        }
    }
}

/// How a platform picker ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlatformOutcome {
    Selected(PlatformPayload),
    /// The user backed out.
    Cancelled,
    Failed(String),
}

pub struct ResultDispatcher<C> {
    resolver: PathResolver<C>,
}

impl<C: ContentProvider> ResultDispatcher<C> {
    pub fn new(resolver: PathResolver<C>) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &PathResolver<C> {
        &self.resolver
    }

    pub fn on_platform_result(
        &self,
        tracker: &mut PendingOperationTracker,
        token: PickerToken,
        outcome: PlatformOutcome,
    ) {
        if !tracker.is_awaiting(token) {
            glib::g_debug!(LOG_DOMAIN, "Ignoring result for unknown {token:?}");
            return;
        }
        let Some(kind) = tracker.active().map(|active| active.request.kind) else {
            return;
        };

        let result = match outcome {
            PlatformOutcome::Cancelled => Ok(Selection::cancelled(kind)),
            PlatformOutcome::Failed(message) => {
                glib::g_warning!(LOG_DOMAIN, "Picker {token:?} failed: {message}");
                Err(FileSelectorError::Platform(message))
            }
            PlatformOutcome::Selected(payload) => Ok(self.selection(kind, &payload.references())),
        };

        tracker.complete(result);
    }

    fn selection(&self, kind: SelectionKind, references: &[Url]) -> Selection {
        if references.is_empty() {
            return Selection::cancelled(kind);
        }

        match kind {
            SelectionKind::OpenMultipleFiles => Selection::Paths(
                self.resolver
                    .resolve_many(references)
                    .into_iter()
                    .map(|resolved| resolved.local_path)
                    .collect(),
            ),
            SelectionKind::OpenFile => self
                .resolver
                .resolve(&references[0])
                .map_or(Selection::None, |resolved| {
                    Selection::Path(resolved.local_path)
                }),
            SelectionKind::OpenDirectory | SelectionKind::SaveFile => self
                .resolver
                .resolve_location(&references[0])
                .map_or(Selection::None, |resolved| {
                    Selection::Path(resolved.local_path)
                }),
        }
    }
}
