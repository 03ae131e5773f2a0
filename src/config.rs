/*
 * Copyright (C) 2025 The Phosh Developers
 *
 * SPDX-License-Identifier: GPL-3.0-or-later
 *
 * Author: Arun Mani J <arun.mani@tether.to>
 */

use std::env;
use std::path::{Path, PathBuf};

use gtk::glib;

use crate::lib_config::{APP_DIR, CACHE_FOLDER};

/*
 * Runtime configuration of a file selector session: where the private cache lives and which
 * storage roots document providers map their ids onto.
 */

#[derive(Clone, Debug)]
pub struct Config {
    /// Application-private storage. The cache folder is created beneath it.
    pub data_dir: PathBuf,
    pub cache_folder: String,
    /// Root of the primary external storage volume.
    pub external_storage: PathBuf,
    /// Further storage roots, searched in order when the primary volume lacks a document.
    pub secondary_storage: Vec<PathBuf>,
}

impl Config {
    /// Builds the configuration of the running user session.
    ///
    /// `EXTERNAL_STORAGE_ROOT` overrides the primary volume, which defaults to the home
    /// directory. `SECONDARY_STORAGE` and `EXTERNAL_STORAGE` name the secondary roots.
    #[must_use]
    pub fn from_env() -> Self {
        let external_storage = env::var_os("EXTERNAL_STORAGE_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(glib::home_dir);

        let secondary_storage = ["SECONDARY_STORAGE", "EXTERNAL_STORAGE"]
            .iter()
            .filter_map(env::var_os)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .collect();

        Self {
            data_dir: glib::user_data_dir().join(APP_DIR),
            cache_folder: String::from(CACHE_FOLDER),
            external_storage,
            secondary_storage,
        }
    }

    /// Configuration rooted at `data_dir` with no secondary storage.
    #[must_use]
    pub fn with_data_dir(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            cache_folder: String::from(CACHE_FOLDER),
            external_storage: glib::home_dir(),
            secondary_storage: Vec::new(),
        }
    }

    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.data_dir.join(&self.cache_folder)
    }
}
