/*
 * Copyright (C) 2025 The Phosh Developers
 *
 * SPDX-License-Identifier: GPL-3.0-or-later
 *
 * Author: Arun Mani J <arun.mani@tether.to>
 */

/*
 * Build-time configuration of the library. Every value can be overridden from the build
 * environment.
 */

pub const GETTEXT_PACKAGE: &str = match option_env!("GETTEXT_PACKAGE") {
    Some(package) => package,
    None => "xdg-desktop-portal-phosh",
};

pub const LOCALE_DIR: &str = match option_env!("LOCALE_DIR") {
    Some(dir) => dir,
    None => "/usr/share/locale",
};

/// Directory under the user data directory that holds this application's private storage.
pub const APP_DIR: &str = match option_env!("XDPP_APP_DIR") {
    Some(dir) => dir,
    None => "xdg-desktop-portal-phosh",
};

/// Name of the cache folder that materialized content is copied into.
pub const CACHE_FOLDER: &str = "file_selector";
