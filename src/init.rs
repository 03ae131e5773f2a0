/*
 * Copyright (C) 2025 The Phosh Developers
 *
 * SPDX-License-Identifier: GPL-3.0-or-later
 *
 * Author: Arun Mani J <arun.mani@tether.to>
 */

use std::env;
use std::sync::atomic::{AtomicBool, Ordering};

use gettextrs::{bind_textdomain_codeset, bindtextdomain};
use gtk::glib;

use crate::lib_config::{GETTEXT_PACKAGE, LOCALE_DIR};

/*
 * The entry-point to the backend library.
 *
 * The `init` function initializes the library. It disables portals, initializes Adwaita and sets
 * up the `gettext` domain. Only the first call has an effect.
 */

const LOG_DOMAIN: &str = "xdpp-fs-init";

static INITIALIZED: AtomicBool = AtomicBool::new(false);

pub fn init() -> Result<(), glib::BoolError> {
    if INITIALIZED.load(Ordering::Acquire) {
        return Ok(());
    }

    gtk::disable_portals();

    unsafe {
        env::set_var("ADW_DISABLE_PORTAL", "1");
    }

    adw::init()?;

    if let Err(error) = bindtextdomain(GETTEXT_PACKAGE, LOCALE_DIR) {
        glib::g_warning!(LOG_DOMAIN, "Unable to bind text domain: {error}");
    }
    if let Err(error) = bind_textdomain_codeset(GETTEXT_PACKAGE, "UTF-8") {
        glib::g_warning!(LOG_DOMAIN, "Unable to set text domain codeset: {error}");
    }

    INITIALIZED.store(true, Ordering::Release);
    Ok(())
}
