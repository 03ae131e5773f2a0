/*
 * Copyright (C) 2025 The Phosh Developers
 *
 * SPDX-License-Identifier: GPL-3.0-or-later
 *
 * Author: Arun Mani J <arun.mani@tether.to>
 */

use gettextrs::gettext;

/*
 * Utility functions that are used in more than one place.
 */

// Thanks to Pika Backup.
// https://gitlab.gnome.org/World/pika-backup/-/blob/81a9b0eefbd5099296b1655cc7a7eb8849153795/src/prelude.rs#L15
pub fn gettextf(format: &str, args: &[&str]) -> String {
    let mut s = gettext(format);

    for arg in args {
        s = s.replacen("{}", arg, 1);
    }
    s
}
