/*
 * Copyright (C) 2025 The Phosh Developers
 *
 * SPDX-License-Identifier: GPL-3.0-or-later
 *
 * Author: Arun Mani J <arun.mani@tether.to>
 */

/*
 * Build-time configuration of the backend server binary.
 */

pub const DBUS_NAME: &str = match option_env!("XDPP_DBUS_NAME") {
    Some(name) => name,
    None => "org.freedesktop.impl.portal.desktop.phosh.FileSelector",
};

pub const MPSC_BUFFER: usize = 32;

pub const FILE_CHOOSER: bool = true;
