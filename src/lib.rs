/*
 * Copyright (C) 2025 The Phosh Developers
 *
 * SPDX-License-Identifier: GPL-3.0-or-later
 *
 * Author: Arun Mani J <arun.mani@tether.to>
 */

mod config;
pub mod dispatcher;
mod error;
mod init;
pub mod launcher;
mod lib_config;
mod message;
pub mod platforms;
mod request;
mod requester;
pub mod requesters;
pub mod resolver;
pub mod session;
pub mod tracker;
pub mod utils;

pub use config::Config;
pub use error::FileSelectorError;
pub use init::init;
pub use message::Message;
pub use request::{
    ParentWindow, Reply, Request, Selection, SelectionKind, SelectionRequest, TypeGroup,
    WindowOptions,
};
pub use requester::Requester;
pub use session::Session;
