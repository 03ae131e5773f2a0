/*
 * Copyright (C) 2025 The Phosh Developers
 *
 * SPDX-License-Identifier: GPL-3.0-or-later
 *
 * Author: Arun Mani J <arun.mani@tether.to>
 */

use std::cell::RefCell;
use std::rc::Rc;

use futures_util::future::pending;
use gtk::glib;
use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use xdpp_file_selector::platforms::PfsPlatform;
use xdpp_file_selector::requesters;
use xdpp_file_selector::resolver::GioContentProvider;
use xdpp_file_selector::{Config, Message, Requester, Session};

mod bin_config;

/*
 * The entry-point to the file selector backend.
 *
 * The backend contains two worlds joined by a channel of messages. In the ASHPD world, the
 * requester turns portal calls into requests, each with a `reply` channel through which exactly
 * one outcome comes back. The GLib world owns the file selector session. It admits one request
 * at a time, opens a Phosh File Selector for it and, once the selector posts its result on the
 * same channel, resolves the picked URIs to paths and replies. Closing a portal request dismisses
 * its selector, which then reports a cancellation.
 */

const LOG_DOMAIN: &str = "xdpp-fs";

fn main() -> glib::ExitCode {
    if let Err(error) = xdpp_file_selector::init() {
        glib::g_critical!(LOG_DOMAIN, "Initialization failed: {error}");
        return glib::ExitCode::FAILURE;
    }

    let main_loop = glib::MainLoop::new(None, false);

    let (sender, mut receiver) = mpsc::channel(bin_config::MPSC_BUFFER);

    let runtime = match Runtime::new() {
        Ok(runtime) => runtime,
        Err(error) => {
            glib::g_critical!(LOG_DOMAIN, "Unable to start tokio runtime: {error}");
            return glib::ExitCode::FAILURE;
        }
    };
    runtime.spawn(glib::clone!(
        #[strong]
        sender,
        #[strong]
        main_loop,
        async move {
            let result = ashpd_main(sender).await;
            if let Err(error) = result {
                glib::g_critical!(LOG_DOMAIN, "ashpd server failed: {error}");
                main_loop.quit();
            }
        }
    ));

    let session = Rc::new(RefCell::new(Session::new(
        Config::from_env(),
        PfsPlatform::new(sender.clone()),
        GioContentProvider,
    )));
    session.borrow_mut().handle(Message::Attach);

    glib::spawn_future_local(glib::clone!(
        #[strong]
        session,
        async move {
            while let Some(message) = receiver.recv().await {
                glib::g_debug!(LOG_DOMAIN, "New message: {message:#?}");
                session.borrow_mut().handle(message);
            }
        }
    ));

    glib::g_message!(LOG_DOMAIN, "Running main loop");

    main_loop.run();

    session.borrow_mut().handle(Message::Detach);
    glib::ExitCode::SUCCESS
}

async fn ashpd_main(sender: mpsc::Sender<Message>) -> ashpd::Result<()> {
    let mut builder = ashpd::backend::Builder::new(bin_config::DBUS_NAME)?;

    builder = if bin_config::FILE_CHOOSER {
        glib::g_debug!(LOG_DOMAIN, "Adding interface: FileChooser");
        builder.file_chooser(requesters::FileChooser::new(sender))
    } else {
        builder
    };

    builder.build().await?;

    glib::g_message!(
        LOG_DOMAIN,
        "Running ashpd loop under {}",
        bin_config::DBUS_NAME
    );

    loop {
        pending::<()>().await;
    }
}
