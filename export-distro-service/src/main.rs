/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

mod config;
mod listener;

use crate::config::Config;
use anyhow::Context;
use clap::Parser;
use export_distro::observability::events;
use export_distro::{DistroConfig, Event, ExportDistro, NotifyUpdate};
use registration_static_file::RegistrationStaticFile;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const COMPONENT: &str = "export_distro_service";
const NOTIFICATION_QUEUE_SIZE: usize = 64;

#[derive(Parser)]
#[command(version, about = "Forwards device events to registered export destinations")]
struct ServiceArgs {
    #[arg(short, long, value_name = "FILE")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = ServiceArgs::parse();
    let config = Config::load(&args.config)?;
    let distro_config = DistroConfig::from(&config.distro);
    info!(
        event = events::SERVICE_CONFIG_LOADED,
        component = COMPONENT,
        path = %args.config.display(),
        registry_file = config.registry.file_path.as_str(),
        event_queue_size = distro_config.event_queue_size,
        "loaded configuration"
    );

    let registry = Arc::new(RegistrationStaticFile::new(&config.registry.file_path));
    let shutdown = CancellationToken::new();

    let event_listener = TcpListener::bind(&config.ingress.event_listen_address)
        .await
        .with_context(|| {
            format!(
                "unable to listen for events on {}",
                config.ingress.event_listen_address
            )
        })?;
    let notification_listener = TcpListener::bind(&config.ingress.notification_listen_address)
        .await
        .with_context(|| {
            format!(
                "unable to listen for notifications on {}",
                config.ingress.notification_listen_address
            )
        })?;

    let (event_tx, event_rx) = mpsc::channel::<Arc<Event>>(distro_config.event_queue_size);
    let (notify_tx, notify_rx) = mpsc::channel::<NotifyUpdate>(NOTIFICATION_QUEUE_SIZE);
    let event_ingress =
        listener::serve::<Event, _>("events", event_listener, event_tx, shutdown.clone());
    let notification_ingress = listener::serve::<NotifyUpdate, _>(
        "notifications",
        notification_listener,
        notify_tx,
        shutdown.clone(),
    );

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(
                event = events::SERVICE_SHUTDOWN_SIGNAL,
                component = COMPONENT,
                err = %err,
                "unable to listen for ctrl-c"
            );
            return;
        }
        info!(
            event = events::SERVICE_SHUTDOWN_SIGNAL,
            component = COMPONENT,
            "received ctrl-c; shutting down"
        );
        signal_shutdown.cancel();
    });

    let distro = ExportDistro::new("export-distro", distro_config, registry);
    let result = distro.run(event_rx, notify_rx, shutdown.clone()).await;

    shutdown.cancel();
    let (events_joined, notifications_joined) = tokio::join!(event_ingress, notification_ingress);
    listener::report_exit("events", events_joined);
    listener::report_exit("notifications", notifications_joined);

    result.context("export distro stopped with an error")
}
