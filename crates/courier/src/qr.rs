// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Terminal rendering of login QR codes.

use qrcode::render::unicode::Dense1x2;
use qrcode::types::QrError;
use qrcode::{EcLevel, QrCode};
use tokio::sync::mpsc;
use tracing::{info, warn};

use courier_session::QrEvent;

/// Renders `code` with half-block characters, two modules per line.
pub fn render(code: &str) -> Result<String, QrError> {
    let qr = QrCode::with_error_correction_level(code.as_bytes(), EcLevel::L)?;
    Ok(qr
        .render::<Dense1x2>()
        .dark_color(Dense1x2::Light)
        .light_color(Dense1x2::Dark)
        .quiet_zone(true)
        .build())
}

/// Prints codes as they arrive and logs every other QR channel result.
pub fn spawn_printer(mut items: mpsc::Receiver<QrEvent>) {
    tokio::spawn(async move {
        while let Some(item) = items.recv().await {
            match item.code() {
                Some(code) => match render(code) {
                    Ok(rendered) => println!("{rendered}"),
                    Err(e) => warn!(error = %e, "failed to render QR code"),
                },
                None => info!(event = %item.event, "QR channel result"),
            }
        }
    });
}
