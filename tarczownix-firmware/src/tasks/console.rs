//! Serial console task
//!
//! Assembles CR/LF terminated lines from UART0, runs them as commands and
//! writes the reply text back. Replies are rendered into a fixed buffer
//! and sent with CRLF line endings.

use defmt::*;
use embassy_rp::uart::{BufferedUartRx, BufferedUartTx};
use embedded_io_async::{Read, Write};
use heapless::String;

use tarczownix_core::control::{
    execute, write_error, write_line_error, write_reply, Command, LineBuffer, Reply,
};

use crate::board::{Bus, Store, Sup};

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 32;

/// Rendered reply capacity (a full status report fits)
const REPLY_CAPACITY: usize = 768;

type ReplyText = String<REPLY_CAPACITY>;

/// Console task - reads commands and answers on the same UART
#[embassy_executor::task]
pub async fn console_task(
    mut rx: BufferedUartRx,
    mut tx: BufferedUartTx,
    sup: &'static Sup,
    bus: &'static Bus,
    mut store: Store,
) {
    info!("Console task started");

    let mut text = ReplyText::new();
    let _ = text.push_str("Tarczownix relay sequencer ready, type 'help'\n");
    send(&mut tx, &text).await;

    let mut lines: LineBuffer = LineBuffer::new();
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        let n = match rx.read(&mut buf).await {
            Ok(n) => n,
            Err(e) => {
                warn!("Console read error: {:?}", e);
                continue;
            }
        };

        for &byte in &buf[..n] {
            text.clear();
            match lines.feed(byte) {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    handle_line(&line, sup, bus, &mut store, &mut text).await;
                }
                Ok(None) => continue,
                Err(e) => {
                    debug!("Console line rejected: {:?}", e);
                    let _ = write_line_error(&mut text, &e);
                }
            }
            send(&mut tx, &text).await;
        }
    }
}

/// Parse and run one line, rendering the outcome into `text`
async fn handle_line(
    line: &str,
    sup: &'static Sup,
    bus: &'static Bus,
    store: &mut Store,
    text: &mut ReplyText,
) {
    let result = match Command::parse(line) {
        Ok(command) => {
            debug!("Console command: {:?}", command);
            execute(command, sup, bus, store).await
        }
        Err(e) => Err(e.into()),
    };

    let rendered = match &result {
        Ok(reply) => {
            log_reply(reply);
            write_reply(text, reply)
        }
        Err(e) => {
            warn!("Console command failed: {:?}", e);
            write_error(text, e)
        }
    };
    if rendered.is_err() {
        // Out of buffer space; keep what fits and mark the cut
        warn!("Console reply truncated");
        let _ = text.push_str("...\n");
    }
}

fn log_reply(reply: &Reply) {
    match reply {
        Reply::Started => info!("Sequence started"),
        Reply::Stopped => info!("Sequence stopped"),
        Reply::DelaySet { pair, delay } => info!(
            "Pair {} delay set to {}..{} ms",
            pair,
            delay.min_ms(),
            delay.max_ms()
        ),
        Reply::ErrorCleared(Some(record)) => info!("Error cleared: {:?}", record),
        Reply::Toggled { relay, on } => info!("Relay {} jogged {}", relay, on),
        _ => {}
    }
}

/// Write `text` with CRLF line endings
async fn send(tx: &mut BufferedUartTx, text: &str) {
    for (idx, line) in text.split('\n').enumerate() {
        if idx > 0 && tx.write_all(b"\r\n").await.is_err() {
            warn!("Console write failed");
            return;
        }
        if tx.write_all(line.as_bytes()).await.is_err() {
            warn!("Console write failed");
            return;
        }
    }
    let _ = tx.flush().await;
}
