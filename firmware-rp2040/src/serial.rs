//! Byte sources for the serial command link.
//!
//! # Pins
//!
//! Uses UART1 by default:
//! - GPIO 8: TX
//! - GPIO 9: RX
//! - GPIO 10: CTS (optional, with `uart-flow-control` feature)
//! - GPIO 11: RTS (optional, with `uart-flow-control` feature)

use embassy_rp::uart::{Async, Error as UartError, UartRx};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Receiver;
use glasses_core::{ByteSource, InputError};

/// Capacity of the byte queue between the UART and control tasks.
pub const BYTE_QUEUE_DEPTH: usize = 64;

/// Convert UART errors to [`InputError`].
///
/// This is a helper function instead of a `From` impl to avoid orphan rule issues
/// (both `UartError` and `InputError` are defined in external crates).
#[inline]
fn uart_error_to_input_error(e: UartError) -> InputError {
    match e {
        UartError::Framing => InputError::Framing,
        UartError::Overrun => InputError::Overrun,
        UartError::Parity => InputError::Parity,
        UartError::Break => InputError::Break,
        _ => InputError::Io,
    }
}

/// Reads the command link straight from the UART receiver.
pub struct UartByteSource<'d> {
    rx: UartRx<'d, Async>,
}

impl<'d> UartByteSource<'d> {
    #[must_use]
    pub fn new(rx: UartRx<'d, Async>) -> Self {
        Self { rx }
    }

    /// Wait for a single byte.
    pub async fn read_byte(&mut self) -> Result<u8, InputError> {
        let mut byte = [0u8; 1];
        self.rx
            .read(&mut byte)
            .await
            .map_err(uart_error_to_input_error)?;
        Ok(byte[0])
    }
}

impl ByteSource for UartByteSource<'_> {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, InputError> {
        // The DMA read only returns once the whole buffer is filled, which
        // would stall a short frame. Read one byte at a time instead.
        match buf.first_mut() {
            Some(slot) => {
                *slot = self.read_byte().await?;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    fn is_connected(&self) -> bool {
        // UART is always "connected" if we have the peripheral
        true
    }
}

/// Reads bytes queued by another task.
///
/// Waits for the first byte, then takes whatever else is already queued
/// without waiting.
pub struct ChannelByteSource<'ch> {
    rx: Receiver<'ch, CriticalSectionRawMutex, u8, BYTE_QUEUE_DEPTH>,
}

impl<'ch> ChannelByteSource<'ch> {
    #[must_use]
    pub fn new(rx: Receiver<'ch, CriticalSectionRawMutex, u8, BYTE_QUEUE_DEPTH>) -> Self {
        Self { rx }
    }
}

impl ByteSource for ChannelByteSource<'_> {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, InputError> {
        let Some((first, rest)) = buf.split_first_mut() else {
            return Ok(0);
        };
        *first = self.rx.receive().await;

        let mut n = 1;
        for slot in rest {
            match self.rx.try_receive() {
                Ok(byte) => {
                    *slot = byte;
                    n += 1;
                }
                Err(_) => break,
            }
        }
        Ok(n)
    }

    fn is_connected(&self) -> bool {
        true
    }
}
