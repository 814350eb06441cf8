//! Serial byte source trait and error types.

use core::future::Future;

use crate::control::{ControlPlane, SceneHost};

/// Error type for serial input operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputError {
    /// Communication I/O error.
    Io,
    /// Bytes arrived faster than they were read.
    Overrun,
    /// UART framing error.
    Framing,
    /// UART parity error.
    Parity,
    /// Line break detected.
    Break,
}

impl core::fmt::Display for InputError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Io => write!(f, "I/O error"),
            Self::Overrun => write!(f, "overrun"),
            Self::Framing => write!(f, "framing error"),
            Self::Parity => write!(f, "parity error"),
            Self::Break => write!(f, "break"),
        }
    }
}

/// Async source of command link bytes.
///
/// This trait abstracts where command bytes come from (UART, BLE UART, USB
/// CDC), allowing different transports to feed the same control plane.
///
/// # `no_std` Compatibility
///
/// All implementations must be `#![no_std]` compatible with no heap allocation.
pub trait ByteSource {
    /// Wait for at least one byte and read up to `buf.len()` bytes.
    ///
    /// Returns the number of bytes read.
    fn read(&mut self, buf: &mut [u8]) -> impl Future<Output = Result<usize, InputError>>;

    /// Check if the source is connected/ready.
    fn is_connected(&self) -> bool;
}

/// Read one chunk from `source` and feed it into `plane`.
///
/// `clock` is read once the chunk has arrived, so the bytes are stamped
/// with their arrival time rather than the time the read started.
///
/// Parse errors are logged and the rest of the chunk is discarded; they do
/// not end the session. Returns the number of bytes read.
///
/// # Errors
///
/// Returns the error reported by `source`.
pub async fn pump<S, H, C>(
    source: &mut S,
    plane: &mut ControlPlane<H>,
    buf: &mut [u8],
    mut clock: C,
) -> Result<usize, InputError>
where
    S: ByteSource,
    H: SceneHost,
    C: FnMut() -> u32,
{
    let n = source.read(buf).await?;
    if let Err(err) = plane.receive(&buf[..n], clock()) {
        debug!("dropped chunk after {}", err);
    }
    Ok(n)
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::control::{Inputs, DEFAULT_CONFIG};
    use command_proto::{Encode, Rgb};
    use core::cell::Cell;
    use core::pin::Pin;
    use core::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};
    use std::vec::Vec;

    struct MockSource {
        chunks: Vec<Result<Vec<u8>, InputError>>,
    }

    impl ByteSource for MockSource {
        fn read(&mut self, buf: &mut [u8]) -> impl Future<Output = Result<usize, InputError>> {
            let result = if self.chunks.is_empty() {
                Err(InputError::Io)
            } else {
                self.chunks.remove(0).map(|chunk| {
                    buf[..chunk.len()].copy_from_slice(&chunk);
                    chunk.len()
                })
            };
            core::future::ready(result)
        }

        fn is_connected(&self) -> bool {
            !self.chunks.is_empty()
        }
    }

    #[derive(Default)]
    struct ColorHost(Vec<Rgb>);

    impl SceneHost for ColorHost {
        fn activate(&mut self, _index: u8) {}

        fn update(&mut self, _dt_ms: u32, _inputs: &Inputs<'_>) {}

        fn received_color(&mut self, color: Rgb) {
            self.0.push(color);
        }
    }

    // Helper to run a future to completion (simple blocking executor)
    fn block_on<F: Future>(mut f: F) -> F::Output {
        fn noop_raw_waker() -> RawWaker {
            fn noop(_: *const ()) {}
            fn clone(_: *const ()) -> RawWaker {
                noop_raw_waker()
            }
            static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, noop, noop, noop);
            RawWaker::new(core::ptr::null(), &VTABLE)
        }

        let waker = unsafe { Waker::from_raw(noop_raw_waker()) };
        let mut cx = Context::from_waker(&waker);

        // SAFETY: We don't move f after pinning
        let mut f = unsafe { Pin::new_unchecked(&mut f) };

        match f.as_mut().poll(&mut cx) {
            Poll::Ready(result) => result,
            Poll::Pending => panic!("Mock future returned Pending unexpectedly"),
        }
    }

    #[test]
    fn test_pump_feeds_plane() {
        let frame = Rgb::new(4, 5, 6).encode_to_vec::<8>().unwrap();
        let mut source = MockSource {
            chunks: Vec::from([Ok(frame[..3].to_vec()), Ok(frame[3..].to_vec())]),
        };
        let mut plane = ControlPlane::new(DEFAULT_CONFIG, ColorHost::default());
        let mut buf = [0u8; 16];

        assert_eq!(block_on(pump(&mut source, &mut plane, &mut buf, || 0)), Ok(3));
        assert!(plane.host().0.is_empty());
        assert_eq!(block_on(pump(&mut source, &mut plane, &mut buf, || 1)), Ok(3));
        assert_eq!(plane.host().0, Vec::from([Rgb::new(4, 5, 6)]));
    }

    #[test]
    fn test_pump_survives_parse_error() {
        let mut source = MockSource {
            chunks: Vec::from([Ok(b"?!C".to_vec())]),
        };
        let mut plane = ControlPlane::new(DEFAULT_CONFIG, ColorHost::default());
        let mut buf = [0u8; 16];
        assert_eq!(block_on(pump(&mut source, &mut plane, &mut buf, || 0)), Ok(3));
        assert!(plane.parser().is_idle());
    }

    /// Time moves on while the read is pending.
    struct SlowSource<'a> {
        now: &'a Cell<u32>,
        arrives_at: u32,
        chunk: &'static [u8],
    }

    impl ByteSource for SlowSource<'_> {
        fn read(&mut self, buf: &mut [u8]) -> impl Future<Output = Result<usize, InputError>> {
            self.now.set(self.arrives_at);
            buf[..self.chunk.len()].copy_from_slice(self.chunk);
            core::future::ready(Ok(self.chunk.len()))
        }

        fn is_connected(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_pump_stamps_bytes_on_arrival() {
        let now = Cell::new(0);
        let mut source = SlowSource {
            now: &now,
            arrives_at: 900,
            chunk: b"\x02",
        };
        let mut plane = ControlPlane::new(DEFAULT_CONFIG, ColorHost::default());
        plane.start(0, 0);
        plane.receive(b"!C\x01", 0).unwrap();
        let mut buf = [0u8; 16];

        assert_eq!(block_on(pump(&mut source, &mut plane, &mut buf, || now.get())), Ok(1));
        plane.tick(1500, None);
        assert!(plane.parser().is_busy());
    }

    #[test]
    fn test_pump_forwards_source_error() {
        let mut source = MockSource {
            chunks: Vec::from([Err(InputError::Framing)]),
        };
        let mut plane = ControlPlane::new(DEFAULT_CONFIG, ColorHost::default());
        let mut buf = [0u8; 16];
        assert!(source.is_connected());
        assert_eq!(
            block_on(pump(&mut source, &mut plane, &mut buf, || 0)),
            Err(InputError::Framing)
        );
        assert!(!source.is_connected());
    }
}
