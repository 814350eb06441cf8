//! Client side of a wireless HID gamepad.
//!
//! The radio stack is reached through the [`GattClient`] trait. The client
//! discovers the HID information and report characteristics, toggles report
//! notifications and keeps a copy of the last report received.

use core::fmt;

use crate::gamepad::{HidGamepadReport, HID_REPORT_SIZE};

/// Connection handle assigned by the radio stack.
pub type ConnHandle = u16;

/// Human Interface Device service.
pub const UUID16_SVC_HUMAN_INTERFACE_DEVICE: u16 = 0x1812;
/// HID Information characteristic.
pub const UUID16_CHR_HID_INFORMATION: u16 = 0x2A4A;
/// Report characteristic.
pub const UUID16_CHR_REPORT: u16 = 0x2A4D;

/// Size of the HID Information characteristic value.
pub const HID_INFO_SIZE: usize = 4;

/// Errors reported by a [`GattClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GattError {
    /// The connection is gone.
    Disconnected,
    /// The peer rejected the operation.
    Rejected,
    /// The operation did not complete in time.
    Timeout,
}

impl fmt::Display for GattError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Rejected => write!(f, "rejected by peer"),
            Self::Timeout => write!(f, "timeout"),
        }
    }
}

/// Error type for HID client operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HidClientError {
    /// The peer has no HID Information characteristic.
    MissingHidInformation,
    /// The peer has no Report characteristic.
    MissingReport,
    /// No successful discovery yet.
    NotDiscovered,
    /// The transport failed.
    Gatt(GattError),
    /// A read returned fewer bytes than expected.
    ShortRead(usize),
}

impl From<GattError> for HidClientError {
    fn from(err: GattError) -> Self {
        Self::Gatt(err)
    }
}

impl fmt::Display for HidClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingHidInformation => write!(f, "HID information characteristic not found"),
            Self::MissingReport => write!(f, "report characteristic not found"),
            Self::NotDiscovered => write!(f, "gamepad not discovered"),
            Self::Gatt(e) => write!(f, "GATT error: {e}"),
            Self::ShortRead(n) => write!(f, "short read ({n} bytes)"),
        }
    }
}

/// GATT client operations the HID bridge needs from the radio stack.
pub trait GattClient {
    /// Stack-specific reference to a discovered characteristic.
    type Characteristic: Copy;

    /// Look up a characteristic by 16-bit UUID inside a service.
    ///
    /// Returns `Ok(None)` when the peer does not expose it.
    fn discover_characteristic(
        &mut self,
        conn: ConnHandle,
        service: u16,
        uuid: u16,
    ) -> Result<Option<Self::Characteristic>, GattError>;

    /// Read a characteristic value into `buf`, returning the length read.
    fn read(
        &mut self,
        conn: ConnHandle,
        characteristic: Self::Characteristic,
        buf: &mut [u8],
    ) -> Result<usize, GattError>;

    /// Enable or disable notifications on a characteristic.
    fn set_notify(
        &mut self,
        conn: ConnHandle,
        characteristic: Self::Characteristic,
        enabled: bool,
    ) -> Result<(), GattError>;
}

/// Contents of the HID Information characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HidInfo {
    /// HID specification release, binary-coded decimal.
    pub bcd_hid: u16,
    pub country_code: u8,
    pub flags: u8,
}

impl HidInfo {
    #[must_use]
    pub const fn from_bytes(raw: [u8; HID_INFO_SIZE]) -> Self {
        Self {
            bcd_hid: u16::from_le_bytes([raw[0], raw[1]]),
            country_code: raw[2],
            flags: raw[3],
        }
    }
}

/// Receives every report notification after it is stored.
pub trait ReportListener {
    fn on_report(&mut self, report: &HidGamepadReport);
}

impl<F: FnMut(&HidGamepadReport)> ReportListener for F {
    fn on_report(&mut self, report: &HidGamepadReport) {
        self(report)
    }
}

/// Listener that ignores reports.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoListener;

impl ReportListener for NoListener {
    fn on_report(&mut self, _report: &HidGamepadReport) {}
}

#[derive(Debug, Clone, Copy)]
struct Handles<C> {
    conn: ConnHandle,
    info: C,
    report: C,
}

/// HID gamepad bridge over a [`GattClient`].
pub struct HidGamepadClient<G: GattClient, L = NoListener> {
    gatt: G,
    listener: L,
    handles: Option<Handles<G::Characteristic>>,
    last_report: HidGamepadReport,
}

impl<G: GattClient> HidGamepadClient<G, NoListener> {
    #[must_use]
    pub fn new(gatt: G) -> Self {
        Self::with_listener(gatt, NoListener)
    }
}

impl<G: GattClient, L: ReportListener> HidGamepadClient<G, L> {
    #[must_use]
    pub fn with_listener(gatt: G, listener: L) -> Self {
        Self {
            gatt,
            listener,
            handles: None,
            last_report: HidGamepadReport::default(),
        }
    }

    /// Find both HID characteristics on `conn`.
    ///
    /// On any failure the client is left undiscovered.
    ///
    /// # Errors
    ///
    /// Returns [`HidClientError::MissingHidInformation`] or
    /// [`HidClientError::MissingReport`] if the peer lacks a characteristic,
    /// or [`HidClientError::Gatt`] if the transport fails.
    pub fn discover(&mut self, conn: ConnHandle) -> Result<(), HidClientError> {
        self.handles = None;

        let info = self
            .gatt
            .discover_characteristic(
                conn,
                UUID16_SVC_HUMAN_INTERFACE_DEVICE,
                UUID16_CHR_HID_INFORMATION,
            )?
            .ok_or(HidClientError::MissingHidInformation)?;
        let report = self
            .gatt
            .discover_characteristic(conn, UUID16_SVC_HUMAN_INTERFACE_DEVICE, UUID16_CHR_REPORT)?
            .ok_or(HidClientError::MissingReport)?;

        debug!("HID gamepad discovered on connection {}", conn);
        self.handles = Some(Handles { conn, info, report });
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn is_discovered(&self) -> bool {
        self.handles.is_some()
    }

    /// `true` if the report characteristic is known.
    #[inline]
    #[must_use]
    pub fn gamepad_present(&self) -> bool {
        self.handles.is_some()
    }

    /// Connection the client is bound to.
    #[inline]
    #[must_use]
    pub fn connection(&self) -> Option<ConnHandle> {
        self.handles.as_ref().map(|h| h.conn)
    }

    fn handles(&self) -> Result<Handles<G::Characteristic>, HidClientError> {
        self.handles.ok_or(HidClientError::NotDiscovered)
    }

    /// Read the HID Information characteristic.
    ///
    /// # Errors
    ///
    /// Fails if the client is undiscovered, the read fails or returns fewer
    /// than four bytes.
    pub fn hid_info(&mut self) -> Result<HidInfo, HidClientError> {
        let h = self.handles()?;
        let mut raw = [0u8; HID_INFO_SIZE];
        let n = self.gatt.read(h.conn, h.info, &mut raw)?;
        if n != HID_INFO_SIZE {
            return Err(HidClientError::ShortRead(n));
        }
        Ok(HidInfo::from_bytes(raw))
    }

    /// Turn report notifications on.
    ///
    /// # Errors
    ///
    /// Fails if the client is undiscovered or the transport fails.
    pub fn enable(&mut self) -> Result<(), HidClientError> {
        let h = self.handles()?;
        self.gatt.set_notify(h.conn, h.report, true)?;
        Ok(())
    }

    /// Turn report notifications off.
    ///
    /// # Errors
    ///
    /// Fails if the client is undiscovered or the transport fails.
    pub fn disable(&mut self) -> Result<(), HidClientError> {
        let h = self.handles()?;
        self.gatt.set_notify(h.conn, h.report, false)?;
        Ok(())
    }

    /// Store a report notification and pass it to the listener.
    ///
    /// The stored report is replaced as a whole; short payloads zero-fill.
    pub fn handle_notification(&mut self, data: &[u8]) -> HidGamepadReport {
        if data.len() != HID_REPORT_SIZE {
            trace!("report notification of {} bytes", data.len());
        }
        self.last_report = HidGamepadReport::from_bytes(data);
        self.listener.on_report(&self.last_report);
        self.last_report
    }

    /// Copy of the last report received.
    #[inline]
    #[must_use]
    pub fn report(&self) -> HidGamepadReport {
        self.last_report
    }

    /// Forget the connection and its characteristics.
    pub fn disconnect(&mut self) {
        self.handles = None;
    }

    #[inline]
    pub fn gatt_mut(&mut self) -> &mut G {
        &mut self.gatt
    }

    #[inline]
    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }
}
