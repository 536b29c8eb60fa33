//! HID Connector: brings up the paired Control + Interrupt L2CAP
//! channels for a Bluetooth HID device and tears them down together,
//! generalized from one fixed channel pair to a table keyed by peer
//! address.

use bt_classic::l2cap::psm;
use bt_classic::BdAddr;

use crate::backend::{AvdtpBackend, HidReportInjector, L2capBackend, SdpPublisher};
use crate::context::Daemon;
use crate::error::DaemonError;
use crate::ids::L2capHandle;

/// Caps a single inbound HID interrupt report forwarded to the injector.
pub const MAX_HID_READ: usize = 4096;

/// Bring-up/teardown state of a HID device's channel pair (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HidState {
    ConnectingCtrl,
    ConnectingIntr,
    Connected,
    Closing,
}

/// A HID device's live L2CAP channel handles and bring-up state.
#[derive(Debug, Clone)]
pub struct HidDevice {
    pub addr: BdAddr,
    pub state: HidState,
    pub ctrl: Option<L2capHandle>,
    pub intr: Option<L2capHandle>,
    pub ctrl_watch: bool,
    pub intr_watch: bool,
}

impl HidDevice {
    fn new(addr: BdAddr) -> Self {
        Self {
            addr,
            state: HidState::ConnectingCtrl,
            ctrl: None,
            intr: None,
            ctrl_watch: false,
            intr_watch: false,
        }
    }
}

impl<B, L, P, R> Daemon<B, L, P, R>
where
    B: AvdtpBackend,
    L: L2capBackend,
    P: SdpPublisher,
    R: HidReportInjector,
{
    /// Starts bring-up of a HID device: connects the Control channel
    /// first, per §4.5's two-phase ordering. Rejects a device already
    /// tracked for `addr`.
    pub fn hid_connect(&mut self, addr: BdAddr) -> Result<(), DaemonError> {
        if self.hid.contains_key(&addr) {
            return Err(DaemonError::AlreadyPresent);
        }
        self.hid.insert(addr, HidDevice::new(addr));
        let handle = self.l2cap.connect(addr, psm::HID_CONTROL);
        if let Some(dev) = self.hid.get_mut(&addr) {
            dev.ctrl = Some(handle);
        }
        Ok(())
    }

    /// The Control channel connect attempt completed. On success, starts
    /// the Interrupt channel; on failure, drops the device entirely.
    pub fn on_control_connect_result(&mut self, addr: BdAddr, result: Result<(), DaemonError>) {
        let Some(dev) = self.hid.get_mut(&addr) else { return };
        match result {
            Err(_) => {
                self.hid.remove(&addr);
            }
            Ok(()) => {
                dev.ctrl_watch = true;
                dev.state = HidState::ConnectingIntr;
                let handle = self.l2cap.connect(addr, psm::HID_INTERRUPT);
                if let Some(dev) = self.hid.get_mut(&addr) {
                    dev.intr = Some(handle);
                }
            }
        }
    }

    /// The Interrupt channel connect attempt completed. On failure, tears
    /// down the Interrupt channel (if it reached L2CAP) then the already-up
    /// Control channel, in that order, and drops the device. On success the
    /// device is fully connected.
    pub fn on_interrupt_connect_result(&mut self, addr: BdAddr, result: Result<(), DaemonError>) {
        let Some(dev) = self.hid.get_mut(&addr) else { return };
        match result {
            Err(_) => {
                if dev.intr_watch {
                    if let Some(handle) = dev.intr {
                        self.l2cap.shutdown(handle);
                    }
                }
                if dev.ctrl_watch {
                    if let Some(handle) = dev.ctrl {
                        self.l2cap.shutdown(handle);
                    }
                }
                self.hid.remove(&addr);
            }
            Ok(()) => {
                dev.intr_watch = true;
                dev.state = HidState::Connected;
            }
        }
    }

    /// Forwards up to [`MAX_HID_READ`] bytes of an inbound interrupt
    /// report to the report injector.
    pub fn on_interrupt_readable(&mut self, addr: BdAddr, data: &[u8]) {
        if !self.hid.contains_key(&addr) {
            return;
        }
        let len = data.len().min(MAX_HID_READ);
        self.injector.inject(addr, &data[..len]);
    }

    /// The Interrupt channel closed (peer-initiated or I/O error). Shuts
    /// down the Control channel in turn and drops the device, unless
    /// teardown is already in progress from the other side.
    pub fn on_interrupt_closed(&mut self, addr: BdAddr) {
        let Some(dev) = self.hid.get_mut(&addr) else { return };
        if dev.state == HidState::Closing {
            return;
        }
        dev.state = HidState::Closing;
        if dev.ctrl_watch {
            if let Some(handle) = dev.ctrl {
                self.l2cap.shutdown(handle);
            }
        }
        self.hid.remove(&addr);
    }

    /// The Control channel closed. Shuts down the Interrupt channel in
    /// turn (if up) and drops the device, unless teardown is already in
    /// progress from the other side.
    pub fn on_control_closed(&mut self, addr: BdAddr) {
        let Some(dev) = self.hid.get_mut(&addr) else { return };
        if dev.state == HidState::Closing {
            return;
        }
        dev.state = HidState::Closing;
        if dev.intr_watch {
            if let Some(handle) = dev.intr {
                self.l2cap.shutdown(handle);
            }
        }
        self.hid.remove(&addr);
    }
}
