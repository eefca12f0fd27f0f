//! Device registry: identification, duplicate filtering and session tracking
//!
//! Only one session is active at a time. Other distinct controllers wait on
//! standby and are promoted in connection order when the active one leaves.

use super::{models, DeviceHandle, DeviceModel, RawDeviceId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Identity of one physical controller across its logical handles
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    pub signature: String,
    pub enumeration: u32,
}

impl Fingerprint {
    pub fn of(raw: &RawDeviceId) -> Self {
        Self {
            signature: raw.signature_key(),
            enumeration: raw.enumeration,
        }
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.signature, self.enumeration)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub u64);

/// One attached controller
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub handle: DeviceHandle,
    pub fingerprint: Fingerprint,
    pub model: Arc<DeviceModel>,
    pub raw: RawDeviceId,
}

impl Session {
    /// Whether the model came from the static tables
    pub fn is_recognized(&self) -> bool {
        !self.model.generic
    }
}

#[derive(Debug, Clone)]
pub enum AttachOutcome {
    /// Became the active session
    Activated(Session),
    /// Another controller is active; queued for promotion
    Standby(Session),
    /// Second logical handle of an already attached physical device
    Duplicate { of: DeviceHandle },
    /// Handle was already attached
    AlreadyAttached,
}

#[derive(Debug, Clone)]
pub enum DetachOutcome {
    /// The active session ended; `promoted` took its place
    ///
    /// A surviving logical handle of the same physical device is promoted
    /// ahead of standby controllers.
    Active {
        ended: Session,
        promoted: Option<Session>,
    },
    Standby(Session),
    /// A duplicate handle went away, or took over for its standby twin;
    /// nothing visible changes
    Duplicate,
    Unknown,
}

/// A second logical handle parked behind the session it duplicates
#[derive(Debug, Clone)]
struct Duplicate {
    of: DeviceHandle,
    raw: RawDeviceId,
}

/// Resolves raw identifiers and tracks attached controllers
pub struct DeviceRegistry {
    detect_8bitdo: bool,
    active: Option<Session>,
    standby: Vec<Session>,
    /// Handles rejected as duplicates, in arrival order
    duplicates: Vec<Duplicate>,
    /// Model identified for each signature during this process
    remembered: HashMap<String, Arc<DeviceModel>>,
    next_session: u64,
}

impl DeviceRegistry {
    pub fn new(detect_8bitdo: bool) -> Self {
        Self {
            detect_8bitdo,
            active: None,
            standby: Vec::new(),
            duplicates: Vec::new(),
            remembered: HashMap::new(),
            next_session: 1,
        }
    }

    pub fn set_detect_8bitdo(&mut self, enabled: bool) {
        self.detect_8bitdo = enabled;
    }

    /// Resolve a raw identifier to a device model
    ///
    /// Deterministic: known signatures and names map to their table entry,
    /// everything else to the generic model sized from the reported counts.
    /// A signature seen earlier in this process keeps its first model, so a
    /// reconnecting controller that reports different counts still lands on
    /// the same profile.
    pub fn identify(&self, raw: &RawDeviceId) -> Arc<DeviceModel> {
        if let Some(model) = self.remembered.get(&raw.signature_key()) {
            return model.clone();
        }
        models::lookup(raw, self.detect_8bitdo).unwrap_or_else(|| {
            debug!(
                "No table entry for \"{}\" ({}), using generic model",
                raw.name,
                raw.signature_key()
            );
            Arc::new(DeviceModel::generic(raw.buttons, raw.axes, raw.hats))
        })
    }

    /// Attach a newly reported handle
    pub fn attach(&mut self, raw: RawDeviceId) -> AttachOutcome {
        if self.find(raw.handle).is_some() || self.duplicates.iter().any(|d| d.raw.handle == raw.handle) {
            return AttachOutcome::AlreadyAttached;
        }

        let fingerprint = Fingerprint::of(&raw);
        let existing = self
            .sessions()
            .find(|s| s.fingerprint == fingerprint)
            .map(|s| s.handle);
        if let Some(of) = existing {
            debug!(
                "Ignoring duplicate handle {} for {} (already attached as {})",
                raw.handle, fingerprint, of
            );
            self.duplicates.push(Duplicate { of, raw });
            return AttachOutcome::Duplicate { of };
        }

        let model = self.identify(&raw);
        self.remembered
            .entry(raw.signature_key())
            .or_insert_with(|| model.clone());

        let session = self.new_session(raw, fingerprint, model);

        if self.active.is_none() {
            info!(
                "✅ Controller {} connected: {} ({})",
                session.handle, session.model.name, session.raw.name
            );
            self.active = Some(session.clone());
            AttachOutcome::Activated(session)
        } else {
            info!(
                "Controller {} on standby: {} ({})",
                session.handle, session.model.name, session.raw.name
            );
            self.standby.push(session.clone());
            AttachOutcome::Standby(session)
        }
    }

    /// Detach a handle that the backend reported as gone
    pub fn detach(&mut self, handle: DeviceHandle) -> DetachOutcome {
        if let Some(pos) = self.duplicates.iter().position(|d| d.raw.handle == handle) {
            self.duplicates.remove(pos);
            return DetachOutcome::Duplicate;
        }

        if self.is_active(handle) {
            let Some(ended) = self.active.take() else {
                return DetachOutcome::Unknown;
            };
            warn!("🔌 Controller {} disconnected: {}", handle, ended.model.name);

            let promoted = match self.take_over(&ended) {
                Some(twin) => Some(twin),
                None if self.standby.is_empty() => None,
                None => Some(self.standby.remove(0)),
            };
            if let Some(next) = &promoted {
                info!("Promoting controller {}: {}", next.handle, next.model.name);
            }
            self.active = promoted.clone();
            return DetachOutcome::Active { ended, promoted };
        }

        if let Some(pos) = self.standby.iter().position(|s| s.handle == handle) {
            let ended = self.standby.remove(pos);
            if let Some(twin) = self.take_over(&ended) {
                self.standby.insert(pos, twin);
                return DetachOutcome::Duplicate;
            }
            return DetachOutcome::Standby(ended);
        }

        DetachOutcome::Unknown
    }

    /// Make a standby controller the active one
    ///
    /// The previously active controller goes to the front of the standby
    /// queue. Returns `None` when the handle is not on standby.
    pub fn activate(&mut self, handle: DeviceHandle) -> Option<&Session> {
        let pos = self.standby.iter().position(|s| s.handle == handle)?;
        let next = self.standby.remove(pos);
        if let Some(previous) = self.active.replace(next) {
            self.standby.insert(0, previous);
        }
        self.active.as_ref()
    }

    pub fn active(&self) -> Option<&Session> {
        self.active.as_ref()
    }

    pub fn is_active(&self, handle: DeviceHandle) -> bool {
        self.active.as_ref().map(|s| s.handle) == Some(handle)
    }

    pub fn standby(&self) -> &[Session] {
        &self.standby
    }

    /// Active session first, then standby in promotion order
    pub fn sessions(&self) -> impl Iterator<Item = &Session> {
        self.active.iter().chain(self.standby.iter())
    }

    fn find(&self, handle: DeviceHandle) -> Option<&Session> {
        self.sessions().find(|s| s.handle == handle)
    }

    fn new_session(&mut self, raw: RawDeviceId, fingerprint: Fingerprint, model: Arc<DeviceModel>) -> Session {
        let session = Session {
            id: SessionId(self.next_session),
            handle: raw.handle,
            fingerprint,
            model,
            raw,
        };
        self.next_session += 1;
        session
    }

    /// Turn the first surviving duplicate of an ended session into its
    /// successor; the remaining duplicates follow it
    fn take_over(&mut self, ended: &Session) -> Option<Session> {
        let pos = self.duplicates.iter().position(|d| d.of == ended.handle)?;
        let twin = self.duplicates.remove(pos);
        let successor = twin.raw.handle;
        for duplicate in self.duplicates.iter_mut().filter(|d| d.of == ended.handle) {
            duplicate.of = successor;
        }
        debug!("Handle {} takes over for {} ({})", successor, ended.handle, ended.fingerprint);
        Some(self.new_session(twin.raw, ended.fingerprint.clone(), ended.model.clone()))
    }
}
