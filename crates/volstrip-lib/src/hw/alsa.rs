//! ALSA simple mixer backend.
//!
//! Implements [`MixerHandle`] on top of an `alsa::mixer::Mixer`. The selem is
//! looked up per call rather than cached; holding a `Selem` would borrow the
//! `Mixer` for the handle's whole lifetime.

use std::time::Duration;

use alsa::mixer::{Mixer, Selem, SelemChannelId, SelemId};
use alsa::poll::Descriptors;

use crate::error::VolstripError;
use crate::mixer::{MixerError, MixerEvent, MixerHandle, MuteSupport, Result, VolumeRange};

/// Which sound card to open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CardAddress {
    /// The system default card.
    #[default]
    Default,
    /// A card by index, addressed as `hw:N`.
    Index(i32),
    /// A raw ALSA device string such as `hw:CARD=Headset`.
    Device(String),
}

impl CardAddress {
    pub fn device_string(&self) -> String {
        match self {
            CardAddress::Default => "default".into(),
            CardAddress::Index(index) => format!("hw:{index}"),
            CardAddress::Device(device) => device.clone(),
        }
    }
}

fn backend(e: alsa::Error) -> MixerError {
    MixerError::Backend(e.to_string())
}

/// A handle on one ALSA simple mixer element.
pub struct AlsaMixer {
    mixer: Mixer,
    selem_id: SelemId,
    name: String,
}

impl AlsaMixer {
    /// Open `control` on the given card. Fails with
    /// [`MixerError::NoSuchControl`] when the element is missing or has no
    /// playback volume.
    pub fn open(address: &CardAddress, control: &str) -> Result<Self> {
        let mixer = Mixer::new(&address.device_string(), false).map_err(backend)?;
        let selem_id = SelemId::new(control, 0);
        match mixer.find_selem(&selem_id) {
            Some(selem) if selem.has_playback_volume() => {}
            _ => return Err(MixerError::NoSuchControl(control.into())),
        }
        Ok(AlsaMixer {
            mixer,
            selem_id,
            name: control.into(),
        })
    }

    fn selem(&self) -> Result<Selem<'_>> {
        self.mixer
            .find_selem(&self.selem_id)
            .ok_or_else(|| MixerError::NoSuchControl(self.name.clone()))
    }
}

impl MixerHandle for AlsaMixer {
    fn name(&self) -> &str {
        &self.name
    }

    fn range(&self) -> Result<VolumeRange> {
        let (min, max) = self.selem()?.get_playback_volume_range();
        VolumeRange::new(min, max)
    }

    fn volume(&self) -> Result<i64> {
        self.selem()?
            .get_playback_volume(SelemChannelId::mono())
            .map_err(backend)
    }

    fn set_volume(&mut self, volume: i64) -> Result<()> {
        self.selem()?
            .set_playback_volume_all(volume)
            .map_err(backend)
    }

    fn mute(&self) -> Result<Option<bool>> {
        let selem = self.selem()?;
        if !selem.has_playback_switch() {
            return Ok(None);
        }
        let switch = selem
            .get_playback_switch(SelemChannelId::mono())
            .map_err(backend)?;
        Ok(Some(switch == 0))
    }

    fn set_mute(&mut self, muted: bool) -> Result<MuteSupport> {
        let selem = self.selem()?;
        if !selem.has_playback_switch() {
            return Ok(MuteSupport::Unsupported);
        }
        selem
            .set_playback_switch_all(if muted { 0 } else { 1 })
            .map_err(backend)?;
        Ok(MuteSupport::Applied)
    }

    fn wait_for_change(&mut self, timeout: Duration) -> Result<MixerEvent> {
        let mut fds = self.mixer.get().map_err(backend)?;
        let timeout_ms = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);
        let ready = alsa::poll::poll(&mut fds, timeout_ms).map_err(backend)?;
        if ready == 0 {
            return Ok(MixerEvent::TimedOut);
        }
        let hangup = libc::POLLHUP | libc::POLLERR | libc::POLLNVAL;
        if fds.iter().any(|fd| fd.revents & hangup != 0) {
            return Ok(MixerEvent::Closed);
        }
        // Drains the notification so the descriptor goes quiet again.
        self.mixer.handle_events().map_err(backend)?;
        Ok(MixerEvent::Changed)
    }
}

/// Enumerate sound cards as `(index, name)` pairs.
pub fn list_cards() -> crate::error::Result<Vec<(i32, String)>> {
    let mut cards = Vec::new();
    for card in alsa::card::Iter::new() {
        let card = card.map_err(|e| VolstripError::Mixer(backend(e)))?;
        let name = card
            .get_name()
            .map_err(|e| VolstripError::Mixer(backend(e)))?;
        cards.push((card.get_index(), name));
    }
    Ok(cards)
}

/// Enumerate the playback-volume controls of one card.
pub fn list_controls(address: &CardAddress) -> crate::error::Result<Vec<String>> {
    let mixer =
        Mixer::new(&address.device_string(), false).map_err(|e| VolstripError::Mixer(backend(e)))?;
    let mut controls = Vec::new();
    for elem in mixer.iter() {
        let Some(selem) = Selem::new(elem) else {
            continue;
        };
        if selem.has_playback_volume() {
            let id = selem.get_id();
            let name = id
                .get_name()
                .map_err(|e| VolstripError::Mixer(backend(e)))?;
            controls.push(name.to_owned());
        }
    }
    Ok(controls)
}
