//! Master volume of the default audio output device.

use crate::error::Result;

/// Scalar volume and mute flag of an output endpoint.
pub trait AudioEndpoint: Send + Sync {
    /// Current level in `0.0..=1.0`.
    fn level(&self) -> Result<f32>;

    fn set_level(&self, level: f32) -> Result<()>;

    fn is_muted(&self) -> Result<bool>;

    fn set_muted(&self, muted: bool) -> Result<()>;
}

/// The default render endpoint, if this platform exposes one and it answers.
pub fn default_endpoint() -> Option<Box<dyn AudioEndpoint>> {
    #[cfg(windows)]
    {
        let endpoint = core_audio::CoreAudioEndpoint;
        match endpoint.level() {
            Ok(_) => Some(Box::new(endpoint)),
            Err(e) => {
                log::warn!("Core Audio endpoint unavailable: {e}");
                None
            }
        }
    }
    #[cfg(not(windows))]
    {
        None
    }
}

// COM calls are unsafe by signature.
#[cfg(windows)]
#[allow(unsafe_code)]
mod core_audio {
    use windows::Win32::Foundation::BOOL;
    use windows::Win32::Media::Audio::Endpoints::IAudioEndpointVolume;
    use windows::Win32::Media::Audio::{IMMDeviceEnumerator, MMDeviceEnumerator, eConsole, eRender};
    use windows::Win32::System::Com::{
        CLSCTX_ALL, COINIT_MULTITHREADED, CoCreateInstance, CoInitializeEx,
    };

    use super::AudioEndpoint;
    use crate::error::{BridgeError, Result};

    /// `IAudioEndpointVolume` of the default console render device.
    pub struct CoreAudioEndpoint;

    impl CoreAudioEndpoint {
        // Calls arrive on arbitrary blocking-pool threads, so COM is joined
        // and the endpoint resolved on every call.
        fn with_volume<T>(
            f: impl FnOnce(&IAudioEndpointVolume) -> windows::core::Result<T>,
        ) -> Result<T> {
            unsafe {
                let _ = CoInitializeEx(None, COINIT_MULTITHREADED);
                let enumerator: IMMDeviceEnumerator =
                    CoCreateInstance(&MMDeviceEnumerator, None, CLSCTX_ALL).map_err(com_error)?;
                let device = enumerator
                    .GetDefaultAudioEndpoint(eRender, eConsole)
                    .map_err(com_error)?;
                let volume: IAudioEndpointVolume =
                    device.Activate(CLSCTX_ALL, None).map_err(com_error)?;
                f(&volume).map_err(com_error)
            }
        }
    }

    fn com_error(e: windows::core::Error) -> BridgeError {
        BridgeError::backend(format!("Core Audio: {e}"))
    }

    impl AudioEndpoint for CoreAudioEndpoint {
        fn level(&self) -> Result<f32> {
            Self::with_volume(|v| unsafe { v.GetMasterVolumeLevelScalar() })
        }

        fn set_level(&self, level: f32) -> Result<()> {
            Self::with_volume(|v| unsafe { v.SetMasterVolumeLevelScalar(level, std::ptr::null()) })
        }

        fn is_muted(&self) -> Result<bool> {
            Self::with_volume(|v| unsafe { v.GetMute() }.map(|m| m.as_bool()))
        }

        fn set_muted(&self, muted: bool) -> Result<()> {
            Self::with_volume(|v| unsafe { v.SetMute(BOOL::from(muted), std::ptr::null()) })
        }
    }
}
