//! Contains logic for finding out which application is in front in different environments.
//! [GenericSampler] is the main artifact of this module that abstracts the operations.

#[cfg(feature = "win")]
pub mod win;
#[cfg(feature = "x11")]
pub mod x11;

#[cfg(feature = "win")]
extern crate windows;

#[cfg(feature = "x11")]
extern crate xcb;

use std::sync::Arc;

use anyhow::Result;

/// Intended to serve as a contract windows and linux systems must implement.
#[cfg_attr(test, mockall::automock)]
pub trait ForegroundSampler {
    /// Name of the application that currently owns the focused window. `None` means there is no
    /// foreground application right now, which is a normal idle signal and not an error.
    fn current_foreground_app(&mut self) -> Result<Option<Arc<str>>>;
}

/// Serves as a cross-compatible [ForegroundSampler] implementation.
pub struct GenericSampler {
    inner: Box<dyn ForegroundSampler>,
}

impl GenericSampler {
    pub fn new() -> Result<Self> {
        cfg_if::cfg_if! {
            if #[cfg(feature = "win")] {
                use win::WindowsSampler;
                Ok(Self {
                    inner: Box::new(WindowsSampler::new()),
                })
            }
            else if #[cfg(feature = "x11")] {
                use x11::X11Sampler;
                Ok(Self {
                    inner: Box::new(X11Sampler::new()?),
                })
            }
            else {
                Err(anyhow::anyhow!(
                    "No sampler backend was compiled in. Rebuild with the `x11` or `win` feature"
                ))
            }
        }
    }
}

impl ForegroundSampler for GenericSampler {
    fn current_foreground_app(&mut self) -> Result<Option<Arc<str>>> {
        self.inner.current_foreground_app()
    }
}

/// Turns an executable path into an application name: `/usr/bin/firefox` -> `firefox`,
/// `C:\Program Files\Slack\slack.exe` -> `slack`.
pub fn app_name_from_executable(path: &str) -> Option<Arc<str>> {
    let name = path.rsplit(['/', '\\']).next()?;
    let name = name
        .strip_suffix(".exe")
        .or_else(|| name.strip_suffix(".EXE"))
        .unwrap_or(name);
    (!name.is_empty()).then(|| name.into())
}
