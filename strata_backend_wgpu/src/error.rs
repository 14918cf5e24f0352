// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::fmt;

/// Failures of [`WgpuBackend`](crate::WgpuBackend) setup, uploads and
/// readback.
///
/// Frame replay itself never fails: a draw that cannot be executed is
/// logged and skipped.
#[derive(Debug)]
pub enum BackendError {
    /// No adapter matched the request.
    NoAdapter,
    /// The adapter refused to create a device.
    RequestDevice(wgpu::RequestDeviceError),
    /// Image bytes do not match the stated dimensions.
    ImageSize {
        /// Stated width.
        width: u32,
        /// Stated height.
        height: u32,
        /// Bytes supplied.
        len: usize,
    },
    /// An image dimension exceeds the device limit.
    ImageTooLarge {
        /// Largest supported dimension.
        max: u32,
    },
    /// Readback was requested before anything was presented to the owned
    /// output texture.
    NothingPresented,
    /// Mapping the readback buffer failed.
    Readback(wgpu::BufferAsyncError),
    /// The device was lost before the readback completed.
    ReadbackLost,
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoAdapter => f.write_str("no suitable GPU adapter"),
            Self::RequestDevice(e) => write!(f, "device request failed: {e}"),
            Self::ImageSize { width, height, len } => {
                write!(f, "{len} bytes cannot hold a {width}x{height} RGBA8 image")
            }
            Self::ImageTooLarge { max } => write!(f, "image exceeds the {max} pixel texture limit"),
            Self::NothingPresented => f.write_str("no frame has been presented to the output texture"),
            Self::Readback(e) => write!(f, "readback failed: {e}"),
            Self::ReadbackLost => f.write_str("device lost during readback"),
        }
    }
}

impl core::error::Error for BackendError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::RequestDevice(e) => Some(e),
            Self::Readback(e) => Some(e),
            _ => None,
        }
    }
}

impl From<wgpu::RequestDeviceError> for BackendError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        Self::RequestDevice(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_problem() {
        let e = BackendError::ImageSize {
            width: 2,
            height: 3,
            len: 5,
        };
        assert_eq!(e.to_string(), "5 bytes cannot hold a 2x3 RGBA8 image");
        assert!(core::error::Error::source(&BackendError::NoAdapter).is_none());
    }
}
