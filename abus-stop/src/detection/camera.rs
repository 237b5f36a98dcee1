//! Frame sources

use super::imaging::RgbFrame;
use crate::error::Result;

/// Produces frames for the detection loop
pub trait FrameSource: Send {
    /// Next frame; `Ok(None)` when the source has ended
    fn read_frame(&mut self) -> Result<Option<RgbFrame>>;
}

/// Replays a fixed list of frames, then ends
pub struct FrameSequence {
    frames: std::vec::IntoIter<RgbFrame>,
}

impl FrameSequence {
    pub fn new(frames: Vec<RgbFrame>) -> Self {
        Self {
            frames: frames.into_iter(),
        }
    }
}

impl FrameSource for FrameSequence {
    fn read_frame(&mut self) -> Result<Option<RgbFrame>> {
        Ok(self.frames.next())
    }
}

#[cfg(feature = "camera")]
pub use opencv_camera::OpenCvCamera;

#[cfg(feature = "camera")]
mod opencv_camera {
    use super::{FrameSource, RgbFrame};
    use crate::error::{Error, Result};
    use opencv::{
        core::Mat,
        imgproc,
        prelude::*,
        videoio::{self, VideoCapture},
    };
    use tracing::info;

    /// USB camera through OpenCV `VideoCapture`
    pub struct OpenCvCamera {
        cap: VideoCapture,
    }

    impl OpenCvCamera {
        pub fn open(index: i32, width: u32, height: u32) -> Result<Self> {
            let mut cap = VideoCapture::new(index, videoio::CAP_ANY)?;
            cap.set(videoio::CAP_PROP_FRAME_WIDTH, width as f64)?;
            cap.set(videoio::CAP_PROP_FRAME_HEIGHT, height as f64)?;
            if !cap.is_opened()? {
                return Err(Error::Camera(format!("camera {} could not be opened", index)));
            }

            let actual_w = cap.get(videoio::CAP_PROP_FRAME_WIDTH)?;
            let actual_h = cap.get(videoio::CAP_PROP_FRAME_HEIGHT)?;
            info!(index, width = actual_w, height = actual_h, "Camera open");
            Ok(Self { cap })
        }
    }

    impl FrameSource for OpenCvCamera {
        fn read_frame(&mut self) -> Result<Option<RgbFrame>> {
            let mut mat = Mat::default();
            if !self.cap.read(&mut mat)? || mat.empty() {
                return Ok(None);
            }

            let mut rgb = Mat::default();
            imgproc::cvt_color(&mat, &mut rgb, imgproc::COLOR_BGR2RGB, 0)?;

            let (width, height) = (rgb.cols() as u32, rgb.rows() as u32);
            let data = rgb.data_bytes()?.to_vec();
            RgbFrame::from_raw(width, height, data)
                .map(Some)
                .ok_or_else(|| {
                    Error::InvalidFrame(format!("{}x{} capture is not packed RGB", width, height))
                })
        }
    }
}
