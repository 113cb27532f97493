//! Caffe `Datum` message and its conversion from/to RGB images.

use crate::RecordError;
use cloudless_core::Target;
use image::RgbImage;
use prost::Message;

/// Channel count of every packed image.
pub const RGB_CHANNELS: i32 = 3;

/// Wire-compatible subset of Caffe's `Datum` protobuf message.
///
/// `data` holds `channels × height × width` bytes: all red values row by
/// row, then all green values, then all blue values.
#[derive(Clone, PartialEq, Message)]
pub struct Datum {
    #[prost(int32, optional, tag = "1")]
    pub channels: Option<i32>,
    #[prost(int32, optional, tag = "2")]
    pub height: Option<i32>,
    #[prost(int32, optional, tag = "3")]
    pub width: Option<i32>,
    #[prost(bytes = "vec", optional, tag = "4")]
    pub data: Option<Vec<u8>>,
    #[prost(int32, optional, tag = "5")]
    pub label: Option<i32>,
}

impl Datum {
    /// Pack an RGB image (interleaved `HWC`) into a channel-major datum.
    pub fn from_rgb(img: &RgbImage, target: Target) -> Self {
        let (w, h) = img.dimensions();
        let plane = w as usize * h as usize;
        let mut data = vec![0u8; plane * RGB_CHANNELS as usize];
        for (i, px) in img.pixels().enumerate() {
            data[i] = px[0];
            data[plane + i] = px[1];
            data[2 * plane + i] = px[2];
        }
        Self {
            channels: Some(RGB_CHANNELS),
            height: Some(h as i32),
            width: Some(w as i32),
            data: Some(data),
            label: Some(target.label()),
        }
    }

    pub fn target(&self) -> Target {
        Target::from_label(self.label())
    }

    /// Unpack the channel-major pixels back into an interleaved RGB image.
    pub fn to_rgb_image(&self) -> Result<RgbImage, RecordError> {
        let (channels, height, width) = (self.channels(), self.height(), self.width());
        let data = self.data();
        let shape_err = |expected: usize| RecordError::DatumShape {
            channels,
            height,
            width,
            expected,
            got: data.len(),
        };
        if channels != RGB_CHANNELS || height <= 0 || width <= 0 {
            return Err(shape_err(0));
        }
        let plane = height as usize * width as usize;
        let expected = plane * RGB_CHANNELS as usize;
        if data.len() != expected {
            return Err(shape_err(expected));
        }

        let mut interleaved = Vec::with_capacity(expected);
        for i in 0..plane {
            interleaved.extend_from_slice(&[data[i], data[plane + i], data[2 * plane + i]]);
        }
        RgbImage::from_raw(width as u32, height as u32, interleaved).ok_or(shape_err(expected))
    }

    /// Serialize to protobuf bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.encode_to_vec()
    }

    /// Parse protobuf bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RecordError> {
        Ok(Self::decode(bytes)?)
    }
}
