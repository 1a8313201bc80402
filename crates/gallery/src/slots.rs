//! The two texture slots a gallery draws from, as seen by the state machine.

use std::collections::HashMap;

use crate::cache::Bitmap;

/// Opaque black pixel every slot holds when it has no image.
pub const PLACEHOLDER_PIXEL: [u8; 4] = [0, 0, 0, 255];

/// One of the two texture units a gallery samples from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Slot {
    Current,
    Next,
}

impl Slot {
    pub fn label(self) -> &'static str {
        match self {
            Slot::Current => "current",
            Slot::Next => "next",
        }
    }
}

/// Destination for the transition state machine's texture writes.
///
/// The GPU implementation lives in [`crate::gpu`]; [`RecordingSlots`] keeps
/// the same contract in memory for headless use.
pub trait TextureSlots {
    /// Replaces the slot's pixels with `bitmap`.
    fn upload(&mut self, slot: Slot, bitmap: &Bitmap);
    /// Restores the 1x1 [`PLACEHOLDER_PIXEL`].
    fn reset_to_placeholder(&mut self, slot: Slot);
}

/// What a slot currently holds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotContents {
    pub url: Option<String>,
    pub width: u32,
    pub height: u32,
    pub first_pixel: [u8; 4],
}

impl SlotContents {
    fn placeholder() -> Self {
        Self {
            url: None,
            width: 1,
            height: 1,
            first_pixel: PLACEHOLDER_PIXEL,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.url.is_none() && self.width == 1 && self.height == 1
    }
}

/// A slot write observed by [`RecordingSlots`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlotWrite {
    Upload { slot: Slot, url: String },
    Reset { slot: Slot },
}

/// In-memory [`TextureSlots`] that remembers contents and every write.
#[derive(Debug)]
pub struct RecordingSlots {
    contents: HashMap<Slot, SlotContents>,
    writes: Vec<SlotWrite>,
}

impl Default for RecordingSlots {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingSlots {
    pub fn new() -> Self {
        let contents = [Slot::Current, Slot::Next]
            .into_iter()
            .map(|slot| (slot, SlotContents::placeholder()))
            .collect();
        Self {
            contents,
            writes: Vec::new(),
        }
    }

    pub fn contents(&self, slot: Slot) -> &SlotContents {
        &self.contents[&slot]
    }

    pub fn url(&self, slot: Slot) -> Option<&str> {
        self.contents[&slot].url.as_deref()
    }

    pub fn writes(&self) -> &[SlotWrite] {
        &self.writes
    }

    pub fn upload_count(&self) -> usize {
        self.writes
            .iter()
            .filter(|write| matches!(write, SlotWrite::Upload { .. }))
            .count()
    }

    pub fn clear_writes(&mut self) {
        self.writes.clear();
    }
}

impl TextureSlots for RecordingSlots {
    fn upload(&mut self, slot: Slot, bitmap: &Bitmap) {
        let mut first_pixel = [0u8; 4];
        first_pixel.copy_from_slice(&bitmap.pixels()[..4]);
        self.contents.insert(
            slot,
            SlotContents {
                url: Some(bitmap.url().to_string()),
                width: bitmap.width(),
                height: bitmap.height(),
                first_pixel,
            },
        );
        self.writes.push(SlotWrite::Upload {
            slot,
            url: bitmap.url().to_string(),
        });
    }

    fn reset_to_placeholder(&mut self, slot: Slot) {
        self.contents.insert(slot, SlotContents::placeholder());
        self.writes.push(SlotWrite::Reset { slot });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_placeholders() {
        let slots = RecordingSlots::new();
        for slot in [Slot::Current, Slot::Next] {
            assert!(slots.contents(slot).is_placeholder());
            assert_eq!(slots.contents(slot).first_pixel, PLACEHOLDER_PIXEL);
        }
    }

    #[test]
    fn records_uploads_and_resets() {
        let mut slots = RecordingSlots::new();
        slots.upload(Slot::Next, &Bitmap::solid("a.jpg", 4, 2, [9, 8, 7, 255]));
        assert_eq!(slots.url(Slot::Next), Some("a.jpg"));
        assert_eq!(slots.contents(Slot::Next).first_pixel, [9, 8, 7, 255]);
        slots.reset_to_placeholder(Slot::Next);
        assert!(slots.contents(Slot::Next).is_placeholder());
        assert_eq!(
            slots.writes(),
            &[
                SlotWrite::Upload {
                    slot: Slot::Next,
                    url: "a.jpg".into()
                },
                SlotWrite::Reset { slot: Slot::Next },
            ]
        );
        assert_eq!(slots.upload_count(), 1);
    }
}
