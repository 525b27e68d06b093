/// Envelope width once fully grown.
pub const ENVELOPE_WIDTH: f32 = 400.0;
/// `ENVELOPE_WIDTH * 1.4`
pub const ENVELOPE_HEIGHT: f32 = 560.0;
/// `ENVELOPE_WIDTH * 0.9`
pub const CARD_WIDTH: f32 = 360.0;
/// How much of the card bottom stays tucked behind the envelope.
pub const OVERLAP: f32 = 50.0;
/// Gap between card and envelope when the card is fully out.
pub const FULL_OUT_GAP: f32 = 20.0;

/// Final vertical positions of the card and envelope on the result stage.
///
/// All values are pixel offsets along the vertical axis relative to the
/// centered layout; negative card offsets move the card up.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RevealPlacement {
    pub card_height: f32,
    pub card_offset: f32,
    pub normal_envelope_y: f32,
    pub full_out_envelope_y: f32,
}

impl RevealPlacement {
    pub fn compute(image_width: u32, image_height: u32) -> Self {
        let card_height = CARD_WIDTH * image_height as f32 / image_width.max(1) as f32;
        let card_offset = -card_height + OVERLAP - ENVELOPE_HEIGHT / 10.0;
        let normal_envelope_y = card_height / 2.0 - OVERLAP + ENVELOPE_HEIGHT / 2.0;
        let full_out_envelope_y = card_height / 2.0 + ENVELOPE_HEIGHT / 2.0 + FULL_OUT_GAP;

        Self { card_height, card_offset, normal_envelope_y, full_out_envelope_y }
    }

    /// `(envelope_y, card_offset)` for the normal or fully-out arrangement.
    ///
    /// Moving the envelope down by some distance moves the card up by the same
    /// distance so the card stays centered.
    pub fn position(&self, fully_out: bool) -> (f32, f32) {
        if fully_out {
            let delta = self.full_out_envelope_y - self.normal_envelope_y;
            (self.full_out_envelope_y, self.card_offset - delta)
        } else {
            (self.normal_envelope_y, self.card_offset)
        }
    }
}
