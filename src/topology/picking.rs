use super::category::Category;

/// An RGBA8 color encoding a picking ID (RGB) and its category (alpha).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PickingColor(pub [u8; 4]);

impl PickingColor {
    /// Encodes `picking_id` of the given category.
    ///
    /// Only the low 24 bits of `picking_id` are representable; the identity
    /// registry never hands out larger IDs.
    #[must_use]
    pub fn encode(picking_id: u32, category: Category) -> Self {
        let [_, r, g, b] = picking_id.to_be_bytes();
        // Alpha 0 is left for the cleared background.
        let a = category.index() as u8 + 1;
        Self([r, g, b, a])
    }

    /// Decodes a color read back from the picking pass.
    ///
    /// Returns `None` for the background or a color no category encodes.
    #[must_use]
    pub fn decode(self) -> Option<(u32, Category)> {
        let [r, g, b, a] = self.0;
        let category = *Category::ALL.get(usize::from(a).checked_sub(1)?)?;
        let picking_id = u32::from_be_bytes([0, r, g, b]);
        (picking_id != 0).then_some((picking_id, category))
    }
}
