use crate::error::{IdentityError, Result};

/// Number of color bits available to the picking encoding (RGB, 8 bits each).
pub const MAX_PICKING_BITS: u32 = 24;

/// Configuration of the picking-ID space.
///
/// Picking IDs are rendered as colors, so they must fit into the number of
/// bits the picking pass can read back. ID `0` is reserved for "nothing
/// picked" (the cleared background).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PickingConfig {
    id_bits: u32,
}

impl PickingConfig {
    /// Creates a picking configuration using `id_bits` bits per ID.
    ///
    /// # Errors
    ///
    /// Returns an error if `id_bits` is zero or exceeds [`MAX_PICKING_BITS`].
    pub fn new(id_bits: u32) -> Result<Self> {
        if id_bits == 0 || id_bits > MAX_PICKING_BITS {
            return Err(IdentityError::InvalidConfig(format!(
                "picking id width must be in 1..={MAX_PICKING_BITS} bits, got {id_bits}"
            ))
            .into());
        }
        Ok(Self { id_bits })
    }

    /// Returns the number of bits per picking ID.
    #[must_use]
    pub fn id_bits(&self) -> u32 {
        self.id_bits
    }

    /// Returns the largest picking ID that can be assigned.
    #[must_use]
    pub fn id_limit(&self) -> u32 {
        (1u32 << self.id_bits) - 1
    }
}

impl Default for PickingConfig {
    fn default() -> Self {
        Self {
            id_bits: MAX_PICKING_BITS,
        }
    }
}
