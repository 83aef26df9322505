use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use crate::colors;

/// 8-bit RGBA, stored in the same byte order as image pixels.
/// Serializes as a `[r, g, b, a]` array so descriptor files stay terse.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
#[serde(from = "[u8; 4]", into = "[u8; 4]")]
pub struct Rgba
{
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}
impl Rgba
{
    #[inline] #[must_use] pub const fn new(red: u8, green: u8, blue: u8, alpha: u8) -> Self { Self { red, green, blue, alpha } }

    #[inline] #[must_use]
    pub const fn to_array(self) -> [u8; 4] { [self.red, self.green, self.blue, self.alpha] }

    #[inline] #[must_use]
    pub fn is_opaque(self) -> bool { self.alpha == 255 }
}
impl Default for Rgba
{
    fn default() -> Self { colors::WHITE }
}
impl From<[u8;4]> for Rgba
{
    fn from(rgba: [u8;4]) -> Self
    {
        Rgba
        {
            red: rgba[0],
            green: rgba[1],
            blue: rgba[2],
            alpha: rgba[3],
        }
    }
}
impl From<Rgba> for [u8;4]
{
    fn from(color: Rgba) -> Self { color.to_array() }
}

pub const BLACK: Rgba = Rgba { red: 0, green: 0, blue: 0, alpha: 255 };
pub const WHITE: Rgba = Rgba { red: 255, green: 255, blue: 255, alpha: 255 };
pub const GRAY: Rgba = Rgba { red: 144, green: 144, blue: 144, alpha: 255 };
pub const MAGENTA: Rgba = Rgba { red: 255, green: 0, blue: 255, alpha: 255 };
pub const CORNFLOWER_BLUE: Rgba = Rgba { red: 100, green: 149, blue: 237, alpha: 255 };

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn serializes_as_array()
    {
        #[derive(Serialize, Deserialize)]
        struct Holder { color: Rgba }

        let text = toml::to_string(&Holder { color: CORNFLOWER_BLUE }).unwrap();
        assert_eq!("color = [100, 149, 237, 255]\n", text);
        let parsed: Holder = toml::from_str("color = [1, 2, 3, 255]").unwrap();
        assert_eq!(Rgba::new(1, 2, 3, 255), parsed.color);
    }
}
