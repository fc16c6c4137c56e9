/// A trait for moving register-sized integers in and out of raw register
/// bytes, which are always kept in target (little-endian) byte order.
/// Automatically implemented for all built-in unsigned integers.
pub trait LeBytes: Sized {
    /// Write `self` as little-endian bytes into the start of `buf`.
    ///
    /// Returns the number of bytes written, or `None` if `buf` is too short.
    fn to_le_bytes(self, buf: &mut [u8]) -> Option<usize>;

    /// Parse `self` from little-endian bytes.
    ///
    /// Shorter inputs are zero-extended. Returns `None` if `buf` holds more
    /// bytes than `Self` can represent.
    fn from_le_bytes(buf: &[u8]) -> Option<Self>;
}

macro_rules! impl_le_bytes {
    ($($num:ty)*) => {
        $(
            impl LeBytes for $num {
                fn to_le_bytes(self, buf: &mut [u8]) -> Option<usize> {
                    let len = core::mem::size_of::<$num>();
                    if buf.len() < len {
                        return None
                    }
                    buf[..len].copy_from_slice(&<$num>::to_le_bytes(self));
                    Some(len)
                }

                fn from_le_bytes(buf: &[u8]) -> Option<Self> {
                    let mut bytes = [0; core::mem::size_of::<$num>()];
                    if buf.len() > bytes.len() {
                        return None
                    }
                    bytes[..buf.len()].copy_from_slice(buf);
                    Some(<$num>::from_le_bytes(bytes))
                }
            }
        )*
    };
}

impl_le_bytes!(u8 u16 u32 u64 u128);
