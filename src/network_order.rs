//! Big-endian (network order) encode/decode for the handful of primitive
//! widths the wire format uses. Lifted from the teacher's approach of
//! implementing one small trait for `u8`/`u16`/`u32` rather than hand-rolling
//! `to_be_bytes`/`from_be_bytes` calls at every call site.
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Result};

pub trait ToNetworkOrder {
    fn to_network_bytes(&self, buffer: &mut Vec<u8>) -> Result<usize>;
}

pub trait FromNetworkOrder {
    fn from_network_bytes(buffer: &mut Cursor<&[u8]>) -> Result<Self>
    where
        Self: Sized;
}

impl ToNetworkOrder for u8 {
    fn to_network_bytes(&self, buffer: &mut Vec<u8>) -> Result<usize> {
        buffer.write_u8(*self)?;
        Ok(1)
    }
}

impl FromNetworkOrder for u8 {
    fn from_network_bytes(buffer: &mut Cursor<&[u8]>) -> Result<Self> {
        buffer.read_u8()
    }
}

impl ToNetworkOrder for u16 {
    fn to_network_bytes(&self, buffer: &mut Vec<u8>) -> Result<usize> {
        buffer.write_u16::<BigEndian>(*self)?;
        Ok(2)
    }
}

impl FromNetworkOrder for u16 {
    fn from_network_bytes(buffer: &mut Cursor<&[u8]>) -> Result<Self> {
        buffer.read_u16::<BigEndian>()
    }
}

impl ToNetworkOrder for u32 {
    fn to_network_bytes(&self, buffer: &mut Vec<u8>) -> Result<usize> {
        buffer.write_u32::<BigEndian>(*self)?;
        Ok(4)
    }
}

impl FromNetworkOrder for u32 {
    fn from_network_bytes(buffer: &mut Cursor<&[u8]>) -> Result<Self> {
        buffer.read_u32::<BigEndian>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u16_round_trip() {
        let mut buffer = Vec::new();
        0x1234u16.to_network_bytes(&mut buffer).unwrap();
        assert_eq!(buffer, &[0x12, 0x34]);

        let mut cursor = Cursor::new(buffer.as_slice());
        assert_eq!(u16::from_network_bytes(&mut cursor).unwrap(), 0x1234);
    }

    #[test]
    fn u32_round_trip() {
        let mut buffer = Vec::new();
        0x12345678u32.to_network_bytes(&mut buffer).unwrap();
        assert_eq!(buffer, &[0x12, 0x34, 0x56, 0x78]);

        let mut cursor = Cursor::new(buffer.as_slice());
        assert_eq!(u32::from_network_bytes(&mut cursor).unwrap(), 0x1234_5678);
    }
}
