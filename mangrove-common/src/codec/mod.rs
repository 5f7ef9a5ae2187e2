// Copyright (C) 2024-2026 Mangrove Labs
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

use std::io::{Read, Write};
use std::{error, fmt, io, mem};

use crate::util::hash::Sha256Sum;

#[macro_use]
pub mod macros;

#[cfg(test)]
mod tests;

// wire structures may not be bigger than 16MB
pub const MAX_WIRE_MESSAGE_LEN: u32 = 16 * 1024 * 1024;

#[derive(Debug)]
pub enum Error {
    /// Failed to encode
    SerializeError(String),
    /// Failed to read
    ReadError(io::Error),
    /// Failed to decode
    DeserializeError(String),
    /// Failed to write
    WriteError(io::Error),
    /// Underflow -- not enough bytes to form the message
    UnderflowError(String),
    /// Overflow -- message too big
    OverflowError(String),
    /// Array is too big
    ArrayTooLong,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::SerializeError(ref s) => fmt::Display::fmt(s, f),
            Error::DeserializeError(ref s) => fmt::Display::fmt(s, f),
            Error::ReadError(ref io) => fmt::Display::fmt(io, f),
            Error::WriteError(ref io) => fmt::Display::fmt(io, f),
            Error::UnderflowError(ref s) => fmt::Display::fmt(s, f),
            Error::OverflowError(ref s) => fmt::Display::fmt(s, f),
            Error::ArrayTooLong => write!(f, "Array too long"),
        }
    }
}

impl error::Error for Error {
    fn cause(&self) -> Option<&dyn error::Error> {
        match *self {
            Error::SerializeError(ref _s) => None,
            Error::ReadError(ref io) => Some(io),
            Error::DeserializeError(ref _s) => None,
            Error::WriteError(ref io) => Some(io),
            Error::UnderflowError(ref _s) => None,
            Error::OverflowError(ref _s) => None,
            Error::ArrayTooLong => None,
        }
    }
}

/// Helper trait for the primitive types that make up Mangrove wire messages.
/// The encoding doubles as the canonical form hashed into content ids, so
/// implementors must be deterministic and field-order stable.
pub trait WireCodec {
    /// serialize implementors _should never_ error unless there is an underlying
    ///   failure in writing to the `fd`
    fn wire_serialize<W: Write>(&self, fd: &mut W) -> Result<(), Error>
    where
        Self: Sized;
    fn wire_deserialize<R: Read>(fd: &mut R) -> Result<Self, Error>
    where
        Self: Sized;
    /// Convenience for serialization to a vec.
    ///  this function unwraps any underlying serialization error
    fn serialize_to_vec(&self) -> Vec<u8>
    where
        Self: Sized,
    {
        let mut bytes = vec![];
        self.wire_serialize(&mut bytes)
            .expect("BUG: serialization to buffer failed.");
        bytes
    }
}

impl_wire_codec_for_int!(u8; [0; 1]);
impl_wire_codec_for_int!(u16; [0; 2]);
impl_wire_codec_for_int!(u32; [0; 4]);
impl_wire_codec_for_int!(u64; [0; 8]);
impl_wire_codec_for_int!(i64; [0; 8]);

impl_byte_array_wire_codec!(Sha256Sum, 32);

impl WireCodec for bool {
    fn wire_serialize<W: Write>(&self, fd: &mut W) -> Result<(), Error> {
        let byte = if *self { 1u8 } else { 0u8 };
        byte.wire_serialize(fd)
    }

    fn wire_deserialize<R: Read>(fd: &mut R) -> Result<bool, Error> {
        match u8::wire_deserialize(fd)? {
            0 => Ok(false),
            1 => Ok(true),
            x => Err(Error::DeserializeError(format!(
                "Invalid bool encoding {x}"
            ))),
        }
    }
}

pub fn write_next<T: WireCodec, W: Write>(fd: &mut W, item: &T) -> Result<(), Error> {
    item.wire_serialize(fd)
}

pub fn read_next<T: WireCodec, R: Read>(fd: &mut R) -> Result<T, Error> {
    let item: T = T::wire_deserialize(fd)?;
    Ok(item)
}

fn read_next_vec<T: WireCodec + Sized, R: Read>(
    fd: &mut R,
    num_items: u32,
    max_items: u32,
) -> Result<Vec<T>, Error> {
    let len = u32::wire_deserialize(fd)?;

    if max_items > 0 {
        if len > max_items {
            // too many items
            return Err(Error::DeserializeError(format!(
                "Array has too many items ({} > {})",
                len, max_items
            )));
        }
    } else if len != num_items {
        // inexact item count
        return Err(Error::DeserializeError(format!(
            "Array has incorrect number of items ({} != {})",
            len, num_items
        )));
    }

    if (mem::size_of::<T>() as u128) * (len as u128) > MAX_WIRE_MESSAGE_LEN as u128 {
        return Err(Error::DeserializeError(format!(
            "Message occupies too many bytes (tried to allocate {}*{}={})",
            mem::size_of::<T>() as u128,
            len,
            (mem::size_of::<T>() as u128) * (len as u128)
        )));
    }

    let mut ret = Vec::with_capacity(len as usize);
    for _i in 0..len {
        let next_item = T::wire_deserialize(fd)?;
        ret.push(next_item);
    }

    Ok(ret)
}

pub fn read_next_at_most<R: Read, T: WireCodec + Sized>(
    fd: &mut R,
    max_items: u32,
) -> Result<Vec<T>, Error> {
    read_next_vec::<T, R>(fd, 0, max_items)
}

pub fn read_next_exact<R: Read, T: WireCodec + Sized>(
    fd: &mut R,
    num_items: u32,
) -> Result<Vec<T>, Error> {
    read_next_vec::<T, R>(fd, num_items, 0)
}

impl<T> WireCodec for Vec<T>
where
    T: WireCodec + Sized,
{
    fn wire_serialize<W: Write>(&self, fd: &mut W) -> Result<(), Error> {
        if self.len() > u32::MAX as usize {
            return Err(Error::ArrayTooLong);
        }
        let len = self.len() as u32;
        write_next(fd, &len)?;
        for item in self.iter() {
            write_next(fd, item)?;
        }
        Ok(())
    }

    fn wire_deserialize<R: Read>(fd: &mut R) -> Result<Vec<T>, Error> {
        read_next_at_most::<R, T>(fd, u32::MAX)
    }
}

impl<T> WireCodec for Option<T>
where
    T: WireCodec + Sized,
{
    fn wire_serialize<W: Write>(&self, fd: &mut W) -> Result<(), Error> {
        match self {
            Some(ref item) => {
                write_next(fd, &1u8)?;
                write_next(fd, item)
            }
            None => write_next(fd, &0u8),
        }
    }

    fn wire_deserialize<R: Read>(fd: &mut R) -> Result<Option<T>, Error> {
        match u8::wire_deserialize(fd)? {
            0 => Ok(None),
            1 => Ok(Some(T::wire_deserialize(fd)?)),
            x => Err(Error::DeserializeError(format!(
                "Invalid Option tag {x}"
            ))),
        }
    }
}

/// Read a length-prefixed UTF-8 string of at most `max_len` bytes.
pub fn read_next_string<R: Read>(fd: &mut R, max_len: u32) -> Result<String, Error> {
    let bytes: Vec<u8> = read_next_at_most(fd, max_len)?;
    String::from_utf8(bytes)
        .map_err(|_e| Error::DeserializeError("Invalid UTF-8 string".to_string()))
}

impl WireCodec for String {
    fn wire_serialize<W: Write>(&self, fd: &mut W) -> Result<(), Error> {
        let bytes = self.as_bytes().to_vec();
        write_next(fd, &bytes)
    }

    fn wire_deserialize<R: Read>(fd: &mut R) -> Result<String, Error> {
        read_next_string(fd, u32::MAX)
    }
}
