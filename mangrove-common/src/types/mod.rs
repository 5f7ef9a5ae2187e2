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

/// Content id of a block header: the Sha512/256 of its canonical wire
/// encoding. This is the identifier exchanged in tip-set keys.
pub struct BlockId(pub [u8; 32]);
impl_array_newtype!(BlockId, u8, 32);
impl_array_hexstring_fmt!(BlockId);
impl_byte_array_newtype!(BlockId, u8, 32);
impl_byte_array_serde!(BlockId);
impl_byte_array_wire_codec!(BlockId, 32);
pub const BLOCK_ID_ENCODED_SIZE: u32 = 32;

/// Content id of a chain message (either authentication scheme).
pub struct MessageId(pub [u8; 32]);
impl_array_newtype!(MessageId, u8, 32);
impl_array_hexstring_fmt!(MessageId);
impl_byte_array_newtype!(MessageId, u8, 32);
impl_byte_array_serde!(MessageId);
impl_byte_array_wire_codec!(MessageId, 32);
pub const MESSAGE_ID_ENCODED_SIZE: u32 = 32;

/// An account identifier (hash of the account's public key material).
pub struct AccountId(pub [u8; 20]);
impl_array_newtype!(AccountId, u8, 20);
impl_array_hexstring_fmt!(AccountId);
impl_byte_array_newtype!(AccountId, u8, 20);
impl_byte_array_serde!(AccountId);
impl_byte_array_wire_codec!(AccountId, 20);
pub const ACCOUNT_ID_ENCODED_SIZE: u32 = 20;

/// A container for a BLS aggregate signature. Opaque to this layer;
/// verification happens in the consensus collaborator.
pub struct BlsSignatureBuffer(pub [u8; 96]);
impl_array_newtype!(BlsSignatureBuffer, u8, 96);
impl_array_hexstring_fmt!(BlsSignatureBuffer);
impl_byte_array_newtype!(BlsSignatureBuffer, u8, 96);
impl_byte_array_serde!(BlsSignatureBuffer);
impl_byte_array_wire_codec!(BlsSignatureBuffer, 96);
pub const BLS_SIGNATURE_ENCODED_SIZE: u32 = 96;

impl BlsSignatureBuffer {
    pub fn empty() -> BlsSignatureBuffer {
        BlsSignatureBuffer([0u8; 96])
    }
}

/// A container for a recoverable secp256k1 ECDSA signature. Opaque to
/// this layer as well.
pub struct MessageSignature(pub [u8; 65]);
impl_array_newtype!(MessageSignature, u8, 65);
impl_array_hexstring_fmt!(MessageSignature);
impl_byte_array_newtype!(MessageSignature, u8, 65);
impl_byte_array_serde!(MessageSignature);
impl_byte_array_wire_codec!(MessageSignature, 65);
pub const MESSAGE_SIGNATURE_ENCODED_SIZE: u32 = 65;

impl MessageSignature {
    pub fn empty() -> MessageSignature {
        MessageSignature([0u8; 65])
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn block_id_hex_round_trip() {
        let id = BlockId([0xab; 32]);
        let hex = id.to_hex();
        assert_eq!(hex.len(), 64);
        assert_eq!(BlockId::from_hex(&hex).unwrap(), id);
        assert!(BlockId::from_hex("abcd").is_err());
    }

    #[test]
    fn byte_array_from_bytes_checks_length() {
        assert!(AccountId::from_bytes(&[0u8; 20]).is_some());
        assert!(AccountId::from_bytes(&[0u8; 19]).is_none());
        assert!(MessageSignature::from_bytes(&[0u8; 65]).is_some());
        assert!(MessageSignature::from_bytes(&[0u8; 64]).is_none());
    }

    #[test]
    fn block_id_ordering_is_stable() {
        let a = BlockId([0x01; 32]);
        let mut high = [0x01; 32];
        high[31] = 0x02;
        let b = BlockId(high);
        assert!(a < b);
        assert_eq!(a.cmp(&a), std::cmp::Ordering::Equal);
    }
}
